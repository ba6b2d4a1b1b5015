//! Integration tests for the peer against RocksDB
//!
//! - State written through the peer survives a reopen
//! - Every delivered event lands in the event log in order
//! - Certificates verify only when untouched and issued by a trusted key

use ledger_shim::{
    events::FanoutSink,
    identity::CertificateResolver,
    metrics::Metrics,
    spawn_peer, AttributeResolver, Chaincode, Config, EventSink, KeyPair, PeerBindings,
    Proposal, Response, StateStore, Status, Storage, Stub, TrustedIssuers,
};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Writes `args[1]` under `args[0]` and announces the key
struct KeyWriter;

impl Chaincode for KeyWriter {
    fn invoke(&self, stub: &Stub<'_>) -> Response {
        let args = stub.args();
        if args.len() < 2 {
            return Response::error(Status::BadRequest, "ARGS", "need key and value");
        }
        if let Err(e) = stub.put_state(&args[0], args[1].as_bytes()) {
            return Response::error(Status::Internal, "WRITE", e.to_string());
        }
        match stub.set_event("writes", args[0].clone().into_bytes()) {
            Ok(()) => Response::success(Vec::new()),
            Err(e) => Response::error(Status::Internal, "EVENT", e.to_string()),
        }
    }
}

fn test_config() -> (Config, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    (config, temp_dir)
}

fn certificate(issuer: &KeyPair, role: &str) -> ledger_shim::Certificate {
    let mut attributes = BTreeMap::new();
    attributes.insert("role".to_string(), role.to_string());
    issuer.issue("writer", attributes)
}

#[tokio::test]
async fn test_state_and_events_persist_across_reopen() {
    let (config, _dir) = test_config();
    let issuer = KeyPair::generate();

    {
        let storage = Arc::new(Storage::open(&config).unwrap());
        let bindings = PeerBindings {
            state: storage.clone(),
            events: Arc::new(FanoutSink::new().with(storage.clone() as Arc<dyn EventSink>)),
            trusted: TrustedIssuers::new(vec![issuer.public_key()]),
            metrics: Metrics::new().unwrap(),
        };
        let handle = spawn_peer(Arc::new(KeyWriter), bindings, 8);

        for i in 0..5 {
            let proposal = Proposal::new(
                "write",
                vec![format!("key-{}", i), format!("value-{}", i)],
                certificate(&issuer, "writer"),
            );
            assert!(handle.invoke(proposal).await.unwrap().is_ok());
        }

        handle.shutdown().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    let storage = Storage::open(&config).unwrap();
    for i in 0..5 {
        assert_eq!(
            storage.get_state(&format!("key-{}", i)).unwrap(),
            format!("value-{}", i).into_bytes()
        );
    }

    let events = storage.events().unwrap();
    assert_eq!(events.len(), 5);
    let keys: Vec<String> = events
        .iter()
        .map(|e| String::from_utf8(e.payload.clone()).unwrap())
        .collect();
    assert_eq!(keys, vec!["key-0", "key-1", "key-2", "key-3", "key-4"]);
    assert!(events.iter().all(|e| e.channel == "writes"));
}

#[tokio::test]
async fn test_missing_key_is_not_found() {
    let (config, _dir) = test_config();
    let storage = Storage::open(&config).unwrap();

    let err = storage.get_state("absent").unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_metrics_follow_invocations() {
    let (config, _dir) = test_config();
    let issuer = KeyPair::generate();
    let storage = Arc::new(Storage::open(&config).unwrap());
    let metrics = Metrics::new().unwrap();

    let bindings = PeerBindings {
        state: storage.clone(),
        events: storage.clone(),
        trusted: TrustedIssuers::new(vec![issuer.public_key()]),
        metrics: metrics.clone(),
    };
    let handle = spawn_peer(Arc::new(KeyWriter), bindings, 8);

    let ok = Proposal::new(
        "write",
        vec!["k".to_string(), "v".to_string()],
        certificate(&issuer, "writer"),
    );
    let bad = Proposal::new("write", vec![], certificate(&issuer, "writer"));
    handle.invoke(ok).await.unwrap();
    handle.invoke(bad).await.unwrap();
    handle.shutdown().await.unwrap();

    assert_eq!(
        metrics
            .invocations_total
            .with_label_values(&["write", "200"])
            .get(),
        1
    );
    assert_eq!(
        metrics
            .invocations_total
            .with_label_values(&["write", "400"])
            .get(),
        1
    );
    assert_eq!(metrics.events_total.get(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: an issued certificate resolves every attribute it carries
    #[test]
    fn prop_issued_certificates_resolve(role in "[A-Za-z_]{1,24}", seed in any::<[u8; 32]>()) {
        let issuer = KeyPair::from_seed(&seed);
        let trusted = TrustedIssuers::new(vec![issuer.public_key()]);
        let cert = certificate(&issuer, &role);

        let resolver = CertificateResolver::new(&cert, &trusted);
        prop_assert_eq!(resolver.resolve("role").unwrap(), role);
        prop_assert!(resolver.resolve("username").is_err());
    }

    /// Property: changing any attribute invalidates the signature
    #[test]
    fn prop_tampered_certificates_rejected(role in "[A-Za-z_]{1,24}", forged in "[A-Za-z_]{1,24}") {
        prop_assume!(role != forged);
        let issuer = KeyPair::generate();
        let trusted = TrustedIssuers::new(vec![issuer.public_key()]);

        let mut cert = certificate(&issuer, &role);
        cert.attributes.insert("role".to_string(), forged);

        prop_assert!(cert.verify(&trusted).is_err());
        let resolver = CertificateResolver::new(&cert, &trusted);
        prop_assert!(resolver.resolve("role").is_err());
    }

    /// Property: certificates from untrusted issuers never resolve
    #[test]
    fn prop_untrusted_issuer_rejected(role in "[A-Za-z_]{1,24}") {
        let issuer = KeyPair::generate();
        let trusted = TrustedIssuers::new(vec![KeyPair::generate().public_key()]);
        let cert = certificate(&issuer, &role);

        prop_assert!(cert.verify(&trusted).is_err());
    }
}
