//! Loan Peer Binary
//!
//! Runs one loan application invocation against a local RocksDB ledger, or
//! issues a signed caller certificate for local use.

use anyhow::{bail, Context, Result};
use ledger_shim::{
    events::{BroadcastSink, FanoutSink},
    metrics::Metrics,
    spawn_peer, Certificate, EventSink, KeyPair, PeerBindings, Proposal, Storage,
    TrustedIssuers,
};
use loan_contract::{Config, LoanContract};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "usage:
  loan-peer <certificate.json> <function> [args...]
  loan-peer issue-cert <issuer-seed-hex> <username> <role>";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the response
    let json = std::env::var("LOAN_LOG_FORMAT").map_or(false, |f| f == "json");
    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .with(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("issue-cert") => issue_cert(&args[1..]),
        Some(_) if args.len() >= 2 => invoke(&args[0], &args[1], args[2..].to_vec()).await,
        _ => bail!(USAGE),
    }
}

fn issue_cert(args: &[String]) -> Result<()> {
    let [seed, username, role] = args else {
        bail!(USAGE);
    };

    let issuer = KeyPair::from_seed_hex(seed).context("Invalid issuer seed")?;

    let mut attributes = BTreeMap::new();
    attributes.insert("username".to_string(), username.clone());
    attributes.insert("role".to_string(), role.clone());
    let certificate = issuer.issue(username.clone(), attributes);

    info!(issuer = %certificate.issuer, subject = %certificate.subject, "Certificate issued");
    println!("{}", serde_json::to_string_pretty(&certificate)?);
    Ok(())
}

async fn invoke(certificate_path: &str, function: &str, args: Vec<String>) -> Result<()> {
    let config = if let Ok(config_path) = std::env::var("LOAN_PEER_CONFIG") {
        info!("Loading config from: {}", config_path);
        Config::from_file(&config_path)?
    } else {
        info!("Loading config from environment variables");
        Config::from_env()?
    };

    let certificate_bytes = std::fs::read(certificate_path)
        .with_context(|| format!("Failed to read certificate {}", certificate_path))?;
    let certificate = Certificate::from_json(&certificate_bytes)?;

    info!("Opening ledger at: {:?}", config.ledger.data_dir);
    let storage = Arc::new(Storage::open(&config.ledger)?);

    let broadcast = BroadcastSink::new(config.ledger.events.broadcast_capacity);
    let mut events = FanoutSink::new().with(Arc::new(broadcast));
    if config.ledger.events.persist {
        events = events.with(storage.clone() as Arc<dyn EventSink>);
    }

    let trusted = TrustedIssuers::from_hex(&config.ledger.identity.trusted_issuers)?;
    if trusted.is_empty() {
        tracing::warn!("No trusted issuers configured; every gated operation will be denied");
    }

    let contract = Arc::new(LoanContract::new(config.contract.clone())?);
    let bindings = PeerBindings {
        state: storage.clone(),
        events: Arc::new(events),
        trusted,
        metrics: Metrics::new()?,
    };
    let peer = spawn_peer(contract, bindings, config.ledger.peer.mailbox_capacity);

    let response = peer
        .invoke(Proposal::new(function, args, certificate))
        .await?;
    peer.shutdown().await?;

    let rendered = serde_json::json!({
        "status": response.status.code(),
        "code": response.code,
        "message": response.message,
        "payload": String::from_utf8_lossy(&response.payload),
    });
    println!("{}", serde_json::to_string_pretty(&rendered)?);

    if !response.is_ok() {
        bail!("{} failed: {}", function, response.code);
    }
    Ok(())
}
