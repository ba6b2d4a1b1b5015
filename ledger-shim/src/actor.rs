//! Actor-based invocation ordering
//!
//! The peer is a single Tokio task that owns the chaincode and drains a
//! bounded mailbox. Invocations therefore execute one at a time in arrival
//! order, which is the only isolation a chaincode's read-modify-write
//! sequences can rely on.
//!
//! Chaincode and the state store are synchronous, so each invocation runs on
//! the blocking pool and the actor awaits it before taking the next message.
//! A panicking invocation is reported as an `Internal` response.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               PeerHandle (Clone)                      │
//! │         Sends proposals to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              PeerActor (Single Task)                  │
//! │                       │ spawn_blocking                │
//! │                       ▼                               │
//! │   Stub { state, identity, events, span }              │
//! │             Chaincode::invoke(&stub)                  │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::{
    identity::{CertificateResolver, TrustedIssuers},
    metrics::Metrics,
    stub::{Chaincode, EventSink, StateStore, Stub},
    types::{Proposal, Response, Status},
    Error, Result,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the peer actor
pub enum PeerMessage {
    /// Run the chaincode's init
    Instantiate {
        proposal: Proposal,
        response: oneshot::Sender<Response>,
    },

    /// Run a transaction proposal
    Invoke {
        proposal: Proposal,
        response: oneshot::Sender<Response>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Collaborators shared by every invocation
#[derive(Clone)]
pub struct PeerBindings {
    /// World state
    pub state: Arc<dyn StateStore>,

    /// Event delivery
    pub events: Arc<dyn EventSink>,

    /// Issuers whose certificates are accepted
    pub trusted: TrustedIssuers,

    /// Invocation metrics
    pub metrics: Metrics,
}

/// Actor that executes proposals in order
pub struct PeerActor<C: Chaincode> {
    chaincode: Arc<C>,
    bindings: PeerBindings,
    mailbox: mpsc::Receiver<PeerMessage>,
}

impl<C: Chaincode> PeerActor<C> {
    /// Create new actor
    pub fn new(
        chaincode: Arc<C>,
        bindings: PeerBindings,
        mailbox: mpsc::Receiver<PeerMessage>,
    ) -> Self {
        Self {
            chaincode,
            bindings,
            mailbox,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                PeerMessage::Instantiate { proposal, response } => {
                    let result = self.execute(proposal, |cc, stub| cc.init(stub)).await;
                    let _ = response.send(result);
                }
                PeerMessage::Invoke { proposal, response } => {
                    let result = self.execute(proposal, |cc, stub| cc.invoke(stub)).await;
                    let _ = response.send(result);
                }
                PeerMessage::Shutdown => break,
            }
        }

        tracing::info!("Peer actor stopped");
    }

    fn execute<F>(&self, proposal: Proposal, entry: F) -> impl Future<Output = Response>
    where
        F: FnOnce(&C, &Stub<'_>) -> Response + Send + 'static,
    {
        let chaincode = self.chaincode.clone();
        let bindings = self.bindings.clone();
        let metrics = bindings.metrics.clone();
        let function = proposal.function.clone();

        let task = tokio::task::spawn_blocking(move || {
            run_proposal(chaincode.as_ref(), &bindings, &proposal, entry)
        });

        async move {
            match task.await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(function = %function, error = %e, "Invocation aborted");
                    metrics.record_invocation(&function, Status::Internal.code(), 0.0);
                    Response::error(
                        Status::Internal,
                        "INVOCATION_ABORTED",
                        format!("{} did not complete: {}", function, e),
                    )
                }
            }
        }
    }
}

fn run_proposal<C, F>(
    chaincode: &C,
    bindings: &PeerBindings,
    proposal: &Proposal,
    entry: F,
) -> Response
where
    C: Chaincode,
    F: FnOnce(&C, &Stub<'_>) -> Response,
{
    let span = tracing::info_span!(
        "invoke",
        tx_id = %proposal.tx_id,
        function = %proposal.function,
        creator = %proposal.creator.subject,
    );
    let _guard = span.enter();
    let start = Instant::now();

    let resolver = CertificateResolver::new(&proposal.creator, &bindings.trusted);
    let stub = Stub::new(
        proposal.tx_id,
        &proposal.function,
        &proposal.args,
        bindings.state.as_ref(),
        &resolver,
        bindings.events.as_ref(),
        span.clone(),
    );

    let response = entry(chaincode, &stub);

    let elapsed = start.elapsed().as_secs_f64();
    bindings
        .metrics
        .record_invocation(&proposal.function, response.status.code(), elapsed);
    bindings.metrics.record_events(stub.events_emitted());

    if response.is_ok() {
        tracing::debug!(elapsed, "Invocation committed");
    } else {
        tracing::warn!(code = %response.code, message = %response.message, "Invocation failed");
    }

    response
}

/// Handle for submitting proposals to the actor
#[derive(Clone, Debug)]
pub struct PeerHandle {
    sender: mpsc::Sender<PeerMessage>,
}

impl PeerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<PeerMessage>) -> Self {
        Self { sender }
    }

    /// Run the chaincode's init with `proposal`
    pub async fn instantiate(&self, proposal: Proposal) -> Result<Response> {
        let (tx, rx) = oneshot::channel();
        self.send(PeerMessage::Instantiate {
            proposal,
            response: tx,
        })
        .await?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Submit a transaction proposal and wait for its response
    pub async fn invoke(&self, proposal: Proposal) -> Result<Response> {
        let (tx, rx) = oneshot::channel();
        self.send(PeerMessage::Invoke {
            proposal,
            response: tx,
        })
        .await?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.send(PeerMessage::Shutdown).await
    }

    async fn send(&self, msg: PeerMessage) -> Result<()> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| Error::Concurrency("Peer mailbox closed".to_string()))
    }
}

/// Spawn the peer actor
pub fn spawn_peer<C: Chaincode>(
    chaincode: Arc<C>,
    bindings: PeerBindings,
    mailbox_capacity: usize,
) -> PeerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
    let actor = PeerActor::new(chaincode, bindings, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    PeerHandle::new(tx)
}
