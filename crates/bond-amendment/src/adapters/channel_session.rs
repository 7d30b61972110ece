//! In-process endorsement sessions over tokio channels.
//!
//! Each counterparty owns an `mpsc` inbox drained by a responder task; every
//! request carries a `oneshot` for the reply. Dropping the request side (for
//! example when the orchestrator aborts the session task) discards the reply.

use crate::error::SessionError;
use crate::ports::inbound::ResponderApi;
use crate::ports::outbound::{EndorsementReply, EndorsementSession, SessionProvider};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Party, PartyPublicKey, SignedProposal};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

/// Default inbox depth per counterparty.
pub const DEFAULT_INBOX_CAPACITY: usize = 64;

/// One proposal on its way to a counterparty.
#[derive(Debug)]
pub struct ProposalEnvelope {
    pub sender: Party,
    pub proposal: SignedProposal,
    pub reply: oneshot::Sender<EndorsementReply>,
}

/// A running responder task and its inbox.
pub struct ResponderHandle {
    party: Party,
    inbox: mpsc::Sender<ProposalEnvelope>,
    task: JoinHandle<()>,
}

impl ResponderHandle {
    pub fn party(&self) -> &Party {
        &self.party
    }

    pub fn inbox(&self) -> mpsc::Sender<ProposalEnvelope> {
        self.inbox.clone()
    }

    /// Stop the responder. Pending requests see `Disconnected`.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

/// Spawn a task answering proposals addressed to `party` through `responder`.
pub fn spawn_responder<R>(party: Party, responder: Arc<R>) -> ResponderHandle
where
    R: ResponderApi + 'static,
{
    let (inbox, mut rx) = mpsc::channel::<ProposalEnvelope>(DEFAULT_INBOX_CAPACITY);
    let name = party.name.clone();
    let task = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let reply = responder.on_proposal(&envelope.sender, &envelope.proposal);
            if envelope.reply.send(reply).is_err() {
                debug!(responder = %name, "[session] requester gone, reply discarded");
            }
        }
    });
    ResponderHandle { party, inbox, task }
}

/// Routes sessions to counterparties' inboxes by owning key.
pub struct ChannelSessionProvider {
    local: Party,
    routes: RwLock<HashMap<PartyPublicKey, (Party, mpsc::Sender<ProposalEnvelope>)>>,
    opened: AtomicUsize,
}

impl ChannelSessionProvider {
    /// Provider sending on behalf of `local`.
    pub fn new(local: Party) -> Self {
        Self {
            local,
            routes: RwLock::new(HashMap::new()),
            opened: AtomicUsize::new(0),
        }
    }

    /// Route sessions for `handle.party()` to its responder.
    pub fn register(&self, handle: &ResponderHandle) {
        self.register_inbox(handle.party().clone(), handle.inbox());
    }

    /// Route sessions for `party` to an arbitrary inbox.
    pub fn register_inbox(&self, party: Party, inbox: mpsc::Sender<ProposalEnvelope>) {
        self.routes.write().insert(party.key, (party, inbox));
    }

    /// Number of sessions opened so far.
    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for ChannelSessionProvider {
    async fn open_session(
        &self,
        counterparty: &Party,
    ) -> Result<Box<dyn EndorsementSession>, SessionError> {
        let inbox = {
            let routes = self.routes.read();
            let (party, inbox) = routes.get(&counterparty.key).ok_or_else(|| {
                SessionError::Transport(format!("no route to {counterparty}"))
            })?;
            if party != counterparty {
                return Err(SessionError::Transport(format!(
                    "{counterparty} does not match the registered party {party}"
                )));
            }
            inbox.clone()
        };
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ChannelSession {
            local: self.local.clone(),
            counterparty: counterparty.clone(),
            inbox,
        }))
    }
}

struct ChannelSession {
    local: Party,
    counterparty: Party,
    inbox: mpsc::Sender<ProposalEnvelope>,
}

#[async_trait]
impl EndorsementSession for ChannelSession {
    fn counterparty(&self) -> &Party {
        &self.counterparty
    }

    async fn request_endorsement(
        &mut self,
        proposal: SignedProposal,
    ) -> Result<EndorsementReply, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.inbox
            .send(ProposalEnvelope {
                sender: self.local.clone(),
                proposal,
                reply,
            })
            .await
            .map_err(|_| SessionError::Disconnected)?;
        rx.await.map_err(|_| SessionError::Disconnected)
    }
}
