//! Proposer-side workflow.
//!
//! ```text
//! find_current ─→ authorize ─→ build ─→ validate ─→ self-endorse
//!                                                        │
//!              ┌────────── one task per counterparty ────┘
//!              ↓
//!   collect (first rejection aborts the rest) ─→ notary ─→ Committed | Aborted
//! ```
//!
//! The workflow suspends only while waiting for counterparty replies and for
//! the notary's verdict.

use super::LocalIdentity;
use crate::config::AmendmentConfig;
use crate::domain::{build_bank_assessment, WorkflowCheckpoint, WorkflowStage};
use crate::error::{AmendmentError, AmendmentResult, SessionError};
use crate::events::AmendmentEvent;
use crate::metrics;
use crate::ports::inbound::{AmendmentApi, AmendmentRequest, WorkflowOutcome};
use crate::ports::outbound::{
    EndorsementReply, EventPublisher, RecordStore, SequencingClient, SequencingVerdict,
    SessionProvider, TransitionValidator, ValidationInput,
};
use async_trait::async_trait;
use shared_types::{Endorsement, Hash, Party, SignedProposal, StateAndRef, VersionRef};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Per-run state. Owned by exactly one workflow.
struct WorkflowContext<'a> {
    checkpoint: WorkflowCheckpoint,
    events: &'a dyn EventPublisher,
}

impl<'a> WorkflowContext<'a> {
    fn new(workflow_id: Uuid, record_id: &str, events: &'a dyn EventPublisher) -> Self {
        Self {
            checkpoint: WorkflowCheckpoint::new(workflow_id, record_id),
            events,
        }
    }

    fn workflow_id(&self) -> Uuid {
        self.checkpoint.workflow_id
    }

    fn stage(&self) -> WorkflowStage {
        self.checkpoint.stage
    }

    fn advance(&mut self, to: WorkflowStage) {
        let from = self.checkpoint.stage;
        if !from.can_transition_to(to) {
            warn!(%from, %to, "[amendment] ignoring illegal stage change");
            return;
        }
        self.checkpoint.stage = to;
        debug!(%from, %to, "[amendment] stage change");
        self.events.publish(AmendmentEvent::StageChanged {
            from,
            checkpoint: self.checkpoint.clone(),
        });
    }

    /// The proposer's own endorsement. Not announced as collected.
    fn record_own_endorsement(&mut self, endorsement: Endorsement) {
        self.checkpoint.endorsements.push(endorsement);
    }

    fn record_endorsement(&mut self, party: &Party, endorsement: Endorsement) {
        self.checkpoint.endorsements.push(endorsement);
        self.events.publish(AmendmentEvent::EndorsementCollected {
            workflow_id: self.workflow_id(),
            signer: party.clone(),
        });
    }
}

/// Amendment orchestrator, run by the bank.
pub struct AmendmentService<R, V, S, Q>
where
    R: RecordStore,
    V: TransitionValidator,
    S: SessionProvider + 'static,
    Q: SequencingClient,
{
    config: AmendmentConfig,
    identity: LocalIdentity,
    store: Arc<R>,
    validator: Arc<V>,
    sessions: Arc<S>,
    sequencer: Arc<Q>,
    events: Arc<dyn EventPublisher>,
}

impl<R, V, S, Q> AmendmentService<R, V, S, Q>
where
    R: RecordStore,
    V: TransitionValidator,
    S: SessionProvider + 'static,
    Q: SequencingClient,
{
    pub fn new(
        config: AmendmentConfig,
        identity: LocalIdentity,
        store: Arc<R>,
        validator: Arc<V>,
        sessions: Arc<S>,
        sequencer: Arc<Q>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            config,
            identity,
            store,
            validator,
            sessions,
            sequencer,
            events,
        }
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    async fn run(
        &self,
        workflow_id: Uuid,
        request: AmendmentRequest,
    ) -> AmendmentResult<WorkflowOutcome> {
        metrics::record_workflow_started();
        info!(proposer = %request.proposer, "[amendment] workflow started");

        let mut ctx = WorkflowContext::new(workflow_id, &request.record_id, self.events.as_ref());
        match self.drive(&mut ctx, &request).await {
            Ok(version) => {
                ctx.advance(WorkflowStage::Committed);
                metrics::record_workflow_committed();
                info!(version = %version, "[amendment] transition committed");
                self.events.publish(AmendmentEvent::Committed {
                    workflow_id,
                    version: version.clone(),
                });
                Ok(WorkflowOutcome::Committed(version))
            }
            Err(reason) => {
                let stage = ctx.stage();
                ctx.advance(WorkflowStage::Aborted);
                metrics::record_workflow_aborted(reason.stage_label());
                self.events.publish(AmendmentEvent::Aborted {
                    workflow_id,
                    stage,
                    reason: reason.to_string(),
                });
                if reason.is_fatal() {
                    error!(%stage, error = %reason, "[amendment] fatal store error");
                    return Err(reason);
                }
                warn!(%stage, error = %reason, "[amendment] workflow aborted");
                Ok(WorkflowOutcome::Aborted { stage, reason })
            }
        }
    }

    async fn drive(
        &self,
        ctx: &mut WorkflowContext<'_>,
        request: &AmendmentRequest,
    ) -> AmendmentResult<VersionRef> {
        // PREPARING
        let current = self.store.find_current(&request.record_id)?;
        self.authorize(&current, request)?;

        let proposal = build_bank_assessment(
            ctx.workflow_id(),
            &current,
            &request.proposer,
            &request.update,
        );
        self.validator
            .validate(ValidationInput::from(&proposal))
            .map_err(|rejection| AmendmentError::ValidationFailed {
                reason: rejection.reason,
            })?;
        let digest = proposal.digest()?;
        ctx.checkpoint.proposal_digest = Some(digest);
        ctx.advance(WorkflowStage::ValidatedLocally);

        let mut signed = SignedProposal::new(proposal);
        let own = self.identity.endorse(digest);
        signed.add_endorsement(own.clone())?;
        ctx.record_own_endorsement(own);

        ctx.advance(WorkflowStage::CollectingEndorsements);
        let counterparties = vec![
            request.counterparties.exporter.clone(),
            request.counterparties.guarantor.clone(),
        ];
        self.collect_endorsements(ctx, &mut signed, digest, counterparties)
            .await?;

        ctx.advance(WorkflowStage::Sequencing);
        self.sequence(&current, signed).await
    }

    /// Proposer must be this node and the bank on the current version, and the
    /// named counterparties must be the bond's exporter and guarantor.
    fn authorize(&self, current: &StateAndRef, request: &AmendmentRequest) -> AmendmentResult<()> {
        let participants = &current.state.participants;
        if request.proposer != participants.bank || &request.proposer != self.identity.party() {
            return Err(AmendmentError::Unauthorized {
                proposer: request.proposer.clone(),
                expected: participants.bank.clone(),
            });
        }
        if request.counterparties.exporter != participants.exporter {
            return Err(AmendmentError::ValidationFailed {
                reason: format!(
                    "{} is not the exporter on bond {}",
                    request.counterparties.exporter, current.state.bond_id
                ),
            });
        }
        if request.counterparties.guarantor != participants.guarantor {
            return Err(AmendmentError::ValidationFailed {
                reason: format!(
                    "{} is not the guarantor on bond {}",
                    request.counterparties.guarantor, current.state.bond_id
                ),
            });
        }
        Ok(())
    }

    /// Fan out one session per counterparty and gather every endorsement.
    ///
    /// The first rejection, failure or bad endorsement aborts all sessions
    /// still outstanding.
    async fn collect_endorsements(
        &self,
        ctx: &mut WorkflowContext<'_>,
        signed: &mut SignedProposal,
        digest: Hash,
        counterparties: Vec<Party>,
    ) -> AmendmentResult<()> {
        let (tx, mut rx) = mpsc::channel(counterparties.len().max(1));
        let mut tasks = JoinSet::new();
        let mut pending = counterparties.clone();

        for party in counterparties {
            let provider = Arc::clone(&self.sessions);
            let proposal = signed.clone();
            let tx = tx.clone();
            let limit = self.config.endorsement_timeout;

            tasks.spawn(
                async move {
                    let started = Instant::now();
                    let reply = match tokio::time::timeout(
                        limit,
                        request_endorsement(provider.as_ref(), &party, proposal),
                    )
                    .await
                    {
                        Ok(reply) => reply,
                        Err(_) => Err(SessionError::Timeout {
                            after_ms: limit.as_millis() as u64,
                        }),
                    };
                    metrics::observe_endorsement_latency(started.elapsed().as_secs_f64());
                    // Closed receiver: the workflow already gave up.
                    let _ = tx.send((party, reply)).await;
                }
                .in_current_span(),
            );
        }
        drop(tx);

        let outcome = loop {
            if pending.is_empty() {
                break Ok(());
            }
            let Some((party, reply)) = rx.recv().await else {
                break Err(AmendmentError::SessionFailure {
                    party: pending[0].clone(),
                    reason: "session task ended without a reply".into(),
                });
            };
            pending.retain(|p| p != &party);

            let endorsement = match self.check_reply(&party, reply, &digest) {
                Ok(endorsement) => endorsement,
                Err(e) => break Err(e),
            };
            if let Err(e) = signed.add_endorsement(endorsement.clone()) {
                break Err(AmendmentError::InvalidEndorsement {
                    party,
                    reason: e.to_string(),
                });
            }
            debug!(signer = %party, "[amendment] endorsement collected");
            ctx.record_endorsement(&party, endorsement);
        };

        if outcome.is_err() && !pending.is_empty() {
            tasks.abort_all();
            info!(
                pending = pending.len(),
                "[amendment] cancelled outstanding endorsement sessions"
            );
            self.events.publish(AmendmentEvent::SessionsCancelled {
                workflow_id: ctx.workflow_id(),
                pending: pending.len(),
            });
        }
        outcome
    }

    fn check_reply(
        &self,
        party: &Party,
        reply: Result<EndorsementReply, SessionError>,
        digest: &Hash,
    ) -> AmendmentResult<Endorsement> {
        let endorsement = match reply {
            Err(e) => {
                return Err(AmendmentError::SessionFailure {
                    party: party.clone(),
                    reason: e.to_string(),
                })
            }
            Ok(EndorsementReply::Rejected { reason }) => {
                return Err(AmendmentError::EndorsementRejected {
                    party: party.clone(),
                    reason,
                })
            }
            Ok(EndorsementReply::Endorsed(endorsement)) => endorsement,
        };

        if endorsement.signer != party.key {
            return Err(AmendmentError::InvalidEndorsement {
                party: party.clone(),
                reason: format!("signed by {} instead", endorsement.signer),
            });
        }
        if self.config.verify_endorsements {
            endorsement
                .verify(digest)
                .map_err(|e| AmendmentError::InvalidEndorsement {
                    party: party.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(endorsement)
    }

    async fn sequence(
        &self,
        current: &StateAndRef,
        signed: SignedProposal,
    ) -> AmendmentResult<VersionRef> {
        let limit = self.config.sequencing_timeout;
        let verdict = tokio::time::timeout(limit, self.sequencer.submit(signed))
            .await
            .map_err(|_| AmendmentError::SequencingFailure {
                reason: format!(
                    "no verdict within {}ms, outcome unknown",
                    limit.as_millis()
                ),
            })?
            .map_err(|e| AmendmentError::SequencingFailure {
                reason: e.to_string(),
            })?;

        match verdict {
            SequencingVerdict::Committed(version) => Ok(version),
            SequencingVerdict::Conflict { consumed_by } => {
                if let Some(winner) = &consumed_by {
                    warn!(input = %current.reference, winner = %winner, "[amendment] lost sequencing race");
                }
                Err(AmendmentError::VersionConflict {
                    input: current.reference.clone(),
                })
            }
        }
    }
}

async fn request_endorsement<S>(
    provider: &S,
    party: &Party,
    proposal: SignedProposal,
) -> Result<EndorsementReply, SessionError>
where
    S: SessionProvider + ?Sized,
{
    let mut session = provider.open_session(party).await?;
    session.request_endorsement(proposal).await
}

#[async_trait]
impl<R, V, S, Q> AmendmentApi for AmendmentService<R, V, S, Q>
where
    R: RecordStore,
    V: TransitionValidator,
    S: SessionProvider + 'static,
    Q: SequencingClient,
{
    async fn begin_transition(
        &self,
        request: AmendmentRequest,
    ) -> AmendmentResult<WorkflowOutcome> {
        let workflow_id = Uuid::new_v4();
        let span = info_span!(
            "amendment",
            workflow_id = %workflow_id,
            record_id = %request.record_id
        );
        self.run(workflow_id, request).instrument(span).await
    }
}
