use super::*;
use crate::config::AmendmentConfig;
use crate::domain::{AcceptAll, BondContract, ExporterBooksPolicy, WorkflowStage};
use crate::error::{AmendmentError, SequencingError, SessionError, StoreError};
use crate::events::AmendmentEvent;
use crate::ports::inbound::{
    AmendmentApi, AmendmentRequest, Counterparties, ResponderApi, WorkflowOutcome,
};
use crate::ports::outbound::{
    EndorsementReply, EndorsementSession, EventPublisher, RecordStore, SequencingClient,
    SequencingVerdict, SessionProvider,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_crypto::PartyKeyPair;
use shared_types::{
    Bond, BondTerms, Participants, Party, PartyPublicKey, SignedProposal, StateAndRef,
    TermsUpdate, VersionRef,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Mock implementations
// =============================================================================

const EXPORTER: [u8; 32] = [1; 32];
const BANK: [u8; 32] = [2; 32];
const GUARANTOR: [u8; 32] = [3; 32];

fn keypair(seed: [u8; 32]) -> PartyKeyPair {
    PartyKeyPair::from_seed(seed)
}

fn participants() -> Participants {
    Participants::new(
        Party::new("Exporter", keypair(EXPORTER).public_key()),
        Party::new("Bank", keypair(BANK).public_key()),
        Party::new("Guarantor", keypair(GUARANTOR).public_key()),
    )
}

fn genesis() -> StateAndRef {
    StateAndRef {
        reference: VersionRef::genesis("B-001", [0; 32]),
        state: Bond::new("B-001", 1000, participants(), BondTerms::default()),
    }
}

struct FixedStore(Result<StateAndRef, StoreError>);

impl RecordStore for FixedStore {
    fn find_current(&self, _record_id: &str) -> Result<StateAndRef, StoreError> {
        self.0.clone()
    }
}

#[derive(Clone)]
enum Script {
    Endorse(Arc<PartyKeyPair>),
    Reject(String),
    Fail(SessionError),
    /// Endorse over the wrong digest.
    Tamper(Arc<PartyKeyPair>),
    /// Never answer.
    Hang,
}

/// Counts drops of unanswered sessions.
struct CancelGuard(Arc<AtomicUsize>);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct ScriptedSessions {
    scripts: HashMap<PartyPublicKey, Script>,
    opened: AtomicUsize,
    cancelled: Arc<AtomicUsize>,
}

impl ScriptedSessions {
    fn new(scripts: Vec<(PartyPublicKey, Script)>) -> Self {
        Self {
            scripts: scripts.into_iter().collect(),
            opened: AtomicUsize::new(0),
            cancelled: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn endorsing() -> Self {
        Self::new(vec![
            (
                keypair(EXPORTER).public_key(),
                Script::Endorse(Arc::new(keypair(EXPORTER))),
            ),
            (
                keypair(GUARANTOR).public_key(),
                Script::Endorse(Arc::new(keypair(GUARANTOR))),
            ),
        ])
    }

    fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

struct ScriptedSession {
    counterparty: Party,
    script: Script,
    cancelled: Arc<AtomicUsize>,
}

#[async_trait]
impl SessionProvider for ScriptedSessions {
    async fn open_session(
        &self,
        counterparty: &Party,
    ) -> Result<Box<dyn EndorsementSession>, SessionError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .get(&counterparty.key)
            .cloned()
            .ok_or(SessionError::Disconnected)?;
        Ok(Box::new(ScriptedSession {
            counterparty: counterparty.clone(),
            script,
            cancelled: self.cancelled.clone(),
        }))
    }
}

#[async_trait]
impl EndorsementSession for ScriptedSession {
    fn counterparty(&self) -> &Party {
        &self.counterparty
    }

    async fn request_endorsement(
        &mut self,
        proposal: SignedProposal,
    ) -> Result<EndorsementReply, SessionError> {
        let digest = proposal.proposal.digest().unwrap();
        match &self.script {
            Script::Endorse(kp) => Ok(EndorsementReply::Endorsed(
                shared_types::Endorsement::sign(kp, digest),
            )),
            Script::Tamper(kp) => Ok(EndorsementReply::Endorsed(
                shared_types::Endorsement::sign(kp, [0xAB; 32]),
            )),
            Script::Reject(reason) => Ok(EndorsementReply::Rejected {
                reason: reason.clone(),
            }),
            Script::Fail(e) => Err(e.clone()),
            Script::Hang => {
                let _guard = CancelGuard(self.cancelled.clone());
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[derive(Clone, Copy)]
enum SequencerMode {
    Commit,
    Conflict,
    Hang,
}

struct StubSequencer {
    mode: SequencerMode,
    submitted: AtomicUsize,
}

impl StubSequencer {
    fn new(mode: SequencerMode) -> Self {
        Self {
            mode,
            submitted: AtomicUsize::new(0),
        }
    }

    fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SequencingClient for StubSequencer {
    async fn submit(&self, signed: SignedProposal) -> Result<SequencingVerdict, SequencingError> {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        assert!(signed.is_fully_endorsed(), "partial endorsement submitted");
        let input = signed.proposal.single_input().unwrap();
        match self.mode {
            SequencerMode::Commit => Ok(SequencingVerdict::Committed(
                input
                    .reference
                    .successor(signed.proposal.digest().unwrap()),
            )),
            SequencerMode::Conflict => Ok(SequencingVerdict::Conflict { consumed_by: None }),
            SequencerMode::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[derive(Default)]
struct RecordingEvents(Mutex<Vec<AmendmentEvent>>);

impl RecordingEvents {
    fn stages(&self) -> Vec<WorkflowStage> {
        self.0
            .lock()
            .iter()
            .filter_map(|e| match e {
                AmendmentEvent::StageChanged { checkpoint, .. } => Some(checkpoint.stage),
                _ => None,
            })
            .collect()
    }
}

impl EventPublisher for RecordingEvents {
    fn publish(&self, event: AmendmentEvent) -> usize {
        self.0.lock().push(event);
        1
    }
}

// =============================================================================
// Orchestrator harness
// =============================================================================

struct Harness {
    service: AmendmentService<FixedStore, BondContract, ScriptedSessions, StubSequencer>,
    sessions: Arc<ScriptedSessions>,
    sequencer: Arc<StubSequencer>,
    events: Arc<RecordingEvents>,
}

fn harness_with(
    store: FixedStore,
    sessions: ScriptedSessions,
    mode: SequencerMode,
    config: AmendmentConfig,
) -> Harness {
    let sessions = Arc::new(sessions);
    let sequencer = Arc::new(StubSequencer::new(mode));
    let events = Arc::new(RecordingEvents::default());
    let service = AmendmentService::new(
        config,
        LocalIdentity::new("Bank", keypair(BANK)),
        Arc::new(store),
        Arc::new(BondContract::new()),
        sessions.clone(),
        sequencer.clone(),
        events.clone(),
    );
    Harness {
        service,
        sessions,
        sequencer,
        events,
    }
}

fn harness(sessions: ScriptedSessions, mode: SequencerMode) -> Harness {
    harness_with(
        FixedStore(Ok(genesis())),
        sessions,
        mode,
        AmendmentConfig::for_testing(),
    )
}

fn request(update: TermsUpdate) -> AmendmentRequest {
    let p = participants();
    AmendmentRequest {
        record_id: "B-001".into(),
        proposer: p.bank.clone(),
        counterparties: Counterparties {
            exporter: p.exporter,
            guarantor: p.guarantor,
        },
        update,
    }
}

fn risk(level: u8) -> TermsUpdate {
    TermsUpdate {
        risk_level: Some(level),
        ..Default::default()
    }
}

fn aborted(outcome: WorkflowOutcome) -> (WorkflowStage, AmendmentError) {
    match outcome {
        WorkflowOutcome::Aborted { stage, reason } => (stage, reason),
        WorkflowOutcome::Committed(v) => panic!("expected abort, committed {v}"),
    }
}

// =============================================================================
// Orchestrator tests
// =============================================================================

#[tokio::test]
async fn test_commit_happy_path() {
    let h = harness(ScriptedSessions::endorsing(), SequencerMode::Commit);

    let outcome = h.service.begin_transition(request(risk(3))).await.unwrap();

    let version = outcome.committed_version().expect("committed");
    assert_eq!(version.record_id, "B-001");
    assert_eq!(version.sequence, 1);
    assert_eq!(h.sessions.opened(), 2);
    assert_eq!(h.sequencer.submitted(), 1);
    assert_eq!(
        h.events.stages(),
        vec![
            WorkflowStage::ValidatedLocally,
            WorkflowStage::CollectingEndorsements,
            WorkflowStage::Sequencing,
            WorkflowStage::Committed,
        ]
    );
}

#[tokio::test]
async fn test_checkpoint_carries_digest_and_endorsements() {
    let h = harness(ScriptedSessions::endorsing(), SequencerMode::Commit);
    h.service.begin_transition(request(risk(3))).await.unwrap();

    let events = h.events.0.lock();
    let last = events
        .iter()
        .rev()
        .find_map(|e| match e {
            AmendmentEvent::StageChanged { checkpoint, .. } => Some(checkpoint.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(last.stage, WorkflowStage::Committed);
    assert!(last.proposal_digest.is_some());
    assert_eq!(last.endorsements.len(), 3);
    assert_eq!(last.endorsements[0].signer, participants().bank.key);
}

#[tokio::test]
async fn test_only_counterparty_endorsements_are_announced() {
    let h = harness(ScriptedSessions::endorsing(), SequencerMode::Commit);
    h.service.begin_transition(request(risk(3))).await.unwrap();

    let signers: Vec<Party> = h
        .events
        .0
        .lock()
        .iter()
        .filter_map(|e| match e {
            AmendmentEvent::EndorsementCollected { signer, .. } => Some(signer.clone()),
            _ => None,
        })
        .collect();
    let p = participants();
    assert_eq!(signers.len(), 2);
    assert!(signers.contains(&p.exporter));
    assert!(signers.contains(&p.guarantor));
    assert!(!signers.contains(&p.bank));
}

#[tokio::test]
async fn test_unauthorized_proposer_opens_no_session() {
    let h = harness(ScriptedSessions::endorsing(), SequencerMode::Commit);
    let mut req = request(risk(3));
    req.proposer = participants().exporter;

    let (stage, reason) = aborted(h.service.begin_transition(req).await.unwrap());

    assert_eq!(stage, WorkflowStage::Preparing);
    assert!(matches!(reason, AmendmentError::Unauthorized { .. }));
    assert_eq!(h.sessions.opened(), 0);
    assert_eq!(h.sequencer.submitted(), 0);
}

#[tokio::test]
async fn test_wrong_counterparty_fails_before_network() {
    let h = harness(ScriptedSessions::endorsing(), SequencerMode::Commit);
    let mut req = request(risk(3));
    req.counterparties.guarantor = Party::new("Other", keypair([9; 32]).public_key());

    let (_, reason) = aborted(h.service.begin_transition(req).await.unwrap());

    assert!(matches!(reason, AmendmentError::ValidationFailed { .. }));
    assert_eq!(h.sessions.opened(), 0);
}

#[tokio::test]
async fn test_not_found() {
    let h = harness_with(
        FixedStore(Err(StoreError::NotFound {
            record_id: "B-001".into(),
        })),
        ScriptedSessions::endorsing(),
        SequencerMode::Commit,
        AmendmentConfig::for_testing(),
    );

    let (stage, reason) = aborted(h.service.begin_transition(request(risk(3))).await.unwrap());
    assert_eq!(stage, WorkflowStage::Preparing);
    assert!(matches!(reason, AmendmentError::NotFound { .. }));
}

#[tokio::test]
async fn test_store_corruption_is_fatal() {
    let h = harness_with(
        FixedStore(Err(StoreError::Corruption {
            record_id: "B-001".into(),
            current_count: 2,
        })),
        ScriptedSessions::endorsing(),
        SequencerMode::Commit,
        AmendmentConfig::for_testing(),
    );

    let err = h
        .service
        .begin_transition(request(risk(3)))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(h.sessions.opened(), 0);
}

#[tokio::test]
async fn test_invalid_update_never_reaches_counterparties() {
    let h = harness(ScriptedSessions::endorsing(), SequencerMode::Commit);

    let (stage, reason) = aborted(h.service.begin_transition(request(risk(9))).await.unwrap());

    assert_eq!(stage, WorkflowStage::Preparing);
    assert!(matches!(reason, AmendmentError::ValidationFailed { .. }));
    assert_eq!(h.sessions.opened(), 0);
}

#[tokio::test]
async fn test_rejection_cancels_pending_session() {
    let sessions = ScriptedSessions::new(vec![
        (
            keypair(EXPORTER).public_key(),
            Script::Reject("turnover mismatch".into()),
        ),
        (keypair(GUARANTOR).public_key(), Script::Hang),
    ]);
    let cancelled = sessions.cancelled.clone();
    let h = harness(sessions, SequencerMode::Commit);

    let (stage, reason) = aborted(h.service.begin_transition(request(risk(3))).await.unwrap());

    assert_eq!(stage, WorkflowStage::CollectingEndorsements);
    match reason {
        AmendmentError::EndorsementRejected { party, reason } => {
            assert_eq!(party, participants().exporter);
            assert_eq!(reason, "turnover mismatch");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.sequencer.submitted(), 0);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    assert!(h
        .events
        .0
        .lock()
        .iter()
        .any(|e| matches!(e, AmendmentEvent::SessionsCancelled { pending: 1, .. })));
}

#[tokio::test(start_paused = true)]
async fn test_session_timeout_is_session_failure() {
    let sessions = ScriptedSessions::new(vec![
        (
            keypair(EXPORTER).public_key(),
            Script::Endorse(Arc::new(keypair(EXPORTER))),
        ),
        (keypair(GUARANTOR).public_key(), Script::Hang),
    ]);
    let h = harness(sessions, SequencerMode::Commit);

    let (_, reason) = aborted(h.service.begin_transition(request(risk(3))).await.unwrap());

    match reason {
        AmendmentError::SessionFailure { party, reason } => {
            assert_eq!(party, participants().guarantor);
            assert!(reason.contains("no reply"), "{reason}");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.sequencer.submitted(), 0);
}

#[tokio::test]
async fn test_disconnect_is_session_failure() {
    let sessions = ScriptedSessions::new(vec![
        (
            keypair(EXPORTER).public_key(),
            Script::Fail(SessionError::Disconnected),
        ),
        (
            keypair(GUARANTOR).public_key(),
            Script::Endorse(Arc::new(keypair(GUARANTOR))),
        ),
    ]);
    let h = harness(sessions, SequencerMode::Commit);

    let (_, reason) = aborted(h.service.begin_transition(request(risk(3))).await.unwrap());
    assert!(matches!(reason, AmendmentError::SessionFailure { .. }));
}

#[tokio::test]
async fn test_endorsement_from_wrong_key_rejected() {
    let sessions = ScriptedSessions::new(vec![
        (
            keypair(EXPORTER).public_key(),
            Script::Endorse(Arc::new(keypair(EXPORTER))),
        ),
        (
            keypair(GUARANTOR).public_key(),
            Script::Endorse(Arc::new(keypair([7; 32]))),
        ),
    ]);
    let h = harness(sessions, SequencerMode::Commit);

    let (_, reason) = aborted(h.service.begin_transition(request(risk(3))).await.unwrap());
    match reason {
        AmendmentError::InvalidEndorsement { party, .. } => {
            assert_eq!(party, participants().guarantor)
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.sequencer.submitted(), 0);
}

#[tokio::test]
async fn test_endorsement_over_other_digest_rejected() {
    let sessions = ScriptedSessions::new(vec![
        (
            keypair(EXPORTER).public_key(),
            Script::Tamper(Arc::new(keypair(EXPORTER))),
        ),
        (
            keypair(GUARANTOR).public_key(),
            Script::Endorse(Arc::new(keypair(GUARANTOR))),
        ),
    ]);
    let h = harness(sessions, SequencerMode::Commit);

    let (_, reason) = aborted(h.service.begin_transition(request(risk(3))).await.unwrap());
    assert!(matches!(reason, AmendmentError::InvalidEndorsement { .. }));
}

#[tokio::test]
async fn test_conflict_is_retryable_abort() {
    let h = harness(ScriptedSessions::endorsing(), SequencerMode::Conflict);

    let (stage, reason) = aborted(h.service.begin_transition(request(risk(3))).await.unwrap());

    assert_eq!(stage, WorkflowStage::Sequencing);
    assert!(matches!(reason, AmendmentError::VersionConflict { .. }));
    assert!(reason.is_retryable());
    assert_eq!(reason.stage_label(), "version_conflict");
}

#[tokio::test(start_paused = true)]
async fn test_sequencing_timeout() {
    let h = harness(ScriptedSessions::endorsing(), SequencerMode::Hang);

    let (stage, reason) = aborted(h.service.begin_transition(request(risk(3))).await.unwrap());

    assert_eq!(stage, WorkflowStage::Sequencing);
    assert!(matches!(reason, AmendmentError::SequencingFailure { .. }));
}

// =============================================================================
// Responder tests
// =============================================================================

fn bank_signed(update: TermsUpdate) -> SignedProposal {
    let bank = LocalIdentity::new("Bank", keypair(BANK));
    let proposal = crate::domain::build_bank_assessment(
        uuid::Uuid::new_v4(),
        &genesis(),
        bank.party(),
        &update,
    );
    let digest = proposal.digest().unwrap();
    let mut signed = SignedProposal::new(proposal);
    signed.add_endorsement(bank.endorse(digest)).unwrap();
    signed
}

fn exporter_responder() -> ResponderService<BondContract, AcceptAll> {
    ResponderService::new(
        LocalIdentity::new("Exporter", keypair(EXPORTER)),
        Arc::new(BondContract::new()),
        AcceptAll,
    )
}

fn rejection(reply: EndorsementReply) -> String {
    match reply {
        EndorsementReply::Rejected { reason } => reason,
        EndorsementReply::Endorsed(_) => panic!("expected rejection"),
    }
}

#[test]
fn test_responder_endorses_exact_proposal() {
    let responder = exporter_responder();
    let signed = bank_signed(risk(3));
    let digest = signed.proposal.digest().unwrap();

    match responder.on_proposal(&participants().bank, &signed) {
        EndorsementReply::Endorsed(e) => {
            assert_eq!(e.signer, participants().exporter.key);
            assert!(e.verify(&digest).is_ok());
        }
        EndorsementReply::Rejected { reason } => panic!("rejected: {reason}"),
    }
}

#[test]
fn test_responder_shape_check_independent_of_content() {
    let responder = exporter_responder();

    for inputs in [0usize, 2] {
        let mut signed = bank_signed(risk(3));
        signed.proposal.inputs = vec![genesis(); inputs];
        // Re-sign so only the shape is wrong.
        let digest = signed.proposal.digest().unwrap();
        signed.endorsements = vec![LocalIdentity::new("Bank", keypair(BANK)).endorse(digest)];

        let reason = rejection(responder.on_proposal(&participants().bank, &signed));
        assert_eq!(reason, "transition must consume exactly one input version");
    }
}

#[test]
fn test_responder_requires_proposer_endorsement() {
    let responder = exporter_responder();
    let mut signed = bank_signed(risk(3));
    signed.endorsements.clear();

    let reason = rejection(responder.on_proposal(&participants().bank, &signed));
    assert_eq!(reason, "missing proposer endorsement");
}

#[test]
fn test_responder_rejects_modified_proposal() {
    let responder = exporter_responder();
    let mut signed = bank_signed(risk(3));
    signed.proposal.outputs[0].terms.risk_level = 1;

    let reason = rejection(responder.on_proposal(&participants().bank, &signed));
    assert!(reason.starts_with("proposer endorsement invalid"), "{reason}");
}

#[test]
fn test_responder_rejects_impersonated_sender() {
    let responder = exporter_responder();
    let signed = bank_signed(risk(3));

    rejection(responder.on_proposal(&participants().guarantor, &signed));
}

#[test]
fn test_responder_not_a_signer() {
    let outsider = ResponderService::new(
        LocalIdentity::new("Outsider", keypair([8; 32])),
        Arc::new(BondContract::new()),
        AcceptAll,
    );
    let reason = rejection(outsider.on_proposal(&participants().bank, &bank_signed(risk(3))));
    assert_eq!(reason, "this party is not a required signer");
}

#[test]
fn test_responder_policy_reason_passed_through() {
    let responder = ResponderService::new(
        LocalIdentity::new("Exporter", keypair(EXPORTER)),
        Arc::new(BondContract::new()),
        ExporterBooksPolicy::new(750.0, 0.0),
    );
    let update = TermsUpdate {
        exporter_turnover: Some(900.0),
        ..Default::default()
    };

    let reason = rejection(responder.on_proposal(&participants().bank, &bank_signed(update)));
    assert_eq!(reason, "turnover mismatch");
}
