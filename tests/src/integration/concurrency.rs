//! # Concurrency Flows
//!
//! Racing workflows on the same version, unresponsive counterparties and
//! cancellation of sessions nobody is waiting on any more.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{config, network_with, BOND_ID};
    use bond_amendment::adapters::ProposalEnvelope;
    use bond_amendment::ports::{AmendmentApi, EndorsementReply, RecordStore, WorkflowOutcome};
    use bond_amendment::{AmendmentError, AmendmentEvent, WorkflowStage};
    use shared_types::TermsUpdate;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn risk(level: u8) -> TermsUpdate {
        TermsUpdate {
            risk_level: Some(level),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_racing_assessments_commit_exactly_once() {
        let (network, _bus, genesis) = network_with(&config());

        let (first, second) = tokio::join!(
            network
                .bank
                .begin_transition(network.bank_request(BOND_ID, risk(3))),
            network
                .bank
                .begin_transition(network.bank_request(BOND_ID, risk(4))),
        );
        let outcomes = [first.unwrap(), second.unwrap()];

        let winners = outcomes.iter().filter(|o| o.is_committed()).count();
        assert_eq!(winners, 1, "Expected a single winner: {:?}", outcomes);

        let loser = outcomes.iter().find(|o| !o.is_committed()).unwrap();
        match loser {
            WorkflowOutcome::Aborted {
                stage: WorkflowStage::Sequencing,
                reason,
            } => {
                assert!(reason.is_retryable());
                assert!(matches!(
                    reason,
                    AmendmentError::VersionConflict { input } if input == &genesis
                ));
            }
            other => panic!("Expected VersionConflict, got {:?}", other),
        }
        assert_eq!(network.notary.conflicts(), 1);
        assert_eq!(network.vault.current_count(BOND_ID), 1);

        // A fresh workflow builds on the winner.
        let retry = network
            .bank
            .begin_transition(network.bank_request(BOND_ID, risk(4)))
            .await
            .unwrap();
        assert_eq!(retry.committed_version().unwrap().sequence, 2);
        assert_eq!(network.vault.current_count(BOND_ID), 1);

        network.shutdown();
    }

    #[tokio::test]
    async fn test_silent_counterparty_times_out() {
        let (network, _bus, genesis) = network_with(&config());

        // Inbox nobody drains.
        let (inbox, _held) = mpsc::channel::<ProposalEnvelope>(4);
        network
            .sessions
            .register_inbox(network.participants.exporter.clone(), inbox);

        let outcome = timeout(
            Duration::from_secs(5),
            network
                .bank
                .begin_transition(network.bank_request(BOND_ID, risk(3))),
        )
        .await
        .expect("workflow must finish within its endorsement timeout")
        .unwrap();

        match outcome {
            WorkflowOutcome::Aborted {
                stage: WorkflowStage::CollectingEndorsements,
                reason: AmendmentError::SessionFailure { party, reason },
            } => {
                assert_eq!(party, network.participants.exporter);
                assert!(reason.contains("no reply within"), "{reason}");
            }
            other => panic!("Expected session timeout, got {:?}", other),
        }
        assert_eq!(network.vault.find_current(BOND_ID).unwrap().reference, genesis);

        network.shutdown();
    }

    #[tokio::test]
    async fn test_rejection_cancels_outstanding_session() {
        let (network, bus, genesis) = network_with(&config());
        let mut events = bus.subscribe();

        let (exporter_inbox, mut exporter_rx) = mpsc::channel::<ProposalEnvelope>(4);
        let (guarantor_inbox, mut guarantor_rx) = mpsc::channel::<ProposalEnvelope>(4);
        network
            .sessions
            .register_inbox(network.participants.exporter.clone(), exporter_inbox);
        network
            .sessions
            .register_inbox(network.participants.guarantor.clone(), guarantor_inbox);

        // Guarantor refuses once both proposals are delivered; the exporter
        // never answers and only watches for its requester to go away.
        let counterparties = async {
            let exporter = exporter_rx.recv().await.expect("exporter proposal");
            let guarantor = guarantor_rx.recv().await.expect("guarantor proposal");
            guarantor
                .reply
                .send(EndorsementReply::Rejected {
                    reason: "risk appetite exhausted".into(),
                })
                .expect("bank waiting for guarantor");

            let mut late = exporter.reply;
            timeout(Duration::from_secs(5), late.closed()).await.is_ok()
        };

        let (outcome, exporter_cancelled) = tokio::join!(
            network
                .bank
                .begin_transition(network.bank_request(BOND_ID, risk(3))),
            counterparties,
        );

        match outcome.unwrap() {
            WorkflowOutcome::Aborted {
                stage: WorkflowStage::CollectingEndorsements,
                reason: AmendmentError::EndorsementRejected { party, reason },
            } => {
                assert_eq!(party, network.participants.guarantor);
                assert_eq!(reason, "risk appetite exhausted");
            }
            other => panic!("Expected guarantor rejection, got {:?}", other),
        }
        assert!(exporter_cancelled, "exporter session was not cancelled");

        let mut cancelled = None;
        while let Ok(event) = events.try_recv() {
            if let AmendmentEvent::SessionsCancelled { pending, .. } = event {
                cancelled = Some(pending);
            }
        }
        assert_eq!(cancelled, Some(1));
        assert_eq!(network.vault.find_current(BOND_ID).unwrap().reference, genesis);

        network.shutdown();
    }
}
