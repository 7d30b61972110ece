//! # Integration Test Flows
//!
//! One bank assessment at a time against a live three-party network:
//!
//! 1. **Bank → Exporter, Guarantor**: proposal fans out over channel sessions
//! 2. **Responders**: each validates and applies its own acceptance policy
//! 3. **Bank → Notary**: fully endorsed transition is sequenced into the vault

#[cfg(test)]
mod tests {
    use super::super::fixtures::{config, network_with, BOND_ID};
    use bond_amendment::domain::build_bank_assessment;
    use bond_amendment::ports::{
        AmendmentApi, EndorsementReply, RecordStore, SessionProvider, WorkflowOutcome,
    };
    use bond_amendment::{AmendmentError, AmendmentEvent, WorkflowStage};
    use bond_node::ExporterBooks;
    use shared_types::{SignedProposal, TermsUpdate};
    use uuid::Uuid;

    fn risk(level: u8) -> TermsUpdate {
        TermsUpdate {
            risk_level: Some(level),
            ..Default::default()
        }
    }

    // =============================================================================
    // HAPPY PATH
    // =============================================================================

    #[tokio::test]
    async fn test_bank_assessment_commits() {
        let (network, bus, genesis) = network_with(&config());
        let mut events = bus.subscribe();

        let update = TermsUpdate {
            bank_supply_contract_id: Some("SC-77".into()),
            risk_level: Some(3),
            credit_score: Some(2.5),
            ..Default::default()
        };
        let outcome = network
            .bank
            .begin_transition(network.bank_request(BOND_ID, update))
            .await
            .unwrap();

        let version = outcome.committed_version().cloned().expect("committed");
        assert_eq!(version.sequence, genesis.sequence + 1);

        let current = network.vault.find_current(BOND_ID).unwrap();
        assert_eq!(current.reference, version);
        assert_eq!(current.state.terms.risk_level, 3);
        assert_eq!(current.state.terms.credit_score, 2.5);
        assert_eq!(current.state.terms.bank_supply_contract_id.as_deref(), Some("SC-77"));
        assert_eq!(current.state.face_value, 1000);
        assert_eq!(current.state.participants, network.participants);

        assert_eq!(network.vault.current_count(BOND_ID), 1);
        assert_eq!(network.vault.history(BOND_ID).len(), 2);
        assert_eq!(network.notary.commits(), 1);
        assert_eq!(network.sessions.sessions_opened(), 2);

        let mut endorsed_by = Vec::new();
        let mut committed = false;
        while let Ok(event) = events.try_recv() {
            match event {
                AmendmentEvent::EndorsementCollected { signer, .. } => endorsed_by.push(signer),
                AmendmentEvent::Committed { version: v, .. } => {
                    assert_eq!(v, version);
                    committed = true;
                }
                AmendmentEvent::Aborted { reason, .. } => panic!("unexpected abort: {reason}"),
                _ => {}
            }
        }
        assert!(committed, "Expected a Committed event");
        assert_eq!(endorsed_by.len(), 2);
        assert!(endorsed_by.contains(&network.participants.exporter));
        assert!(endorsed_by.contains(&network.participants.guarantor));
        assert!(!endorsed_by.contains(&network.participants.bank));

        network.shutdown();
    }

    #[tokio::test]
    async fn test_successive_assessments_keep_one_current_version() {
        let (network, _bus, genesis) = network_with(&config());

        for level in [3, 4, 2] {
            let outcome = network
                .bank
                .begin_transition(network.bank_request(BOND_ID, risk(level)))
                .await
                .unwrap();
            assert!(outcome.is_committed(), "risk {level}: {:?}", outcome);
            assert_eq!(network.vault.current_count(BOND_ID), 1);
        }

        let history = network.vault.history(BOND_ID);
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].reference, genesis);
        assert_eq!(history[3].reference.sequence, 3);
        assert_eq!(history[3].state.terms.risk_level, 2);

        network.shutdown();
    }

    // =============================================================================
    // REJECTIONS
    // =============================================================================

    #[tokio::test]
    async fn test_exporter_rejects_turnover_mismatch() {
        let mut cfg = config();
        cfg.exporter_books = ExporterBooks {
            turnover: 500.0,
            net: 0.0,
        };
        let (network, _bus, genesis) = network_with(&cfg);

        let update = TermsUpdate {
            exporter_turnover: Some(400.0),
            risk_level: Some(3),
            ..Default::default()
        };
        let outcome = network
            .bank
            .begin_transition(network.bank_request(BOND_ID, update))
            .await
            .unwrap();

        match outcome {
            WorkflowOutcome::Aborted {
                stage: WorkflowStage::CollectingEndorsements,
                reason: AmendmentError::EndorsementRejected { party, reason },
            } => {
                assert_eq!(party, network.participants.exporter);
                assert_eq!(reason, "turnover mismatch");
            }
            other => panic!("Expected exporter rejection, got {:?}", other),
        }

        let current = network.vault.find_current(BOND_ID).unwrap();
        assert_eq!(current.reference, genesis);
        assert_eq!(network.notary.commits(), 0);

        network.shutdown();
    }

    #[tokio::test]
    async fn test_guarantor_rejects_above_risk_ceiling() {
        let mut cfg = config();
        cfg.guarantor_max_risk = 2;
        let (network, _bus, genesis) = network_with(&cfg);

        let outcome = network
            .bank
            .begin_transition(network.bank_request(BOND_ID, risk(3)))
            .await
            .unwrap();

        match outcome.abort_reason() {
            Some(AmendmentError::EndorsementRejected { party, reason }) => {
                assert_eq!(party, &network.participants.guarantor);
                assert!(reason.contains("exceeds ceiling 2"), "{reason}");
            }
            other => panic!("Expected guarantor rejection, got {:?}", other),
        }
        assert_eq!(network.vault.find_current(BOND_ID).unwrap().reference, genesis);

        network.shutdown();
    }

    #[tokio::test]
    async fn test_non_bank_proposer_opens_no_sessions() {
        let (network, _bus, genesis) = network_with(&config());

        let mut request = network.bank_request(BOND_ID, risk(3));
        request.proposer = network.participants.exporter.clone();
        let outcome = network.bank.begin_transition(request).await.unwrap();

        match outcome {
            WorkflowOutcome::Aborted {
                stage: WorkflowStage::Preparing,
                reason: AmendmentError::Unauthorized { proposer, expected },
            } => {
                assert_eq!(proposer, network.participants.exporter);
                assert_eq!(expected, network.participants.bank);
            }
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
        assert_eq!(network.sessions.sessions_opened(), 0);
        assert_eq!(network.vault.find_current(BOND_ID).unwrap().reference, genesis);

        network.shutdown();
    }

    #[tokio::test]
    async fn test_unknown_record_aborts_before_sessions() {
        let (network, _bus, _genesis) = network_with(&config());

        let outcome = network
            .bank
            .begin_transition(network.bank_request("B-404", risk(3)))
            .await
            .unwrap();

        assert!(matches!(
            outcome.abort_reason(),
            Some(AmendmentError::NotFound { record_id }) if record_id == "B-404"
        ));
        assert_eq!(network.sessions.sessions_opened(), 0);

        network.shutdown();
    }

    #[tokio::test]
    async fn test_counterparty_rejects_two_input_proposal() {
        let (network, _bus, _genesis) = network_with(&config());
        let current = network.vault.find_current(BOND_ID).unwrap();

        let mut proposal = build_bank_assessment(
            Uuid::new_v4(),
            &current,
            &network.participants.bank,
            &risk(3),
        );
        proposal.inputs.push(current.clone());
        let digest = proposal.digest().unwrap();
        let mut signed = SignedProposal::new(proposal);
        signed
            .add_endorsement(network.bank.identity().endorse(digest))
            .unwrap();

        let mut session = network
            .sessions
            .open_session(&network.participants.exporter)
            .await
            .unwrap();
        let reply = session.request_endorsement(signed).await.unwrap();

        match reply {
            EndorsementReply::Rejected { reason } => {
                assert_eq!(reason, "transition must consume exactly one input version")
            }
            EndorsementReply::Endorsed(_) => panic!("two-input proposal was endorsed"),
        }

        network.shutdown();
    }
}
