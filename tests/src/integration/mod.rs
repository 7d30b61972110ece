//! Integration flows across the three parties and the notary.

pub mod concurrency;
pub mod flows;

#[cfg(test)]
pub(crate) mod fixtures {
    use bond_amendment::adapters::BroadcastEventBus;
    use bond_amendment::AmendmentConfig;
    use bond_node::{LocalNetwork, NodeConfig, PartyKeys};
    use shared_types::VersionRef;
    use std::sync::Arc;

    pub const BOND_ID: &str = "B-001";

    pub fn keys() -> PartyKeys {
        PartyKeys::from_seeds([1; 32], [2; 32], [3; 32])
    }

    pub fn config() -> NodeConfig {
        NodeConfig {
            amendment: AmendmentConfig::for_testing(),
            ..NodeConfig::default()
        }
    }

    /// Network with B-001 already issued.
    pub fn network_with(config: &NodeConfig) -> (LocalNetwork, Arc<BroadcastEventBus>, VersionRef) {
        let bus = Arc::new(BroadcastEventBus::new());
        let network = LocalNetwork::start(config, keys(), bus.clone());
        let genesis = network
            .issue_bond(BOND_ID, config.face_value)
            .expect("issue B-001");
        (network, bus, genesis)
    }
}
