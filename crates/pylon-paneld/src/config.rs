use std::{
    collections::BTreeMap,
    net::{Ipv4Addr, SocketAddr},
    path::Path,
};

use anyhow::{Context, bail};
use pylon_core::Inventory;
use pylon_model::{Allocation, AllocationId, EggId, LocationId, NodeId, ServerId, UserId};
use pylon_observe::LoggerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaneldConfig {
    pub listen: SocketAddr,
    pub logger: LoggerConfig,
    pub inventory: InventoryConfig,
}

impl Default for PaneldConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            logger: LoggerConfig::default(),
            inventory: InventoryConfig::default(),
        }
    }
}

impl PaneldConfig {
    /// Read the config at `path`, or use defaults when there is none.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Records the panel knows about at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub users: Vec<UserId>,
    pub eggs: Vec<EggId>,
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: NodeId,
    #[serde(default)]
    pub location: Option<LocationId>,
    #[serde(default)]
    pub allocations: Vec<AllocationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationConfig {
    pub id: AllocationId,
    pub ip: String,
    pub port: u16,
    #[serde(default)]
    pub server_id: Option<ServerId>,
}

impl InventoryConfig {
    /// Build the record store. Allocation ids must be unique across nodes.
    pub fn inventory(&self) -> anyhow::Result<Inventory> {
        let mut inventory = Inventory::new();
        for user in &self.users {
            inventory = inventory.with_user(*user);
        }
        for egg in &self.eggs {
            inventory = inventory.with_egg(*egg);
        }

        for node in &self.nodes {
            for a in &node.allocations {
                if let Some(existing) = inventory.allocation(a.id) {
                    bail!(
                        "allocation {} is declared on node {} and node {}",
                        a.id,
                        existing.node_id,
                        node.id
                    );
                }
                inventory = inventory.with_allocation(Allocation {
                    id: a.id,
                    node_id: node.id,
                    ip: a.ip.clone(),
                    port: a.port,
                    server_id: a.server_id,
                });
            }
        }
        Ok(inventory)
    }

    /// Location of every node that declares one.
    pub fn locations(&self) -> BTreeMap<NodeId, LocationId> {
        self.nodes
            .iter()
            .filter_map(|n| n.location.map(|l| (n.id, l)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylon_core::ReferentialChecker;
    use pylon_model::Reference;
    use pylon_observe::LogFormat;

    const EXAMPLE: &str = include_str!("../paneld.example.json");

    #[test]
    fn example_config_parses() {
        let config = PaneldConfig::parse(EXAMPLE).unwrap();

        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.logger.format, LogFormat::Text);
        assert_eq!(config.logger.filter.as_str(), "pylon_core=debug,info");
        assert_eq!(config.inventory.nodes.len(), 2);
    }

    #[test]
    fn example_inventory_answers_lookups() {
        let config = PaneldConfig::parse(EXAMPLE).unwrap();
        let inv = config.inventory.inventory().unwrap();

        assert!(inv.record_exists(Reference::Users, 2));
        assert!(inv.record_exists(Reference::Eggs, 5));
        assert!(inv.allocation_exists(AllocationId(5), NodeId(3)));
        assert!(!inv.allocation_exists(AllocationId(20), NodeId(7)));
        assert!(inv.allocation_exists(AllocationId(21), NodeId(7)));

        let locations = config.inventory.locations();
        assert_eq!(locations.get(&NodeId(7)), Some(&LocationId(2)));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = PaneldConfig::parse("{}").unwrap();
        assert_eq!(config.listen, PaneldConfig::default().listen);
        assert!(config.inventory.nodes.is_empty());
    }

    #[test]
    fn missing_path_uses_defaults() {
        let config = PaneldConfig::load(None).unwrap();
        assert_eq!(config.listen.ip(), Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn unreadable_path_names_the_file() {
        let err = PaneldConfig::load(Some(Path::new("/nonexistent/paneld.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/paneld.json"));
    }

    #[test]
    fn duplicate_allocation_ids_are_rejected() {
        let config = PaneldConfig::parse(
            r#"{"inventory": {"nodes": [
                {"id": 1, "allocations": [{"id": 5, "ip": "10.0.0.1", "port": 1}]},
                {"id": 2, "allocations": [{"id": 5, "ip": "10.0.0.2", "port": 1}]}
            ]}}"#,
        )
        .unwrap();

        let err = config.inventory.inventory().unwrap_err();
        assert!(err.to_string().contains("allocation 5"));
    }
}
