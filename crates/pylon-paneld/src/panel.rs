use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use pylon_api::{ProvisioningError, ServerProvisioner};
use pylon_core::{Inventory, ReferentialChecker};
use pylon_model::{
    Allocation, AllocationId, CreationPayload, DeploymentSpec, LocationId, NodeId, Reference,
    ServerId,
};
use tracing::{debug, info};

use crate::config::InventoryConfig;

/// In-process panel: answers referential checks and assigns allocations to new servers.
///
/// Servers are not started anywhere; creation only records the allocation binding.
pub struct Panel {
    inventory: RwLock<Inventory>,
    locations: BTreeMap<NodeId, LocationId>,
    next_server: AtomicU64,
}

impl Panel {
    pub fn new(inventory: Inventory, locations: BTreeMap<NodeId, LocationId>) -> Self {
        let next_server = inventory
            .allocations()
            .filter_map(|a| a.server_id)
            .map(|id| id.get() + 1)
            .max()
            .unwrap_or(1);

        Self {
            inventory: RwLock::new(inventory),
            locations,
            next_server: AtomicU64::new(next_server),
        }
    }

    pub fn from_config(config: &InventoryConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.inventory()?, config.locations()))
    }

    /// Pick the first free allocation satisfying `spec`.
    fn select(
        &self,
        inventory: &Inventory,
        spec: &DeploymentSpec,
    ) -> Result<AllocationId, ProvisioningError> {
        let ranges = spec
            .port_ranges()
            .map_err(|e| ProvisioningError::NoViableAllocation(e.to_string()))?;

        let in_location = |a: &Allocation| {
            spec.locations.is_empty()
                || self
                    .locations
                    .get(&a.node_id)
                    .is_some_and(|l| spec.locations.contains(l))
        };
        let in_ports =
            |a: &Allocation| ranges.is_empty() || ranges.iter().any(|r| r.contains(a.port));
        let ip_is_free = |a: &Allocation| {
            !inventory
                .allocations()
                .any(|o| o.node_id == a.node_id && o.ip == a.ip && !o.is_unassigned())
        };

        inventory
            .allocations()
            .filter(|a| a.is_unassigned())
            .filter(|a| in_location(a))
            .filter(|a| in_ports(a))
            .find(|a| !spec.dedicated_ip || ip_is_free(a))
            .map(|a| a.id)
            .ok_or_else(|| {
                ProvisioningError::NoViableAllocation(
                    "no free allocation matches the deployment constraints".into(),
                )
            })
    }
}

impl ReferentialChecker for Panel {
    fn allocation_exists(&self, id: AllocationId, node: NodeId) -> bool {
        let inventory = self.inventory.read().unwrap_or_else(PoisonError::into_inner);
        inventory.allocation_exists(id, node)
    }

    fn record_exists(&self, reference: Reference, id: u64) -> bool {
        let inventory = self.inventory.read().unwrap_or_else(PoisonError::into_inner);
        inventory.record_exists(reference, id)
    }
}

#[async_trait]
impl ServerProvisioner for Panel {
    async fn create_server(
        &self,
        payload: CreationPayload,
        deployment: Option<DeploymentSpec>,
    ) -> Result<ServerId, ProvisioningError> {
        let mut inventory = self
            .inventory
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let (primary, additional) = match (&deployment, payload.allocation_id) {
            (Some(spec), _) => (self.select(&inventory, spec)?, Vec::new()),
            (None, Some(id)) => (id, payload.allocation_additional.clone()),
            (None, None) => {
                return Err(ProvisioningError::Backend(
                    "payload names no allocation and carries no deployment".into(),
                ));
            }
        };

        let wanted: Vec<AllocationId> = std::iter::once(primary).chain(additional).collect();
        let mut seen = BTreeSet::new();
        if let Some(twice) = wanted.iter().find(|id| !seen.insert(**id)) {
            return Err(ProvisioningError::NoViableAllocation(format!(
                "allocation {twice} is requested more than once"
            )));
        }

        // validation ran without the lock; recheck before binding anything
        if let Some(taken) = wanted
            .iter()
            .find(|id| !inventory.allocation(**id).is_some_and(Allocation::is_unassigned))
        {
            return Err(ProvisioningError::NoViableAllocation(format!(
                "allocation {taken} is no longer available"
            )));
        }

        let server = ServerId(self.next_server.fetch_add(1, Ordering::Relaxed));
        for id in wanted {
            if !inventory.assign(id, server) {
                return Err(ProvisioningError::Backend(format!(
                    "allocation {id} could not be bound to server {server}"
                )));
            }
            debug!(allocation = %id, %server, "allocation assigned");
        }

        info!(
            %server,
            name = %payload.name,
            owner = %payload.owner_id,
            egg = %payload.egg_id,
            allocation = %primary,
            memory = payload.memory,
            start_on_completion = payload.start_on_completion,
            "server provisioned"
        );
        Ok(server)
    }
}
