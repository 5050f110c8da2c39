use std::collections::{BTreeMap, BTreeSet};

use pylon_model::{Allocation, AllocationId, EggId, NodeId, Reference, ServerId, UserId};
use tracing::trace;

use super::ReferentialChecker;

/// In-memory record store answering referential checks.
///
/// Holds the users, eggs and allocations a panel knows about.
#[derive(Clone, Debug, Default)]
pub struct Inventory {
    users: BTreeSet<UserId>,
    eggs: BTreeSet<EggId>,
    allocations: BTreeMap<AllocationId, Allocation>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: UserId) -> Self {
        self.users.insert(id);
        self
    }

    pub fn with_egg(mut self, id: EggId) -> Self {
        self.eggs.insert(id);
        self
    }

    /// Add (or replace) an allocation, keyed by its id.
    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.allocations.insert(allocation.id, allocation);
        self
    }

    pub fn allocation(&self, id: AllocationId) -> Option<&Allocation> {
        self.allocations.get(&id)
    }

    pub fn allocations(&self) -> impl Iterator<Item = &Allocation> {
        self.allocations.values()
    }

    /// Bind a free allocation to `server`. Returns `false` if it is unknown or taken.
    pub fn assign(&mut self, id: AllocationId, server: ServerId) -> bool {
        match self.allocations.get_mut(&id) {
            Some(allocation) if allocation.is_unassigned() => {
                allocation.server_id = Some(server);
                true
            }
            _ => false,
        }
    }

    /// Allocations on `node` that have no server assigned.
    pub fn free_allocations(&self, node: NodeId) -> impl Iterator<Item = &Allocation> {
        self.allocations
            .values()
            .filter(move |a| a.is_available_on(node))
    }
}

impl ReferentialChecker for Inventory {
    fn allocation_exists(&self, id: AllocationId, node: NodeId) -> bool {
        let found = self
            .allocations
            .get(&id)
            .is_some_and(|a| a.is_available_on(node));
        trace!(allocation = %id, node = %node, found, "allocation lookup");
        found
    }

    fn record_exists(&self, reference: Reference, id: u64) -> bool {
        let found = match reference {
            Reference::Users => self.users.contains(&UserId(id)),
            Reference::Eggs => self.eggs.contains(&EggId(id)),
            Reference::Allocations => self.allocations.contains_key(&AllocationId(id)),
        };
        trace!(%reference, id, found, "record lookup");
        found
    }
}
