//! Referential-integrity lookups used by the validator.
//!
//! Lookups are blocking reads against an external store. The validator may call them
//! several times per request (once per `allocation.additional` entry) and treats any
//! negative answer as a validation failure.
mod inventory;
pub use inventory::Inventory;

use std::sync::Arc;

use pylon_model::{AllocationId, NodeId, Reference};

/// Read-only existence checks against the record store.
pub trait ReferentialChecker {
    /// Returns `true` iff allocation `id` belongs to `node` and has no server assigned.
    fn allocation_exists(&self, id: AllocationId, node: NodeId) -> bool;

    /// Returns `true` iff a record with key `id` exists in the referenced table.
    fn record_exists(&self, reference: Reference, id: u64) -> bool;
}

impl<T> ReferentialChecker for &T
where
    T: ReferentialChecker + ?Sized,
{
    fn allocation_exists(&self, id: AllocationId, node: NodeId) -> bool {
        (**self).allocation_exists(id, node)
    }

    fn record_exists(&self, reference: Reference, id: u64) -> bool {
        (**self).record_exists(reference, id)
    }
}

impl<T> ReferentialChecker for Arc<T>
where
    T: ReferentialChecker + ?Sized,
{
    fn allocation_exists(&self, id: AllocationId, node: NodeId) -> bool {
        (**self).allocation_exists(id, node)
    }

    fn record_exists(&self, reference: Reference, id: u64) -> bool {
        (**self).record_exists(reference, id)
    }
}
