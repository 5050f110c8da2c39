mod ids;
pub use ids::{AllocationId, EggId, LocationId, NodeId, PackId, ServerId, UserId};

mod env;
pub use env::Environment;

mod allocation;
pub use allocation::Allocation;
