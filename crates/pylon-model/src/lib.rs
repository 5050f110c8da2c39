mod domain;
pub use domain::{
    Allocation, AllocationId, EggId, Environment, LocationId, NodeId, PackId, ServerId, UserId,
};

mod error;
pub use error::{ModelError, ModelResult};

mod rules;
pub use rules::{Constraint, Presence, Reference, ResourceKind, RuleCatalog, RuleSet, ValueKind};

mod server;
pub use server::{Resource, Server};

mod request;
pub use request::{AllocationStrategy, DeployBlock, ResourceLimits, ValidatedRequest};

mod payload;
pub use payload::CreationPayload;

mod deployment;
pub use deployment::{DeploymentSpec, PortRange};
