use serde::{Deserialize, Serialize};

use crate::{AllocationId, EggId, Environment, LocationId, NodeId, PackId, UserId};

/// Resource limits applied to a server.
///
/// All five values are always present once a request passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Memory in MiB; `0` means unlimited.
    pub memory: i64,
    /// Swap in MiB; `-1` means unlimited, `0` disables swap.
    pub swap: i64,
    /// Disk in MiB; `0` means unlimited.
    pub disk: i64,
    /// Block IO weight (10..=1000).
    pub io: i64,
    /// CPU limit in percent of a single core; `0` means unlimited.
    pub cpu: i64,
}

/// Parameters of an automatic deployment request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployBlock {
    pub dedicated_ip: bool,
    pub locations: Vec<LocationId>,
    pub port_range: Vec<String>,
}

/// How the server obtains its network allocation.
///
/// Selected by the presence of the `deploy` key: without it the caller must name
/// allocations explicitly, with it the scheduler picks one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum AllocationStrategy {
    /// Caller supplies allocations on the target node.
    Explicit {
        default_id: AllocationId,
        additional_ids: Vec<AllocationId>,
    },
    /// Scheduler picks a node and allocation.
    AutoDeploy(DeployBlock),
}

impl AllocationStrategy {
    pub fn is_auto_deploy(&self) -> bool {
        matches!(self, AllocationStrategy::AutoDeploy(_))
    }

    /// Returns the strategy name as a static string.
    pub fn name(&self) -> &'static str {
        match self {
            AllocationStrategy::Explicit { .. } => "explicit",
            AllocationStrategy::AutoDeploy(_) => "auto_deploy",
        }
    }
}

/// Typed creation request that passed every validation rule.
///
/// Field names follow the external request; [`crate::CreationPayload`] carries the internal names.
/// Optional flags stay `None` when the caller did not send them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedRequest {
    pub node_id: NodeId,
    pub name: String,
    pub description: Option<String>,
    pub user: UserId,
    pub egg: EggId,
    pub pack: Option<PackId>,
    pub docker_image: String,
    pub startup: String,
    pub environment: Environment,
    pub skip_scripts: Option<bool>,
    pub limits: ResourceLimits,
    pub start_on_completion: Option<bool>,
    pub allocation: AllocationStrategy,
}

impl ValidatedRequest {
    /// Deploy block, if automatic deployment was requested.
    pub fn deploy(&self) -> Option<&DeployBlock> {
        match &self.allocation {
            AllocationStrategy::AutoDeploy(block) => Some(block),
            AllocationStrategy::Explicit { .. } => None,
        }
    }
}
