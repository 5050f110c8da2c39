use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{AllocationId, EggId, Environment, PackId, UserId};

/// Normalized input of the server creation service.
///
/// Keys are fixed and independent of the external request's field names
/// (`user` becomes `owner_id`, `limits.memory` becomes `memory`, and so on).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct CreationPayload {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: UserId,
    pub egg_id: EggId,
    pub pack_id: Option<PackId>,
    pub image: String,
    pub startup: String,
    pub environment: Environment,
    pub memory: i64,
    pub swap: i64,
    pub disk: i64,
    pub io: i64,
    pub cpu: i64,
    pub skip_scripts: bool,
    /// Primary allocation; `None` when the scheduler picks one.
    pub allocation_id: Option<AllocationId>,
    #[serde(default)]
    pub allocation_additional: Vec<AllocationId>,
    pub start_on_completion: bool,
}
