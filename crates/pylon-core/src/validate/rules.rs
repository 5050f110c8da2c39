use pylon_model::{Constraint, Reference, RuleSet, ValueKind};

use crate::error::{CoreError, CoreResult};

/// Server creation rules resolved from the catalog once, at validator construction.
#[derive(Clone, Debug)]
pub(crate) struct ServerRules {
    pub name: Constraint,
    pub description: Constraint,
    pub owner_id: Constraint,
    pub egg_id: Constraint,
    pub pack_id: Constraint,
    pub image: Constraint,
    pub startup: Constraint,
    pub memory: Constraint,
    pub swap: Constraint,
    pub disk: Constraint,
    pub io: Constraint,
    pub cpu: Constraint,
    pub skip_scripts: Constraint,
    pub allocation_id: Constraint,
}

impl ServerRules {
    pub(crate) fn resolve(set: &RuleSet) -> CoreResult<Self> {
        let rule = |field: &'static str| {
            set.get(field)
                .copied()
                .ok_or(CoreError::MissingRule(field))
        };

        Ok(Self {
            name: rule("name")?,
            description: rule("description")?.nullable(),
            owner_id: rule("owner_id")?,
            egg_id: rule("egg_id")?,
            pack_id: rule("pack_id")?,
            image: rule("image")?,
            startup: rule("startup")?,
            memory: rule("memory")?,
            swap: rule("swap")?,
            disk: rule("disk")?,
            io: rule("io")?,
            cpu: rule("cpu")?,
            skip_scripts: rule("skip_scripts")?,
            allocation_id: rule("allocation_id")?,
        })
    }
}

// Request-level rules with no counterpart on the server entity.
pub(crate) const ENVIRONMENT: Constraint = Constraint::required(ValueKind::Object);
pub(crate) const LIMITS: Constraint = Constraint::required(ValueKind::Object);
pub(crate) const START_ON_COMPLETION: Constraint = Constraint::sometimes(ValueKind::Boolean);

pub(crate) const DEPLOY: Constraint = Constraint::sometimes(ValueKind::Object);
pub(crate) const DEDICATED_IP: Constraint = Constraint::required(ValueKind::Boolean);
pub(crate) const DEPLOY_LIST: Constraint = Constraint::sometimes(ValueKind::Array);
pub(crate) const LOCATION_ENTRY: Constraint = Constraint::sometimes(ValueKind::Integer).min(1);
pub(crate) const PORT_ENTRY: Constraint = Constraint::sometimes(ValueKind::String);

pub(crate) const ADDITIONAL: Constraint = Constraint::sometimes(ValueKind::Array).nullable();
pub(crate) const ADDITIONAL_ENTRY: Constraint =
    Constraint::sometimes(ValueKind::Integer).exists(Reference::Allocations);
