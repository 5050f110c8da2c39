use crate::rules::{Constraint, Reference, ResourceKind, RuleSet, ValueKind};

/// Resource that declares its own creation rules.
pub trait Resource {
    const KIND: ResourceKind;

    /// Constraints every attribute must satisfy when a record is created.
    fn create_rules() -> RuleSet;
}

/// Managed game/application server.
#[derive(Clone, Copy, Debug, Default)]
pub struct Server;

impl Resource for Server {
    const KIND: ResourceKind = ResourceKind::Server;

    fn create_rules() -> RuleSet {
        RuleSet::new()
            .with(
                "owner_id",
                Constraint::required(ValueKind::Integer).exists(Reference::Users),
            )
            .with("name", Constraint::required(ValueKind::String).between(1, 255))
            .with("description", Constraint::sometimes(ValueKind::String))
            .with("memory", Constraint::required(ValueKind::Integer).min(0))
            .with("swap", Constraint::required(ValueKind::Integer).min(-1))
            .with("io", Constraint::required(ValueKind::Integer).between(10, 1000))
            .with("cpu", Constraint::required(ValueKind::Integer).min(0))
            .with("disk", Constraint::required(ValueKind::Integer).min(0))
            .with(
                "egg_id",
                Constraint::required(ValueKind::Integer).exists(Reference::Eggs),
            )
            .with(
                "pack_id",
                Constraint::sometimes(ValueKind::Integer).nullable().min(0),
            )
            .with("image", Constraint::required(ValueKind::String).max(255))
            .with("startup", Constraint::required(ValueKind::String))
            .with("skip_scripts", Constraint::sometimes(ValueKind::Boolean))
            .with(
                "allocation_id",
                Constraint::required(ValueKind::Integer)
                    .min(1)
                    .exists(Reference::Allocations)
                    .bail(),
            )
    }
}
