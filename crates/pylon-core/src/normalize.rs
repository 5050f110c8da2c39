//! Mapping from the external request shape to the creation service's input.
use pylon_model::{AllocationStrategy, CreationPayload, ValidatedRequest};

/// Build the [`CreationPayload`] for a validated request.
///
/// Renames external fields to internal keys and fills in explicit defaults:
/// both flags default to `false`; an auto-deployed request carries no allocation ids.
/// Performs no validation.
pub fn normalize(request: &ValidatedRequest) -> CreationPayload {
    let (allocation_id, allocation_additional) = match &request.allocation {
        AllocationStrategy::Explicit {
            default_id,
            additional_ids,
        } => (Some(*default_id), additional_ids.clone()),
        AllocationStrategy::AutoDeploy(_) => (None, Vec::new()),
    };
    let limits = request.limits;

    CreationPayload {
        name: request.name.clone(),
        description: request.description.clone(),
        owner_id: request.user,
        egg_id: request.egg,
        pack_id: request.pack,
        image: request.docker_image.clone(),
        startup: request.startup.clone(),
        environment: request.environment.clone(),
        memory: limits.memory,
        swap: limits.swap,
        disk: limits.disk,
        io: limits.io,
        cpu: limits.cpu,
        skip_scripts: request.skip_scripts.unwrap_or(false),
        allocation_id,
        allocation_additional,
        start_on_completion: request.start_on_completion.unwrap_or(false),
    }
}
