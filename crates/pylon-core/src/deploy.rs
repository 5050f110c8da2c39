use pylon_model::{DeploymentSpec, ValidatedRequest};

/// Deployment constraints for an auto-deployed request.
///
/// Returns `None` when the request named its allocations explicitly.
/// Values are taken as validated; repeated location ids are collapsed.
pub fn build_deployment_spec(request: &ValidatedRequest) -> Option<DeploymentSpec> {
    let block = request.deploy()?;

    Some(
        DeploymentSpec::default()
            .with_dedicated_ip(block.dedicated_ip)
            .with_locations(block.locations.iter().copied())
            .with_port_range(block.port_range.iter().cloned()),
    )
}
