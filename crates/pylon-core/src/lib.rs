pub mod deploy;
pub mod error;
pub mod normalize;
pub mod plan;
pub mod refs;
pub mod validate;
pub mod violation;

pub use deploy::build_deployment_spec;
pub use error::{CoreError, CoreResult};
pub use normalize::normalize;
pub use plan::CreationPlan;
pub use refs::{Inventory, ReferentialChecker};
pub use validate::RequestValidator;
pub use violation::{ValidationError, Violation, ViolationKind};

pub mod prelude {
    pub use crate::error::CoreError;
    pub use crate::plan::CreationPlan;
    pub use crate::refs::{Inventory, ReferentialChecker};
    pub use crate::validate::RequestValidator;
    pub use crate::violation::ValidationError;
}
