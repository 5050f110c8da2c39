//! Server creation request validation.
//!
//! [`RequestValidator`] turns a raw JSON request into a [`ValidatedRequest`] or a
//! [`ValidationError`] listing every violated rule. Static rules come from the
//! [`RuleCatalog`]; the allocation rules depend on which [`AllocationStrategy`] the
//! request selects:
//! - without a `deploy` key, `allocation.default` (and each `allocation.additional` entry)
//!   must reference a free allocation on the target node;
//! - with a `deploy` key, `deploy.locations` and `deploy.port_range` must be present and
//!   the `allocation` block is ignored, unless `deploy` is falsy (`null`, `false`, `0`,
//!   `"0"`, a blank string or an empty array), in which case both rule sets report.
mod rules;
mod scope;

#[cfg(test)]
mod tests;

use pylon_model::{
    AllocationId, AllocationStrategy, Constraint, DeployBlock, Environment, LocationId, NodeId,
    ResourceKind, ResourceLimits, RuleCatalog, ValidatedRequest,
};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::{
    error::{CoreError, CoreResult},
    refs::ReferentialChecker,
    violation::{ValidationError, ViolationKind},
};

use self::{
    rules::ServerRules,
    scope::{Checked, Outcome, Rejected, Scope},
};

/// Validates server creation requests against the catalog's server rules.
#[derive(Clone, Debug)]
pub struct RequestValidator {
    rules: ServerRules,
}

impl RequestValidator {
    /// Build a validator from the server rules registered in `catalog`.
    pub fn new(catalog: &RuleCatalog) -> CoreResult<Self> {
        let set = catalog
            .rules_for(ResourceKind::Server)
            .ok_or(CoreError::UnknownResource(ResourceKind::Server))?;

        Ok(Self {
            rules: ServerRules::resolve(set)?,
        })
    }

    /// Validate `raw` for creation on `node_id`.
    ///
    /// A body that is not a JSON object is treated as an empty request.
    /// Existence checks go through `refs` and may run several times per request.
    #[instrument(level = "debug", skip_all, fields(node = %node_id))]
    pub fn validate<R>(
        &self,
        raw: &Value,
        node_id: NodeId,
        refs: &R,
    ) -> Result<ValidatedRequest, ValidationError>
    where
        R: ReferentialChecker + ?Sized,
    {
        let empty = Map::new();
        let input = raw.as_object().unwrap_or(&empty);
        let rules = &self.rules;
        let mut scope = Scope::new(node_id, refs);

        let name = scope.text("name", input.get("name"), &rules.name);
        let name = scope.require("name", name);
        let description = scope.text("description", input.get("description"), &rules.description);

        let user = scope.integer("user", input.get("user"), &rules.owner_id);
        let user = scope.require("user", user).and_then(|id| scope.key("user", id));
        let egg = scope.integer("egg", input.get("egg"), &rules.egg_id);
        let egg = scope.require("egg", egg).and_then(|id| scope.key("egg", id));
        let pack = match scope.integer("pack", input.get("pack"), &rules.pack_id) {
            Ok(Some(id)) => scope.key("pack", id).map(Some),
            Ok(None) => Ok(None),
            Err(rejected) => Err(rejected),
        };

        let docker_image = scope.text("docker_image", input.get("docker_image"), &rules.image);
        let docker_image = scope.require("docker_image", docker_image);
        let startup = scope.text("startup", input.get("startup"), &rules.startup);
        let startup = scope.require("startup", startup);

        let environment =
            scope.object("environment", input.get("environment"), &rules::ENVIRONMENT);
        let environment = scope
            .require("environment", environment)
            .and_then(|vars| environment_from(&mut scope, vars));

        let skip_scripts =
            scope.boolean("skip_scripts", input.get("skip_scripts"), &rules.skip_scripts);
        let start_on_completion = scope.boolean(
            "start_on_completion",
            input.get("start_on_completion"),
            &rules::START_ON_COMPLETION,
        );

        let limits = self.limits(&mut scope, input.get("limits"));

        let deploy = input.get("deploy");
        let allocation = match deploy {
            Some(block) => self
                .auto_deploy(&mut scope, block)
                .map(AllocationStrategy::AutoDeploy),
            None => self.explicit(&mut scope, input.get("allocation")),
        };
        // a falsy deploy is rejected above but does not lift the allocation rules
        if deploy.is_some_and(is_falsy) {
            let _ = self.explicit(&mut scope, input.get("allocation"));
        }

        let errors = scope.finish();
        let assembled = (|| -> Outcome<ValidatedRequest> {
            Ok(ValidatedRequest {
                node_id,
                name: name?,
                description: description?,
                user: user?,
                egg: egg?,
                pack: pack?,
                docker_image: docker_image?,
                startup: startup?,
                environment: environment?,
                skip_scripts: skip_scripts?,
                limits: limits?,
                start_on_completion: start_on_completion?,
                allocation: allocation?,
            })
        })();

        match assembled {
            Ok(request) if errors.is_empty() => {
                debug!(strategy = request.allocation.name(), "request validated");
                Ok(request)
            }
            _ => {
                debug!(fields = errors.len(), "request rejected");
                Err(errors)
            }
        }
    }

    /// All five limits are reported individually, also when `limits` itself is missing.
    fn limits<R>(
        &self,
        scope: &mut Scope<'_, R>,
        value: Option<&Value>,
    ) -> Outcome<ResourceLimits>
    where
        R: ReferentialChecker + ?Sized,
    {
        let block = scope.object("limits", value, &rules::LIMITS);
        let block = block.ok().flatten();
        let field = |key: &str| block.and_then(|b| b.get(key));
        let rules = &self.rules;

        let mut limit = |key: &str, rule: &Constraint| {
            let path = format!("limits.{key}");
            let v = scope.integer(&path, field(key), rule);
            scope.require(&path, v)
        };

        let memory = limit("memory", &rules.memory);
        let swap = limit("swap", &rules.swap);
        let disk = limit("disk", &rules.disk);
        let io = limit("io", &rules.io);
        let cpu = limit("cpu", &rules.cpu);

        Ok(ResourceLimits {
            memory: memory?,
            swap: swap?,
            disk: disk?,
            io: io?,
            cpu: cpu?,
        })
    }

    /// Caller-selected allocations. `allocation.default` bails at its first failing
    /// clause; `allocation.additional` entries are checked one by one without bail.
    fn explicit<R>(
        &self,
        scope: &mut Scope<'_, R>,
        value: Option<&Value>,
    ) -> Outcome<AllocationStrategy>
    where
        R: ReferentialChecker + ?Sized,
    {
        let block = value.and_then(Value::as_object);
        let field = |key: &str| block.and_then(|b| b.get(key));

        let default_id = scope.integer(
            "allocation.default",
            field("default"),
            &self.rules.allocation_id,
        );
        let default_id = scope
            .require("allocation.default", default_id)
            .and_then(|id| scope.key::<AllocationId>("allocation.default", id));

        let additional_ids = match scope.array(
            "allocation.additional",
            field("additional"),
            &rules::ADDITIONAL,
        ) {
            // entries that resolved are non-negative
            Ok(Some(items)) => scope
                .each(
                    "allocation.additional",
                    items,
                    &rules::ADDITIONAL_ENTRY,
                    Checked::into_integer,
                )
                .map(|ids| ids.into_iter().map(|id| AllocationId(id.unsigned_abs())).collect()),
            Ok(None) => Ok(Vec::new()),
            Err(rejected) => Err(rejected),
        };

        Ok(AllocationStrategy::Explicit {
            default_id: default_id?,
            additional_ids: additional_ids?,
        })
    }

    /// Scheduler-selected allocation.
    fn auto_deploy<R>(&self, scope: &mut Scope<'_, R>, value: &Value) -> Outcome<DeployBlock>
    where
        R: ReferentialChecker + ?Sized,
    {
        let block = scope.object("deploy", Some(value), &rules::DEPLOY);
        let block = scope.require("deploy", block)?;

        let dedicated_ip =
            scope.boolean("deploy.dedicated_ip", block.get("dedicated_ip"), &rules::DEDICATED_IP);
        let dedicated_ip = scope.require("deploy.dedicated_ip", dedicated_ip);

        // entries are at least 1
        let locations = deploy_list(scope, block, "locations")
            .and_then(|items| {
                scope.each(
                    "deploy.locations",
                    items,
                    &rules::LOCATION_ENTRY,
                    Checked::into_integer,
                )
            })
            .map(|ids| ids.into_iter().map(|id| LocationId(id.unsigned_abs())).collect());

        let port_range = deploy_list(scope, block, "port_range").and_then(|items| {
            scope.each(
                "deploy.port_range",
                items,
                &rules::PORT_ENTRY,
                Checked::into_text,
            )
        });

        Ok(DeployBlock {
            dedicated_ip: dedicated_ip?,
            locations: locations?,
            port_range: port_range?,
        })
    }
}

/// Loose falsiness of a `deploy` value. An object, even `{}`, is never falsy.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => matches!(s.trim(), "" | "0"),
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}

/// A deploy list key must exist; its value must then be an array (possibly empty).
fn deploy_list<'v, R>(
    scope: &mut Scope<'_, R>,
    block: &'v Map<String, Value>,
    key: &str,
) -> Outcome<&'v [Value]>
where
    R: ReferentialChecker + ?Sized,
{
    let path = format!("deploy.{key}");
    scope.present(&path, block.contains_key(key))?;
    let items = scope.array(&path, block.get(key), &rules::DEPLOY_LIST);
    scope.require(&path, items)
}

/// Scalars become strings, `null` becomes an empty string, nested values are rejected.
fn environment_from<R>(
    scope: &mut Scope<'_, R>,
    vars: &Map<String, Value>,
) -> Outcome<Environment>
where
    R: ReferentialChecker + ?Sized,
{
    let mut env = Environment::new();
    let mut failed = false;

    for (key, value) in vars {
        let rendered = match value {
            Value::Null => String::new(),
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Value::Array(_) | Value::Object(_) => {
                let path = format!("environment.{key}");
                let message = format!("The {path} must be a string, number or boolean.");
                scope.reject(&path, ViolationKind::Schema, message);
                failed = true;
                continue;
            }
        };
        env.insert(key.as_str(), rendered);
    }

    if failed { Err(Rejected) } else { Ok(env) }
}
