use std::cell::Cell;

use pylon_model::{Allocation, EggId, PackId, Reference, ServerId, UserId};
use serde_json::{Value, json};

use super::*;
use crate::refs::Inventory;

/// Counts every lookup it forwards to the inventory.
struct Counting {
    inner: Inventory,
    allocation_lookups: Cell<usize>,
    record_lookups: Cell<usize>,
}

impl Counting {
    fn new(inner: Inventory) -> Self {
        Self {
            inner,
            allocation_lookups: Cell::new(0),
            record_lookups: Cell::new(0),
        }
    }
}

impl ReferentialChecker for Counting {
    fn allocation_exists(&self, id: AllocationId, node: NodeId) -> bool {
        self.allocation_lookups.set(self.allocation_lookups.get() + 1);
        self.inner.allocation_exists(id, node)
    }

    fn record_exists(&self, reference: Reference, id: u64) -> bool {
        self.record_lookups.set(self.record_lookups.get() + 1);
        self.inner.record_exists(reference, id)
    }
}

fn allocation(id: u64, node: u64, server: Option<u64>) -> Allocation {
    Allocation {
        id: AllocationId(id),
        node_id: NodeId(node),
        ip: "10.0.0.2".into(),
        port: 25560 + id as u16,
        server_id: server.map(ServerId),
    }
}

fn inventory() -> Inventory {
    Inventory::new()
        .with_user(UserId(1))
        .with_egg(EggId(4))
        .with_allocation(allocation(5, 3, None))
        .with_allocation(allocation(6, 3, None))
        .with_allocation(allocation(7, 7, None))
        .with_allocation(allocation(8, 3, Some(40)))
}

fn validator() -> RequestValidator {
    RequestValidator::new(&RuleCatalog::new()).expect("server rules are registered")
}

fn request() -> Value {
    json!({
        "name": "alpha",
        "user": 1,
        "egg": 4,
        "docker_image": "quay.io/pterodactyl/core:java",
        "startup": "java -jar server.jar",
        "environment": { "SERVER_JARFILE": "server.jar" },
        "limits": { "memory": 512, "swap": 0, "disk": 1024, "io": 500, "cpu": 100 },
        "allocation": { "default": 5 }
    })
}

fn with(mut base: Value, key: &str, value: Value) -> Value {
    base[key] = value;
    base
}

fn without(mut base: Value, key: &str) -> Value {
    if let Some(map) = base.as_object_mut() {
        map.remove(key);
    }
    base
}

fn deploy(body: Value) -> Value {
    with(without(request(), "allocation"), "deploy", body)
}

#[test]
fn full_request_is_accepted() {
    let raw = with(request(), "description", json!("  lobby  "));
    let raw = with(raw, "pack", json!(2));
    let raw = with(raw, "skip_scripts", json!("1"));
    let raw = with(raw, "start_on_completion", json!(false));

    let req = validator()
        .validate(&raw, NodeId(3), &inventory())
        .expect("valid request");

    assert_eq!(req.node_id, NodeId(3));
    assert_eq!(req.name, "alpha");
    assert_eq!(req.description.as_deref(), Some("lobby"));
    assert_eq!(req.user, UserId(1));
    assert_eq!(req.egg, EggId(4));
    assert_eq!(req.pack, Some(PackId(2)));
    assert_eq!(req.skip_scripts, Some(true));
    assert_eq!(req.start_on_completion, Some(false));
    assert_eq!(req.environment.get("SERVER_JARFILE"), Some("server.jar"));
    assert_eq!(
        req.limits,
        ResourceLimits {
            memory: 512,
            swap: 0,
            disk: 1024,
            io: 500,
            cpu: 100,
        }
    );
}

#[test]
fn explicit_allocation_on_node_is_accepted() {
    let req = validator()
        .validate(&request(), NodeId(3), &inventory())
        .expect("valid request");

    assert_eq!(
        req.allocation,
        AllocationStrategy::Explicit {
            default_id: AllocationId(5),
            additional_ids: vec![],
        }
    );
    assert!(req.deploy().is_none());
    assert_eq!(req.skip_scripts, None);
    assert_eq!(req.description, None);
}

#[test]
fn allocation_on_other_node_is_referential() {
    let raw = with(request(), "allocation", json!({ "default": 7 }));
    let err = validator()
        .validate(&raw, NodeId(3), &inventory())
        .unwrap_err();

    assert_eq!(err.fields().collect::<Vec<_>>(), ["allocation.default"]);
    let violation = &err.get("allocation.default")[0];
    assert_eq!(violation.kind, ViolationKind::Referential);
    assert_eq!(violation.message, "The selected allocation.default is invalid.");
}

#[test]
fn assigned_allocation_is_referential() {
    let raw = with(request(), "allocation", json!({ "default": 8 }));
    let err = validator()
        .validate(&raw, NodeId(3), &inventory())
        .unwrap_err();

    assert_eq!(
        err.get("allocation.default")[0].kind,
        ViolationKind::Referential
    );
}

#[test]
fn empty_deploy_requires_lists_and_dedicated_ip() {
    let raw = deploy(json!({}));
    let err = validator()
        .validate(&raw, NodeId(3), &inventory())
        .unwrap_err();

    assert_eq!(
        err.fields().collect::<Vec<_>>(),
        ["deploy.dedicated_ip", "deploy.locations", "deploy.port_range"]
    );
    assert_eq!(
        err.messages("deploy.dedicated_ip"),
        ["The deploy.dedicated_ip field is required."]
    );
    assert_eq!(
        err.get("deploy.locations")[0].kind,
        ViolationKind::Conditional
    );
    assert_eq!(
        err.messages("deploy.port_range"),
        ["The deploy.port_range field must be present."]
    );
}

#[test]
fn deploy_with_empty_lists_is_accepted() {
    let raw = deploy(json!({ "dedicated_ip": false, "locations": [], "port_range": [] }));
    let req = validator()
        .validate(&raw, NodeId(3), &inventory())
        .expect("valid request");

    assert_eq!(
        req.allocation,
        AllocationStrategy::AutoDeploy(DeployBlock::default())
    );
}

#[test]
fn deploy_ignores_allocation_block() {
    let raw = with(
        request(),
        "allocation",
        json!({ "default": "nope", "additional": "x" }),
    );
    let raw = with(
        raw,
        "deploy",
        json!({ "dedicated_ip": "1", "locations": [2, "3"], "port_range": ["25565-25570"] }),
    );
    let refs = Counting::new(inventory());

    let req = validator()
        .validate(&raw, NodeId(3), &refs)
        .expect("valid request");

    let block = req.deploy().expect("auto deploy");
    assert!(block.dedicated_ip);
    assert_eq!(block.locations, [LocationId(2), LocationId(3)]);
    assert_eq!(block.port_range, ["25565-25570"]);
    assert_eq!(refs.allocation_lookups.get(), 0);
}

#[test]
fn falsy_deploy_still_requires_allocation() {
    for falsy in [Value::Null, json!(false), json!(0), json!(""), json!("0"), json!([])] {
        let raw = deploy(falsy.clone());
        let err = validator()
            .validate(&raw, NodeId(3), &inventory())
            .unwrap_err();

        assert_eq!(
            err.fields().collect::<Vec<_>>(),
            ["allocation.default", "deploy"],
            "deploy={falsy}"
        );
        assert_eq!(err.messages("deploy"), ["The deploy must be an object."]);
        assert_eq!(
            err.messages("allocation.default"),
            ["The allocation.default field is required."]
        );
    }
}

#[test]
fn falsy_deploy_checks_given_allocation() {
    let raw = with(request(), "deploy", json!(false));
    let refs = Counting::new(inventory());

    let err = validator().validate(&raw, NodeId(3), &refs).unwrap_err();

    assert_eq!(err.fields().collect::<Vec<_>>(), ["deploy"]);
    assert_eq!(refs.allocation_lookups.get(), 1);
}

#[test]
fn non_boolean_dedicated_ip_is_rejected() {
    for bad in [json!("yes"), json!(2)] {
        let raw = deploy(json!({ "dedicated_ip": bad, "locations": [], "port_range": [] }));
        let err = validator()
            .validate(&raw, NodeId(3), &inventory())
            .unwrap_err();

        assert_eq!(err.fields().collect::<Vec<_>>(), ["deploy.dedicated_ip"]);
        assert_eq!(
            err.messages("deploy.dedicated_ip"),
            ["The deploy.dedicated_ip field must be true or false."]
        );
    }
}

#[test]
fn deploy_entries_are_checked() {
    let raw = deploy(json!({ "dedicated_ip": true, "locations": [0, "x"], "port_range": [80] }));
    let err = validator()
        .validate(&raw, NodeId(3), &inventory())
        .unwrap_err();

    assert_eq!(
        err.messages("deploy.locations.0"),
        ["The deploy.locations.0 must be at least 1."]
    );
    assert_eq!(
        err.messages("deploy.locations.1"),
        ["The deploy.locations.1 must be an integer."]
    );
    assert_eq!(
        err.messages("deploy.port_range.0"),
        ["The deploy.port_range.0 must be a string."]
    );
}

#[test]
fn missing_limits_are_listed_individually() {
    let raw = with(
        request(),
        "limits",
        json!({ "memory": 512, "swap": 0, "disk": 1024 }),
    );
    let err = validator()
        .validate(&raw, NodeId(3), &inventory())
        .unwrap_err();

    assert_eq!(err.fields().collect::<Vec<_>>(), ["limits.cpu", "limits.io"]);
    assert_eq!(err.messages("limits.io"), ["The limits.io field is required."]);
    assert_eq!(err.get("limits.cpu")[0].kind, ViolationKind::Schema);
}

#[test]
fn absent_limits_report_block_and_every_field() {
    let raw = without(request(), "limits");
    let err = validator()
        .validate(&raw, NodeId(3), &inventory())
        .unwrap_err();

    for field in [
        "limits",
        "limits.memory",
        "limits.swap",
        "limits.disk",
        "limits.io",
        "limits.cpu",
    ] {
        assert!(err.contains(field), "{field} should be reported");
    }
}

#[test]
fn limit_bounds() {
    let raw = with(
        request(),
        "limits",
        json!({ "memory": -1, "swap": -2, "disk": 0, "io": 5, "cpu": 0 }),
    );
    let err = validator()
        .validate(&raw, NodeId(3), &inventory())
        .unwrap_err();

    assert_eq!(
        err.messages("limits.memory"),
        ["The limits.memory must be at least 0."]
    );
    assert_eq!(
        err.messages("limits.swap"),
        ["The limits.swap must be at least -1."]
    );
    assert_eq!(
        err.messages("limits.io"),
        ["The limits.io must be between 10 and 1000."]
    );
    assert!(!err.contains("limits.disk"));
    assert!(!err.contains("limits.cpu"));
}

#[test]
fn non_integer_additional_entry_skips_lookup() {
    let raw = with(
        request(),
        "allocation",
        json!({ "default": 5, "additional": ["x"] }),
    );
    let refs = Counting::new(inventory());
    let err = validator()
        .validate(&raw, NodeId(3), &refs)
        .unwrap_err();

    assert_eq!(err.fields().collect::<Vec<_>>(), ["allocation.additional.0"]);
    assert_eq!(
        err.messages("allocation.additional.0"),
        ["The allocation.additional.0 must be an integer."]
    );
    // only allocation.default reached the store
    assert_eq!(refs.allocation_lookups.get(), 1);
}

#[test]
fn additional_entries_are_looked_up_once_each() {
    let raw = with(
        request(),
        "allocation",
        json!({ "default": 5, "additional": [6, "7", 99] }),
    );
    let refs = Counting::new(inventory());
    let err = validator()
        .validate(&raw, NodeId(3), &refs)
        .unwrap_err();

    assert_eq!(refs.allocation_lookups.get(), 4);
    assert_eq!(
        err.fields().collect::<Vec<_>>(),
        ["allocation.additional.1", "allocation.additional.2"]
    );
    assert_eq!(
        err.get("allocation.additional.2")[0].kind,
        ViolationKind::Referential
    );
}

#[test]
fn additional_allocations_are_kept_in_order() {
    let raw = with(
        request(),
        "allocation",
        json!({ "default": 5, "additional": [6] }),
    );
    let req = validator()
        .validate(&raw, NodeId(3), &inventory())
        .expect("valid request");

    assert_eq!(
        req.allocation,
        AllocationStrategy::Explicit {
            default_id: AllocationId(5),
            additional_ids: vec![AllocationId(6)],
        }
    );
}

#[test]
fn non_array_additional_is_rejected() {
    let raw = with(
        request(),
        "allocation",
        json!({ "default": 5, "additional": 6 }),
    );
    let err = validator()
        .validate(&raw, NodeId(3), &inventory())
        .unwrap_err();

    assert_eq!(
        err.messages("allocation.additional"),
        ["The allocation.additional must be an array."]
    );
}

#[test]
fn default_allocation_bails_on_type_failure() {
    let raw = with(request(), "allocation", json!({ "default": "abc" }));
    let refs = Counting::new(inventory());
    let err = validator()
        .validate(&raw, NodeId(3), &refs)
        .unwrap_err();

    assert_eq!(
        err.messages("allocation.default"),
        ["The allocation.default must be an integer."]
    );
    assert_eq!(refs.allocation_lookups.get(), 0);
}

#[test]
fn default_allocation_bails_on_bound_failure() {
    let raw = with(request(), "allocation", json!({ "default": 0 }));
    let refs = Counting::new(inventory());
    let err = validator()
        .validate(&raw, NodeId(3), &refs)
        .unwrap_err();

    assert_eq!(
        err.messages("allocation.default"),
        ["The allocation.default must be at least 1."]
    );
    assert_eq!(refs.allocation_lookups.get(), 0);
}

#[test]
fn missing_allocation_is_required() {
    let raw = without(request(), "allocation");
    let err = validator()
        .validate(&raw, NodeId(3), &inventory())
        .unwrap_err();

    assert_eq!(
        err.messages("allocation.default"),
        ["The allocation.default field is required."]
    );
}

#[test]
fn unknown_owner_and_egg_are_referential() {
    let raw = with(request(), "user", json!(2));
    let raw = with(raw, "egg", json!("9"));
    let refs = Counting::new(inventory());
    let err = validator()
        .validate(&raw, NodeId(3), &refs)
        .unwrap_err();

    assert_eq!(err.messages("user"), ["The selected user is invalid."]);
    assert_eq!(err.messages("egg"), ["The selected egg is invalid."]);
    assert_eq!(refs.record_lookups.get(), 2);
}

#[test]
fn negative_owner_never_reaches_store() {
    let raw = with(request(), "user", json!(-4));
    let refs = Counting::new(inventory());
    let err = validator()
        .validate(&raw, NodeId(3), &refs)
        .unwrap_err();

    assert_eq!(err.get("user")[0].kind, ViolationKind::Referential);
    assert_eq!(refs.record_lookups.get(), 1);
}

#[test]
fn name_rules() {
    let long = "x".repeat(256);
    let err = validator()
        .validate(&with(request(), "name", json!(long)), NodeId(3), &inventory())
        .unwrap_err();
    assert_eq!(
        err.messages("name"),
        ["The name must be between 1 and 255 characters."]
    );

    let err = validator()
        .validate(&with(request(), "name", json!("   ")), NodeId(3), &inventory())
        .unwrap_err();
    assert_eq!(err.messages("name"), ["The name field is required."]);

    let err = validator()
        .validate(&with(request(), "name", json!(42)), NodeId(3), &inventory())
        .unwrap_err();
    assert_eq!(err.messages("name"), ["The name must be a string."]);
}

#[test]
fn negative_pack_is_rejected_and_null_pack_is_absent() {
    let err = validator()
        .validate(&with(request(), "pack", json!(-1)), NodeId(3), &inventory())
        .unwrap_err();
    assert_eq!(err.messages("pack"), ["The pack must be at least 0."]);

    let req = validator()
        .validate(&with(request(), "pack", Value::Null), NodeId(3), &inventory())
        .expect("valid request");
    assert_eq!(req.pack, None);
}

#[test]
fn flags_must_be_boolean_like() {
    let raw = with(request(), "skip_scripts", json!("yes"));
    let raw = with(raw, "start_on_completion", json!(2));
    let err = validator()
        .validate(&raw, NodeId(3), &inventory())
        .unwrap_err();

    assert_eq!(
        err.messages("skip_scripts"),
        ["The skip_scripts field must be true or false."]
    );
    assert!(err.contains("start_on_completion"));
}

#[test]
fn environment_scalars_are_stringified() {
    let raw = with(
        request(),
        "environment",
        json!({ "A": 25565, "B": true, "C": null, "D": " v " }),
    );
    let req = validator()
        .validate(&raw, NodeId(3), &inventory())
        .expect("valid request");

    assert_eq!(req.environment.get("A"), Some("25565"));
    assert_eq!(req.environment.get("B"), Some("1"));
    assert_eq!(req.environment.get("C"), Some(""));
    assert_eq!(req.environment.get("D"), Some("v"));
}

#[test]
fn nested_environment_values_are_rejected() {
    let raw = with(
        request(),
        "environment",
        json!({ "OK": "1", "LIST": [1], "MAP": {} }),
    );
    let err = validator()
        .validate(&raw, NodeId(3), &inventory())
        .unwrap_err();

    assert_eq!(
        err.fields().collect::<Vec<_>>(),
        ["environment.LIST", "environment.MAP"]
    );
    assert_eq!(
        err.messages("environment.LIST"),
        ["The environment.LIST must be a string, number or boolean."]
    );
}

#[test]
fn empty_environment_satisfies_required() {
    let req = validator()
        .validate(&with(request(), "environment", json!({})), NodeId(3), &inventory())
        .expect("valid request");
    assert!(req.environment.is_empty());
}

#[test]
fn non_object_body_reports_every_required_field() {
    let err = validator()
        .validate(&json!([1, 2]), NodeId(3), &inventory())
        .unwrap_err();

    for field in [
        "name",
        "user",
        "egg",
        "docker_image",
        "startup",
        "environment",
        "limits",
        "allocation.default",
    ] {
        assert!(err.contains(field), "{field} should be reported");
    }
    assert!(!err.contains("description"));
    assert!(!err.contains("deploy"));
}

#[test]
fn validation_is_repeatable() {
    let validator = validator();
    let inv = inventory();
    let first = validator.validate(&request(), NodeId(3), &inv);
    let second = validator.validate(&request(), NodeId(3), &inv);
    assert_eq!(first.ok(), second.ok());
}

#[test]
fn missing_server_rules_fail_construction() {
    let err = RequestValidator::new(&RuleCatalog::empty()).unwrap_err();
    assert!(matches!(err, CoreError::UnknownResource(ResourceKind::Server)));
}
