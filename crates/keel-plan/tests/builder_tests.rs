//! Functional tests for plan building.
//!
//! These exercise `parse_plan` end to end on raw model output:
//! - ordering guarantees over valid dependency graphs
//! - fatal graph errors (missing, self, circular)
//! - tolerance for fences, aliases and loose dependency shapes

use keel_plan::{parse_plan, Action, PlanError, StepId};
use proptest::prelude::*;
use serde_json::json;

fn position(plan: &keel_plan::Plan, id: &StepId) -> usize {
    plan.steps
        .iter()
        .position(|s| &s.id == id)
        .expect("step present")
}

fn read_record(n: usize, deps: serde_json::Value) -> serde_json::Value {
    json!({
        "step": n,
        "action": "read",
        "path": format!("src/file{n}.ts"),
        "description": format!("read file {n}"),
        "dependsOn": deps,
    })
}

/// A mutual dependency between two steps always fails as circular.
#[test]
fn two_node_cycle_is_circular() {
    let raw = json!([read_record(1, json!([2])), read_record(2, json!([1]))]).to_string();
    let err = parse_plan(&raw).unwrap_err();
    assert_eq!(err.code(), "CIRCULAR_DEPENDENCY");
}

/// A dependency on an unknown step always fails as missing.
#[test]
fn unknown_reference_is_missing_dependency() {
    let raw = json!([read_record(1, json!([])), read_record(2, json!(["step_7"]))]).to_string();
    match parse_plan(&raw).unwrap_err() {
        PlanError::MissingDependency { step, missing } => {
            assert_eq!(step.as_str(), "step_2");
            assert_eq!(missing.as_str(), "step_7");
        }
        other => panic!("expected MissingDependency, got {other:?}"),
    }
}

/// Self references in raw text are stripped during normalization, so the plan builds.
#[test]
fn raw_self_reference_is_stripped() {
    let raw = json!([read_record(1, json!(["step_1"]))]).to_string();
    let plan = parse_plan(&raw).unwrap();
    assert!(plan.steps[0].depends_on.is_empty());
}

/// Diamond: the root runs first and the join runs last, whatever the input order.
#[test]
fn diamond_orders_root_first_and_join_last() {
    // Positions: 1 = join (needs 3 and 4), 2 = root, 3 and 4 = branches.
    let raw = json!([
        read_record(1, json!([3, 4])),
        read_record(2, json!([])),
        read_record(3, json!([2])),
        read_record(4, json!([2])),
    ])
    .to_string();
    let plan = parse_plan(&raw).unwrap();
    let ids: Vec<_> = plan.steps.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids.first(), Some(&"step_2"));
    assert_eq!(ids.last(), Some(&"step_1"));
    assert!(ids[1..3].contains(&"step_3") && ids[1..3].contains(&"step_4"));
}

/// A plan without dependencies round-trips in input order.
#[test]
fn plan_without_dependencies_keeps_order() {
    let raw = json!([
        {"action": "write", "path": "b.ts", "description": "b"},
        {"action": "read", "path": "a.ts", "description": "a"},
        {"action": "run", "command": "npm test", "description": "test"},
    ])
    .to_string();
    let plan = parse_plan(&raw).unwrap();
    let actions: Vec<_> = plan.steps.iter().map(|s| s.action).collect();
    assert_eq!(actions, vec![Action::Write, Action::Read, Action::Run]);
}

/// Fenced output with a filePath alias and a comma-separated dependency string.
#[test]
fn tolerates_fences_aliases_and_string_dependencies() {
    let raw = "Sure! Here is the plan.\n```json\n[\n  {\"step\": 1, \"action\": \"Write\", \"filePath\": \"src/store/cart.ts\", \"description\": \"cart store\"},\n  {\"step\": 2, \"action\": \"write\", \"filePath\": \"src/types/cart.ts\", \"description\": \"types\"},\n  {\"step\": 3, \"action\": \"write\", \"path\": \"src/components/Cart.tsx\", \"description\": \"cart view\", \"dependsOn\": \"1, 2\"}\n]\n```";
    let plan = parse_plan(raw).unwrap();
    assert_eq!(plan.len(), 3);
    assert_eq!(plan.steps[0].path.as_deref(), Some("src/store/cart.ts"));
    assert_eq!(plan.steps[2].depends_on.len(), 2);
}

/// Raw `step` numbers are display metadata only.
#[test]
fn ids_follow_parse_position_not_raw_numbers() {
    let raw = json!([
        {"step": 10, "action": "read", "path": "a.ts", "description": "a"},
        {"step": 20, "action": "read", "path": "b.ts", "description": "b"},
    ])
    .to_string();
    let plan = parse_plan(&raw).unwrap();
    assert_eq!(plan.steps[1].id.as_str(), "step_2");
    assert_eq!(plan.steps[1].sequence_number, 20);
}

fn dag_strategy() -> impl Strategy<Value = (Vec<usize>, Vec<Vec<bool>>)> {
    (1usize..10).prop_flat_map(|n| {
        (
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            proptest::collection::vec(proptest::collection::vec(any::<bool>(), n), n),
        )
    })
}

proptest! {
    /// For every valid graph, each dependency precedes its dependent.
    #[test]
    fn prop_dependencies_precede_dependents((rank, edges) in dag_strategy()) {
        let n = rank.len();
        let records: Vec<_> = (0..n)
            .map(|p| {
                let deps: Vec<usize> = (0..n)
                    .filter(|&q| rank[q] < rank[p] && edges[p][q])
                    .map(|q| q + 1)
                    .collect();
                read_record(p + 1, json!(deps))
            })
            .collect();

        let plan = parse_plan(&json!(records).to_string()).unwrap();
        prop_assert_eq!(plan.len(), n);
        for step in &plan.steps {
            for dep in &step.depends_on {
                prop_assert!(position(&plan, dep) < position(&plan, &step.id));
            }
        }
    }
}
