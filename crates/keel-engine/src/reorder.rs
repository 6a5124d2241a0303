//! Best-effort write reordering
//!
//! Plans often write a component before the store it imports, which makes
//! the component's import contract fail. A store write is moved ahead of
//! the earliest earlier component write when that keeps every declared
//! dependency satisfied. Never fails; at worst the order is unchanged.

use keel_plan::{Action, Step};

const STORE_PATTERNS: &[&str] = &["store", "slice", "reducer"];
const COMPONENT_PATTERNS: &[&str] = &["component", "form", "page", ".tsx"];

/// Move store writes before the component writes that precede them
#[must_use]
pub fn reorder_writes(mut steps: Vec<Step>) -> Vec<Step> {
    for index in 0..steps.len() {
        if !is_store_write(&steps[index]) {
            continue;
        }
        let Some(target) = (0..index).find(|&i| is_component_write(&steps[i])) else {
            continue;
        };

        let blocked = steps[target..index]
            .iter()
            .any(|between| steps[index].depends_on.contains(&between.id));
        if blocked {
            tracing::debug!(step = %steps[index].id, "store write depends on an earlier step; not moved");
            continue;
        }

        let step = steps.remove(index);
        tracing::debug!(step = %step.id, before = %steps[target].id, "moving store write earlier");
        steps.insert(target, step);
    }
    steps
}

fn is_store_write(step: &Step) -> bool {
    step.action == Action::Write && matches(step, STORE_PATTERNS) && !matches(step, COMPONENT_PATTERNS)
}

fn is_component_write(step: &Step) -> bool {
    step.action == Action::Write && matches(step, COMPONENT_PATTERNS) && !matches(step, STORE_PATTERNS)
}

fn matches(step: &Step, patterns: &[&str]) -> bool {
    let haystack = format!(
        "{} {}",
        step.path.as_deref().unwrap_or_default(),
        step.description
    )
    .to_lowercase();
    patterns.iter().any(|p| haystack.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_plan::StepId;

    fn write(n: usize, path: &str, description: &str) -> Step {
        Step::new(n, Action::Write, description).with_path(path)
    }

    fn ids(steps: &[Step]) -> Vec<&str> {
        steps.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn store_moves_before_component() {
        let steps = vec![
            Step::new(1, Action::Read, "inspect").with_path("package.json"),
            write(2, "src/components/Cart.tsx", "cart view"),
            write(3, "src/utils/format.ts", "price formatting"),
            write(4, "src/store/cartStore.ts", "cart state"),
        ];
        assert_eq!(ids(&reorder_writes(steps)), vec!["step_1", "step_4", "step_2", "step_3"]);
    }

    #[test]
    fn dependency_in_between_blocks_move() {
        let steps = vec![
            write(1, "src/components/Cart.tsx", "cart view"),
            write(2, "src/types/cart.ts", "types"),
            write(3, "src/store/cartSlice.ts", "cart slice").depends_on(StepId::from_index(2)),
        ];
        assert_eq!(ids(&reorder_writes(steps)), vec!["step_1", "step_2", "step_3"]);
    }

    #[test]
    fn ambiguous_steps_stay() {
        let steps = vec![
            write(1, "src/pages/Checkout.tsx", "checkout page"),
            write(2, "src/store/StoreProvider.tsx", "store provider component"),
        ];
        assert_eq!(ids(&reorder_writes(steps)), vec!["step_1", "step_2"]);
    }

    #[test]
    fn reads_and_runs_keep_order() {
        let steps = vec![
            Step::new(1, Action::Run, "install").with_command("npm install zustand"),
            Step::new(2, Action::Read, "read store").with_path("src/store/index.ts"),
            write(3, "src/components/Form.tsx", "form"),
        ];
        assert_eq!(ids(&reorder_writes(steps)), vec!["step_1", "step_2", "step_3"]);
    }
}
