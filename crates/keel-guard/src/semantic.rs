//! Semantic heuristics
//!
//! Flags stateful-hook call syntax in layers that must stay free of
//! client-rendering state. Independent of the file's imports.

use crate::layer::Layer;
use crate::violation::{Severity, Violation, ViolationKind};
use once_cell::sync::Lazy;
use regex::Regex;

static HOOK_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(useState|useEffect|useContext|useReducer|useRef|useMemo|useCallback|useQuery|useMutation|useSelector|useDispatch|useNavigate)\s*(?:<[^>()]*>)?\s*\(",
    )
    .expect("valid hook call regex")
});

/// Distinct stateful hooks called in `content`, in order of first use
#[must_use]
pub fn hook_calls(content: &str) -> Vec<&str> {
    let mut hooks: Vec<&str> = Vec::new();
    for caps in HOOK_CALL.captures_iter(content) {
        if let Some(name) = caps.get(1).map(|m| m.as_str()) {
            if !hooks.contains(&name) {
                hooks.push(name);
            }
        }
    }
    hooks
}

/// Semantic violations for `content` placed in `layer`
#[must_use]
pub fn check_semantics(layer: Layer, content: &str) -> Vec<Violation> {
    if layer != Layer::Services {
        return Vec::new();
    }

    hook_calls(content)
        .into_iter()
        .map(|hook| {
            Violation::new(
                ViolationKind::SemanticError,
                Severity::High,
                format!("framework rule violation: {hook} called in the services layer"),
                "services must be plain async functions; call them from a hook instead",
            )
        })
        .collect()
}
