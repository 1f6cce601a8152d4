//! Prerequisite expansion over instrumentation names.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::knowledge::PrerequisiteRule;

/// Which set an `unless` guard is checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardScope {
    /// Only the names the plan originally requested.
    #[default]
    Requested,
    /// The working set, including names added by earlier rules.
    Working,
}

/// Expand `requested` through `rules` until no rule adds a name.
///
/// The result starts with the requested names in order, followed by added
/// names in the order they were first required. The set only grows, so the
/// loop terminates after at most one pass per distinct name.
pub fn expand(requested: &[String], rules: &[PrerequisiteRule], scope: GuardScope) -> Vec<String> {
    let original: HashSet<&str> = requested.iter().map(String::as_str).collect();
    let mut working: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for name in requested {
        if seen.insert(name.clone()) {
            working.push(name.clone());
        }
    }

    loop {
        let mut changed = false;
        for rule in rules {
            if !rule.if_any.iter().any(|name| seen.contains(name)) {
                continue;
            }
            let guarded = match scope {
                GuardScope::Requested => rule.unless.iter().any(|n| original.contains(n.as_str())),
                GuardScope::Working => rule.unless.iter().any(|n| seen.contains(n)),
            };
            if guarded {
                continue;
            }
            for name in &rule.requires {
                if seen.insert(name.clone()) {
                    working.push(name.clone());
                    changed = true;
                }
            }
        }
        if !changed {
            return working;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn rule_fires_without_guard_name() {
        let rules = vec![PrerequisiteRule::new(["A"], ["C"]).unless(["B"])];
        assert_eq!(expand(&names(&["A"]), &rules, GuardScope::Requested), names(&["A", "C"]));
    }

    #[test]
    fn unless_takes_precedence() {
        let rules = vec![PrerequisiteRule::new(["A"], ["C"]).unless(["B"])];
        assert_eq!(
            sorted(expand(&names(&["A", "B"]), &rules, GuardScope::Requested)),
            names(&["A", "B"])
        );
        assert_eq!(
            sorted(expand(&names(&["A", "B"]), &rules, GuardScope::Working)),
            names(&["A", "B"])
        );
    }

    #[test]
    fn reaches_fixed_point_through_chains() {
        // Rules are listed so that a single pass would miss `D`.
        let rules = vec![
            PrerequisiteRule::new(["C"], ["D"]),
            PrerequisiteRule::new(["B"], ["C"]),
            PrerequisiteRule::new(["A"], ["B"]),
        ];
        assert_eq!(
            expand(&names(&["A"]), &rules, GuardScope::Requested),
            names(&["A", "B", "C", "D"])
        );
    }

    #[test]
    fn guard_scope_changes_outcome_for_added_names() {
        let rules = vec![
            PrerequisiteRule::new(["A"], ["B"]),
            PrerequisiteRule::new(["A"], ["C"]).unless(["B"]),
        ];

        let requested = expand(&names(&["A"]), &rules, GuardScope::Requested);
        assert_eq!(requested, names(&["A", "B", "C"]));

        let working = expand(&names(&["A"]), &rules, GuardScope::Working);
        assert_eq!(working, names(&["A", "B"]));
    }

    #[test]
    fn closure_is_idempotent() {
        let rules = vec![
            PrerequisiteRule::new(["express"], ["http"]),
            PrerequisiteRule::new(["koa", "express"], ["net"]).unless(["dns"]),
        ];
        let once = expand(&names(&["express"]), &rules, GuardScope::Requested);
        let twice = expand(&once, &rules, GuardScope::Requested);
        assert_eq!(sorted(once), sorted(twice));
    }

    #[test]
    fn no_rules_returns_input_without_duplicates() {
        assert_eq!(
            expand(&names(&["a", "b", "a"]), &[], GuardScope::Working),
            names(&["a", "b"])
        );
        assert!(expand(&[], &[], GuardScope::Requested).is_empty());
    }
}
