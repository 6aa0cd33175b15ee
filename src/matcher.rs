//! Ordered rule evaluation with deterministic last-match-wins decisions.

use tracing::trace;

use crate::compiled::CompiledRule;
use crate::path::{ascii_lower, normalize_candidate};
use crate::{MatcherOptions, Rule, RuleAction, RuleError};

/// Deterministic decision produced by a [`Matcher`] for one path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MatchResult {
    /// Final include decision.
    pub included: bool,
    /// Whether at least one rule matched.
    pub matched: bool,
    /// Index of the last matching rule in construction order, `None` when no
    /// rule matched.
    pub rule_index: Option<usize>,
}

impl MatchResult {
    pub(crate) fn no_match(default_action: RuleAction) -> Self {
        Self {
            included: default_action == RuleAction::Include,
            matched: false,
            rule_index: None,
        }
    }
}

/// Immutable evaluator for an ordered rule list.
///
/// Rules are compiled at construction and applied in input order; among all
/// matching rules the last one determines the decision, and
/// [`MatcherOptions::default_action`] applies when nothing matched. A
/// constructed matcher is safe to share across threads without
/// synchronization.
#[derive(Clone, Debug)]
pub struct Matcher {
    rules: Vec<CompiledRule>,
    default_action: RuleAction,
    case_insensitive: bool,
}

impl Matcher {
    /// Compiles ordered rules into a matcher.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidPattern`] for the first rule that fails to
    /// compile.
    pub fn new<I>(rules: I, options: MatcherOptions) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = Rule>,
    {
        let compiled = rules
            .into_iter()
            .map(|rule| CompiledRule::compile(&rule, options.case_insensitive))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules: compiled,
            default_action: options.default_action,
            case_insensitive: options.case_insensitive,
        })
    }

    /// Reports whether the matcher holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns a deterministic include/exclude decision for one path.
    ///
    /// The candidate is normalized (and ASCII-lowered in case-insensitive
    /// mode) before evaluation. Every rule is visited in order; the last
    /// matching rule wins, so iteration never exits early.
    #[must_use]
    pub fn decide(&self, path: &str, is_dir: bool) -> MatchResult {
        let normalized = normalize_candidate(path);
        let folded;
        let candidate: &str = if self.case_insensitive {
            folded = ascii_lower(&normalized);
            &folded
        } else {
            &normalized
        };

        let mut result = MatchResult::no_match(self.default_action);
        for (index, rule) in self.rules.iter().enumerate() {
            if !rule.matches(candidate, is_dir) {
                continue;
            }

            result.included = rule.action() == RuleAction::Include;
            result.matched = true;
            result.rule_index = Some(index);
        }

        trace!(
            candidate,
            is_dir,
            included = result.included,
            rule_index = ?result.rule_index,
            "matcher decision"
        );
        result
    }

    /// Reports whether the path is included under the decision policy.
    #[must_use]
    pub fn included(&self, path: &str, is_dir: bool) -> bool {
        self.decide(path, is_dir).included
    }

    /// Reports whether the path is excluded under the decision policy.
    #[must_use]
    pub fn excluded(&self, path: &str, is_dir: bool) -> bool {
        !self.decide(path, is_dir).included
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matcher_reports_default() {
        let matcher = Matcher::new(Vec::new(), MatcherOptions::default()).expect("empty matcher");
        let result = matcher.decide("file.txt", false);
        assert!(result.included);
        assert!(!result.matched);
        assert_eq!(result.rule_index, None);
    }

    #[test]
    fn last_match_wins_and_reports_index() {
        let rules = vec![
            Rule::exclude("*.tmp"),
            Rule::include("keep.tmp"),
            Rule::exclude("other.txt"),
        ];
        let matcher = Matcher::new(rules, MatcherOptions::default()).expect("matcher");

        let result = matcher.decide("keep.tmp", false);
        assert!(result.included);
        assert_eq!(result.rule_index, Some(1));

        let result = matcher.decide("junk.tmp", false);
        assert!(!result.included);
        assert_eq!(result.rule_index, Some(0));
    }

    #[test]
    fn included_and_excluded_are_complements() {
        let matcher =
            Matcher::new(vec![Rule::exclude("*.log")], MatcherOptions::default()).expect("matcher");
        for (path, is_dir) in [("a.log", false), ("a.txt", false), ("logs", true)] {
            assert_ne!(matcher.included(path, is_dir), matcher.excluded(path, is_dir));
        }
    }

    #[test]
    fn default_action_exclude_gates_unmatched_paths() {
        let matcher = Matcher::new(
            vec![Rule::include("*.c")],
            MatcherOptions {
                default_action: RuleAction::Exclude,
                ..MatcherOptions::default()
            },
        )
        .expect("matcher");

        assert!(matcher.included("main.c", false));
        assert!(matcher.excluded("README.md", false));
    }

    #[test]
    fn case_insensitive_folds_candidate_and_pattern() {
        let matcher = Matcher::new(
            vec![Rule::exclude("*.CPP")],
            MatcherOptions {
                case_insensitive: true,
                ..MatcherOptions::default()
            },
        )
        .expect("matcher");

        assert!(matcher.excluded(r"src\MAIN.cpp", false));
        assert!(matcher.excluded("src/main.CPP", false));
    }

    #[test]
    fn case_sensitive_by_default() {
        let matcher =
            Matcher::new(vec![Rule::exclude("*.cpp")], MatcherOptions::default()).expect("matcher");
        assert!(matcher.included("MAIN.CPP", false));
    }

    #[test]
    fn empty_candidate_never_matches() {
        let matcher =
            Matcher::new(vec![Rule::exclude("*")], MatcherOptions::default()).expect("matcher");
        let result = matcher.decide("", false);
        assert!(!result.matched);
        assert!(result.included);
    }

    #[test]
    fn construction_fails_on_first_bad_rule() {
        let rules = vec![Rule::exclude("ok"), Rule::exclude("///")];
        let error = Matcher::new(rules, MatcherOptions::default()).expect_err("must fail");
        assert!(matches!(error, RuleError::InvalidPattern { .. }));
    }
}
