use crate::RuleAction;

/// User-visible path rule consisting of a pattern and an action.
///
/// The rule itself is a lightweight value; pattern compilation happens when a
/// [`Matcher`](crate::Matcher) is constructed.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Rule {
    action: RuleAction,
    pattern: String,
}

impl Rule {
    /// Creates an include rule for `pattern`.
    #[must_use]
    pub fn include(pattern: impl Into<String>) -> Self {
        Self {
            action: RuleAction::Include,
            pattern: pattern.into(),
        }
    }

    /// Creates an exclude rule for `pattern`.
    #[must_use]
    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self {
            action: RuleAction::Exclude,
            pattern: pattern.into(),
        }
    }

    /// Returns the rule action.
    #[must_use]
    pub const fn action(&self) -> RuleAction {
        self.action
    }

    /// Returns the pattern text associated with the rule.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}
