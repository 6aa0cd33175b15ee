use std::fmt;

/// Action applied when a rule matches a path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RuleAction {
    /// Include the matching path.
    Include,
    /// Exclude the matching path.
    Exclude,
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Include => f.write_str("include"),
            Self::Exclude => f.write_str("exclude"),
        }
    }
}
