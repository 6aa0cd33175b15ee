use crate::{Rule, RuleAction};

/// Configuration for [`Matcher`](crate::Matcher) construction and decisions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MatcherOptions {
    /// Action applied when no rule matched.
    pub default_action: RuleAction,
    /// Enables ASCII case-insensitive matching (`A`–`Z` folded to `a`–`z`).
    pub case_insensitive: bool,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            default_action: RuleAction::Include,
            case_insensitive: false,
        }
    }
}

/// Configuration for a hierarchical rules [`Provider`](crate::Provider).
#[derive(Clone, Debug, Default)]
pub struct ProviderOptions {
    /// Name of the rules file loaded in each directory along the path chain.
    ///
    /// `None` (or a blank value) selects the default `.pathfilter`. The name
    /// must be a single path component: separators, `.` and `..` are rejected
    /// at provider construction.
    pub rules_file_name: Option<String>,
    /// In-memory rules evaluated before any directory-loaded rules.
    pub base_rules: Vec<Rule>,
    /// Matching behavior shared by all compiled matchers.
    pub matcher_options: MatcherOptions,
    /// Enables resolved-path validation that blocks rules files reached
    /// through symlinks escaping the provider root. Off by default to keep
    /// the cold path cheap.
    pub symlink_escape_check: bool,
}

/// One directory entry input for the provider batch APIs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirEntry {
    /// Entry name relative to the target directory, without separators.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl DirEntry {
    /// Creates an entry for a file or directory named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            is_dir,
        }
    }

    /// Creates a directory entry named `name`.
    #[must_use]
    pub fn dir(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }
}
