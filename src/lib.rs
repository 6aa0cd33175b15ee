#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `pathfilter` provides ordered include/exclude evaluation for relative
//! paths using a gitignore-like pattern grammar. Patterns honour anchored
//! matches (leading `/`), directory-only rules (trailing `/`), single-segment
//! wildcards, recursive `**` wildcards, and `[...]` character classes. Rules
//! are evaluated sequentially with the last matching rule determining the
//! decision, which makes the same engine serve ignore workflows
//! (`default_action = Include`) and allow-list workflows
//! (`default_action = Exclude`) symmetrically.
//!
//! # Design
//!
//! - [`Rule`] captures the user-supplied action and pattern text. The rule
//!   itself is lightweight; heavy lifting happens when a [`Matcher`] is
//!   constructed.
//! - [`Matcher`] owns the compiled representation of each rule. Compilation
//!   picks the cheapest strategy that preserves the pattern's semantics:
//!   common shapes (`*.ext`, literal paths, `dir/**`, segment wildcards) are
//!   matched by hand-rolled scanners, and only patterns combining a character
//!   class with path semantics fall back to a regex.
//! - [`Provider`] stacks an optional base rule set with per-directory rule
//!   files discovered from its root down to a candidate's directory, caching
//!   one compiled matcher per directory. Rules in a directory's file apply to
//!   entries strictly beneath that directory.
//! - Matching operates on slash-normalized relative text, so callers on any
//!   platform can pass paths as they have them; backslashes are folded to
//!   `/` before evaluation.
//!
//! # Invariants
//!
//! - Rules are applied in definition order and the last matching rule wins;
//!   [`MatcherOptions::default_action`] applies when no rule matched.
//! - A trailing `/` marks a directory-only rule, a leading `/` anchors the
//!   pattern to the root of the candidate path.
//! - Provider decisions stack base rules, then rule files from the root down
//!   to the deepest directory; later matches overwrite earlier ones.
//! - The provider cache is monotone: a directory's load outcome (matcher,
//!   missing file, or error) is fixed for the provider's lifetime.
//!
//! # Errors
//!
//! Fallible operations return [`RuleError`], which distinguishes invalid
//! patterns, invalid provider inputs (rules file name, entry names, escaping
//! paths), and wrapped I/O failures. See the variant documentation for when
//! each is produced.
//!
//! # Examples
//!
//! Ignore-style filtering with a re-include exception:
//!
//! ```
//! use pathfilter::{Matcher, MatcherOptions, parse_rules_str};
//!
//! let rules = parse_rules_str("*.tmp\n!keep.tmp\nbuild/\n");
//! let matcher = Matcher::new(rules, MatcherOptions::default()).expect("rules compile");
//!
//! assert!(matcher.excluded("scratch/junk.tmp", false));
//! assert!(matcher.included("scratch/keep.tmp", false));
//! assert!(matcher.excluded("build/out.bin", false));
//! assert!(matcher.included("src/lib.rs", false));
//! ```
//!
//! Allow-list mode inverts the default:
//!
//! ```
//! use pathfilter::{Matcher, MatcherOptions, Rule, RuleAction};
//!
//! let options = MatcherOptions {
//!     default_action: RuleAction::Exclude,
//!     ..MatcherOptions::default()
//! };
//! let matcher = Matcher::new(
//!     vec![Rule::include("*.paa"), Rule::include("textures/**")],
//!     options,
//! )
//! .expect("rules compile");
//!
//! assert!(matcher.included("image.paa", false));
//! assert!(matcher.included("textures/ui/a.png", false));
//! assert!(matcher.excluded("scripts/main.c", false));
//! ```

mod action;
mod compiled;
mod error;
mod extensions;
mod load;
mod matcher;
mod options;
mod parse;
mod path;
mod provider;
mod rule;

pub use action::RuleAction;
pub use error::RuleError;
pub use extensions::{extension_rules, merge_rules};
pub use load::{load_rules_file, load_rules_files};
pub use matcher::{MatchResult, Matcher};
pub use options::{DirEntry, MatcherOptions, ProviderOptions};
pub use parse::{parse_rules, parse_rules_str};
pub use provider::{Provider, DEFAULT_RULES_FILE_NAME};
pub use rule::Rule;
