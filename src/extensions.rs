//! Helpers deriving include rules from extension lists and concatenating
//! rule lists.

use crate::path::ascii_lower;
use crate::Rule;

/// Converts an extension list into include rules with `*.ext` patterns.
///
/// Accepted forms are `txt`, `.txt`, and `*.txt`; values are trimmed,
/// ASCII-lowered, and empty results are skipped. Input order is preserved.
#[must_use]
pub fn extension_rules<I, S>(extensions: I) -> Vec<Rule>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .filter_map(|extension| {
            let ext = extension.as_ref().trim();
            let ext = ext.strip_prefix("*.").unwrap_or(ext);
            let ext = ext.trim_start_matches('.');
            let ext = ascii_lower(ext);
            if ext.is_empty() {
                None
            } else {
                Some(Rule::include(format!("*.{ext}")))
            }
        })
        .collect()
}

/// Concatenates rule lists into a new list, preserving order.
#[must_use]
pub fn merge_rules(rule_sets: &[&[Rule]]) -> Vec<Rule> {
    let total = rule_sets.iter().map(|set| set.len()).sum();
    let mut merged = Vec::with_capacity(total);
    for set in rule_sets {
        merged.extend_from_slice(set);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuleAction;

    #[test]
    fn accepts_all_extension_forms() {
        let rules = extension_rules(["txt", ".md", "*.PAA"]);
        let patterns: Vec<_> = rules.iter().map(Rule::pattern).collect();
        assert_eq!(patterns, ["*.txt", "*.md", "*.paa"]);
        assert!(rules.iter().all(|rule| rule.action() == RuleAction::Include));
    }

    #[test]
    fn skips_empty_values() {
        let rules = extension_rules(["", "  ", "*.", "...", "c"]);
        let patterns: Vec<_> = rules.iter().map(Rule::pattern).collect();
        assert_eq!(patterns, ["*.c"]);
    }

    #[test]
    fn merge_preserves_order_without_aliasing() {
        let first = vec![Rule::exclude("a"), Rule::include("b")];
        let second = vec![Rule::exclude("c")];
        let merged = merge_rules(&[&first, &second]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].pattern(), "a");
        assert_eq!(merged[2].pattern(), "c");

        // The merged list owns its rules; the inputs are untouched.
        drop(first);
        assert_eq!(merged[1].pattern(), "b");
    }

    #[test]
    fn merge_concatenation_law() {
        let a = vec![Rule::exclude("x")];
        let b = vec![Rule::include("y"), Rule::exclude("z")];
        let joint = merge_rules(&[&a, &b]);
        let mut split = merge_rules(&[&a]);
        split.extend(merge_rules(&[&b]));
        assert_eq!(joint, split);
    }
}
