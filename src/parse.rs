//! Line-oriented parser for the gitignore-like rule grammar.

use std::borrow::Cow;
use std::io::BufRead;
use std::sync::Arc;

use crate::{Rule, RuleAction, RuleError};

/// Parses rules from a UTF-8 byte stream, one rule per line.
///
/// Blank lines and lines starting with `#` are skipped. A leading `!` makes
/// an include rule, plain lines make exclude rules, and `\#` / `\!` escape
/// the leading comment and negation tokens. Trailing spaces and tabs are
/// trimmed unless the last one is escaped with a backslash.
///
/// # Errors
///
/// Returns [`RuleError::Parse`] when reading from the stream fails.
/// Malformed patterns are not detected here; they are rejected when a
/// [`Matcher`](crate::Matcher) compiles them.
pub fn parse_rules<R: BufRead>(reader: R) -> Result<Vec<Rule>, RuleError> {
    let mut rules = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|error| RuleError::Parse {
            error: Arc::new(error),
        })?;
        if let Some(rule) = parse_rule_line(&line) {
            rules.push(rule);
        }
    }

    Ok(rules)
}

/// Parses rules from in-memory text. Infallible: there is no stream to fail.
#[must_use]
pub fn parse_rules_str(src: &str) -> Vec<Rule> {
    src.lines().filter_map(parse_rule_line).collect()
}

fn parse_rule_line(line: &str) -> Option<Rule> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return None;
    }

    let trimmed = trim_trailing_spaces(line);
    let mut text: &str = &trimmed;
    if text.is_empty() || text.starts_with('#') {
        return None;
    }

    if text.starts_with("\\#") {
        text = &text[1..];
    }

    let action = if let Some(rest) = text.strip_prefix('!') {
        text = rest;
        RuleAction::Include
    } else {
        if text.starts_with("\\!") {
            text = &text[1..];
        }
        RuleAction::Exclude
    };

    if text.is_empty() {
        return None;
    }

    Some(match action {
        RuleAction::Include => Rule::include(text),
        RuleAction::Exclude => Rule::exclude(text),
    })
}

/// Trims trailing spaces and tabs; a backslash-escaped trailing blank keeps
/// the blank, drops the backslash, and stops the trim.
fn trim_trailing_spaces(line: &str) -> Cow<'_, str> {
    let bytes = line.as_bytes();
    let mut end = bytes.len();
    while end > 0 && (bytes[end - 1] == b' ' || bytes[end - 1] == b'\t') {
        if end >= 2 && bytes[end - 2] == b'\\' {
            let mut unescaped = String::with_capacity(end - 1);
            unescaped.push_str(&line[..end - 2]);
            unescaped.push(bytes[end - 1] as char);
            return Cow::Owned(unescaped);
        }

        end -= 1;
    }

    Cow::Borrowed(&line[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_and_comments_skipped() {
        let rules = parse_rules_str("\n# comment\n   \n*.tmp\n");
        assert_eq!(rules, vec![Rule::exclude("*.tmp")]);
    }

    #[test]
    fn negation_makes_include_rule() {
        let rules = parse_rules_str("!keep.txt\n");
        assert_eq!(rules, vec![Rule::include("keep.txt")]);
    }

    #[test]
    fn escaped_leading_tokens_are_literal() {
        let rules = parse_rules_str("\\#not-a-comment\n\\!not-a-negation\n");
        assert_eq!(
            rules,
            vec![Rule::exclude("#not-a-comment"), Rule::exclude("!not-a-negation")]
        );
    }

    #[test]
    fn trailing_whitespace_trimmed() {
        let rules = parse_rules_str("pattern   \t\n");
        assert_eq!(rules, vec![Rule::exclude("pattern")]);
    }

    #[test]
    fn escaped_trailing_space_survives() {
        let rules = parse_rules_str("name\\ \n");
        assert_eq!(rules, vec![Rule::exclude("name ")]);
    }

    #[test]
    fn escaped_space_stops_further_trimming() {
        // Only blanks after the escaped one are dropped; the escape itself
        // preserves exactly one blank.
        let rules = parse_rules_str("name\\  \n");
        assert_eq!(rules, vec![Rule::exclude("name ")]);
    }

    #[test]
    fn crlf_and_trailing_carriage_return_handled() {
        let rules = parse_rules_str("a.txt\r\nb.txt\r");
        assert_eq!(rules, vec![Rule::exclude("a.txt"), Rule::exclude("b.txt")]);
    }

    #[test]
    fn bare_negation_is_skipped() {
        assert!(parse_rules_str("!\n").is_empty());
    }

    #[test]
    fn reader_and_string_agree() {
        let src = "*.log\n!keep.log\n# note\n";
        let from_reader = parse_rules(src.as_bytes()).expect("parse from reader");
        assert_eq!(from_reader, parse_rules_str(src));
    }
}
