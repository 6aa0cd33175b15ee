//! Matcher-internal compiled representation of one rule.
//!
//! Compilation picks the cheapest strategy that preserves the gitignore-like
//! semantics of the source pattern. Component rules (no slash) and simple
//! path rules are matched by hand-rolled scanners; only patterns combining a
//! character class with path semantics fall back to a regex.

use regex::Regex;

use crate::path::{ascii_lower, normalize_pattern};
use crate::{Rule, RuleAction, RuleError};

#[derive(Clone, Debug)]
pub(crate) struct CompiledRule {
    strategy: Strategy,
    action: RuleAction,
    /// Source pattern started with `/`.
    anchored: bool,
    /// Source pattern ended with `/`.
    dir_only: bool,
}

/// Matching strategy selected at compile time. `Component*` variants carry
/// patterns without a slash and match against path components; `Path*`
/// variants match against the whole candidate.
#[derive(Clone, Debug)]
enum Strategy {
    ComponentExact(String),
    ComponentGlob(SegmentPattern),
    ComponentRegex(Regex),
    PathExact(String),
    PathSegments(Vec<SegmentPattern>),
    PathPrefixSegments(Vec<SegmentPattern>),
    PathRegex(Regex),
    PathDirRegex(Regex),
}

/// Precompiled single-segment pattern with `*`/`?` wildcards.
#[derive(Clone, Debug)]
struct SegmentPattern {
    text: String,
    wildcard: bool,
}

impl SegmentPattern {
    fn new(text: &str) -> Self {
        Self {
            wildcard: text.contains(['*', '?']),
            text: text.to_string(),
        }
    }

    fn matches(&self, segment: &str) -> bool {
        if !self.wildcard {
            return segment == self.text;
        }

        match_simple_wildcard(self.text.as_bytes(), segment.as_bytes())
    }
}

impl CompiledRule {
    /// Compiles one source rule into the cheapest matching strategy.
    pub(crate) fn compile(rule: &Rule, case_insensitive: bool) -> Result<Self, RuleError> {
        let pattern = normalize_pattern(rule.pattern());
        let pattern = if case_insensitive {
            ascii_lower(&pattern).into_owned()
        } else {
            pattern
        };

        if pattern.is_empty() {
            return Err(invalid_pattern(rule.pattern(), "empty"));
        }

        let anchored = pattern.starts_with('/');
        let dir_only = pattern.ends_with('/');
        let trimmed = pattern.trim_matches('/');
        if trimmed.is_empty() {
            return Err(invalid_pattern(rule.pattern(), "empty after normalization"));
        }

        // Anchored patterns ("/name") must be matched against the full path
        // from the root even without an explicit slash inside.
        let has_slash = trimmed.contains('/') || anchored;
        let has_meta = has_glob_meta(trimmed);
        let has_class = has_char_class(trimmed);

        let strategy = if !has_slash {
            if !has_meta {
                Strategy::ComponentExact(trimmed.to_string())
            } else if !has_class {
                Strategy::ComponentGlob(SegmentPattern::new(trimmed))
            } else {
                let body = format!("^{}$", component_regex_body(trimmed));
                Strategy::ComponentRegex(compile_regex(&body, rule.pattern())?)
            }
        } else if !has_meta {
            Strategy::PathExact(trimmed.to_string())
        } else if let Some(prefix) = double_star_prefix(trimmed) {
            Strategy::PathPrefixSegments(split_segments(prefix))
        } else if simple_segments(trimmed) {
            Strategy::PathSegments(split_segments(trimmed))
        } else {
            // Fallback for char classes and complex "**" combinations.
            let body = path_regex_body(trimmed);
            let head = if anchored { "^" } else { "(?:^|.*/)" };
            if dir_only {
                let source = format!("{head}{body}(?:/.*)?$");
                Strategy::PathDirRegex(compile_regex(&source, rule.pattern())?)
            } else {
                let source = format!("{head}{body}$");
                Strategy::PathRegex(compile_regex(&source, rule.pattern())?)
            }
        };

        Ok(Self {
            strategy,
            action: rule.action(),
            anchored,
            dir_only,
        })
    }

    pub(crate) const fn action(&self) -> RuleAction {
        self.action
    }

    /// Reports whether this rule matches a normalized candidate path.
    pub(crate) fn matches(&self, candidate: &str, is_dir: bool) -> bool {
        if candidate.is_empty() {
            return false;
        }

        match &self.strategy {
            Strategy::ComponentExact(text) => {
                if self.dir_only {
                    match_dir_only_components(candidate, is_dir, |segment| segment == text)
                } else {
                    path_base(candidate) == text
                }
            }
            Strategy::ComponentGlob(segment) => {
                if self.dir_only {
                    match_dir_only_components(candidate, is_dir, |s| segment.matches(s))
                } else {
                    segment.matches(path_base(candidate))
                }
            }
            Strategy::ComponentRegex(re) => {
                if self.dir_only {
                    match_dir_only_components(candidate, is_dir, |s| re.is_match(s))
                } else {
                    re.is_match(path_base(candidate))
                }
            }
            Strategy::PathExact(text) => {
                match_exact_path(text, candidate, is_dir, self.anchored, self.dir_only)
            }
            Strategy::PathSegments(segments) => {
                match_path_segments(segments, candidate, self.anchored, self.dir_only)
            }
            Strategy::PathPrefixSegments(prefix) => {
                match_path_prefix_double_star(prefix, candidate, self.anchored)
            }
            Strategy::PathRegex(re) | Strategy::PathDirRegex(re) => re.is_match(candidate),
        }
    }
}

fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> RuleError {
    RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

fn compile_regex(source: &str, original: &str) -> Result<Regex, RuleError> {
    Regex::new(source).map_err(|error| invalid_pattern(original, error.to_string()))
}

/// Returns the segment prefix of a `prefix/**` pattern when the prefix is
/// non-empty and simple enough for segment matching. A bare `**` never
/// qualifies; it takes the regex fallback.
fn double_star_prefix(pattern: &str) -> Option<&str> {
    pattern
        .strip_suffix("/**")
        .filter(|prefix| !prefix.is_empty() && simple_segments(prefix))
}

/// Reports whether a slash pattern can use lightweight segment matching.
fn simple_segments(pattern: &str) -> bool {
    !pattern.is_empty() && !pattern.contains("**") && !has_char_class(pattern)
}

fn split_segments(pattern: &str) -> Vec<SegmentPattern> {
    pattern.split('/').map(SegmentPattern::new).collect()
}

/// Reports whether pattern contains supported glob meta characters.
fn has_glob_meta(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    for (i, &byte) in bytes.iter().enumerate() {
        match byte {
            b'*' | b'?' => return true,
            b'[' if find_char_class_end(bytes, i).is_some() => return true,
            _ => {}
        }
    }

    false
}

/// Reports whether pattern contains at least one syntactically complete
/// `[...]` class. An unclosed `[` is treated as a literal.
fn has_char_class(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    bytes
        .iter()
        .enumerate()
        .any(|(i, &byte)| byte == b'[' && find_char_class_end(bytes, i).is_some())
}

/// Locates the closing bracket of a glob char class. A leading `!` or `^` and
/// a literal leading `]` are part of the class body.
fn find_char_class_end(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes.get(start) != Some(&b'[') {
        return None;
    }

    let mut idx = start + 1;
    if matches!(bytes.get(idx), Some(b'!' | b'^')) {
        idx += 1;
    }
    if bytes.get(idx) == Some(&b']') {
        idx += 1;
    }

    while idx < bytes.len() {
        if bytes[idx] == b']' {
            return Some(idx);
        }
        idx += 1;
    }

    None
}

/// Converts a component pattern to a regex body. `**` collapses to `*`
/// because a single component cannot span a slash.
fn component_regex_body(pattern: &str) -> String {
    let bytes = pattern.as_bytes();
    let mut body = String::with_capacity(pattern.len() + 8);
    let mut iter = pattern.char_indices().peekable();
    while let Some((i, ch)) = iter.next() {
        match ch {
            '*' => {
                if bytes.get(i + 1) == Some(&b'*') {
                    iter.next();
                }
                body.push_str("[^/]*");
            }
            '?' => body.push_str("[^/]"),
            '[' => {
                if let Some(end) = find_char_class_end(bytes, i) {
                    append_char_class(&pattern[i..=end], &mut body);
                    skip_past(&mut iter, end);
                } else {
                    push_literal('[', &mut body);
                }
            }
            _ => push_literal(ch, &mut body),
        }
    }

    body
}

/// Converts a path pattern to a regex body: `**/` matches zero or more
/// directories, `**` any run including `/`, `*` and `?` stay within one
/// component.
fn path_regex_body(pattern: &str) -> String {
    let bytes = pattern.as_bytes();
    let mut body = String::with_capacity(pattern.len() + 16);
    let mut iter = pattern.char_indices().peekable();
    while let Some((i, ch)) = iter.next() {
        match ch {
            '*' if bytes.get(i + 1) == Some(&b'*') && bytes.get(i + 2) == Some(&b'/') => {
                body.push_str("(?:.*/)?");
                iter.next();
                iter.next();
            }
            '*' if bytes.get(i + 1) == Some(&b'*') => {
                body.push_str(".*");
                iter.next();
            }
            '*' => body.push_str("[^/]*"),
            '?' => body.push_str("[^/]"),
            '[' => {
                if let Some(end) = find_char_class_end(bytes, i) {
                    append_char_class(&pattern[i..=end], &mut body);
                    skip_past(&mut iter, end);
                } else {
                    push_literal('[', &mut body);
                }
            }
            _ => push_literal(ch, &mut body),
        }
    }

    body
}

fn skip_past(iter: &mut std::iter::Peekable<std::str::CharIndices<'_>>, end: usize) {
    while let Some(&(next, _)) = iter.peek() {
        if next > end {
            break;
        }
        iter.next();
    }
}

/// Appends one glob char class (brackets included in `class`) as a regex
/// class. Gitignore-style `[!...]` negation maps to `[^...]`; a literal
/// leading `^` or `]` is escaped. Class content is copied with `\`, `[`,
/// `&`, `~` escaped so the regex engine's class-set extensions cannot
/// reinterpret literal glob text.
fn append_char_class(class: &str, body: &mut String) {
    let mut inner = &class[1..class.len() - 1];
    body.push('[');

    if let Some(rest) = inner.strip_prefix('!') {
        body.push('^');
        inner = rest;
    } else if let Some(rest) = inner.strip_prefix('^') {
        body.push_str("\\^");
        inner = rest;
    }

    if let Some(rest) = inner.strip_prefix(']') {
        body.push_str("\\]");
        inner = rest;
    }

    for ch in inner.chars() {
        match ch {
            '\\' => body.push_str("\\\\"),
            '[' => body.push_str("\\["),
            '&' => body.push_str("\\&"),
            '~' => body.push_str("\\~"),
            _ => body.push(ch),
        }
    }

    body.push(']');
}

fn push_literal(ch: char, body: &mut String) {
    if matches!(
        ch,
        '.' | '+' | '(' | ')' | '|' | '{' | '}' | '[' | ']' | '^' | '$' | '\\'
    ) {
        body.push('\\');
    }
    body.push(ch);
}

/// Matches a `*`/`?` wildcard pattern against one segment. `*` backtracks
/// greedily over non-`/` bytes; `?` consumes exactly one byte.
fn match_simple_wildcard(pattern: &[u8], input: &[u8]) -> bool {
    let mut p = 0;
    let mut s = 0;
    let mut star_pattern: Option<usize> = None;
    let mut star_input = 0;

    while s < input.len() {
        if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == input[s]) {
            p += 1;
            s += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star_pattern = Some(p);
            p += 1;
            star_input = s;
        } else if let Some(star) = star_pattern {
            // Mismatch after a star: rewind to the token after it and let the
            // star consume one more input byte.
            p = star + 1;
            star_input += 1;
            s = star_input;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }

    p == pattern.len()
}

/// Matches precompiled segments starting at a candidate boundary, returning
/// the byte position after the final matched segment.
fn match_path_segments_at(
    pattern: &[SegmentPattern],
    candidate: &str,
    start: usize,
) -> Option<usize> {
    let bytes = candidate.as_bytes();
    if start >= bytes.len() {
        return None;
    }

    let mut index = start;
    for (position, segment) in pattern.iter().enumerate() {
        let mut end = index;
        while end < bytes.len() && bytes[end] != b'/' {
            end += 1;
        }

        if end == index || !segment.matches(&candidate[index..end]) {
            return None;
        }

        index = end;
        if position == pattern.len() - 1 {
            // The caller validates the terminal constraint (full match vs
            // directory-subtree match) from this position.
            return Some(index);
        }

        if index >= bytes.len() || bytes[index] != b'/' {
            return None;
        }
        index += 1;
    }

    Some(index)
}

/// Matches slash patterns without `**` or char classes.
fn match_path_segments(
    pattern: &[SegmentPattern],
    candidate: &str,
    anchored: bool,
    dir_only: bool,
) -> bool {
    if pattern.is_empty() || candidate.is_empty() {
        return false;
    }

    if anchored {
        return match_path_segments_at(pattern, candidate, 0)
            .is_some_and(|end| segments_terminate(candidate, end, dir_only));
    }

    let bytes = candidate.as_bytes();
    let mut start = 0;
    loop {
        if let Some(end) = match_path_segments_at(pattern, candidate, start) {
            if segments_terminate(candidate, end, dir_only) {
                return true;
            }
        }

        // Shift to the next segment boundary and retry, emulating "(^|.*/)".
        match bytes[start..].iter().position(|&b| b == b'/') {
            Some(next) => start += next + 1,
            None => return false,
        }
    }
}

fn segments_terminate(candidate: &str, end: usize, dir_only: bool) -> bool {
    if end == candidate.len() {
        return true;
    }

    dir_only && candidate.as_bytes()[end] == b'/'
}

/// Matches a path pattern with trailing `/**`: the prefix directory must be
/// followed by at least one further component, so the bare directory itself
/// does not match.
fn match_path_prefix_double_star(
    prefix: &[SegmentPattern],
    candidate: &str,
    anchored: bool,
) -> bool {
    if prefix.is_empty() || candidate.is_empty() {
        return false;
    }

    let bytes = candidate.as_bytes();
    let descends = |end: usize| end < bytes.len() && bytes[end] == b'/';

    if anchored {
        return match_path_segments_at(prefix, candidate, 0).is_some_and(descends);
    }

    let mut start = 0;
    loop {
        if match_path_segments_at(prefix, candidate, start).is_some_and(descends) {
            return true;
        }

        match bytes[start..].iter().position(|&b| b == b'/') {
            Some(next) => start += next + 1,
            None => return false,
        }
    }
}

/// Matches a slash-containing literal pattern without a regex.
fn match_exact_path(
    pattern: &str,
    candidate: &str,
    is_dir: bool,
    anchored: bool,
    dir_only: bool,
) -> bool {
    if pattern.is_empty() || candidate.is_empty() {
        return false;
    }

    if anchored {
        if !dir_only {
            return candidate == pattern;
        }

        return candidate == pattern
            || (candidate.len() > pattern.len()
                && candidate.starts_with(pattern)
                && candidate.as_bytes()[pattern.len()] == b'/');
    }

    if !dir_only {
        return candidate == pattern
            || (candidate.len() > pattern.len()
                && candidate.ends_with(pattern)
                && candidate.as_bytes()[candidate.len() - pattern.len() - 1] == b'/');
    }

    contains_dir_path(pattern, candidate, is_dir)
}

/// Reports whether candidate contains pattern as a full slash-segment run;
/// an occurrence at the end of the candidate counts only for directories.
fn contains_dir_path(pattern: &str, candidate: &str, is_dir: bool) -> bool {
    let bytes = candidate.as_bytes();
    let mut start = 0;
    while start < candidate.len() {
        let Some(found) = candidate[start..].find(pattern) else {
            return false;
        };

        let idx = start + found;
        let after = idx + pattern.len();
        let before_ok = idx == 0 || bytes[idx - 1] == b'/';
        let after_ok = after == candidate.len() || bytes[after] == b'/';
        if before_ok && after_ok && (after < candidate.len() || is_dir) {
            return true;
        }

        start = idx + next_char_len(candidate, idx);
    }

    false
}

fn next_char_len(s: &str, at: usize) -> usize {
    s[at..].chars().next().map_or(1, char::len_utf8)
}

/// Scans a candidate's components, excluding the final basename unless the
/// candidate is a directory, and succeeds when any component matches.
fn match_dir_only_components(
    candidate: &str,
    is_dir: bool,
    matches: impl Fn(&str) -> bool,
) -> bool {
    let bytes = candidate.as_bytes();
    let mut start = 0;
    for i in 0..=bytes.len() {
        if i != bytes.len() && bytes[i] != b'/' {
            continue;
        }

        if i > start {
            if i == bytes.len() && !is_dir {
                return false;
            }

            if matches(&candidate[start..i]) {
                return true;
            }
        }

        start = i + 1;
    }

    false
}

/// Returns the final path component of a slash-separated path.
fn path_base(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}
