//! Tests for directory-only (trailing `/`) pattern semantics.
//!
//! Component rules with a trailing `/` match when any parent component of
//! the candidate matches, or the final component when the candidate is a
//! directory. Path rules with a trailing `/` match at a directory position
//! and cover the subtree beneath it.

use pathfilter::{Matcher, MatcherOptions, Rule};

fn exclude(pattern: &str) -> Matcher {
    Matcher::new(vec![Rule::exclude(pattern)], MatcherOptions::default()).expect("pattern compiles")
}

// ============================================================================
// Component Rules
// ============================================================================

/// A dir-only component rule covers everything beneath a matching directory.
#[test]
fn component_dir_rule_covers_contents() {
    let set = exclude("build/");

    assert!(set.excluded("build/out.bin", false));
    assert!(set.excluded("build/sub/deep.txt", false));
    assert!(set.excluded("project/build/out.bin", false));
}

/// The directory itself matches only as a directory.
#[test]
fn component_dir_rule_respects_entry_kind() {
    let set = exclude("build/");

    assert!(set.excluded("build", true));
    assert!(set.included("build", false));
    assert!(set.excluded("nested/build", true));
    assert!(set.included("nested/build", false));
}

/// A file whose basename matches a dir-only rule is not covered.
#[test]
fn basename_of_file_not_matched_by_dir_rule() {
    let set = exclude("cache/");

    // "cache" here is the basename of a file path, not a parent component.
    assert!(set.included("data/cache", false));
    assert!(set.excluded("data/cache", true));
}

/// Dir-only wildcards scan parent components.
#[test]
fn wildcard_dir_rule_scans_parents() {
    let set = exclude("*_cache/");

    assert!(set.excluded("page_cache/entry", false));
    assert!(set.excluded("srv/tmp_cache/blob.bin", false));
    assert!(set.included("page_cache", false));
    assert!(set.excluded("page_cache", true));
}

/// Dir-only char classes take the component regex path.
#[test]
fn char_class_dir_rule() {
    let set = exclude("v[0-9]/");

    assert!(set.excluded("v1/lib.rs", false));
    assert!(set.excluded("releases/v3/notes.md", false));
    assert!(set.included("v10/lib.rs", false));
    assert!(set.excluded("v7", true));
}

// ============================================================================
// Path Rules
// ============================================================================

/// Anchored dir-only literal covers the directory and its subtree.
#[test]
fn anchored_path_dir_rule() {
    let set = exclude("/target/release/");

    assert!(set.excluded("target/release", true));
    assert!(set.excluded("target/release/app", false));
    assert!(set.included("pkg/target/release/app", false));
}

/// Unanchored dir-only literal matches the segment run anywhere; at the end
/// of the candidate it requires a directory.
#[test]
fn unanchored_path_dir_rule() {
    let set = exclude("src/gen/");

    assert!(set.excluded("src/gen/file.rs", false));
    assert!(set.excluded("vendor/src/gen/file.rs", false));
    assert!(set.excluded("src/gen", true));
    assert!(set.included("src/gen", false));
}

/// Dir-only segment wildcards stop at a directory boundary.
#[test]
fn segment_wildcard_dir_rule() {
    let set = exclude("out_*/bin/");

    assert!(set.excluded("out_debug/bin", true));
    assert!(set.excluded("out_debug/bin/tool", false));
    assert!(set.excluded("ws/out_release/bin/tool", false));
    assert!(set.included("out_debug/binx/tool", false));
}

/// A trailing `/` on a directory candidate is normalized away before
/// matching.
#[test]
fn trailing_slash_candidates_normalize() {
    let set = exclude("build/");

    assert!(set.excluded("build/", true));
    assert!(set.excluded("project/build/", true));
}

// ============================================================================
// Interplay With Re-Includes
// ============================================================================

/// A dir-only exclude can be partially overridden for specific files.
#[test]
fn dir_exclude_with_file_reinclude() {
    let set = Matcher::new(
        vec![Rule::exclude("build/"), Rule::include("build/keep.txt")],
        MatcherOptions::default(),
    )
    .expect("rules compile");

    assert!(set.excluded("build/other.txt", false));
    assert!(set.included("build/keep.txt", false));
    assert!(set.excluded("build", true));
}

/// Dir-only and plain rules on the same name distinguish entry kind.
#[test]
fn dir_only_and_plain_rule_disambiguate_by_kind() {
    let set = Matcher::new(
        vec![Rule::include("data"), Rule::exclude("data/")],
        MatcherOptions::default(),
    )
    .expect("rules compile");

    // Directory: both match, the dir-only exclude is last.
    assert!(set.excluded("data", true));
    // File: only the plain include matches.
    assert!(set.included("data", false));
}
