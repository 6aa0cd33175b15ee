//! Hierarchical rules provider.
//!
//! A provider composes optional in-memory base rules with per-directory rule
//! files discovered along the ancestor chain from its root to the candidate's
//! directory. Directory matchers are compiled once and memoized; concurrent
//! requests for the same cold directory collapse to a single filesystem load.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::parse::parse_rules;
use crate::path::normalize_candidate;
use crate::{DirEntry, MatchResult, Matcher, MatcherOptions, ProviderOptions, RuleError};

/// Rules file name used when [`ProviderOptions::rules_file_name`] is unset.
pub const DEFAULT_RULES_FILE_NAME: &str = ".pathfilter";

/// Loads rules files along a directory hierarchy and evaluates decisions.
///
/// Decision order for a candidate: base rules first, then rule files from the
/// root directory down to the candidate's own directory. The last matching
/// rule across that stack wins; [`MatcherOptions::default_action`] applies
/// when nothing matched. Rules loaded from a directory apply only to entries
/// strictly beneath that directory.
///
/// The per-directory cache is monotone: once a directory has been loaded
/// (successfully, as missing, or as an error) that outcome is returned for
/// the lifetime of the provider. The provider is safe for concurrent use.
///
/// # Examples
///
/// ```
/// use pathfilter::{Provider, ProviderOptions};
///
/// let root = tempfile::tempdir().expect("tempdir");
/// std::fs::write(root.path().join(".pathfilter"), "*.log\n").expect("write rules");
///
/// let provider = Provider::new(root.path(), ProviderOptions::default()).expect("provider");
/// assert!(provider.excluded("build/app.log", false).expect("decide"));
/// assert!(provider.included("src/main.rs", false).expect("decide"));
/// ```
#[derive(Debug)]
pub struct Provider {
    /// Absolute provider root.
    root: PathBuf,
    /// Root with symlinks resolved when the escape check is enabled.
    resolved_root: PathBuf,
    rules_file_name: String,
    /// Matcher for in-memory base rules, absent when no base rules were set.
    base_matcher: Option<Matcher>,
    matcher_options: MatcherOptions,
    symlink_escape_check: bool,
    cache: Mutex<HashMap<String, Arc<DirCacheCell>>>,
}

/// One cache slot: loading state plus a latch for concurrent waiters.
#[derive(Debug)]
struct DirCacheCell {
    state: Mutex<CellState>,
    ready: Condvar,
}

#[derive(Debug)]
enum CellState {
    /// A load is in flight on another thread.
    Loading,
    /// Load finished; `None` means the directory has no rules file.
    Ready(Option<Arc<Matcher>>),
    /// Load failed; the error is replayed on every later request.
    Failed(RuleError),
}

impl DirCacheCell {
    fn new() -> Self {
        Self {
            state: Mutex::new(CellState::Loading),
            ready: Condvar::new(),
        }
    }
}

/// One prepared directory matcher with the prefix it applies beneath.
struct PreparedDirMatcher {
    matcher: Arc<Matcher>,
    prefix: String,
}

impl Provider {
    /// Creates a provider rooted at `root`.
    ///
    /// The root is made absolute, and resolved through symlinks when
    /// [`ProviderOptions::symlink_escape_check`] is set (falling back to the
    /// absolute path when the root does not exist yet). Base rules are
    /// compiled eagerly; an invalid base rule is fatal here.
    ///
    /// # Errors
    ///
    /// [`RuleError::InvalidRulesFileName`] for a bad rules file name,
    /// [`RuleError::InvalidPattern`] for an uncompilable base rule, and
    /// [`RuleError::Io`] when the root cannot be resolved.
    pub fn new(root: impl AsRef<Path>, options: ProviderOptions) -> Result<Self, RuleError> {
        let root = absolute_path(root.as_ref())?;
        let resolved_root = if options.symlink_escape_check {
            resolve_or_absolute(&root)?
        } else {
            root.clone()
        };

        let rules_file_name = clean_rules_file_name(options.rules_file_name.as_deref())?;
        let matcher_options = options.matcher_options;
        let base_matcher = if options.base_rules.is_empty() {
            None
        } else {
            Some(Matcher::new(options.base_rules, matcher_options)?)
        };

        Ok(Self {
            root,
            resolved_root,
            rules_file_name,
            base_matcher,
            matcher_options,
            symlink_escape_check: options.symlink_escape_check,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the absolute provider root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the per-directory rules file name.
    #[must_use]
    pub fn rules_file_name(&self) -> &str {
        &self.rules_file_name
    }

    /// Returns the final decision for a path relative to the provider root.
    ///
    /// # Errors
    ///
    /// [`RuleError::PathOutsideRoot`] for empty, absolute, or traversing
    /// input, and any cached or fresh rule-file load failure along the
    /// ancestor chain.
    pub fn decide(&self, rel_path: &str, is_dir: bool) -> Result<MatchResult, RuleError> {
        let normalized = clean_rel_path(rel_path)?;

        let mut result = MatchResult::no_match(self.matcher_options.default_action);
        if let Some(base) = &self.base_matcher {
            let base_result = base.decide(&normalized, is_dir);
            if base_result.matched {
                result = base_result;
            }
        }

        let rel_dir = parent_dir(&normalized, is_dir);
        self.apply_dir_matcher("", &normalized, is_dir, &mut result)?;
        if !rel_dir.is_empty() {
            for (i, byte) in rel_dir.bytes().enumerate() {
                if byte == b'/' {
                    self.apply_dir_matcher(&rel_dir[..i], &normalized, is_dir, &mut result)?;
                }
            }

            self.apply_dir_matcher(rel_dir, &normalized, is_dir, &mut result)?;
        }

        Ok(result)
    }

    /// Returns decisions for several entries of one directory.
    ///
    /// The directory matcher chain is loaded once and reused for every
    /// entry; results are index-aligned with `entries`. An empty or `.`
    /// directory targets the root.
    ///
    /// # Errors
    ///
    /// [`RuleError::PathOutsideRoot`] for a bad directory,
    /// [`RuleError::InvalidEntryName`] for an entry that is not a single
    /// clean component, and any rule-file load failure along the chain.
    pub fn decide_in_dir(
        &self,
        rel_dir: &str,
        entries: &[DirEntry],
    ) -> Result<Vec<MatchResult>, RuleError> {
        let normalized_dir = clean_rel_dir(rel_dir)?;
        let matchers = self.prepare_dir_matchers(&normalized_dir)?;

        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = clean_entry_name(&entry.name)?;
            let full_path = if normalized_dir.is_empty() {
                name
            } else {
                format!("{normalized_dir}/{name}")
            };

            let mut result = MatchResult::no_match(self.matcher_options.default_action);
            if let Some(base) = &self.base_matcher {
                let base_result = base.decide(&full_path, entry.is_dir);
                if base_result.matched {
                    result = base_result;
                }
            }

            for prepared in &matchers {
                apply_matcher_decision(
                    &prepared.matcher,
                    &prepared.prefix,
                    &full_path,
                    entry.is_dir,
                    &mut result,
                );
            }

            results.push(result);
        }

        Ok(results)
    }

    /// Reports whether the path is included by the provider decision.
    ///
    /// # Errors
    ///
    /// Same failures as [`Provider::decide`].
    pub fn included(&self, rel_path: &str, is_dir: bool) -> Result<bool, RuleError> {
        Ok(self.decide(rel_path, is_dir)?.included)
    }

    /// Reports whether the path is excluded by the provider decision.
    ///
    /// # Errors
    ///
    /// Same failures as [`Provider::decide`].
    pub fn excluded(&self, rel_path: &str, is_dir: bool) -> Result<bool, RuleError> {
        Ok(!self.included(rel_path, is_dir)?)
    }

    /// Reports include decisions for several entries of one directory.
    ///
    /// # Errors
    ///
    /// Same failures as [`Provider::decide_in_dir`].
    pub fn included_in_dir(
        &self,
        rel_dir: &str,
        entries: &[DirEntry],
    ) -> Result<Vec<bool>, RuleError> {
        let results = self.decide_in_dir(rel_dir, entries)?;
        Ok(results.iter().map(|result| result.included).collect())
    }

    /// Reports exclude decisions for several entries of one directory.
    ///
    /// # Errors
    ///
    /// Same failures as [`Provider::decide_in_dir`].
    pub fn excluded_in_dir(
        &self,
        rel_dir: &str,
        entries: &[DirEntry],
    ) -> Result<Vec<bool>, RuleError> {
        let included = self.included_in_dir(rel_dir, entries)?;
        Ok(included.into_iter().map(|included| !included).collect())
    }

    /// Loads one directory matcher and folds its decision into `result`.
    fn apply_dir_matcher(
        &self,
        rel: &str,
        normalized: &str,
        is_dir: bool,
        result: &mut MatchResult,
    ) -> Result<(), RuleError> {
        let Some(matcher) = self.dir_matcher(rel)? else {
            return Ok(());
        };

        apply_matcher_decision(&matcher, rel, normalized, is_dir, result);
        Ok(())
    }

    /// Loads and collects the matcher chain for one directory, root first.
    fn prepare_dir_matchers(&self, rel_dir: &str) -> Result<Vec<PreparedDirMatcher>, RuleError> {
        let mut matchers = Vec::with_capacity(rel_dir.matches('/').count() + 2);
        let push = |matchers: &mut Vec<PreparedDirMatcher>, prefix: &str| {
            self.dir_matcher(prefix).map(|loaded| {
                if let Some(matcher) = loaded {
                    matchers.push(PreparedDirMatcher {
                        matcher,
                        prefix: prefix.to_string(),
                    });
                }
            })
        };

        push(&mut matchers, "")?;
        if rel_dir.is_empty() {
            return Ok(matchers);
        }

        for (i, byte) in rel_dir.bytes().enumerate() {
            if byte == b'/' {
                push(&mut matchers, &rel_dir[..i])?;
            }
        }

        push(&mut matchers, rel_dir)?;
        Ok(matchers)
    }

    /// Returns the cached or freshly loaded matcher for one directory.
    ///
    /// The first caller for a directory owns the load; concurrent callers
    /// block on the cell's latch and read the published outcome. Absent rule
    /// files cache as `None`, failures cache as the error itself.
    fn dir_matcher(&self, rel_dir: &str) -> Result<Option<Arc<Matcher>>, RuleError> {
        let (cell, owns_load) = {
            let mut cache = lock(&self.cache);
            match cache.get(rel_dir) {
                Some(cell) => (Arc::clone(cell), false),
                None => {
                    let cell = Arc::new(DirCacheCell::new());
                    cache.insert(rel_dir.to_string(), Arc::clone(&cell));
                    (cell, true)
                }
            }
        };

        if owns_load {
            let outcome = self.read_dir_matcher(rel_dir);
            let mut state = lock(&cell.state);
            *state = match outcome {
                Ok(matcher) => CellState::Ready(matcher),
                Err(error) => CellState::Failed(error),
            };
            cell.ready.notify_all();
            return snapshot(&state);
        }

        let mut state = lock(&cell.state);
        while matches!(*state, CellState::Loading) {
            state = cell
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        trace!(directory = rel_dir, "using cached directory matcher");
        snapshot(&state)
    }

    /// Reads, parses, and compiles one directory rules file.
    fn read_dir_matcher(&self, rel_dir: &str) -> Result<Option<Arc<Matcher>>, RuleError> {
        let dir = if rel_dir.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel_dir)
        };
        let rules_path = dir.join(&self.rules_file_name);

        let content = if self.symlink_escape_check {
            match fs::symlink_metadata(&rules_path) {
                Ok(_) => {}
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    trace!(directory = rel_dir, "no rules file");
                    return Ok(None);
                }
                Err(error) => return Err(io_error(&rules_path, error)),
            }

            let resolved = resolve_or_absolute(&rules_path)?;
            if !resolved.starts_with(&self.resolved_root) {
                debug!(
                    path = %rules_path.display(),
                    resolved = %resolved.display(),
                    "rules file escapes provider root"
                );
                return Err(RuleError::RulesPathOutsideRoot { path: rules_path });
            }

            fs::read(&rules_path).map_err(|error| io_error(&rules_path, error))?
        } else {
            match fs::read(&rules_path) {
                Ok(content) => content,
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    trace!(directory = rel_dir, "no rules file");
                    return Ok(None);
                }
                Err(error) => return Err(io_error(&rules_path, error)),
            }
        };

        let rules = parse_rules(content.as_slice()).map_err(|error| match error {
            RuleError::Parse { error } => RuleError::Io {
                path: rules_path.clone(),
                error,
            },
            other => other,
        })?;
        let matcher = Matcher::new(rules, self.matcher_options)?;
        debug!(path = %rules_path.display(), "compiled directory rules file");
        Ok(Some(Arc::new(matcher)))
    }
}

/// Applies one directory matcher: rules in a directory's rules file describe
/// entries beneath that directory, never the directory path itself.
fn apply_matcher_decision(
    matcher: &Matcher,
    prefix: &str,
    normalized: &str,
    is_dir: bool,
    result: &mut MatchResult,
) {
    let candidate = if prefix.is_empty() {
        normalized
    } else {
        if normalized == prefix {
            return;
        }

        let Some(below) = normalized
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return;
        };
        below
    };

    let decision = matcher.decide(candidate, is_dir);
    if decision.matched {
        *result = decision;
    }
}

fn snapshot(state: &CellState) -> Result<Option<Arc<Matcher>>, RuleError> {
    match state {
        // The latch only opens after a terminal state is published.
        CellState::Loading => unreachable!("cache cell read while still loading"),
        CellState::Ready(matcher) => Ok(matcher.clone()),
        CellState::Failed(error) => Err(error.clone()),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn io_error(path: &Path, error: io::Error) -> RuleError {
    RuleError::Io {
        path: path.to_path_buf(),
        error: Arc::new(error),
    }
}

fn absolute_path(path: &Path) -> Result<PathBuf, RuleError> {
    std::path::absolute(path).map_err(|error| io_error(path, error))
}

/// Resolves symlinks, falling back to the absolute path for paths that do
/// not exist yet.
fn resolve_or_absolute(path: &Path) -> Result<PathBuf, RuleError> {
    match path.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(error) if error.kind() == io::ErrorKind::NotFound => absolute_path(path),
        Err(error) => Err(io_error(path, error)),
    }
}

/// Validates and normalizes the per-directory rules file name.
fn clean_rules_file_name(raw: Option<&str>) -> Result<String, RuleError> {
    let name = raw.map_or("", str::trim);
    let name = if name.is_empty() {
        DEFAULT_RULES_FILE_NAME
    } else {
        name
    };

    if Path::new(name).is_absolute()
        || name.contains('/')
        || name.contains('\\')
        || name == "."
        || name == ".."
    {
        return Err(RuleError::InvalidRulesFileName {
            name: name.to_string(),
        });
    }

    Ok(name.to_string())
}

/// Validates and normalizes one provider-relative path.
///
/// Rejects empty, absolute, and traversing input before the lexical
/// normalizer runs, so `..` can never resolve against the root.
fn clean_rel_path(raw: &str) -> Result<String, RuleError> {
    let outside = || RuleError::PathOutsideRoot {
        path: raw.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() || Path::new(trimmed).is_absolute() {
        return Err(outside());
    }

    let slashed: Cow<'_, str> = if trimmed.contains('\\') {
        Cow::Owned(trimmed.replace('\\', "/"))
    } else {
        Cow::Borrowed(trimmed)
    };
    if slashed.starts_with('/') {
        return Err(outside());
    }

    let mut path: &str = &slashed;
    path = path.strip_prefix("./").unwrap_or(path);
    path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() || path == "." || path == ".." || path.starts_with("../") {
        return Err(outside());
    }

    let collapsed = path.replace("/./", "/");
    let mut path = collapsed.as_str();
    path = path.strip_prefix("./").unwrap_or(path);
    if path.contains("/../") || path.ends_with("/..") {
        return Err(outside());
    }

    let normalized = normalize_candidate(path);
    if normalized.is_empty() {
        return Err(outside());
    }

    Ok(normalized.into_owned())
}

/// Normalizes and validates a provider-relative directory; empty and `.`
/// mean the root.
fn clean_rel_dir(raw: &str) -> Result<String, RuleError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "." {
        return Ok(String::new());
    }

    clean_rel_path(trimmed)
}

/// Validates one directory entry name: a single clean path component.
fn clean_entry_name(raw: &str) -> Result<String, RuleError> {
    let invalid = || RuleError::InvalidEntryName {
        name: raw.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() || Path::new(trimmed).is_absolute() {
        return Err(invalid());
    }

    let slashed: Cow<'_, str> = if trimmed.contains('\\') {
        Cow::Owned(trimmed.replace('\\', "/"))
    } else {
        Cow::Borrowed(trimmed)
    };
    if slashed.contains('/') {
        return Err(invalid());
    }

    let name = normalize_candidate(&slashed);
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(invalid());
    }

    Ok(name.into_owned())
}

/// Returns the directory part of a relative path: the path itself for
/// directories, everything before the final `/` otherwise.
fn parent_dir(rel_path: &str, is_dir: bool) -> &str {
    if is_dir {
        return rel_path;
    }

    match rel_path.rfind('/') {
        Some(i) => &rel_path[..i],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_file_name_defaults_when_unset() {
        assert_eq!(
            clean_rules_file_name(None).expect("default"),
            DEFAULT_RULES_FILE_NAME
        );
        assert_eq!(
            clean_rules_file_name(Some("   ")).expect("default"),
            DEFAULT_RULES_FILE_NAME
        );
        assert_eq!(
            clean_rules_file_name(Some(".pboignore")).expect("custom"),
            ".pboignore"
        );
    }

    #[test]
    fn rules_file_name_rejects_separators_and_dots() {
        for name in ["a/b", "a\\b", ".", "..", "/abs"] {
            assert!(
                matches!(
                    clean_rules_file_name(Some(name)),
                    Err(RuleError::InvalidRulesFileName { .. })
                ),
                "{name:?} must be rejected"
            );
        }
    }

    #[test]
    fn rel_path_rejects_traversal() {
        for path in ["", "  ", "/etc/passwd", "../a", "a/../b", "a/..", "..", ".", "./"] {
            assert!(
                matches!(clean_rel_path(path), Err(RuleError::PathOutsideRoot { .. })),
                "{path:?} must be rejected"
            );
        }
    }

    #[test]
    fn rel_path_normalizes_accepted_input() {
        assert_eq!(clean_rel_path("./a/./b.txt").expect("clean"), "a/b.txt");
        assert_eq!(clean_rel_path(r"a\b\c").expect("clean"), "a/b/c");
        assert_eq!(clean_rel_path("a//b/").expect("clean"), "a/b");
    }

    #[test]
    fn backslash_traversal_is_rejected() {
        assert!(matches!(
            clean_rel_path(r"..\x"),
            Err(RuleError::PathOutsideRoot { .. })
        ));
        assert!(matches!(
            clean_rel_path(r"a\..\b"),
            Err(RuleError::PathOutsideRoot { .. })
        ));
    }

    #[test]
    fn rel_dir_treats_empty_and_dot_as_root() {
        assert_eq!(clean_rel_dir("").expect("root"), "");
        assert_eq!(clean_rel_dir(".").expect("root"), "");
        assert_eq!(clean_rel_dir("sub/dir").expect("dir"), "sub/dir");
    }

    #[test]
    fn entry_name_must_be_single_component() {
        assert_eq!(clean_entry_name(" a.txt ").expect("clean"), "a.txt");
        for name in ["", "a/b", r"a\b", ".", "..", "/abs"] {
            assert!(
                matches!(
                    clean_entry_name(name),
                    Err(RuleError::InvalidEntryName { .. })
                ),
                "{name:?} must be rejected"
            );
        }
    }

    #[test]
    fn parent_dir_for_files_and_dirs() {
        assert_eq!(parent_dir("a/b/c.txt", false), "a/b");
        assert_eq!(parent_dir("a/b", true), "a/b");
        assert_eq!(parent_dir("c.txt", false), "");
    }
}
