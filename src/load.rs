//! Rules-file loading helpers.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::parse::parse_rules;
use crate::{Rule, RuleError};

/// Reads and parses rules from a file.
///
/// # Errors
///
/// Returns [`RuleError::Io`] with the offending path when the file cannot be
/// opened or read.
pub fn load_rules_file(path: impl AsRef<Path>) -> Result<Vec<Rule>, RuleError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|error| RuleError::Io {
        path: path.to_path_buf(),
        error: Arc::new(error),
    })?;

    parse_rules(BufReader::new(file)).map_err(|error| match error {
        RuleError::Parse { error } => RuleError::Io {
            path: path.to_path_buf(),
            error,
        },
        other => other,
    })
}

/// Reads and concatenates rules from several files in argument order.
///
/// Rule order inside each file is preserved.
///
/// # Errors
///
/// Returns the first [`RuleError::Io`] encountered; later files are not
/// read after a failure.
pub fn load_rules_files<I, P>(paths: I) -> Result<Vec<Rule>, RuleError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut rules = Vec::new();
    for path in paths {
        rules.extend(load_rules_file(path)?);
    }

    Ok(rules)
}
