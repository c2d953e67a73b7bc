//! Database names.
//!
//! `CREATE DATABASE` takes the name as a bare, unquoted identifier. Names are
//! checked here before they are ever interpolated into a statement.

use crate::constants::MAX_IDENTIFIER_LEN;
use crate::error::{DrydockError, Result};
use crate::utils::IdGenerator;

/// Generated database name: `prefix` followed by a random token
pub fn generate_database_name(prefix: &str, ids: &dyn IdGenerator) -> String {
    format!("{prefix}{}", ids.generate())
}

/// Check that `name` is safe to use as an unquoted identifier
///
/// Accepts 1 to 63 bytes matching `[a-z_][a-z0-9_$]*`. Upper case is
/// rejected because the server folds unquoted identifiers to lower case,
/// which would make the later scoped connection miss the database.
pub fn validate_database_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let first = chars
        .next()
        .ok_or_else(|| DrydockError::invalid_database_name(name, "name is empty"))?;

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(DrydockError::invalid_database_name(
            name,
            format!("name exceeds {MAX_IDENTIFIER_LEN} bytes"),
        ));
    }

    if !(first.is_ascii_lowercase() || first == '_') {
        return Err(DrydockError::invalid_database_name(
            name,
            "name must start with a lower-case letter or underscore",
        ));
    }

    if let Some(bad) =
        chars.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '$'))
    {
        return Err(DrydockError::invalid_database_name(
            name,
            format!("character '{bad}' is not allowed in an unquoted identifier"),
        ));
    }

    Ok(())
}
