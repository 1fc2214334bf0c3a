//! Validation for names interpolated into DDL/DML text.
//!
//! Schema, table and column names cannot be bound as statement parameters,
//! so every name coming from configuration is checked against the safe
//! identifier alphabet before it is formatted into a statement.

use crate::Error;

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`, rejects everything else.
pub(crate) fn check(name: &str) -> Result<&str, Error> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if head_ok && tail_ok {
        Ok(name)
    } else {
        Err(Error::InvalidIdentifier(name.to_owned()))
    }
}
