//! Identifier quoting for table/column names read back out of stored
//! [`ei_types::ChangeRecord`]s.
//!
//! `# 9` ("Identifier quoting in rollback"): table and column names
//! recorded in a change record come from data, not from the program text.
//! Every identifier the rollback engine uses must be routed through
//! [`quote_ident`] rather than concatenated raw into SQL; an identifier
//! that cannot be safely quoted is a fatal invariant violation, never a
//! silently-ignored one.

use crate::error::StoreError;

/// Quotes `ident` as a Postgres double-quoted identifier.
///
/// Rejects embedded NUL bytes and empty identifiers outright (these can
/// never be legal column/table names); any literal `"` is escaped per
/// Postgres's doubling convention.
pub fn quote_ident(ident: &str) -> Result<String, StoreError> {
    if ident.is_empty() || ident.contains('\0') {
        return Err(StoreError::InvalidIdentifier(ident.to_string()));
    }
    Ok(format!("\"{}\"", ident.replace('"', "\"\"")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifier_is_wrapped_in_double_quotes() {
        assert_eq!(quote_ident("block_height").unwrap(), "\"block_height\"");
    }

    #[test]
    fn embedded_quote_is_doubled() {
        assert_eq!(quote_ident("weird\"col").unwrap(), "\"weird\"\"col\"");
    }

    #[test]
    fn empty_identifier_is_an_invariant_violation() {
        assert!(quote_ident("").is_err());
    }

    #[test]
    fn embedded_nul_byte_is_an_invariant_violation() {
        assert!(quote_ident("a\0b").is_err());
    }
}
