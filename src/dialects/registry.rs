//! The built-in dialect catalog.
//!
//! Status per dialect:
//! - `ansi`     - complete for the supported statement surface.
//! - `mysql`    - thin derivation (quoting, REGEXP keyword/operator).
//! - `postgres` - thin derivation (ILIKE, dollar quoting, `~` operators).
//!
//! Expansion happens once per dialect, lazily; the expanded dialects are
//! immutable and shared between all linter instances and threads.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::dialects::{Dialect, ansi_dialect_kit, mysql_dialect_kit, postgres_dialect_kit};
use crate::errors::CoreError;

static ANSI: Lazy<Arc<Dialect>> = Lazy::new(|| {
    Arc::new(
        ansi_dialect_kit()
            .and_then(|kit| kit.expand())
            .expect("the built-in ansi dialect must expand"),
    )
});

static MYSQL: Lazy<Arc<Dialect>> = Lazy::new(|| {
    Arc::new(
        mysql_dialect_kit()
            .and_then(|kit| kit.expand())
            .expect("the built-in mysql dialect must expand"),
    )
});

static POSTGRES: Lazy<Arc<Dialect>> = Lazy::new(|| {
    Arc::new(
        postgres_dialect_kit()
            .and_then(|kit| kit.expand())
            .expect("the built-in postgres dialect must expand"),
    )
});

/// Look up an expanded built-in dialect by name.
pub fn dialect_by_name(name: &str) -> Result<Arc<Dialect>, CoreError> {
    match name {
        "ansi" => Ok(ANSI.clone()),
        "mysql" => Ok(MYSQL.clone()),
        "postgres" => Ok(POSTGRES.clone()),
        other => Err(CoreError::UnknownDialect(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_dialects_resolve() {
        for name in ["ansi", "mysql", "postgres"] {
            assert_eq!(dialect_by_name(name).unwrap().name(), name);
        }
    }

    #[test]
    fn test_unknown_dialect_errors() {
        assert!(matches!(
            dialect_by_name("klingon"),
            Err(CoreError::UnknownDialect(_))
        ));
    }

    #[test]
    fn test_expanded_dialects_are_shared() {
        let a = dialect_by_name("ansi").unwrap();
        let b = dialect_by_name("ansi").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
