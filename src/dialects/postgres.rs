//! The PostgreSQL dialect: derived from ANSI.
//!
//! Catalog status: thin derivation. Covers `ILIKE`, dollar-quoted
//! string literals, and the `~`/`!~` pattern-match operators.

use crate::dialects::{DialectKit, RegistryEntry};
use crate::dialects::ansi::ansi_dialect_kit;
use crate::errors::CoreError;
use crate::grammar::{kw, one_of, r, typed_parser};
use crate::lexer::Matcher;
use crate::segments::LeafKind;

/// Build the unexpanded PostgreSQL dialect.
pub fn postgres_dialect_kit() -> Result<DialectKit, CoreError> {
    let mut d = ansi_dialect_kit()?.copy_as("postgres");

    d.add_keywords(false, &["ILIKE", "RETURNING"]);

    // Dollar-quoted literals and regex-match operators lex ahead of the
    // single-character fallbacks.
    d.patch_lexer(vec![
        Matcher::regex(
            "dollar_quote",
            r"\$(\w*)\$.*?\$(\w*)\$",
            "dollar_quote",
            LeafKind::Code,
        ),
        Matcher::regex("like_operator", r"!?~\*?", "like_operator", LeafKind::Code),
    ]);

    d.replace(
        "BinaryOperatorGrammar",
        RegistryEntry::Grammar(one_of(vec![
            r("ArithmeticBinaryOperatorGrammar"),
            r("StringBinaryOperatorGrammar"),
            r("ComparisonOperatorGrammar"),
            r("BooleanBinaryOperatorGrammar"),
            typed_parser("like_operator", Some("comparison_operator")),
            kw("ILIKE"),
        ])),
    )?;

    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_expands() {
        let dialect = postgres_dialect_kit().unwrap().expand().unwrap();
        assert_eq!(dialect.name(), "postgres");
        assert!(dialect.unreserved_keywords().contains("ILIKE"));
    }
}
