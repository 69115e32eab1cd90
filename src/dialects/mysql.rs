//! The MySQL dialect: derived from ANSI.
//!
//! Catalog status: thin derivation. Covers backtick-quoted identifiers,
//! the `REGEXP` operator (and its demotion to an unreserved keyword),
//! and `#` line comments inherited from the ANSI matcher set.

use crate::dialects::DialectKit;
use crate::dialects::ansi::ansi_dialect_kit;
use crate::errors::CoreError;
use crate::grammar::{GrammarDef, kw, one_of, r, typed_parser};
use crate::lexer::{Matcher};
use crate::segments::LeafKind;
use smol_str::SmolStr;

/// Build the unexpanded MySQL dialect.
pub fn mysql_dialect_kit() -> Result<DialectKit, CoreError> {
    let mut d = ansi_dialect_kit()?.copy_as("mysql");

    // REGEXP is usable as an identifier in MySQL.
    d.remove_keyword("REGEXP");
    d.add_keywords(false, &["REGEXP", "RLIKE"]);

    // Backtick quoting produces identifiers, not string literals.
    d.patch_lexer(vec![
        Matcher::regex("back_quote", r"`(?:[^`]|``)*`", "back_quote", LeafKind::Code)
            .with_trim_chars(&['`']),
    ]);
    d.replace(
        "QuotedIdentifierSegment",
        crate::dialects::RegistryEntry::Grammar({
            let mut def = typed_parser("back_quote", Some("quoted_identifier"));
            if let GrammarDef::TypedParser {
                extra_class_types, ..
            } = &mut def
            {
                extra_class_types.push(SmolStr::new("identifier"));
            }
            def
        }),
    )?;

    // REGEXP / RLIKE as binary operators.
    d.replace(
        "BinaryOperatorGrammar",
        crate::dialects::RegistryEntry::Grammar(one_of(vec![
            r("ArithmeticBinaryOperatorGrammar"),
            r("StringBinaryOperatorGrammar"),
            r("ComparisonOperatorGrammar"),
            r("BooleanBinaryOperatorGrammar"),
            kw("REGEXP"),
            kw("RLIKE"),
        ])),
    )?;

    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_expands() {
        let dialect = mysql_dialect_kit().unwrap().expand().unwrap();
        assert_eq!(dialect.name(), "mysql");
        assert!(dialect.unreserved_keywords().contains("REGEXP"));
        assert!(!dialect.reserved_keywords().contains("REGEXP"));
    }

    #[test]
    fn test_ansi_keeps_regexp_reserved() {
        let dialect = ansi_dialect_kit().unwrap().expand().unwrap();
        assert!(dialect.reserved_keywords().contains("REGEXP"));
    }
}
