//! Dialect inheritance and expansion tests.

use silt::config::LintConfig;
use silt::dialects::{RegistryEntry, ansi_dialect_kit, dialect_by_name};
use silt::grammar::{kw, seq};
use silt::linter::Linter;

#[test]
fn test_ansi_expands() {
    let dialect = dialect_by_name("ansi").unwrap();
    assert_eq!(dialect.name(), "ansi");
    assert!(dialect.ref_id("SelectStatementSegment").is_some());
    assert!(dialect.ref_id("FileSegment").is_some());
    assert!(dialect.bracket_pair("round").is_some());
    assert!(dialect.is_keyword("select"));
    assert!(dialect.is_reserved_keyword("SELECT"));
    assert!(!dialect.is_reserved_keyword("OFFSET"));
}

/// Invariant: after `copy_as`, an unmodified grammar matches an
/// identical token sequence to the parent's grammar.
#[test]
fn test_copy_as_is_sound() {
    let child = ansi_dialect_kit()
        .unwrap()
        .copy_as("custom")
        .expand()
        .unwrap();
    assert_eq!(child.name(), "custom");

    // Same statement surface, same parse shape.
    let sql = "SELECT a, b FROM foo WHERE a > 1\n";
    let parent_tree = Linter::new(LintConfig::default())
        .unwrap()
        .parse_string(sql)
        .tree;

    // Parse with the child by lexing and parsing manually.
    let config = LintConfig::default();
    let tf = std::sync::Arc::new(silt::templater::TemplatedFile::from_string(sql));
    let lexer = silt::lexer::Lexer::new(child.lexer_matchers().to_vec(), true);
    let (segments, violations) = lexer.lex(&tf);
    assert!(violations.is_empty());
    let parsed = silt::parser::Parser::new(&child, &config).parse(&segments, &tf);
    assert!(parsed.violations.is_empty(), "{:?}", parsed.violations);
    assert_eq!(parsed.root.stringify(), parent_tree.stringify());
}

#[test]
fn test_add_asserts_absence() {
    let mut kit = ansi_dialect_kit().unwrap();
    let result = kit.add(
        "SelectClauseSegment",
        RegistryEntry::Grammar(seq(vec![kw("SELECT")])),
    );
    assert!(result.is_err());
}

#[test]
fn test_replace_asserts_presence() {
    let mut kit = ansi_dialect_kit().unwrap();
    let result = kit.replace(
        "NoSuchSegment",
        RegistryEntry::Grammar(seq(vec![kw("SELECT")])),
    );
    assert!(result.is_err());
}

#[test]
fn test_unresolved_ref_fails_expansion() {
    let mut kit = ansi_dialect_kit().unwrap().copy_as("broken");
    kit.replace(
        "LiteralGrammar",
        RegistryEntry::Grammar(silt::grammar::r("MissingGrammar")),
    )
    .unwrap();
    assert!(kit.expand().is_err());
}

#[test]
fn test_unknown_keyword_fails_expansion() {
    let mut kit = ansi_dialect_kit().unwrap().copy_as("broken");
    kit.replace(
        "LiteralGrammar",
        RegistryEntry::Grammar(kw("FLIBBLE")),
    )
    .unwrap();
    assert!(kit.expand().is_err());
}

#[test]
fn test_mysql_backtick_identifiers() {
    let linter = Linter::new(LintConfig::default().with_dialect("mysql")).unwrap();
    let parsed = linter.parse_string("SELECT `my col` FROM `my table`\n");
    assert!(parsed.violations.is_empty(), "{:?}", parsed.violations);
    let quoted = parsed.tree.recursive_crawl(&["quoted_identifier"], true);
    assert_eq!(quoted.len(), 2);
}

#[test]
fn test_mysql_regexp_operator_parses() {
    let linter = Linter::new(LintConfig::default().with_dialect("mysql")).unwrap();
    let parsed = linter.parse_string("SELECT a FROM t WHERE name REGEXP 'x.*'\n");
    assert!(parsed.violations.is_empty(), "{:?}", parsed.violations);
}

#[test]
fn test_postgres_ilike_parses() {
    let linter = Linter::new(LintConfig::default().with_dialect("postgres")).unwrap();
    let parsed = linter.parse_string("SELECT a FROM t WHERE b ILIKE 'x%'\n");
    assert!(parsed.violations.is_empty(), "{:?}", parsed.violations);
}

#[test]
fn test_patched_lexer_preserves_order() {
    let mut kit = ansi_dialect_kit().unwrap().copy_as("patched");
    let before: Vec<String> = kit_matcher_names(&kit);
    kit.patch_lexer(vec![silt::lexer::Matcher::regex(
        "word",
        r"[0-9a-zA-Z_$]+",
        "word",
        silt::segments::LeafKind::Code,
    )]);
    let after: Vec<String> = kit_matcher_names(&kit);
    assert_eq!(before, after);
}

fn kit_matcher_names(kit: &silt::dialects::DialectKit) -> Vec<String> {
    // Expansion exposes the matcher list; names are stable through it.
    kit.clone()
        .expand()
        .unwrap()
        .lexer_matchers()
        .iter()
        .map(|m| m.name().to_string())
        .collect()
}
