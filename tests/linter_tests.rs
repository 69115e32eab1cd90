//! End-to-end linting and fixing tests.

use silt::config::{ConfigValue, LintConfig};
use silt::linter::{LintedFile, Linter};
use silt::templater::{RawFileSlice, SliceType, TemplatedFile, TemplatedFileSlice};

fn linter() -> Linter {
    Linter::new(LintConfig::default()).unwrap()
}

fn lint(sql: &str) -> LintedFile {
    linter().lint_string(sql, false)
}

fn fix(sql: &str) -> LintedFile {
    linter().lint_string(sql, true)
}

fn codes(file: &LintedFile) -> Vec<&str> {
    file.violations.iter().map(|v| v.code.as_str()).collect()
}

#[test]
fn test_clean_file_is_clean() {
    let result = lint("SELECT a, b FROM foo\n");
    assert!(result.violations.is_empty(), "{:?}", result.violations);
    assert_eq!(result.fixed_source, "SELECT a, b FROM foo\n");
}

#[test]
fn test_whitespace_before_comma() {
    // One spacing violation, anchored at the space before the comma.
    let result = lint("SELECT a , b FROM foo\n");
    assert_eq!(codes(&result), vec!["LT01"]);
    let violation = &result.violations[0];
    assert_eq!(violation.name, "layout.spacing");
    assert_eq!(violation.source_line, 1);
    assert_eq!(violation.source_col, 9);

    let fixed = fix("SELECT a , b FROM foo\n");
    assert_eq!(fixed.fixed_source, "SELECT a, b FROM foo\n");
    assert!(fixed.violations.iter().all(|v| v.fixes_applied));
}

#[test]
fn test_missing_trailing_newline() {
    let result = lint("SELECT 1");
    assert_eq!(codes(&result), vec!["LT12"]);

    let fixed = fix("SELECT 1");
    assert_eq!(fixed.fixed_source, "SELECT 1\n");
}

#[test]
fn test_too_many_trailing_newlines() {
    let fixed = fix("SELECT 1\n\n\n");
    assert_eq!(fixed.fixed_source, "SELECT 1\n");
}

#[test]
fn test_unused_cte() {
    let result = lint("WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM a\n");
    assert_eq!(codes(&result), vec!["ST03"]);
    assert!(result.violations[0].description.contains("\"b\""));
    // No auto-fix for structure issues.
    let fixed = fix("WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM a\n");
    assert_eq!(
        fixed.fixed_source,
        "WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM a\n"
    );
}

#[test]
fn test_all_ctes_used_is_clean() {
    let result = lint("WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM a, b\n");
    assert!(result.violations.is_empty(), "{:?}", result.violations);
}

/// S4: templated regions are never rewritten; literal whitespace next to
/// them still is.
#[test]
fn test_templated_region_untouched() {
    let source = "SELECT {{ col }}  ,  1 FROM t\n";
    let templated = "SELECT my_col  ,  1 FROM t\n";
    let tf = TemplatedFile::new(
        source.to_string(),
        "q.sql",
        Some(templated.to_string()),
        Some(vec![
            TemplatedFileSlice::new(SliceType::Literal, 0..7, 0..7),
            TemplatedFileSlice::new(SliceType::Templated, 7..16, 7..13),
            TemplatedFileSlice::new(SliceType::Literal, 16..30, 13..27),
        ]),
        Some(vec![
            RawFileSlice::new("SELECT ", SliceType::Literal, 0),
            RawFileSlice::new("{{ col }}", SliceType::Templated, 7),
            RawFileSlice::new("  ,  1 FROM t\n", SliceType::Literal, 16),
        ]),
    )
    .unwrap();

    let result = linter().lint_templated(tf, true);
    assert_eq!(result.fixed_source, "SELECT {{ col }}, 1 FROM t\n");
    assert!(
        result.violations.iter().any(|v| v.code == "LT01"),
        "{:?}",
        result.violations
    );
}

/// S5: keyword inheritance. `REGEXP` is reserved in ANSI but demoted to
/// an unreserved keyword in the MySQL derivation.
#[test]
fn test_keyword_dialect_inheritance() {
    let sql = "SELECT col_a AS REGEXP FROM tbl\n";

    let ansi_result = lint(sql);
    assert_eq!(codes(&ansi_result), vec!["RF04"]);
    assert_eq!(ansi_result.violations[0].name, "references.keywords");

    let mysql_linter =
        Linter::new(LintConfig::default().with_dialect("mysql")).unwrap();
    let mysql_result = mysql_linter.lint_string(sql, false);
    assert!(
        mysql_result.violations.is_empty(),
        "{:?}",
        mysql_result.violations
    );
}

/// S6: several interacting problems converge within three phases and a
/// second fix pass changes nothing.
#[test]
fn test_fix_loop_convergence() {
    let sql = "SELECT a , b  \nFROM foo";
    let fixed = fix(sql);
    assert_eq!(fixed.fixed_source, "SELECT a, b\nFROM foo\n");
    assert!(!codes(&fixed).contains(&"LNT"));

    // Idempotence: fixing the fixed output is a no-op.
    let refixed = fix(&fixed.fixed_source);
    assert_eq!(refixed.fixed_source, fixed.fixed_source);
    assert!(refixed.violations.is_empty(), "{:?}", refixed.violations);
}

#[test]
fn test_keyword_capitalisation_consistent() {
    // The first keyword sets the style.
    let result = lint("select a FROM foo\n");
    assert_eq!(codes(&result), vec!["CP01"]);

    let fixed = fix("select a FROM foo\n");
    assert_eq!(fixed.fixed_source, "select a from foo\n");
}

#[test]
fn test_keyword_capitalisation_policy_upper() {
    let config = LintConfig::default().with_rule_option(
        "CP01",
        "capitalisation_policy",
        ConfigValue::Str("upper".to_string()),
    );
    // Only keywords are recased; identifiers are untouched.
    let fixed = Linter::new(config).unwrap().lint_string("select a from foo\n", true);
    assert_eq!(fixed.fixed_source, "SELECT a FROM foo\n");
}

#[test]
fn test_indentation_fixed() {
    let fixed = fix("SELECT\n  a,\n  b\nFROM foo\n");
    assert_eq!(fixed.fixed_source, "SELECT\n    a,\n    b\nFROM foo\n");
}

#[test]
fn test_leading_comma_moved() {
    let fixed = fix("SELECT a\n    , b\nFROM foo\n");
    assert_eq!(fixed.fixed_source, "SELECT a,\n    b\nFROM foo\n");
}

#[test]
fn test_noqa_masks_line() {
    let result = lint("SELECT a , b FROM foo -- noqa: LT01\n");
    assert!(result.violations.is_empty(), "{:?}", result.violations);
    // And the fix is withheld too.
    let fixed = fix("SELECT a , b FROM foo -- noqa: LT01\n");
    assert_eq!(fixed.fixed_source, "SELECT a , b FROM foo -- noqa: LT01\n");
}

#[test]
fn test_noqa_disable_enable_range() {
    let sql = "SELECT a , b FROM t1\n-- noqa: disable=LT01\n;\nSELECT c , d FROM t2\n";
    let result = lint(sql);
    // The first statement is before the disable; the second is inside it.
    let lt01_lines: Vec<usize> = result
        .violations
        .iter()
        .filter(|v| v.code == "LT01")
        .map(|v| v.source_line)
        .collect();
    assert_eq!(lt01_lines, vec![1]);
}

#[test]
fn test_violations_are_ordered() {
    let result = lint("select a , b FROM foo");
    let mut sorted = result.violations.clone();
    sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    assert_eq!(result.violations, sorted);
}

#[test]
fn test_rule_selection() {
    let config = LintConfig::default().with_rules(&["LT12"]);
    let result = Linter::new(config)
        .unwrap()
        .lint_string("SELECT a , b FROM foo", false);
    assert_eq!(codes(&result), vec!["LT12"]);
}

#[test]
fn test_parallel_linting_matches_serial() {
    let inputs = ["SELECT a , b FROM foo\n", "SELECT 1", "SELECT x FROM y\n"];
    let linter = linter();
    let parallel = linter.lint_strings(&inputs, false);
    for (sql, result) in inputs.iter().zip(&parallel) {
        let serial = linter.lint_string(sql, false);
        assert_eq!(serial.violations, result.violations);
    }
}

#[test]
fn test_unknown_dialect_is_config_error() {
    assert!(Linter::new(LintConfig::default().with_dialect("klingon")).is_err());
}

#[test]
fn test_lexer_violation_surfaces() {
    let result = lint("SELECT £ FROM foo\n");
    assert!(
        result.violations.iter().any(|v| v.code == "LXR"),
        "{:?}",
        result.violations
    );
}
