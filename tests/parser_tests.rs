//! End-to-end parsing tests against the ANSI dialect.

use silt::config::LintConfig;
use silt::linter::Linter;

fn parse(sql: &str) -> silt::linter::ParsedString {
    let linter = Linter::new(LintConfig::default()).unwrap();
    linter.parse_string(sql)
}

/// The raw concatenation of the tree must reproduce the input exactly.
fn assert_lossless(sql: &str) {
    let parsed = parse(sql);
    assert_eq!(
        parsed.tree.raw(),
        sql,
        "tree does not reproduce input:\n{}",
        parsed.tree.stringify()
    );
}

#[test]
fn test_parse_simple_select() {
    let parsed = parse("SELECT a, b FROM foo\n");
    assert!(parsed.violations.is_empty(), "{:?}", parsed.violations);
    assert_eq!(parsed.tree.seg_type(), "file");
    let selects = parsed.tree.recursive_crawl(&["select_statement"], false);
    assert_eq!(selects.len(), 1);
    let clauses = parsed.tree.recursive_crawl(&["select_clause"], false);
    assert_eq!(clauses.len(), 1);
    let froms = parsed.tree.recursive_crawl(&["from_clause"], false);
    assert_eq!(froms.len(), 1);
}

#[test]
fn test_parse_is_lossless() {
    for sql in [
        "SELECT a, b FROM foo\n",
        "SELECT DISTINCT x.y AS z FROM t1 LEFT JOIN t2 ON t1.id = t2.id\n",
        "SELECT 1;\nSELECT 2;\n",
        "WITH a AS (SELECT 1) SELECT * FROM a\n",
        "SELECT count(*) FROM t WHERE x > 1 GROUP BY y HAVING count(*) > 2 ORDER BY z DESC\n",
        "-- just a comment\nSELECT 1\n",
        "SELECT CASE WHEN a > 1 THEN 'big' ELSE 'small' END FROM t\n",
        "INSERT INTO t (a, b) VALUES (1, 'x')\n",
        "UPDATE t SET a = 1 WHERE b = 2\n",
        "DELETE FROM t WHERE a IS NULL\n",
    ] {
        assert_lossless(sql);
    }
}

#[test]
fn test_parse_expression_structure() {
    let parsed = parse("SELECT a + 1 FROM t WHERE b >= 2 AND c IS NOT NULL\n");
    assert!(parsed.violations.is_empty(), "{:?}", parsed.violations);
    let expressions = parsed.tree.recursive_crawl(&["expression"], false);
    assert!(!expressions.is_empty());
    let wheres = parsed.tree.recursive_crawl(&["where_clause"], false);
    assert_eq!(wheres.len(), 1);
}

#[test]
fn test_parse_subquery_and_cast() {
    let parsed = parse("SELECT a::int FROM (SELECT a FROM t) AS sub\n");
    assert!(parsed.violations.is_empty(), "{:?}", parsed.violations);
    let data_types = parsed.tree.recursive_crawl(&["data_type"], false);
    assert_eq!(data_types.len(), 1);
    // The inner select is nested under the outer from clause.
    let selects = parsed.tree.recursive_crawl(&["select_statement"], true);
    assert_eq!(selects.len(), 2);
}

#[test]
fn test_parse_set_expression() {
    let parsed = parse("SELECT a FROM t1 UNION ALL SELECT a FROM t2\n");
    assert!(parsed.violations.is_empty(), "{:?}", parsed.violations);
    let sets = parsed.tree.recursive_crawl(&["set_expression"], false);
    assert_eq!(sets.len(), 1);
    let ops = parsed.tree.recursive_crawl(&["set_operator"], true);
    assert_eq!(ops.len(), 1);
}

#[test]
fn test_parse_with_compound() {
    let parsed = parse("WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM a\n");
    assert!(parsed.violations.is_empty(), "{:?}", parsed.violations);
    let ctes = parsed
        .tree
        .recursive_crawl(&["common_table_expression"], false);
    assert_eq!(ctes.len(), 2);
}

#[test]
fn test_unparsable_section_reported_and_lossless() {
    let sql = "SELECT a FROM t; GIBBERISH %% HERE\n";
    let parsed = parse(sql);
    assert_eq!(parsed.tree.raw(), sql);
    assert!(
        parsed.violations.iter().any(|v| v.code == "PRS"),
        "{:?}",
        parsed.violations
    );
    let unparsable = parsed.tree.recursive_crawl(&["unparsable"], false);
    assert!(!unparsable.is_empty());
}

#[test]
fn test_unparsable_does_not_lose_good_statement() {
    let parsed = parse("SELECT a FROM t; GIBBERISH\n");
    let selects = parsed.tree.recursive_crawl(&["select_statement"], false);
    assert_eq!(selects.len(), 1);
}

#[test]
fn test_empty_and_comment_only_files() {
    let parsed = parse("");
    assert!(parsed.violations.is_empty());
    assert_eq!(parsed.tree.seg_type(), "file");

    let parsed = parse("-- nothing here\n");
    assert!(parsed.violations.is_empty(), "{:?}", parsed.violations);
    assert_eq!(parsed.tree.raw(), "-- nothing here\n");
}

#[test]
fn test_statement_terminators() {
    let parsed = parse("SELECT 1;\nSELECT 2\n");
    assert!(parsed.violations.is_empty(), "{:?}", parsed.violations);
    let statements = parsed.tree.recursive_crawl(&["statement"], false);
    assert_eq!(statements.len(), 2);
}

#[test]
fn test_markers_are_coherent() {
    let sql = "SELECT a, b FROM foo\n";
    let parsed = parse(sql);
    for leaf in parsed.tree.raw_segments() {
        let marker = leaf.marker().expect("parsed leaves carry markers");
        assert_eq!(
            &sql[marker.templated_slice.clone()],
            leaf.raw(),
            "marker mismatch for {leaf:?}"
        );
    }
}

#[test]
fn test_keywords_are_recast() {
    let parsed = parse("SELECT a FROM foo\n");
    let keywords = parsed.tree.recursive_crawl(&["keyword"], true);
    let raws: Vec<&str> = keywords.iter().map(|k| k.raw()).collect();
    assert!(raws.contains(&"SELECT"));
    assert!(raws.contains(&"FROM"));
}

#[test]
fn test_indent_metas_emitted() {
    let parsed = parse("SELECT a FROM foo\n");
    let indents = parsed.tree.recursive_crawl(&["indent"], true);
    let dedents = parsed.tree.recursive_crawl(&["dedent"], true);
    assert!(!indents.is_empty());
    assert_eq!(indents.len(), dedents.len());
}
