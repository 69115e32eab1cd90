//! Keyword tables for the ANSI dialect.
//!
//! The split matters: *reserved* keywords may not be used as naked
//! identifiers without attracting `references.keywords`, while
//! *unreserved* keywords double as identifiers freely. Derived dialects
//! move entries between the sets.

/// Keywords reserved by the ANSI dialect.
pub const ANSI_RESERVED_KEYWORDS: &[&str] = &[
    "ALL",
    "AND",
    "ANY",
    "AS",
    "BETWEEN",
    "CASE",
    "CAST",
    "CHECK",
    "COLUMN",
    "CONSTRAINT",
    "CREATE",
    "CROSS",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "DEFAULT",
    "DELETE",
    "DISTINCT",
    "DROP",
    "ELSE",
    "END",
    "EXCEPT",
    "EXISTS",
    "FALSE",
    "FOREIGN",
    "FROM",
    "FULL",
    "GRANT",
    "GROUP",
    "HAVING",
    "IN",
    "INNER",
    "INSERT",
    "INTERSECT",
    "INTO",
    "IS",
    "JOIN",
    "LATERAL",
    "LEFT",
    "LIKE",
    "LIMIT",
    "NATURAL",
    "NOT",
    "NULL",
    "ON",
    "OR",
    "ORDER",
    "OUTER",
    "PRIMARY",
    "REFERENCES",
    "REGEXP",
    "RIGHT",
    "SELECT",
    "SESSION_USER",
    "SET",
    "SOME",
    "TABLE",
    "THEN",
    "TRUE",
    "UNION",
    "UNIQUE",
    "UPDATE",
    "USING",
    "VALUES",
    "WHEN",
    "WHERE",
    "WITH",
];

/// Keywords known to the ANSI dialect but usable as identifiers.
pub const ANSI_UNRESERVED_KEYWORDS: &[&str] = &[
    "ACTION",
    "ASC",
    "BEGIN",
    "BY",
    "CASCADE",
    "COMMENT",
    "COMMIT",
    "COMMITTED",
    "COUNT",
    "CUBE",
    "CURRENT",
    "DATA",
    "DATE",
    "DAY",
    "DESC",
    "DESCRIBE",
    "DISABLE",
    "ENABLE",
    "EXPLAIN",
    "FILTER",
    "FIRST",
    "FOLLOWING",
    "HOUR",
    "IGNORE",
    "INTERVAL",
    "ISOLATION",
    "KEY",
    "LAST",
    "LEVEL",
    "MINUTE",
    "MONTH",
    "NEXT",
    "NO",
    "NULLS",
    "OF",
    "OFFSET",
    "ONLY",
    "OVER",
    "PARTITION",
    "PRECEDING",
    "RANGE",
    "READ",
    "RECURSIVE",
    "RENAME",
    "REPEATABLE",
    "REPLACE",
    "RESTRICT",
    "ROLLBACK",
    "ROLLUP",
    "ROW",
    "ROWS",
    "SECOND",
    "SERIALIZABLE",
    "SHOW",
    "START",
    "TEMPORARY",
    "TIME",
    "TIMESTAMP",
    "TRANSACTION",
    "TRUNCATE",
    "TYPE",
    "UNBOUNDED",
    "UNCOMMITTED",
    "VIEW",
    "WORK",
    "YEAR",
    "ZONE",
];

/// The structural keywords excluded from naked identifiers by the
/// identifier anti-pattern. A subset of the reserved set: reserved
/// keywords outside this list (e.g. `REGEXP`) still *parse* as
/// identifiers, so `references.keywords` can report them instead of the
/// parser rejecting the statement outright.
pub const ANSI_IDENTIFIER_ANTI_KEYWORDS: &[&str] = &[
    "ALL",
    "AND",
    "AS",
    "BETWEEN",
    "BY",
    "CASE",
    "CROSS",
    "DELETE",
    "DISTINCT",
    "ELSE",
    "END",
    "EXCEPT",
    "FROM",
    "FULL",
    "GROUP",
    "HAVING",
    "IN",
    "INNER",
    "INSERT",
    "INTERSECT",
    "INTO",
    "IS",
    "JOIN",
    "LEFT",
    "LIKE",
    "LIMIT",
    "NOT",
    "NULL",
    "ON",
    "OR",
    "ORDER",
    "OUTER",
    "RIGHT",
    "SELECT",
    "SET",
    "THEN",
    "UNION",
    "UPDATE",
    "USING",
    "VALUES",
    "WHEN",
    "WHERE",
    "WITH",
];
