//! The ANSI dialect: the base every other dialect derives from.
//!
//! Grammar names follow the `...Segment` / `...Grammar` convention used
//! throughout the registry: `Segment` entries wrap their match in a
//! branch node, `Grammar` entries are plain reusable grammars.

use crate::dialects::ansi_keywords::{
    ANSI_IDENTIFIER_ANTI_KEYWORDS, ANSI_RESERVED_KEYWORDS, ANSI_UNRESERVED_KEYWORDS,
};
use crate::dialects::{DialectKit, RegistryEntry, SegmentDefKit};
use crate::errors::CoreError;
use crate::grammar::{
    GrammarDef, any_of, bracketed, delimited, kw, meta, one_of, r, regex_parser, seq,
    string_parser, typed_parser,
};
use crate::lexer::Matcher;
use crate::segments::{LeafKind, MetaKind};
use smol_str::SmolStr;

/// The ANSI lexer matcher list, in matching order.
pub fn ansi_lexer_matchers() -> Vec<Matcher> {
    vec![
        Matcher::regex(
            "whitespace",
            r"[^\S\r\n]+",
            "whitespace",
            LeafKind::Whitespace,
        ),
        Matcher::regex(
            "inline_comment",
            r"(--|#)[^\n]*",
            "inline_comment",
            LeafKind::Comment,
        ),
        Matcher::regex(
            "block_comment",
            r"/\*([^*]|\*+[^*/])*\*+/",
            "block_comment",
            LeafKind::Comment,
        )
        .with_subdivider(Matcher::regex(
            "newline",
            r"\r\n|\n",
            "newline",
            LeafKind::Newline,
        ))
        .with_trim_post_subdivide(Matcher::regex(
            "whitespace",
            r"[^\S\r\n]+",
            "whitespace",
            LeafKind::Whitespace,
        )),
        Matcher::regex(
            "single_quote",
            r"'([^'\\]|\\.|'')*'",
            "single_quote",
            LeafKind::Code,
        )
        .with_trim_chars(&['\'']),
        Matcher::regex(
            "double_quote",
            r#""([^"\\]|\\.)*""#,
            "double_quote",
            LeafKind::Code,
        )
        .with_trim_chars(&['"']),
        Matcher::regex("back_quote", r"`[^`]*`", "back_quote", LeafKind::Code)
            .with_trim_chars(&['`']),
        Matcher::regex(
            "numeric_literal",
            r"\d+\.\d*([eE][+-]?\d+)?|\.\d+([eE][+-]?\d+)?|\d+([eE][+-]?\d+)?",
            "numeric_literal",
            LeafKind::Code,
        ),
        Matcher::regex("newline", r"\r\n|\n", "newline", LeafKind::Newline),
        Matcher::literal("casting_operator", "::", "casting_operator", LeafKind::Code),
        Matcher::regex("not_equal", r"!=|<>", "not_equal", LeafKind::Code),
        Matcher::literal(
            "greater_equal",
            ">=",
            "greater_equal",
            LeafKind::Code,
        ),
        Matcher::literal("less_equal", "<=", "less_equal", LeafKind::Code),
        Matcher::literal("concat_operator", "||", "concat_operator", LeafKind::Code),
        Matcher::literal("equals", "=", "equals", LeafKind::Code),
        Matcher::literal("greater", ">", "greater", LeafKind::Code),
        Matcher::literal("less", "<", "less", LeafKind::Code),
        Matcher::literal("plus", "+", "plus", LeafKind::Code),
        Matcher::literal("minus", "-", "minus", LeafKind::Code),
        Matcher::literal("divide", "/", "divide", LeafKind::Code),
        Matcher::literal("percent", "%", "percent", LeafKind::Code),
        Matcher::literal("star", "*", "star", LeafKind::Code),
        Matcher::literal("comma", ",", "comma", LeafKind::Code),
        Matcher::literal("dot", ".", "dot", LeafKind::Code),
        Matcher::literal("semicolon", ";", "semicolon", LeafKind::Code),
        Matcher::literal("colon", ":", "colon", LeafKind::Code),
        Matcher::literal("start_bracket", "(", "start_bracket", LeafKind::Code),
        Matcher::literal("end_bracket", ")", "end_bracket", LeafKind::Code),
        Matcher::literal(
            "start_square_bracket",
            "[",
            "start_square_bracket",
            LeafKind::Code,
        ),
        Matcher::literal(
            "end_square_bracket",
            "]",
            "end_square_bracket",
            LeafKind::Code,
        ),
        Matcher::literal(
            "start_curly_bracket",
            "{",
            "start_curly_bracket",
            LeafKind::Code,
        ),
        Matcher::literal(
            "end_curly_bracket",
            "}",
            "end_curly_bracket",
            LeafKind::Code,
        ),
        Matcher::regex("word", r"[0-9a-zA-Z_]+", "word", LeafKind::Code),
    ]
}

fn identifier_anti_pattern() -> String {
    ANSI_IDENTIFIER_ANTI_KEYWORDS.join("|")
}

/// Build the unexpanded ANSI dialect.
pub fn ansi_dialect_kit() -> Result<DialectKit, CoreError> {
    let mut d = DialectKit::new("ansi");
    d.add_keywords(true, ANSI_RESERVED_KEYWORDS);
    d.add_keywords(false, ANSI_UNRESERVED_KEYWORDS);
    d.set_lexer_matchers(ansi_lexer_matchers());
    d.add_bracket_pair("round", "StartBracketSegment", "EndBracketSegment", true);
    d.add_bracket_pair(
        "square",
        "StartSquareBracketSegment",
        "EndSquareBracketSegment",
        false,
    );
    d.add_bracket_pair(
        "curly",
        "StartCurlyBracketSegment",
        "EndCurlyBracketSegment",
        false,
    );

    // ------------------------------------------------------------------
    // Symbols and atoms
    // ------------------------------------------------------------------
    d.grammar("CommaSegment", typed_parser("comma", None))?;
    d.grammar("DotSegment", typed_parser("dot", None))?;
    d.grammar(
        "SemicolonSegment",
        typed_parser("semicolon", Some("statement_terminator")),
    )?;
    d.grammar("StarSegment", typed_parser("star", None))?;
    d.grammar("StartBracketSegment", typed_parser("start_bracket", None))?;
    d.grammar("EndBracketSegment", typed_parser("end_bracket", None))?;
    d.grammar(
        "StartSquareBracketSegment",
        typed_parser("start_square_bracket", None),
    )?;
    d.grammar(
        "EndSquareBracketSegment",
        typed_parser("end_square_bracket", None),
    )?;
    d.grammar(
        "StartCurlyBracketSegment",
        typed_parser("start_curly_bracket", None),
    )?;
    d.grammar(
        "EndCurlyBracketSegment",
        typed_parser("end_curly_bracket", None),
    )?;
    d.grammar(
        "CastingOperatorSegment",
        typed_parser("casting_operator", None),
    )?;
    d.grammar("EqualsSegment", {
        let mut def = typed_parser("equals", Some("comparison_operator"));
        if let GrammarDef::TypedParser {
            extra_class_types, ..
        } = &mut def
        {
            extra_class_types.push(SmolStr::new("binary_operator"));
        }
        def
    })?;

    // ------------------------------------------------------------------
    // Identifiers and literals
    // ------------------------------------------------------------------
    d.grammar("NakedIdentifierSegment", {
        let mut def = regex_parser(r"[A-Z0-9_]*[A-Z][A-Z0-9_]*", "naked_identifier");
        if let GrammarDef::RegexParser {
            anti_pattern,
            extra_class_types,
            ..
        } = &mut def
        {
            *anti_pattern = Some(SmolStr::new(identifier_anti_pattern()));
            extra_class_types.push(SmolStr::new("identifier"));
        }
        def
    })?;
    d.grammar("QuotedIdentifierSegment", {
        let mut def = typed_parser("double_quote", Some("quoted_identifier"));
        if let GrammarDef::TypedParser {
            extra_class_types, ..
        } = &mut def
        {
            extra_class_types.push(SmolStr::new("identifier"));
        }
        def
    })?;
    d.grammar(
        "SingleIdentifierGrammar",
        one_of(vec![
            r("NakedIdentifierSegment"),
            r("QuotedIdentifierSegment"),
        ]),
    )?;
    d.grammar("QuotedLiteralSegment", {
        let mut def = typed_parser("single_quote", Some("quoted_literal"));
        if let GrammarDef::TypedParser {
            extra_class_types, ..
        } = &mut def
        {
            extra_class_types.push(SmolStr::new("literal"));
        }
        def
    })?;
    d.grammar("NumericLiteralSegment", {
        let mut def = typed_parser("numeric_literal", Some("numeric_literal"));
        if let GrammarDef::TypedParser {
            extra_class_types, ..
        } = &mut def
        {
            extra_class_types.push(SmolStr::new("literal"));
        }
        def
    })?;
    d.grammar("BooleanLiteralGrammar", {
        GrammarDef::MultiStringParser {
            templates: vec![SmolStr::new("TRUE"), SmolStr::new("FALSE")],
            seg_type: SmolStr::new("boolean_literal"),
            extra_class_types: vec![SmolStr::new("literal"), SmolStr::new("keyword")],
        }
    })?;
    d.grammar("NullLiteralSegment", {
        let mut def = string_parser("NULL", "null_literal");
        if let GrammarDef::StringParser {
            extra_class_types, ..
        } = &mut def
        {
            extra_class_types.push(SmolStr::new("literal"));
            extra_class_types.push(SmolStr::new("keyword"));
        }
        def
    })?;
    d.grammar(
        "LiteralGrammar",
        one_of(vec![
            r("QuotedLiteralSegment"),
            r("NumericLiteralSegment"),
            r("BooleanLiteralGrammar"),
            r("NullLiteralSegment"),
        ]),
    )?;

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------
    d.grammar(
        "ArithmeticBinaryOperatorGrammar",
        one_of(vec![
            typed_parser("plus", Some("binary_operator")),
            typed_parser("minus", Some("binary_operator")),
            typed_parser("star", Some("binary_operator")),
            typed_parser("divide", Some("binary_operator")),
            typed_parser("percent", Some("binary_operator")),
        ]),
    )?;
    d.grammar(
        "StringBinaryOperatorGrammar",
        one_of(vec![typed_parser("concat_operator", Some("binary_operator"))]),
    )?;
    d.grammar(
        "ComparisonOperatorGrammar",
        one_of(vec![
            r("EqualsSegment"),
            typed_parser("not_equal", Some("comparison_operator")),
            typed_parser("greater_equal", Some("comparison_operator")),
            typed_parser("less_equal", Some("comparison_operator")),
            typed_parser("greater", Some("comparison_operator")),
            typed_parser("less", Some("comparison_operator")),
        ]),
    )?;
    d.grammar(
        "BooleanBinaryOperatorGrammar",
        one_of(vec![kw("AND"), kw("OR")]),
    )?;
    d.grammar(
        "BinaryOperatorGrammar",
        one_of(vec![
            r("ArithmeticBinaryOperatorGrammar"),
            r("StringBinaryOperatorGrammar"),
            r("ComparisonOperatorGrammar"),
            r("BooleanBinaryOperatorGrammar"),
        ]),
    )?;
    d.grammar(
        "SignOperatorGrammar",
        one_of(vec![
            typed_parser("plus", Some("sign_operator")),
            typed_parser("minus", Some("sign_operator")),
        ]),
    )?;

    // ------------------------------------------------------------------
    // References, functions, data types
    // ------------------------------------------------------------------
    d.segment(
        "ColumnReferenceSegment",
        SegmentDefKit::new(
            "column_reference",
            delimited(r("SingleIdentifierGrammar"), r("DotSegment")).no_gaps(),
        )
        .with_parent_types(&["object_reference"]),
        false,
    )?;
    d.segment(
        "TableReferenceSegment",
        SegmentDefKit::new(
            "table_reference",
            delimited(r("SingleIdentifierGrammar"), r("DotSegment")).no_gaps(),
        )
        .with_parent_types(&["object_reference"]),
        false,
    )?;
    d.segment(
        "FunctionNameSegment",
        SegmentDefKit::new(
            "function_name",
            delimited(r("SingleIdentifierGrammar"), r("DotSegment")).no_gaps(),
        ),
        false,
    )?;
    d.segment(
        "FunctionSegment",
        SegmentDefKit::new(
            "function",
            seq(vec![
                r("FunctionNameSegment"),
                bracketed(
                    one_of(vec![
                        r("StarSegment"),
                        delimited(r("ExpressionSegment"), r("CommaSegment")),
                    ])
                    .optional(),
                ),
            ]),
        ),
        false,
    )?;
    d.segment(
        "DatatypeSegment",
        SegmentDefKit::new(
            "data_type",
            seq(vec![
                regex_parser(r"[A-Z][A-Z0-9_]*", "data_type_identifier"),
                bracketed(delimited(r("NumericLiteralSegment"), r("CommaSegment"))).optional(),
            ]),
        ),
        false,
    )?;

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------
    d.segment(
        "ExpressionSegment",
        SegmentDefKit::new("expression", r("Expression_A_Grammar")),
        false,
    )?;
    d.grammar(
        "Expression_A_Grammar",
        seq(vec![
            r("Expression_C_Grammar"),
            any_of(vec![
                seq(vec![r("BinaryOperatorGrammar"), r("Expression_C_Grammar")]),
                seq(vec![
                    kw("IS"),
                    kw("NOT").optional(),
                    one_of(vec![r("BooleanLiteralGrammar"), r("NullLiteralSegment")]),
                ]),
                seq(vec![
                    kw("NOT").optional(),
                    kw("IN"),
                    bracketed(one_of(vec![
                        r("SelectableGrammar"),
                        delimited(r("Expression_A_Grammar"), r("CommaSegment")),
                    ])),
                ]),
                seq(vec![
                    kw("NOT").optional(),
                    kw("LIKE"),
                    r("Expression_C_Grammar"),
                ]),
                seq(vec![
                    kw("NOT").optional(),
                    kw("BETWEEN"),
                    r("Expression_C_Grammar"),
                    kw("AND"),
                    r("Expression_C_Grammar"),
                ]),
            ]),
        ]),
    )?;
    d.grammar(
        "Expression_C_Grammar",
        seq(vec![
            r("Expression_D_Grammar"),
            any_of(vec![seq(vec![
                r("CastingOperatorSegment"),
                r("DatatypeSegment"),
            ])]),
        ]),
    )?;
    d.grammar(
        "Expression_D_Grammar",
        one_of(vec![
            seq(vec![kw("NOT"), r("Expression_C_Grammar")]),
            seq(vec![r("SignOperatorGrammar"), r("Expression_C_Grammar")]),
            r("CaseExpressionSegment"),
            r("FunctionSegment"),
            r("LiteralGrammar"),
            r("ColumnReferenceSegment"),
            bracketed(one_of(vec![
                r("SelectableGrammar"),
                r("Expression_A_Grammar"),
            ])),
        ]),
    )?;
    d.segment(
        "CaseExpressionSegment",
        SegmentDefKit::new(
            "case_expression",
            seq(vec![
                kw("CASE"),
                r("Expression_A_Grammar").optional(),
                meta(MetaKind::Indent),
                any_of(vec![r("WhenClauseSegment")]).min_times(1),
                r("ElseClauseSegment").optional(),
                meta(MetaKind::Dedent),
                kw("END"),
            ]),
        )
        .with_parent_types(&["expression"]),
        false,
    )?;
    d.segment(
        "WhenClauseSegment",
        SegmentDefKit::new(
            "when_clause",
            seq(vec![
                kw("WHEN"),
                r("Expression_A_Grammar"),
                kw("THEN"),
                r("Expression_A_Grammar"),
            ]),
        ),
        false,
    )?;
    d.segment(
        "ElseClauseSegment",
        SegmentDefKit::new(
            "else_clause",
            seq(vec![kw("ELSE"), r("Expression_A_Grammar")]),
        ),
        false,
    )?;

    // ------------------------------------------------------------------
    // Select structure
    // ------------------------------------------------------------------
    d.segment(
        "WildcardIdentifierSegment",
        SegmentDefKit::new(
            "wildcard_identifier",
            one_of(vec![
                r("StarSegment"),
                seq(vec![
                    r("SingleIdentifierGrammar"),
                    r("DotSegment"),
                    r("StarSegment"),
                ])
                .no_gaps(),
            ]),
        )
        .with_parent_types(&["object_reference"]),
        false,
    )?;
    d.segment(
        "WildcardExpressionSegment",
        SegmentDefKit::new("wildcard_expression", seq(vec![r("WildcardIdentifierSegment")])),
        false,
    )?;
    d.segment(
        "AliasExpressionSegment",
        SegmentDefKit::new(
            "alias_expression",
            seq(vec![kw("AS").optional(), r("SingleIdentifierGrammar")]),
        ),
        false,
    )?;
    d.segment(
        "SelectClauseElementSegment",
        SegmentDefKit::new(
            "select_clause_element",
            one_of(vec![
                r("WildcardExpressionSegment"),
                seq(vec![
                    r("ExpressionSegment"),
                    r("AliasExpressionSegment").optional(),
                ]),
            ]),
        ),
        false,
    )?;
    d.segment(
        "SelectClauseSegment",
        SegmentDefKit::new(
            "select_clause",
            seq(vec![
                kw("SELECT"),
                meta(MetaKind::Indent),
                one_of(vec![kw("DISTINCT"), kw("ALL")]).optional(),
                delimited(r("SelectClauseElementSegment"), r("CommaSegment")).allow_trailing(),
                meta(MetaKind::Dedent),
            ]),
        )
        .with_parent_types(&["clause"]),
        false,
    )?;
    d.segment(
        "FromClauseSegment",
        SegmentDefKit::new(
            "from_clause",
            seq(vec![
                kw("FROM"),
                delimited(r("FromExpressionSegment"), r("CommaSegment")),
            ]),
        )
        .with_parent_types(&["clause"]),
        false,
    )?;
    d.segment(
        "FromExpressionSegment",
        SegmentDefKit::new(
            "from_expression",
            seq(vec![
                r("FromExpressionElementSegment"),
                any_of(vec![r("JoinClauseSegment")]),
            ]),
        ),
        false,
    )?;
    d.segment(
        "FromExpressionElementSegment",
        SegmentDefKit::new(
            "from_expression_element",
            seq(vec![
                r("TableExpressionSegment"),
                r("AliasExpressionSegment").optional(),
            ]),
        ),
        false,
    )?;
    d.segment(
        "TableExpressionSegment",
        SegmentDefKit::new(
            "table_expression",
            one_of(vec![
                bracketed(r("SelectableGrammar")),
                r("FunctionSegment"),
                r("TableReferenceSegment"),
            ]),
        ),
        false,
    )?;
    d.segment(
        "JoinClauseSegment",
        SegmentDefKit::new(
            "join_clause",
            seq(vec![
                one_of(vec![
                    kw("INNER"),
                    seq(vec![
                        one_of(vec![kw("LEFT"), kw("RIGHT"), kw("FULL")]),
                        kw("OUTER").optional(),
                    ]),
                    kw("CROSS"),
                ])
                .optional(),
                kw("JOIN"),
                meta(MetaKind::Indent),
                r("FromExpressionElementSegment"),
                one_of(vec![
                    r("JoinOnConditionSegment"),
                    seq(vec![
                        kw("USING"),
                        bracketed(delimited(r("SingleIdentifierGrammar"), r("CommaSegment"))),
                    ]),
                ])
                .optional(),
                meta(MetaKind::Dedent),
            ]),
        )
        .with_parent_types(&["clause"]),
        false,
    )?;
    d.segment(
        "JoinOnConditionSegment",
        SegmentDefKit::new(
            "join_on_condition",
            seq(vec![kw("ON"), r("ExpressionSegment")]),
        ),
        false,
    )?;
    d.segment(
        "WhereClauseSegment",
        SegmentDefKit::new(
            "where_clause",
            seq(vec![
                kw("WHERE"),
                meta(MetaKind::Indent),
                r("ExpressionSegment"),
                meta(MetaKind::Dedent),
            ]),
        )
        .with_parent_types(&["clause"]),
        false,
    )?;
    d.segment(
        "GroupByClauseSegment",
        SegmentDefKit::new(
            "groupby_clause",
            seq(vec![
                kw("GROUP"),
                kw("BY"),
                meta(MetaKind::Indent),
                delimited(
                    one_of(vec![
                        r("ColumnReferenceSegment"),
                        r("NumericLiteralSegment"),
                        r("ExpressionSegment"),
                    ]),
                    r("CommaSegment"),
                ),
                meta(MetaKind::Dedent),
            ]),
        )
        .with_parent_types(&["clause"]),
        false,
    )?;
    d.segment(
        "HavingClauseSegment",
        SegmentDefKit::new(
            "having_clause",
            seq(vec![
                kw("HAVING"),
                meta(MetaKind::Indent),
                r("ExpressionSegment"),
                meta(MetaKind::Dedent),
            ]),
        )
        .with_parent_types(&["clause"]),
        false,
    )?;
    d.segment(
        "OrderByClauseSegment",
        SegmentDefKit::new(
            "orderby_clause",
            seq(vec![
                kw("ORDER"),
                kw("BY"),
                meta(MetaKind::Indent),
                delimited(
                    seq(vec![
                        one_of(vec![
                            r("ColumnReferenceSegment"),
                            r("NumericLiteralSegment"),
                            r("ExpressionSegment"),
                        ]),
                        one_of(vec![kw("ASC"), kw("DESC")]).optional(),
                        seq(vec![kw("NULLS"), one_of(vec![kw("FIRST"), kw("LAST")])])
                            .optional(),
                    ]),
                    r("CommaSegment"),
                ),
                meta(MetaKind::Dedent),
            ]),
        )
        .with_parent_types(&["clause"]),
        false,
    )?;
    d.segment(
        "LimitClauseSegment",
        SegmentDefKit::new(
            "limit_clause",
            seq(vec![
                kw("LIMIT"),
                one_of(vec![r("NumericLiteralSegment"), kw("ALL")]),
                seq(vec![
                    one_of(vec![kw("OFFSET"), r("CommaSegment")]),
                    r("NumericLiteralSegment"),
                ])
                .optional(),
            ]),
        )
        .with_parent_types(&["clause"]),
        false,
    )?;
    d.segment(
        "ValuesClauseSegment",
        SegmentDefKit::new(
            "values_clause",
            seq(vec![
                kw("VALUES"),
                delimited(
                    bracketed(delimited(
                        one_of(vec![r("ExpressionSegment"), kw("DEFAULT")]),
                        r("CommaSegment"),
                    )),
                    r("CommaSegment"),
                ),
            ]),
        ),
        false,
    )?;

    // ------------------------------------------------------------------
    // Selectables and set operations
    // ------------------------------------------------------------------
    d.segment(
        "SelectStatementSegment",
        SegmentDefKit::new(
            "select_statement",
            GrammarDef::StartsWith {
                head: Box::new(kw("SELECT")),
                terminators: vec![r("SetOperatorSegment"), r("SemicolonSegment")],
            },
        )
        .with_parse_grammar(seq(vec![
            r("SelectClauseSegment"),
            r("FromClauseSegment").optional(),
            r("WhereClauseSegment").optional(),
            r("GroupByClauseSegment").optional(),
            r("HavingClauseSegment").optional(),
            r("OrderByClauseSegment").optional(),
            r("LimitClauseSegment").optional(),
        ])),
        false,
    )?;
    d.segment(
        "SetOperatorSegment",
        SegmentDefKit::new(
            "set_operator",
            one_of(vec![
                seq(vec![
                    kw("UNION"),
                    one_of(vec![kw("DISTINCT"), kw("ALL")]).optional(),
                ]),
                kw("INTERSECT"),
                kw("EXCEPT"),
            ]),
        ),
        false,
    )?;
    d.segment(
        "SetExpressionSegment",
        SegmentDefKit::new(
            "set_expression",
            seq(vec![
                r("NonSetSelectableGrammar"),
                any_of(vec![seq(vec![
                    r("SetOperatorSegment"),
                    r("NonSetSelectableGrammar"),
                ])])
                .min_times(1),
            ]),
        ),
        false,
    )?;
    d.grammar(
        "NonSetSelectableGrammar",
        one_of(vec![
            r("SelectStatementSegment"),
            r("ValuesClauseSegment"),
            bracketed(r("SelectableGrammar")),
        ]),
    )?;
    d.grammar(
        "NonWithSelectableGrammar",
        one_of(vec![r("SetExpressionSegment"), r("NonSetSelectableGrammar")]),
    )?;
    d.grammar(
        "SelectableGrammar",
        one_of(vec![
            r("WithCompoundStatementSegment"),
            r("NonWithSelectableGrammar"),
        ]),
    )?;
    d.segment(
        "CommonTableExpressionSegment",
        SegmentDefKit::new(
            "common_table_expression",
            seq(vec![
                r("SingleIdentifierGrammar"),
                bracketed(delimited(r("SingleIdentifierGrammar"), r("CommaSegment")))
                    .optional(),
                kw("AS"),
                bracketed(r("SelectableGrammar")),
            ]),
        ),
        false,
    )?;
    d.segment(
        "WithCompoundStatementSegment",
        SegmentDefKit::new(
            "with_compound_statement",
            seq(vec![
                kw("WITH"),
                kw("RECURSIVE").optional(),
                delimited(r("CommonTableExpressionSegment"), r("CommaSegment")),
                r("NonWithSelectableGrammar"),
            ]),
        ),
        false,
    )?;

    // ------------------------------------------------------------------
    // Other statements
    // ------------------------------------------------------------------
    d.segment(
        "InsertStatementSegment",
        SegmentDefKit::new(
            "insert_statement",
            seq(vec![
                kw("INSERT"),
                kw("INTO"),
                r("TableReferenceSegment"),
                bracketed(delimited(r("ColumnReferenceSegment"), r("CommaSegment")))
                    .optional(),
                r("SelectableGrammar"),
            ]),
        ),
        false,
    )?;
    d.segment(
        "SetClauseSegment",
        SegmentDefKit::new(
            "set_clause",
            seq(vec![
                r("ColumnReferenceSegment"),
                r("EqualsSegment"),
                r("ExpressionSegment"),
            ]),
        ),
        false,
    )?;
    d.segment(
        "SetClauseListSegment",
        SegmentDefKit::new(
            "set_clause_list",
            seq(vec![
                kw("SET"),
                meta(MetaKind::Indent),
                delimited(r("SetClauseSegment"), r("CommaSegment")),
                meta(MetaKind::Dedent),
            ]),
        ),
        false,
    )?;
    d.segment(
        "UpdateStatementSegment",
        SegmentDefKit::new(
            "update_statement",
            seq(vec![
                kw("UPDATE"),
                r("TableReferenceSegment"),
                r("AliasExpressionSegment").optional(),
                r("SetClauseListSegment"),
                r("FromClauseSegment").optional(),
                r("WhereClauseSegment").optional(),
            ]),
        ),
        false,
    )?;
    d.segment(
        "DeleteStatementSegment",
        SegmentDefKit::new(
            "delete_statement",
            seq(vec![
                kw("DELETE"),
                kw("FROM"),
                r("TableReferenceSegment"),
                r("AliasExpressionSegment").optional(),
                r("WhereClauseSegment").optional(),
            ]),
        ),
        false,
    )?;
    d.segment(
        "TransactionStatementSegment",
        SegmentDefKit::new(
            "transaction_statement",
            seq(vec![
                one_of(vec![kw("BEGIN"), kw("COMMIT"), kw("ROLLBACK")]),
                one_of(vec![kw("TRANSACTION"), kw("WORK")]).optional(),
            ]),
        ),
        false,
    )?;

    // ------------------------------------------------------------------
    // File structure
    // ------------------------------------------------------------------
    d.segment(
        "StatementSegment",
        SegmentDefKit::new(
            "statement",
            one_of(vec![
                r("SelectableGrammar"),
                r("InsertStatementSegment"),
                r("UpdateStatementSegment"),
                r("DeleteStatementSegment"),
                r("TransactionStatementSegment"),
            ]),
        ),
        false,
    )?;
    d.segment(
        "FileSegment",
        SegmentDefKit::new(
            "file",
            delimited(r("StatementSegment"), r("SemicolonSegment")).allow_trailing(),
        ),
        false,
    )?;

    Ok(d)
}
