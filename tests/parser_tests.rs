// tests/parser_tests.rs

use jexl_lang::{Error, Expr, Grammar, Jexl, ParseError, Parser, Value, parser::MAX_NESTING};

fn parse(input: &str) -> Expr {
    Jexl::new().parse(input).unwrap()
}

fn parse_err(input: &str) -> ParseError {
    match Jexl::new().parse(input) {
        Err(Error::Parse(e)) => e,
        other => panic!("Expected parse error for {:?}, got {:?}", input, other),
    }
}

fn binary(operator: &str, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
        operator: operator.to_string(),
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn member(subject: Expr, property: &str) -> Expr {
    Expr::MemberAccess {
        subject: Box::new(subject),
        property: property.to_string(),
    }
}

// ============================================================================
// Literals and Identifiers
// ============================================================================

#[test]
fn test_literals() {
    assert_eq!(parse("\"foo\""), Expr::literal("foo"));
    assert_eq!(parse("12.5"), Expr::literal(12.5));
    assert_eq!(parse("true"), Expr::literal(true));
    assert_eq!(parse("-3"), Expr::literal(-3));
}

#[test]
fn test_identifier() {
    assert_eq!(parse("normandy"), Expr::identifier("normandy"));
}

#[test]
fn test_member_chain() {
    assert_eq!(
        parse("foo.bar.baz"),
        member(member(Expr::identifier("foo"), "bar"), "baz")
    );
}

#[test]
fn test_member_access_on_group() {
    assert_eq!(
        parse("(foo).bar"),
        member(Expr::identifier("foo"), "bar")
    );
}

#[test]
fn test_member_access_on_literal() {
    assert_eq!(parse("\"abc\".length"), member(Expr::literal("abc"), "length"));
}

// ============================================================================
// Binary Operators
// ============================================================================

#[test]
fn test_precedence() {
    // 2 + (3 * 4)
    assert_eq!(
        parse("2 + 3 * 4"),
        binary(
            "+",
            Expr::literal(2),
            binary("*", Expr::literal(3), Expr::literal(4))
        )
    );
}

#[test]
fn test_parentheses_override_precedence() {
    assert_eq!(
        parse("(2 + 3) * 4"),
        binary(
            "*",
            binary("+", Expr::literal(2), Expr::literal(3)),
            Expr::literal(4)
        )
    );
}

#[test]
fn test_left_associativity() {
    // (10 - 4) - 3
    assert_eq!(
        parse("10 - 4 - 3"),
        binary(
            "-",
            binary("-", Expr::literal(10), Expr::literal(4)),
            Expr::literal(3)
        )
    );
    assert_eq!(
        parse("8 / 4 / 2"),
        binary(
            "/",
            binary("/", Expr::literal(8), Expr::literal(4)),
            Expr::literal(2)
        )
    );
}

#[test]
fn test_logical_binds_loosest() {
    // (a == 1) && (b > 2)
    assert_eq!(
        parse("a == 1 && b > 2"),
        binary(
            "&&",
            binary("==", Expr::identifier("a"), Expr::literal(1)),
            binary(">", Expr::identifier("b"), Expr::literal(2))
        )
    );
}

#[test]
fn test_and_or_share_precedence() {
    // (a || b) && c
    assert_eq!(
        parse("a || b && c"),
        binary(
            "&&",
            binary("||", Expr::identifier("a"), Expr::identifier("b")),
            Expr::identifier("c")
        )
    );
}

#[test]
fn test_in_operator() {
    assert_eq!(
        parse("'a' in ['a', 'b']"),
        binary(
            "in",
            Expr::literal("a"),
            Expr::Array(vec![Expr::literal("a"), Expr::literal("b")])
        )
    );
}

#[test]
fn test_negative_literal_operand() {
    assert_eq!(
        parse("6 + x - -17.55 * y"),
        binary(
            "-",
            binary("+", Expr::literal(6), Expr::identifier("x")),
            binary("*", Expr::literal(-17.55), Expr::identifier("y"))
        )
    );
}

// ============================================================================
// Unary Operators
// ============================================================================

#[test]
fn test_unary_not() {
    assert_eq!(
        parse("!foo"),
        Expr::UnaryOp {
            operator: "!".to_string(),
            right: Box::new(Expr::identifier("foo")),
        }
    );
}

#[test]
fn test_unary_binds_tighter_than_binary() {
    // (!a) && b
    assert_eq!(
        parse("!a && b"),
        binary(
            "&&",
            Expr::UnaryOp {
                operator: "!".to_string(),
                right: Box::new(Expr::identifier("a")),
            },
            Expr::identifier("b")
        )
    );
}

#[test]
fn test_unary_applies_after_postfix() {
    // !(foo.bar)
    assert_eq!(
        parse("!foo.bar"),
        Expr::UnaryOp {
            operator: "!".to_string(),
            right: Box::new(member(Expr::identifier("foo"), "bar")),
        }
    );
}

#[test]
fn test_double_negation() {
    assert_eq!(
        parse("!!x"),
        Expr::UnaryOp {
            operator: "!".to_string(),
            right: Box::new(Expr::UnaryOp {
                operator: "!".to_string(),
                right: Box::new(Expr::identifier("x")),
            }),
        }
    );
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_relative_filter() {
    assert_eq!(
        parse("foo.bar[.tek == 'baz']"),
        Expr::Filter {
            subject: Box::new(member(Expr::identifier("foo"), "bar")),
            predicate: Box::new(binary(
                "==",
                Expr::relative_identifier("tek"),
                Expr::literal("baz")
            )),
            relative: true,
        }
    );
}

#[test]
fn test_relative_filter_with_nested_path() {
    assert_eq!(
        parse("foo[.a.b > 1]"),
        Expr::Filter {
            subject: Box::new(Expr::identifier("foo")),
            predicate: Box::new(binary(
                ">",
                member(Expr::relative_identifier("a"), "b"),
                Expr::literal(1)
            )),
            relative: true,
        }
    );
}

#[test]
fn test_static_filter() {
    assert_eq!(
        parse("foo.bar[1]"),
        Expr::Filter {
            subject: Box::new(member(Expr::identifier("foo"), "bar")),
            predicate: Box::new(Expr::literal(1)),
            relative: false,
        }
    );
}

#[test]
fn test_filter_then_member() {
    assert_eq!(
        parse("foo.bar[1].tek"),
        member(
            Expr::Filter {
                subject: Box::new(member(Expr::identifier("foo"), "bar")),
                predicate: Box::new(Expr::literal(1)),
                relative: false,
            },
            "tek"
        )
    );
}

#[test]
fn test_filter_predicate_not_starting_with_dot_is_static() {
    let expr = parse("foo[x == .y]");
    assert!(matches!(expr, Expr::Filter { relative: false, .. }));
}

// ============================================================================
// Transforms
// ============================================================================

#[test]
fn test_transform_without_args() {
    assert_eq!(
        parse("name|lower"),
        Expr::Transform {
            subject: Box::new(Expr::identifier("name")),
            name: "lower".to_string(),
            args: vec![],
        }
    );
}

#[test]
fn test_transform_with_args() {
    assert_eq!(
        parse("x|clamp(1, max + 1)"),
        Expr::Transform {
            subject: Box::new(Expr::identifier("x")),
            name: "clamp".to_string(),
            args: vec![
                Expr::literal(1),
                binary("+", Expr::identifier("max"), Expr::literal(1)),
            ],
        }
    );
}

#[test]
fn test_transform_with_empty_args() {
    let expr = parse("x|now()");
    assert!(matches!(expr, Expr::Transform { ref args, .. } if args.is_empty()));
}

#[test]
fn test_chained_transforms() {
    assert_eq!(
        parse("x|a|b"),
        Expr::Transform {
            subject: Box::new(Expr::Transform {
                subject: Box::new(Expr::identifier("x")),
                name: "a".to_string(),
                args: vec![],
            }),
            name: "b".to_string(),
            args: vec![],
        }
    );
}

#[test]
fn test_transform_binds_tighter_than_binary() {
    // a + (b|t)
    assert_eq!(
        parse("a + b|t"),
        binary(
            "+",
            Expr::identifier("a"),
            Expr::Transform {
                subject: Box::new(Expr::identifier("b")),
                name: "t".to_string(),
                args: vec![],
            }
        )
    );
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn test_conditional() {
    assert_eq!(
        parse("a > 1 ? 'big' : 'small'"),
        Expr::Conditional {
            test: Box::new(binary(">", Expr::identifier("a"), Expr::literal(1))),
            consequent: Some(Box::new(Expr::literal("big"))),
            alternate: Box::new(Expr::literal("small")),
        }
    );
}

#[test]
fn test_conditional_without_consequent() {
    assert_eq!(
        parse("foo ?: 'bar'"),
        Expr::Conditional {
            test: Box::new(Expr::identifier("foo")),
            consequent: None,
            alternate: Box::new(Expr::literal("bar")),
        }
    );
}

#[test]
fn test_nested_conditional_in_alternate() {
    let expr = parse("a ? 1 : b ? 2 : 3");
    match expr {
        Expr::Conditional { alternate, .. } => {
            assert!(matches!(*alternate, Expr::Conditional { .. }));
        }
        other => panic!("Expected conditional, got {:?}", other),
    }
}

#[test]
fn test_conditional_inside_group() {
    let expr = parse("(a ? 1 : 2) + 3");
    assert!(matches!(expr, Expr::BinaryOp { ref operator, .. } if operator == "+"));
}

// ============================================================================
// Collection Literals
// ============================================================================

#[test]
fn test_array_literal() {
    assert_eq!(
        parse("['a', 1, foo]"),
        Expr::Array(vec![
            Expr::literal("a"),
            Expr::literal(1),
            Expr::identifier("foo"),
        ])
    );
    assert_eq!(parse("[]"), Expr::Array(vec![]));
}

#[test]
fn test_object_literal() {
    assert_eq!(
        parse("{name: foo.name, \"total count\": 2}"),
        Expr::Object(vec![
            ("name".to_string(), member(Expr::identifier("foo"), "name")),
            ("total count".to_string(), Expr::literal(2)),
        ])
    );
    assert_eq!(parse("{}"), Expr::Object(vec![]));
}

#[test]
fn test_nested_collections() {
    assert_eq!(
        parse("{a: [1, {b: 2}]}"),
        Expr::Object(vec![(
            "a".to_string(),
            Expr::Array(vec![
                Expr::literal(1),
                Expr::Object(vec![("b".to_string(), Expr::literal(2))]),
            ])
        )])
    );
}

#[test]
fn test_member_access_on_object_literal() {
    assert_eq!(
        parse("{a: 1}.a"),
        member(Expr::Object(vec![("a".to_string(), Expr::literal(1))]), "a")
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_empty_expression() {
    assert_eq!(parse_err(""), ParseError::EmptyExpression);
    assert_eq!(parse_err("   "), ParseError::EmptyExpression);
}

#[test]
fn test_missing_operand() {
    assert!(matches!(parse_err("1 +"), ParseError::UnexpectedEnd { .. }));
    assert!(matches!(parse_err("1 + -"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_err("* 2"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_unclosed_delimiters() {
    assert!(matches!(parse_err("(1 + 2"), ParseError::UnexpectedEnd { .. }));
    assert!(matches!(parse_err("foo[1"), ParseError::UnexpectedEnd { .. }));
    assert!(matches!(parse_err("[1, 2"), ParseError::UnexpectedEnd { .. }));
    assert!(matches!(parse_err("{a: 1"), ParseError::UnexpectedEnd { .. }));
}

#[test]
fn test_trailing_tokens() {
    assert_eq!(
        parse_err("1 2"),
        ParseError::UnexpectedToken {
            found: "2".to_string(),
            expected: "end of expression",
        }
    );
    assert!(matches!(parse_err("a)"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_bad_member_access() {
    assert!(matches!(parse_err("foo."), ParseError::UnexpectedEnd { .. }));
    assert!(matches!(parse_err("foo.1"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_bad_transform() {
    assert!(matches!(parse_err("foo|"), ParseError::UnexpectedEnd { .. }));
    assert!(matches!(parse_err("foo|'x'"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_err("foo|t(1,"), ParseError::UnexpectedEnd { .. }));
}

#[test]
fn test_bad_object_key() {
    assert!(matches!(parse_err("{1: 2}"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_err("{a 2}"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_trailing_commas_rejected() {
    assert!(matches!(parse_err("[1, 2,]"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_err("{a: 1,}"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_err("x|t(1,)"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_incomplete_conditional() {
    assert!(matches!(parse_err("a ? 1"), ParseError::UnexpectedEnd { .. }));
    assert!(matches!(parse_err("a ? 1 2"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_nesting_limit() {
    let groups = format!("{}x{}", "(".repeat(200), ")".repeat(200));
    assert_eq!(parse_err(&groups), ParseError::TooDeep(MAX_NESTING));
    assert_eq!(parse_err(&format!("{}x", "!".repeat(200))), ParseError::TooDeep(MAX_NESTING));
    let lists = format!("{}1{}", "[".repeat(200), "]".repeat(200));
    assert_eq!(parse_err(&lists), ParseError::TooDeep(MAX_NESTING));

    // Shallower nesting still parses; groups leave no node behind
    let shallow = format!("{}x{}", "(".repeat(40), ")".repeat(40));
    assert_eq!(parse(&shallow), Expr::identifier("x"));
}

#[test]
fn test_error_message() {
    assert_eq!(
        parse_err("1 2").to_string(),
        "Unexpected token '2': expected end of expression"
    );
}

// ============================================================================
// Custom Grammar
// ============================================================================

#[test]
fn test_custom_operator_precedence() {
    let mut jexl = Jexl::new();
    jexl.add_binary_op("**", 60, |l, r| Value::Number(l.to_number().powf(r.to_number())));

    // 2 * (3 ** 2)
    assert_eq!(
        jexl.parse("2 * 3 ** 2").unwrap(),
        binary(
            "*",
            Expr::literal(2),
            binary("**", Expr::literal(3), Expr::literal(2))
        )
    );
}

#[test]
fn test_parser_over_tokens() {
    let grammar = Grammar::default();
    let tokens = Jexl::new().tokenize("a.b").unwrap();
    let expr = Parser::new(&grammar, tokens).parse().unwrap();
    assert_eq!(expr, member(Expr::identifier("a"), "b"));
}

#[test]
fn test_removed_operator_token_is_unknown() {
    // Tokens lexed under the default grammar, parsed under a reduced one
    let tokens = Jexl::new().tokenize("1 + 2").unwrap();
    let mut grammar = Grammar::default();
    grammar.remove_op("+");
    assert_eq!(
        Parser::new(&grammar, tokens).parse(),
        Err(ParseError::UnknownOperator("+".to_string()))
    );
}
