#[allow(dead_code)]
mod helpers;

use helpers::*;
use strategy_compiler::error::{CompilerError, ErrorKind, Phase};
use strategy_compiler::parse::{BinOp, CmpOp, Expr, ExprKind, Keyword, Stmt, UnaryOp};

fn assert_kind(err: &CompilerError, kind: ErrorKind) {
    assert!(err.is(kind), "Expected {:?}, got: {}", kind, err);
    assert_eq!(err.code, kind.code());
}

fn assert_message(err: &CompilerError, fragment: &str) {
    assert!(
        err.message.contains(fragment),
        "Expected message to contain {:?}, got: {}",
        fragment,
        err.message
    );
}

/// `src = market_data_source(...)` followed by `stmts`.
fn with_source(stmts: Vec<Stmt>) -> Vec<Stmt> {
    let mut body = vec![assign("src", source("1H"))];
    body.extend(stmts);
    body
}

fn sma_of_close(options: Vec<(&str, Expr)>) -> Expr {
    feed(ctor("sma", options), vec![attr("src", "c")])
}

// =============================================================================
// Registry lookups
// =============================================================================

#[test]
fn test_unknown_transform() {
    let err = compile_err(vec![
        assign("x", ctor("smaa", vec![("period", Expr::int(3))]).at(2, 5)).at(2, 1),
    ]);

    assert_kind(&err, ErrorKind::UnknownTransform);
    assert_eq!(err.phase, Phase::Compile);
    assert_message(&err, "Unknown component 'smaa()'");
    assert!(err.message.ends_with("(line 2, col 5)"), "{}", err.message);
}

#[test]
fn test_unknown_transform_rendering() {
    let err = compile_err(vec![assign("x", ctor("smaa", vec![]).at(4, 9))]);
    insta::assert_snapshot!(err.to_string(), @r"
    [Compile:C001] Unknown component 'smaa()'
      This component is not registered or does not exist.
      Check the component name for typos or verify it's included in the system. (line 4, col 9)
    ");
}

#[test]
fn test_unknown_variable() {
    let err = compile_err(vec![assign("y", name("x"))]);
    assert_kind(&err, ErrorKind::UnknownVariable);
    assert_message(&err, "Unknown variable 'x'");
}

#[test]
fn test_statement_location_is_used_when_expression_has_none() {
    let err = compile_err(vec![assign("y", name("x")).at(4, 1)]);
    assert!(err.message.ends_with("(line 4, col 1)"), "{}", err.message);
    assert_eq!(err.location.map(|l| (l.line, l.col)), Some((4, 1)));
}

#[test]
fn test_missing_location_is_omitted() {
    let err = compile_err(vec![assign("y", name("x"))]);
    assert_eq!(err.location, None);
    assert!(!err.message.contains("line"), "{}", err.message);
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn test_missing_required_option() {
    let err = compile_err(with_source(vec![assign("s", sma_of_close(vec![]))]));

    assert_kind(&err, ErrorKind::MissingRequiredOption);
    assert_message(&err, "Node 's' of type 'sma' is missing required option 'period'");
    assert_eq!(err.node_id.as_deref(), Some("s"));
}

#[test]
fn test_unknown_options_lists_surplus_keys() {
    let err = compile_err(with_source(vec![assign(
        "s",
        sma_of_close(vec![
            ("period", Expr::int(3)),
            ("lenght", Expr::int(5)),
            ("foo", Expr::int(1)),
        ]),
    )]));

    assert_kind(&err, ErrorKind::UnknownOptions);
    assert_message(&err, "Unknown options for 'sma()': foo, lenght");
}

#[test]
fn test_option_type_mismatch() {
    let err = compile_err(with_source(vec![assign(
        "s",
        sma_of_close(vec![("period", Expr::string("ten"))]),
    )]));

    assert_kind(&err, ErrorKind::InvalidOptionType);
    assert_message(&err, "option 'period' expects Integer, got string");
}

#[test]
fn test_option_selection_outside_allowed_set() {
    let err = compile_err(with_source(vec![assign(
        "ma",
        feed(
            ctor(
                "moving_average",
                vec![("period", Expr::int(10)), ("kind", Expr::string("HMA"))],
            ),
            vec![attr("src", "c")],
        ),
    )]));

    assert_kind(&err, ErrorKind::InvalidOptionType);
    assert_message(&err, "option 'kind' has invalid value 'HMA'. Valid options: SMA, EMA, WMA");
}

#[test]
fn test_option_must_be_literal() {
    let err = compile_err(with_source(vec![assign(
        "s",
        sma_of_close(vec![("period", attr("src", "c"))]),
    )]));

    assert_kind(&err, ErrorKind::InvalidOptionType);
    assert_message(&err, "must be a literal value");
}

#[test]
fn test_empty_reference_is_rejected() {
    let err = compile_err(with_source(vec![assign(
        "s",
        sma_of_close(vec![("period", Expr::string("$"))]),
    )]));

    assert_kind(&err, ErrorKind::InvalidOptionType);
}

#[test]
fn test_keyword_given_twice() {
    let err = compile_err(with_source(vec![assign(
        "s",
        sma_of_close(vec![("period", Expr::int(3)), ("period", Expr::int(4))]),
    )]));

    assert_kind(&err, ErrorKind::UnsupportedSyntax);
    assert_message(&err, "'period' given more than once");
}

// =============================================================================
// Special parameters
// =============================================================================

#[test]
fn test_timeframe_must_be_a_string() {
    let err = compile_err(vec![assign(
        "src",
        ctor(
            "market_data_source",
            vec![("symbol", Expr::string("BTCUSD")), ("timeframe", Expr::int(5))],
        ),
    )]);

    assert_kind(&err, ErrorKind::InvalidSpecialParameter);
    assert_message(&err, "Invalid 'timeframe' parameter: must be a string");
}

#[test]
fn test_unparsable_timeframe() {
    let err = compile_err(vec![assign("src", source("7X"))]);
    assert_kind(&err, ErrorKind::InvalidSpecialParameter);
    assert_message(&err, "7X");
}

#[test]
fn test_session_requires_timeframe_bearing_transform() {
    let err = compile_err(with_source(vec![assign(
        "s",
        sma_of_close(vec![("period", Expr::int(3)), ("session", Expr::string("London"))]),
    )]));

    assert_kind(&err, ErrorKind::InvalidSpecialParameter);
    assert_message(&err, "Invalid 'session' parameter");
}

#[test]
fn test_timeframe_required_but_absent() {
    let err = compile_err(vec![assign(
        "src",
        ctor("market_data_source", vec![("symbol", Expr::string("BTCUSD"))]),
    )]);

    assert_kind(&err, ErrorKind::TimeframeRequiredButAbsent);
    assert_eq!(err.phase, Phase::Timeframe);
    assert_eq!(err.node_id.as_deref(), Some("src"));
}

// =============================================================================
// Handles and tuple unpacking
// =============================================================================

#[test]
fn test_unknown_output_handle_lists_valid_handles() {
    let err = compile_err(with_source(vec![assign("x", attr("src", "close_price"))]));

    assert_kind(&err, ErrorKind::UnknownOutputHandle);
    assert_message(&err, "Unknown handle 'close_price' on node 'src'");
    assert_message(&err, "Valid handles: o, h, l, c, v, close, volume");
}

#[test]
fn test_tuple_arity_mismatch_names_both_counts() {
    let err = compile_err(with_source(vec![unpack(
        &["upper", "lower"],
        feed(ctor("bbands", vec![]), vec![attr("src", "c")]),
    )]));

    assert_kind(&err, ErrorKind::TupleArityMismatch);
    assert_message(&err, "3 outputs [upper, middle, lower]");
    assert_message(&err, "2 variables");
}

#[test]
fn test_multi_output_node_used_as_value() {
    let err = compile_err(with_source(vec![
        assign("bb", feed(ctor("bbands", vec![]), vec![attr("src", "c")])),
        assign("x", Expr::binop(name("bb"), BinOp::Add, Expr::int(1))),
    ]));

    assert_kind(&err, ErrorKind::AmbiguousOutput);
    assert_message(&err, "select one with 'bb.<handle>'");
}

#[test]
fn test_tuple_unpack_of_non_call() {
    let err = compile_err(vec![unpack(&["a", "b"], Expr::float(1.0))]);
    assert_kind(&err, ErrorKind::UnsupportedSyntax);
}

#[test]
fn test_tuple_target_must_hold_names() {
    let err = compile_err(with_source(vec![Stmt::assign(
        Expr::tuple(vec![name("a"), attr("src", "c")]),
        feed(ctor("bbands", vec![]), vec![attr("src", "c")]),
    )]));
    assert_kind(&err, ErrorKind::UnsupportedSyntax);
}

// =============================================================================
// Bindings and ids
// =============================================================================

#[test]
fn test_rebinding_a_variable() {
    let err = compile_err(vec![assign("x", Expr::float(1.0)), assign("x", Expr::float(2.0))]);
    assert_kind(&err, ErrorKind::DuplicateNodeId);
    assert_message(&err, "Variable 'x' is already bound");
}

#[test]
fn test_repeated_name_in_tuple_target() {
    let err = compile_err(with_source(vec![unpack(
        &["a", "a", "b"],
        feed(ctor("bbands", vec![]), vec![attr("src", "c")]),
    )]));
    assert_kind(&err, ErrorKind::DuplicateNodeId);
}

#[test]
fn test_variable_colliding_with_generated_id() {
    let err = compile_err(vec![
        assign("a", Expr::float(1.0)),
        assign("number_0", Expr::call(name("highest"), vec![name("a")], vec![])),
    ]);

    assert_kind(&err, ErrorKind::DuplicateNodeId);
    assert_message(&err, "Node id 'number_0' is already defined");
}

// =============================================================================
// Inputs
// =============================================================================

#[test]
fn test_too_many_positional_inputs() {
    let err = compile_err(with_source(vec![assign(
        "s",
        feed(ctor("sma", vec![("period", Expr::int(3))]), vec![attr("src", "c"), attr("src", "o")]),
    )]));

    assert_kind(&err, ErrorKind::InvalidInput);
    assert_message(&err, "takes 1 input(s) but 2 were given");
}

#[test]
fn test_unknown_input_keyword() {
    let err = compile_err(with_source(vec![assign(
        "r",
        feed_named(ctor("atr", vec![]), vec![("open", attr("src", "o"))]),
    )]));

    assert_kind(&err, ErrorKind::InvalidInput);
    assert_message(&err, "unknown input 'open'");
}

#[test]
fn test_input_connected_twice() {
    let err = compile_err(with_source(vec![assign(
        "r",
        Expr::call(
            ctor("atr", vec![]),
            vec![attr("src", "h")],
            vec![Keyword::new("high", attr("src", "h"))],
        ),
    )]));

    assert_kind(&err, ErrorKind::InvalidInput);
    assert_message(&err, "input 'high' is already connected");
}

#[test]
fn test_at_least_one_input_required() {
    let err = compile_err(vec![assign("top", Expr::call(name("highest"), vec![], vec![]))]);

    assert_kind(&err, ErrorKind::InvalidInput);
    assert_message(&err, "at least one input must be connected");
}

#[test]
fn test_null_input_rejected() {
    let err = compile_err(vec![assign(
        "flag",
        Expr::compare(Expr::float(1.0), CmpOp::Eq, Expr::none()),
    )]);

    assert_kind(&err, ErrorKind::InvalidInput);
    assert_message(&err, "does not accept null");
}

#[test]
fn test_null_into_typed_input_rejected_through_cast() {
    let err = compile_err(vec![assign(
        "s",
        feed(ctor("sma", vec![("period", Expr::int(3))]), vec![Expr::none()]),
    )]);

    assert_kind(&err, ErrorKind::InvalidInput);
    assert_eq!(err.node_id.as_deref(), Some("s"), "the consumer is reported, not the cast");
    assert_message(&err, "input 'SLOT' does not accept null");
}

// =============================================================================
// Unsupported syntax
// =============================================================================

#[test]
fn test_positional_options_are_rejected() {
    let err = compile_err(with_source(vec![assign(
        "s",
        Expr::call(name("sma"), vec![attr("src", "c")], vec![]),
    )]));

    assert_kind(&err, ErrorKind::UnsupportedSyntax);
    assert_message(&err, "pass options by keyword");
}

#[test]
fn test_assignment_to_attribute() {
    let err = compile_err(with_source(vec![Stmt::assign(attr("src", "c"), Expr::float(1.0))]));
    assert_kind(&err, ErrorKind::UnsupportedSyntax);
    assert_message(&err, "cannot assign to attribute access");
}

#[test]
fn test_discarded_result_of_non_sink() {
    let err = compile_err(with_source(vec![Stmt::expr(sma_of_close(vec![(
        "period",
        Expr::int(3),
    )]))]));

    assert_kind(&err, ErrorKind::UnsupportedSyntax);
    assert_message(&err, "discarded result of 'sma()'");
}

#[test]
fn test_expression_statement_must_be_a_call() {
    let err = compile_err(vec![Stmt::expr(Expr::float(1.0))]);
    assert_kind(&err, ErrorKind::UnsupportedSyntax);
}

#[test]
fn test_sink_used_as_value() {
    let err = compile_err(with_source(vec![
        assign("up", Expr::compare(attr("src", "c"), CmpOp::Gt, attr("src", "o"))),
        assign(
            "x",
            Expr::and(vec![
                feed_named(ctor("trade_signal_executor", vec![]), vec![("enter_long", name("up"))]),
                name("up"),
            ]),
        ),
    ]));

    assert_kind(&err, ErrorKind::UnsupportedSyntax);
    assert_message(&err, "produces no output");
}

#[test]
fn test_subscript_index_must_be_non_zero_constant() {
    let err = compile_err(with_source(vec![assign(
        "prev",
        Expr::subscript(attr("src", "c"), Expr::int(0)),
    )]));
    assert_kind(&err, ErrorKind::UnsupportedSyntax);

    let err = compile_err(with_source(vec![assign(
        "prev",
        Expr::subscript(attr("src", "c"), attr("src", "o")),
    )]));
    assert_kind(&err, ErrorKind::UnsupportedSyntax);
}

#[test]
fn test_boolean_operation_needs_two_operands() {
    let single = Expr::from(ExprKind::BoolOp {
        op: strategy_compiler::parse::BoolOp::Or,
        values: vec![Expr::boolean(true)],
    });
    let err = compile_err(vec![assign("x", single)]);
    assert_kind(&err, ErrorKind::UnsupportedSyntax);
}

#[test]
fn test_tuple_used_as_value() {
    let err = compile_err(vec![assign(
        "x",
        Expr::tuple(vec![Expr::int(1), Expr::unary(UnaryOp::UAdd, Expr::int(2))]),
    )]);
    assert_kind(&err, ErrorKind::UnsupportedSyntax);
}
