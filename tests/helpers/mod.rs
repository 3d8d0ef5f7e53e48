use strategy_compiler::compile::{CompileOptions, Compiler};
use strategy_compiler::error::CompilerError;
use strategy_compiler::ir::{CompiledGraph, Node};
use strategy_compiler::metadata::*;
use strategy_compiler::parse::*;

// =============================================================================
// Registry
// =============================================================================

fn sma() -> TransformSchema {
    TransformSchema::new("sma", TransformCategory::Indicator)
        .option(OptionSpec::new("period", OptionType::Integer).required())
        .input(IoSpec::new("*", ValueType::Number))
        .output(IoSpec::new("result", ValueType::Decimal))
}

fn atr() -> TransformSchema {
    TransformSchema::new("atr", TransformCategory::Indicator)
        .option(
            OptionSpec::new("period", OptionType::Integer).with_default(OptionValue::Decimal(14.0)),
        )
        .input(IoSpec::new("high", ValueType::Number))
        .input(IoSpec::new("low", ValueType::Number))
        .input(IoSpec::new("close", ValueType::Number))
        .output(IoSpec::new("result", ValueType::Decimal))
        .requires_timeframe()
}

fn moving_average() -> TransformSchema {
    TransformSchema::new("moving_average", TransformCategory::Indicator)
        .option(
            OptionSpec::new("period", OptionType::Integer)
                .required()
                .with_bounds(1.0, 500.0),
        )
        .option(
            OptionSpec::new("kind", OptionType::Select)
                .with_selections(["SMA", "EMA", "WMA"])
                .with_default(OptionValue::string("SMA")),
        )
        .input(IoSpec::new("*", ValueType::Number))
        .output(IoSpec::new("result", ValueType::Decimal))
}

fn bbands() -> TransformSchema {
    TransformSchema::new("bbands", TransformCategory::Indicator)
        .option(OptionSpec::new("period", OptionType::Integer).with_default(OptionValue::Decimal(20.0)))
        .option(OptionSpec::new("stddev", OptionType::Decimal).with_default(OptionValue::Decimal(2.0)))
        .input(IoSpec::new("*", ValueType::Number))
        .output(IoSpec::new("upper", ValueType::Decimal))
        .output(IoSpec::new("middle", ValueType::Decimal))
        .output(IoSpec::new("lower", ValueType::Decimal))
        .alias("mid", "middle")
}

fn macd() -> TransformSchema {
    TransformSchema::new("macd", TransformCategory::Indicator)
        .option(OptionSpec::new("fast", OptionType::Integer).with_default(OptionValue::Decimal(12.0)))
        .option(OptionSpec::new("slow", OptionType::Integer).with_default(OptionValue::Decimal(26.0)))
        .option(OptionSpec::new("signal", OptionType::Integer).with_default(OptionValue::Decimal(9.0)))
        .input(IoSpec::new("*", ValueType::Number))
        .output(IoSpec::new("macd", ValueType::Decimal))
        .output(IoSpec::new("signal", ValueType::Decimal))
        .output(IoSpec::new("histogram", ValueType::Decimal))
}

fn market_data_source() -> TransformSchema {
    TransformSchema::new("market_data_source", TransformCategory::DataSource)
        .option(OptionSpec::new("symbol", OptionType::String).required())
        .output(IoSpec::new("o", ValueType::Decimal))
        .output(IoSpec::new("h", ValueType::Decimal))
        .output(IoSpec::new("l", ValueType::Decimal))
        .output(IoSpec::new("c", ValueType::Decimal))
        .output(IoSpec::new("v", ValueType::Decimal))
        .alias("close", "c")
        .alias("volume", "v")
        .requires_timeframe()
}

fn vwap() -> TransformSchema {
    TransformSchema::new("vwap", TransformCategory::Indicator)
        .input(IoSpec::new("price", ValueType::Number))
        .input(IoSpec::new("volume", ValueType::Number))
        .output(IoSpec::new("result", ValueType::Decimal))
        .requires_timeframe()
        .intraday_only()
}

fn highest() -> TransformSchema {
    TransformSchema::new("highest", TransformCategory::Math)
        .input(IoSpec::new("*", ValueType::Number).multiple())
        .output(IoSpec::new("result", ValueType::Decimal))
        .at_least_one_input()
}

fn trade_signal_executor() -> TransformSchema {
    TransformSchema::new("trade_signal_executor", TransformCategory::Executor)
        .input(IoSpec::new("enter_long", ValueType::Boolean))
        .input(IoSpec::new("exit_long", ValueType::Boolean))
        .at_least_one_input()
}

fn bar_timestamp() -> TransformSchema {
    TransformSchema::new("bar_timestamp", TransformCategory::Utility)
        .output(IoSpec::new("result", ValueType::Timestamp))
}

/// Builtins plus a small set of indicators, sources and sinks.
pub fn registry() -> Registry {
    let mut builder = RegistryBuilder::with_builtins();
    builder
        .register_all([
            sma(),
            atr(),
            moving_average(),
            bbands(),
            macd(),
            market_data_source(),
            vwap(),
            highest(),
            trade_signal_executor(),
            bar_timestamp(),
        ])
        .expect("test schemas are valid");
    builder.build()
}

// =============================================================================
// Compilation
// =============================================================================

pub fn compile(body: Vec<Stmt>) -> Result<CompiledGraph, CompilerError> {
    let registry = registry();
    Compiler::new(&registry)
        .with_options(CompileOptions {
            verify_output: true,
            ..CompileOptions::default()
        })
        .compile(&Module::new(body))
}

pub fn compile_ok(body: Vec<Stmt>) -> CompiledGraph {
    match compile(body) {
        Ok(graph) => graph,
        Err(e) => panic!("expected the script to compile, got: {e}"),
    }
}

pub fn compile_err(body: Vec<Stmt>) -> CompilerError {
    match compile(body) {
        Ok(graph) => panic!("expected a compile error, got graph:\n{}", graph.to_json()),
        Err(e) => e,
    }
}

pub fn node<'g>(graph: &'g CompiledGraph, id: &str) -> &'g Node {
    graph
        .get(id)
        .unwrap_or_else(|| panic!("node '{id}' not in graph:\n{}", graph.to_json()))
}

// =============================================================================
// Syntax tree builders
// =============================================================================

pub fn name(id: &str) -> Expr {
    Expr::name(id)
}

/// `x = value`
pub fn assign(target: &str, value: Expr) -> Stmt {
    Stmt::assign(Expr::name(target), value)
}

/// `a, b, ... = value`
pub fn unpack(targets: &[&str], value: Expr) -> Stmt {
    let elts = targets.iter().map(|t| Expr::name(*t)).collect();
    Stmt::assign(Expr::tuple(elts), value)
}

/// `component(k=v, ...)`
pub fn ctor(component: &str, options: Vec<(&str, Expr)>) -> Expr {
    let keywords = options
        .into_iter()
        .map(|(k, v)| Keyword::new(k, v))
        .collect();
    Expr::call(Expr::name(component), vec![], keywords)
}

/// `ctor(...)(args...)`
pub fn feed(ctor: Expr, args: Vec<Expr>) -> Expr {
    Expr::call(ctor, args, vec![])
}

/// `ctor(...)(k=v, ...)`
pub fn feed_named(ctor: Expr, inputs: Vec<(&str, Expr)>) -> Expr {
    let keywords = inputs
        .into_iter()
        .map(|(k, v)| Keyword::new(k, v))
        .collect();
    Expr::call(ctor, vec![], keywords)
}

/// `market_data_source(symbol="BTCUSD", timeframe=...)`
pub fn source(timeframe: &str) -> Expr {
    ctor(
        "market_data_source",
        vec![
            ("symbol", Expr::string("BTCUSD")),
            ("timeframe", Expr::string(timeframe)),
        ],
    )
}

pub fn attr(value: &str, handle: &str) -> Expr {
    Expr::attr(Expr::name(value), handle)
}
