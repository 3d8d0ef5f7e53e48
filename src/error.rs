//! Unified compiler error type used across all phases.

use serde::Serialize;

use crate::diagnostics::{self, Diagnostic};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Compile,
    Timeframe,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Compile => write!(f, "Compile"),
            Phase::Timeframe => write!(f, "Timeframe"),
        }
    }
}

/// Enumerable error kind, for callers that match on structure rather than text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownTransform,
    MissingRequiredOption,
    UnknownOptions,
    InvalidOptionType,
    UnknownOutputHandle,
    TupleArityMismatch,
    IncompatibleOperandType,
    TimeframeRequiredButAbsent,
    DuplicateNodeId,
    UnknownVariable,
    UnsupportedSyntax,
    InvalidInput,
    AmbiguousOutput,
    InvalidSpecialParameter,
    InvalidDocument,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UnknownTransform => "C001",
            ErrorKind::MissingRequiredOption => "C002",
            ErrorKind::UnknownOptions => "C003",
            ErrorKind::InvalidOptionType => "C004",
            ErrorKind::UnknownOutputHandle => "C005",
            ErrorKind::TupleArityMismatch => "C006",
            ErrorKind::IncompatibleOperandType => "C007",
            ErrorKind::TimeframeRequiredButAbsent => "C008",
            ErrorKind::DuplicateNodeId => "C009",
            ErrorKind::UnknownVariable => "C010",
            ErrorKind::UnsupportedSyntax => "C011",
            ErrorKind::InvalidInput => "C012",
            ErrorKind::AmbiguousOutput => "C013",
            ErrorKind::InvalidSpecialParameter => "C014",
            ErrorKind::InvalidDocument => "P001",
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            ErrorKind::InvalidDocument => Phase::Parse,
            ErrorKind::TimeframeRequiredButAbsent => Phase::Timeframe,
            _ => Phase::Compile,
        }
    }
}

/// 1-based source position reported by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: u32,
    pub col: u32,
}

impl Location {
    /// `None` when the parser did not supply a line (zero or negative).
    pub fn new(line: i32, col: i32) -> Option<Self> {
        if line <= 0 {
            return None;
        }
        Some(Location {
            line: line as u32,
            col: col.max(0) as u32,
        })
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub kind: ErrorKind,
    pub code: String,
    pub phase: Phase,
    /// Rendered diagnostic, including the location when known.
    pub message: String,
    pub node_id: Option<String>,
    pub location: Option<Location>,
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.phase, self.code, self.message)
    }
}

impl std::error::Error for CompilerError {}

impl From<Diagnostic> for CompilerError {
    fn from(diagnostic: Diagnostic) -> Self {
        CompilerError::compile(diagnostic, None)
    }
}

impl CompilerError {
    pub fn parse(message: impl Into<String>) -> Self {
        let kind = ErrorKind::InvalidDocument;
        CompilerError {
            kind,
            code: kind.code().into(),
            phase: kind.phase(),
            message: message.into(),
            node_id: None,
            location: None,
        }
    }

    /// Render a diagnostic raised while compiling the statement at `location`.
    pub fn compile(diagnostic: Diagnostic, location: Option<Location>) -> Self {
        let kind = diagnostic.kind();
        CompilerError {
            kind,
            code: kind.code().into(),
            phase: kind.phase(),
            message: diagnostics::with_location(&diagnostic.to_string(), location),
            node_id: diagnostic.node_id().map(str::to_string),
            location,
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}
