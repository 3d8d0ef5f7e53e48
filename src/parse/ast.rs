//! Located syntax tree handed over by the script parser.
//!
//! The parser emits JSON. Every statement and expression carries a `kind`
//! discriminator and an optional 1-based `line`/`col` (0 when unknown).

use serde::{Deserialize, Serialize};

use crate::error::Location;

// =============================================================================
// MODULE / STATEMENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Module { body }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(flatten)]
    pub kind: StmtKind,
    #[serde(default)]
    pub line: i32,
    #[serde(default)]
    pub col: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StmtKind {
    /// `target = value`; `target` is a name, a tuple of names or, invalidly,
    /// an attribute.
    Assign { target: Expr, value: Expr },
    /// A bare expression statement.
    Expr { value: Expr },
}

impl Stmt {
    pub fn assign(target: Expr, value: Expr) -> Self {
        Stmt::from(StmtKind::Assign { target, value })
    }

    pub fn expr(value: Expr) -> Self {
        Stmt::from(StmtKind::Expr { value })
    }

    pub fn at(mut self, line: i32, col: i32) -> Self {
        self.line = line;
        self.col = col;
        self
    }

    pub fn location(&self) -> Option<Location> {
        Location::new(self.line, self.col)
    }
}

impl From<StmtKind> for Stmt {
    fn from(kind: StmtKind) -> Self {
        Stmt {
            kind,
            line: 0,
            col: 0,
        }
    }
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(flatten)]
    pub kind: ExprKind,
    #[serde(default)]
    pub line: i32,
    #[serde(default)]
    pub col: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExprKind {
    Name {
        id: String,
    },
    Constant {
        value: Literal,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Call {
        func: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        keywords: Vec<Keyword>,
    },
    Compare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `body if test else orelse`
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Tuple {
        elts: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub arg: String,
    pub value: Expr,
}

impl Keyword {
    pub fn new(arg: impl Into<String>, value: Expr) -> Self {
        Keyword {
            arg: arg.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtE,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtE,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mult,
    #[serde(rename = "/")]
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "not")]
    Not,
    #[serde(rename = "-")]
    USub,
    #[serde(rename = "+")]
    UAdd,
}

impl From<ExprKind> for Expr {
    fn from(kind: ExprKind) -> Self {
        Expr {
            kind,
            line: 0,
            col: 0,
        }
    }
}

impl Expr {
    pub fn at(mut self, line: i32, col: i32) -> Self {
        self.line = line;
        self.col = col;
        self
    }

    pub fn location(&self) -> Option<Location> {
        Location::new(self.line, self.col)
    }

    /// The identifier, when this is a plain name.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name { id } => Some(id),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self.kind {
            ExprKind::Name { .. } => "name",
            ExprKind::Constant { .. } => "constant",
            ExprKind::Attribute { .. } => "attribute access",
            ExprKind::Call { .. } => "call",
            ExprKind::Compare { .. } => "comparison",
            ExprKind::BoolOp { .. } => "boolean operation",
            ExprKind::BinOp { .. } => "arithmetic",
            ExprKind::UnaryOp { .. } => "unary operation",
            ExprKind::IfExp { .. } => "conditional expression",
            ExprKind::Subscript { .. } => "subscript",
            ExprKind::Tuple { .. } => "tuple",
        }
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn name(id: impl Into<String>) -> Self {
        ExprKind::Name { id: id.into() }.into()
    }

    pub fn constant(value: Literal) -> Self {
        ExprKind::Constant { value }.into()
    }

    pub fn int(value: i64) -> Self {
        Self::constant(Literal::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::constant(Literal::Float(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::constant(Literal::Bool(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::constant(Literal::Str(value.into()))
    }

    pub fn none() -> Self {
        Self::constant(Literal::None)
    }

    pub fn attr(value: Expr, attr: impl Into<String>) -> Self {
        ExprKind::Attribute {
            value: Box::new(value),
            attr: attr.into(),
        }
        .into()
    }

    pub fn call(func: Expr, args: Vec<Expr>, keywords: Vec<Keyword>) -> Self {
        ExprKind::Call {
            func: Box::new(func),
            args,
            keywords,
        }
        .into()
    }

    pub fn compare(left: Expr, op: CmpOp, right: Expr) -> Self {
        ExprKind::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
        .into()
    }

    pub fn and(values: Vec<Expr>) -> Self {
        ExprKind::BoolOp {
            op: BoolOp::And,
            values,
        }
        .into()
    }

    pub fn or(values: Vec<Expr>) -> Self {
        ExprKind::BoolOp {
            op: BoolOp::Or,
            values,
        }
        .into()
    }

    pub fn binop(left: Expr, op: BinOp, right: Expr) -> Self {
        ExprKind::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
        .into()
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        ExprKind::UnaryOp {
            op,
            operand: Box::new(operand),
        }
        .into()
    }

    pub fn if_exp(test: Expr, body: Expr, orelse: Expr) -> Self {
        ExprKind::IfExp {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        }
        .into()
    }

    pub fn subscript(value: Expr, index: Expr) -> Self {
        ExprKind::Subscript {
            value: Box::new(value),
            index: Box::new(index),
        }
        .into()
    }

    pub fn tuple(elts: Vec<Expr>) -> Self {
        ExprKind::Tuple { elts }.into()
    }
}
