//! Abstract syntax tree for the rule logic language.
//!
//! The AST is serializable: a validated tree plus its unit name is the
//! portable "binary" the unit registry loads.

use serde::{Deserialize, Serialize};

/// Shift fields readable from rule logic. This is the closed input
/// vocabulary generated rules are prompted with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftField {
    TotalHours,
    StartHour,
    EndHour,
    Weekday,
    IsWeekend,
}

impl ShiftField {
    /// Resolve a `shift.<name>` field reference.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "total_hours" => Some(Self::TotalHours),
            "start_hour" => Some(Self::StartHour),
            "end_hour" => Some(Self::EndHour),
            "weekday" => Some(Self::Weekday),
            "is_weekend" => Some(Self::IsWeekend),
            _ => None,
        }
    }
}

/// Binary operators, in ascending precedence groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    Add,
    Sub,
    Mul,
    Div,
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Builtin functions available to rule logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Builtin {
    Min,
    Max,
    Abs,
    Floor,
    Ceil,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "abs" => Some(Self::Abs),
            "floor" => Some(Self::Floor),
            "ceil" => Some(Self::Ceil),
            _ => None,
        }
    }

    /// Number of arguments the builtin expects.
    pub fn arity(self) -> usize {
        match self {
            Self::Min | Self::Max => 2,
            Self::Abs | Self::Floor | Self::Ceil => 1,
        }
    }
}

/// Expression node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f64),
    Name(String),
    Field(ShiftField),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call {
        builtin: Builtin,
        args: Vec<Expr>,
    },
}

/// Statement node, each tagged with its source line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Let {
        name: String,
        value: Expr,
        line: usize,
    },
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
        line: usize,
    },
    Allocate {
        pay_code: String,
        hours: Expr,
        description: Option<String>,
        line: usize,
    },
}

/// A full parsed rule: the wrapper name plus the statement body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleAst {
    /// Deterministic wrapper name derived from the unit name.
    pub name: String,
    pub body: Vec<Stmt>,
}
