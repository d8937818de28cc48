//! Rule logic language for the paycode engine.
//!
//! A small statement language the generation capability is prompted to
//! emit. The compiler wraps a caller-supplied statement body in a fixed
//! classifier shell named after the unit, compiles it against a closed
//! vocabulary (the shift fields and allocation statement below, nothing
//! else), and produces a portable `CompiledArtifact` the unit registry
//! can load.
//!
//! # Syntax
//!
//! ```text
//! let total = shift.total_hours;
//! if total > 8 {
//!     allocate "Regular" 8 "Regular hours up to 8";
//!     allocate "Overtime" total - 8 "Overtime beyond 8 hours";
//! } else {
//!     allocate "Regular" total "Regular working hours";
//! }
//! ```
//!
//! Statements: `let`, `if`/`else`, `allocate "PayCode" <hours-expr>
//! ["description"];`. Expressions are numeric (f64) with arithmetic,
//! comparison, and boolean operators, the shift fields `total_hours`,
//! `start_hour`, `end_hour`, `weekday`, `is_weekend`, and the builtins
//! `min`, `max`, `abs`, `floor`, `ceil`. Comparisons yield 1.0/0.0 and
//! `if` treats any non-zero value as true.
//!
//! # Usage
//!
//! ```rust
//! use paycode_dsl::RuleCompiler;
//!
//! let compiler = RuleCompiler::new();
//! let result = compiler.compile("allocate \"Regular\" shift.total_hours;", "rule_demo");
//! assert!(result.success);
//! let program = result.artifact.unwrap().instantiate().unwrap();
//! ```

#![deny(unsafe_code)]

mod ast;
mod compiler;
mod errors;
mod lexer;
mod parser;
mod program;
mod validator;

pub use ast::{BinaryOp, Builtin, Expr, RuleAst, ShiftField, Stmt, UnaryOp};
pub use compiler::{CompilationResult, CompiledArtifact, RuleCompiler};
pub use errors::{Diagnostic, DiagnosticCategory, DslError, DslResult};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::parse_body;
pub use program::RuleProgram;
pub use validator::validate;
