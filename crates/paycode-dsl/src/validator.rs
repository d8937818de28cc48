//! Static validation over a parsed rule body.
//!
//! The parser already rejects unknown shift fields and functions; this
//! pass checks scoping and the constructs that are well-formed but
//! meaningless. Errors block compilation, warnings ride along in the
//! compilation result.

use std::collections::HashSet;

use crate::ast::{Expr, RuleAst, Stmt};
use crate::errors::{Diagnostic, DiagnosticCategory};

/// Validate a parsed rule. Returns `(errors, warnings)`.
pub fn validate(ast: &RuleAst) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
    let mut v = Validator::default();
    v.check_block(&ast.body, &mut HashSet::new());

    if !v.saw_allocate {
        v.warnings.push(Diagnostic::new(
            "V010",
            "rule never allocates hours to any pay code",
            1,
            DiagnosticCategory::Semantic,
        ));
    }
    for (name, line) in &v.unused_lets {
        v.warnings.push(Diagnostic::new(
            "V011",
            format!("binding '{name}' is never read"),
            *line,
            DiagnosticCategory::Semantic,
        ));
    }

    (v.errors, v.warnings)
}

#[derive(Default)]
struct Validator {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    saw_allocate: bool,
    unused_lets: Vec<(String, usize)>,
}

impl Validator {
    fn check_block(&mut self, stmts: &[Stmt], scope: &mut HashSet<String>) {
        for stmt in stmts {
            match stmt {
                Stmt::Let { name, value, line } => {
                    self.check_expr(value, scope);
                    scope.insert(name.clone());
                    self.unused_lets.push((name.clone(), *line));
                }
                Stmt::If { cond, then_branch, else_branch, .. } => {
                    self.check_expr(cond, scope);
                    // Branch-local bindings do not escape the branch.
                    let mut then_scope = scope.clone();
                    self.check_block(then_branch, &mut then_scope);
                    let mut else_scope = scope.clone();
                    self.check_block(else_branch, &mut else_scope);
                }
                Stmt::Allocate { pay_code, hours, line, .. } => {
                    self.saw_allocate = true;
                    if pay_code.trim().is_empty() {
                        self.errors.push(Diagnostic::new(
                            "V002",
                            "allocation pay code must not be empty",
                            *line,
                            DiagnosticCategory::Semantic,
                        ));
                    }
                    if matches!(hours, Expr::Number(n) if *n == 0.0) {
                        self.warnings.push(Diagnostic::new(
                            "V012",
                            format!("allocation to '{pay_code}' is a constant zero hours"),
                            *line,
                            DiagnosticCategory::Semantic,
                        ));
                    }
                    self.check_expr(hours, scope);
                }
            }
        }
    }

    fn check_expr(&mut self, expr: &Expr, scope: &HashSet<String>) {
        match expr {
            Expr::Number(_) | Expr::Field(_) => {}
            Expr::Name(name) => {
                if scope.contains(name) {
                    self.unused_lets.retain(|(n, _)| n != name);
                } else {
                    self.errors.push(Diagnostic::new(
                        "V001",
                        format!("undefined name '{name}'"),
                        0,
                        DiagnosticCategory::NameResolution,
                    ));
                }
            }
            Expr::Binary { lhs, rhs, .. } => {
                self.check_expr(lhs, scope);
                self.check_expr(rhs, scope);
            }
            Expr::Unary { operand, .. } => self.check_expr(operand, scope),
            Expr::Call { args, .. } => {
                for arg in args {
                    self.check_expr(arg, scope);
                }
            }
        }
    }
}
