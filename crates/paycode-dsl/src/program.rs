//! Tree-walking evaluator behind the `PayrollClassifier` capability.

use std::collections::HashMap;

use paycode_types::{
    ExecutionError, PayCodeAllocation, PayrollClassifier, Shift, ShiftClassificationResult,
};

use crate::ast::{BinaryOp, Builtin, Expr, RuleAst, ShiftField, Stmt, UnaryOp};

/// A validated, executable rule. One instance backs one loaded unit.
///
/// Evaluation is pure over the shift input and never panics; all runtime
/// faults surface as [`ExecutionError`] values.
#[derive(Clone, Debug)]
pub struct RuleProgram {
    ast: RuleAst,
}

impl RuleProgram {
    pub(crate) fn new(ast: RuleAst) -> Self {
        Self { ast }
    }

    pub fn ast(&self) -> &RuleAst {
        &self.ast
    }
}

impl PayrollClassifier for RuleProgram {
    fn calculate_payroll(
        &self,
        shift: &Shift,
    ) -> Result<ShiftClassificationResult, ExecutionError> {
        let mut frame = Frame {
            shift,
            bindings: HashMap::new(),
            allocations: Vec::new(),
        };
        frame.run_block(&self.ast.body)?;
        Ok(ShiftClassificationResult {
            employee_name: shift.employee_name.clone(),
            shift_start: shift.start,
            shift_end: shift.end,
            allocations: frame.allocations,
        })
    }

    fn rule_name(&self) -> &str {
        &self.ast.name
    }
}

struct Frame<'a> {
    shift: &'a Shift,
    bindings: HashMap<String, f64>,
    allocations: Vec<PayCodeAllocation>,
}

impl Frame<'_> {
    fn run_block(&mut self, stmts: &[Stmt]) -> Result<(), ExecutionError> {
        for stmt in stmts {
            match stmt {
                Stmt::Let { name, value, .. } => {
                    let v = self.eval(value)?;
                    self.bindings.insert(name.clone(), v);
                }
                Stmt::If { cond, then_branch, else_branch, .. } => {
                    if self.eval(cond)? != 0.0 {
                        self.run_block(then_branch)?;
                    } else {
                        self.run_block(else_branch)?;
                    }
                }
                Stmt::Allocate { pay_code, hours, description, .. } => {
                    let hours = self.eval(hours)?;
                    if hours < 0.0 {
                        return Err(ExecutionError::NegativeAllocation {
                            pay_code: pay_code.clone(),
                            hours,
                        });
                    }
                    let description = description
                        .clone()
                        .unwrap_or_else(|| format!("Hours allocated to {pay_code}"));
                    self.allocations
                        .push(PayCodeAllocation::new(pay_code.clone(), hours, description));
                }
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr) -> Result<f64, ExecutionError> {
        match expr {
            Expr::Number(n) => Ok(*n),
            Expr::Name(name) => self
                .bindings
                .get(name)
                .copied()
                .ok_or_else(|| ExecutionError::UndefinedName(name.clone())),
            Expr::Field(field) => Ok(match field {
                ShiftField::TotalHours => self.shift.duration_hours(),
                ShiftField::StartHour => self.shift.start_hour(),
                ShiftField::EndHour => self.shift.end_hour(),
                ShiftField::Weekday => self.shift.weekday(),
                ShiftField::IsWeekend => {
                    if self.shift.is_weekend() {
                        1.0
                    } else {
                        0.0
                    }
                }
            }),
            Expr::Binary { op, lhs, rhs } => {
                // Boolean operators short-circuit.
                match op {
                    BinaryOp::And => {
                        return Ok(if self.eval(lhs)? != 0.0 && self.eval(rhs)? != 0.0 {
                            1.0
                        } else {
                            0.0
                        });
                    }
                    BinaryOp::Or => {
                        return Ok(if self.eval(lhs)? != 0.0 || self.eval(rhs)? != 0.0 {
                            1.0
                        } else {
                            0.0
                        });
                    }
                    _ => {}
                }
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                Ok(match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => {
                        if r == 0.0 {
                            return Err(ExecutionError::DivisionByZero);
                        }
                        l / r
                    }
                    BinaryOp::Lt => bool_value(l < r),
                    BinaryOp::Gt => bool_value(l > r),
                    BinaryOp::Le => bool_value(l <= r),
                    BinaryOp::Ge => bool_value(l >= r),
                    BinaryOp::Eq => bool_value(l == r),
                    BinaryOp::Ne => bool_value(l != r),
                    BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
                })
            }
            Expr::Unary { op, operand } => {
                let v = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Neg => -v,
                    UnaryOp::Not => bool_value(v == 0.0),
                })
            }
            Expr::Call { builtin, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                Ok(match builtin {
                    Builtin::Min => values[0].min(values[1]),
                    Builtin::Max => values[0].max(values[1]),
                    Builtin::Abs => values[0].abs(),
                    Builtin::Floor => values[0].floor(),
                    Builtin::Ceil => values[0].ceil(),
                })
            }
        }
    }
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_body;
    use chrono::{TimeZone, Utc};
    use paycode_types::OrganizationId;

    fn program(src: &str) -> RuleProgram {
        RuleProgram::new(RuleAst {
            name: "rule_test_classifier".into(),
            body: parse_body(src).unwrap(),
        })
    }

    fn weekday_shift(start_hour: u32, end_hour: u32) -> Shift {
        // 2026-03-02 is a Monday.
        Shift::new(
            "Alice",
            Utc.with_ymd_and_hms(2026, 3, 2, start_hour, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, end_hour, 0, 0).unwrap(),
            OrganizationId::new("org-1"),
        )
    }

    #[test]
    fn overtime_split_on_ten_hour_shift() {
        let p = program(
            "let total = shift.total_hours;\n\
             if total > 8 {\n\
                 allocate \"Regular\" 8 \"Regular hours up to 8\";\n\
                 allocate \"Overtime\" total - 8 \"Overtime beyond 8 hours\";\n\
             } else {\n\
                 allocate \"Regular\" total;\n\
             }",
        );
        let result = p.calculate_payroll(&weekday_shift(8, 18)).unwrap();
        assert_eq!(result.allocations.len(), 2);
        assert_eq!(result.allocation("Regular").unwrap().hours, 8.0);
        assert_eq!(result.allocation("Overtime").unwrap().hours, 2.0);
        assert_eq!(result.total_hours(), 10.0);
    }

    #[test]
    fn else_branch_on_short_shift() {
        let p = program(
            "if shift.total_hours > 8 { allocate \"Overtime\" 1; } \
             else { allocate \"Regular\" shift.total_hours; }",
        );
        let result = p.calculate_payroll(&weekday_shift(9, 17)).unwrap();
        assert_eq!(result.allocations.len(), 1);
        assert_eq!(result.allocation("Regular").unwrap().hours, 8.0);
    }

    #[test]
    fn weekend_field_on_weekday_is_false() {
        let p = program(
            "if shift.is_weekend { allocate \"Weekend\" shift.total_hours; } \
             else { allocate \"Regular\" shift.total_hours; }",
        );
        let result = p.calculate_payroll(&weekday_shift(8, 16)).unwrap();
        assert!(result.allocation("Weekend").is_none());
        assert!(result.allocation("Regular").is_some());
    }

    #[test]
    fn division_by_zero_is_reported() {
        let p = program("allocate \"Regular\" shift.total_hours / 0;");
        let err = p.calculate_payroll(&weekday_shift(8, 16)).unwrap_err();
        assert_eq!(err, ExecutionError::DivisionByZero);
    }

    #[test]
    fn negative_allocation_is_reported() {
        let p = program("allocate \"Regular\" 2 - 5;");
        let err = p.calculate_payroll(&weekday_shift(8, 16)).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::NegativeAllocation { ref pay_code, hours }
                if pay_code == "Regular" && hours == -3.0
        ));
    }

    #[test]
    fn builtins_evaluate() {
        let p = program(
            "allocate \"Overtime\" max(0, shift.total_hours - 8);\n\
             allocate \"Regular\" min(8, shift.total_hours);",
        );
        let result = p.calculate_payroll(&weekday_shift(8, 19)).unwrap();
        assert_eq!(result.allocation("Overtime").unwrap().hours, 3.0);
        assert_eq!(result.allocation("Regular").unwrap().hours, 8.0);
    }

    #[test]
    fn missing_description_gets_a_default() {
        let p = program("allocate \"Regular\" shift.total_hours;");
        let result = p.calculate_payroll(&weekday_shift(8, 16)).unwrap();
        assert_eq!(
            result.allocations[0].description,
            "Hours allocated to Regular"
        );
    }

    #[test]
    fn boolean_operators_short_circuit_division() {
        // The rhs would divide by zero; Or must not evaluate it.
        let p = program(
            "if shift.total_hours > 0 || 1 / 0 > 0 { allocate \"Regular\" 1; }",
        );
        let result = p.calculate_payroll(&weekday_shift(8, 16)).unwrap();
        assert_eq!(result.allocations.len(), 1);
    }
}
