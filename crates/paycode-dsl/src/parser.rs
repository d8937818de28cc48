//! Recursive-descent parser for the rule logic language.

use crate::ast::{BinaryOp, Builtin, Expr, ShiftField, Stmt, UnaryOp};
use crate::errors::{Diagnostic, DiagnosticCategory};
use crate::lexer::{Lexer, Token, TokenKind};

/// Parse a statement body (the text the generation capability emits,
/// without any wrapper shell) into a list of statements.
pub fn parse_body(input: &str) -> Result<Vec<Stmt>, Diagnostic> {
    let tokens = Lexer::tokenize(input)?;
    let mut parser = Parser::new(tokens);
    parser.parse_statements_until_eof()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse_statements_until_eof(&mut self) -> Result<Vec<Stmt>, Diagnostic> {
        let mut stmts = Vec::new();
        while !self.eof() {
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    // ── Statements ───────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let line = self.current_line();
        match self.peek_kind() {
            Some(TokenKind::Ident(kw)) if kw == "let" => self.parse_let(),
            Some(TokenKind::Ident(kw)) if kw == "if" => self.parse_if(),
            Some(TokenKind::Ident(kw)) if kw == "allocate" => self.parse_allocate(),
            Some(other) => Err(Diagnostic::new(
                "P010",
                format!("expected 'let', 'if' or 'allocate', found {other:?}"),
                line,
                DiagnosticCategory::Syntax,
            )),
            None => Err(self.unexpected_eof("statement")),
        }
    }

    fn parse_let(&mut self) -> Result<Stmt, Diagnostic> {
        let line = self.current_line();
        self.advance(); // let
        let name = self.expect_ident("binding name")?;
        self.expect(TokenKind::Assign, "'='")?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Let { name, value, line })
    }

    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        let line = self.current_line();
        self.advance(); // if
        let cond = self.parse_expr()?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.peek_is_ident("else") {
            self.advance();
            // `else if` chains nest as a single-statement else block.
            if self.peek_is_ident("if") {
                vec![self.parse_if()?]
            } else {
                self.parse_block()?
            }
        } else {
            Vec::new()
        };
        Ok(Stmt::If { cond, then_branch, else_branch, line })
    }

    fn parse_allocate(&mut self) -> Result<Stmt, Diagnostic> {
        let line = self.current_line();
        self.advance(); // allocate
        let pay_code = self.expect_string("pay code name")?;
        let hours = self.parse_expr()?;
        let description = match self.peek_kind() {
            Some(TokenKind::Str(_)) => Some(self.expect_string("description")?),
            _ => None,
        };
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Allocate { pay_code, hours, description, line })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, Diagnostic> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::RBrace) => {
                    self.advance();
                    return Ok(stmts);
                }
                Some(_) => stmts.push(self.parse_statement()?),
                None => return Err(self.unexpected_eof("'}'")),
            }
        }
    }

    // ── Expressions, ascending precedence ────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, Diagnostic> {
        let mut lhs = self.parse_and()?;
        while self.peek_kind() == Some(&TokenKind::OrOr) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, Diagnostic> {
        let mut lhs = self.parse_comparison()?;
        while self.peek_kind() == Some(&TokenKind::AndAnd) {
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Diagnostic> {
        let lhs = self.parse_additive()?;
        let op = match self.peek_kind() {
            Some(TokenKind::Lt) => BinaryOp::Lt,
            Some(TokenKind::Gt) => BinaryOp::Gt,
            Some(TokenKind::Le) => BinaryOp::Le,
            Some(TokenKind::Ge) => BinaryOp::Ge,
            Some(TokenKind::EqEq) => BinaryOp::Eq,
            Some(TokenKind::NotEq) => BinaryOp::Ne,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_additive()?;
        Ok(binary(op, lhs, rhs))
    }

    fn parse_additive(&mut self) -> Result<Expr, Diagnostic> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Diagnostic> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary { op: UnaryOp::Neg, operand: Box::new(operand) })
            }
            Some(TokenKind::Bang) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand) })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        let line = self.current_line();
        match self.peek_kind().cloned() {
            Some(TokenKind::Number(n)) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Some(TokenKind::LParen) => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            Some(TokenKind::Ident(name)) if name == "shift" => {
                self.advance();
                self.expect(TokenKind::Dot, "'.'")?;
                let field_name = self.expect_ident("shift field name")?;
                match ShiftField::from_name(&field_name) {
                    Some(field) => Ok(Expr::Field(field)),
                    None => Err(Diagnostic::new(
                        "P011",
                        format!(
                            "unknown shift field '{field_name}', expected one of total_hours, \
                             start_hour, end_hour, weekday, is_weekend"
                        ),
                        line,
                        DiagnosticCategory::NameResolution,
                    )),
                }
            }
            Some(TokenKind::Ident(name)) => {
                self.advance();
                if self.peek_kind() == Some(&TokenKind::LParen) {
                    let builtin = Builtin::from_name(&name).ok_or_else(|| {
                        Diagnostic::new(
                            "P012",
                            format!(
                                "unknown function '{name}', expected one of min, max, abs, \
                                 floor, ceil"
                            ),
                            line,
                            DiagnosticCategory::NameResolution,
                        )
                    })?;
                    let args = self.parse_call_args()?;
                    if args.len() != builtin.arity() {
                        return Err(Diagnostic::new(
                            "P013",
                            format!(
                                "'{name}' expects {} argument(s), found {}",
                                builtin.arity(),
                                args.len()
                            ),
                            line,
                            DiagnosticCategory::Semantic,
                        ));
                    }
                    Ok(Expr::Call { builtin, args })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Some(other) => Err(Diagnostic::new(
                "P014",
                format!("expected an expression, found {other:?}"),
                line,
                DiagnosticCategory::Syntax,
            )),
            None => Err(self.unexpected_eof("expression")),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, Diagnostic> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.peek_kind() == Some(&TokenKind::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.peek_kind() {
                Some(TokenKind::Comma) => {
                    self.advance();
                }
                Some(TokenKind::RParen) => {
                    self.advance();
                    return Ok(args);
                }
                Some(other) => {
                    let line = self.current_line();
                    return Err(Diagnostic::new(
                        "P015",
                        format!("expected ',' or ')', found {other:?}"),
                        line,
                        DiagnosticCategory::Syntax,
                    ));
                }
                None => return Err(self.unexpected_eof("')'")),
            }
        }
    }

    // ── Token helpers ────────────────────────────────────────────────

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_is_ident(&self, name: &str) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Ident(id)) if id == name)
    }

    fn current_line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), Diagnostic> {
        match self.peek_kind() {
            Some(found) if *found == kind => {
                self.advance();
                Ok(())
            }
            Some(found) => Err(Diagnostic::new(
                "P016",
                format!("expected {what}, found {found:?}"),
                self.current_line(),
                DiagnosticCategory::Syntax,
            )),
            None => Err(self.unexpected_eof(what)),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, Diagnostic> {
        match self.peek_kind().cloned() {
            Some(TokenKind::Ident(name)) => {
                self.advance();
                Ok(name)
            }
            Some(found) => Err(Diagnostic::new(
                "P016",
                format!("expected {what}, found {found:?}"),
                self.current_line(),
                DiagnosticCategory::Syntax,
            )),
            None => Err(self.unexpected_eof(what)),
        }
    }

    fn expect_string(&mut self, what: &str) -> Result<String, Diagnostic> {
        match self.peek_kind().cloned() {
            Some(TokenKind::Str(value)) => {
                self.advance();
                Ok(value)
            }
            Some(found) => Err(Diagnostic::new(
                "P016",
                format!("expected {what} string, found {found:?}"),
                self.current_line(),
                DiagnosticCategory::Syntax,
            )),
            None => Err(self.unexpected_eof(what)),
        }
    }

    fn unexpected_eof(&self, what: &str) -> Diagnostic {
        Diagnostic::new(
            "P017",
            format!("unexpected end of input, expected {what}"),
            self.tokens.last().map_or(1, |t| t.line),
            DiagnosticCategory::Syntax,
        )
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_let_and_allocate() {
        let stmts = parse_body(
            "let total = shift.total_hours;\nallocate \"Regular\" total \"all regular\";",
        )
        .unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[0], Stmt::Let { name, .. } if name == "total"));
        assert!(matches!(
            &stmts[1],
            Stmt::Allocate { pay_code, description: Some(d), .. }
                if pay_code == "Regular" && d == "all regular"
        ));
    }

    #[test]
    fn parses_if_else() {
        let stmts = parse_body(
            "if shift.total_hours > 8 { allocate \"Overtime\" shift.total_hours - 8; } \
             else { allocate \"Regular\" shift.total_hours; }",
        )
        .unwrap();
        match &stmts[0] {
            Stmt::If { then_branch, else_branch, .. } => {
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch.len(), 1);
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn parses_else_if_chain() {
        let stmts = parse_body(
            "if shift.weekday == 6 { allocate \"Sunday\" shift.total_hours; } \
             else if shift.weekday == 5 { allocate \"Saturday\" shift.total_hours; } \
             else { allocate \"Regular\" shift.total_hours; }",
        )
        .unwrap();
        match &stmts[0] {
            Stmt::If { else_branch, .. } => {
                assert_eq!(else_branch.len(), 1);
                assert!(matches!(else_branch[0], Stmt::If { .. }));
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn precedence_mul_over_add() {
        let stmts = parse_body("let x = 1 + 2 * 3;").unwrap();
        match &stmts[0] {
            Stmt::Let { value: Expr::Binary { op: BinaryOp::Add, rhs, .. }, .. } => {
                assert!(matches!(**rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("expected add at top, got {other:?}"),
        }
    }

    #[test]
    fn parses_builtin_call() {
        let stmts = parse_body("let x = max(0, shift.total_hours - 8);").unwrap();
        match &stmts[0] {
            Stmt::Let { value: Expr::Call { builtin, args }, .. } => {
                assert_eq!(*builtin, Builtin::Max);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_shift_field() {
        let err = parse_body("let x = shift.lunch_minutes;").unwrap_err();
        assert_eq!(err.code, "P011");
        assert_eq!(err.category, DiagnosticCategory::NameResolution);
    }

    #[test]
    fn rejects_unknown_function() {
        let err = parse_body("let x = clamp(1, 2);").unwrap_err();
        assert_eq!(err.code, "P012");
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = parse_body("let x = min(1);").unwrap_err();
        assert_eq!(err.code, "P013");
        assert_eq!(err.category, DiagnosticCategory::Semantic);
    }

    #[test]
    fn rejects_missing_semicolon() {
        let err = parse_body("let x = 1").unwrap_err();
        assert_eq!(err.code, "P017");
    }

    #[test]
    fn rejects_garbage_statement() {
        let err = parse_body("42;").unwrap_err();
        assert_eq!(err.code, "P010");
    }

    #[test]
    fn error_carries_line_number() {
        let err = parse_body("let a = 1;\nlet b = ;\n").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
