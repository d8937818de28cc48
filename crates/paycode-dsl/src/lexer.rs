//! Tokenizer for the rule logic language.

use crate::errors::{Diagnostic, DiagnosticCategory};

/// Kind of a single token.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    // Punctuation.
    LBrace,
    RBrace,
    LParen,
    RParen,
    Semicolon,
    Comma,
    Dot,
    Assign,
    // Operators.
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Bang,
}

/// A token with its 1-based source line.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Tokenizer over rule logic text.
///
/// `#` starts a comment running to end of line. Malformed input never
/// panics; it is reported as a `Syntax` diagnostic.
pub struct Lexer;

impl Lexer {
    /// Tokenize the input, or report the first lexical fault.
    pub fn tokenize(input: &str) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        let mut chars = input.chars().peekable();
        let mut line = 1usize;

        while let Some(ch) = chars.peek().copied() {
            if ch == '\n' {
                line += 1;
                chars.next();
                continue;
            }
            if ch.is_whitespace() {
                chars.next();
                continue;
            }

            // Comment to end of line.
            if ch == '#' {
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
                continue;
            }

            if ch == '"' {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    if c == '\n' {
                        line += 1;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(Diagnostic::new(
                        "P002",
                        "unterminated string literal",
                        line,
                        DiagnosticCategory::Syntax,
                    ));
                }
                tokens.push(Token { kind: TokenKind::Str(value), line });
                continue;
            }

            if ch.is_ascii_digit() {
                let mut value = String::new();
                while let Some(c) = chars.peek().copied() {
                    if c.is_ascii_digit() || c == '.' {
                        value.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number: f64 = value.parse().map_err(|_| {
                    Diagnostic::new(
                        "P003",
                        format!("invalid number '{value}'"),
                        line,
                        DiagnosticCategory::Syntax,
                    )
                })?;
                tokens.push(Token { kind: TokenKind::Number(number), line });
                continue;
            }

            if ch.is_ascii_alphabetic() || ch == '_' {
                let mut value = String::new();
                while let Some(c) = chars.peek().copied() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        value.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token { kind: TokenKind::Ident(value), line });
                continue;
            }

            chars.next();
            let kind = match ch {
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                ';' => TokenKind::Semicolon,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '=' => {
                    if chars.peek() == Some(&'=') {
                        chars.next();
                        TokenKind::EqEq
                    } else {
                        TokenKind::Assign
                    }
                }
                '<' => {
                    if chars.peek() == Some(&'=') {
                        chars.next();
                        TokenKind::Le
                    } else {
                        TokenKind::Lt
                    }
                }
                '>' => {
                    if chars.peek() == Some(&'=') {
                        chars.next();
                        TokenKind::Ge
                    } else {
                        TokenKind::Gt
                    }
                }
                '!' => {
                    if chars.peek() == Some(&'=') {
                        chars.next();
                        TokenKind::NotEq
                    } else {
                        TokenKind::Bang
                    }
                }
                '&' => {
                    if chars.peek() == Some(&'&') {
                        chars.next();
                        TokenKind::AndAnd
                    } else {
                        return Err(Diagnostic::new(
                            "P004",
                            "single '&' is not an operator, use '&&'",
                            line,
                            DiagnosticCategory::Syntax,
                        ));
                    }
                }
                '|' => {
                    if chars.peek() == Some(&'|') {
                        chars.next();
                        TokenKind::OrOr
                    } else {
                        return Err(Diagnostic::new(
                            "P005",
                            "single '|' is not an operator, use '||'",
                            line,
                            DiagnosticCategory::Syntax,
                        ));
                    }
                }
                other => {
                    return Err(Diagnostic::new(
                        "P001",
                        format!("unexpected character '{other}'"),
                        line,
                        DiagnosticCategory::Syntax,
                    ));
                }
            };
            tokens.push(Token { kind, line });
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_simple_statement() {
        let tokens = Lexer::tokenize("let total = shift.total_hours;").unwrap();
        assert_eq!(tokens.len(), 7);
        assert_eq!(tokens[0].kind, TokenKind::Ident("let".into()));
        assert_eq!(tokens[2].kind, TokenKind::Assign);
        assert_eq!(tokens[4].kind, TokenKind::Dot);
        assert_eq!(tokens[6].kind, TokenKind::Semicolon);
    }

    #[test]
    fn tokenizes_operators() {
        let tokens = Lexer::tokenize("a >= 8 && b != 2 || !c").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenKind::Ge));
        assert!(kinds.contains(&TokenKind::AndAnd));
        assert!(kinds.contains(&TokenKind::NotEq));
        assert!(kinds.contains(&TokenKind::OrOr));
        assert!(kinds.contains(&TokenKind::Bang));
    }

    #[test]
    fn tracks_line_numbers() {
        let tokens = Lexer::tokenize("let a = 1;\nlet b = 2;").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens.last().unwrap().line, 2);
    }

    #[test]
    fn skips_comments() {
        let tokens = Lexer::tokenize("# header comment\nlet a = 1; # trailing\n").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident("let".into()));
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn reports_unterminated_string() {
        let err = Lexer::tokenize("allocate \"Regular 8;").unwrap_err();
        assert_eq!(err.code, "P002");
        assert_eq!(err.category, DiagnosticCategory::Syntax);
    }

    #[test]
    fn reports_unexpected_character() {
        let err = Lexer::tokenize("let a = 1 @ 2;").unwrap_err();
        assert_eq!(err.code, "P001");
    }

    #[test]
    fn reports_single_ampersand() {
        let err = Lexer::tokenize("a & b").unwrap_err();
        assert_eq!(err.code, "P004");
    }

    #[test]
    fn parses_decimal_numbers() {
        let tokens = Lexer::tokenize("1.5").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number(1.5));
    }
}
