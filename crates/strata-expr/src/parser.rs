use crate::ast::{BinOp, Expr, Func};
use crate::error::ExprError;
use crate::lexer::{Lexer, Token, TokenWithPos};

// ── Parser ────────────────────────────────────────────────────────────────

/// Recursive-descent parser over a token stream.
///
/// Grammar (lowest to highest precedence):
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/' | '%') unary)*
/// unary   := ('-' | '+') unary | primary
/// primary := NUMBER | IDENT | IDENT '(' expr (',' expr)* ')' | '(' expr ')'
/// ```
pub struct Parser {
    tokens: Vec<TokenWithPos>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<TokenWithPos>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current_col(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.col)
            .unwrap_or(1)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self
            .tokens
            .get(self.pos)
            .map(|t| t.token.clone())
            .unwrap_or(Token::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, msg: impl Into<String>) -> ExprError {
        ExprError::new(msg, self.current_col())
    }

    fn expect_token(&mut self, expected: &Token) -> Result<(), ExprError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {:?}, got {:?}", expected, self.peek())))
        }
    }

    /// Parses a complete expression and requires the input to be fully consumed.
    pub fn parse_complete(&mut self) -> Result<Expr, ExprError> {
        let expr = self.parse_expr()?;
        if self.peek() != &Token::Eof {
            return Err(self.err(format!("unexpected {:?} after expression", self.peek())));
        }
        Ok(expr)
    }

    // ── Binary levels ─────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            Token::Minus => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Token::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    // ── Primary ───────────────────────────────────────────────────────────

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let col = self.current_col();
        match self.advance() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Ident(name) => {
                if self.peek() == &Token::LParen {
                    self.parse_call(name, col)
                } else {
                    Ok(Expr::Var { name, col })
                }
            }
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect_token(&Token::RParen)?;
                Ok(inner)
            }
            tok => Err(ExprError::new(format!("expected a value, got {:?}", tok), col)),
        }
    }

    fn parse_call(&mut self, name: String, col: usize) -> Result<Expr, ExprError> {
        let func = Func::from_name(&name)
            .ok_or_else(|| ExprError::new(format!("unknown function `{}`", name), col))?;
        self.advance(); // consume `(`

        let mut args = Vec::new();
        if self.peek() != &Token::RParen {
            loop {
                args.push(self.parse_expr()?);
                if self.peek() == &Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_token(&Token::RParen)?;

        let arity_ok = match func.arity() {
            Some(n) => args.len() == n,
            None => !args.is_empty(),
        };
        if !arity_ok {
            return Err(ExprError::new(
                format!("`{}` called with {} argument(s)", name, args.len()),
                col,
            ));
        }
        Ok(Expr::Call { func, args })
    }
}

// ── Public parse entry point ──────────────────────────────────────────────

/// Parse an attribute expression such as `"x * 2 + (ex + 1) / 2"`.
pub fn parse_expr(src: &str) -> Result<Expr, ExprError> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(tokens).parse_complete()
}
