use crate::error::ExprError;

// ── Token ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    /// Argument or function name. Dotted paths such as `Math.floor` lex as one identifier.
    Ident(String),
    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    // Punctuation
    LParen,
    RParen,
    Comma,
    // Sentinel
    Eof,
}

/// A token together with the 1-based column it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithPos {
    pub token: Token,
    pub col: usize,
}

// ── Lexer ─────────────────────────────────────────────────────────────────

pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenWithPos>, ExprError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let col = self.col();
            let token = self.next_token()?;
            let eof = token == Token::Eof;
            tokens.push(TokenWithPos { token, col });
            if eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn col(&self) -> usize {
        self.src[..self.pos].chars().count() + 1
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn next_token(&mut self) -> Result<Token, ExprError> {
        let ch = match self.peek() {
            None => return Ok(Token::Eof),
            Some(c) => c,
        };

        match ch {
            '+' => { self.advance(); Ok(Token::Plus) }
            '-' => { self.advance(); Ok(Token::Minus) }
            '*' => { self.advance(); Ok(Token::Star) }
            '/' => { self.advance(); Ok(Token::Slash) }
            '%' => { self.advance(); Ok(Token::Percent) }
            '(' => { self.advance(); Ok(Token::LParen) }
            ')' => { self.advance(); Ok(Token::RParen) }
            ',' => { self.advance(); Ok(Token::Comma) }
            c if c.is_ascii_digit() || c == '.' => self.lex_number(),
            c if c.is_alphabetic() || c == '_' => self.lex_ident(),
            other => Err(ExprError::new(
                format!("unexpected character {:?}", other),
                self.col(),
            )),
        }
    }

    fn lex_number(&mut self) -> Result<Token, ExprError> {
        let start = self.pos;
        let col = self.col();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        // Optional exponent: `1e3`, `2.5E-2`.
        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        let s = &self.src[start..self.pos];
        s.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| ExprError::new(format!("invalid number {:?}", s), col))
    }

    fn lex_ident(&mut self) -> Result<Token, ExprError> {
        let start = self.pos;
        loop {
            while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                self.advance();
            }
            // `a.b` continues the identifier only when a name character follows the dot.
            let rest = &self.src[self.pos..];
            let mut chars = rest.chars();
            if chars.next() == Some('.')
                && matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
            {
                self.advance();
                continue;
            }
            break;
        }
        Ok(Token::Ident(self.src[start..self.pos].to_string()))
    }
}
