use crate::{FormulaError, NumberLiteral, Unit};

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(NumberLiteral),
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Question,
    Colon,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    Eof,
}

#[derive(Debug)]
pub(crate) struct Lexer<'a> {
    source: &'a str,
    index: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            index: 0,
            column: 1,
        }
    }

    pub(crate) fn tokenize(mut self) -> Result<Vec<Token>, FormulaError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance_char();
                continue;
            }

            let column = self.column;
            let kind = match ch {
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                ',' => self.single(TokenKind::Comma),
                ';' => self.single(TokenKind::Semicolon),
                '+' => self.single(TokenKind::Plus),
                '-' => self.single(TokenKind::Minus),
                '*' => self.single(TokenKind::Star),
                '/' => self.single(TokenKind::Slash),
                '%' => self.single(TokenKind::Percent),
                '^' => self.single(TokenKind::Caret),
                '?' => self.single(TokenKind::Question),
                ':' => self.single(TokenKind::Colon),
                '<' if self.starts_with("<=") => self.double(TokenKind::Le),
                '<' => self.single(TokenKind::Lt),
                '>' if self.starts_with(">=") => self.double(TokenKind::Ge),
                '>' => self.single(TokenKind::Gt),
                '=' if self.starts_with("==") => self.double(TokenKind::EqEq),
                '!' if self.starts_with("!=") => self.double(TokenKind::NotEq),
                '=' => {
                    return Err(FormulaError::at(
                        "unexpected '='; use '==' for comparison",
                        column,
                    ));
                }
                c if is_ident_start(c) => TokenKind::Ident(self.lex_identifier()),
                c if c.is_ascii_digit()
                    || (c == '.'
                        && self
                            .peek_second_char()
                            .map(|next| next.is_ascii_digit())
                            .unwrap_or(false)) =>
                {
                    TokenKind::Number(self.lex_number()?)
                }
                '.' => self.single(TokenKind::Dot),
                _ => {
                    return Err(FormulaError::at(
                        format!("unexpected character '{ch}'"),
                        column,
                    ));
                }
            };
            tokens.push(Token { kind, column });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            column: self.column,
        });

        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance_char();
        kind
    }

    fn double(&mut self, kind: TokenKind) -> TokenKind {
        self.advance_char();
        self.advance_char();
        kind
    }

    fn lex_identifier(&mut self) -> String {
        let start = self.index;
        self.advance_char();
        while self.peek_char().map(is_ident_continue).unwrap_or(false) {
            self.advance_char();
        }
        self.source[start..self.index].to_string()
    }

    fn lex_number(&mut self) -> Result<NumberLiteral, FormulaError> {
        let column = self.column;
        let start = self.index;

        let mut seen_digit = false;
        let mut seen_dot = false;

        if self.peek_char() == Some('.') {
            seen_dot = true;
            self.advance_char();
        }

        while self.peek_is_digit() {
            seen_digit = true;
            self.advance_char();
        }

        if self.peek_char() == Some('.') && !seen_dot {
            self.advance_char();
            while self.peek_is_digit() {
                seen_digit = true;
                self.advance_char();
            }
        }

        if let Some(exp) = self.peek_char()
            && (exp == 'e' || exp == 'E')
            && self.exponent_follows()
        {
            self.advance_char();
            if let Some(sign) = self.peek_char()
                && (sign == '+' || sign == '-')
            {
                self.advance_char();
            }
            while self.peek_is_digit() {
                self.advance_char();
            }
        }

        if !seen_digit {
            return Err(FormulaError::at("invalid number literal", column));
        }

        let text = &self.source[start..self.index];
        let value = text
            .parse::<f64>()
            .map_err(|err| FormulaError::at(format!("invalid number literal: {err}"), column))?;

        let unit = self.lex_unit();
        Ok(NumberLiteral { value, unit })
    }

    /// Reads a unit suffix, either glued to the number (`3mm`) or after spaces (`3 mm`).
    fn lex_unit(&mut self) -> Unit {
        let rest = &self.source[self.index..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        let skipped = rest.len() - trimmed.len();
        let word_len = trimmed
            .find(|ch: char| !is_ident_continue(ch))
            .unwrap_or(trimmed.len());

        let Some(unit) = Unit::from_suffix(&trimmed[..word_len]) else {
            return Unit::None;
        };
        // `2 m.x` would be a qualified reference, not a unit.
        if trimmed[word_len..].starts_with('.') {
            return Unit::None;
        }
        for _ in 0..skipped + word_len {
            self.advance_char();
        }
        unit
    }

    fn exponent_follows(&self) -> bool {
        let mut chars = self.source[self.index..].chars().skip(1);
        match chars.next() {
            Some('+') | Some('-') => chars.next().is_some_and(|ch| ch.is_ascii_digit()),
            Some(ch) => ch.is_ascii_digit(),
            None => false,
        }
    }

    fn starts_with(&self, text: &str) -> bool {
        self.source[self.index..].starts_with(text)
    }

    fn peek_is_digit(&self) -> bool {
        self.peek_char()
            .map(|ch| ch.is_ascii_digit())
            .unwrap_or(false)
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.index..].chars().next()
    }

    fn peek_second_char(&self) -> Option<char> {
        let mut chars = self.source[self.index..].chars();
        chars.next()?;
        chars.next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.index += ch.len_utf8();
        self.column += 1;
        Some(ch)
    }
}

pub(crate) fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}

pub(crate) fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}
