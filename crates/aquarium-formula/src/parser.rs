use std::mem::discriminant;

use crate::lexer::{Token, TokenKind};
use crate::{BinaryOp, Expr, FormulaError, Function, Reference, UnaryOp, suggest_name};

#[derive(Debug)]
pub(crate) struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    pub(crate) fn parse_formula(&mut self) -> Result<Expr, FormulaError> {
        if self.check_kind(&TokenKind::Eof) {
            return Err(FormulaError::new("empty formula"));
        }

        let expr = self.parse_conditional()?;
        if !self.check_kind(&TokenKind::Eof) {
            let token = self.peek();
            return Err(FormulaError::at("unexpected trailing input", token.column));
        }
        Ok(expr)
    }

    fn parse_conditional(&mut self) -> Result<Expr, FormulaError> {
        let condition = self.parse_comparison()?;
        if !self.match_kind(&TokenKind::Question) {
            return Ok(condition);
        }

        let then_branch = self.parse_conditional()?;
        self.expect_kind(TokenKind::Colon, "expected ':' in conditional")?;
        let else_branch = self.parse_conditional()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_comparison(&mut self) -> Result<Expr, FormulaError> {
        let mut expr = self.parse_add_sub()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                _ => return Ok(expr),
            };
            self.advance();
            let rhs = self.parse_add_sub()?;
            expr = binary(expr, op, rhs);
        }
    }

    fn parse_add_sub(&mut self) -> Result<Expr, FormulaError> {
        let mut expr = self.parse_mul_div()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(expr),
            };
            self.advance();
            let rhs = self.parse_mul_div()?;
            expr = binary(expr, op, rhs);
        }
    }

    fn parse_mul_div(&mut self) -> Result<Expr, FormulaError> {
        let mut expr = self.parse_unary()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(expr),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            expr = binary(expr, op, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        if self.match_kind(&TokenKind::Minus) {
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(expr),
            });
        }
        if self.match_kind(&TokenKind::Plus) {
            return self.parse_unary();
        }

        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.parse_primary()?;
        if self.match_kind(&TokenKind::Caret) {
            let exponent = self.parse_unary()?;
            return Ok(binary(base, BinaryOp::Pow, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Number(number) => {
                self.advance();
                Ok(Expr::Number(number.clone()))
            }
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                if self.match_kind(&TokenKind::LParen) {
                    self.parse_call(name, token.column)
                } else if self.match_kind(&TokenKind::Dot) {
                    let cell = self.consume_ident("expected cell name after '.'")?;
                    Ok(Expr::Reference(Reference {
                        sheet: Some(name),
                        name: cell,
                    }))
                } else {
                    Ok(Expr::Reference(Reference { sheet: None, name }))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_conditional()?;
                self.expect_kind(TokenKind::RParen, "expected ')' to close group")?;
                Ok(expr)
            }
            _ => Err(FormulaError::at("expected expression", token.column)),
        }
    }

    fn parse_call(&mut self, name: String, column: usize) -> Result<Expr, FormulaError> {
        let Some(function) = Function::lookup(&name) else {
            let mut message = format!("unknown function '{name}'");
            if let Some(suggestion) = suggest_name(&name, Function::names()) {
                message.push_str(&format!(". Did you mean '{suggestion}'?"));
            }
            return Err(FormulaError::at(message, column));
        };

        let mut args = Vec::new();
        if !self.check_kind(&TokenKind::RParen) {
            loop {
                args.push(self.parse_conditional()?);
                if !self.match_kind(&TokenKind::Semicolon) && !self.match_kind(&TokenKind::Comma)
                {
                    break;
                }
            }
        }
        self.expect_kind(TokenKind::RParen, "expected ')' after call arguments")?;

        function
            .check_arity(args.len())
            .map_err(|err| FormulaError::at(err.message().to_string(), column))?;
        Ok(Expr::Call { function, args })
    }

    fn consume_ident(&mut self, message: &str) -> Result<String, FormulaError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(FormulaError::at(message, token.column)),
        }
    }

    fn expect_kind(&mut self, expected: TokenKind, message: &str) -> Result<(), FormulaError> {
        if self.match_kind(&expected) {
            Ok(())
        } else {
            Err(FormulaError::at(message, self.peek().column))
        }
    }

    fn match_kind(&mut self, expected: &TokenKind) -> bool {
        if self.check_kind(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_kind(&self, expected: &TokenKind) -> bool {
        discriminant(self.peek_kind()) == discriminant(expected)
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }
}

fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
    Expr::Binary {
        lhs: Box::new(lhs),
        op,
        rhs: Box::new(rhs),
    }
}
