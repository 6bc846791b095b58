//! Pratt-style expression parsing (spec §4.2): ternary down through unary,
//! twelve precedence levels in total, plus calls and message sends.

use crate::ast::{BinOp, Expr, ExprKind};
use crate::token::TokenKind;
use super::numeric::parse_int_literal;
use super::Parser;

impl Parser {
    pub(super) fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Option<Expr> {
        let cond = self.parse_logor()?;
        if self.match_token(&TokenKind::Question) {
            let pos = cond.pos;
            let then_branch = self.parse_expr()?;
            self.expect(&TokenKind::Colon, "O3P105", "':'")?;
            let else_branch = self.parse_conditional()?;
            return Some(Expr::new(
                ExprKind::Conditional(Box::new(cond), Box::new(then_branch), Box::new(else_branch)),
                pos,
            ));
        }
        Some(cond)
    }

    fn parse_logor(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_logand()?;
        while self.check(&TokenKind::PipePipe) {
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_logand()?;
            lhs = Expr::new(ExprKind::Binary(BinOp::LogOr, Box::new(lhs), Box::new(rhs)), pos);
        }
        Some(lhs)
    }

    fn parse_logand(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_bitor()?;
        while self.check(&TokenKind::AmpAmp) {
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_bitor()?;
            lhs = Expr::new(ExprKind::Binary(BinOp::LogAnd, Box::new(lhs), Box::new(rhs)), pos);
        }
        Some(lhs)
    }

    fn parse_bitor(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_bitxor()?;
        while self.check(&TokenKind::Pipe) {
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_bitxor()?;
            lhs = Expr::new(ExprKind::Binary(BinOp::BitOr, Box::new(lhs), Box::new(rhs)), pos);
        }
        Some(lhs)
    }

    fn parse_bitxor(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_bitand()?;
        while self.check(&TokenKind::Caret) {
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_bitand()?;
            lhs = Expr::new(ExprKind::Binary(BinOp::BitXor, Box::new(lhs), Box::new(rhs)), pos);
        }
        Some(lhs)
    }

    fn parse_bitand(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.check(&TokenKind::Amp) {
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = Expr::new(ExprKind::Binary(BinOp::BitAnd, Box::new(lhs), Box::new(rhs)), pos);
        }
        Some(lhs)
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), pos);
        }
        Some(lhs)
    }

    fn parse_relational(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_shift()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::Ge,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_shift()?;
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), pos);
        }
        Some(lhs)
    }

    fn parse_shift(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::LtLt => BinOp::Shl,
                TokenKind::GtGt => BinOp::Shr,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), pos);
        }
        Some(lhs)
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), pos);
        }
        Some(lhs)
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), pos);
        }
        Some(lhs)
    }

    /// `!x`, `+x`, `-x`, `~x` desugar to a binary op against an implicit
    /// zero/false identity so the IR emitter only ever lowers
    /// `Binary`/`Conditional`.
    fn parse_unary(&mut self) -> Option<Expr> {
        let pos = self.pos();
        match self.peek_kind() {
            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_unary()?;
                Some(Expr::new(
                    ExprKind::Conditional(
                        Box::new(operand),
                        Box::new(Expr::new(ExprKind::Bool(false), pos)),
                        Box::new(Expr::new(ExprKind::Bool(true), pos)),
                    ),
                    pos,
                ))
            }
            TokenKind::Plus => {
                self.advance();
                let operand = self.parse_unary()?;
                Some(Expr::new(
                    ExprKind::Binary(BinOp::Add, Box::new(Expr::new(ExprKind::Number(0), pos)), Box::new(operand)),
                    pos,
                ))
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Some(Expr::new(
                    ExprKind::Binary(BinOp::Sub, Box::new(Expr::new(ExprKind::Number(0), pos)), Box::new(operand)),
                    pos,
                ))
            }
            TokenKind::Tilde => {
                self.advance();
                let operand = self.parse_unary()?;
                Some(Expr::new(
                    ExprKind::Binary(BinOp::BitXor, Box::new(operand), Box::new(Expr::new(ExprKind::Number(-1), pos))),
                    pos,
                ))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let pos = self.pos();
        match self.peek_kind().clone() {
            TokenKind::IntLiteral => {
                let text = self.advance().text;
                match parse_int_literal(&text) {
                    Ok(value) => Some(Expr::new(ExprKind::Number(value), pos)),
                    Err(raw) => {
                        self.error(pos, "O3P103", format!("malformed integer literal '{}'", raw));
                        None
                    }
                }
            }
            TokenKind::KwYES => { self.advance(); Some(Expr::new(ExprKind::Bool(true), pos)) }
            TokenKind::KwNO => { self.advance(); Some(Expr::new(ExprKind::Bool(false), pos)) }
            TokenKind::KwNULL | TokenKind::KwNil => { self.advance(); Some(Expr::new(ExprKind::Nil, pos)) }
            TokenKind::Identifier => {
                let name = self.advance().text;
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.match_token(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen, "O3P109", "')'")?;
                    Some(Expr::new(ExprKind::Call(name, args), pos))
                } else {
                    Some(Expr::new(ExprKind::Ident(name), pos))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "O3P109", "')'")?;
                Some(inner)
            }
            TokenKind::LBracket => self.parse_message_send(),
            _ => {
                self.error(pos, "O3P102", format!("unexpected token in expression: {}", self.peek_kind()));
                None
            }
        }
    }

    /// `[ receiver selector [: arg]* ]` — unary selector has no colon, a
    /// keyword selector concatenates `key:` parts in source order.
    pub(super) fn parse_message_send(&mut self) -> Option<Expr> {
        let pos = self.pos();
        self.advance(); // `[`
        let receiver = self.parse_unary()?;
        if !self.check(&TokenKind::Identifier) {
            self.error(self.pos(), "O3P112", format!("expected selector, found {}", self.peek_kind()));
            return None;
        }
        let head = self.advance().text;
        let mut selector = head.clone();
        let mut args = Vec::new();
        if self.check(&TokenKind::Colon) {
            self.advance();
            args.push(self.parse_expr()?);
            selector = format!("{}:", head);
            while self.check(&TokenKind::Identifier) && matches!(self.peek_at_kind(1), TokenKind::Colon) {
                let key = self.advance().text;
                self.advance(); // `:`
                args.push(self.parse_expr()?);
                selector.push_str(&key);
                selector.push(':');
            }
        }
        self.expect(&TokenKind::RBracket, "O3P113", "']'")?;
        Some(Expr::new(ExprKind::MessageSend(Box::new(receiver), selector, args), pos))
    }
}
