//! Statement grammar (spec §4.2): C-shaped control flow plus
//! `@autoreleasepool` as a tagged block.

use crate::ast::{AssignOp, ForClause, IncDecOp, Stmt, StmtKind, SwitchCase};
use crate::token::TokenKind;
use super::Parser;

impl Parser {
    pub(super) fn parse_stmt(&mut self) -> Option<Stmt> {
        let pos = self.pos();
        match self.peek_kind().clone() {
            TokenKind::Semicolon => {
                self.advance();
                Some(Stmt::new(StmtKind::Empty, pos))
            }
            TokenKind::LBrace => {
                let body = self.parse_block();
                Some(Stmt::new(StmtKind::Block(body, None), pos))
            }
            TokenKind::KwAtAutoreleasepool => {
                self.advance();
                if !self.check(&TokenKind::LBrace) {
                    self.error(self.pos(), "O3P110", format!("expected '{{' after '@autoreleasepool', found {}", self.peek_kind()));
                    return None;
                }
                let tag = self.next_autoreleasepool_tag();
                let body = self.parse_block();
                Some(Stmt::new(StmtKind::Block(body, Some(tag)), pos))
            }
            TokenKind::KwLet => self.parse_let_stmt(),
            TokenKind::KwReturn => self.parse_return_stmt(),
            TokenKind::KwIf => self.parse_if_stmt(),
            TokenKind::KwWhile => self.parse_while_stmt(),
            TokenKind::KwDo => self.parse_do_while_stmt(),
            TokenKind::KwFor => self.parse_for_stmt(),
            TokenKind::KwSwitch => self.parse_switch_stmt(),
            TokenKind::KwBreak => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "O3P104", "';'");
                Some(Stmt::new(StmtKind::Break, pos))
            }
            TokenKind::KwContinue => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "O3P104", "';'");
                Some(Stmt::new(StmtKind::Continue, pos))
            }
            TokenKind::Identifier => self.parse_ident_led_stmt(),
            _ => {
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::Semicolon, "O3P104", "';'");
                Some(Stmt::new(StmtKind::ExprStmt(expr), pos))
            }
        }
    }

    fn parse_let_stmt(&mut self) -> Option<Stmt> {
        let pos = self.pos();
        self.advance(); // `let`
        let name = self.expect_identifier("O3P101")?;
        self.expect(&TokenKind::Eq, "O3P102", "'='")?;
        let value = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon, "O3P104", "';'");
        Some(Stmt::new(StmtKind::Let(name, value), pos))
    }

    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let pos = self.pos();
        self.advance(); // `return`
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semicolon, "O3P104", "';'");
        Some(Stmt::new(StmtKind::Return(value), pos))
    }

    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let pos = self.pos();
        self.advance(); // `if`
        self.expect(&TokenKind::LParen, "O3P106", "'('")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "O3P109", "')'")?;
        let then_branch = self.parse_stmt()?;
        let else_branch = if self.match_token(&TokenKind::KwElse) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Some(Stmt::new(StmtKind::If(cond, Box::new(then_branch), else_branch), pos))
    }

    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let pos = self.pos();
        self.advance(); // `while`
        self.expect(&TokenKind::LParen, "O3P106", "'('")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "O3P109", "')'")?;
        let body = self.parse_stmt()?;
        Some(Stmt::new(StmtKind::While(cond, Box::new(body)), pos))
    }

    fn parse_do_while_stmt(&mut self) -> Option<Stmt> {
        let pos = self.pos();
        self.advance(); // `do`
        let body = self.parse_stmt()?;
        self.expect(&TokenKind::KwWhile, "O3P100", "'while'")?;
        self.expect(&TokenKind::LParen, "O3P106", "'('")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "O3P109", "')'")?;
        self.expect(&TokenKind::Semicolon, "O3P104", "';'");
        Some(Stmt::new(StmtKind::DoWhile(Box::new(body), cond), pos))
    }

    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let pos = self.pos();
        self.advance(); // `for`
        self.expect(&TokenKind::LParen, "O3P106", "'('")?;
        let init = self.parse_for_clause()?;
        self.expect(&TokenKind::Semicolon, "O3P104", "';'");
        let cond = if self.check(&TokenKind::Semicolon) { None } else { Some(self.parse_expr()?) };
        self.expect(&TokenKind::Semicolon, "O3P104", "';'");
        let step = self.parse_for_clause()?;
        self.expect(&TokenKind::RParen, "O3P109", "')'")?;
        let body = self.parse_stmt()?;
        Some(Stmt::new(StmtKind::For(init, cond, Some(step), Box::new(body)), pos))
    }

    fn parse_for_clause(&mut self) -> Option<ForClause> {
        if self.check(&TokenKind::Semicolon) || self.check(&TokenKind::RParen) {
            return Some(ForClause::None);
        }
        if self.check(&TokenKind::KwLet) {
            self.advance();
            let name = self.expect_identifier("O3P101")?;
            self.expect(&TokenKind::Eq, "O3P102", "'='")?;
            let value = self.parse_expr()?;
            return Some(ForClause::Let(name, value));
        }
        if self.check(&TokenKind::Identifier) && is_assign_op(self.peek_at_kind(1)) {
            let name = self.advance().text;
            let op = assign_op_from(self.peek_kind().clone());
            self.advance();
            let value = if matches!(op, AssignOp::Assign) || !self.check_clause_terminator() {
                Some(self.parse_expr()?)
            } else {
                None
            };
            return Some(ForClause::Assign(name, op, value));
        }
        if self.check(&TokenKind::Identifier)
            && matches!(self.peek_at_kind(1), TokenKind::PlusPlus | TokenKind::MinusMinus)
        {
            let name = self.advance().text;
            let op = if self.check(&TokenKind::PlusPlus) { IncDecOp::Inc } else { IncDecOp::Dec };
            self.advance();
            return Some(ForClause::IncDec(name, op));
        }
        Some(ForClause::Expr(self.parse_expr()?))
    }

    fn check_clause_terminator(&self) -> bool {
        self.check(&TokenKind::Semicolon) || self.check(&TokenKind::RParen)
    }

    fn parse_switch_stmt(&mut self) -> Option<Stmt> {
        let pos = self.pos();
        self.advance(); // `switch`
        self.expect(&TokenKind::LParen, "O3P106", "'('")?;
        let subject = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "O3P109", "')'")?;
        self.expect(&TokenKind::LBrace, "O3P110", "'{'")?;
        let mut cases = Vec::new();
        while self.check(&TokenKind::KwCase) || self.check(&TokenKind::KwDefault) {
            let case_pos = self.pos();
            let label = if self.match_token(&TokenKind::KwCase) {
                let text = match self.expect(&TokenKind::IntLiteral, "O3P103", "integer case label") {
                    Some(tok) => tok.text,
                    None => {
                        self.sync_block();
                        continue;
                    }
                };
                match super::numeric::parse_int_literal(&text) {
                    Ok(v) => Some(v),
                    Err(raw) => {
                        self.error(case_pos, "O3P103", format!("malformed integer literal '{}'", raw));
                        None
                    }
                }
            } else {
                self.advance(); // `default`
                None
            };
            self.expect(&TokenKind::Colon, "O3P107", "':'");
            let mut body = Vec::new();
            while !self.check(&TokenKind::KwCase)
                && !self.check(&TokenKind::KwDefault)
                && !self.check(&TokenKind::RBrace)
                && !self.at_eof()
            {
                match self.parse_stmt() {
                    Some(stmt) => body.push(stmt),
                    None => self.sync_block(),
                }
            }
            cases.push(SwitchCase { label, pos: case_pos, body });
        }
        self.expect(&TokenKind::RBrace, "O3P111", "'}'");
        Some(Stmt::new(StmtKind::Switch(subject, cases), pos))
    }

    /// Leading-identifier statements: assignment, increment/decrement, or a
    /// bare expression statement (calls and message sends included).
    fn parse_ident_led_stmt(&mut self) -> Option<Stmt> {
        let pos = self.pos();
        if is_assign_op(self.peek_at_kind(1)) {
            let name = self.advance().text;
            let op = assign_op_from(self.peek_kind().clone());
            self.advance();
            let value = self.parse_expr()?;
            self.expect(&TokenKind::Semicolon, "O3P104", "';'");
            return Some(Stmt::new(StmtKind::Assign(name, op, Some(value)), pos));
        }
        if matches!(self.peek_at_kind(1), TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let name = self.advance().text;
            let op = if self.check(&TokenKind::PlusPlus) { IncDecOp::Inc } else { IncDecOp::Dec };
            self.advance();
            self.expect(&TokenKind::Semicolon, "O3P104", "';'");
            return Some(Stmt::new(StmtKind::IncDec(name, op), pos));
        }
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon, "O3P104", "';'");
        Some(Stmt::new(StmtKind::ExprStmt(expr), pos))
    }
}

fn is_assign_op(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::AmpEq
            | TokenKind::PipeEq
            | TokenKind::CaretEq
            | TokenKind::LtLtEq
            | TokenKind::GtGtEq
    )
}

fn assign_op_from(kind: TokenKind) -> AssignOp {
    match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::AddAssign,
        TokenKind::MinusEq => AssignOp::SubAssign,
        TokenKind::StarEq => AssignOp::MulAssign,
        TokenKind::SlashEq => AssignOp::DivAssign,
        TokenKind::PercentEq => AssignOp::ModAssign,
        TokenKind::AmpEq => AssignOp::AndAssign,
        TokenKind::PipeEq => AssignOp::OrAssign,
        TokenKind::CaretEq => AssignOp::XorAssign,
        TokenKind::LtLtEq => AssignOp::ShlAssign,
        TokenKind::GtGtEq => AssignOp::ShrAssign,
        _ => unreachable!("assign_op_from called on a non-assignment token"),
    }
}
