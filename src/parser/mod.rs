//! Recursive-descent parser with panic-mode recovery (spec §4.2).

mod expr;
mod numeric;
mod objc;
mod stmt;

use crate::ast::*;
use crate::common::{Diagnostic, Pos, Severity};
use crate::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    idx: usize,
    program: Program,
    autoreleasepool_tag: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, idx: 0, program: Program::new(), autoreleasepool_tag: 0 }
    }

    pub(super) fn next_autoreleasepool_tag(&mut self) -> u32 {
        self.autoreleasepool_tag += 1;
        self.autoreleasepool_tag
    }

    pub fn parse(mut self) -> Program {
        while !self.at_eof() {
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            match self.peek_kind() {
                TokenKind::KwModule => { self.parse_module_decl(); }
                TokenKind::KwLet => { self.parse_global_decl(); }
                TokenKind::KwPure | TokenKind::KwExtern | TokenKind::KwFn => { self.parse_function_decl(); }
                TokenKind::KwAtInterface => { self.parse_interface(); }
                TokenKind::KwAtImplementation => { self.parse_implementation(); }
                TokenKind::KwAtProtocol => { self.parse_protocol(); }
                _ => {
                    self.error(self.pos(), "O3P100", format!("expected a top-level declaration, found {}", self.peek_kind()));
                    self.sync_top_level();
                }
            }
        }
        self.program
    }

    // ---------------------------------------------------------------
    // Low-level token access
    // ---------------------------------------------------------------

    pub(super) fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(super) fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.idx].kind
    }

    pub(super) fn peek_at_kind(&self, offset: usize) -> &TokenKind {
        let i = (self.idx + offset).min(self.tokens.len() - 1);
        &self.tokens[i].kind
    }

    pub(super) fn current(&self) -> &Token {
        &self.tokens[self.idx]
    }

    pub(super) fn pos(&self) -> Pos {
        self.current().pos
    }

    pub(super) fn advance(&mut self) -> Token {
        let tok = self.tokens[self.idx].clone();
        if self.idx + 1 < self.tokens.len() {
            self.idx += 1;
        }
        tok
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    pub(super) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes `kind` if present; otherwise emits `code` at the current
    /// position and leaves the cursor untouched for recovery.
    pub(super) fn expect(&mut self, kind: &TokenKind, code: &str, what: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error(self.pos(), code, format!("expected {}, found {}", what, self.peek_kind()));
            None
        }
    }

    pub(super) fn expect_identifier(&mut self, code: &str) -> Option<String> {
        if self.check(&TokenKind::Identifier) {
            Some(self.advance().text)
        } else {
            self.error(self.pos(), code, format!("expected identifier, found {}", self.peek_kind()));
            None
        }
    }

    pub(super) fn error(&mut self, pos: Pos, code: &str, message: impl Into<String>) {
        self.program.diagnostics.push(Diagnostic::new(Severity::Error, pos, code, message));
    }

    // ---------------------------------------------------------------
    // Panic-mode recovery (spec §4.2)
    // ---------------------------------------------------------------

    /// Scans to `;` (consumed) or a token that can start a top-level decl.
    pub(super) fn sync_top_level(&mut self) {
        while !self.at_eof() {
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                return;
            }
            if self.peek_kind().can_start_top_level_decl() {
                return;
            }
            self.advance();
        }
    }

    /// Scans to `;` (consumed), a statement-starting keyword, or `}`.
    pub(super) fn sync_block(&mut self) {
        while !self.at_eof() {
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                return;
            }
            if self.check(&TokenKind::RBrace) || self.peek_kind().can_start_statement() {
                return;
            }
            self.advance();
        }
    }

    /// Scans to `@end`, a method marker (`-`/`+`), or `@property`.
    pub(super) fn sync_objc_container(&mut self) {
        while !self.at_eof() {
            if self.check(&TokenKind::KwAtEnd)
                || self.check(&TokenKind::Minus)
                || self.check(&TokenKind::Plus)
                || self.check(&TokenKind::KwAtProperty)
            {
                return;
            }
            self.advance();
        }
    }

    // ---------------------------------------------------------------
    // `module IDENT ;`
    // ---------------------------------------------------------------

    fn parse_module_decl(&mut self) -> Option<()> {
        let pos = self.pos();
        self.advance(); // `module`
        let name = match self.expect_identifier("O3P101") {
            Some(name) => name,
            None => {
                self.sync_top_level();
                return Some(());
            }
        };
        if self.expect(&TokenKind::Semicolon, "O3P104", "';'").is_none() {
            self.sync_top_level();
        }
        self.program.module_decls.push((name, pos));
        Some(())
    }

    // ---------------------------------------------------------------
    // `let IDENT = EXPR ;` (global)
    // ---------------------------------------------------------------

    fn parse_global_decl(&mut self) -> Option<()> {
        let pos = self.pos();
        self.advance(); // `let`
        let name = match self.expect_identifier("O3P101") {
            Some(name) => name,
            None => {
                self.sync_top_level();
                return Some(());
            }
        };
        if self.expect(&TokenKind::Eq, "O3P102", "'='").is_none() {
            self.sync_top_level();
            return Some(());
        }
        let initializer = match self.parse_expr() {
            Some(e) => e,
            None => {
                self.sync_top_level();
                return Some(());
            }
        };
        if self.expect(&TokenKind::Semicolon, "O3P104", "';'").is_none() {
            self.sync_top_level();
        }
        self.program.globals.push(GlobalDecl { name, initializer, pos });
        Some(())
    }

    // ---------------------------------------------------------------
    // `[pure] [extern] fn NAME ( PARAMS? ) [-> RETURN_TYPE] ( ; | BLOCK )`
    // ---------------------------------------------------------------

    fn parse_function_decl(&mut self) -> Option<()> {
        let pos = self.pos();
        let mut is_pure = false;
        let mut is_extern = false;
        loop {
            if self.match_token(&TokenKind::KwPure) {
                is_pure = true;
            } else if self.match_token(&TokenKind::KwExtern) {
                is_extern = true;
            } else {
                break;
            }
        }
        if self.expect(&TokenKind::KwFn, "O3P100", "'fn'").is_none() {
            self.sync_top_level();
            return Some(());
        }
        let name = match self.expect_identifier("O3P101") {
            Some(n) => n,
            None => {
                self.sync_top_level();
                return Some(());
            }
        };
        if self.expect(&TokenKind::LParen, "O3P106", "'('").is_none() {
            self.sync_top_level();
            return Some(());
        }
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let pname = match self.expect_identifier("O3P101") {
                    Some(n) => n,
                    None => {
                        self.sync_top_level();
                        return Some(());
                    }
                };
                let ppos = self.pos();
                if self.expect(&TokenKind::Colon, "O3P107", "':'").is_none() {
                    self.sync_top_level();
                    return Some(());
                }
                let ty = match self.parse_type("O3P108") {
                    Some(t) => t,
                    None => {
                        self.sync_top_level();
                        return Some(());
                    }
                };
                params.push(Param { name: pname, ty, pos: ppos });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        if self.expect(&TokenKind::RParen, "O3P109", "')'").is_none() {
            self.sync_top_level();
            return Some(());
        }
        let return_type = if self.match_token(&TokenKind::Arrow) {
            match self.parse_type("O3P114") {
                Some(t) => t,
                None => {
                    self.sync_top_level();
                    return Some(());
                }
            }
        } else {
            TypeAnnotation::void()
        };

        if self.check(&TokenKind::Semicolon) {
            self.advance();
            self.program.functions.push(FunctionDecl {
                name,
                params,
                return_type,
                is_pure,
                is_prototype: true,
                body: None,
                pos,
            });
            return Some(());
        }

        if is_extern {
            self.error(pos, "O3P104", "'extern' declaration must end with ';'");
        }

        if !self.check(&TokenKind::LBrace) {
            self.error(self.pos(), "O3P110", format!("expected '{{', found {}", self.peek_kind()));
            self.sync_top_level();
            return Some(());
        }
        let body = self.parse_block();
        self.program.functions.push(FunctionDecl {
            name,
            params,
            return_type,
            is_pure,
            is_prototype: false,
            body: Some(body),
            pos,
        });
        Some(())
    }

    // ---------------------------------------------------------------
    // Type parsing (spec §4.2, collapsed per §9 into `TypeAnnotation`)
    // ---------------------------------------------------------------

    pub(super) fn parse_type(&mut self, err_code: &str) -> Option<TypeAnnotation> {
        let base_pos = self.pos();
        let (scalar, family) = match self.peek_kind().clone() {
            TokenKind::KwI32 => { self.advance(); (Scalar::I32, Family::Plain) }
            TokenKind::KwBool | TokenKind::KwBOOL => { self.advance(); (Scalar::Bool, Family::Plain) }
            TokenKind::KwVoid => { self.advance(); (Scalar::Void, Family::Plain) }
            TokenKind::KwId => { self.advance(); (Scalar::I32, Family::Id) }
            TokenKind::KwClass => { self.advance(); (Scalar::I32, Family::Class) }
            TokenKind::KwSEL => { self.advance(); (Scalar::I32, Family::Sel) }
            TokenKind::KwInstancetype => { self.advance(); (Scalar::I32, Family::Instancetype) }
            TokenKind::Identifier => {
                let text = self.advance().text;
                if let Some((base, lanes)) = parse_vector_shape(&text) {
                    (base, Family::Vector(Box::new(base), lanes))
                } else {
                    (Scalar::I32, Family::ObjectPointer(text))
                }
            }
            _ => {
                self.error(base_pos, err_code, format!("unsupported or unterminated type, found {}", self.peek_kind()));
                return None;
            }
        };

        let mut generic_suffix = None;
        if self.match_token(&TokenKind::Lt) {
            let mut depth = 1u32;
            let mut raw = String::from("<");
            loop {
                if self.at_eof() {
                    self.error(base_pos, err_code, "unterminated generic suffix");
                    return None;
                }
                if self.check(&TokenKind::Lt) {
                    depth += 1;
                } else if self.check(&TokenKind::Gt) {
                    depth -= 1;
                }
                let tok = self.advance();
                raw.push_str(&tok.text);
                if depth == 0 {
                    break;
                }
                raw.push(' ');
            }
            generic_suffix = Some(raw);
        }

        let mut pointer_depth = 0u8;
        while self.match_token(&TokenKind::Star) {
            pointer_depth += 1;
        }

        let mut nullability = Nullability::None;
        if self.match_token(&TokenKind::Question) {
            nullability = Nullability::Nullable;
        } else if self.match_token(&TokenKind::Bang) {
            nullability = Nullability::Nonnull;
        }

        Some(TypeAnnotation { scalar, family, generic_suffix, pointer_depth, nullability })
    }

    // ---------------------------------------------------------------
    // Block parsing shared by `fn` bodies and statement blocks
    // ---------------------------------------------------------------

    pub(super) fn parse_block(&mut self) -> Vec<Stmt> {
        self.advance(); // `{`
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            if let Some(stmt) = self.parse_stmt() {
                stmts.push(stmt);
            } else {
                self.sync_block();
            }
        }
        if self.expect(&TokenKind::RBrace, "O3P111", "'}'").is_none() {
            // Already recorded; leave cursor for outer recovery.
        }
        stmts
    }
}

fn parse_vector_shape(text: &str) -> Option<(Scalar, u8)> {
    let (base, rest) = if let Some(r) = text.strip_prefix("i32x") {
        (Scalar::I32, r)
    } else if let Some(r) = text.strip_prefix("boolx") {
        (Scalar::Bool, r)
    } else {
        return None;
    };
    let lanes: u8 = rest.parse().ok()?;
    if matches!(lanes, 2 | 4 | 8 | 16) {
        Some((base, lanes))
    } else {
        None
    }
}

pub fn parse(tokens: Vec<Token>) -> Program {
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(src: &str) -> Program {
        let (tokens, lex_diagnostics) = crate::lexer::lex(src);
        assert!(lex_diagnostics.is_empty(), "unexpected lex diagnostics: {:?}", lex_diagnostics);
        parse(tokens)
    }

    #[test]
    fn test_parse_simple_function() {
        let program = parse_source("fn main() -> i32 { return 0; }");
        assert!(program.diagnostics.is_empty());
        assert_eq!(program.functions.len(), 1);
        let f = &program.functions[0];
        assert_eq!(f.name, "main");
        assert!(f.body.is_some());
    }

    #[test]
    fn test_unary_plus_desugars_to_zero_plus_operand() {
        let program = parse_source("fn f(x: i32) -> i32 { return +x; }");
        assert!(program.diagnostics.is_empty());
        let body = program.functions[0].body.as_ref().unwrap();
        let StmtKind::Return(Some(expr)) = &body[0].kind else {
            panic!("expected a return statement");
        };
        match &expr.kind {
            ExprKind::Binary(BinOp::Add, lhs, rhs) => {
                assert!(matches!(lhs.kind, ExprKind::Number(0)));
                assert!(matches!(rhs.kind, ExprKind::Ident(ref name) if name == "x"));
            }
            other => panic!("expected `0 + x`, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus_and_bang_still_desugar() {
        let program = parse_source("fn f(x: i32, y: bool) -> i32 { return -x; }");
        let body = program.functions[0].body.as_ref().unwrap();
        let StmtKind::Return(Some(expr)) = &body[0].kind else {
            panic!("expected a return statement");
        };
        assert!(matches!(expr.kind, ExprKind::Binary(BinOp::Sub, _, _)));
    }

    #[test]
    fn test_for_loop_with_postfix_increment_step() {
        let program = parse_source("fn f() -> void { for (let i = 0; i < 10; i++) { } }");
        assert!(program.diagnostics.is_empty());
        let body = program.functions[0].body.as_ref().unwrap();
        let StmtKind::For(init, cond, step, _) = &body[0].kind else {
            panic!("expected a for statement");
        };
        assert!(matches!(init, ForClause::Let(name, _) if name == "i"));
        assert!(cond.is_some());
        match step {
            Some(ForClause::IncDec(name, IncDecOp::Inc)) => assert_eq!(name, "i"),
            other => panic!("expected `i++` step clause, got {:?}", other),
        }
    }

    #[test]
    fn test_for_loop_with_postfix_decrement_init() {
        let program = parse_source("fn f() -> void { for (i--; i > 0; ) { } }");
        assert!(program.diagnostics.is_empty());
        let body = program.functions[0].body.as_ref().unwrap();
        let StmtKind::For(init, _, _, _) = &body[0].kind else {
            panic!("expected a for statement");
        };
        match init {
            ForClause::IncDec(name, IncDecOp::Dec) => assert_eq!(name, "i"),
            other => panic!("expected `i--` init clause, got {:?}", other),
        }
    }

    #[test]
    fn test_message_send_requires_colon_per_keyword_part() {
        let program = parse_source("fn f() -> i32 { return [nil sel:1 arg:2]; }");
        assert!(program.diagnostics.is_empty());
    }

    #[test]
    fn test_malformed_top_level_recovers_and_reports_o3p100() {
        let program = parse_source("123; fn f() -> void { }");
        assert_eq!(program.functions.len(), 1);
        assert!(program.diagnostics.iter().any(|d| d.code.as_deref() == Some("O3P100")));
    }
}
