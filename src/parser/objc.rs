//! Objective-C container grammar (spec §4.2): `@interface`, `@implementation`,
//! `@protocol`, their `@property` members, and `-`/`+` methods.

use crate::ast::{ImplementationDecl, InterfaceDecl, MethodDecl, Param, ProtocolDecl, PropertyDecl};
use crate::token::TokenKind;
use super::Parser;

impl Parser {
    pub(super) fn parse_interface(&mut self) -> Option<()> {
        let pos = self.pos();
        self.advance(); // `@interface`
        let name = match self.expect_identifier("O3P101") {
            Some(n) => n,
            None => {
                self.sync_top_level();
                return Some(());
            }
        };
        let superclass = if self.match_token(&TokenKind::Colon) {
            match self.expect_identifier("O3P101") {
                Some(n) => Some(n),
                None => {
                    self.sync_top_level();
                    return Some(());
                }
            }
        } else {
            None
        };
        let (methods, properties) = self.parse_objc_members();
        self.expect(&TokenKind::KwAtEnd, "O3P114", "'@end'");
        self.program.interfaces.push(InterfaceDecl { name, superclass, methods, properties, pos });
        Some(())
    }

    pub(super) fn parse_implementation(&mut self) -> Option<()> {
        let pos = self.pos();
        self.advance(); // `@implementation`
        let name = match self.expect_identifier("O3P101") {
            Some(n) => n,
            None => {
                self.sync_top_level();
                return Some(());
            }
        };
        let (methods, properties) = self.parse_objc_members();
        self.expect(&TokenKind::KwAtEnd, "O3P114", "'@end'");
        self.program.implementations.push(ImplementationDecl { name, methods, properties, pos });
        Some(())
    }

    pub(super) fn parse_protocol(&mut self) -> Option<()> {
        let pos = self.pos();
        self.advance(); // `@protocol`
        let name = match self.expect_identifier("O3P101") {
            Some(n) => n,
            None => {
                self.sync_top_level();
                return Some(());
            }
        };
        let (methods, properties) = self.parse_objc_members();
        self.expect(&TokenKind::KwAtEnd, "O3P114", "'@end'");
        self.program.protocols.push(ProtocolDecl { name, methods, properties, pos });
        Some(())
    }

    fn parse_objc_members(&mut self) -> (Vec<MethodDecl>, Vec<PropertyDecl>) {
        let mut methods = Vec::new();
        let mut properties = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Minus | TokenKind::Plus => {
                    if let Some(method) = self.parse_method() {
                        methods.push(method);
                    } else {
                        self.sync_objc_container();
                    }
                }
                TokenKind::KwAtProperty => {
                    if let Some(prop) = self.parse_property() {
                        properties.push(prop);
                    } else {
                        self.sync_objc_container();
                    }
                }
                TokenKind::KwAtEnd | TokenKind::Eof => break,
                _ => {
                    self.error(self.pos(), "O3P100", format!("expected method, property, or '@end', found {}", self.peek_kind()));
                    self.sync_objc_container();
                    if self.check(&TokenKind::KwAtEnd) || self.at_eof() {
                        break;
                    }
                }
            }
        }
        (methods, properties)
    }

    fn parse_property(&mut self) -> Option<PropertyDecl> {
        let pos = self.pos();
        self.advance(); // `@property`
        let name = self.expect_identifier("O3P101")?;
        self.expect(&TokenKind::Colon, "O3P107", "':'")?;
        let ty = self.parse_type("O3P108")?;
        self.expect(&TokenKind::Semicolon, "O3P104", "';'");
        Some(PropertyDecl { name, ty, pos })
    }

    fn parse_method(&mut self) -> Option<MethodDecl> {
        let pos = self.pos();
        let is_class_method = self.check(&TokenKind::Plus);
        self.advance(); // `-` or `+`
        self.expect(&TokenKind::LParen, "O3P106", "'('")?;
        let return_type = self.parse_type("O3P108")?;
        self.expect(&TokenKind::RParen, "O3P109", "')'")?;

        let head = self.expect_identifier("O3P112")?;
        let mut selector = head.clone();
        let mut params = Vec::new();
        if self.check(&TokenKind::Colon) {
            self.advance();
            selector = format!("{}:", head);
            self.parse_method_keyword_param(&mut params)?;
            while self.check(&TokenKind::Identifier) && matches!(self.peek_at_kind(1), TokenKind::Colon) {
                let key = self.advance().text;
                self.advance(); // `:`
                selector.push_str(&key);
                selector.push(':');
                self.parse_method_keyword_param(&mut params)?;
            }
        }

        let body = if self.check(&TokenKind::LBrace) {
            Some(self.parse_block())
        } else {
            self.expect(&TokenKind::Semicolon, "O3P104", "';'");
            None
        };

        Some(MethodDecl { selector, params, return_type, is_class_method, body, pos })
    }

    fn parse_method_keyword_param(&mut self, params: &mut Vec<Param>) -> Option<()> {
        let ppos = self.pos();
        self.expect(&TokenKind::LParen, "O3P106", "'('")?;
        let ty = self.parse_type("O3P108")?;
        self.expect(&TokenKind::RParen, "O3P109", "')'")?;
        let name = self.expect_identifier("O3P101")?;
        params.push(Param { name, ty, pos: ppos });
        Some(())
    }
}
