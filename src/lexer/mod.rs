//! Hand-rolled lexer producing a finite token stream (spec §4.1).
//!
//! Block-comment nesting, stray `*/`, and unrecognized-character handling
//! need diagnostics with exact (line, column) at the offending character, so
//! this lexer walks the source a character at a time rather than delegating
//! to a regex-driven token table.

use crate::common::{Diagnostic, Pos, Severity};
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    chars: Vec<char>,
    src: &'a str,
    idx: usize,
    line: u32,
    column: u32,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().collect(),
            src,
            idx: 0,
            line: 1,
            column: 1,
            diagnostics: Vec::new(),
        }
    }

    /// Lexes the entire source into a token stream terminated by `Eof`,
    /// plus any diagnostics collected along the way.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let pos = self.pos();
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, "", pos));
                break;
            };
            let token = self.scan_token(c, pos);
            tokens.push(token);
        }
        (tokens, self.diagnostics)
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.idx + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.idx += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&mut self, pos: Pos, code: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(Severity::Error, pos, code, message));
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.skip_block_comment();
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    let pos = self.pos();
                    self.error(pos, "O3L004", "stray '*/' outside of a block comment");
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let start = self.pos();
        self.advance(); // '/'
        self.advance(); // '*'
        let mut depth = 1u32;
        loop {
            match (self.peek(), self.peek_at(1)) {
                (None, _) => {
                    self.error(start, "O3L002", "unterminated block comment");
                    return;
                }
                (Some('/'), Some('*')) => {
                    let nested_pos = self.pos();
                    self.advance();
                    self.advance();
                    depth += 1;
                    self.error(nested_pos, "O3L003", "nested block comment");
                }
                (Some('*'), Some('/')) => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn scan_token(&mut self, c: char, pos: Pos) -> Token {
        if c == '_' || c.is_alphabetic() {
            return self.scan_identifier(pos);
        }
        if c.is_ascii_digit() {
            return self.scan_number(pos);
        }
        if c == '@' {
            return self.scan_at_keyword(pos);
        }
        self.scan_operator(c, pos)
    }

    fn scan_identifier(&mut self, pos: Pos) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, pos)
    }

    /// Consumes a number literal's raw text only; value/base validation is
    /// deferred to the parser per spec §4.1/§4.2.
    fn scan_number(&mut self, pos: Pos) -> Token {
        let mut text = String::new();
        text.push(self.advance().unwrap());

        if text == "0" {
            if matches!(self.peek(), Some('b' | 'B' | 'o' | 'O' | 'x' | 'X')) {
                text.push(self.advance().unwrap());
            }
        }

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::IntLiteral, text, pos)
    }

    fn scan_at_keyword(&mut self, pos: Pos) -> Token {
        self.advance(); // '@'
        let mut text = String::from("@");
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = match text.as_str() {
            "@interface" => TokenKind::KwAtInterface,
            "@implementation" => TokenKind::KwAtImplementation,
            "@protocol" => TokenKind::KwAtProtocol,
            "@end" => TokenKind::KwAtEnd,
            "@property" => TokenKind::KwAtProperty,
            "@autoreleasepool" => TokenKind::KwAtAutoreleasepool,
            _ => {
                self.error(pos, "O3L001", format!("unexpected character '{}'", text));
                TokenKind::Identifier
            }
        };
        Token::new(kind, text, pos)
    }

    fn scan_operator(&mut self, c: char, pos: Pos) -> Token {
        use TokenKind::*;
        macro_rules! two {
            ($second:expr, $two_kind:expr, $one_kind:expr) => {{
                self.advance();
                if self.peek() == Some($second) {
                    self.advance();
                    Token::new($two_kind, format!("{}{}", c, $second), pos)
                } else {
                    Token::new($one_kind, c.to_string(), pos)
                }
            }};
        }
        match c {
            '(' => { self.advance(); Token::new(LParen, "(", pos) }
            ')' => { self.advance(); Token::new(RParen, ")", pos) }
            '{' => { self.advance(); Token::new(LBrace, "{", pos) }
            '}' => { self.advance(); Token::new(RBrace, "}", pos) }
            '[' => { self.advance(); Token::new(LBracket, "[", pos) }
            ']' => { self.advance(); Token::new(RBracket, "]", pos) }
            ',' => { self.advance(); Token::new(Comma, ",", pos) }
            ':' => { self.advance(); Token::new(Colon, ":", pos) }
            ';' => { self.advance(); Token::new(Semicolon, ";", pos) }
            '?' => { self.advance(); Token::new(Question, "?", pos) }
            '~' => { self.advance(); Token::new(Tilde, "~", pos) }
            '+' => {
                self.advance();
                match self.peek() {
                    Some('+') => { self.advance(); Token::new(PlusPlus, "++", pos) }
                    Some('=') => { self.advance(); Token::new(PlusEq, "+=", pos) }
                    _ => Token::new(Plus, "+", pos),
                }
            }
            '-' => {
                self.advance();
                match self.peek() {
                    Some('-') => { self.advance(); Token::new(MinusMinus, "--", pos) }
                    Some('=') => { self.advance(); Token::new(MinusEq, "-=", pos) }
                    Some('>') => { self.advance(); Token::new(Arrow, "->", pos) }
                    _ => Token::new(Minus, "-", pos),
                }
            }
            '*' => two!('=', StarEq, Star),
            '/' => two!('=', SlashEq, Slash),
            '%' => two!('=', PercentEq, Percent),
            '^' => two!('=', CaretEq, Caret),
            '!' => two!('=', NotEq, Bang),
            '=' => two!('=', EqEq, Eq),
            '&' => {
                self.advance();
                match self.peek() {
                    Some('&') => { self.advance(); Token::new(AmpAmp, "&&", pos) }
                    Some('=') => { self.advance(); Token::new(AmpEq, "&=", pos) }
                    _ => Token::new(Amp, "&", pos),
                }
            }
            '|' => {
                self.advance();
                match self.peek() {
                    Some('|') => { self.advance(); Token::new(PipePipe, "||", pos) }
                    Some('=') => { self.advance(); Token::new(PipeEq, "|=", pos) }
                    _ => Token::new(Pipe, "|", pos),
                }
            }
            '<' => {
                self.advance();
                match self.peek() {
                    Some('<') => {
                        self.advance();
                        if self.peek() == Some('=') {
                            self.advance();
                            Token::new(LtLtEq, "<<=", pos)
                        } else {
                            Token::new(LtLt, "<<", pos)
                        }
                    }
                    Some('=') => { self.advance(); Token::new(LtEq, "<=", pos) }
                    _ => Token::new(Lt, "<", pos),
                }
            }
            '>' => {
                self.advance();
                match self.peek() {
                    Some('>') => {
                        self.advance();
                        if self.peek() == Some('=') {
                            self.advance();
                            Token::new(GtGtEq, ">>=", pos)
                        } else {
                            Token::new(GtGt, ">>", pos)
                        }
                    }
                    Some('=') => { self.advance(); Token::new(GtEq, ">=", pos) }
                    _ => Token::new(Gt, ">", pos),
                }
            }
            other => {
                self.advance();
                self.error(pos, "O3L001", format!("unexpected character '{}'", other));
                Token::new(TokenKind::Identifier, other.to_string(), pos)
            }
        }
    }
}

pub fn lex(src: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(src).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_keywords_and_identifiers() {
        let (tokens, diags) = lex("module m; let x = 1;");
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::KwModule);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].text, "m");
    }

    #[test]
    fn tracks_line_and_column_across_newlines() {
        let (tokens, _) = lex("let x\n= 1;");
        let eq_tok = tokens.iter().find(|t| t.kind == TokenKind::Eq).unwrap();
        assert_eq!(eq_tok.pos.line, 2);
        assert_eq!(eq_tok.pos.column, 1);
    }

    #[test]
    fn nested_block_comment_is_diagnosed_but_recovers() {
        let (_, diags) = lex("/* outer /* inner */ still-comment */ let");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code.as_deref(), Some("O3L003"));
    }

    #[test]
    fn unterminated_block_comment_is_diagnosed() {
        let (_, diags) = lex("/* never closes");
        assert_eq!(diags[0].code.as_deref(), Some("O3L002"));
    }

    #[test]
    fn stray_close_comment_is_diagnosed() {
        let (_, diags) = lex("let x */ = 1;");
        assert_eq!(diags[0].code.as_deref(), Some("O3L004"));
    }

    #[test]
    fn unexpected_character_advances_one() {
        let (tokens, diags) = lex("let x = 1 $ 2;");
        assert_eq!(diags[0].code.as_deref(), Some("O3L001"));
        // Lexing continues past the bad character.
        assert!(tokens.iter().any(|t| t.kind == TokenKind::IntLiteral && t.text == "2"));
    }

    #[test]
    fn message_send_brackets_and_colon_tokenize() {
        let (tokens, diags) = lex("[self foo:1 bar:2]");
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::LBracket);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }
}
