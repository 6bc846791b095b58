//! Token definitions for the o3 lexer (spec §3, §4.1).

use crate::common::Pos;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Pos) -> Self {
        Self { kind, text: text.into(), pos }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Identifier,
    IntLiteral,

    // Keywords — core control flow / declarations
    KwModule,
    KwLet,
    KwFn,
    KwPure,
    KwExtern,
    KwReturn,
    KwIf,
    KwElse,
    KwDo,
    KwWhile,
    KwFor,
    KwSwitch,
    KwCase,
    KwDefault,
    KwBreak,
    KwContinue,

    // Scalar type keywords
    KwI32,
    KwBool,
    KwVoid,

    // Objective-C flavored keywords
    KwBOOL,
    KwYES,
    KwNO,
    KwNULL,
    KwNil,
    KwId,
    KwClass,
    KwSEL,
    KwInstancetype,
    KwAtInterface,
    KwAtImplementation,
    KwAtProtocol,
    KwAtEnd,
    KwAtProperty,
    KwAtAutoreleasepool,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Question,
    Arrow,

    // Operators
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    LtLtEq,
    GtGtEq,
    PlusPlus,
    MinusMinus,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LtLt,
    GtGt,
    AmpAmp,
    PipePipe,
    Bang,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    NullableMark,  // `?` used as a nullability suffix after a type
    NonnullMark,   // `!` used as a nullability suffix after a type
}

impl TokenKind {
    /// Keyword lookup table (spec §4.1). `YES`/`NO`/`NULL` alias to bool/nil.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        use TokenKind::*;
        Some(match ident {
            "module" => KwModule,
            "let" => KwLet,
            "fn" => KwFn,
            "pure" => KwPure,
            "extern" => KwExtern,
            "return" => KwReturn,
            "if" => KwIf,
            "else" => KwElse,
            "do" => KwDo,
            "while" => KwWhile,
            "for" => KwFor,
            "switch" => KwSwitch,
            "case" => KwCase,
            "default" => KwDefault,
            "break" => KwBreak,
            "continue" => KwContinue,
            "i32" => KwI32,
            "bool" => KwBool,
            "void" => KwVoid,
            "BOOL" => KwBOOL,
            "YES" => KwYES,
            "NO" => KwNO,
            "NULL" => KwNULL,
            "nil" => KwNil,
            "id" => KwId,
            "Class" => KwClass,
            "SEL" => KwSEL,
            "instancetype" => KwInstancetype,
            _ => return None,
        })
    }

    pub fn can_start_top_level_decl(&self) -> bool {
        matches!(
            self,
            TokenKind::KwModule
                | TokenKind::KwLet
                | TokenKind::KwFn
                | TokenKind::KwPure
                | TokenKind::KwExtern
                | TokenKind::KwAtInterface
                | TokenKind::KwAtImplementation
                | TokenKind::KwAtProtocol
        )
    }

    pub fn can_start_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::KwLet
                | TokenKind::KwReturn
                | TokenKind::KwIf
                | TokenKind::KwWhile
                | TokenKind::KwDo
                | TokenKind::KwFor
                | TokenKind::KwSwitch
                | TokenKind::KwBreak
                | TokenKind::KwContinue
                | TokenKind::KwAtAutoreleasepool
                | TokenKind::LBrace
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
