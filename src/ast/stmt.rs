//! Statement AST nodes (spec §3).

use crate::common::Pos;
use super::Expr;

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Pos,
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: Pos) -> Self {
        Self { kind, pos }
    }
}

#[derive(Debug, Clone)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
}

impl AssignOp {
    pub fn to_binop(&self) -> Option<super::BinOp> {
        use super::BinOp;
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinOp::Add),
            AssignOp::SubAssign => Some(BinOp::Sub),
            AssignOp::MulAssign => Some(BinOp::Mul),
            AssignOp::DivAssign => Some(BinOp::Div),
            AssignOp::ModAssign => Some(BinOp::Mod),
            AssignOp::AndAssign => Some(BinOp::BitAnd),
            AssignOp::OrAssign => Some(BinOp::BitOr),
            AssignOp::XorAssign => Some(BinOp::BitXor),
            AssignOp::ShlAssign => Some(BinOp::Shl),
            AssignOp::ShrAssign => Some(BinOp::Shr),
        }
    }
}

/// Which increment/decrement operator, applied as a statement-level target mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Inc,
    Dec,
}

#[derive(Debug, Clone)]
pub enum ForClause {
    None,
    Let(String, Expr),
    Assign(String, AssignOp, Option<Expr>),
    IncDec(String, IncDecOp),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub label: Option<i32>, // None == `default`
    pub pos: Pos,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Let(String, Expr),
    Assign(String, AssignOp, Option<Expr>),
    IncDec(String, IncDecOp),
    Return(Option<Expr>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    While(Expr, Box<Stmt>),
    DoWhile(Box<Stmt>, Expr),
    For(ForClause, Option<Expr>, Option<ForClause>, Box<Stmt>),
    Switch(Expr, Vec<SwitchCase>),
    Block(Vec<Stmt>, Option<u32>), // `@autoreleasepool` scopes carry a serial tag
    ExprStmt(Expr),
    Break,
    Continue,
    Empty,
}
