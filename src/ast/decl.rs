//! Top-level declarations and the `Program` container (spec §3).

use crate::common::{Diagnostic, Pos};
use super::{Expr, Stmt, TypeAnnotation};

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeAnnotation,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct GlobalDecl {
    pub name: String,
    pub initializer: Expr,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeAnnotation,
    pub is_pure: bool,
    /// `true` when this occurrence is `extern fn ... ;` (a prototype only).
    pub is_prototype: bool,
    pub body: Option<Vec<Stmt>>,
    pub pos: Pos,
}

impl FunctionDecl {
    pub fn is_defined(&self) -> bool {
        self.body.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: TypeAnnotation,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub selector: String,
    pub params: Vec<Param>,
    pub return_type: TypeAnnotation,
    pub is_class_method: bool,
    pub body: Option<Vec<Stmt>>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ProtocolDecl {
    pub name: String,
    pub methods: Vec<MethodDecl>,
    pub properties: Vec<PropertyDecl>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: String,
    pub superclass: Option<String>,
    pub methods: Vec<MethodDecl>,
    pub properties: Vec<PropertyDecl>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ImplementationDecl {
    pub name: String,
    pub methods: Vec<MethodDecl>,
    pub properties: Vec<PropertyDecl>,
    pub pos: Pos,
}

/// A complete translation unit, owning every AST node (spec §3 Lifecycle).
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Every `module IDENT;` occurrence, in source order; sema flags a
    /// second occurrence as `O3S200` rather than rejecting it outright.
    pub module_decls: Vec<(String, Pos)>,
    pub globals: Vec<GlobalDecl>,
    pub functions: Vec<FunctionDecl>,
    pub protocols: Vec<ProtocolDecl>,
    pub interfaces: Vec<InterfaceDecl>,
    pub implementations: Vec<ImplementationDecl>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module_decls.first().map(|(name, _)| name.as_str())
    }
}
