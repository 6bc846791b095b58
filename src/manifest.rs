//! The reduced, in-scope `ArtifactBuilder` stage (SPEC_FULL.md §4.7): a
//! serializable summary of a clean compile, never written to disk by this
//! crate.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::ast::Program;
use crate::sema::SymbolSurface;

#[derive(Debug, Clone, Serialize)]
pub struct PureViolation {
    pub function: String,
    pub cause: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub module_name: Option<String>,
    pub global_count: usize,
    pub functions_declared: usize,
    pub functions_defined: usize,
    pub interface_count: usize,
    pub implementation_count: usize,
    pub protocol_count: usize,
    pub method_count: usize,
    pub property_count: usize,
    /// Every distinct selector literal reached by a `MessageSend`, sorted.
    pub selectors: Vec<String>,
    pub pure_violations: Vec<PureViolation>,
}

impl Manifest {
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).expect("Manifest serializes without error")
    }
}

/// Builds the manifest from the AST, symbol surface, and the
/// `(function, cause)` pairs `sema::analyze` already computed — this module
/// only reshapes that result for serialization, it never re-derives purity.
pub fn build(program: &Program, surface: &SymbolSurface, pure_violations: &[(String, String)]) -> Manifest {
    let pure_violations = pure_violations
        .iter()
        .map(|(function, cause)| PureViolation { function: function.clone(), cause: cause.clone() })
        .collect();
    let mut selectors: BTreeSet<String> = BTreeSet::new();
    collect_program_selectors(program, &mut selectors);

    let (functions_declared, functions_defined) = surface
        .functions
        .values()
        .fold((0usize, 0usize), |(decl, def), info| {
            if info.is_defined {
                (decl, def + 1)
            } else {
                (decl + 1, def)
            }
        });

    let method_count = program
        .interfaces
        .iter()
        .map(|i| i.methods.len())
        .chain(program.implementations.iter().map(|i| i.methods.len()))
        .chain(program.protocols.iter().map(|p| p.methods.len()))
        .sum();
    let property_count = program
        .interfaces
        .iter()
        .map(|i| i.properties.len())
        .chain(program.implementations.iter().map(|i| i.properties.len()))
        .chain(program.protocols.iter().map(|p| p.properties.len()))
        .sum();

    Manifest {
        module_name: program.module_name().map(str::to_string),
        global_count: surface.globals.len(),
        functions_declared,
        functions_defined,
        interface_count: program.interfaces.len(),
        implementation_count: program.implementations.len(),
        protocol_count: program.protocols.len(),
        method_count,
        property_count,
        selectors: selectors.into_iter().collect(),
        pure_violations,
    }
}

fn collect_program_selectors(program: &Program, out: &mut BTreeSet<String>) {
    use crate::ast::{Expr, ExprKind, ForClause, Stmt, StmtKind};

    fn walk_stmts(stmts: &[Stmt], out: &mut BTreeSet<String>) {
        for s in stmts {
            walk_stmt(s, out);
        }
    }
    fn walk_stmt(stmt: &Stmt, out: &mut BTreeSet<String>) {
        match &stmt.kind {
            StmtKind::Let(_, e) | StmtKind::ExprStmt(e) => walk_expr(e, out),
            StmtKind::Assign(_, _, Some(e)) => walk_expr(e, out),
            StmtKind::Assign(_, _, None) | StmtKind::IncDec(..) | StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
            StmtKind::Return(Some(e)) => walk_expr(e, out),
            StmtKind::Return(None) => {}
            StmtKind::If(c, t, e) => {
                walk_expr(c, out);
                walk_stmt(t, out);
                if let Some(e) = e {
                    walk_stmt(e, out);
                }
            }
            StmtKind::While(c, b) => {
                walk_expr(c, out);
                walk_stmt(b, out);
            }
            StmtKind::DoWhile(b, c) => {
                walk_stmt(b, out);
                walk_expr(c, out);
            }
            StmtKind::For(init, cond, step, body) => {
                walk_for_clause(init, out);
                if let Some(c) = cond {
                    walk_expr(c, out);
                }
                if let Some(s) = step {
                    walk_for_clause(s, out);
                }
                walk_stmt(body, out);
            }
            StmtKind::Switch(scrutinee, cases) => {
                walk_expr(scrutinee, out);
                for case in cases {
                    walk_stmts(&case.body, out);
                }
            }
            StmtKind::Block(stmts, _) => walk_stmts(stmts, out),
        }
    }
    fn walk_for_clause(clause: &ForClause, out: &mut BTreeSet<String>) {
        match clause {
            ForClause::None => {}
            ForClause::Let(_, e) | ForClause::Expr(e) => walk_expr(e, out),
            ForClause::Assign(_, _, e) => {
                if let Some(e) = e {
                    walk_expr(e, out);
                }
            }
            ForClause::IncDec(..) => {}
        }
    }
    fn walk_expr(expr: &Expr, out: &mut BTreeSet<String>) {
        match &expr.kind {
            ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::Nil | ExprKind::Ident(_) => {}
            ExprKind::Binary(_, l, r) => {
                walk_expr(l, out);
                walk_expr(r, out);
            }
            ExprKind::Conditional(c, t, e) => {
                walk_expr(c, out);
                walk_expr(t, out);
                walk_expr(e, out);
            }
            ExprKind::Call(_, args) => {
                for a in args {
                    walk_expr(a, out);
                }
            }
            ExprKind::MessageSend(receiver, selector, args) => {
                walk_expr(receiver, out);
                out.insert(selector.clone());
                for a in args {
                    walk_expr(a, out);
                }
            }
        }
    }

    for function in &program.functions {
        if let Some(body) = &function.body {
            walk_stmts(body, out);
        }
    }
    for interface in &program.interfaces {
        for method in &interface.methods {
            if let Some(body) = &method.body {
                walk_stmts(body, out);
            }
        }
    }
    for implementation in &program.implementations {
        for method in &implementation.methods {
            if let Some(body) = &method.body {
                walk_stmts(body, out);
            }
        }
    }
}
