//! Pure-contract fixed-point analysis (spec §4.3, §9 design notes).
//!
//! `pure` is a transitive promise: a pure function may not write a global,
//! send a message, or call (directly or transitively) anything that does.
//! Resolved as an explicit worklist over the call graph, visited in
//! lexicographic function-name order each round for deterministic output.

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::{Expr, ExprKind, Program, Stmt, StmtKind};
use crate::common::Diagnostic;
use super::surface::SymbolSurface;

/// Runs the fixed point and returns the `(function, cause)` pairs for every
/// `pure`-declared function that turned out not to be, in the spec's
/// `global-write` / `message-send` / `unannotated-extern-call:NAME` /
/// `impure-callee:NAME` vocabulary. Also pushes one `O3S215` diagnostic per
/// violation.
pub fn analyze(program: &Program, surface: &SymbolSurface, diagnostics: &mut Vec<Diagnostic>) -> Vec<(String, String)> {
    let mut direct_cause: BTreeMap<String, String> = BTreeMap::new();
    let mut calls: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for function in &program.functions {
        let mut finder = CauseFinder { surface, direct_cause: None, calls: BTreeSet::new() };
        if let Some(body) = &function.body {
            finder.visit_block(body);
        }
        if let Some(cause) = finder.direct_cause {
            direct_cause.entry(function.name.clone()).or_insert(cause);
        }
        calls.insert(function.name.clone(), finder.calls);
    }

    let mut impure_cause: BTreeMap<String, String> = direct_cause;
    loop {
        let mut changed = false;
        for (name, callees) in &calls {
            if impure_cause.contains_key(name) {
                continue;
            }
            for callee in callees {
                if impure_cause.contains_key(callee) {
                    impure_cause.insert(name.clone(), format!("impure-callee:{}", callee));
                    changed = true;
                    break;
                }
            }
        }
        if !changed {
            break;
        }
    }

    let mut violations = Vec::new();
    for function in &program.functions {
        if !function.is_pure {
            continue;
        }
        if let Some(cause) = impure_cause.get(&function.name) {
            diagnostics.push(Diagnostic::error(
                function.pos,
                "O3S215",
                format!("'{}' is declared pure but {}", function.name, cause),
            ));
            violations.push((function.name.clone(), cause.clone()));
        }
    }
    violations
}

struct CauseFinder<'a> {
    surface: &'a SymbolSurface,
    direct_cause: Option<String>,
    calls: BTreeSet<String>,
}

impl<'a> CauseFinder<'a> {
    fn note(&mut self, cause: impl Into<String>) {
        if self.direct_cause.is_none() {
            self.direct_cause = Some(cause.into());
        }
    }

    fn visit_block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let(_, value) => self.visit_expr(value),
            StmtKind::Assign(name, _, value) => {
                if self.surface.globals.contains_key(name) {
                    self.note("global-write");
                }
                if let Some(v) = value {
                    self.visit_expr(v);
                }
            }
            StmtKind::IncDec(name, _) => {
                if self.surface.globals.contains_key(name) {
                    self.note("global-write");
                }
            }
            StmtKind::Return(value) => {
                if let Some(v) = value {
                    self.visit_expr(v);
                }
            }
            StmtKind::If(cond, then_b, else_b) => {
                self.visit_expr(cond);
                self.visit_stmt(then_b);
                if let Some(e) = else_b {
                    self.visit_stmt(e);
                }
            }
            StmtKind::While(cond, body) => {
                self.visit_expr(cond);
                self.visit_stmt(body);
            }
            StmtKind::DoWhile(body, cond) => {
                self.visit_stmt(body);
                self.visit_expr(cond);
            }
            StmtKind::For(init, cond, step, body) => {
                self.visit_for_clause(init);
                if let Some(c) = cond {
                    self.visit_expr(c);
                }
                if let Some(s) = step {
                    self.visit_for_clause(s);
                }
                self.visit_stmt(body);
            }
            StmtKind::Switch(subject, cases) => {
                self.visit_expr(subject);
                for case in cases {
                    self.visit_block(&case.body);
                }
            }
            StmtKind::Block(stmts, _) => self.visit_block(stmts),
            StmtKind::ExprStmt(expr) => self.visit_expr(expr),
            StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
        }
    }

    fn visit_for_clause(&mut self, clause: &crate::ast::ForClause) {
        use crate::ast::ForClause;
        match clause {
            ForClause::None => {}
            ForClause::Let(_, e) => self.visit_expr(e),
            ForClause::Assign(name, _, value) => {
                if self.surface.globals.contains_key(name) {
                    self.note("global-write");
                }
                if let Some(v) = value {
                    self.visit_expr(v);
                }
            }
            ForClause::IncDec(name, _) => {
                if self.surface.globals.contains_key(name) {
                    self.note("global-write");
                }
            }
            ForClause::Expr(e) => self.visit_expr(e),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::Nil | ExprKind::Ident(_) => {}
            ExprKind::Binary(_, lhs, rhs) => {
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
            ExprKind::Conditional(cond, then_e, else_e) => {
                self.visit_expr(cond);
                self.visit_expr(then_e);
                self.visit_expr(else_e);
            }
            ExprKind::Call(name, args) => {
                for arg in args {
                    self.visit_expr(arg);
                }
                match self.surface.functions.get(name) {
                    Some(info) if info.is_prototype && !info.is_pure => {
                        self.note(format!("unannotated-extern-call:{}", name));
                    }
                    _ => {
                        self.calls.insert(name.clone());
                    }
                }
            }
            ExprKind::MessageSend(receiver, _, args) => {
                self.note("message-send");
                self.visit_expr(receiver);
                for arg in args {
                    self.visit_expr(arg);
                }
            }
        }
    }
}
