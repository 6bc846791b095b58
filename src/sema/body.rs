//! Pass 2 (body validation) and Pass 3 (definite-return analysis), spec §4.3.

use std::collections::HashMap;

use crate::ast::{BinOp, Expr, ExprKind, ForClause, Scalar, Stmt, StmtKind};
use crate::common::{Diagnostic, Pos};
use crate::lower::CompileOptions;
use super::scope::Scope;
use super::surface::SymbolSurface;

pub fn analyze_bodies(
    program: &crate::ast::Program,
    surface: &SymbolSurface,
    options: &CompileOptions,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for function in &program.functions {
        let Some(body) = &function.body else { continue };
        let mut root = Scope::new();
        for param in &function.params {
            root.declare(&param.name, param.ty.scalar);
        }
        let mut checker = BodyChecker {
            surface,
            options,
            diagnostics,
            loop_depth: 0,
            switch_depth: 0,
            return_type: function.return_type.scalar,
        };
        checker.check_block(body, &mut root);

        if function.return_type.scalar != Scalar::Void {
            let mut env = HashMap::new();
            if !definitely_returns(body, &mut env) {
                diagnostics.push(Diagnostic::error(
                    function.pos,
                    "O3S205",
                    format!("function '{}' does not definitely return a value on every path", function.name),
                ));
            }
        }
    }
}

struct BodyChecker<'a> {
    surface: &'a SymbolSurface,
    options: &'a CompileOptions,
    diagnostics: &'a mut Vec<Diagnostic>,
    loop_depth: u32,
    switch_depth: u32,
    return_type: Scalar,
}

impl<'a> BodyChecker<'a> {
    fn check_block(&mut self, stmts: &[Stmt], scope: &mut Scope) {
        scope.push_child();
        for stmt in stmts {
            self.check_stmt(stmt, scope);
        }
        scope.pop_to_parent();
    }

    fn check_stmt(&mut self, stmt: &Stmt, scope: &mut Scope) {
        match &stmt.kind {
            StmtKind::Let(name, value) => {
                let ty = self.infer(value, scope).unwrap_or(Scalar::Unknown);
                if scope.declared_in_this_scope(name) {
                    self.diagnostics.push(Diagnostic::error(
                        stmt.pos,
                        "O3S201",
                        format!("'{}' is already declared in this scope", name),
                    ));
                }
                scope.declare(name, ty);
            }
            StmtKind::Assign(name, _op, value) => {
                if let Some(v) = value {
                    self.infer(v, scope);
                }
                if scope.lookup(name).is_none() && !self.surface.globals.contains_key(name) {
                    self.diagnostics.push(Diagnostic::error(
                        stmt.pos,
                        "O3S214",
                        format!("assignment to undeclared name '{}'", name),
                    ));
                }
            }
            StmtKind::IncDec(name, _) => {
                if scope.lookup(name).is_none() && !self.surface.globals.contains_key(name) {
                    self.diagnostics.push(Diagnostic::error(
                        stmt.pos,
                        "O3S214",
                        format!("increment/decrement of undeclared name '{}'", name),
                    ));
                }
            }
            StmtKind::Return(value) => {
                let actual = match value {
                    Some(v) => self.infer(v, scope),
                    None => Some(Scalar::Void),
                };
                if let Some(actual) = actual {
                    if actual != self.return_type {
                        self.diagnostics.push(Diagnostic::error(
                            stmt.pos,
                            "O3S211",
                            format!("expected return type '{:?}', found '{:?}'", self.return_type, actual),
                        ));
                    }
                }
            }
            StmtKind::If(cond, then_b, else_b) => {
                self.expect_bool(cond, scope);
                scope.push_child();
                self.check_stmt(then_b, scope);
                scope.pop_to_parent();
                if let Some(e) = else_b {
                    scope.push_child();
                    self.check_stmt(e, scope);
                    scope.pop_to_parent();
                }
            }
            StmtKind::While(cond, body) => {
                self.expect_bool(cond, scope);
                self.loop_depth += 1;
                scope.push_child();
                self.check_stmt(body, scope);
                scope.pop_to_parent();
                self.loop_depth -= 1;
            }
            StmtKind::DoWhile(body, cond) => {
                self.loop_depth += 1;
                scope.push_child();
                self.check_stmt(body, scope);
                scope.pop_to_parent();
                self.loop_depth -= 1;
                self.expect_bool(cond, scope);
            }
            StmtKind::For(init, cond, step, body) => {
                scope.push_child();
                self.check_for_clause(init, scope);
                if let Some(c) = cond {
                    self.expect_bool(c, scope);
                }
                self.loop_depth += 1;
                scope.push_child();
                self.check_stmt(body, scope);
                scope.pop_to_parent();
                if let Some(s) = step {
                    self.check_for_clause(s, scope);
                }
                self.loop_depth -= 1;
                scope.pop_to_parent();
            }
            StmtKind::Switch(subject, cases) => {
                let subject_ty = self.infer(subject, scope);
                if !matches!(subject_ty, Some(Scalar::I32) | None) {
                    self.diagnostics.push(Diagnostic::error(
                        subject.pos,
                        "O3S206",
                        "switch subject must be 'i32'",
                    ));
                }
                self.switch_depth += 1;
                for case in cases {
                    self.check_block(&case.body, scope);
                }
                self.switch_depth -= 1;
            }
            StmtKind::Block(stmts, _) => self.check_block(stmts, scope),
            StmtKind::ExprStmt(expr) => {
                self.infer(expr, scope);
            }
            StmtKind::Break => {
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    self.diagnostics.push(Diagnostic::error(stmt.pos, "O3S212", "'break' outside a loop or switch"));
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.diagnostics.push(Diagnostic::error(stmt.pos, "O3S213", "'continue' outside a loop"));
                }
            }
            StmtKind::Empty => {}
        }
    }

    fn check_for_clause(&mut self, clause: &ForClause, scope: &mut Scope) {
        match clause {
            ForClause::None => {}
            ForClause::Let(name, value) => {
                let ty = self.infer(value, scope).unwrap_or(Scalar::Unknown);
                scope.declare(name, ty);
            }
            ForClause::Assign(name, _, value) => {
                if let Some(v) = value {
                    self.infer(v, scope);
                }
                if scope.lookup(name).is_none() && !self.surface.globals.contains_key(name) {
                    self.diagnostics.push(Diagnostic::error(
                        value.as_ref().map(|v| v.pos).unwrap_or_default(),
                        "O3S214",
                        format!("assignment to undeclared name '{}'", name),
                    ));
                }
            }
            ForClause::IncDec(name, _) => {
                if scope.lookup(name).is_none() && !self.surface.globals.contains_key(name) {
                    self.diagnostics.push(Diagnostic::error(
                        Pos::default(),
                        "O3S214",
                        format!("increment/decrement of undeclared name '{}'", name),
                    ));
                }
            }
            ForClause::Expr(e) => {
                self.infer(e, scope);
            }
        }
    }

    fn expect_bool(&mut self, expr: &Expr, scope: &Scope) {
        if let Some(ty) = self.infer(expr, scope) {
            if ty != Scalar::Bool {
                self.diagnostics.push(Diagnostic::error(expr.pos, "O3S206", "condition must be 'bool'"));
            }
        }
    }

    fn infer(&mut self, expr: &Expr, scope: &Scope) -> Option<Scalar> {
        match &expr.kind {
            ExprKind::Number(_) => Some(Scalar::I32),
            ExprKind::Bool(_) => Some(Scalar::Bool),
            ExprKind::Nil => Some(Scalar::I32),
            ExprKind::Ident(name) => {
                // `self` is always in scope, even inside a free `fn` — it
                // denotes the implicit message-send receiver and collapses
                // to `i32` like every other object-pointer family.
                if name == "self" {
                    return Some(Scalar::I32);
                }
                if let Some(ty) = scope.lookup(name) {
                    return Some(ty);
                }
                if let Some(g) = self.surface.globals.get(name) {
                    let _ = g;
                    return Some(Scalar::I32);
                }
                self.diagnostics.push(Diagnostic::error(expr.pos, "O3S202", format!("unknown identifier '{}'", name)));
                None
            }
            ExprKind::Binary(op, lhs, rhs) => {
                let lt = self.infer(lhs, scope);
                let rt = self.infer(rhs, scope);
                let (lt, rt) = (lt?, rt?);
                if op.is_logical() {
                    if lt != Scalar::Bool || rt != Scalar::Bool {
                        self.diagnostics.push(Diagnostic::error(expr.pos, "O3S206", format!("operator '{}' requires 'bool' operands", op.as_str())));
                    }
                    Some(Scalar::Bool)
                } else if op.is_comparison() {
                    if lt != rt {
                        self.diagnostics.push(Diagnostic::error(expr.pos, "O3S206", format!("operator '{}' requires matching operand types", op.as_str())));
                    }
                    Some(Scalar::Bool)
                } else {
                    debug_assert!(op.is_arith_or_bitwise());
                    Some(Scalar::I32)
                }
            }
            ExprKind::Conditional(cond, then_e, else_e) => {
                self.expect_bool(cond, scope);
                let tt = self.infer(then_e, scope);
                let et = self.infer(else_e, scope);
                match (tt, et) {
                    (Some(t), Some(e)) if t != e => {
                        self.diagnostics.push(Diagnostic::error(expr.pos, "O3S206", "ternary branches must have matching types"));
                        Some(t)
                    }
                    (Some(t), _) => Some(t),
                    (None, Some(e)) => Some(e),
                    (None, None) => None,
                }
            }
            ExprKind::Call(name, args) => {
                for arg in args {
                    self.infer(arg, scope);
                }
                match self.surface.functions.get(name) {
                    Some(info) => {
                        if info.params.len() != args.len() {
                            self.diagnostics.push(Diagnostic::error(
                                expr.pos,
                                "O3S204",
                                format!("'{}' expects {} argument(s), found {}", name, info.params.len(), args.len()),
                            ));
                        }
                        Some(info.return_type)
                    }
                    None => {
                        self.diagnostics.push(Diagnostic::error(expr.pos, "O3S203", format!("call to unknown function '{}'", name)));
                        None
                    }
                }
            }
            ExprKind::MessageSend(receiver, _selector, args) => {
                let receiver_ty = self.infer(receiver, scope);
                if let Some(ty) = receiver_ty {
                    if ty != Scalar::I32 {
                        self.diagnostics.push(Diagnostic::error(receiver.pos, "O3S207", "message-send receiver must be 'i32'-compatible"));
                    }
                }
                for arg in args {
                    let arg_ty = self.infer(arg, scope);
                    if let Some(ty) = arg_ty {
                        if ty != Scalar::I32 {
                            self.diagnostics.push(Diagnostic::error(arg.pos, "O3S209", "message-send argument must be 'i32'-compatible"));
                        }
                    }
                }
                if args.len() > self.options.max_message_send_args {
                    self.diagnostics.push(Diagnostic::error(
                        expr.pos,
                        "O3S208",
                        format!(
                            "message send has {} argument(s), exceeding the configured bound of {}",
                            args.len(),
                            self.options.max_message_send_args
                        ),
                    ));
                }
                Some(Scalar::I32)
            }
        }
    }
}

fn const_eval(expr: &Expr, env: &HashMap<String, Option<i32>>) -> Option<i32> {
    match &expr.kind {
        ExprKind::Number(n) => Some(*n),
        ExprKind::Bool(b) => Some(if *b { 1 } else { 0 }),
        ExprKind::Nil => Some(0),
        ExprKind::Ident(name) => env.get(name).copied().flatten(),
        ExprKind::Binary(op, lhs, rhs) => {
            let l = const_eval(lhs, env)?;
            let r = const_eval(rhs, env)?;
            const_binop(*op, l, r)
        }
        ExprKind::Conditional(cond, then_e, else_e) => {
            let c = const_eval(cond, env)?;
            if c != 0 { const_eval(then_e, env) } else { const_eval(else_e, env) }
        }
        ExprKind::Call(..) | ExprKind::MessageSend(..) => None,
    }
}

fn const_binop(op: BinOp, l: i32, r: i32) -> Option<i32> {
    Some(match op {
        BinOp::Add => l.wrapping_add(r),
        BinOp::Sub => l.wrapping_sub(r),
        BinOp::Mul => l.wrapping_mul(r),
        BinOp::Div if r != 0 => l.wrapping_div(r),
        BinOp::Mod if r != 0 => l.wrapping_rem(r),
        BinOp::Div | BinOp::Mod => return None,
        BinOp::BitAnd => l & r,
        BinOp::BitOr => l | r,
        BinOp::BitXor => l ^ r,
        BinOp::Shl => l.wrapping_shl(r as u32),
        BinOp::Shr => l.wrapping_shr(r as u32),
        BinOp::Eq => (l == r) as i32,
        BinOp::Ne => (l != r) as i32,
        BinOp::Lt => (l < r) as i32,
        BinOp::Le => (l <= r) as i32,
        BinOp::Gt => (l > r) as i32,
        BinOp::Ge => (l >= r) as i32,
        BinOp::LogAnd => (l != 0 && r != 0) as i32,
        BinOp::LogOr => (l != 0 || r != 0) as i32,
    })
}

/// True if every path through `stmts` reaches a `return` (or otherwise
/// diverges, e.g. an unconditional infinite loop with no reachable `break`).
fn definitely_returns(stmts: &[Stmt], env: &mut HashMap<String, Option<i32>>) -> bool {
    for stmt in stmts {
        if definitely_returns_stmt(stmt, env) {
            return true;
        }
        if let StmtKind::Let(name, value) = &stmt.kind {
            let value = const_eval(value, env);
            env.insert(name.clone(), value);
        }
    }
    false
}

fn is_statically_true(expr: &Expr, env: &HashMap<String, Option<i32>>) -> bool {
    matches!(const_eval(expr, env), Some(v) if v != 0)
}

fn is_statically_false(expr: &Expr, env: &HashMap<String, Option<i32>>) -> bool {
    matches!(const_eval(expr, env), Some(0))
}

/// A statically-true/false condition lets an `if`/loop with only one live
/// branch still count as definitely returning, and a loop only counts if its
/// body itself definitely returns — an unconditional `while (true) { f(); }`
/// with no `return` inside does not definitely return just because it never
/// falls through.
fn definitely_returns_stmt(stmt: &Stmt, env: &HashMap<String, Option<i32>>) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::Block(stmts, _) => definitely_returns(stmts, &mut env.clone()),
        StmtKind::If(cond, then_b, else_b) => {
            if is_statically_true(cond, env) {
                return definitely_returns_stmt(then_b, env);
            }
            if is_statically_false(cond, env) {
                return else_b.as_deref().is_some_and(|e| definitely_returns_stmt(e, env));
            }
            match else_b {
                Some(e) => definitely_returns_stmt(then_b, env) && definitely_returns_stmt(e, env),
                None => false,
            }
        }
        StmtKind::While(cond, body) => is_statically_true(cond, env) && definitely_returns_stmt(body, env),
        StmtKind::DoWhile(body, _cond) => definitely_returns_stmt(body, env),
        StmtKind::For(_, cond, _, body) => {
            let guaranteed_entry = match cond {
                None => true,
                Some(c) => is_statically_true(c, env),
            };
            guaranteed_entry && definitely_returns_stmt(body, env)
        }
        StmtKind::Switch(subject, cases) => switch_definitely_returns(subject, cases, env),
        StmtKind::Let(..)
        | StmtKind::Assign(..)
        | StmtKind::IncDec(..)
        | StmtKind::ExprStmt(_)
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Empty => false,
    }
}

/// A `switch` definitely returns either when its scrutinee folds to a
/// compile-time constant (only the arm that constant selects matters), or —
/// failing that — when every arm, chained through fallthrough, ends up
/// guaranteed to return and a `default` arm is present.
fn switch_definitely_returns(subject: &Expr, cases: &[crate::ast::SwitchCase], env: &HashMap<String, Option<i32>>) -> bool {
    if cases.is_empty() {
        return false;
    }

    let mut arm_guarantees = vec![false; cases.len()];
    let mut has_default = false;
    let mut next_arm_guarantees_return = false;
    for i in (0..cases.len()).rev() {
        has_default = has_default || cases[i].label.is_none();
        let guarantee = if definitely_returns(&cases[i].body, &mut env.clone()) {
            true
        } else if block_falls_through(&cases[i].body, env) {
            next_arm_guarantees_return
        } else {
            false
        };
        arm_guarantees[i] = guarantee;
        next_arm_guarantees_return = guarantee;
    }

    if let Some(value) = const_eval(subject, env) {
        let mut default_index = None;
        let mut selected_index = None;
        for (i, case) in cases.iter().enumerate() {
            match case.label {
                None => {
                    if default_index.is_none() {
                        default_index = Some(i);
                    }
                }
                Some(label) if label == value => {
                    selected_index = Some(i);
                    break;
                }
                Some(_) => {}
            }
        }
        return match selected_index.or(default_index) {
            Some(i) => arm_guarantees[i],
            None => false,
        };
    }

    has_default && arm_guarantees.iter().all(|&g| g)
}

/// Whether control can fall off the end of `stmts` (as opposed to returning,
/// breaking, or continuing) — used to chain a `switch` arm's fallthrough into
/// the next arm's return guarantee.
fn block_falls_through(stmts: &[Stmt], env: &HashMap<String, Option<i32>>) -> bool {
    let mut env = env.clone();
    for stmt in stmts {
        if definitely_returns_stmt(stmt, &env) {
            return true;
        }
        if !falls_through(stmt, &env) {
            return false;
        }
        if let StmtKind::Let(name, value) = &stmt.kind {
            let v = const_eval(value, &env);
            env.insert(name.clone(), v);
        }
    }
    true
}

fn falls_through(stmt: &Stmt, env: &HashMap<String, Option<i32>>) -> bool {
    match &stmt.kind {
        StmtKind::Let(..) | StmtKind::Assign(..) | StmtKind::IncDec(..) | StmtKind::ExprStmt(_) | StmtKind::Empty => true,
        StmtKind::Block(stmts, _) => block_falls_through(stmts, env),
        StmtKind::If(cond, then_b, else_b) => {
            let then_ok = falls_through(then_b, env);
            let else_ok = match else_b.as_deref() {
                Some(e) => falls_through(e, env),
                None => true,
            };
            if is_statically_true(cond, env) {
                then_ok
            } else if is_statically_false(cond, env) {
                else_ok
            } else {
                then_ok && else_ok
            }
        }
        // A nested switch that does not itself guarantee return may still
        // complete and fall through into whatever follows it.
        StmtKind::Switch(..) => true,
        StmtKind::Return(_) | StmtKind::Break | StmtKind::Continue => false,
        StmtKind::DoWhile(body, cond) => is_statically_false(cond, env) && falls_through(body, env),
        StmtKind::For(_, cond, _, _) => match cond {
            Some(c) => is_statically_false(c, env),
            None => false,
        },
        StmtKind::While(cond, _) => is_statically_false(cond, env),
    }
}
