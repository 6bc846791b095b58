//! Pass 1 (spec §4.3): build the symbol surface — every global and function
//! signature, with constant-folding for globals and duplicate detection.

use std::collections::HashMap;

use crate::ast::{BinOp, Expr, ExprKind, FunctionDecl, Program, Scalar};
use crate::common::{Diagnostic, Pos};

#[derive(Debug, Clone)]
pub struct GlobalInfo {
    pub pos: Pos,
    /// `Some` when the initializer folds to a compile-time constant.
    pub const_value: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub params: Vec<Scalar>,
    pub return_type: Scalar,
    pub is_pure: bool,
    pub is_defined: bool,
    pub is_prototype: bool,
    pub pos: Pos,
}

#[derive(Debug, Default)]
pub struct SymbolSurface {
    pub globals: HashMap<String, GlobalInfo>,
    pub functions: HashMap<String, FunctionInfo>,
}

pub fn build_surface(program: &Program, diagnostics: &mut Vec<Diagnostic>) -> SymbolSurface {
    let mut surface = SymbolSurface::default();

    if program.module_decls.len() > 1 {
        let (name, pos) = &program.module_decls[1];
        diagnostics.push(Diagnostic::error(*pos, "O3S200", format!("module '{}' redeclares the module name", name)));
    }

    for global in &program.globals {
        if surface.globals.contains_key(&global.name) {
            diagnostics.push(Diagnostic::error(
                global.pos,
                "O3S200",
                format!("global '{}' is already declared", global.name),
            ));
            continue;
        }
        if surface.functions.contains_key(&global.name) {
            diagnostics.push(Diagnostic::error(
                global.pos,
                "O3S200",
                format!("global '{}' conflicts with a function of the same name", global.name),
            ));
            continue;
        }
        let const_value = fold_const(&global.initializer, &surface.globals);
        if const_value.is_none() {
            diagnostics.push(Diagnostic::error(
                global.initializer.pos,
                "O3S210",
                format!("initializer for global '{}' is not a compile-time constant", global.name),
            ));
        }
        surface.globals.insert(global.name.clone(), GlobalInfo { pos: global.pos, const_value });
    }

    for function in &program.functions {
        register_function(&mut surface, function, diagnostics);
    }

    surface
}

fn register_function(surface: &mut SymbolSurface, function: &FunctionDecl, diagnostics: &mut Vec<Diagnostic>) {
    let params: Vec<Scalar> = function.params.iter().map(|p| p.ty.scalar).collect();
    let return_type = function.return_type.scalar;

    if surface.globals.contains_key(&function.name) {
        diagnostics.push(Diagnostic::error(
            function.pos,
            "O3S200",
            format!("function '{}' conflicts with a global of the same name", function.name),
        ));
        return;
    }

    match surface.functions.get(&function.name) {
        None => {
            surface.functions.insert(
                function.name.clone(),
                FunctionInfo {
                    params,
                    return_type,
                    is_pure: function.is_pure,
                    is_defined: function.is_defined(),
                    is_prototype: function.is_prototype,
                    pos: function.pos,
                },
            );
        }
        Some(existing) => {
            let signature_matches = existing.params == params && existing.return_type == return_type;
            let both_defined = existing.is_defined && function.is_defined();
            let existing_is_pure = existing.is_pure;
            let existing_pos = existing.pos;
            if !signature_matches || both_defined {
                diagnostics.push(Diagnostic::error(
                    function.pos,
                    "O3S200",
                    format!("function '{}' conflicts with its earlier declaration", function.name),
                ));
                return;
            }
            // A prototype followed by a matching definition refines the entry.
            if function.is_defined() {
                surface.functions.insert(
                    function.name.clone(),
                    FunctionInfo {
                        params,
                        return_type,
                        is_pure: existing_is_pure || function.is_pure,
                        is_defined: true,
                        is_prototype: false,
                        pos: existing_pos,
                    },
                );
            }
        }
    }
}

/// Best-effort constant folding over arithmetic/bitwise/logical expressions,
/// treating `bool` as `0`/`1` the way the IR emitter widens it (spec §4.5).
pub fn fold_const(expr: &Expr, globals: &HashMap<String, GlobalInfo>) -> Option<i32> {
    match &expr.kind {
        ExprKind::Number(n) => Some(*n),
        ExprKind::Bool(b) => Some(if *b { 1 } else { 0 }),
        ExprKind::Nil => Some(0),
        ExprKind::Ident(name) => globals.get(name).and_then(|g| g.const_value),
        ExprKind::Binary(op, lhs, rhs) => {
            let l = fold_const(lhs, globals)?;
            let r = fold_const(rhs, globals)?;
            fold_binop(*op, l, r)
        }
        ExprKind::Conditional(cond, then_e, else_e) => {
            let c = fold_const(cond, globals)?;
            if c != 0 {
                fold_const(then_e, globals)
            } else {
                fold_const(else_e, globals)
            }
        }
        ExprKind::Call(..) | ExprKind::MessageSend(..) => None,
    }
}

fn fold_binop(op: BinOp, l: i32, r: i32) -> Option<i32> {
    Some(match op {
        BinOp::Add => l.wrapping_add(r),
        BinOp::Sub => l.wrapping_sub(r),
        BinOp::Mul => l.wrapping_mul(r),
        BinOp::Div => {
            if r == 0 {
                return None;
            }
            l.wrapping_div(r)
        }
        BinOp::Mod => {
            if r == 0 {
                return None;
            }
            l.wrapping_rem(r)
        }
        BinOp::BitAnd => l & r,
        BinOp::BitOr => l | r,
        BinOp::BitXor => l ^ r,
        BinOp::Shl => l.wrapping_shl(r as u32),
        BinOp::Shr => l.wrapping_shr(r as u32),
        BinOp::Eq => bool_to_i32(l == r),
        BinOp::Ne => bool_to_i32(l != r),
        BinOp::Lt => bool_to_i32(l < r),
        BinOp::Le => bool_to_i32(l <= r),
        BinOp::Gt => bool_to_i32(l > r),
        BinOp::Ge => bool_to_i32(l >= r),
        BinOp::LogAnd => bool_to_i32(l != 0 && r != 0),
        BinOp::LogOr => bool_to_i32(l != 0 || r != 0),
    })
}

fn bool_to_i32(b: bool) -> i32 {
    if b {
        1
    } else {
        0
    }
}
