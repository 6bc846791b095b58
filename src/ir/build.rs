//! The emission pass proper (spec §4.5): walks a diagnostics-clean `Program`
//! plus its `SymbolSurface` and `LoweringContract` into an `IrModule`.
//!
//! Every global read and write lowers to a fresh `load`/`store` against its
//! `@name` — the builder never caches a global's value in a register, so
//! there is no "invalidate on call" bookkeeping to get wrong.

use std::collections::HashMap;

use string_interner::{DefaultStringInterner, DefaultSymbol};

use crate::ast::{
    AssignOp, BinOp, Expr, ExprKind, ForClause, FunctionDecl, Program, Scalar, Stmt, StmtKind,
};
use crate::lower::LoweringContract;
use crate::sema::SymbolSurface;

use super::inst::{IcmpCond, Inst, IntBinOp, IrType, Temp, Value};
use super::module::{IrFunction, IrGlobal, IrModule};

fn ir_type(scalar: Scalar) -> IrType {
    match scalar {
        Scalar::Bool => IrType::I1,
        Scalar::Void => IrType::Void,
        // `Unknown`/`Function` never reach codegen on a diagnostics-clean
        // program; fall back to `i32` rather than panic.
        Scalar::I32 | Scalar::Unknown | Scalar::Function => IrType::I32,
    }
}

fn binop_to_intbinop(op: BinOp) -> Option<IntBinOp> {
    Some(match op {
        BinOp::Add => IntBinOp::Add,
        BinOp::Sub => IntBinOp::Sub,
        BinOp::Mul => IntBinOp::Mul,
        BinOp::Div => IntBinOp::Sdiv,
        BinOp::Mod => IntBinOp::Srem,
        BinOp::BitAnd => IntBinOp::And,
        BinOp::BitOr => IntBinOp::Or,
        BinOp::BitXor => IntBinOp::Xor,
        BinOp::Shl => IntBinOp::Shl,
        BinOp::Shr => IntBinOp::Ashr,
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::LogAnd | BinOp::LogOr => {
            return None
        }
    })
}

fn icmp_cond(op: BinOp) -> Option<IcmpCond> {
    Some(match op {
        BinOp::Eq => IcmpCond::Eq,
        BinOp::Ne => IcmpCond::Ne,
        BinOp::Lt => IcmpCond::Slt,
        BinOp::Le => IcmpCond::Sle,
        BinOp::Gt => IcmpCond::Sgt,
        BinOp::Ge => IcmpCond::Sge,
        _ => return None,
    })
}

/// Turns a selector string into a valid LLVM global identifier, e.g.
/// `"initWithValue:"` becomes `sel.initWithValue_`.
fn selector_global_name(selector: &str) -> String {
    let mut out = String::with_capacity(selector.len() + 4);
    out.push_str("sel.");
    for c in selector.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

fn default_value(ty: IrType) -> Value {
    match ty {
        IrType::I1 => Value::ConstI1(false),
        IrType::I32 | IrType::Void => Value::ConstI32(0),
    }
}

fn ends_in_terminator(insts: &[Inst]) -> bool {
    matches!(insts.last(), Some(Inst::Ret(_)) | Some(Inst::Br(_)) | Some(Inst::CondBr { .. }))
}

/// Emits the module-level pieces (globals, selector constants, runtime
/// dispatch declaration, per-function bodies, synthesized entry point).
pub struct IrBuilder;

impl IrBuilder {
    pub fn build(program: &Program, surface: &SymbolSurface, contract: &LoweringContract) -> IrModule {
        let mut module = IrModule::new();
        module.header_comments.push(contract.replay_key());
        if let Some(name) = program.module_name() {
            module.header_comments.push(format!("module={}", name));
        }

        emit_globals(program, surface, &mut module);
        emit_selector_constants(program, &mut module);
        emit_runtime_dispatch_declaration(contract, &mut module);

        for function in &program.functions {
            if !function.is_defined() {
                module.functions.push(declare(function));
                continue;
            }
            let mut fb = FunctionBuilder::new(surface, contract);
            module.functions.push(fb.build_function(function));
        }

        module.functions.push(synthesize_entry(program, surface));

        module
    }
}

fn emit_globals(program: &Program, surface: &SymbolSurface, module: &mut IrModule) {
    for global in &program.globals {
        let init = surface.globals.get(&global.name).and_then(|g| g.const_value).unwrap_or(0);
        module.globals.push(IrGlobal { name: global.name.clone(), ty: IrType::I32, init });
    }
}

/// Collects every selector literal reached by a `MessageSend`, across free
/// functions and Objective-C method bodies alike, interning each occurrence
/// so repeated selectors in a translation unit share one symbol, then emits
/// one string constant per distinct selector in lexicographic order (spec
/// §4.5 point 3).
fn emit_selector_constants(program: &Program, module: &mut IrModule) {
    let mut interner: DefaultStringInterner = DefaultStringInterner::new();
    for function in &program.functions {
        if let Some(body) = &function.body {
            collect_selectors(body, &mut interner);
        }
    }
    for interface in &program.interfaces {
        for method in &interface.methods {
            if let Some(body) = &method.body {
                collect_selectors(body, &mut interner);
            }
        }
    }
    for implementation in &program.implementations {
        for method in &implementation.methods {
            if let Some(body) = &method.body {
                collect_selectors(body, &mut interner);
            }
        }
    }
    let mut selectors: Vec<&str> = (&interner).into_iter().map(|(_, text)| text).collect();
    selectors.sort_unstable();
    for selector in selectors {
        let name = selector_global_name(selector);
        module.selector_constants.push((name, selector.to_string()));
    }
}

fn emit_runtime_dispatch_declaration(contract: &LoweringContract, module: &mut IrModule) {
    let mut params = vec![("receiver".to_string(), IrType::I32), ("selector".to_string(), IrType::I32)];
    for i in 0..contract.runtime_dispatch_arg_slots {
        params.push((format!("arg{}", i), IrType::I32));
    }
    module.functions.push(IrFunction {
        name: contract.runtime_dispatch_symbol.clone(),
        params,
        return_type: IrType::I32,
        is_declaration: true,
        body: Vec::new(),
    });
}

fn declare(function: &FunctionDecl) -> IrFunction {
    IrFunction {
        name: function.name.clone(),
        params: function.params.iter().map(|p| (p.name.clone(), ir_type(p.ty.scalar))).collect(),
        return_type: ir_type(function.return_type.scalar),
        is_declaration: true,
        body: Vec::new(),
    }
}

/// A distinct entry point (spec §4.5 point 9): if the program defines
/// `main` with zero parameters, the entry calls it and returns its
/// (possibly widened) value as `i32`; otherwise it sums every global's
/// value and returns that sum.
fn synthesize_entry(program: &Program, surface: &SymbolSurface) -> IrFunction {
    let mut insts = Vec::new();
    let mut next = 0u32;

    let main_info = surface.functions.get("main").filter(|info| info.is_defined && info.params.is_empty());
    let ret = if let Some(info) = main_info {
        let call_ty = ir_type(info.return_type);
        let dst = Temp(next);
        next += 1;
        insts.push(Inst::Call { dst: Some(dst), ty: call_ty, callee: "main".to_string(), args: Vec::new() });
        match call_ty {
            IrType::I1 => {
                let widened = Temp(next);
                next += 1;
                insts.push(Inst::Zext { dst: widened, value: Value::Temp(dst), from: IrType::I1, to: IrType::I32 });
                Value::Temp(widened)
            }
            IrType::I32 => Value::Temp(dst),
            IrType::Void => Value::ConstI32(0),
        }
    } else {
        let mut sum: Option<Temp> = None;
        for global in &program.globals {
            let dst = Temp(next);
            next += 1;
            insts.push(Inst::Load { dst, ty: IrType::I32, ptr: Value::Global(global.name.clone()) });
            sum = Some(match sum {
                None => dst,
                Some(prev) => {
                    let add_dst = Temp(next);
                    next += 1;
                    insts.push(Inst::Binary {
                        dst: add_dst,
                        op: IntBinOp::Add,
                        ty: IrType::I32,
                        lhs: Value::Temp(prev),
                        rhs: Value::Temp(dst),
                    });
                    add_dst
                }
            });
        }
        sum.map(Value::Temp).unwrap_or(Value::ConstI32(0))
    };

    insts.push(Inst::Ret(Some((IrType::I32, ret))));
    IrFunction {
        name: "o3_entry".to_string(),
        params: Vec::new(),
        return_type: IrType::I32,
        is_declaration: false,
        body: insts,
    }
}

struct FunctionBuilder<'a> {
    surface: &'a SymbolSurface,
    contract: &'a LoweringContract,
    temp_counter: u32,
    label_counter: u32,
    insts: Vec<Inst>,
    locals: HashMap<String, (Temp, IrType)>,
    break_labels: Vec<String>,
    continue_labels: Vec<String>,
}

impl<'a> FunctionBuilder<'a> {
    fn new(surface: &'a SymbolSurface, contract: &'a LoweringContract) -> Self {
        Self {
            surface,
            contract,
            temp_counter: 0,
            label_counter: 0,
            insts: Vec::new(),
            locals: HashMap::new(),
            break_labels: Vec::new(),
            continue_labels: Vec::new(),
        }
    }

    fn new_temp(&mut self) -> Temp {
        let t = Temp(self.temp_counter);
        self.temp_counter += 1;
        t
    }

    fn new_label(&mut self, prefix: &str) -> String {
        let label = format!("{}.{}", prefix, self.label_counter);
        self.label_counter += 1;
        label
    }

    fn emit(&mut self, inst: Inst) {
        self.insts.push(inst);
    }

    fn build_function(&mut self, function: &FunctionDecl) -> IrFunction {
        self.emit(Inst::Label("entry".to_string()));
        let mut params = Vec::new();
        for param in &function.params {
            let ty = ir_type(param.ty.scalar);
            let slot = self.new_temp();
            self.emit(Inst::Alloca { dst: slot, ty });
            self.emit(Inst::Store { ty, value: Value::Reg(param.name.clone()), ptr: Value::Temp(slot) });
            self.locals.insert(param.name.clone(), (slot, ty));
            params.push((param.name.clone(), ty));
        }

        let return_type = ir_type(function.return_type.scalar);
        let body = function.body.as_deref().unwrap_or(&[]);
        self.lower_block(body);

        if !ends_in_terminator(&self.insts) {
            match return_type {
                IrType::Void => self.emit(Inst::Ret(None)),
                other => self.emit(Inst::Ret(Some((other, default_value(other))))),
            }
        }

        IrFunction {
            name: function.name.clone(),
            params,
            return_type,
            is_declaration: false,
            body: std::mem::take(&mut self.insts),
        }
    }

    // -- statements ---------------------------------------------------

    fn lower_block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Empty => {}
            StmtKind::Let(name, init) => {
                let (value, ty) = self.lower_expr(init);
                let slot = self.new_temp();
                self.emit(Inst::Alloca { dst: slot, ty });
                self.emit(Inst::Store { ty, value, ptr: Value::Temp(slot) });
                self.locals.insert(name.clone(), (slot, ty));
            }
            StmtKind::Assign(name, op, rhs) => self.lower_assign(name, op, rhs.as_ref()),
            StmtKind::IncDec(name, op) => self.lower_incdec(name, *op),
            StmtKind::Return(value) => {
                match value {
                    Some(e) => {
                        let (v, ty) = self.lower_expr(e);
                        self.emit(Inst::Ret(Some((ty, v))));
                    }
                    None => self.emit(Inst::Ret(None)),
                }
            }
            StmtKind::ExprStmt(e) => {
                self.lower_expr(e);
            }
            StmtKind::Block(stmts, tag) => {
                if let Some(tag) = tag {
                    self.emit(Inst::Comment(format!("autoreleasepool {}", tag)));
                }
                self.lower_block(stmts);
            }
            StmtKind::If(cond, then_s, else_s) => self.lower_if(cond, then_s, else_s.as_deref()),
            StmtKind::While(cond, body) => self.lower_while(cond, body),
            StmtKind::DoWhile(body, cond) => self.lower_do_while(body, cond),
            StmtKind::For(init, cond, step, body) => self.lower_for(init, cond.as_ref(), step.as_ref(), body),
            StmtKind::Switch(scrutinee, cases) => self.lower_switch(scrutinee, cases),
            StmtKind::Break => {
                let label = self.break_labels.last().cloned().expect("sema guarantees break is inside a loop/switch");
                self.emit(Inst::Br(label));
            }
            StmtKind::Continue => {
                let label = self.continue_labels.last().cloned().expect("sema guarantees continue is inside a loop");
                self.emit(Inst::Br(label));
            }
        }
    }

    fn lower_assign(&mut self, name: &str, op: &AssignOp, rhs: &Option<Expr>) {
        let (slot, ty) = self.local_or_global(name);
        let new_value = match op.to_binop() {
            None => {
                let (v, _) = self.lower_expr(rhs.as_ref().expect("plain assignment always carries a value"));
                v
            }
            Some(binop) => {
                let current = self.new_temp();
                self.emit(Inst::Load { dst: current, ty, ptr: slot.clone() });
                let (rhs_v, _) = self.lower_expr(rhs.as_ref().expect("compound assignment always carries a value"));
                let dst = self.new_temp();
                let op = binop_to_intbinop(binop).expect("assignment binops are never comparisons");
                self.emit(Inst::Binary { dst, op, ty, lhs: Value::Temp(current), rhs: rhs_v });
                Value::Temp(dst)
            }
        };
        self.emit(Inst::Store { ty, value: new_value, ptr: slot });
    }

    fn lower_incdec(&mut self, name: &str, op: crate::ast::IncDecOp) {
        let (slot, ty) = self.local_or_global(name);
        let current = self.new_temp();
        self.emit(Inst::Load { dst: current, ty, ptr: slot.clone() });
        let dst = self.new_temp();
        let binop = match op {
            crate::ast::IncDecOp::Inc => IntBinOp::Add,
            crate::ast::IncDecOp::Dec => IntBinOp::Sub,
        };
        self.emit(Inst::Binary { dst, op: binop, ty, lhs: Value::Temp(current), rhs: Value::ConstI32(1) });
        self.emit(Inst::Store { ty, value: Value::Temp(dst), ptr: slot });
    }

    /// Returns the storage location (as a `Value` suitable for `load`/`store`
    /// `ptr` operands) and scalar type for an assignment/read target that is
    /// either a local (alloca'd slot) or a global.
    fn local_or_global(&self, name: &str) -> (Value, IrType) {
        if let Some((slot, ty)) = self.locals.get(name) {
            return (Value::Temp(*slot), *ty);
        }
        let ty = self
            .surface
            .globals
            .get(name)
            .map(|_| IrType::I32)
            .expect("sema guarantees every assignment/read target is declared");
        (Value::Global(name.to_string()), ty)
    }

    fn lower_if(&mut self, cond: &Expr, then_s: &Stmt, else_s: Option<&Stmt>) {
        let (cond_v, _) = self.lower_expr_as_i1(cond);
        let then_label = self.new_label("if.then");
        let end_label = self.new_label("if.end");
        let else_label = if else_s.is_some() { self.new_label("if.else") } else { end_label.clone() };

        self.emit(Inst::CondBr { cond: cond_v, then_label: then_label.clone(), else_label: else_label.clone() });
        self.emit(Inst::Label(then_label));
        self.lower_stmt(then_s);
        if !ends_in_terminator(&self.insts) {
            self.emit(Inst::Br(end_label.clone()));
        }

        if let Some(else_s) = else_s {
            self.emit(Inst::Label(else_label));
            self.lower_stmt(else_s);
            if !ends_in_terminator(&self.insts) {
                self.emit(Inst::Br(end_label.clone()));
            }
        }

        self.emit(Inst::Label(end_label));
    }

    fn lower_while(&mut self, cond: &Expr, body: &Stmt) {
        let cond_label = self.new_label("while.cond");
        let body_label = self.new_label("while.body");
        let end_label = self.new_label("while.end");

        self.emit(Inst::Br(cond_label.clone()));
        self.emit(Inst::Label(cond_label.clone()));
        let (cond_v, _) = self.lower_expr_as_i1(cond);
        self.emit(Inst::CondBr { cond: cond_v, then_label: body_label.clone(), else_label: end_label.clone() });

        self.emit(Inst::Label(body_label));
        self.break_labels.push(end_label.clone());
        self.continue_labels.push(cond_label.clone());
        self.lower_stmt(body);
        self.continue_labels.pop();
        self.break_labels.pop();
        if !ends_in_terminator(&self.insts) {
            self.emit(Inst::Br(cond_label));
        }

        self.emit(Inst::Label(end_label));
    }

    fn lower_do_while(&mut self, body: &Stmt, cond: &Expr) {
        let body_label = self.new_label("do.body");
        let cond_label = self.new_label("do.cond");
        let end_label = self.new_label("do.end");

        self.emit(Inst::Br(body_label.clone()));
        self.emit(Inst::Label(body_label.clone()));
        self.break_labels.push(end_label.clone());
        self.continue_labels.push(cond_label.clone());
        self.lower_stmt(body);
        self.continue_labels.pop();
        self.break_labels.pop();
        if !ends_in_terminator(&self.insts) {
            self.emit(Inst::Br(cond_label.clone()));
        }

        self.emit(Inst::Label(cond_label));
        let (cond_v, _) = self.lower_expr_as_i1(cond);
        self.emit(Inst::CondBr { cond: cond_v, then_label: body_label, else_label: end_label.clone() });

        self.emit(Inst::Label(end_label));
    }

    fn lower_for(&mut self, init: &ForClause, cond: Option<&Expr>, step: Option<&ForClause>, body: &Stmt) {
        self.lower_for_clause(init);

        let cond_label = self.new_label("for.cond");
        let body_label = self.new_label("for.body");
        let step_label = self.new_label("for.step");
        let end_label = self.new_label("for.end");

        self.emit(Inst::Br(cond_label.clone()));
        self.emit(Inst::Label(cond_label.clone()));
        match cond {
            Some(cond) => {
                let (cond_v, _) = self.lower_expr_as_i1(cond);
                self.emit(Inst::CondBr { cond: cond_v, then_label: body_label.clone(), else_label: end_label.clone() });
            }
            None => self.emit(Inst::Br(body_label.clone())),
        }

        self.emit(Inst::Label(body_label));
        self.break_labels.push(end_label.clone());
        self.continue_labels.push(step_label.clone());
        self.lower_stmt(body);
        self.continue_labels.pop();
        self.break_labels.pop();
        if !ends_in_terminator(&self.insts) {
            self.emit(Inst::Br(step_label.clone()));
        }

        self.emit(Inst::Label(step_label));
        if let Some(step) = step {
            self.lower_for_clause(step);
        }
        self.emit(Inst::Br(cond_label));

        self.emit(Inst::Label(end_label));
    }

    fn lower_for_clause(&mut self, clause: &ForClause) {
        match clause {
            ForClause::None => {}
            ForClause::Let(name, init) => {
                let (value, ty) = self.lower_expr(init);
                let slot = self.new_temp();
                self.emit(Inst::Alloca { dst: slot, ty });
                self.emit(Inst::Store { ty, value, ptr: Value::Temp(slot) });
                self.locals.insert(name.clone(), (slot, ty));
            }
            ForClause::Assign(name, op, rhs) => self.lower_assign(name, op, rhs),
            ForClause::IncDec(name, op) => self.lower_incdec(name, *op),
            ForClause::Expr(e) => {
                self.lower_expr(e);
            }
        }
    }

    /// Lowers a `switch` as a chain of equality comparisons against the
    /// scrutinee, falling through to `default` (or past the switch, if
    /// there is none) when nothing matches — the same shape a front end
    /// without jump tables reaches for.
    fn lower_switch(&mut self, scrutinee: &Expr, cases: &[crate::ast::SwitchCase]) {
        let (scrutinee_v, ty) = self.lower_expr(scrutinee);
        let end_label = self.new_label("switch.end");
        let default_label = self.new_label("switch.default");

        let mut case_labels = Vec::new();
        for case in cases {
            if case.label.is_some() {
                case_labels.push(self.new_label("switch.case"));
            }
        }

        let mut next_check_label: Option<String> = None;
        let mut case_idx = 0usize;
        for case in cases {
            if let Some(label) = case.label {
                if let Some(check_label) = next_check_label.take() {
                    self.emit(Inst::Label(check_label));
                }
                let cmp = self.new_temp();
                self.emit(Inst::Icmp { dst: cmp, cond: IcmpCond::Eq, ty, lhs: scrutinee_v.clone(), rhs: Value::ConstI32(label) });
                let this_case_label = case_labels[case_idx].clone();
                case_idx += 1;
                let miss_label = self.new_label("switch.miss");
                self.emit(Inst::CondBr { cond: cmp, then_label: this_case_label, else_label: miss_label.clone() });
                next_check_label = Some(miss_label);
            }
        }
        if let Some(check_label) = next_check_label {
            self.emit(Inst::Label(check_label));
        }
        self.emit(Inst::Br(default_label.clone()));

        self.break_labels.push(end_label.clone());
        case_idx = 0;
        let mut default_emitted = false;
        for case in cases {
            match case.label {
                Some(_) => {
                    self.emit(Inst::Label(case_labels[case_idx].clone()));
                    case_idx += 1;
                }
                None => {
                    self.emit(Inst::Label(default_label.clone()));
                    default_emitted = true;
                }
            }
            self.lower_block(&case.body);
            if !ends_in_terminator(&self.insts) {
                self.emit(Inst::Br(end_label.clone()));
            }
        }
        if !default_emitted {
            self.emit(Inst::Label(default_label));
            self.emit(Inst::Br(end_label.clone()));
        }
        self.break_labels.pop();

        self.emit(Inst::Label(end_label));
    }

    // -- expressions ----------------------------------------------------

    /// Lowers `expr` and widens a `bool` result to `i32` — the representation
    /// every arithmetic/bitwise operand and every call/message-send argument
    /// needs (spec §4.5 point 6).
    fn lower_expr_as_i32(&mut self, expr: &Expr) -> Value {
        let (v, ty) = self.lower_expr(expr);
        self.widen_to_i32(v, ty)
    }

    fn widen_to_i32(&mut self, v: Value, ty: IrType) -> Value {
        match ty {
            IrType::I32 => v,
            IrType::I1 => {
                let dst = self.new_temp();
                self.emit(Inst::Zext { dst, value: v, from: IrType::I1, to: IrType::I32 });
                Value::Temp(dst)
            }
            IrType::Void => Value::ConstI32(0),
        }
    }

    /// Lowers `expr` and narrows an `i32` result to `i1` via `icmp ne ..., 0`
    /// — used wherever a condition is required (spec §4.5 point 6).
    fn lower_expr_as_i1(&mut self, expr: &Expr) -> (Value, IrType) {
        let (v, ty) = self.lower_expr(expr);
        match ty {
            IrType::I1 => (v, ty),
            _ => {
                let dst = self.new_temp();
                self.emit(Inst::Icmp { dst, cond: IcmpCond::Ne, ty: IrType::I32, lhs: v, rhs: Value::ConstI32(0) });
                (Value::Temp(dst), IrType::I1)
            }
        }
    }

    fn lower_expr(&mut self, expr: &Expr) -> (Value, IrType) {
        match &expr.kind {
            ExprKind::Number(n) => (Value::ConstI32(*n), IrType::I32),
            ExprKind::Bool(b) => (Value::ConstI1(*b), IrType::I1),
            ExprKind::Nil => (Value::ConstI32(0), IrType::I32),
            ExprKind::Ident(name) => {
                let (ptr, ty) = self.local_or_global(name);
                let dst = self.new_temp();
                self.emit(Inst::Load { dst, ty, ptr });
                (Value::Temp(dst), ty)
            }
            ExprKind::Binary(op, lhs, rhs) => self.lower_binary(*op, lhs, rhs),
            ExprKind::Conditional(cond, then_e, else_e) => self.lower_conditional(cond, then_e, else_e),
            ExprKind::Call(name, args) => self.lower_call(name, args),
            ExprKind::MessageSend(receiver, selector, args) => self.lower_message_send(receiver, selector, args),
        }
    }

    fn lower_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> (Value, IrType) {
        match op {
            BinOp::LogAnd => return self.lower_short_circuit(lhs, rhs, true),
            BinOp::LogOr => return self.lower_short_circuit(lhs, rhs, false),
            _ => {}
        }
        let lhs_v = self.lower_expr_as_i32(lhs);
        let rhs_v = self.lower_expr_as_i32(rhs);
        if let Some(cond) = icmp_cond(op) {
            let dst = self.new_temp();
            self.emit(Inst::Icmp { dst, cond, ty: IrType::I32, lhs: lhs_v, rhs: rhs_v });
            return (Value::Temp(dst), IrType::I1);
        }
        let int_op = binop_to_intbinop(op).expect("every non-comparison BinOp maps to an IntBinOp");
        let dst = self.new_temp();
        self.emit(Inst::Binary { dst, op: int_op, ty: IrType::I32, lhs: lhs_v, rhs: rhs_v });
        (Value::Temp(dst), IrType::I32)
    }

    /// `&&`/`||` short-circuit through a branch and a `phi`, rather than
    /// unconditionally evaluating both sides (spec §4.5 point 6).
    fn lower_short_circuit(&mut self, lhs: &Expr, rhs: &Expr, is_and: bool) -> (Value, IrType) {
        let (lhs_v, lhs_entry_label) = {
            let (v, _) = self.lower_expr_as_i1(lhs);
            (v, self.current_label())
        };
        let rhs_label = self.new_label(if is_and { "and.rhs" } else { "or.rhs" });
        let end_label = self.new_label(if is_and { "and.end" } else { "or.end" });

        if is_and {
            self.emit(Inst::CondBr { cond: lhs_v.clone(), then_label: rhs_label.clone(), else_label: end_label.clone() });
        } else {
            self.emit(Inst::CondBr { cond: lhs_v.clone(), then_label: end_label.clone(), else_label: rhs_label.clone() });
        }

        self.emit(Inst::Label(rhs_label.clone()));
        let (rhs_v, rhs_exit_label) = {
            let (v, _) = self.lower_expr_as_i1(rhs);
            (v, self.current_label())
        };
        self.emit(Inst::Br(end_label.clone()));

        self.emit(Inst::Label(end_label));
        let dst = self.new_temp();
        self.emit(Inst::Phi {
            dst,
            ty: IrType::I1,
            incoming: vec![(lhs_v, lhs_entry_label), (rhs_v, rhs_exit_label)],
        });
        (Value::Temp(dst), IrType::I1)
    }

    /// The label of the basic block currently being appended to, for `phi`
    /// incoming edges.
    fn current_label(&self) -> String {
        for inst in self.insts.iter().rev() {
            if let Inst::Label(name) = inst {
                return name.clone();
            }
        }
        "entry".to_string()
    }

    fn lower_conditional(&mut self, cond: &Expr, then_e: &Expr, else_e: &Expr) -> (Value, IrType) {
        let (cond_v, _) = self.lower_expr_as_i1(cond);
        let then_label = self.new_label("cond.then");
        let else_label = self.new_label("cond.else");
        let end_label = self.new_label("cond.end");

        self.emit(Inst::CondBr { cond: cond_v, then_label: then_label.clone(), else_label: else_label.clone() });

        self.emit(Inst::Label(then_label));
        let (then_v, then_ty) = self.lower_expr(then_e);
        let then_v = self.widen_to_i32(then_v, then_ty);
        let then_exit = self.current_label();
        self.emit(Inst::Br(end_label.clone()));

        self.emit(Inst::Label(else_label));
        let (else_v, else_ty) = self.lower_expr(else_e);
        let else_v = self.widen_to_i32(else_v, else_ty);
        let else_exit = self.current_label();
        self.emit(Inst::Br(end_label.clone()));

        self.emit(Inst::Label(end_label));
        let dst = self.new_temp();
        self.emit(Inst::Phi { dst, ty: IrType::I32, incoming: vec![(then_v, then_exit), (else_v, else_exit)] });
        (Value::Temp(dst), IrType::I32)
    }

    fn lower_call(&mut self, name: &str, args: &[Expr]) -> (Value, IrType) {
        let info = self.surface.functions.get(name).expect("sema guarantees every call target is declared");
        let return_type = ir_type(info.return_type);
        let param_types: Vec<IrType> = info.params.iter().map(|s| ir_type(*s)).collect();
        let mut call_args = Vec::with_capacity(args.len());
        for (arg, ty) in args.iter().zip(param_types.iter()) {
            let v = match ty {
                IrType::I1 => {
                    let (v, t) = self.lower_expr(arg);
                    if t == IrType::I1 {
                        v
                    } else {
                        let (v, _) = self.lower_expr_as_i1(arg);
                        v
                    }
                }
                _ => self.lower_expr_as_i32(arg),
            };
            call_args.push((*ty, v));
        }
        if return_type == IrType::Void {
            self.emit(Inst::Call { dst: None, ty: IrType::Void, callee: name.to_string(), args: call_args });
            return (Value::ConstI32(0), IrType::Void);
        }
        let dst = self.new_temp();
        self.emit(Inst::Call { dst: Some(dst), ty: return_type, callee: name.to_string(), args: call_args });
        (Value::Temp(dst), return_type)
    }

    /// `[receiver sel:args]` lowers to a nil-checked dispatch: a `nil`
    /// receiver short-circuits to the zero value without ever calling the
    /// runtime dispatch symbol (spec §4.6); any other receiver dispatches
    /// unconditionally through it. Both paths join through a `phi` so the
    /// expression has one SSA value regardless of which edge ran.
    fn lower_message_send(&mut self, receiver: &Expr, selector: &str, args: &[Expr]) -> (Value, IrType) {
        // A receiver that is *syntactically* the `nil`/`NULL` literal never
        // reaches the runtime dispatch symbol at all, not even behind a
        // branch never taken at runtime — there is nothing to dispatch.
        if matches!(receiver.kind, ExprKind::Nil) {
            for arg in args {
                self.lower_expr(arg);
            }
            return (Value::ConstI32(0), IrType::I32);
        }

        let receiver_v = self.lower_expr_as_i32(receiver);
        let is_nil = self.new_temp();
        self.emit(Inst::Icmp { dst: is_nil, cond: IcmpCond::Eq, ty: IrType::I32, lhs: receiver_v.clone(), rhs: Value::ConstI32(0) });

        let nil_label = self.new_label("msg.nil");
        let dispatch_label = self.new_label("msg.dispatch");
        let end_label = self.new_label("msg.end");
        self.emit(Inst::CondBr { cond: Value::Temp(is_nil), then_label: nil_label.clone(), else_label: dispatch_label.clone() });

        self.emit(Inst::Label(nil_label.clone()));
        self.emit(Inst::Br(end_label.clone()));

        self.emit(Inst::Label(dispatch_label));
        let selector_global = selector_global_name(selector);
        let mut call_args = vec![(IrType::I32, receiver_v), (IrType::I32, Value::Global(selector_global))];
        let slots = self.contract.runtime_dispatch_arg_slots;
        for i in 0..slots {
            let v = args.get(i).map(|a| self.lower_expr_as_i32(a)).unwrap_or(Value::ConstI32(0));
            call_args.push((IrType::I32, v));
        }
        let dispatch_dst = self.new_temp();
        self.emit(Inst::Call {
            dst: Some(dispatch_dst),
            ty: IrType::I32,
            callee: self.contract.runtime_dispatch_symbol.clone(),
            args: call_args,
        });
        let dispatch_exit = self.current_label();
        self.emit(Inst::Br(end_label.clone()));

        self.emit(Inst::Label(end_label));
        let dst = self.new_temp();
        self.emit(Inst::Phi {
            dst,
            ty: IrType::I32,
            incoming: vec![(Value::ConstI32(0), nil_label), (Value::Temp(dispatch_dst), dispatch_exit)],
        });
        (Value::Temp(dst), IrType::I32)
    }
}

fn collect_selectors(stmts: &[Stmt], out: &mut DefaultStringInterner) {
    for stmt in stmts {
        collect_selectors_stmt(stmt, out);
    }
}

fn collect_selectors_stmt(stmt: &Stmt, out: &mut DefaultStringInterner) {
    match &stmt.kind {
        StmtKind::Let(_, e) | StmtKind::ExprStmt(e) => collect_selectors_expr(e, out),
        StmtKind::Assign(_, _, Some(e)) => collect_selectors_expr(e, out),
        StmtKind::Assign(_, _, None) | StmtKind::IncDec(..) | StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
        StmtKind::Return(Some(e)) => collect_selectors_expr(e, out),
        StmtKind::Return(None) => {}
        StmtKind::If(cond, then_s, else_s) => {
            collect_selectors_expr(cond, out);
            collect_selectors_stmt(then_s, out);
            if let Some(e) = else_s {
                collect_selectors_stmt(e, out);
            }
        }
        StmtKind::While(cond, body) => {
            collect_selectors_expr(cond, out);
            collect_selectors_stmt(body, out);
        }
        StmtKind::DoWhile(body, cond) => {
            collect_selectors_stmt(body, out);
            collect_selectors_expr(cond, out);
        }
        StmtKind::For(init, cond, step, body) => {
            collect_selectors_for_clause(init, out);
            if let Some(c) = cond {
                collect_selectors_expr(c, out);
            }
            if let Some(s) = step {
                collect_selectors_for_clause(s, out);
            }
            collect_selectors_stmt(body, out);
        }
        StmtKind::Switch(scrutinee, cases) => {
            collect_selectors_expr(scrutinee, out);
            for case in cases {
                collect_selectors(&case.body, out);
            }
        }
        StmtKind::Block(stmts, _) => collect_selectors(stmts, out),
    }
}

fn collect_selectors_for_clause(clause: &ForClause, out: &mut DefaultStringInterner) {
    match clause {
        ForClause::None => {}
        ForClause::Let(_, e) | ForClause::Expr(e) => collect_selectors_expr(e, out),
        ForClause::Assign(_, _, e) => {
            if let Some(e) = e {
                collect_selectors_expr(e, out);
            }
        }
        ForClause::IncDec(..) => {}
    }
}

fn collect_selectors_expr(expr: &Expr, out: &mut DefaultStringInterner) {
    match &expr.kind {
        ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::Nil | ExprKind::Ident(_) => {}
        ExprKind::Binary(_, l, r) => {
            collect_selectors_expr(l, out);
            collect_selectors_expr(r, out);
        }
        ExprKind::Conditional(c, t, e) => {
            collect_selectors_expr(c, out);
            collect_selectors_expr(t, out);
            collect_selectors_expr(e, out);
        }
        ExprKind::Call(_, args) => {
            for a in args {
                collect_selectors_expr(a, out);
            }
        }
        ExprKind::MessageSend(receiver, selector, args) => {
            collect_selectors_expr(receiver, out);
            let _: DefaultSymbol = out.get_or_intern(selector.as_str());
            for a in args {
                collect_selectors_expr(a, out);
            }
        }
    }
}
