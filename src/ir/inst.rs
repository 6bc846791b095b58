//! IR value/instruction definitions, textual LLVM syntax (spec §4.5).

/// An SSA temporary, printed `%tN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Temp(pub u32);

impl std::fmt::Display for Temp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%t{}", self.0)
    }
}

/// Every non-`bool` o3 value — `i32`, and the object/`id`/`Class`/`SEL`
/// families that `TypeAnnotation` collapses onto `Scalar::I32` — lowers to
/// `i32` here; there is no separate pointer type to track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrType {
    I1,
    I32,
    Void,
}

impl std::fmt::Display for IrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IrType::I1 => "i1",
            IrType::I32 => "i32",
            IrType::Void => "void",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Temp(Temp),
    ConstI32(i32),
    ConstI1(bool),
    /// `@name` reference to a global or selector-string constant.
    Global(String),
    /// `%name` reference to a named incoming parameter register.
    Reg(String),
    Null,
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Temp(t) => write!(f, "{}", t),
            Value::ConstI32(n) => write!(f, "{}", n),
            Value::ConstI1(b) => write!(f, "{}", if *b { 1 } else { 0 }),
            Value::Global(name) => write!(f, "@{}", name),
            Value::Reg(name) => write!(f, "%{}", name),
            Value::Null => write!(f, "null"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntBinOp {
    Add,
    Sub,
    Mul,
    Sdiv,
    Srem,
    And,
    Or,
    Xor,
    Shl,
    Ashr,
}

impl std::fmt::Display for IntBinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IntBinOp::Add => "add",
            IntBinOp::Sub => "sub",
            IntBinOp::Mul => "mul",
            IntBinOp::Sdiv => "sdiv",
            IntBinOp::Srem => "srem",
            IntBinOp::And => "and",
            IntBinOp::Or => "or",
            IntBinOp::Xor => "xor",
            IntBinOp::Shl => "shl",
            IntBinOp::Ashr => "ashr",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpCond {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl std::fmt::Display for IcmpCond {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IcmpCond::Eq => "eq",
            IcmpCond::Ne => "ne",
            IcmpCond::Slt => "slt",
            IcmpCond::Sle => "sle",
            IcmpCond::Sgt => "sgt",
            IcmpCond::Sge => "sge",
        };
        f.write_str(s)
    }
}

/// One textual IR instruction, in source-emission order within a function.
#[derive(Debug, Clone)]
pub enum Inst {
    Label(String),
    Alloca { dst: Temp, ty: IrType },
    /// `ptr` is either a local's alloca'd `Temp` or a `Global` name.
    Store { ty: IrType, value: Value, ptr: Value },
    Load { dst: Temp, ty: IrType, ptr: Value },
    Binary { dst: Temp, op: IntBinOp, ty: IrType, lhs: Value, rhs: Value },
    Icmp { dst: Temp, cond: IcmpCond, ty: IrType, lhs: Value, rhs: Value },
    Zext { dst: Temp, value: Value, from: IrType, to: IrType },
    Trunc { dst: Temp, value: Value, from: IrType, to: IrType },
    Call { dst: Option<Temp>, ty: IrType, callee: String, args: Vec<(IrType, Value)> },
    Br(String),
    CondBr { cond: Value, then_label: String, else_label: String },
    Phi { dst: Temp, ty: IrType, incoming: Vec<(Value, String)> },
    Ret(Option<(IrType, Value)>),
    Comment(String),
}

impl std::fmt::Display for Inst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inst::Label(name) => write!(f, "{}:", name),
            Inst::Alloca { dst, ty } => write!(f, "  {} = alloca {}", dst, ty),
            Inst::Store { ty, value, ptr } => write!(f, "  store {} {}, ptr {}", ty, value, ptr),
            Inst::Load { dst, ty, ptr } => write!(f, "  {} = load {}, ptr {}", dst, ty, ptr),
            Inst::Binary { dst, op, ty, lhs, rhs } => {
                write!(f, "  {} = {} {} {}, {}", dst, op, ty, lhs, rhs)
            }
            Inst::Icmp { dst, cond, ty, lhs, rhs } => {
                write!(f, "  {} = icmp {} {} {}, {}", dst, cond, ty, lhs, rhs)
            }
            Inst::Zext { dst, value, from, to } => write!(f, "  {} = zext {} {} to {}", dst, from, value, to),
            Inst::Trunc { dst, value, from, to } => write!(f, "  {} = trunc {} {} to {}", dst, from, value, to),
            Inst::Call { dst, ty, callee, args } => {
                if let Some(d) = dst {
                    write!(f, "  {} = call {} @{}(", d, ty, callee)?;
                } else {
                    write!(f, "  call {} @{}(", ty, callee)?;
                }
                for (i, (arg_ty, arg_val)) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", arg_ty, arg_val)?;
                }
                write!(f, ")")
            }
            Inst::Br(label) => write!(f, "  br label %{}", label),
            Inst::CondBr { cond, then_label, else_label } => {
                write!(f, "  br i1 {}, label %{}, label %{}", cond, then_label, else_label)
            }
            Inst::Phi { dst, ty, incoming } => {
                write!(f, "  {} = phi {} ", dst, ty)?;
                for (i, (value, label)) in incoming.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "[ {}, %{} ]", value, label)?;
                }
                Ok(())
            }
            Inst::Ret(value) => match value {
                Some((ty, v)) => write!(f, "  ret {} {}", ty, v),
                None => write!(f, "  ret void"),
            },
            Inst::Comment(text) => write!(f, "  ; {}", text),
        }
    }
}
