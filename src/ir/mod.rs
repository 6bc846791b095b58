//! Textual LLVM-flavored IR (spec §4.5), built the way the teacher's
//! `ir::inst`/`ir::builder` pair a typed instruction AST with a `Display`
//! impl and a stateful builder — adapted here to real LLVM IR syntax
//! (`%tN` SSA temps, basic-block labels, `phi`, `declare`/`define`)
//! instead of the teacher's three-address form.

mod build;
mod inst;
mod module;

pub use build::IrBuilder;
pub use inst::{Inst, IrType, Value};
pub use module::{IrFunction, IrGlobal, IrModule};
