//! IR module/function containers and their textual rendering (spec §4.5).

use super::inst::{Inst, IrType};

#[derive(Debug, Clone)]
pub struct IrFunction {
    pub name: String,
    pub params: Vec<(String, IrType)>,
    pub return_type: IrType,
    /// `true` for an external prototype with no body (`declare`).
    pub is_declaration: bool,
    pub body: Vec<Inst>,
}

impl std::fmt::Display for IrFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self
            .params
            .iter()
            .map(|(name, ty)| format!("{} %{}", ty, name))
            .collect::<Vec<_>>()
            .join(", ");
        if self.is_declaration {
            return writeln!(f, "declare {} @{}({})", self.return_type, self.name, params);
        }
        writeln!(f, "define {} @{}({}) {{", self.return_type, self.name, params)?;
        for inst in &self.body {
            writeln!(f, "{}", inst)?;
        }
        writeln!(f, "}}")
    }
}

#[derive(Debug, Clone)]
pub struct IrGlobal {
    pub name: String,
    pub ty: IrType,
    pub init: i32,
}

impl std::fmt::Display for IrGlobal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{} = global {} {}, align 4", self.name, self.ty, self.init)
    }
}

#[derive(Debug, Clone)]
pub struct IrModule {
    pub header_comments: Vec<String>,
    pub globals: Vec<IrGlobal>,
    /// Selector interned-string constants, named and emitted in
    /// lexicographic order of the selector text (spec §4.5 point 3).
    pub selector_constants: Vec<(String, String)>,
    pub functions: Vec<IrFunction>,
}

impl IrModule {
    pub fn new() -> Self {
        Self {
            header_comments: Vec::new(),
            globals: Vec::new(),
            selector_constants: Vec::new(),
            functions: Vec::new(),
        }
    }
}

impl Default for IrModule {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IrModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for comment in &self.header_comments {
            writeln!(f, "; {}", comment)?;
        }
        if !self.header_comments.is_empty() {
            writeln!(f)?;
        }
        for global in &self.globals {
            writeln!(f, "{}", global)?;
        }
        for (name, text) in &self.selector_constants {
            writeln!(
                f,
                "@{} = private unnamed_addr constant [{} x i8] c\"{}\\00\"",
                name,
                text.len() + 1,
                text.escape_default()
            )?;
        }
        if !self.globals.is_empty() || !self.selector_constants.is_empty() {
            writeln!(f)?;
        }
        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}
