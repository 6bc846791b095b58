//! Top-level orchestration (spec §6, §7): "pull-then-push" — each stage
//! only runs once the previous stage produced no diagnostics, and whatever
//! diagnostics do show up are sorted/deduped through one `DiagnosticsBus`
//! before being handed back.

use crate::common::DiagnosticsBus;
use crate::ir::{IrBuilder, IrModule};
use crate::lower::{CompileOptions, LoweringContract};
use crate::manifest::{self, Manifest};
use crate::{ast, lexer, parser, sema};

#[derive(Debug)]
pub struct CompileOutput {
    pub diagnostics: Vec<crate::common::Diagnostic>,
    /// `None` when any stage reported diagnostics — spec §6: "When
    /// diagnostics are non-empty, the manifest and IR strings are empty."
    pub manifest: Option<Manifest>,
    pub ir: Option<IrModule>,
}

impl CompileOutput {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Runs the full lex → parse → analyze → lower → emit pipeline over one
/// translation unit's source text.
pub fn compile(source: &str, options: &CompileOptions) -> CompileOutput {
    let mut bus = DiagnosticsBus::new();

    let (tokens, lex_diagnostics) = lexer::lex(source);
    let lex_clean = lex_diagnostics.is_empty();
    bus.extend(lex_diagnostics);

    let program: ast::Program = if lex_clean {
        parser::parse(tokens)
    } else {
        ast::Program::new()
    };
    bus.extend(program.diagnostics.clone());

    let analysis = if lex_clean && program.diagnostics.is_empty() {
        sema::analyze(&program, options)
    } else {
        sema::AnalysisResult::default()
    };
    bus.extend(analysis.diagnostics.clone());

    let contract = match LoweringContract::try_build(options) {
        Ok(c) => c,
        Err(message) => {
            bus.push(crate::common::Diagnostic::error(crate::common::Pos::START, "O3L300", message));
            return CompileOutput { diagnostics: bus.finish(), manifest: None, ir: None };
        }
    };

    let diagnostics = bus.finish();
    if !diagnostics.is_empty() {
        return CompileOutput { diagnostics, manifest: None, ir: None };
    }

    let ir = IrBuilder::build(&program, &analysis.surface, &contract);
    let manifest = manifest::build(&program, &analysis.surface, &analysis.pure_violations);

    CompileOutput { diagnostics, manifest: Some(manifest), ir: Some(ir) }
}
