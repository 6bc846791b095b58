//! Semantic analysis (spec §4.3): three ordered passes that accumulate
//! diagnostics rather than fail fast, plus the pure-contract fixed point.
//!
//! Unlike the teacher's fail-fast `CompileResult`-returning analyzer, every
//! pass here keeps validating and folds its findings into one bus so a
//! single compile surfaces every diagnostic at once.

mod body;
mod purity;
mod scope;
mod surface;

pub use surface::{FunctionInfo, GlobalInfo, SymbolSurface};

use crate::ast::Program;
use crate::common::Diagnostic;
use crate::lower::CompileOptions;

#[derive(Debug, Default)]
pub struct AnalysisResult {
    pub surface: SymbolSurface,
    pub diagnostics: Vec<Diagnostic>,
    /// `(function, cause)` pairs for every `pure`-declared function that
    /// turned out not to be — fed straight into the manifest.
    pub pure_violations: Vec<(String, String)>,
}

pub fn analyze(program: &Program, options: &CompileOptions) -> AnalysisResult {
    let mut diagnostics = Vec::new();

    let surface = surface::build_surface(program, &mut diagnostics);
    body::analyze_bodies(program, &surface, options, &mut diagnostics);
    let pure_violations = purity::analyze(program, &surface, &mut diagnostics);

    AnalysisResult { surface, diagnostics, pure_violations }
}
