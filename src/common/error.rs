//! Fatal, process-level error type and the optional pretty-printer.
//!
//! Nothing in the pipeline itself returns `CompileError` — every recoverable
//! failure becomes a `Diagnostic` instead (spec §7). This type exists for
//! the handful of truly unrecoverable conditions an embedder might want to
//! surface distinctly from a `Diagnostic`, mirroring the teacher's error
//! enum shape.

use super::{Diagnostic, Pos};
use codespan_reporting::diagnostic::{Diagnostic as CrDiagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("emitter error: {0}")]
    Emitter(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Renders a `Diagnostic` list against source text for human consumption.
/// Presentation only — never participates in sort order or control flow.
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    /// Report one diagnostic. The byte offset is approximated by walking the
    /// file's line starts, since `Diagnostic` only carries (line, column).
    pub fn report(&self, file_id: usize, diag: &Diagnostic) {
        let offset = self.byte_offset(file_id, diag.pos);
        let label_msg = diag.code.clone().unwrap_or_default();
        let severity = match diag.severity {
            super::Severity::Fatal | super::Severity::Error => CrDiagnostic::error(),
            super::Severity::Warning => CrDiagnostic::warning(),
            super::Severity::Note => CrDiagnostic::note(),
            super::Severity::Ignored | super::Severity::Other => CrDiagnostic::note(),
        };
        let rendered = severity
            .with_message(diag.message.clone())
            .with_labels(vec![Label::primary(file_id, offset..offset).with_message(label_msg)]);
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &rendered);
    }

    fn byte_offset(&self, file_id: usize, pos: Pos) -> usize {
        let Ok(source) = self.files.source(file_id) else {
            return 0;
        };
        let mut line = 1u32;
        let mut offset = 0usize;
        for (idx, ch) in source.char_indices() {
            if line == pos.line {
                return offset + (pos.column.saturating_sub(1)) as usize;
            }
            if ch == '\n' {
                line += 1;
                offset = idx + 1;
            }
        }
        offset
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
