//! Error reporting (spec §7), ported from the teacher's `diagnostic.rs`.
//! The core has no source text of its own — the front end that would carry
//! spans is an external collaborator — so `Diagnostic` renders a plain
//! message + notes + help block instead of a source-span excerpt.

use std::fmt;

use crate::core::ir::stmt::Stmt;

/// The five fatal error kinds enumerated in spec §7.
#[derive(Clone, Debug)]
pub enum LowerError {
    /// A Function definition's args don't match its references, or operand
    /// types don't match.
    ShapeMismatch { function: String, detail: String },
    /// Bounds inference could not determine a lower or upper bound for a
    /// function used by its consumer.
    UnboundedRegion { function: String, statement: String },
    /// `compute_level` is not an ancestor of `store_level`, or an inline
    /// reduction was requested.
    ScheduleInconsistency { function: String, detail: String },
    /// A name referenced during lowering has no binding.
    UnknownIdentifier { name: String, in_scope: Vec<String> },
    /// A runtime precondition that the compiler itself detected statically
    /// rather than deferring to the generated code's assertion.
    RuntimePrecondition { detail: String },
}

impl LowerError {
    pub fn unbounded_region(function: impl Into<String>, statement: &Stmt) -> Self {
        LowerError::UnboundedRegion {
            function: function.into(),
            statement: statement.to_string(),
        }
    }
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LowerError::ShapeMismatch { function, detail } => {
                write!(f, "shape/type mismatch in `{}`: {}", function, detail)
            }
            LowerError::UnboundedRegion { function, .. } => {
                write!(f, "could not bound the region required of `{}`", function)
            }
            LowerError::ScheduleInconsistency { function, detail } => {
                write!(f, "inconsistent schedule for `{}`: {}", function, detail)
            }
            LowerError::UnknownIdentifier { name, .. } => {
                write!(f, "unknown identifier `{}`", name)
            }
            LowerError::RuntimePrecondition { detail } => {
                write!(f, "runtime precondition violated: {}", detail)
            }
        }
    }
}

impl std::error::Error for LowerError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A compiler diagnostic (error or warning), with no source span attached.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render to stderr using ariadne, without a source-span excerpt.
    pub fn render(&self) {
        use ariadne::{Report, ReportKind};

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };

        let mut report = Report::<std::ops::Range<usize>>::build(kind, (), 0)
            .with_message(&self.message)
            .with_config(ariadne::Config::default().with_color(true));

        for note in &self.notes {
            report = report.with_note(note);
        }
        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        report.finish().eprint(ariadne::Source::from("")).ok();
    }
}

impl From<&LowerError> for Diagnostic {
    fn from(err: &LowerError) -> Self {
        let base = Diagnostic::error(err.to_string());
        match err {
            LowerError::UnboundedRegion { statement, .. } => {
                base.with_note(format!("in statement:\n{}", statement))
            }
            LowerError::UnknownIdentifier { in_scope, .. } => {
                base.with_note(format!("identifiers in scope: [{}]", in_scope.join(", ")))
            }
            LowerError::ShapeMismatch { .. } | LowerError::ScheduleInconsistency { .. } => base
                .with_help("fix the Function definition or schedule before lowering again"),
            LowerError::RuntimePrecondition { .. } => base,
        }
    }
}

impl From<LowerError> for Diagnostic {
    fn from(err: LowerError) -> Self {
        Diagnostic::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ir::stmt::nop;

    #[test]
    fn unbounded_region_carries_the_statement() {
        let err = LowerError::unbounded_region("blur_x", &nop());
        let d = Diagnostic::from(&err);
        assert_eq!(d.severity, Severity::Error);
        assert!(d.notes[0].contains("{}"));
    }

    #[test]
    fn unknown_identifier_lists_scope() {
        let err = LowerError::UnknownIdentifier {
            name: "y".into(),
            in_scope: vec!["x".into(), "w".into()],
        };
        let d = Diagnostic::from(&err);
        assert!(d.message.contains("y"));
        assert!(d.notes[0].contains("x, w"));
    }

    #[test]
    fn render_does_not_panic() {
        let d = Diagnostic::error("shape mismatch").with_help("check args");
        d.render();
    }
}
