use std::cell::RefCell;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Category of a recoverable problem met while evaluating a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No live battle context.
    UnavailableContext,
    /// Live context, but a required unit / target / neighbour is missing.
    MissingDependency,
    /// Authored name that does not map onto a known kind.
    UnparseableConfiguration,
    /// The character does not carry the requested stat.
    AbsentCapability,
    /// A bag entry or upstream value had an unexpected type.
    TypeMismatch,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::UnavailableContext => "unavailable_context",
            DiagnosticKind::MissingDependency => "missing_dependency",
            DiagnosticKind::UnparseableConfiguration => "unparseable_configuration",
            DiagnosticKind::AbsentCapability => "absent_capability",
            DiagnosticKind::TypeMismatch => "type_mismatch",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Label of the node that reported it.
    pub node: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Append-only diagnostics journal of one activation.
///
/// Condition nodes only see the context through a shared reference, so the
/// journal uses a `RefCell`. Activations are single-threaded.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: RefCell<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, node: &str, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        emit(node, kind, &message);
        self.entries.borrow_mut().push(Diagnostic {
            node: node.to_string(),
            kind,
            message,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|d| d.kind == kind)
            .count()
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.entries.into_inner()
    }
}

/// Log a diagnostic without a journal (authoring mode has no context).
pub fn emit(node: &str, kind: DiagnosticKind, message: &str) {
    warn!(node, kind = %kind, "{}", message);
}
