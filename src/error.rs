use miette::Diagnostic;
use thiserror::Error;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Construction errors for a single method analysis.
///
/// Every variant is fatal for the method being analyzed and for that method
/// only; the batch driver reports it per-method and keeps sibling analyses
/// running.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("missing body: {construct} has no body statement")]
    #[diagnostic(code(pdg_rs::missing_body))]
    MissingBody { construct: &'static str },

    #[error("unresolved label '{label}' on {jump}")]
    #[diagnostic(code(pdg_rs::unresolved_label))]
    UnresolvedLabel { label: String, jump: &'static str },

    #[error("{jump} at node {node_id} has no enclosing loop or switch")]
    #[diagnostic(code(pdg_rs::unresolvable_jump))]
    UnresolvableJump { jump: &'static str, node_id: u32 },

    #[error("malformed statement tree: {message}")]
    #[diagnostic(code(pdg_rs::malformed_tree))]
    MalformedTree { message: String },

    #[error("internal error: {message}")]
    #[diagnostic(code(pdg_rs::internal_error))]
    Internal { message: String },
}

impl Error {
    /// Create a malformed-tree error
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedTree {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }
}
