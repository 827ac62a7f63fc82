//! # oprewrite core
//!
//! Type-directed rewriting of arithmetic-operator and converting-constructor
//! calls on one user-defined numeric type into explicit free-function calls:
//! - Source ranges and the expression tree handed over by a front end
//! - The rewrite engine (rewritten-set tracker, type classifier, edit buffer)
//! - A tree-sitter based C++ front end
//! - A file driver for rewriting single files and directory trees
//!
//! Everything outside a rewritten expression is preserved byte for byte.

#![warn(clippy::all)]

pub mod driver;
pub mod frontend;
pub mod rewriter;
pub mod source;
pub mod tree;

// Re-export commonly used types
pub use driver::{FileRewriteSummary, FileRewriter};
pub use frontend::{create_frontend, CppFrontend, Frontend};
pub use rewriter::{
    rewrite, EditBuffer, RewriteEngine, RewriteOutput, RewriteReport, RewriteWarning,
    RewrittenSet, TypeClassifier,
};
pub use source::SourceRange;
pub use tree::{BinaryOp, ExprNode, ExprTree, NodeId, NodeKind, TreeBuilder};

/// oprewrite version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for oprewrite components.
///
/// Events go to stderr so that stdout only ever carries rewritten source.
pub fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("oprewrite_core={default_level},oprewrite={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Rewrite configuration shared by the engine, front end and driver
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    /// Name of the user-defined type whose operators are rewritten
    pub target_type: String,
    /// Optional cap on operand nesting depth; unlimited when `None`
    pub max_depth: Option<usize>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            target_type: "complex".to_string(),
            max_depth: None,
        }
    }
}

impl RewriteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_type(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = target_type.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Error types for oprewrite core operations
#[derive(thiserror::Error, Debug)]
pub enum RewriteError {
    /// Range does not lie inside the original buffer on character boundaries
    #[error("Invalid source range {range} for a buffer of {len} bytes")]
    InvalidRange { range: SourceRange, len: usize },

    /// Two edits would touch overlapping text
    #[error("Edit {requested} overlaps existing edit {existing}")]
    OverlappingEdit {
        requested: SourceRange,
        existing: SourceRange,
    },

    /// Operand nesting exceeded the configured limit
    #[error("Expression at {range} nests deeper than {limit} levels")]
    NestingTooDeep { range: SourceRange, limit: usize },

    /// A node does not carry the operands its kind requires
    #[error("Malformed node at {range}: {message}")]
    MalformedNode { range: SourceRange, message: String },

    /// Front end failure
    #[error("Front end error: {0}")]
    Frontend(#[from] anyhow::Error),

    /// I/O failure while reading or writing sources
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for oprewrite core operations
pub type Result<T> = std::result::Result<T, RewriteError>;
