// Front end module - turns source text into the engine's expression tree
use anyhow::Result;

use crate::tree::ExprTree;

pub mod cpp;
pub mod scope;

#[cfg(test)]
mod cpp_tests;

/// Trait for all front ends feeding the rewrite engine
pub trait Frontend: Send {
    /// Parse source code into an expression tree with resolved operand types
    fn parse(&mut self, source: &str) -> Result<ExprTree>;

    /// Get front end name for debugging
    fn name(&self) -> &'static str;
}

pub use cpp::CppFrontend;

/// Create a front end for `language`, configured for `target_type`
pub fn create_frontend(language: &str, target_type: &str) -> Result<Box<dyn Frontend>> {
    match language {
        "cpp" | "c++" => Ok(Box::new(CppFrontend::new(target_type)?)),
        _ => anyhow::bail!("Unknown front end: {}", language),
    }
}
