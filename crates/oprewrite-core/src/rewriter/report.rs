/*!
# Rewrite Reports

Per-pass statistics and warnings, plus the finished output of a pass.
*/

use std::collections::BTreeMap;

use serde::Serialize;

use crate::source::SourceRange;

/// A node the engine declined to rewrite although it was routed to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteWarning {
    pub range: SourceRange,
    pub operator: String,
    pub left_type: Option<String>,
    pub right_type: Option<String>,
    pub message: String,
}

/// Statistics for one rewrite pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    /// Number of rewrites per synthesized function name
    pub rewrites: BTreeMap<String, u64>,
    /// Nodes reached by the traversal or by operand recursion
    pub nodes_visited: u64,
    /// Visits filtered out because an earlier rewrite already consumed the node
    pub skipped_revisits: u64,
    pub warnings: Vec<RewriteWarning>,
}

impl RewriteReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rewrite(&mut self, function: &str) {
        *self.rewrites.entry(function.to_string()).or_insert(0) += 1;
    }

    pub fn total_rewrites(&self) -> u64 {
        self.rewrites.values().sum()
    }

    pub fn rewrites_of(&self, function: &str) -> u64 {
        self.rewrites.get(function).copied().unwrap_or(0)
    }

    pub fn merge(&mut self, other: RewriteReport) {
        for (function, count) in other.rewrites {
            *self.rewrites.entry(function).or_insert(0) += count;
        }
        self.nodes_visited += other.nodes_visited;
        self.skipped_revisits += other.skipped_revisits;
        self.warnings.extend(other.warnings);
    }
}

/// Result of a finished pass
#[derive(Debug, Clone)]
pub struct RewriteOutput {
    /// Original text with every committed edit spliced in
    pub text: String,
    pub report: RewriteReport,
    /// Committed edits in range order; pairwise disjoint
    pub edits: Vec<(SourceRange, String)>,
}

impl RewriteOutput {
    pub fn changed(&self) -> bool {
        !self.edits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sums_counts() {
        let mut first = RewriteReport::new();
        first.record_rewrite("complex_add");
        first.nodes_visited = 4;

        let mut second = RewriteReport::new();
        second.record_rewrite("complex_add");
        second.record_rewrite("to_complex");
        second.skipped_revisits = 2;

        first.merge(second);
        assert_eq!(first.rewrites_of("complex_add"), 2);
        assert_eq!(first.rewrites_of("to_complex"), 1);
        assert_eq!(first.rewrites_of("complex_mul"), 0);
        assert_eq!(first.total_rewrites(), 3);
        assert_eq!(first.nodes_visited, 4);
        assert_eq!(first.skipped_revisits, 2);
    }
}
