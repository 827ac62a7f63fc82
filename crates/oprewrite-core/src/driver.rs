/*!
# FileRewriter - File-based Rewriting

Reads C++ sources, runs the front end and the rewrite engine over each one,
and writes the rewritten text. Directory trees are walked recursively and
their relative structure is preserved in the output tree.
*/

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::frontend::create_frontend;
use crate::rewriter::{rewrite, RewriteOutput};
use crate::RewriteConfig;

/// File-based rewriting driver
pub struct FileRewriter {
    config: RewriteConfig,
    language: String,
    source_extensions: Vec<String>,
    output_extension: Option<String>,
}

impl FileRewriter {
    pub fn new(config: RewriteConfig) -> Self {
        Self {
            config,
            language: "cpp".to_string(),
            source_extensions: ["cpp", "cc", "cxx", "h", "hpp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            output_extension: None,
        }
    }

    /// Set the file extensions to process
    pub fn source_extensions(mut self, extensions: Vec<String>) -> Self {
        self.source_extensions = extensions;
        self
    }

    /// Set the output file extension; by default each file keeps its own
    pub fn output_extension(mut self, extension: impl Into<String>) -> Self {
        self.output_extension = Some(extension.into());
        self
    }

    /// Rewrite one source buffer with fresh front end and engine state
    pub fn rewrite_source(&self, source: &str) -> Result<RewriteOutput> {
        let mut frontend = create_frontend(&self.language, &self.config.target_type)?;
        let tree = frontend.parse(source)?;
        let output = rewrite(source, &tree, &self.config)?;
        Ok(output)
    }

    /// Read and rewrite a single file
    pub fn rewrite_file<P: AsRef<Path>>(&self, path: P) -> Result<RewriteOutput> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let output = self
            .rewrite_source(&source)
            .with_context(|| format!("Failed to rewrite {}", path.display()))?;
        info!(
            file = %path.display(),
            rewrites = output.report.total_rewrites(),
            warnings = output.report.warnings.len(),
            "rewrote file"
        );
        Ok(output)
    }

    /// Rewrite `source_file` into `output_file`, creating parent directories
    pub fn rewrite_file_to<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source_file: P,
        output_file: Q,
    ) -> Result<FileRewriteSummary> {
        let output_path = output_file.as_ref();
        let output = self.rewrite_file(source_file)?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, &output.text)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        let mut summary = FileRewriteSummary::new();
        summary.record(&output);
        Ok(summary)
    }

    /// Rewrite every matching file below `source_dir` into `output_dir`
    pub fn rewrite_directory<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source_dir: P,
        output_dir: Q,
    ) -> Result<FileRewriteSummary> {
        let source_path = source_dir.as_ref();
        let output_path = output_dir.as_ref();

        if !source_path.is_dir() {
            return Err(anyhow!(
                "Source directory does not exist: {}",
                source_path.display()
            ));
        }

        fs::create_dir_all(output_path)?;

        let mut summary = FileRewriteSummary::new();
        self.rewrite_directory_recursive(source_path, source_path, output_path, &mut summary)?;

        info!(
            files = summary.files_processed,
            changed = summary.files_changed,
            rewrites = summary.total_rewrites,
            errors = summary.errors.len(),
            "rewrote directory"
        );
        Ok(summary)
    }

    fn rewrite_directory_recursive(
        &self,
        current_dir: &Path,
        source_root: &Path,
        output_root: &Path,
        summary: &mut FileRewriteSummary,
    ) -> Result<()> {
        let mut entries = fs::read_dir(current_dir)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.rewrite_directory_recursive(&path, source_root, output_root, summary)?;
                continue;
            }
            if !self.should_process_file(&path) {
                debug!(file = %path.display(), "skipping");
                continue;
            }

            let relative = path.strip_prefix(source_root)?;
            let mut output_file = output_root.join(relative);
            if let Some(extension) = &self.output_extension {
                output_file.set_extension(extension);
            }

            match self.rewrite_file_to(&path, &output_file) {
                Ok(file_summary) => summary.merge(file_summary),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "failed to rewrite file");
                    summary
                        .errors
                        .push(format!("Error processing {}: {:#}", path.display(), e));
                }
            }
        }

        Ok(())
    }

    /// Check if a file should be processed based on its extension
    fn should_process_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|extension| extension.to_string_lossy().to_lowercase())
            .is_some_and(|ext| {
                self.source_extensions
                    .iter()
                    .any(|wanted| wanted.to_lowercase() == ext)
            })
    }
}

impl Default for FileRewriter {
    fn default() -> Self {
        Self::new(RewriteConfig::default())
    }
}

/// Summary of a file or directory rewrite
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileRewriteSummary {
    pub files_processed: usize,
    pub files_changed: usize,
    pub total_rewrites: u64,
    pub warnings: usize,
    pub errors: Vec<String>,
}

impl FileRewriteSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one rewritten file
    pub fn record(&mut self, output: &RewriteOutput) {
        self.files_processed += 1;
        if output.changed() {
            self.files_changed += 1;
        }
        self.total_rewrites += output.report.total_rewrites();
        self.warnings += output.report.warnings.len();
    }

    pub fn merge(&mut self, other: FileRewriteSummary) {
        self.files_processed += other.files_processed;
        self.files_changed += other.files_changed;
        self.total_rewrites += other.total_rewrites;
        self.warnings += other.warnings;
        self.errors.extend(other.errors);
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
