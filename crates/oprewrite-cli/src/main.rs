use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{bail, Result};
use clap::{Arg, Command};
use oprewrite_core::{init_tracing, FileRewriter, RewriteConfig};

fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("oprewrite")
        .version(oprewrite_core::VERSION)
        .about("Rewrite arithmetic on a user-defined type into explicit function calls")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .help("C++ source file, or a directory of sources")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("Write to PATH instead of stdout (required for directories)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("target-type")
                .long("target-type")
                .value_name("NAME")
                .help("Type whose operators and converting constructors are rewritten")
                .default_value("complex"),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Print a JSON rewrite report to stderr")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Extract command line options
    let input = matches
        .get_one::<PathBuf>("input")
        .cloned()
        .unwrap_or_default();
    let output = matches.get_one::<PathBuf>("output").cloned();
    let target_type = matches
        .get_one::<String>("target-type")
        .cloned()
        .unwrap_or_else(|| "complex".to_string());
    let stats = matches.get_flag("stats");
    let debug = matches.get_flag("debug");

    init_tracing(debug);

    let rewriter = FileRewriter::new(RewriteConfig::default().with_target_type(target_type));

    if input.is_dir() {
        let Some(output) = output else {
            bail!("--output is required when INPUT is a directory");
        };
        let summary = rewriter.rewrite_directory(&input, &output)?;
        if stats {
            eprintln!("{}", serde_json::to_string_pretty(&summary)?);
        }
        for error in &summary.errors {
            eprintln!("{error}");
        }
        if !summary.is_success() {
            bail!("{} file(s) could not be rewritten", summary.errors.len());
        }
        return Ok(());
    }

    let rewritten = rewriter.rewrite_file(&input)?;
    match output {
        Some(path) => fs::write(&path, &rewritten.text)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rewritten.text.as_bytes())?;
            stdout.flush()?;
        }
    }

    if stats {
        eprintln!("{}", serde_json::to_string_pretty(&rewritten.report)?);
    }

    Ok(())
}
