mod discover;
mod report;
mod writer;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use discover::LegacyTemplate;
use report::{Batch, FailureReport};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Legacy template converter.
#[derive(Parser)]
#[command(name = "recast", version, about = "Legacy template to Jinja converter")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert legacy templates and write the .html.j2 results
    Convert {
        /// Directory containing legacy .txt templates
        #[arg(long = "in", short = 'i', value_name = "DIR")]
        in_dir: PathBuf,

        /// Directory receiving converted templates
        #[arg(long = "out", short = 'o', value_name = "DIR", default_value = "./out/")]
        out_dir: PathBuf,

        /// Only convert the named templates (names without extension)
        #[arg(long, short = 'c', value_delimiter = ',')]
        only: Vec<String>,

        /// Recursively search for templates in the input directory
        #[arg(long, short = 'r')]
        recursive: bool,
    },

    /// Convert in memory and report metadata without writing files
    Scan {
        /// Directory containing legacy .txt templates
        #[arg(long = "in", short = 'i', value_name = "DIR")]
        in_dir: PathBuf,

        /// Only scan the named templates (names without extension)
        #[arg(long, short = 'c', value_delimiter = ',')]
        only: Vec<String>,

        /// Recursively search for templates in the input directory
        #[arg(long, short = 'r')]
        recursive: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            in_dir,
            out_dir,
            only,
            recursive,
        } => {
            cmd_convert(&in_dir, &out_dir, &only, recursive, cli.output, cli.quiet);
        }
        Commands::Scan {
            in_dir,
            only,
            recursive,
        } => {
            cmd_scan(&in_dir, &only, recursive, cli.output, cli.quiet);
        }
    }
}

fn cmd_convert(
    in_dir: &Path,
    out_dir: &Path,
    only: &[String],
    recursive: bool,
    output: OutputFormat,
    quiet: bool,
) {
    if !quiet && output == OutputFormat::Text {
        println!(
            "Converting templates from {} to {}",
            in_dir.display(),
            out_dir.display()
        );
    }

    let templates = load_templates(in_dir, only, recursive, output, quiet);
    let mut batch = Batch::new(templates.len());

    for template in templates {
        match recast_core::convert(&template.name, &template.data) {
            Ok(converted) => {
                let path = match writer::write_template(out_dir, &converted) {
                    Ok(path) => path,
                    Err(e) => {
                        let msg =
                            format!("failed to write output for {}: {}", converted.name, e);
                        report_error(&msg, output, quiet);
                        process::exit(1);
                    }
                };
                if !quiet && output == OutputFormat::Text {
                    println!("Converted {} -> {}", converted.name, path.display());
                    println!(
                        "  - {} variable(s), {} function(s), {} import(s)",
                        converted.variables.len(),
                        converted.functions.len(),
                        converted.imports.len()
                    );
                }
                batch.succeeded(converted);
            }
            Err(e) => {
                let failure = FailureReport::new(&e, &template.data);
                if !quiet && output == OutputFormat::Text {
                    failure.print();
                }
                batch.failed(failure);
            }
        }
    }

    finish(&batch, output, quiet);
}

fn cmd_scan(in_dir: &Path, only: &[String], recursive: bool, output: OutputFormat, quiet: bool) {
    let templates = load_templates(in_dir, only, recursive, output, quiet);
    let mut batch = Batch::new(templates.len());

    for template in templates {
        match recast_core::convert(&template.name, &template.data) {
            Ok(converted) => {
                if !quiet && output == OutputFormat::Text {
                    println!(
                        "{}: {} variable(s), {} function(s), {} import(s)",
                        converted.name,
                        converted.variables.len(),
                        converted.functions.len(),
                        converted.imports.len()
                    );
                    print_names("variables", &converted.variables);
                    print_names("functions", &converted.functions);
                    print_names("imports", &converted.imports);
                }
                batch.succeeded(converted);
            }
            Err(e) => {
                let failure = FailureReport::new(&e, &template.data);
                if !quiet && output == OutputFormat::Text {
                    failure.print();
                }
                batch.failed(failure);
            }
        }
    }

    finish(&batch, output, quiet);
}

/// Discovers templates under `in_dir` and applies the `--only` filter.
/// Discovery failures are fatal; an empty result is not.
fn load_templates(
    in_dir: &Path,
    only: &[String],
    recursive: bool,
    output: OutputFormat,
    quiet: bool,
) -> Vec<LegacyTemplate> {
    if !in_dir.is_dir() {
        let msg = format!("input directory {} does not exist", in_dir.display());
        report_error(&msg, output, quiet);
        process::exit(1);
    }

    let mut templates = match discover::discover(in_dir, recursive) {
        Ok(templates) => templates,
        Err(e) => {
            let msg = format!("failed to read input directory {}: {}", in_dir.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    if !only.is_empty() {
        discover::retain_named(&mut templates, only);
    }

    if !quiet && output == OutputFormat::Text {
        for template in &templates {
            println!("Found template: {}", template.name);
        }
        println!("Found {} template(s)", templates.len());
    }

    templates
}

fn print_names(label: &str, names: &BTreeSet<String>) {
    if names.is_empty() {
        return;
    }
    let joined = names
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    println!("  {}: {}", label, joined);
}

/// Prints the aggregate report and exits non-zero when any template failed.
fn finish(batch: &Batch, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let doc = serde_json::to_string_pretty(&batch.to_json_value())
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", doc);
        }
        OutputFormat::Text => {
            if !quiet {
                batch.print_text_summary();
            }
        }
    }

    if batch.failed_count() > 0 {
        process::exit(1);
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{{\"error\": \"{}\"}}", msg.replace('"', "\\\""));
        }
    }
}
