//! lookgen CLI - Generate LookML from a dbt semantic layer
//!
//! Usage:
//!   lookgen generate <input> [-o <dir>] [--strict|--lenient] [--dry-run] [--format lookml|json]
//!   lookgen validate <input>
//!   lookgen list <input>
//!
//! Examples:
//!   lookgen generate models/ -o lookml/
//!   lookgen generate models/semantic.yml --dry-run
//!   lookgen validate models/

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use lookgen::config::Settings;
use lookgen::generate::{generate, GenerateOptions, GenerateOutput, GenerationMode};
use lookgen::lookml::emitter::EmitConfig;
use lookgen::model::loader::load_project;
use lookgen::model::Project;
use lookgen::semantic::SemanticError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lookgen")]
#[command(about = "lookgen - Generate LookML views and explores from a dbt semantic layer")]
#[command(version)]
struct Cli {
    /// Path to a lookgen.toml (defaults to the usual search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate LookML files
    Generate {
        /// YAML file or directory of YAML files
        input: PathBuf,

        /// Output directory (overrides [output] directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Abort on the first metric error
        #[arg(long, conflicts_with = "lenient")]
        strict: bool,

        /// Skip failing metrics and report them
        #[arg(long)]
        lenient: bool,

        /// Print files instead of writing them
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "lookml")]
        format: OutputFormat,
    },

    /// Check every metric and report all problems
    Validate {
        /// YAML file or directory of YAML files
        input: PathBuf,
    },

    /// List models, metrics and their resolved anchors
    List {
        /// YAML file or directory of YAML files
        input: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Lookml,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match cli.config.as_deref() {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Generate {
            input,
            output,
            strict,
            lenient,
            dry_run,
            format,
        } => {
            let mode = if strict {
                Some(GenerationMode::Strict)
            } else if lenient {
                Some(GenerationMode::Lenient)
            } else {
                None
            };
            cmd_generate(&settings, &input, output, mode, dry_run, format, cli.verbose > 0)
        }
        Commands::Validate { input } => cmd_validate(&settings, &input),
        Commands::List { input } => cmd_list(&settings, &input),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_env("LOOKGEN_LOG").unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(input: &Path) -> Option<Project> {
    match load_project(input) {
        Ok(project) => Some(project),
        Err(e) => {
            eprintln!("Error loading '{}': {}", input.display(), e);
            None
        }
    }
}

fn options(settings: &Settings) -> Option<GenerateOptions> {
    match GenerateOptions::from_settings(settings) {
        Ok(options) => Some(options),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            None
        }
    }
}

fn cmd_generate(
    settings: &Settings,
    input: &Path,
    output_dir: Option<PathBuf>,
    mode: Option<GenerationMode>,
    dry_run: bool,
    format: OutputFormat,
    verbose: bool,
) -> ExitCode {
    let Some(project) = load(input) else {
        return ExitCode::FAILURE;
    };
    let Some(mut options) = options(settings) else {
        return ExitCode::FAILURE;
    };
    if let Some(mode) = mode {
        options.mode = mode;
    }

    let output = match generate(&project, &options) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Generation error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    print_diagnostics(&output.diagnostics);

    if verbose {
        match output.fingerprint() {
            Ok(fingerprint) => eprintln!("Fingerprint: {}", fingerprint),
            Err(e) => eprintln!("Could not fingerprint output: {}", e),
        }
    }

    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&output) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Serialization error: {}", e);
                ExitCode::FAILURE
            }
        },
        OutputFormat::Lookml => {
            let files = output.render(&EmitConfig::default());
            if dry_run {
                for (name, contents) in &files {
                    println!("# --- {} ---", name);
                    println!("{}", contents);
                }
                return ExitCode::SUCCESS;
            }

            let dir = match output_dir {
                Some(dir) => dir,
                None => match settings.resolved_output_dir() {
                    Ok(dir) => dir,
                    Err(e) => {
                        eprintln!("Configuration error: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
            };
            match write_files(&dir, &files) {
                Ok(()) => {
                    println!("Wrote {} files to {}", files.len(), dir.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error writing to '{}': {}", dir.display(), e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn write_files(
    dir: &Path,
    files: &std::collections::BTreeMap<String, String>,
) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    for (name, contents) in files {
        fs::write(dir.join(name), contents)?;
    }
    Ok(())
}

fn cmd_validate(settings: &Settings, input: &Path) -> ExitCode {
    let Some(project) = load(input) else {
        return ExitCode::FAILURE;
    };
    let Some(options) = options(settings) else {
        return ExitCode::FAILURE;
    };

    // Always collect, so one run reports every problem.
    let options = options.with_mode(GenerationMode::Lenient);
    let output = match generate(&project, &options) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Validation error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if output.has_errors() {
        print_diagnostics(&output.diagnostics);
        eprintln!("{} metric(s) failed validation", output.diagnostics.len());
        return ExitCode::FAILURE;
    }

    println!(
        "OK: {} models, {} metrics",
        project.models.len(),
        output.anchors.len()
    );
    ExitCode::SUCCESS
}

fn cmd_list(settings: &Settings, input: &Path) -> ExitCode {
    let Some(project) = load(input) else {
        return ExitCode::FAILURE;
    };
    let Some(options) = options(settings) else {
        return ExitCode::FAILURE;
    };
    let output = match generate(&project, &options.with_mode(GenerationMode::Lenient)) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Input: {}", input.display());
    println!();
    print_models(&project);
    print_metrics(&project, &output);
    ExitCode::SUCCESS
}

fn print_models(project: &Project) {
    if project.models.is_empty() {
        println!("No semantic models defined.");
        return;
    }
    println!("Semantic models:");
    for model in &project.models {
        let primary = model
            .primary_entity()
            .map(|e| e.name.as_str())
            .unwrap_or("-");
        println!(
            "  - {} (primary: {}, measures: {})",
            model.name,
            primary,
            model.measures.len()
        );
    }
    println!();
}

fn print_metrics(project: &Project, output: &GenerateOutput) {
    if project.metrics.is_empty() {
        println!("No metrics defined.");
        return;
    }
    println!("Metrics:");
    for metric in &project.metrics {
        match output.anchor(&metric.name) {
            Some(anchor) => println!(
                "  - {} [{}] → {} ({}{})",
                metric.name,
                metric.metric_type(),
                anchor.model,
                anchor.entity,
                if anchor.inferred { ", inferred" } else { "" }
            ),
            None => println!("  - {} [{}] → unresolved", metric.name, metric.metric_type()),
        }
    }
}

fn print_diagnostics(diagnostics: &[SemanticError]) {
    for diag in diagnostics {
        eprintln!("[{}] {}", diag.kind(), diag);
    }
}
