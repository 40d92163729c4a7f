//! codelinks - Extract traceability markers from source code comments
//!
//! codelinks scans the comments of C, C++, C#, Python, YAML and Rust sources
//! for need-ID references, one-line needs and marked rst blocks, and writes
//! them together with links back to the hosted source.

use clap::{Parser, Subcommand};
use codelinks::config::DEFAULT_CONFIG_PATH;
use codelinks::needextend::{
    DEFAULT_REMOTE_URL_FIELD, NeedextendOptions, load_marked_content, validate_marked_content,
    write_needextend,
};
use codelinks::output::{render_summary, render_warnings};
use codelinks::{DiscoverOptions, analyse_project, find_project_root, load_config, write_outputs};
use codelinks_core::{ConfigError, Language};
use eyre::{Result, WrapErr};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "codelinks", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
enum Command {
    /// Analyse the projects of a config file and write marked_content.json
    Analyse {
        /// Path to config file (default: .config/codelinks/config.yaml)
        config: Option<PathBuf>,

        /// Output directory, overriding the config's `outdir`
        #[arg(short, long)]
        outdir: Option<PathBuf>,

        /// Only analyse the named project(s)
        #[arg(short, long)]
        project: Vec<String>,
    },

    /// List the source files a project would analyse
    Discover {
        /// Directory to search
        src_dir: PathBuf,

        /// Glob patterns always kept
        #[arg(short, long)]
        include: Vec<String>,

        /// Glob patterns to skip
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Do not honour the root .gitignore
        #[arg(long)]
        no_gitignore: bool,

        /// Source language
        #[arg(short, long, default_value = "cpp")]
        language: String,
    },

    /// Convert the need-id-refs of marked_content.json into needextend rst
    Write {
        /// marked_content.json written by `analyse`
        marked_content: PathBuf,

        /// rst file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Option of the needextend directive carrying the links
        #[arg(long, default_value = DEFAULT_REMOTE_URL_FIELD)]
        remote_url_field: String,

        /// Section title above the directives
        #[arg(long)]
        title: Option<String>,

        /// Only convert the named project(s)
        #[arg(short, long)]
        project: Vec<String>,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Analyse {
            config,
            outdir,
            project,
        } => run_analyse_command(config, outdir, project),
        Command::Discover {
            src_dir,
            include,
            exclude,
            no_gitignore,
            language,
        } => {
            let language: Language = language.parse()?;
            let options = DiscoverOptions {
                src_dir,
                include,
                exclude,
                gitignore: !no_gitignore,
                language,
            };
            run_discover_command(&options)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Write {
            marked_content,
            output,
            remote_url_field,
            title,
            project,
        } => {
            let options = NeedextendOptions {
                remote_url_field,
                title,
            };
            run_write_command(&marked_content, &output, &project, &options)
        }
    }
}

fn run_analyse_command(
    config: Option<PathBuf>,
    outdir: Option<PathBuf>,
    only: Vec<String>,
) -> Result<ExitCode> {
    let config_path = match config {
        Some(path) => path,
        None => find_project_root()?.join(DEFAULT_CONFIG_PATH),
    };
    let config = load_config(&config_path)?;

    // Relative paths in the config are relative to the config file
    let config_dir = config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let outdir = outdir.unwrap_or_else(|| config.outdir(&config_dir));

    let projects = match config.resolve(&config_dir) {
        Ok(projects) => projects,
        Err(err) => {
            report_config_error(&config_path, &err);
            return Ok(ExitCode::FAILURE);
        }
    };

    for name in &only {
        if !projects.iter().any(|p| &p.name == name) {
            eyre::bail!(
                "Project '{}' is not defined in {}",
                name,
                config_path.display()
            );
        }
    }

    let mut outcomes = Vec::new();
    for project in projects
        .iter()
        .filter(|p| only.is_empty() || only.contains(&p.name))
    {
        eprintln!(
            "{} Analysing {} in {}...",
            "->".blue().bold(),
            project.name.cyan(),
            project.discover.src_dir.display()
        );
        let outcome = analyse_project(project)?;
        if !outcome.result.warnings.is_empty() {
            eprint!("{}", render_warnings(&outcome.result.warnings));
        }
        outcomes.push(outcome);
    }

    let written = write_outputs(&outdir, &outcomes)?;

    eprintln!();
    eprint!("{}", render_summary(&outcomes));
    eprintln!(
        "\n{} Wrote {} and {}",
        "OK".green().bold(),
        written.marked_content.display(),
        written.warnings.display()
    );

    Ok(ExitCode::SUCCESS)
}

fn report_config_error(path: &Path, err: &ConfigError) {
    eprintln!(
        "{} Invalid configuration in {}:",
        "!".red().bold(),
        path.display()
    );
    for line in &err.errors {
        eprintln!("   {}", line);
    }
}

fn run_write_command(
    marked_content: &Path,
    output: &Path,
    projects: &[String],
    options: &NeedextendOptions,
) -> Result<ExitCode> {
    let records = load_marked_content(marked_content, projects)?;
    let refs = match validate_marked_content(&records) {
        Ok(refs) => refs,
        Err(err) => {
            eprintln!(
                "{} Invalid marked content in {}:",
                "!".red().bold(),
                marked_content.display()
            );
            for line in &err.errors {
                eprintln!("   {}", line);
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    let count = write_needextend(&refs, output, options)?;
    eprintln!(
        "{} Wrote {} needextend directives to {}",
        "OK".green().bold(),
        count,
        output.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_discover_command(options: &DiscoverOptions) -> Result<()> {
    let files = options
        .sources()
        .discover()
        .wrap_err_with(|| format!("Failed to discover files in {}", options.src_dir.display()))?;

    println!("{} files discovered", files.len());
    for file in &files {
        println!("{}", file.display());
    }
    Ok(())
}
