//! mes-view CLI - check and render view descriptors

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use mes_view::loader::{discover_views, load_model, resolve_file};
use mes_view::{prepare_view, FixSuggestion, ListenerKind, ResolvedView, ViewError};

#[derive(Parser)]
#[command(name = "mes-view")]
#[command(about = "mes-view - resolve component dependencies of MES views")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a view and print its initialization order
    Check {
        /// Path to .view.yaml file
        file: PathBuf,

        /// Data model files (repeatable)
        #[arg(short, long = "model")]
        models: Vec<PathBuf>,
    },

    /// Resolve a view and print its view model as JSON
    Render {
        /// Path to .view.yaml file
        file: PathBuf,

        #[arg(short, long = "model")]
        models: Vec<PathBuf>,
    },

    /// Resolve every *.view.yaml under a directory
    Scan {
        dir: PathBuf,

        #[arg(short, long = "model")]
        models: Vec<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check { file, models } => check_view(&file, &models),
        Commands::Render { file, models } => render_view(&file, &models),
        Commands::Scan { dir, models } => scan_views(&dir, &models),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(suggestion) = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<ViewError>())
            .and_then(|err| err.fix_suggestion())
        {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn check_view(file: &Path, models: &[PathBuf]) -> Result<()> {
    let model = load_model(models)?;
    let resolved = resolve_file(file, &model)?;
    let view = resolved.view();

    println!(
        "{} View '{}.{}' is valid",
        "✓".green(),
        view.plugin(),
        view.name()
    );
    println!("  Components: {}", view.len());
    println!("  Passes: {}", resolved.passes());
    println!("  Initialization order:");
    for (i, &id) in resolved.initialization_order().iter().enumerate() {
        let component = view.component(id);
        let scope = resolved
            .node(id)
            .data_scope
            .as_ref()
            .map(|s| format!(" [{}]", s))
            .unwrap_or_default();
        println!("    {:>3}. {}{}", i + 1, component.reference, scope.dimmed());
    }

    print_listeners(&resolved);
    Ok(())
}

fn print_listeners(resolved: &ResolvedView) {
    let registry = resolved.listeners();
    if registry.is_empty() {
        return;
    }
    let view = resolved.view();
    println!("  Listeners:");
    for edge in registry.edges() {
        let kind = match edge.kind {
            ListenerKind::Field => "field",
            ListenerKind::Scope => "scope",
        };
        let field = edge
            .field
            .as_deref()
            .map(|f| format!(".{}", f))
            .unwrap_or_default();
        println!(
            "    {}{} {} {} ({})",
            view.component(edge.source).reference,
            field,
            "→".cyan(),
            view.component(edge.listener).reference,
            kind
        );
    }
}

fn render_view(file: &Path, models: &[PathBuf]) -> Result<()> {
    let model = load_model(models)?;
    let resolved = resolve_file(file, &model)?;
    let json = serde_json::to_string_pretty(&prepare_view(&resolved))
        .context("Failed to serialize view model")?;
    println!("{}", json);
    Ok(())
}

fn scan_views(dir: &Path, models: &[PathBuf]) -> Result<()> {
    let model = load_model(models)?;
    let files = discover_views(dir)?;

    let mut failed = 0;
    for file in &files {
        match resolve_file(file, &model) {
            Ok(resolved) => println!(
                "{} {} ({} components)",
                "✓".green(),
                file.display(),
                resolved.view().len()
            ),
            Err(e) => {
                failed += 1;
                println!("{} {}", "✗".red(), file.display());
                println!("    {:#}", e);
            }
        }
    }

    println!("{} views, {} failed", files.len(), failed);
    if failed > 0 {
        anyhow::bail!("{} of {} views failed to resolve", failed, files.len());
    }
    Ok(())
}
