/// # docdeco CLI Interface
///
/// Command parsing and orchestration for the `docdeco` binary. The transforms,
/// the page store and the site pipeline live in [`docdeco-core`]; this module
/// only loads configuration, wires those pieces together and prints results.
///
/// ## Subcommands
/// - `decorate`: decorate every page of a rendered site, in place or into an
///   output directory.
/// - `render`: decorate a single page and print it to stdout.
///
/// Programmatic and integration use goes through [`run`] with a constructed [`Cli`].
///
/// [`docdeco-core`]: ../../docdeco-core/
use crate::load_config::{load_config, SiteOverrides};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docdeco_core::contract::PageDecorator;
use docdeco_core::decorate::Decorator;
use docdeco_core::pipeline::{decorate_site, PipelineOptions, SiteReport};
use docdeco_core::site::FsPageStore;
use std::path::PathBuf;

/// CLI for docdeco: console and terminal block decoration for static docs.
#[derive(Parser)]
#[clap(
    name = "docdeco",
    version,
    about = "Style console blocks and mount terminal animations in a rendered documentation site"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decorate every page of a rendered site
    Decorate {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Rendered site directory (overrides env and config)
        #[clap(long)]
        site_dir: Option<PathBuf>,
        /// Write decorated pages here instead of in place
        #[clap(long)]
        output_dir: Option<PathBuf>,
        /// Report what would change without writing
        #[clap(long)]
        dry_run: bool,
        /// Print the site report as JSON
        #[clap(long)]
        json: bool,
    },
    /// Decorate a single page and print it to stdout
    Render {
        /// The HTML page to decorate
        file: PathBuf,
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Decorate {
            config,
            site_dir,
            output_dir,
            dry_run,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let site = config.site_config(&SiteOverrides {
                site_dir,
                output_dir,
            })?;
            tracing::info!(command = "decorate", dry_run, "Starting site decoration");
            if !json {
                println!("Decorate starting...");
            }

            let store = FsPageStore::new(site).context("Invalid site configuration")?;
            let decorator =
                Decorator::new(&config.decorate).context("Invalid decoration configuration")?;
            let report = match decorate_site(&store, &decorator, &PipelineOptions { dry_run }).await
            {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(command = "decorate", error = %e, "Site decoration failed");
                    return Err(anyhow::Error::new(e).context("Site decoration failed"));
                }
            };
            tracing::info!(command = "decorate", totals = ?report.totals, "Site decoration complete");

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&report, dry_run);
                println!("Decorate complete.");
            }
            Ok(())
        }
        Commands::Render { file, config } => {
            let config = load_config(config.as_deref())?;
            let decorator =
                Decorator::new(&config.decorate).context("Invalid decoration configuration")?;
            let source = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read page {}", file.display()))?;

            let page = decorator.decorate(&source);
            tracing::info!(command = "render", report = ?page.report, "Page rendered");
            println!("{}", page.html);
            Ok(())
        }
    }
}

fn print_summary(report: &SiteReport, dry_run: bool) {
    let totals = &report.totals;
    println!(
        "Pages: {} scanned, {} modified, {} written{}",
        report.pages.len(),
        report.pages_modified,
        report.pages_written,
        if dry_run { " (dry run)" } else { "" }
    );
    println!(
        "Console blocks: {} styled, {} clipboard payloads",
        totals.console_blocks, totals.clipboard_payloads
    );
    println!(
        "Terminals: {} upgraded, {} mounted, {} wrapped",
        totals.termy_upgraded, totals.terminals_mounted, totals.wrappers_inserted
    );
    for page in report.pages.iter().filter(|page| page.modified) {
        println!(
            "  {}{}",
            page.path.display(),
            if page.written { "" } else { " (not written)" }
        );
    }
}
