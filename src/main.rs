//! readme-lens - translate an installed extension's README
//!
//! Entry point: picks an extension, translates its README and description,
//! and shows the result next to the original in a local preview page.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use readme_lens::cli::{Args, Commands};
use readme_lens::config::Config;
use readme_lens::host::ExtensionInfo;
use readme_lens::panel::{FileResources, PanelResources, server};
use readme_lens::workflow::Workflow;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = setup_logging(args.verbose) {
        eprintln!("{:#}", e);
    }

    if let Err(e) = run(args).await {
        error!("Translation failed: {:#}", e);
        eprintln!("Translation failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    if let Commands::InitConfig { path } = &args.command {
        Config::default().save_to_file(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Commands::List => {
            let workflow = Workflow::new(config)?;
            let candidates = workflow.candidates().await?;

            if candidates.is_empty() {
                println!("No extensions found.");
                return Ok(());
            }

            println!("\nInstalled Extensions:");
            println!("{:<40} {:<45} {:<10}", "Name", "Id", "Version");
            println!("{}", "-".repeat(97));
            for ext in &candidates {
                println!("{:<40} {:<45} {:<10}", ext.label(), ext.id, ext.version);
            }
        }
        Commands::Translate { extension, target_lang, output, no_open } => {
            let target_language = target_lang.unwrap_or_else(|| config.translate.target_language.clone());
            let open = config.panel.open_browser && !no_open;
            let bind_address = config.panel.bind_address.clone();

            let workflow = Workflow::new(config)?;
            let candidates = workflow.candidates().await?;
            if candidates.is_empty() {
                anyhow::bail!("No extensions available to translate");
            }

            let selected = match extension {
                Some(query) => Workflow::find_extension(&candidates, &query)?,
                None => match prompt_selection(&candidates)? {
                    Some(ext) => ext,
                    None => {
                        println!("Cancelled.");
                        return Ok(());
                    }
                },
            };

            let progress = ProgressBar::new(2);
            progress.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .context("Invalid progress template")?,
            );
            progress.enable_steady_tick(Duration::from_millis(120));

            let view = workflow
                .translate_extension(selected, &target_language, &progress)
                .await?;

            match output {
                Some(path) => {
                    let page = workflow.present(&view, &target_language, &FileResources);
                    std::fs::write(&path, page.html())
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    progress.finish_with_message("Done");
                    println!("Wrote {}", path.display());

                    if open {
                        let path = std::fs::canonicalize(&path).unwrap_or(path);
                        if let Err(e) = workflow.host().open_file(&path).await {
                            warn!("Could not open {}: {}", path.display(), e);
                        }
                    }
                }
                None => {
                    let page = workflow.present(&view, &target_language, &PanelResources);
                    let listener = TcpListener::bind(&bind_address)
                        .await
                        .with_context(|| format!("Failed to bind {}", bind_address))?;
                    let url = format!("http://{}/", listener.local_addr()?);
                    let router = server::router(
                        page.into_html(),
                        workflow.host(),
                        vec![view.extension.install_path.clone()],
                    );
                    progress.finish_with_message("Done");
                    println!("Preview of {} at {} (Ctrl-C to stop)", view.extension.label(), url);

                    if open {
                        if let Err(e) = workflow.host().open_external(&url).await {
                            warn!("Could not open browser: {}", e);
                        }
                    }

                    server::serve(listener, router, shutdown_signal()).await?;
                }
            }
        }
        Commands::InitConfig { .. } => {}
    }

    info!("readme-lens finished");
    Ok(())
}

/// Numbered list on stdout, choice read from stdin. An empty answer cancels.
fn prompt_selection(candidates: &[ExtensionInfo]) -> Result<Option<&ExtensionInfo>> {
    println!("\nSelect an extension to translate:");
    for (index, ext) in candidates.iter().enumerate() {
        let description = ext.description_text();
        if description.is_empty() {
            println!("{:>4}. {} ({})", index + 1, ext.label(), ext.id);
        } else {
            println!("{:>4}. {} ({}) - {}", index + 1, ext.label(), ext.id, description);
        }
    }

    let stdin = io::stdin();
    loop {
        print!("Number (empty to cancel): ");
        io::stdout().flush()?;

        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer)? == 0 {
            return Ok(None);
        }

        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(None);
        }

        match answer.parse::<usize>() {
            Ok(n) if (1..=candidates.len()).contains(&n) => return Ok(Some(&candidates[n - 1])),
            _ => println!("Please enter a number between 1 and {}", candidates.len()),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".readme-lens").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "readme-lens.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("readme-lens.log").display());

    Ok(())
}
