mod config;
mod shell;

use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{sink::select_file_sink, view, RenamerClient, WorkflowController};
use shared::domain::QueryParams;
use tracing_subscriber::EnvFilter;

/// Upload, preview, rename and download images held by a renaming backend.
#[derive(Parser, Debug)]
#[command(name = "renamer", version, about)]
struct Cli {
    /// Backend base URL (overrides renamer.toml and environment)
    #[arg(long)]
    api_base: Option<String>,

    /// Directory archives are written to when no save dialog is used
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Never open the native save dialog
    #[arg(long)]
    no_dialog: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct QueryArgs {
    #[arg(long = "sub", default_value = "Util")]
    subcarpeta: String,
    #[arg(long, default_value = "UTIL")]
    clase: String,
    #[arg(long, default_value = "")]
    fecha: String,
    #[arg(long, default_value = "")]
    lote: String,
    #[arg(long, default_value = "")]
    angulo: String,
    /// Base folder picked on the backend
    #[arg(long)]
    base: Option<String>,
}

impl QueryArgs {
    fn params(&self) -> QueryParams {
        QueryParams::new(
            self.subcarpeta.clone(),
            self.clase.clone(),
            self.fecha.clone(),
            self.lote.clone(),
            self.angulo.clone(),
        )
        .with_base(self.base.clone())
    }
}

#[derive(Args, Debug, Clone)]
struct SelectionArgs {
    /// File name to select (repeatable)
    #[arg(long = "select")]
    names: Vec<String>,
    /// Select every listed file
    #[arg(long, conflicts_with = "names")]
    all: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload image files into a subfolder
    Upload {
        #[arg(long = "sub", default_value = "Util")]
        subcarpeta: String,
        files: Vec<PathBuf>,
    },
    /// Show the preview listing with proposed names
    List(QueryArgs),
    /// Rename the selected files, then show the refreshed preview
    Rename {
        #[command(flatten)]
        query: QueryArgs,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Download the selected files as a ZIP archive
    DownloadSelected {
        #[command(flatten)]
        query: QueryArgs,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Download a whole subfolder as a ZIP archive
    DownloadAll {
        #[arg(long = "sub", default_value = "Util")]
        subcarpeta: String,
    },
    /// Ask the backend to pick a base folder
    PickBase,
    /// Ask the backend to open a folder
    OpenFolder { folder: String },
    /// Interactive session
    Shell(QueryArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = config::load_settings();
    if let Some(api_base) = cli.api_base {
        settings.api_base = config::normalize_api_base(&api_base);
    }
    if let Some(download_dir) = cli.download_dir {
        settings.download_dir = download_dir;
    }
    if cli.no_dialog {
        settings.save_dialog = false;
    }
    tracing::info!(api_base = %settings.api_base, "using backend");

    let client = RenamerClient::with_timeout(
        &settings.api_base,
        Duration::from_secs(settings.request_timeout_secs),
    )
    .with_context(|| format!("invalid api base '{}'", settings.api_base))?;
    let sink = select_file_sink(settings.save_dialog, settings.download_dir.clone());
    let mut controller = WorkflowController::new(Arc::new(client), sink);

    let show_preview = match cli.command {
        Command::Upload { subcarpeta, files } => {
            controller.upload_paths(&subcarpeta, &files).await;
            false
        }
        Command::List(query) => {
            controller.list(&query.params()).await;
            true
        }
        Command::Rename { query, selection } => {
            let params = query.params();
            if select_from_listing(&mut controller, &params, &selection).await {
                controller.rename_selected(&params).await;
            }
            true
        }
        Command::DownloadSelected { query, selection } => {
            let params = query.params();
            if select_from_listing(&mut controller, &params, &selection).await {
                controller.download_selected(&params.subcarpeta).await;
            }
            false
        }
        Command::DownloadAll { subcarpeta } => {
            controller.download_all(&subcarpeta).await;
            false
        }
        Command::PickBase => {
            controller.pick_base().await;
            if let Some(base) = &controller.state().base {
                println!("{base}");
            }
            false
        }
        Command::OpenFolder { folder } => {
            controller.set_base(Some(folder));
            controller.open_folder().await;
            false
        }
        Command::Shell(query) => {
            shell::run(shell::ShellSession::new(controller, query.params())).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let failed = print_report(&mut controller, show_preview);
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Lists `params` and checks the requested cards. Returns `false` when the
/// listing itself failed, leaving the error in the controller state.
async fn select_from_listing(
    controller: &mut WorkflowController,
    params: &QueryParams,
    selection: &SelectionArgs,
) -> bool {
    controller.list(params).await;
    if controller.state().error.is_some() {
        return false;
    }
    if selection.all {
        controller.select_all();
    } else {
        for name in &selection.names {
            if !controller.select(name) {
                tracing::warn!(%name, "requested file is not in the listing");
                eprintln!("! {name} is not in the listing");
            }
        }
    }
    true
}

/// Prints the preview (optionally), status regions and any pending alert.
/// Returns whether the last action ended in an error or alert.
pub(crate) fn print_report(controller: &mut WorkflowController, show_preview: bool) -> bool {
    if show_preview {
        let preview = controller.preview_text();
        if !preview.is_empty() {
            println!("{preview}");
        }
    }
    for line in view::render_status(controller.state()) {
        println!("{line}");
    }
    let failed = controller.state().needs_attention();
    if let Some(alert) = controller.take_alert() {
        eprintln!("! {alert}");
    }
    failed
}
