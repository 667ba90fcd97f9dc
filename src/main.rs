use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod domain;
mod edit;
mod inputter;
mod model;
mod schema;
mod storage;
mod store;
mod ui;
mod view;

use controller::Controller;
use domain::{TedConfig, TedError};
use model::{Model, Status};
use schema::TableData;
use storage::Storage;
use ui::TedUI;

/// A tui based tabular data editor.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Table data file (JSON with columns and seed rows)
    table: String,

    /// Durable row store; created on first run, wins over seed rows after
    #[arg(long, default_value = "~/.ted_rows.json")]
    storage: String,

    /// Rows per page
    #[arg(long, default_value_t = 10)]
    page_size: usize,

    /// Delete rows without asking
    #[arg(long)]
    no_confirm: bool,

    /// Write logs to this file (controlled by RUST_LOG)
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn init_logging(log_file: &str) -> Result<(), TedError> {
    let path = expand(log_file)?;
    let file = std::sync::Arc::new(fs::File::create(path)?);
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file)
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn expand(path: &str) -> Result<PathBuf, TedError> {
    let expanded = shellexpand::full(path)
        .map_err(|_| TedError::PathExpansion(path.to_string()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn load_table_data(path: &str) -> Result<TableData, TedError> {
    let path = expand(path)?;
    let raw = fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TedError::FileNotFound,
        std::io::ErrorKind::PermissionDenied => TedError::PermissionDenied,
        _ => TedError::IoError(e),
    })?;
    let table: TableData = serde_json::from_str(&raw)?;
    if table.columns.is_empty() {
        return Err(TedError::LoadingFailed("table has no columns".into()));
    }
    Ok(table)
}

fn run() -> Result<(), TedError> {
    let args = Args::parse();
    if let Some(log_file) = &args.log_file {
        init_logging(log_file)?;
    }

    let table = load_table_data(&args.table)?;
    let storage = Storage::new(expand(&args.storage)?);

    let config = TedConfig::default()
        .page_size(args.page_size.max(1))
        .confirm_delete(!args.no_confirm);

    let mut model = Model::init(&config, table, storage)?;
    let ui = TedUI::new(&config);
    let controller = Controller::new(&config);

    let mut terminal = ratatui::init();
    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(model.get_uidata(), f))?;

        if let Some(message) = controller.handle_event(&model)? {
            model.update(Some(message))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_table_loads() {
        let table = load_table_data("tests/fixtures/people.json").unwrap();
        assert_eq!(table.columns.len(), 5);
        assert_eq!(table.rows.len(), 12);
        assert!(table.columns[4].options.is_some());
    }

    #[test]
    fn missing_table_file_is_reported() {
        assert!(matches!(
            load_table_data("tests/fixtures/nope.json"),
            Err(TedError::FileNotFound)
        ));
    }
}
