//! Indexes a project, reports its diagnostics and writes the configured outputs.
//!
//! Usage: `intl-message-db [PROJECT_ROOT]` (defaults to the current directory).
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;

use intl_message_db::MessagesDatabase;
use intl_message_db::config::{
    ConfigManager,
    FileMatcher,
};
use intl_message_db::diagnostic::DiagnosticSeverity;
use intl_message_db::indexer::WorkspaceIndexer;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let project_root = std::env::args_os().nth(1).map_or_else(|| PathBuf::from("."), PathBuf::from);

    let mut config_manager = ConfigManager::new();
    if let Err(error) = config_manager.load_settings(Some(project_root.clone())) {
        tracing::error!("{error}");
        return ExitCode::FAILURE;
    }
    let settings = config_manager.get_settings();

    let matcher = match FileMatcher::new(project_root, settings) {
        Ok(matcher) => matcher,
        Err(error) => {
            tracing::error!("{error}");
            return ExitCode::FAILURE;
        }
    };
    let indexer = WorkspaceIndexer::new(matcher);
    let db = MessagesDatabase::with_options(settings.to_database_options());

    let summary = indexer.index_workspace(&db);
    for (path, error) in &summary.failures {
        tracing::error!(file = %path, "{error}");
    }

    let diagnostics = db.validate();
    let mut has_errors = !summary.failures.is_empty();
    for diagnostic in &diagnostics {
        match diagnostic.severity {
            DiagnosticSeverity::Error => {
                has_errors = true;
                tracing::error!("{diagnostic}");
            }
            DiagnosticSeverity::Warning => tracing::warn!("{diagnostic}"),
            DiagnosticSeverity::Info => tracing::info!("{diagnostic}"),
        }
    }

    if let Err(error) = indexer.write_outputs(&db, settings) {
        tracing::error!("{error}");
        return ExitCode::FAILURE;
    }

    if has_errors { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
