// ============================================================================
// Initialisation du logging
// ============================================================================
// Logs structurés (tracing) écrits dans un fichier à rotation quotidienne.
//
// Les logs sont écrits par défaut dans :
// - Linux : ~/.local/share/stockfeed/logs/stockfeed.log
// - macOS : ~/Library/Application Support/stockfeed/logs/stockfeed.log
// - Windows : C:\Users\<user>\AppData\Local\stockfeed\logs\stockfeed.log
//
// Contrôler le niveau de log :
//   RUST_LOG=debug
//   RUST_LOG=stockfeed=trace
// ============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filtre utilisé quand RUST_LOG n'est pas défini
const DEFAULT_FILTER: &str = "stockfeed=debug,info";

/// Répertoire de logs par défaut, `./logs` si le système n'en fournit pas
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("stockfeed").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Installe le subscriber global (fichier + filtre RUST_LOG)
///
/// Renvoie une erreur, sans paniquer, si un subscriber est déjà installé.
pub fn init_logging(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    // Nouveau fichier chaque jour : stockfeed.log.2015-09-28
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "stockfeed.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .try_init()
        .context("Un subscriber tracing est déjà installé")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_dir() {
        let dir = default_log_dir();
        assert!(dir.ends_with("stockfeed/logs") || dir == PathBuf::from("./logs"));
    }

    #[test]
    fn test_init_logging_once() {
        let dir = std::env::temp_dir().join(format!("stockfeed-logs-{}", std::process::id()));
        // Le premier appel installe le subscriber, le second échoue proprement
        init_logging(&dir).unwrap();
        assert!(init_logging(&dir).is_err());
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
