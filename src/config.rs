// ============================================================================
// Module : config
// ============================================================================
// Endpoints des sources, fuseau horaire de référence et réglages HTTP.
//
// Par défaut tout pointe vers les sources réelles ; chaque valeur peut être
// surchargée par variable d'environnement (préfixe STOCKFEED__), par exemple :
//   STOCKFEED__TIMEZONE=America/Chicago
//   STOCKFEED__QUOTE_URL=http://127.0.0.1:8080/quotes.csv
// ============================================================================

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::InputError;

/// Configuration des sources de données
///
/// CONCEPT RUST : #[serde(default)]
/// - Un champ absent prend la valeur de `Default::default()`
/// - On ne surcharge que ce qui change (une variable d'environnement suffit)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Flux CSV de cotation (une ligne, 9 colonnes)
    pub quote_url: String,

    /// Flux CSV d'historique ; le symbole est ajouté comme dernier segment
    pub history_url: String,

    /// Flux CNBC (JSON dans une affectation JavaScript)
    pub cnbc_url: String,

    /// API de recherche de symboles
    pub lookup_url: String,

    /// Page HTML indiquant l'état du marché US
    pub status_url: String,

    /// Fuseau IANA dans lequel les sources expriment leurs dates
    pub timezone: String,

    /// Heure locale de clôture utilisée pour dater les barres journalières
    pub session_close: NaiveTime,

    /// Classe CSS du span contenant l'état du marché
    pub status_marker_class: String,

    /// User-Agent envoyé aux sources (certaines bloquent les clients "nus")
    pub user_agent: String,

    /// Timeout d'une requête HTTP en secondes
    pub timeout_secs: u64,

    /// Répertoire des logs (None = emplacement par défaut)
    pub log_dir: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            quote_url: "https://download.finance.yahoo.com/d/quotes.csv".to_string(),
            history_url: "https://query1.finance.yahoo.com/v7/finance/download".to_string(),
            cnbc_url: "https://apps.cnbc.com/company/quote/newindex.asp".to_string(),
            lookup_url: "https://d.yimg.com/autoc.finance.yahoo.com/autoc".to_string(),
            status_url: "https://finance.yahoo.com/".to_string(),
            timezone: "America/New_York".to_string(),
            session_close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            status_marker_class: "Va(m)".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
            timeout_secs: 30,
            log_dir: None,
        }
    }
}

impl SourceConfig {
    /// Charge la configuration : valeurs par défaut, puis .env, puis environnement
    pub fn load() -> Result<Self> {
        // Un .env absent n'est pas une erreur
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("STOCKFEED")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Échec de la lecture de la configuration")?;

        let cfg: SourceConfig = settings
            .try_deserialize()
            .context("Configuration invalide")?;

        // Valide le fuseau dès le chargement plutôt qu'au premier fetch
        cfg.tz().context("Fuseau horaire invalide")?;
        Ok(cfg)
    }

    /// Fuseau horaire de la source
    pub fn tz(&self) -> Result<Tz, InputError> {
        Tz::from_str(&self.timezone).map_err(|_| InputError::UnknownTimezone(self.timezone.clone()))
    }

    /// Répertoire des logs : valeur configurée ou emplacement par défaut
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(crate::logging::default_log_dir)
    }

    /// Même configuration, tous les endpoints pointant vers `base`
    ///
    /// Utile pour rediriger les sources vers un serveur local (tests, proxy).
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            quote_url: format!("{}/d/quotes.csv", base),
            history_url: format!("{}/v7/finance/download", base),
            cnbc_url: format!("{}/company/quote/newindex.asp", base),
            lookup_url: format!("{}/autoc", base),
            status_url: format!("{}/", base),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SourceConfig::default();
        assert_eq!(cfg.tz().unwrap(), chrono_tz::America::New_York);
        assert_eq!(cfg.session_close, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(cfg.status_marker_class, "Va(m)");
        assert_eq!(cfg.log_dir(), crate::logging::default_log_dir());
    }

    #[test]
    fn test_unknown_timezone() {
        let cfg = SourceConfig {
            timezone: "Mars/Olympus".to_string(),
            ..SourceConfig::default()
        };
        let err = cfg.tz().unwrap_err();
        assert_eq!(err, InputError::UnknownTimezone("Mars/Olympus".to_string()));
    }

    #[test]
    fn test_with_base_url() {
        let cfg = SourceConfig::with_base_url("http://127.0.0.1:9000/");
        assert_eq!(cfg.quote_url, "http://127.0.0.1:9000/d/quotes.csv");
        assert_eq!(cfg.status_url, "http://127.0.0.1:9000/");
        assert_eq!(cfg.timezone, "America/New_York");
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let cfg: SourceConfig =
            serde_json::from_str(r#"{"timezone":"America/Chicago","session_close":"15:00:00"}"#)
                .unwrap();
        assert_eq!(cfg.tz().unwrap(), chrono_tz::America::Chicago);
        assert_eq!(cfg.session_close, NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(cfg.timeout_secs, 30);

        let cfg: SourceConfig = serde_json::from_str(r#"{"log_dir":"/tmp/feed-logs"}"#).unwrap();
        assert_eq!(cfg.log_dir(), PathBuf::from("/tmp/feed-logs"));
    }
}
