// ============================================================================
// StockFeed - Library
// ============================================================================
// Ingestion de cotations et d'historiques depuis des sources web hétérogènes
// (CSV, JSON dans du JavaScript, JSON, HTML), normalisées vers une forme
// unique : Quote, HistoricalBar, SymbolMatch, MarketStatus.
//
// Chaque appel = un fetch + un parsing. Les échecs réseau sont des
// FetchError, les contenus inexploitables des DataError.
// ============================================================================

pub mod api;       // Fetcher + adaptateurs de sources
pub mod config;    // Endpoints, fuseau horaire, réglages HTTP
pub mod error;     // DataError, FetchError
pub mod logging;   // Initialisation de tracing
pub mod models;    // Enregistrements canoniques
pub mod normalize; // Fuseaux horaires et conversions numériques
pub mod portal;    // Contrat du portail de données historiques

pub use api::{DateRange, HistoryRequest, SourceAdapter, StockSources};
pub use config::SourceConfig;
pub use error::{DataError, Error, FetchError, InputError};
pub use models::{HistoricalBar, MarketStatus, Quote, SymbolMatch, TickerType};
