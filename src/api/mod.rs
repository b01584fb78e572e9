// ============================================================================
// Module : api
// ============================================================================
// Un fetcher HTTP partagé + un adaptateur par source de données.
// Chaque adaptateur convertit le format de sa source (CSV, JSON dans du
// JavaScript, JSON, HTML) vers les enregistrements canoniques de `models`.
// ============================================================================

pub mod cnbc;    // JSON dans une affectation JavaScript
pub mod fetcher; // GET HTTP brut
pub mod lookup;  // Recherche de symboles (JSON)
pub mod source;  // Trait SourceAdapter + façade StockSources
pub mod status;  // État du marché (HTML)
pub mod yahoo;   // Cotation et historique CSV

// Re-export des types principaux
pub use cnbc::{CnbcQuotes, EmbeddedJson};
pub use fetcher::{Cookie, Fetcher, RawResponse};
pub use lookup::{JsonLookup, SymbolMatches};
pub use source::{SourceAdapter, StockSources};
pub use status::HtmlScrape;
pub use yahoo::{DateRange, HistoryBars, HistoryCsv, HistoryRequest, QuoteCsv};
