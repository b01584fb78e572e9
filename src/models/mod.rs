// ============================================================================
// Module : models
// ============================================================================
// Enregistrements canoniques produits par les adaptateurs.
// Valeurs immuables, créées à chaque appel, possédées par l'appelant.
// ============================================================================

pub mod bar;    // Barre journalière (historique)
pub mod quote;  // Cotation ponctuelle
pub mod status; // État du marché
pub mod ticker; // Résultat de recherche de symbole

// Re-export des structures principales
pub use bar::HistoricalBar;
pub use quote::Quote;
pub use status::MarketStatus;
pub use ticker::{SymbolMatch, TickerType};
