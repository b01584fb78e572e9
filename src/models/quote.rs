// ============================================================================
// Structure : Quote
// ============================================================================
// Cotation ponctuelle d'un ticker, forme commune à toutes les sources.
//
// Les champs que certaines sources ne publient pas (change, open, high, low)
// sont des Option : absent != zéro.
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cotation normalisée
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbole demandé (ex: "SPY")
    pub symbol: String,

    /// Dernier prix
    pub last: f64,

    /// Variation depuis la clôture précédente (signée)
    pub change: Option<f64>,

    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,

    /// Volume échangé
    pub volume: u64,

    /// Instant de la cotation, en UTC
    pub datetime: DateTime<Utc>,
}

impl Quote {
    /// Variation en pourcentage du prix précédent, si la source publie `change`
    pub fn change_percent(&self) -> Option<f64> {
        let change = self.change?;
        let previous = self.last - change;
        if previous == 0.0 {
            return None;
        }
        Some(change / previous * 100.0)
    }
}
