// ============================================================================
// Structure : HistoricalBar
// ============================================================================
// Une barre journalière issue d'un historique.
//
// Le prix de clôture est exposé sous le nom `last` pour garder la même forme
// que Quote. La date est ancrée sur l'heure de clôture locale puis convertie
// en UTC.
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::portal::BarField;

/// Barre journalière normalisée
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    /// Symbole demandé (jamais lu dans la réponse)
    pub symbol: String,

    pub open: f64,
    pub high: f64,
    pub low: f64,

    /// Clôture (colonne `Close`, pas `Adj Close`)
    pub last: f64,

    /// Clôture ajustée, si la source la fournit
    pub adj_close: Option<f64>,

    pub volume: u64,

    /// Jour de bourse, à l'heure de clôture, en UTC
    pub datetime: DateTime<Utc>,
}

impl HistoricalBar {
    /// Valeur d'un champ numérique, telle que transmise au portail historique
    pub fn field(&self, field: BarField) -> Option<f64> {
        match field {
            BarField::Open => Some(self.open),
            BarField::High => Some(self.high),
            BarField::Low => Some(self.low),
            BarField::Last => Some(self.last),
            BarField::AdjClose => self.adj_close,
            BarField::Volume => Some(self.volume as f64),
        }
    }

    /// Barre haussière (clôture >= ouverture)
    pub fn is_bullish(&self) -> bool {
        self.last >= self.open
    }
}
