// ============================================================================
// Module : portal
// ============================================================================
// Interface du consommateur aval (portail de données historiques, moteur de
// backtest...). Le portail reçoit les séries normalisées et gère lui-même
// leur stockage et leur indexation : ce crate ne fait que définir le contrat.
// ============================================================================

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::models::HistoricalBar;

/// Champ numérique d'une barre historique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarField {
    Open,
    High,
    Low,
    Last,
    AdjClose,
    Volume,
}

impl fmt::Display for BarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BarField::Open => "open",
            BarField::High => "high",
            BarField::Low => "low",
            BarField::Last => "last",
            BarField::AdjClose => "adj_close",
            BarField::Volume => "volume",
        };
        f.write_str(name)
    }
}

impl FromStr for BarField {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(BarField::Open),
            "high" => Ok(BarField::High),
            "low" => Ok(BarField::Low),
            // "close" reste accepté : c'est la même valeur que "last"
            "last" | "close" => Ok(BarField::Last),
            "adj_close" | "adj close" => Ok(BarField::AdjClose),
            "volume" => Ok(BarField::Volume),
            other => Err(DataError::new(format!("Champ de barre inconnu : '{}'", other))),
        }
    }
}

/// Portail de données historiques, implémenté par le consommateur
pub trait HistoryPortal {
    /// Reçoit une série normalisée pour un symbole
    fn ingest(&mut self, symbol: &str, bars: Vec<HistoricalBar>);

    /// Valeur d'un champ telle que connue à l'instant `at`
    fn value_at(&self, symbol: &str, field: BarField, at: DateTime<Utc>) -> Option<f64>;
}
