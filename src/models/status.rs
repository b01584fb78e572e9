// ============================================================================
// Enum : MarketStatus
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// État du marché US tel qu'affiché par la page de statut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    Open,
    Closed,
}

impl MarketStatus {
    /// Classe la phrase affichée : "closed" => Closed, tout le reste => Open
    pub fn from_phrase(phrase: &str) -> Self {
        if phrase.to_lowercase().contains("closed") {
            MarketStatus::Closed
        } else {
            MarketStatus::Open
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStatus::Open => "open",
            MarketStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketStatus {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(MarketStatus::Open),
            "closed" => Ok(MarketStatus::Closed),
            other => Err(DataError::new(format!("État de marché inconnu : '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_phrase() {
        assert_eq!(MarketStatus::from_phrase("U.S. Markets closed"), MarketStatus::Closed);
        assert_eq!(MarketStatus::from_phrase("U.S. Markets Closed"), MarketStatus::Closed);
        assert_eq!(MarketStatus::from_phrase("U.S. Markets open"), MarketStatus::Open);
        assert_eq!(
            MarketStatus::from_phrase("U.S. Markets close in 2 hrs 5 mins"),
            MarketStatus::Open
        );
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(MarketStatus::Closed.to_string(), "closed");
        assert_eq!("open".parse::<MarketStatus>().unwrap(), MarketStatus::Open);
        assert!("pre-market".parse::<MarketStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&MarketStatus::Closed).unwrap(),
            "\"closed\""
        );
    }
}
