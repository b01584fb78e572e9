// ============================================================================
// Structure : SymbolMatch
// ============================================================================
// Un résultat de recherche de symbole (ex: "SPY" -> SPDR S&P 500 ETF)
//
// `kind` garde le code brut de la source ("E", "S"...) ; TickerType en donne
// une lecture typée sans perdre l'information d'origine.
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type d'actif financier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickerType {
    Stock,      // Action (ex: AAPL, TSLA)
    ETF,        // Exchange-Traded Fund (ex: SPY, QQQ)
    Index,      // Indice (ex: ^GSPC, ^DJI)
    MutualFund, // Fonds (ex: VFIAX)
    Future,     // Contrat à terme (ex: ES=F)
    Forex,      // Devise (ex: EURUSD=X)
    Other(String),
}

impl TickerType {
    /// Interprète le code de type renvoyé par l'API de recherche
    pub fn from_code(code: &str) -> Self {
        match code {
            "S" => TickerType::Stock,
            "E" => TickerType::ETF,
            "I" => TickerType::Index,
            "M" => TickerType::MutualFund,
            "F" => TickerType::Future,
            "C" => TickerType::Forex,
            other => TickerType::Other(other.to_string()),
        }
    }
}

/// Résultat de recherche normalisé
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    /// Symbole (ex: "SPY")
    pub symbol: String,

    /// Nom complet (ex: "SPDR S&P 500 ETF")
    pub name: String,

    /// Code brut de la place de cotation (ex: "PCX"), pas le libellé affiché
    pub exchange: String,

    /// Code brut du type d'actif (ex: "E")
    #[serde(rename = "type")]
    pub kind: String,

    /// Instant de la récupération (pas une heure de marché)
    pub datetime: DateTime<Utc>,
}

impl SymbolMatch {
    pub fn ticker_type(&self) -> TickerType {
        TickerType::from_code(&self.kind)
    }

    /// Formatte le résultat pour l'affichage
    pub fn display(&self) -> String {
        format!("{:<8} {:<30} {:>6}  {}", self.symbol, self.name, self.exchange, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spy() -> SymbolMatch {
        SymbolMatch {
            symbol: "SPY".to_string(),
            name: "SPDR S&P 500 ETF".to_string(),
            exchange: "PCX".to_string(),
            kind: "E".to_string(),
            datetime: Utc::now(),
        }
    }

    #[test]
    fn test_ticker_type() {
        assert_eq!(spy().ticker_type(), TickerType::ETF);
        assert_eq!(TickerType::from_code("S"), TickerType::Stock);
        assert_eq!(TickerType::from_code("Z"), TickerType::Other("Z".to_string()));
    }

    #[test]
    fn test_serialized_type_field() {
        let json = serde_json::to_value(spy()).unwrap();
        assert_eq!(json["type"], "E");
        assert_eq!(json["exchange"], "PCX");
    }
}
