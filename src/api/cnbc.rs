// ============================================================================
// API Client : CNBC (JSON dans une affectation JavaScript)
// ============================================================================
// La réponse n'est pas du JSON pur mais une instruction de script :
//   var quoteDataObj = [{"symbol":"SPY","last":"191.72",...}];
// On isole le tableau entre l'affectation et le point-virgule final, sans
// évaluer de JavaScript, puis on décode les objets.
//
// Toutes les valeurs numériques arrivent sous forme de chaînes.
// La source ne donne pas d'heure de marché fiable : chaque cotation est
// datée de l'instant de récupération (imprécision acceptée).
// ============================================================================

use std::iter::FusedIterator;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::api::fetcher::RawResponse;
use crate::api::source::SourceAdapter;
use crate::error::{DataError, Error};
use crate::models::Quote;
use crate::normalize::{parse_f64, parse_optional_f64, parse_volume};

/// Adaptateur du flux CNBC
#[derive(Debug, Clone)]
pub struct EmbeddedJson {
    base: Url,
}

impl EmbeddedJson {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl SourceAdapter for EmbeddedJson {
    type Request = String;
    type Output = CnbcQuotes;

    fn name(&self) -> &'static str {
        "cnbc_embedded_json"
    }

    fn url(&self, symbol: &String) -> Result<Url, Error> {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair("symbol", symbol);
        Ok(url)
    }

    fn parse(&self, symbol: &String, raw: RawResponse) -> Result<CnbcQuotes, DataError> {
        CnbcQuotes::parse(symbol, &raw.body, Utc::now())
    }
}

/// Isole le littéral `[...]` d'une instruction `var nom = [...];`
pub fn extract_embedded_array(body: &str) -> Result<&str, DataError> {
    let statement = body.trim().trim_end_matches(';').trim_end();

    let (target, value) = statement.split_once('=').ok_or_else(|| {
        DataError::new("Flux CNBC : affectation JavaScript introuvable")
    })?;

    let target = target.trim();
    let name = target.strip_prefix("var ").unwrap_or(target).trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
        return Err(DataError::new(format!(
            "Flux CNBC : cible d'affectation invalide '{}'",
            target
        )));
    }

    let value = value.trim();
    if !(value.starts_with('[') && value.ends_with(']')) {
        return Err(DataError::new("Flux CNBC : tableau JSON introuvable"));
    }
    Ok(value)
}

/// Séquence paresseuse de cotations CNBC
///
/// Le tableau est décodé en entier à la construction ; chaque objet est
/// converti en Quote au moment où il est consommé. Aucune I/O.
#[derive(Debug)]
pub struct CnbcQuotes {
    requested: String,
    objects: std::vec::IntoIter<Map<String, Value>>,
    retrieved_at: DateTime<Utc>,
    done: bool,
}

impl CnbcQuotes {
    /// Décode la réponse ; `retrieved_at` date toutes les cotations produites
    pub fn parse(
        symbol: &str,
        body: &str,
        retrieved_at: DateTime<Utc>,
    ) -> Result<Self, DataError> {
        let array = extract_embedded_array(body).map_err(|e| {
            error!(error = %e, "Cannot isolate CNBC embedded array");
            e
        })?;

        let objects: Vec<Map<String, Value>> = serde_json::from_str(array).map_err(|e| {
            error!(error = %e, "Cannot decode CNBC embedded array");
            DataError::new(format!("Flux CNBC : JSON invalide : {}", e))
        })?;

        debug!(quotes = objects.len(), "Decoded CNBC quotes");
        Ok(Self {
            requested: symbol.trim().to_string(),
            objects: objects.into_iter(),
            retrieved_at,
            done: false,
        })
    }

    fn to_quote(&self, object: &Map<String, Value>) -> Result<Quote, DataError> {
        let symbol = match text(object, "symbol")? {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ if !self.requested.is_empty() => self.requested.clone(),
            _ => return Err(DataError::new("Flux CNBC : champ 'symbol' absent")),
        };

        let required = |field: &str| {
            text(object, field)?
                .ok_or_else(|| DataError::new(format!("Flux CNBC : champ '{}' absent", field)))
        };
        let optional = |field: &str| match text(object, field)? {
            Some(raw) => parse_optional_f64(field, &raw),
            None => Ok(None),
        };

        Ok(Quote {
            symbol,
            last: parse_f64("last", &required("last")?)?,
            change: optional("change")?,
            open: optional("open")?,
            high: optional("high")?,
            low: optional("low")?,
            volume: parse_volume("volume", &required("volume")?)?,
            datetime: self.retrieved_at,
        })
    }
}

/// Valeur d'un champ sous forme de texte (chaîne ou nombre JSON)
///
/// CONCEPT RUST : serde_json::Value
/// - JSON non typé, quand le schéma n'est pas fiable
/// - Pattern matching sur les variantes (String, Number, Null...)
fn text(object: &Map<String, Value>, field: &str) -> Result<Option<String>, DataError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(DataError::new(format!(
            "Flux CNBC : champ '{}' de type inattendu : {}",
            field, other
        ))),
    }
}

impl Iterator for CnbcQuotes {
    type Item = Result<Quote, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let object = self.objects.next()?;
        let result = self.to_quote(&object);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl FusedIterator for CnbcQuotes {}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"var quoteDataObj = [{"symbol":"SPY","symbolType":"symbol","code":0,"name":"SPDR S&P 500 ETF Trust","shortName":"SPY","last":"191.72","exchange":"NYSE Arca","source":"NYSE ARCA Real-Time Stock Prices","open":"192.08","high":"192.49","low":"189.82","change":"0.09","currencyCode":"USD","timeZone":"EDT","volume":"95412152","provider":"CNBC QUOTE CACHE","altSymbol":"SPY","curmktstatus":"REG_MKT","realTime":"true","assetType":"STOCK","noStreaming":"false","encodedSymbol":"SPY"}]"#;

    #[test]
    fn test_extract_embedded_array() {
        assert_eq!(extract_embedded_array("var x = [1, 2];").unwrap(), "[1, 2]");
        assert_eq!(extract_embedded_array("  var x=[]  ").unwrap(), "[]");
        assert!(extract_embedded_array("[1, 2]").is_err());
        assert!(extract_embedded_array("var x = {\"a\":1};").is_err());
        assert!(extract_embedded_array("var x = [1, 2").is_err());
        assert!(extract_embedded_array("alert(1) = [1]").is_err());
    }

    #[test]
    fn test_parse_cnbc_quote() {
        let now = Utc::now();
        let mut quotes = CnbcQuotes::parse("SPY", BODY, now).unwrap();
        let quote = quotes.next().unwrap().unwrap();

        assert_eq!(quote.symbol, "SPY");
        assert_eq!(quote.last, 191.72);
        assert_eq!(quote.change, Some(0.09));
        assert_eq!(quote.open, Some(192.08));
        assert_eq!(quote.high, Some(192.49));
        assert_eq!(quote.low, Some(189.82));
        assert_eq!(quote.volume, 95412152);
        assert_eq!(quote.datetime, now);
        assert!(quotes.next().is_none());
    }

    #[test]
    fn test_parse_many_and_numeric_values() {
        let body = r#"var q = [{"symbol":"SPY","last":"191.72","volume":"1"},{"symbol":"GE","last":25.1,"volume":2}];"#;
        let quotes: Vec<Quote> = CnbcQuotes::parse("SPY|GE", body, Utc::now())
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[1].symbol, "GE");
        assert_eq!(quotes[1].last, 25.1);
        assert_eq!(quotes[1].change, None);
    }

    #[test]
    fn test_bad_field_aborts_sequence() {
        let body = r#"var q = [{"symbol":"SPY","last":"abc","volume":"1"},{"symbol":"GE","last":"1","volume":"2"}];"#;
        let mut quotes = CnbcQuotes::parse("SPY", body, Utc::now()).unwrap();
        let err = quotes.next().unwrap().unwrap_err();
        assert!(err.message().contains("'last'"));
        assert!(quotes.next().is_none());
    }

    #[test]
    fn test_garbled_body() {
        assert!(CnbcQuotes::parse("SPY", "var q = [{\"symbol\":", Utc::now()).is_err());
        assert!(CnbcQuotes::parse("SPY", "var q = [1, 2];", Utc::now()).is_err());
        assert!(CnbcQuotes::parse("SPY", "<html></html>", Utc::now()).is_err());
    }
}
