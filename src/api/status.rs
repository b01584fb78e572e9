// ============================================================================
// API Client : état du marché US (page HTML)
// ============================================================================
// Pas de parsing HTML complet : on cherche le span marqueur par regex et on
// classe sa phrase ("U.S. Markets closed" => closed, le reste => open).
// ============================================================================

use regex::Regex;
use reqwest::Url;
use tracing::{debug, error};

use crate::api::fetcher::RawResponse;
use crate::api::source::SourceAdapter;
use crate::error::{DataError, Error, InputError};
use crate::models::MarketStatus;

/// Adaptateur de la page d'état du marché
#[derive(Debug, Clone)]
pub struct HtmlScrape {
    url: Url,
    marker: Regex,
}

impl HtmlScrape {
    /// `marker_class` : classe CSS du span (ex: "Va(m)")
    ///
    /// La classe est cherchée comme un mot de l'attribut `class`, entre
    /// guillemets simples ou doubles : `class="Va(m) Fz(s)"` correspond.
    ///
    /// CONCEPT RUST : raw strings r#"..."#
    /// - Pas d'échappement des guillemets ni des backslashes
    /// - Pratique pour les regex qui contiennent les deux
    pub fn new(url: Url, marker_class: &str) -> Result<Self, InputError> {
        let class = marker_class.trim();
        if class.is_empty() || class.contains(char::is_whitespace) {
            return Err(InputError::InvalidMarker {
                class: marker_class.to_string(),
                reason: "une seule classe CSS attendue".to_string(),
            });
        }

        let class = regex::escape(class);
        let pattern = format!(
            r#"<span\b[^>]*\bclass\s*=\s*(?:"(?:[^"]*\s)?{c}(?:\s[^"]*)?"|'(?:[^']*\s)?{c}(?:\s[^']*)?')[^>]*>([^<]*)</span>"#,
            c = class
        );
        let marker = Regex::new(&pattern).map_err(|e| InputError::InvalidMarker {
            class: marker_class.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { url, marker })
    }

    /// Extrait la phrase du span marqueur
    ///
    /// Plusieurs spans peuvent porter la classe : on préfère celui qui parle
    /// des marchés, sinon le premier.
    pub fn extract_phrase<'a>(&self, html: &'a str) -> Result<&'a str, DataError> {
        let phrases: Vec<&str> = self
            .marker
            .captures_iter(html)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .collect();

        phrases
            .iter()
            .find(|p| p.to_lowercase().contains("market"))
            .or_else(|| phrases.first())
            .copied()
            .ok_or_else(|| DataError::new("Page de statut : span marqueur introuvable"))
    }

    pub fn classify(&self, html: &str) -> Result<MarketStatus, DataError> {
        let phrase = self.extract_phrase(html).map_err(|e| {
            error!("Market status marker not found");
            e
        })?;
        let status = MarketStatus::from_phrase(phrase);
        debug!(phrase, status = %status, "Classified market status");
        Ok(status)
    }
}

impl SourceAdapter for HtmlScrape {
    type Request = ();
    type Output = MarketStatus;

    fn name(&self) -> &'static str {
        "yahoo_market_status"
    }

    fn url(&self, _request: &()) -> Result<Url, Error> {
        Ok(self.url.clone())
    }

    fn parse(&self, _request: &(), raw: RawResponse) -> Result<MarketStatus, DataError> {
        self.classify(&raw.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> HtmlScrape {
        HtmlScrape::new(Url::parse("https://finance.yahoo.com/").unwrap(), "Va(m)").unwrap()
    }

    #[test]
    fn test_closed() {
        let html = r#"<span class="Va(m)" data-reactid=".1fyl5igkzba.0.$0.0.1.3.0.0.0.1.0.0.1">U.S. Markets closed</span>"#;
        assert_eq!(scraper().classify(html).unwrap(), MarketStatus::Closed);
    }

    #[test]
    fn test_other_phrase_is_open() {
        let html = r#"<div><span class="Va(m)">U.S. Markets close in 3 hrs 12 mins</span></div>"#;
        assert_eq!(scraper().classify(html).unwrap(), MarketStatus::Open);
    }

    #[test]
    fn test_prefers_market_phrase() {
        let html = r#"<span class="Va(m)">Today</span><p>..</p><span data-x="1" class="Va(m)">U.S. Markets closed</span>"#;
        assert_eq!(scraper().extract_phrase(html).unwrap(), "U.S. Markets closed");
    }

    #[test]
    fn test_marker_among_other_classes() {
        let html = r#"<span class="C(black) Va(m) Fz(s)">U.S. Markets closed</span>"#;
        assert_eq!(scraper().classify(html).unwrap(), MarketStatus::Closed);

        let html = r#"<span id="status" class='Va(m)'>U.S. Markets open</span>"#;
        assert_eq!(scraper().classify(html).unwrap(), MarketStatus::Open);
    }

    #[test]
    fn test_marker_absent() {
        let html = r#"<span class="Va(t)">U.S. Markets closed</span>"#;
        assert!(scraper().classify(html).is_err());
        assert!(scraper().classify("").is_err());

        // "Va(m)x" n'est pas la classe "Va(m)"
        let html = r#"<span class="Va(m)x Fz(s)">U.S. Markets closed</span>"#;
        assert!(scraper().classify(html).unwrap_err().message().contains("introuvable"));
    }

    #[test]
    fn test_invalid_marker_class_is_not_data_error() {
        let url = Url::parse("https://finance.yahoo.com/").unwrap();
        let err = HtmlScrape::new(url.clone(), "Va(m) Fz(s)").unwrap_err();
        assert!(matches!(err, InputError::InvalidMarker { .. }));
        assert!(HtmlScrape::new(url, "  ").is_err());
    }
}
