// ============================================================================
// SourceAdapter + StockSources
// ============================================================================
// Chaque source est un adaptateur : construire l'URL, puis convertir la
// réponse brute en enregistrement(s) canonique(s). Le fetch est fait une
// seule fois, ici, par le Fetcher partagé.
//
//   appelant -> adapter.url() -> Fetcher::get() -> adapter.parse() -> records
// ============================================================================

use reqwest::Url;
use tracing::{debug, info, instrument, warn};

use crate::api::cnbc::{CnbcQuotes, EmbeddedJson};
use crate::api::fetcher::{Fetcher, RawResponse};
use crate::api::lookup::{JsonLookup, SymbolMatches};
use crate::api::status::HtmlScrape;
use crate::api::yahoo::{HistoryBars, HistoryCsv, HistoryRequest, QuoteCsv};
use crate::config::SourceConfig;
use crate::error::{DataError, FetchError, Result};
use crate::models::{MarketStatus, Quote};

/// Une source de données : format de requête, URL, parsing
///
/// `parse` est pur (aucune I/O) : on peut le tester sur du texte en mémoire.
pub trait SourceAdapter {
    /// Paramètres d'un appel (symbole, intervalle de dates...)
    type Request;

    /// Enregistrement ou séquence d'enregistrements produit
    type Output;

    /// Nom court de la source, pour les logs
    fn name(&self) -> &'static str;

    /// URL complète à interroger
    ///
    /// Une requête invalide est refusée ici, avant tout appel réseau.
    fn url(&self, request: &Self::Request) -> Result<Url>;

    /// Convertit la réponse brute ; toute incohérence donne une DataError
    fn parse(&self, request: &Self::Request, raw: RawResponse) -> Result<Self::Output, DataError>;
}

/// Façade regroupant les cinq sources derrière un même Fetcher
#[derive(Debug, Clone)]
pub struct StockSources {
    fetcher: Fetcher,
    quotes: QuoteCsv,
    history: HistoryCsv,
    cnbc: EmbeddedJson,
    lookup: JsonLookup,
    status: HtmlScrape,
}

impl StockSources {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let tz = config.tz()?;
        Ok(Self {
            fetcher: Fetcher::from_config(config)?,
            quotes: QuoteCsv::new(parse_url(&config.quote_url)?, tz),
            history: HistoryCsv::new(parse_url(&config.history_url)?, tz, config.session_close),
            cnbc: EmbeddedJson::new(parse_url(&config.cnbc_url)?),
            lookup: JsonLookup::new(parse_url(&config.lookup_url)?),
            status: HtmlScrape::new(parse_url(&config.status_url)?, &config.status_marker_class)?,
        })
    }

    /// Un fetch puis un parsing, pour n'importe quel adaptateur
    ///
    /// CONCEPT RUST : generics + types associés
    /// - `A::Request` et `A::Output` sont fixés par chaque adaptateur
    /// - Le compilateur génère une version de la fonction par adaptateur
    #[instrument(skip(self, adapter, request), fields(source = adapter.name()))]
    pub async fn fetch_and_normalize<A: SourceAdapter>(
        &self,
        adapter: &A,
        request: A::Request,
    ) -> Result<A::Output> {
        let url = adapter.url(&request)?;
        debug!(url = %url, "Built source URL");

        let raw = self.fetcher.get(url).await?;
        adapter.parse(&request, raw).map_err(|e| {
            warn!(error = %e, "Source content could not be normalized");
            e.into()
        })
    }

    /// Cotation CSV d'un ticker
    pub async fn quote(&self, symbol: &str) -> Result<Quote> {
        let quote = self
            .fetch_and_normalize(&self.quotes, symbol.to_string())
            .await?;
        info!(symbol = %quote.symbol, last = quote.last, "Fetched quote");
        Ok(quote)
    }

    /// Historique journalier (séquence paresseuse, ordre de la source)
    pub async fn history(&self, request: HistoryRequest) -> Result<HistoryBars> {
        self.fetch_and_normalize(&self.history, request).await
    }

    /// Cotations CNBC (séquence paresseuse, datées de l'instant de récupération)
    pub async fn cnbc_quotes(&self, symbol: &str) -> Result<CnbcQuotes> {
        self.fetch_and_normalize(&self.cnbc, symbol.to_string()).await
    }

    /// Recherche de symboles par texte libre
    pub async fn lookup(&self, query: &str) -> Result<SymbolMatches> {
        self.fetch_and_normalize(&self.lookup, query.to_string()).await
    }

    /// État du marché US
    pub async fn market_status(&self) -> Result<MarketStatus> {
        let status = self.fetch_and_normalize(&self.status, ()).await?;
        info!(status = %status, "Fetched market status");
        Ok(status)
    }
}

fn parse_url(raw: &str) -> Result<Url, FetchError> {
    Url::parse(raw).map_err(|e| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;

    #[test]
    fn test_new_rejects_bad_url() {
        let config = SourceConfig {
            quote_url: "not a url".to_string(),
            ..SourceConfig::default()
        };
        let err = StockSources::new(&config).unwrap_err();
        assert!(!err.is_data_error());
    }

    #[test]
    fn test_new_rejects_bad_timezone() {
        let config = SourceConfig {
            timezone: "Nowhere/Special".to_string(),
            ..SourceConfig::default()
        };
        let err = StockSources::new(&config).unwrap_err();
        // Erreur de configuration, pas de format de source
        assert!(!err.is_data_error());
        assert!(matches!(err, crate::Error::Input(InputError::UnknownTimezone(_))));
    }

    #[test]
    fn test_adapter_parse_without_network() {
        let sources = StockSources::new(&SourceConfig::default()).unwrap();
        let raw = RawResponse::from_body(
            "\"GE\",25.10,\"12/1/2015\",\"10:05am\",0.12,25.00,25.20,24.90,1000\n",
        );
        let quote = sources.quotes.parse(&"GE".to_string(), raw).unwrap();
        // 10:05 EST = 15:05 UTC
        assert_eq!(quote.datetime.to_rfc3339(), "2015-12-01T15:05:00+00:00");
    }
}
