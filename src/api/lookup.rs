// ============================================================================
// API Client : recherche de symboles
// ============================================================================
// Réponse JSON : {"ResultSet":{"Query":"SPY","Result":[{...}, ...]}}
//
// `exchange` reprend le code brut `exch` (ex: "PCX") et `type` le code brut
// `type` (ex: "E") ; les libellés d'affichage (exchDisp, typeDisp) sont
// ignorés.
// ============================================================================

use std::iter::FusedIterator;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, error};

use crate::api::fetcher::RawResponse;
use crate::api::source::SourceAdapter;
use crate::error::{DataError, Error};
use crate::models::SymbolMatch;

// ============================================================================
// Structures pour parser la réponse JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(rename = "ResultSet")]
    result_set: ResultSet,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    #[serde(rename = "Query")]
    query: Option<String>,

    #[serde(rename = "Result")]
    result: Vec<LookupEntry>,
}

#[derive(Debug, Deserialize)]
struct LookupEntry {
    symbol: String,
    name: String,
    exch: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Adaptateur de l'API de recherche de symboles
#[derive(Debug, Clone)]
pub struct JsonLookup {
    base: Url,
}

impl JsonLookup {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl SourceAdapter for JsonLookup {
    type Request = String;
    type Output = SymbolMatches;

    fn name(&self) -> &'static str {
        "yahoo_symbol_lookup"
    }

    fn url(&self, query: &String) -> Result<Url, Error> {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("region", "1")
            .append_pair("lang", "en");
        Ok(url)
    }

    fn parse(&self, _query: &String, raw: RawResponse) -> Result<SymbolMatches, DataError> {
        SymbolMatches::parse(&raw.body, Utc::now())
    }
}

/// Séquence paresseuse de résultats de recherche
#[derive(Debug)]
pub struct SymbolMatches {
    entries: std::vec::IntoIter<LookupEntry>,
    retrieved_at: DateTime<Utc>,
}

impl SymbolMatches {
    /// Décode la réponse ; une clé `ResultSet`/`Result` manquante est une erreur
    pub fn parse(body: &str, retrieved_at: DateTime<Utc>) -> Result<Self, DataError> {
        let response: LookupResponse = serde_json::from_str(body).map_err(|e| {
            error!(error = %e, "Cannot decode symbol lookup response");
            DataError::new(format!("Recherche de symbole : réponse invalide : {}", e))
        })?;

        let set = response.result_set;
        debug!(query = ?set.query, results = set.result.len(), "Decoded symbol lookup");

        Ok(Self {
            entries: set.result.into_iter(),
            retrieved_at,
        })
    }
}

impl Iterator for SymbolMatches {
    type Item = SymbolMatch;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(SymbolMatch {
            symbol: entry.symbol,
            name: entry.name,
            exchange: entry.exch,
            kind: entry.kind,
            datetime: self.retrieved_at,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for SymbolMatches {}

impl FusedIterator for SymbolMatches {}
