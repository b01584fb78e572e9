// ============================================================================
// API Client : Yahoo Finance (flux CSV)
// ============================================================================
// Deux flux CSV :
// 1. Cotation : une seule ligne, 9 colonnes dans un ordre fixe
//    symbol, last, date, time, change, open, high, low, volume
// 2. Historique : en-tête `Date,Open,High,Low,Close,Volume,Adj Close` puis
//    une ligne par jour de bourse, dans l'ordre livré par la source
//
// Les dates sont exprimées dans le fuseau de la source (US Eastern) et
// converties en UTC. L'historique est un itérateur paresseux qui s'arrête
// à la première ligne invalide.
// ============================================================================

use std::fmt;
use std::io::Cursor;
use std::iter::FusedIterator;

use chrono::{NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use reqwest::Url;
use tracing::{debug, error, warn};

use crate::api::fetcher::RawResponse;
use crate::api::source::SourceAdapter;
use crate::error::{DataError, Error, FetchError, InputError};
use crate::models::{HistoricalBar, Quote};
use crate::normalize::{anchor_date, parse_f64, parse_optional_f64, parse_volume, to_utc};

/// Colonnes demandées au flux de cotation (format "f=" de Yahoo)
const QUOTE_FORMAT: &str = "sl1d1t1c1ohgv";

/// Nombre de colonnes d'une ligne de cotation
const QUOTE_COLUMNS: usize = 9;

// ============================================================================
// Cotation CSV
// ============================================================================

/// Adaptateur du flux de cotation CSV
#[derive(Debug, Clone)]
pub struct QuoteCsv {
    base: Url,
    tz: Tz,
}

impl QuoteCsv {
    pub fn new(base: Url, tz: Tz) -> Self {
        Self { base, tz }
    }
}

impl SourceAdapter for QuoteCsv {
    type Request = String;
    type Output = Quote;

    fn name(&self) -> &'static str {
        "yahoo_quote_csv"
    }

    fn url(&self, symbol: &String) -> Result<Url, Error> {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("s", symbol)
            .append_pair("f", QUOTE_FORMAT)
            .append_pair("e", ".csv");
        Ok(url)
    }

    fn parse(&self, symbol: &String, raw: RawResponse) -> Result<Quote, DataError> {
        parse_quote_csv(symbol, &raw.body, self.tz)
    }
}

/// Parse une ligne de cotation CSV
///
/// Le symbole de la requête est conservé ; celui de la réponse ne sert que
/// si la requête n'en contenait pas.
pub fn parse_quote_csv(symbol: &str, body: &str, tz: Tz) -> Result<Quote, DataError> {
    debug!(symbol, "Parsing CSV quote");

    // Le lecteur csv gère les champs entre guillemets : "BRK,B" reste une
    // seule colonne. flexible : on contrôle nous-même le nombre de colonnes
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let record = match reader.records().next() {
        Some(Ok(record)) => record,
        Some(Err(e)) => {
            error!(error = %e, "Malformed CSV quote");
            return Err(DataError::new(format!("Ligne de cotation CSV invalide : {}", e)));
        }
        None => {
            error!("Empty CSV quote response");
            return Err(DataError::new("Réponse de cotation vide"));
        }
    };

    if record.len() != QUOTE_COLUMNS {
        error!(columns = record.len(), "Unexpected CSV quote column count");
        return Err(DataError::new(format!(
            "Cotation CSV : {} colonnes attendues, {} reçues",
            QUOTE_COLUMNS,
            record.len()
        )));
    }

    let column = |i: usize| record.get(i).unwrap_or_default();

    let parsed_symbol = column(0).trim_matches('"').trim();
    let symbol = if symbol.trim().is_empty() {
        parsed_symbol
    } else {
        if !parsed_symbol.eq_ignore_ascii_case(symbol.trim()) {
            warn!(requested = symbol, returned = parsed_symbol, "Quote symbol mismatch");
        }
        symbol.trim()
    };
    if symbol.is_empty() {
        return Err(DataError::new("Champ 'symbol' vide"));
    }

    let last = parse_f64("last", column(1))?;
    let date = parse_quote_date(column(2))?;
    let time = parse_quote_time(column(3))?;
    let change = parse_optional_f64("change", column(4))?;
    let open = parse_optional_f64("open", column(5))?;
    let high = parse_optional_f64("high", column(6))?;
    let low = parse_optional_f64("low", column(7))?;
    let volume = parse_volume("volume", column(8))?;
    let datetime = to_utc(date.and_time(time), tz)?;

    Ok(Quote {
        symbol: symbol.to_string(),
        last,
        change,
        open,
        high,
        low,
        volume,
        datetime,
    })
}

/// Date au format américain "9/28/2015"
fn parse_quote_date(raw: &str) -> Result<NaiveDate, DataError> {
    NaiveDate::parse_from_str(raw.trim_matches('"').trim(), "%m/%d/%Y")
        .map_err(|_| DataError::new(format!("Champ 'date' invalide : '{}'", raw)))
}

/// Heure au format "4:23pm"
fn parse_quote_time(raw: &str) -> Result<NaiveTime, DataError> {
    let value = raw.trim_matches('"').trim().to_lowercase();
    NaiveTime::parse_from_str(&value, "%I:%M%p")
        .map_err(|_| DataError::new(format!("Champ 'time' invalide : '{}'", raw)))
}

// ============================================================================
// Historique CSV
// ============================================================================

/// Intervalle de dates demandé (bornes incluses)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InputError> {
        if start > end {
            return Err(InputError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }
}

/// Requête d'historique
///
/// CONCEPT RUST : Builder pattern
/// - `with_range` et `with_crumb` prennent `self` par valeur et le renvoient
/// - Permet de chaîner : HistoryRequest::new("SPY").with_crumb("abc")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: String,

    /// None = tout l'historique disponible
    pub range: Option<DateRange>,

    /// Jeton "crumb" associé au cookie de session, si la source l'exige
    pub crumb: Option<String>,
}

impl HistoryRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            range: None,
            crumb: None,
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_crumb(mut self, crumb: impl Into<String>) -> Self {
        self.crumb = Some(crumb.into());
        self
    }
}

/// Adaptateur du flux d'historique CSV
#[derive(Debug, Clone)]
pub struct HistoryCsv {
    base: Url,
    tz: Tz,
    session_close: NaiveTime,
}

impl HistoryCsv {
    pub fn new(base: Url, tz: Tz, session_close: NaiveTime) -> Self {
        Self {
            base,
            tz,
            session_close,
        }
    }
}

impl SourceAdapter for HistoryCsv {
    type Request = HistoryRequest;
    type Output = HistoryBars;

    fn name(&self) -> &'static str {
        "yahoo_history_csv"
    }

    fn url(&self, request: &HistoryRequest) -> Result<Url, Error> {
        let symbol = request.symbol.trim();
        if symbol.is_empty() {
            error!("History request without symbol");
            return Err(InputError::EmptySymbol.into());
        }

        // Timestamps Unix ; period1 = 0 => historique maximal
        let (period1, period2) = match request.range {
            Some(range) => (
                range.start.and_time(NaiveTime::default()).and_utc().timestamp(),
                range
                    .end
                    .and_hms_opt(23, 59, 59)
                    .map(|dt| dt.and_utc().timestamp())
                    .unwrap_or_else(|| Utc::now().timestamp()),
            ),
            None => (0, Utc::now().timestamp()),
        };

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl {
                url: self.base.to_string(),
                reason: "URL sans chemin".to_string(),
            })?
            .pop_if_empty()
            .push(symbol);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("period1", &period1.to_string())
                .append_pair("period2", &period2.to_string())
                .append_pair("interval", "1d")
                .append_pair("events", "history");
            if let Some(crumb) = &request.crumb {
                query.append_pair("crumb", crumb);
            }
        }
        Ok(url)
    }

    fn parse(&self, request: &HistoryRequest, raw: RawResponse) -> Result<HistoryBars, DataError> {
        debug!(cookies = raw.cookies.len(), "Parsing CSV history");
        HistoryBars::new(&request.symbol, raw.body, self.tz, self.session_close)
    }
}

/// Positions des colonnes dans l'en-tête de l'historique
#[derive(Debug, Clone, Copy)]
struct HistoryColumns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    adj_close: Option<usize>,
}

impl HistoryColumns {
    fn from_header(header: &StringRecord) -> Result<Self, DataError> {
        let find = |name: &str| header.iter().position(|h| h.eq_ignore_ascii_case(name));
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                DataError::new(format!("Historique CSV : colonne '{}' absente de l'en-tête", name))
            })
        };

        Ok(Self {
            date: require("Date")?,
            open: require("Open")?,
            high: require("High")?,
            low: require("Low")?,
            close: require("Close")?,
            volume: require("Volume")?,
            adj_close: find("Adj Close"),
        })
    }
}

/// Séquence paresseuse de barres historiques
///
/// Lit les lignes directement dans le corps de la réponse, sans copie
/// intermédiaire, et ne fait aucune I/O réseau. Parcours unique : une fois
/// épuisée (ou après une erreur), la séquence ne renvoie plus rien.
pub struct HistoryBars {
    symbol: String,
    records: StringRecordsIntoIter<Cursor<String>>,
    columns: HistoryColumns,
    tz: Tz,
    session_close: NaiveTime,
    done: bool,
}

impl HistoryBars {
    /// Valide l'en-tête puis prépare l'itération sur les lignes
    pub fn new(
        symbol: &str,
        body: String,
        tz: Tz,
        session_close: NaiveTime,
    ) -> Result<Self, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(Cursor::new(body));

        let header = reader
            .headers()
            .map_err(|e| DataError::new(format!("En-tête d'historique CSV illisible : {}", e)))?;
        let columns = HistoryColumns::from_header(header)?;

        Ok(Self {
            symbol: symbol.trim().to_string(),
            records: reader.into_records(),
            columns,
            tz,
            session_close,
            done: false,
        })
    }

    fn parse_row(&self, record: &StringRecord) -> Result<HistoricalBar, DataError> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let field = |idx: usize, name: &str| {
            record.get(idx).ok_or_else(|| {
                DataError::new(format!("Historique ligne {} : colonne '{}' manquante", line, name))
            })
        };

        let raw_date = field(self.columns.date, "Date")?;
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            DataError::new(format!("Historique ligne {} : champ 'Date' invalide : '{}'", line, raw_date))
        })?;

        let adj_close = match self.columns.adj_close {
            Some(idx) => parse_optional_f64("Adj Close", field(idx, "Adj Close")?)?,
            None => None,
        };

        Ok(HistoricalBar {
            symbol: self.symbol.clone(),
            open: parse_f64("Open", field(self.columns.open, "Open")?)?,
            high: parse_f64("High", field(self.columns.high, "High")?)?,
            low: parse_f64("Low", field(self.columns.low, "Low")?)?,
            last: parse_f64("Close", field(self.columns.close, "Close")?)?,
            adj_close,
            volume: parse_volume("Volume", field(self.columns.volume, "Volume")?)?,
            datetime: anchor_date(date, self.session_close, self.tz)?,
        })
    }
}

// CONCEPT RUST : Iterator trait
// - Seule `next()` est à écrire ; map, filter, collect... viennent gratuitement
// - FusedIterator promet que None reste None une fois la fin atteinte
impl Iterator for HistoryBars {
    type Item = Result<HistoricalBar, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = match self.records.next()? {
            Ok(record) => self.parse_row(&record),
            Err(e) => Err(DataError::new(format!("Ligne d'historique CSV invalide : {}", e))),
        };

        // Fail-fast : la première erreur termine la séquence
        if let Err(e) = &result {
            error!(symbol = %self.symbol, error = %e, "Aborting history sequence");
            self.done = true;
        }
        Some(result)
    }
}

impl FusedIterator for HistoryBars {}

impl fmt::Debug for HistoryBars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryBars")
            .field("symbol", &self.symbol)
            .field("tz", &self.tz)
            .field("session_close", &self.session_close)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
