// ============================================================================
// Raw Fetcher
// ============================================================================
// Un seul GET HTTP vers une URL complète, qui renvoie le corps en texte et
// les métadonnées de transport (cookies) dont certains adaptateurs ont besoin.
//
// Pas de retry, pas de cache : un appel = une requête réseau. Les échecs de
// transport sont des FetchError, jamais des DataError.
// ============================================================================

use std::time::Duration;

use reqwest::header::SET_COOKIE;
use reqwest::Url;
use tracing::{debug, error, instrument};

use crate::config::SourceConfig;
use crate::error::FetchError;

/// Cookie renvoyé par la source (nom=valeur, attributs ignorés)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Réponse brute : corps texte + métadonnées de transport
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// URL réellement interrogée
    pub url: String,

    /// Corps de la réponse
    pub body: String,

    /// Cookies posés par la réponse (Set-Cookie)
    pub cookies: Vec<Cookie>,
}

impl RawResponse {
    /// Réponse construite à partir d'un texte déjà en main (tests, rejeu)
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            url: String::new(),
            body: body.into(),
            cookies: Vec::new(),
        }
    }

    /// Valeur d'un cookie par son nom
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }
}

/// Client HTTP partagé par tous les adaptateurs
///
/// reqwest::Client est un Arc en interne : cloner un Fetcher est peu coûteux
/// et réutilise le même pool de connexions.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        // User-Agent de navigateur pour éviter le blocage par les sources
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, FetchError> {
        Self::new(&config.user_agent, Duration::from_secs(config.timeout_secs))
    }

    /// Exécute un GET et renvoie le corps en texte
    ///
    /// CONCEPT RUST : async/await
    /// - send() et text() renvoient des Futures
    /// - .await suspend la tâche sans bloquer le thread du runtime
    /// - Le runtime (tokio) est fourni par l'appelant
    #[instrument(skip(self, url), fields(url = %url))]
    pub async fn get(&self, url: Url) -> Result<RawResponse, FetchError> {
        let url_str = url.to_string();

        debug!("Sending HTTP request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url_str.clone(),
                source,
            })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        // Vérifie que la réponse est un succès HTTP (200-299)
        if !status.is_success() {
            error!(status = %status, "Source returned error status");
            return Err(FetchError::Status {
                url: url_str,
                status,
            });
        }

        // CONCEPT RUST : filter_map
        // - Garde les Some, ignore les None, en un seul passage
        // - Un en-tête non ASCII ou sans '=' est simplement ignoré
        let cookies: Vec<Cookie> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(parse_set_cookie)
            .collect();

        let body = response.text().await.map_err(|source| FetchError::Body {
            url: url_str.clone(),
            source,
        })?;

        debug!(bytes = body.len(), cookies = cookies.len(), "Fetched response body");
        Ok(RawResponse {
            url: url_str,
            body,
            cookies,
        })
    }
}

/// Extrait `nom=valeur` d'un en-tête Set-Cookie
pub fn parse_set_cookie(header: &str) -> Option<Cookie> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(Cookie {
        name: name.to_string(),
        value: value.trim().to_string(),
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new("stockfeed-test", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_parse_set_cookie() {
        let cookie = parse_set_cookie("B=8c2a1o5b; expires=Fri, 01-Jan-2027 00:00:00 GMT; path=/").unwrap();
        assert_eq!(cookie.name, "B");
        assert_eq!(cookie.value, "8c2a1o5b");

        assert!(parse_set_cookie("garbage").is_none());
        assert!(parse_set_cookie("=value").is_none());
    }

    #[test]
    fn test_raw_response_cookie_lookup() {
        let mut raw = RawResponse::from_body("x");
        raw.cookies.push(Cookie {
            name: "B".to_string(),
            value: "abc".to_string(),
        });
        assert_eq!(raw.cookie("B"), Some("abc"));
        assert_eq!(raw.cookie("C"), None);
    }

    #[tokio::test]
    async fn test_get_returns_body_and_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("\"SPY\",188.01")
                    .insert_header("set-cookie", "B=abc123; path=/"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/quote", server.uri())).unwrap();
        let raw = fetcher().get(url).await.unwrap();

        assert_eq!(raw.body, "\"SPY\",188.01");
        assert_eq!(raw.cookie("B"), Some("abc123"));
        assert!(raw.url.ends_with("/quote"));
    }

    #[tokio::test]
    async fn test_get_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let err = fetcher().get(url).await.unwrap_err();

        match err {
            FetchError::Status { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_connection_refused() {
        // Port réservé sans serveur : échec de transport, pas DataError
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = fetcher().get(url).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
