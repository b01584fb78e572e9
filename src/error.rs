// ============================================================================
// Module : error
// ============================================================================
// Trois familles d'erreurs bien séparées :
// - InputError : l'appelant ou la configuration est en cause (fuseau
//   inconnu, intervalle inversé, symbole vide) ; rien n'est envoyé
// - FetchError : la récupération a échoué (réseau, HTTP non-2xx, URL)
// - DataError  : le contenu a été récupéré mais ne correspond pas au format
//   attendu (colonnes manquantes, JSON invalide, champ non numérique...)
//
// Seule DataError signifie "la source a changé de format".
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère l'implémentation de std::error::Error
// - #[error("...")] définit le message de Display
// - #[from] génère le From<T> utilisé par l'opérateur ?
// ============================================================================

use thiserror::Error;

/// Contenu récupéré mais impossible à convertir vers un enregistrement canonique
///
/// Une seule valeur avec un message lisible, construite à l'endroit exact
/// où le parsing échoue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DataError {
    message: String,
}

impl DataError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Cause lisible de l'erreur
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Échec du transport : aucune donnée exploitable n'a été récupérée
#[derive(Debug, Error)]
pub enum FetchError {
    /// L'URL construite à partir de la configuration est invalide
    #[error("URL invalide '{url}' : {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Le client HTTP n'a pas pu être construit
    #[error("Échec de la création du client HTTP : {0}")]
    Client(#[source] reqwest::Error),

    /// Erreur réseau (connexion, timeout, DNS...)
    #[error("Échec de la requête HTTP vers {url} : {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// La source a répondu avec un statut hors 2xx
    #[error("{url} a retourné une erreur : HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Le corps de la réponse n'a pas pu être lu comme texte
    #[error("Échec de la lecture du corps de {url} : {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Requête ou configuration invalide, détectée avant tout appel réseau
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Fuseau horaire inconnu : '{0}'")]
    UnknownTimezone(String),

    #[error("Intervalle de dates inversé : {start} > {end}")]
    InvertedRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Marqueur de statut invalide '{class}' : {reason}")]
    InvalidMarker { class: String, reason: String },

    #[error("Symbole vide")]
    EmptySymbol,
}

/// Erreur renvoyée par les fonctions de haut niveau (fetch + parse)
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Data(#[from] DataError),
}

impl Error {
    /// true si la source a répondu mais que son contenu est inexploitable
    pub fn is_data_error(&self) -> bool {
        matches!(self, Error::Data(_))
    }

    pub fn as_data_error(&self) -> Option<&DataError> {
        match self {
            Error::Data(e) => Some(e),
            Error::Input(_) | Error::Fetch(_) => None,
        }
    }
}

/// Alias pratique pour les opérations fetch + parse
pub type Result<T, E = Error> = std::result::Result<T, E>;
