// ============================================================================
// Module : normalize
// ============================================================================
// Fonctions pures partagées par tous les adaptateurs :
// - conversion heure locale de la source -> UTC (règles IANA, heure d'été)
// - conversion texte -> nombre, qui échoue TOUJOURS avec une DataError
//
// Aucun état, aucune I/O : tout est testable isolément.
// ============================================================================

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::DataError;

/// Valeurs que les sources utilisent pour "non communiqué"
const MISSING_MARKERS: [&str; 3] = ["N/A", "-", ""];

/// Convertit un horodatage local (fuseau de la source) en instant UTC
///
/// Pendant le passage à l'heure d'hiver une heure locale existe deux fois :
/// on retient la première occurrence. Une heure locale qui n'existe pas
/// (saut de l'heure d'été) est une erreur de données.
pub fn to_utc(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, DataError> {
    // CONCEPT RUST : match exhaustif
    // - LocalResult a trois variantes, le compilateur refuse d'en oublier une
    // - Les données portées par chaque variante sont extraites directement
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(DataError::new(format!(
            "Heure locale inexistante {} dans le fuseau {}",
            local, tz
        ))),
    }
}

/// Inverse de [`to_utc`] : instant UTC -> heure locale de la source
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// Ancre un jour calendaire sur une heure locale fixe puis convertit en UTC
pub fn anchor_date(date: NaiveDate, at: NaiveTime, tz: Tz) -> Result<DateTime<Utc>, DataError> {
    to_utc(date.and_time(at), tz)
}

/// Parse un prix (ou tout champ décimal) ; `field` nomme le champ fautif
pub fn parse_f64(field: &str, raw: &str) -> Result<f64, DataError> {
    let value = clean(raw);
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DataError::new(format!(
            "Champ '{}' non numérique : '{}'",
            field, raw
        ))),
    }
}

/// Comme [`parse_f64`] mais "N/A" / vide signifient "absent" (jamais zéro)
pub fn parse_optional_f64(field: &str, raw: &str) -> Result<Option<f64>, DataError> {
    if MISSING_MARKERS.contains(&clean(raw)) {
        return Ok(None);
    }
    parse_f64(field, raw).map(Some)
}

/// Parse un volume : entier non négatif, séparateurs de milliers tolérés
pub fn parse_volume(field: &str, raw: &str) -> Result<u64, DataError> {
    let value: String = clean(raw).chars().filter(|&c| c != ',').collect();
    value.parse::<u64>().map_err(|_| {
        DataError::new(format!("Champ '{}' n'est pas un volume entier : '{}'", field, raw))
    })
}

/// Retire les espaces et les guillemets entourant une valeur
pub fn clean(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_to_utc_summer_and_winter() {
        // EDT = UTC-4
        let summer = to_utc(local(2015, 9, 28, 16, 23), New_York).unwrap();
        assert_eq!(summer.to_rfc3339(), "2015-09-28T20:23:00+00:00");

        // EST = UTC-5
        let winter = to_utc(local(2015, 12, 1, 16, 0), New_York).unwrap();
        assert_eq!(winter.to_rfc3339(), "2015-12-01T21:00:00+00:00");
    }

    #[test]
    fn test_round_trip_across_dst() {
        // Jours de changement d'heure 2015 : 8 mars et 1er novembre
        let cases = [
            local(2015, 3, 7, 16, 0),
            local(2015, 3, 8, 16, 0),
            local(2015, 3, 8, 1, 30),
            local(2015, 11, 1, 1, 30),
            local(2015, 11, 1, 16, 0),
        ];
        for naive in cases {
            let utc = to_utc(naive, New_York).unwrap();
            assert_eq!(to_local(utc, New_York), naive);
        }
    }

    #[test]
    fn test_nonexistent_local_time() {
        // 2:30 n'existe pas le 8 mars 2015 à New York
        let err = to_utc(local(2015, 3, 8, 2, 30), New_York).unwrap_err();
        assert!(err.message().contains("inexistante"));
    }

    #[test]
    fn test_anchor_date() {
        let date = NaiveDate::from_ymd_opt(2015, 9, 30).unwrap();
        let close = NaiveTime::from_hms_opt(16, 0, 0).unwrap();
        let utc = anchor_date(date, close, New_York).unwrap();
        assert_eq!(utc.to_rfc3339(), "2015-09-30T20:00:00+00:00");
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64("last", "188.01").unwrap(), 188.01);
        assert_eq!(parse_f64("change", " -4.84 ").unwrap(), -4.84);
        assert_eq!(parse_f64("last", "\"191.72\"").unwrap(), 191.72);

        let err = parse_f64("open", "abc").unwrap_err();
        assert!(err.message().contains("'open'"));
        assert!(parse_f64("open", "NaN").is_err());
        assert!(parse_f64("open", "").is_err());
    }

    #[test]
    fn test_parse_optional_f64() {
        assert_eq!(parse_optional_f64("high", "N/A").unwrap(), None);
        assert_eq!(parse_optional_f64("high", "").unwrap(), None);
        assert_eq!(parse_optional_f64("high", "191.91").unwrap(), Some(191.91));
        assert!(parse_optional_f64("high", "x1").is_err());
    }

    #[test]
    fn test_parse_volume() {
        assert_eq!(parse_volume("volume", "178515871").unwrap(), 178515871);
        assert_eq!(parse_volume("volume", "95,412,152").unwrap(), 95412152);
        assert!(parse_volume("volume", "-3").is_err());
        assert!(parse_volume("volume", "1.5").is_err());
        let err = parse_volume("volume", "N/A").unwrap_err();
        assert!(err.message().contains("'volume'"));
    }
}
