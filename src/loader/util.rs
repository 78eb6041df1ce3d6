use crate::model::Cell;
use chrono::{NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Classe un champ CSV brut en cellule typée.
pub(crate) fn classify(raw: &str) -> Cell {
    let t = raw.trim();
    if is_null(t) {
        return Cell::Empty;
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Cell::Date(d);
    }
    // pandas/tableurs : `2024-12-18 00:00:00`, parfois avec fractions de secondes
    let no_fraction = t.split('.').next().unwrap_or(t);
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(no_fraction, fmt) {
            return Cell::Date(dt.date());
        }
    }
    match t.parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        _ => Cell::Text(t.to_string()),
    }
}

fn is_null(t: &str) -> bool {
    t.is_empty() || ["nan", "nat", "none"].iter().any(|n| t.eq_ignore_ascii_case(n))
}

/// Texte d'un code de turno : le champ rogné tel quel, sans conversion
/// numérique (`07` reste `07`). Les marqueurs nuls donnent `""`.
pub(super) fn code_text(raw: &str) -> &str {
    let t = raw.trim();
    if is_null(t) {
        ""
    } else {
        t
    }
}

/// Partie avant la première virgule (`"18/12, Thu"` → `"18/12"`).
pub(super) fn before_comma(t: &str) -> &str {
    t.split(',').next().unwrap_or(t).trim()
}

/// Découpe `a/b[/c]` en entiers ; `None` si une partie n'est pas numérique.
pub(super) fn slash_parts(t: &str) -> Option<Vec<u32>> {
    t.split('/').map(|p| p.trim().parse::<u32>().ok()).collect()
}
