use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Valeur typée d'une cellule du tableur exporté.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// Date native (l'heure éventuelle est ignorée)
    Date(NaiveDate),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Valeur entière d'une cellule numérique (`2024`, `2024.0`, `"2024"`).
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            Cell::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    /// Rendu texte, sans `.0` pour les nombres entiers.
    pub fn to_trimmed_string(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(t) => t.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => f.write_str("<vide>"),
            other => f.write_str(&other.to_trimmed_string()),
        }
    }
}

/// Ligne brute du tableur, une cellule par colonne d'en-tête.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Numéro de ligne dans le fichier (l'en-tête est la ligne 1)
    pub line: u64,
    pub cells: Vec<Cell>,
    /// Texte brut rogné de chaque champ (les codes ne passent pas par `Cell`)
    pub raw: Vec<String>,
}

/// Tableau de turnos tel que lu : en-têtes + lignes ordonnées.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ShiftTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Cellule `column` de `row` ; `Cell::Empty` si la ligne est courte.
    pub fn cell<'a>(&self, row: &'a RawRow, column: usize) -> &'a Cell {
        const EMPTY: &Cell = &Cell::Empty;
        row.cells.get(column).unwrap_or(EMPTY)
    }

    /// Texte brut rogné de la colonne `column` ; `""` si la ligne est courte.
    pub fn text<'a>(&self, row: &'a RawRow, column: usize) -> &'a str {
        row.raw.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Code de turno d'une personne pour une date (`T1A`, `R`, `HN`, ou vide).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ShiftCode(String);

impl ShiftCode {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().trim().to_owned())
    }
    pub fn empty() -> Self {
        Self(String::new())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catégorie de jour pour la recherche d'horaires.
///
/// Aucun calendrier de jours fériés n'est consulté : seul le jour de la
/// semaine compte, malgré le nom `SundayOrHoliday`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCategory {
    Weekday,
    Saturday,
    SundayOrHoliday,
}

impl DayCategory {
    pub const ALL: [DayCategory; 3] = [
        DayCategory::Weekday,
        DayCategory::Saturday,
        DayCategory::SundayOrHoliday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat => DayCategory::Saturday,
            Weekday::Sun => DayCategory::SundayOrHoliday,
            _ => DayCategory::Weekday,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DayCategory::Weekday => "weekday",
            DayCategory::Saturday => "saturday",
            DayCategory::SundayOrHoliday => "sunday_or_holiday",
        }
    }
}

impl fmt::Display for DayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Entrée résolue pour une personne et une date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(rename = "tipo_turno")]
    pub shift_code: ShiftCode,
    #[serde(rename = "horario")]
    pub display_range: String,
}

/// Codes par date puis par personne, tels que sortis du loader.
pub type ScheduleRows = BTreeMap<NaiveDate, BTreeMap<String, ShiftCode>>;

/// Planning résolu : date → personne → entrée.
pub type Schedule = BTreeMap<NaiveDate, BTreeMap<String, ScheduleEntry>>;
