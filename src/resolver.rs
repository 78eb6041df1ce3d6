use crate::model::{DayCategory, Schedule, ScheduleEntry, ScheduleRows, ShiftCode};
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Horaire renvoyé quand le couple (catégorie, code) est inconnu.
pub const UNAVAILABLE: &str = "Horario no disponible";
/// Horaire d'un code vide (jour libre ou non défini).
pub const DAY_OFF: &str = "Libre / Sin definir";
pub const REST: &str = "Descanso";

const STANDARD: &[(&str, [&str; 3])] = &[
    // code, [semaine, samedi, dimanche/férié]
    ("T1A", ["06:00 - 14:00", "06:15 - 14:15", "07:30 - 15:30"]),
    ("T1B", ["07:00 - 15:00", "07:15 - 15:15", "08:00 - 16:00"]),
    ("T2A", ["14:00 - 22:00", "14:15 - 22:15", "15:30 - 23:30"]),
    ("T2B", ["15:00 - 23:00", "15:15 - 23:15", "16:00 - 00:00"]),
    ("HN", ["22:00 - 06:00", "22:15 - 06:15", "23:30 - 07:30"]),
    ("R", [REST, REST, REST]),
    ("", [DAY_OFF, DAY_OFF, DAY_OFF]),
];

/// Ligne sérialisable d'une table d'horaires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursEntry {
    pub category: DayCategory,
    pub code: ShiftCode,
    pub range: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableError {
    #[error("empty range for {category}/{code:?}")]
    EmptyRange { category: DayCategory, code: String },
    #[error("duplicate entry for {category}/{code:?}")]
    Duplicate { category: DayCategory, code: String },
}

/// Table immuable (catégorie, code) → horaire affiché.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoursTable {
    ranges: HashMap<(DayCategory, ShiftCode), String>,
}

impl HoursTable {
    /// Table standard des turnos.
    pub fn standard() -> Self {
        let ranges = STANDARD
            .iter()
            .flat_map(|(code, per_category)| {
                DayCategory::ALL
                    .iter()
                    .zip(per_category.iter())
                    .map(move |(cat, range)| ((*cat, ShiftCode::new(code)), range.to_string()))
            })
            .collect();
        Self { ranges }
    }

    pub fn from_entries(entries: Vec<HoursEntry>) -> Result<Self, TableError> {
        let mut ranges = HashMap::with_capacity(entries.len());
        for e in entries {
            if e.range.trim().is_empty() {
                return Err(TableError::EmptyRange {
                    category: e.category,
                    code: e.code.to_string(),
                });
            }
            let key = (e.category, ShiftCode::new(e.code.as_str()));
            if ranges.contains_key(&key) {
                return Err(TableError::Duplicate {
                    category: key.0,
                    code: key.1.to_string(),
                });
            }
            ranges.insert(key, e.range.trim().to_string());
        }
        Ok(Self { ranges })
    }

    /// Charge une table JSON (`[{"category","code","range"}, ...]`).
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading hours table {}", path.display()))?;
        let entries: Vec<HoursEntry> = serde_json::from_slice(&data)
            .with_context(|| format!("parsing hours table {}", path.display()))?;
        Ok(Self::from_entries(entries)?)
    }

    /// Entrées triées par code puis catégorie (export stable).
    pub fn to_entries(&self) -> Vec<HoursEntry> {
        let mut out: Vec<HoursEntry> = self
            .ranges
            .iter()
            .map(|((category, code), range)| HoursEntry {
                category: *category,
                code: code.clone(),
                range: range.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.code.cmp(&b.code).then(a.category.cmp(&b.category)));
        out
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn lookup(&self, category: DayCategory, code: &ShiftCode) -> Option<&str> {
        self.ranges.get(&(category, code.clone())).map(String::as_str)
    }

    /// Horaire affiché pour `code` à la date `date` ; jamais d'échec.
    pub fn resolve(&self, date: NaiveDate, code: &ShiftCode) -> &str {
        self.lookup(DayCategory::of(date), code).unwrap_or(UNAVAILABLE)
    }
}

impl Default for HoursTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Résout toutes les lignes chargées en planning.
pub fn build_schedule(rows: &ScheduleRows, table: &HoursTable) -> Schedule {
    rows.iter()
        .map(|(date, codes)| {
            let entries: BTreeMap<String, ScheduleEntry> = codes
                .iter()
                .map(|(person, code)| {
                    let entry = ScheduleEntry {
                        shift_code: code.clone(),
                        display_range: table.resolve(*date, code).to_string(),
                    };
                    (person.clone(), entry)
                })
                .collect();
            (*date, entries)
        })
        .collect()
}
