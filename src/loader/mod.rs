//! Chargement du tableau de turnos : lecture CSV, résolution des dates,
//! extraction des codes par personne.

mod dates;
mod types;
mod util;

pub use dates::{
    default_strategies, DateContext, DateStrategy, DayMonthWithSuffix, DayOfMonthFallback,
    FullDayMonthYear, NativeDate,
};
pub use types::{
    LoadError, LoadReport, LoaderOptions, DEFAULT_DATE_COLUMN, DEFAULT_MONTH_COLUMN,
    DEFAULT_PERSON, DEFAULT_YEAR_COLUMN,
};

use crate::model::{Cell, RawRow, ScheduleRows, ShiftCode, ShiftTable};
use chrono::{Datelike, Local, NaiveDate};
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Résultat d'un chargement.
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    pub rows: ScheduleRows,
    pub report: LoadReport,
}

/// Loader : options + chaîne ordonnée de stratégies de date.
pub struct Loader {
    opts: LoaderOptions,
    strategies: Vec<Box<dyn DateStrategy>>,
    today: NaiveDate,
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("Loader")
            .field("opts", &self.opts)
            .field("strategies", &names)
            .field("today", &self.today)
            .finish()
    }
}

struct Columns {
    date: usize,
    year: Option<usize>,
    month: Option<usize>,
    people: Vec<(String, usize)>,
}

impl Loader {
    pub fn new(opts: LoaderOptions) -> Self {
        let strategies = default_strategies(opts.guess_month);
        Self {
            opts,
            strategies,
            today: Local::now().date_naive(),
        }
    }

    /// Remplace la date système (tests, rejeu).
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Remplace la chaîne de stratégies.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn DateStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.opts
    }

    /// Lit le fichier entier en mémoire puis le découpe en lignes typées.
    pub fn read_table<P: AsRef<Path>>(&self, path: P) -> Result<ShiftTable, LoadError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        self.parse_table(&data)
    }

    /// Découpe un contenu CSV déjà en mémoire.
    pub fn parse_table(&self, data: &[u8]) -> Result<ShiftTable, LoadError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.opts.delimiter)
            .from_reader(data);

        let headers: Vec<String> = rdr
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for rec in rdr.byte_records() {
            let rec = rec?;
            let line = rec.position().map(|p| p.line()).unwrap_or_default();
            let raw: Vec<String> = rec
                .iter()
                .map(|field| String::from_utf8_lossy(field).trim().to_string())
                .collect();
            let cells: Vec<Cell> = raw.iter().map(|field| util::classify(field)).collect();
            if cells.iter().all(Cell::is_empty) {
                debug!(line, "blank row ignored");
                continue;
            }
            rows.push(RawRow { line, cells, raw });
        }
        Ok(ShiftTable { headers, rows })
    }

    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<Loaded, LoadError> {
        let table = self.read_table(path)?;
        self.load_table(&table)
    }

    /// Résout chaque ligne en date et extrait les codes des personnes suivies.
    pub fn load_table(&self, table: &ShiftTable) -> Result<Loaded, LoadError> {
        let cols = self.columns(table)?;
        let mut report = LoadReport {
            rows_read: table.rows.len(),
            missing_people: self
                .opts
                .people
                .iter()
                .filter(|p| !cols.people.iter().any(|(name, _)| name == *p))
                .cloned()
                .collect(),
            ..LoadReport::default()
        };

        let (default_year, inferred) = self.default_year(table, &cols);
        report.default_year = default_year;
        report.year_inferred = inferred;

        let mut rows: ScheduleRows = BTreeMap::new();
        // dernière année lue dans la colonne, reportée sur les cellules vides
        let mut carried: Option<i32> = None;
        for row in &table.rows {
            let raw = table.cell(row, cols.date);
            let year = match cols.year.and_then(|i| year_of(table.cell(row, i))) {
                Some(y) => {
                    carried = Some(y);
                    y
                }
                None if cols.year.is_some() && !report.year_inferred => {
                    let y = carried.unwrap_or(default_year);
                    debug!(line = row.line, year = y, "empty year cell, previous year carried");
                    report.years_carried += 1;
                    y
                }
                None => default_year,
            };
            let ctx = DateContext {
                year,
                month_hint: cols.month.and_then(|i| month_of(table.cell(row, i))),
                today: self.today,
            };

            let Some((date, strategy)) = self.resolve_date(raw, &ctx) else {
                warn!(line = row.line, raw = %raw, "unparsable date, row skipped");
                report.rows_skipped += 1;
                continue;
            };
            if strategy.is_guess(&ctx) {
                warn!(
                    line = row.line,
                    raw = %raw,
                    month = ctx.today.month(),
                    "day-only date, month taken from the system clock"
                );
                report.guessed_months += 1;
            }

            let codes: BTreeMap<String, ShiftCode> = cols
                .people
                .iter()
                .map(|(person, idx)| {
                    let code = ShiftCode::new(util::code_text(table.text(row, *idx)));
                    (person.clone(), code)
                })
                .collect();
            if rows.insert(date, codes).is_some() {
                debug!(line = row.line, %date, "duplicate date, later row wins");
            }
            report.rows_loaded += 1;
        }

        info!(
            loaded = report.rows_loaded,
            skipped = report.rows_skipped,
            dates = rows.len(),
            "schedule table loaded"
        );
        Ok(Loaded { rows, report })
    }

    fn resolve_date(&self, raw: &Cell, ctx: &DateContext) -> Option<(NaiveDate, &dyn DateStrategy)> {
        self.strategies
            .iter()
            .find_map(|s| s.try_parse(raw, ctx).map(|d| (d, &**s)))
    }

    fn columns(&self, table: &ShiftTable) -> Result<Columns, LoadError> {
        if self.opts.people.is_empty() {
            return Err(LoadError::EmptyRoster);
        }
        let date = table.column_index(&self.opts.date_column).ok_or_else(|| {
            warn!(column = %self.opts.date_column, "date column missing");
            LoadError::MissingColumn(self.opts.date_column.clone())
        })?;
        let year = table.column_index(&self.opts.year_column);
        if year.is_none() {
            warn!(column = %self.opts.year_column, "year column missing, a default year will be used");
        }
        let month = table.column_index(&self.opts.month_column);

        let mut people = Vec::new();
        for person in &self.opts.people {
            match table.column_index(person) {
                Some(idx) => people.push((person.clone(), idx)),
                None => warn!(person = %person, "tracked person has no column, skipped"),
            }
        }
        if people.is_empty() {
            return Err(LoadError::MissingColumn(self.opts.people.join(", ")));
        }
        Ok(Columns {
            date,
            year,
            month,
            people,
        })
    }

    /// Année par défaut : première valeur de la colonne année ; à défaut,
    /// première date qui porte son année ; sinon l'année système.
    fn default_year(&self, table: &ShiftTable, cols: &Columns) -> (i32, bool) {
        let first_in_column = cols
            .year
            .and_then(|i| table.rows.iter().find_map(|r| year_of(table.cell(r, i))));
        if let Some(year) = first_in_column {
            return (year, false);
        }

        let probe = DateContext {
            year: self.today.year(),
            month_hint: None,
            today: self.today,
        };
        let from_rows = table.rows.iter().find_map(|row| {
            let raw = table.cell(row, cols.date);
            self.strategies
                .iter()
                .filter(|s| s.carries_year())
                .find_map(|s| s.try_parse(raw, &probe))
        });
        let year = match from_rows {
            Some(d) => {
                info!(year = d.year(), "default year inferred from first dated row");
                d.year()
            }
            None => {
                info!(year = self.today.year(), "default year taken from the system clock");
                self.today.year()
            }
        };
        (year, true)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(LoaderOptions::default())
    }
}

fn year_of(cell: &Cell) -> Option<i32> {
    cell.as_integer()
        .filter(|y| (1..=9999).contains(y))
        .and_then(|y| i32::try_from(y).ok())
}

fn month_of(cell: &Cell) -> Option<u32> {
    cell.as_integer()
        .filter(|m| (1..=12).contains(m))
        .and_then(|m| u32::try_from(m).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> Loader {
        Loader::new(LoaderOptions {
            people: vec!["J. VIDAL".into(), "M. ROJAS".into()],
            ..LoaderOptions::default()
        })
        .with_today(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn loads_mixed_date_formats() {
        let l = loader();
        let csv = "FECHA,AÑO,J. VIDAL,M. ROJAS\n\
                   \"18/12, Thu\",2024,T1A,R\n\
                   05/01/2024,2024,T2B,\n\
                   2024-02-03 08:30:00,2024,HN, T1B \n\
                   TBD,2024,T1A,T1A\n";
        let table = l.parse_table(csv.as_bytes()).unwrap();
        let loaded = l.load_table(&table).unwrap();

        assert_eq!(loaded.report.rows_read, 4);
        assert_eq!(loaded.report.rows_loaded, 3);
        assert_eq!(loaded.report.rows_skipped, 1);
        assert!(!loaded.report.year_inferred);

        let dec = &loaded.rows[&ymd(2024, 12, 18)];
        assert_eq!(dec["J. VIDAL"].as_str(), "T1A");
        assert_eq!(dec["M. ROJAS"].as_str(), "R");
        assert!(loaded.rows[&ymd(2024, 1, 5)]["M. ROJAS"].is_empty());
        assert_eq!(loaded.rows[&ymd(2024, 2, 3)]["M. ROJAS"].as_str(), "T1B");
    }

    #[test]
    fn year_is_inferred_when_column_is_empty() {
        let l = loader();
        let csv = "FECHA,AÑO,J. VIDAL,M. ROJAS\n\
                   \"30/12, Mon\",,T1A,R\n\
                   31/12/2023,,T2A,R\n";
        let table = l.parse_table(csv.as_bytes()).unwrap();
        let loaded = l.load_table(&table).unwrap();
        assert!(loaded.report.year_inferred);
        assert_eq!(loaded.report.default_year, 2023);
        assert!(loaded.rows.contains_key(&ymd(2023, 12, 30)));
    }

    #[test]
    fn year_falls_back_to_clock_without_any_full_date() {
        let l = loader();
        let csv = "FECHA,J. VIDAL\n\"02/01, Thu\",T1A\n";
        let table = l.parse_table(csv.as_bytes()).unwrap();
        let loaded = l.load_table(&table).unwrap();
        assert_eq!(loaded.report.default_year, 2025);
        assert_eq!(loaded.report.missing_people, vec!["M. ROJAS".to_string()]);
        assert!(loaded.rows.contains_key(&ymd(2025, 1, 2)));
    }

    #[test]
    fn partial_year_column_carries_previous_year() {
        let l = loader();
        let csv = "FECHA,AÑO,J. VIDAL\n\
                   \"30/12, Mon\",2024,T1A\n\
                   \"31/12, Tue\",,T2A\n\
                   \"01/01, Wed\",2025,R\n\
                   \"02/01, Thu\",,HN\n";
        let table = l.parse_table(csv.as_bytes()).unwrap();
        let loaded = l.load_table(&table).unwrap();
        let keys: Vec<NaiveDate> = loaded.rows.keys().copied().collect();
        assert_eq!(
            keys,
            vec![ymd(2024, 12, 30), ymd(2024, 12, 31), ymd(2025, 1, 1), ymd(2025, 1, 2)]
        );
        assert_eq!(loaded.report.default_year, 2024);
        assert!(!loaded.report.year_inferred);
        assert_eq!(loaded.report.years_carried, 2);
    }

    #[test]
    fn leading_empty_year_cells_use_first_column_year() {
        let l = loader();
        let csv = "FECHA,AÑO,J. VIDAL\n\
                   \"29/12, Sun\",,T1A\n\
                   \"30/12, Mon\",2024,T1B\n";
        let table = l.parse_table(csv.as_bytes()).unwrap();
        let loaded = l.load_table(&table).unwrap();
        assert!(loaded.rows.contains_key(&ymd(2024, 12, 29)));
        assert_eq!(loaded.report.years_carried, 1);
    }

    #[test]
    fn numeric_looking_codes_keep_their_text() {
        let l = loader();
        let csv = "FECHA,AÑO,J. VIDAL,M. ROJAS\n\
                   05/01/2024,2024,07,1.50\n\
                   06/01/2024,2024, 1E2 ,nan\n";
        let table = l.parse_table(csv.as_bytes()).unwrap();
        let loaded = l.load_table(&table).unwrap();
        let first = &loaded.rows[&ymd(2024, 1, 5)];
        assert_eq!(first["J. VIDAL"].as_str(), "07");
        assert_eq!(first["M. ROJAS"].as_str(), "1.50");
        let second = &loaded.rows[&ymd(2024, 1, 6)];
        assert_eq!(second["J. VIDAL"].as_str(), "1E2");
        assert!(second["M. ROJAS"].is_empty());
    }

    #[test]
    fn day_only_rows_use_month_column_or_are_flagged() {
        let l = loader();
        let csv = "FECHA,AÑO,MES_NUMERO,J. VIDAL\n\
                   4,2024,7,T1A\n\
                   5,2024,,T1B\n";
        let table = l.parse_table(csv.as_bytes()).unwrap();
        let loaded = l.load_table(&table).unwrap();
        assert!(loaded.rows.contains_key(&ymd(2024, 7, 4)));
        assert!(loaded.rows.contains_key(&ymd(2024, 3, 5)));
        assert_eq!(loaded.report.guessed_months, 1);
    }

    #[test]
    fn day_only_rows_skipped_when_guessing_disabled() {
        let l = Loader::new(LoaderOptions {
            guess_month: false,
            ..LoaderOptions::default()
        })
        .with_today(ymd(2025, 3, 10));
        let table = l.parse_table("FECHA,AÑO,J. VIDAL\n5,2024,T1B\n".as_bytes()).unwrap();
        let loaded = l.load_table(&table).unwrap();
        assert!(loaded.rows.is_empty());
        assert_eq!(loaded.report.rows_skipped, 1);
    }

    #[test]
    fn missing_date_column_is_an_error() {
        let l = loader();
        let table = l.parse_table("DIA,J. VIDAL\n1,T1A\n".as_bytes()).unwrap();
        let err = l.load_table(&table).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "FECHA"));
    }

    #[test]
    fn no_roster_column_is_an_error() {
        let l = loader();
        let table = l.parse_table("FECHA,AÑO,OTRO\n05/01/2024,2024,T1A\n".as_bytes()).unwrap();
        assert!(matches!(l.load_table(&table), Err(LoadError::MissingColumn(_))));
    }

    #[test]
    fn blank_rows_and_duplicates() {
        let l = loader();
        let csv = "FECHA,AÑO,J. VIDAL\n\
                   05/01/2024,2024,T1A\n\
                   ,,\n\
                   05/01/2024,2024,T2A\n";
        let table = l.parse_table(csv.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 2);
        let loaded = l.load_table(&table).unwrap();
        assert_eq!(loaded.rows.len(), 1);
        assert_eq!(loaded.rows[&ymd(2024, 1, 5)]["J. VIDAL"].as_str(), "T2A");
    }

    #[test]
    fn semicolon_delimiter() {
        let l = Loader::new(LoaderOptions {
            delimiter: b';',
            ..LoaderOptions::default()
        });
        let table = l.parse_table("FECHA;AÑO;J. VIDAL\n18/12, Thu;2024;R\n".as_bytes()).unwrap();
        let loaded = l.load_table(&table).unwrap();
        assert_eq!(loaded.rows[&ymd(2024, 12, 18)]["J. VIDAL"].as_str(), "R");
    }

    #[test]
    fn custom_strategy_chain_is_respected() {
        let l = loader().with_strategies(vec![Box::new(NativeDate)]);
        let csv = "FECHA,AÑO,J. VIDAL\n\"18/12, Thu\",2024,T1A\n2024-12-19,2024,R\n";
        let table = l.parse_table(csv.as_bytes()).unwrap();
        let loaded = l.load_table(&table).unwrap();
        assert_eq!(loaded.rows.len(), 1);
        assert!(loaded.rows.contains_key(&ymd(2024, 12, 19)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = loader().load_path("/definitely/not/here.csv").unwrap_err();
        assert!(err.is_not_found());
    }
}
