use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Colonnes par défaut de l'export.
pub const DEFAULT_DATE_COLUMN: &str = "FECHA";
pub const DEFAULT_YEAR_COLUMN: &str = "AÑO";
pub const DEFAULT_MONTH_COLUMN: &str = "MES_NUMERO";
pub const DEFAULT_PERSON: &str = "J. VIDAL";

/// Options de chargement
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub date_column: String,
    pub year_column: String,
    pub month_column: String,
    /// Personnes suivies ; doivent correspondre exactement aux en-têtes
    pub people: Vec<String>,
    pub delimiter: u8,
    /// Autorise le repli sur le mois courant pour les dates « jour seul »
    pub guess_month: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            year_column: DEFAULT_YEAR_COLUMN.to_string(),
            month_column: DEFAULT_MONTH_COLUMN.to_string(),
            people: vec![DEFAULT_PERSON.to_string()],
            delimiter: b',',
            guess_month: true,
        }
    }
}

/// Diagnostics d'un chargement.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    /// Lignes dont le mois a été deviné depuis l'horloge système
    pub guessed_months: usize,
    pub default_year: i32,
    pub year_inferred: bool,
    /// Cellules année vides complétées avec l'année précédente de la colonne
    pub years_carried: usize,
    pub missing_people: Vec<String>,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("schedule file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("no tracked people configured")]
    EmptyRoster,
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}
