//! Configuration : arguments CLI avec repli sur les variables d'environnement.

use crate::cache::{CachePolicy, ScheduleCache};
use crate::loader::{
    Loader, LoaderOptions, DEFAULT_DATE_COLUMN, DEFAULT_MONTH_COLUMN, DEFAULT_PERSON,
    DEFAULT_YEAR_COLUMN,
};
use crate::resolver::HoursTable;
use crate::source::CsvSource;
use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_FILE: &str = "turnos.csv";

/// Réglages communs à toutes les sous-commandes.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Fichier CSV exporté du tableur
    #[arg(long = "file", env = "SCHEDULE_FILE_PATH", default_value = DEFAULT_FILE, global = true)]
    pub file: PathBuf,

    /// Personnes suivies, séparées par des virgules (en-têtes exacts)
    #[arg(
        long,
        env = "SCHEDULE_PEOPLE",
        value_delimiter = ',',
        default_value = DEFAULT_PERSON,
        global = true
    )]
    pub people: Vec<String>,

    /// Séparateur de champs du CSV
    #[arg(long, env = "SCHEDULE_DELIMITER", default_value_t = ',', global = true)]
    pub delimiter: char,

    /// Table d'horaires JSON remplaçant la table standard
    #[arg(long, env = "SCHEDULE_HOURS_TABLE", global = true)]
    pub hours_table: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_DATE_COLUMN, global = true)]
    pub date_column: String,

    #[arg(long, default_value = DEFAULT_YEAR_COLUMN, global = true)]
    pub year_column: String,

    #[arg(long, default_value = DEFAULT_MONTH_COLUMN, global = true)]
    pub month_column: String,

    /// Refuse les dates « jour seul » sans colonne mois au lieu de deviner le mois courant
    #[arg(long, global = true)]
    pub no_guess_month: bool,

    #[arg(long, env = "SCHEDULE_CACHE_POLICY", value_enum, default_value_t = CachePolicy::ReloadOnEmpty, global = true)]
    pub cache_policy: CachePolicy,
}

impl Settings {
    pub fn loader_options(&self) -> Result<LoaderOptions> {
        if !self.delimiter.is_ascii() {
            bail!("delimiter must be a single ASCII character, got {:?}", self.delimiter);
        }
        let people: Vec<String> = self
            .people
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if people.is_empty() {
            bail!("at least one tracked person is required");
        }
        Ok(LoaderOptions {
            date_column: self.date_column.clone(),
            year_column: self.year_column.clone(),
            month_column: self.month_column.clone(),
            people,
            delimiter: self.delimiter as u8,
            guess_month: !self.no_guess_month,
        })
    }

    pub fn hours_table(&self) -> Result<HoursTable> {
        match &self.hours_table {
            Some(path) => HoursTable::from_json_file(path)
                .with_context(|| format!("loading hours table {}", path.display())),
            None => Ok(HoursTable::standard()),
        }
    }

    pub fn loader(&self) -> Result<Loader> {
        Ok(Loader::new(self.loader_options()?))
    }

    pub fn source(&self) -> Result<CsvSource> {
        Ok(CsvSource::open(&self.file, self.loader()?))
    }

    pub fn cache(&self) -> Result<ScheduleCache> {
        Ok(ScheduleCache::new(
            Arc::new(self.source()?),
            Arc::new(self.hours_table()?),
            self.cache_policy,
        ))
    }
}
