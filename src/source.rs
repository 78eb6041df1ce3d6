use crate::loader::{LoadError, Loaded, Loader};
use std::path::{Path, PathBuf};

pub trait ScheduleSource: Send + Sync {
    /// Lit et résout la source complète (jamais mise en cache ici).
    fn load(&self) -> Result<Loaded, LoadError>;
    /// Description pour les logs.
    fn describe(&self) -> String;
}

/// Source fichier CSV.
#[derive(Debug)]
pub struct CsvSource {
    path: PathBuf,
    loader: Loader,
}

impl CsvSource {
    pub fn open<P: AsRef<Path>>(path: P, loader: Loader) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            loader,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScheduleSource for CsvSource {
    fn load(&self) -> Result<Loaded, LoadError> {
        self.loader.load_path(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
