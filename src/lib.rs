#![forbid(unsafe_code)]
//! Turnos — plannings de travail exportés d'un tableur, servis en JSON.
//!
//! - Lecture CSV, résolution des dates par stratégies ordonnées.
//! - Résolution (catégorie de jour, code) → horaire affiché.
//! - Cache processus à snapshot immuable et version monotone.
//! - API HTTP axum (feature `http`).

pub mod cache;
pub mod config;
#[cfg(feature = "http")]
pub mod http;
pub mod loader;
pub mod model;
pub mod resolver;
pub mod source;

pub use cache::{CacheError, CachePolicy, ScheduleCache, Snapshot};
pub use config::Settings;
pub use loader::{LoadError, LoadReport, Loaded, Loader, LoaderOptions};
pub use model::{Cell, DayCategory, Schedule, ScheduleEntry, ScheduleRows, ShiftCode, ShiftTable};
pub use resolver::{build_schedule, HoursEntry, HoursTable, DAY_OFF, UNAVAILABLE};
pub use source::{CsvSource, ScheduleSource};
