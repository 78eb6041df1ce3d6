//! Cache processus du dernier planning chargé.
//!
//! Le planning publié est un `Arc<Snapshot>` immuable remplacé d'un bloc ;
//! chaque publication incrémente un compteur de version monotone.

use crate::loader::{LoadError, LoadReport};
use crate::model::Schedule;
use crate::resolver::{build_schedule, HoursTable};
use crate::source::ScheduleSource;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Politique de rechargement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CachePolicy {
    /// Réutilise le dernier planning tant qu'il n'est pas vide
    #[default]
    ReloadOnEmpty,
    /// Relit le fichier à chaque appel
    EveryRequest,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    pub schedule: Schedule,
    pub report: LoadReport,
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("schedule is empty after reload of {0}")]
    Empty(String),
}

impl CacheError {
    /// Fichier absent ou planning vide : rien à servir.
    pub fn is_not_found(&self) -> bool {
        match self {
            CacheError::Load(e) => e.is_not_found(),
            CacheError::Empty(_) => true,
        }
    }
}

pub struct ScheduleCache {
    source: Arc<dyn ScheduleSource>,
    table: Arc<HoursTable>,
    policy: CachePolicy,
    current: RwLock<Option<Arc<Snapshot>>>,
    reload: Mutex<()>,
    version: AtomicU64,
}

impl ScheduleCache {
    pub fn new(source: Arc<dyn ScheduleSource>, table: Arc<HoursTable>, policy: CachePolicy) -> Self {
        Self {
            source,
            table,
            policy,
            current: RwLock::new(None),
            reload: Mutex::new(()),
            version: AtomicU64::new(0),
        }
    }

    pub fn table(&self) -> &HoursTable {
        &self.table
    }

    /// Dernière version publiée (0 : jamais chargé).
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Snapshot publié, sans rechargement.
    pub fn peek(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    /// Planning courant selon la politique ; recharge si vide.
    pub fn get_or_load(&self) -> Result<Arc<Snapshot>, CacheError> {
        if self.policy == CachePolicy::EveryRequest {
            return self.refresh();
        }
        if let Some(snap) = self.fresh() {
            return Ok(snap);
        }
        let _guard = self.reload.lock();
        // un autre appel a pu publier pendant l'attente
        if let Some(snap) = self.fresh() {
            debug!(version = snap.version, "snapshot published while waiting");
            return Ok(snap);
        }
        self.load_and_publish()
    }

    /// Rechargement inconditionnel.
    pub fn refresh(&self) -> Result<Arc<Snapshot>, CacheError> {
        let _guard = self.reload.lock();
        self.load_and_publish()
    }

    pub fn invalidate(&self) {
        *self.current.write() = None;
    }

    fn fresh(&self) -> Option<Arc<Snapshot>> {
        self.peek().filter(|s| !s.schedule.is_empty())
    }

    fn load_and_publish(&self) -> Result<Arc<Snapshot>, CacheError> {
        let loaded = self.source.load()?;
        let schedule = build_schedule(&loaded.rows, &self.table);
        if schedule.is_empty() {
            self.invalidate();
            return Err(CacheError::Empty(self.source.describe()));
        }
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        let snap = Arc::new(Snapshot {
            version,
            loaded_at: Utc::now(),
            schedule,
            report: loaded.report,
        });
        *self.current.write() = Some(Arc::clone(&snap));
        info!(
            version,
            dates = snap.schedule.len(),
            source = %self.source.describe(),
            "schedule snapshot published"
        );
        Ok(snap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Loaded;
    use crate::model::ShiftCode;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    /// Source en mémoire qui compte ses lectures.
    struct CountingSource {
        calls: AtomicUsize,
        empty: bool,
        delay: Duration,
    }

    impl ScheduleSource for CountingSource {
        fn load(&self) -> Result<Loaded, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            let mut loaded = Loaded::default();
            if !self.empty {
                let mut codes = BTreeMap::new();
                codes.insert("J. VIDAL".to_string(), ShiftCode::new("T1A"));
                loaded
                    .rows
                    .insert(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(), codes);
            }
            Ok(loaded)
        }

        fn describe(&self) -> String {
            "memory".into()
        }
    }

    fn cache(empty: bool, policy: CachePolicy) -> (Arc<CountingSource>, ScheduleCache) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            empty,
            delay: Duration::ZERO,
        });
        let cache = ScheduleCache::new(source.clone(), Arc::new(HoursTable::standard()), policy);
        (source, cache)
    }

    #[test]
    fn reuses_non_empty_snapshot() {
        let (source, cache) = cache(false, CachePolicy::ReloadOnEmpty);
        let a = cache.get_or_load().unwrap();
        let b = cache.get_or_load().unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.version, 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn every_request_policy_reloads() {
        let (source, cache) = cache(false, CachePolicy::EveryRequest);
        cache.get_or_load().unwrap();
        let snap = cache.get_or_load().unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(snap.version, 2);
        assert_eq!(cache.version(), 2);
    }

    #[test]
    fn empty_schedule_is_not_found_and_retried() {
        let (source, cache) = cache(true, CachePolicy::ReloadOnEmpty);
        let err = cache.get_or_load().unwrap_err();
        assert!(err.is_not_found());
        assert!(cache.get_or_load().is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.version(), 0);
        assert!(cache.peek().is_none());
    }

    #[test]
    fn invalidate_forces_reload() {
        let (source, cache) = cache(false, CachePolicy::ReloadOnEmpty);
        cache.get_or_load().unwrap();
        cache.invalidate();
        let snap = cache.get_or_load().unwrap();
        assert_eq!(snap.version, 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        let entry = &snap.schedule[&NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()]["J. VIDAL"];
        assert_eq!(entry.display_range, "06:15 - 14:15");
    }

    #[test]
    fn concurrent_callers_share_one_load() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            empty: false,
            delay: Duration::from_millis(50),
        });
        let cache = ScheduleCache::new(
            source.clone(),
            Arc::new(HoursTable::standard()),
            CachePolicy::ReloadOnEmpty,
        );
        let start = Barrier::new(8);

        let versions: Vec<u64> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        start.wait();
                        cache.get_or_load().unwrap().version
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(versions.iter().all(|v| *v == 1));
        assert_eq!(cache.version(), 1);
    }
}
