use crate::cache::ScheduleCache;
use std::sync::Arc;

/// État partagé entre les handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ScheduleCache>,
}

impl AppState {
    pub fn new(cache: Arc<ScheduleCache>) -> Self {
        Self { cache }
    }
}
