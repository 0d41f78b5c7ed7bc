use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::models::ResultSet;

struct StoredResults {
    results: ResultSet,
    stored_at: DateTime<Utc>,
}

/// Most recent result set per session. A new batch replaces the previous one
/// and slots expire after the retention window.
pub struct SessionResultStore {
    slots: RwLock<HashMap<String, StoredResults>>,
    retention: Duration,
}

impl SessionResultStore {
    pub fn new(retention_minutes: i64) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            retention: Duration::try_minutes(retention_minutes.max(1)).unwrap_or(Duration::MAX),
        }
    }

    pub async fn save(&self, session_id: &str, results: ResultSet) {
        self.save_at(session_id, results, Utc::now()).await;
    }

    pub(crate) async fn save_at(
        &self,
        session_id: &str,
        results: ResultSet,
        stored_at: DateTime<Utc>,
    ) {
        let mut slots = self.slots.write().await;
        slots.insert(
            session_id.to_string(),
            StoredResults { results, stored_at },
        );
    }

    pub async fn load(&self, session_id: &str) -> Option<ResultSet> {
        let now = Utc::now();
        {
            let slots = self.slots.read().await;
            match slots.get(session_id) {
                Some(stored) if !self.is_expired(stored, now) => {
                    return Some(stored.results.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut slots = self.slots.write().await;
        if slots
            .get(session_id)
            .is_some_and(|stored| self.is_expired(stored, now))
        {
            slots.remove(session_id);
        }
        None
    }

    /// Drops expired slots and returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, stored| !self.is_expired(stored, now));
        before - slots.len()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    fn is_expired(&self, stored: &StoredResults, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(stored.stored_at) > self.retention
    }
}
