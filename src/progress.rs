use std::collections::BTreeSet;

use crate::error::Result;
use crate::store::{LocalStore, percentage_key, progress_key};

/// Per-(user, course) completion tracking over the local store.
///
/// The percentage is always recomputed from the completed-material set, so
/// the two stored values cannot drift apart. A percentage of exactly 100 is
/// what the rest of the client treats as "course completed"; there is no
/// separate flag.
#[derive(Debug, Clone, Copy)]
pub struct ProgressTracker<'a> {
    store: &'a LocalStore,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    /// Stored completion percentage, 0 when nothing was recorded yet.
    pub async fn percentage(&self, user_id: i64, course_id: i64) -> Result<u8> {
        let raw = self.store.get(&percentage_key(user_id, course_id)).await?;
        let value = raw
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);
        Ok(value.clamp(0, 100) as u8)
    }

    pub async fn completed(&self, user_id: i64, course_id: i64) -> Result<BTreeSet<i64>> {
        Ok(self
            .store
            .get_json(&progress_key(user_id, course_id))
            .await?
            .unwrap_or_default())
    }

    /// Flip completion of one material and persist the set together with
    /// the recomputed percentage. Returns the new percentage.
    pub async fn toggle(
        &self,
        user_id: i64,
        course_id: i64,
        item_id: i64,
        total_items: usize,
    ) -> Result<u8> {
        let mut completed = self.completed(user_id, course_id).await?;
        if !completed.insert(item_id) {
            completed.remove(&item_id);
        }
        let percentage = derive_percentage(completed.len(), total_items);
        self.store
            .set_json(&progress_key(user_id, course_id), &completed)
            .await?;
        self.store
            .set(
                &percentage_key(user_id, course_id),
                &percentage.to_string(),
            )
            .await?;
        Ok(percentage)
    }
}

fn derive_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percentage = (100.0 * completed as f64 / total as f64).round();
    percentage.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn toggle_and_untoggle_no_drift() {
        let store = LocalStore::in_memory().await.unwrap();
        let tracker = ProgressTracker::new(&store);
        assert_eq!(tracker.percentage(1, 10).await.unwrap(), 0);

        // 4 materials, 2 complete -> 50
        assert_eq!(tracker.toggle(1, 10, 101, 4).await.unwrap(), 25);
        assert_eq!(tracker.toggle(1, 10, 102, 4).await.unwrap(), 50);
        assert_eq!(tracker.percentage(1, 10).await.unwrap(), 50);

        // mark a third -> 75, unmark it -> back to 50
        assert_eq!(tracker.toggle(1, 10, 103, 4).await.unwrap(), 75);
        assert_eq!(tracker.toggle(1, 10, 103, 4).await.unwrap(), 50);
        assert_eq!(tracker.percentage(1, 10).await.unwrap(), 50);
        assert_eq!(
            tracker.completed(1, 10).await.unwrap(),
            BTreeSet::from([101, 102])
        );
    }

    #[tokio::test]
    async fn hundred_iff_all_complete() {
        let store = LocalStore::in_memory().await.unwrap();
        let tracker = ProgressTracker::new(&store);
        assert_eq!(tracker.toggle(1, 10, 1, 3).await.unwrap(), 33);
        assert_eq!(tracker.toggle(1, 10, 2, 3).await.unwrap(), 67);
        assert_eq!(tracker.toggle(1, 10, 3, 3).await.unwrap(), 100);
        assert_eq!(tracker.toggle(1, 10, 3, 3).await.unwrap(), 67);
    }

    #[tokio::test]
    async fn zero_total_is_zero_percent() {
        let store = LocalStore::in_memory().await.unwrap();
        let tracker = ProgressTracker::new(&store);
        assert_eq!(tracker.toggle(1, 10, 1, 0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stored_percentage_is_clamped() {
        let store = LocalStore::in_memory().await.unwrap();
        store.set(&percentage_key(1, 10), "250").await.unwrap();
        let tracker = ProgressTracker::new(&store);
        assert_eq!(tracker.percentage(1, 10).await.unwrap(), 100);
        store.set(&percentage_key(1, 10), "-5").await.unwrap();
        assert_eq!(tracker.percentage(1, 10).await.unwrap(), 0);
    }

    #[test]
    fn rounding_matches_viewer() {
        assert_eq!(derive_percentage(1, 3), 33);
        assert_eq!(derive_percentage(2, 3), 67);
        assert_eq!(derive_percentage(1, 8), 13);
        assert_eq!(derive_percentage(0, 5), 0);
        assert_eq!(derive_percentage(5, 5), 100);
    }
}
