use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::error::Result;
use crate::models::{Activity, Course};
use crate::services::{ActivityFeed, CourseDirectory, CourseFollow};
use crate::store::{LocalStore, enrollments_key, percentage_key};

/// Reconstructs "courses this user is enrolled in" without a backing
/// endpoint for the query: the explicit local enrollment set is widened
/// with courses the activity log or an existing progress marker point at,
/// then persisted so later calls need no re-inference.
#[derive(Debug, Clone)]
pub struct EnrollmentReconciler<'a, C, A> {
    courses: &'a C,
    activities: &'a A,
    store: &'a LocalStore,
}

/// Result of one union pass of the merge policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub merged: BTreeSet<i64>,
    pub inferred: BTreeSet<i64>,
}

/// Merge policy on already-fetched data. A catalog course outside the
/// explicit set counts as enrolled when the activity log references its id
/// or course code, or when a progress marker exists for it.
pub fn reconcile(
    explicit: &BTreeSet<i64>,
    catalog: &[Course],
    activities: &[Activity],
    with_progress: &BTreeSet<i64>,
) -> ReconcileOutcome {
    let signals: BTreeSet<&str> = activities
        .iter()
        .map(|activity| activity.course_code.as_str())
        .collect();

    let mut inferred = BTreeSet::new();
    for course in catalog {
        if explicit.contains(&course.id) {
            continue;
        }
        let has_activity = signals.contains(course.course_code.as_str())
            || signals.contains(course.id.to_string().as_str());
        if has_activity || with_progress.contains(&course.id) {
            inferred.insert(course.id);
        }
    }

    let merged = explicit.union(&inferred).copied().collect();
    ReconcileOutcome { merged, inferred }
}

impl<'a, C, A> EnrollmentReconciler<'a, C, A>
where
    C: CourseDirectory,
    A: ActivityFeed,
{
    pub fn new(courses: &'a C, activities: &'a A, store: &'a LocalStore) -> Self {
        Self {
            courses,
            activities,
            store,
        }
    }

    /// The "my courses" view. `None` is the anonymous session: empty
    /// result, no error, nothing touched.
    ///
    /// The catalog fetch is required and its failure propagates; the
    /// activity fetch and the write-back of the widened set are both
    /// best-effort. Calling twice without new signals returns the same
    /// list and leaves the persisted set unchanged.
    pub async fn resolve_enrollments(&self, user_id: Option<i64>) -> Result<Vec<Course>> {
        let Some(user_id) = user_id else {
            return Ok(Vec::new());
        };

        let explicit = self.explicit_set(user_id).await?;
        let (catalog, activities) = tokio::join!(
            self.courses.list_courses(),
            self.activities.list_for_student(user_id),
        );
        let catalog = catalog?;
        let activities = activities.unwrap_or_else(|e| {
            warn!("activity signals unavailable, reconciling from local state only: {e}");
            Vec::new()
        });

        let mut with_progress = BTreeSet::new();
        for course in &catalog {
            if self
                .store
                .get(&percentage_key(user_id, course.id))
                .await?
                .is_some()
            {
                with_progress.insert(course.id);
            }
        }

        let outcome = reconcile(&explicit, &catalog, &activities, &with_progress);
        if !outcome.inferred.is_empty() {
            info!(
                "recovered {} enrollment(s) for user {user_id}: {:?}",
                outcome.inferred.len(),
                outcome.inferred
            );
            // self-healing write; the returned list does not depend on it
            if let Err(e) = self.persist_set(user_id, &outcome.merged).await {
                warn!("persisting recovered enrollments failed: {e}");
            }
        }

        Ok(catalog
            .into_iter()
            .filter(|course| outcome.merged.contains(&course.id))
            .collect())
    }

    /// Optimistic enrollment for the interactive flow: issue the remote
    /// follow first, then record the local enrollment even when the follow
    /// fails, so the user can proceed into the course view regardless.
    pub async fn enroll_with_follow(&self, user_id: i64, course_id: i64) -> Result<()>
    where
        C: CourseFollow,
    {
        if let Err(e) = self.courses.follow(course_id).await {
            warn!("remote follow failed, keeping local enrollment: {e}");
        }
        self.enroll(user_id, course_id).await
    }

    /// Add a course to the explicit set. Idempotent; safe to call whether
    /// or not the remote follow call succeeded, so the user can proceed
    /// into the course view on an optimistic local write.
    pub async fn enroll(&self, user_id: i64, course_id: i64) -> Result<()> {
        let mut explicit = self.explicit_set(user_id).await?;
        if explicit.insert(course_id) {
            self.persist_set(user_id, &explicit).await?;
        }
        Ok(())
    }

    async fn explicit_set(&self, user_id: i64) -> Result<BTreeSet<i64>> {
        Ok(self
            .store
            .get_json(&enrollments_key(user_id))
            .await?
            .unwrap_or_default())
    }

    async fn persist_set(&self, user_id: i64, set: &BTreeSet<i64>) -> Result<()> {
        self.store.set_json(&enrollments_key(user_id), set).await
    }
}
