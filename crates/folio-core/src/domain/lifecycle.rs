//! Content lifecycle state machine.
//!
//! Pure functions over a [`ContentItem`]: each one either returns the item in
//! its next state or a [`LifecycleError`] describing why the transition is not
//! legal. Nothing here performs I/O or reads the clock; callers pass `now`.
//!
//! ```text
//! draft --schedule--> scheduled --due/publish--> published
//! draft --publish--> published
//! scheduled --unschedule--> draft
//! draft/scheduled/published --trash--> trashed --restore--> (prior status)
//! trashed --purge--> (removed)
//! ```

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::{ContentItem, ContentStatus};
use crate::error::LifecycleError;

/// The action a caller asked for; carried by [`LifecycleError::InvalidTransition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionAction {
    Schedule,
    Unschedule,
    Publish,
    PublishDue,
    Edit,
    Trash,
    Restore,
    Purge,
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Schedule => "schedule",
            Self::Unschedule => "unschedule",
            Self::Publish => "publish",
            Self::PublishDue => "auto-publish",
            Self::Edit => "edit",
            Self::Trash => "trash",
            Self::Restore => "restore",
            Self::Purge => "purge",
        };
        f.write_str(name)
    }
}

/// Who moved an item to `published`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishSource {
    /// An explicit "publish now" request.
    Manual,
    /// The publish-due job picking up a scheduled item.
    Schedule,
}

impl PublishSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Schedule => "schedule",
        }
    }
}

/// Tunables for the checks the state machine makes on user input.
#[derive(Debug, Clone, Copy)]
pub struct LifecyclePolicy {
    /// How far in the past a new schedule request may point before it is
    /// rejected instead of being treated as due immediately.
    pub schedule_grace: TimeDelta,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            schedule_grace: TimeDelta::hours(24),
        }
    }
}

fn invalid(item: &ContentItem, action: TransitionAction) -> LifecycleError {
    LifecycleError::InvalidTransition {
        from: item.status,
        action,
    }
}

/// Parse an RFC 3339 timestamp supplied for a schedule request.
pub fn parse_publish_at(raw: &str) -> Result<DateTime<Utc>, LifecycleError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LifecycleError::InvalidTimestamp(format!("{raw:?}: {e}")))
}

/// `draft -> scheduled`.
///
/// A `publish_at` at or slightly before `now` is accepted and makes the item
/// due on the next tick; one older than the policy's grace window is rejected.
pub fn request_schedule(
    item: &ContentItem,
    publish_at: DateTime<Utc>,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> Result<ContentItem, LifecycleError> {
    if item.status != ContentStatus::Draft {
        return Err(invalid(item, TransitionAction::Schedule));
    }
    let too_old = now
        .checked_sub_signed(policy.schedule_grace)
        .is_some_and(|earliest| publish_at < earliest);
    if too_old {
        return Err(LifecycleError::InvalidTimestamp(format!(
            "{} is more than {}s in the past",
            publish_at.to_rfc3339(),
            policy.schedule_grace.num_seconds()
        )));
    }

    let mut next = item.clone();
    next.status = ContentStatus::Scheduled;
    next.publish_at = Some(publish_at);
    Ok(next)
}

/// `scheduled -> draft`, dropping the requested publish time.
pub fn unschedule(item: &ContentItem) -> Result<ContentItem, LifecycleError> {
    if item.status != ContentStatus::Scheduled {
        return Err(invalid(item, TransitionAction::Unschedule));
    }

    let mut next = item.clone();
    next.status = ContentStatus::Draft;
    next.publish_at = None;
    Ok(next)
}

/// `draft | scheduled -> published` with `publish_at = now`.
///
/// Publishing an already published item succeeds and returns it unchanged.
pub fn publish_now(item: &ContentItem, now: DateTime<Utc>) -> Result<ContentItem, LifecycleError> {
    match item.status {
        ContentStatus::Published => Ok(item.clone()),
        ContentStatus::Draft | ContentStatus::Scheduled => Ok(published(item, now)),
        ContentStatus::Trashed => Err(invalid(item, TransitionAction::Publish)),
    }
}

/// Whether a scheduled item's publish time has been reached.
pub fn is_due(item: &ContentItem, now: DateTime<Utc>) -> bool {
    item.status == ContentStatus::Scheduled && item.publish_at.is_some_and(|at| at <= now)
}

/// `scheduled -> published` for an item that [`is_due`]; the scheduler's
/// counterpart of [`publish_now`].
pub fn apply_due_publication(
    item: &ContentItem,
    now: DateTime<Utc>,
) -> Result<ContentItem, LifecycleError> {
    if !is_due(item, now) {
        return Err(invalid(item, TransitionAction::PublishDue));
    }
    Ok(published(item, now))
}

fn published(item: &ContentItem, now: DateTime<Utc>) -> ContentItem {
    let mut next = item.clone();
    next.status = ContentStatus::Published;
    next.publish_at = Some(now);
    next
}

/// Content-only edit. Status and `publish_at` are never touched, so editing a
/// published item cannot re-arm scheduling.
pub fn edit(
    item: &ContentItem,
    title: String,
    body: String,
    now: DateTime<Utc>,
) -> Result<ContentItem, LifecycleError> {
    if item.is_trashed() {
        return Err(invalid(item, TransitionAction::Edit));
    }

    let mut next = item.clone();
    next.title = title;
    next.body = body;
    next.updated_at = now;
    Ok(next)
}

/// `draft | scheduled | published -> trashed`, remembering the prior status.
pub fn trash(item: &ContentItem, now: DateTime<Utc>) -> Result<ContentItem, LifecycleError> {
    if item.is_trashed() {
        return Err(invalid(item, TransitionAction::Trash));
    }

    let mut next = item.clone();
    next.prior_status = Some(item.status);
    next.status = ContentStatus::Trashed;
    next.deleted_at = Some(now);
    Ok(next)
}

/// `trashed -> prior status`.
///
/// A scheduled item whose time passed while in the trash comes back due; it
/// is published by the next tick, not here.
pub fn restore(item: &ContentItem) -> Result<ContentItem, LifecycleError> {
    let prior = match (item.status, item.prior_status) {
        (ContentStatus::Trashed, Some(prior)) if prior != ContentStatus::Trashed => prior,
        _ => return Err(invalid(item, TransitionAction::Restore)),
    };

    let mut next = item.clone();
    next.status = prior;
    next.prior_status = None;
    next.deleted_at = None;
    Ok(next)
}

/// Permit permanent deletion; only trashed items may be purged.
pub fn purge(item: &ContentItem) -> Result<(), LifecycleError> {
    if !item.is_trashed() {
        return Err(invalid(item, TransitionAction::Purge));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn draft(now: DateTime<Utc>) -> ContentItem {
        ContentItem::new_draft(Uuid::new_v4(), "Title".into(), "Body".into(), now)
    }

    fn assert_transition_error(result: Result<ContentItem, LifecycleError>, action: TransitionAction) {
        match result {
            Err(LifecycleError::InvalidTransition { action: got, .. }) => assert_eq!(got, action),
            other => panic!("expected invalid {action} transition, got {other:?}"),
        }
    }

    #[test]
    fn test_schedule_from_draft() {
        let now = Utc::now();
        let at = now + TimeDelta::hours(1);
        let item = request_schedule(&draft(now), at, now, &LifecyclePolicy::default()).unwrap();

        assert_eq!(item.status, ContentStatus::Scheduled);
        assert_eq!(item.publish_at, Some(at));
        assert!(!is_due(&item, now));
        assert!(is_due(&item, at));
    }

    #[test]
    fn test_schedule_in_recent_past_is_due_immediately() {
        let now = Utc::now();
        let item = request_schedule(
            &draft(now),
            now - TimeDelta::minutes(5),
            now,
            &LifecyclePolicy::default(),
        )
        .unwrap();

        assert!(is_due(&item, now));
    }

    #[test]
    fn test_schedule_far_in_past_is_invalid_timestamp() {
        let now = Utc::now();
        let result = request_schedule(
            &draft(now),
            now - TimeDelta::days(3),
            now,
            &LifecyclePolicy::default(),
        );

        assert!(matches!(result, Err(LifecycleError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_grace_beyond_calendar_range_accepts_any_past_time() {
        let now = Utc::now();
        let policy = LifecyclePolicy {
            schedule_grace: TimeDelta::try_seconds(9_000_000_000_000).unwrap(),
        };
        let item = request_schedule(&draft(now), now - TimeDelta::days(3650), now, &policy).unwrap();

        assert!(is_due(&item, now));
    }

    #[test]
    fn test_schedule_requires_draft() {
        let now = Utc::now();
        let published = publish_now(&draft(now), now).unwrap();
        let result = request_schedule(&published, now, now, &LifecyclePolicy::default());

        assert_transition_error(result, TransitionAction::Schedule);
    }

    #[test]
    fn test_parse_publish_at() {
        let parsed = parse_publish_at("2026-03-01T10:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T08:00:00+00:00");

        assert!(matches!(
            parse_publish_at("next tuesday"),
            Err(LifecycleError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_publish_now_overwrites_requested_time() {
        let now = Utc::now();
        let scheduled = request_schedule(
            &draft(now),
            now + TimeDelta::days(1),
            now,
            &LifecyclePolicy::default(),
        )
        .unwrap();

        let later = now + TimeDelta::minutes(3);
        let published = publish_now(&scheduled, later).unwrap();
        assert_eq!(published.status, ContentStatus::Published);
        assert_eq!(published.publish_at, Some(later));
    }

    #[test]
    fn test_publish_now_is_idempotent() {
        let now = Utc::now();
        let published = publish_now(&draft(now), now).unwrap();
        let again = publish_now(&published, now + TimeDelta::hours(2)).unwrap();

        assert_eq!(again, published);
    }

    #[test]
    fn test_publish_from_trash_is_rejected() {
        let now = Utc::now();
        let trashed = trash(&draft(now), now).unwrap();

        assert_transition_error(publish_now(&trashed, now), TransitionAction::Publish);
    }

    #[test]
    fn test_apply_due_publication_requires_due() {
        let now = Utc::now();
        let scheduled = request_schedule(
            &draft(now),
            now + TimeDelta::hours(1),
            now,
            &LifecyclePolicy::default(),
        )
        .unwrap();

        assert_transition_error(
            apply_due_publication(&scheduled, now),
            TransitionAction::PublishDue,
        );

        let at = now + TimeDelta::minutes(61);
        let published = apply_due_publication(&scheduled, at).unwrap();
        assert_eq!(published.status, ContentStatus::Published);
        assert_eq!(published.publish_at, Some(at));
        assert!(!is_due(&published, at));
    }

    #[test]
    fn test_edit_after_publish_keeps_publish_at() {
        let now = Utc::now();
        let published = publish_now(&draft(now), now).unwrap();
        let edited = edit(
            &published,
            "New title".into(),
            "New body".into(),
            now + TimeDelta::days(1),
        )
        .unwrap();

        assert_eq!(edited.status, ContentStatus::Published);
        assert_eq!(edited.publish_at, published.publish_at);
        assert_eq!(edited.title, "New title");
    }

    #[test]
    fn test_trash_and_restore_published() {
        let now = Utc::now();
        let published = publish_now(&draft(now), now).unwrap();
        let trashed = trash(&published, now).unwrap();

        assert_eq!(trashed.status, ContentStatus::Trashed);
        assert_eq!(trashed.prior_status, Some(ContentStatus::Published));
        assert_eq!(trashed.deleted_at, Some(now));
        assert_transition_error(trash(&trashed, now), TransitionAction::Trash);

        let restored = restore(&trashed).unwrap();
        assert_eq!(restored, published);
    }

    #[test]
    fn test_restored_overdue_schedule_is_due_not_published() {
        let now = Utc::now();
        let at = now + TimeDelta::minutes(10);
        let scheduled =
            request_schedule(&draft(now), at, now, &LifecyclePolicy::default()).unwrap();
        let trashed = trash(&scheduled, now).unwrap();

        let restored = restore(&trashed).unwrap();
        assert_eq!(restored.status, ContentStatus::Scheduled);
        assert_eq!(restored.publish_at, Some(at));
        assert!(is_due(&restored, now + TimeDelta::hours(1)));
    }

    #[test]
    fn test_purge_only_from_trash() {
        let now = Utc::now();
        let item = draft(now);
        assert!(matches!(
            purge(&item),
            Err(LifecycleError::InvalidTransition {
                from: ContentStatus::Draft,
                action: TransitionAction::Purge
            })
        ));
        assert!(purge(&trash(&item, now).unwrap()).is_ok());
    }

    #[test]
    fn test_unschedule() {
        let now = Utc::now();
        let scheduled = request_schedule(
            &draft(now),
            now + TimeDelta::hours(1),
            now,
            &LifecyclePolicy::default(),
        )
        .unwrap();
        let back = unschedule(&scheduled).unwrap();

        assert_eq!(back.status, ContentStatus::Draft);
        assert_eq!(back.publish_at, None);
        assert_transition_error(unschedule(&back), TransitionAction::Unschedule);
    }

    // ------------------------------------------------------------------
    // Property tests
    // ------------------------------------------------------------------

    #[derive(Debug, Clone)]
    enum Op {
        Schedule(i64),
        Unschedule,
        Publish,
        Tick(i64),
        Edit,
        Trash,
        Restore,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-600i64..7200).prop_map(Op::Schedule),
            Just(Op::Unschedule),
            Just(Op::Publish),
            (0i64..7200).prop_map(Op::Tick),
            Just(Op::Edit),
            Just(Op::Trash),
            Just(Op::Restore),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: every reachable state satisfies the data model invariants.
        #[test]
        fn prop_invariants_hold_after_every_step(ops in prop::collection::vec(arb_op(), 1..40)) {
            let policy = LifecyclePolicy::default();
            let mut now = Utc::now();
            let mut item = draft(now);

            for op in ops {
                let next = match op {
                    Op::Schedule(offset) => {
                        request_schedule(&item, now + TimeDelta::seconds(offset), now, &policy)
                    }
                    Op::Unschedule => unschedule(&item),
                    Op::Publish => publish_now(&item, now),
                    Op::Tick(secs) => {
                        now += TimeDelta::seconds(secs);
                        if is_due(&item, now) {
                            apply_due_publication(&item, now)
                        } else {
                            Ok(item.clone())
                        }
                    }
                    Op::Edit => edit(&item, "t".into(), "b".into(), now),
                    Op::Trash => trash(&item, now),
                    Op::Restore => restore(&item),
                };

                // Illegal requests leave the item untouched.
                if let Ok(next) = next {
                    if item.status == ContentStatus::Published && !next.is_trashed() {
                        prop_assert_eq!(next.publish_at, item.publish_at);
                    }
                    item = next;
                }
                prop_assert_eq!(item.check_invariants(), Ok(()));
            }
        }

        /// Property: trash followed by restore is the identity on lifecycle fields.
        #[test]
        fn prop_trash_restore_round_trip(ops in prop::collection::vec(arb_op(), 0..20)) {
            let policy = LifecyclePolicy::default();
            let now = Utc::now();
            let mut item = draft(now);
            for op in ops {
                let next = match op {
                    Op::Schedule(offset) => {
                        request_schedule(&item, now + TimeDelta::seconds(offset), now, &policy)
                    }
                    Op::Publish => publish_now(&item, now),
                    _ => continue,
                };
                if let Ok(next) = next {
                    item = next;
                }
            }

            let restored = restore(&trash(&item, now).unwrap()).unwrap();
            prop_assert_eq!(restored.status, item.status);
            prop_assert_eq!(restored.publish_at, item.publish_at);
            prop_assert_eq!(restored.check_invariants(), Ok(()));
        }
    }
}
