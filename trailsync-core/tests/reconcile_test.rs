//! Integration tests for position reconciliation.
//!
//! GIVEN/WHEN/THEN scenarios over the local and reported views:
//! duplicate entries, stale echoes, lost reports and exit races.

use chrono::{DateTime, Duration, TimeZone, Utc};
use trailsync_core::config::DirectionMode;
use trailsync_core::domain::{PositionSide, Side};
use trailsync_core::error::Rejection;
use trailsync_core::reconcile::{Agreement, Divergence, Reconciler, ReportOutcome};

fn at(ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap() + Duration::milliseconds(ms)
}

fn reconciler() -> Reconciler {
    Reconciler::new(DirectionMode::Both, Duration::milliseconds(2_000), at(0))
}

#[test]
fn duplicate_entry_inside_debounce_is_rejected() {
    // GIVEN: a flat, synchronized reconciler
    let mut r = reconciler();

    // WHEN: two long entries are proposed 500ms apart, before any report
    let first = r.propose_entry(Side::Long, 1, at(1_000), true);
    let second = r.propose_entry(Side::Long, 1, at(1_500), true);

    // THEN: only the first goes out
    assert!(first.is_ok());
    assert_eq!(second, Err(Rejection::NotFlat));
    assert_eq!(r.agreement(), Agreement::Disagree(Divergence::LocalAhead));
}

#[test]
fn stale_flat_echo_is_honored() {
    // GIVEN: an accepted long entry
    let mut r = reconciler();
    r.propose_entry(Side::Long, 1, at(1_000), true).unwrap();

    // WHEN: a stale flat report (issued before the entry filled) arrives
    let outcome = r.on_external_report(PositionSide::Flat, 0, at(1_200));

    // THEN: local follows it; a flat report always wins
    assert_eq!(
        outcome,
        ReportOutcome::Corrected {
            from: PositionSide::Long,
            to: PositionSide::Flat
        }
    );
    assert!(r.local().is_flat());

    // AND: the real fill report re-establishes the long
    let outcome = r.on_external_report(PositionSide::Long, 1, at(1_300));
    assert!(matches!(outcome, ReportOutcome::Corrected { .. }));
    assert!(r.local().holds(Side::Long));
    assert!(r.agreement().is_agreed());
}

#[test]
fn confirming_report_is_debounced() {
    let mut r = reconciler();
    r.propose_entry(Side::Short, 2, at(1_000), true).unwrap();

    let outcome = r.on_external_report(PositionSide::Short, 2, at(1_400));

    assert_eq!(outcome, ReportOutcome::Debounced);
    assert_eq!(r.local().last_update, at(1_000));
    assert!(r.reported().holds(Side::Short));
    assert!(r.agreement().is_agreed());
}

#[test]
fn lost_report_heals_before_next_entry() {
    // GIVEN: an entry whose report never arrives
    let mut r = reconciler();
    r.propose_entry(Side::Long, 1, at(1_000), true).unwrap();

    // WHEN: the next entry is proposed well after the debounce window
    let result = r.propose_entry(Side::Long, 1, at(61_000), true);

    // THEN: local was forced flat first and the entry proceeds
    assert!(result.is_ok());
    assert_eq!(r.forced_resyncs(), 1);
}

#[test]
fn reported_position_mismatch_blocks_entry() {
    // GIVEN: local long 1, reported long 2 (partial state from the feed)
    let mut r = reconciler();
    r.propose_entry(Side::Long, 1, at(1_000), true).unwrap();
    r.on_external_report(PositionSide::Long, 2, at(1_100));

    // THEN: local was resynced to the reported quantity
    assert_eq!(r.local().quantity, 2);
    assert_eq!(
        r.propose_entry(Side::Short, 1, at(1_200), true),
        Err(Rejection::NotFlat)
    );
}

#[test]
fn exit_race_uses_either_view() {
    // GIVEN: reported long, local already flattened by an earlier exit
    let mut r = reconciler();
    r.propose_entry(Side::Long, 1, at(1_000), true).unwrap();
    r.on_external_report(PositionSide::Long, 1, at(1_100));
    r.propose_exit(Side::Long, at(5_000)).unwrap();
    assert!(r.local().is_flat());

    // WHEN: another exit is requested before the flat report
    let again = r.propose_exit(Side::Long, at(5_100));

    // THEN: it is still accepted (reported view shows long)
    assert!(again.is_ok());

    // AND: no entry while the views disagree
    assert_eq!(
        r.propose_entry(Side::Long, 1, at(5_200), true),
        Err(Rejection::NotSynchronized)
    );

    // WHEN: the flat report lands, everything converges
    r.on_external_report(PositionSide::Flat, 0, at(5_300));
    assert!(r.agreement().is_agreed());
    assert!(r.propose_entry(Side::Short, 1, at(5_400), true).is_ok());
}

#[test]
fn rejections_leave_views_untouched() {
    let mut r = Reconciler::new(DirectionMode::ShortOnly, Duration::seconds(2), at(0));
    let before = (r.local().clone(), r.reported().clone());

    assert_eq!(
        r.propose_entry(Side::Long, 1, at(100), true),
        Err(Rejection::DirectionDisallowed)
    );
    assert_eq!(
        r.propose_entry(Side::Short, 1, at(100), false),
        Err(Rejection::WindowClosed)
    );
    assert_eq!(r.propose_exit(Side::Short, at(100)), Err(Rejection::NoOpenPosition));

    assert_eq!((r.local().clone(), r.reported().clone()), before);
}
