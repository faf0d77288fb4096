//! View table lifecycle tests
//!
//! Tests for:
//! - Primary view exemption from target ownership
//! - Target destroy-before-create ordering on size changes
//! - Destroy-one-per-call draining and the release flush
//! - Close-request cleanup
//! - Failed creates staying unbound until the size changes
//! - Slot capacity and the claimed bitmap

use multiwin::views::{
    MAX_WINDOWS, TARGET_RELEASE_FRAMES, TargetHost, ViewId, ViewTable, WindowState,
};

// ============================================================================
// Recording host
// ============================================================================

/// Everything the table asked the host to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Create(ViewId, u32, u32),
    Destroy(ViewId, u64),
    Flush(usize),
}

/// Hands out numbered targets and records every call.
struct RecordingHost {
    events: Vec<Event>,
    next_target: u64,
    /// Bitmask of views whose creates fail.
    refuse: u8,
}

impl RecordingHost {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            next_target: 0,
            refuse: 0,
        }
    }
}

impl TargetHost<&'static str> for RecordingHost {
    type Target = u64;

    fn create_target(
        &mut self,
        view: ViewId,
        _window: &&'static str,
        width: u32,
        height: u32,
    ) -> Option<u64> {
        self.events.push(Event::Create(view, width, height));
        if self.refuse & view.bit() != 0 {
            return None;
        }
        self.next_target += 1;
        Some(self.next_target)
    }

    fn destroy_target(&mut self, view: ViewId, target: u64) {
        self.events.push(Event::Destroy(view, target));
    }

    fn flush_frames(&mut self, frames: usize) {
        self.events.push(Event::Flush(frames));
    }
}

type Table = ViewTable<&'static str, u64>;

fn live(width: u32, height: u32) -> WindowState {
    WindowState {
        alive: true,
        width,
        height,
    }
}

fn gone() -> WindowState {
    WindowState {
        alive: false,
        width: 0,
        height: 0,
    }
}

fn view(index: usize) -> ViewId {
    ViewId::new(index).expect("view index in range")
}

// ============================================================================
// Primary view
// ============================================================================

#[test]
fn the_primary_view_never_acquires_a_target() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");

    table.reconcile(&mut host, |_, _| live(1280, 720));
    table.reconcile(&mut host, |_, _| live(1920, 1080));

    assert!(host.events.is_empty());
    let slot = table.get(ViewId::PRIMARY).expect("primary slot");
    assert!(!slot.has_target());
}

#[test]
fn a_dead_primary_is_left_for_the_app_to_handle() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");

    table.reconcile(&mut host, |_, _| gone());

    assert!(host.events.is_empty());
    assert_eq!(table.len(), 1);
    assert!(table.get(ViewId::PRIMARY).is_some());
}

// ============================================================================
// Target lifecycle
// ============================================================================

#[test]
fn secondary_views_get_targets_at_their_observed_size() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");
    table.insert("a");

    table.reconcile(&mut host, |view, _| {
        if view.is_primary() {
            live(1280, 720)
        } else {
            live(640, 480)
        }
    });

    assert_eq!(host.events, vec![Event::Create(view(1), 640, 480)]);
    assert!(table.get(view(1)).expect("slot").has_target());
    assert_eq!(table.get(view(1)).expect("slot").size(), Some((640, 480)));
}

#[test]
fn a_size_change_destroys_the_old_target_before_creating_the_new() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");
    table.insert("a");

    table.reconcile(&mut host, |_, _| live(640, 480));
    host.events.clear();

    table.reconcile(&mut host, |_, _| live(800, 600));

    assert_eq!(
        host.events,
        vec![Event::Destroy(view(1), 1), Event::Create(view(1), 800, 600)]
    );
}

#[test]
fn a_steady_window_is_left_alone() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");
    table.insert("a");

    table.reconcile(&mut host, |_, _| live(640, 480));
    host.events.clear();

    table.reconcile(&mut host, |_, _| live(640, 480));
    table.reconcile(&mut host, |_, _| live(640, 480));

    assert!(host.events.is_empty());
}

#[test]
fn a_minimized_window_loses_its_target_until_it_regains_area() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");
    table.insert("a");

    table.reconcile(&mut host, |_, _| live(640, 480));
    host.events.clear();

    // Minimized: the target goes away and nothing replaces it.
    table.reconcile(&mut host, |_, _| live(0, 0));
    assert_eq!(host.events, vec![Event::Destroy(view(1), 1)]);
    assert!(!table.get(view(1)).expect("slot").has_target());

    host.events.clear();
    table.reconcile(&mut host, |_, _| live(0, 0));
    assert!(host.events.is_empty());

    // Restored: a fresh target at the new size.
    table.reconcile(&mut host, |_, _| live(640, 480));
    assert_eq!(host.events, vec![Event::Create(view(1), 640, 480)]);
}

#[test]
fn a_failed_create_is_not_retried_until_the_size_changes() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");
    table.insert("a");

    host.refuse = view(1).bit();
    table.reconcile(&mut host, |_, _| live(640, 480));
    assert_eq!(host.events, vec![Event::Create(view(1), 640, 480)]);
    assert!(!table.get(view(1)).expect("slot").has_target());

    // Same size again: the failure stands, even once the host recovers.
    host.events.clear();
    host.refuse = 0;
    table.reconcile(&mut host, |_, _| live(640, 480));
    assert!(host.events.is_empty());

    // A size change clears the failure.
    table.reconcile(&mut host, |_, _| live(800, 600));
    assert_eq!(host.events, vec![Event::Create(view(1), 800, 600)]);
    assert!(table.get(view(1)).expect("slot").has_target());
}

// ============================================================================
// Destroying windows
// ============================================================================

#[test]
fn destroy_first_releases_the_target_then_flushes_then_hands_back_the_window() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");
    table.insert("a");
    table.insert("b");

    table.reconcile(&mut host, |_, _| live(640, 480));
    host.events.clear();

    let (id, window) = table.destroy_first(&mut host).expect("a secondary view");

    assert_eq!(id, view(1));
    assert_eq!(window, "a");
    assert_eq!(
        host.events,
        vec![
            Event::Destroy(view(1), 1),
            Event::Flush(TARGET_RELEASE_FRAMES)
        ]
    );
    assert!(table.get(view(1)).is_none());
    assert_eq!(table.len(), 2);
}

#[test]
fn destroy_first_without_a_target_skips_the_flush() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");
    table.insert("a");

    // Never reconciled, so the view has no target to release.
    let (id, window) = table.destroy_first(&mut host).expect("a secondary view");

    assert_eq!(id, view(1));
    assert_eq!(window, "a");
    assert!(host.events.is_empty());
}

#[test]
fn destroy_first_drains_one_view_per_call_and_spares_the_primary() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");
    table.insert("a");
    table.insert("b");
    table.insert("c");

    let order: Vec<ViewId> = std::iter::from_fn(|| table.destroy_first(&mut host))
        .map(|(id, _)| id)
        .collect();

    assert_eq!(order, vec![view(1), view(2), view(3)]);
    assert_eq!(table.len(), 1);
    assert!(table.get(ViewId::PRIMARY).is_some());
}

#[test]
fn a_close_request_clears_the_slot_and_releases_the_target() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");
    table.insert("a");
    table.insert("b");

    table.reconcile(&mut host, |_, _| live(640, 480));
    host.events.clear();

    // "a" was closed by the user; "b" lives on.
    table.reconcile(&mut host, |_, window| {
        if *window == "a" { gone() } else { live(640, 480) }
    });

    // The window is already gone, so no release flush is needed.
    assert_eq!(host.events, vec![Event::Destroy(view(1), 1)]);
    assert!(table.get(view(1)).is_none());
    assert!(table.get(view(2)).expect("slot").has_target());
    assert_eq!(table.len(), 2);
}

// ============================================================================
// Capacity and claims
// ============================================================================

#[test]
fn the_table_tracks_at_most_eight_windows() {
    let mut table = Table::new();
    table.insert("primary");
    for _ in 1..MAX_WINDOWS {
        assert!(table.insert("extra").is_some());
    }

    assert!(table.is_full());
    assert_eq!(table.insert("one too many"), None);
    assert_eq!(table.len(), MAX_WINDOWS);
}

#[test]
fn the_claimed_bitmap_covers_bound_views_only() {
    let mut table = Table::new();
    let mut host = RecordingHost::new();
    table.insert("primary");
    table.insert("a");
    table.insert("b");

    // "b" fails to bind and stays unclaimed.
    host.refuse = view(2).bit();
    table.reconcile(&mut host, |_, _| live(640, 480));

    assert_eq!(table.claimed(), 0b0000_0010);
    // Unclaimed groups, the primary's own included, render in the primary.
    assert_eq!(!table.claimed() & 0b0000_0111, 0b0000_0101);
}
