//! Window View Table
//!
//! The [`ViewTable`] keeps operating-system windows and their GPU render
//! targets consistent. It is the bookkeeping heart of the demo: a bounded
//! arena of [`MAX_WINDOWS`] slots, addressed by [`ViewId`], with explicit
//! occupancy bitmaps in place of linear free/occupied scans.
//!
//! # Overview
//!
//! - Slot 0 is the **primary** view. It is claimed by the first insert,
//!   renders to the default backbuffer, and never owns a render target.
//! - Every other slot binds a swap-chain render target to its window, created
//!   and torn down through the [`TargetHost`] collaborator.
//! - The table never talks to the OS or the GPU itself. Windows come in via
//!   [`insert`](ViewTable::insert), their live state is reported back through
//!   the `observe` callback of [`reconcile`](ViewTable::reconcile), and all
//!   target work is delegated to the host. This keeps the lifecycle rules
//!   testable without a device or an event loop.
//!
//! The table is plain single-threaded state; it is owned and driven by the
//! frame loop alone.

use std::fmt;

/// Maximum number of simultaneously tracked windows, the primary included.
pub const MAX_WINDOWS: usize = 8;

// The occupancy bitmaps below are u8.
const _: () = assert!(MAX_WINDOWS <= 8);

/// All valid slot bits.
const SLOT_MASK: u8 = ((1u16 << MAX_WINDOWS) - 1) as u8;

/// Frames the host must advance between destroying a window's render target
/// and closing the window itself.
///
/// Swap-chain teardown is deferred to a frame boundary and the device keeps
/// up to two frames in flight, so two advances guarantee the surface no
/// longer references the native handle by the time the window goes away.
pub const TARGET_RELEASE_FRAMES: usize = 2;

// ---------------------------------------------------------------------------
// ViewId
// ---------------------------------------------------------------------------

/// Index handle for one slot of the [`ViewTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u8);

impl ViewId {
    /// The primary view, always slot 0.
    pub const PRIMARY: Self = Self(0);

    /// Returns the id for `index`, or `None` when out of range.
    #[must_use]
    pub fn new(index: usize) -> Option<Self> {
        (index < MAX_WINDOWS).then_some(Self(index as u8))
    }

    /// Slot index of this view.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Bit of this view in an occupancy bitmap.
    #[inline]
    #[must_use]
    pub fn bit(self) -> u8 {
        1 << self.0
    }

    /// `true` for slot 0.
    #[inline]
    #[must_use]
    pub fn is_primary(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Externally observed state of one window, fed to
/// [`reconcile`](ViewTable::reconcile) once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// `false` once the window has been closed (or its close was requested
    /// and granted); the slot is then cleared.
    pub alive: bool,
    /// Current surface width in pixels.
    pub width: u32,
    /// Current surface height in pixels.
    pub height: u32,
}

/// Render-target side of the window lifecycle.
///
/// The table decides *when* targets are created, destroyed, and flushed; the
/// host decides *how*. The renderer implements this against real swap chains,
/// tests implement it with a recording stub.
pub trait TargetHost<W> {
    /// Handle to a render target bound to one window.
    type Target;

    /// Binds a render target to `window` at the given size.
    ///
    /// Returning `None` means the target could not be bound. The slot is left
    /// target-less and is not retried until the window's size changes; its
    /// share of the scene keeps rendering into the primary view instead.
    fn create_target(
        &mut self,
        view: ViewId,
        window: &W,
        width: u32,
        height: u32,
    ) -> Option<Self::Target>;

    /// Releases a target previously returned by
    /// [`create_target`](Self::create_target).
    fn destroy_target(&mut self, view: ViewId, target: Self::Target);

    /// Advances `frames` frames without drawing, so the device retires any
    /// swap chain whose destruction is still queued.
    fn flush_frames(&mut self, frames: usize);
}

// ---------------------------------------------------------------------------
// ViewSlot
// ---------------------------------------------------------------------------

/// One live entry of the [`ViewTable`]: a window plus the render target
/// currently bound to it, if any.
#[derive(Debug)]
pub struct ViewSlot<W, T> {
    window: W,
    /// Dimensions last applied to the target, `None` before the first
    /// reconcile pass over this slot.
    applied: Option<(u32, u32)>,
    target: Option<T>,
}

impl<W, T> ViewSlot<W, T> {
    /// The window recorded in this slot.
    #[inline]
    pub fn window(&self) -> &W {
        &self.window
    }

    /// The render target bound to this slot, if one exists. Always `None`
    /// for the primary slot.
    #[inline]
    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    /// `true` when a render target is bound.
    #[inline]
    #[must_use]
    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Dimensions the current target was built for.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Option<(u32, u32)> {
        self.applied
    }
}

// ---------------------------------------------------------------------------
// ViewTable
// ---------------------------------------------------------------------------

/// Bounded arena tracking up to [`MAX_WINDOWS`] window views.
///
/// `W` is the window type (an `Arc<winit::window::Window>` in the app, any
/// placeholder in tests) and `T` the render-target type produced by the
/// [`TargetHost`].
///
/// Invariants upheld across all operations:
/// - bit `i` of the occupancy bitmap is set iff slot `i` holds an entry;
/// - the primary slot never holds a render target;
/// - a slot's target is destroyed before a replacement is created;
/// - a target is destroyed, and [`TARGET_RELEASE_FRAMES`] frames flushed,
///   before its window is handed back for closing.
pub struct ViewTable<W, T> {
    slots: [Option<ViewSlot<W, T>>; MAX_WINDOWS],
    occupied: u8,
}

impl<W, T> Default for ViewTable<W, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W, T> ViewTable<W, T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            occupied: 0,
        }
    }

    /// Number of live views, the primary included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupied.count_ones() as usize
    }

    /// `true` when no view is tracked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// `true` when every slot is taken.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() == MAX_WINDOWS
    }

    /// Lowest free slot, if any.
    #[must_use]
    pub fn first_free(&self) -> Option<ViewId> {
        let free = !self.occupied & SLOT_MASK;
        (free != 0).then(|| ViewId(free.trailing_zeros() as u8))
    }

    /// Lowest occupied slot other than the primary, if any.
    #[must_use]
    pub fn first_secondary(&self) -> Option<ViewId> {
        let secondaries = self.occupied & !ViewId::PRIMARY.bit();
        (secondaries != 0).then(|| ViewId(secondaries.trailing_zeros() as u8))
    }

    /// The slot for `view`, if occupied.
    #[must_use]
    pub fn get(&self, view: ViewId) -> Option<&ViewSlot<W, T>> {
        self.slots[view.index()].as_ref()
    }

    /// Bitmap of slots that currently own a render target.
    ///
    /// Bit `i` corresponds to slot `i`; the primary bit is never set. The
    /// complement is the set of scene groups that fall back to the primary
    /// view.
    #[must_use]
    pub fn claimed(&self) -> u8 {
        let mut bits = 0u8;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.as_ref().is_some_and(ViewSlot::has_target) {
                bits |= 1 << index;
            }
        }
        bits
    }

    /// Iterates live slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ViewId, &ViewSlot<W, T>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|s| (ViewId(index as u8), s)))
    }

    /// Records `window` in the lowest free slot and returns its id.
    ///
    /// The first insert claims slot 0, the primary view. No target is bound
    /// here; the next [`reconcile`](ViewTable::reconcile) pass picks the
    /// window up at its observed size. Returns `None` when every slot is
    /// taken, in which case `window` is dropped unrecorded.
    pub fn insert(&mut self, window: W) -> Option<ViewId> {
        let view = self.first_free()?;
        self.slots[view.index()] = Some(ViewSlot {
            window,
            applied: None,
            target: None,
        });
        self.occupied |= view.bit();
        Some(view)
    }

    /// Destroys the first live secondary view and returns its window.
    ///
    /// The slot's render target (if any) is destroyed first, then the host
    /// advances [`TARGET_RELEASE_FRAMES`] frames so the swap chain bound to
    /// the window is fully released before the caller closes the window
    /// itself. One view per call; `None` when only the primary remains.
    pub fn destroy_first<H>(&mut self, host: &mut H) -> Option<(ViewId, W)>
    where
        H: TargetHost<W, Target = T>,
    {
        let view = self.first_secondary()?;
        let slot = self.slots[view.index()].take()?;
        self.occupied &= !view.bit();

        let ViewSlot { window, target, .. } = slot;
        if let Some(target) = target {
            host.destroy_target(view, target);
            // Flush swap-chain destruction before the window goes away.
            host.flush_frames(TARGET_RELEASE_FRAMES);
        }
        Some((view, window))
    }

    /// Brings every slot's render target in line with the observed window
    /// state. `observe` reports the current state of each live window.
    ///
    /// Per slot:
    /// - window gone: the target is destroyed and the slot cleared;
    /// - size differs from the last applied one (or nothing was applied
    ///   yet): the old target is destroyed, then a fresh one is created at
    ///   the observed size;
    /// - zero-sized (minimized): the old target is destroyed and none is
    ///   created until the window regains area.
    ///
    /// The primary slot only has its size tracked; it never owns a target,
    /// and a dead primary is left for the app to act on. A host returning
    /// `None` from [`TargetHost::create_target`] leaves the slot target-less
    /// until its size changes again.
    pub fn reconcile<H, F>(&mut self, host: &mut H, mut observe: F)
    where
        H: TargetHost<W, Target = T>,
        F: FnMut(ViewId, &W) -> WindowState,
    {
        for index in 0..MAX_WINDOWS {
            let view = ViewId(index as u8);
            let Some(state) = self.slots[index]
                .as_ref()
                .map(|slot| observe(view, &slot.window))
            else {
                continue;
            };

            if !state.alive {
                if view.is_primary() {
                    continue;
                }
                self.occupied &= !view.bit();
                if let Some(slot) = self.slots[index].take()
                    && let Some(target) = slot.target
                {
                    host.destroy_target(view, target);
                }
                continue;
            }

            let Some(slot) = self.slots[index].as_mut() else {
                continue;
            };
            let observed = (state.width, state.height);
            if slot.applied == Some(observed) {
                continue;
            }

            if let Some(target) = slot.target.take() {
                host.destroy_target(view, target);
            }
            slot.applied = Some(observed);
            if !view.is_primary() && state.width > 0 && state.height > 0 {
                slot.target = host.create_target(view, &slot.window, state.width, state.height);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type Table = ViewTable<u32, u32>;

    struct NullHost;

    impl TargetHost<u32> for NullHost {
        type Target = u32;

        fn create_target(&mut self, _: ViewId, _: &u32, _: u32, _: u32) -> Option<u32> {
            None
        }

        fn destroy_target(&mut self, _: ViewId, _: u32) {}

        fn flush_frames(&mut self, _: usize) {}
    }

    #[test]
    fn view_id_bounds() {
        assert_eq!(ViewId::new(0), Some(ViewId::PRIMARY));
        assert!(ViewId::new(MAX_WINDOWS - 1).is_some());
        assert!(ViewId::new(MAX_WINDOWS).is_none());
    }

    #[test]
    fn insert_fills_lowest_slot_first() {
        let mut table = Table::new();
        assert_eq!(table.first_free().map(ViewId::index), Some(0));

        for expected in 0..MAX_WINDOWS {
            let view = table.insert(expected as u32);
            assert_eq!(view.map(ViewId::index), Some(expected));
        }
        assert!(table.is_full());
        assert_eq!(table.insert(99), None);
    }

    #[test]
    fn freed_slot_is_reused_before_higher_ones() {
        let mut table = Table::new();
        for w in 0..4 {
            table.insert(w);
        }

        // Free slot 1; slot 2 and 3 stay live.
        let mut host = NullHost;
        let removed = table.destroy_first(&mut host);
        assert_eq!(removed.map(|(v, _)| v.index()), Some(1));

        assert_eq!(table.first_free().map(ViewId::index), Some(1));
        assert_eq!(table.insert(42).map(ViewId::index), Some(1));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn first_secondary_skips_the_primary() {
        let mut table = Table::new();
        assert_eq!(table.first_secondary(), None);

        table.insert(0);
        assert_eq!(table.first_secondary(), None);

        table.insert(1);
        table.insert(2);
        assert_eq!(table.first_secondary().map(ViewId::index), Some(1));
    }

    #[test]
    fn len_tracks_the_occupancy_bitmap() {
        let mut table = Table::new();
        assert!(table.is_empty());
        table.insert(0);
        table.insert(1);
        assert_eq!(table.len(), 2);

        let mut host = NullHost;
        table.destroy_first(&mut host);
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
    }
}
