// Copyright 2026 the Porthole Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session lifecycle state machine, render generations, and tracked-input
//! change detection.
//!
//! The declarative original re-ran effects whenever a tracked prop changed.
//! Here that behavior is explicit: setters mark dirty channels on an
//! [`InputTracker`], a commit dispatch drains them into [`InputChanges`] and
//! runs the same ordered steps every time (resolve fonts → render → request
//! frame), and a monotonically increasing generation counter
//! ([`Generations`]) discards stale in-flight results.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──mark_ready──► Ready ◄──platform_left──┐
//!                                 │                      │
//!                                 └──platform_entered──► Active
//!
//!                (any phase) ──close──► Closed
//! ```
//!
//! The `active` flag is derived from the phase and driven **only** by
//! platform events, never optimistically by enter/exit requests.

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use understory_dirty::{Channel, CycleHandling, DirtyTracker};

use crate::dirty;
use crate::error::SessionError;

/// The single tracked key: session inputs are flat, so one key per session
/// with one channel per input category.
const SESSION_KEY: u32 = 0;

/// Lifecycle phase of a PiP session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Created, but the relay element and pixel surface do not exist yet.
    Uninitialized,
    /// Elements constructed and streaming; no PiP window shown.
    Ready,
    /// The platform is showing the PiP window.
    Active,
    /// Torn down. Terminal.
    Closed,
}

/// Explicit session state machine.
///
/// Support is probed once at creation and never changes afterwards.
#[derive(Clone, Debug)]
pub struct SessionState {
    phase: SessionPhase,
    supported: bool,
}

impl SessionState {
    /// Creates a new state machine in `Uninitialized`.
    #[must_use]
    pub fn new(supported: bool) -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            supported,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the platform reported PiP capability at creation.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Whether a PiP window is currently shown.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Whether the session has been torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.phase == SessionPhase::Closed
    }

    /// Records that the relay element and surface have been constructed:
    /// `Uninitialized → Ready`. A no-op in any other phase.
    pub fn mark_ready(&mut self) {
        if self.phase == SessionPhase::Uninitialized {
            self.phase = SessionPhase::Ready;
        }
    }

    /// Checks the synchronous preconditions of an enter request.
    ///
    /// Capability is checked before lifecycle, so an unsupported platform is
    /// always reported as [`SessionError::Unsupported`] without touching any
    /// platform API.
    pub fn ensure_can_enter(&self) -> Result<(), SessionError> {
        if !self.supported {
            return Err(SessionError::Unsupported);
        }
        match self.phase {
            SessionPhase::Ready | SessionPhase::Active => Ok(()),
            SessionPhase::Uninitialized | SessionPhase::Closed => {
                Err(SessionError::NotInitialized)
            }
        }
    }

    /// The platform reported the PiP window opened. Returns `true` when the
    /// active flag actually changed.
    pub fn platform_entered(&mut self) -> bool {
        if self.phase == SessionPhase::Ready {
            self.phase = SessionPhase::Active;
            true
        } else {
            false
        }
    }

    /// The platform reported the PiP window closed. Returns `true` when the
    /// active flag actually changed.
    pub fn platform_left(&mut self) -> bool {
        if self.phase == SessionPhase::Active {
            self.phase = SessionPhase::Ready;
            true
        } else {
            false
        }
    }

    /// Plans an exit request for the current phase.
    #[must_use]
    pub fn exit_plan(&self) -> ExitPlan {
        ExitPlan {
            request_platform: self.is_active(),
            rewind_relay: !self.is_closed(),
        }
    }

    /// Tears the session down. Idempotent; safe after partial construction.
    pub fn close(&mut self) {
        self.phase = SessionPhase::Closed;
    }
}

/// What an exit request must do in the current phase.
///
/// The relay is rewound to the start and paused on every exit while the
/// session lives, even when no PiP window is open, so the next enter always
/// starts from a clean playback position. The platform is asked to leave
/// only while a window is actually shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitPlan {
    /// Ask the platform to close the PiP window.
    pub request_platform: bool,
    /// Rewind the relay to the start and pause it.
    pub rewind_relay: bool,
}

/// A replaceable notification callback that may re-enter its own slot.
///
/// Platform event handlers invoke consumer callbacks, and a callback is
/// allowed to replace itself, clear the slot, or tear the whole session
/// down while it runs. [`invoke`](Self::invoke) clones the callback out of
/// the cell first so none of that trips the interior borrow.
#[derive(Default)]
pub struct CallbackSlot {
    callback: RefCell<Option<Rc<dyn Fn()>>>,
}

impl core::fmt::Debug for CallbackSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CallbackSlot")
            .field("set", &self.callback.borrow().is_some())
            .finish()
    }
}

impl CallbackSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored callback.
    pub fn set(&self, callback: impl Fn() + 'static) {
        *self.callback.borrow_mut() = Some(Rc::new(callback));
    }

    /// Clears the slot.
    pub fn clear(&self) {
        self.callback.borrow_mut().take();
    }

    /// Invokes the stored callback, if any.
    ///
    /// The callback runs with the slot unborrowed and may call
    /// [`set`](Self::set) or [`clear`](Self::clear) on it.
    pub fn invoke(&self) {
        let callback = self.callback.borrow().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// Monotonically increasing render-generation counter.
///
/// Each render cycle begins with [`begin`](Self::begin), which supersedes
/// every outstanding [`RenderTicket`]. There is no way to interrupt the
/// external rasterizer, so cancellation is entirely result-side: a cycle
/// whose ticket is stale drops its output on arrival.
#[derive(Clone, Debug, Default)]
pub struct Generations {
    current: Rc<Cell<u64>>,
}

impl Generations {
    /// Creates a counter at generation zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation and returns its ticket.
    pub fn begin(&self) -> RenderTicket {
        let generation = self.current.get() + 1;
        self.current.set(generation);
        RenderTicket {
            generation,
            current: Rc::clone(&self.current),
        }
    }

    /// The most recently issued generation.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.current.get()
    }
}

/// Identifies one render cycle; stale once a newer cycle begins.
#[derive(Clone, Debug)]
pub struct RenderTicket {
    generation: u64,
    current: Rc<Cell<u64>>,
}

impl RenderTicket {
    /// This ticket's generation number.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this ticket still names the newest cycle.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.current.get() == self.generation
    }
}

/// Which tracked inputs changed since the last drain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputChanges {
    /// Scene description changed.
    pub scene: bool,
    /// Width, height, or device pixel ratio changed.
    pub geometry: bool,
    /// Font specification changed.
    pub fonts: bool,
    /// Audio source changed.
    pub audio: bool,
}

impl InputChanges {
    /// Whether any change requires a repaint of the surface.
    #[must_use]
    pub fn needs_render(&self) -> bool {
        self.scene || self.geometry || self.fonts
    }

    /// Whether anything changed at all.
    #[must_use]
    pub fn any(&self) -> bool {
        self.scene || self.geometry || self.fonts || self.audio
    }
}

/// Tracked-input change detection over the [`dirty`] channels.
#[derive(Debug)]
pub struct InputTracker {
    dirty: DirtyTracker<u32>,
}

impl Default for InputTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InputTracker {
    /// Creates a tracker with all channels clean.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    /// Marks the scene channel.
    pub fn mark_scene(&mut self) {
        self.dirty.mark(SESSION_KEY, dirty::SCENE);
    }

    /// Marks the geometry channel.
    pub fn mark_geometry(&mut self) {
        self.dirty.mark(SESSION_KEY, dirty::GEOMETRY);
    }

    /// Marks the fonts channel.
    pub fn mark_fonts(&mut self) {
        self.dirty.mark(SESSION_KEY, dirty::FONTS);
    }

    /// Marks the audio channel.
    pub fn mark_audio(&mut self) {
        self.dirty.mark(SESSION_KEY, dirty::AUDIO);
    }

    /// Marks every channel. Used when a session first mounts.
    pub fn mark_all(&mut self) {
        self.mark_scene();
        self.mark_geometry();
        self.mark_fonts();
        self.mark_audio();
    }

    /// Drains all channels, returning which inputs changed since the last
    /// drain.
    pub fn drain(&mut self) -> InputChanges {
        InputChanges {
            scene: drain_channel(&mut self.dirty, dirty::SCENE),
            geometry: drain_channel(&mut self.dirty, dirty::GEOMETRY),
            fonts: drain_channel(&mut self.dirty, dirty::FONTS),
            audio: drain_channel(&mut self.dirty, dirty::AUDIO),
        }
    }
}

fn drain_channel(tracker: &mut DirtyTracker<u32>, channel: Channel) -> bool {
    tracker.drain(channel).deterministic().run().count() > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_follows_the_state_diagram() {
        let mut state = SessionState::new(true);
        assert_eq!(state.phase(), SessionPhase::Uninitialized);
        assert!(!state.is_active());

        state.mark_ready();
        assert_eq!(state.phase(), SessionPhase::Ready);

        assert!(state.platform_entered());
        assert!(state.is_active());
        assert!(!state.platform_entered(), "re-entry does not toggle");

        assert!(state.platform_left());
        assert_eq!(state.phase(), SessionPhase::Ready);
        assert!(!state.platform_left(), "repeated leave does not toggle");

        state.close();
        assert!(state.is_closed());
        state.close();
        assert!(state.is_closed(), "close is idempotent");
    }

    #[test]
    fn active_flag_never_changes_optimistically() {
        let mut state = SessionState::new(true);
        state.mark_ready();
        // An enter precondition check must not flip the flag.
        state.ensure_can_enter().unwrap();
        assert!(!state.is_active());
    }

    #[test]
    fn unsupported_platforms_fail_enter_before_lifecycle() {
        let state = SessionState::new(false);
        assert_eq!(state.ensure_can_enter(), Err(SessionError::Unsupported));

        let mut ready_but_unsupported = SessionState::new(false);
        ready_but_unsupported.mark_ready();
        assert_eq!(
            ready_but_unsupported.ensure_can_enter(),
            Err(SessionError::Unsupported)
        );
    }

    #[test]
    fn uninitialized_and_closed_sessions_cannot_enter() {
        let state = SessionState::new(true);
        assert_eq!(state.ensure_can_enter(), Err(SessionError::NotInitialized));

        let mut closed = SessionState::new(true);
        closed.mark_ready();
        closed.close();
        assert_eq!(closed.ensure_can_enter(), Err(SessionError::NotInitialized));
        closed.mark_ready();
        assert!(closed.is_closed(), "closed is terminal");
    }

    #[test]
    fn exit_rewinds_in_every_live_phase() {
        let mut state = SessionState::new(true);
        let plan = state.exit_plan();
        assert!(plan.rewind_relay);
        assert!(!plan.request_platform);

        state.mark_ready();
        let plan = state.exit_plan();
        assert!(plan.rewind_relay);
        assert!(!plan.request_platform, "no window open, nothing to close");

        state.platform_entered();
        let plan = state.exit_plan();
        assert!(plan.rewind_relay);
        assert!(plan.request_platform);

        state.close();
        let plan = state.exit_plan();
        assert!(!plan.rewind_relay, "the relay is gone after close");
        assert!(!plan.request_platform);
    }

    #[test]
    fn callbacks_may_clear_or_replace_their_own_slot() {
        let slot = Rc::new(CallbackSlot::new());
        let fired = Rc::new(Cell::new(0_u32));

        let inner = Rc::clone(&slot);
        let count = Rc::clone(&fired);
        slot.set(move || {
            count.set(count.get() + 1);
            inner.clear();
        });
        slot.invoke();
        assert_eq!(fired.get(), 1);
        slot.invoke();
        assert_eq!(fired.get(), 1, "the callback cleared itself");

        let inner = Rc::clone(&slot);
        let count = Rc::clone(&fired);
        slot.set(move || {
            count.set(count.get() + 1);
            let count = Rc::clone(&count);
            inner.set(move || count.set(count.get() + 10));
        });
        slot.invoke();
        assert_eq!(fired.get(), 2);
        slot.invoke();
        assert_eq!(fired.get(), 12, "the callback replaced itself");
    }

    #[test]
    fn newer_generations_supersede_older_tickets() {
        let generations = Generations::new();
        let first = generations.begin();
        assert!(first.is_current());

        let second = generations.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(generations.current(), second.generation());
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn cloned_tickets_share_staleness() {
        let generations = Generations::new();
        let ticket = generations.begin();
        let clone = ticket.clone();
        let _newer = generations.begin();
        assert!(!ticket.is_current());
        assert!(!clone.is_current());
    }

    #[test]
    fn drains_report_only_marked_channels_and_reset() {
        let mut inputs = InputTracker::new();
        assert_eq!(inputs.drain(), InputChanges::default());

        inputs.mark_scene();
        inputs.mark_audio();
        let changes = inputs.drain();
        assert!(changes.scene && changes.audio);
        assert!(!changes.geometry && !changes.fonts);
        assert!(changes.any());
        assert!(changes.needs_render(), "scene changes require a repaint");

        assert_eq!(inputs.drain(), InputChanges::default(), "drain resets");
    }

    #[test]
    fn audio_alone_does_not_require_a_render() {
        let mut inputs = InputTracker::new();
        inputs.mark_audio();
        let changes = inputs.drain();
        assert!(changes.any());
        assert!(!changes.needs_render());
    }

    #[test]
    fn mark_all_dirties_every_channel() {
        let mut inputs = InputTracker::new();
        inputs.mark_all();
        let changes = inputs.drain();
        assert!(changes.scene && changes.geometry && changes.fonts && changes.audio);
    }
}
