//! Thread-safe graph modification queue.
//!
//! Non-real-time threads enqueue closures through a [`ModificationHandle`];
//! the audio thread drains and applies them at the start of each block with
//! [`ModificationManager::process_pending_modifications`], so no closure ever
//! runs concurrently with [`SignalGraph`] processing.
//!
//! # Threading model
//!
//! - **Queue**: `parking_lot::Mutex<Vec<_>>`. Enqueuers lock to push; the
//!   audio thread locks only to swap the queue with its own scratch vector.
//!   No closure runs and nothing is dropped while the lock is held.
//! - **Counters**: atomics. `pending_count` allows the audio thread to skip
//!   the lock entirely when nothing is queued.
//! - **Callbacks**: owned by the RT-side [`ModificationManager`]. The
//!   voice-stop callback flags voices and returns; it must not wait.
//!
//! ```rust
//! use tonegraph_core::{ModificationManager, OutputNode, SignalGraph};
//!
//! let mut graph = SignalGraph::default();
//! let mut manager = ModificationManager::new();
//! let handle = manager.handle();
//!
//! handle.queue_structural_modification(
//!     |g| {
//!         let _ = g.add_node("out", Box::new(OutputNode::new()), 1);
//!     },
//!     "add output",
//! );
//! assert!(handle.has_pending_modifications());
//!
//! // Audio thread, once per block:
//! assert_eq!(manager.process_pending_modifications(&mut graph), 1);
//! assert!(graph.contains("out"));
//! ```

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use crate::graph::SignalGraph;

/// Closure applied to the graph on the audio thread.
pub type Modification = Box<dyn FnOnce(&mut SignalGraph) + Send>;

/// A queued graph edit.
pub struct PendingModification {
    modification: Modification,
    requires_note_off: bool,
    description: String,
    queued_at: Instant,
}

impl PendingModification {
    /// Wrap a closure, stamping it with the current time.
    pub fn new(
        modification: impl FnOnce(&mut SignalGraph) + Send + 'static,
        requires_note_off: bool,
        description: impl Into<String>,
    ) -> Self {
        Self {
            modification: Box::new(modification),
            requires_note_off,
            description: description.into(),
            queued_at: Instant::now(),
        }
    }

    /// Whether voices must be stopped before applying.
    pub fn requires_note_off(&self) -> bool {
        self.requires_note_off
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// When the modification was created.
    pub fn queued_at(&self) -> Instant {
        self.queued_at
    }
}

impl fmt::Debug for PendingModification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingModification")
            .field("description", &self.description)
            .field("requires_note_off", &self.requires_note_off)
            .field("queued_at", &self.queued_at)
            .finish_non_exhaustive()
    }
}

/// Snapshot of one voice slot, taken around structural edits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VoiceState {
    /// MIDI note number.
    pub note_number: u8,
    /// Normalised velocity (0–1).
    pub velocity: f32,
    /// Whether the voice was sounding.
    pub is_active: bool,
}

struct SharedQueue {
    pending: Mutex<Vec<PendingModification>>,
    pending_count: AtomicUsize,
    total_applied: AtomicUsize,
}

/// Cloneable enqueue side of the modification queue.
///
/// Handles may be sent to any number of non-real-time threads.
#[derive(Clone)]
pub struct ModificationHandle {
    inner: Arc<SharedQueue>,
}

impl ModificationHandle {
    /// Enqueue a prepared modification.
    pub fn queue(&self, modification: PendingModification) {
        let mut pending = self.inner.pending.lock();
        pending.push(modification);
        self.inner.pending_count.store(pending.len(), Ordering::Release);
    }

    /// Enqueue a closure.
    pub fn queue_modification(
        &self,
        modification: impl FnOnce(&mut SignalGraph) + Send + 'static,
        requires_note_off: bool,
        description: impl Into<String>,
    ) {
        self.queue(PendingModification::new(
            modification,
            requires_note_off,
            description,
        ));
    }

    /// Enqueue a topology change; voices are stopped before it runs.
    pub fn queue_structural_modification(
        &self,
        modification: impl FnOnce(&mut SignalGraph) + Send + 'static,
        description: impl Into<String>,
    ) {
        self.queue_modification(modification, true, description);
    }

    /// Enqueue a parameter change; voices keep sounding.
    pub fn queue_parametric_modification(
        &self,
        modification: impl FnOnce(&mut SignalGraph) + Send + 'static,
        description: impl Into<String>,
    ) {
        self.queue_modification(modification, false, description);
    }

    /// Lock-free check for queued work.
    #[inline]
    pub fn has_pending_modifications(&self) -> bool {
        self.inner.pending_count.load(Ordering::Relaxed) > 0
    }

    /// Number of queued modifications.
    pub fn pending_count(&self) -> usize {
        self.inner.pending_count.load(Ordering::Acquire)
    }

    /// Descriptions of queued modifications, oldest first.
    pub fn pending_descriptions(&self) -> Vec<String> {
        self.inner
            .pending
            .lock()
            .iter()
            .map(|m| m.description.clone())
            .collect()
    }

    /// Discard all queued modifications without applying them.
    ///
    /// Returns how many were discarded. Entries already drained by the audio
    /// thread are unaffected.
    pub fn clear_pending_modifications(&self) -> usize {
        let discarded = {
            let mut pending = self.inner.pending.lock();
            self.inner.pending_count.store(0, Ordering::Release);
            core::mem::take(&mut *pending)
        };
        discarded.len()
    }

    /// Total modifications applied since creation.
    pub fn total_modifications_applied(&self) -> usize {
        self.inner.total_applied.load(Ordering::Acquire)
    }
}

/// Real-time side of the modification queue.
///
/// Owned by the audio thread together with the graph. Call
/// [`process_pending_modifications`](Self::process_pending_modifications)
/// once per block before pulling samples.
pub struct ModificationManager {
    handle: ModificationHandle,
    drained: Vec<PendingModification>,
    voice_stop: Option<Box<dyn FnMut() + Send>>,
    on_complete: Option<Box<dyn FnMut(usize) + Send>>,
    capture_voices: Option<Box<dyn FnMut(&mut [VoiceState]) + Send>>,
    restore_voices: Option<Box<dyn FnMut(&[VoiceState]) + Send>>,
    voice_states: Vec<VoiceState>,
    auto_preserve: bool,
    verbose: bool,
}

impl Default for ModificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ModificationManager {
    /// Create a manager with an empty queue and no callbacks.
    pub fn new() -> Self {
        Self {
            handle: ModificationHandle {
                inner: Arc::new(SharedQueue {
                    pending: Mutex::new(Vec::new()),
                    pending_count: AtomicUsize::new(0),
                    total_applied: AtomicUsize::new(0),
                }),
            },
            drained: Vec::new(),
            voice_stop: None,
            on_complete: None,
            capture_voices: None,
            restore_voices: None,
            voice_states: Vec::new(),
            auto_preserve: false,
            verbose: false,
        }
    }

    /// A new enqueue handle sharing this manager's queue.
    pub fn handle(&self) -> ModificationHandle {
        self.handle.clone()
    }

    /// Enqueue a closure from the owning thread.
    pub fn queue_modification(
        &self,
        modification: impl FnOnce(&mut SignalGraph) + Send + 'static,
        requires_note_off: bool,
        description: impl Into<String>,
    ) {
        self.handle
            .queue_modification(modification, requires_note_off, description);
    }

    /// See [`ModificationHandle::has_pending_modifications`].
    pub fn has_pending_modifications(&self) -> bool {
        self.handle.has_pending_modifications()
    }

    /// See [`ModificationHandle::pending_count`].
    pub fn pending_count(&self) -> usize {
        self.handle.pending_count()
    }

    /// See [`ModificationHandle::clear_pending_modifications`].
    pub fn clear_pending_modifications(&self) -> usize {
        self.handle.clear_pending_modifications()
    }

    /// See [`ModificationHandle::total_modifications_applied`].
    pub fn total_modifications_applied(&self) -> usize {
        self.handle.total_modifications_applied()
    }

    /// Callback invoked once per batch containing a structural modification,
    /// before any closure runs.
    pub fn set_voice_stop_callback(&mut self, callback: impl FnMut() + Send + 'static) {
        self.voice_stop = Some(Box::new(callback));
    }

    /// Callback invoked once per non-empty batch, after every closure ran.
    /// Receives the number applied.
    pub fn set_completion_callback(&mut self, callback: impl FnMut(usize) + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Callbacks filling and consuming voice snapshots around structural edits.
    pub fn set_voice_state_callbacks(
        &mut self,
        capture: impl FnMut(&mut [VoiceState]) + Send + 'static,
        restore: impl FnMut(&[VoiceState]) + Send + 'static,
    ) {
        self.capture_voices = Some(Box::new(capture));
        self.restore_voices = Some(Box::new(restore));
    }

    /// Size the voice snapshot storage. Not real-time safe.
    pub fn set_num_voices(&mut self, num_voices: usize) {
        self.voice_states.resize(num_voices, VoiceState::default());
    }

    /// Capture and restore voice states around structural edits.
    pub fn set_auto_preserve_voice_state(&mut self, enabled: bool) {
        self.auto_preserve = enabled;
    }

    /// Voice snapshot from the last structural batch.
    pub fn voice_states(&self) -> &[VoiceState] {
        &self.voice_states
    }

    /// Log each applied modification with its queue latency.
    pub fn set_verbose_logging(&mut self, enabled: bool) {
        self.verbose = enabled;
    }

    /// Whether verbose logging is on.
    pub fn is_verbose_logging(&self) -> bool {
        self.verbose
    }

    /// Drain and apply every queued modification. Audio thread only.
    ///
    /// Order of events: swap the queue under the lock; if any entry needs
    /// note-off, capture voice states (when preserving) and call the
    /// voice-stop callback once; apply closures FIFO; restore voice states;
    /// call the completion callback once; bump the total. Returns the number
    /// applied.
    pub fn process_pending_modifications(&mut self, graph: &mut SignalGraph) -> usize {
        if !self.handle.has_pending_modifications() {
            return 0;
        }

        {
            let mut pending = self.handle.inner.pending.lock();
            core::mem::swap(&mut *pending, &mut self.drained);
            self.handle.inner.pending_count.store(0, Ordering::Release);
        }

        let count = self.drained.len();
        if count == 0 {
            return 0;
        }

        let note_off = self.drained.iter().any(|m| m.requires_note_off);
        let preserve = note_off && self.auto_preserve;
        if preserve && let Some(capture) = self.capture_voices.as_mut() {
            capture(&mut self.voice_states);
        }
        if note_off && let Some(stop) = self.voice_stop.as_mut() {
            stop();
        }

        for m in self.drained.drain(..) {
            #[cfg(feature = "tracing")]
            if self.verbose {
                tracing::debug!(
                    "modification: applying '{}' (queued {:?} ago, note_off={})",
                    m.description,
                    m.queued_at.elapsed(),
                    m.requires_note_off
                );
            }
            (m.modification)(graph);
        }

        if preserve && let Some(restore) = self.restore_voices.as_mut() {
            restore(&self.voice_states);
        }
        if let Some(done) = self.on_complete.as_mut() {
            done(count);
        }

        self.handle
            .inner
            .total_applied
            .fetch_add(count, Ordering::AcqRel);

        #[cfg(feature = "tracing")]
        tracing::debug!("modification: applied batch of {count} (note_off={note_off})");
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::OutputNode;
    use std::sync::atomic::AtomicBool;

    fn add_output(id: &'static str) -> impl FnOnce(&mut SignalGraph) + Send + 'static {
        move |g| {
            g.add_node(id, Box::new(OutputNode::new()), 1).unwrap();
        }
    }

    #[test]
    fn test_structural_stops_voices_before_apply() {
        let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let mut graph = SignalGraph::default();
        let mut manager = ModificationManager::new();

        let l = Arc::clone(&log);
        manager.set_voice_stop_callback(move || l.lock().push("stop"));
        let l = Arc::clone(&log);
        manager.set_completion_callback(move |n| {
            assert_eq!(n, 1);
            l.lock().push("done");
        });

        let l = Arc::clone(&log);
        manager.handle().queue_structural_modification(
            move |g| {
                l.lock().push("apply");
                g.add_node("out", Box::new(OutputNode::new()), 1).unwrap();
            },
            "add out",
        );

        assert_eq!(manager.process_pending_modifications(&mut graph), 1);
        assert_eq!(*log.lock(), vec!["stop", "apply", "done"]);
        assert!(graph.contains("out"));
        assert_eq!(manager.total_modifications_applied(), 1);
        assert!(!manager.has_pending_modifications());

        // Nothing queued: no callbacks.
        assert_eq!(manager.process_pending_modifications(&mut graph), 0);
        assert_eq!(log.lock().len(), 3);
    }

    #[test]
    fn test_parametric_keeps_voices() {
        let stopped = Arc::new(AtomicBool::new(false));
        let mut graph = SignalGraph::default();
        let mut manager = ModificationManager::new();
        let s = Arc::clone(&stopped);
        manager.set_voice_stop_callback(move || s.store(true, Ordering::SeqCst));

        manager.handle().queue_parametric_modification(|g| g.clear(), "clear");
        assert_eq!(manager.process_pending_modifications(&mut graph), 1);
        assert!(!stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fifo_order() {
        let mut graph = SignalGraph::default();
        let mut manager = ModificationManager::new();
        let handle = manager.handle();
        for id in ["a", "b", "c"] {
            handle.queue_parametric_modification(add_output(id), id);
        }
        assert_eq!(handle.pending_count(), 3);
        assert_eq!(handle.pending_descriptions(), vec!["a", "b", "c"]);
        assert_eq!(manager.process_pending_modifications(&mut graph), 3);
        assert_eq!(graph.node_ids(), vec!["a", "b", "c"]);
        assert_eq!(handle.total_modifications_applied(), 3);
    }

    #[test]
    fn test_clear_discards() {
        let mut graph = SignalGraph::default();
        let mut manager = ModificationManager::new();
        let handle = manager.handle();
        handle.queue_structural_modification(add_output("x"), "x");
        handle.queue_structural_modification(add_output("y"), "y");
        assert_eq!(handle.clear_pending_modifications(), 2);
        assert_eq!(manager.process_pending_modifications(&mut graph), 0);
        assert!(graph.is_empty());
        assert_eq!(manager.total_modifications_applied(), 0);
    }

    #[test]
    fn test_concurrent_enqueue_and_clear() {
        const N: usize = 2000;
        let mut graph = SignalGraph::default();
        let mut manager = ModificationManager::new();
        let handle = manager.handle();
        let counter = Arc::new(AtomicUsize::new(0));

        let producer = {
            let handle = handle.clone();
            let counter = Arc::clone(&counter);
            std::thread::spawn(move || {
                for _ in 0..N {
                    let c = Arc::clone(&counter);
                    handle.queue_parametric_modification(
                        move |_| {
                            c.fetch_add(1, Ordering::Relaxed);
                        },
                        "tick",
                    );
                }
            })
        };

        let mut discarded = 0;
        let mut applied = 0;
        for i in 0..500 {
            if i % 3 == 0 {
                discarded += handle.clear_pending_modifications();
            }
            applied += manager.process_pending_modifications(&mut graph);
        }
        producer.join().unwrap();
        discarded += handle.clear_pending_modifications();
        applied += manager.process_pending_modifications(&mut graph);

        assert_eq!(applied + discarded, N);
        assert_eq!(counter.load(Ordering::Relaxed), applied);
        assert_eq!(manager.total_modifications_applied(), applied);
    }

    #[test]
    fn test_voice_state_preservation() {
        let restored = Arc::new(Mutex::new(Vec::new()));
        let mut graph = SignalGraph::default();
        let mut manager = ModificationManager::new();
        manager.set_num_voices(2);
        manager.set_auto_preserve_voice_state(true);
        let r = Arc::clone(&restored);
        manager.set_voice_state_callbacks(
            |voices| {
                voices[0] = VoiceState {
                    note_number: 60,
                    velocity: 0.8,
                    is_active: true,
                };
            },
            move |voices| r.lock().extend_from_slice(voices),
        );

        manager.handle().queue_parametric_modification(|_| {}, "param");
        manager.process_pending_modifications(&mut graph);
        assert!(restored.lock().is_empty());

        manager.handle().queue_structural_modification(add_output("o"), "struct");
        manager.process_pending_modifications(&mut graph);
        let restored = restored.lock();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].note_number, 60);
        assert!(restored[0].is_active);
        assert!(!restored[1].is_active);
        assert_eq!(manager.voice_states()[0].velocity, 0.8);
    }

    #[test]
    fn test_verbose_flag() {
        let mut manager = ModificationManager::new();
        assert!(!manager.is_verbose_logging());
        manager.set_verbose_logging(true);
        assert!(manager.is_verbose_logging());
    }
}
