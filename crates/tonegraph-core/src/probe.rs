//! Lock-free sample tap for visualisation.
//!
//! A [`ProbeBuffer`] is written by the audio thread (one sample per node per
//! tick) and read by a UI thread. Samples are stored as `f32` bit patterns in
//! `AtomicU32` cells, so neither side ever blocks. When the reader falls
//! behind, the writer overwrites the oldest samples.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Default probe capacity in samples.
pub const DEFAULT_PROBE_CAPACITY: usize = 8192;

/// Single-producer ring buffer of `f32` samples.
///
/// Positions are monotonic counters; the cell index is `position % capacity`.
/// A reader racing a writer that laps it may observe a mix of old and new
/// samples, which is acceptable for scopes and meters.
#[derive(Debug)]
pub struct ProbeBuffer {
    cells: Box<[AtomicU32]>,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
}

impl Default for ProbeBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_CAPACITY)
    }
}

impl ProbeBuffer {
    /// Create a probe holding up to `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let cells = (0..capacity.max(1))
            .map(|_| AtomicU32::new(0.0f32.to_bits()))
            .collect();
        Self {
            cells,
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
        }
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Append one sample. Real-time safe.
    #[inline]
    pub fn push(&self, sample: f32) {
        let w = self.write_pos.load(Ordering::Relaxed);
        self.cells[w % self.cells.len()].store(sample.to_bits(), Ordering::Relaxed);
        self.write_pos.store(w.wrapping_add(1), Ordering::Release);
    }

    /// Total samples ever pushed.
    pub fn total_written(&self) -> usize {
        self.write_pos.load(Ordering::Acquire)
    }

    /// Samples not yet pulled, capped at capacity.
    pub fn available(&self) -> usize {
        let w = self.write_pos.load(Ordering::Acquire);
        let r = self.read_pos.load(Ordering::Acquire);
        w.wrapping_sub(r).min(self.cells.len())
    }

    /// Move unread samples into `out`, oldest first. Returns the count copied.
    ///
    /// Samples overwritten before they were read are skipped.
    pub fn pull(&self, out: &mut [f32]) -> usize {
        let w = self.write_pos.load(Ordering::Acquire);
        let mut r = self.read_pos.load(Ordering::Acquire);
        let cap = self.cells.len();
        if w.wrapping_sub(r) > cap {
            r = w.wrapping_sub(cap);
        }
        let n = w.wrapping_sub(r).min(out.len());
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            let bits = self.cells[r.wrapping_add(i) % cap].load(Ordering::Relaxed);
            *slot = f32::from_bits(bits);
        }
        self.read_pos.store(r.wrapping_add(n), Ordering::Release);
        n
    }

    /// The most recent `count` samples in chronological order, without
    /// consuming them.
    pub fn snapshot(&self, count: usize) -> Vec<f32> {
        let w = self.write_pos.load(Ordering::Acquire);
        let cap = self.cells.len();
        let n = count.min(cap).min(w);
        let start = w.wrapping_sub(n);
        (0..n)
            .map(|i| f32::from_bits(self.cells[start.wrapping_add(i) % cap].load(Ordering::Relaxed)))
            .collect()
    }

    /// Drop all unread samples.
    pub fn clear(&self) {
        let w = self.write_pos.load(Ordering::Acquire);
        self.read_pos.store(w, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_push_and_pull() {
        let probe = ProbeBuffer::new(8);
        for i in 0..5 {
            probe.push(i as f32);
        }
        assert_eq!(probe.available(), 5);

        let mut out = [0.0; 3];
        assert_eq!(probe.pull(&mut out), 3);
        assert_eq!(out, [0.0, 1.0, 2.0]);
        assert_eq!(probe.available(), 2);

        let mut rest = [0.0; 8];
        assert_eq!(probe.pull(&mut rest), 2);
        assert_eq!(&rest[..2], &[3.0, 4.0]);
        assert_eq!(probe.available(), 0);
    }

    #[test]
    fn test_overwrite_keeps_newest() {
        let probe = ProbeBuffer::new(4);
        for i in 0..10 {
            probe.push(i as f32);
        }
        assert_eq!(probe.available(), 4);
        let mut out = [0.0; 4];
        assert_eq!(probe.pull(&mut out), 4);
        assert_eq!(out, [6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_snapshot_does_not_consume() {
        let probe = ProbeBuffer::new(16);
        for i in 0..6 {
            probe.push(i as f32);
        }
        assert_eq!(probe.snapshot(3), vec![3.0, 4.0, 5.0]);
        assert_eq!(probe.snapshot(100).len(), 6);
        assert_eq!(probe.available(), 6);
        probe.clear();
        assert_eq!(probe.available(), 0);
        assert_eq!(probe.total_written(), 6);
    }

    #[test]
    fn test_cross_thread_writer() {
        let probe = Arc::new(ProbeBuffer::new(1024));
        let writer = {
            let probe = Arc::clone(&probe);
            std::thread::spawn(move || {
                for i in 0..512 {
                    probe.push(i as f32);
                }
            })
        };
        writer.join().unwrap();
        let mut out = vec![0.0; 1024];
        let n = probe.pull(&mut out);
        assert_eq!(n, 512);
        assert!(out[..n].windows(2).all(|w| w[1] == w[0] + 1.0));
    }
}
