//! Injectable randomness.
//!
//! Every random draw in the TrafficView core goes through [`RandomSource`],
//! so tests and simulations can replace OS entropy with a scripted or
//! seeded sequence.

use std::sync::atomic::{AtomicUsize, Ordering};

/// A source of uniform samples in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    /// Returns the next sample in `[0, 1)`.
    fn next_f64(&self) -> f64;
    
    /// Uniform sample in `[low, high)`.
    fn uniform(&self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }
    
    /// Uniform integer in `[low, high)`, i.e. `floor(U * span) + low`.
    fn int_range(&self, low: u32, high: u32) -> u32 {
        let span = high.saturating_sub(low);
        let offset = (self.next_f64() * span as f64).floor() as u32;
        low + offset.min(span.saturating_sub(1))
    }
    
    /// Symmetric jitter in `[-half_width, half_width)`.
    fn jitter(&self, half_width: f64) -> f64 {
        (self.next_f64() - 0.5) * 2.0 * half_width
    }
    
    /// Uniform index into a collection of `len` items (`len` > 0).
    fn index(&self, len: usize) -> usize {
        let idx = (self.next_f64() * len as f64).floor() as usize;
        idx.min(len.saturating_sub(1))
    }
}

/// Production random source backed by the thread-local OS-seeded RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
///
/// Samples are clamped into `[0, 1)` on construction.
#[derive(Debug)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: AtomicUsize,
}

impl SequenceRandom {
    /// Creates a source replaying `values` in order.
    ///
    /// An empty list behaves like a constant `0.0`.
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let values: Vec<f64> = values
            .into()
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }
    
    /// Creates a source that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
    
    /// Number of samples drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let idx = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.values[idx % self.values.len()]
    }
}
