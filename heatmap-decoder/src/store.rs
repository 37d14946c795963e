//! Smoothed reading store
//!
//! Holds the latest exponentially smoothed temperature of each sensor. The
//! store is shared between the acquisition thread (writer) and the render tick
//! (reader); all four slots sit behind one lock so a snapshot always reflects a
//! single instant.

use crate::types::{HeatmapError, Result, SlotReading, Snapshot, Timestamp, SENSOR_COUNT};
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

/// Thread-safe per-sensor EMA state
#[derive(Debug)]
pub struct ReadingStore {
    alpha: f64,
    slots: Mutex<[SlotReading; SENSOR_COUNT]>,
}

impl ReadingStore {
    /// Create a store with every slot unset
    ///
    /// `alpha` must lie in `(0, 1]`.
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(HeatmapError::InvalidConfig(format!(
                "EMA alpha must be in (0, 1], got {}",
                alpha
            )));
        }
        Ok(Self {
            alpha,
            slots: Mutex::new([SlotReading::default(); SENSOR_COUNT]),
        })
    }

    /// Apply one raw sample to a sensor, returning the new smoothed value
    pub fn update(&self, index: usize, temperature: f64) -> Result<f64> {
        self.update_at(index, temperature, Utc::now())
    }

    /// Same as [`update`](Self::update) with an explicit timestamp
    pub fn update_at(&self, index: usize, temperature: f64, at: Timestamp) -> Result<f64> {
        if index >= SENSOR_COUNT {
            return Err(HeatmapError::InvalidSensorIndex(index));
        }

        let mut slots = self.lock();
        let slot = &mut slots[index];
        let smoothed = match slot.value {
            None => temperature,
            Some(previous) => self.alpha * temperature + (1.0 - self.alpha) * previous,
        };
        slot.value = Some(smoothed);
        slot.updated_at = Some(at);
        slot.samples += 1;
        Ok(smoothed)
    }

    /// Copy all four slots under a single lock acquisition
    pub fn snapshot(&self) -> Snapshot {
        Snapshot { slots: *self.lock() }
    }

    fn lock(&self) -> MutexGuard<'_, [SlotReading; SENSOR_COUNT]> {
        // Slots are plain values, so data behind a poisoned lock is still whole
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_first_update_is_taken_verbatim() {
        for alpha in [0.01, 0.3, 1.0] {
            let store = ReadingStore::new(alpha).unwrap();
            assert_eq!(store.update(2, 20.0).unwrap(), 20.0);
            assert_eq!(store.snapshot().value(2), Some(20.0));
        }
    }

    #[test]
    fn test_ema_update() {
        let store = ReadingStore::new(0.3).unwrap();
        store.update(1, 20.0).unwrap();
        let smoothed = store.update(1, 30.0).unwrap();
        assert_relative_eq!(smoothed, 23.0, epsilon = 1e-12);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.slots[1].samples, 2);
        assert_eq!(snapshot.value(0), None);
    }

    #[test]
    fn test_alpha_one_tracks_latest() {
        let store = ReadingStore::new(1.0).unwrap();
        store.update(0, 5.0).unwrap();
        assert_eq!(store.update(0, -7.5).unwrap(), -7.5);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(ReadingStore::new(0.0).is_err());
        assert!(ReadingStore::new(1.01).is_err());

        let store = ReadingStore::new(0.5).unwrap();
        assert!(matches!(
            store.update(4, 1.0),
            Err(HeatmapError::InvalidSensorIndex(4))
        ));
    }

    #[test]
    fn test_concurrent_updates_and_snapshots() {
        let store = Arc::new(ReadingStore::new(1.0).unwrap());

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..2000u32 {
                    for index in 0..SENSOR_COUNT {
                        store.update(index, f64::from(i)).unwrap();
                    }
                }
            })
        };

        for _ in 0..500 {
            let snapshot = store.snapshot();
            // Writer fills slots in index order, so later slots never lead
            let values = snapshot.values();
            for pair in values.windows(2) {
                if let (Some(a), Some(b)) = (pair[0], pair[1]) {
                    assert!(a >= b);
                }
            }
        }

        writer.join().unwrap();
        assert!(store.snapshot().is_ready());
        assert_eq!(store.snapshot().slots[3].samples, 2000);
    }
}
