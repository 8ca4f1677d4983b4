use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;

use super::reading::Reading;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Fixed-capacity buffer of one device's recent readings, oldest evicted first.
#[derive(Debug)]
pub struct HistoryWindow {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl HistoryWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, reading: Reading) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    /// Up to `n` most recent readings, most recent last.
    pub fn recent(&self, n: usize) -> Vec<&Reading> {
        let skip = self.readings.len().saturating_sub(n);
        self.readings.iter().skip(skip).collect()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

pub type SharedWindow = Arc<Mutex<HistoryWindow>>;

/// Per-device history windows. Each window sits behind its own lock so one
/// device's pipeline never waits on another's.
#[derive(Debug)]
pub struct HistoryStore {
    windows: Mutex<HashMap<String, SharedWindow>>,
    capacity: usize,
}

impl HistoryStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Returns the device's window, creating it on first use.
    pub async fn window(&self, device_id: &str) -> SharedWindow {
        let mut windows = self.windows.lock().await;
        windows
            .entry(device_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(HistoryWindow::with_capacity(self.capacity))))
            .clone()
    }

    pub async fn record(&self, device_id: &str, reading: Reading) {
        let window = self.window(device_id).await;
        window.lock().await.push(reading);
    }

    pub async fn recent(&self, device_id: &str, n: usize) -> Vec<Reading> {
        let window = {
            let windows = self.windows.lock().await;
            windows.get(device_id).cloned()
        };

        match window {
            Some(window) => window.lock().await.recent(n).into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub async fn device_count(&self) -> usize {
        self.windows.lock().await.len()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryStore, HistoryWindow};
    use crate::detector::reading::reading_at;

    #[test]
    fn window_keeps_capacity_by_dropping_oldest() {
        let mut window = HistoryWindow::with_capacity(3);
        for tick in 0..5 {
            window.push(reading_at("pump-01", tick, &[("pressure", tick as f64)]));
        }

        assert_eq!(window.len(), 3);
        let pressures: Vec<_> = window
            .recent(10)
            .iter()
            .filter_map(|reading| reading.metric("pressure"))
            .collect();
        assert_eq!(pressures, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn recent_returns_tail_most_recent_last() {
        let mut window = HistoryWindow::with_capacity(20);
        for tick in 0..6 {
            window.push(reading_at("pump-01", tick, &[("pressure", tick as f64)]));
        }

        let tail = window.recent(2);
        assert_eq!(tail.len(), 2);
        assert!(tail[0].received_at() < tail[1].received_at());
        assert_eq!(tail[1].metric("pressure"), Some(5.0));
    }

    #[tokio::test]
    async fn store_evicts_oldest_after_capacity() {
        let store = HistoryStore::with_capacity(20);
        for tick in 0..25 {
            store
                .record("pump-01", reading_at("pump-01", tick, &[("pressure", tick as f64)]))
                .await;
        }

        let recent = store.recent("pump-01", 20).await;
        assert_eq!(recent.len(), 20);
        let pressures: Vec<_> = recent
            .iter()
            .filter_map(|reading| reading.metric("pressure"))
            .collect();
        let expected: Vec<_> = (5..25).map(|tick| tick as f64).collect();
        assert_eq!(pressures, expected);
    }

    #[tokio::test]
    async fn windows_are_per_device_and_created_lazily() {
        let store = HistoryStore::default();
        assert!(store.recent("pump-01", 5).await.is_empty());
        assert_eq!(store.device_count().await, 0);

        store
            .record("pump-01", reading_at("pump-01", 0, &[("pressure", 60.0)]))
            .await;
        store
            .record("pump-02", reading_at("pump-02", 0, &[("pressure", 70.0)]))
            .await;

        assert_eq!(store.device_count().await, 2);
        let pump_two = store.recent("pump-02", 5).await;
        assert_eq!(pump_two.len(), 1);
        assert_eq!(pump_two[0].device_id(), "pump-02");
    }
}
