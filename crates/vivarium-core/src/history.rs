//! The visible history model.

use std::collections::VecDeque;

use vivarium_types::SensorReading;

/// Readings currently rendered, oldest first.
///
/// This is the model behind the table and the charts. It is only changed by
/// the merge engine, which applies every change to the views in the same
/// step so that all of them hold the same set of readings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleHistory {
    readings: VecDeque<SensorReading>,
}

impl VisibleHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of visible readings.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// The oldest visible reading (last table row, first chart point).
    pub fn oldest(&self) -> Option<&SensorReading> {
        self.readings.front()
    }

    /// The newest visible reading (first table row, last chart point).
    pub fn newest(&self) -> Option<&SensorReading> {
        self.readings.back()
    }

    /// Readings oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SensorReading> {
        self.readings.iter()
    }

    /// Insert a reading at its timestamp position and return that position
    /// counted from the oldest end. Equal timestamps keep arrival order.
    pub(crate) fn insert(&mut self, reading: SensorReading) -> usize {
        let position = self
            .readings
            .partition_point(|r| r.timestamp <= reading.timestamp);
        self.readings.insert(position, reading);
        position
    }

    /// Drop the oldest reading.
    pub(crate) fn pop_oldest(&mut self) -> Option<SensorReading> {
        self.readings.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_insert_keeps_timestamp_order() {
        let mut history = VisibleHistory::new();
        let base = datetime!(2024-05-01 12:00 UTC);

        assert_eq!(history.insert(SensorReading::new(base, 1.0, 1.0)), 0);
        assert_eq!(
            history.insert(SensorReading::new(base + time::Duration::minutes(10), 3.0, 3.0)),
            1
        );
        // Late arrival lands between the two.
        assert_eq!(
            history.insert(SensorReading::new(base + time::Duration::minutes(5), 2.0, 2.0)),
            1
        );

        let temps: Vec<f64> = history.iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![1.0, 2.0, 3.0]);
        assert_eq!(history.oldest().unwrap().temperature, 1.0);
        assert_eq!(history.newest().unwrap().temperature, 3.0);
    }

    #[test]
    fn test_equal_timestamps_append_after() {
        let mut history = VisibleHistory::new();
        let ts = datetime!(2024-05-01 12:00 UTC);
        history.insert(SensorReading::new(ts, 1.0, 1.0));
        assert_eq!(history.insert(SensorReading::new(ts, 2.0, 2.0)), 1);
    }

    #[test]
    fn test_pop_oldest_on_empty() {
        let mut history = VisibleHistory::new();
        assert!(history.pop_oldest().is_none());
        assert!(history.is_empty());
    }
}
