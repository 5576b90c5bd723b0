//! Presentation boundary consumed by the sync engine.
//!
//! The engine never renders anything itself. It drives three kinds of view:
//!
//! - a [`TableView`] of readings, newest row first,
//! - a [`ChartView`] with one oldest-to-newest point series per
//!   [`Series`],
//! - a [`TileBoard`] of labelled tiles (latest values, backend liveness,
//!   device controls).
//!
//! [`MemoryDashboard`] implements all three in memory. It backs the tests
//! and the terminal front end.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use time::OffsetDateTime;
use vivarium_types::{DeviceId, SensorReading};

/// A table of readings keyed by row index, row 0 being the newest.
pub trait TableView {
    /// Insert a row for `reading` at `index`.
    fn insert_row(&mut self, index: usize, reading: &SensorReading);
    /// Remove the oldest (last) row. No-op on an empty table.
    fn remove_oldest_row(&mut self);
    /// Number of rows.
    fn row_count(&self) -> usize;
}

/// The two time series drawn by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Series {
    /// Temperature in °C.
    Temperature,
    /// Relative humidity in %.
    Humidity,
}

impl Series {
    /// Both series, in drawing order.
    pub const ALL: [Series; 2] = [Series::Temperature, Series::Humidity];

    /// The value this series plots for a reading.
    pub fn value_of(self, reading: &SensorReading) -> f64 {
        match self {
            Series::Temperature => reading.temperature,
            Series::Humidity => reading.humidity,
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Series::Temperature => write!(f, "Temperature (°C)"),
            Series::Humidity => write!(f, "Humidity (%)"),
        }
    }
}

/// One chart point.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    /// X axis: when the reading was recorded.
    pub at: OffsetDateTime,
    /// Y axis: the plotted value.
    pub value: f64,
}

impl ChartPoint {
    /// The point `series` plots for `reading`.
    pub fn for_reading(series: Series, reading: &SensorReading) -> Self {
        Self {
            at: reading.timestamp,
            value: series.value_of(reading),
        }
    }
}

/// Charts keyed by series, each ordered oldest point first.
pub trait ChartView {
    /// Insert `point` at `index` of `series`.
    fn insert_point(&mut self, series: Series, index: usize, point: ChartPoint);
    /// Remove the oldest (first) point of `series`. No-op when empty.
    fn remove_oldest_point(&mut self, series: Series);
    /// Number of points in `series`.
    fn point_count(&self, series: Series) -> usize;
    /// Redraw after a batch of changes.
    fn refresh(&mut self) {}
}

/// A labelled tile on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tile {
    /// Latest temperature.
    Temperature,
    /// Latest humidity.
    Humidity,
    /// Whether the backend controller process is running.
    Backend,
    /// Status line for settings submissions.
    Status,
    /// The on/off control of a device.
    Device(DeviceId),
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tile::Temperature => write!(f, "temperature"),
            Tile::Humidity => write!(f, "humidity"),
            Tile::Backend => write!(f, "backend"),
            Tile::Status => write!(f, "status"),
            Tile::Device(id) => write!(f, "{}", id),
        }
    }
}

/// Visual emphasis of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileStyle {
    /// No emphasis.
    #[default]
    Neutral,
    /// Healthy (green).
    Ok,
    /// Needs attention (red).
    Alert,
}

/// Text and style shown on a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileValue {
    /// Displayed text.
    pub text: String,
    /// Emphasis.
    pub style: TileStyle,
}

impl TileValue {
    /// A neutral tile value.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TileStyle::Neutral,
        }
    }

    /// A tile value with an explicit style.
    pub fn styled(text: impl Into<String>, style: TileStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// A set of tiles, each holding a single settable value.
pub trait TileBoard {
    /// Replace the value shown on `tile`.
    fn set_tile(&mut self, tile: Tile, value: TileValue);
}

/// Everything the engine drives. Blanket-implemented.
pub trait DashboardView: TableView + ChartView + TileBoard + Send {}

impl<V: TableView + ChartView + TileBoard + Send> DashboardView for V {}

/// A rendered table row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Timestamp label, fraction dropped.
    pub label: String,
    /// Temperature cell.
    pub temperature: f64,
    /// Humidity cell.
    pub humidity: f64,
    /// Comments cell.
    pub comments: String,
}

impl From<&SensorReading> for TableRow {
    fn from(reading: &SensorReading) -> Self {
        Self {
            label: reading.label(),
            temperature: reading.temperature,
            humidity: reading.humidity,
            comments: reading.comments.clone(),
        }
    }
}

/// In-memory dashboard.
#[derive(Debug, Clone, Default)]
pub struct MemoryDashboard {
    rows: VecDeque<TableRow>,
    temperature: VecDeque<ChartPoint>,
    humidity: VecDeque<ChartPoint>,
    tiles: BTreeMap<Tile, TileValue>,
    refreshes: u64,
}

impl MemoryDashboard {
    /// An empty dashboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table rows, newest first.
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter()
    }

    /// Points of `series`, oldest first.
    pub fn points(&self, series: Series) -> impl Iterator<Item = &ChartPoint> {
        self.series(series).iter()
    }

    /// Current value of `tile`, if it was ever set.
    pub fn tile(&self, tile: &Tile) -> Option<&TileValue> {
        self.tiles.get(tile)
    }

    /// All tiles that have been set.
    pub fn tiles(&self) -> impl Iterator<Item = (&Tile, &TileValue)> {
        self.tiles.iter()
    }

    /// How many times the charts were redrawn.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    fn series(&self, series: Series) -> &VecDeque<ChartPoint> {
        match series {
            Series::Temperature => &self.temperature,
            Series::Humidity => &self.humidity,
        }
    }

    fn series_mut(&mut self, series: Series) -> &mut VecDeque<ChartPoint> {
        match series {
            Series::Temperature => &mut self.temperature,
            Series::Humidity => &mut self.humidity,
        }
    }
}

impl TableView for MemoryDashboard {
    fn insert_row(&mut self, index: usize, reading: &SensorReading) {
        let index = index.min(self.rows.len());
        self.rows.insert(index, TableRow::from(reading));
    }

    fn remove_oldest_row(&mut self) {
        self.rows.pop_back();
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl ChartView for MemoryDashboard {
    fn insert_point(&mut self, series: Series, index: usize, point: ChartPoint) {
        let points = self.series_mut(series);
        let index = index.min(points.len());
        points.insert(index, point);
    }

    fn remove_oldest_point(&mut self, series: Series) {
        self.series_mut(series).pop_front();
    }

    fn point_count(&self, series: Series) -> usize {
        self.series(series).len()
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }
}

impl TileBoard for MemoryDashboard {
    fn set_tile(&mut self, tile: Tile, value: TileValue) {
        self.tiles.insert(tile, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn reading(minute: u8) -> SensorReading {
        let ts = datetime!(2024-05-01 12:00 UTC) + time::Duration::minutes(i64::from(minute));
        SensorReading::new(ts, 20.0 + f64::from(minute), 50.0)
    }

    #[test]
    fn test_table_inserts_and_removes_oldest() {
        let mut view = MemoryDashboard::new();
        view.insert_row(0, &reading(1));
        view.insert_row(0, &reading(2));
        assert_eq!(view.row_count(), 2);
        assert_eq!(view.rows().next().unwrap().label, "2024-05-01 12:02:00");

        view.remove_oldest_row();
        assert_eq!(view.row_count(), 1);
        assert_eq!(view.rows().next().unwrap().label, "2024-05-01 12:02:00");

        view.remove_oldest_row();
        view.remove_oldest_row();
        assert_eq!(view.row_count(), 0);
    }

    #[test]
    fn test_chart_series_are_independent() {
        let mut view = MemoryDashboard::new();
        let r = reading(3);
        view.insert_point(Series::Temperature, 0, ChartPoint::for_reading(Series::Temperature, &r));
        assert_eq!(view.point_count(Series::Temperature), 1);
        assert_eq!(view.point_count(Series::Humidity), 0);
        assert!((view.points(Series::Temperature).next().unwrap().value - 23.0).abs() < 1e-9);

        view.remove_oldest_point(Series::Humidity);
        assert_eq!(view.point_count(Series::Temperature), 1);
    }

    #[test]
    fn test_out_of_range_index_appends() {
        let mut view = MemoryDashboard::new();
        view.insert_row(10, &reading(1));
        assert_eq!(view.row_count(), 1);
    }

    #[test]
    fn test_tiles_overwrite() {
        let mut view = MemoryDashboard::new();
        view.set_tile(Tile::Backend, TileValue::styled("Running", TileStyle::Ok));
        view.set_tile(Tile::Backend, TileValue::styled("Stopped", TileStyle::Alert));
        let tile = view.tile(&Tile::Backend).unwrap();
        assert_eq!(tile.text, "Stopped");
        assert_eq!(tile.style, TileStyle::Alert);
        assert!(view.tile(&Tile::Temperature).is_none());
    }
}
