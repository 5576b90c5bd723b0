//! Terminal rendering of the dashboard.
//!
//! [`TerminalDashboard`] keeps the full dashboard in a [`MemoryDashboard`]
//! and echoes changes as lines: every inserted reading, and every tile whose
//! value actually changed. Latest temperature and humidity tiles are not
//! echoed since the reading lines already show them. Echo can be switched
//! off for one-shot commands that print their own result.

use std::io::Write;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use vivarium_core::{
    ChartPoint, ChartView, MemoryDashboard, Navigator, Series, TableRow, TableView, Tile,
    TileBoard, TileValue,
};
use vivarium_types::SensorReading;

use crate::style;

/// A dashboard that prints its changes to `W`.
pub struct TerminalDashboard<W> {
    inner: MemoryDashboard,
    out: W,
    no_color: bool,
    echo: bool,
}

impl<W: Write> TerminalDashboard<W> {
    /// A dashboard writing to `out`.
    pub fn new(out: W, no_color: bool) -> Self {
        Self {
            inner: MemoryDashboard::new(),
            out,
            no_color,
            echo: true,
        }
    }

    /// Stop or resume echoing changes.
    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// The rendered state.
    pub fn state(&self) -> &MemoryDashboard {
        &self.inner
    }

    /// Print the table header.
    pub fn print_header(&mut self) {
        let header = style::table_header(self.no_color);
        self.emit(&header);
    }

    /// The writer, for inspection.
    pub fn output(&self) -> &W {
        &self.out
    }

    fn tile_line(&self, tile: &Tile, value: &TileValue) -> String {
        let rendered = match tile {
            Tile::Device(_) => style::device_state(&value.text, self.no_color),
            _ => style::tile_value(value, self.no_color),
        };
        style::labelled(&tile.to_string(), &rendered, self.no_color)
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line) {
            debug!("Failed to write dashboard line: {}", e);
        }
    }
}

impl<W: Write> TableView for TerminalDashboard<W> {
    fn insert_row(&mut self, index: usize, reading: &SensorReading) {
        self.inner.insert_row(index, reading);
        if self.echo {
            let line = style::table_row(&TableRow::from(reading), self.no_color);
            self.emit(&line);
        }
    }

    fn remove_oldest_row(&mut self) {
        self.inner.remove_oldest_row();
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }
}

impl<W: Write> ChartView for TerminalDashboard<W> {
    fn insert_point(&mut self, series: Series, index: usize, point: ChartPoint) {
        self.inner.insert_point(series, index, point);
    }

    fn remove_oldest_point(&mut self, series: Series) {
        self.inner.remove_oldest_point(series);
    }

    fn point_count(&self, series: Series) -> usize {
        self.inner.point_count(series)
    }

    fn refresh(&mut self) {
        self.inner.refresh();
        if let Err(e) = self.out.flush() {
            debug!("Failed to flush dashboard output: {}", e);
        }
    }
}

impl<W: Write> TileBoard for TerminalDashboard<W> {
    fn set_tile(&mut self, tile: Tile, value: TileValue) {
        let changed = self.inner.tile(&tile) != Some(&value);
        let echo = self.echo && changed && !matches!(tile, Tile::Temperature | Tile::Humidity);
        let line = echo.then(|| self.tile_line(&tile, &value));
        self.inner.set_tile(tile, value);
        if let Some(line) = line {
            self.emit(&line);
        }
    }
}

/// Ends the terminal session when the backend session expires.
#[derive(Debug, Clone)]
pub struct TerminalNavigator {
    shutdown: CancellationToken,
}

impl TerminalNavigator {
    /// A navigator that cancels `shutdown` on expiry.
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }
}

impl Navigator for TerminalNavigator {
    fn to_login(&self) {
        error!("Session expired. Log in through the web dashboard and update the session cookie.");
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use vivarium_core::TileStyle;
    use vivarium_types::DeviceId;

    fn dashboard() -> TerminalDashboard<Vec<u8>> {
        TerminalDashboard::new(Vec::new(), true)
    }

    fn printed(dashboard: &TerminalDashboard<Vec<u8>>) -> Vec<String> {
        String::from_utf8(dashboard.output().clone())
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_rows_are_echoed_and_stored() {
        let mut dashboard = dashboard();
        let reading = SensorReading::new(datetime!(2024-05-01 12:00 UTC), 25.0, 60.0);
        dashboard.insert_row(0, &reading);

        assert_eq!(dashboard.row_count(), 1);
        let lines = printed(&dashboard);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("2024-05-01 12:00:00"));
    }

    #[test]
    fn test_echo_can_be_disabled() {
        let mut dashboard = dashboard();
        dashboard.set_echo(false);
        let reading = SensorReading::new(datetime!(2024-05-01 12:00 UTC), 25.0, 60.0);
        dashboard.insert_row(0, &reading);
        dashboard.set_tile(Tile::Backend, TileValue::text("Running"));
        assert_eq!(dashboard.row_count(), 1);
        assert!(printed(&dashboard).is_empty());
    }

    #[test]
    fn test_only_changed_tiles_are_echoed() {
        let mut dashboard = dashboard();
        let pump = Tile::Device(DeviceId::new("pump").unwrap());

        dashboard.set_tile(pump.clone(), TileValue::text("On"));
        dashboard.set_tile(pump.clone(), TileValue::text("On"));
        dashboard.set_tile(Tile::Temperature, TileValue::text("25°C"));
        dashboard.set_tile(Tile::Backend, TileValue::styled("Running", TileStyle::Ok));
        dashboard.set_tile(pump, TileValue::text("Off"));

        assert_eq!(
            printed(&dashboard),
            vec!["pump: On", "backend: Running", "pump: Off"]
        );
        assert_eq!(
            dashboard.state().tile(&Tile::Temperature).unwrap().text,
            "25°C"
        );
    }

    #[test]
    fn test_header() {
        let mut dashboard = dashboard();
        dashboard.print_header();
        assert!(printed(&dashboard)[0].starts_with("Time"));
    }

    #[test]
    fn test_navigator_cancels_shutdown() {
        let token = CancellationToken::new();
        TerminalNavigator::new(token.clone()).to_login();
        assert!(token.is_cancelled());
    }
}
