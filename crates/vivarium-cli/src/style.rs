//! Visual styling for terminal output.

use owo_colors::OwoColorize;
use vivarium_core::{TableRow, TileStyle, TileValue};

/// Width of the timestamp column.
const LABEL_WIDTH: usize = 19;

/// Render a tile value, colored by its style.
pub fn tile_value(value: &TileValue, no_color: bool) -> String {
    if no_color {
        return value.text.clone();
    }
    match value.style {
        TileStyle::Neutral => value.text.clone(),
        TileStyle::Ok => value.text.green().to_string(),
        TileStyle::Alert => value.text.red().bold().to_string(),
    }
}

/// Render a device state, green when on.
pub fn device_state(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else if text == "On" {
        text.green().bold().to_string()
    } else {
        text.dimmed().to_string()
    }
}

/// Render a table row as one line.
pub fn table_row(row: &TableRow, no_color: bool) -> String {
    let label = format!("{:<width$}", row.label, width = LABEL_WIDTH);
    let temperature = format!("{:>6.1}°C", row.temperature);
    let humidity = format!("{:>5.1}%", row.humidity);
    let mut line = if no_color {
        format!("{}  {}  {}", label, temperature, humidity)
    } else {
        format!(
            "{}  {}  {}",
            label.dimmed(),
            temperature.yellow(),
            humidity.cyan()
        )
    };
    if !row.comments.is_empty() {
        line.push_str("  ");
        line.push_str(&row.comments);
    }
    line
}

/// Header line for the readings table.
pub fn table_header(no_color: bool) -> String {
    let header = format!(
        "{:<width$}  {:>8}  {:>6}",
        "Time",
        "Temp",
        "RH",
        width = LABEL_WIDTH
    );
    if no_color {
        header
    } else {
        header.bold().to_string()
    }
}

/// A short "label: value" line.
pub fn labelled(label: &str, value: &str, no_color: bool) -> String {
    if no_color {
        format!("{}: {}", label, value)
    } else {
        format!("{}: {}", label.bold(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(comments: &str) -> TableRow {
        TableRow {
            label: "2024-05-01 12:00:00".to_string(),
            temperature: 24.3,
            humidity: 61.0,
            comments: comments.to_string(),
        }
    }

    #[test]
    fn test_plain_row() {
        assert_eq!(
            table_row(&row(""), true),
            "2024-05-01 12:00:00    24.3°C   61.0%"
        );
        assert!(table_row(&row("misted"), true).ends_with("  misted"));
    }

    #[test]
    fn test_plain_tile_has_no_escapes() {
        let value = TileValue::styled("Stopped", TileStyle::Alert);
        assert_eq!(tile_value(&value, true), "Stopped");
        assert!(tile_value(&value, false).contains('\u{1b}'));
    }

    #[test]
    fn test_labelled_plain() {
        assert_eq!(labelled("pump", "On", true), "pump: On");
    }
}
