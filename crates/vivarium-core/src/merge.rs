//! The merge engine.
//!
//! Applies a batch of new readings to the visible history and to every view
//! of it, evicting old entries under the retention policy.
//!
//! The eviction decision is made once per batch, before any insertion, from
//! the oldest reading visible at that moment. When it says "evict", one
//! oldest entry is removed from the table and from both chart series for
//! every reading inserted. This keeps the history bounded to roughly one
//! retention window regardless of batch size, at the cost of possibly
//! over- or under-evicting by one compared with re-deciding per reading.

use time::OffsetDateTime;
use tracing::debug;
use vivarium_types::SensorReading;

use crate::history::VisibleHistory;
use crate::retention::{RetentionWindow, should_evict};
use crate::view::{ChartPoint, ChartView, Series, TableView, Tile, TileBoard, TileValue};

/// What a merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Readings added to the history.
    pub inserted: usize,
    /// Readings evicted from the history.
    pub evicted: usize,
}

/// The once-per-batch eviction decision for the current history.
///
/// An empty history never evicts.
pub fn eviction_decision(
    history: &VisibleHistory,
    now: OffsetDateTime,
    window: RetentionWindow,
) -> bool {
    history
        .oldest()
        .is_some_and(|oldest| should_evict(oldest.timestamp, now, window))
}

/// Merge `batch` into `history` and `view`.
///
/// The batch may arrive in any order; it is applied oldest first. `evict`
/// is the decision from [`eviction_decision`], applied to every reading.
pub fn merge_batch<V>(
    history: &mut VisibleHistory,
    view: &mut V,
    mut batch: Vec<SensorReading>,
    evict: bool,
) -> MergeOutcome
where
    V: TableView + ChartView + ?Sized,
{
    let mut outcome = MergeOutcome::default();
    if batch.is_empty() {
        return outcome;
    }

    batch.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    for reading in batch {
        if evict && history.pop_oldest().is_some() {
            view.remove_oldest_row();
            for series in Series::ALL {
                view.remove_oldest_point(series);
            }
            outcome.evicted += 1;
        }

        let position = history.insert(reading.clone());
        // The table is newest first, so its index counts from the other end.
        let row_index = history.len() - 1 - position;
        view.insert_row(row_index, &reading);
        for series in Series::ALL {
            view.insert_point(series, position, ChartPoint::for_reading(series, &reading));
        }
        outcome.inserted += 1;
    }

    view.refresh();
    debug!(
        "Merged {} reading(s), evicted {}, {} visible",
        outcome.inserted,
        outcome.evicted,
        history.len()
    );
    outcome
}

/// Show the latest temperature and humidity from the newest reading in
/// `batch`. Independent of eviction; an empty batch leaves the tiles alone.
pub fn update_latest_tiles<V>(view: &mut V, batch: &[SensorReading])
where
    V: TileBoard + ?Sized,
{
    if let Some(latest) = batch.iter().max_by_key(|r| r.timestamp) {
        view.set_tile(
            Tile::Temperature,
            TileValue::text(format!("{}°C", latest.temperature)),
        );
        view.set_tile(
            Tile::Humidity,
            TileValue::text(format!("{}%", latest.humidity)),
        );
    }
}
