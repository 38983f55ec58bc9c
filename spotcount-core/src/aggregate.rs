use tracing::warn;

use crate::error::Result;
use crate::table::{
    Cell, FILENAME_COLUMN, ROI_AREA_COLUMN, ResultTable, count_column, normalized_column,
};

/// Start a row for one processed file.
///
/// The first call on an empty table declares every column, including the
/// two per channel, so the column set is fixed by the first file that was
/// actually processed rather than the first file discovered.
pub fn record(table: &mut ResultTable, channels: &[u32], filename: &str, roi_area: f64) -> Result<()> {
    if table.is_empty() {
        table.declare(FILENAME_COLUMN);
        table.declare(ROI_AREA_COLUMN);
        for &ch in channels {
            table.declare(count_column(ch));
            table.declare(normalized_column(ch));
        }
    }
    table.push(FILENAME_COLUMN, Cell::Text(filename.to_string()))?;
    table.push(ROI_AREA_COLUMN, Cell::Real(roi_area))?;
    Ok(())
}

/// Append the raw and area-normalized count of one channel to the current row.
pub fn record_channel(
    table: &mut ResultTable,
    channel: u32,
    raw_count: u64,
    roi_area: f64,
) -> Result<()> {
    table.push(&count_column(channel), Cell::Count(raw_count))?;
    table.push(&normalized_column(channel), normalize(channel, raw_count, roi_area))
}

fn normalize(channel: u32, raw_count: u64, roi_area: f64) -> Cell {
    if roi_area.is_finite() && roi_area > 0.0 {
        Cell::Real(raw_count as f64 / roi_area)
    } else {
        warn!(channel, roi_area, "ROI area is not positive; normalized count left empty");
        Cell::Empty
    }
}
