use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::table::ResultTable;

#[derive(Clone, Copy, Debug)]
pub struct ReportOptions {
    pub delimiter: u8,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Write the table as delimited text: one header row of sorted labels,
/// then one row per processed file.
///
/// Returns `false` and touches nothing when the table has no columns.
pub fn write_report(table: &ResultTable, dest: &Path, opts: &ReportOptions) -> Result<bool> {
    if table.is_empty() {
        return Ok(false);
    }
    table.check_lockstep()?;

    let mut w = csv::WriterBuilder::new()
        .delimiter(opts.delimiter)
        .from_path(dest)?;
    w.write_record(table.header())?;
    for row in table.rows() {
        w.write_record(row.iter().map(|c| c.to_string()))?;
    }
    w.flush()?;
    info!(path = %dest.display(), rows = table.row_count(), "report written");
    Ok(true)
}
