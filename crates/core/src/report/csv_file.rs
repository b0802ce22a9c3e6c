//! CSV rendering.

use std::path::{Path, PathBuf};

use crate::holds::ReportRow;

use super::ReportKind;

pub const CSV_HEADER: [&str; 6] = ["BARCODE", "TITLE", "AUTHOR", "CALL #", "VOLUME", "LOCATION"];

/// `<dir>/<BranchName>_<Title|Items>.csv`
pub fn csv_path(dir: &Path, branch_name: &str, kind: ReportKind) -> PathBuf {
    dir.join(format!("{}_{}.csv", branch_name, kind.csv_suffix()))
}

/// Render rows as CSV. The header is always present.
pub fn render_csv(rows: &[&ReportRow]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record([
            row.barcode.as_str(),
            row.title.as_str(),
            row.author.as_str(),
            row.call_number.as_str(),
            row.volume.as_str(),
            row.current_location.as_str(),
        ])?;
    }
    writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}
