//! Report output: per-branch CSV files and HTML paging lists.
//!
//! Rows are split into two partitions by hold type. Each partition gets a
//! CSV file and an HTML page rendered from an XML document by an XSLT
//! stylesheet. An empty partition gets a placeholder link instead of a page.

mod csv_file;
mod fs_emitter;
mod paging_list;
mod transform;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::holds::{Branch, HoldType, ReportRow};

pub use csv_file::{csv_path, render_csv, CSV_HEADER};
pub use fs_emitter::FsReportEmitter;
pub use paging_list::{format_timestamp, render_paging_list};
pub use transform::{MarkupTransformer, XsltprocTransformer};

/// Errors that can occur while writing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Transformer not found: {path}")]
    TransformerNotFound { path: PathBuf },

    #[error("Transform with {stylesheet} failed ({status}): {stderr}")]
    TransformFailed {
        stylesheet: PathBuf,
        status: String,
        stderr: String,
    },
}

impl ReportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// One of the two printed lists.
///
/// The names are inverted relative to the hold type: copy-level holds go to
/// the title list and title-level holds to the item list. Downstream
/// stylesheets and file names depend on this mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    TitleList,
    ItemList,
}

impl ReportKind {
    pub const ALL: [ReportKind; 2] = [ReportKind::TitleList, ReportKind::ItemList];

    pub fn for_hold_type(hold_type: HoldType) -> Self {
        match hold_type {
            HoldType::Copy => ReportKind::TitleList,
            HoldType::Title => ReportKind::ItemList,
        }
    }

    pub fn hold_type(&self) -> HoldType {
        match self {
            ReportKind::TitleList => HoldType::Copy,
            ReportKind::ItemList => HoldType::Title,
        }
    }

    /// Suffix of the CSV file name.
    pub fn csv_suffix(&self) -> &'static str {
        match self {
            ReportKind::TitleList => "Title",
            ReportKind::ItemList => "Items",
        }
    }

    /// Suffix of the HTML file names, also used as a metrics label.
    pub fn html_suffix(&self) -> &'static str {
        match self {
            ReportKind::TitleList => "title",
            ReportKind::ItemList => "item",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} list", self.html_suffix())
    }
}

/// Rows belonging to `kind`, in their current order.
pub fn partition(rows: &[ReportRow], kind: ReportKind) -> Vec<&ReportRow> {
    rows.iter()
        .filter(|r| ReportKind::for_hold_type(r.hold_type) == kind)
        .collect()
}

/// What was written for one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionOutput {
    pub kind: ReportKind,
    pub rows: usize,
    pub csv_path: PathBuf,
    pub html_path: PathBuf,
    /// True when `html_path` is a link to the "no list" page.
    pub placeholder: bool,
}

/// What was written for one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmitSummary {
    pub branch: String,
    pub partitions: Vec<PartitionOutput>,
}

impl EmitSummary {
    pub fn total_rows(&self) -> usize {
        self.partitions.iter().map(|p| p.rows).sum()
    }

    pub fn partition(&self, kind: ReportKind) -> Option<&PartitionOutput> {
        self.partitions.iter().find(|p| p.kind == kind)
    }
}

/// Writes a branch's reports.
#[async_trait]
pub trait ReportEmitter: Send + Sync {
    /// Returns the name of this emitter implementation.
    fn name(&self) -> &str;

    /// Write both partitions of `rows` for `branch`. Rows are already sorted.
    async fn emit(&self, branch: &Branch, rows: &[ReportRow]) -> Result<EmitSummary, ReportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::HoldSpec;

    #[test]
    fn test_hold_type_mapping_is_inverted() {
        assert_eq!(ReportKind::for_hold_type(HoldType::Copy), ReportKind::TitleList);
        assert_eq!(ReportKind::for_hold_type(HoldType::Title), ReportKind::ItemList);
        for kind in ReportKind::ALL {
            assert_eq!(ReportKind::for_hold_type(kind.hold_type()), kind);
        }
        assert_eq!(ReportKind::TitleList.csv_suffix(), "Title");
        assert_eq!(ReportKind::ItemList.csv_suffix(), "Items");
        assert_eq!(ReportKind::ItemList.html_suffix(), "item");
    }

    #[test]
    fn test_partitions_are_disjoint_and_cover_rows() {
        let rows = vec![
            HoldSpec::new("1", HoldType::Copy).row(),
            HoldSpec::new("2", HoldType::Title).row(),
            HoldSpec::new("3", HoldType::Copy).row(),
        ];
        let titles = partition(&rows, ReportKind::TitleList);
        let items = partition(&rows, ReportKind::ItemList);

        assert_eq!(titles.len() + items.len(), rows.len());
        assert_eq!(titles[0].barcode, "B1");
        assert_eq!(titles[1].barcode, "B3");
        assert_eq!(items[0].barcode, "B2");
    }
}
