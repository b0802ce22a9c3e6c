//! File system report emitter.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::{debug, info};

use crate::config::ReportConfig;
use crate::holds::{Branch, ReportRow};
use crate::metrics;

use super::csv_file::{csv_path, render_csv};
use super::paging_list::{format_timestamp, render_paging_list};
use super::transform::MarkupTransformer;
use super::{partition, EmitSummary, PartitionOutput, ReportEmitter, ReportError, ReportKind};

/// Writes CSV files and HTML paging lists to local directories.
pub struct FsReportEmitter {
    config: ReportConfig,
    transformer: Arc<dyn MarkupTransformer>,
}

impl FsReportEmitter {
    pub fn new(config: ReportConfig, transformer: Arc<dyn MarkupTransformer>) -> Self {
        Self {
            config,
            transformer,
        }
    }

    fn stylesheet(&self, kind: ReportKind) -> &Path {
        match kind {
            ReportKind::TitleList => &self.config.xsl_title,
            ReportKind::ItemList => &self.config.xsl_item,
        }
    }

    /// `<html_dir>/<BranchName>/latest_<title|item>.html`
    pub fn html_path(&self, branch: &Branch, kind: ReportKind) -> PathBuf {
        self.config
            .html_dir
            .join(&branch.name)
            .join(format!("latest_{}.html", kind.html_suffix()))
    }

    /// `<html_dir>/no_<title|item>_list.html`
    pub fn placeholder_path(&self, kind: ReportKind) -> PathBuf {
        self.config
            .html_dir
            .join(format!("no_{}_list.html", kind.html_suffix()))
    }

    async fn write_csv(
        &self,
        branch: &Branch,
        kind: ReportKind,
        rows: &[&ReportRow],
    ) -> Result<PathBuf, ReportError> {
        let path = csv_path(&self.config.csv_dir, &branch.name, kind);
        fs::create_dir_all(&self.config.csv_dir)
            .await
            .map_err(|e| ReportError::io(&self.config.csv_dir, e))?;

        let bytes = render_csv(rows)?;
        fs::write(&path, bytes)
            .await
            .map_err(|e| ReportError::io(&path, e))?;

        debug!(path = %path.display(), rows = rows.len(), "CSV written");
        Ok(path)
    }

    /// Returns the HTML path and whether it is a placeholder link.
    async fn write_html(
        &self,
        branch: &Branch,
        kind: ReportKind,
        rows: &[&ReportRow],
        timestamp: &str,
    ) -> Result<(PathBuf, bool), ReportError> {
        let html_path = self.html_path(branch, kind);
        if let Some(dir) = html_path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| ReportError::io(dir, e))?;
        }
        remove_if_present(&html_path).await?;

        if rows.is_empty() {
            let target = self.placeholder_path(kind);
            link_placeholder(&target, &html_path).await?;
            debug!(path = %html_path.display(), target = %target.display(), "Linked placeholder page");
            return Ok((html_path, true));
        }

        let xml = render_paging_list(&branch.name, timestamp, rows)?;

        // Removed on drop, after the transform has read it.
        let document = tempfile::Builder::new()
            .prefix("paging_list")
            .suffix(".xml")
            .tempfile()
            .map_err(|e| ReportError::io(std::env::temp_dir(), e))?;
        fs::write(document.path(), xml)
            .await
            .map_err(|e| ReportError::io(document.path(), e))?;

        let html = self
            .transformer
            .transform(self.stylesheet(kind), document.path())
            .await?;
        fs::write(&html_path, html)
            .await
            .map_err(|e| ReportError::io(&html_path, e))?;

        debug!(path = %html_path.display(), rows = rows.len(), "HTML written");
        Ok((html_path, false))
    }
}

async fn remove_if_present(path: &Path) -> Result<(), ReportError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ReportError::io(path, e)),
    }
}

#[cfg(unix)]
async fn link_placeholder(target: &Path, link: &Path) -> Result<(), ReportError> {
    fs::symlink(target, link)
        .await
        .map_err(|e| ReportError::io(link, e))
}

#[cfg(not(unix))]
async fn link_placeholder(target: &Path, link: &Path) -> Result<(), ReportError> {
    fs::copy(target, link)
        .await
        .map(|_| ())
        .map_err(|e| ReportError::io(link, e))
}

#[async_trait]
impl ReportEmitter for FsReportEmitter {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn emit(&self, branch: &Branch, rows: &[ReportRow]) -> Result<EmitSummary, ReportError> {
        let timestamp = format_timestamp(Utc::now(), self.config.utc_offset_minutes);
        let mut partitions = Vec::with_capacity(ReportKind::ALL.len());

        for kind in ReportKind::ALL {
            let selected = partition(rows, kind);
            let csv_path = self.write_csv(branch, kind, &selected).await?;
            let (html_path, placeholder) = self.write_html(branch, kind, &selected, &timestamp).await?;

            metrics::ROWS_WRITTEN
                .with_label_values(&[&branch.name, kind.html_suffix()])
                .inc_by(selected.len() as u64);

            info!(
                branch = %branch.key,
                report = %kind,
                rows = selected.len(),
                placeholder = placeholder,
                "Report written"
            );

            partitions.push(PartitionOutput {
                kind,
                rows: selected.len(),
                csv_path,
                html_path,
                placeholder,
            });
        }

        Ok(EmitSummary {
            branch: branch.name.clone(),
            partitions,
        })
    }
}
