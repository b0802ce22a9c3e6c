//! Mock report emitter and transformer for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::holds::{Branch, ReportRow};
use crate::report::{
    partition, EmitSummary, MarkupTransformer, PartitionOutput, ReportEmitter, ReportError,
    ReportKind,
};

/// A recorded emission for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedEmit {
    pub branch: Branch,
    pub rows: Vec<ReportRow>,
}

/// Mock implementation of the ReportEmitter trait.
///
/// Records what it was asked to write instead of touching the file system.
#[derive(Debug, Default)]
pub struct MockEmitter {
    emitted: Arc<RwLock<Vec<RecordedEmit>>>,
    failing_branches: Arc<RwLock<HashSet<String>>>,
}

impl MockEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make emission fail for the branch with this key.
    pub async fn fail_for(&self, branch_key: &str) {
        self.failing_branches
            .write()
            .await
            .insert(branch_key.to_string());
    }

    pub async fn emitted(&self) -> Vec<RecordedEmit> {
        self.emitted.read().await.clone()
    }

    /// Rows emitted for a branch, in emission order.
    pub async fn rows_for(&self, branch_key: &str) -> Option<Vec<ReportRow>> {
        self.emitted
            .read()
            .await
            .iter()
            .find(|e| e.branch.key == branch_key)
            .map(|e| e.rows.clone())
    }
}

#[async_trait]
impl ReportEmitter for MockEmitter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn emit(&self, branch: &Branch, rows: &[ReportRow]) -> Result<EmitSummary, ReportError> {
        if self.failing_branches.read().await.contains(&branch.key) {
            return Err(ReportError::io(
                PathBuf::from("/mock").join(&branch.name),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "injected failure"),
            ));
        }

        self.emitted.write().await.push(RecordedEmit {
            branch: branch.clone(),
            rows: rows.to_vec(),
        });

        let partitions = ReportKind::ALL
            .into_iter()
            .map(|kind| {
                let count = partition(rows, kind).len();
                PartitionOutput {
                    kind,
                    rows: count,
                    csv_path: PathBuf::from(format!("/mock/{}_{}.csv", branch.name, kind.csv_suffix())),
                    html_path: PathBuf::from(format!(
                        "/mock/{}/latest_{}.html",
                        branch.name,
                        kind.html_suffix()
                    )),
                    placeholder: count == 0,
                }
            })
            .collect();

        Ok(EmitSummary {
            branch: branch.name.clone(),
            partitions,
        })
    }
}

/// Transformer that returns the XML document unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyTransformer;

#[async_trait]
impl MarkupTransformer for CopyTransformer {
    fn name(&self) -> &str {
        "copy"
    }

    async fn transform(&self, _stylesheet: &Path, document: &Path) -> Result<Vec<u8>, ReportError> {
        tokio::fs::read(document)
            .await
            .map_err(|e| ReportError::io(document, e))
    }
}
