//! XML-to-HTML transformation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::ReportError;

/// Turns a paging-list XML document into HTML.
#[async_trait]
pub trait MarkupTransformer: Send + Sync {
    fn name(&self) -> &str;

    /// Apply `stylesheet` to the document at `document`, returning the output.
    async fn transform(&self, stylesheet: &Path, document: &Path) -> Result<Vec<u8>, ReportError>;
}

/// Runs `xsltproc <stylesheet> <document>` and captures stdout.
pub struct XsltprocTransformer {
    program: PathBuf,
}

impl XsltprocTransformer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for XsltprocTransformer {
    fn default() -> Self {
        Self::new("xsltproc")
    }
}

#[async_trait]
impl MarkupTransformer for XsltprocTransformer {
    fn name(&self) -> &str {
        "xsltproc"
    }

    async fn transform(&self, stylesheet: &Path, document: &Path) -> Result<Vec<u8>, ReportError> {
        debug!(
            program = %self.program.display(),
            stylesheet = %stylesheet.display(),
            document = %document.display(),
            "Running XSLT transform"
        );

        let output = Command::new(&self.program)
            .arg(stylesheet)
            .arg(document)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ReportError::TransformerNotFound {
                        path: self.program.clone(),
                    }
                } else {
                    ReportError::io(&self.program, e)
                }
            })?;

        if !output.status.success() {
            return Err(ReportError::TransformFailed {
                stylesheet: stylesheet.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program() {
        let transformer = XsltprocTransformer::new("/nonexistent/xsltproc-for-tests");
        let result = transformer
            .transform(Path::new("a.xsl"), Path::new("b.xml"))
            .await;
        assert!(matches!(result, Err(ReportError::TransformerNotFound { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_captured() {
        // `cat` ignores the stylesheet semantics but shows argument order and capture.
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        std::fs::write(&first, "A").unwrap();
        std::fs::write(&second, "B").unwrap();

        let transformer = XsltprocTransformer::new("cat");
        let output = transformer.transform(&first, &second).await.unwrap();
        assert_eq!(output, b"AB");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_reports_status() {
        let transformer = XsltprocTransformer::new("false");
        let result = transformer
            .transform(Path::new("a.xsl"), Path::new("b.xml"))
            .await;
        assert!(matches!(result, Err(ReportError::TransformFailed { .. })));
    }
}
