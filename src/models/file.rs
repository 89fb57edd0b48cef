//! File model for document uploads.

use std::path::Path;

use bytes::Bytes;

/// A document to send to the upload endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    /// File name reported in the multipart part (e.g., "lease.pdf")
    pub file_name: String,
    /// MIME type of the part
    pub mime_type: String,
    /// Raw file contents
    pub bytes: Bytes,
}

impl UploadFile {
    /// Create an upload, guessing the MIME type from the file name.
    pub fn new(file_name: impl Into<String>, bytes: Bytes) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_for(&file_name).to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Read a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, Bytes::from(bytes)))
    }

    /// Format file size for display (e.g., "1.2 KB", "3.4 MB")
    pub fn format_size(&self) -> String {
        let bytes = self.bytes.len();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
