use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Form feed, the page separator emitted by `pdftotext` and friends.
pub const PAGE_BREAK: char = '\u{000C}';

/// A document loaded from disk, split into pages.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: String,
    pub pages: Vec<String>,
}

impl Document {
    pub fn from_text(source: impl Into<String>, content: &str) -> Self {
        let pages = content.split(PAGE_BREAK).map(str::to_string).collect();
        Self {
            source: source.into(),
            pages,
        }
    }

    /// Only documents that actually contain a page break get page numbers.
    pub fn is_paginated(&self) -> bool {
        self.pages.len() > 1
    }
}

pub struct FileReader;

impl FileReader {
    pub async fn read_file(path: &Path) -> Result<Document> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension {
            "txt" | "md" => {
                let content = fs::read_to_string(path)
                    .await
                    .context(format!("Failed to read file: {:?}", path))?;
                Ok(Document::from_text(path.to_string_lossy(), &content))
            }
            _ => anyhow::bail!("Unsupported file format: {}", extension),
        }
    }

    /// Read every supported file below `dir`, in a stable (sorted) order.
    pub async fn read_directory(dir: &Path) -> Result<Vec<Document>> {
        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| Self::is_supported(path))
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            documents.push(Self::read_file(&path).await?);
        }

        Ok(documents)
    }

    fn is_supported(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("txt") | Some("md")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_split() {
        let doc = Document::from_text("a.txt", "first page\u{000C}second page");
        assert!(doc.is_paginated());
        assert_eq!(doc.pages, vec!["first page", "second page"]);
    }

    #[tokio::test]
    async fn test_read_directory_skips_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "# Beta").unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::write(dir.path().join("c.pdf"), "binary").unwrap();

        let docs = FileReader::read_directory(dir.path()).await.unwrap();

        assert_eq!(docs.len(), 2);
        assert!(docs[0].source.ends_with("a.txt"));
        assert!(docs[1].source.ends_with("b.md"));
    }

    #[tokio::test]
    async fn test_unsupported_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.pptx");
        std::fs::write(&path, "x").unwrap();

        assert!(FileReader::read_file(&path).await.is_err());
    }
}
