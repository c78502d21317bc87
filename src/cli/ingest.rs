use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use docchat::{IngestDocumentUseCase, NewDocument};

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

#[derive(Debug, Default)]
pub struct IngestSummary {
    pub documents: usize,
    pub chunks: usize,
    pub embedded: usize,
    pub failed: usize,
}

/// `path` itself when it is a file, otherwise every supported file below it
/// that is not hidden or git-ignored, in path order.
pub fn collect_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkBuilder::new(path)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| mime_type(p).is_some())
        .collect();
    files.sort();
    files
}

pub fn mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    Some(if extension == "txt" {
        "text/plain"
    } else {
        "text/markdown"
    })
}

pub async fn ingest_path(
    use_case: &IngestDocumentUseCase,
    path: &Path,
    user_id: &str,
    file_type: Option<&str>,
) -> Result<IngestSummary> {
    let files = collect_files(path);
    if files.is_empty() {
        bail!("No .txt or .md files found at {}", path.display());
    }

    let progress_bar = ProgressBar::new(files.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );

    let single = files.len() == 1;
    let mut summary = IngestSummary::default();

    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string());
        progress_bar.set_message(name.clone());
        debug!("Ingesting file: {}", file.display());

        let outcome = async {
            let content = tokio::fs::read_to_string(&file).await?;
            let size = tokio::fs::metadata(&file).await?.len();
            let mime = file_type
                .or_else(|| mime_type(&file))
                .unwrap_or("text/plain");
            let upload = NewDocument::new(name.clone(), content)
                .with_file_type(mime)
                .with_file_size(size);
            Ok::<_, anyhow::Error>(use_case.execute(upload, user_id).await?)
        }
        .await;

        match outcome {
            Ok(report) => {
                summary.documents += 1;
                summary.chunks += report.chunks_created;
                summary.embedded += report.embedded_chunks;
                progress_bar.println(format!("  {} -> {}", name, report.document.id()));
            }
            Err(e) if single => {
                progress_bar.finish_and_clear();
                return Err(e);
            }
            Err(e) => {
                warn!("Failed to ingest {}: {}", file.display(), e);
                summary.failed += 1;
            }
        }
        progress_bar.inc(1);
    }

    progress_bar.finish_with_message("done");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_collect_files_keeps_supported_extensions() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "# B").unwrap();
        std::fs::write(dir.path().join("a.txt"), "A.").unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.TXT"), "C.").unwrap();

        let files = collect_files(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.txt", "b.md", "c.TXT"]);
    }

    #[test]
    fn test_single_file_is_taken_as_is() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "Hello.").unwrap();

        assert_eq!(collect_files(&file), vec![file]);
    }

    #[test]
    fn test_mime_type_by_extension() {
        assert_eq!(mime_type(Path::new("x.txt")), Some("text/plain"));
        assert_eq!(mime_type(Path::new("x.md")), Some("text/markdown"));
        assert_eq!(mime_type(Path::new("x.pdf")), None);
        assert_eq!(mime_type(Path::new("Makefile")), None);
    }
}
