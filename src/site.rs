//! Input discovery and output placement for documentation sources

use std::path::{Path, PathBuf};

use crate::config::HighlightConfig;
use crate::error::PageError;
use crate::markdown::{markdown_to_page, page_title, PageStyle};
use crate::page::Page;

/// Kind of documentation source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Html,
    Markdown,
}

impl SourceKind {
    /// Classify by file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(SourceKind::Html),
            "md" | "markdown" => Some(SourceKind::Markdown),
            _ => None,
        }
    }
}

/// One source file selected for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// Path relative to the argument it was found under, used with `--out-dir`
    pub relative: PathBuf,
    pub kind: SourceKind,
}

/// Expand files and directories into a sorted list of sources
///
/// Directories are walked recursively; hidden entries are skipped. Files given
/// explicitly must have a known extension.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>, PageError> {
    let mut inputs = Vec::new();

    for path in paths {
        let metadata = std::fs::metadata(path).map_err(|source| PageError::Io {
            path: path.clone(),
            source,
        })?;

        if metadata.is_dir() {
            walk(path, path, &mut inputs)?;
        } else if let Some(kind) = SourceKind::from_path(path) {
            let relative = path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| path.clone());
            inputs.push(InputFile {
                path: path.clone(),
                relative,
                kind,
            });
        } else {
            tracing::warn!("Skipping {}: not an HTML or Markdown file", path.display());
        }
    }

    inputs.sort_by(|a, b| a.path.cmp(&b.path));
    inputs.dedup_by(|a, b| a.path == b.path);
    tracing::debug!("Collected {} input file(s)", inputs.len());
    Ok(inputs)
}

fn walk(root: &Path, dir: &Path, inputs: &mut Vec<InputFile>) -> Result<(), PageError> {
    let io_err = |source| PageError::Io {
        path: dir.to_path_buf(),
        source,
    };

    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();

        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        if entry.file_type().map_err(io_err)?.is_dir() {
            walk(root, &path, inputs)?;
        } else if let Some(kind) = SourceKind::from_path(&path) {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            inputs.push(InputFile {
                path,
                relative,
                kind,
            });
        }
    }
    Ok(())
}

/// Load a source as an HTML page; Markdown is rendered first
pub fn load_page(
    input: &InputFile,
    config: &HighlightConfig,
    style: &PageStyle,
) -> Result<Page, PageError> {
    match input.kind {
        SourceKind::Html => Page::read(&input.path),
        SourceKind::Markdown => {
            let markdown = std::fs::read_to_string(&input.path).map_err(|source| {
                PageError::Io {
                    path: input.path.clone(),
                    source,
                }
            })?;
            let title = page_title(&markdown).unwrap_or_else(|| {
                input
                    .path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let html = markdown_to_page(
                &markdown,
                &title,
                style,
                &config.fence_class,
                &config.fence_languages(),
            );
            Ok(Page::new(&input.path, html))
        }
    }
}

/// Where the rendered page goes: next to the source, or mirrored under `out_dir`
///
/// Markdown sources always produce an `.html` file.
pub fn output_path(input: &InputFile, out_dir: Option<&Path>) -> PathBuf {
    let base = match out_dir {
        Some(dir) => dir.join(&input.relative),
        None => input.path.clone(),
    };
    match input.kind {
        SourceKind::Html => base,
        SourceKind::Markdown => base.with_extension("html"),
    }
}

/// Write a page, creating parent directories as needed
pub fn write_page(path: &Path, html: &str) -> Result<(), PageError> {
    let io_err = |source| PageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    std::fs::write(path, html).map_err(io_err)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_source_kind_from_path() {
        assert_eq!(SourceKind::from_path(Path::new("a.HTML")), Some(SourceKind::Html));
        assert_eq!(SourceKind::from_path(Path::new("a.htm")), Some(SourceKind::Html));
        assert_eq!(SourceKind::from_path(Path::new("a.md")), Some(SourceKind::Markdown));
        assert_eq!(SourceKind::from_path(Path::new("a.css")), None);
        assert_eq!(SourceKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_collect_inputs_walks_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("guide/.cache")).unwrap();
        fs::write(dir.path().join("index.html"), "").unwrap();
        fs::write(dir.path().join("guide/intro.md"), "").unwrap();
        fs::write(dir.path().join("guide/style.css"), "").unwrap();
        fs::write(dir.path().join("guide/.cache/old.html"), "").unwrap();

        let inputs = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        let relative: Vec<_> = inputs.iter().map(|i| i.relative.clone()).collect();
        assert_eq!(
            relative,
            [PathBuf::from("guide/intro.md"), PathBuf::from("index.html")]
        );
        assert_eq!(inputs[0].kind, SourceKind::Markdown);
    }

    #[test]
    fn test_collect_inputs_missing_path() {
        let err = collect_inputs(&[PathBuf::from("/nonexistent/docs")]).unwrap_err();
        assert!(matches!(err, PageError::Io { .. }));
    }

    #[test]
    fn test_output_path() {
        let md = InputFile {
            path: PathBuf::from("docs/guide/intro.md"),
            relative: PathBuf::from("guide/intro.md"),
            kind: SourceKind::Markdown,
        };
        assert_eq!(output_path(&md, None), PathBuf::from("docs/guide/intro.html"));
        assert_eq!(
            output_path(&md, Some(Path::new("site"))),
            PathBuf::from("site/guide/intro.html")
        );

        let html = InputFile {
            path: PathBuf::from("docs/index.html"),
            relative: PathBuf::from("index.html"),
            kind: SourceKind::Html,
        };
        assert_eq!(output_path(&html, None), PathBuf::from("docs/index.html"));
    }

    #[test]
    fn test_write_page_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/page.html");
        write_page(&path, "<p>hi</p>").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "<p>hi</p>");
    }
}
