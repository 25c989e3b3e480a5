pub mod cache;

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use memmap2::Mmap;

use crate::error::{OutlineError, Result};

/// Default include patterns when walking directories.
pub const DEFAULT_GLOBS: &[&str] = &["*.md", "*.mdx"];

/// Bytes inspected for NUL when deciding a file is binary.
const BINARY_SNIFF_LEN: usize = 8 * 1024;

// Directories that are always skipped.
pub(crate) const SKIP_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// Read a Markdown file into a string. Invalid UTF-8 is replaced, not rejected.
pub fn read_document(path: &Path) -> Result<String> {
    let meta = fs::metadata(path).map_err(|e| io_error(path, e))?;

    if meta.is_dir() {
        return Err(OutlineError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "is a directory"),
        });
    }

    // mmap of a 0-byte file fails on some platforms
    if meta.len() == 0 {
        return Ok(String::new());
    }

    let file = fs::File::open(path).map_err(|e| io_error(path, e))?;
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| io_error(path, e))?;
    let buf = &mmap[..];

    if is_binary(buf) {
        return Err(OutlineError::Binary {
            path: path.to_path_buf(),
        });
    }

    log::debug!("read {} ({} bytes)", path.display(), buf.len());
    Ok(String::from_utf8_lossy(buf).into_owned())
}

fn io_error(path: &Path, e: std::io::Error) -> OutlineError {
    match e.kind() {
        std::io::ErrorKind::NotFound => OutlineError::NotFound {
            path: path.to_path_buf(),
            suggestion: suggest_similar(path),
        },
        std::io::ErrorKind::PermissionDenied => OutlineError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => OutlineError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

/// NUL byte in the leading chunk means binary.
pub fn is_binary(buf: &[u8]) -> bool {
    let head = &buf[..buf.len().min(BINARY_SNIFF_LEN)];
    memchr::memchr(0, head).is_some()
}

/// Compile include patterns; empty input means [`DEFAULT_GLOBS`].
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let defaults: Vec<String>;
    let patterns = if patterns.is_empty() {
        defaults = DEFAULT_GLOBS.iter().map(|s| (*s).to_string()).collect();
        &defaults
    } else {
        patterns
    };
    for p in patterns {
        let glob = Glob::new(p).map_err(|e| OutlineError::InvalidGlob {
            pattern: p.clone(),
            reason: e.kind().to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| OutlineError::InvalidGlob {
        pattern: patterns.join(","),
        reason: e.kind().to_string(),
    })
}

/// Expand paths into a sorted, de-duplicated file list.
///
/// Files named explicitly are always kept. Directories are walked (hidden
/// files included, `.gitignore` not consulted) and only file names matching
/// `globs` are collected. Missing paths are errors.
pub fn collect_markdown_files(paths: &[PathBuf], globs: &GlobSet) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let meta = fs::metadata(path).map_err(|e| io_error(path, e))?;
        if !meta.is_dir() {
            files.push(path.clone());
            continue;
        }

        let walk = WalkBuilder::new(path)
            .hidden(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .filter_entry(|entry| {
                if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    if let Some(name) = entry.file_name().to_str() {
                        return !SKIP_DIRS.contains(&name);
                    }
                }
                true
            })
            .build();

        for entry in walk {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("skipping entry under {}: {e}", path.display());
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            if globs.is_match(entry.file_name()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    log::debug!("collected {} markdown files", files.len());
    Ok(files)
}

/// Suggest a similar file name from the parent directory (edit distance).
fn suggest_similar(path: &Path) -> Option<String> {
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return None,
    };
    let name = path.file_name()?.to_str()?;
    let entries = fs::read_dir(parent).ok()?;

    let mut best: Option<(usize, String)> = None;
    for entry in entries.flatten() {
        let candidate = entry.file_name();
        let candidate = candidate.to_string_lossy();
        let dist = edit_distance(name, &candidate);
        if dist <= 3 {
            // Ties go to the lexically smaller name, not to read_dir order.
            let better = match &best {
                Some((d, n)) => dist < *d || (dist == *d && &*candidate < n.as_str()),
                None => true,
            };
            if better {
                best = Some((dist, candidate.into_owned()));
            }
        }
    }
    best.map(|(_, name)| name)
}

/// Simple Levenshtein distance, for short file names.
fn edit_distance(a: &str, b: &str) -> usize {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eip.md");
        fs::write(&path, "# EIP-1\n").unwrap();
        assert_eq!(read_document(&path).unwrap(), "# EIP-1\n");
    }

    #[test]
    fn empty_file_is_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.md");
        fs::write(&path, "").unwrap();
        assert_eq!(read_document(&path).unwrap(), "");
    }

    #[test]
    fn missing_file_suggests_neighbor() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# r").unwrap();
        let err = read_document(&dir.path().join("READEM.md")).unwrap_err();
        match err {
            OutlineError::NotFound { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("README.md"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn equal_distance_suggestion_is_alphabetical() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["d.md", "c.md", "a.md"] {
            fs::write(dir.path().join(name), "# x").unwrap();
        }
        let err = read_document(&dir.path().join("b.md")).unwrap_err();
        match err {
            OutlineError::NotFound { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("a.md"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn binary_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.md");
        fs::write(&path, b"# x\0\x01\x02").unwrap();
        assert!(matches!(
            read_document(&path),
            Err(OutlineError::Binary { .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_lossy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.md");
        fs::write(&path, b"# caf\xe9\n").unwrap();
        assert_eq!(read_document(&path).unwrap(), "# caf\u{fffd}\n");
    }

    #[test]
    fn walks_directories_with_globs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("docs/sub")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("docs/a.md"), "# a").unwrap();
        fs::write(root.join("docs/sub/b.mdx"), "# b").unwrap();
        fs::write(root.join("docs/c.txt"), "# c").unwrap();
        fs::write(root.join("node_modules/pkg/README.md"), "# d").unwrap();
        fs::create_dir_all(root.join("docs/build")).unwrap();
        fs::write(root.join("docs/build/e.md"), "# e").unwrap();

        let globs = build_globset(&[]).unwrap();
        let files = collect_markdown_files(&[root.to_path_buf()], &globs).unwrap();
        assert_eq!(
            files,
            vec![
                root.join("docs/a.md"),
                root.join("docs/build/e.md"),
                root.join("docs/sub/b.mdx")
            ]
        );
    }

    #[test]
    fn explicit_files_kept_regardless_of_glob() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, "# n").unwrap();
        let globs = build_globset(&[]).unwrap();
        let files = collect_markdown_files(&[txt.clone(), txt.clone()], &globs).unwrap();
        assert_eq!(files, vec![txt]);
    }

    #[test]
    fn custom_globs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "").unwrap();
        fs::write(dir.path().join("b.markdown"), "").unwrap();
        let globs = build_globset(&["*.markdown".to_string()]).unwrap();
        let files = collect_markdown_files(&[dir.path().to_path_buf()], &globs).unwrap();
        assert_eq!(files, vec![dir.path().join("b.markdown")]);
    }

    #[test]
    fn bad_glob_is_error() {
        assert!(matches!(
            build_globset(&["a[".to_string()]),
            Err(OutlineError::InvalidGlob { .. })
        ));
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("readme", "readme"), 0);
        assert_eq!(edit_distance("readem", "readme"), 2);
        assert_eq!(edit_distance("", "abc"), 3);
    }
}
