//! Directory tree comparison.
//!
//! Two directories are paired file by file (by name, level by level), every
//! common pair is hashed with MD5, and files that exist on only one side are
//! reported separately. Directories present on only one side contribute all
//! of the files beneath them.

use log::{debug, info, warn};
use md5::{Digest, Md5};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Error type for directory comparison.
#[derive(Error, Debug)]
pub enum CompareError {
    /// File system or I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// One of the arguments is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    /// The external `diff` failed
    #[error("diff failed: {0}")]
    Diff(String),
}

type Result<T> = std::result::Result<T, CompareError>;

/// Report of pairs whose contents differ.
pub const DIFF_FILE: &str = "compare_diff.txt";
/// Report of files found only under the first directory.
pub const DIR1_ONLY_FILE: &str = "compare_dir1_only.txt";
/// Report of files found only under the second directory.
pub const DIR2_ONLY_FILE: &str = "compare_dir2_only.txt";

/// Files and subdirectories directly inside one directory, by name.
#[derive(Debug, Default)]
struct Listing {
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
}

impl Listing {
    fn read(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(CompareError::NotADirectory(dir.to_path_buf()));
        }
        let mut listing = Listing::default();
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error reading directory entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if path.is_dir() {
                listing.dirs.insert(name);
            } else if path.is_file() {
                listing.files.insert(name);
            }
        }
        Ok(listing)
    }

    fn contains(&self, name: &str) -> bool {
        self.files.contains(name) || self.dirs.contains(name)
    }
}

/// Files matched between two directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePairing {
    /// Same relative path on both sides
    pub common: Vec<(PathBuf, PathBuf)>,
    /// Only under the first directory
    pub left_only: Vec<PathBuf>,
    /// Only under the second directory
    pub right_only: Vec<PathBuf>,
}

/// Every file below `top`, depth first, sorted by name within each level.
pub fn files_below(top: &Path) -> Result<Vec<PathBuf>> {
    let listing = Listing::read(top)?;
    let mut files: Vec<PathBuf> = listing.files.iter().map(|f| top.join(f)).collect();
    for dir in &listing.dirs {
        files.extend(files_below(&top.join(dir))?);
    }
    Ok(files)
}

fn one_sided(dir: &Path, name: &str, listing: &Listing, recursive: bool) -> Result<Vec<PathBuf>> {
    let path = dir.join(name);
    if listing.files.contains(name) {
        Ok(vec![path])
    } else if recursive {
        files_below(&path)
    } else {
        Ok(Vec::new())
    }
}

fn collect_level(dir1: &Path, dir2: &Path, recursive: bool, pairing: &mut FilePairing) -> Result<()> {
    let left = Listing::read(dir1)?;
    let right = Listing::read(dir2)?;
    debug!(
        "{}: {} files, {} dirs; {}: {} files, {} dirs",
        dir1.display(),
        left.files.len(),
        left.dirs.len(),
        dir2.display(),
        right.files.len(),
        right.dirs.len()
    );

    for name in left.files.intersection(&right.files) {
        pairing.common.push((dir1.join(name), dir2.join(name)));
    }
    for name in left.files.iter().chain(&left.dirs) {
        if !right.contains(name) {
            pairing.left_only.extend(one_sided(dir1, name, &left, recursive)?);
        }
    }
    for name in right.files.iter().chain(&right.dirs) {
        if !left.contains(name) {
            pairing.right_only.extend(one_sided(dir2, name, &right, recursive)?);
        }
    }

    if recursive {
        for name in left.dirs.intersection(&right.dirs) {
            collect_level(&dir1.join(name), &dir2.join(name), true, pairing)?;
        }
    }
    Ok(())
}

/// Pairs files throughout both trees.
pub fn collect_recursive(dir1: &Path, dir2: &Path) -> Result<FilePairing> {
    let mut pairing = FilePairing::default();
    collect_level(dir1, dir2, true, &mut pairing)?;
    Ok(pairing)
}

/// Pairs only the files directly inside both directories; subdirectories are
/// ignored.
pub fn collect_flat(dir1: &Path, dir2: &Path) -> Result<FilePairing> {
    let mut pairing = FilePairing::default();
    collect_level(dir1, dir2, false, &mut pairing)?;
    Ok(pairing)
}

/// Hex MD5 digest of a file's contents.
pub fn md5_digest(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(format!("{:x}", Md5::digest(&bytes)))
}

/// Outcome of comparing one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    /// Identical contents
    Same,
    /// Contents differ
    Differs,
}

/// A hashed file pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    /// File under the first directory
    pub f1: PathBuf,
    /// File under the second directory
    pub f2: PathBuf,
    /// Digest of `f1`
    pub d1: String,
    /// Digest of `f2`
    pub d2: String,
    /// Whether the digests agree
    pub kind: DiffKind,
}

impl Diff {
    /// Hashes both files.
    pub fn from_files(f1: &Path, f2: &Path) -> std::io::Result<Self> {
        let d1 = md5_digest(f1)?;
        let d2 = md5_digest(f2)?;
        let kind = if d1 == d2 {
            DiffKind::Same
        } else {
            DiffKind::Differs
        };
        Ok(Self {
            f1: f1.to_path_buf(),
            f2: f2.to_path_buf(),
            d1,
            d2,
            kind,
        })
    }
}

/// Result of comparing two directories.
#[derive(Debug, Clone, Default)]
pub struct Comparison {
    /// Hashed common pairs
    pub diffs: Vec<Diff>,
    /// Files only under the first directory
    pub left_only: Vec<PathBuf>,
    /// Files only under the second directory
    pub right_only: Vec<PathBuf>,
}

/// Compares two directories, recursively or only at the top level.
pub fn compare(dir1: &Path, dir2: &Path, recursive: bool) -> Result<Comparison> {
    let pairing = if recursive {
        collect_recursive(dir1, dir2)?
    } else {
        collect_flat(dir1, dir2)?
    };

    let diffs = pairing
        .common
        .iter()
        .map(|(f1, f2)| Diff::from_files(f1, f2))
        .collect::<std::io::Result<Vec<_>>>()?;

    let differing = diffs.iter().filter(|d| d.kind == DiffKind::Differs).count();
    info!(
        "{} common files ({} differ), {} only in {}, {} only in {}",
        diffs.len(),
        differing,
        pairing.left_only.len(),
        dir1.display(),
        pairing.right_only.len(),
        dir2.display()
    );

    Ok(Comparison {
        diffs,
        left_only: pairing.left_only,
        right_only: pairing.right_only,
    })
}

const DIGEST_WIDTH: usize = 32;

fn column_width<'a>(paths: impl Iterator<Item = &'a PathBuf>) -> usize {
    paths.map(|p| p.display().to_string().len()).max().unwrap_or(0)
}

impl Comparison {
    /// Pairs whose contents differ.
    pub fn differing(&self) -> impl Iterator<Item = &Diff> {
        self.diffs.iter().filter(|d| d.kind == DiffKind::Differs)
    }

    /// One line per file: both digests, both paths in aligned columns and a
    /// status word. One-sided files leave the other side blank.
    pub fn format_report(&self) -> String {
        let w1 = column_width(self.diffs.iter().map(|d| &d.f1).chain(&self.left_only));
        let w2 = column_width(self.diffs.iter().map(|d| &d.f2).chain(&self.right_only));
        let blank = " ".repeat(DIGEST_WIDTH);

        let mut out = String::new();
        for diff in &self.diffs {
            let status = match diff.kind {
                DiffKind::Same => "same",
                DiffKind::Differs => "differs",
            };
            out.push_str(&format!(
                "{} {} {:w1$} {:w2$} {}\n",
                diff.d1,
                diff.d2,
                diff.f1.display().to_string(),
                diff.f2.display().to_string(),
                status,
            ));
        }
        for f1 in &self.left_only {
            out.push_str(&format!(
                "{blank} {blank} {:w1$} {:w2$} dir1 only\n",
                f1.display().to_string(),
                "",
            ));
        }
        for f2 in &self.right_only {
            out.push_str(&format!(
                "{blank} {blank} {:w1$} {:w2$} dir2 only\n",
                "",
                f2.display().to_string(),
            ));
        }
        out
    }

    /// Writes the differing pairs and the one-sided files into three report
    /// files under `dir`.
    pub fn write_report_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let diff_text: String = self
            .differing()
            .map(|d| format!("{} {}\n", d.f1.display(), d.f2.display()))
            .collect();
        let listing = |paths: &[PathBuf]| -> String {
            paths.iter().map(|p| format!("{}\n", p.display())).collect()
        };

        let written = [
            (DIFF_FILE, diff_text),
            (DIR1_ONLY_FILE, listing(&self.left_only)),
            (DIR2_ONLY_FILE, listing(&self.right_only)),
        ]
        .into_iter()
        .map(|(name, text)| -> Result<PathBuf> {
            let path = dir.join(name);
            fs::write(&path, text)?;
            Ok(path)
        })
        .collect::<Result<Vec<_>>>()?;

        info!("Wrote {}, {} and {}", DIFF_FILE, DIR1_ONLY_FILE, DIR2_ONLY_FILE);
        Ok(written)
    }
}

const BANNER_WIDTH: usize = 78;

/// Runs `diff` on every file with extension `ext` present in both
/// directories (top level only, sorted by name) and concatenates the
/// outputs, each framed by `=` banners.
pub fn diff_common_outputs(dir1: &Path, dir2: &Path, ext: &str) -> Result<String> {
    let ext = ext.trim_start_matches('.');
    let left = Listing::read(dir1)?;
    let right = Listing::read(dir2)?;
    let banner = "=".repeat(BANNER_WIDTH);

    let mut out = String::new();
    for name in left.files.intersection(&right.files) {
        if Path::new(name).extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        let output = Command::new("diff")
            .arg(dir1.join(name))
            .arg(dir2.join(name))
            .output()?;
        // 0: identical, 1: differences found, anything else is trouble
        if !matches!(output.status.code(), Some(0) | Some(1)) {
            return Err(CompareError::Diff(format!(
                "{}: {}",
                name,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        out.push_str(&banner);
        out.push('\n');
        out.push_str(&format!("========== job: {}\n", name));
        out.push_str(&String::from_utf8_lossy(&output.stdout));
        out.push('\n');
        out.push_str(&banner);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> (TempDir, PathBuf, PathBuf) {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a");
        let b = root.path().join("b");
        fs::create_dir_all(a.join("sub/deep")).unwrap();
        fs::create_dir_all(b.join("sub")).unwrap();
        fs::create_dir_all(a.join("lonely")).unwrap();

        fs::write(a.join("same.out"), "x\n").unwrap();
        fs::write(b.join("same.out"), "x\n").unwrap();
        fs::write(a.join("diff.out"), "1\n").unwrap();
        fs::write(b.join("diff.out"), "2\n").unwrap();
        fs::write(a.join("only_a.txt"), "").unwrap();
        fs::write(b.join("only_b.txt"), "").unwrap();
        fs::write(a.join("sub/inner.in"), "q").unwrap();
        fs::write(b.join("sub/inner.in"), "q").unwrap();
        fs::write(a.join("sub/deep/d.txt"), "").unwrap();
        fs::write(a.join("lonely/l.txt"), "").unwrap();
        (root, a, b)
    }

    #[test]
    fn test_md5_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, "").unwrap();
        assert_eq!(md5_digest(&path).unwrap(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_collect_recursive() {
        let (_root, a, b) = tree();
        let pairing = collect_recursive(&a, &b).unwrap();
        assert_eq!(
            pairing.common,
            vec![
                (a.join("diff.out"), b.join("diff.out")),
                (a.join("same.out"), b.join("same.out")),
                (a.join("sub/inner.in"), b.join("sub/inner.in")),
            ]
        );
        assert_eq!(
            pairing.left_only,
            vec![a.join("only_a.txt"), a.join("lonely/l.txt"), a.join("sub/deep/d.txt")]
        );
        assert_eq!(pairing.right_only, vec![b.join("only_b.txt")]);
    }

    #[test]
    fn test_collect_flat_ignores_subdirectories() {
        let (_root, a, b) = tree();
        let pairing = collect_flat(&a, &b).unwrap();
        assert_eq!(pairing.common.len(), 2);
        assert_eq!(pairing.left_only, vec![a.join("only_a.txt")]);
    }

    #[test]
    fn test_compare_and_report() {
        let (root, a, b) = tree();
        let cmp = compare(&a, &b, true).unwrap();
        let kinds: Vec<DiffKind> = cmp.diffs.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiffKind::Differs, DiffKind::Same, DiffKind::Same]);

        let report = cmp.format_report();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[0].ends_with(" differs"));
        assert!(lines[3].starts_with(&" ".repeat(65)));
        assert!(lines[3].ends_with(" dir1 only"));
        assert!(lines[6].ends_with(" dir2 only"));
        // columns line up
        let status_col = lines[0].rfind(' ').unwrap();
        assert_eq!(lines[1].find(" same").unwrap(), status_col);

        let written = cmp.write_report_files(root.path()).unwrap();
        assert_eq!(written.len(), 3);
        let diff_text = fs::read_to_string(root.path().join(DIFF_FILE)).unwrap();
        assert_eq!(
            diff_text,
            format!("{} {}\n", a.join("diff.out").display(), b.join("diff.out").display())
        );
        let only2 = fs::read_to_string(root.path().join(DIR2_ONLY_FILE)).unwrap();
        assert_eq!(only2.lines().count(), 1);
    }

    #[test]
    fn test_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "").unwrap();
        assert!(matches!(
            compare(&file, dir.path(), true),
            Err(CompareError::NotADirectory(_))
        ));
    }
}
