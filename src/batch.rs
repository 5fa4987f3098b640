//! Bulk operations over sets of output files: cube file renaming, grouping
//! files into numbered directories, matching optimization outputs to their
//! frequency jobs, and Q-Chem timing summaries.

use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for batch operations.
#[derive(Error, Debug)]
pub enum BatchError {
    /// File system or I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid argument or unparsable input
    #[error("{0}")]
    Invalid(String),
}

type Result<T> = std::result::Result<T, BatchError>;

lazy_static! {
    static ref OPT_RE: Regex = Regex::new(r"opt\d*").unwrap();
}

fn sorted_names(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if keep(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Renames that zero-pad the orbital number in `mo.7.cube`-style names.
///
/// Names are split on `.`; a numeric second field is left-padded with zeros
/// to the widest numeric second field. Names already at full width, or
/// without a numeric second field, are left alone.
///
/// ```
/// use qctools::batch::pad_cube_names;
///
/// let names = vec!["mo.7.cube".to_string(), "mo.12.cube".to_string()];
/// assert_eq!(pad_cube_names(&names), vec![("mo.7.cube".to_string(), "mo.07.cube".to_string())]);
/// ```
pub fn pad_cube_names(names: &[String]) -> Vec<(String, String)> {
    let number = |name: &str| -> Option<usize> {
        name.split('.')
            .nth(1)
            .filter(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
            .map(str::len)
    };
    let width = names
        .iter()
        .filter_map(|n| number(n.as_str()))
        .max()
        .unwrap_or(0);

    names
        .iter()
        .filter_map(|name| {
            if number(name.as_str())? >= width {
                return None;
            }
            let mut fields: Vec<&str> = name.split('.').collect();
            let padded = format!("{:0>width$}", fields[1], width = width);
            fields[1] = &padded;
            Some((name.clone(), fields.join(".")))
        })
        .collect()
}

/// Pads the cube file names in `dir`; with `dry_run` nothing is renamed.
pub fn rename_cubes(dir: &Path, dry_run: bool) -> Result<Vec<(String, String)>> {
    let names = sorted_names(dir, |n| n.ends_with(".cube"))?;
    let renames = pad_cube_names(&names);
    if !dry_run {
        for (old, new) in &renames {
            fs::rename(dir.join(old), dir.join(new))?;
            debug!("renamed {} -> {}", old, new);
        }
    }
    info!("{} of {} cube files renamed", renames.len(), names.len());
    Ok(renames)
}

/// What to do with each grouped file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAction {
    /// Copy into the group directory
    Copy,
    /// Move into the group directory
    Move,
    /// Only report the assignment
    Print,
}

/// Splits `files` into consecutive chunks of `n` and places chunk `k`
/// (1-based) in `dest_root/group_<k>`. Returns `(file, group directory)`
/// for every file.
pub fn group_files(
    files: &[PathBuf],
    n: usize,
    action: GroupAction,
    dest_root: &Path,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    if n == 0 {
        return Err(BatchError::Invalid(
            "number of files per group must be at least 1".into(),
        ));
    }

    let mut assignments = Vec::with_capacity(files.len());
    for (k, chunk) in files.chunks(n).enumerate() {
        let dest = dest_root.join(format!("group_{}", k + 1));
        if action != GroupAction::Print {
            fs::create_dir_all(&dest)?;
        }
        for file in chunk {
            let name = file
                .file_name()
                .ok_or_else(|| BatchError::Invalid(format!("not a file: {}", file.display())))?;
            let target = dest.join(name);
            match action {
                GroupAction::Copy => {
                    fs::copy(file, &target)?;
                }
                GroupAction::Move => {
                    if fs::rename(file, &target).is_err() {
                        // crosses a filesystem boundary
                        fs::copy(file, &target)?;
                        fs::remove_file(file)?;
                    }
                }
                GroupAction::Print => {}
            }
            assignments.push((file.clone(), dest.clone()));
        }
    }
    info!(
        "{} files in {} groups",
        files.len(),
        (files.len() + n - 1) / n
    );
    Ok(assignments)
}

/// Optimization outputs with no matching frequency job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptFreqMatch {
    /// Opt outputs whose frequency output is missing
    pub missing_freq_outputs: Vec<String>,
    /// Opt outputs whose frequency input is missing
    pub missing_freq_inputs: Vec<String>,
}

/// Name of the frequency job for an optimization file: every `opt` (with
/// any trailing digits) becomes `freq`.
///
/// ```
/// use qctools::batch::freq_name;
///
/// assert_eq!(freq_name("h2o_opt2.out"), "h2o_freq.out");
/// ```
pub fn freq_name(opt_name: &str) -> String {
    OPT_RE.replace_all(opt_name, "freq").into_owned()
}

/// Compares `*opt*.out` files in `dir_opt` against `*freq*.out` and
/// `*freq*.in` files in `dir_freq`.
pub fn match_opt_and_freq(dir_opt: &Path, dir_freq: &Path) -> Result<OptFreqMatch> {
    let outputs_opt = sorted_names(dir_opt, |n| n.ends_with(".out") && n.contains("opt"))?;
    let outputs_freq = sorted_names(dir_freq, |n| n.ends_with(".out") && n.contains("freq"))?;
    let inputs_freq = sorted_names(dir_freq, |n| n.ends_with(".in") && n.contains("freq"))?;

    let mut result = OptFreqMatch::default();
    for opt in outputs_opt {
        let freq_out = freq_name(&opt);
        let freq_in = format!("{}.in", freq_out.trim_end_matches(".out"));
        if !outputs_freq.contains(&freq_out) {
            result.missing_freq_outputs.push(opt.clone());
        }
        if !inputs_freq.contains(&freq_in) {
            result.missing_freq_inputs.push(opt);
        }
    }
    Ok(result)
}

/// Wall and CPU time of one Q-Chem job, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalTime {
    /// Wall clock seconds
    pub wall: f64,
    /// CPU seconds
    pub cpu: f64,
}

/// Reads the last `Total job time:  Ws(wall), Cs(cpu)` line of a Q-Chem
/// output. `Ok(None)` when the job never finished.
pub fn parse_qchem_total_time(text: &str) -> Result<Option<TotalTime>> {
    let Some(line) = text.lines().filter(|l| l.contains("Total job time")).last() else {
        return Ok(None);
    };
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let value = |i: usize, suffix: &str| -> Result<f64> {
        tokens
            .get(i)
            .and_then(|t| t.strip_suffix(suffix))
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| BatchError::Invalid(format!("bad total time line: {}", line.trim())))
    };
    Ok(Some(TotalTime {
        wall: value(3, "s(wall),")?,
        cpu: value(4, "s(cpu)")?,
    }))
}

/// Timing statistics over many jobs, in hours.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSummary {
    /// `(wall, cpu)` hours, sorted
    pub hours: Vec<(f64, f64)>,
    /// CPU over wall time per job
    pub speedup: Vec<f64>,
    /// Shortest wall time
    pub min: f64,
    /// Longest wall time
    pub max: f64,
    /// Mean wall time
    pub mean: f64,
    /// Population standard deviation of the wall time
    pub std: f64,
}

/// Summarizes job times.
pub fn summarize_times(times: &[TotalTime]) -> Result<TimeSummary> {
    if times.is_empty() {
        return Err(BatchError::Invalid("no job times found".into()));
    }
    let mut hours: Vec<(f64, f64)> = times
        .iter()
        .map(|t| (t.wall / 3600.0, t.cpu / 3600.0))
        .collect();
    hours.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let speedup = hours.iter().map(|(w, c)| c / w).collect();
    let wall: Vec<f64> = hours.iter().map(|h| h.0).collect();
    let n = wall.len() as f64;
    let mean = wall.iter().sum::<f64>() / n;
    let var = wall.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / n;

    Ok(TimeSummary {
        min: wall.iter().copied().fold(f64::INFINITY, f64::min),
        max: wall.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean,
        std: var.sqrt(),
        hours,
        speedup,
    })
}

impl TimeSummary {
    /// Longest minus shortest wall time.
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Hours table, speedups, min/max/range and mean with deviation.
    pub fn format(&self) -> String {
        let mut out = String::new();
        for (wall, cpu) in &self.hours {
            out.push_str(&format!("{:14.8}{:14.8}\n", wall, cpu));
        }
        let speedup: String = self.speedup.iter().map(|s| format!("{:14.8}", s)).collect();
        out.push_str(&speedup);
        out.push('\n');
        out.push_str(&format!(
            "{:.6} {:.6} {:.6}\n",
            self.min,
            self.max,
            self.range()
        ));
        out.push_str(&format!(
            "mean +/- stdev: {:.6} +/- {:.6}\n",
            self.mean, self.std
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pad_cube_names() {
        let names: Vec<String> = ["mo.1.cube", "mo.100.cube", "mo.25.cube", "density.cube"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let renames = pad_cube_names(&names);
        assert_eq!(
            renames,
            vec![
                ("mo.1.cube".to_string(), "mo.001.cube".to_string()),
                ("mo.25.cube".to_string(), "mo.025.cube".to_string()),
            ]
        );
    }

    #[test]
    fn test_rename_cubes() {
        let dir = TempDir::new().unwrap();
        for name in ["mo.9.cube", "mo.10.cube", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let dry = rename_cubes(dir.path(), true).unwrap();
        assert_eq!(dry.len(), 1);
        assert!(dir.path().join("mo.9.cube").exists());

        rename_cubes(dir.path(), false).unwrap();
        assert!(dir.path().join("mo.09.cube").exists());
        assert!(!dir.path().join("mo.9.cube").exists());
    }

    #[test]
    fn test_group_files() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..5)
            .map(|i| {
                let p = src.path().join(format!("f{}.out", i));
                fs::write(&p, "x").unwrap();
                p
            })
            .collect();

        assert!(matches!(
            group_files(&files, 0, GroupAction::Print, dest.path()),
            Err(BatchError::Invalid(_))
        ));

        let printed = group_files(&files, 2, GroupAction::Print, dest.path()).unwrap();
        assert_eq!(printed[4].1, dest.path().join("group_3"));
        assert!(!dest.path().join("group_1").exists());

        group_files(&files, 2, GroupAction::Copy, dest.path()).unwrap();
        assert!(dest.path().join("group_1/f1.out").exists());
        assert!(dest.path().join("group_3/f4.out").exists());
        assert!(files[0].exists());

        let moved = vec![files[0].clone()];
        group_files(&moved, 1, GroupAction::Move, src.path()).unwrap();
        assert!(src.path().join("group_1/f0.out").exists());
        assert!(!files[0].exists());
    }

    #[test]
    fn test_match_opt_and_freq() {
        let dir = TempDir::new().unwrap();
        for name in [
            "a_opt.out",
            "a_freq.out",
            "a_freq.in",
            "b_opt3.out",
            "b_freq.in",
            "c_opt.out",
            "c_opt.in",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let result = match_opt_and_freq(dir.path(), dir.path()).unwrap();
        assert_eq!(result.missing_freq_outputs, vec!["b_opt3.out", "c_opt.out"]);
        assert_eq!(result.missing_freq_inputs, vec!["c_opt.out"]);
    }

    #[test]
    fn test_total_time() {
        let text = "\
 Total job time:  10.00s(wall), 9.00s(cpu)
 garbage
 Total job time:  7200.00s(wall), 28800.00s(cpu)
";
        let t = parse_qchem_total_time(text).unwrap().unwrap();
        assert!((t.wall - 7200.0).abs() < 1e-9);
        assert!((t.cpu - 28800.0).abs() < 1e-9);
        assert!(parse_qchem_total_time("no timing").unwrap().is_none());
        assert!(parse_qchem_total_time(" Total job time: soon").is_err());
    }

    #[test]
    fn test_summarize_times() {
        let times = [
            TotalTime { wall: 7200.0, cpu: 14400.0 },
            TotalTime { wall: 3600.0, cpu: 14400.0 },
        ];
        let summary = summarize_times(&times).unwrap();
        assert_eq!(summary.hours, vec![(1.0, 4.0), (2.0, 4.0)]);
        assert_eq!(summary.speedup, vec![4.0, 2.0]);
        assert!((summary.range() - 1.0).abs() < 1e-12);
        assert!((summary.mean - 1.5).abs() < 1e-12);
        assert!((summary.std - 0.5).abs() < 1e-12);
        assert!(summary
            .format()
            .ends_with("1.000000 2.000000 1.000000\nmean +/- stdev: 1.500000 +/- 0.500000\n"));
        assert!(summarize_times(&[]).is_err());
    }
}
