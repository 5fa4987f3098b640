//! Q-Chem vibrational analysis: harmonic normal modes, CO2 mode detection
//! and anharmonic (TOSH, VPT2, VCI) frequencies.

use crate::geometry::Geometry;
use crate::scanner::{self, LineCursor, ScanError};
use log::debug;
use nalgebra::DVector;
use std::collections::BTreeMap;
use thiserror::Error;

pub use crate::structure::parse_qchem_geometry;

/// Default window for a C=O bond length in CO2, Angstrom (exclusive bounds).
pub const CO_BOND_WINDOW: (f64, f64) = (1.10, 1.25);

/// Error type for vibrational analysis.
#[derive(Error, Debug)]
pub enum VibError {
    /// The output could not be scanned
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// Displacement fraction threshold outside [0, 1]
    #[error("Invalid threshold {0}: expected a fraction between 0 and 1")]
    InvalidThreshold(f64),
    /// Anharmonic table refers to a mode that does not exist
    #[error("Mode {0} is outside the harmonic mode range 1..={1}")]
    UnknownMode(usize, usize),
}

type Result<T> = std::result::Result<T, VibError>;

/// Harmonic frequencies, IR intensities and Cartesian displacements.
#[derive(Debug, Clone, PartialEq)]
pub struct Vibrations {
    /// Frequencies in cm^-1
    pub frequencies: Vec<f64>,
    /// IR intensities in km/mol
    pub ir_intensities: Vec<f64>,
    /// One 3N displacement vector per mode, atom-major like `Geometry::coords`
    pub displacements: Vec<DVector<f64>>,
}

fn is_xyz_header(line: &str) -> bool {
    let mut tokens = line.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(|t| t == "X" || t == "Y" || t == "Z")
}

/// Parses the `VIBRATIONAL ANALYSIS` section.
///
/// Modes are printed in groups of up to three columns. Each group gives a
/// `Mode:` row, `Frequency:` and `IR Intens:` rows and, after an `X Y Z`
/// header, one row per atom holding three displacements per mode.
pub fn parse_qchem_vibrations(text: &str) -> Result<Vibrations> {
    let mut cursor = LineCursor::new(text);
    cursor.seek("VIBRATIONAL ANALYSIS")?;

    let mut vibs = Vibrations {
        frequencies: Vec::new(),
        ir_intensities: Vec::new(),
        displacements: Vec::new(),
    };
    let mut group_size = 0usize;

    while let Ok(line) = cursor.next_line() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("STANDARD THERMODYNAMIC QUANTITIES") {
            break;
        } else if trimmed.starts_with("Mode:") {
            group_size = line.split_whitespace().count() - 1;
        } else if trimmed.starts_with("Frequency:") {
            vibs.frequencies.extend(scanner::parse_fields::<f64>(line, 1)?);
        } else if trimmed.starts_with("IR Intens:") {
            vibs.ir_intensities.extend(scanner::parse_fields::<f64>(line, 2)?);
        } else if is_xyz_header(line) {
            let mut columns: Vec<Vec<f64>> = vec![Vec::new(); group_size];
            while let Some(row) = cursor.peek() {
                if row.trim().is_empty() || row.trim_start().starts_with("TransDip") {
                    break;
                }
                cursor.next_line()?;
                let values: Vec<f64> = scanner::parse_fields(row, 1)?;
                if values.len() != 3 * group_size {
                    return Err(ScanError::Parse(format!(
                        "expected {} displacements in line '{}'",
                        3 * group_size,
                        row
                    ))
                    .into());
                }
                for (m, column) in columns.iter_mut().enumerate() {
                    column.extend_from_slice(&values[3 * m..3 * m + 3]);
                }
            }
            vibs.displacements
                .extend(columns.into_iter().map(DVector::from_vec));
        }
    }

    if vibs.frequencies.is_empty() {
        return Err(ScanError::MarkerNotFound("Frequency:".into()).into());
    }
    debug!("parsed {} normal modes", vibs.frequencies.len());
    Ok(vibs)
}

/// Every start index at which `needle` occurs contiguously in `haystack`.
///
/// ```
/// use qctools::vibrations::find_all_instances;
///
/// assert_eq!(find_all_instances(&[1, 1, 2, 1, 2], &[1, 2]), vec![1, 3]);
/// ```
pub fn find_all_instances<T: PartialEq>(haystack: &[T], needle: &[T]) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, w)| *w == needle)
        .map(|(i, _)| i)
        .collect()
}

/// Candidate first-atom indices of CO2 molecules.
///
/// Looks for consecutive C,O,O / O,C,O / O,O,C runs and keeps those where
/// at least one C-O or O-O pair lies strictly inside `(min, max)` Angstrom.
/// For each kept run the smallest index taking part in such a pair is
/// returned; the result is sorted.
pub fn find_co2_atom_indices(numbers: &[u32], geom: &Geometry, min: f64, max: f64) -> Vec<usize> {
    let sequences: [[u32; 3]; 3] = [[6, 8, 8], [8, 6, 8], [8, 8, 6]];
    let mut found = Vec::new();

    for seq in &sequences {
        for c in find_all_instances(numbers, seq) {
            let pairs = [(c, c + 1), (c, c + 2), (c + 1, c + 2)];
            let first = pairs
                .iter()
                .filter(|&&(i, j)| {
                    let d = geom.distance(i, j);
                    d > min && d < max
                })
                .map(|&(i, _)| i)
                .min();
            if let Some(i) = first {
                found.push(i);
            }
        }
    }

    found.sort_unstable();
    found
}

/// Modes in which the three atoms starting at `start` carry at least
/// `thresh` of the total absolute displacement.
pub fn find_co2_mode_indices(
    start: usize,
    displacements: &[DVector<f64>],
    thresh: f64,
) -> Result<Vec<usize>> {
    if !(0.0..=1.0).contains(&thresh) {
        return Err(VibError::InvalidThreshold(thresh));
    }

    let mut modes = Vec::new();
    for (idx, mode) in displacements.iter().enumerate() {
        let total: f64 = mode.iter().map(|v| v.abs()).sum();
        let lo = (3 * start).min(mode.len());
        let hi = (3 * start + 9).min(mode.len());
        let co2: f64 = mode.as_slice()[lo..hi].iter().map(|v| v.abs()).sum();
        if total > 0.0 && co2 / total >= thresh {
            modes.push(idx);
        }
    }
    Ok(modes)
}

/// `(frequency, intensity)` pairs of CO2-dominated modes for one output.
#[derive(Debug, Clone, PartialEq)]
pub struct Co2Modes {
    /// Output file name
    pub filename: String,
    /// Frequencies and IR intensities
    pub pairs: Vec<(f64, f64)>,
}

impl Co2Modes {
    /// Collects the CO2 modes for every CO2 candidate in `text`.
    pub fn from_output(filename: &str, text: &str, thresh: f64) -> Result<Vec<Self>> {
        let geom = parse_qchem_geometry(text)?;
        let numbers = geom.atomic_numbers()?;
        let vibs = parse_qchem_vibrations(text)?;
        let (min, max) = CO_BOND_WINDOW;

        let mut out = Vec::new();
        for start in find_co2_atom_indices(&numbers, &geom, min, max) {
            let pairs = find_co2_mode_indices(start, &vibs.displacements, thresh)?
                .into_iter()
                .filter_map(|i| {
                    Some((*vibs.frequencies.get(i)?, *vibs.ir_intensities.get(i)?))
                })
                .collect();
            out.push(Co2Modes {
                filename: filename.to_string(),
                pairs,
            });
        }
        Ok(out)
    }

    /// `name (freq, ir) (freq, ir) ...`
    pub fn format_line(&self) -> String {
        let mut line = self.filename.clone();
        for (f, ir) in &self.pairs {
            line.push_str(&format!(" ({:.2}, {:.2})", f, ir));
        }
        line
    }

    /// CSV row: file name and frequencies rounded to two decimals.
    /// `None` when there are no modes.
    pub fn csv_row(&self) -> Option<String> {
        if self.pairs.is_empty() {
            return None;
        }
        let mut fields = vec![csv_quote(&self.filename)];
        for (f, _) in &self.pairs {
            fields.push(format!("{:?}", (f * 100.0).round() / 100.0));
        }
        Some(fields.join(","))
    }
}

fn csv_quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn mode_slot(mode: usize, nmodes: usize) -> Result<usize> {
    if mode == 0 || mode > nmodes {
        Err(VibError::UnknownMode(mode, nmodes))
    } else {
        Ok(mode - 1)
    }
}

/// Anharmonic frequencies of one mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnharmonicMode {
    /// Transition-optimized shifted Hermite frequency
    pub tosh: Option<f64>,
    /// Second-order perturbation theory frequency
    pub vpt2: Option<f64>,
    /// VCI frequencies keyed `vci<quanta>`
    pub vci: BTreeMap<String, f64>,
}

/// Parses the `VIBRATIONAL ANHARMONIC ANALYSIS` section.
///
/// The returned vector has one entry per harmonic mode (index 0 is mode 1).
/// TOSH/VPT2 rows start at the first line containing `TOSH` and run until a
/// blank line; VCI rows follow directly and run until a line made only of
/// `=` characters.
pub fn parse_anharmonic(text: &str, nmodes: usize) -> Result<Vec<AnharmonicMode>> {
    let mut modes = vec![AnharmonicMode::default(); nmodes];
    let mut cursor = LineCursor::new(text);
    cursor.seek("VIBRATIONAL ANHARMONIC ANALYSIS")?;

    let mut line = cursor.seek("TOSH")?;
    while !line.trim().is_empty() {
        let mode: usize = scanner::parse_column(line, 6, 8, "mode")?;
        let i = mode_slot(mode, nmodes)?;
        modes[i].tosh = Some(scanner::parse_column(line, 9, 22, "TOSH frequency")?);
        modes[i].vpt2 = Some(scanner::parse_column(line, 30, usize::MAX, "VPT2 frequency")?);
        line = cursor.next_line()?;
    }

    loop {
        let line = cursor.next_line()?;
        let t = line.trim();
        if !t.is_empty() && t.chars().all(|c| c == '=') {
            break;
        }
        if t.is_empty() {
            continue;
        }
        let quanta = scanner::column(line, 5, 7);
        let mode: usize = scanner::parse_column(line, 13, 15, "VCI mode")?;
        let freq = scanner::field_f64(line, line.split_whitespace().count().saturating_sub(1))?;
        let i = mode_slot(mode, nmodes)?;
        modes[i].vci.insert(format!("vci{}", quanta), freq);
    }

    Ok(modes)
}

/// Table of anharmonic frequencies, one row per mode.
pub fn format_anharmonic(modes: &[AnharmonicMode]) -> String {
    let keys: Vec<&String> = {
        let mut k: Vec<&String> = modes.iter().flat_map(|m| m.vci.keys()).collect();
        k.sort();
        k.dedup();
        k
    };
    let opt = |v: Option<f64>| v.map_or_else(|| format!("{:>10}", "-"), |x| format!("{:10.2}", x));

    let mut header = format!("{:>4} {:>10} {:>10}", "mode", "tosh", "vpt2");
    for k in &keys {
        header.push_str(&format!(" {:>10}", k));
    }
    let mut lines = vec![header];
    for (i, m) in modes.iter().enumerate() {
        let mut row = format!("{:>4} {} {}", i + 1, opt(m.tosh), opt(m.vpt2));
        for k in &keys {
            row.push(' ');
            row.push_str(&opt(m.vci.get(*k).copied()));
        }
        lines.push(row);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CO2_OUT: &str = "\
             Standard Nuclear Orientation (Angstroms)
    I     Atom           X                Y                Z
 ----------------------------------------------------------------
    1      H       5.000000     0.000000     0.000000
    2      O      -1.160000     0.000000     0.000000
    3      C       0.000000     0.000000     0.000000
    4      O       1.160000     0.000000     0.000000
 ----------------------------------------------------------------
 **                       VIBRATIONAL ANALYSIS                        **
 Mode:                 1                      2
 Frequency:       667.10                2349.50
 IR Intens:        30.000                500.000
               X      Y      Z        X      Y      Z
 H         0.100  0.000  0.000    0.000  0.000  0.000
 O         0.000  0.300  0.000    0.400  0.000  0.000
 C         0.000 -0.500  0.000   -0.600  0.000  0.000
 O         0.000  0.300  0.000    0.400  0.000  0.000
 TransDip   0.000  0.100  0.000   0.500  0.000  0.000

 Mode:                 3
 Frequency:      4000.00
 IR Intens:         1.000
               X      Y      Z
 H         0.900  0.000  0.000
 O         0.010  0.000  0.000
 C         0.000  0.000  0.000
 O         0.010  0.000  0.000

 STANDARD THERMODYNAMIC QUANTITIES AT   298.15 K  AND     1.00 ATM
";

    #[test]
    fn test_parse_vibrations() {
        let vibs = parse_qchem_vibrations(CO2_OUT).unwrap();
        assert_eq!(vibs.frequencies, vec![667.10, 2349.50, 4000.00]);
        assert_eq!(vibs.ir_intensities, vec![30.0, 500.0, 1.0]);
        assert_eq!(vibs.displacements.len(), 3);
        assert_eq!(vibs.displacements[1].len(), 12);
        assert!((vibs.displacements[1][6] + 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_co2_atoms_and_modes() {
        let geom = parse_qchem_geometry(CO2_OUT).unwrap();
        let numbers = geom.atomic_numbers().unwrap();
        assert_eq!(numbers, vec![1, 8, 6, 8]);
        let starts = find_co2_atom_indices(&numbers, &geom, 1.10, 1.25);
        assert_eq!(starts, vec![1]);

        let vibs = parse_qchem_vibrations(CO2_OUT).unwrap();
        let modes = find_co2_mode_indices(1, &vibs.displacements, 0.5).unwrap();
        assert_eq!(modes, vec![0, 1]);
        assert!(matches!(
            find_co2_mode_indices(1, &vibs.displacements, 1.5),
            Err(VibError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_co2_report() {
        let found = Co2Modes::from_output("co2.out", CO2_OUT, 0.5).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].format_line(),
            "co2.out (667.10, 30.00) (2349.50, 500.00)"
        );
        assert_eq!(found[0].csv_row().unwrap(), "co2.out,667.1,2349.5");
    }

    #[test]
    fn test_no_bond_in_window() {
        let geom = Geometry::new(
            vec!["C".into(), "O".into(), "O".into()],
            vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, -2.0, 0.0, 0.0],
        );
        assert!(find_co2_atom_indices(&[6, 8, 8], &geom, 1.10, 1.25).is_empty());
    }

    #[test]
    fn test_parse_anharmonic() {
        let tosh = |mode: usize, t: &str, v: &str| {
            format!("{:<6}{:>2} {:>13}{:>8}{}", "TOSH", mode, t, "VPT2: ", v)
        };
        let vci = |quanta: usize, mode: usize, freq: &str| {
            format!("{:<5}{:>2}{:<6}{:>2}  quanta {}.0  freq {}", "VCI", quanta, "", mode, quanta, freq)
        };
        let text = [
            " VIBRATIONAL ANHARMONIC ANALYSIS".to_string(),
            " some header".to_string(),
            tosh(1, "650.123", "655.5"),
            tosh(2, "2300.000", "2310.25"),
            String::new(),
            vci(1, 1, "660.0"),
            vci(2, 2, "4600.5"),
            String::new(),
            " ========================".to_string(),
        ]
        .join("\n");
        let text = text.as_str();
        let modes = parse_anharmonic(text, 2).unwrap();
        assert_eq!(modes[0].tosh, Some(650.123));
        assert_eq!(modes[1].vpt2, Some(2310.25));
        assert_eq!(modes[0].vci.get("vci1"), Some(&660.0));
        assert_eq!(modes[1].vci.get("vci2"), Some(&4600.5));
        assert!(matches!(parse_anharmonic(text, 1), Err(VibError::UnknownMode(2, 1))));
        assert!(format_anharmonic(&modes).contains("vci2"));
    }
}
