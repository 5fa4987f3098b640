//! Q-Chem complementary occupied-virtual pair (COVP) analysis.
//!
//! An ALMO-EDA charge-transfer calculation prints, for each direction of
//! charge flow between two fragments, a table of COVPs with their energy and
//! charge contributions. Q-Chem also writes the COVP orbitals as cube files
//! numbered by their position in the COVP orbital energy block, which is laid
//! out as:
//!
//! 1. fragment 1 occupied
//! 2. fragment 2 occupied
//! 3. fragment 2 virtual (on fragment 1)
//! 4. fragment 1 virtual (on fragment 2)
//!
//! [`CovpAnalysis`] parses the tables, locates the four regions from repeated
//! orbital energies, and maps every table entry to its pair of cube files.

use crate::scanner::{self, LineCursor, ScanError};
use crate::vmd::pad_left_zeros;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error type for COVP analysis.
#[derive(Error, Debug)]
pub enum CovpError {
    /// The output could not be scanned
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// File system or I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The orbital energy block does not have the expected layout
    #[error("Orbital layout error: {0}")]
    Layout(String),
}

type Result<T> = std::result::Result<T, CovpError>;

/// Direction of charge transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From fragment 1 to fragment 2
    OneToTwo,
    /// From fragment 2 to fragment 1
    TwoToOne,
}

impl Direction {
    /// Line introducing this direction's table.
    pub fn marker(self) -> &'static str {
        match self {
            Direction::OneToTwo => "From fragment 1 to fragment 2",
            Direction::TwoToOne => "From fragment 2 to fragment 1",
        }
    }

    /// Donor fragment number.
    pub fn fragment(self) -> u8 {
        match self {
            Direction::OneToTwo => 1,
            Direction::TwoToOne => 2,
        }
    }

    /// Suffix used in JSON dump names.
    fn file_tag(self) -> &'static str {
        match self {
            Direction::OneToTwo => "1_to_2",
            Direction::TwoToOne => "2_to_1",
        }
    }
}

/// Energy and charge contributions of one table row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CovpValues {
    /// Alpha energy lowering
    pub de_alpha: f64,
    /// Alpha energy lowering as a percentage of the block total
    pub de_alpha_pct: f64,
    /// Beta energy lowering
    pub de_beta: f64,
    /// Beta energy lowering percentage
    pub de_beta_pct: f64,
    /// Alpha charge transferred
    pub dq_alpha: f64,
    /// Alpha charge percentage
    pub dq_alpha_pct: f64,
    /// Beta charge transferred
    pub dq_beta: f64,
    /// Beta charge percentage
    pub dq_beta_pct: f64,
}

impl CovpValues {
    fn parse(line: &str) -> scanner::Result<Self> {
        Ok(Self {
            de_alpha: scanner::parse_column(line, 4, 13, "dE(alpha)")?,
            de_alpha_pct: scanner::parse_column(line, 14, 19, "dE(alpha) %")?,
            de_beta: scanner::parse_column(line, 21, 30, "dE(beta)")?,
            de_beta_pct: scanner::parse_column(line, 31, 36, "dE(beta) %")?,
            dq_alpha: scanner::parse_column(line, 38, 46, "dQ(alpha)")?,
            dq_alpha_pct: scanner::parse_column(line, 47, 52, "dQ(alpha) %")?,
            dq_beta: scanner::parse_column(line, 54, 62, "dQ(beta)")?,
            dq_beta_pct: scanner::parse_column(line, 63, 68, "dQ(beta) %")?,
        })
    }
}

/// One COVP with the cube file indices of its two orbitals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovpEntry {
    /// 1-based index within its direction's table
    pub index: usize,
    /// Energy and charge contributions
    #[serde(flatten)]
    pub values: CovpValues,
    /// Donor orbital
    pub orb_occ: usize,
    /// Acceptor orbital
    pub orb_virt: usize,
}

/// The total line closing a direction's table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovpTotal {
    /// Printed label with the donor fragment appended, e.g. `Tot1`
    pub label: String,
    /// Energy and charge contributions
    #[serde(flatten)]
    pub values: CovpValues,
}

/// A parsed direction table.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentBlock {
    /// Table rows in printed order
    pub entries: Vec<CovpEntry>,
    /// Total over all rows
    pub total: CovpTotal,
}

/// Parses the table that follows `direction`'s marker.
///
/// The cursor must sit on the line after the marker. Three header lines are
/// skipped, rows are read until a line containing `-----`, then the total
/// line is read. Orbital indices are left at zero until
/// [`assign_orbitals`] fills them in.
pub fn parse_fragment_block(cursor: &mut LineCursor, direction: Direction) -> Result<FragmentBlock> {
    cursor.skip(3)?;
    let mut entries = Vec::new();
    loop {
        let line = cursor.next_line()?;
        if line.contains("-----") {
            break;
        }
        entries.push(CovpEntry {
            index: scanner::parse_column(line, 0, 4, "COVP index")?,
            values: CovpValues::parse(line)?,
            orb_occ: 0,
            orb_virt: 0,
        });
    }
    let line = cursor.next_line()?;
    let total = CovpTotal {
        label: format!("{}{}", scanner::column(line, 0, 4), direction.fragment()),
        values: CovpValues::parse(line)?,
    };
    debug!("{}: {} COVPs", direction.marker(), entries.len());
    Ok(FragmentBlock { entries, total })
}

/// Alpha orbital energies from the last `Orbital Energies (a.u.)` block.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalEnergies {
    /// Occupied then virtual energies
    pub energies: Vec<f64>,
    /// Number of occupied orbitals
    pub n_occ: usize,
}

impl OrbitalEnergies {
    /// Total number of orbitals.
    pub fn n_mo(&self) -> usize {
        self.energies.len()
    }

    /// 0-based index of the HOMO.
    pub fn homo(&self) -> Option<usize> {
        self.n_occ.checked_sub(1)
    }
}

/// Parses the alpha occupied and virtual energies of the last orbital
/// energy printout.
pub fn parse_orbital_energies(text: &str) -> Result<OrbitalEnergies> {
    let mut cursor = LineCursor::new(text);
    cursor.seek_last("Orbital Energies (a.u.)")?;
    cursor.seek("Alpha MOs")?;
    cursor.seek("-- Occupied --")?;

    let mut energies = Vec::new();
    loop {
        let line = cursor.next_line()?;
        if line.contains("-- Virtual --") {
            break;
        }
        energies.extend(scanner::parse_fields::<f64>(line, 0)?);
    }
    let n_occ = energies.len();

    while let Some(line) = cursor.peek() {
        if line.trim().is_empty() || line.contains("Beta MOs") || line.contains("-----") {
            break;
        }
        energies.extend(scanner::parse_fields::<f64>(line, 0)?);
        cursor.next_line()?;
    }

    Ok(OrbitalEnergies { energies, n_occ })
}

/// First orbital of each region of the COVP energy block (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionStarts {
    /// Fragment 1 occupied
    pub f1_occ: usize,
    /// Fragment 2 occupied
    pub f2_occ: usize,
    /// Fragment 2 virtual (on 1)
    pub f2_virt: usize,
    /// Fragment 1 virtual (on 2)
    pub f1_virt: usize,
}

/// Locates the four regions from repeated energies.
///
/// The first orbital of fragment 1 reappears as the first orbital of its
/// virtual region, and the first fragment-2 occupied orbital reappears as the
/// first virtual orbital overall.
pub fn region_starts(energies: &[f64], n_occ: usize) -> Result<RegionStarts> {
    let first = *energies
        .first()
        .ok_or_else(|| CovpError::Layout("no orbital energies".into()))?;
    let pivot = *energies.get(n_occ).ok_or_else(|| {
        CovpError::Layout(format!("no virtual orbitals after {} occupied", n_occ))
    })?;
    let positions = |e: f64| -> Vec<usize> {
        energies
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == e)
            .map(|(i, _)| i)
            .collect()
    };

    let f1 = positions(first);
    let f2 = positions(pivot);
    if f2.len() < 2 || f2[1] != n_occ {
        return Err(CovpError::Layout(format!(
            "energy {} of orbital {} does not repeat in the occupied block",
            pivot, n_occ
        )));
    }
    if f1.len() < 2 {
        return Err(CovpError::Layout(format!(
            "energy {} of the first orbital does not repeat in the virtual block",
            first
        )));
    }

    let starts = RegionStarts {
        f1_occ: 0,
        f2_occ: f2[0],
        f2_virt: n_occ,
        f1_virt: f1[1],
    };
    debug!(
        "idx_occ_1: {} idx_occ_2: {} idx_virt_2: {} idx_virt_1: {}",
        starts.f1_occ, starts.f2_occ, starts.f2_virt, starts.f1_virt
    );
    Ok(starts)
}

/// Occupied and virtual orbital counts per fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrbitalCounts {
    /// Fragment 1 occupied
    pub nocc1: usize,
    /// Fragment 2 occupied
    pub nocc2: usize,
    /// Fragment 1 virtual
    pub nvirt1: usize,
    /// Fragment 2 virtual
    pub nvirt2: usize,
}

/// Derives per-fragment counts from the region starts.
pub fn orbital_counts(starts: &RegionStarts, n_mo: usize) -> Result<OrbitalCounts> {
    let layout = || {
        CovpError::Layout(format!(
            "regions {:?} are not ordered within {} orbitals",
            starts, n_mo
        ))
    };
    let nocc1 = starts.f2_occ;
    let nocc2 = starts.f2_virt.checked_sub(nocc1).ok_or_else(layout)?;
    let nvirt1 = starts.f1_virt.checked_sub(nocc1 + nocc2).ok_or_else(layout)?;
    let nvirt2 = n_mo.checked_sub(nocc1 + nocc2 + nvirt1).ok_or_else(layout)?;
    Ok(OrbitalCounts {
        nocc1,
        nocc2,
        nvirt1,
        nvirt2,
    })
}

/// Fills in the donor and acceptor orbital of every entry.
pub fn assign_orbitals(block: &mut FragmentBlock, direction: Direction, counts: &OrbitalCounts) {
    let c = counts;
    for entry in &mut block.entries {
        let (occ, virt) = match direction {
            Direction::OneToTwo => (entry.index, entry.index + c.nocc1 + c.nocc2 + c.nvirt1),
            Direction::TwoToOne => (entry.index + c.nocc1, entry.index + c.nocc1 + c.nocc2),
        };
        entry.orb_occ = occ;
        entry.orb_virt = virt;
    }
}

/// Summed contributions of a set of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sums {
    /// Alpha energy lowering
    pub de: f64,
    /// Alpha energy percentage
    pub de_pct: f64,
    /// Alpha charge transferred
    pub dq: f64,
    /// Alpha charge percentage
    pub dq_pct: f64,
}

impl Sums {
    fn of<'a>(entries: impl IntoIterator<Item = &'a CovpEntry>) -> Self {
        entries.into_iter().fold(Sums::default(), |acc, e| Sums {
            de: acc.de + e.values.de_alpha,
            de_pct: acc.de_pct + e.values.de_alpha_pct,
            dq: acc.dq + e.values.dq_alpha,
            dq_pct: acc.dq_pct + e.values.dq_alpha_pct,
        })
    }
}

/// A complete COVP analysis of one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct CovpAnalysis {
    /// Fragment 1 to 2 table
    pub one_to_two: FragmentBlock,
    /// Fragment 2 to 1 table
    pub two_to_one: FragmentBlock,
    /// COVP orbital energies
    pub energies: OrbitalEnergies,
    /// Region starts within the energy block
    pub starts: RegionStarts,
    /// Per-fragment orbital counts
    pub counts: OrbitalCounts,
}

impl CovpAnalysis {
    /// Parses both direction tables and the orbital energies of a Q-Chem
    /// output, and assigns orbital indices.
    pub fn from_output(text: &str) -> Result<Self> {
        let mut cursor = LineCursor::new(text);
        cursor.seek(Direction::OneToTwo.marker())?;
        let mut one_to_two = parse_fragment_block(&mut cursor, Direction::OneToTwo)?;
        cursor.rewind();
        cursor.seek(Direction::TwoToOne.marker())?;
        let mut two_to_one = parse_fragment_block(&mut cursor, Direction::TwoToOne)?;

        let energies = parse_orbital_energies(text)?;
        let starts = region_starts(&energies.energies, energies.n_occ)?;
        let counts = orbital_counts(&starts, energies.n_mo())?;

        assign_orbitals(&mut one_to_two, Direction::OneToTwo, &counts);
        assign_orbitals(&mut two_to_one, Direction::TwoToOne, &counts);

        Ok(Self {
            one_to_two,
            two_to_one,
            energies,
            starts,
            counts,
        })
    }

    /// The table for one direction.
    pub fn block(&self, direction: Direction) -> &FragmentBlock {
        match direction {
            Direction::OneToTwo => &self.one_to_two,
            Direction::TwoToOne => &self.two_to_one,
        }
    }

    /// Entries whose alpha energy percentage is at least `cutoff`.
    pub fn select(&self, direction: Direction, cutoff: f64) -> Vec<&CovpEntry> {
        self.block(direction)
            .entries
            .iter()
            .filter(|e| e.values.de_alpha_pct >= cutoff)
            .collect()
    }

    /// Sums over the entries kept by [`select`](Self::select).
    pub fn selected_sums(&self, direction: Direction, cutoff: f64) -> Sums {
        Sums::of(self.select(direction, cutoff))
    }

    /// Net alpha energy and charge flowing into `fragment` (1 or 2), from the
    /// full-table totals.
    pub fn net_into(&self, fragment: u8) -> (f64, f64) {
        let into_1 = &self.two_to_one.total.values;
        let into_2 = &self.one_to_two.total.values;
        let (gain, loss) = if fragment == 1 {
            (into_1, into_2)
        } else {
            (into_2, into_1)
        };
        (gain.de_alpha - loss.de_alpha, gain.dq_alpha - loss.dq_alpha)
    }

    /// Orbital pairs above the cutoff, fragment 1 to 2 first.
    pub fn pairs(&self, cutoff: f64) -> Vec<(usize, usize)> {
        [Direction::OneToTwo, Direction::TwoToOne]
            .into_iter()
            .flat_map(|d| self.select(d, cutoff))
            .map(|e| (e.orb_occ, e.orb_virt))
            .collect()
    }

    /// Digit count used in cube file names for VMD scripts.
    pub fn vmd_width(&self) -> usize {
        self.energies.n_mo().to_string().len()
    }

    fn all_entries(&self) -> impl Iterator<Item = &CovpEntry> {
        self.one_to_two.entries.iter().chain(&self.two_to_one.entries)
    }

    /// Cube files of the orbitals whose COVP falls below the cutoff.
    ///
    /// Indices are zero-padded to the widest orbital index over all entries.
    pub fn cube_files_below_cutoff(&self, cutoff: f64) -> Vec<String> {
        let width = self
            .all_entries()
            .map(|e| e.orb_occ.max(e.orb_virt).to_string().len())
            .max()
            .unwrap_or(0);
        self.all_entries()
            .filter(|e| e.values.de_alpha_pct < cutoff)
            .flat_map(|e| [e.orb_occ, e.orb_virt])
            .map(|i| format!("mo.{}.cube", pad_left_zeros(i, width)))
            .collect()
    }

    /// Header and orbital count lines.
    pub fn format_counts(&self) -> String {
        let c = &self.counts;
        let ncovp1 = self.one_to_two.entries.len();
        let ncovp2 = self.two_to_one.entries.len();
        let nocct = self.energies.n_occ;
        let nmo = self.energies.n_mo();
        [
            format!(
                "idx_occ_1: {} idx_occ_2: {} idx_virt_2: {} idx_virt_1: {}",
                self.starts.f1_occ, self.starts.f2_occ, self.starts.f2_virt, self.starts.f1_virt
            ),
            format!("NCOVP1: {:3} NCOVP2: {:3} NCOVPT: {:3}", ncovp1, ncovp2, ncovp1 + ncovp2),
            format!(" NOcc1: {:3} NVirt1: {:3}  NOrb1: {:3}", c.nocc1, c.nvirt1, c.nocc1 + c.nvirt1),
            format!(" NOcc2: {:3} NVirt2: {:3}  NOrb2: {:3}", c.nocc2, c.nvirt2, c.nocc2 + c.nvirt2),
            format!(" NOccT: {:3} NVirtT: {:3}  NOrbT: {:3}", nocct, nmo - nocct, nmo),
        ]
        .join("\n")
    }

    /// Tables of the entries above the cutoff with their sums, the full-table
    /// totals and the net charge transfer into each fragment.
    pub fn format_report(&self, cutoff: f64) -> String {
        let header = format!(
            " {:>5} {:>4} {:>4} {:>7} {:>5} {:>6} {:>5}",
            "idx", "occ", "virt", "de", "de%", "dq", "dq%"
        );
        let total_line = |label: &str, s: &Sums| {
            format!(
                " {:5}           {:6.4} {:5.1} {:6.3} {:5.1}",
                label, s.de, s.de_pct, s.dq, s.dq_pct
            )
        };

        let mut lines = vec![self.format_counts()];
        for (direction, title, cut_label) in [
            (Direction::OneToTwo, "Fragment 1 -> 2:", "Tot1C"),
            (Direction::TwoToOne, "Fragment 2 -> 1:", "Tot2C"),
        ] {
            lines.push(title.to_string());
            lines.push(header.clone());
            for e in self.select(direction, cutoff) {
                lines.push(format!(
                    " {:5} {:4} {:4} {:6.4} {:5.1} {:6.3} {:5.1}",
                    e.index,
                    e.orb_occ,
                    e.orb_virt,
                    e.values.de_alpha,
                    e.values.de_alpha_pct,
                    e.values.dq_alpha,
                    e.values.dq_alpha_pct
                ));
            }
            lines.push(total_line(cut_label, &self.selected_sums(direction, cutoff)));
            let total = &self.block(direction).total;
            let v = &total.values;
            lines.push(total_line(
                &total.label,
                &Sums {
                    de: v.de_alpha,
                    de_pct: v.de_alpha_pct,
                    dq: v.dq_alpha,
                    dq_pct: v.dq_alpha_pct,
                },
            ));
        }

        for fragment in [1u8, 2] {
            let (de, dq) = self.net_into(fragment);
            lines.push(format!("Net CT into Fragment {}:", fragment));
            lines.push(format!(" {:5}           {:6.4}     {:6.3}", "", de, dq));
        }

        lines.join("\n")
    }

    /// Writes the entries above the cutoff as `<stem>.1_to_2.json` and
    /// `<stem>.2_to_1.json`, returning the paths written.
    pub fn write_json(&self, stem: &Path, cutoff: f64) -> Result<Vec<std::path::PathBuf>> {
        let mut written = Vec::new();
        for direction in [Direction::OneToTwo, Direction::TwoToOne] {
            let path = stem.with_file_name(format!(
                "{}.{}.json",
                stem.file_name().and_then(|n| n.to_str()).unwrap_or("covp"),
                direction.file_tag()
            ));
            let json = serde_json::to_string_pretty(&self.select(direction, cutoff))?;
            fs::write(&path, json)?;
            info!("Wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Deletes the named cube files from `dir`.
///
/// Files that cannot be removed are logged and skipped. Returns the number
/// actually deleted.
pub fn delete_cubes(dir: &Path, names: &[String]) -> usize {
    let mut deleted = 0;
    for name in names {
        let path = dir.join(name);
        info!("Deleting {}", path.display());
        match fs::remove_file(&path) {
            Ok(()) => deleted += 1,
            Err(e) => warn!("Can't remove {}: {}", path.display(), e),
        }
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, v: [f64; 8]) -> String {
        format!(
            "{:>4}{:>9.4} {:>5.1}  {:>9.4} {:>5.1}  {:>8.4} {:>5.1}  {:>8.4} {:>5.1}",
            label, v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7]
        )
    }

    #[test]
    fn test_parse_fragment_block() {
        let text = [
            " From fragment 1 to fragment 2".to_string(),
            " h1".to_string(),
            " h2".to_string(),
            " h3".to_string(),
            row("1", [-3.3455, 76.4, -3.3455, 76.4, 0.0156, 68.5, 0.0156, 68.5]),
            row("2", [-0.5, 11.4, -0.5, 11.4, 0.004, 17.5, 0.004, 17.5]),
            " --------------------".to_string(),
            row("Tot", [-4.3774, 100.0, -4.3774, 100.0, 0.0228, 100.0, 0.0228, 100.0]),
        ]
        .join("\n");
        let mut cursor = LineCursor::new(&text);
        cursor.seek(Direction::OneToTwo.marker()).unwrap();
        let block = parse_fragment_block(&mut cursor, Direction::OneToTwo).unwrap();
        assert_eq!(block.entries.len(), 2);
        assert_eq!(block.entries[1].index, 2);
        assert!((block.entries[0].values.de_alpha + 3.3455).abs() < 1e-9);
        assert!((block.entries[1].values.dq_alpha_pct - 17.5).abs() < 1e-9);
        assert_eq!(block.total.label, "Tot1");
        assert!((block.total.values.dq_beta - 0.0228).abs() < 1e-9);
    }

    #[test]
    fn test_regions_and_counts() {
        let e = [-1.0, -0.9, -0.8, -0.7, -0.6, -0.7, 0.2, 0.3, -1.0, 0.5];
        let starts = region_starts(&e, 5).unwrap();
        assert_eq!(
            starts,
            RegionStarts {
                f1_occ: 0,
                f2_occ: 3,
                f2_virt: 5,
                f1_virt: 8
            }
        );
        let counts = orbital_counts(&starts, e.len()).unwrap();
        assert_eq!(
            counts,
            OrbitalCounts {
                nocc1: 3,
                nocc2: 2,
                nvirt1: 3,
                nvirt2: 2
            }
        );
    }

    #[test]
    fn test_regions_without_duplicates() {
        let e = [-1.0, -0.9, 0.1, 0.2];
        assert!(matches!(region_starts(&e, 2), Err(CovpError::Layout(_))));
        assert!(matches!(region_starts(&e, 4), Err(CovpError::Layout(_))));
    }

    #[test]
    fn test_assign_orbitals() {
        let counts = OrbitalCounts {
            nocc1: 3,
            nocc2: 2,
            nvirt1: 3,
            nvirt2: 2,
        };
        let values = CovpValues {
            de_alpha: 0.0,
            de_alpha_pct: 0.0,
            de_beta: 0.0,
            de_beta_pct: 0.0,
            dq_alpha: 0.0,
            dq_alpha_pct: 0.0,
            dq_beta: 0.0,
            dq_beta_pct: 0.0,
        };
        let mut block = FragmentBlock {
            entries: vec![CovpEntry {
                index: 2,
                values,
                orb_occ: 0,
                orb_virt: 0,
            }],
            total: CovpTotal {
                label: "Tot1".into(),
                values,
            },
        };
        let mut other = block.clone();
        assign_orbitals(&mut block, Direction::OneToTwo, &counts);
        assert_eq!((block.entries[0].orb_occ, block.entries[0].orb_virt), (2, 10));
        assign_orbitals(&mut other, Direction::TwoToOne, &counts);
        assert_eq!((other.entries[0].orb_occ, other.entries[0].orb_virt), (5, 7));
    }

    #[test]
    fn test_orbital_energies_last_block() {
        let text = "\
 Orbital Energies (a.u.)
 Alpha MOs
 -- Occupied --
 -9.0
 -- Virtual --
  9.0

 Orbital Energies (a.u.)
 ------------------------
 Alpha MOs
 -- Occupied --
 -1.0 -0.5
 -0.4
 -- Virtual --
  0.1  0.2
  0.3
 Beta MOs
 -- Occupied --
 -1.1
";
        let oe = parse_orbital_energies(text).unwrap();
        assert_eq!(oe.energies, vec![-1.0, -0.5, -0.4, 0.1, 0.2, 0.3]);
        assert_eq!(oe.n_occ, 3);
        assert_eq!(oe.homo(), Some(2));
        assert_eq!(oe.n_mo(), 6);
    }
}
