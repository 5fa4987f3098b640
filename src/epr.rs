//! EPR g-tensor and hyperfine tensor extraction.
//!
//! Supported sources:
//!
//! - ORCA: the `ELECTRONIC G-MATRIX` block ([`parse_orca_gtensor`],
//!   [`parse_orca_gtot`]) and the hyperfine block of the ligand atom nearest a
//!   metal centre ([`parse_orca_hyperfine`])
//! - ADF: principal g-values from perturbative or self-consistent spin-orbit
//!   runs ([`parse_adf_gtensor`])
//! - DALTON: the `G-shift components (ppm)` table ([`parse_dalton_gshift`])
//!
//! Each parser works on the full text of an output file and has a matching
//! `format_*` function producing the report printed by the CLI.

use crate::scanner::{self, LineCursor, ScanError};
use crate::structure;
use log::{debug, warn};
use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

/// Free-electron g-value used by ADF.
pub const G_ELECTRON: f64 = 2.002319;

/// Largest summed absolute deviation (ppm) tolerated between the DALTON total
/// g-shift and the sum of its contributions.
pub const DALTON_SUM_TOLERANCE_PPM: f64 = 9.0;

/// Error type for EPR parsing.
#[derive(Error, Debug)]
pub enum EprError {
    /// The output could not be scanned
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// The metal or ligand atom is absent from the geometry
    #[error("Atom not found: {0}")]
    AtomNotFound(String),
    /// Printed contributions do not add up to the printed total
    #[error("Inconsistent tensor: {0}")]
    Inconsistent(String),
}

type Result<T> = std::result::Result<T, EprError>;

/// Reads three consecutive rows into a matrix, skipping `skip` leading
/// fields on each row.
fn read_rows(cursor: &mut LineCursor, skip: usize) -> Result<Matrix3<f64>> {
    let mut m = Matrix3::zeros();
    for r in 0..3 {
        let row = scanner::parse_triple(cursor.next_line()?, skip)?;
        for c in 0..3 {
            m[(r, c)] = row[c];
        }
    }
    Ok(m)
}

fn read_vector(cursor: &mut LineCursor) -> Result<Vector3<f64>> {
    Ok(Vector3::from(scanner::parse_triple(cursor.next_line()?, 1)?))
}

/// Reads a `label x y z iso= v` line.
fn read_principal(cursor: &mut LineCursor) -> Result<(Vector3<f64>, f64)> {
    let line = cursor.next_line()?;
    let values = Vector3::from(scanner::parse_triple(line, 1)?);
    let iso = scanner::field_f64(line, 5)?;
    Ok((values, iso))
}

fn triple(v: &Vector3<f64>, fmt: fn(f64) -> String) -> String {
    v.iter().map(|x| fmt(*x)).collect::<Vec<_>>().join(" ")
}

/// The ORCA `ELECTRONIC G-MATRIX` block.
#[derive(Debug, Clone, PartialEq)]
pub struct OrcaGTensor {
    /// Gauge origin, when ORCA printed it
    pub origin: Option<Vector3<f64>>,
    /// Raw g-matrix in the molecular frame
    pub matrix: Matrix3<f64>,
    /// Free-electron value
    pub gel: Vector3<f64>,
    /// Relativistic mass correction
    pub grmc: Vector3<f64>,
    /// One-electron diamagnetic spin-orbit (gauge) correction
    pub gdso_1el: Vector3<f64>,
    /// Two-electron diamagnetic spin-orbit (gauge) correction
    pub gdso_2el: Vector3<f64>,
    /// Total diamagnetic spin-orbit correction
    pub gdso_tot: Vector3<f64>,
    /// One-electron paramagnetic spin-orbit (OZ/SOC) contribution
    pub gpso_1el: Vector3<f64>,
    /// Two-electron paramagnetic spin-orbit (OZ/SOC) contribution
    pub gpso_2el: Vector3<f64>,
    /// Total paramagnetic spin-orbit contribution
    pub gpso_tot: Vector3<f64>,
    /// Principal g-values
    pub gtot: Vector3<f64>,
    /// Isotropic g-value
    pub giso: f64,
    /// Principal g-shifts
    pub delta_g: Vector3<f64>,
    /// Isotropic g-shift
    pub delta_g_iso: f64,
    /// Principal axes, one row per Cartesian direction
    pub orientation: Matrix3<f64>,
}

/// Parses the ORCA g-matrix block.
///
/// The layout after the `ELECTRONIC G-MATRIX` line is fixed: dashes, a blank
/// line and `The g-matrix:`, three matrix rows, a blank line, the eight
/// contribution rows, a dash line, `g(tot)`, `Delta-g`, `Orientation:` and the
/// three axis rows.
pub fn parse_orca_gtensor(text: &str) -> Result<OrcaGTensor> {
    let mut cursor = LineCursor::new(text);

    // the origin may be printed before or after the g-matrix
    let origin = match cursor.try_seek("Coordinates of the origin") {
        Some(line) => Some(Vector3::from(scanner::parse_triple(line, 5)?)),
        None => None,
    };
    cursor.rewind();

    cursor.seek("ELECTRONIC G-MATRIX")?;
    cursor.skip(3)?;
    let matrix = read_rows(&mut cursor, 0)?;
    cursor.skip(1)?;

    let gel = read_vector(&mut cursor)?;
    let grmc = read_vector(&mut cursor)?;
    let gdso_1el = read_vector(&mut cursor)?;
    let gdso_2el = read_vector(&mut cursor)?;
    let gdso_tot = read_vector(&mut cursor)?;
    let gpso_1el = read_vector(&mut cursor)?;
    let gpso_2el = read_vector(&mut cursor)?;
    let gpso_tot = read_vector(&mut cursor)?;
    cursor.skip(1)?;

    let (gtot, giso) = read_principal(&mut cursor)?;
    let (delta_g, delta_g_iso) = read_principal(&mut cursor)?;
    cursor.skip(1)?;
    let orientation = read_rows(&mut cursor, 1)?;

    if (gdso_1el + gdso_2el - gdso_tot).amax() > 1e-6 {
        warn!("gDSO(1el) + gDSO(2el) differs from gDSO(tot)");
    }
    if (gpso_1el + gpso_2el - gpso_tot).amax() > 1e-6 {
        warn!("gPSO(1el) + gPSO(2el) differs from gPSO(tot)");
    }

    Ok(OrcaGTensor {
        origin,
        matrix,
        gel,
        grmc,
        gdso_1el,
        gdso_2el,
        gdso_tot,
        gpso_1el,
        gpso_2el,
        gpso_tot,
        gtot,
        giso,
        delta_g,
        delta_g_iso,
        orientation,
    })
}

/// One report line: principal values, isotropic value, file name.
pub fn format_orca_gtensor(g: &OrcaGTensor, name: &str) -> String {
    format!(
        "{} {:12.7} {}",
        triple(&g.gtot, |x| format!("{:12.7}", x)),
        g.giso,
        name
    )
}

/// Contribution breakdown of an ORCA g-tensor.
pub fn format_orca_contributions(g: &OrcaGTensor) -> String {
    let eig = |v: &Vector3<f64>| triple(v, |x| format!("{:12.7}", x));
    let mut lines = Vec::new();
    if let Some(origin) = &g.origin {
        lines.push(format!("origin: {}", eig(origin)));
    }
    lines.push(format!("delta g(RMC)        :  {:12.7}", g.grmc[0] - g.gel[0]));
    lines.push(format!("delta g(GC(1e))     : {}", eig(&g.gdso_1el)));
    lines.push(format!("delta g(GC(2e))     : {}", eig(&g.gdso_2el)));
    lines.push(format!("delta g(OZ/SOC(1e)) : {}", eig(&g.gpso_1el)));
    lines.push(format!("delta g(OZ/SOC(2e)) : {}", eig(&g.gpso_2el)));
    lines.push(format!("delta g             : {}", eig(&g.delta_g)));
    lines.join("\n")
}

/// Axial summary of the first `g(tot)` line in an ORCA output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GTotSummary {
    /// Principal values in printed order
    pub principal: [f64; 3],
    /// Isotropic value
    pub g_iso: f64,
    /// Parallel component (third principal value)
    pub g_para: f64,
    /// Perpendicular component (mean of the first two)
    pub g_perp: f64,
}

/// Finds the first `g(tot)` line, or `None` if the file has none.
pub fn parse_orca_gtot(text: &str) -> Result<Option<GTotSummary>> {
    let mut cursor = LineCursor::new(text);
    let line = match cursor.try_seek("g(tot)") {
        Some(line) => line,
        None => return Ok(None),
    };
    let principal = scanner::parse_triple(line, 1)?;
    let g_iso = scanner::field_f64(line, 5)?;
    Ok(Some(GTotSummary {
        principal,
        g_iso,
        g_para: principal[2],
        g_perp: (principal[0] + principal[1]) / 2.0,
    }))
}

/// Two-line report for a [`GTotSummary`].
pub fn format_gtot(s: &GTotSummary) -> String {
    format!(
        " {:<11.8} {:<11.8} {:<11.8}\n g_para: {:<11.8} g_perp: {:<11.8} g_iso: {:<11.8}",
        s.principal[0], s.principal[1], s.principal[2], s.g_para, s.g_perp, s.g_iso
    )
}

/// Hyperfine data for the ligand atom nearest the metal.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperfineResult {
    /// 0-based index of the selected ligand atom
    pub ligand_index: usize,
    /// Metal-ligand distance in Angstrom
    pub distance: f64,
    /// Raw HFC matrix (MHz)
    pub raw: Matrix3<f64>,
    /// Fermi contact term
    pub a_fc: Vector3<f64>,
    /// Spin-dipolar term
    pub a_sd: Vector3<f64>,
    /// Orbital (spin-orbit) term
    pub a_orb: Vector3<f64>,
    /// Pseudo-contact contribution printed at the end of the `A(ORB)` row
    pub a_pc: f64,
    /// Principal values of the total tensor
    pub a_tot: Vector3<f64>,
    /// Isotropic hyperfine coupling
    pub a_iso: f64,
    /// Principal axes
    pub orientation: Matrix3<f64>,
}

/// Locates the ligand atom closest to the first metal atom.
///
/// Returns the 0-based atom index and the distance.
fn nearest_ligand(text: &str, metal: &str, ligand: &str) -> Result<(usize, f64)> {
    let mut cursor = LineCursor::new(text);
    cursor.seek(structure::ORCA_GEOMETRY)?;
    cursor.skip(1)?;
    let geom = structure::read_orca_coordinates(&mut cursor)?;

    let metal_pos = geom
        .elements
        .iter()
        .position(|e| e == metal)
        .map(|i| geom.position(i))
        .ok_or_else(|| EprError::AtomNotFound(format!("no {} atom", metal)))?;
    let ligands = geom
        .elements
        .iter()
        .enumerate()
        .filter(|(_, e)| *e == ligand)
        .map(|(i, _)| (i, geom.position(i)));

    let mut best: Option<(usize, f64)> = None;
    for (i, pos) in ligands {
        let d = (pos - metal_pos).norm();
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.ok_or_else(|| EprError::AtomNotFound(format!("no {} atom", ligand)))
}

/// Extracts the hyperfine tensor of the `ligand` atom nearest the first
/// `metal` atom.
///
/// The per-nucleus block is found by its `<idx><ligand> : A` header, where the
/// index must not be the tail of a longer number.
pub fn parse_orca_hyperfine(text: &str, metal: &str, ligand: &str) -> Result<HyperfineResult> {
    let (ligand_index, distance) = nearest_ligand(text, metal, ligand)?;
    debug!(
        "nearest {} to {} is atom {} at {:.4} A",
        ligand, metal, ligand_index, distance
    );

    let header = format!("{}{} : A", ligand_index, ligand);
    let mut cursor = LineCursor::new(text);
    cursor
        .seek_with(|line| {
            line.match_indices(&header).any(|(i, _)| {
                !line[..i]
                    .chars()
                    .next_back()
                    .map_or(false, |c| c.is_ascii_digit())
            })
        })
        .ok_or_else(|| ScanError::MarkerNotFound(header.clone()))?;
    cursor.seek("Raw HFC matrix (all values in MHz):")?;

    let raw = read_rows(&mut cursor, 0)?;
    cursor.skip(1)?;
    let a_fc = read_vector(&mut cursor)?;
    let a_sd = read_vector(&mut cursor)?;

    let orb_line = cursor.next_line()?;
    let a_orb = Vector3::from(scanner::parse_triple(orb_line, 1)?);
    let a_pc = orb_line
        .split_whitespace()
        .last()
        .and_then(|tok| tok.parse::<f64>().ok())
        .ok_or_else(|| ScanError::Parse(format!("no A(PC) value in line '{}'", orb_line)))?;

    cursor.skip(1)?;
    let (a_tot, a_iso) = read_principal(&mut cursor)?;
    cursor.skip(1)?;
    let orientation = read_rows(&mut cursor, 1)?;

    Ok(HyperfineResult {
        ligand_index,
        distance,
        raw,
        a_fc,
        a_sd,
        a_orb,
        a_pc,
        a_tot,
        a_iso,
        orientation,
    })
}

/// Header line for the combined g/A table.
pub fn hyperfine_header() -> String {
    format!(
        "{:>38} {:>10} {:>38} {:>10} {:>10} {:>4} {}",
        "g-tensor", "isotropic", "a-tensor", "isotropic", "distance", "nidx", "name"
    )
}

/// One row of the combined g/A table.
pub fn format_hyperfine_row(g: &OrcaGTensor, a: &HyperfineResult, name: &str) -> String {
    format!(
        "{} {:>10.7} {} {:>10.6} {:>10.7} {:>4} {}",
        triple(&g.gtot, |x| format!("{:12.7}", x)),
        g.giso,
        triple(&a.a_tot, |x| format!("{:12.5}", x)),
        a.a_iso,
        a.distance,
        a.ligand_index,
        name
    )
}

/// How ADF treated spin-orbit coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdfSpinOrbit {
    /// Spin-orbit as a perturbation
    Perturbative,
    /// Spin-orbit included self-consistently
    SelfConsistent,
}

/// Principal g-values from an ADF output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfGValues {
    /// Type of calculation the values came from
    pub kind: AdfSpinOrbit,
    /// Principal g-shifts in ppt
    pub ppt: [f64; 3],
    /// Principal g-values
    pub full: [f64; 3],
}

/// Reads ADF principal g-values, whichever block appears first.
///
/// Returns `None` when the output has neither block.
pub fn parse_adf_gtensor(text: &str) -> Result<Option<AdfGValues>> {
    let mut cursor = LineCursor::new(text);
    while let Ok(line) = cursor.next_line() {
        if line.contains("TOTAL EPR Delta g-matrix (ppt)") {
            cursor.seek("Principal components")?;
            cursor.skip(1)?;
            let ppt = scanner::parse_triple(cursor.next_line()?, 0)?;
            let full = ppt.map(|v| v / 1000.0 + G_ELECTRON);
            return Ok(Some(AdfGValues {
                kind: AdfSpinOrbit::Perturbative,
                ppt,
                full,
            }));
        }
        if line.contains("Principal g-values") {
            let full = scanner::parse_triple(line, 2)?;
            let shifts = scanner::parse_triple(cursor.next_line()?, 1)?;
            return Ok(Some(AdfGValues {
                kind: AdfSpinOrbit::SelfConsistent,
                ppt: shifts.map(|v| v * 1000.0),
                full,
            }));
        }
    }
    Ok(None)
}

/// Two-line ppt/full report.
pub fn format_adf(v: &AdfGValues) -> String {
    format!(
        "  ppt: {:>11.3} {:>11.3} {:>11.3}\n full: {:>11.3} {:>11.3} {:>11.3}",
        v.ppt[0], v.ppt[1], v.ppt[2], v.full[0], v.full[1], v.full[2]
    )
}

/// DALTON g-shift tensors, all in ppm.
#[derive(Debug, Clone, PartialEq)]
pub struct DaltonGShift {
    /// Electronic charge centroid used as gauge origin, when printed
    pub origin: Option<Vector3<f64>>,
    /// Relativistic mass correction (isotropic)
    pub rmc: f64,
    /// One-electron gauge correction
    pub gc_1e: Matrix3<f64>,
    /// Two-electron gauge correction
    pub gc_2e: Matrix3<f64>,
    /// One-electron spin-orbit + orbital-Zeeman contribution
    pub oz_soc_1e: Matrix3<f64>,
    /// Two-electron spin-orbit + orbital-Zeeman contribution
    pub oz_soc_2e: Matrix3<f64>,
    /// Total g-shift
    pub total: Matrix3<f64>,
}

/// Unpacks an `@G` line: nine 7-character fields from column 9, in the order
/// xx yy zz xy yx xz zx yz zy.
fn parse_dalton_line(line: &str) -> Result<Matrix3<f64>> {
    let mut f = [0.0; 9];
    for (k, slot) in f.iter_mut().enumerate() {
        let start = 9 + 7 * k;
        *slot = scanner::parse_column(line, start, start + 7, "g-shift component")?;
    }
    let [xx, yy, zz, xy, yx, xz, zx, yz, zy] = f;
    Ok(Matrix3::new(xx, xy, xz, yx, yy, yz, zx, zy, zz))
}

/// Parses the `G-shift components (ppm)` table.
///
/// # Errors
///
/// Besides scanning errors, fails with [`EprError::Inconsistent`] when the
/// total differs from the sum of the contributions by more than
/// [`DALTON_SUM_TOLERANCE_PPM`] summed over all nine elements.
pub fn parse_dalton_gshift(text: &str) -> Result<DaltonGShift> {
    let mut cursor = LineCursor::new(text);

    let origin = match cursor.try_seek("Gauge origin (electronic charge centroid)") {
        Some(line) => {
            let fields: Vec<f64> = scanner::parse_fields(line, 5)?;
            fields.get(..3).map(|v| Vector3::new(v[0], v[1], v[2]))
        }
        None => {
            cursor.rewind();
            None
        }
    };

    cursor.seek("G-shift components (ppm)")?;
    cursor.skip(3)?;
    let rmc: f64 = scanner::parse_column(cursor.next_line()?, 9, 16, "RMC")?;
    let gc_1e = parse_dalton_line(cursor.next_line()?)?;
    let gc_2e = parse_dalton_line(cursor.next_line()?)?;
    let oz_soc_1e = parse_dalton_line(cursor.next_line()?)?;
    let oz_soc_2e = parse_dalton_line(cursor.next_line()?)?;
    let total = parse_dalton_line(cursor.next_line()?)?;

    let sum = Matrix3::identity() * rmc + gc_1e + gc_2e + oz_soc_1e + oz_soc_2e;
    let error: f64 = (total - sum).abs().sum();
    if error > DALTON_SUM_TOLERANCE_PPM {
        return Err(EprError::Inconsistent(format!(
            "total g-shift deviates from the sum of its contributions by {:.1} ppm",
            error
        )));
    }

    Ok(DaltonGShift {
        origin,
        rmc,
        gc_1e,
        gc_2e,
        oz_soc_1e,
        oz_soc_2e,
        total,
    })
}

/// Principal values of a (possibly non-symmetric) tensor: square roots of the
/// eigenvalues of `mᵀm`, ascending.
pub fn principal_values(m: &Matrix3<f64>) -> Vector3<f64> {
    let eig = (m.transpose() * m).symmetric_eigen();
    let mut values: Vec<f64> = eig.eigenvalues.iter().map(|v| v.max(0.0).sqrt()).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    Vector3::new(values[0], values[1], values[2])
}

/// Matrices in ppm followed by the principal values of every contribution.
pub fn format_dalton(g: &DaltonGShift) -> String {
    let ppm = |m: &Matrix3<f64>| {
        (0..3)
            .map(|r| format!(" {:6.0} {:6.0} {:6.0}", m[(r, 0)], m[(r, 1)], m[(r, 2)]))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let eig = |m: &Matrix3<f64>| triple(&principal_values(&(m / 1.0e6)), |x| format!("{:12.7}", x));

    let mut lines = Vec::new();
    if let Some(origin) = &g.origin {
        lines.push(format!("origin: {}", triple(origin, |x| format!("{:12.7}", x))));
    }
    lines.push("One-electron gauge correction".to_string());
    lines.push(ppm(&g.gc_1e));
    lines.push("Two-electron gauge correction".to_string());
    lines.push(ppm(&g.gc_2e));
    lines.push("One-electron spin-orbit+orbital-Zeeman contribution".to_string());
    lines.push(ppm(&g.oz_soc_1e));
    lines.push("Two-electron spin-orbit+orbital-Zeeman contribution".to_string());
    lines.push(ppm(&g.oz_soc_2e));
    lines.push(format!("delta g(RMC)        :  {:12.7}", g.rmc / 1.0e6));
    lines.push(format!("delta g(GC(1e))     : {}", eig(&g.gc_1e)));
    lines.push(format!("delta g(GC(2e))     : {}", eig(&g.gc_2e)));
    lines.push(format!("delta g(OZ/SOC(1e)) : {}", eig(&g.oz_soc_1e)));
    lines.push(format!("delta g(OZ/SOC(2e)) : {}", eig(&g.oz_soc_2e)));
    lines.push(format!("delta g             : {}", eig(&g.total)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORCA_G: &str = "\
-------------------
ELECTRONIC G-MATRIX
-------------------

 The g-matrix:
              2.1766588   -0.0419455    0.0785780
             -0.0456024    2.1503399    0.0062106
              0.0803984    0.0063831    2.0695626

 gel          2.0023193    2.0023193    2.0023193
 gRMC         2.0012821    2.0012821    2.0012821
 gDSO(1el)    0.0005885    0.0007469    0.0008681
 gDSO(2el)   -0.0002227   -0.0002837   -0.0003322
 gDSO(tot)    0.0003658    0.0004632    0.0005359
 gPSO(1el)    0.0334924    0.2332266    0.3909197
 gPSO(2el)   -0.0134555   -0.0947635   -0.1580697
 gPSO(tot)    0.0200369    0.1384632    0.2328500
           ----------   ----------   ----------
 g(tot)       2.0216853    2.1402089    2.2346690 iso=  2.1321877
 Delta-g      0.0193660    0.1378897    0.2323497 iso=  0.1298685
 Orientation:
  X          -0.4921117    0.2594594   -0.8309675
  Y          -0.2090765    0.8913857    0.4021425
  Z           0.8450521    0.3716348   -0.3844145
";

    #[test]
    fn test_orca_gtensor_block() {
        let g = parse_orca_gtensor(ORCA_G).unwrap();
        assert!(g.origin.is_none());
        assert!((g.matrix[(1, 0)] + 0.0456024).abs() < 1e-9);
        assert!((g.gpso_2el[2] + 0.1580697).abs() < 1e-9);
        assert!((g.giso - 2.1321877).abs() < 1e-9);
        assert!((g.delta_g_iso - 0.1298685).abs() < 1e-9);
        assert!((g.orientation[(2, 0)] - 0.8450521).abs() < 1e-9);
        assert!(format_orca_gtensor(&g, "cu.out").ends_with("cu.out"));
    }

    #[test]
    fn test_origin_after_gtensor_block() {
        let text = format!(
            "{} Coordinates of the origin    ...    0.10000000   -0.20000000    0.30000000 (bohrs)\n",
            ORCA_G
        );
        let g = parse_orca_gtensor(&text).unwrap();
        assert_eq!(g.origin, Some(Vector3::new(0.1, -0.2, 0.3)));
        assert!((g.giso - 2.1321877).abs() < 1e-9);
    }

    #[test]
    fn test_orca_gtot() {
        let s = parse_orca_gtot(ORCA_G).unwrap().unwrap();
        assert!((s.g_para - 2.2346690).abs() < 1e-9);
        assert!((s.g_perp - (2.0216853 + 2.1402089) / 2.0).abs() < 1e-9);
        let report = format_gtot(&s);
        assert!(report.starts_with(" 2.02168530  2.14020890  2.23466900"));
        assert!(parse_orca_gtot("nothing here").unwrap().is_none());
    }

    #[test]
    fn test_truncated_gtensor() {
        let cut: String = ORCA_G.lines().take(12).collect::<Vec<_>>().join("\n");
        assert!(matches!(
            parse_orca_gtensor(&cut),
            Err(EprError::Scan(ScanError::UnexpectedEof(_)))
        ));
    }

    #[test]
    fn test_adf_perturbative() {
        let text = "\
 TOTAL EPR Delta g-matrix (ppt)
   junk
 Principal components
 ----
   1.000  2.000  100.000
";
        let v = parse_adf_gtensor(text).unwrap().unwrap();
        assert_eq!(v.kind, AdfSpinOrbit::Perturbative);
        assert!((v.full[2] - (0.1 + G_ELECTRON)).abs() < 1e-12);
        assert!(format_adf(&v).starts_with("  ppt:       1.000"));
    }

    #[test]
    fn test_adf_self_consistent() {
        let text = " Principal g-values:  2.01 2.02 2.2\n shifts: 0.008 0.018 0.198\n";
        let v = parse_adf_gtensor(text).unwrap().unwrap();
        assert_eq!(v.kind, AdfSpinOrbit::SelfConsistent);
        assert_eq!(v.full, [2.01, 2.02, 2.2]);
        assert!((v.ppt[2] - 198.0).abs() < 1e-9);
        assert!(parse_adf_gtensor("none").unwrap().is_none());
    }

    fn dalton_line(label: &str, m: [f64; 9]) -> String {
        let mut s = format!("{:<9}", label);
        for v in m {
            s.push_str(&format!("{:>7.1}", v));
        }
        s
    }

    fn dalton_text(total_zz: f64) -> String {
        let z = [0.0; 9];
        let gc1 = [10.0, 20.0, 30.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let total = [-290.0, -280.0, total_zz, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        [
            " Gauge origin (electronic charge centroid)    0.1 0.2 0.3".to_string(),
            "  G-shift components (ppm)".to_string(),
            " ---".to_string(),
            " header".to_string(),
            " ---".to_string(),
            format!("{:<9}{:>7.1}", "@G RMC", -300.0),
            dalton_line("@G GC1", gc1),
            dalton_line("@G GC2", z),
            dalton_line("@G OZSO1", z),
            dalton_line("@G OZSO2", z),
            dalton_line("@G Total", total),
        ]
        .join("\n")
    }

    #[test]
    fn test_dalton_gshift() {
        let g = parse_dalton_gshift(&dalton_text(-270.0)).unwrap();
        assert!((g.rmc + 300.0).abs() < 1e-9);
        assert_eq!(g.gc_1e[(0, 1)], 1.0);
        assert_eq!(g.gc_1e[(2, 2)], 30.0);
        let origin = g.origin.unwrap();
        assert!((origin[2] - 0.3).abs() < 1e-12);
        assert!(format_dalton(&g).contains("Two-electron gauge correction"));
    }

    #[test]
    fn test_dalton_inconsistent_total() {
        assert!(matches!(
            parse_dalton_gshift(&dalton_text(-250.0)),
            Err(EprError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_principal_values_of_diagonal() {
        let m = Matrix3::from_diagonal(&Vector3::new(-3.0, 1.0, 2.0));
        let p = principal_values(&m);
        assert!((p[0] - 1.0).abs() < 1e-10);
        assert!((p[1] - 2.0).abs() < 1e-10);
        assert!((p[2] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_hyperfine_nearest_ligand() {
        let text = "\
CARTESIAN COORDINATES (ANGSTROEM)
---------------------------------
  Cu     0.000000    0.000000    0.000000
  N      3.000000    0.000000    0.000000
  N      0.000000    2.000000    0.000000
  O      1.000000    0.000000    0.000000

 Nucleus  12N : A:ISTP=   14 I=  1.0 P= 38.5677
 Raw HFC matrix (all values in MHz):
 9 9 9
 9 9 9
 9 9 9
 Nucleus   2N : A:ISTP=   14 I=  1.0 P= 38.5677
 Raw HFC matrix (all values in MHz):
   40.1   1.0   2.0
    1.0  41.2   3.0
    2.0   3.0  50.3

 A(FC)    38.0   38.0   38.0
 A(SD)    -2.0   -1.0    3.0
 A(ORB)    0.1    0.2    0.3   A(PC) =   0.05
 ----------------------------------------
 A(Tot)   36.1   37.2   41.3   A(iso)=  38.2
 Orientation:
  X   1.0  0.0  0.0
  Y   0.0  1.0  0.0
  Z   0.0  0.0  1.0
";
        let hf = parse_orca_hyperfine(text, "Cu", "N").unwrap();
        assert_eq!(hf.ligand_index, 2);
        assert!((hf.distance - 2.0).abs() < 1e-12);
        assert!((hf.raw[(2, 2)] - 50.3).abs() < 1e-12);
        assert!((hf.a_pc - 0.05).abs() < 1e-12);
        assert!((hf.a_iso - 38.2).abs() < 1e-12);
        assert!((hf.a_tot[2] - 41.3).abs() < 1e-12);

        assert!(matches!(
            parse_orca_hyperfine(text, "Zn", "N"),
            Err(EprError::AtomNotFound(_))
        ));
        assert!(matches!(
            parse_orca_hyperfine(text, "Cu", "S"),
            Err(EprError::AtomNotFound(_))
        ));
    }
}
