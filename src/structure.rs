//! Final geometries, SCF energies and structure comparison across outputs.
//!
//! Geometries come from the last coordinate printout of an output file, so
//! the result is the optimized structure for an optimization and the input
//! structure for anything else. Energies are the first converged SCF energy
//! reported, in Hartree.

use crate::geometry::Geometry;
use crate::scanner::{self, LineCursor, ScanError};
use log::debug;
use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

/// Error type for structure extraction and comparison.
#[derive(Error, Debug)]
pub enum StructureError {
    /// The output could not be scanned
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// No known coordinate block was found
    #[error("No geometry found (looked for Q-Chem and ORCA coordinate blocks)")]
    NoGeometry,
    /// No known SCF energy line was found
    #[error("No SCF energy found")]
    NoEnergy,
    /// Geometries of different size cannot be compared
    #[error("Atom count mismatch: {0} vs {1}")]
    AtomCount(usize, usize),
    /// A geometry without atoms
    #[error("Geometry has no atoms")]
    Empty,
}

type Result<T> = std::result::Result<T, StructureError>;

const QCHEM_GEOMETRY: &str = "Standard Nuclear Orientation";
/// Marker of ORCA's Cartesian coordinate printout.
pub const ORCA_GEOMETRY: &str = "CARTESIAN COORDINATES (ANGSTROEM)";

/// Reads the last `Standard Nuclear Orientation` block of a Q-Chem output.
pub fn parse_qchem_geometry(text: &str) -> std::result::Result<Geometry, ScanError> {
    let mut cursor = LineCursor::new(text);
    cursor.seek_last(QCHEM_GEOMETRY)?;
    cursor.skip(2)?;

    let mut elements = Vec::new();
    let mut coords = Vec::new();
    loop {
        let line = cursor.next_line()?;
        if line.contains("----") {
            break;
        }
        let symbol = line.split_whitespace().nth(1).ok_or_else(|| {
            ScanError::Parse(format!("no atom symbol in geometry line '{}'", line))
        })?;
        elements.push(symbol.to_string());
        coords.extend_from_slice(&scanner::parse_triple(line, 2)?);
    }

    Ok(Geometry::new(elements, coords))
}

/// Reads ORCA coordinate lines (`Sym x y z`) from the cursor up to the next
/// blank line or the end of the text.
pub fn read_orca_coordinates(cursor: &mut LineCursor) -> std::result::Result<Geometry, ScanError> {
    let mut elements = Vec::new();
    let mut coords = Vec::new();
    while let Some(line) = cursor.peek() {
        if line.trim().is_empty() {
            break;
        }
        cursor.next_line()?;
        let symbol = line.split_whitespace().next().unwrap_or_default();
        elements.push(symbol.to_string());
        coords.extend_from_slice(&scanner::parse_triple(line, 1)?);
    }
    Ok(Geometry::new(elements, coords))
}

/// Reads the last `CARTESIAN COORDINATES (ANGSTROEM)` block of an ORCA
/// output.
pub fn parse_orca_geometry(text: &str) -> std::result::Result<Geometry, ScanError> {
    let mut cursor = LineCursor::new(text);
    cursor.seek_last(ORCA_GEOMETRY)?;
    cursor.skip(1)?;
    read_orca_coordinates(&mut cursor)
}

/// Last geometry of a Q-Chem or ORCA output, whichever block the file has.
pub fn last_geometry(text: &str) -> Result<Geometry> {
    if text.contains(QCHEM_GEOMETRY) {
        Ok(parse_qchem_geometry(text)?)
    } else if text.contains(ORCA_GEOMETRY) {
        Ok(parse_orca_geometry(text)?)
    } else {
        Err(StructureError::NoGeometry)
    }
}

/// XYZ text with an empty comment line and `%3s %15.10f` columns.
pub fn format_geometry_xyz(geom: &Geometry) -> String {
    let mut out = format!("{}\n\n", geom.num_atoms);
    for i in 0..geom.num_atoms {
        let [x, y, z] = geom.get_atom_coords(i);
        out.push_str(&format!(
            "{:<3} {:15.10} {:15.10} {:15.10}\n",
            geom.elements[i], x, y, z
        ));
    }
    out
}

enum Field {
    Index(usize),
    Last,
}

// (program, marker, field holding the energy)
const ENERGY_MARKERS: [(&str, &str, Field); 5] = [
    ("Q-Chem", "Total energy in the final basis set =", Field::Last),
    ("ORCA", "FINAL SINGLE POINT ENERGY", Field::Last),
    ("DALTON", "Final HF energy:", Field::Last),
    ("DALTON", "Final DFT energy:", Field::Last),
    ("CFOUR", "E(SCF)=", Field::Index(1)),
];

/// SCF energy of one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct ScfEnergy {
    /// Program that wrote the output
    pub program: &'static str,
    /// Energy in Hartree
    pub energy: f64,
}

/// First SCF energy in an output, with the program recognised from its
/// energy line.
pub fn first_scf_energy(text: &str) -> Result<ScfEnergy> {
    for (program, marker, field) in &ENERGY_MARKERS {
        let mut cursor = LineCursor::new(text);
        if let Some(line) = cursor.try_seek(marker) {
            let index = match field {
                Field::Index(i) => *i,
                Field::Last => line.split_whitespace().count().saturating_sub(1),
            };
            let energy = scanner::field_f64(line, index)?;
            debug!("{} energy {} from '{}'", program, energy, marker);
            return Ok(ScfEnergy {
                program: *program,
                energy,
            });
        }
    }
    Err(StructureError::NoEnergy)
}

fn check_sizes(a: &Geometry, b: &Geometry) -> Result<()> {
    if a.num_atoms != b.num_atoms {
        return Err(StructureError::AtomCount(a.num_atoms, b.num_atoms));
    }
    if a.num_atoms == 0 {
        return Err(StructureError::Empty);
    }
    Ok(())
}

fn positions(geom: &Geometry) -> Vec<Vector3<f64>> {
    (0..geom.num_atoms).map(|i| geom.position(i)).collect()
}

fn centroid(points: &[Vector3<f64>]) -> Vector3<f64> {
    points.iter().fold(Vector3::zeros(), |acc, p| acc + p) / points.len() as f64
}

fn rmsd_of(a: &[Vector3<f64>], b: &[Vector3<f64>]) -> f64 {
    let sum: f64 = a.iter().zip(b).map(|(p, q)| (p - q).norm_squared()).sum();
    (sum / a.len() as f64).sqrt()
}

/// RMSD of the coordinates as given, without any superposition.
pub fn rmsd(a: &Geometry, b: &Geometry) -> Result<f64> {
    check_sizes(a, b)?;
    Ok(rmsd_of(&positions(a), &positions(b)))
}

/// RMSD after removing translation and rotation (Kabsch superposition).
///
/// Atoms are paired by index; no reordering is attempted.
pub fn kabsch_rmsd(a: &Geometry, b: &Geometry) -> Result<f64> {
    check_sizes(a, b)?;
    let p = positions(a);
    let q = positions(b);
    let (cp, cq) = (centroid(&p), centroid(&q));
    let p: Vec<_> = p.iter().map(|v| v - cp).collect();
    let q: Vec<_> = q.iter().map(|v| v - cq).collect();

    let h = p
        .iter()
        .zip(&q)
        .fold(Matrix3::zeros(), |acc, (pi, qi)| acc + pi * qi.transpose());
    let svd = h.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Ok(rmsd_of(&p, &q)),
    };
    let v = v_t.transpose();
    let d = (v * u.transpose()).determinant().signum();
    let rotation = v * Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, d)) * u.transpose();

    let rotated: Vec<_> = p.iter().map(|pi| rotation * pi).collect();
    Ok(rmsd_of(&rotated, &q))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORCA_OUT: &str = "\
---------------------------------
CARTESIAN COORDINATES (ANGSTROEM)
---------------------------------
  O      0.000000    0.000000    0.000000
  H      0.000000    0.000000    1.000000

---------------------------------
CARTESIAN COORDINATES (ANGSTROEM)
---------------------------------
  O      0.000000    0.000000    0.100000
  H      0.000000    0.000000    0.960000

FINAL SINGLE POINT ENERGY       -75.123456789
";

    fn water() -> Geometry {
        Geometry::new(
            vec!["O".into(), "H".into(), "H".into()],
            vec![0.0, 0.0, 0.1173, 0.0, 0.7572, -0.4692, 0.0, -0.7572, -0.4692],
        )
    }

    #[test]
    fn test_last_orca_geometry() {
        let geom = last_geometry(ORCA_OUT).unwrap();
        assert_eq!(geom.elements, vec!["O", "H"]);
        assert_eq!(geom.get_atom_coords(1), [0.0, 0.0, 0.96]);
        assert!(matches!(last_geometry("nothing here"), Err(StructureError::NoGeometry)));
    }

    #[test]
    fn test_format_geometry_xyz() {
        let xyz = format_geometry_xyz(&last_geometry(ORCA_OUT).unwrap());
        let lines: Vec<&str> = xyz.lines().collect();
        assert_eq!(lines[0], "2");
        assert_eq!(lines[1], "");
        assert_eq!(lines[3], "H      0.0000000000    0.0000000000    0.9600000000");
    }

    #[test]
    fn test_first_scf_energy() {
        let e = first_scf_energy(ORCA_OUT).unwrap();
        assert_eq!(e.program, "ORCA");
        assert!((e.energy + 75.123456789).abs() < 1e-12);

        let qchem = " Total energy in the final basis set =      -76.0265946234\n \
                     Total energy in the final basis set =      -76.5000000000\n";
        let e = first_scf_energy(qchem).unwrap();
        assert_eq!(e.program, "Q-Chem");
        assert!((e.energy + 76.0265946234).abs() < 1e-12);

        let cfour = "  E(SCF)=       -76.0123456789              0.1D-08\n";
        assert!((first_scf_energy(cfour).unwrap().energy + 76.0123456789).abs() < 1e-12);
        assert!(matches!(first_scf_energy(""), Err(StructureError::NoEnergy)));
    }

    #[test]
    fn test_kabsch_removes_rotation_and_translation() {
        let a = water();
        // 90 degrees about z, then shifted
        let moved: Vec<f64> = (0..a.num_atoms)
            .flat_map(|i| {
                let [x, y, z] = a.get_atom_coords(i);
                [-y + 1.0, x - 2.0, z + 0.5]
            })
            .collect();
        let b = Geometry::new(a.elements.clone(), moved);

        assert!(rmsd(&a, &b).unwrap() > 1.0);
        assert!(kabsch_rmsd(&a, &b).unwrap() < 1e-10);
        assert!(kabsch_rmsd(&a, &a).unwrap() < 1e-12);
    }

    #[test]
    fn test_kabsch_keeps_real_differences() {
        let a = water();
        let mut b = a.clone();
        b.coords[5] -= 0.1;
        let r = kabsch_rmsd(&a, &b).unwrap();
        assert!(r > 0.0 && r <= rmsd(&a, &b).unwrap() + 1e-12);
    }

    #[test]
    fn test_size_mismatch() {
        let a = water();
        let b = Geometry::new(vec!["O".into()], vec![0.0; 3]);
        assert!(matches!(rmsd(&a, &b), Err(StructureError::AtomCount(3, 1))));
        let empty = Geometry::new(Vec::new(), Vec::new());
        assert!(matches!(kabsch_rmsd(&empty, &empty), Err(StructureError::Empty)));
    }
}
