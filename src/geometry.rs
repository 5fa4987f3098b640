//! Molecular geometry shared by the format converters and output parsers.
//!
//! - [`Geometry`]: element symbols with flattened Cartesian coordinates
//!
//! All coordinates are in Angstrom unless a function says otherwise.

use crate::elements;
use crate::scanner::ScanError;
use nalgebra::{DVector, Vector3};

/// Bohr radius in Angstrom.
pub const BOHR_TO_ANGSTROM: f64 = 0.5291772109;

/// Represents a molecular geometry with atomic elements and Cartesian coordinates.
///
/// Coordinates use the flat layout `[x1, y1, z1, x2, y2, z2, ...]` so that
/// normal-mode displacement vectors from frequency calculations line up with
/// them index for index.
///
/// # Examples
///
/// ```
/// use qctools::geometry::Geometry;
///
/// let geometry = Geometry::new(
///     vec!["O".to_string(), "H".to_string(), "H".to_string()],
///     vec![0.0, 0.0, 0.0, 0.757, 0.586, 0.0, -0.757, 0.586, 0.0],
/// );
/// assert_eq!(geometry.num_atoms, 3);
/// assert_eq!(geometry.get_atom_coords(1), [0.757, 0.586, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Chemical element symbols for each atom in order
    pub elements: Vec<String>,
    /// Flattened Cartesian coordinates [x1, y1, z1, x2, y2, z2, ...]
    pub coords: DVector<f64>,
    /// Number of atoms in the molecule
    pub num_atoms: usize,
}

impl Geometry {
    /// Create a new `Geometry` from element list and coordinate vector.
    ///
    /// # Panics
    ///
    /// Panics if `coords.len() != elements.len() * 3`.
    pub fn new(elements: Vec<String>, coords: Vec<f64>) -> Self {
        let num_atoms = elements.len();
        assert_eq!(coords.len(), num_atoms * 3);
        Self {
            elements,
            coords: DVector::from_vec(coords),
            num_atoms,
        }
    }

    /// Get the Cartesian coordinates of a specific atom.
    pub fn get_atom_coords(&self, atom_idx: usize) -> [f64; 3] {
        let i = atom_idx * 3;
        [self.coords[i], self.coords[i + 1], self.coords[i + 2]]
    }

    /// Position of an atom as a 3-vector.
    pub fn position(&self, atom_idx: usize) -> Vector3<f64> {
        Vector3::from(self.get_atom_coords(atom_idx))
    }

    /// Cartesian distance between two atoms.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        (self.position(i) - self.position(j)).norm()
    }

    /// Atomic numbers for all atoms.
    ///
    /// # Errors
    ///
    /// Fails on the first symbol that is not a known element.
    pub fn atomic_numbers(&self) -> Result<Vec<u32>, ScanError> {
        self.elements
            .iter()
            .map(|sym| {
                elements::symbol_to_number(sym)
                    .ok_or_else(|| ScanError::Parse(format!("unknown element symbol '{}'", sym)))
            })
            .collect()
    }

    /// Centre of mass using standard atomic weights.
    pub fn center_of_mass(&self) -> Result<Vector3<f64>, ScanError> {
        let masses = self
            .atomic_numbers()?
            .into_iter()
            .map(|z| elements::atomic_mass(z).unwrap_or(0.0))
            .collect::<Vec<_>>();
        Ok(self.weighted_center(&masses))
    }

    /// Centre of nuclear charge.
    pub fn center_of_nuclear_charge(&self) -> Result<Vector3<f64>, ScanError> {
        let charges: Vec<f64> = self.atomic_numbers()?.into_iter().map(f64::from).collect();
        Ok(self.weighted_center(&charges))
    }

    fn weighted_center(&self, weights: &[f64]) -> Vector3<f64> {
        let total: f64 = weights.iter().sum();
        let sum = weights
            .iter()
            .enumerate()
            .fold(Vector3::zeros(), |acc, (i, w)| acc + self.position(i) * *w);
        sum / total
    }

    /// Returns a copy with all coordinates multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            elements: self.elements.clone(),
            coords: &self.coords * factor,
            num_atoms: self.num_atoms,
        }
    }
}
