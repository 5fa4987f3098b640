//! XYZ file reading and writing.
//!
//! The XYZ format is a plain-text format for molecular geometries:
//! 1. Number of atoms
//! 2. A comment line
//! 3. One line per atom: `Element X Y Z`

use crate::geometry::Geometry;
use crate::scanner::{self, ScanError};
use std::fs;
use std::path::Path;

type Result<T> = std::result::Result<T, ScanError>;

/// Parses the contents of an XYZ file.
///
/// Columns after the fourth on an atom line are ignored, as are lines after
/// the last atom.
///
/// # Examples
///
/// ```
/// use qctools::io::parse_xyz;
///
/// let geom = parse_xyz("2\nCO\nC 0.0 0.0 0.0\nO 0.0 0.0 1.128\n").unwrap();
/// assert_eq!(geom.elements, vec!["C", "O"]);
/// ```
pub fn parse_xyz(content: &str) -> Result<Geometry> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 2 {
        return Err(ScanError::Parse("Invalid XYZ file: not enough lines".into()));
    }

    let num_atoms = lines[0].trim().parse::<usize>().map_err(|_| {
        ScanError::Parse(format!(
            "Invalid XYZ file: cannot parse number of atoms from '{}'",
            lines[0].trim()
        ))
    })?;

    if lines.len() < 2 + num_atoms {
        return Err(ScanError::UnexpectedEof(format!(
            "XYZ geometry ({} atoms declared, {} lines present)",
            num_atoms,
            lines.len().saturating_sub(2)
        )));
    }

    let mut elements = Vec::with_capacity(num_atoms);
    let mut coords = Vec::with_capacity(3 * num_atoms);

    for line in &lines[2..2 + num_atoms] {
        let symbol = line.split_whitespace().next().ok_or_else(|| {
            ScanError::Parse("Invalid XYZ file: blank line inside coordinate block".into())
        })?;
        let xyz = scanner::parse_triple(line, 1)?;
        elements.push(symbol.to_string());
        coords.extend_from_slice(&xyz);
    }

    Ok(Geometry::new(elements, coords))
}

/// Reads a geometry from an XYZ file.
pub fn read_xyz(path: &Path) -> Result<Geometry> {
    parse_xyz(&scanner::read_to_string(path)?)
}

/// Formats a geometry as XYZ text with the given comment line.
pub fn format_xyz(geom: &Geometry, comment: &str) -> String {
    let mut content = format!("{}\n{}\n", geom.num_atoms, comment);

    for i in 0..geom.num_atoms {
        let coords = geom.get_atom_coords(i);
        content.push_str(&format!(
            "{}  {:.8}  {:.8}  {:.8}\n",
            geom.elements[i], coords[0], coords[1], coords[2]
        ));
    }

    content
}

/// Writes a molecular geometry to an XYZ file with an empty comment line.
pub fn write_xyz(geom: &Geometry, path: &Path) -> std::io::Result<()> {
    fs::write(path, format_xyz(geom, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_extra_columns() {
        let geom = parse_xyz("1\n\nCu 1.0 2.0 3.0 0.25\n").unwrap();
        assert_eq!(geom.elements, vec!["Cu"]);
        assert_eq!(geom.get_atom_coords(0), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_truncated_file() {
        let err = parse_xyz("3\ncomment\nH 0 0 0\n").unwrap_err();
        assert!(matches!(err, ScanError::UnexpectedEof(_)));
    }

    #[test]
    fn test_bad_count() {
        assert!(parse_xyz("three\n\nH 0 0 0\n").is_err());
    }

    #[test]
    fn test_format_then_parse() {
        let geom = parse_xyz("2\n\nH 0.0 0.0 0.0\nH 0.0 0.0 0.74\n").unwrap();
        let text = format_xyz(&geom, "H2");
        assert!(text.starts_with("2\nH2\n"));
        assert_eq!(parse_xyz(&text).unwrap(), geom);
    }
}
