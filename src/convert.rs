//! Conversions from XYZ and PDB geometries into program-specific formats.
//!
//! - [`xyz_to_dalton`]: the `MOLECULE` atom section of a DALTON `.mol` input
//! - [`xyz_to_gamess`]: atom lines for a GAMESS `$DATA` group
//! - [`extract_pdb_residues`]: pull selected residues out of a PDB file

use crate::elements;
use crate::geometry::Geometry;
use crate::scanner::ScanError;
use log::debug;

type Result<T> = std::result::Result<T, ScanError>;

/// Builds the atom section of a DALTON molecule input.
///
/// Runs of consecutive atoms with the same nuclear charge form one atom
/// type, each introduced by a `Charge=<Z> Atoms=<count>` line. Atoms of the
/// same element that are not adjacent end up in separate types; reorder the
/// XYZ file first if fewer types are wanted.
///
/// # Examples
///
/// ```
/// use qctools::convert::xyz_to_dalton;
/// use qctools::io::parse_xyz;
///
/// let geom = parse_xyz("3\n\nO 0 0 0\nH 0 0 0.96\nH 0 0.93 -0.24\n").unwrap();
/// let mol = xyz_to_dalton(&geom, 0).unwrap();
/// let lines: Vec<&str> = mol.lines().collect();
/// assert_eq!(lines[0], "Atomtypes=2 Angstrom Charge=0 Nosymmetry");
/// assert_eq!(lines[1], "Charge=8.0 Atoms=1");
/// assert_eq!(lines[3], "Charge=1.0 Atoms=2");
/// ```
pub fn xyz_to_dalton(geom: &Geometry, total_charge: i32) -> Result<String> {
    let numbers = geom.atomic_numbers()?;

    // (nuclear charge, atom lines) per atom type, in input order
    let mut types: Vec<(u32, Vec<String>)> = Vec::new();
    for (i, &z) in numbers.iter().enumerate() {
        let c = geom.get_atom_coords(i);
        let line = format!(
            "{} {:20.12} {:20.12} {:20.12}",
            geom.elements[i], c[0], c[1], c[2]
        );
        match types.last_mut() {
            Some((last_z, lines)) if *last_z == z => lines.push(line),
            _ => types.push((z, vec![line])),
        }
    }

    let mut out = vec![format!(
        "Atomtypes={} Angstrom Charge={} Nosymmetry",
        types.len(),
        total_charge
    )];
    for (z, lines) in types {
        out.push(format!("Charge={:.1} Atoms={}", z as f64, lines.len()));
        out.extend(lines);
    }

    Ok(out.join("\n"))
}

/// Builds GAMESS `$DATA` atom lines (` Sym Z x y z`) from XYZ file text.
///
/// Coordinates are copied as written in the XYZ file, so their precision is
/// unchanged. The count and comment lines are skipped.
pub fn xyz_to_gamess(xyz: &str) -> Result<String> {
    let mut content = String::new();
    for line in xyz.lines().skip(2).filter(|l| !l.trim().is_empty()) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [symbol, x, y, z] = fields.as_slice() else {
            return Err(ScanError::Parse(format!(
                "expected 'symbol x y z' in XYZ line '{}'",
                line
            )));
        };
        let number = elements::symbol_to_number(symbol)
            .ok_or_else(|| ScanError::Parse(format!("unknown element symbol '{}'", symbol)))?;
        content.push_str(&format!(" {} {:.1} {} {} {}\n", symbol, number as f64, x, y, z));
    }
    Ok(content)
}

/// Extracts the atoms of the requested residues from PDB file contents.
///
/// Records are split on whitespace; `TER` and `END` cards and blank lines are
/// skipped. The residue number is the 5th field, the coordinates fields 6-8
/// and the element symbol field 11. Atoms are collected residue by residue in
/// the order the residues are requested.
pub fn extract_pdb_residues(pdb: &str, residues: &[String]) -> Result<Geometry> {
    let records: Vec<Vec<&str>> = pdb
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|fields| !fields.is_empty() && fields[0] != "TER" && fields[0] != "END")
        .collect();

    let mut elements_out = Vec::new();
    let mut coords = Vec::new();

    for residue in residues {
        let mut found = 0usize;
        for fields in &records {
            if fields.get(4) != Some(&residue.as_str()) {
                continue;
            }
            if fields.len() < 11 {
                return Err(ScanError::Parse(format!(
                    "PDB record for residue {} has {} fields, expected at least 11",
                    residue,
                    fields.len()
                )));
            }
            for k in 5..8 {
                let v: f64 = fields[k].parse().map_err(|_| {
                    ScanError::Parse(format!("bad PDB coordinate '{}'", fields[k]))
                })?;
                coords.push(v);
            }
            elements_out.push(
                elements::canonical_symbol(fields[10])
                    .map(str::to_string)
                    .unwrap_or_else(|| fields[10].to_string()),
            );
            found += 1;
        }
        debug!("residue {}: {} atoms", residue, found);
    }

    Ok(Geometry::new(elements_out, coords))
}

/// Formats an extracted PDB selection as XYZ with exponent-notation coordinates.
pub fn format_pdb_xyz(geom: &Geometry) -> String {
    let mut content = format!("{}\n\n", geom.num_atoms);
    for i in 0..geom.num_atoms {
        let c = geom.get_atom_coords(i);
        content.push_str(&format!(
            "{:<2} {} {} {}\n",
            geom.elements[i],
            sci(c[0]),
            sci(c[1]),
            sci(c[2])
        ));
    }
    content.push('\n');
    content
}

/// C-style `%12.5e`: five decimals, signed two-digit exponent, right aligned.
fn sci(value: f64) -> String {
    let s = format!("{:.5e}", value);
    let (mantissa, exp) = s.split_once('e').unwrap_or((&s, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{:>12}", format!("{}e{}{:02}", mantissa, sign, exp.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_xyz;

    #[test]
    fn test_dalton_non_adjacent_types() {
        let geom = parse_xyz("4\n\nC 0 0 0\nH 1 0 0\nC 2 0 0\nC 3 0 0\n").unwrap();
        let mol = xyz_to_dalton(&geom, -1).unwrap();
        let lines: Vec<&str> = mol.lines().collect();
        assert_eq!(lines[0], "Atomtypes=3 Angstrom Charge=-1 Nosymmetry");
        assert_eq!(lines[1], "Charge=6.0 Atoms=1");
        assert_eq!(lines[3], "Charge=1.0 Atoms=1");
        assert_eq!(lines[5], "Charge=6.0 Atoms=2");
        assert_eq!(lines.len(), 8);
        assert!(lines[2].starts_with("C "));
        assert!(lines[2].ends_with("0.000000000000"));
    }

    #[test]
    fn test_gamess_lines() {
        let text = "2\n\nO 0.500000 0 -1.000000\nH 1.0 0.0 0.0\n\n";
        assert_eq!(
            xyz_to_gamess(text).unwrap(),
            " O 8.0 0.500000 0 -1.000000\n H 1.0 1.0 0.0 0.0\n"
        );
        assert!(xyz_to_gamess("1\n\nO 0.5 0\n").is_err());
        assert!(xyz_to_gamess("1\n\nDu 0 0 0\n").is_err());
    }

    #[test]
    fn test_unknown_element_is_an_error() {
        let geom = parse_xyz("1\n\nDu 0 0 0\n").unwrap();
        assert!(xyz_to_dalton(&geom, 0).is_err());
    }

    const PDB: &str = "\
ATOM      1  N   HIS A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  HIS A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  O   WAT A   2       1.000   2.000   3.000  1.00  0.00           O
TER
END
";

    #[test]
    fn test_extract_pdb_residues() {
        let pdb = PDB.replace(" A ", " ");
        let geom = extract_pdb_residues(&pdb, &["2".to_string(), "1".to_string()]).unwrap();
        assert_eq!(geom.elements, vec!["O", "N", "C"]);
        assert_eq!(geom.get_atom_coords(0), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_format_pdb_xyz() {
        let geom = Geometry::new(vec!["O".into()], vec![1.0, -0.00123, 250.0]);
        let text = format_pdb_xyz(&geom);
        assert_eq!(
            text,
            "1\n\nO   1.00000e+00 -1.23000e-03  2.50000e+02\n\n"
        );
    }
}
