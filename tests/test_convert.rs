use qctools::convert::{extract_pdb_residues, format_pdb_xyz, xyz_to_dalton, xyz_to_gamess};
use qctools::io::{read_xyz, write_xyz};
use qctools::molden::fix_molden;
use std::fs;
use tempfile::TempDir;

const WATER_XYZ: &str = "3
water
O    0.000000    0.000000    0.117300
H    0.000000    0.757200   -0.469200
H    0.000000   -0.757200   -0.469200
";

#[test]
fn test_xyz_file_to_dalton_and_gamess() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("water.xyz");
    fs::write(&path, WATER_XYZ).unwrap();

    let geom = read_xyz(&path).unwrap();
    assert_eq!(geom.num_atoms, 3);

    let dalton = xyz_to_dalton(&geom, 0).unwrap();
    let lines: Vec<&str> = dalton.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "Atomtypes=2 Angstrom Charge=0 Nosymmetry");
    assert_eq!(lines[1], "Charge=8.0 Atoms=1");
    assert_eq!(lines[3], "Charge=1.0 Atoms=2");
    let fields: Vec<f64> = lines[4]
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse().unwrap())
        .collect();
    assert!((fields[1] - 0.7572).abs() < 1e-12);

    let gamess = xyz_to_gamess(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(gamess.starts_with(" O 8.0 0.000000 0.000000 0.117300\n"));
    assert_eq!(gamess.lines().count(), 3);
}

#[test]
fn test_xyz_write_read_preserves_geometry() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("in.xyz");
    let dst = dir.path().join("out.xyz");
    fs::write(&src, WATER_XYZ).unwrap();

    let geom = read_xyz(&src).unwrap();
    write_xyz(&geom, &dst).unwrap();
    let again = read_xyz(&dst).unwrap();
    assert_eq!(again.elements, geom.elements);
    assert!((again.distance(0, 1) - geom.distance(0, 1)).abs() < 1e-8);
}

#[test]
fn test_pdb_extraction_in_request_order() {
    let pdb = "\
ATOM      1  N   ALA     1      11.104   6.134  -6.504  1.00  0.00 N
ATOM      2  CA  ALA     1      11.639   6.071  -5.147  1.00  0.00 C
TER
ATOM      3  O   HOH     2       1.000   2.000   3.000  1.00  0.00 O
END
";
    let geom = extract_pdb_residues(pdb, &["2".to_string(), "1".to_string()]).unwrap();
    assert_eq!(geom.elements, vec!["O", "N", "C"]);

    let xyz = format_pdb_xyz(&geom);
    let lines: Vec<&str> = xyz.split('\n').collect();
    assert_eq!(lines[0], "3");
    assert_eq!(lines[1], "");
    assert_eq!(lines[2], "O   1.00000e+00  2.00000e+00  3.00000e+00");
    assert_eq!(lines[3], "N   1.11040e+01  6.13400e+00 -6.50400e+00");
    assert!(xyz.ends_with("\n\n"));
}

#[test]
fn test_fix_molden_bohr_file() {
    let text = "\
[Molden Format]
[Atoms] AU
O 1 8 0.0 0.0 1.8897261246
[MO]
 Sym= A
[GTO]
  1 0
[5D]
[Title]
 water
";
    let fixed = fix_molden(text).unwrap();
    let headers: Vec<&str> = fixed.lines().filter(|l| l.starts_with('[')).collect();
    assert_eq!(headers, vec!["[Molden Format]", "[Atoms] Angs", "[GTO]", "[5D]", "[MO]"]);

    let atom = fixed.lines().nth(2).unwrap();
    let z: f64 = atom.split_whitespace().last().unwrap().parse().unwrap();
    assert!((z - 1.0).abs() < 1e-9);
}
