//! Molden file repair.
//!
//! Several programs write Molden files that Molden itself reads but other
//! viewers reject: sections out of order, coordinates in Bohr, extra or
//! duplicated headers. [`fix_molden`] rewrites such a file into the canonical
//! section order with Angstrom coordinates.

use crate::geometry::BOHR_TO_ANGSTROM;
use crate::scanner::ScanError;
use log::{debug, warn};

type Result<T> = std::result::Result<T, ScanError>;

/// Basis-function flag sections. They carry no body.
pub const BASIS_FLAGS: [&str; 5] = ["[5D]", "[5D10F]", "[7F]", "[5D7F]", "[9G]"];

/// Output section order.
pub const TARGET_ORDERING: [&str; 17] = [
    "[Molden Format]",
    "[Atoms] Angs",
    "[GTO]",
    "[STO]",
    "[5D]",
    "[5D10F]",
    "[7F]",
    "[5D7F]",
    "[9G]",
    "[MO]",
    "[SCFCONV]",
    "[GEOCONV]",
    "[GEOMETRIES]",
    "[FREQ]",
    "[FR-COORD]",
    "[FR-NORM-COORD]",
    "[INT]",
];

/// A section header with its body lines.
pub type Section = (String, Vec<String>);

/// Splits Molden text into `[HEADER]` sections.
///
/// Sections keep the order of their first appearance. A header seen again
/// starts its body over, so the last occurrence wins. Lines before the first
/// header are dropped.
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<usize> = None;

    for line in text.lines() {
        if line.starts_with('[') {
            let header = line.trim().to_string();
            current = match sections.iter().position(|(h, _)| *h == header) {
                Some(i) => {
                    debug!("repeated section {}, keeping the later one", header);
                    sections[i].1.clear();
                    Some(i)
                }
                None => {
                    sections.push((header, Vec::new()));
                    Some(sections.len() - 1)
                }
            };
        } else if let Some(i) = current {
            sections[i].1.push(line.to_string());
        }
    }

    sections
}

/// Converts `[Atoms] AU` lines to Angstrom.
///
/// Each line reads `Sym index Z x y z`; blank lines pass through unchanged.
fn atoms_to_angstrom(lines: &[String]) -> Result<Vec<String>> {
    lines
        .iter()
        .map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                return Ok(line.clone());
            }
            if fields.len() < 6 {
                return Err(ScanError::Parse(format!(
                    "atom line '{}' has {} fields, expected 6",
                    line,
                    fields.len()
                )));
            }
            let mut xyz = [0.0; 3];
            for (slot, tok) in xyz.iter_mut().zip(&fields[3..6]) {
                let bohr: f64 = tok.parse().map_err(|_| {
                    ScanError::Parse(format!("bad coordinate '{}' in atom line '{}'", tok, line))
                })?;
                *slot = bohr * BOHR_TO_ANGSTROM;
            }
            Ok(format!(
                "{:>3} {:>8} {:>3} {:>20.12} {:>20.12} {:>20.12}",
                fields[0], fields[1], fields[2], xyz[0], xyz[1], xyz[2]
            ))
        })
        .collect()
}

/// Normalises section headers and bodies.
///
/// The first `[Atoms]` section becomes `[Atoms] Angs` (converted from Bohr
/// when its header says `AU`). Only the first `[GTO]` and `[MO]` sections are
/// kept. Flag sections lose their bodies. `[Molden Format]` is always present.
/// The result follows [`TARGET_ORDERING`]; anything else is dropped.
pub fn repair(sections: &[Section]) -> Result<Vec<Section>> {
    let mut fixed: Vec<Section> = vec![("[Molden Format]".to_string(), Vec::new())];
    let has = |fixed: &[Section], key: &str| fixed.iter().any(|(h, _)| h == key);

    for (header, body) in sections {
        if header.contains("[Atoms]") {
            if has(&fixed, "[Atoms] Angs") {
                continue;
            }
            let lines = if header.contains("AU") {
                debug!("converting {} atom lines from Bohr", body.len());
                atoms_to_angstrom(body)?
            } else {
                body.clone()
            };
            fixed.push(("[Atoms] Angs".to_string(), lines));
        } else if header.contains("[GTO]") {
            if !has(&fixed, "[GTO]") {
                fixed.push(("[GTO]".to_string(), body.clone()));
            }
        } else if BASIS_FLAGS.contains(&header.as_str()) {
            if !has(&fixed, header) {
                fixed.push((header.clone(), Vec::new()));
            }
        } else if header.contains("[MO]") {
            if !has(&fixed, "[MO]") {
                fixed.push(("[MO]".to_string(), body.clone()));
            }
        } else if !has(&fixed, header) {
            fixed.push((header.clone(), body.clone()));
        }
    }

    for (header, _) in &fixed {
        if !TARGET_ORDERING.contains(&header.as_str()) {
            warn!("dropping non-standard section {}", header);
        }
    }

    let ordered = TARGET_ORDERING
        .iter()
        .filter_map(|key| fixed.iter().find(|(h, _)| h == key).cloned())
        .collect();
    Ok(ordered)
}

/// Renders sections back to Molden text.
pub fn format_molden(sections: &[Section]) -> String {
    let mut out = String::new();
    for (header, body) in sections {
        out.push_str(header);
        out.push('\n');
        let bare = header == "[Molden Format]" || BASIS_FLAGS.contains(&header.as_str());
        if !bare {
            out.push_str(&body.join("\n"));
            out.push('\n');
        }
    }
    out
}

/// Splits, repairs and re-renders a Molden file in one go.
pub fn fix_molden(text: &str) -> Result<String> {
    Ok(format_molden(&repair(&split_sections(text))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORCA_LIKE: &str = "\
preamble
[Molden Format]
[Title]
 water
[Atoms] AU
O 1 8 0.0 0.0 1.0
[GTO]
  1 0
s 1 1.0
[MO]
 Ene= -1.0
[5D]
[Atoms] Angs
H 2 1 0.0 0.0 0.0
";

    #[test]
    fn test_split_sections_keeps_first_order() {
        let sections = split_sections(ORCA_LIKE);
        let headers: Vec<&str> = sections.iter().map(|(h, _)| h.as_str()).collect();
        assert_eq!(
            headers,
            vec!["[Molden Format]", "[Title]", "[Atoms] AU", "[GTO]", "[MO]", "[5D]", "[Atoms] Angs"]
        );
        assert_eq!(sections[1].1, vec![" water"]);
    }

    #[test]
    fn test_repeated_header_keeps_last_body() {
        let sections = split_sections("[MO]\na\n[GTO]\nb\n[MO]\nc\nd\n");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].0, "[MO]");
        assert_eq!(sections[0].1, vec!["c", "d"]);
    }

    #[test]
    fn test_repair_orders_and_converts() {
        let fixed = repair(&split_sections(ORCA_LIKE)).unwrap();
        let headers: Vec<&str> = fixed.iter().map(|(h, _)| h.as_str()).collect();
        assert_eq!(
            headers,
            vec!["[Molden Format]", "[Atoms] Angs", "[GTO]", "[5D]", "[MO]"]
        );
        let atom = &fixed[1].1[0];
        let fields: Vec<&str> = atom.split_whitespace().collect();
        assert_eq!(fields[0], "O");
        let z: f64 = fields[5].parse().unwrap();
        assert!((z - BOHR_TO_ANGSTROM).abs() < 1e-10);
        assert_eq!(fixed[1].1.len(), 1);
    }

    #[test]
    fn test_format_bare_sections() {
        let text = fix_molden("[5D]\n[GTO]\ng\n").unwrap();
        assert_eq!(text, "[Molden Format]\n[GTO]\ng\n[5D]\n");
    }

    #[test]
    fn test_bad_au_line() {
        assert!(repair(&split_sections("[Atoms] AU\nO 1 8 x 0 0\n")).is_err());
    }
}
