//! Element symbols, atomic numbers and atomic masses.

const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", // 1-10
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", // 11-20
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", // 21-30
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", // 31-40
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", // 41-50
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", // 51-60
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", // 61-70
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", // 71-80
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", // 81-90
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", // 91-100
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", // 101-110
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og", // 111-118
];

// Standard atomic weights; mass number of the longest-lived isotope for
// elements without one.
const MASSES: [f64; 118] = [
    1.008, 4.002602, 6.94, 9.0121831, 10.81, 12.011, 14.007, 15.999, 18.998403163, 20.1797, // 1-10
    22.98976928, 24.305, 26.9815385, 28.085, 30.973761998, 32.06, 35.45, 39.948, 39.0983, 40.078, // 11-20
    44.955908, 47.867, 50.9415, 51.9961, 54.938044, 55.845, 58.933194, 58.6934, 63.546, 65.38, // 21-30
    69.723, 72.630, 74.921595, 78.971, 79.904, 83.798, 85.4678, 87.62, 88.90584, 91.224, // 31-40
    92.90637, 95.95, 98.0, 101.07, 102.90550, 106.42, 107.8682, 112.414, 114.818, 118.710, // 41-50
    121.760, 127.60, 126.90447, 131.293, 132.90545196, 137.327, 138.90547, 140.116, 140.90766, 144.242, // 51-60
    145.0, 150.36, 151.964, 157.25, 158.92535, 162.500, 164.93033, 167.259, 168.93422, 173.045, // 61-70
    174.9668, 178.49, 180.94788, 183.84, 186.207, 190.23, 192.217, 195.084, 196.966569, 200.592, // 71-80
    204.38, 207.2, 208.98040, 209.0, 210.0, 222.0, 223.0, 226.0, 227.0, 232.0377, // 81-90
    231.03588, 238.02891, 237.0, 244.0, 243.0, 247.0, 247.0, 251.0, 252.0, 257.0, // 91-100
    258.0, 259.0, 266.0, 267.0, 268.0, 269.0, 270.0, 277.0, 278.0, 281.0, // 101-110
    282.0, 285.0, 286.0, 289.0, 290.0, 293.0, 294.0, 294.0, // 111-118
];

/// Returns the element symbol for an atomic number, or `"X"` if unknown.
///
/// ```
/// use qctools::elements::number_to_symbol;
///
/// assert_eq!(number_to_symbol(29), "Cu");
/// assert_eq!(number_to_symbol(0), "X");
/// ```
pub fn number_to_symbol(num: u32) -> &'static str {
    match num {
        1..=118 => SYMBOLS[(num - 1) as usize],
        _ => "X",
    }
}

/// Returns the atomic number for an element symbol.
///
/// Matching ignores case (`"CU"`, `"cu"` and `"Cu"` are all copper). Symbols
/// carrying a numeric label, as some programs print them (`"C1"`, `"O12"`),
/// are matched on their alphabetic prefix.
pub fn symbol_to_number(symbol: &str) -> Option<u32> {
    let letters: String = symbol
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    SYMBOLS
        .iter()
        .position(|s| s.eq_ignore_ascii_case(&letters))
        .map(|i| i as u32 + 1)
}

/// Normalises a symbol to its canonical capitalisation (`"CU"` -> `"Cu"`).
pub fn canonical_symbol(symbol: &str) -> Option<&'static str> {
    symbol_to_number(symbol).map(number_to_symbol)
}

/// Standard atomic weight in atomic mass units.
pub fn atomic_mass(num: u32) -> Option<f64> {
    match num {
        1..=118 => Some(MASSES[(num - 1) as usize]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_whole_table() {
        for z in 1..=118 {
            assert_eq!(symbol_to_number(number_to_symbol(z)), Some(z));
        }
    }

    #[test]
    fn test_symbol_variants() {
        assert_eq!(symbol_to_number("cu"), Some(29));
        assert_eq!(symbol_to_number("C1"), Some(6));
        assert_eq!(symbol_to_number(" O "), Some(8));
        assert_eq!(symbol_to_number("Zz"), None);
        assert_eq!(symbol_to_number("12"), None);
        assert_eq!(canonical_symbol("FE"), Some("Fe"));
    }

    #[test]
    fn test_atomic_mass() {
        assert_eq!(atomic_mass(6), Some(12.011));
        assert_eq!(atomic_mass(29), Some(63.546));
        assert_eq!(atomic_mass(118), Some(294.0));
        assert_eq!(atomic_mass(0), None);
    }
}
