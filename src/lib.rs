#![deny(missing_docs)]

//! qctools - utilities for computational chemistry workflows
//!
//! A collection of independent tools around quantum chemistry programs:
//! scrapers for the plain-text output of ORCA, Q-Chem, DALTON and ADF,
//! job-file generators for PBS and SLURM, molecular file format converters,
//! and bulk file processing such as directory comparison and cube file
//! renaming.
//!
//! Most output scrapers are built on [`scanner::LineCursor`]: find a marker
//! line, then consume a fixed number of following lines and read values from
//! fixed column ranges.
//!
//! # Quick Start
//!
//! ```no_run
//! use qctools::{covp::CovpAnalysis, scanner};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let text = scanner::read_to_string(Path::new("eda.out"))?;
//!     let analysis = CovpAnalysis::from_output(&text)?;
//!     println!("{}", analysis.format_report(2.0));
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`scanner`](scanner/index.html) - Marker-driven line cursor and fixed-column parsing
//! - [`elements`](elements/index.html) - Periodic table lookups
//! - [`geometry`](geometry/index.html) - Molecular geometry
//! - [`io`](io/index.html) - XYZ files
//! - [`convert`](convert/index.html) - XYZ to DALTON/GAMESS, PDB residue extraction
//! - [`molden`](molden/index.html) - Molden file repair
//! - [`epr`](epr/index.html) - g-tensors and hyperfine tensors (ORCA, ADF, DALTON)
//! - [`covp`](covp/index.html) - Q-Chem COVP charge-transfer analysis
//! - [`vmd`](vmd/index.html) - VMD scripts for rendering COVPs
//! - [`structure`](structure/index.html) - Last geometries, SCF energies, RMSD
//! - [`vibrations`](vibrations/index.html) - Q-Chem harmonic and anharmonic frequencies
//! - [`jobs`](jobs/index.html) - PBS/SLURM job files and template sweeps
//! - [`dircompare`](dircompare/index.html) - Directory tree comparison
//! - [`batch`](batch/index.html) - Bulk file operations
//! - [`settings`](settings/index.html) - Configuration files

pub mod batch;
/// XYZ and PDB conversion to program input formats
pub mod convert;
pub mod covp;
/// Directory tree comparison
pub mod dircompare;
pub mod elements;
/// EPR tensor extraction
pub mod epr;
pub mod geometry;
pub mod io;
/// Scheduler job files and template sweeps
pub mod jobs;
pub mod molden;
pub mod scanner;
/// Configuration management system
pub mod settings;
pub mod structure;
pub mod vibrations;
pub mod vmd;

pub use geometry::Geometry;
pub use scanner::{LineCursor, ScanError};
