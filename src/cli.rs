use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use qctools::batch::GroupAction;
use qctools::jobs::{Program, Scheduler};

/// Parsers, converters and job-file generators for quantum chemistry.
#[derive(Parser)]
#[command(name = "qctools", author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Principal g-tensor values from ORCA outputs
    OrcaGtensor {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Also print the contribution breakdown
        #[arg(long)]
        contributions: bool,
    },
    /// g_para / g_perp / g_iso from the first g(tot) line of ORCA outputs
    OrcaGtot {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// g-tensor and A-tensor of the ligand atom nearest the metal
    OrcaHyperfine {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "Cu")]
        metal: String,
        #[arg(long, default_value = "N")]
        ligand: String,
    },
    /// Principal g-values from ADF outputs
    AdfEpr {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// g-shift tensors from DALTON outputs
    DaltonGshift {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Complementary occupied-virtual pair analysis of a Q-Chem output
    Covp {
        output: PathBuf,
        /// Energy percentage cutoff; 0 shows the whole table [default: from config]
        #[arg(long)]
        pct_cutoff: Option<f64>,
        /// Write separate VMD load/render scripts for this XYZ file
        #[arg(long, value_name = "XYZ")]
        plot_separate: Option<PathBuf>,
        /// Write a single VMD load+render script for this XYZ file
        #[arg(long, value_name = "XYZ")]
        plot_combined: Option<PathBuf>,
        /// Dump the selected pairs to JSON
        #[arg(long)]
        json: bool,
        /// Delete cube files of orbitals below the cutoff
        #[arg(long = "del")]
        delete: bool,
    },
    /// Frequencies of CO2-dominated normal modes in Q-Chem outputs
    Co2Modes {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Fraction of the displacement carried by CO2 [default: from config]
        #[arg(long)]
        thresh: Option<f64>,
        /// Also write a CSV file
        #[arg(long)]
        csv: bool,
        #[arg(long, default_value = "frequencies.csv")]
        csv_filename: PathBuf,
    },
    /// TOSH, VPT2 and VCI frequencies from a Q-Chem anharmonic calculation
    Vci { output: PathBuf },
    /// Write (and optionally submit) scheduler job files
    Submit {
        #[arg(value_enum)]
        program: ProgramArg,
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = SchedulerArg::Pbs)]
        scheduler: SchedulerArg,
        /// Cores [default: from config]
        #[arg(long)]
        ppn: Option<u32>,
        /// Walltime in hours [default: from config]
        #[arg(long)]
        time: Option<u32>,
        /// Queue or partition [default: from config]
        #[arg(long)]
        queue: Option<String>,
        /// Keep the Q-Chem scratch directory
        #[arg(long)]
        save: bool,
        /// Extra file to stage with the input (repeatable)
        #[arg(long = "extra")]
        extra_files: Vec<String>,
        /// Environment module [default: from config]
        #[arg(long)]
        module: Option<String>,
        /// Request the low-priority QOS (PBS)
        #[arg(long)]
        low_qos: bool,
        /// Hand the job files to qsub / sbatch
        #[arg(long)]
        submit: bool,
    },
    /// Fill a job template over a parameter sweep and submit each result
    Pbsgen {
        template: PathBuf,
        /// KEY=START..END or KEY=V1,V2,...
        #[arg(long, default_value = "NTHREADS=1..8")]
        sweep: String,
        /// Fixed KEY=VALUE substitution (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,
        #[arg(long, default_value = "pbs.sh")]
        output: PathBuf,
        #[arg(long, default_value = "cat")]
        submit_command: String,
        /// Seconds to wait between submissions
        #[arg(long, default_value_t = 1)]
        delay: u64,
    },
    /// XYZ to DALTON molecule input
    Xyz2dalton {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        charge: i32,
    },
    /// XYZ to GAMESS $DATA atom lines
    Xyz2gamess {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Extract residues from a PDB file into <pdb>.xyz
    PdbExtract {
        pdb: PathBuf,
        /// File listing the residue numbers, separated by whitespace
        resfile: PathBuf,
    },
    /// Write the last geometry of Q-Chem or ORCA outputs to <stem>.xyz
    LastGeom {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Name files <stem>.<SUFFIX>.xyz
        #[arg(long)]
        suffix: Option<String>,
    },
    /// Centre of mass and centre of nuclear charge of the last geometry
    Com {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// First SCF energy of each output, sorted from lowest
    Energies {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// RMSD between every pair of XYZ files
    Rmsd {
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
        /// Compare coordinates as given, without superposition
        #[arg(long)]
        no_align: bool,
    },
    /// Rewrite a Molden file into a canonical, Angstrom-based layout
    FixMolden {
        file: PathBuf,
        /// Write here instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Hash and compare two directory trees
    Compare {
        dir1: PathBuf,
        dir2: PathBuf,
        #[arg(long)]
        nonrecursive: bool,
        /// Write compare_diff.txt, compare_dir1_only.txt and compare_dir2_only.txt
        #[arg(long)]
        write_files: bool,
    },
    /// Run diff on every common output file of two directories
    DiffOutputs {
        dir1: PathBuf,
        dir2: PathBuf,
        #[arg(long, default_value = "out")]
        ext: String,
    },
    /// Zero-pad the orbital numbers of cube file names
    RenameCubes {
        #[arg(default_value = ".")]
        dir: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Split files into group_1, group_2, ... directories
    GroupFiles {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short = 'n', long)]
        num_per_group: usize,
        #[arg(long, value_enum, default_value_t = ActionArg::Print)]
        action: ActionArg,
        #[arg(long, default_value = ".")]
        dest: PathBuf,
    },
    /// Optimization outputs without a matching frequency job
    MatchOptFreq {
        #[arg(long, default_value = ".")]
        dir_opt: PathBuf,
        #[arg(long, default_value = ".")]
        dir_freq: PathBuf,
        /// Only list opt outputs missing a frequency output
        #[arg(long, conflicts_with = "missing_inputs")]
        missing_outputs: bool,
        /// Only list opt outputs missing a frequency input
        #[arg(long)]
        missing_inputs: bool,
    },
    /// Wall and CPU time statistics over Q-Chem outputs
    TotalTime {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Write a commented qctools_config.cfg
    ConfigTemplate {
        #[arg(default_value = qctools::settings::CONFIG_FILE_NAME)]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ProgramArg {
    Qchem,
    Orca,
    Dalton,
}

impl From<ProgramArg> for Program {
    fn from(p: ProgramArg) -> Self {
        match p {
            ProgramArg::Qchem => Program::QChem,
            ProgramArg::Orca => Program::Orca,
            ProgramArg::Dalton => Program::Dalton,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SchedulerArg {
    Pbs,
    Slurm,
}

impl From<SchedulerArg> for Scheduler {
    fn from(s: SchedulerArg) -> Self {
        match s {
            SchedulerArg::Pbs => Scheduler::Pbs,
            SchedulerArg::Slurm => Scheduler::Slurm,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ActionArg {
    Copy,
    Move,
    Print,
}

impl From<ActionArg> for GroupAction {
    fn from(a: ActionArg) -> Self {
        match a {
            ActionArg::Copy => GroupAction::Copy,
            ActionArg::Move => GroupAction::Move,
            ActionArg::Print => GroupAction::Print,
        }
    }
}
