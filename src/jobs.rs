//! Scheduler job files for Q-Chem, ORCA and DALTON.
//!
//! [`render_job`] builds a complete PBS or SLURM script from a [`JobSpec`]:
//! scheduler directives, environment modules, staging of the input (and any
//! extra files) into node-local scratch, an exit trap that copies results
//! back, and the program command line.
//!
//! The module also carries the parametrized template workflow behind
//! `qctools pbsgen`: `$NAME` substitution into a user template, a parameter
//! sweep, and submission of each generated script.
//!
//! # Examples
//!
//! ```
//! use qctools::jobs::{render_job, JobSpec, Program, Scheduler};
//!
//! let spec = JobSpec::new("water", "qchem/5.0");
//! let script = render_job(Program::QChem, Scheduler::Slurm, &spec);
//! assert!(script.contains("#SBATCH --job-name=water"));
//! assert!(script.contains("-nt 4 \"water.in\""));
//! ```

use lazy_static::lazy_static;
use log::{debug, info};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Error type for job generation and submission.
#[derive(Error, Debug)]
pub enum JobError {
    /// File system or I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A template placeholder has no value
    #[error("Missing template key: {0}")]
    MissingKey(String),
    /// A `$` not followed by a valid placeholder
    #[error("Invalid placeholder in template: {0}")]
    InvalidTemplate(String),
    /// A sweep specification could not be parsed
    #[error("Invalid sweep '{0}': expected KEY=START..END or KEY=V1,V2,...")]
    InvalidSweep(String),
    /// The submit command failed
    #[error("Submit failed: {0}")]
    Submit(String),
}

type Result<T> = std::result::Result<T, JobError>;

/// Quantum chemistry program to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    /// Q-Chem
    QChem,
    /// ORCA
    Orca,
    /// DALTON
    Dalton,
}

impl Program {
    /// Input file extension.
    pub fn input_extension(self) -> &'static str {
        match self {
            Program::QChem | Program::Orca => "in",
            Program::Dalton => "dal",
        }
    }
}

/// Batch scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduler {
    /// PBS / Torque
    Pbs,
    /// SLURM
    Slurm,
}

impl Scheduler {
    fn submit_dir(self) -> &'static str {
        match self {
            Scheduler::Pbs => "${PBS_O_WORKDIR}",
            Scheduler::Slurm => "${SLURM_SUBMIT_DIR}",
        }
    }

    fn job_id(self) -> &'static str {
        match self {
            Scheduler::Pbs => "${PBS_JOBID}",
            Scheduler::Slurm => "${SLURM_JOB_ID}",
        }
    }

    /// Job file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Scheduler::Pbs => "pbs",
            Scheduler::Slurm => "slurm",
        }
    }
}

/// Everything needed to render one job script.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    /// Input file name without extension; also the job name
    pub stem: String,
    /// Cores
    pub ppn: u32,
    /// Walltime in hours
    pub walltime_hours: u32,
    /// PBS queue or SLURM partition
    pub queue: String,
    /// Keep the Q-Chem scratch directory
    pub save_scratch: bool,
    /// Additional files to stage next to the input
    pub extra_files: Vec<String>,
    /// Environment module providing the program
    pub module: String,
    /// Mail recipient user name
    pub username: String,
    /// Mail recipient domain
    pub email_domain: String,
    /// Request the low-priority QOS (PBS only)
    pub low_qos: bool,
}

impl JobSpec {
    /// A spec with the stock defaults: 4 cores, 96 hours, `shared` queue,
    /// mail to `$USER@pitt.edu`.
    pub fn new(stem: &str, module: &str) -> Self {
        Self {
            stem: stem.to_string(),
            ppn: 4,
            walltime_hours: 96,
            queue: "shared".to_string(),
            save_scratch: false,
            extra_files: Vec::new(),
            module: module.to_string(),
            username: std::env::var("USER").unwrap_or_else(|_| "user".to_string()),
            email_domain: "pitt.edu".to_string(),
            low_qos: false,
        }
    }
}

fn directives(scheduler: Scheduler, spec: &JobSpec) -> String {
    let mail = format!("{}@{}", spec.username, spec.email_domain);
    match scheduler {
        Scheduler::Pbs => {
            let mut lines = vec![
                format!("#PBS -N {}", spec.stem),
                format!("#PBS -q {}", spec.queue),
                format!("#PBS -l nodes=1:ppn={}", spec.ppn),
                format!("#PBS -l walltime={}:00:00", spec.walltime_hours),
                "#PBS -j oe".to_string(),
            ];
            if spec.low_qos {
                lines.push("#PBS -l qos=low".to_string());
            }
            lines.push("#PBS -m abe".to_string());
            lines.push(format!("#PBS -M {}", mail));
            lines.join("\n")
        }
        Scheduler::Slurm => [
            format!("#SBATCH --job-name={}", spec.stem),
            format!("#SBATCH --output={}.slurmout", spec.stem),
            "#SBATCH --nodes=1".to_string(),
            "#SBATCH --ntasks=1".to_string(),
            format!("#SBATCH --cpus-per-task={}", spec.ppn),
            format!("#SBATCH --time=0-{}:00:00", spec.walltime_hours),
            format!("#SBATCH --partition={}", spec.queue),
            "#SBATCH --mail-type=ALL".to_string(),
            format!("#SBATCH --mail-user={}", mail),
        ]
        .join("\n"),
    }
}

fn command_line(program: Program, scheduler: Scheduler, spec: &JobSpec) -> String {
    let dir = scheduler.submit_dir();
    let stem = &spec.stem;
    match program {
        Program::QChem => {
            let (save, scratch) = if spec.save_scratch {
                ("-save ", format!(" \"{}.{}\"", stem, scheduler.job_id()))
            } else {
                ("", String::new())
            };
            format!(
                "$(which qchem) {}-nt {} \"{}.in\" \"{}/{}.out\"{}",
                save, spec.ppn, stem, dir, stem, scratch
            )
        }
        Program::Orca => format!("$(which orca) {}.in >& \"{}/{}.out\"", stem, dir, stem),
        Program::Dalton => format!(
            "$(which dalton) -omp {} -noarch -nobackup -d -ow -w \"{}\" {}.dal",
            spec.ppn, dir, stem
        ),
    }
}

/// Renders a complete job script.
pub fn render_job(program: Program, scheduler: Scheduler, spec: &JobSpec) -> String {
    let dir = scheduler.submit_dir();
    let stem = &spec.stem;

    let mut staging = format!(
        "mkdir -p \"${{LOCAL}}\"\ncp \"{}/{}.{}\" \"${{LOCAL}}\"\n",
        dir,
        stem,
        program.input_extension()
    );
    for extra in &spec.extra_files {
        staging.push_str(&format!("cp \"{}/{}\" \"${{LOCAL}}\"\n", dir, extra));
    }
    staging.push_str("cd \"${LOCAL}\"\n");

    let cleanup = match program {
        Program::QChem => "    rm -f \"${LOCAL}/pathtable\"\n",
        Program::Dalton => "    find \"${LOCAL}\" -type f -exec chmod 644 '{}' \\;\n",
        Program::Orca => "",
    };

    let mut script = format!(
        "#!/bin/bash

{directives}

module purge
module load {module}

{staging}
run_on_exit() {{
    set -v
{cleanup}    cp -v -R \"${{LOCAL}}\"/* \"{dir}\"
}}

trap run_on_exit EXIT

{command}
",
        directives = directives(scheduler, spec),
        module = spec.module,
        staging = staging,
        cleanup = cleanup,
        dir = dir,
        command = command_line(program, scheduler, spec),
    );

    if scheduler == Scheduler::Slurm {
        script.push_str(&format!("chmod 644 \"{}/{}.out\"\n", dir, stem));
    }
    script
}

/// Job file name for an input stem: `<stem>.pbs` or `<stem>.slurm`.
pub fn job_file_name(stem: &str, scheduler: Scheduler) -> String {
    format!("{}.{}", stem, scheduler.extension())
}

/// Writes the job script next to the input file and returns its path.
///
/// The job name is the input's file name without extension.
pub fn write_job(input: &Path, program: Program, scheduler: Scheduler, spec: &JobSpec) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| JobError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("cannot take file stem of {}", input.display()),
        )))?;
    let spec = JobSpec {
        stem: stem.to_string(),
        ..spec.clone()
    };
    let path = input.with_file_name(job_file_name(stem, scheduler));
    fs::write(&path, render_job(program, scheduler, &spec))?;
    debug!("wrote {} for {:?}/{:?}", path.display(), program, scheduler);
    Ok(path)
}

lazy_static! {
    // $$, $name, ${name}, or a stray $
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"\$(?:(\$)|([_A-Za-z][_A-Za-z0-9]*)|\{([_A-Za-z][_A-Za-z0-9]*)\}|)").unwrap();
}

/// Substitutes `$NAME` and `${NAME}` placeholders; `$$` yields a literal `$`.
///
/// # Errors
///
/// [`JobError::MissingKey`] for a placeholder without a value and
/// [`JobError::InvalidTemplate`] for a `$` that starts no placeholder.
///
/// ```
/// use std::collections::HashMap;
/// use qctools::jobs::substitute;
///
/// let vars = HashMap::from([("N".to_string(), "8".to_string())]);
/// assert_eq!(substitute("ppn=$N cost=$$5 ${N}x", &vars).unwrap(), "ppn=8 cost=$5 8x");
/// ```
pub fn substitute(template: &str, vars: &HashMap<String, String>) -> Result<String> {
    let mut error: Option<JobError> = None;
    let out = PLACEHOLDER_RE.replace_all(template, |caps: &Captures| {
        if caps.get(1).is_some() {
            return "$".to_string();
        }
        match caps.get(2).or_else(|| caps.get(3)) {
            Some(name) => match vars.get(name.as_str()) {
                Some(value) => value.clone(),
                None => {
                    error.get_or_insert(JobError::MissingKey(name.as_str().to_string()));
                    String::new()
                }
            },
            None => {
                let at = caps.get(0).map_or(0, |m| m.start());
                let context: String = template[at..].chars().take(12).collect();
                error.get_or_insert(JobError::InvalidTemplate(context));
                String::new()
            }
        }
    });
    match error {
        Some(e) => Err(e),
        None => Ok(out.into_owned()),
    }
}

/// A parameter swept over a list of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sweep {
    /// Placeholder name
    pub key: String,
    /// Values in submission order
    pub values: Vec<String>,
}

/// Parses `KEY=START..END` (inclusive integer range) or `KEY=V1,V2,...`.
pub fn parse_sweep(spec: &str) -> Result<Sweep> {
    let invalid = || JobError::InvalidSweep(spec.to_string());
    let (key, rhs) = spec.split_once('=').ok_or_else(invalid)?;
    let key = key.trim();
    if key.is_empty() || rhs.trim().is_empty() {
        return Err(invalid());
    }

    let values = match rhs.split_once("..") {
        Some((lo, hi)) => {
            let lo: i64 = lo.trim().parse().map_err(|_| invalid())?;
            let hi: i64 = hi.trim().parse().map_err(|_| invalid())?;
            if hi < lo {
                return Err(invalid());
            }
            (lo..=hi).map(|v| v.to_string()).collect()
        }
        None => rhs.split(',').map(|v| v.trim().to_string()).collect(),
    };

    Ok(Sweep {
        key: key.to_string(),
        values,
    })
}

/// One rendered script per sweep value.
pub fn expand_sweep(
    template: &str,
    base: &HashMap<String, String>,
    sweep: &Sweep,
) -> Result<Vec<(String, String)>> {
    let mut vars = base.clone();
    sweep
        .values
        .iter()
        .map(|value| {
            vars.insert(sweep.key.clone(), value.clone());
            Ok((value.clone(), substitute(template, &vars)?))
        })
        .collect()
}

/// Parses `KEY=VALUE` pairs into a variable map.
pub fn parse_vars(pairs: &[String]) -> Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| JobError::InvalidTemplate(format!("'{}' is not KEY=VALUE", pair)))
        })
        .collect()
}

/// Runs `command path` (the command may carry its own arguments, e.g.
/// `"qsub -V"`) and returns its standard output.
pub fn submit(command: &str, path: &Path) -> Result<String> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| JobError::Submit("empty submit command".into()))?;
    info!("{} {}", command, path.display());

    let output = Command::new(program).args(parts).arg(path).output()?;
    if !output.status.success() {
        return Err(JobError::Submit(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> JobSpec {
        JobSpec {
            username: "alice".into(),
            ..JobSpec::new("mol", "mod/1")
        }
    }

    #[test]
    fn test_qchem_pbs() {
        let mut s = spec();
        s.save_scratch = true;
        let script = render_job(Program::QChem, Scheduler::Pbs, &s);
        assert!(script.starts_with("#!/bin/bash\n\n#PBS -N mol\n#PBS -q shared\n"));
        assert!(script.contains("#PBS -l nodes=1:ppn=4\n#PBS -l walltime=96:00:00\n"));
        assert!(script.contains("#PBS -M alice@pitt.edu"));
        assert!(!script.contains("qos=low"));
        assert!(script.contains("module load mod/1"));
        assert!(script.contains(
            "$(which qchem) -save -nt 4 \"mol.in\" \"${PBS_O_WORKDIR}/mol.out\" \"mol.${PBS_JOBID}\""
        ));
        assert!(script.contains("trap run_on_exit EXIT"));
        assert!(!script.contains("chmod 644 \"${PBS_O_WORKDIR}"));
    }

    #[test]
    fn test_orca_pbs_extra_files() {
        let mut s = spec();
        s.low_qos = true;
        s.extra_files = vec!["mol.gbw".into(), "mol.xyz".into()];
        let script = render_job(Program::Orca, Scheduler::Pbs, &s);
        assert!(script.contains("#PBS -j oe\n#PBS -l qos=low\n#PBS -m abe"));
        assert!(script.contains("cp \"${PBS_O_WORKDIR}/mol.gbw\" \"${LOCAL}\"\ncp \"${PBS_O_WORKDIR}/mol.xyz\""));
        assert!(script.contains("$(which orca) mol.in >& \"${PBS_O_WORKDIR}/mol.out\""));
    }

    #[test]
    fn test_dalton_slurm() {
        let mut s = spec();
        s.ppn = 12;
        s.walltime_hours = 24;
        s.queue = "smp".into();
        let script = render_job(Program::Dalton, Scheduler::Slurm, &s);
        assert!(script.contains("#SBATCH --cpus-per-task=12\n#SBATCH --time=0-24:00:00\n#SBATCH --partition=smp"));
        assert!(script.contains("cp \"${SLURM_SUBMIT_DIR}/mol.dal\" \"${LOCAL}\""));
        assert!(script.contains("$(which dalton) -omp 12 -noarch -nobackup -d -ow -w \"${SLURM_SUBMIT_DIR}\" mol.dal"));
        assert!(script.ends_with("chmod 644 \"${SLURM_SUBMIT_DIR}/mol.out\"\n"));
    }

    #[test]
    fn test_write_job_uses_stem() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("h2o.opt.in");
        fs::write(&input, "$molecule\n").unwrap();
        let path = write_job(&input, Program::QChem, Scheduler::Slurm, &spec()).unwrap();
        assert_eq!(path, dir.path().join("h2o.opt.slurm"));
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("--job-name=h2o.opt"));
    }

    #[test]
    fn test_substitute_errors() {
        let vars = HashMap::new();
        assert!(matches!(substitute("a $X b", &vars), Err(JobError::MissingKey(k)) if k == "X"));
        assert!(matches!(substitute("cost $5", &vars), Err(JobError::InvalidTemplate(_))));
        assert_eq!(substitute("$$PBS_O_WORKDIR", &vars).unwrap(), "$PBS_O_WORKDIR");
    }

    #[test]
    fn test_sweep() {
        let sweep = parse_sweep("NTHREADS=1..3").unwrap();
        assert_eq!(sweep.values, vec!["1", "2", "3"]);
        assert_eq!(parse_sweep("Q=a, b").unwrap().values, vec!["a", "b"]);
        assert!(parse_sweep("NTHREADS=3..1").is_err());
        assert!(parse_sweep("novalue").is_err());

        let base = parse_vars(&["COMMAND=echo".to_string()]).unwrap();
        let scripts = expand_sweep("$COMMAND -n $NTHREADS", &base, &sweep).unwrap();
        assert_eq!(scripts.len(), 3);
        assert_eq!(scripts[2], ("3".to_string(), "echo -n 3".to_string()));
    }

    #[test]
    fn test_submit_with_cat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pbs.sh");
        fs::write(&path, "echo hi\n").unwrap();
        assert_eq!(submit("cat", &path).unwrap(), "echo hi\n");
        assert!(matches!(submit("", &path), Err(JobError::Submit(_))));
    }
}
