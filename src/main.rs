//! qctools command-line interface.
//!
//! Every subcommand maps to one `run_*` function. Subcommands that take
//! several files handle each file on its own: a file that fails is logged
//! and the rest are still processed, and the process exits with status 1 at
//! the end if anything failed.
//!
//! ```bash
//! qctools orca-gtensor *.out
//! qctools covp job.out --pct-cutoff 5 --plot-combined job.xyz
//! qctools submit qchem --scheduler slurm --ppn 8 opt*.in
//! qctools compare run_a run_b --write-files
//! ```

mod cli;

use clap::Parser;
use log::{debug, error, info, warn, LevelFilter};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::Duration;

use cli::{Cli, Commands};
use qctools::jobs::{self, JobSpec, Program, Scheduler};
use qctools::settings::{Settings, SettingsManager};
use qctools::vmd::CovpScripts;
use qctools::*;

type RunResult = Result<(), Box<dyn Error>>;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the configured level
    let env_filter = std::env::var_os("RUST_LOG").is_some();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis()
        .init();
    if !env_filter {
        log::set_max_level(LevelFilter::Info);
    }

    let settings = match SettingsManager::load() {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    if !env_filter {
        match settings.logging().level.parse::<LevelFilter>() {
            Ok(level) => log::set_max_level(level),
            Err(_) => warn!("Unknown log level '{}', using info", settings.logging().level),
        }
    }
    debug!("Configuration loaded from: {}", settings.config_source());

    if let Err(e) = run(cli.command, settings.settings()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(command: Commands, settings: &Settings) -> RunResult {
    match command {
        Commands::OrcaGtensor {
            files,
            contributions,
        } => run_orca_gtensor(&files, contributions),
        Commands::OrcaGtot { files } => run_orca_gtot(&files),
        Commands::OrcaHyperfine {
            files,
            metal,
            ligand,
        } => run_orca_hyperfine(&files, &metal, &ligand),
        Commands::AdfEpr { files } => run_adf_epr(&files),
        Commands::DaltonGshift { files } => run_dalton_gshift(&files),
        Commands::Covp {
            output,
            pct_cutoff,
            plot_separate,
            plot_combined,
            json,
            delete,
        } => run_covp(
            &output,
            pct_cutoff.unwrap_or(settings.covp.pct_cutoff),
            plot_separate.as_deref(),
            plot_combined.as_deref(),
            json,
            delete,
        ),
        Commands::Co2Modes {
            files,
            thresh,
            csv,
            csv_filename,
        } => run_co2_modes(
            &files,
            thresh.unwrap_or(settings.vibrations.co2_threshold),
            csv.then_some(csv_filename.as_path()),
        ),
        Commands::Vci { output } => run_vci(&output),
        Commands::Submit {
            program,
            inputs,
            scheduler,
            ppn,
            time,
            queue,
            save,
            extra_files,
            module,
            low_qos,
            submit,
        } => {
            let program = Program::from(program);
            let defaults = &settings.jobs;
            let spec = JobSpec {
                stem: String::new(),
                ppn: ppn.unwrap_or(defaults.default_ppn),
                walltime_hours: time.unwrap_or(defaults.default_walltime),
                queue: queue.unwrap_or_else(|| defaults.default_queue.clone()),
                save_scratch: save,
                extra_files,
                module: module
                    .unwrap_or_else(|| settings.modules.for_program(program).to_string()),
                username: defaults.username.clone(),
                email_domain: defaults.email_domain.clone(),
                low_qos,
            };
            run_submit(&inputs, program, scheduler.into(), &spec, submit)
        }
        Commands::Pbsgen {
            template,
            sweep,
            vars,
            output,
            submit_command,
            delay,
        } => run_pbsgen(&template, &sweep, &vars, &output, &submit_command, delay),
        Commands::Xyz2dalton { files, charge } => run_xyz2dalton(&files, charge),
        Commands::Xyz2gamess { files } => run_xyz2gamess(&files),
        Commands::PdbExtract { pdb, resfile } => run_pdb_extract(&pdb, &resfile),
        Commands::LastGeom { files, suffix } => run_last_geom(&files, suffix.as_deref()),
        Commands::Com { files } => run_com(&files),
        Commands::Energies { files } => run_energies(&files),
        Commands::Rmsd { files, no_align } => run_rmsd(&files, !no_align),
        Commands::FixMolden { file, output } => run_fix_molden(&file, output.as_deref()),
        Commands::Compare {
            dir1,
            dir2,
            nonrecursive,
            write_files,
        } => run_compare(&dir1, &dir2, !nonrecursive, write_files),
        Commands::DiffOutputs { dir1, dir2, ext } => {
            print!("{}", dircompare::diff_common_outputs(&dir1, &dir2, &ext)?);
            Ok(())
        }
        Commands::RenameCubes { dir, dry_run } => {
            for (old, new) in batch::rename_cubes(&dir, dry_run)? {
                println!("{} -> {}", old, new);
            }
            Ok(())
        }
        Commands::GroupFiles {
            files,
            num_per_group,
            action,
            dest,
        } => {
            for (file, group) in batch::group_files(&files, num_per_group, action.into(), &dest)? {
                println!("{} {}", file.display(), group.display());
            }
            Ok(())
        }
        Commands::MatchOptFreq {
            dir_opt,
            dir_freq,
            missing_outputs,
            missing_inputs,
        } => run_match_opt_freq(&dir_opt, &dir_freq, missing_outputs, missing_inputs),
        Commands::TotalTime { files } => run_total_time(&files),
        Commands::ConfigTemplate { path } => {
            SettingsManager::create_template(&path)?;
            println!("Settings template written to {}", path.display());
            Ok(())
        }
    }
}

/// Applies `f` to every file, logging failures instead of stopping.
fn for_each_file<F>(files: &[PathBuf], mut f: F) -> RunResult
where
    F: FnMut(&Path, &str) -> RunResult,
{
    let mut failed = 0;
    for path in files {
        let result = scanner::read_to_string(path)
            .map_err(Box::<dyn Error>::from)
            .and_then(|text| f(path, &text));
        if let Err(e) = result {
            error!("{}: {}", path.display(), e);
            failed += 1;
        }
    }
    if failed > 0 {
        return Err(format!("{} of {} files failed", failed, files.len()).into());
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

fn run_orca_gtensor(files: &[PathBuf], contributions: bool) -> RunResult {
    for_each_file(files, |path, text| {
        let g = epr::parse_orca_gtensor(text)?;
        println!("{}", epr::format_orca_gtensor(&g, &display_name(path)));
        if contributions {
            println!("{}", epr::format_orca_contributions(&g));
        }
        Ok(())
    })
}

fn run_orca_gtot(files: &[PathBuf]) -> RunResult {
    for_each_file(files, |path, text| {
        println!("{}", path.display());
        match epr::parse_orca_gtot(text)? {
            Some(summary) => println!("{}", epr::format_gtot(&summary)),
            None => println!(" no g(tot) found"),
        }
        Ok(())
    })
}

fn run_orca_hyperfine(files: &[PathBuf], metal: &str, ligand: &str) -> RunResult {
    println!("{}", epr::hyperfine_header());
    for_each_file(files, |path, text| {
        let g = epr::parse_orca_gtensor(text)?;
        let a = epr::parse_orca_hyperfine(text, metal, ligand)?;
        println!("{}", epr::format_hyperfine_row(&g, &a, &display_name(path)));
        Ok(())
    })
}

fn run_adf_epr(files: &[PathBuf]) -> RunResult {
    for_each_file(files, |path, text| {
        println!("{}", path.display());
        match epr::parse_adf_gtensor(text)? {
            Some(values) => println!("{}", epr::format_adf(&values)),
            None => println!(" no principal g-values found"),
        }
        Ok(())
    })
}

fn run_dalton_gshift(files: &[PathBuf]) -> RunResult {
    for_each_file(files, |path, text| {
        println!("{}", path.display());
        println!("{}", epr::format_dalton(&epr::parse_dalton_gshift(text)?));
        Ok(())
    })
}

fn run_covp(
    output: &Path,
    cutoff: f64,
    plot_separate: Option<&Path>,
    plot_combined: Option<&Path>,
    json: bool,
    delete: bool,
) -> RunResult {
    let text = scanner::read_to_string(output)?;
    let analysis = covp::CovpAnalysis::from_output(&text)?;
    println!("{}", analysis.format_report(cutoff));

    let here = Path::new(".");
    if let Some(xyz) = plot_separate {
        let pairs = analysis.pairs(cutoff);
        CovpScripts::build(&display_name(xyz), &pairs, analysis.vmd_width()).write_separate(here)?;
    }
    if let Some(xyz) = plot_combined {
        let pairs = analysis.pairs(cutoff);
        CovpScripts::build(&display_name(xyz), &pairs, analysis.vmd_width()).write_combined(here)?;
    }
    if json {
        let stem = output.with_extension("");
        for path in analysis.write_json(&stem, cutoff)? {
            println!("{}", path.display());
        }
    }
    if delete {
        let names = analysis.cube_files_below_cutoff(cutoff);
        let deleted = covp::delete_cubes(here, &names);
        info!("Deleted {} of {} cube files", deleted, names.len());
    }
    Ok(())
}

fn run_co2_modes(files: &[PathBuf], thresh: f64, csv: Option<&Path>) -> RunResult {
    let mut rows = Vec::new();
    let result = for_each_file(files, |path, text| {
        for modes in vibrations::Co2Modes::from_output(&display_name(path), text, thresh)? {
            println!("{}", modes.format_line());
            rows.extend(modes.csv_row());
        }
        Ok(())
    });
    if let Some(csv) = csv {
        let mut content = rows.join("\n");
        content.push('\n');
        fs::write(csv, content)?;
        info!("Wrote {} rows to {}", rows.len(), csv.display());
    }
    result
}

fn run_vci(output: &Path) -> RunResult {
    let text = scanner::read_to_string(output)?;
    let nmodes = vibrations::parse_qchem_vibrations(&text)?.frequencies.len();
    let modes = vibrations::parse_anharmonic(&text, nmodes)?;
    println!("{}", vibrations::format_anharmonic(&modes));
    Ok(())
}

fn run_submit(
    inputs: &[PathBuf],
    program: Program,
    scheduler: Scheduler,
    spec: &JobSpec,
    submit: bool,
) -> RunResult {
    let submit_command = match scheduler {
        Scheduler::Pbs => "qsub",
        Scheduler::Slurm => "sbatch",
    };
    let mut failed = 0;
    for input in inputs {
        let result = jobs::write_job(input, program, scheduler, spec).and_then(|job| {
            println!("{}", job.display());
            if submit {
                print!("{}", jobs::submit(submit_command, &job)?);
            }
            Ok(())
        });
        if let Err(e) = result {
            error!("{}: {}", input.display(), e);
            failed += 1;
        }
    }
    if failed > 0 {
        return Err(format!("{} of {} job files failed", failed, inputs.len()).into());
    }
    Ok(())
}

fn run_pbsgen(
    template: &Path,
    sweep: &str,
    vars: &[String],
    output: &Path,
    submit_command: &str,
    delay: u64,
) -> RunResult {
    let text = fs::read_to_string(template)?;
    let sweep = jobs::parse_sweep(sweep)?;
    let base = jobs::parse_vars(vars)?;
    let scripts = jobs::expand_sweep(&text, &base, &sweep)?;

    for (i, (value, script)) in scripts.iter().enumerate() {
        if i > 0 && delay > 0 {
            thread::sleep(Duration::from_secs(delay));
        }
        fs::write(output, script)?;
        info!("{}={}", sweep.key, value);
        print!("{}", jobs::submit(submit_command, output)?);
    }
    Ok(())
}

fn run_xyz2dalton(files: &[PathBuf], charge: i32) -> RunResult {
    for_each_file(files, |path, text| {
        let geom = io::parse_xyz(text)?;
        let out = path.with_extension("dal");
        fs::write(&out, format!("{}\n", convert::xyz_to_dalton(&geom, charge)?))?;
        println!("{}", out.display());
        Ok(())
    })
}

fn run_xyz2gamess(files: &[PathBuf]) -> RunResult {
    for_each_file(files, |path, text| {
        let out = path.with_extension("inp");
        fs::write(&out, convert::xyz_to_gamess(text)?)?;
        println!("{}", out.display());
        Ok(())
    })
}

fn run_pdb_extract(pdb: &Path, resfile: &Path) -> RunResult {
    let residues: Vec<String> = fs::read_to_string(resfile)?
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let geom = convert::extract_pdb_residues(&fs::read_to_string(pdb)?, &residues)?;
    let out = PathBuf::from(format!("{}.xyz", pdb.display()));
    fs::write(&out, convert::format_pdb_xyz(&geom))?;
    println!("{} atoms written to {}", geom.num_atoms, out.display());
    Ok(())
}

fn run_last_geom(files: &[PathBuf], suffix: Option<&str>) -> RunResult {
    for_each_file(files, |path, text| {
        let geom = structure::last_geometry(text)?;
        let out = match suffix {
            Some(suffix) => path.with_extension(format!("{}.xyz", suffix)),
            None => path.with_extension("xyz"),
        };
        fs::write(&out, structure::format_geometry_xyz(&geom))?;
        println!("{}", out.display());
        Ok(())
    })
}

fn run_com(files: &[PathBuf]) -> RunResult {
    for_each_file(files, |path, text| {
        let geom = structure::last_geometry(text)?;
        let com = geom.center_of_mass()?;
        let cnc = geom.center_of_nuclear_charge()?;
        println!("{}", path.display());
        println!(" center of mass:           {:12.6} {:12.6} {:12.6}", com.x, com.y, com.z);
        println!(" center of nuclear charge: {:12.6} {:12.6} {:12.6}", cnc.x, cnc.y, cnc.z);
        Ok(())
    })
}

fn run_energies(files: &[PathBuf]) -> RunResult {
    let mut energies = Vec::new();
    let result = for_each_file(files, |path, text| {
        energies.push((structure::first_scf_energy(text)?, path.to_path_buf()));
        Ok(())
    });
    energies.sort_by(|a, b| a.0.energy.total_cmp(&b.0.energy));
    for (e, path) in &energies {
        println!("{:.10} {} {}", e.energy, e.program, path.display());
    }
    result
}

fn run_rmsd(files: &[PathBuf], align: bool) -> RunResult {
    let geoms = files
        .iter()
        .map(|f| io::read_xyz(f))
        .collect::<Result<Vec<_>, _>>()?;
    let banner = "=".repeat(78);
    let mut failed = 0;
    for i in 0..files.len() {
        for j in 0..i {
            println!("file 1: {}", files[i].display());
            println!("file 2: {}", files[j].display());
            let value = if align {
                structure::kabsch_rmsd(&geoms[i], &geoms[j])
            } else {
                structure::rmsd(&geoms[i], &geoms[j])
            };
            match value {
                Ok(r) => println!("rmsd: {:.6}", r),
                Err(e) => {
                    error!("{}", e);
                    failed += 1;
                }
            }
            println!("{}", banner);
        }
    }
    if failed > 0 {
        return Err(format!("{} pairs could not be compared", failed).into());
    }
    Ok(())
}

fn run_fix_molden(file: &Path, output: Option<&Path>) -> RunResult {
    let fixed = molden::fix_molden(&scanner::read_to_string(file)?)?;
    match output {
        Some(out) => {
            fs::write(out, fixed)?;
            info!("Wrote {}", out.display());
        }
        None => print!("{}", fixed),
    }
    Ok(())
}

fn run_compare(dir1: &Path, dir2: &Path, recursive: bool, write_files: bool) -> RunResult {
    let comparison = dircompare::compare(dir1, dir2, recursive)?;
    print!("{}", comparison.format_report());
    if write_files {
        comparison.write_report_files(Path::new("."))?;
    }
    Ok(())
}

fn run_match_opt_freq(
    dir_opt: &Path,
    dir_freq: &Path,
    only_outputs: bool,
    only_inputs: bool,
) -> RunResult {
    let found = batch::match_opt_and_freq(dir_opt, dir_freq)?;
    let both = !only_outputs && !only_inputs;
    if only_outputs || both {
        if both {
            println!("# missing frequency outputs");
        }
        for name in &found.missing_freq_outputs {
            println!("{}", name);
        }
    }
    if only_inputs || both {
        if both {
            println!("# missing frequency inputs");
        }
        for name in &found.missing_freq_inputs {
            println!("{}", name);
        }
    }
    Ok(())
}

fn run_total_time(files: &[PathBuf]) -> RunResult {
    let mut times = Vec::new();
    let result = for_each_file(files, |path, text| {
        match batch::parse_qchem_total_time(text)? {
            Some(t) => times.push(t),
            None => warn!("{}: no total job time", path.display()),
        }
        Ok(())
    });
    if !times.is_empty() {
        print!("{}", batch::summarize_times(&times)?.format());
    }
    result
}
