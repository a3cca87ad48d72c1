#![forbid(unsafe_code)]

use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use soundword_engines::catalog::{parse_catalog_csv, StimulusCatalog};
use soundword_engines::plan::TrialPlan;
use soundword_engines::response_device::{NoGamepadHardware, ResponseDevice};
use soundword_engines::trial_gen::TrialDesigner;
use soundword_kernel_contracts::session::{SessionConfig, SubjectId};
use soundword_kernel_contracts::Validate;
use soundword_os::collaborators::{Collaborators, SystemClock};
use soundword_os::config::parse_session_config;
use soundword_os::experiment::{
    close_after_failure, finish_session, Experiment, SessionOutcome,
};
use soundword_os::session::{host_identifier, open_session};
use soundword_os::trial_executor::{ExecutorConfig, TrialExecutor};
use soundword_storage::csv_file::{data_file_path, CsvSessionRecorder};
use soundword_storage::SessionRecorder;
use soundword_tools::console::{ConsolePresenter, LineKeyboard, SharedLines};
use soundword_tools::logging::init_logging;
use soundword_tools::sound_files::copy_sounds;
use soundword_tools::trial_export::write_plan;
use soundword_tools::wav::{IndexedPlayback, SoundIndex};

#[derive(Parser, Debug)]
#[command(name = "soundword")]
#[command(about = "Sound-label learning experiment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the trial plan for a seed without running it
    Trials {
        #[command(flatten)]
        design: DesignArgs,

        #[arg(short, long, default_value = "sample_trials.csv")]
        output: PathBuf,
    },
    /// Copy the catalog's stimulus clips into the stimuli directory
    CopySounds {
        #[arg(long, default_value = "stimuli/stimuli.csv")]
        catalog: PathBuf,

        #[arg(long, default_value = "../acoustic-similarity/data/sounds")]
        source: PathBuf,

        #[arg(long, default_value = "stimuli/sounds")]
        dest: PathBuf,
    },
    /// Run a session and record it under the data directory
    Run {
        #[command(flatten)]
        design: DesignArgs,

        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        #[arg(long, default_value = "stimuli/sounds")]
        sounds_dir: PathBuf,

        #[arg(long, default_value = "stimuli/feedback")]
        feedback_dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct DesignArgs {
    /// Session config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stimulus catalog CSV
    #[arg(long, default_value = "stimuli/stimuli.csv")]
    catalog: PathBuf,

    /// Overrides the config's subject id
    #[arg(long)]
    subj_id: Option<String>,

    /// Overrides the config's seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_logging().and_then(|_| run(cli)) {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Trials { design, output } => {
            let cfg = load_config(&design, Some("sample"))?;
            let plan = build_plan(&read_catalog(&design.catalog)?, &cfg)?;
            write_plan(&plan, &output)?;
            println!("{} trials written to {}", plan.len(), output.display());
            Ok(())
        }
        Command::CopySounds {
            catalog,
            source,
            dest,
        } => {
            let report = copy_sounds(&read_catalog(&catalog)?, &source, &dest)?;
            println!(
                "copied {}, already present {}",
                report.copied.len(),
                report.already_present.len()
            );
            if !report.missing.is_empty() {
                return Err(format!(
                    "missing from {}: {}",
                    source.display(),
                    report.missing.join(", ")
                ));
            }
            Ok(())
        }
        Command::Run {
            design,
            data_dir,
            sounds_dir,
            feedback_dir,
        } => run_session(&design, &data_dir, &sounds_dir, &feedback_dir),
    }
}

fn run_session(
    design: &DesignArgs,
    data_dir: &Path,
    sounds_dir: &Path,
    feedback_dir: &Path,
) -> Result<(), String> {
    let cfg = load_config(design, None)?;
    let plan = build_plan(&read_catalog(&design.catalog)?, &cfg)?;
    let sounds = load_sounds(&plan, &cfg, sounds_dir, feedback_dir)?;

    let device = ResponseDevice::acquire(
        &mut NoGamepadHardware,
        cfg.keyboard_map.clone(),
        cfg.gamepad_map.clone(),
    );
    let executor = TrialExecutor::new(
        ExecutorConfig::from_session_config(&cfg).map_err(|e| e.to_string())?,
        device,
    )
    .map_err(|e| e.to_string())?;

    let session =
        open_session(&cfg, Local::now(), host_identifier()).map_err(|e| e.to_string())?;
    let path = data_file_path(data_dir, &session);
    let recorder =
        CsvSessionRecorder::create(&path, session.clone()).map_err(|e| e.to_string())?;
    info!(path = %path.display(), "recording session");

    let clock = SystemClock::start();
    let lines = SharedLines::spawn_reader(BufReader::new(io::stdin()), clock);
    let collaborators = Collaborators {
        presenter: ConsolePresenter::new(lines.clone(), io::stdout()),
        audio: IndexedPlayback::new(sounds),
        pacer: clock,
        input: LineKeyboard::new(lines),
    };

    let mut experiment = Experiment::new(
        session,
        plan,
        executor,
        cfg.texts.clone(),
        collaborators,
        recorder,
    );
    let result = experiment.run();
    let (mut recorder, _) = experiment.into_parts();
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            close_after_failure(&mut recorder);
            return Err(err.to_string());
        }
    };
    let disposition = finish_session(&mut recorder, outcome).map_err(|e| e.to_string())?;
    match outcome {
        SessionOutcome::Completed { trials } => println!("done: {trials} trials"),
        SessionOutcome::Quit {
            trials_completed, ..
        } => println!("quit after {trials_completed} trials"),
    }
    info!(?disposition, path = %path.display(), "session closed");
    Ok(())
}

/// Config file if given, else defaults; CLI subject id and seed win over both.
fn load_config(design: &DesignArgs, default_subj: Option<&str>) -> Result<SessionConfig, String> {
    let mut cfg = match &design.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            parse_session_config(&text).map_err(|e| e.to_string())?
        }
        None => {
            let subj = design
                .subj_id
                .as_deref()
                .or(default_subj)
                .ok_or_else(|| "missing --subj-id (or --config)".to_string())?;
            let seed = design
                .seed
                .ok_or_else(|| "missing --seed (or --config)".to_string())?;
            SessionConfig::mvp_v1(SubjectId::new(subj).map_err(|e| e.to_string())?, seed)
        }
    };
    if let Some(subj) = &design.subj_id {
        cfg.subj_id = SubjectId::new(subj.as_str()).map_err(|e| e.to_string())?;
    }
    if let Some(seed) = design.seed {
        cfg.seed = seed;
    }
    cfg.validate().map_err(|e| e.to_string())?;
    Ok(cfg)
}

fn read_catalog(path: &Path) -> Result<StimulusCatalog, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    parse_catalog_csv(&text).map_err(|e| format!("{}: {e}", path.display()))
}

fn build_plan(catalog: &StimulusCatalog, cfg: &SessionConfig) -> Result<TrialPlan, String> {
    TrialDesigner::from_config(catalog.clone(), cfg)
        .and_then(|d| d.build(cfg.seed))
        .map_err(|e| e.to_string())
}

/// Every clip the plan and feedback will ask for must be indexed before the session starts.
fn load_sounds(
    plan: &TrialPlan,
    cfg: &SessionConfig,
    sounds_dir: &Path,
    feedback_dir: &Path,
) -> Result<SoundIndex, String> {
    let mut index = SoundIndex::load_dir(sounds_dir).map_err(|e| e.to_string())?;
    index.merge(SoundIndex::load_dir(feedback_dir).map_err(|e| e.to_string())?);

    let stimulus_clips: Vec<String> = plan
        .trials()
        .iter()
        .map(|t| t.sound_id.clip_name())
        .collect();
    let missing = index.missing(
        stimulus_clips
            .iter()
            .map(String::as_str)
            .chain([
                cfg.feedback.correct_clip.as_str(),
                cfg.feedback.incorrect_clip.as_str(),
            ]),
    );
    if !missing.is_empty() {
        return Err(format!("missing sound files: {}", missing.join(", ")));
    }
    Ok(index)
}
