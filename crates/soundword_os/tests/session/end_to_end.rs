#![forbid(unsafe_code)]

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::rc::Rc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use soundword_engines::catalog::StimulusCatalog;
use soundword_engines::response_device::{
    InputEventSource, MonotonicClock, NoGamepadHardware, ResponseDevice,
};
use soundword_engines::trial_gen::TrialDesigner;
use soundword_engines::DeviceError;
use soundword_kernel_contracts::catalog::{Category, SeedId, StimulusRecord, Word, WordType};
use soundword_kernel_contracts::device::InputEvent;
use soundword_kernel_contracts::session::{SessionConfig, SubjectId};
use soundword_kernel_contracts::MonotonicTimeNs;
use soundword_os::collaborators::{
    AudioPlayback, ClipId, Collaborators, Pacer, Presenter, ScreenKind, ScreenOutcome,
};
use soundword_os::experiment::{finish_session, Experiment, SessionOutcome};
use soundword_os::session::open_session;
use soundword_os::trial_executor::{ExecutorConfig, TrialExecutor};
use soundword_os::ExecutionError;
use soundword_storage::csv_file::{data_file_path, CsvSessionRecorder};
use soundword_storage::memory::InMemorySessionRecorder;
use soundword_storage::{RecorderDisposition, SessionRecorder};

#[derive(Clone, Default)]
struct ManualClock(Rc<Cell<u64>>);

impl MonotonicClock for ManualClock {
    fn now(&self) -> MonotonicTimeNs {
        MonotonicTimeNs(self.0.get())
    }
}

impl Pacer for ManualClock {
    fn wait(&mut self, duration: Duration) {
        self.0.set(self.0.get() + duration.as_nanos() as u64);
    }
}

/// Answers screens from a script; continues once the script runs out.
struct ScriptedScreens {
    answers: VecDeque<ScreenOutcome>,
    shown: Vec<ScreenKind>,
}

impl ScriptedScreens {
    fn new(answers: Vec<ScreenOutcome>) -> Self {
        Self {
            answers: answers.into(),
            shown: Vec::new(),
        }
    }
}

impl Presenter for ScriptedScreens {
    fn show_fixation(&mut self) -> Result<(), ExecutionError> {
        Ok(())
    }
    fn show_stimulus_cue(&mut self) -> Result<(), ExecutionError> {
        Ok(())
    }
    fn show_word(&mut self, _word: &Word) -> Result<(), ExecutionError> {
        Ok(())
    }
    fn show_response_prompt(&mut self) -> Result<(), ExecutionError> {
        Ok(())
    }
    fn clear(&mut self) -> Result<(), ExecutionError> {
        Ok(())
    }
    fn show_screen(
        &mut self,
        kind: ScreenKind,
        _title: &str,
        _text: &str,
    ) -> Result<ScreenOutcome, ExecutionError> {
        self.shown.push(kind);
        Ok(self.answers.pop_front().unwrap_or(ScreenOutcome::Continue))
    }
}

struct FixedLengthAudio;

impl AudioPlayback for FixedLengthAudio {
    fn play(&mut self, _clip: &ClipId) -> Result<Duration, ExecutionError> {
        Ok(Duration::from_millis(600))
    }
}

/// Presses `y` 300 ms after every response wait starts.
struct AlwaysYes {
    clock: ManualClock,
}

impl InputEventSource for AlwaysYes {
    fn next_event(&mut self) -> Result<InputEvent, DeviceError> {
        self.clock.wait(Duration::from_millis(300));
        InputEvent::key("y", self.clock.now()).map_err(|e| DeviceError::Source(e.to_string()))
    }
}

fn catalog() -> StimulusCatalog {
    let mut records = Vec::new();
    for c in ["glass", "metal", "water", "wood"] {
        for s in 1..=4 {
            for w in ["a", "b"] {
                records.push(
                    StimulusRecord::v1(
                        SeedId::new(format!("{c}-{s}")).unwrap(),
                        Category::new(c).unwrap(),
                        Word::new(format!("{c}-{w}")).unwrap(),
                        WordType::new("sound").unwrap(),
                    )
                    .unwrap(),
                );
            }
        }
    }
    StimulusCatalog::new(records)
}

fn config(subj: &str) -> SessionConfig {
    SessionConfig::mvp_v1(SubjectId::new(subj).unwrap(), 100)
}

type Io = Collaborators<ScriptedScreens, FixedLengthAudio, ManualClock, AlwaysYes>;

fn io(screens: Vec<ScreenOutcome>) -> Io {
    let clock = ManualClock::default();
    Collaborators {
        presenter: ScriptedScreens::new(screens),
        audio: FixedLengthAudio,
        pacer: clock.clone(),
        input: AlwaysYes { clock },
    }
}

fn experiment<R: SessionRecorder>(
    cfg: &SessionConfig,
    recorder: R,
    screens: Vec<ScreenOutcome>,
) -> Experiment<R, ScriptedScreens, FixedLengthAudio, ManualClock, AlwaysYes> {
    let plan = TrialDesigner::from_config(catalog(), cfg)
        .unwrap()
        .build(cfg.seed)
        .unwrap();
    let device = ResponseDevice::acquire(
        &mut NoGamepadHardware,
        cfg.keyboard_map.clone(),
        cfg.gamepad_map.clone(),
    );
    let executor =
        TrialExecutor::new(ExecutorConfig::from_session_config(cfg).unwrap(), device).unwrap();
    Experiment::new(
        session(cfg),
        plan,
        executor,
        cfg.texts.clone(),
        io(screens),
        recorder,
    )
}

fn session(cfg: &SessionConfig) -> soundword_kernel_contracts::session::Session {
    open_session(
        cfg,
        Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap(),
        "lab-3".to_string(),
    )
    .unwrap()
}

#[test]
fn at_e2e_01_seed_100_writes_header_and_96_rows_with_unique_trial_ix_per_block() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config("S100");
    let path = data_file_path(dir.path(), &session(&cfg));
    let recorder = CsvSessionRecorder::create(&path, session(&cfg)).unwrap();

    let mut exp = experiment(&cfg, recorder, vec![]);
    let outcome = exp.run().unwrap();
    assert_eq!(outcome, SessionOutcome::Completed { trials: 96 });

    let (mut recorder, io) = exp.into_parts();
    assert_eq!(
        io.presenter.shown,
        vec![
            ScreenKind::Instructions,
            ScreenKind::Break,
            ScreenKind::Break,
            ScreenKind::Break
        ]
    );
    assert_eq!(
        finish_session(&mut recorder, outcome).unwrap(),
        RecorderDisposition::Kept { rows: 96 }
    );

    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "subj_id,date,experimenter,computer,block_ix,trial_ix,sound_id,word,sound_category,\
         word_category,word_type,correct_response,response,rt,is_correct"
    );
    let rows: Vec<Vec<&str>> = lines.map(|l| l.split(',').collect()).collect();
    assert_eq!(rows.len(), 96);

    let mut per_block: BTreeMap<&str, BTreeSet<u16>> = BTreeMap::new();
    for r in &rows {
        assert_eq!(r.len(), 15);
        assert_eq!(&r[..4], &["S100", "2026-10-17 09:30:00", "unknown", "lab-3"]);
        assert_eq!(r[12], "1");
        assert_eq!(r[13], "300");
        // "y" is correct exactly when the word belongs to the sound's category.
        assert_eq!(r[14], r[11]);
        assert!(per_block
            .entry(r[4])
            .or_default()
            .insert(r[5].parse().unwrap()));
    }
    assert_eq!(per_block.len(), 4);
    for ixs in per_block.values() {
        assert_eq!(*ixs, (1..=24).collect::<BTreeSet<u16>>());
    }
}

#[test]
fn at_e2e_02_rows_follow_block_then_trial_order() {
    let cfg = config("S101");
    let mut exp = experiment(&cfg, InMemorySessionRecorder::new(session(&cfg)), vec![]);
    exp.run().unwrap();
    let keys: Vec<(u16, u16)> = exp
        .recorder()
        .completed()
        .iter()
        .map(|c| (c.trial.block_ix.0, c.trial.trial_ix.0))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn at_e2e_03_quit_at_instructions_discards_header_only_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config("S102");
    let path = data_file_path(dir.path(), &session(&cfg));
    let recorder = CsvSessionRecorder::create(&path, session(&cfg)).unwrap();

    let mut exp = experiment(&cfg, recorder, vec![ScreenOutcome::Quit]);
    let outcome = exp.run().unwrap();
    assert_eq!(
        outcome,
        SessionOutcome::Quit {
            trials_completed: 0,
            blocks_completed: 0
        }
    );
    let (mut recorder, _) = exp.into_parts();
    assert_eq!(
        finish_session(&mut recorder, outcome).unwrap(),
        RecorderDisposition::DiscardedHeaderOnly
    );
    assert!(!path.exists());
}

#[test]
fn at_e2e_04_quit_at_first_break_keeps_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config("S103");
    let path = data_file_path(dir.path(), &session(&cfg));
    let recorder = CsvSessionRecorder::create(&path, session(&cfg)).unwrap();

    let mut exp = experiment(
        &cfg,
        recorder,
        vec![ScreenOutcome::Continue, ScreenOutcome::Quit],
    );
    let outcome = exp.run().unwrap();
    assert_eq!(
        outcome,
        SessionOutcome::Quit {
            trials_completed: 24,
            blocks_completed: 1
        }
    );
    let (mut recorder, _) = exp.into_parts();
    assert_eq!(
        finish_session(&mut recorder, outcome).unwrap(),
        RecorderDisposition::Kept { rows: 24 }
    );
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 25);
    assert!(text.lines().skip(1).all(|l| l.split(',').nth(4) == Some("1")));
}

#[test]
fn at_e2e_05_same_seed_same_bytes() {
    let cfg = config("S104");
    let mut a = experiment(&cfg, InMemorySessionRecorder::new(session(&cfg)), vec![]);
    let mut b = experiment(&cfg, InMemorySessionRecorder::new(session(&cfg)), vec![]);
    a.run().unwrap();
    b.run().unwrap();
    assert_eq!(a.plan().digest(), b.plan().digest());
    assert_eq!(a.recorder().render(), b.recorder().render());

    let mut other = cfg.clone();
    other.seed = 101;
    let c = experiment(&other, InMemorySessionRecorder::new(session(&other)), vec![]);
    assert_ne!(a.plan().digest(), c.plan().digest());
}

#[test]
fn at_e2e_06_existing_output_stops_before_any_trial() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config("S105");
    let path = data_file_path(dir.path(), &session(&cfg));
    fs::write(&path, "subj_id\nS105\n").unwrap();
    assert!(CsvSessionRecorder::create(&path, session(&cfg)).is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), "subj_id\nS105\n");
}
