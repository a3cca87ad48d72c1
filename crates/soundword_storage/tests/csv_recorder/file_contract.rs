#![forbid(unsafe_code)]

use std::fs;

use soundword_kernel_contracts::catalog::{Category, SeedId, Word, WordType};
use soundword_kernel_contracts::session::{Session, SubjectId};
use soundword_kernel_contracts::trial::{
    BlockIx, CompletedTrial, LogicalResponse, ReactionTimeMs, Trial, TrialIx, TrialResponse,
};
use soundword_storage::csv_file::{data_file_path, CsvSessionRecorder};
use soundword_storage::memory::InMemorySessionRecorder;
use soundword_storage::record::header_line;
use soundword_storage::{RecorderDisposition, RecorderError, SessionRecorder};

fn session(subj: &str) -> Session {
    Session::v1(
        SubjectId::new(subj).unwrap(),
        "2026-10-17 09:30:00".to_string(),
        "pl".to_string(),
        "lab-3".to_string(),
        100,
    )
    .unwrap()
}

fn completed(block: u16, ix: u16, response: LogicalResponse) -> CompletedTrial {
    CompletedTrial::from_response(
        Trial::v1(
            BlockIx(block),
            TrialIx(ix),
            SeedId::new("glass-1").unwrap(),
            Category::new("glass").unwrap(),
            Word::new("tink").unwrap(),
            Category::new("glass").unwrap(),
            WordType::new("sound").unwrap(),
            true,
        )
        .unwrap(),
        TrialResponse {
            response,
            reaction_time_ms: ReactionTimeMs(400 + ix as u64),
        },
    )
}

#[test]
fn at_rec_01_header_written_on_create_and_rows_visible_after_each_append() {
    let dir = tempfile::tempdir().unwrap();
    let s = session("S01");
    let path = data_file_path(&dir.path().join("data"), &s);
    let mut rec = CsvSessionRecorder::create(&path, s).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), header_line());

    rec.append(&completed(1, 1, LogicalResponse::YES)).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.ends_with("S01,2026-10-17 09:30:00,pl,lab-3,1,1,glass-1,tink,glass,glass,sound,1,1,401,1\n"));

    rec.append(&completed(1, 2, LogicalResponse::NO)).unwrap();
    assert_eq!(rec.rows_written(), 2);
    assert_eq!(rec.close().unwrap(), RecorderDisposition::Kept { rows: 2 });
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);
}

#[test]
fn at_rec_02_existing_subject_data_is_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("S02.csv");
    fs::write(&path, "previous run\n").unwrap();

    let err = CsvSessionRecorder::create(&path, session("S02")).unwrap_err();
    assert!(matches!(err, RecorderError::ExistingData { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "previous run\n");
}

#[test]
fn at_rec_03_empty_placeholder_file_may_be_reused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("S03.csv");
    fs::write(&path, "").unwrap();
    let mut rec = CsvSessionRecorder::create(&path, session("S03")).unwrap();
    assert_eq!(rec.close().unwrap(), RecorderDisposition::Kept { rows: 0 });
}

#[test]
fn at_rec_04_header_only_output_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("S04.csv");
    let mut rec = CsvSessionRecorder::create(&path, session("S04")).unwrap();
    assert_eq!(
        rec.discard_if_header_only().unwrap(),
        RecorderDisposition::DiscardedHeaderOnly
    );
    assert!(!path.exists());
}

#[test]
fn at_rec_05_partial_output_is_kept_on_discard_request() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("S05.csv");
    let mut rec = CsvSessionRecorder::create(&path, session("S05")).unwrap();
    rec.append(&completed(1, 1, LogicalResponse::YES)).unwrap();
    assert_eq!(
        rec.discard_if_header_only().unwrap(),
        RecorderDisposition::Kept { rows: 1 }
    );
    assert!(path.exists());
}

#[test]
fn at_rec_06_append_after_close_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = CsvSessionRecorder::create(dir.path().join("S06.csv"), session("S06")).unwrap();
    rec.close().unwrap();
    assert!(matches!(
        rec.append(&completed(1, 1, LogicalResponse::YES)),
        Err(RecorderError::Closed)
    ));
    assert!(matches!(rec.close(), Err(RecorderError::Closed)));
}

#[test]
fn at_rec_07_memory_recorder_renders_same_bytes_as_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("S07.csv");
    let mut file_rec = CsvSessionRecorder::create(&path, session("S07")).unwrap();
    let mut mem_rec = InMemorySessionRecorder::new(session("S07"));
    for ix in 1..=3 {
        let c = completed(2, ix, LogicalResponse::NO);
        file_rec.append(&c).unwrap();
        mem_rec.append(&c).unwrap();
    }
    file_rec.close().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), mem_rec.render());
}
