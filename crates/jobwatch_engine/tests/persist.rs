use std::collections::HashMap;
use std::fs;

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use jobwatch_core::{fingerprint, JobPosting};
use jobwatch_engine::{
    AtomicFileWriter, JsonFileBacking, MemoryBacking, PersistError, SeenBacking,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn entries() -> HashMap<String, JobPosting> {
    let found_at = Utc.with_ymd_and_hms(2025, 9, 1, 8, 30, 0).unwrap();
    let posting = JobPosting::new(
        "Alternance SOC",
        "ACME",
        "Lyon",
        "https://fr.linkedin.com/jobs/view/42",
        found_at,
    );
    HashMap::from([(posting.fingerprint.clone(), posting)])
}

#[test]
fn missing_file_loads_as_empty() {
    let temp = TempDir::new().unwrap();
    let backing = JsonFileBacking::new(temp.path().join("seen_jobs.json"));

    assert!(backing.load_all().is_empty());
}

#[test]
fn corrupt_file_loads_as_empty() {
    watch_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("seen_jobs.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(JsonFileBacking::new(&path).load_all().is_empty());
}

#[test]
fn saved_entries_load_back() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("seen_jobs.json");
    let backing = JsonFileBacking::new(&path);

    backing.save_all(&entries()).unwrap();

    assert!(path.is_file());
    assert_eq!(backing.load_all(), entries());
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"found_at\""));
}

#[test]
fn legacy_file_with_naive_timestamps_loads_and_skips_damaged_entries() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("seen_jobs.json");
    let id = fingerprint("https://fr.linkedin.com/jobs/view/42");
    let legacy = format!(
        r#"{{
          "{id}": {{"id": "{id}", "title": "Alternance SOC", "company": "ACME",
                   "location": "Lyon", "url": "https://fr.linkedin.com/jobs/view/42",
                   "found_at": "2025-09-01T08:30:00.123456"}},
          "broken": {{"id": "broken", "title": "Alternance SIEM"}}
        }}"#
    );
    fs::write(&path, legacy).unwrap();

    let loaded = JsonFileBacking::new(&path).load_all();

    assert_eq!(loaded.len(), 1);
    let posting = &loaded[&id];
    assert_eq!(posting.title, "Alternance SOC");
    let naive: NaiveDateTime = "2025-09-01T08:30:00.123456".parse().unwrap();
    let expected = Local.from_local_datetime(&naive).earliest().unwrap();
    assert_eq!(posting.found_at, expected.with_timezone(&Utc));
}

#[test]
fn memory_backing_forgets_everything() {
    let backing = MemoryBacking;
    backing.save_all(&entries()).unwrap();
    assert!(backing.load_all().is_empty());
}

#[test]
fn atomic_write_replaces_previous_content() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    writer.write("state.json", "first").unwrap();
    let target = writer.write("state.json", "second").unwrap();

    assert_eq!(fs::read_to_string(target).unwrap(), "second");
    let files: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn file_in_place_of_state_dir_is_reported() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("state");
    fs::write(&blocker, "x").unwrap();

    let err = AtomicFileWriter::new(blocker.clone())
        .write("seen_jobs.json", "{}")
        .unwrap_err();

    assert!(matches!(err, PersistError::StateDir(_)));
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}
