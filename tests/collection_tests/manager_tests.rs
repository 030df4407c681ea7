//! Tests for CollectionManager
//!
//! These tests verify:
//! - Opening/creating the data directory and data.db
//! - Id and timestamp assignment on create
//! - Cache-backed read/read_all/count
//! - Update and delete against the slot on disk
//! - Cache rebuild on reopen, including skipped slots
//! - Lifecycle after close
//! - Concurrent access

#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::thread;

use common::{note_of_exact_capacity, setup_temp_dir, Note};
use slotstore::config::FileOptions;
use slotstore::{CollectionManager, Record, SlottedFile, StoreConfig, StoreError, SyncStrategy};
use uuid::Uuid;

// =============================================================================
// Helper Functions
// =============================================================================

fn sorted_by_id(mut notes: Vec<Note>) -> Vec<Note> {
    notes.sort_by_key(|n| n.id);
    notes
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_data_file() {
    let (_temp, dir) = setup_temp_dir();
    let store_dir = dir.join("notes");

    let manager = CollectionManager::<Note>::open(&store_dir).unwrap();

    assert!(store_dir.join("data.db").is_file());
    assert_eq!(manager.path(), store_dir.join("data.db"));
    assert_eq!(manager.record_size(), 250);
    assert_eq!(manager.count().unwrap(), 0);
}

#[test]
fn test_open_with_config() {
    let (_temp, dir) = setup_temp_dir();
    let config = StoreConfig::builder()
        .data_dir(&dir)
        .file_name("notes")
        .sync_strategy(SyncStrategy::EveryWrite)
        .build();

    let manager = CollectionManager::<Note>::open_with_config(config).unwrap();
    manager.create(Note::new("durable")).unwrap();

    assert!(dir.join("notes.db").is_file());
    assert_eq!(manager.config().sync_strategy, SyncStrategy::EveryWrite);
}

#[test]
fn test_open_rejects_invalid_file_name() {
    let (_temp, dir) = setup_temp_dir();
    let config = StoreConfig::builder()
        .data_dir(&dir)
        .file_name("../escape")
        .build();

    let result = CollectionManager::<Note>::open_with_config(config);

    assert!(matches!(result, Err(StoreError::Config(_))));
}

#[test]
fn test_second_manager_on_same_file_is_locked() {
    let (_temp, dir) = setup_temp_dir();

    let first = CollectionManager::<Note>::open(&dir).unwrap();
    let second = CollectionManager::<Note>::open(&dir);
    assert!(matches!(second, Err(StoreError::Locked(_))));

    first.close().unwrap();
    assert!(CollectionManager::<Note>::open(&dir).is_ok());
}

// =============================================================================
// Create / Read Tests
// =============================================================================

#[test]
fn test_create_assigns_id_and_timestamps() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    let mut input = Note::new("hello");
    input.id = Uuid::from_u128(42);

    let created = manager.create(input).unwrap();

    assert_ne!(created.id, Uuid::from_u128(42));
    assert_ne!(created.id, Uuid::nil());
    assert_eq!(created.id.get_version_num(), 7);
    assert!(created.created_at > 0);
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(created.title, "hello");
}

#[test]
fn test_create_then_read_returns_same_item() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    let before = manager.count().unwrap();
    let created = manager.create(Note::new("read me")).unwrap();

    assert_eq!(manager.read(created.id).unwrap(), created);
    assert_eq!(manager.count().unwrap(), before + 1);
    assert!(manager.contains(created.id).unwrap());
}

#[test]
fn test_created_ids_are_unique_and_time_ordered() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    let first = manager.create(Note::new("first")).unwrap();
    thread::sleep(std::time::Duration::from_millis(2));
    let second = manager.create(Note::new("second")).unwrap();

    assert_ne!(first.id, second.id);
    assert!(first.id < second.id);
}

#[test]
fn test_read_missing_is_not_found() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    let err = manager.read(Uuid::now_v7()).unwrap_err();

    assert!(err.is_not_found());
}

#[test]
fn test_read_all_returns_every_item() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    let created: Vec<Note> = (0..5)
        .map(|i| manager.create(Note::new(&format!("note {}", i))).unwrap())
        .collect();

    let all = manager.read_all().unwrap();

    assert_eq!(sorted_by_id(all), sorted_by_id(created));
}

#[test]
fn test_create_oversized_item_fails_without_caching() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    let err = manager.create(Note::new(&"z".repeat(400))).unwrap_err();

    assert!(err.is_capacity());
    assert_eq!(manager.count().unwrap(), 0);
    assert_eq!(fs::metadata(manager.path()).unwrap().len(), 0);
}

// =============================================================================
// Update Tests
// =============================================================================

#[test]
fn test_update_rewrites_same_slot() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    let created = manager.create(Note::new("draft")).unwrap();
    manager.create(Note::new("other")).unwrap();
    let len_before = fs::metadata(manager.path()).unwrap().len();

    let mut edited = created.clone();
    edited.title = "final".to_string();
    let updated = manager.update(edited).unwrap();

    assert_eq!(updated.title, "final");
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(manager.read(created.id).unwrap(), updated);
    assert_eq!(manager.count().unwrap(), 2);
    assert_eq!(fs::metadata(manager.path()).unwrap().len(), len_before);
}

#[test]
fn test_update_missing_is_not_found() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    let mut ghost = Note::new("ghost");
    ghost.id = Uuid::now_v7();

    let err = manager.update(ghost).unwrap_err();

    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(fs::metadata(manager.path()).unwrap().len(), 0);
}

#[test]
fn test_update_oversized_keeps_cached_value() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();
    let created = manager.create(Note::new("small")).unwrap();

    let mut bloated = created.clone();
    bloated.title = "z".repeat(400);
    let err = manager.update(bloated).unwrap_err();

    assert!(err.is_capacity());
    assert_eq!(manager.read(created.id).unwrap(), created);
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_removes_item_and_tombstones_slot() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    let doomed = manager.create(Note::new("doomed")).unwrap();
    let kept = manager.create(Note::new("kept")).unwrap();
    let before = fs::read(manager.path()).unwrap();

    manager.delete(doomed.id).unwrap();

    assert!(manager.read(doomed.id).unwrap_err().is_not_found());
    assert_eq!(manager.read(kept.id).unwrap(), kept);
    assert_eq!(manager.count().unwrap(), 1);

    // First slot holds `doomed`: status flipped, payload untouched
    let after = fs::read(manager.path()).unwrap();
    assert_eq!(after[0], 0x01);
    assert_eq!(after[1..Note::RECORD_SIZE], before[1..Note::RECORD_SIZE]);
    assert_eq!(after[Note::RECORD_SIZE..], before[Note::RECORD_SIZE..]);
}

#[test]
fn test_delete_missing_is_not_found() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();
    let created = manager.create(Note::new("once")).unwrap();

    manager.delete(created.id).unwrap();
    let err = manager.delete(created.id).unwrap_err();

    assert!(matches!(err, StoreError::NotFound(_)));
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_reopen_rebuilds_identical_cache() {
    let (_temp, dir) = setup_temp_dir();

    let expected = {
        let manager = CollectionManager::<Note>::open(&dir).unwrap();
        for i in 0..10 {
            manager.create(Note::new(&format!("note {}", i))).unwrap();
        }
        let all = manager.read_all().unwrap();
        manager.close().unwrap();
        all
    };

    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    assert_eq!(manager.count().unwrap(), 10);
    assert_eq!(
        sorted_by_id(manager.read_all().unwrap()),
        sorted_by_id(expected)
    );
}

#[test]
fn test_reopen_reflects_updates_and_deletes() {
    let (_temp, dir) = setup_temp_dir();

    let (updated, deleted_id) = {
        let manager = CollectionManager::<Note>::open(&dir).unwrap();
        let a = manager.create(Note::new("a")).unwrap();
        let b = manager.create(Note::new("b")).unwrap();

        let mut edited = a.clone();
        edited.title = "a2".to_string();
        let updated = manager.update(edited).unwrap();
        manager.delete(b.id).unwrap();
        manager.close().unwrap();
        (updated, b.id)
    };

    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    assert_eq!(manager.count().unwrap(), 1);
    assert_eq!(manager.read(updated.id).unwrap(), updated);
    assert!(manager.read(deleted_id).unwrap_err().is_not_found());

    // Offsets survive the reopen: mutating again hits the right slot
    manager.delete(updated.id).unwrap();
    manager.close().unwrap();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();
    assert_eq!(manager.count().unwrap(), 0);
}

#[test]
fn test_load_skips_bad_slots() {
    let (_temp, dir) = setup_temp_dir();

    let good = {
        let manager = CollectionManager::<Note>::open(&dir).unwrap();
        let good = manager.create(Note::new("good")).unwrap();
        manager.close().unwrap();
        good
    };

    // Append a slot that is valid on disk but is not a Note
    {
        let file =
            SlottedFile::open(&dir.join("data.db"), Note::RECORD_SIZE, FileOptions::default())
                .unwrap();
        file.write_record(b"{not json").unwrap();
        file.write_record(b"{\"unrelated\":true}").unwrap();
        file.close().unwrap();
    }

    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    assert_eq!(manager.count().unwrap(), 1);
    assert_eq!(manager.read(good.id).unwrap(), good);

    // New records still append after the skipped slots
    let fresh = manager.create(Note::new("fresh")).unwrap();
    assert_eq!(manager.read(fresh.id).unwrap(), fresh);
    assert_eq!(
        fs::metadata(manager.path()).unwrap().len(),
        4 * Note::RECORD_SIZE as u64
    );
}

#[test]
fn test_item_in_torn_tail_keeps_its_own_slot() {
    let (_temp, dir) = setup_temp_dir();

    let (a, b) = {
        let manager = CollectionManager::<Note>::open(&dir).unwrap();
        let a = manager.create(Note::new("a")).unwrap();
        let b = manager.create(Note::new("b")).unwrap();
        manager.close().unwrap();
        (a, b)
    };

    // Crash mid-slot: b's payload survives, its padding does not
    let raw = fs::OpenOptions::new()
        .write(true)
        .open(dir.join("data.db"))
        .unwrap();
    raw.set_len(Note::RECORD_SIZE as u64 + 150).unwrap();
    drop(raw);

    let c = {
        let manager = CollectionManager::<Note>::open(&dir).unwrap();
        assert_eq!(manager.read(b.id).unwrap(), b);

        let c = manager.create(Note::new("c")).unwrap();
        manager.delete(b.id).unwrap();

        assert_eq!(manager.read(c.id).unwrap(), c);
        assert_eq!(
            fs::metadata(manager.path()).unwrap().len(),
            3 * Note::RECORD_SIZE as u64
        );
        manager.close().unwrap();
        c
    };

    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    assert_eq!(manager.count().unwrap(), 2);
    assert_eq!(manager.read(a.id).unwrap(), a);
    assert_eq!(manager.read(c.id).unwrap(), c);
    assert!(manager.read(b.id).unwrap_err().is_not_found());
}

#[test]
fn test_duplicate_slot_does_not_resurrect_after_delete() {
    let (_temp, dir) = setup_temp_dir();

    let stale = {
        let manager = CollectionManager::<Note>::open(&dir).unwrap();
        let stale = manager.create(Note::new("stale")).unwrap();
        manager.close().unwrap();
        stale
    };

    // Append a second slot carrying the same id
    let mut newer = stale.clone();
    newer.title = "newer".to_string();
    {
        let file =
            SlottedFile::open(&dir.join("data.db"), Note::RECORD_SIZE, FileOptions::default())
                .unwrap();
        file.write_record(&serde_json::to_vec(&newer).unwrap()).unwrap();
        file.close().unwrap();
    }

    {
        let manager = CollectionManager::<Note>::open(&dir).unwrap();
        assert_eq!(manager.count().unwrap(), 1);
        assert_eq!(manager.read(stale.id).unwrap(), newer);

        manager.delete(stale.id).unwrap();
        manager.close().unwrap();
    }

    let manager = CollectionManager::<Note>::open(&dir).unwrap();

    assert_eq!(manager.count().unwrap(), 0);
    assert!(manager.read(stale.id).unwrap_err().is_not_found());
}

#[test]
fn test_exact_capacity_item_round_trips() {
    let (_temp, dir) = setup_temp_dir();

    let created = {
        let manager = CollectionManager::<Note>::open(&dir).unwrap();
        let created = manager.create(note_of_exact_capacity()).unwrap();
        assert_eq!(
            serde_json::to_vec(&created).unwrap().len(),
            Note::RECORD_SIZE - 1
        );
        manager.close().unwrap();
        created
    };

    let manager = CollectionManager::<Note>::open(&dir).unwrap();
    assert_eq!(manager.read(created.id).unwrap(), created);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_all_operations_fail_after_close() {
    let (_temp, dir) = setup_temp_dir();
    let manager = CollectionManager::<Note>::open(&dir).unwrap();
    let created = manager.create(Note::new("before close")).unwrap();

    manager.close().unwrap();

    assert!(manager.is_closed());
    assert!(matches!(manager.create(Note::new("x")), Err(StoreError::Closed)));
    assert!(matches!(manager.read(created.id), Err(StoreError::Closed)));
    assert!(matches!(manager.read_all(), Err(StoreError::Closed)));
    assert!(matches!(manager.update(created.clone()), Err(StoreError::Closed)));
    assert!(matches!(manager.delete(created.id), Err(StoreError::Closed)));
    assert!(matches!(manager.count(), Err(StoreError::Closed)));
    assert!(matches!(manager.contains(created.id), Err(StoreError::Closed)));

    // Closing twice is fine
    manager.close().unwrap();
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_creates_and_reads() {
    let (_temp, dir) = setup_temp_dir();
    let manager = Arc::new(CollectionManager::<Note>::open(&dir).unwrap());

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                (0..50)
                    .map(|i| {
                        let note = manager
                            .create(Note::new(&format!("t{} n{}", t, i)))
                            .unwrap();
                        // Readers always see a fully written item
                        assert_eq!(manager.read(note.id).unwrap(), note);
                        note.id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let reader = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || {
            for _ in 0..100 {
                let count = manager.count().unwrap();
                assert!(manager.read_all().unwrap().len() >= count);
            }
        })
    };

    let mut ids = HashSet::new();
    for handle in writers {
        ids.extend(handle.join().unwrap());
    }
    reader.join().unwrap();

    assert_eq!(ids.len(), 200);
    assert_eq!(manager.count().unwrap(), 200);
    assert_eq!(
        fs::metadata(manager.path()).unwrap().len(),
        200 * Note::RECORD_SIZE as u64
    );
}
