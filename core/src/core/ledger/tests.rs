mod common {
    use crate::core::ledger::Ledger;
    use crate::types::{ContentHash, LedgerConfig};
    use tempfile::TempDir;

    pub(super) fn create_test_ledger() -> (Ledger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            ledger_path: temp_dir.path().join("pinner.redb"),
        };
        let ledger = Ledger::open(config).unwrap();
        (ledger, temp_dir)
    }

    pub(super) fn make_hash(s: &str) -> ContentHash {
        ContentHash::try_from(s).unwrap()
    }
}

mod open {
    use super::common::*;
    use crate::core::ledger::Ledger;
    use crate::types::LedgerConfig;
    use std::time::SystemTime;
    use tempfile::TempDir;

    #[test]
    fn test_new_ledger_is_empty() {
        let (ledger, _temp) = create_test_ledger();
        assert!(ledger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            ledger_path: temp_dir.path().join("nested/dir/pinner.redb"),
        };
        let ledger = Ledger::open(config).unwrap();
        assert!(ledger.read_all().unwrap().is_empty());
        assert!(temp_dir.path().join("nested/dir/pinner.redb").exists());
    }

    #[test]
    fn test_entries_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            ledger_path: temp_dir.path().join("pinner.redb"),
        };
        let now = SystemTime::now();

        {
            let mut ledger = Ledger::open(config.clone()).unwrap();
            ledger.upsert(&make_hash("QmA"), now).unwrap();
        }

        let ledger = Ledger::open(config).unwrap();
        assert_eq!(ledger.get(&make_hash("QmA")).unwrap(), Some(now));
    }

    #[test]
    fn test_second_handle_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            ledger_path: temp_dir.path().join("pinner.redb"),
        };

        let _first = Ledger::open(config.clone()).unwrap();
        let err = match Ledger::open(config) {
            Ok(_) => panic!("second open should fail while the first handle lives"),
            Err(err) => err,
        };
        assert!(err.is_already_open());
    }
}

mod upsert {
    use super::common::*;
    use crate::core::ledger::error::DatabaseError;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_upsert_inserts_new_hash() {
        let (mut ledger, _temp) = create_test_ledger();
        let now = SystemTime::now();

        ledger.upsert(&make_hash("QmA"), now).unwrap();

        let entries = ledger.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[&make_hash("QmA")], now);
    }

    #[test]
    fn test_upsert_same_timestamp_is_noop() {
        let (mut ledger, _temp) = create_test_ledger();
        let now = SystemTime::now();

        ledger.upsert(&make_hash("QmA"), now).unwrap();
        ledger.upsert(&make_hash("QmA"), now).unwrap();

        assert_eq!(ledger.read_all().unwrap().len(), 1);
        assert_eq!(ledger.get(&make_hash("QmA")).unwrap(), Some(now));
    }

    #[test]
    fn test_upsert_different_timestamp_is_duplicate() {
        let (mut ledger, _temp) = create_test_ledger();
        let now = SystemTime::now();
        let later = now + Duration::from_secs(5);

        ledger.upsert(&make_hash("QmA"), now).unwrap();
        let result = ledger.upsert(&make_hash("QmA"), later);

        assert!(matches!(
            result,
            Err(DatabaseError::DuplicateInsert { ref hash }) if hash.as_str() == "QmA"
        ));
        // Original timestamp untouched
        assert_eq!(ledger.get(&make_hash("QmA")).unwrap(), Some(now));
    }
}

mod remove {
    use super::common::*;
    use std::time::SystemTime;

    #[test]
    fn test_remove_existing_hash() {
        let (mut ledger, _temp) = create_test_ledger();
        ledger.upsert(&make_hash("QmA"), SystemTime::now()).unwrap();

        assert!(ledger.remove(&make_hash("QmA")).unwrap());
        assert!(ledger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_remove_absent_hash_is_noop() {
        let (mut ledger, _temp) = create_test_ledger();
        ledger.upsert(&make_hash("QmA"), SystemTime::now()).unwrap();

        assert!(!ledger.remove(&make_hash("QmB")).unwrap());
        assert_eq!(ledger.read_all().unwrap().len(), 1);
    }
}

mod transaction {
    use super::common::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_batch_commit_applies_all_changes() {
        let (mut ledger, _temp) = create_test_ledger();
        let now = SystemTime::now();
        ledger.upsert(&make_hash("QmOld"), now).unwrap();

        let later = now + Duration::from_secs(10);
        let txn = ledger.begin().unwrap();
        txn.remove(&make_hash("QmOld")).unwrap();
        txn.upsert(&make_hash("QmNew1"), later).unwrap();
        txn.upsert(&make_hash("QmNew2"), later).unwrap();
        txn.commit().unwrap();

        let entries = ledger.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[&make_hash("QmNew1")], later);
        assert_eq!(entries[&make_hash("QmNew2")], later);
    }

    #[test]
    fn test_dropped_transaction_changes_nothing() {
        let (mut ledger, _temp) = create_test_ledger();
        let now = SystemTime::now();
        ledger.upsert(&make_hash("QmKeep"), now).unwrap();

        {
            let txn = ledger.begin().unwrap();
            txn.remove(&make_hash("QmKeep")).unwrap();
            txn.upsert(&make_hash("QmLost"), now).unwrap();
        }

        let entries = ledger.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key(&make_hash("QmKeep")));
    }

    #[test]
    fn test_aborted_transaction_changes_nothing() {
        let (mut ledger, _temp) = create_test_ledger();
        let now = SystemTime::now();

        let txn = ledger.begin().unwrap();
        txn.upsert(&make_hash("QmLost"), now).unwrap();
        txn.abort().unwrap();

        assert!(ledger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_failed_upsert_leaves_batch_usable() {
        let (mut ledger, _temp) = create_test_ledger();
        let now = SystemTime::now();
        ledger.upsert(&make_hash("QmA"), now).unwrap();

        let txn = ledger.begin().unwrap();
        txn.upsert(&make_hash("QmA"), now + Duration::from_secs(1))
            .unwrap_err();
        txn.upsert(&make_hash("QmB"), now).unwrap();
        txn.commit().unwrap();

        let entries = ledger.read_all().unwrap();
        assert_eq!(entries[&make_hash("QmA")], now);
        assert_eq!(entries[&make_hash("QmB")], now);
    }
}
