// tests/property.rs

use std::sync::Arc;
use std::time::{Duration, Instant};

use foundation::compare::parts_match_in_order;
use foundation::config::ObserverConfiguration;
use foundation::fs::mock::MockFileSystem;
use foundation::operation::{Operation, Parameters, ParameterizedOperation};
use foundation::types::ChangeKind;
use foundation::watch::{ChangeEvent, FileSystemChangeProcessor};
use proptest::prelude::*;

proptest! {
    #[test]
    fn parameters_copy_is_independent(
        entries in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..8),
        extra_key in "[A-Z]{1,4}",
    ) {
        let params: Parameters = entries.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let op = ParameterizedOperation::new("p", params.clone());

        let mut copy = op.parameters();
        copy.insert(extra_key.clone(), true);
        if let Some(first) = entries.keys().next() {
            copy.remove(first);
        }

        prop_assert_eq!(op.parameters(), params);
        prop_assert!(!op.parameters().contains_key(&extra_key));
    }

    #[test]
    fn burst_within_window_collapses(
        gaps_ms in proptest::collection::vec(0u64..50, 1..40),
    ) {
        let fs = MockFileSystem::new();
        let window = Duration::from_millis(50);
        let cfg = ObserverConfiguration::builder(["/proj"])
            .debounce(window)
            .build()
            .unwrap();
        let mut p = FileSystemChangeProcessor::with_file_system(&cfg, Arc::new(fs)).unwrap();

        let t0 = Instant::now();
        let mut at = t0;
        let mut emitted = 0;
        for gap in &gaps_ms {
            at += Duration::from_millis(*gap);
            emitted += p.flush_due(at).len();
            p.process_change(ChangeEvent::new("/proj/file.txt", ChangeKind::Modify), at);
        }
        emitted += p.flush_due(at + window * 20).len();

        // Every gap is shorter than the window, so nothing fires mid-burst
        // unless the burst outlives the cap.
        let total: u64 = gaps_ms.iter().sum();
        if total < 10 * 50 {
            prop_assert_eq!(emitted, 1);
        } else {
            prop_assert!(emitted >= 1);
            prop_assert!(emitted as u64 <= total / (10 * 50) + 1);
        }
    }

    #[test]
    fn sequence_always_contains_its_own_subsequences(
        seq in proptest::collection::vec("[a-c]", 1..10),
        mask in proptest::collection::vec(any::<bool>(), 10),
    ) {
        let picked: Vec<&String> = seq.iter().zip(&mask).filter(|(_, keep)| **keep).map(|(s, _)| s).collect();
        let pattern: Vec<String> = picked.into_iter().cloned().collect();
        prop_assert_eq!(parts_match_in_order(&seq, &pattern), !pattern.is_empty());
    }
}
