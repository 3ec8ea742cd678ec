use core::num::NonZeroU64;
use std::collections::HashSet;
use std::sync::Mutex;
use std::thread::scope;

use crate::{AtomicSequence, DEFAULT_FIRST_ID, Error, Id, IdSequence};

fn run_sequence_increments<S: IdSequence>(sequence: &S, first: u64) {
    assert_eq!(sequence.peek(), Some(Id::new(first)));
    let id1 = sequence.next_id().unwrap();
    let id2 = sequence.next_id().unwrap();
    let id3 = sequence.next_id().unwrap();

    assert_eq!(id1.get(), first);
    assert_eq!(id2.get(), first + 1);
    assert_eq!(id3.get(), first + 2);
    assert!(id1 < id2 && id2 < id3);
}

fn run_sequence_unique_threaded<S: IdSequence>(sequence: &S) {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 4096;

    let seen = Mutex::new(HashSet::with_capacity(THREADS * IDS_PER_THREAD));

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let mut last = None;
                for _ in 0..IDS_PER_THREAD {
                    let id = sequence.next_id().unwrap();
                    // Each thread sees its own draws in increasing order.
                    assert!(last.is_none_or(|last| last < id));
                    last = Some(id);
                    assert!(seen.lock().unwrap().insert(id));
                }
            });
        }
    });

    assert_eq!(seen.lock().unwrap().len(), THREADS * IDS_PER_THREAD);
}

#[test]
fn atomic_sequence_starts_at_default() {
    run_sequence_increments(&AtomicSequence::new(), DEFAULT_FIRST_ID);
}

#[test]
fn atomic_sequence_starts_at_custom_first_id() {
    run_sequence_increments(&AtomicSequence::starting_at(NonZeroU64::MIN), 1);
}

#[test]
fn atomic_sequence_unique_threaded() {
    run_sequence_unique_threaded(&AtomicSequence::new());
}

#[test]
fn atomic_sequence_reports_exhaustion() {
    let sequence = AtomicSequence::starting_at(NonZeroU64::new(u64::MAX - 1).unwrap());
    assert_eq!(sequence.next_id().unwrap().get(), u64::MAX - 1);
    assert_eq!(sequence.next_id().unwrap().get(), u64::MAX);
    assert_eq!(sequence.peek(), None);
    assert!(matches!(sequence.next_id(), Err(Error::IdSpaceExhausted)));
    assert!(matches!(sequence.next_id(), Err(Error::IdSpaceExhausted)));
}
