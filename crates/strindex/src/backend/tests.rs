use core::num::NonZeroU64;
use std::collections::HashSet;
use std::sync::Mutex;
use std::thread::scope;

use crate::{
    AtomicSequence, CachingIndexer, DEFAULT_FIRST_ID, Error, FetchType, Id, IdSequence, Indexer,
    KeyCollection, MemoryCache, MemoryIndexer, OrgId, Result, SharedOrgIndexer, SharedStrings,
    UseCase,
};

const ORG: OrgId = OrgId::new(1);

fn keys(use_case: UseCase, org: u64, strings: &[&str]) -> KeyCollection {
    KeyCollection::from_org_strings(use_case, [(org, strings.iter().copied())]).unwrap()
}

fn run_lookup_misses_are_absent<I: Indexer>(indexer: &I) {
    let results = indexer
        .lookup_batch(&keys(UseCase::Transactions, 1, &["a", "b"]))
        .unwrap();
    assert!(results.is_empty());
    assert_eq!(
        indexer.resolve(UseCase::Transactions, ORG, "a").unwrap(),
        None
    );
}

fn run_allocate_then_lookup<I: Indexer>(indexer: &I) {
    let batch = keys(UseCase::Transactions, 1, &["a", "b"]);
    let allocated = indexer.allocate_batch(&batch).unwrap();
    assert_eq!(allocated.len(), 2);
    assert_eq!(
        allocated.fetch_type_counts()[&FetchType::FirstSeen],
        2,
        "fresh keys are first seen"
    );

    let read = indexer.lookup_batch(&batch).unwrap();
    for (use_case, org_id, string, resolved) in read.iter() {
        assert_eq!(resolved.fetch_type, FetchType::DbRead);
        assert_eq!(Some(resolved.id), allocated.get(use_case, org_id, string));
        assert_eq!(
            indexer.reverse_resolve(resolved.id).unwrap().as_deref(),
            Some(string)
        );
    }
}

fn run_allocate_is_idempotent<I: Indexer>(indexer: &I) {
    let batch = keys(UseCase::Spans, 1, &["op", "db"]);
    let first = indexer.allocate_batch(&batch).unwrap();
    let second = indexer.allocate_batch(&batch).unwrap();

    for (use_case, org_id, string, resolved) in first.iter() {
        assert_eq!(second.get(use_case, org_id, string), Some(resolved.id));
        assert_eq!(
            second.fetch_type(use_case, org_id, string),
            Some(FetchType::DbRead)
        );
    }
}

fn run_ids_unique_across_scopes<I: Indexer>(indexer: &I) {
    let mut batch = KeyCollection::new();
    for use_case in UseCase::ALL {
        batch.add(use_case, 1u64, ["shared", "name"]).unwrap();
        batch.add(use_case, 2u64, ["shared"]).unwrap();
    }
    let allocated = indexer.allocate_batch(&batch).unwrap();

    let ids: HashSet<Id> = allocated.iter().map(|(.., resolved)| resolved.id).collect();
    assert_eq!(ids.len(), batch.size());
}

fn run_shared_org_unsupported<I: Indexer>(indexer: &I) {
    assert!(matches!(
        indexer.resolve_shared_org("environment"),
        Err(Error::Unsupported {
            operation: "resolve_shared_org"
        })
    ));
    assert!(matches!(
        indexer.reverse_shared_org_resolve(Id::new(1)),
        Err(Error::Unsupported {
            operation: "reverse_shared_org_resolve"
        })
    ));
}

fn run_empty_string_is_invalid<I: Indexer>(indexer: &I) {
    assert!(matches!(
        indexer.resolve(UseCase::Spans, ORG, ""),
        Err(Error::InvalidKey { .. })
    ));
}

fn run_racing_allocations_agree<I: Indexer>(indexer: &I) {
    const THREADS: usize = 8;

    let batch = keys(UseCase::Transactions, 1, &["a", "b", "c", "d"]);
    let outcomes = Mutex::new(Vec::with_capacity(THREADS));

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let result = indexer.allocate_batch(&batch).unwrap();
                outcomes.lock().unwrap().push(result.mapping(UseCase::Transactions));
            });
        }
    });

    let outcomes = outcomes.into_inner().unwrap();
    assert!(outcomes.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn memory_lookup_misses_are_absent() {
    run_lookup_misses_are_absent(&MemoryIndexer::new());
}

#[test]
fn memory_allocate_then_lookup() {
    run_allocate_then_lookup(&MemoryIndexer::new());
}

#[test]
fn memory_allocate_is_idempotent() {
    run_allocate_is_idempotent(&MemoryIndexer::new());
}

#[test]
fn memory_ids_unique_across_scopes() {
    run_ids_unique_across_scopes(&MemoryIndexer::new());
}

#[test]
fn memory_shared_org_unsupported() {
    run_shared_org_unsupported(&MemoryIndexer::new());
}

#[test]
fn empty_string_is_invalid_for_every_stack() {
    run_empty_string_is_invalid(&MemoryIndexer::new());
    run_empty_string_is_invalid(&SharedOrgIndexer::new(
        MemoryIndexer::new(),
        SharedStrings::new([("environment", 1)]).unwrap(),
    ));
    run_empty_string_is_invalid(&CachingIndexer::new(
        MemoryIndexer::new(),
        MemoryCache::new(),
    ));
}

#[test]
fn memory_racing_allocations_agree() {
    run_racing_allocations_agree(&MemoryIndexer::new());
}

#[test]
fn boxed_and_arced_backends_forward() {
    let boxed: Box<dyn Indexer> = Box::new(MemoryIndexer::new());
    run_allocate_then_lookup(&boxed);
    run_shared_org_unsupported(&boxed);

    let arced = std::sync::Arc::new(MemoryIndexer::new());
    run_racing_allocations_agree(&arced);
}

#[test]
fn memory_mints_from_first_id_in_key_order() {
    let indexer = MemoryIndexer::with_first_id(NonZeroU64::MIN);
    let allocated = indexer
        .allocate_batch(&keys(UseCase::Sessions, 1, &["b", "a"]))
        .unwrap();

    assert_eq!(allocated.get(UseCase::Sessions, ORG, "a"), Some(Id::new(1)));
    assert_eq!(allocated.get(UseCase::Sessions, ORG, "b"), Some(Id::new(2)));
    assert_eq!(indexer.len().unwrap(), 2);
}

#[test]
fn memory_default_first_id() {
    let indexer = MemoryIndexer::default();
    assert!(indexer.is_empty().unwrap());
    let allocated = indexer
        .allocate_batch(&keys(UseCase::Custom, 5, &["x"]))
        .unwrap();
    assert_eq!(
        allocated.get(UseCase::Custom, OrgId::new(5), "x"),
        Some(Id::new(DEFAULT_FIRST_ID))
    );
}

/// Hands out the same id forever.
struct StuckSequence;

impl IdSequence for StuckSequence {
    fn next_id(&self) -> Result<Id> {
        Ok(Id::new(42))
    }

    fn peek(&self) -> Option<Id> {
        Some(Id::new(42))
    }
}

#[test]
fn memory_refuses_reissued_ids() {
    let indexer = MemoryIndexer::with_sequence(StuckSequence);
    indexer
        .allocate_batch(&keys(UseCase::Spans, 1, &["a"]))
        .unwrap();

    let err = indexer
        .allocate_batch(&keys(UseCase::Spans, 1, &["b"]))
        .unwrap_err();
    assert!(matches!(err, Error::ConflictingMapping { .. }));
    // Nothing half-written: the forward table has no entry for "b".
    assert_eq!(indexer.resolve(UseCase::Spans, ORG, "b").unwrap(), None);
    assert_eq!(
        indexer.reverse_resolve(Id::new(42)).unwrap().as_deref(),
        Some("a")
    );
}

#[test]
fn memory_surfaces_exhaustion() {
    let indexer = MemoryIndexer::with_sequence(AtomicSequence::starting_at(NonZeroU64::MAX));
    let err = indexer
        .allocate_batch(&keys(UseCase::Spans, 1, &["a", "b"]))
        .unwrap_err();
    assert!(matches!(err, Error::IdSpaceExhausted));

    // The id minted before the failure is kept and handed back on retry.
    assert_eq!(
        indexer.resolve(UseCase::Spans, ORG, "a").unwrap(),
        Some(Id::new(u64::MAX))
    );
}
