use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::thread::scope;

use strindex::{
    CachingIndexer, FetchType, Id, Indexer, KeyCollection, MemoryCache, MemoryIndexer, OrgId,
    ResolutionKey, ResultSet, StringIndexer, UseCase,
};

fn workload() -> Vec<ResolutionKey> {
    let mut keys = Vec::new();
    for use_case in [UseCase::Sessions, UseCase::Transactions, UseCase::Spans] {
        for org in 1..=3u64 {
            for name in ["duration", "environment", "release", "status"] {
                keys.push(ResolutionKey::new(use_case, org, name).unwrap());
            }
        }
    }
    keys
}

/// Asserts no two distinct keys share an id and every id reverses to its
/// string.
fn assert_globally_unique<I: Indexer>(indexer: &StringIndexer<I>, ids: &HashMap<ResolutionKey, Id>) {
    let mut owners: HashMap<Id, &ResolutionKey> = HashMap::new();
    for (key, id) in ids {
        if let Some(other) = owners.insert(*id, key) {
            panic!("{id} bound to both {other} and {key}");
        }
        let string = indexer
            .reverse_resolve(key.use_case(), key.org_id(), *id)
            .unwrap();
        assert_eq!(string.as_deref(), Some(key.string()));
    }
}

fn ids_of(results: &ResultSet) -> HashMap<ResolutionKey, Id> {
    results.results().map(|r| (r.key().clone(), r.id())).collect()
}

#[test]
fn record_is_idempotent_over_lifetime() {
    let indexer = StringIndexer::new(MemoryIndexer::new());
    let keys = workload();

    let first: Vec<Id> = keys
        .iter()
        .map(|k| indexer.record(k.use_case(), k.org_id(), k.string()).unwrap())
        .collect();
    for _ in 0..3 {
        let again: Vec<Id> = keys
            .iter()
            .map(|k| indexer.record(k.use_case(), k.org_id(), k.string()).unwrap())
            .collect();
        assert_eq!(again, first);
    }
}

#[test]
fn batch_and_single_resolution_agree() {
    let keys = workload();
    let collection: KeyCollection = keys.iter().cloned().collect();

    // Batch allocation mints in key order, so singles in the same order on a
    // fresh index yield identical ids.
    let batch = StringIndexer::new(MemoryIndexer::new());
    let batch_ids = ids_of(&batch.bulk_record_keys(&collection).unwrap());

    let singles = StringIndexer::new(MemoryIndexer::new());
    let single_ids: HashMap<ResolutionKey, Id> = collection
        .keys()
        .map(|k| {
            let id = singles.record(k.use_case(), k.org_id(), k.string()).unwrap();
            (k, id)
        })
        .collect();
    assert_eq!(batch_ids, single_ids);

    // Any other order gives a different but equally valid assignment, and the
    // batch path then agrees with it exactly.
    let reversed = StringIndexer::new(MemoryIndexer::new());
    let reversed_ids: HashMap<ResolutionKey, Id> = keys
        .iter()
        .rev()
        .map(|k| {
            let id = reversed.record(k.use_case(), k.org_id(), k.string()).unwrap();
            (k.clone(), id)
        })
        .collect();
    assert_globally_unique(&reversed, &reversed_ids);

    let rebatched = reversed.bulk_record_keys(&collection).unwrap();
    assert_eq!(ids_of(&rebatched), reversed_ids);
    assert_eq!(
        rebatched.fetch_type_counts(),
        BTreeMap::from([(FetchType::DbRead, keys.len())])
    );
}

#[test]
fn concurrent_writers_never_split_a_key() {
    let threads = num_cpus::get().clamp(2, 8);
    let indexer = StringIndexer::new(CachingIndexer::new(MemoryIndexer::new(), MemoryCache::new()));
    let keys = workload();
    let seen: Mutex<Vec<ResultSet>> = Mutex::new(Vec::new());

    scope(|s| {
        for t in 0..threads {
            let indexer = &indexer;
            let keys = &keys;
            let seen = &seen;
            s.spawn(move || {
                // Each thread walks the workload from a different offset, mixing
                // batch and single-key calls.
                let offset = t * keys.len() / threads;
                let rotated: Vec<_> = keys[offset..].iter().chain(&keys[..offset]).collect();
                for chunk in rotated.chunks(5) {
                    let batch: KeyCollection = chunk.iter().map(|&k| k.clone()).collect();
                    let results = indexer.bulk_record_keys(&batch).unwrap();
                    seen.lock().unwrap().push(results);
                }
                for key in rotated.iter().step_by(3) {
                    let id = indexer
                        .record(key.use_case(), key.org_id(), key.string())
                        .unwrap();
                    let mut single = ResultSet::new();
                    single
                        .add(key.use_case(), key.org_id(), key.string(), id, FetchType::DbRead)
                        .unwrap();
                    seen.lock().unwrap().push(single);
                }
            });
        }
    });

    // Merging every observation fails if any key got two ids or any id two keys.
    let merged = seen
        .into_inner()
        .unwrap()
        .iter()
        .try_fold(ResultSet::new(), |acc, results| acc.merge(results))
        .unwrap();
    assert_eq!(merged.len(), keys.len());
    assert_globally_unique(&indexer, &ids_of(&merged));
}

#[test]
fn bulk_record_scenario_across_orgs() {
    let indexer = StringIndexer::new(MemoryIndexer::new());
    let request = BTreeMap::from([
        (OrgId::new(1), vec!["a", "b"]),
        (OrgId::new(2), vec!["a"]),
    ]);

    let first = indexer
        .bulk_record(UseCase::Transactions, request.clone())
        .unwrap()
        .mapping(UseCase::Transactions);
    assert_ne!(first[&OrgId::new(1)]["a"], first[&OrgId::new(2)]["a"]);

    let second = indexer
        .bulk_record(UseCase::Transactions, request)
        .unwrap()
        .mapping(UseCase::Transactions);
    assert_eq!(first, second);
}
