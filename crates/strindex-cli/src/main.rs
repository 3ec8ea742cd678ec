#![doc = include_str!("../README.md")]

mod config;
mod input;
mod telemetry;

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufReader, Write},
};

use anyhow::Context;
use clap::Parser;
use config::{CliArgs, IndexerConfig};
use input::parse_requests;
use serde::Serialize;
use strindex::{
    CachingIndexer, FetchType, Id, Indexer, KeyCollection, MemoryCache, MemoryIndexer, OrgId,
    ResultSet, SharedOrgIndexer, StringIndexer, UseCase,
};
use telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Serialize)]
struct Entry {
    id: Id,
    fetch_type: FetchType,
}

/// One line of output per pass.
#[derive(Serialize)]
struct PassReport<'a> {
    pass: usize,
    results: BTreeMap<UseCase, BTreeMap<OrgId, BTreeMap<&'a str, Entry>>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    shared: BTreeMap<&'a str, Entry>,
}

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = IndexerConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let keys = match &config.input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            parse_requests(BufReader::new(file))?
        }
        None => parse_requests(io::stdin().lock())?,
    };
    tracing::info!(keys = keys.size(), "Parsed requests");

    let indexer = StringIndexer::new(build_backend(&config));
    let mut stdout = io::stdout().lock();
    for pass in 1..=config.passes {
        let results = indexer.bulk_record_keys(&keys)?;
        let shared = resolve_shared(&indexer, &keys, &config)?;
        tracing::info!(pass, counts = ?results.fetch_type_counts(), "Resolved batch");

        serde_json::to_writer(&mut stdout, &report(pass, &results, shared))?;
        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn log_startup_info(config: &IndexerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting indexer with full config: {:#?}", config);
    } else {
        tracing::info!(
            first_id = config.first_id.get(),
            cache = config.cache,
            shared = config.shared_strings.is_some(),
            passes = config.passes,
            "Starting indexer"
        );
    }
}

/// Layers the optional decorators over the in-memory backend.
fn build_backend(config: &IndexerConfig) -> Box<dyn Indexer> {
    let backend: Box<dyn Indexer> = Box::new(MemoryIndexer::with_first_id(config.first_id));
    let backend: Box<dyn Indexer> = match &config.shared_strings {
        Some(shared) => Box::new(SharedOrgIndexer::new(backend, shared.clone())),
        None => backend,
    };
    if config.cache {
        Box::new(CachingIndexer::new(backend, MemoryCache::new()))
    } else {
        backend
    }
}

/// Looks up every distinct input string in the shared namespace.
fn resolve_shared<'a, I: Indexer>(
    indexer: &StringIndexer<I>,
    keys: &'a KeyCollection,
    config: &IndexerConfig,
) -> anyhow::Result<BTreeMap<&'a str, Entry>> {
    let mut shared = BTreeMap::new();
    if config.shared_strings.is_none() {
        return Ok(shared);
    }
    for (_, _, string) in keys.as_triples() {
        if shared.contains_key(string) {
            continue;
        }
        if let Some(id) = indexer.resolve_shared_org(string)? {
            shared.insert(
                string,
                Entry {
                    id,
                    fetch_type: FetchType::Hardcoded,
                },
            );
        }
    }
    Ok(shared)
}

fn report<'a>(
    pass: usize,
    results: &'a ResultSet,
    shared: BTreeMap<&'a str, Entry>,
) -> PassReport<'a> {
    let mut grouped: BTreeMap<UseCase, BTreeMap<OrgId, BTreeMap<&str, Entry>>> = BTreeMap::new();
    for (use_case, org_id, string, resolved) in results.iter() {
        grouped
            .entry(use_case)
            .or_default()
            .entry(org_id)
            .or_default()
            .insert(
                string,
                Entry {
                    id: resolved.id,
                    fetch_type: resolved.fetch_type,
                },
            );
    }
    PassReport {
        pass,
        results: grouped,
        shared,
    }
}
