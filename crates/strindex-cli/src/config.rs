use std::{collections::BTreeMap, fs::File, io::Read, num::NonZeroU64, path::PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use strindex::{DEFAULT_FIRST_ID, SharedStrings};

/// Runtime configuration for the `strindex` binary.
///
/// Values are parsed from CLI arguments or environment variables. A `.env`
/// file is loaded before parsing.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "strindex",
    version,
    about = "Resolve observability strings to globally unique integer ids"
)]
pub struct CliArgs {
    /// File of `use_case org_id string` lines. Reads stdin when omitted.
    ///
    /// Environment variable: `STRINDEX_INPUT`
    #[arg(long, env = "STRINDEX_INPUT")]
    pub input: Option<PathBuf>,

    /// First id minted by the in-memory backend.
    ///
    /// Ids below this value are free for the shared-strings table.
    ///
    /// Environment variable: `STRINDEX_FIRST_ID`
    #[arg(long, env = "STRINDEX_FIRST_ID", default_value_t = DEFAULT_FIRST_ID)]
    pub first_id: u64,

    /// JSON object mapping shared strings to their reserved ids, e.g.
    /// `{"environment": 1, "release": 2}`. Enables shared-org resolution.
    ///
    /// Environment variable: `STRINDEX_SHARED_STRINGS`
    #[arg(long, env = "STRINDEX_SHARED_STRINGS")]
    pub shared_strings: Option<PathBuf>,

    /// Put a read-through in-memory cache in front of the backend.
    ///
    /// Environment variable: `STRINDEX_CACHE`
    #[arg(long, env = "STRINDEX_CACHE", default_value_t = false)]
    pub cache: bool,

    /// Number of times the whole input is resolved.
    ///
    /// Passes after the first only read existing mappings.
    ///
    /// Environment variable: `STRINDEX_PASSES`
    #[arg(long, env = "STRINDEX_PASSES", default_value_t = 1)]
    pub passes: usize,
}

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub input: Option<PathBuf>,
    pub first_id: NonZeroU64,
    pub shared_strings: Option<SharedStrings>,
    pub cache: bool,
    pub passes: usize,
}

impl TryFrom<CliArgs> for IndexerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let Some(first_id) = NonZeroU64::new(args.first_id) else {
            bail!("STRINDEX_FIRST_ID must be greater than 0");
        };

        if args.passes == 0 {
            bail!("STRINDEX_PASSES must be greater than 0");
        }

        let shared_strings = args
            .shared_strings
            .as_ref()
            .map(|path| {
                let file = File::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                load_shared_strings(file)
                    .with_context(|| format!("invalid shared strings in {}", path.display()))
            })
            .transpose()?;

        if let Some(max_id) = shared_strings.as_ref().and_then(SharedStrings::max_id) {
            if max_id.get() >= first_id.get() {
                bail!(
                    "shared string id {} overlaps the minted id range (STRINDEX_FIRST_ID = {})",
                    max_id,
                    first_id
                );
            }
        }

        Ok(Self {
            input: args.input,
            first_id,
            shared_strings,
            cache: args.cache,
            passes: args.passes,
        })
    }
}

/// Parses a JSON `{"string": id}` object into a validated table.
pub fn load_shared_strings(reader: impl Read) -> anyhow::Result<SharedStrings> {
    let entries: BTreeMap<String, u64> =
        serde_json::from_reader(reader).context("expected a JSON object of string to id")?;
    Ok(SharedStrings::new(entries)?)
}
