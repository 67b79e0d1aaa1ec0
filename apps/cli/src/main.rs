//! RewardNet CLI
//!
//! Operator tooling around the distribution calculator, the Merkle
//! claim verifier, and the cross-chain reward splitter. Publishing the
//! computed root and funding the distribution contract happen outside
//! this tool; it prints both so an operator can submit them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use rewardnet_collector::{compute_period_shares, ChainId, PeriodRewardConfig, ShardReport};
use rewardnet_core::{format_units, parse_units, Address};
use rewardnet_distribution::{
    compute_distribution, leaf_hash, load_period_file, save_period_file, verify_claim,
    CarryForwardRecord, ClaimedSet, IndexOrder,
};
use rewardnet_merkle::MerkleTree;
use rewardnet_settings::Settings;

/// RewardNet - Merkle reward distribution toolkit
#[derive(Parser)]
#[command(name = "rewardnet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file path (defaults to ~/.rewardnet/settings.json)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a period's distribution and write the period file
    Distribute {
        /// Scores JSON: {"0xaddr": "10.5", ...} or [{"address": "...", "score": "..."}]
        #[arg(long)]
        scores: PathBuf,

        /// Total reward pool for the period (tokens, decimal)
        #[arg(long)]
        total: String,

        /// Prior period's file, for carry-forward of unclaimed balances
        #[arg(long)]
        prior: Option<PathBuf>,

        /// JSON array of claimed prior-period leaf indices
        #[arg(long)]
        claimed: Option<PathBuf>,

        /// Period number used in the output file name
        #[arg(long, default_value = "0")]
        period: u64,

        /// Output directory (defaults to the settings data dir)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Assign indices in the scores file's own order instead of
        /// ascending lexicographic (legacy-root compatibility)
        #[arg(long)]
        source_order: bool,
    },

    /// Re-verify every entry of a period file against a published root
    Verify {
        /// Published root (hex, 0x prefix optional)
        #[arg(long)]
        root: String,

        /// Period file to check
        #[arg(long)]
        period_file: PathBuf,
    },

    /// Print one participant's claim data and Merkle proof as JSON
    Proof {
        #[arg(long)]
        period_file: PathBuf,

        #[arg(long)]
        address: String,
    },

    /// Apportion period rewards across collector shards
    Split {
        /// Shards JSON: {"10": {"staked_amount": "...", "bonus_points": "...", "revenue": "..."}}
        #[arg(long)]
        shards: PathBuf,

        /// Base reward pool per period (equal split)
        #[arg(long)]
        base: String,

        /// Extra reward pool per period (split by bonus points)
        #[arg(long)]
        extra: String,

        /// Decay factor per period, decimal in [0, 1]
        #[arg(long, default_value = "1")]
        decay: String,

        /// Number of consecutive periods to compute
        #[arg(long, default_value = "1")]
        periods: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    rewardnet_logging::init(cli.verbose);

    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load_or_default()?,
    };

    match cli.command {
        Commands::Distribute {
            scores,
            total,
            prior,
            claimed,
            period,
            out,
            source_order,
        } => cmd_distribute(
            &settings,
            &scores,
            &total,
            prior.as_deref(),
            claimed.as_deref(),
            period,
            out,
            source_order,
        ),
        Commands::Verify { root, period_file } => cmd_verify(&root, &period_file),
        Commands::Proof { period_file, address } => cmd_proof(&period_file, &address),
        Commands::Split {
            shards,
            base,
            extra,
            decay,
            periods,
        } => cmd_split(&shards, &base, &extra, &decay, periods),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_distribute(
    settings: &Settings,
    scores_path: &Path,
    total: &str,
    prior: Option<&Path>,
    claimed: Option<&Path>,
    period: u64,
    out: Option<PathBuf>,
    source_order: bool,
) -> Result<()> {
    let scores = load_scores(scores_path)?;
    let total_amount = parse_units(total).with_context(|| format!("bad --total {total:?}"))?;

    let prior_records: Vec<CarryForwardRecord> = match prior {
        Some(path) => load_period_file(path)
            .with_context(|| format!("loading prior period file {}", path.display()))?
            .iter()
            .map(|entry| entry.carry_forward())
            .collect(),
        None => Vec::new(),
    };

    let claimed_set = match claimed {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading claimed file {}", path.display()))?;
            let indices: Vec<u32> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing claimed file {}", path.display()))?;
            ClaimedSet::from_indices(indices)
        }
        None => ClaimedSet::default(),
    };

    let order = if source_order {
        IndexOrder::Source
    } else {
        IndexOrder::Lexicographic
    };

    let output = compute_distribution(&scores, total_amount, &prior_records, &claimed_set, order)?;

    let out_dir = out.unwrap_or_else(|| settings.distribution.data_dir.clone());
    let path = save_period_file(&out_dir, period, &output.entries)?;
    info!("Period file written to {}", path.display());

    println!("network:       {}", settings.distribution.network);
    println!("participants:  {}", output.entries.len());
    println!("total balance: {}", format_units(output.total_balance));
    println!("tree root:     0x{}", hex::encode(output.root));
    Ok(())
}

fn cmd_verify(root: &str, period_file: &Path) -> Result<()> {
    let expected_root = parse_root(root)?;
    let entries = load_period_file(period_file)?;

    let hashes: Vec<[u8; 32]> = entries.iter().map(|e| e.hash).collect();
    let tree = MerkleTree::from_leaves(&hashes);
    if tree.root() != expected_root {
        bail!(
            "Root mismatch: period file yields 0x{}, expected 0x{}",
            hex::encode(tree.root()),
            hex::encode(expected_root)
        );
    }

    for entry in &entries {
        let recomputed = leaf_hash(entry.index, &entry.address, entry.balance);
        if recomputed != entry.hash {
            bail!("Stored hash mismatch for address {}", entry.address);
        }
        let proof = tree
            .proof(&entry.hash)
            .with_context(|| format!("proof generation failed for {}", entry.address))?;
        if !verify_claim(&expected_root, &entry.address, entry.balance, entry.index, &proof) {
            bail!("Claim verification failed for address {}", entry.address);
        }
    }

    println!("OK: {} entries verify against 0x{}", entries.len(), hex::encode(expected_root));
    Ok(())
}

fn cmd_proof(period_file: &Path, address: &str) -> Result<()> {
    let address: Address = address.parse().map_err(|e| anyhow!("bad address: {e}"))?;
    let entries = load_period_file(period_file)?;

    let entry = entries
        .iter()
        .find(|e| e.address == address)
        .ok_or_else(|| anyhow!("Address {} not in period file", address))?;

    let hashes: Vec<[u8; 32]> = entries.iter().map(|e| e.hash).collect();
    let tree = MerkleTree::from_leaves(&hashes);
    let proof = tree.proof(&entry.hash)?;

    let out = serde_json::json!({
        "address": entry.address.to_string(),
        "balance": entry.balance.to_string(),
        "index": entry.index,
        "root": format!("0x{}", hex::encode(tree.root())),
        "proof": proof.iter().map(|h| format!("0x{}", hex::encode(h))).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_split(
    shards_path: &Path,
    base: &str,
    extra: &str,
    decay: &str,
    periods: u32,
) -> Result<()> {
    let reports = load_shards(shards_path)?;
    let mut config = PeriodRewardConfig::new(
        parse_units(base).with_context(|| format!("bad --base {base:?}"))?,
        parse_units(extra).with_context(|| format!("bad --extra {extra:?}"))?,
        parse_units(decay).with_context(|| format!("bad --decay {decay:?}"))?,
    )?;

    for period in 1..=periods {
        let shares = compute_period_shares(&config, &reports)?;
        println!(
            "period {period}: base {} extra {}",
            format_units(config.base_rewards),
            format_units(config.extra_rewards)
        );
        for (chain, share) in &shares {
            println!(
                "  chain {chain}: fixed {} extra {} revenue {}",
                format_units(share.fixed_share),
                format_units(share.extra_share),
                format_units(share.revenue_share)
            );
        }
        config = config.decayed()?;
    }
    Ok(())
}

/// Read a scores file: either an object keyed by address or an array of
/// `{address, score}` records. Object keys parse in sorted order, so
/// `--source-order` only matters for the array form.
fn load_scores(path: &Path) -> Result<Vec<(Address, u128)>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading scores file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing scores file {}", path.display()))?;

    let mut scores = Vec::new();
    match value {
        serde_json::Value::Object(map) => {
            for (addr, score) in map {
                scores.push((parse_address(&addr)?, value_to_units(&score, &addr)?));
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                let addr = item
                    .get("address")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| anyhow!("score record missing \"address\""))?
                    .to_string();
                let score = item
                    .get("score")
                    .ok_or_else(|| anyhow!("score record for {addr} missing \"score\""))?;
                scores.push((parse_address(&addr)?, value_to_units(score, &addr)?));
            }
        }
        _ => bail!("scores file must be a JSON object or array"),
    }
    Ok(scores)
}

/// Read a shards file: object keyed by chain id.
fn load_shards(path: &Path) -> Result<BTreeMap<ChainId, ShardReport>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading shards file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing shards file {}", path.display()))?;

    let serde_json::Value::Object(map) = value else {
        bail!("shards file must be a JSON object keyed by chain id");
    };

    let mut reports = BTreeMap::new();
    for (chain, fields) in map {
        let chain_id: ChainId = chain
            .parse()
            .with_context(|| format!("bad chain id {chain:?}"))?;
        let field = |name: &str| -> Result<u128> {
            match fields.get(name) {
                Some(v) => value_to_units(v, &chain),
                None => Ok(0),
            }
        };
        reports.insert(
            chain_id,
            ShardReport {
                staked_amount: field("staked_amount")?,
                bonus_points: field("bonus_points")?,
                revenue: field("revenue")?,
            },
        );
    }
    Ok(reports)
}

fn parse_address(s: &str) -> Result<Address> {
    s.parse().map_err(|e| anyhow!("bad address {s:?}: {e}"))
}

/// Accept decimal amounts as JSON strings or numbers.
fn value_to_units(value: &serde_json::Value, owner: &str) -> Result<u128> {
    let text = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        other => bail!("bad amount for {owner}: {other}"),
    };
    parse_units(&text).with_context(|| format!("bad amount {text:?} for {owner}"))
}

fn parse_root(s: &str) -> Result<[u8; 32]> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).with_context(|| format!("bad root hex {s:?}"))?;
    bytes
        .try_into()
        .map_err(|_| anyhow!("root must be 32 bytes"))
}
