//! RewardNet Collector
//!
//! Cross-chain proportional reward splitter. Each chain runs a
//! collector; staking contracts report their period-close weights to it.
//! Exactly one collector is the master: once every registered shard has
//! reported, the master computes each shard's period shares and
//! broadcasts them to the replicas. The actual cross-chain messaging
//! (ordering, retries, timeouts) belongs to the external router layer —
//! this crate is the deterministic arithmetic and the per-period state
//! machine behind it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rewardnet_core::{mul_div_round, ArithmeticError, UNIT};

/// Chain selector identifying one collector shard.
pub type ChainId = u64;

/// A shard's period-close report: the staked weight, accumulated bonus
/// points, and collected revenue for the closing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardReport {
    pub staked_amount: u128,
    pub bonus_points: u128,
    pub revenue: u128,
}

/// Owner-set per-period reward configuration.
///
/// `decay_factor` is an 18-decimal fraction in [0, UNIT]; UNIT means no
/// decay. Both pools decay geometrically on every period advance after
/// the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRewardConfig {
    pub base_rewards: u128,
    pub extra_rewards: u128,
    pub decay_factor: u128,
}

impl Default for PeriodRewardConfig {
    fn default() -> Self {
        Self {
            base_rewards: 0,
            extra_rewards: 0,
            decay_factor: UNIT,
        }
    }
}

impl PeriodRewardConfig {
    pub fn new(
        base_rewards: u128,
        extra_rewards: u128,
        decay_factor: u128,
    ) -> Result<Self, CollectorError> {
        if decay_factor > UNIT {
            return Err(CollectorError::InvalidDecay(decay_factor));
        }
        Ok(Self {
            base_rewards,
            extra_rewards,
            decay_factor,
        })
    }

    /// The configuration for the next period after geometric decay.
    pub fn decayed(&self) -> Result<Self, ArithmeticError> {
        Ok(Self {
            base_rewards: mul_div_round(self.base_rewards, self.decay_factor, UNIT)?,
            extra_rewards: mul_div_round(self.extra_rewards, self.decay_factor, UNIT)?,
            decay_factor: self.decay_factor,
        })
    }
}

/// One shard's computed shares for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodShare {
    /// Equal split of the base reward pool
    pub fixed_share: u128,
    /// Bonus-point-proportional split of the extra reward pool
    pub extra_share: u128,
    /// Staked-weight-proportional split of the period's total revenue
    pub revenue_share: u128,
}

/// Per-period state of a collector.
///
/// `Open` accepts shard reports; `Closed` means all registered shards
/// have reported and weights are frozen; `Broadcast` means the period's
/// shares have been finalized and distributed. Only
/// [`Collector::start_next_period`] leaves `Broadcast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodState {
    Open,
    Closed,
    Broadcast,
}

/// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Unknown shard: chain {0} is not registered")]
    UnknownShard(ChainId),

    #[error("Broadcast origin chain {0} is not the configured master")]
    UntrustedOrigin(ChainId),

    #[error("Not the master collector: local chain {local}, master chain {master}")]
    NotMaster { local: ChainId, master: ChainId },

    #[error("Period {0} already broadcast")]
    AlreadyBroadcast(u64),

    #[error("Not ready to broadcast: {reported}/{registered} shards reported for period {period}")]
    NotReady {
        reported: usize,
        registered: usize,
        period: u64,
    },

    #[error("Period {0} has not been broadcast yet")]
    NotBroadcast(u64),

    #[error("Period {0} already broadcast; shard reports are frozen until the next period")]
    PeriodFrozen(u64),

    #[error("Decay factor {0} exceeds one unit")]
    InvalidDecay(u128),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Apportion one period's rewards across shards. Pure function.
///
/// The base pool splits equally; the extra pool splits by bonus points;
/// the summed revenue splits by staked weight. Zero denominators yield
/// zero shares rather than trapping. Round-half-up dust is bounded by
/// one smallest unit per shard per pool.
pub fn compute_period_shares(
    config: &PeriodRewardConfig,
    reports: &BTreeMap<ChainId, ShardReport>,
) -> Result<BTreeMap<ChainId, PeriodShare>, ArithmeticError> {
    let num_shards = reports.len() as u128;
    if num_shards == 0 {
        return Ok(BTreeMap::new());
    }

    let mut total_staked: u128 = 0;
    let mut total_bonus: u128 = 0;
    let mut total_revenue: u128 = 0;
    for report in reports.values() {
        total_staked = total_staked
            .checked_add(report.staked_amount)
            .ok_or(ArithmeticError::Overflow)?;
        total_bonus = total_bonus
            .checked_add(report.bonus_points)
            .ok_or(ArithmeticError::Overflow)?;
        total_revenue = total_revenue
            .checked_add(report.revenue)
            .ok_or(ArithmeticError::Overflow)?;
    }

    let mut shares = BTreeMap::new();
    for (chain, report) in reports {
        let fixed_share = mul_div_round(config.base_rewards, 1, num_shards)?;
        let extra_share = if total_bonus == 0 {
            0
        } else {
            mul_div_round(config.extra_rewards, report.bonus_points, total_bonus)?
        };
        let revenue_share = if total_staked == 0 {
            0
        } else {
            mul_div_round(report.staked_amount, total_revenue, total_staked)?
        };
        shares.insert(
            *chain,
            PeriodShare {
                fixed_share,
                extra_share,
                revenue_share,
            },
        );
    }
    Ok(shares)
}

/// One chain's collector.
///
/// Registered shards each get one mutable report slot per period;
/// applying a report overwrites the slot, so duplicate delivery of the
/// same report can never double-count.
pub struct Collector {
    local_chain: ChainId,
    master_chain: ChainId,
    period: u64,
    state: PeriodState,
    config: PeriodRewardConfig,
    /// Registered shard -> latest report this period (None = not yet closed)
    shards: BTreeMap<ChainId, Option<ShardReport>>,
    /// Finalized shares per period
    results: BTreeMap<u64, BTreeMap<ChainId, PeriodShare>>,
}

impl Collector {
    /// Create a collector for a chain. The local chain starts as its own
    /// master and is pre-registered as a shard.
    pub fn new(local_chain: ChainId) -> Self {
        let mut shards = BTreeMap::new();
        shards.insert(local_chain, None);
        Self {
            local_chain,
            master_chain: local_chain,
            period: 1,
            state: PeriodState::Open,
            config: PeriodRewardConfig::default(),
            shards,
            results: BTreeMap::new(),
        }
    }

    pub fn local_chain(&self) -> ChainId {
        self.local_chain
    }

    pub fn master_chain(&self) -> ChainId {
        self.master_chain
    }

    /// Pure authorization predicate: whether this collector may broadcast.
    pub fn is_master(&self) -> bool {
        self.local_chain == self.master_chain
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn state(&self) -> PeriodState {
        self.state
    }

    pub fn config(&self) -> &PeriodRewardConfig {
        &self.config
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    pub fn registered_shards(&self) -> Vec<ChainId> {
        self.shards.keys().copied().collect()
    }

    /// Point this collector at the master for the topology.
    pub fn set_master_collector(&mut self, chain: ChainId) {
        info!("Master collector set to chain {}", chain);
        self.master_chain = chain;
    }

    /// Register a shard that must report before each broadcast.
    /// Re-registering an already-known shard is a no-op.
    pub fn register_shard(&mut self, chain: ChainId) {
        if self.shards.contains_key(&chain) {
            return;
        }
        self.shards.insert(chain, None);
        if self.state == PeriodState::Closed {
            // The report set is no longer complete
            self.state = PeriodState::Open;
        }
        debug!("Registered shard for chain {}", chain);
    }

    /// Remove a shard registration.
    ///
    /// Removing the last shard that had not reported closes the period:
    /// the close predicate is over registered shards, so the report set
    /// may become complete by shrinking.
    pub fn unregister_shard(&mut self, chain: ChainId) -> Result<(), CollectorError> {
        self.shards
            .remove(&chain)
            .ok_or(CollectorError::UnknownShard(chain))?;
        self.close_if_complete();
        Ok(())
    }

    fn close_if_complete(&mut self) {
        if self.state == PeriodState::Open
            && !self.shards.is_empty()
            && self.shards.values().all(Option::is_some)
        {
            self.state = PeriodState::Closed;
            info!(
                "Period {} closed: all {} shards reported",
                self.period,
                self.shards.len()
            );
        }
    }

    /// Owner entrypoint for the period reward configuration.
    ///
    /// Authorization is enforced by the external chain layer; the core
    /// only validates the values.
    pub fn set_period_rewards(
        &mut self,
        base_rewards: u128,
        extra_rewards: u128,
        decay_factor: u128,
    ) -> Result<(), CollectorError> {
        self.config = PeriodRewardConfig::new(base_rewards, extra_rewards, decay_factor)?;
        info!(
            "Period rewards set: base {}, extra {}, decay {}",
            base_rewards, extra_rewards, decay_factor
        );
        Ok(())
    }

    /// Apply a shard's period-close report.
    ///
    /// Overwrites the shard's slot (idempotent, order-independent).
    /// Once every registered shard has reported, the period closes and
    /// weights are frozen. Reports for an already-broadcast period are
    /// rejected until the next period opens.
    pub fn apply_shard_report(
        &mut self,
        chain: ChainId,
        report: ShardReport,
    ) -> Result<(), CollectorError> {
        if self.state == PeriodState::Broadcast {
            return Err(CollectorError::PeriodFrozen(self.period));
        }
        let slot = self
            .shards
            .get_mut(&chain)
            .ok_or(CollectorError::UnknownShard(chain))?;
        if slot.replace(report).is_some() {
            debug!("Overwrote report for chain {} in period {}", chain, self.period);
        }

        self.close_if_complete();
        Ok(())
    }

    fn reported_count(&self) -> usize {
        self.shards.values().filter(|slot| slot.is_some()).count()
    }

    /// Whether the master may broadcast: every registered shard has
    /// closed its local period and this period was not broadcast yet.
    pub fn ready_to_broadcast(&self) -> bool {
        self.state == PeriodState::Closed
    }

    /// Master-only: finalize the period and compute every shard's shares.
    ///
    /// The result is recorded for the current period; the collector
    /// stays in `Broadcast` until [`Self::start_next_period`].
    pub fn broadcast_shares(
        &mut self,
    ) -> Result<&BTreeMap<ChainId, PeriodShare>, CollectorError> {
        if !self.is_master() {
            warn!(
                "Broadcast attempted by non-master chain {} (master {})",
                self.local_chain, self.master_chain
            );
            return Err(CollectorError::NotMaster {
                local: self.local_chain,
                master: self.master_chain,
            });
        }
        match self.state {
            PeriodState::Broadcast => return Err(CollectorError::AlreadyBroadcast(self.period)),
            PeriodState::Open => {
                return Err(CollectorError::NotReady {
                    reported: self.reported_count(),
                    registered: self.shards.len(),
                    period: self.period,
                })
            }
            PeriodState::Closed => {}
        }

        let reports: BTreeMap<ChainId, ShardReport> = self
            .shards
            .iter()
            .filter_map(|(chain, slot)| slot.map(|report| (*chain, report)))
            .collect();
        let shares = compute_period_shares(&self.config, &reports)?;

        info!(
            "Broadcast period {}: {} shards, base {}, extra {}",
            self.period,
            shares.len(),
            self.config.base_rewards,
            self.config.extra_rewards
        );

        self.state = PeriodState::Broadcast;
        Ok(self.results.entry(self.period).or_insert(shares))
    }

    /// Replica-side: accept the master's finalized shares.
    ///
    /// A single inbound update per period; updates from any chain other
    /// than the configured master are rejected.
    pub fn apply_broadcast(
        &mut self,
        origin: ChainId,
        shares: BTreeMap<ChainId, PeriodShare>,
    ) -> Result<(), CollectorError> {
        if origin != self.master_chain {
            warn!(
                "Rejected broadcast from chain {} (master is {})",
                origin, self.master_chain
            );
            return Err(CollectorError::UntrustedOrigin(origin));
        }
        if self.state == PeriodState::Broadcast {
            return Err(CollectorError::AlreadyBroadcast(self.period));
        }

        info!("Applied broadcast for period {} from chain {}", self.period, origin);
        self.results.insert(self.period, shares);
        self.state = PeriodState::Broadcast;
        Ok(())
    }

    /// Open the next period: clear report slots (registrations persist),
    /// advance the counter, and decay the reward configuration.
    pub fn start_next_period(&mut self) -> Result<(), CollectorError> {
        if self.state != PeriodState::Broadcast {
            return Err(CollectorError::NotBroadcast(self.period));
        }
        for slot in self.shards.values_mut() {
            *slot = None;
        }
        self.config = self.config.decayed()?;
        self.period += 1;
        self.state = PeriodState::Open;
        info!("Opened period {}", self.period);
        Ok(())
    }

    /// This period's computed shares, if broadcast.
    pub fn result_for(&self, period: u64) -> Option<&BTreeMap<ChainId, PeriodShare>> {
        self.results.get(&period)
    }

    pub fn last_result(&self) -> Option<(u64, &BTreeMap<ChainId, PeriodShare>)> {
        self.results
            .iter()
            .next_back()
            .map(|(period, shares)| (*period, shares))
    }

    /// Zero shard registrations, the period counter, and accumulated
    /// results — re-initialization between epochs or after a
    /// misconfiguration. The owner-set reward configuration persists.
    pub fn reset_all_data(&mut self) {
        warn!("Resetting all collector data for chain {}", self.local_chain);
        self.shards.clear();
        self.shards.insert(self.local_chain, None);
        self.results.clear();
        self.period = 1;
        self.state = PeriodState::Open;
    }
}
