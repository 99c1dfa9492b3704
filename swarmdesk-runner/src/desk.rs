//! The desk: every agent, the market feed, and the tick that drives them.
//!
//! One tick, in order:
//! 1. Collect scans that finished since the previous tick
//! 2. Refresh prices (the rest of the tick is skipped while every source is down)
//! 3. Monitor every agent's open positions in parallel, settling exits
//! 4. Rotate the active headline every `rotate_every_ticks`
//! 5. Launch a scan for each idle agent, each behind its own in-flight flag
//!
//! Scans fetch candles over the network, so they run detached on a dedicated
//! worker pool and `tick` returns once monitoring is done. An agent whose
//! previous scan is still running is skipped, while its open positions are
//! still monitored. Each agent's wallet and positions sit behind that agent's
//! mutex inside the `Ledger`, so monitors and scans never block one agent on
//! another.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use swarmdesk_core::data::{
    BinanceSource, CircuitBreaker, CoinGeckoSource, CsvSource, DataError, MarketDataSource,
    MarketFeed, SyntheticSource,
};
use swarmdesk_core::domain::{Agent, AgentId, Decision, Interval, NewsEvent, PositionId, StrategyKind};
use swarmdesk_core::indicators::IndicatorSnapshot;
use swarmdesk_core::ledger::{Ledger, LedgerError};
use swarmdesk_core::monitor::{PositionMonitor, Settlement};
use swarmdesk_core::news::{NewsFeed, NewsSafetyFilter};
use swarmdesk_core::rng::{FlavorRng, Purpose, RngHierarchy};
use swarmdesk_core::sizing::RiskSizer;
use swarmdesk_core::strategy::{build_strategy, decide, MarketContext, Strategy};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, DataMode, DeskConfig};
use crate::error::DeskError;
use crate::guard::{InFlight, OwnedInFlightGuard};
use crate::journal::{EntryKind, Journal};
use crate::scanner::{ScanOutcome, Scanner};
use crate::snapshot::{DeskSnapshot, SCHEMA_VERSION};
use crate::universe::Universe;

struct AgentRuntime {
    id: AgentId,
    strategy: Box<dyn Strategy>,
    in_flight: Arc<InFlight>,
}

/// What happened on one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    pub online: bool,
    pub settlements: Vec<Settlement>,
    /// (agent, journal message) for each position opened by a scan that
    /// finished since the previous tick.
    pub opened: Vec<(AgentId, String)>,
    /// Scans that finished since the previous tick after examining candidates.
    pub scanned: usize,
    /// Scans started on this tick.
    pub launched: usize,
    /// Agents whose previous scan was still running.
    pub busy: usize,
    pub rotated_news: Option<NewsEvent>,
}

/// One persona's view of a symbol, for inspection outside the tick loop.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub agent: AgentId,
    pub kind: StrategyKind,
    pub interval: Interval,
    pub price: f64,
    pub atr: f64,
    pub decision: Decision,
}

/// Everything a detached scan reads or writes.
struct Shared {
    config: DeskConfig,
    universe: Universe,
    feed: MarketFeed,
    ledger: Ledger,
    sizer: RiskSizer,
    filter: NewsSafetyFilter,
    rng: RngHierarchy,
    journal: Mutex<Journal>,
    finished: Mutex<Vec<(AgentId, ScanOutcome)>>,
}

impl Shared {
    fn scanner(&self) -> Scanner<'_> {
        Scanner {
            feed: &self.feed,
            universe: &self.universe,
            sizer: &self.sizer,
            filter: self.filter,
            rng: &self.rng,
            settings: &self.config.desk,
        }
    }

    /// Body of one detached scan. The guard is released only after the
    /// outcome is queued, so `wait_for_scans` always sees it.
    fn run_scan(
        &self,
        agent: &AgentRuntime,
        news: Option<&NewsEvent>,
        tick: u64,
        now: DateTime<Utc>,
        _guard: OwnedInFlightGuard,
    ) {
        let outcome = self.scanner().scan(
            &self.ledger,
            &agent.id,
            agent.strategy.as_ref(),
            news,
            tick,
            now,
        );
        match outcome {
            Ok(outcome) => {
                if let ScanOutcome::Opened { message, .. } = &outcome {
                    lock(&self.journal).record(
                        EntryKind::Open,
                        Some(agent.id.as_str()),
                        message.clone(),
                        now,
                    );
                }
                lock(&self.finished).push((agent.id.clone(), outcome));
            }
            Err(e) => warn!(agent = %agent.id, tick, error = %e, "scan failed"),
        }
    }
}

pub struct Desk {
    shared: Arc<Shared>,
    agents: Vec<Arc<AgentRuntime>>,
    monitor: PositionMonitor,
    news: Mutex<NewsFeed>,
    flavor: Mutex<FlavorRng>,
    tick: AtomicU64,
    scans: rayon::ThreadPool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Desk {
    /// Assemble a desk over an existing feed. Agents start from the config's
    /// personas with the configured starting balance.
    pub fn new(config: DeskConfig, universe: Universe, feed: MarketFeed) -> Result<Self, DeskError> {
        let personas = config.personas();
        let agents: Vec<Arc<AgentRuntime>> = personas
            .iter()
            .map(|p| {
                Arc::new(AgentRuntime {
                    id: AgentId::new(p.name.clone()),
                    strategy: build_strategy(p.kind),
                    in_flight: Arc::new(InFlight::new()),
                })
            })
            .collect();
        let ledger = Ledger::new(
            personas
                .into_iter()
                .map(|p| Agent::new(p, config.desk.starting_balance))
                .collect(),
            config.desk.max_open_positions,
        );

        // One worker per agent: each agent has at most one scan in flight.
        let scans = rayon::ThreadPoolBuilder::new()
            .num_threads(agents.len().max(1))
            .thread_name(|i| format!("swarmdesk-scan-{i}"))
            .panic_handler(|_| error!("scan worker panicked"))
            .build()?;

        let journal = Journal::new(config.desk.journal_capacity)
            .with_trade_capacity(config.desk.trade_history);
        Ok(Self {
            monitor: PositionMonitor::new(config.monitor.clone()),
            news: Mutex::new(NewsFeed::default()),
            flavor: Mutex::new(FlavorRng::new()),
            tick: AtomicU64::new(0),
            agents,
            scans,
            shared: Arc::new(Shared {
                universe,
                feed,
                ledger,
                sizer: RiskSizer::new(config.sizing.clone()),
                filter: NewsSafetyFilter::new(config.news.confirm_bonus),
                rng: RngHierarchy::new(config.desk.seed),
                journal: Mutex::new(journal),
                finished: Mutex::new(Vec::new()),
                config,
            }),
        })
    }

    /// Build the universe and market feed the config asks for.
    pub fn from_config(config: DeskConfig) -> Result<Self, DeskError> {
        config.validate()?;
        let mut universe = match &config.data.universe_file {
            Some(path) => Universe::from_file(path)?,
            None => Universe::default(),
        };

        let sources: Vec<Box<dyn MarketDataSource>> = match config.data.mode {
            DataMode::Live => live_sources()?,
            DataMode::LiveWithFallback => {
                let mut sources = live_sources()?;
                sources.push(Box::new(synthetic_source(&config, &universe)));
                sources
            }
            DataMode::Synthetic => vec![Box::new(synthetic_source(&config, &universe))],
            DataMode::Csv => {
                let dir = config.data.csv_dir.clone().ok_or_else(|| {
                    ConfigError::Invalid("data.mode = \"csv\" requires data.csv_dir".into())
                })?;
                let source = CsvSource::new(dir, config.data.csv_clock, config.data.csv_warmup);
                let available = source.symbols()?;
                universe.assets.retain(|a| available.contains(&a.symbol));
                if universe.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "no universe symbol has a {} file in {}",
                        config.data.csv_clock,
                        source.dir().display()
                    ))
                    .into());
                }
                vec![Box::new(source)]
            }
        };

        let feed = MarketFeed::new(sources);
        info!(
            mode = ?config.data.mode,
            sources = ?feed.source_names(),
            symbols = universe.len(),
            seed = config.desk.seed,
            "desk assembled"
        );
        Self::new(config, universe, feed)
    }

    pub fn config(&self) -> &DeskConfig {
        &self.shared.config
    }

    pub fn universe(&self) -> &Universe {
        &self.shared.universe
    }

    pub fn feed(&self) -> &MarketFeed {
        &self.shared.feed
    }

    pub fn ledger(&self) -> &Ledger {
        &self.shared.ledger
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.tick.load(Ordering::SeqCst)
    }

    pub fn agents(&self) -> Vec<Agent> {
        self.shared.ledger.snapshot()
    }

    pub fn journal(&self) -> Journal {
        lock(&self.shared.journal).clone()
    }

    pub fn active_news(&self) -> Option<NewsEvent> {
        lock(&self.news).active().cloned()
    }

    /// Replace the headline catalogue; the first event becomes active.
    pub fn set_news(&self, feed: NewsFeed) {
        *lock(&self.news) = feed;
    }

    /// Block until every scan launched so far has finished.
    pub fn wait_for_scans(&self) {
        for rt in &self.agents {
            rt.in_flight.wait_idle();
        }
    }

    /// Wait for running scans and report what they did. Use before reading
    /// final results or saving a snapshot.
    pub fn finish(&self) -> TickReport {
        self.wait_for_scans();
        let mut report = TickReport {
            tick: self.ticks(),
            online: self.shared.feed.is_online(),
            ..TickReport::default()
        };
        self.collect_finished(&mut report);
        report
    }

    fn collect_finished(&self, report: &mut TickReport) {
        let finished: Vec<_> = lock(&self.shared.finished).drain(..).collect();
        for (agent, outcome) in finished {
            match outcome {
                ScanOutcome::Opened { message, .. } => {
                    report.scanned += 1;
                    report.opened.push((agent, message));
                }
                ScanOutcome::NoTrade { .. } => report.scanned += 1,
                ScanOutcome::Idle | ScanOutcome::AtCapacity => {}
            }
        }
    }

    /// Run one tick. Returns once positions are monitored and scans are
    /// launched; scans report on a later tick or through `finish`.
    pub fn tick(&self) -> Result<TickReport, DeskError> {
        let tick = self.tick.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let shared = &self.shared;
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };
        self.collect_finished(&mut report);

        let was_online = shared.feed.is_online();
        let book = match shared.feed.refresh_prices() {
            Ok(book) => book,
            Err(e) => {
                if was_online || tick == 1 {
                    lock(&shared.journal).info(None, format!("Market data offline: {e}"), now);
                }
                warn!(tick, error = %e, "tick skipped");
                return Ok(report);
            }
        };
        report.online = true;

        // ── Monitor ──
        let settled = self
            .agents
            .par_iter()
            .map(|rt| shared.ledger.monitor_agent(&rt.id, &book, &self.monitor, now))
            .collect::<Result<Vec<_>, LedgerError>>()?;
        report.settlements = settled.into_iter().flatten().collect();

        {
            let mut journal = lock(&shared.journal);
            for settlement in &report.settlements {
                journal.settlement(settlement);
            }
        }

        // ── News ──
        let every = shared.config.news.rotate_every_ticks;
        if every > 0 && tick % every == 0 {
            let mut flavor = lock(&self.flavor);
            let mut news = lock(&self.news);
            report.rotated_news = news.rotate(&mut flavor).cloned();
        }
        if let Some(event) = &report.rotated_news {
            lock(&shared.journal).record(
                EntryKind::News,
                None,
                format!("{} ({} {})", event.headline, event.symbol, event.bias),
                now,
            );
        }
        let active = self.active_news();

        // ── Scan ──
        let scanner = shared.scanner();
        for rt in &self.agents {
            let Some(guard) = rt.in_flight.try_acquire_owned() else {
                debug!(agent = %rt.id, tick, "previous scan still running");
                report.busy += 1;
                continue;
            };
            if scanner.gate(&shared.ledger, &rt.id, tick)?.is_some() {
                continue;
            }
            let shared = Arc::clone(&self.shared);
            let agent = Arc::clone(rt);
            let news = active.clone();
            self.scans.spawn(move || {
                shared.run_scan(&agent, news.as_ref(), tick, now, guard);
            });
            report.launched += 1;
        }

        debug!(
            tick,
            settled = report.settlements.len(),
            opened = report.opened.len(),
            launched = report.launched,
            busy = report.busy,
            "tick complete"
        );
        Ok(report)
    }

    /// Close a position at the last known price for its symbol, or at entry
    /// when the feed has never priced it.
    pub fn force_close(&self, agent: &AgentId, position: &PositionId) -> Result<Settlement, DeskError> {
        let symbol = self
            .shared
            .ledger
            .with_agent(agent, |a| a.position(position).map(|p| p.symbol.clone()))?
            .ok_or_else(|| LedgerError::UnknownPosition {
                agent: agent.clone(),
                position: position.clone(),
            })?;
        self.force_close_at(agent, position, self.shared.feed.price(&symbol))
    }

    /// Close a position at `price` (entry when `None`).
    pub fn force_close_at(
        &self,
        agent: &AgentId,
        position: &PositionId,
        price: Option<f64>,
    ) -> Result<Settlement, DeskError> {
        let settlement = self.shared.ledger.close_position(agent, position, price, Utc::now())?;
        lock(&self.shared.journal).settlement(&settlement);
        Ok(settlement)
    }

    /// Every persona's decision on `symbol`, without opening anything.
    pub fn evaluate(&self, symbol: &str) -> Result<Vec<Evaluation>, DeskError> {
        let active = self.active_news();
        let min_confidence = self.shared.sizer.config().min_confidence;
        self.agents
            .iter()
            .map(|rt| {
                let interval = self.shared.ledger.with_agent(&rt.id, |a| a.persona.interval)?;
                let series = self.shared.feed.candles(
                    symbol,
                    interval,
                    self.shared.config.desk.candle_limit,
                )?;
                let snapshot = IndicatorSnapshot::compute(&series).ok_or_else(|| {
                    DataError::Unavailable {
                        what: format!("{symbol} {interval} candles"),
                    }
                })?;
                let ctx = MarketContext::new(&series, &snapshot);
                let decision = decide(
                    rt.strategy.as_ref(),
                    &ctx,
                    active.as_ref(),
                    &self.shared.filter,
                    min_confidence,
                );
                Ok(Evaluation {
                    agent: rt.id.clone(),
                    kind: rt.strategy.kind(),
                    interval,
                    price: snapshot.price,
                    atr: snapshot.atr,
                    decision,
                })
            })
            .collect()
    }

    pub fn snapshot(&self) -> DeskSnapshot {
        DeskSnapshot {
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            tick: self.ticks(),
            agents: self.shared.ledger.snapshot(),
            journal: self.journal(),
            active_news: self.active_news().map(|n| n.id),
        }
    }

    /// Load agents, journal, tick counter and active headline from a
    /// snapshot. Returns how many agents matched the current roster.
    pub fn restore(&self, snapshot: DeskSnapshot) -> Result<usize, DeskError> {
        snapshot.check_version()?;
        let restored = self.shared.ledger.restore(snapshot.agents);
        *lock(&self.shared.journal) = snapshot
            .journal
            .with_trade_capacity(self.shared.config.desk.trade_history);
        self.tick.store(snapshot.tick, Ordering::SeqCst);
        if let Some(id) = &snapshot.active_news {
            if !lock(&self.news).activate(id) {
                warn!(id = %id, "snapshot headline not in catalogue");
            }
        }
        info!(restored, tick = snapshot.tick, "desk restored");
        Ok(restored)
    }
}

fn live_sources() -> Result<Vec<Box<dyn MarketDataSource>>, DeskError> {
    let binance = BinanceSource::with_default_endpoints()?;
    let coingecko = CoinGeckoSource::new(Arc::new(CircuitBreaker::default_source()))?;
    let sources: Vec<Box<dyn MarketDataSource>> = vec![Box::new(binance), Box::new(coingecko)];
    Ok(sources)
}

/// Seeded random walk over the universe. Start prices are log-uniform in
/// [0.01, 10 000) and depend only on the seed and the symbol.
fn synthetic_source(config: &DeskConfig, universe: &Universe) -> SyntheticSource {
    let rng = RngHierarchy::new(config.desk.seed);
    let start = universe.symbols().into_iter().map(|symbol| {
        let mut stream = StdRng::seed_from_u64(rng.keyed_seed(symbol, Purpose::Synthetic, 0));
        let exponent: f64 = stream.gen_range(-2.0..4.0);
        (symbol.to_string(), 10f64.powf(exponent))
    });
    SyntheticSource::new(config.desk.seed, start).with_volatility(config.data.synthetic_volatility)
}
