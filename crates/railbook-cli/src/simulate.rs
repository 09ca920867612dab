//! # Scenario Simulator
//!
//! Replays a scripted booking scenario against a fresh in-memory
//! deployment on a manual clock and reports what happened.
//!
//! ## Scenario Format
//!
//! ```yaml
//! start: "2026-01-01T08:00:00Z"   # optional clock start
//! steps:
//!   - op: create
//!     train: ice-1                 # label used by later steps
//!     origin: Berlin
//!     destination: Hamburg
//!     seat_capacity: 2
//!     price: 100
//!     start_offset_minutes: 0
//!     end_offset_minutes: 180
//!   - op: buy
//!     train: ice-1
//!     buyer: alice
//!     seat: 1
//!     payment: 100
//!     ticket: alice-1              # label for the issued ticket
//!   - op: buy
//!     train: ice-1
//!     buyer: bob
//!     seat: 1
//!     payment: 100
//!     expect: seat_taken           # the step must fail with this kind
//!   - op: advance
//!     minutes: 30
//!   - op: refund
//!     train: ice-1
//!     ticket: alice-1
//!   - op: advance
//!     minutes: 151
//!   - op: close
//!     train: ice-1
//! ```
//!
//! A step without `expect` must succeed. Steps referring to unknown train
//! or ticket labels make the scenario malformed and abort the run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use railbook_core::{
    AccountId, Credits, ManualClock, StationName, Timestamp, TrainId, MILLIS_PER_MINUTE,
};
use railbook_ledger::{
    BookingEngine, BookingError, LedgerConfig, LedgerEvent, NewTrain, RouteEntry, Ticket,
    TrainSummary,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::TryRecvError;

/// Clock start when a scenario does not set one: 2026-01-01T00:00:00Z.
pub const DEFAULT_START_MILLIS: u64 = 1_767_225_600_000;

/// Arguments for `railbook simulate`.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Scenario file (YAML).
    pub scenario: PathBuf,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Emit compact JSON.
    #[arg(long)]
    pub compact: bool,
}

/// A scripted scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Clock start as RFC 3339.
    #[serde(default)]
    pub start: Option<String>,
    /// Steps, run in order.
    pub steps: Vec<Step>,
}

/// One scenario step plus its expected outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// What to do.
    #[serde(flatten)]
    pub action: Action,
    /// Error kind the step must fail with; absent means it must succeed.
    #[serde(default)]
    pub expect: Option<String>,
}

/// Scenario operations.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    /// Create a train as the administrator.
    Create {
        /// Label for later steps.
        train: String,
        /// Route origin.
        origin: StationName,
        /// Route destination.
        destination: StationName,
        /// Seats offered.
        seat_capacity: u32,
        /// Per-seat fare.
        price: Credits,
        /// Minutes from now until sales open.
        #[serde(default)]
        start_offset_minutes: u64,
        /// Minutes from now until sales end.
        end_offset_minutes: u64,
    },
    /// Buy a seat.
    Buy {
        /// Train label.
        train: String,
        /// Buyer account.
        buyer: AccountId,
        /// Seat number.
        seat: u32,
        /// Payment offered.
        payment: Credits,
        /// Label for the issued ticket.
        #[serde(default)]
        ticket: Option<String>,
    },
    /// Refund a previously issued ticket.
    Refund {
        /// Train label the refund is addressed to.
        train: String,
        /// Ticket label.
        ticket: String,
        /// Caller; defaults to the ticket holder.
        #[serde(default)]
        caller: Option<AccountId>,
    },
    /// Close a train as the administrator.
    Close {
        /// Train label.
        train: String,
    },
    /// Move the clock forward.
    Advance {
        /// Whole minutes.
        #[serde(default)]
        minutes: u64,
        /// Extra milliseconds.
        #[serde(default)]
        millis: u64,
    },
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Buy { .. } => "buy",
            Self::Refund { .. } => "refund",
            Self::Close { .. } => "close",
            Self::Advance { .. } => "advance",
        }
    }
}

/// What a step produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The operation succeeded.
    Ok {
        /// Operation-specific result.
        detail: serde_json::Value,
    },
    /// The operation was rejected.
    Rejected {
        /// Machine-readable error kind.
        kind: String,
        /// Human-readable message.
        message: String,
    },
}

/// One row of the report.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Zero-based step index.
    pub index: usize,
    /// Operation name.
    pub op: &'static str,
    /// Clock reading after the step.
    pub at: Timestamp,
    /// What happened.
    pub outcome: Outcome,
    /// Whether the outcome matched the step's expectation.
    pub as_expected: bool,
}

/// Full simulation report.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Per-step results.
    pub steps: Vec<StepReport>,
    /// Number of steps whose outcome did not match.
    pub unexpected: usize,
    /// Final treasury balance.
    pub treasury: Credits,
    /// Final route table.
    pub routes: Vec<RouteEntry>,
    /// Trains still open at the end.
    pub open_trains: Vec<TrainSummary>,
    /// Lifecycle events in publication order.
    pub events: Vec<LedgerEvent>,
}

/// Parse a scenario document.
pub fn parse_scenario(yaml: &str) -> Result<Scenario> {
    serde_yaml::from_str(yaml).context("parsing scenario")
}

struct Simulation {
    engine: BookingEngine,
    admin: railbook_ledger::AdminCapability,
    clock: Arc<ManualClock>,
    trains: HashMap<String, TrainId>,
    tickets: HashMap<String, Ticket>,
}

impl Simulation {
    fn train(&self, label: &str) -> Result<TrainId> {
        self.trains
            .get(label)
            .copied()
            .with_context(|| format!("unknown train label {label:?}"))
    }

    /// Run one action. `Err` means the scenario itself is malformed; a
    /// rejected booking operation is an `Ok(Outcome::Rejected)`.
    fn apply(&mut self, action: &Action) -> Result<Outcome> {
        let outcome = match action {
            Action::Create {
                train,
                origin,
                destination,
                seat_capacity,
                price,
                start_offset_minutes,
                end_offset_minutes,
            } => {
                if self.trains.contains_key(train) {
                    bail!("train label {train:?} is already in use");
                }
                let params = NewTrain {
                    origin: origin.clone(),
                    destination: destination.clone(),
                    seat_capacity: *seat_capacity,
                    price: *price,
                    start_offset_minutes: *start_offset_minutes,
                    end_offset_minutes: *end_offset_minutes,
                };
                match self.engine.create_train(&self.admin, params) {
                    Ok(train_id) => {
                        self.trains.insert(train.clone(), train_id);
                        ok(serde_json::json!({ "train_id": train_id }))
                    }
                    Err(err) => rejected(&err),
                }
            }
            Action::Buy {
                train,
                buyer,
                seat,
                payment,
                ticket,
            } => {
                let train_id = self.train(train)?;
                if let Some(label) = ticket {
                    if self.tickets.contains_key(label) {
                        bail!("ticket label {label:?} is already in use");
                    }
                }
                match self.engine.buy(train_id, buyer.clone(), *payment, *seat) {
                    Ok(issued) => {
                        let detail = serde_json::json!({
                            "ticket_id": issued.id(),
                            "seat_no": issued.seat_no(),
                            "paid": issued.paid(),
                        });
                        if let Some(label) = ticket {
                            self.tickets.insert(label.clone(), issued);
                        }
                        ok(detail)
                    }
                    Err(err) => rejected(&err),
                }
            }
            Action::Refund {
                train,
                ticket,
                caller,
            } => {
                let train_id = self.train(train)?;
                let held = self
                    .tickets
                    .remove(ticket)
                    .with_context(|| format!("unknown or already refunded ticket {ticket:?}"))?;
                let caller = caller.clone().unwrap_or_else(|| held.holder().clone());
                match self.engine.refund(train_id, held, &caller) {
                    Ok(refunded) => ok(serde_json::json!({ "refunded": refunded })),
                    Err(refusal) => {
                        let (held, reason) = refusal.into_parts();
                        self.tickets.insert(ticket.clone(), held);
                        rejected(&reason)
                    }
                }
            }
            Action::Close { train } => {
                let train_id = self.train(train)?;
                match self.engine.close_train(&self.admin, train_id) {
                    Ok(settlement) => ok(serde_json::to_value(&settlement)?),
                    Err(err) => rejected(&err),
                }
            }
            Action::Advance { minutes, millis } => {
                let delta = minutes
                    .checked_mul(MILLIS_PER_MINUTE)
                    .and_then(|ms| ms.checked_add(*millis))
                    .context("advance overflows the clock")?;
                let now = self.clock.advance(delta);
                ok(serde_json::json!({ "now": now.to_canonical_string() }))
            }
        };
        Ok(outcome)
    }
}

fn ok(detail: serde_json::Value) -> Outcome {
    Outcome::Ok { detail }
}

fn rejected(err: &BookingError) -> Outcome {
    if err.is_internal() {
        tracing::error!(kind = err.kind(), "{err}");
    }
    Outcome::Rejected {
        kind: err.kind().to_string(),
        message: err.to_string(),
    }
}

fn matches_expectation(outcome: &Outcome, expect: Option<&str>) -> bool {
    match (outcome, expect) {
        (Outcome::Ok { .. }, None) => true,
        (Outcome::Rejected { kind, .. }, Some(expected)) => kind == expected,
        _ => false,
    }
}

/// Run a scenario on a fresh deployment.
pub fn run_scenario(scenario: &Scenario, config: LedgerConfig) -> Result<SimulationReport> {
    let start = match &scenario.start {
        Some(start) => Timestamp::parse_rfc3339(start).context("parsing scenario start")?,
        None => Timestamp::from_millis(DEFAULT_START_MILLIS),
    };
    let clock = Arc::new(ManualClock::new(start));
    let (engine, admin) = BookingEngine::init_with_clock(config, clock.clone())?;
    let mut events = engine.subscribe();
    let mut sim = Simulation {
        engine,
        admin,
        clock,
        trains: HashMap::new(),
        tickets: HashMap::new(),
    };

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = sim
            .apply(&step.action)
            .with_context(|| format!("step {index} ({})", step.action.name()))?;
        let as_expected = matches_expectation(&outcome, step.expect.as_deref());
        if !as_expected {
            tracing::warn!(index, op = step.action.name(), ?outcome, "unexpected outcome");
        }
        steps.push(StepReport {
            index,
            op: step.action.name(),
            at: sim.engine.now(),
            outcome,
            as_expected,
        });
    }

    let mut published = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => published.push(event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event buffer overflowed; report is missing events");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    let unexpected = steps.iter().filter(|step| !step.as_expected).count();
    Ok(SimulationReport {
        unexpected,
        treasury: sim.engine.treasury(),
        routes: sim.engine.route_table(),
        open_trains: sim.engine.open_trains(),
        events: published,
        steps,
    })
}

/// Read a scenario file and run it.
pub fn run_scenario_file(path: &Path, config: LedgerConfig) -> Result<SimulationReport> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    run_scenario(&parse_scenario(&yaml)?, config)
}

/// Execute `railbook simulate`. Exits 2 when any step did not go as
/// expected.
pub fn run_simulate(args: &SimulateArgs, config: LedgerConfig) -> Result<u8> {
    let report = run_scenario_file(&args.scenario, config)?;
    let json = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    match &args.out {
        Some(out) => {
            std::fs::write(out, json + "\n")
                .with_context(|| format!("writing report {}", out.display()))?;
            tracing::info!(path = %out.display(), "report written");
        }
        None => println!("{json}"),
    }
    tracing::info!(
        steps = report.steps.len(),
        unexpected = report.unexpected,
        treasury = %report.treasury,
        "simulation finished"
    );
    Ok(if report.unexpected == 0 { 0 } else { 2 })
}
