//! Background task queue.
//!
//! Every load, route and centrality request runs to completion on its own
//! OS thread and sends one [`TaskOutcome`] into a shared `flume` channel.  A
//! single consumer (a UI refresh loop, the demo CLI) drains the channel on a
//! fixed interval:
//!
//! ```text
//! spawn_route ──► thread ──┐
//! spawn_critical ► thread ─┼──► flume channel ──► drain() every poll_interval
//! spawn_load ──► thread ───┘
//! ```
//!
//! Outcomes arrive in completion order (FIFO on the channel).  Nothing is
//! ever cancelled: when the user asks again, a new task is spawned and its
//! result replaces the old one once it is delivered.  [`Supersede`] tells the
//! consumer which delivered outcomes are already stale.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info};

use ev_core::{EngineConfig, GeoPoint};
use ev_spatial::{Algorithm, CriticalNodeRanking, RawEdge, RawNode, SafePoint};

use crate::session::{RouteResult, Session};
use crate::{EngineError, EngineResult};

// ── Tickets and outcomes ──────────────────────────────────────────────────────

/// Monotonically increasing task number.  Later requests get larger tickets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Load,
    Route,
    Critical,
}

impl TaskKind {
    fn slot(self) -> usize {
        match self {
            TaskKind::Load     => 0,
            TaskKind::Route    => 1,
            TaskKind::Critical => 2,
        }
    }
}

/// A finished task, delivered through the queue.
#[derive(Debug)]
pub enum TaskOutcome {
    Loaded { ticket: Ticket, result: EngineResult<Arc<Session>> },
    Routed { ticket: Ticket, result: EngineResult<RouteResult> },
    Ranked { ticket: Ticket, result: EngineResult<CriticalNodeRanking> },
}

impl TaskOutcome {
    pub fn ticket(&self) -> Ticket {
        match self {
            TaskOutcome::Loaded { ticket, .. }
            | TaskOutcome::Routed { ticket, .. }
            | TaskOutcome::Ranked { ticket, .. } => *ticket,
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            TaskOutcome::Loaded { .. } => TaskKind::Load,
            TaskOutcome::Routed { .. } => TaskKind::Route,
            TaskOutcome::Ranked { .. } => TaskKind::Critical,
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            TaskOutcome::Loaded { result, .. } => result.is_ok(),
            TaskOutcome::Routed { result, .. } => result.is_ok(),
            TaskOutcome::Ranked { result, .. } => result.is_ok(),
        }
    }
}

// ── Supersede tracking ────────────────────────────────────────────────────────

/// Newest delivered ticket per task kind.
///
/// An outcome is current if no later ticket of the same kind has been
/// delivered before it.  Stale outcomes should not replace what is shown.
#[derive(Clone, Debug, Default)]
pub struct Supersede {
    newest: [Option<Ticket>; 3],
}

impl Supersede {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `outcome`; returns `false` if it is stale.
    pub fn accept(&mut self, outcome: &TaskOutcome) -> bool {
        let slot = &mut self.newest[outcome.kind().slot()];
        match *slot {
            Some(newest) if newest > outcome.ticket() => false,
            _ => {
                *slot = Some(outcome.ticket());
                true
            }
        }
    }

    pub fn newest(&self, kind: TaskKind) -> Option<Ticket> {
        self.newest[kind.slot()]
    }
}

// ── Load slot ─────────────────────────────────────────────────────────────────

/// At most one load in flight.
#[derive(Default)]
pub(crate) struct LoadSlot(Arc<AtomicBool>);

impl LoadSlot {
    pub(crate) fn acquire(&self) -> Option<LoadGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadGuard(Arc::clone(&self.0)))
    }

    fn is_held(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the slot on drop, including when the load thread panics.
pub(crate) struct LoadGuard(Arc<AtomicBool>);

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── TaskQueue ─────────────────────────────────────────────────────────────────

/// Spawns engine work on background threads and collects the outcomes.
pub struct TaskQueue {
    tx:                 Sender<TaskOutcome>,
    rx:                 Receiver<TaskOutcome>,
    next_ticket:        AtomicU64,
    pub(crate) loading: LoadSlot,
    poll_interval:      Duration,
}

impl TaskQueue {
    /// Queue sized and paced by `config` (`queue_capacity`,
    /// `poll_interval_ms`).  With a bounded queue, workers block on send
    /// until the consumer drains.
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let (tx, rx) = match config.queue_capacity {
            Some(cap) => flume::bounded(cap),
            None => flume::unbounded(),
        };
        Ok(Self {
            tx,
            rx,
            next_ticket: AtomicU64::new(1),
            loading: LoadSlot::default(),
            poll_interval: config.poll_interval(),
        })
    }

    /// Interval at which the consumer is expected to call [`drain`](Self::drain).
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_held()
    }

    /// Build a [`Session`] in the background.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyLoading`] if a load is still running.
    pub fn spawn_load(
        &self,
        nodes:       Vec<RawNode>,
        edges:       Vec<RawEdge>,
        safe_points: Vec<SafePoint>,
        config:      EngineConfig,
    ) -> EngineResult<Ticket> {
        let guard = self.loading.acquire().ok_or(EngineError::AlreadyLoading)?;
        let ticket = self.ticket();
        info!("load {ticket}: {} nodes, {} edges, {} safe points", nodes.len(), edges.len(), safe_points.len());

        self.spawn("ev-load", move |tx| {
            let result = Session::load(&nodes, &edges, &safe_points, &config).map(Arc::new);
            // Release before delivery so the consumer may reload on receipt.
            drop(guard);
            send(&tx, TaskOutcome::Loaded { ticket, result });
        })?;
        Ok(ticket)
    }

    /// Compute a route in the background.
    pub fn spawn_route(
        &self,
        session:   Arc<Session>,
        origin:    GeoPoint,
        algorithm: Algorithm,
    ) -> EngineResult<Ticket> {
        let ticket = self.ticket();
        debug!("route {ticket}: {algorithm} from {origin}");
        self.spawn("ev-route", move |tx| {
            let result = session.find_route(origin, algorithm);
            send(&tx, TaskOutcome::Routed { ticket, result });
        })?;
        Ok(ticket)
    }

    /// Rank critical nodes in the background.
    pub fn spawn_critical(
        &self,
        session:     Arc<Session>,
        top_k:       usize,
        sample_size: Option<usize>,
    ) -> EngineResult<Ticket> {
        let ticket = self.ticket();
        debug!("critical {ticket}: top {top_k}, sample {sample_size:?}");
        self.spawn("ev-critical", move |tx| {
            let result = session.find_critical_nodes(top_k, sample_size);
            send(&tx, TaskOutcome::Ranked { ticket, result });
        })?;
        Ok(ticket)
    }

    /// Every outcome delivered so far, oldest first.  Never blocks.
    pub fn drain(&self) -> Vec<TaskOutcome> {
        self.rx.try_iter().collect()
    }

    /// Block for the next outcome, up to `timeout`.
    pub fn wait_next(&self, timeout: Duration) -> Option<TaskOutcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            // The queue holds a sender, so the channel never disconnects
            // while `self` is alive.
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    fn ticket(&self) -> Ticket {
        Ticket(self.next_ticket.fetch_add(1, Ordering::Relaxed))
    }

    fn spawn<F>(&self, name: &str, job: F) -> EngineResult<()>
    where
        F: FnOnce(Sender<TaskOutcome>) + Send + 'static,
    {
        let tx = self.tx.clone();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || job(tx))?;
        Ok(())
    }
}

fn send(tx: &Sender<TaskOutcome>, outcome: TaskOutcome) {
    debug!("task {} finished (ok = {})", outcome.ticket(), outcome.is_ok());
    // Fails only when the queue itself was dropped; nobody is left to tell.
    let _ = tx.send(outcome);
}
