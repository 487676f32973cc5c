//! Reduces usage record snapshots to a single microphone state and reports
//! changes of that state.
//!
//! The monitor is edge triggered. The first cycle always reports the observed
//! state as [`EventKind::Initial`], later cycles only report when the state
//! differs from the last reported one.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::sink::{EventSink, SinkError};
use crate::{EventKind, MicState, StateEvent, UsageRecord, UsageRecordSource};

/// Collapse a snapshot into one state: active if any record is active.
pub fn reduce(records: &[UsageRecord]) -> MicState {
    MicState::from(records.iter().any(UsageRecord::is_active))
}

/// Polls a record source and decides which states to report.
pub struct Monitor<S> {
    source: S,
    last_reported: Option<MicState>,
}

impl<S: UsageRecordSource> Monitor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last_reported: None,
        }
    }

    /// The last state handed to a sink, `None` before the first cycle.
    pub fn last_reported(&self) -> Option<MicState> {
        self.last_reported
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Take a snapshot and reduce it. A failed snapshot reads as idle.
    pub fn observe(&mut self) -> MicState {
        match self.source.snapshot() {
            Ok(records) => reduce(&records),
            Err(error) => {
                debug!(source = self.source.name(), %error, "snapshot failed, assuming idle");
                MicState::Idle
            }
        }
    }

    /// Decide whether `state` must be reported, recording it if so.
    pub fn decide(&mut self, state: MicState) -> Option<EventKind> {
        let kind = match self.last_reported {
            None => EventKind::Initial,
            Some(last) if last != state => EventKind::Transition,
            Some(_) => return None,
        };
        self.last_reported = Some(state);
        Some(kind)
    }

    /// Run one poll cycle, reporting to `sink` if the state changed.
    pub fn cycle<K: EventSink>(&mut self, sink: &mut K) -> Result<Option<StateEvent>, SinkError> {
        let state = self.observe();
        let Some(kind) = self.decide(state) else {
            return Ok(None);
        };
        info!(state = ?state, kind = kind.as_str(), "microphone state reported");
        sink.report(state, kind)?;
        Ok(Some(StateEvent::new(state, kind)))
    }

    /// Poll every `interval` until `shutdown` resolves.
    ///
    /// The banner is written before the first cycle, which runs immediately.
    /// Cadence is measured from the start of each cycle and late ticks are
    /// delayed rather than replayed. Returns early with the error if the sink
    /// fails.
    pub async fn run<K, F>(
        &mut self,
        interval: Duration,
        sink: &mut K,
        shutdown: F,
    ) -> Result<(), SinkError>
    where
        K: EventSink,
        F: Future<Output = ()>,
    {
        sink.banner()?;
        info!(source = self.source.name(), interval = ?interval, "monitoring microphone");

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown requested, stopping monitor");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.cycle(sink)?;
                }
            }
        }
    }
}
