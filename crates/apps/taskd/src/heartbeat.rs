use async_trait::async_trait;
use logger::{debug, info};
use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use task_runner::{PhaseResult, ShutdownSignal, Task};
use time::OffsetDateTime;

/// Liveness counters shared between the heartbeat task and the REST routes.
#[derive(Debug, Default)]
pub struct HeartbeatState {
    ticks: AtomicU64,
    last_tick_unix_ms: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeartbeatSnapshot {
    pub ticks: u64,
    pub last_tick_unix_ms: Option<u64>,
}

impl HeartbeatState {
    fn beat(&self) -> u64 {
        let now_ms =
            u64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000)
                .unwrap_or_default();
        self.last_tick_unix_ms.store(now_ms, Ordering::Release);
        self.ticks.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn snapshot(&self) -> HeartbeatSnapshot {
        let ticks = self.ticks.load(Ordering::Acquire);
        let last = self.last_tick_unix_ms.load(Ordering::Acquire);
        HeartbeatSnapshot {
            ticks,
            last_tick_unix_ms: (ticks > 0).then_some(last),
        }
    }
}

/// Periodic task proving the process is alive.
pub struct HeartbeatTask {
    state: Arc<HeartbeatState>,
}

impl HeartbeatTask {
    pub fn new(state: Arc<HeartbeatState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Task for HeartbeatTask {
    async fn run(&mut self, _shutdown: &ShutdownSignal) -> PhaseResult {
        let ticks = self.state.beat();
        debug!(ticks, "heartbeat");
        Ok(())
    }

    async fn shutdown(&mut self) -> PhaseResult {
        info!(ticks = self.state.snapshot().ticks, "heartbeat stopped");
        Ok(())
    }
}
