use std::collections::{HashMap, VecDeque};

use super::event::{DropReason, ProactiveKind, ResolutionPath, TelemetryEvent};

#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    pub resolution_stats: ResolutionStats,
    pub dialogue_stats: DialogueStats,
    pub drop_stats: DropStats,
    pub apologies: u64,
    pub timers_fired: u64,
    pub alarms_fired: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ResolutionStats {
    pub total: u64,
    pub by_path: HashMap<ResolutionPath, u64>,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
}

impl ResolutionStats {
    pub fn count(&self, path: ResolutionPath) -> u64 {
        self.by_path.get(&path).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DialogueStats {
    pub opened: u64,
    pub resolved: u64,
    pub expired: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DropStats {
    pub no_wake_word: u64,
    pub busy: u64,
    pub empty: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut total_latency = 0u64;

    for event in events {
        match event {
            TelemetryEvent::Resolved { path, latency_ms } => {
                snap.resolution_stats.total += 1;
                *snap.resolution_stats.by_path.entry(*path).or_default() += 1;
                total_latency += latency_ms;
                snap.resolution_stats.max_latency_ms = snap.resolution_stats.max_latency_ms.max(*latency_ms);
            }
            TelemetryEvent::PendingOpened { .. } => snap.dialogue_stats.opened += 1,
            TelemetryEvent::PendingResolved { .. } => snap.dialogue_stats.resolved += 1,
            TelemetryEvent::PendingExpired { .. } => snap.dialogue_stats.expired += 1,
            TelemetryEvent::Dropped { reason } => match reason {
                DropReason::NoWakeWord => snap.drop_stats.no_wake_word += 1,
                DropReason::Busy => snap.drop_stats.busy += 1,
                DropReason::Empty => snap.drop_stats.empty += 1,
            },
            TelemetryEvent::Apology => snap.apologies += 1,
            TelemetryEvent::Proactive { kind } => match kind {
                ProactiveKind::Timer => snap.timers_fired += 1,
                ProactiveKind::Alarm => snap.alarms_fired += 1,
            },
            TelemetryEvent::SessionSummary { .. } => {}
        }
    }

    if snap.resolution_stats.total > 0 {
        snap.resolution_stats.avg_latency_ms = total_latency as f64 / snap.resolution_stats.total as f64;
    }

    snap
}
