//! Gate-open decision policy
//!
//! Decides whether a recovered plate read should open the barrier.
//! Pure policy: actually driving the gate hardware lives elsewhere.
//! Plates are compared by their normalized alphanumeric form so spacing
//! and separator jitter between reads of the same plate never bypasses
//! the cooldown.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::charset;
use crate::config::{GateConfig, GateTrigger};

/// Why the gate opened or stayed closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    /// Maintenance override is on.
    ForceOpen,
    /// Trigger mode opens on every record.
    EveryRecord,
    /// Cooldown window for this plate has passed (or never started).
    CooldownElapsed,
    /// No usable plate text.
    EmptyPlate,
    /// Plate prefix is not on the allowlist.
    PrefixBlocked,
    /// Same plate opened the gate too recently.
    CooldownActive { remaining_secs: u64 },
}

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub open: bool,
    pub reason: GateReason,
}

/// Stateful gate policy; tracks recent opens per normalized plate.
pub struct GatePolicy {
    config: GateConfig,
    recent_opens: HashMap<String, Instant>,
}

impl GatePolicy {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            recent_opens: HashMap::new(),
        }
    }

    /// Decide whether this read opens the gate.
    pub fn evaluate(&mut self, plate_text: &str) -> GateDecision {
        let decision = self.decide(plate_text);
        debug!(
            "gate decision open={} reason={:?} plate='{}'",
            decision.open, decision.reason, plate_text
        );
        decision
    }

    fn decide(&mut self, plate_text: &str) -> GateDecision {
        if self.config.force_open {
            return GateDecision { open: true, reason: GateReason::ForceOpen };
        }

        let plate = charset::normalize(plate_text);
        if plate.is_empty() {
            return GateDecision { open: false, reason: GateReason::EmptyPlate };
        }

        if self.config.strict && !self.allowed_by_prefix(&plate) {
            return GateDecision { open: false, reason: GateReason::PrefixBlocked };
        }

        match self.config.trigger {
            GateTrigger::EveryRecord => GateDecision { open: true, reason: GateReason::EveryRecord },
            GateTrigger::PerPlateCooldown => {
                let window = Duration::from_secs(self.config.cooldown_secs);
                if let Some(last) = self.recent_opens.get(&plate) {
                    let elapsed = last.elapsed();
                    if elapsed < window {
                        let remaining_secs = (window - elapsed).as_secs();
                        return GateDecision {
                            open: false,
                            reason: GateReason::CooldownActive { remaining_secs },
                        };
                    }
                }
                self.recent_opens.insert(plate, Instant::now());
                GateDecision { open: true, reason: GateReason::CooldownElapsed }
            }
        }
    }

    fn allowed_by_prefix(&self, plate: &str) -> bool {
        if self.config.allowed_prefixes.is_empty() {
            return true;
        }
        self.config
            .allowed_prefixes
            .iter()
            .any(|prefix| plate.starts_with(prefix.as_str()))
    }
}
