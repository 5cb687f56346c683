//! Tunable parameters for the coordination core.

use serde::{Deserialize, Serialize};

/// Numeric settings consumed by the scheduler, negotiator, and ops layer.
///
/// Defaults mirror a conventional small-server setup: a 30 second request
/// cooldown, 60 second request expiry, and a 3 second teleport countdown that
/// movement or damage interrupts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Cooldown applied to the sender after a request is admitted.
    pub request_cooldown_secs: u64,
    /// How long a pending request waits for accept/deny before expiring.
    pub request_expiry_secs: u64,
    /// Countdown length for delayed relocations. Zero means instant.
    pub teleport_delay_secs: u32,
    /// Whether translating past the tolerance cancels a pending session.
    pub cancel_on_move: bool,
    /// Whether taking damage cancels a pending session.
    pub cancel_on_damage: bool,
    /// Squared-distance threshold for movement cancellation. The default
    /// lets an entity look around freely but cancels after half a block of
    /// translation.
    pub movement_tolerance_sq: f64,
    /// Cooldown applied after a mass summon.
    pub summon_cooldown_secs: u64,
    /// Cooldown applied after a random relocation.
    pub random_relocate_cooldown_secs: u64,
    /// Cooldown applied after restoring vitals.
    pub restore_vitals_cooldown_secs: u64,
}

impl CoreConfig {
    pub const DEFAULT_REQUEST_COOLDOWN_SECS: u64 = 30;
    pub const DEFAULT_REQUEST_EXPIRY_SECS: u64 = 60;
    pub const DEFAULT_TELEPORT_DELAY_SECS: u32 = 3;
    pub const DEFAULT_MOVEMENT_TOLERANCE_SQ: f64 = 0.25;
    pub const DEFAULT_SUMMON_COOLDOWN_SECS: u64 = 30;
    pub const DEFAULT_RANDOM_RELOCATE_COOLDOWN_SECS: u64 = 60;
    pub const DEFAULT_RESTORE_VITALS_COOLDOWN_SECS: u64 = 120;

    pub fn new() -> Self {
        Self {
            request_cooldown_secs: Self::DEFAULT_REQUEST_COOLDOWN_SECS,
            request_expiry_secs: Self::DEFAULT_REQUEST_EXPIRY_SECS,
            teleport_delay_secs: Self::DEFAULT_TELEPORT_DELAY_SECS,
            cancel_on_move: true,
            cancel_on_damage: true,
            movement_tolerance_sq: Self::DEFAULT_MOVEMENT_TOLERANCE_SQ,
            summon_cooldown_secs: Self::DEFAULT_SUMMON_COOLDOWN_SECS,
            random_relocate_cooldown_secs: Self::DEFAULT_RANDOM_RELOCATE_COOLDOWN_SECS,
            restore_vitals_cooldown_secs: Self::DEFAULT_RESTORE_VITALS_COOLDOWN_SECS,
        }
    }

    /// Parses a configuration from its JSON representation. Missing fields
    /// fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
