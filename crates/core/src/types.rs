use std::fmt;

/// Unique identifier for a connected participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Continuous world position.
///
/// Movement-disturbance detection compares squared distances, so no square
/// root is ever taken on the hot path.
#[derive(Clone, Copy, Debug, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared euclidean distance to another position.
    pub fn distance_squared(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Rate-limited capability a cooldown applies to.
///
/// Each key tracks an independent expiry per entity in the
/// [`CooldownRegistry`](crate::CooldownRegistry).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ActionKey {
    /// Sending a teleport request to another entity.
    Request,
    /// Mass-summoning every online entity.
    Summon,
    /// Relocating to a randomly searched safe position.
    RandomRelocate,
    /// Restoring an entity's vitals.
    RestoreVitals,
}

/// Which participant moves when a request resolves.
///
/// Both directions share identical negotiation plumbing; only the moving
/// entity and destination are swapped at resolution time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RequestDirection {
    /// "Come to target": the sender moves to the target's position.
    ToTarget,
    /// "Bring to me": the target moves to the sender's position.
    ToSender,
}

/// Origin of a relocation observed by the event-listener layer.
///
/// The scheduler only reacts to causes other than its own completed
/// countdowns; anything else invalidates a pending session.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RelocationCause {
    /// A countdown owned by the teleport scheduler completed.
    Scheduled,
    /// An external command moved the entity.
    Command,
    /// The entity walked into a portal.
    Portal,
    /// The entity respawned.
    Respawn,
    /// Anything the listener layer could not classify.
    Unknown,
}
