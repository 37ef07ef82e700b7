use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Service zone of the distribution network. Every station belongs to exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    West,
    NorthCentral,
    SouthAbc,
    East,
}

impl Zone {
    /// All zones, in sidebar and legend order.
    pub const ALL: [Zone; 4] = [Zone::West, Zone::NorthCentral, Zone::SouthAbc, Zone::East];

    /// Display label shown in the legend, sidebar headers and replies.
    pub fn label(&self) -> &'static str {
        match self {
            Zone::West => "Oeste",
            Zone::NorthCentral => "Norte/Centro",
            Zone::SouthAbc => "Sul/ABC",
            Zone::East => "Leste",
        }
    }

    /// Stable key used in URLs and config (`WEST`, `NORTH_CENTRAL`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            Zone::West => "WEST",
            Zone::NorthCentral => "NORTH_CENTRAL",
            Zone::SouthAbc => "SOUTH_ABC",
            Zone::East => "EAST",
        }
    }

    /// Parse a zone from its key, case-insensitively.
    pub fn from_key(key: &str) -> Option<Zone> {
        Zone::ALL
            .into_iter()
            .find(|z| z.key().eq_ignore_ascii_case(key.trim()))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of facility. Drives icon shape, marker size and reply wording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StationKind {
    /// Distribution substation (Estação Transformadora de Distribuição).
    #[serde(rename = "ETD")]
    Etd,
    /// Operational base.
    #[serde(rename = "BASE")]
    Base,
    /// ESD facility.
    #[serde(rename = "ESD")]
    Esd,
}

impl StationKind {
    /// Lowercase descriptor used inside assistant replies.
    pub fn descriptor(&self) -> &'static str {
        match self {
            StationKind::Etd => "subestação",
            StationKind::Base => "base operacional",
            StationKind::Esd => "ESD",
        }
    }

    /// Short code as it appears in data files and provider context.
    pub fn code(&self) -> &'static str {
        match self {
            StationKind::Etd => "ETD",
            StationKind::Base => "BASE",
            StationKind::Esd => "ESD",
        }
    }
}

impl fmt::Display for StationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Active zone filter: either everything or a single zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ZoneFilter {
    #[default]
    All,
    Zone(Zone),
}

impl ZoneFilter {
    /// Whether `zone` is the currently filtered zone. Always false for `All`.
    pub fn is_zone(&self, zone: Zone) -> bool {
        matches!(self, ZoneFilter::Zone(z) if *z == zone)
    }

    pub fn key(&self) -> &'static str {
        match self {
            ZoneFilter::All => "ALL",
            ZoneFilter::Zone(z) => z.key(),
        }
    }

    pub fn from_key(key: &str) -> Option<ZoneFilter> {
        if key.trim().eq_ignore_ascii_case("ALL") {
            return Some(ZoneFilter::All);
        }
        Zone::from_key(key).map(ZoneFilter::Zone)
    }
}

impl fmt::Display for ZoneFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for ZoneFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for ZoneFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ZoneFilter::from_key(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown zone filter: {raw}")))
    }
}

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

// =============================================================================
// Station
// =============================================================================

/// A facility record from the station directory. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StationKind,
    pub zone: Zone,
    pub lat: f64,
    pub lng: f64,
    /// Abbreviation used by field teams (e.g. `BUE`, `ALP`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Nominal voltage, e.g. `138kV`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Station {
    /// True when both coordinates are finite and inside the WGS84 range.
    pub fn has_valid_coordinates(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Case-insensitive match of `needle` against name or code.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_term(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .code
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(needle))
    }
}

// =============================================================================
// Chat
// =============================================================================

/// One entry in the assistant conversation. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}
