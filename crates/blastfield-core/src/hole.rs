//! Blast-hole and charge-deck records consumed by the encoder.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A single explosive deck within a hole.
///
/// Depths are measured along the hole axis from the collar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeDeck {
    pub top_depth: f64,
    pub base_depth: f64,
    pub mass_kg: f64,
    pub fire_time_ms: f64,
}

impl ChargeDeck {
    /// Charged length of the deck along the hole.
    pub fn length(&self) -> f64 {
        (self.base_depth - self.top_depth).max(0.0)
    }
}

/// A blast hole as supplied by the hole collection.
///
/// The engine only ever reads these; the owning collection stays external.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoleRecord {
    pub id: String,
    pub collar: DVec3,
    pub toe: DVec3,
    pub diameter_mm: f64,
    #[serde(default)]
    pub decks: Vec<ChargeDeck>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl HoleRecord {
    /// Creates an uncharged hole between `collar` and `toe`.
    pub fn new(id: impl Into<String>, collar: DVec3, toe: DVec3, diameter_mm: f64) -> Self {
        Self {
            id: id.into(),
            collar,
            toe,
            diameter_mm,
            decks: Vec::new(),
            visible: true,
        }
    }

    /// Builder-style helper adding a charge deck.
    #[must_use]
    pub fn with_deck(mut self, deck: ChargeDeck) -> Self {
        self.decks.push(deck);
        self
    }

    /// Collar-to-toe length.
    pub fn length(&self) -> f64 {
        self.collar.distance(self.toe)
    }

    /// Point on the hole axis at `depth` metres below the collar.
    pub fn point_at_depth(&self, depth: f64) -> DVec3 {
        let length = self.length();
        if length <= f64::EPSILON {
            return self.collar;
        }
        let t = (depth / length).clamp(0.0, 1.0);
        self.collar.lerp(self.toe, t)
    }

    /// Sum of explosive mass over all decks.
    pub fn total_charge_mass(&self) -> f64 {
        self.decks.iter().map(|d| d.mass_kg).sum()
    }

    /// Sum of charged deck lengths.
    pub fn charged_length(&self) -> f64 {
        self.decks.iter().map(ChargeDeck::length).sum()
    }

    /// Mass per metre of charged column, zero when nothing is charged.
    pub fn linear_charge_density(&self) -> f64 {
        let length = self.charged_length();
        if length > 0.0 {
            self.total_charge_mass() / length
        } else {
            0.0
        }
    }

    /// Shallowest and deepest charged depth, if any deck exists.
    pub fn charge_column(&self) -> Option<(f64, f64)> {
        let top = self.decks.iter().map(|d| d.top_depth).reduce(f64::min)?;
        let base = self.decks.iter().map(|d| d.base_depth).reduce(f64::max)?;
        Some((top, base))
    }

    /// Earliest fire time among decks carrying explosive.
    pub fn first_fire_time(&self) -> Option<f64> {
        self.decks
            .iter()
            .filter(|d| d.mass_kg > 0.0)
            .map(|d| d.fire_time_ms)
            .reduce(f64::min)
    }
}
