//! Threat Classification Rules & Risk Tables
//!
//! Class membership tables for each model profile plus the confidence bound
//! for CRITICAL. No classify logic here - only tables and lookups.
//!
//! Tables are plain values handed to the `Classifier` at construction time,
//! so tests and concurrently loaded profiles never share global state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::types::RiskLevel;
use crate::constants::DEFAULT_CRITICAL_CONFIDENCE;

// ============================================================================
// GENERAL PROFILE (COCO pretrained)
// ============================================================================

pub const GENERAL_CRITICAL_CLASSES: &[&str] = &["knife"];

pub const GENERAL_HIGH_RISK_CLASSES: &[&str] = &[
    // Vehicles
    "truck", "bus", "car", "airplane", "helicopter",
    // Weapons
    "knife", "scissors",
];

pub const GENERAL_MEDIUM_RISK_CLASSES: &[&str] = &[
    "person", "backpack", "handbag", "boat", "train", "bicycle", "motorcycle",
];

// ============================================================================
// MILITARY PROFILE (ground-level equipment)
// ============================================================================

pub const MILITARY_CRITICAL_CLASSES: &[&str] = &[
    "tank", "missile_launcher", "artillery", "rocket_launcher",
    "fighter_jet", "attack_helicopter", "combat_drone",
    "warship", "submarine",
];

pub const MILITARY_HIGH_RISK_CLASSES: &[&str] = &[
    // Heavy armor & artillery
    "tank", "armored_vehicle", "missile_launcher", "artillery",
    "rocket_launcher", "anti_aircraft_gun",
    // Airborne
    "fighter_jet", "attack_helicopter", "combat_drone",
    // Naval
    "warship", "submarine",
];

pub const MILITARY_MEDIUM_RISK_CLASSES: &[&str] = &[
    "military_truck", "patrol_boat", "military_helicopter",
    "radar_station", "bunker", "recon_drone", "military_personnel",
    "runway", "helipad",
];

// ============================================================================
// AERIAL PROFILE (DOTA)
// ============================================================================

pub const AERIAL_CRITICAL_CLASSES: &[&str] = &["plane", "helicopter"];

pub const AERIAL_HIGH_RISK_CLASSES: &[&str] = &[
    "plane", "helicopter", "ship", "harbor", "large-vehicle", "bridge",
];

pub const AERIAL_MEDIUM_RISK_CLASSES: &[&str] = &[
    "small-vehicle", "storage-tank", "ground-track-field",
    "baseball-diamond", "tennis-court", "basketball-court",
    "soccer-ball-field", "swimming-pool", "roundabout",
];

// ============================================================================
// RISK TABLE
// ============================================================================

/// Injected risk configuration for one model profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTable {
    pub critical: HashSet<String>,
    pub high: HashSet<String>,
    pub medium: HashSet<String>,
    /// A critical-set detection must be strictly above this to be CRITICAL
    pub critical_confidence: f32,
}

impl RiskTable {
    pub fn new(critical: &[&str], high: &[&str], medium: &[&str]) -> Self {
        let collect = |names: &[&str]| names.iter().map(|n| normalize_class(n)).collect();
        Self {
            critical: collect(critical),
            high: collect(high),
            medium: collect(medium),
            critical_confidence: DEFAULT_CRITICAL_CONFIDENCE,
        }
    }

    pub fn general() -> Self {
        Self::new(GENERAL_CRITICAL_CLASSES, GENERAL_HIGH_RISK_CLASSES, GENERAL_MEDIUM_RISK_CLASSES)
    }

    pub fn military() -> Self {
        Self::new(MILITARY_CRITICAL_CLASSES, MILITARY_HIGH_RISK_CLASSES, MILITARY_MEDIUM_RISK_CLASSES)
    }

    pub fn aerial() -> Self {
        Self::new(AERIAL_CRITICAL_CLASSES, AERIAL_HIGH_RISK_CLASSES, AERIAL_MEDIUM_RISK_CLASSES)
    }

    pub fn with_critical_confidence(mut self, bound: f32) -> Self {
        self.critical_confidence = bound;
        self
    }

    /// Risk level of a class. Critical-set classes count as high-risk.
    pub fn risk_of(&self, class_name: &str) -> RiskLevel {
        let name = normalize_class(class_name);
        if self.critical.contains(&name) || self.high.contains(&name) {
            RiskLevel::High
        } else if self.medium.contains(&name) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn is_critical(&self, class_name: &str) -> bool {
        self.critical.contains(&normalize_class(class_name))
    }
}

impl Default for RiskTable {
    fn default() -> Self {
        Self::general()
    }
}

/// Lower-case, spaces to underscores (hyphens are kept: DOTA uses them)
pub fn normalize_class(class_name: &str) -> String {
    class_name.trim().to_lowercase().replace(' ', "_")
}
