//! Threat Types
//!
//! Core types for threat classification.
//! No logic here - only data structures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// THREAT TIER
// ============================================================================

/// Severity tier of a detection or a whole image.
///
/// Variants are declared from least to most severe so the derived `Ord`
/// gives the total order CLEAR < LOW < ELEVATED < HIGH < CRITICAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatTier {
    /// No objects detected
    Clear,
    /// Only unlisted classes
    Low,
    /// At least one medium-risk class
    Elevated,
    /// At least one high-risk class
    High,
    /// Critical-set class above the confidence bound
    Critical,
}

impl ThreatTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatTier::Critical => "CRITICAL",
            ThreatTier::High => "HIGH",
            ThreatTier::Elevated => "ELEVATED",
            ThreatTier::Low => "LOW",
            ThreatTier::Clear => "CLEAR",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThreatTier::Critical => "CRITICAL THREAT",
            ThreatTier::High => "HIGH ALERT",
            ThreatTier::Elevated => "ELEVATED RISK",
            ThreatTier::Low => "LOW RISK",
            ThreatTier::Clear => "ALL CLEAR",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ThreatTier::Critical => "High-risk target detected with high confidence. Immediate action required.",
            ThreatTier::High => "High-risk objects detected in the area.",
            ThreatTier::Elevated => "Suspicious activity or equipment detected. Monitor closely.",
            ThreatTier::Low => "No immediate threats detected. Routine surveillance.",
            ThreatTier::Clear => "No objects detected in image.",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ThreatTier::Critical => "#ff1744", // Red
            ThreatTier::High => "#ff6d00",     // Orange
            ThreatTier::Elevated => "#ffd600", // Yellow
            ThreatTier::Low => "#00e676",      // Green
            ThreatTier::Clear => "#40c4ff",    // Blue
        }
    }
}

impl std::fmt::Display for ThreatTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RISK LEVEL (per class)
// ============================================================================

/// Membership of a class in the risk table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        }
    }

    /// Sort key: high-risk first
    pub fn priority(&self) -> u8 {
        match self {
            RiskLevel::High => 0,
            RiskLevel::Medium => 1,
            RiskLevel::Low => 2,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ASSESSMENT
// ============================================================================

/// Summary counts for one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreatStats {
    pub total: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub avg_confidence: f32,
    pub max_confidence: f32,
    pub class_counts: BTreeMap<String, usize>,
    pub tier_counts: BTreeMap<ThreatTier, usize>,
}

/// Result of threat classification for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatAssessment {
    pub threat_level: ThreatTier,
    pub label: String,
    pub description: String,
    pub color: String,
    /// Classes whose own tier equals `threat_level`
    pub triggered_by: Vec<String>,
    /// Every high-risk detection's class, in detection order
    pub high_risk_hits: Vec<String>,
    pub stats: ThreatStats,
}

impl ThreatAssessment {
    pub fn clear() -> Self {
        let tier = ThreatTier::Clear;
        Self {
            threat_level: tier,
            label: tier.label().to_string(),
            description: tier.description().to_string(),
            color: tier.color().to_string(),
            triggered_by: vec![],
            high_risk_hits: vec![],
            stats: ThreatStats::default(),
        }
    }
}
