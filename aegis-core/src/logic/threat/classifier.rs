//! Threat Classifier
//!
//! Classification logic only - tables live in `rules`, types in `types`.
//! Input: raw detections from a `Detector`, or already scored detections
//! Output: `Detection` list and `ThreatAssessment`

use std::collections::{BTreeMap, HashSet};

use super::rules::{normalize_class, RiskTable};
use super::types::{RiskLevel, ThreatAssessment, ThreatStats, ThreatTier};
use crate::logic::detector::{BoundingBox, Detection, RawDetection};

/// Pure threat scorer over an injected risk table
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    table: RiskTable,
}

impl Classifier {
    pub fn new(table: RiskTable) -> Self {
        Self { table }
    }

    // ========================================================================
    // PER-DETECTION
    // ========================================================================

    /// Tier a single detection triggers on its own
    pub fn tier_for(&self, class_name: &str, confidence: f32) -> ThreatTier {
        let name = normalize_class(class_name);
        if self.table.critical.contains(&name) && confidence > self.table.critical_confidence {
            return ThreatTier::Critical;
        }
        match self.table.risk_of(&name) {
            RiskLevel::High => ThreatTier::High,
            RiskLevel::Medium => ThreatTier::Elevated,
            RiskLevel::Low => ThreatTier::Low,
        }
    }

    /// Attach risk level and tier to raw detector output.
    ///
    /// Result is sorted high -> medium -> low risk, then confidence descending,
    /// and ids are assigned in that order.
    pub fn score(&self, raw: Vec<RawDetection>) -> Vec<Detection> {
        let mut scored: Vec<Detection> = raw
            .into_iter()
            .map(|r| {
                let confidence = round4(r.confidence);
                Detection {
                    id: 0,
                    risk_level: self.table.risk_of(&r.class_name),
                    tier: self.tier_for(&r.class_name, confidence),
                    bbox: BoundingBox::from_corners(r.bbox),
                    class_name: r.class_name,
                    confidence,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            a.risk_level
                .priority()
                .cmp(&b.risk_level.priority())
                .then(b.confidence.total_cmp(&a.confidence))
        });
        for (i, det) in scored.iter_mut().enumerate() {
            det.id = i;
        }
        scored
    }

    // ========================================================================
    // PER-IMAGE
    // ========================================================================

    /// Image tier = max per-detection tier, CLEAR when empty
    pub fn assess(&self, detections: &[Detection]) -> ThreatAssessment {
        if detections.is_empty() {
            return ThreatAssessment::clear();
        }

        let tiers: Vec<ThreatTier> = detections
            .iter()
            .map(|d| self.tier_for(&d.class_name, d.confidence))
            .collect();
        let tier = tiers.iter().copied().max().unwrap_or(ThreatTier::Clear);

        let mut triggered_by = Vec::new();
        let mut seen = HashSet::new();
        for (det, det_tier) in detections.iter().zip(&tiers) {
            if *det_tier == tier && seen.insert(det.class_name.as_str()) {
                triggered_by.push(det.class_name.clone());
            }
        }

        let high_risk_hits: Vec<String> = detections
            .iter()
            .filter(|d| self.table.risk_of(&d.class_name) == RiskLevel::High)
            .map(|d| d.class_name.clone())
            .collect();

        ThreatAssessment {
            threat_level: tier,
            label: tier.label().to_string(),
            description: tier.description().to_string(),
            color: tier.color().to_string(),
            triggered_by,
            high_risk_hits,
            stats: self.stats(detections, &tiers),
        }
    }

    fn stats(&self, detections: &[Detection], tiers: &[ThreatTier]) -> ThreatStats {
        let mut stats = ThreatStats {
            total: detections.len(),
            ..Default::default()
        };
        let mut class_counts = BTreeMap::new();
        let mut tier_counts = BTreeMap::new();
        let mut sum = 0.0f32;

        for (det, tier) in detections.iter().zip(tiers) {
            match self.table.risk_of(&det.class_name) {
                RiskLevel::High => stats.high_risk += 1,
                RiskLevel::Medium => stats.medium_risk += 1,
                RiskLevel::Low => stats.low_risk += 1,
            }
            *class_counts.entry(det.class_name.clone()).or_insert(0) += 1;
            *tier_counts.entry(*tier).or_insert(0) += 1;
            sum += det.confidence;
            stats.max_confidence = stats.max_confidence.max(det.confidence);
        }

        stats.avg_confidence = round4(sum / detections.len() as f32);
        stats.class_counts = class_counts;
        stats.tier_counts = tier_counts;
        stats
    }
}

pub(crate) fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(class_name: &str, confidence: f32) -> RawDetection {
        RawDetection {
            class_name: class_name.to_string(),
            confidence,
            bbox: [10.0, 20.0, 110.0, 220.0],
        }
    }

    #[test]
    fn test_no_detections_is_clear() {
        let classifier = Classifier::new(RiskTable::general());
        let assessment = classifier.assess(&[]);
        assert_eq!(assessment.threat_level, ThreatTier::Clear);
        assert_eq!(assessment.stats.total, 0);
        assert!(assessment.triggered_by.is_empty());
        assert_eq!(assessment.stats.avg_confidence, 0.0);
    }

    #[test]
    fn test_truck_and_person_is_high() {
        let classifier = Classifier::new(RiskTable::general());
        let detections = classifier.score(vec![raw("person", 0.76), raw("truck", 0.89)]);
        let assessment = classifier.assess(&detections);

        assert_eq!(assessment.threat_level, ThreatTier::High);
        assert_eq!(assessment.stats.total, 2);
        assert_eq!(assessment.stats.class_counts.get("truck"), Some(&1));
        assert_eq!(assessment.stats.class_counts.get("person"), Some(&1));
        assert_eq!(assessment.high_risk_hits, vec!["truck".to_string()]);
        assert_eq!(assessment.triggered_by, vec!["truck".to_string()]);
        assert_eq!(assessment.stats.high_risk, 1);
        assert_eq!(assessment.stats.medium_risk, 1);
    }

    #[test]
    fn test_critical_class_above_bound_dominates() {
        let classifier = Classifier::new(RiskTable::military());
        let detections = classifier.score(vec![
            raw("military_truck", 0.99),
            raw("tank", 0.91),
            raw("bunker", 0.40),
        ]);
        let assessment = classifier.assess(&detections);
        assert_eq!(assessment.threat_level, ThreatTier::Critical);
        assert_eq!(assessment.triggered_by, vec!["tank".to_string()]);
    }

    #[test]
    fn test_critical_bound_is_strict() {
        let classifier = Classifier::new(RiskTable::military());
        assert_eq!(classifier.tier_for("tank", 0.80), ThreatTier::High);
        assert_eq!(classifier.tier_for("tank", 0.8001), ThreatTier::Critical);

        let strict = Classifier::new(RiskTable::military().with_critical_confidence(0.95));
        assert_eq!(strict.tier_for("tank", 0.91), ThreatTier::High);
    }

    #[test]
    fn test_image_tier_is_max_of_detections() {
        let classifier = Classifier::new(RiskTable::general());
        let detections = classifier.score(vec![raw("cup", 0.9), raw("person", 0.5)]);
        assert_eq!(classifier.assess(&detections).threat_level, ThreatTier::Elevated);

        let detections = classifier.score(vec![raw("cup", 0.9), raw("dog", 0.5)]);
        assert_eq!(classifier.assess(&detections).threat_level, ThreatTier::Low);
    }

    #[test]
    fn test_tier_order() {
        assert!(ThreatTier::Critical > ThreatTier::High);
        assert!(ThreatTier::High > ThreatTier::Elevated);
        assert!(ThreatTier::Elevated > ThreatTier::Low);
        assert!(ThreatTier::Low > ThreatTier::Clear);
    }

    #[test]
    fn test_score_sorts_by_risk_then_confidence() {
        let classifier = Classifier::new(RiskTable::general());
        let detections = classifier.score(vec![
            raw("cup", 0.99),
            raw("person", 0.70),
            raw("car", 0.50),
            raw("truck", 0.90),
        ]);
        let names: Vec<&str> = detections.iter().map(|d| d.class_name.as_str()).collect();
        assert_eq!(names, vec!["truck", "car", "person", "cup"]);
        let ids: Vec<usize> = detections.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_confidence_rounded_to_four_places() {
        let classifier = Classifier::new(RiskTable::general());
        let detections = classifier.score(vec![raw("truck", 0.123_456)]);
        assert_eq!(detections[0].confidence, 0.1235);
        assert_eq!(detections[0].bbox.width, 100);
        assert_eq!(detections[0].bbox.cy, 120);
    }
}
