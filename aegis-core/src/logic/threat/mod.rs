//! Threat Module
//!
//! Assigns a threat tier to each detection and to the whole image.
//! CRITICAL > HIGH > ELEVATED > LOW > CLEAR.
//!
//! ## Structure
//! - `types`: Core types (ThreatTier, RiskLevel, ThreatAssessment)
//! - `rules`: Per-profile class tables and the `RiskTable`
//! - `classifier`: Classification logic
//!
//! ## Usage
//! ```ignore
//! use aegis_core::logic::threat::{Classifier, RiskTable, ThreatTier};
//!
//! let classifier = Classifier::new(RiskTable::military());
//! let detections = classifier.score(raw);
//! let assessment = classifier.assess(&detections);
//! if assessment.threat_level == ThreatTier::Critical {
//!     println!("Action needed");
//! }
//! ```

pub mod types;
pub mod rules;
pub mod classifier;

pub use types::{RiskLevel, ThreatAssessment, ThreatStats, ThreatTier};

pub use rules::{normalize_class, RiskTable};

pub use classifier::Classifier;
