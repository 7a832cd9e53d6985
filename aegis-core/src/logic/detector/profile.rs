//! Model Profiles
//!
//! A profile ties a weights file to its label list and risk table.
//! Selected once at startup; `auto` picks the most specific weights present.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DetectorError;
use crate::logic::threat::RiskTable;

// ============================================================================
// LABELS
// ============================================================================

pub const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck",
    "boat", "traffic light", "fire hydrant", "stop sign", "parking meter", "bench",
    "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra",
    "giraffe", "backpack", "umbrella", "handbag", "tie", "suitcase", "frisbee",
    "skis", "snowboard", "sports ball", "kite", "baseball bat", "baseball glove",
    "skateboard", "surfboard", "tennis racket", "bottle", "wine glass", "cup",
    "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink",
    "refrigerator", "book", "clock", "vase", "scissors", "teddy bear",
    "hair drier", "toothbrush",
];

/// Index order of the fine-tuned military weights
pub const MILITARY_LABELS: [&str; 20] = [
    "tank", "armored_vehicle", "missile_launcher", "artillery", "fighter_jet",
    "attack_helicopter", "warship", "submarine", "rocket_launcher",
    "anti_aircraft_gun", "military_truck", "patrol_boat", "military_helicopter",
    "radar_station", "recon_drone", "combat_drone", "military_personnel",
    "bunker", "runway", "helipad",
];

/// DOTA v1.0 class order
pub const DOTA_LABELS: [&str; 15] = [
    "plane", "ship", "storage-tank", "baseball-diamond", "tennis-court",
    "basketball-court", "ground-track-field", "harbor", "bridge",
    "large-vehicle", "small-vehicle", "helicopter", "roundabout",
    "soccer-ball-field", "swimming-pool",
];

// ============================================================================
// PROFILE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProfile {
    /// COCO-pretrained fallback
    General,
    /// Fine-tuned ground-level military equipment
    Military,
    /// DOTA aerial imagery
    Aerial,
}

impl ModelProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProfile::General => "general",
            ModelProfile::Military => "military",
            ModelProfile::Aerial => "aerial",
        }
    }

    pub fn default_labels(&self) -> &'static [&'static str] {
        match self {
            ModelProfile::General => &COCO_LABELS,
            ModelProfile::Military => &MILITARY_LABELS,
            ModelProfile::Aerial => &DOTA_LABELS,
        }
    }

    pub fn risk_table(&self) -> RiskTable {
        match self {
            ModelProfile::General => RiskTable::general(),
            ModelProfile::Military => RiskTable::military(),
            ModelProfile::Aerial => RiskTable::aerial(),
        }
    }
}

impl fmt::Display for ModelProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operator's choice; `Auto` is resolved against the weights on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileSelection {
    #[default]
    Auto,
    Fixed(ModelProfile),
}

impl FromStr for ProfileSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(ProfileSelection::Auto),
            "general" | "coco" => Ok(ProfileSelection::Fixed(ModelProfile::General)),
            "military" => Ok(ProfileSelection::Fixed(ModelProfile::Military)),
            "aerial" | "dota" => Ok(ProfileSelection::Fixed(ModelProfile::Aerial)),
            other => Err(format!("Unknown model profile: {}", other)),
        }
    }
}

/// Weights file per profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub military: PathBuf,
    pub aerial: PathBuf,
    pub general: PathBuf,
}

impl ModelPaths {
    pub fn for_profile(&self, profile: ModelProfile) -> &Path {
        match profile {
            ModelProfile::General => &self.general,
            ModelProfile::Military => &self.military,
            ModelProfile::Aerial => &self.aerial,
        }
    }

    /// Military weights if present, else aerial, else general
    pub fn resolve(&self, selection: ProfileSelection) -> (ModelProfile, PathBuf) {
        let profile = match selection {
            ProfileSelection::Fixed(profile) => profile,
            ProfileSelection::Auto => {
                if self.military.exists() {
                    ModelProfile::Military
                } else if self.aerial.exists() {
                    ModelProfile::Aerial
                } else {
                    ModelProfile::General
                }
            }
        };
        (profile, self.for_profile(profile).to_path_buf())
    }
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            military: PathBuf::from("models/best_model.onnx"),
            aerial: PathBuf::from("models/dota_model.onnx"),
            general: PathBuf::from("models/yolo11n.onnx"),
        }
    }
}

/// One class name per line, blank lines ignored
pub fn load_labels(path: &Path) -> Result<Vec<String>, DetectorError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DetectorError::ModelUnavailable(format!("Cannot read labels {}: {}", path.display(), e))
    })?;

    let labels: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    if labels.is_empty() {
        return Err(DetectorError::ModelUnavailable(format!(
            "Label file {} is empty",
            path.display()
        )));
    }
    Ok(labels)
}
