//! Keying standards registry.
//!
//! Static configuration for the two supported master-keying standards:
//! ANSI/BHMA A156.28 (North America) and EN 1303 (Europe). Each standard
//! carries its pin/depth/MACS parameters, its hierarchy level definitions,
//! and the hierarchy it recommends per facility type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Identifier of a supported keying standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardId {
    /// ANSI/BHMA A156.28.
    #[serde(rename = "ANSI_BHMA")]
    AnsiBhma,
    /// EN 1303.
    #[serde(rename = "EN")]
    En1303,
}

impl StandardId {
    /// Every supported standard.
    pub const ALL: [Self; 2] = [Self::AnsiBhma, Self::En1303];

    /// The wire identifier (`ANSI_BHMA` or `EN`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnsiBhma => "ANSI_BHMA",
            Self::En1303 => "EN",
        }
    }

    /// The static configuration for this standard.
    #[must_use]
    pub fn config(self) -> &'static Standard {
        get_standard(self)
    }
}

impl fmt::Display for StandardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StandardId {
    type Err = CoreError;

    /// Parse a standard id. Unknown ids are an error, not a silent ANSI default.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ANSI_BHMA" | "ANSI" => Ok(Self::AnsiBhma),
            "EN" | "EN1303" | "EN_1303" => Ok(Self::En1303),
            _ => Err(CoreError::UnknownStandard(s.to_string())),
        }
    }
}

/// Cylinder pinning parameters of a standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinConfig {
    /// Number of pin stacks in the cylinder.
    pub pins: u32,
    /// Number of available bitting depths per pin.
    pub depths: u64,
    /// Maximum adjacent cut specification.
    pub macs: u32,
}

/// One hierarchy level defined by a standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelDefinition {
    /// Short level code (e.g. `GMK`, `MK`, `CK`).
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Template symbol for the level.
    pub symbol: &'static str,
    /// Position in the hierarchy, 0 = top.
    pub order: u32,
}

/// Recommended hierarchy for one facility type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    /// Facility type the recommendation applies to.
    pub facility: FacilityType,
    /// Recommended hierarchy depth.
    pub depth: u32,
    /// Level codes, top first.
    pub levels: &'static [&'static str],
}

/// Static configuration of a keying standard.
#[derive(Debug, Serialize)]
pub struct Standard {
    /// Standard identifier.
    pub id: StandardId,
    /// Display name.
    pub name: &'static str,
    /// Published version.
    pub version: &'static str,
    /// Region the standard applies to.
    pub region: &'static str,
    /// Pinning parameters.
    pub pin_config: PinConfig,
    /// Maximum number of differs, `depths ^ pins`.
    pub max_differs: u64,
    /// Hierarchy level definitions, top first.
    pub hierarchy_levels: &'static [LevelDefinition],
    /// Security grades or classes defined by the standard.
    pub security_grades: &'static [&'static str],
    /// Recommended hierarchy per facility type.
    pub recommendations: &'static [Recommendation],
}

impl Standard {
    /// Find a level definition by its code.
    #[must_use]
    pub fn level(&self, id: &str) -> Option<&'static LevelDefinition> {
        self.hierarchy_levels.iter().find(|level| level.id == id)
    }

    /// The recommendation for a facility type.
    ///
    /// Every facility type has a recommendation in both standards.
    #[must_use]
    pub fn recommendation(&self, facility: FacilityType) -> Option<&'static Recommendation> {
        self.recommendations.iter().find(|r| r.facility == facility)
    }

    /// The hierarchy depths this standard accepts without an error.
    #[must_use]
    pub const fn depth_limits(&self) -> DepthLimits {
        match self.id {
            StandardId::AnsiBhma => DepthLimits {
                min: 2,
                max: 5,
                max_is_hard: true,
            },
            StandardId::En1303 => DepthLimits {
                min: 2,
                max: 4,
                max_is_hard: false,
            },
        }
    }
}

/// Depth bounds of a standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthLimits {
    /// Minimum depth; fewer levels is always an error.
    pub min: u32,
    /// Practical maximum depth.
    pub max: u32,
    /// Whether exceeding `max` is an error (ANSI) or a warning (EN).
    pub max_is_hard: bool,
}

const ANSI_LEVELS: &[LevelDefinition] = &[
    LevelDefinition { id: "GGM", name: "Great Grand Master", symbol: "A", order: 0 },
    LevelDefinition { id: "GMK", name: "Grand Master", symbol: "AA", order: 1 },
    LevelDefinition { id: "MK", name: "Master Key", symbol: "AAA", order: 2 },
    LevelDefinition { id: "SMK", name: "Sub-Master", symbol: "AAAA", order: 3 },
    LevelDefinition { id: "CK", name: "Change Key", symbol: "AAAAA", order: 4 },
];

const EN_LEVELS: &[LevelDefinition] = &[
    LevelDefinition { id: "GM", name: "General Master", symbol: "GM", order: 0 },
    LevelDefinition { id: "MK", name: "Master Key", symbol: "M", order: 1 },
    LevelDefinition { id: "SK", name: "Sub-Key", symbol: "S", order: 2 },
    LevelDefinition { id: "UK", name: "User Key", symbol: "U", order: 3 },
];

const ANSI_RECOMMENDATIONS: &[Recommendation] = &[
    Recommendation { facility: FacilityType::CommercialOffice, depth: 3, levels: &["GMK", "MK", "CK"] },
    Recommendation { facility: FacilityType::Healthcare, depth: 4, levels: &["GMK", "MK", "SMK", "CK"] },
    Recommendation { facility: FacilityType::Education, depth: 3, levels: &["GMK", "MK", "CK"] },
    Recommendation { facility: FacilityType::Transport, depth: 4, levels: &["GMK", "MK", "SMK", "CK"] },
    Recommendation { facility: FacilityType::Hospitality, depth: 4, levels: &["GMK", "MK", "SMK", "CK"] },
    Recommendation { facility: FacilityType::Residential, depth: 2, levels: &["MK", "CK"] },
];

const EN_RECOMMENDATIONS: &[Recommendation] = &[
    Recommendation { facility: FacilityType::CommercialOffice, depth: 2, levels: &["MK", "UK"] },
    Recommendation { facility: FacilityType::Healthcare, depth: 3, levels: &["GM", "MK", "UK"] },
    Recommendation { facility: FacilityType::Education, depth: 2, levels: &["MK", "UK"] },
    Recommendation { facility: FacilityType::Transport, depth: 3, levels: &["GM", "MK", "UK"] },
    Recommendation { facility: FacilityType::Hospitality, depth: 3, levels: &["GM", "MK", "UK"] },
    Recommendation { facility: FacilityType::Residential, depth: 2, levels: &["MK", "UK"] },
];

static ANSI_BHMA: Standard = Standard {
    id: StandardId::AnsiBhma,
    name: "ANSI/BHMA A156.28",
    version: "2023",
    region: "North America",
    pin_config: PinConfig { pins: 6, depths: 7, macs: 4 },
    max_differs: max_differs(6, 7),
    hierarchy_levels: ANSI_LEVELS,
    security_grades: &["Grade 1", "Grade 2", "Grade 3"],
    recommendations: ANSI_RECOMMENDATIONS,
};

static EN_1303: Standard = Standard {
    id: StandardId::En1303,
    name: "EN 1303",
    version: "2015",
    region: "Europe",
    pin_config: PinConfig { pins: 5, depths: 6, macs: 3 },
    max_differs: max_differs(5, 6),
    hierarchy_levels: EN_LEVELS,
    security_grades: &["Class 1", "Class 2", "Class 3", "Class 4", "Class 5", "Class 6"],
    recommendations: EN_RECOMMENDATIONS,
};

/// Look up the static configuration of a standard.
#[must_use]
pub fn get_standard(id: StandardId) -> &'static Standard {
    match id {
        StandardId::AnsiBhma => &ANSI_BHMA,
        StandardId::En1303 => &EN_1303,
    }
}

/// Maximum number of distinct keys for a pinning, `depths ^ pins`.
#[must_use]
pub const fn max_differs(pins: u32, depths: u64) -> u64 {
    depths.pow(pins)
}

/// The level definitions a standard recommends for a facility type, top first.
#[must_use]
pub fn get_recommended_hierarchy(
    standard: StandardId,
    facility: FacilityType,
) -> Vec<&'static LevelDefinition> {
    let config = get_standard(standard);
    config
        .recommendation(facility)
        .map(|rec| rec.levels.iter().filter_map(|id| config.level(id)).collect())
        .unwrap_or_default()
}

/// Describe a hierarchy depth in the vocabulary of a standard.
#[must_use]
pub fn describe_depth(standard: StandardId, depth: u32) -> &'static str {
    let ansi = standard == StandardId::AnsiBhma;
    match depth {
        2 if ansi => "2-Level System: Master → Change Keys",
        2 => "2-Level System: Master → User Keys",
        3 if ansi => "3-Level System: Grand Master → Master → Change",
        3 => "3-Level System: General Master → Master → User",
        4 if ansi => "4-Level System: Great GM → Grand Master → Master → Change",
        4 => "4-Level System: Great GM → General Master → Master → User",
        _ => "Single Key System (SKD/KD)",
    }
}

/// Human description of a security grade or class.
///
/// Unknown grades are returned unchanged.
#[must_use]
pub fn security_grade_description(standard: StandardId, grade: &str) -> &str {
    let described = match standard {
        StandardId::AnsiBhma => match grade {
            "Grade 1" => Some("Heavy-duty commercial (highest security)"),
            "Grade 2" => Some("Standard commercial (medium security)"),
            "Grade 3" => Some("Light commercial/residential (basic security)"),
            _ => None,
        },
        StandardId::En1303 => match grade {
            "Class 1" => Some("Very low security"),
            "Class 2" => Some("Low security"),
            "Class 3" => Some("Medium security"),
            "Class 4" => Some("High security"),
            "Class 5" => Some("Very high security"),
            "Class 6" => Some("Maximum security"),
            _ => None,
        },
    };
    described.unwrap_or(grade)
}

/// A pair of adjacent cuts whose depth difference exceeds the MACS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacsViolation {
    /// Zero-based index of the first cut of the pair.
    pub position: usize,
    /// Absolute depth difference between the two cuts.
    pub difference: u32,
    /// The MACS that was exceeded.
    pub macs: u32,
}

impl fmt::Display for MacsViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "adjacent cut difference {} exceeds MACS {} at positions {}-{}",
            self.difference,
            self.macs,
            self.position + 1,
            self.position + 2
        )
    }
}

/// Check a bitting code (one decimal digit per cut) against a MACS.
///
/// # Errors
///
/// Returns `CoreError::InvalidBitting` if the code contains a non-digit.
pub fn validate_bitting(bitting: &str, macs: u32) -> Result<Vec<MacsViolation>> {
    let cuts = bitting
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<u32>>>()
        .ok_or_else(|| CoreError::InvalidBitting(bitting.to_string()))?;

    Ok(cuts
        .windows(2)
        .enumerate()
        .filter_map(|(position, pair)| {
            let difference = pair[0].abs_diff(pair[1]);
            (difference > macs).then_some(MacsViolation {
                position,
                difference,
                macs,
            })
        })
        .collect())
}

/// Facility types with keying recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityType {
    /// Commercial office buildings.
    #[serde(alias = "Commercial Office")]
    CommercialOffice,
    /// Hospitals and healthcare facilities.
    #[serde(alias = "Hospital / Healthcare")]
    Healthcare,
    /// Schools and campuses.
    #[serde(alias = "Education / School")]
    Education,
    /// Airports and transport hubs.
    #[serde(alias = "Airport / Transport")]
    Transport,
    /// Hotels.
    #[serde(alias = "Hospitality / Hotel")]
    Hospitality,
    /// Residential buildings.
    #[serde(alias = "Residential")]
    Residential,
}

impl FacilityType {
    /// Every facility type.
    pub const ALL: [Self; 6] = [
        Self::CommercialOffice,
        Self::Healthcare,
        Self::Education,
        Self::Transport,
        Self::Hospitality,
        Self::Residential,
    ];

    /// Display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::CommercialOffice => "Commercial Office",
            Self::Healthcare => "Hospital / Healthcare",
            Self::Education => "Education / School",
            Self::Transport => "Airport / Transport",
            Self::Hospitality => "Hospitality / Hotel",
            Self::Residential => "Residential",
        }
    }

    /// Snake-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CommercialOffice => "commercial_office",
            Self::Healthcare => "healthcare",
            Self::Education => "education",
            Self::Transport => "transport",
            Self::Hospitality => "hospitality",
            Self::Residential => "residential",
        }
    }

    /// Recommended hierarchy depth band for this facility type.
    #[must_use]
    pub const fn depth_band(self) -> DepthBand {
        match self {
            Self::CommercialOffice | Self::Education => DepthBand { min: 2, max: 3, optimal: 3 },
            Self::Healthcare | Self::Transport | Self::Hospitality => {
                DepthBand { min: 3, max: 4, optimal: 4 }
            }
            Self::Residential => DepthBand { min: 2, max: 2, optimal: 2 },
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for FacilityType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| {
                f.as_str().eq_ignore_ascii_case(needle)
                    || f.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| CoreError::UnknownFacilityType(s.to_string()))
    }
}

/// Recommended `[min, max]` depth band for a facility type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthBand {
    /// Fewest levels the facility typically needs.
    pub min: u32,
    /// Most levels the facility typically needs.
    pub max: u32,
    /// Usual depth.
    pub optimal: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_differs_matches_pinning() {
        assert_eq!(get_standard(StandardId::AnsiBhma).max_differs, 117_649);
        assert_eq!(get_standard(StandardId::En1303).max_differs, 7776);
        assert_eq!(max_differs(5, 6), 7776);
    }

    #[test]
    fn unknown_standard_fails_loudly() {
        assert_eq!("ANSI_BHMA".parse::<StandardId>(), Ok(StandardId::AnsiBhma));
        assert_eq!("en".parse::<StandardId>(), Ok(StandardId::En1303));
        assert!(matches!(
            "ANSII".parse::<StandardId>(),
            Err(CoreError::UnknownStandard(_))
        ));
    }

    #[test]
    fn facility_type_parses_display_and_snake_case() {
        assert_eq!(
            "Hospital / Healthcare".parse::<FacilityType>(),
            Ok(FacilityType::Healthcare)
        );
        assert_eq!("residential".parse::<FacilityType>(), Ok(FacilityType::Residential));
        assert!("Warehouse".parse::<FacilityType>().is_err());
    }

    #[test]
    fn facility_type_serde_accepts_display_name() {
        let parsed: FacilityType = serde_json::from_str("\"Airport / Transport\"").unwrap();
        assert_eq!(parsed, FacilityType::Transport);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"transport\"");
    }

    #[test]
    fn recommended_hierarchy_resolves_level_definitions() {
        let levels = get_recommended_hierarchy(StandardId::AnsiBhma, FacilityType::Healthcare);
        let ids: Vec<_> = levels.iter().map(|l| l.id).collect();
        assert_eq!(ids, ["GMK", "MK", "SMK", "CK"]);

        let levels = get_recommended_hierarchy(StandardId::En1303, FacilityType::Residential);
        let ids: Vec<_> = levels.iter().map(|l| l.id).collect();
        assert_eq!(ids, ["MK", "UK"]);
    }

    #[test]
    fn every_facility_has_a_recommendation() {
        for standard in StandardId::ALL {
            for facility in FacilityType::ALL {
                assert!(
                    !get_recommended_hierarchy(standard, facility).is_empty(),
                    "{standard} has no recommendation for {facility}"
                );
            }
        }
    }

    #[test]
    fn bitting_within_macs() {
        assert!(validate_bitting("242424", 4).unwrap().is_empty());
    }

    #[test]
    fn bitting_reports_each_violation() {
        let violations = validate_bitting("150515", 3).unwrap();
        assert_eq!(violations.len(), 5);
        assert_eq!(violations[0].position, 0);
        assert_eq!(violations[0].difference, 4);
        assert_eq!(
            violations[0].to_string(),
            "adjacent cut difference 4 exceeds MACS 3 at positions 1-2"
        );
    }

    #[test]
    fn bitting_rejects_non_digits() {
        assert!(matches!(
            validate_bitting("12a4", 3),
            Err(CoreError::InvalidBitting(_))
        ));
    }

    #[test]
    fn grade_descriptions() {
        assert_eq!(
            security_grade_description(StandardId::En1303, "Class 4"),
            "High security"
        );
        assert_eq!(
            security_grade_description(StandardId::AnsiBhma, "Grade 9"),
            "Grade 9"
        );
    }

    #[test]
    fn depth_limits_per_standard() {
        let ansi = get_standard(StandardId::AnsiBhma).depth_limits();
        assert_eq!((ansi.min, ansi.max, ansi.max_is_hard), (2, 5, true));
        let en = get_standard(StandardId::En1303).depth_limits();
        assert_eq!((en.min, en.max, en.max_is_hard), (2, 4, false));
    }
}
