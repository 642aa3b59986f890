//! Standards compliance and completeness validation.
//!
//! Validation is a reporting operation: every problem becomes a [`Finding`]
//! in a [`ValidationReport`], never an error. Callers that want to follow
//! individual rules as they fire attach a [`RuleObserver`].
//!
//! # Checks
//!
//! - symbol format per tier (ANSI letter counts and restricted letters, EN
//!   literal prefixes)
//! - sequence gaps (warnings only)
//! - hierarchy depth against the standard and the facility type
//! - ANSI parent/child symbol pairing
//! - completeness: unassigned doors, capacity overrun, missing hierarchy

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use masterkey_core::{get_standard, FacilityType, HierarchyId, StandardId};
use masterkey_store::{Assignment, HierarchyLevel, KeyType};
use serde::{Deserialize, Serialize};

use crate::capacity::differs_used;
use crate::types::DesignSnapshot;

/// Letters ANSI/BHMA A156.28 forbids in key symbols.
pub const RESTRICTED_LETTERS: [char; 4] = ['I', 'O', 'Q', 'X'];

/// Tier at which assignment symbols are checked.
const CHANGE_KEY_LEVEL: u32 = 3;

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// ANSI top key is not a single letter.
    InvalidTopLevelFormat,
    /// ANSI tier-1 key is not two letters.
    InvalidLevel1Format,
    /// ANSI tier-2 key is not three letters.
    InvalidLevel2Format,
    /// ANSI change key is not letters followed by digits.
    InvalidChangeKeyFormat,
    /// ANSI symbol uses I, O, Q or X.
    RestrictedLetter,
    /// ANSI tier-1 letters are far apart.
    UnusualPairing,
    /// EN top key is not `GMK`.
    InvalidGmkSymbol,
    /// EN master key is not `MK-n`.
    InvalidMkFormat,
    /// EN sub-key is not `SK-n`.
    InvalidSkFormat,
    /// EN change key is not `CK-nnn`.
    InvalidCkFormat,
    /// ANSI tier-1 letters skip a letter.
    LetterSequenceGap,
    /// EN master numbering skips a number.
    SequenceGap,
    /// EN change-key numbering skips a number.
    ChangeKeyGap,
    /// Fewer tiers than the standard requires.
    InsufficientDepth,
    /// More tiers than EN 1303 recommends.
    ExcessiveDepth,
    /// More tiers than ANSI/BHMA allows.
    ExceedsMaximumDepth,
    /// Fewer tiers than the facility type usually needs.
    BelowFacilityMinimum,
    /// More tiers than the facility type usually needs.
    AboveFacilityMaximum,
    /// ANSI child symbol does not start with its parent's symbol.
    InvalidParentChildPairing,
    /// Doors without an assignment.
    UnassignedDoors,
    /// More differs used than the standard provides.
    ExceedsDiffers,
    /// No hierarchy levels at all.
    NoHierarchy,
}

impl FindingKind {
    /// Snake-case code of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidTopLevelFormat => "invalid_top_level_format",
            Self::InvalidLevel1Format => "invalid_level1_format",
            Self::InvalidLevel2Format => "invalid_level2_format",
            Self::InvalidChangeKeyFormat => "invalid_change_key_format",
            Self::RestrictedLetter => "restricted_letter",
            Self::UnusualPairing => "unusual_pairing",
            Self::InvalidGmkSymbol => "invalid_gmk_symbol",
            Self::InvalidMkFormat => "invalid_mk_format",
            Self::InvalidSkFormat => "invalid_sk_format",
            Self::InvalidCkFormat => "invalid_ck_format",
            Self::LetterSequenceGap => "letter_sequence_gap",
            Self::SequenceGap => "sequence_gap",
            Self::ChangeKeyGap => "change_key_gap",
            Self::InsufficientDepth => "insufficient_depth",
            Self::ExcessiveDepth => "excessive_depth",
            Self::ExceedsMaximumDepth => "exceeds_maximum_depth",
            Self::BelowFacilityMinimum => "below_facility_minimum",
            Self::AboveFacilityMaximum => "above_facility_maximum",
            Self::InvalidParentChildPairing => "invalid_parent_child_pairing",
            Self::UnassignedDoors => "unassigned_doors",
            Self::ExceedsDiffers => "exceeds_differs",
            Self::NoHierarchy => "no_hierarchy",
        }
    }

    /// Whether critical-only validation keeps findings of this kind.
    #[must_use]
    pub const fn is_critical(self) -> bool {
        matches!(
            self,
            Self::UnassignedDoors
                | Self::ExceedsDiffers
                | Self::NoHierarchy
                | Self::InsufficientDepth
                | Self::ExceedsMaximumDepth
                | Self::InvalidParentChildPairing
                | Self::ExcessiveDepth
                | Self::BelowFacilityMinimum
                | Self::AboveFacilityMaximum
        )
    }
}

/// Error or warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The design is not valid.
    Error,
    /// The design is valid but unusual.
    Warning,
}

/// One validation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// What the finding is about.
    #[serde(rename = "type")]
    pub kind: FindingKind,
    /// Error or warning.
    pub severity: Severity,
    /// User-facing message.
    pub message: String,
    /// Symbol the finding refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Expected value or pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Actual value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// Zero-based character position inside the symbol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Measured quantity, e.g. depth or differs used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    /// The bound that was crossed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl Finding {
    fn new(kind: FindingKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            symbol: None,
            expected: None,
            actual: None,
            position: None,
            current: None,
            limit: None,
        }
    }

    /// An error finding.
    #[must_use]
    pub fn error(kind: FindingKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    /// A warning finding.
    #[must_use]
    pub fn warning(kind: FindingKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    #[must_use]
    fn symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    #[must_use]
    fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    #[must_use]
    fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    #[must_use]
    const fn measured(mut self, current: u64, limit: u64) -> Self {
        self.current = Some(current);
        self.limit = Some(limit);
        self
    }
}

/// Errors and warnings of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Findings that make the design invalid.
    pub errors: Vec<Finding>,
    /// Findings that do not.
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    /// Whether there are no errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add a finding by its severity.
    pub fn push(&mut self, finding: Finding) {
        match finding.severity {
            Severity::Error => self.errors.push(finding),
            Severity::Warning => self.warnings.push(finding),
        }
    }

    /// Append every finding of another report.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// All findings, errors first.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.errors.iter().chain(&self.warnings)
    }

    /// Findings of one kind.
    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings().filter(move |f| f.kind == kind)
    }

    fn retain_critical(&mut self) {
        self.errors.retain(|f| f.kind.is_critical());
        self.warnings.retain(|f| f.kind.is_critical());
    }
}

/// Receives every finding a validation run reports.
pub trait RuleObserver {
    /// Called once per reported finding.
    fn on_finding(&self, finding: &Finding);
}

/// Forwards findings to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RuleObserver for TracingObserver {
    fn on_finding(&self, finding: &Finding) {
        tracing::debug!(
            kind = finding.kind.as_str(),
            severity = ?finding.severity,
            symbol = finding.symbol.as_deref().unwrap_or(""),
            "{}",
            finding.message
        );
    }
}

/// Which findings a design validation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Every check.
    #[default]
    Full,
    /// Structural and completeness findings only; format and sequence
    /// findings are dropped.
    CriticalOnly,
}

// =============================================================================
// Symbol format
// =============================================================================

fn is_upper_letters(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_uppercase())
}

fn numeric_suffix<'a>(symbol: &'a str, prefix: &str) -> Option<&'a str> {
    symbol
        .strip_prefix(prefix)
        .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

fn is_ansi_change_key(symbol: &str) -> bool {
    let letters = symbol
        .bytes()
        .take_while(u8::is_ascii_uppercase)
        .count();
    let digits = &symbol[letters..];
    (2..=3).contains(&letters) && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Check an ANSI/BHMA symbol at a tier, 0 = top, 3 or more = change key.
///
/// Every occurrence of a restricted letter is reported with its position.
#[must_use]
pub fn validate_ansi_key_symbol(symbol: &str, level: u32) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (position, letter) in symbol.chars().enumerate() {
        if RESTRICTED_LETTERS.contains(&letter) {
            let mut finding = Finding::error(
                FindingKind::RestrictedLetter,
                format!(
                    "ANSI/BHMA prohibits the letter {letter} in key symbols ({symbol}, position {})",
                    position + 1
                ),
            )
            .symbol(symbol)
            .actual(letter.to_string());
            finding.position = Some(position);
            report.push(finding);
        }
    }

    match level {
        0 => {
            if !is_upper_letters(symbol, 1) {
                report.push(
                    Finding::error(
                        FindingKind::InvalidTopLevelFormat,
                        "ANSI/BHMA top-level master must be a single letter (e.g., A)",
                    )
                    .symbol(symbol)
                    .expected("Single letter A-Z")
                    .actual(symbol),
                );
            }
        }
        1 => {
            if is_upper_letters(symbol, 2) {
                let bytes = symbol.as_bytes();
                if bytes[0].abs_diff(bytes[1]) > 10 {
                    report.push(
                        Finding::warning(
                            FindingKind::UnusualPairing,
                            format!(
                                "Unusual letter pairing \"{symbol}\". Standard practice uses consecutive letters (AA, AB, AC)"
                            ),
                        )
                        .symbol(symbol),
                    );
                }
            } else {
                report.push(
                    Finding::error(
                        FindingKind::InvalidLevel1Format,
                        "ANSI/BHMA level 1 master must be two letters (e.g., AA, AB)",
                    )
                    .symbol(symbol)
                    .expected("Two letters")
                    .actual(symbol),
                );
            }
        }
        2 => {
            if !is_upper_letters(symbol, 3) {
                report.push(
                    Finding::error(
                        FindingKind::InvalidLevel2Format,
                        "ANSI/BHMA level 2 keys must be three letters (e.g., AAA, AAB)",
                    )
                    .symbol(symbol)
                    .expected("Three letters")
                    .actual(symbol),
                );
            }
        }
        _ => {
            if !is_ansi_change_key(symbol) {
                report.push(
                    Finding::error(
                        FindingKind::InvalidChangeKeyFormat,
                        "ANSI/BHMA change key must be letters followed by numbers (e.g., AA1, AAA1)",
                    )
                    .symbol(symbol)
                    .expected("[Letters][Numbers]")
                    .actual(symbol),
                );
            }
        }
    }

    report
}

/// Check an EN 1303 symbol at a tier, 0 = top, 3 or more = change key.
#[must_use]
pub fn validate_en_key_symbol(symbol: &str, level: u32) -> ValidationReport {
    let mut report = ValidationReport::default();

    let (valid, kind, message, expected) = match level {
        0 => (
            symbol == "GMK",
            FindingKind::InvalidGmkSymbol,
            "EN 1303 requires the General Master Key to use symbol \"GMK\"",
            "GMK",
        ),
        1 => (
            numeric_suffix(symbol, "MK-").is_some(),
            FindingKind::InvalidMkFormat,
            "EN 1303 master key must follow format \"MK-X\" (e.g., MK-1, MK-2)",
            "MK-[number]",
        ),
        2 => (
            numeric_suffix(symbol, "SK-").is_some(),
            FindingKind::InvalidSkFormat,
            "EN 1303 sub-key must follow format \"SK-X\" (e.g., SK-1, SK-2)",
            "SK-[number]",
        ),
        _ => (
            numeric_suffix(symbol, "CK-").is_some_and(|digits| digits.len() >= 3),
            FindingKind::InvalidCkFormat,
            "EN 1303 change key must follow format \"CK-XXX\" (e.g., CK-101, CK-201)",
            "CK-[3+ digits]",
        ),
    };

    if !valid {
        report.push(
            Finding::error(kind, message)
                .symbol(symbol)
                .expected(expected)
                .actual(symbol),
        );
    }

    report
}

/// Check a symbol against the grammar of a standard.
#[must_use]
pub fn validate_key_symbol(standard: StandardId, symbol: &str, level: u32) -> ValidationReport {
    match standard {
        StandardId::AnsiBhma => validate_ansi_key_symbol(symbol, level),
        StandardId::En1303 => validate_en_key_symbol(symbol, level),
    }
}

// =============================================================================
// Sequences
// =============================================================================

/// A key considered by the sequence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRef<'a> {
    /// Key symbol.
    pub symbol: &'a str,
    /// Tier, 0 = top.
    pub level: u32,
    /// KD or KA for assignment symbols; `None` for hierarchy levels.
    pub key_type: Option<KeyType>,
}

fn design_keys<'a>(
    hierarchies: &'a [HierarchyLevel],
    assignments: &'a [Assignment],
) -> Vec<KeyRef<'a>> {
    hierarchies
        .iter()
        .map(|h| KeyRef {
            symbol: &h.key_symbol,
            level: h.order,
            key_type: None,
        })
        .chain(assignments.iter().map(|a| KeyRef {
            symbol: &a.key_symbol,
            level: CHANGE_KEY_LEVEL,
            key_type: Some(a.key_type()),
        }))
        .collect()
}

/// Flag numbering gaps. Only ever produces warnings.
///
/// EN masters should run `MK-1, MK-2, ...`; keyed-differ change keys under
/// master `n` should run `CK-n01, CK-n02, ...`. ANSI tier-1 keys should use
/// consecutive second letters.
#[must_use]
pub fn validate_key_sequence(keys: &[KeyRef<'_>], standard: StandardId) -> ValidationReport {
    let mut report = ValidationReport::default();

    match standard {
        StandardId::En1303 => {
            let mut masters: Vec<(u64, &str)> = keys
                .iter()
                .filter_map(|k| {
                    let n = numeric_suffix(k.symbol, "MK-")?.parse().ok()?;
                    Some((n, k.symbol))
                })
                .collect();
            masters.sort_unstable();

            for (i, (actual, symbol)) in masters.iter().enumerate() {
                let expected = i as u64 + 1;
                if *actual != expected {
                    report.push(
                        Finding::warning(
                            FindingKind::SequenceGap,
                            format!(
                                "EN 1303 recommends sequential numbering. Expected MK-{expected}, found {symbol}"
                            ),
                        )
                        .symbol(symbol)
                        .expected(format!("MK-{expected}"))
                        .actual(*symbol),
                    );
                }
            }

            let change_keys: BTreeSet<u64> = keys
                .iter()
                .filter(|k| k.key_type == Some(KeyType::KeyedDiffer))
                .filter_map(|k| numeric_suffix(k.symbol, "CK-")?.parse().ok())
                .collect();
            let mut by_master: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
            for number in change_keys {
                by_master.entry(number / 100).or_default().push(number);
            }

            for (master, numbers) in by_master {
                let start = master * 100 + 1;
                for (i, actual) in numbers.iter().enumerate() {
                    let expected = start + i as u64;
                    if *actual != expected {
                        let symbol = format!("CK-{actual:03}");
                        report.push(
                            Finding::warning(
                                FindingKind::ChangeKeyGap,
                                format!(
                                    "Change key numbering gap under MK-{master}. Expected CK-{expected:03}, found {symbol}"
                                ),
                            )
                            .symbol(&symbol)
                            .expected(format!("CK-{expected:03}"))
                            .actual(symbol.clone()),
                        );
                    }
                }
            }
        }
        StandardId::AnsiBhma => {
            let mut level1: Vec<&str> = keys
                .iter()
                .filter(|k| k.level == 1 && is_upper_letters(k.symbol, 2))
                .map(|k| k.symbol)
                .collect();
            level1.sort_unstable();
            level1.dedup();

            for pair in level1.windows(2) {
                let (prev, curr) = (pair[0].as_bytes(), pair[1].as_bytes());
                let next = prev[1] + 1;
                if curr[1] != next {
                    let expected = format!("{}{}", char::from(prev[0]), char::from(next));
                    report.push(
                        Finding::warning(
                            FindingKind::LetterSequenceGap,
                            format!(
                                "ANSI/BHMA recommends consecutive letters. After {}, expected {expected}, found {}",
                                pair[0], pair[1]
                            ),
                        )
                        .symbol(pair[1])
                        .expected(expected)
                        .actual(pair[1]),
                    );
                }
            }
        }
    }

    report
}

// =============================================================================
// Depth
// =============================================================================

/// Tiers in a hierarchy including the implied change-key tier: the deepest
/// order plus two. An empty hierarchy has depth 0.
#[must_use]
pub fn hierarchy_depth(hierarchies: &[HierarchyLevel]) -> u32 {
    hierarchies
        .iter()
        .map(|h| h.order)
        .max()
        .map_or(0, |deepest| deepest + 2)
}

/// Check a depth against the standard's bounds and the facility's band.
#[must_use]
pub fn validate_hierarchy_depth(
    depth: u32,
    standard: StandardId,
    facility_type: FacilityType,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    let config = get_standard(standard);
    let limits = config.depth_limits();

    if depth < limits.min {
        report.push(
            Finding::error(
                FindingKind::InsufficientDepth,
                format!(
                    "{} requires at least {} hierarchy levels",
                    config.name, limits.min
                ),
            )
            .measured(u64::from(depth), u64::from(limits.min)),
        );
    }

    if depth > limits.max {
        let finding = if limits.max_is_hard {
            Finding::error(
                FindingKind::ExceedsMaximumDepth,
                format!(
                    "{} practical limit is {} hierarchy levels",
                    config.name, limits.max
                ),
            )
        } else {
            Finding::warning(
                FindingKind::ExcessiveDepth,
                format!(
                    "{} typically uses {}-{} hierarchy levels. More than {} levels may complicate system management",
                    config.name, limits.min, limits.max, limits.max
                ),
            )
        };
        report.push(finding.measured(u64::from(depth), u64::from(limits.max)));
    }

    let band = facility_type.depth_band();
    if depth < band.min {
        report.push(
            Finding::warning(
                FindingKind::BelowFacilityMinimum,
                format!(
                    "{facility_type} facilities typically require at least {} levels",
                    band.min
                ),
            )
            .expected(band.optimal.to_string())
            .measured(u64::from(depth), u64::from(band.min)),
        );
    }
    if depth > band.max {
        report.push(
            Finding::warning(
                FindingKind::AboveFacilityMaximum,
                format!(
                    "{facility_type} facilities rarely need more than {} levels",
                    band.max
                ),
            )
            .expected(band.optimal.to_string())
            .measured(u64::from(depth), u64::from(band.max)),
        );
    }

    report
}

// =============================================================================
// Pairing
// =============================================================================

fn pairing_error(parent: &str, child: &str) -> Finding {
    Finding::error(
        FindingKind::InvalidParentChildPairing,
        format!("ANSI/BHMA requires child key {child} to start with parent symbol {parent}"),
    )
    .symbol(child)
    .expected(format!("{parent}[letter/number]"))
    .actual(child)
}

/// ANSI only: every child symbol must start with its parent's symbol.
///
/// Applies to hierarchy levels and to change keys under their master.
#[must_use]
pub fn validate_master_key_pairing(
    hierarchies: &[HierarchyLevel],
    assignments: &[Assignment],
    standard: StandardId,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    if standard != StandardId::AnsiBhma {
        return report;
    }

    let by_id: HashMap<HierarchyId, &HierarchyLevel> =
        hierarchies.iter().map(|h| (h.id, h)).collect();

    for level in hierarchies {
        if let Some(parent) = level.parent_id.and_then(|id| by_id.get(&id)) {
            if !level.key_symbol.starts_with(&parent.key_symbol) {
                report.push(pairing_error(&parent.key_symbol, &level.key_symbol));
            }
        }
    }

    let mut seen = HashSet::new();
    for assignment in assignments {
        if let Some(master) = by_id.get(&assignment.hierarchy_id) {
            if !assignment.key_symbol.starts_with(&master.key_symbol)
                && seen.insert(assignment.key_symbol.as_str())
            {
                report.push(pairing_error(&master.key_symbol, &assignment.key_symbol));
            }
        }
    }

    report
}

// =============================================================================
// Entry points
// =============================================================================

fn compliance(
    hierarchies: &[HierarchyLevel],
    assignments: &[Assignment],
    standard: StandardId,
    facility_type: FacilityType,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    let keys = design_keys(hierarchies, assignments);

    let mut checked = HashSet::new();
    for key in &keys {
        if checked.insert((key.symbol, key.level)) {
            report.merge(validate_key_symbol(standard, key.symbol, key.level));
        }
    }

    report.merge(validate_key_sequence(&keys, standard));
    report.merge(validate_hierarchy_depth(
        hierarchy_depth(hierarchies),
        standard,
        facility_type,
    ));
    report.merge(validate_master_key_pairing(hierarchies, assignments, standard));
    report
}

fn notify(report: &ValidationReport, observer: &dyn RuleObserver) {
    for finding in report.findings() {
        observer.on_finding(finding);
    }
}

/// Run every standards check over a hierarchy and its assignments.
///
/// Symbols shared by several assignments (keyed-alike members) are checked
/// once.
#[must_use]
pub fn validate_standards_compliance(
    hierarchies: &[HierarchyLevel],
    assignments: &[Assignment],
    standard: StandardId,
    facility_type: FacilityType,
    observer: &dyn RuleObserver,
) -> ValidationReport {
    let report = compliance(hierarchies, assignments, standard, facility_type);
    notify(&report, observer);
    report
}

/// Validate a whole design: completeness first, then standards compliance.
#[must_use]
pub fn validate_design(
    design: &DesignSnapshot<'_>,
    standard: StandardId,
    facility_type: FacilityType,
    mode: ValidationMode,
    observer: &dyn RuleObserver,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    let assigned: HashSet<_> = design.assignments.iter().map(|a| &a.door_id).collect();
    let unassigned = design
        .doors
        .iter()
        .filter(|d| !assigned.contains(&d.id))
        .count();
    if unassigned > 0 {
        report.push(
            Finding::error(
                FindingKind::UnassignedDoors,
                format!("{unassigned} doors not assigned to any key"),
            )
            .measured(unassigned as u64, 0),
        );
    }

    let used = differs_used(design.hierarchies, design.assignments);
    let max = get_standard(standard).max_differs;
    if used > max {
        report.push(
            Finding::error(
                FindingKind::ExceedsDiffers,
                format!("Design exceeds available differs: {used} > {max}"),
            )
            .measured(used, max),
        );
    }

    if design.hierarchies.is_empty() {
        report.push(Finding::error(
            FindingKind::NoHierarchy,
            "No hierarchy levels defined",
        ));
    }

    report.merge(compliance(
        design.hierarchies,
        design.assignments,
        standard,
        facility_type,
    ));

    if mode == ValidationMode::CriticalOnly {
        report.retain_critical();
    }

    notify(&report, observer);

    tracing::debug!(
        standard = %standard,
        mode = ?mode,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Validated design"
    );

    report
}
