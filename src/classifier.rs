//! # Medical Entity Classifier Module
//!
//! This module scans raw OCR output for medical information using a
//! prioritized set of lexical patterns, partitioning text fragments into
//! medications, dosage instructions and usage directions.
//!
//! ## Features
//!
//! - Ordered pattern rules per category (dosage-form cues, drug-name suffix
//!   patterns, a closed list of well-known drug names, numeric/temporal
//!   dosage patterns)
//! - Keyword-based per-line instruction detection
//! - Deduplication and per-category caps on all result lists
//! - Coverage-heuristic confidence scoring
//! - Pattern tables loadable from JSON so the rule set can be extended
//!   without touching matcher logic
//!
//! OCR output has no guaranteed grammar, so this is a best-effort lexical
//! pass: all matching rules contribute candidates and overlapping matches are
//! only collapsed by the final dedup.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};

/// Maximum number of entries retained per result category
pub const MAX_CATEGORY_ENTRIES: usize = 10;
/// Minimum character count for a medication candidate (post-trim)
pub const MIN_MEDICATION_LEN: usize = 3;
/// Minimum character count for an instruction line (post-trim)
pub const MIN_INSTRUCTION_LEN: usize = 6;
/// Base confidence for any extracted text
pub const BASE_CONFIDENCE: f64 = 0.3;
/// Confidence ceiling
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Category tag carried by a pattern rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    /// Medication name extraction
    Medication,
    /// Dosage instruction extraction
    Dosage,
}

/// A pattern matcher plus its category tag
///
/// Rules are stored as an ordered list per category. Order is a coverage
/// mechanism rather than a priority hierarchy: every matching rule contributes
/// candidates to its category.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Regular expression source for the matcher
    pub pattern: String,
    /// Result category this rule feeds
    pub category: RuleCategory,
}

/// A pattern rule with its compiled matcher
struct CompiledRule {
    rule: PatternRule,
    regex: Regex,
}

/// Classification output: three deduplicated, length-capped category lists
/// plus a coverage-based confidence score
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// Identified medication name candidates
    pub medications: Vec<String>,
    /// Identified dosage instruction candidates
    pub dosages: Vec<String>,
    /// Lines recognized as usage instructions
    pub instructions: Vec<String>,
    /// Confidence score in [0.0, 0.95]
    pub confidence: f64,
}

/// Pattern tables configuration loaded from JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PatternTables {
    /// Ordered medication extraction patterns
    pub medication_patterns: Vec<String>,
    /// Ordered dosage extraction patterns
    pub dosage_patterns: Vec<String>,
    /// Keywords marking a line as a usage instruction
    pub instruction_keywords: Vec<String>,
}

impl Default for PatternTables {
    fn default() -> Self {
        Self {
            medication_patterns: vec![
                // Dosage-form keyword followed by a name fragment
                r"(?i)(tablet|capsule|syrup|injection|mg|ml|drops?)\s*:?\s*([A-Za-z\s]+)"
                    .to_string(),
                // Common drug-name suffixes plus a few specific generic names
                r"(?i)([A-Za-z]+(?:cillin|mycin|prazole|metformin|atenolol|amlodipine))"
                    .to_string(),
                // Well-known drug names
                r"(?i)(paracetamol|ibuprofen|aspirin|metformin|atorvastatin)".to_string(),
            ],
            dosage_patterns: vec![
                // Quantity + unit
                r"(\d+)\s*(mg|ml|g|mcg)".to_string(),
                // Frequency by multiplication (N x M)
                r"(\d+)\s*x\s*(\d+)".to_string(),
                // Frequency by time word
                r"(\d+)\s*times?\s*(daily|day|week)".to_string(),
                // Meal-relative timing
                r"(morning|evening|night|bedtime|before|after)\s*(meal|food)".to_string(),
            ],
            instruction_keywords: vec![
                "take", "apply", "use", "before", "after", "with", "without", "daily", "twice",
                "morning", "evening",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl PatternTables {
    /// Validate the pattern tables
    pub fn validate(&self) -> AppResult<()> {
        if self.medication_patterns.is_empty() {
            return Err(AppError::Config(
                "medication_patterns cannot be empty".to_string(),
            ));
        }
        if self.dosage_patterns.is_empty() {
            return Err(AppError::Config(
                "dosage_patterns cannot be empty".to_string(),
            ));
        }
        if self.instruction_keywords.is_empty() {
            return Err(AppError::Config(
                "instruction_keywords cannot be empty".to_string(),
            ));
        }

        let validate_patterns = |patterns: &[String], category: &str| -> AppResult<()> {
            for (i, pattern) in patterns.iter().enumerate() {
                if pattern.trim().is_empty() {
                    return Err(AppError::Config(format!(
                        "{}[{}] cannot be empty",
                        category, i
                    )));
                }
                if Regex::new(pattern).is_err() {
                    return Err(AppError::Config(format!(
                        "{}[{}] '{}' is not a valid regex",
                        category, i, pattern
                    )));
                }
            }
            Ok(())
        };

        validate_patterns(&self.medication_patterns, "medication_patterns")?;
        validate_patterns(&self.dosage_patterns, "dosage_patterns")?;

        for (i, keyword) in self.instruction_keywords.iter().enumerate() {
            if keyword.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "instruction_keywords[{}] cannot be empty",
                    i
                )));
            }
        }

        Ok(())
    }

    /// Flatten the tables into the ordered, category-tagged rule list
    pub fn to_rules(&self) -> Vec<PatternRule> {
        let mut rules = Vec::new();
        for pattern in &self.medication_patterns {
            rules.push(PatternRule {
                pattern: pattern.clone(),
                category: RuleCategory::Medication,
            });
        }
        for pattern in &self.dosage_patterns {
            rules.push(PatternRule {
                pattern: pattern.clone(),
                category: RuleCategory::Dosage,
            });
        }
        rules
    }
}

/// Load pattern tables from JSON configuration
///
/// Tries `MEDICAL_PATTERNS_CONFIG_PATH` first, then a set of conventional
/// locations, and falls back to the compiled-in defaults with a warning. A
/// table that loads but fails validation is also rejected in favor of the
/// defaults, so a broken config file cannot disable classification.
pub fn load_pattern_tables() -> PatternTables {
    let mut candidate_paths: Vec<String> = Vec::new();
    if let Ok(config_path) = std::env::var("MEDICAL_PATTERNS_CONFIG_PATH") {
        candidate_paths.push(config_path);
    }
    candidate_paths.extend(
        [
            "/app/config/medical_patterns.json",
            "config/medical_patterns.json",
            "../config/medical_patterns.json",
        ]
        .iter()
        .map(|p| p.to_string()),
    );

    for config_path in &candidate_paths {
        match fs::read_to_string(config_path) {
            Ok(content) => match serde_json::from_str::<PatternTables>(&content) {
                Ok(tables) => match tables.validate() {
                    Ok(()) => {
                        info!("Loaded medical pattern tables from: {}", config_path);
                        return tables;
                    }
                    Err(e) => {
                        warn!(
                            "Pattern tables at '{}' failed validation: {}. Trying next path.",
                            config_path, e
                        );
                    }
                },
                Err(e) => {
                    warn!(
                        "Failed to parse pattern tables at '{}': {}. Trying next path.",
                        config_path, e
                    );
                }
            },
            Err(_) => continue,
        }
    }

    warn!("No medical pattern tables config found in any expected location. Using built-in defaults.");
    PatternTables::default()
}

lazy_static! {
    static ref DEFAULT_TABLES: PatternTables = load_pattern_tables();
}

/// Medical entity classifier over raw extracted text
pub struct MedicalClassifier {
    /// Compiled rules in table order (medication rules before dosage rules)
    rules: Vec<CompiledRule>,
    /// Lowercase keywords marking instruction lines
    instruction_keywords: Vec<String>,
}

impl MedicalClassifier {
    /// Create a classifier from the default (or configured) pattern tables
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_tables(DEFAULT_TABLES.clone())
    }

    /// Create a classifier from explicit pattern tables
    ///
    /// # Arguments
    ///
    /// * `tables` - Pattern tables to compile; rule order is preserved
    pub fn with_tables(tables: PatternTables) -> Result<Self, regex::Error> {
        let mut rules = Vec::new();
        for rule in tables.to_rules() {
            let regex = Regex::new(&rule.pattern)?;
            rules.push(CompiledRule { rule, regex });
        }

        let instruction_keywords = tables
            .instruction_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .collect();

        debug!(
            "Compiled medical classifier with {} pattern rules and {} instruction keywords",
            rules.len(),
            tables.instruction_keywords.len()
        );

        Ok(Self {
            rules,
            instruction_keywords,
        })
    }

    /// The ordered pattern rules this classifier applies
    pub fn rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    /// Classify raw extracted text into medications, dosages and instructions
    ///
    /// Every rule is matched against the full text; each match contributes one
    /// or more candidate strings. Candidate lists are deduplicated (exact
    /// post-trim match) and capped at [`MAX_CATEGORY_ENTRIES`] entries; element
    /// order after capping carries no meaning. The confidence score is a pure
    /// function of which categories are non-empty.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let mut medications: Vec<String> = Vec::new();
        let mut dosages: Vec<String> = Vec::new();

        for compiled in &self.rules {
            match compiled.rule.category {
                RuleCategory::Medication => {
                    // Every captured non-empty group is a separate candidate
                    for caps in compiled.regex.captures_iter(text) {
                        for group in caps.iter().skip(1).flatten() {
                            let candidate = group.as_str().trim();
                            if candidate.chars().count() >= MIN_MEDICATION_LEN {
                                medications.push(candidate.to_string());
                            }
                        }
                    }
                }
                RuleCategory::Dosage => {
                    // Captured groups joined into one candidate string
                    for caps in compiled.regex.captures_iter(text) {
                        let parts: Vec<&str> = caps
                            .iter()
                            .skip(1)
                            .flatten()
                            .map(|m| m.as_str().trim())
                            .collect();
                        if !parts.is_empty() {
                            dosages.push(parts.join(" "));
                        }
                    }
                }
            }
        }

        // Instructions are detected per line, not per pattern
        let mut instructions: Vec<String> = Vec::new();
        for line in text.lines() {
            let line_lower = line.to_lowercase();
            if self
                .instruction_keywords
                .iter()
                .any(|keyword| line_lower.contains(keyword.as_str()))
            {
                let trimmed = line.trim();
                if trimmed.chars().count() >= MIN_INSTRUCTION_LEN {
                    instructions.push(trimmed.to_string());
                }
            }
        }

        let medications = dedupe_and_cap(medications, MAX_CATEGORY_ENTRIES);
        let dosages = dedupe_and_cap(dosages, MAX_CATEGORY_ENTRIES);
        let instructions = dedupe_and_cap(instructions, MAX_CATEGORY_ENTRIES);

        let confidence = coverage_confidence(
            !medications.is_empty(),
            !dosages.is_empty(),
            !instructions.is_empty(),
        );

        debug!(
            medications = medications.len(),
            dosages = dosages.len(),
            instructions = instructions.len(),
            confidence,
            "Classification completed"
        );

        ClassificationResult {
            medications,
            dosages,
            instructions,
            confidence,
        }
    }
}

/// Remove exact duplicates (first occurrence kept) and cap the list length
fn dedupe_and_cap(candidates: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut deduped: Vec<String> = candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.clone()))
        .collect();
    deduped.truncate(cap);
    deduped
}

/// Coverage-heuristic confidence: rewards breadth of category hits, not
/// per-hit certainty
fn coverage_confidence(has_medications: bool, has_dosages: bool, has_instructions: bool) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if has_medications {
        confidence += 0.4;
    }
    if has_dosages {
        confidence += 0.2;
    }
    if has_instructions {
        confidence += 0.1;
    }
    let confidence = confidence.min(MAX_CONFIDENCE);
    (confidence * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_classifier() -> MedicalClassifier {
        MedicalClassifier::with_tables(PatternTables::default())
            .expect("default tables should compile")
    }

    #[test]
    fn test_default_tables_are_valid() {
        assert!(PatternTables::default().validate().is_ok());
    }

    #[test]
    fn test_rules_preserve_table_order() {
        let classifier = create_classifier();
        let categories: Vec<RuleCategory> = classifier.rules().map(|r| r.category).collect();
        let first_dosage = categories
            .iter()
            .position(|c| *c == RuleCategory::Dosage)
            .expect("dosage rules present");
        assert!(categories[..first_dosage]
            .iter()
            .all(|c| *c == RuleCategory::Medication));
        assert!(categories[first_dosage..]
            .iter()
            .all(|c| *c == RuleCategory::Dosage));
    }

    #[test]
    fn test_classify_known_drug_name_preserves_case() {
        let classifier = create_classifier();
        let result = classifier.classify("Take Paracetamol 500mg twice daily before food");
        assert!(result.medications.iter().any(|m| m == "Paracetamol"));
    }

    #[test]
    fn test_classify_suffix_pattern() {
        let classifier = create_classifier();
        let result = classifier.classify("prescribed Amoxicillin and Omeprazole for a week");
        assert!(result.medications.iter().any(|m| m == "Amoxicillin"));
        assert!(result.medications.iter().any(|m| m == "Omeprazole"));
    }

    #[test]
    fn test_classify_dosage_quantity_unit() {
        let classifier = create_classifier();
        let result = classifier.classify("Paracetamol 500mg");
        assert!(result.dosages.iter().any(|d| d == "500 mg"));
    }

    #[test]
    fn test_classify_dosage_frequency_patterns() {
        let classifier = create_classifier();
        let result = classifier.classify("2 x 3 and 2 times daily after food");
        assert!(result.dosages.iter().any(|d| d == "2 3"));
        assert!(result.dosages.iter().any(|d| d == "2 daily"));
        assert!(result.dosages.iter().any(|d| d == "after food"));
    }

    #[test]
    fn test_classify_instruction_lines() {
        let classifier = create_classifier();
        let text = "Take one tablet in the morning\nshake well\nok";
        let result = classifier.classify(text);
        assert!(result
            .instructions
            .iter()
            .any(|i| i == "Take one tablet in the morning"));
        // "ok" is below the minimum length, "shake well" has no keyword
        assert!(!result.instructions.iter().any(|i| i == "ok"));
        assert!(!result.instructions.iter().any(|i| i == "shake well"));
    }

    #[test]
    fn test_short_medication_candidates_discarded() {
        let classifier = create_classifier();
        // "mg" alone captures a two-character group that must be dropped
        let result = classifier.classify("mg: ab");
        assert!(result.medications.iter().all(|m| m.chars().count() >= 3));
    }

    #[test]
    fn test_category_lists_are_deduplicated_and_capped() {
        let classifier = create_classifier();
        // 15 distinct quantity+unit pairs, each mentioned twice
        let mut text = String::new();
        for i in 1..=15 {
            text.push_str(&format!("{}mg {}mg\n", i * 10, i * 10));
        }
        let result = classifier.classify(&text);

        assert!(result.dosages.len() <= MAX_CATEGORY_ENTRIES);
        let unique: HashSet<&String> = result.dosages.iter().collect();
        assert_eq!(unique.len(), result.dosages.len());
    }

    #[test]
    fn test_confidence_coverage_levels() {
        assert_eq!(coverage_confidence(false, false, false), 0.3);
        assert_eq!(coverage_confidence(true, false, false), 0.7);
        assert_eq!(coverage_confidence(false, true, false), 0.5);
        assert_eq!(coverage_confidence(false, false, true), 0.4);
        assert_eq!(coverage_confidence(true, true, false), 0.9);
        assert_eq!(coverage_confidence(true, true, true), 0.95);
    }

    #[test]
    fn test_confidence_is_monotone_in_coverage() {
        let none = coverage_confidence(false, false, false);
        let one = coverage_confidence(false, false, true);
        let two = coverage_confidence(false, true, true);
        let all = coverage_confidence(true, true, true);
        assert!(none < one && one < two && two < all);
        assert_eq!(all, MAX_CONFIDENCE);
    }

    #[test]
    fn test_full_scenario_confidence() {
        let classifier = create_classifier();
        let result = classifier.classify("Take Paracetamol 500mg twice daily before food");

        assert!(result.medications.iter().any(|m| m == "Paracetamol"));
        assert!(result.dosages.iter().any(|d| d == "500 mg"));
        assert!(result
            .instructions
            .iter()
            .any(|i| i == "Take Paracetamol 500mg twice daily before food"));
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn test_classifier_is_idempotent() {
        let classifier = create_classifier();
        let text = "Take Amoxicillin 250mg 3 times daily\nuse after meal";

        let first = classifier.classify(text);
        let second = classifier.classify(text);

        let as_sets = |r: &ClassificationResult| {
            (
                r.medications.iter().cloned().collect::<HashSet<_>>(),
                r.dosages.iter().cloned().collect::<HashSet<_>>(),
                r.instructions.iter().cloned().collect::<HashSet<_>>(),
            )
        };
        assert_eq!(as_sets(&first), as_sets(&second));
        assert_eq!(first.confidence, second.confidence);
    }

    #[test]
    fn test_overlapping_rules_collapse_via_dedup() {
        let classifier = create_classifier();
        // "Metformin" is captured by both the dosage-form rule (name fragment
        // after "Tablet:") and the generic-name list
        let result = classifier.classify("Tablet: Metformin 500mg");
        let count = result
            .medications
            .iter()
            .filter(|m| m.as_str() == "Metformin")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_tables_validation_rejects_bad_regex() {
        let tables = PatternTables {
            medication_patterns: vec!["(unclosed".to_string()],
            ..PatternTables::default()
        };
        assert!(tables.validate().is_err());
    }

    #[test]
    fn test_tables_validation_rejects_empty_lists() {
        let tables = PatternTables {
            instruction_keywords: vec![],
            ..PatternTables::default()
        };
        assert!(tables.validate().is_err());
    }
}
