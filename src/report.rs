//! # Analysis Report Module
//!
//! This module defines the terminal artifact of the pipeline: a structured,
//! confidence-scored report of one prescription analysis. A report is created
//! once per invocation and never mutated after construction; failures below
//! the invocation gate are represented as a status field inside the same
//! structure, never as a raised fault.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::classifier::ClassificationResult;
use crate::ocr::OCR_ENGINE_NAME;

/// Label for the medications section
pub const MEDICATIONS_LABEL: &str = "Identified Medications";
/// Label for the dosages section
pub const DOSAGES_LABEL: &str = "Dosage Information";
/// Label for the instructions section
pub const INSTRUCTIONS_LABEL: &str = "Usage Instructions";
/// Label for the analysis summary section
pub const ANALYSIS_LABEL: &str = "Analysis Summary";
/// Label for the warnings section
pub const WARNINGS_LABEL: &str = "Important Notes";

/// Fixed disclaimer warnings attached to every successful report
pub const DISCLAIMER_WARNINGS: [&str; 3] = [
    "This is an automated analysis and may contain errors",
    "Always consult with healthcare provider before taking medications",
    "Verify all medication names and dosages with original prescription",
];

/// Processing status of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Success,
    Error,
}

/// A labeled category list with its entry count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledList {
    pub label: String,
    pub data: Vec<String>,
    pub count: usize,
}

impl LabeledList {
    fn new(label: &str, data: Vec<String>) -> Self {
        let count = data.len();
        Self {
            label: label.to_string(),
            data,
            count,
        }
    }
}

/// The human-readable analysis summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub label: String,
    pub data: String,
}

/// The fixed disclaimer warning list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningNotes {
    pub label: String,
    pub data: Vec<String>,
}

/// Processing metadata attached to successful reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingInfo {
    pub text_length: usize,
    pub processing_time: String,
    pub ocr_engine: String,
}

/// The terminal artifact of one prescription analysis
///
/// Serialized as a pretty-printed JSON object with stable field names.
/// Optional sections are omitted from error reports rather than emitted as
/// nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub timestamp: String,
    pub processing_status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "extractedText", skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<LabeledList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosages: Option<LabeledList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<LabeledList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<WarningNotes>,
    #[serde(rename = "processingInfo", skip_serializing_if = "Option::is_none")]
    pub processing_info: Option<ProcessingInfo>,
}

impl AnalysisReport {
    /// Assemble a successful report from classification output and metadata
    pub fn success(
        file_name: &str,
        extracted_text: String,
        classification: ClassificationResult,
        elapsed: Duration,
    ) -> Self {
        let text_length = extracted_text.len();
        let analysis = compose_summary(&classification);

        Self {
            file_name: file_name.to_string(),
            timestamp: current_timestamp(),
            processing_status: ProcessingStatus::Success,
            confidence: Some(classification.confidence),
            error: None,
            message: None,
            extracted_text: Some(extracted_text),
            medications: Some(LabeledList::new(MEDICATIONS_LABEL, classification.medications)),
            dosages: Some(LabeledList::new(DOSAGES_LABEL, classification.dosages)),
            instructions: Some(LabeledList::new(
                INSTRUCTIONS_LABEL,
                classification.instructions,
            )),
            analysis: Some(AnalysisSummary {
                label: ANALYSIS_LABEL.to_string(),
                data: analysis,
            }),
            warnings: Some(WarningNotes {
                label: WARNINGS_LABEL.to_string(),
                data: DISCLAIMER_WARNINGS.iter().map(|w| w.to_string()).collect(),
            }),
            processing_info: Some(ProcessingInfo {
                text_length,
                processing_time: format_elapsed(elapsed),
                ocr_engine: OCR_ENGINE_NAME.to_string(),
            }),
        }
    }

    /// Report for an input that exists but cannot be decoded as an image
    ///
    /// No partial report fields are populated, including confidence.
    pub fn decode_error(file_name: &str, error: String) -> Self {
        Self::bare_error(file_name, error, None, None)
    }

    /// Report for an extraction that produced no text at all
    ///
    /// Carries confidence 0.0 and a message distinguishing it from a decode
    /// failure. The classifier is never invoked for this case.
    pub fn empty_extraction(file_name: &str) -> Self {
        Self::bare_error(
            file_name,
            "No text could be extracted from the image".to_string(),
            Some(0.0),
            None,
        )
    }

    /// Report for any other internal fault during analysis
    pub fn internal_error(file_name: &str, error: String) -> Self {
        Self::bare_error(
            file_name,
            error,
            None,
            Some("Failed to analyze prescription image".to_string()),
        )
    }

    fn bare_error(
        file_name: &str,
        error: String,
        confidence: Option<f64>,
        message: Option<String>,
    ) -> Self {
        Self {
            file_name: file_name.to_string(),
            timestamp: current_timestamp(),
            processing_status: ProcessingStatus::Error,
            confidence,
            error: Some(error),
            message,
            extracted_text: None,
            medications: None,
            dosages: None,
            instructions: None,
            analysis: None,
            warnings: None,
            processing_info: None,
        }
    }
}

/// Compose the one-paragraph summary: category counts when non-zero, then the
/// fixed disclaimer clause
fn compose_summary(classification: &ClassificationResult) -> String {
    let mut summary = String::from("Prescription analysis completed. ");
    if !classification.medications.is_empty() {
        summary.push_str(&format!(
            "Identified {} medication(s). ",
            classification.medications.len()
        ));
    }
    if !classification.dosages.is_empty() {
        summary.push_str(&format!(
            "Found {} dosage instruction(s). ",
            classification.dosages.len()
        ));
    }
    summary.push_str("Please verify all information with healthcare provider.");
    summary
}

/// Current local time in RFC 3339 format
fn current_timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

/// Format elapsed wall time as a display string
fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}
