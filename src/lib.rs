//! # rxscan
//!
//! A prescription-scan analysis pipeline: ingests a photograph of a
//! handwritten or printed medical prescription, extracts machine-readable
//! text via OCR and classifies fragments of that text into medication names,
//! dosage instructions and usage directions, producing a structured,
//! confidence-scored JSON report with a bounded on-disk history.

pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod history;
pub mod ocr;
pub mod preprocessing;
pub mod report;

// Re-export types for easier access
pub use analyzer::analyze_prescription;
pub use classifier::{ClassificationResult, MedicalClassifier, PatternRule, PatternTables};
pub use config::{AppConfig, OcrConfig};
pub use report::{AnalysisReport, ProcessingStatus};
