#[cfg(test)]
mod tests {
    use rxscan::analyzer::analyze_prescription;
    use rxscan::config::AppConfig;
    use rxscan::report::ProcessingStatus;
    use std::io::Write;

    #[test]
    fn test_unreadable_image_produces_error_report() {
        let config = AppConfig::default();

        let mut file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file");
        file.write_all(b"corrupted bytes, not an image")
            .expect("write data");
        let path = file.path().to_string_lossy().to_string();

        let report = analyze_prescription(&path, &config);

        assert_eq!(report.processing_status, ProcessingStatus::Error);
        assert!(report.error.is_some());
        // No partial report fields on decode failure
        assert!(report.confidence.is_none());
        assert!(report.extracted_text.is_none());
        assert!(report.medications.is_none());
        assert!(report.dosages.is_none());
        assert!(report.instructions.is_none());
        assert!(report.processing_info.is_none());
    }

    #[test]
    fn test_missing_image_produces_error_report() {
        let config = AppConfig::default();
        let report = analyze_prescription("/no/such/scan.png", &config);

        assert_eq!(report.processing_status, ProcessingStatus::Error);
        assert_eq!(report.file_name, "scan.png");
        assert!(report.error.is_some());
    }

    #[test]
    fn test_empty_file_produces_error_report() {
        let config = AppConfig::default();
        let file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file");
        let path = file.path().to_string_lossy().to_string();

        let report = analyze_prescription(&path, &config);

        assert_eq!(report.processing_status, ProcessingStatus::Error);
        assert!(report.error.is_some());
    }

    #[test]
    fn test_oversized_file_produces_error_report() {
        let mut config = AppConfig::default();
        config.ocr.max_file_size = 16;

        let img = image::GrayImage::new(64, 64);
        let file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file");
        let path = file.path().to_string_lossy().to_string();
        img.save(&path).expect("save png");

        let report = analyze_prescription(&path, &config);

        assert_eq!(report.processing_status, ProcessingStatus::Error);
        let error = report.error.expect("error message");
        assert!(error.contains("too large"));
    }

    #[test]
    fn test_error_report_serializes_with_error_status() {
        let config = AppConfig::default();
        let report = analyze_prescription("/no/such/scan.png", &config);

        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["processing_status"], "error");
        assert!(value.get("extractedText").is_none());
    }
}
