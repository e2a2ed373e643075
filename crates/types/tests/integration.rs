//! Integration tests for types

#[cfg(test)]
mod tests {
    use satdl_types::*;

    #[test]
    fn test_status_report_roundtrip_defaults() {
        let report: StatusReport = serde_json::from_str(r#"{"state":"processing"}"#).unwrap();
        assert_eq!(report.state, LifecycleState::Processing);
        assert!(report.message.is_empty());
        assert!(report.packages.is_empty());
    }

    #[test]
    fn test_ready_report_builder() {
        let report = StatusReport::ready("done", ["PKG-1", "PKG-2"]);
        assert_eq!(report.state, LifecycleState::Ready);
        assert_eq!(report.packages, vec![PackageId::from("PKG-1"), PackageId::from("PKG-2")]);
    }

    #[test]
    fn test_request_id_is_transparent() {
        let id = RequestId::new("REQ-2024-001");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""REQ-2024-001""#);
        assert_eq!(id.to_string(), "REQ-2024-001");
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(
            serde_json::to_string(&DocumentFormat::MetadataOnly).unwrap(),
            r#""metadata_only""#
        );
        assert_eq!(
            serde_json::to_string(&RequestKind::Received).unwrap(),
            r#""received""#
        );
        assert_eq!(serde_json::to_string(&ActivityFilter::Any).unwrap(), r#""any""#);
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Tty);
        assert_eq!(ColorChoice::default(), ColorChoice::Auto);
    }
}
