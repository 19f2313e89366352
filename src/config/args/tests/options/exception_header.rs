#[cfg(test)]
mod tests {
    use crate::config::args::tests::Fixture;
    use crate::config::args::*;

    #[test]
    fn with_default_value() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();
        let config = build_config_from_args(fixture.args("audit", &[])).unwrap();

        assert!(config.exception_headers.is_empty());
        assert!(config.exception_set().contains("x-trans-id"));
    }

    #[test]
    fn with_repeated_value() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();
        let config = build_config_from_args(fixture.args(
            "audit",
            &[
                "--exception-header",
                "X-Object-Meta-Promise",
                "--exception-header",
                "x-object-meta-project,content-length",
            ],
        ))
        .unwrap();

        assert_eq!(
            config.exception_headers,
            vec![
                "x-object-meta-promise".to_string(),
                "x-object-meta-project".to_string(),
                "content-length".to_string(),
            ]
        );

        let exceptions = config.exception_set();
        assert!(exceptions.contains("x-object-meta-promise"));
        assert!(exceptions.contains("content-length"));
        assert!(exceptions.contains("date"));
        assert!(!exceptions.contains("content-type"));
    }

    #[test]
    fn with_invalid_value() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();

        assert!(
            parse_from_args(fixture.args("audit", &["--exception-header", "x object"])).is_err()
        );
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
