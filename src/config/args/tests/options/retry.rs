#[cfg(test)]
mod tests {
    use crate::config::args::tests::Fixture;
    use crate::config::args::*;

    #[test]
    fn with_default_value() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();
        let config = build_config_from_args(fixture.args("copy", &[])).unwrap();

        for client_config in [
            config.source_client_config.as_ref().unwrap(),
            config.target_client_config.as_ref().unwrap(),
        ] {
            assert_eq!(client_config.retry_config.aws_max_attempts, 3);
            assert_eq!(
                client_config.retry_config.initial_backoff_milliseconds,
                DEFAULT_INITIAL_BACKOFF_MILLISECONDS
            );
        }
    }

    #[test]
    fn with_custom_value() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();
        let config = build_config_from_args(fixture.args(
            "copy",
            &["--retries", "0", "--initial-backoff-milliseconds", "500"],
        ))
        .unwrap();

        let retry_config = &config.target_client_config.as_ref().unwrap().retry_config;
        assert_eq!(retry_config.aws_max_attempts, 1);
        assert_eq!(retry_config.initial_backoff_milliseconds, 500);
    }

    #[test]
    fn with_invalid_value() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();

        assert!(parse_from_args(fixture.args("copy", &["--retries", "-1"])).is_err());
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
