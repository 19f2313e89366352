#[cfg(test)]
mod tests {
    use crate::config::args::tests::Fixture;
    use crate::config::args::*;

    #[test]
    fn with_default_value() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();
        let config = build_config_from_args(fixture.args("copy", &[])).unwrap();

        assert_eq!(
            config.transfer_config.segment_size,
            5 * 1024 * 1024 * 1024
        );
    }

    #[test]
    fn with_custom_value() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();
        let config =
            build_config_from_args(fixture.args("copy", &["--segment-size", "64MiB"])).unwrap();

        assert_eq!(config.transfer_config.segment_size, 64 * 1024 * 1024);
        assert!(
            config
                .transfer_config
                .is_segmented_upload_required(64 * 1024 * 1024)
        );
    }

    #[test]
    fn with_invalid_value() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();

        assert!(parse_from_args(fixture.args("copy", &["--segment-size", "1MiB"])).is_err());
        assert!(parse_from_args(fixture.args("copy", &["--segment-size", "6GiB"])).is_err());
        assert!(parse_from_args(fixture.args("copy", &["--segment-size", "5Zib"])).is_err());
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
