#[cfg(test)]
mod tests {
    use crate::config::args::tests::Fixture;
    use crate::config::args::*;

    #[test]
    fn with_custom_value() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();
        let config = build_config_from_args(fixture.args(
            "copy",
            &[
                "--target-region",
                "ca-central-1",
                "--target-endpoint-url",
                "http://127.0.0.1:9000",
                "--target-force-path-style",
            ],
        ))
        .unwrap();

        let target_client_config = config.target_client_config.unwrap();
        assert_eq!(target_client_config.region.unwrap(), "ca-central-1");
        assert_eq!(
            target_client_config.endpoint_url.unwrap(),
            "http://127.0.0.1:9000"
        );
        assert!(target_client_config.force_path_style);
    }

    #[test]
    fn with_invalid_endpoint_url() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();

        assert!(
            parse_from_args(fixture.args(
                "copy",
                &["--target-endpoint-url", "ftp://127.0.0.1:9000"]
            ))
            .is_err()
        );
        assert!(parse_from_args(fixture.args("copy", &["--target-region", ""])).is_err());
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
