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
            config.tracing_config.as_ref().unwrap().tracing_level,
            log::Level::Warn
        );
        assert!(!config.tracing_config.as_ref().unwrap().json_tracing);
        assert!(!config.tracing_config.as_ref().unwrap().aws_sdk_tracing);
        assert!(!config.tracing_config.as_ref().unwrap().span_events_tracing);
        assert!(
            !config
                .tracing_config
                .as_ref()
                .unwrap()
                .disable_color_tracing
        );
    }

    #[test]
    fn with_custom_value() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();
        let config = build_config_from_args(fixture.args(
            "migrate",
            &[
                "--uploaded-by",
                "operator",
                "--database-csv",
                &fixture.path("audit.csv"),
                "-vvv",
                "--json-tracing",
                "--aws-sdk-tracing",
                "--span-events-tracing",
                "--disable-color-tracing",
            ],
        ))
        .unwrap();

        assert_eq!(
            config.tracing_config.as_ref().unwrap().tracing_level,
            log::Level::Trace
        );
        assert!(config.tracing_config.as_ref().unwrap().json_tracing);
        assert!(config.tracing_config.as_ref().unwrap().aws_sdk_tracing);
        assert!(config.tracing_config.as_ref().unwrap().span_events_tracing);
        assert!(
            config
                .tracing_config
                .as_ref()
                .unwrap()
                .disable_color_tracing
        );
    }

    #[test]
    fn with_info_level() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();
        let config = build_config_from_args(fixture.args("audit", &["-v"])).unwrap();

        assert_eq!(
            config.tracing_config.as_ref().unwrap().tracing_level,
            log::Level::Info
        );
    }

    #[test]
    fn with_quiet_option() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();
        let config = build_config_from_args(fixture.args("copy", &["-q"])).unwrap();

        assert_eq!(
            config.tracing_config.as_ref().unwrap().tracing_level,
            log::Level::Error
        );
    }

    #[test]
    fn with_silent_option() {
        init_dummy_tracing_subscriber();

        let fixture = Fixture::new();
        let config = build_config_from_args(fixture.args("copy", &["-qq"])).unwrap();

        assert!(config.tracing_config.is_none());
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
