use ::tracing::trace;
use anyhow::Result;
use clap::Parser;
use rusty_fork::rusty_fork_test;

use s3migrate::CLIArgs;
use s3migrate::Config;

mod cli;
mod tracing;

const TARGET_CREDENTIALS_ENV_VAR: &str = "AWS_ACCESS_KEY_ID";
const TARGET_CREDENTIALS_NOT_FOUND: &str = "destination credentials not found. source the destination credentials file (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY) before running s3migrate.\n";

#[cfg(not(tarpaulin_include))]
#[tokio::main]
async fn main() -> Result<()> {
    exit_if_target_credentials_not_found();

    let config = load_config_exit_if_err();

    start_tracing_if_necessary(&config);

    trace!("config = {:?}", config);

    cli::run(config).await?;

    Ok(())
}

#[cfg(not(tarpaulin_include))]
fn exit_if_target_credentials_not_found() {
    if let Err(error_message) =
        check_target_credentials(std::env::var(TARGET_CREDENTIALS_ENV_VAR).ok())
    {
        clap::Error::raw(clap::error::ErrorKind::MissingRequiredArgument, error_message).exit();
    }
}

#[cfg(not(tarpaulin_include))]
fn load_config_exit_if_err() -> Config {
    match Config::try_from(CLIArgs::parse()) {
        Ok(config) => config,
        Err(error_message) => {
            clap::Error::raw(clap::error::ErrorKind::ValueValidation, error_message).exit()
        }
    }
}

fn check_target_credentials(access_key: Option<String>) -> Result<(), String> {
    match access_key {
        Some(access_key) if !access_key.is_empty() => Ok(()),
        _ => Err(TARGET_CREDENTIALS_NOT_FOUND.to_string()),
    }
}

fn start_tracing_if_necessary(config: &Config) -> bool {
    let Some(tracing_config) = config.tracing_config.as_ref() else {
        return false;
    };

    tracing::init_tracing(tracing_config);
    true
}

#[cfg(test)]
fn build_test_config(extra: &[&str]) -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let source_config = dir.path().join("source.yaml");
    std::fs::write(
        &source_config,
        "AWS_ACCESS_KEY_ID: source_access_key\nAWS_SECRET_ACCESS_KEY: source_secret_access_key\n",
    )
    .unwrap();
    let id_list = dir.path().join("ids.txt");
    std::fs::write(&id_list, "a:1\n").unwrap();

    let mut args = vec![
        "unittest".to_string(),
        "audit".to_string(),
        "--source-config".to_string(),
        source_config.to_string_lossy().to_string(),
        "--id-list".to_string(),
        id_list.to_string_lossy().to_string(),
        "--tmp-dir".to_string(),
        dir.path().to_string_lossy().to_string(),
        "--container-src".to_string(),
        "CWRC".to_string(),
        "--container-dst".to_string(),
        "cwrc".to_string(),
    ];
    args.extend(extra.iter().map(|arg| arg.to_string()));

    let config = Config::try_from(CLIArgs::try_parse_from(args).unwrap()).unwrap();
    (dir, config)
}

#[test]
fn target_credentials_check() {
    assert!(check_target_credentials(Some("access_key".to_string())).is_ok());
    assert_eq!(
        check_target_credentials(None).unwrap_err(),
        TARGET_CREDENTIALS_NOT_FOUND
    );
    assert!(check_target_credentials(Some(String::new())).is_err());
}

rusty_fork_test! {
    #[test]
    fn with_tracing() {
        let (_dir, config) = build_test_config(&[]);
        assert!(start_tracing_if_necessary(&config));
    }

    #[test]
    fn without_tracing() {
        let (_dir, config) = build_test_config(&["-qq"]);
        assert!(!start_tracing_if_necessary(&config));
    }
}
