use crate::Config;
use crate::config::args::value_parser::{dir_exist, file_exist, header_name, human_bytes, url};
use crate::config::source_credentials::SourceCredentials;
use crate::config::{ClientConfig, Mode, RetryConfig, TracingConfig, TransferConfig};
use crate::types::S3Credentials;
use clap::builder::NonEmptyStringValueParser;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

mod tests;
mod value_parser;

const DEFAULT_RETRIES: u32 = 2;
const DEFAULT_INITIAL_BACKOFF_MILLISECONDS: u64 = 100;
const DEFAULT_AUDIT_INTERVAL_MILLISECONDS: u64 = 1000;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_AWS_SDK_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;
const DEFAULT_FORCE_PATH_STYLE: bool = false;
const DEFAULT_SEGMENT_SIZE: &str = "5GiB";

const SAME_CONTAINER_AND_ENDPOINT: &str =
    "--container-src and --container-dst must differ when both sides use the same endpoint\n";
const DATABASE_CSV_DIR_NOT_FOUND: &str = "directory of --database-csv does not exist\n";
const DATABASE_CSV_IS_ID_LIST: &str = "--database-csv must not be the id list\n";

#[derive(Parser, Clone, Debug)]
#[command(version, about)]
pub struct CLIArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Debug)]
enum Command {
    /// copy each object, verify both checksums and reconcile metadata. The first failure aborts the batch.
    Copy {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// copy like `copy`, record every migrated object in the audit log and continue past failures.
    Migrate {
        #[command(flatten)]
        common: CommonArgs,

        /// operator name recorded in the audit log
        #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Audit Log")]
        uploaded_by: String,

        /// audit log (CSV) path. An existing file is truncated
        #[arg(long, env, value_name = "FILE", help_heading = "Audit Log")]
        database_csv: PathBuf,
    },

    /// compare metadata of each object on both sides without transferring anything.
    Audit {
        #[command(flatten)]
        common: CommonArgs,

        /// pause between two objects
        #[arg(long, env, default_value_t = DEFAULT_AUDIT_INTERVAL_MILLISECONDS, value_name = "interval", help_heading = "General")]
        audit_interval_milliseconds: u64,
    },
}

#[derive(Args, Clone, Debug)]
struct CommonArgs {
    /// YAML file holding the source credentials and endpoint
    #[arg(long, env, value_name = "FILE", value_parser = file_exist::is_file_exist, help_heading = "General")]
    source_config: String,

    /// file listing one object id per line
    #[arg(long, env, value_name = "FILE", value_parser = file_exist::is_file_exist, help_heading = "General")]
    id_list: String,

    /// staging directory for downloaded objects
    #[arg(long, env, value_name = "DIR", value_parser = dir_exist::is_dir_exist, help_heading = "General")]
    tmp_dir: String,

    /// source container
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "General")]
    container_src: String,

    /// destination container
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "General")]
    container_dst: String,

    /// destination region
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Target Options")]
    target_region: Option<String>,

    /// destination endpoint url
    #[arg(long, env, value_parser = url::check_scheme, help_heading = "Target Options")]
    target_endpoint_url: Option<String>,

    /// force path-style addressing on the destination
    #[arg(long, env, default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "Target Options")]
    target_force_path_style: bool,

    /// objects of this size or larger are uploaded in segments of this size
    #[arg(long, env, default_value = DEFAULT_SEGMENT_SIZE, value_parser = human_bytes::check_human_bytes, help_heading = "Transfer")]
    segment_size: String,

    /// header allowed to differ between source and destination (repeatable)
    #[arg(long, env, value_delimiter = ',', value_parser = header_name::parse_header_name, help_heading = "Verification")]
    exception_header: Vec<String>,

    /// trace verbosity(-v: show info, -vv: show debug, -vvv show trace)
    #[clap(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// show trace as json format
    #[arg(long, env, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Tracing/Logging")]
    json_tracing: bool,

    /// enable aws sdk tracing
    #[arg(long, env, default_value_t = DEFAULT_AWS_SDK_TRACING, help_heading = "Tracing/Logging")]
    aws_sdk_tracing: bool,

    /// show span events
    #[arg(long, env, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Tracing/Logging")]
    span_events_tracing: bool,

    /// disable ANSI terminal colors
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Tracing/Logging")]
    disable_color_tracing: bool,

    /// retries after the first attempt of each storage request
    #[arg(long, env, default_value_t = DEFAULT_RETRIES, help_heading = "Retry Options")]
    retries: u32,

    /// backoff before the first retry
    #[arg(long, env, default_value_t = DEFAULT_INITIAL_BACKOFF_MILLISECONDS, value_name = "initial_backoff", help_heading = "Retry Options")]
    initial_backoff_milliseconds: u64,
}

pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

pub fn build_config_from_args<I, T>(args: I) -> Result<Config, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config_args = CLIArgs::try_parse_from(args).map_err(|e| e.to_string())?;
    Config::try_from(config_args)
}

impl CLIArgs {
    fn common(&self) -> &CommonArgs {
        match &self.command {
            Command::Copy { common }
            | Command::Migrate { common, .. }
            | Command::Audit { common, .. } => common,
        }
    }

    fn validate_config(&self, source_credentials: &SourceCredentials) -> Result<(), String> {
        self.check_same_container_conflict(source_credentials)?;
        self.check_database_csv_conflict()?;

        Ok(())
    }

    fn check_same_container_conflict(
        &self,
        source_credentials: &SourceCredentials,
    ) -> Result<(), String> {
        let common = self.common();

        if common.container_src == common.container_dst
            && source_credentials.endpoint_url == common.target_endpoint_url
            && source_credentials.region == common.target_region
        {
            return Err(SAME_CONTAINER_AND_ENDPOINT.to_string());
        }

        Ok(())
    }

    fn check_database_csv_conflict(&self) -> Result<(), String> {
        let Command::Migrate {
            common,
            database_csv,
            ..
        } = &self.command
        else {
            return Ok(());
        };

        let parent = match database_csv.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !parent.is_dir() {
            return Err(DATABASE_CSV_DIR_NOT_FOUND.to_string());
        }

        if database_csv == Path::new(&common.id_list) {
            return Err(DATABASE_CSV_IS_ID_LIST.to_string());
        }

        Ok(())
    }

    fn build_client_configs(&self, source_credentials: &SourceCredentials) -> (ClientConfig, ClientConfig) {
        let common = self.common();

        let retry_config = RetryConfig {
            aws_max_attempts: common.retries + 1,
            initial_backoff_milliseconds: common.initial_backoff_milliseconds,
        };

        let source_client_config = ClientConfig {
            credential: S3Credentials::Credentials {
                access_keys: source_credentials.access_keys(),
            },
            region: source_credentials.region.clone(),
            endpoint_url: source_credentials.endpoint_url.clone(),
            force_path_style: source_credentials.force_path_style,
            retry_config: retry_config.clone(),
        };

        // destination credentials come from the process environment
        let target_client_config = ClientConfig {
            credential: S3Credentials::FromEnvironment,
            region: common.target_region.clone(),
            endpoint_url: common.target_endpoint_url.clone(),
            force_path_style: common.target_force_path_style,
            retry_config,
        };

        (source_client_config, target_client_config)
    }
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(value: CLIArgs) -> Result<Self, Self::Error> {
        let common = value.common();

        let source_credentials = SourceCredentials::load(Path::new(&common.source_config))
            .map_err(|e| format!("{e:#}\n"))?;

        value.validate_config(&source_credentials)?;

        let (source_client_config, target_client_config) =
            value.build_client_configs(&source_credentials);

        let tracing_config = common.verbosity.log_level().map(|log_level| TracingConfig {
            tracing_level: log_level,
            json_tracing: common.json_tracing,
            aws_sdk_tracing: common.aws_sdk_tracing,
            span_events_tracing: common.span_events_tracing,
            disable_color_tracing: common.disable_color_tracing,
        });

        let segment_size = human_bytes::parse_human_bytes(&common.segment_size)?;

        let (mode, audit_interval_milliseconds) = match &value.command {
            Command::Copy { .. } => (Mode::Copy, 0),
            Command::Migrate {
                uploaded_by,
                database_csv,
                ..
            } => (
                Mode::Migrate {
                    uploaded_by: uploaded_by.clone(),
                    database_csv: database_csv.clone(),
                },
                0,
            ),
            Command::Audit {
                audit_interval_milliseconds,
                ..
            } => (Mode::Audit, *audit_interval_milliseconds),
        };

        Ok(Config {
            mode,
            id_list: PathBuf::from(&common.id_list),
            tmp_dir: PathBuf::from(&common.tmp_dir),
            container_src: common.container_src.clone(),
            container_dst: common.container_dst.clone(),
            source_client_config: Some(source_client_config),
            target_client_config: Some(target_client_config),
            tracing_config,
            transfer_config: TransferConfig { segment_size },
            exception_headers: common.exception_header.clone(),
            audit_interval_milliseconds,
        })
    }
}
