use anyhow::{Result, anyhow};
use tokio::time::Instant;
use tracing::{error, info, trace};

use s3migrate::Config;
use s3migrate::pipeline::Pipeline;
use s3migrate::types::FailedObject;

mod indicator;
mod ui_config;

#[allow(dead_code)]
const EXIT_CODE_SUCCESS: i32 = 0;
#[allow(dead_code)]
const EXIT_CODE_ERROR: i32 = 1;
#[allow(dead_code)]
const EXIT_CODE_INVALID_ARGS: i32 = 2;
const EXIT_CODE_WARNING: i32 = 3;

pub async fn run(config: Config) -> Result<()> {
    #[allow(unused_assignments)]
    let mut has_warning = false;

    {
        let start_time = Instant::now();
        trace!("migrate pipeline start.");

        let show_result = ui_config::is_show_result_needed(&config);

        let mut pipeline = Pipeline::new(config.clone()).await?;
        let indicator_join_handle = indicator::show_indicator(
            pipeline.get_stats_receiver(),
            ui_config::is_progress_indicator_needed(&config),
            show_result,
            !show_result,
        );

        pipeline.run().await;
        let summary = indicator_join_handle.await?;

        let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());
        if pipeline.has_error() {
            show_failed_objects(&pipeline.get_failed_objects(), show_result);

            // per-object failures were already reported above
            if summary.failed == 0 {
                for e in pipeline.get_errors_and_consume().unwrap_or_default() {
                    error!(error = format!("{e:#}"), "s3migrate error.");
                }
            }

            error!(
                duration_sec = duration_sec,
                mode = config.mode.name(),
                failed = summary.failed,
                "s3migrate failed."
            );

            return Err(anyhow!("s3migrate failed."));
        }

        has_warning = pipeline.has_warning();

        info!(
            duration_sec = duration_sec,
            mode = config.mode.name(),
            completed = summary.completed,
            "s3migrate has been completed."
        );
    }

    if has_warning {
        std::process::exit(EXIT_CODE_WARNING);
    }

    Ok(())
}

fn show_failed_objects(failed_objects: &[FailedObject], show_result: bool) {
    for failed_object in failed_objects {
        if show_result {
            println!(
                "failed: {} (reached {}): {}",
                failed_object.object, failed_object.state, failed_object.reason
            );
        } else {
            error!(
                key = failed_object.object,
                state = %failed_object.state,
                reason = failed_object.reason,
                "failed object."
            );
        }
    }
}
