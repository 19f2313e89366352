/*!
# Overview
s3migrate moves preservation objects between two object storage containers and proves that every copy is faithful.

For each object id in a list, s3migrate downloads the object from the source container,
checks its MD5 against the content tag the source advertised, uploads it (in segments when it is large),
checks the MD5 against the content tag the destination reports, and compares the metadata of both sides.
Only then is the object recorded and its staged copy removed.

## Subcommands
- `copy`: verified copy. The first failed object aborts the batch.
- `migrate`: verified copy that appends one row per migrated object to a CSV audit log
  (`id, md5sum, sha256sum, uploaded_by, last_updated_at, container_name, notes`).
  Failed objects are reported with the state they reached and the batch continues.
- `audit`: read-only metadata comparison of both sides. Discrepancies are logged, nothing is written.

## Legacy source
Archives in the `CWRC` source container were stored as `application/x-tar` while they are zip files.
When migrating from that container the content type is rewritten to `application/zip`,
and the reconciliation expects that value.

## As a library
The CLI is a thin wrapper of the library. The pipeline can also be driven against
[`storage::memory::MemoryStorage`], an in-memory backend with failure injection.

Example usage
=============

```no_run
use s3migrate::config::args::parse_from_args;
use s3migrate::pipeline::Pipeline;
use s3migrate::types::MigrationStatistics;
use s3migrate::Config;

#[tokio::main]
async fn main() {
    let args = vec![
        "program_name",
        "migrate",
        "--source-config",
        "./source.yaml",
        "--id-list",
        "./ids.txt",
        "--tmp-dir",
        "/var/tmp/s3migrate",
        "--container-src",
        "CWRC",
        "--container-dst",
        "cwrc",
        "--uploaded-by",
        "operator",
        "--database-csv",
        "./audit.csv",
    ];

    let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();
    let mut pipeline = Pipeline::new(config).await.unwrap();
    let stats_receiver = pipeline.get_stats_receiver();

    pipeline.run().await;

    let mut completed = 0;
    while let Ok(stats) = stats_receiver.try_recv() {
        if matches!(stats, MigrationStatistics::MigrateComplete { .. }) {
            completed += 1;
        }
    }
    println!("completed: {completed}");

    for failed_object in pipeline.get_failed_objects() {
        println!("{} ({}): {}", failed_object.object, failed_object.state, failed_object.reason);
    }
}
```
*/

pub use config::Config;
pub use config::args::CLIArgs;

pub mod config;
pub mod pipeline;
pub mod storage;
pub mod types;
