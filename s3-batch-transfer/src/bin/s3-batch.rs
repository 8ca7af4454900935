/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time;

use aws_sdk_s3::error::DisplayErrorContext;
use clap::Parser;
use s3_batch_transfer::error::Error;
use s3_batch_transfer::metrics::unit::ByteUnit;
use s3_batch_transfer::progress::IndicatifSink;
use s3_batch_transfer::types::{ConcurrencySetting, LocalPathPolicy, ProviderKind, TransferResult};

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "s3-batch")]
#[command(about = "Upload or download directories to/from Amazon S3 and S3 compatible stores.")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::Subcommand)]
enum Command {
    /// Upload a directory (or a single file) to a bucket
    #[command(visible_alias = "up")]
    Upload(UploadArgs),

    /// Download every object under a prefix, or every object recorded in an info file
    #[command(visible_alias = "down")]
    Download(DownloadArgs),

    /// List buckets, or the objects of a bucket as a tree
    Ls(LsArgs),
}

#[derive(Debug, Clone, clap::Args)]
struct ConnectionArgs {
    /// AWS CLI profile name
    #[arg(short = 'p', long)]
    profile: Option<String>,

    /// Region to sign requests for
    #[arg(long)]
    region: Option<String>,

    /// Custom endpoint, e.g. an R2 account endpoint
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Service behind the endpoint <aws | r2>. Guessed from the access key when not set.
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Number of concurrent object transfers
    #[arg(long)]
    concurrency: Option<usize>,

    /// Pick each transfer's part size and concurrency from the object size
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    use_dynamic_config: bool,

    /// Unit transfer rates are shown in <B | Kb | KiB | Mb | MiB | Gb | GiB | TiB>
    #[arg(long, default_value = "MiB")]
    rate_unit: ByteUnit,

    /// Shell command to execute before the transfer
    #[arg(long)]
    pre_cmd: Option<String>,

    /// Shell command to execute after the transfer
    #[arg(long)]
    post_cmd: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
struct UploadArgs {
    /// Path to the directory or file to upload
    #[arg(short = 'd', long, required = true)]
    directory: PathBuf,

    /// S3 bucket name
    #[arg(short = 'b', long, required = true)]
    bucket: String,

    /// Use the normalized local path as the object key
    #[arg(short = 'k', long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    keep_path: bool,

    /// Prefix prepended to every object key
    #[arg(long)]
    key_prefix: Option<String>,

    /// Suffix appended to the top level directory of every object key
    #[arg(long)]
    append_suffix: Option<String>,

    /// Upload even if the object already exists
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    overwrite: bool,

    /// Only report what would be uploaded
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    dry_run: bool,

    /// Object key the info file (manifest of uploaded files) is written to
    #[arg(long)]
    info_file: Option<String>,

    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Debug, Clone, clap::Args)]
struct DownloadArgs {
    /// Prefix of the objects to download. Required unless --info-file is given.
    #[arg(short = 'd', long, required_unless_present = "info_file")]
    directory: Option<String>,

    /// S3 bucket name
    #[arg(short = 'b', long, required = true)]
    bucket: String,

    /// Local directory to download into
    #[arg(short = 'l', long, default_value = ".")]
    local_path: PathBuf,

    /// Keep each object's key path below the prefix (the default)
    #[arg(short = 'k', long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    keep_path: bool,

    /// Write every object directly into the local path under its file name
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue, conflicts_with = "keep_path")]
    flatten: bool,

    /// Download even if the local file already exists
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    overwrite: bool,

    /// Only report what would be downloaded
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    dry_run: bool,

    /// Object key of an info file written by a previous upload; downloads what it records
    #[arg(long)]
    info_file: Option<String>,

    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Debug, Clone, clap::Args)]
struct LsArgs {
    /// Bucket to list. Lists every bucket when not given.
    #[arg(short = 'b', long)]
    bucket: Option<String>,

    /// Prefix to list below
    #[arg(short = 'd', long)]
    directory: Option<String>,

    /// Descend into every folder below the prefix
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    recursive: bool,

    /// Compute the region, object count and size of every bucket
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    sizes: bool,

    #[command(flatten)]
    connection: ConnectionArgs,
}

impl DownloadArgs {
    fn path_policy(&self) -> LocalPathPolicy {
        if self.flatten && !self.keep_path {
            LocalPathPolicy::Flatten
        } else {
            LocalPathPolicy::KeepPath
        }
    }
}

impl Command {
    fn connection(&self) -> &ConnectionArgs {
        match self {
            Command::Upload(args) => &args.connection,
            Command::Download(args) => &args.connection,
            Command::Ls(args) => &args.connection,
        }
    }
}

async fn client(
    conn: &ConnectionArgs,
    sink: Arc<IndicatifSink>,
) -> Result<s3_batch_transfer::Client, Error> {
    let mut loader = s3_batch_transfer::from_env()
        .adaptive_profiles(conn.use_dynamic_config)
        .progress_unit(conn.rate_unit)
        .progress_sink(sink);
    if let Some(profile) = &conn.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = &conn.region {
        loader = loader.region(region);
    }
    if let Some(endpoint_url) = &conn.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }
    if let Some(provider) = conn.provider {
        loader = loader.provider(provider);
    }
    if let Some(concurrency) = conn.concurrency {
        loader = loader.concurrency(ConcurrencySetting::Explicit(concurrency));
    }
    let config = loader.load().await?;
    Ok(s3_batch_transfer::Client::new(config))
}

/// Totals of a finished batch, `Ok(true)` if every item succeeded or was skipped
fn report(
    verb: &str,
    successful: &[TransferResult],
    skipped: &[TransferResult],
    failed: &[TransferResult],
    total_bytes: u64,
    elapsed: time::Duration,
) -> bool {
    for result in failed {
        eprintln!(
            "failed: {} ({})",
            result.item().relative_path(),
            result.error().unwrap_or("unknown error")
        );
    }
    println!(
        "{verb} {} objects, skipped {}, failed {} in {elapsed:.2?}; Total {verb} Size={}",
        successful.len(),
        skipped.len(),
        failed.len(),
        ByteUnit::display(total_bytes)
    );
    failed.is_empty()
}

async fn do_upload(args: UploadArgs, sink: Arc<IndicatifSink>) -> Result<bool, Error> {
    let tm = client(&args.connection, sink).await?;
    let start = time::Instant::now();

    let handle = tm
        .upload_objects()
        .bucket(&args.bucket)
        .source(&args.directory)
        .set_key_prefix(args.key_prefix)
        .keep_path(args.keep_path)
        .set_append_suffix(args.append_suffix)
        .overwrite(args.overwrite)
        .dry_run(args.dry_run)
        .set_manifest_key(args.info_file)
        .send()
        .await?;
    let output = handle.join().await?;

    if let Some(manifest) = output.manifest() {
        tracing::info!("recorded {} files in the info file", manifest.files.len());
    }
    Ok(report(
        "Uploaded",
        output.successful_transfers(),
        output.skipped_transfers(),
        output.failed_transfers(),
        output.total_bytes_transferred(),
        start.elapsed(),
    ))
}

async fn do_download(args: DownloadArgs, sink: Arc<IndicatifSink>) -> Result<bool, Error> {
    let tm = client(&args.connection, sink).await?;
    let start = time::Instant::now();

    let handle = match args.info_file {
        Some(info_file) => {
            tm.download_from_manifest()
                .bucket(&args.bucket)
                .manifest_key(info_file)
                .destination(&args.local_path)
                .overwrite(args.overwrite)
                .dry_run(args.dry_run)
                .send()
                .await?
        }
        None => {
            let policy = args.path_policy();
            tm.download_objects()
                .bucket(&args.bucket)
                .set_key_prefix(args.directory)
                .destination(&args.local_path)
                .path_policy(policy)
                .overwrite(args.overwrite)
                .dry_run(args.dry_run)
                .send()
                .await?
        }
    };
    let output = handle.join().await?;

    Ok(report(
        "Downloaded",
        output.successful_transfers(),
        output.skipped_transfers(),
        output.failed_transfers(),
        output.total_bytes_transferred(),
        start.elapsed(),
    ))
}

async fn do_ls(args: LsArgs, sink: Arc<IndicatifSink>) -> Result<bool, Error> {
    let tm = client(&args.connection, sink).await?;
    match args.bucket {
        Some(bucket) => {
            let tree = tm
                .list_objects()
                .bucket(bucket)
                .set_prefix(args.directory)
                .recursive(args.recursive)
                .send()
                .await?;
            println!("{tree}");
        }
        None => {
            let catalog = tm.list_buckets().with_size(args.sizes).send().await?;
            println!("{catalog}");
        }
    }
    Ok(true)
}

/// Run a user supplied command through the shell. Failures are logged and otherwise ignored.
async fn execute_command(command: &str) {
    tracing::info!("executing command: {command}");
    match tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .await
    {
        Ok(status) if status.success() => {
            tracing::info!("successfully executed command: {command}")
        }
        Ok(status) => tracing::error!("command `{command}` exited with {status}"),
        Err(err) => tracing::error!("unable to execute command `{command}`: {err}"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    // log lines are printed above the live progress bars
    let sink = Arc::new(IndicatifSink::new());
    let writer = sink.log_writer();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_thread_ids(true)
        .with_writer(move || writer.clone())
        .init();

    let conn = args.command.connection().clone();
    if let Some(pre_cmd) = &conn.pre_cmd {
        execute_command(pre_cmd).await;
    }

    let result = match args.command {
        Command::Upload(args) => do_upload(args, sink).await,
        Command::Download(args) => do_download(args, sink).await,
        Command::Ls(args) => do_ls(args, sink).await,
    };

    if let Some(post_cmd) = &conn.post_cmd {
        execute_command(post_cmd).await;
    }

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("command failed: {}", DisplayErrorContext(&err));
            ExitCode::FAILURE
        }
    }
}
