//! profilewatch - Profile Analysis Tracker
//!
//! A CLI tool that starts profile analysis jobs on the analysis service,
//! follows them until they finish and renders their results.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, HTTP, config, invalid response, etc.)
//!   2 - The task ended in the failed state
//!   3 - The task was cancelled, or watching stopped before it finished

use anyhow::{Context, Result};
use profilewatch::api::{ApiError, HttpTaskApi, TaskApi};
use profilewatch::cli::{Args, Command, ShowArgs, SubmitArgs, WatchArgs};
use profilewatch::config::{Config, CONFIG_FILE_NAME};
use profilewatch::models::{Task, TaskStatus};
use profilewatch::report;
use profilewatch::tracker::{
    AnalysisForm, FormSubmitter, PollOutcome, PollingFlag, ProgressView, TaskPoller,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    // The config file can turn on verbose logging, so it is read first.
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("profilewatch v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(exit_code_for(&e));
        }
    }
}

/// Handle init-config: generate a default .profilewatch.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to point at your analysis service and tune polling and rendering.");
    Ok(())
}

/// Initialize logging based on verbosity settings; `RUST_LOG` wins when set.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(&config.general);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Failed tasks get their own exit code; everything else is a runtime error.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ApiError>()
        .map(ApiError::exit_code)
        .unwrap_or(1)
}

/// Dispatch the subcommand. Returns the process exit code.
async fn run(args: Args, mut config: Config) -> Result<i32> {
    config.merge_with_args(&args);
    config.validate()?;

    let api = HttpTaskApi::new(&config.server)?;
    info!("Analysis service: {}", api.base_url());

    match args.command {
        Command::Submit(ref submit) => handle_submit(&api, &config, submit, args.quiet).await,
        Command::Watch(ref watch) => handle_watch(&api, &config, watch, args.quiet).await,
        Command::Status { ref task_id } => handle_status(&api, task_id).await,
        Command::Cancel { ref task_id } => handle_cancel(&api, &config, task_id).await,
        Command::Show(ref show) => handle_show(&api, &config, show).await,
        Command::InitConfig => handle_init_config().map(|_| 0),
    }
}

/// Start an analysis and optionally keep following it.
async fn handle_submit(
    api: &HttpTaskApi,
    config: &Config,
    submit: &SubmitArgs,
    quiet: bool,
) -> Result<i32> {
    let mut form = AnalysisForm::new(config.submit.required_fields.clone())
        .field("platform", submit.platform.as_str())
        .field("profile_id", submit.profile_id.as_str());
    for (name, value) in &submit.fields {
        form.set(name.as_str(), value.as_str());
    }

    println!(
        "🚀 Starting analysis of {} on {}",
        submit.profile_id, submit.platform
    );

    let mut submitter = FormSubmitter::new(api.clone(), config.submit.action.clone());
    let route = submitter.submit(&form).await?;

    println!("✅ Task created: {}", route.task_id());
    println!("   {}", route.url(api.base_url(), &config.routes));

    if !submit.watch {
        return Ok(0);
    }

    watch_task(
        api,
        config,
        route.task_id(),
        false,
        submit.render.output.as_deref(),
        quiet,
    )
    .await
}

async fn handle_watch(
    api: &HttpTaskApi,
    config: &Config,
    watch: &WatchArgs,
    quiet: bool,
) -> Result<i32> {
    watch_task(
        api,
        config,
        &watch.task_id,
        watch.cancel_on_interrupt,
        watch.render.output.as_deref(),
        quiet,
    )
    .await
}

/// Poll a task to its end, then render its result if it completed.
async fn watch_task(
    api: &HttpTaskApi,
    config: &Config,
    task_id: &str,
    cancel_on_interrupt: bool,
    output: Option<&Path>,
    quiet: bool,
) -> Result<i32> {
    let flag = PollingFlag::new();

    // Ctrl-C only clears the flag; the request in flight is allowed to finish.
    let interrupt = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current status request");
            interrupt.stop();
        }
    });

    let view = ProgressView::new(api.base_url(), config.routes.clone(), !quiet);
    let mut poller = TaskPoller::new(api.clone(), view, task_id, flag)
        .with_interval(Duration::from_millis(config.poll.interval_ms));

    println!("\n🔬 Watching task {}...\n", task_id);

    let outcome = poller.run().await?;
    match outcome {
        PollOutcome::Completed { .. } => {
            let task = api.task(task_id).await?;
            emit(&task, config, output)?;
        }
        PollOutcome::Cancelled { ref report } => {
            println!(
                "\n{} Task {} was cancelled{}",
                report.status.emoji(),
                task_id,
                report
                    .message
                    .as_ref()
                    .map(|m| format!(": {}", m))
                    .unwrap_or_default()
            );
        }
        PollOutcome::Stopped { ref last } => {
            if cancel_on_interrupt {
                let report = poller.cancel().await?;
                println!("\n{}", ProgressView::status_line(&report));

                // The task may have finished before the cancel reached it.
                if report.status == TaskStatus::Completed {
                    let task = api.task(task_id).await?;
                    emit(&task, config, output)?;
                    return Ok(0);
                }
            } else if let Some(report) = last {
                println!(
                    "\n⏹️  Stopped watching at {} ({})",
                    report.progress, report.status
                );
            }
        }
    }

    Ok(outcome.exit_code())
}

async fn handle_status(api: &HttpTaskApi, task_id: &str) -> Result<i32> {
    let report = api.task_status(task_id).await?;

    println!("{}", ProgressView::status_line(&report));
    println!("   Progress: {}", report.progress);
    if let Some(ref error) = report.error {
        println!("   Error: {}", error);
    }
    Ok(0)
}

async fn handle_cancel(api: &HttpTaskApi, config: &Config, task_id: &str) -> Result<i32> {
    let view = ProgressView::new(api.base_url(), config.routes.clone(), false);
    let mut poller = TaskPoller::new(api.clone(), view, task_id, PollingFlag::new());

    let report = poller.cancel().await?;
    println!("{}", ProgressView::status_line(&report));
    Ok(0)
}

async fn handle_show(api: &HttpTaskApi, config: &Config, show: &ShowArgs) -> Result<i32> {
    let task = api.task(&show.task_id).await?;
    emit(&task, config, show.render.output.as_deref())?;
    Ok(0)
}

/// Render a task in the configured format to stdout or a file.
fn emit(task: &Task, config: &Config, output: Option<&Path>) -> Result<()> {
    let rendered = report::render(task, config.render.format, &config.render)?;

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("\n📝 Result saved to: {}", path.display());
        }
        None => println!("\n{}", rendered),
    }
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}
