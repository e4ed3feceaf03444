use std::ffi::OsString;
use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::{error, info};

use crate::api::ApiServer;
use crate::app::{LoadTest, ReportResponse, build_report, export_json, print_summary};
use crate::args::{Command, OutputFormat, ServeArgs, TesterArgs};
use crate::config::{DEFAULT_CONFIG_FILES, RunConfig, RunInput};
use crate::error::{AppError, AppResult};
use crate::shutdown::shutdown_token;
use crate::shutdown_handlers::setup_signal_shutdown_handler;

enum RunPlan {
    Serve(ServeArgs),
    Local(Box<LocalPlan>),
}

struct LocalPlan {
    config: RunConfig,
    output_format: OutputFormat,
    export_json: Option<String>,
}

/// Binary entry point: parses arguments, installs logging and drives the
/// selected front-end on a multi-threaded runtime.
///
/// # Errors
///
/// Returns an error when arguments or configuration are invalid, the run
/// cannot be prepared, or the API server fails to start.
pub fn run() -> AppResult<()> {
    let (args, matches) = match parse_args()? {
        Some(parsed) => parsed,
        None => return Ok(()),
    };

    crate::logger::init_logging(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args, &matches))
}

fn parse_args() -> AppResult<Option<(TesterArgs, ArgMatches)>> {
    let mut cmd = TesterArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = TesterArgs::from_arg_matches(&matches)?;
    Ok(Some((args, matches)))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !has_default_config()
}

fn has_default_config() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

async fn run_async(args: TesterArgs, matches: &ArgMatches) -> AppResult<()> {
    match build_plan(args, matches)? {
        RunPlan::Serve(serve_args) => serve(serve_args).await,
        RunPlan::Local(plan) => run_local(*plan).await,
    }
}

fn build_plan(mut args: TesterArgs, matches: &ArgMatches) -> AppResult<RunPlan> {
    if let Some(command) = args.command.take() {
        match command {
            Command::Serve(serve_args) => return Ok(RunPlan::Serve(serve_args)),
        }
    }

    if let Some(config) = crate::config::load_config(args.config.as_deref())? {
        crate::config::apply_config(&mut args, matches, &config)?;
    }

    let config = RunConfig::from_input(RunInput::from_args(&args)).map_err(|err| {
        error!("{}", err);
        AppError::validation(err)
    })?;

    Ok(RunPlan::Local(Box::new(LocalPlan {
        config,
        output_format: args.output_format,
        export_json: args.export_json,
    })))
}

async fn run_local(plan: LocalPlan) -> AppResult<()> {
    let load_test = LoadTest::prepare(plan.config)?;

    if plan.output_format == OutputFormat::Text {
        print_banner(load_test.config());
    }

    let shutdown = load_test.shutdown_token();
    let signal_handle = setup_signal_shutdown_handler(&shutdown);
    let outcome = load_test.run().await;
    signal_handle.abort();

    if outcome.interrupted {
        info!("Run interrupted; reporting partial results");
    }
    let report = build_report(&outcome.snapshot, outcome.elapsed);
    let response = ReportResponse::from_report(&report);

    match plan.output_format {
        OutputFormat::Text => print_summary(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Quiet => {}
    }

    if let Some(path) = plan.export_json.as_deref() {
        export_json(path, &response).await?;
        info!("Report written to {}", path);
    }
    Ok(())
}

fn print_banner(config: &RunConfig) {
    println!("Target: {} {}", config.method(), config.url());
    println!(
        "Workers: {}  Duration: {:?}  Timeout: {:?}  Keep-alive: {}",
        config.concurrency(),
        config.duration(),
        config.timeout(),
        if config.keep_alive() { "on" } else { "off" }
    );
}

async fn serve(args: ServeArgs) -> AppResult<()> {
    let server = ApiServer::bind(&args.listen, args.shutdown_grace).await?;
    let addr = server.local_addr()?;
    info!("Web UI and API listening on http://{}", addr);

    let shutdown = shutdown_token();
    let signal_handle = setup_signal_shutdown_handler(&shutdown);
    let server_handle = tokio::spawn(server.run(shutdown.clone()));

    let joined = server_handle.await;
    signal_handle.abort();
    joined?;
    Ok(())
}
