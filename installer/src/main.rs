//! setup-swift CLI entrypoint.
//!
//! Installs the requested Swift toolchain on a GitHub Actions runner and
//! reports the installed version as the `version` step output.

use clap::Parser;
use common::WorkflowEnvironment;
use common::logger;
use setup_swift::artefact::download::HttpDownloader;
use setup_swift::artefact::extraction::SystemExtractor;
use setup_swift::artefact::signature::GpgVerifier;
use setup_swift::cli::Cli;
use setup_swift::command::SystemCommandExecutor;
use setup_swift::config::Settings;
use setup_swift::dirs::{NoBaseDirs, SystemBaseDirs};
use setup_swift::error::Result;
use setup_swift::install::Services;
use setup_swift::output::{failure_message, write_stderr_line};
use setup_swift::resolution::NoStableReleases;
use setup_swift::setup::{SetupContext, run_setup};
use setup_swift::snapshot::tags::GitHubTagSource;
use setup_swift::tool_cache::DirToolCache;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let runner_debug = std::env::var("RUNNER_DEBUG").is_ok_and(|value| value == "1");
    if let Err(err) = logger::init(logger::level_for(cli.verbosity, cli.quiet, runner_debug)) {
        write_stderr_line(&mut stderr, format!("failed to initialise logging: {err}"));
    }

    let run_result = run(&cli);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let settings = match SystemBaseDirs::new() {
        Some(dirs) => Settings::from_env(cli, &dirs)?,
        None => Settings::from_env(cli, &NoBaseDirs)?,
    };

    let downloader = HttpDownloader;
    let extractor = SystemExtractor::new(SystemCommandExecutor);
    let verifier = GpgVerifier::new(
        SystemCommandExecutor,
        &downloader,
        settings.temp_dir.join("setup-swift-keys"),
    );
    let executor = SystemCommandExecutor;
    let tags = GitHubTagSource::new(settings.token.clone());
    let cache = DirToolCache::new(settings.tool_cache.clone());
    let env = WorkflowEnvironment::from_process_env();

    let context = SetupContext {
        stable: &NoStableReleases,
        tags: &tags,
        services: Services {
            downloader: &downloader,
            extractor: &extractor,
            verifier: &verifier,
            executor: &executor,
        },
        cache: &cache,
        env: &env,
    };
    run_setup(&settings, &context)?;
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            let message = failure_message(&err);
            log::error!("{message}");
            write_stderr_line(stderr, message);
            1
        }
    }
}
