// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use log::info;
use runtime::{DemoRuntime, RpcRuntime};
use sailadmin_app::AppState;
use std::env;
use std::path::PathBuf;

const DEMO_SEED: u64 = 2026;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `sailadmin --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let log_file = config.log_file()?;
    logging::init(&log_file, config.log_level()?).with_context(|| {
        format!(
            "start logging to {} -- set [log].file to a writable path",
            log_file.display()
        )
    })?;

    let ui = config.ui_options();
    let mut state = AppState::default();

    if options.demo {
        info!("starting demo session with seed {DEMO_SEED}");
        let mut runtime = DemoRuntime::new(DEMO_SEED);
        if options.check_only {
            println!("{}", demo_check_summary(&runtime));
            return Ok(());
        }
        return sailadmin_tui::run_app(&mut state, &mut runtime, ui);
    }

    let client = sailadmin_rpc::Client::new(config.base_url(), config.timeout()?).with_context(
        || {
            format!(
                "invalid [server] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        },
    )?;

    if options.check_only {
        client.ping()?;
        println!("ok: {} answered", client.base_url());
        return Ok(());
    }

    info!(
        "connecting to {} (timeout {:?})",
        client.base_url(),
        client.timeout()
    );
    let mut runtime = RpcRuntime::new(client);
    sailadmin_tui::run_app(&mut state, &mut runtime, ui)
}

fn demo_check_summary(runtime: &DemoRuntime) -> String {
    let fleet = runtime.fleet();
    format!(
        "ok: demo data generated ({} regattas, {} leaderboards, {} events)",
        fleet.regattas.len(),
        fleet.leaderboards.len(),
        fleet.events.len()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("sailadmin");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Browse generated regattas without a server");
    println!("  --check                  Validate config and ping the sailing server");
    println!("  --help                   Show this help");
}
