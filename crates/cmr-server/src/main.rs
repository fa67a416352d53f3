//! Command line entry point of the CMR control plane

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use cmr_server::{logging, ControlPlane, ServerConfig};
use std::path::PathBuf;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Path to the server configuration (TOML)")
}

fn main() -> anyhow::Result<()> {
    let cli = Command::new("cmr-server")
        .version(cmr_server::VERSION)
        .about("CMR instrumentation control plane")
        .subcommand_required(true)
        .subcommand(
            Command::new("validate")
                .about("Check a configuration file and exit")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("run")
                .about("Connect configured agents, apply their environments and report")
                .arg(config_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("validate", args)) => {
            let path = args
                .get_one::<PathBuf>("config")
                .context("missing --config")?;
            let config = ServerConfig::load(path)
                .with_context(|| format!("invalid configuration {}", path.display()))?;

            println!(
                "{}: OK ({} environments, {} agents, {} applications)",
                path.display(),
                config.environments.len(),
                config.agents.len(),
                config.applications.len()
            );
        }
        Some(("run", args)) => {
            let path = args
                .get_one::<PathBuf>("config")
                .context("missing --config")?;
            let config = ServerConfig::load(path)
                .with_context(|| format!("invalid configuration {}", path.display()))?;
            logging::init(&config.logging)?;

            let plane = ControlPlane::from_config(&config);
            let report = plane.bootstrap(&config)?;

            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.generate_text());
            }
        }
        _ => unreachable!("subcommand_required"),
    }

    Ok(())
}
