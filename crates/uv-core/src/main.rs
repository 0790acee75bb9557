use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uv_core::{
    render_error, render_json, render_text, ValidationRequest, Validator, ValidatorSettings,
};

const EXIT_FAIL: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn target_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("network")
            .long("network")
            .required(true)
            .help("Network directory, e.g. mainnet"),
    )
    .arg(
        Arg::new("upgrade")
            .long("upgrade")
            .required(true)
            .help("Upgrade directory under the network"),
    )
    .arg(
        Arg::new("config")
            .long("config")
            .required(true)
            .help("Task config name, without the .json extension"),
    )
}

fn cli() -> Command {
    Command::new("upgrade-validator")
        .version(uv_core::VERSION)
        .about("Simulate a contract upgrade and reconcile its effects against the declared ones")
        .subcommand_required(true)
        .arg(
            Arg::new("settings")
                .long("settings")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML settings file"),
        )
        .arg(
            Arg::new("deployments-root")
                .long("deployments-root")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Deployments tree root (overrides CONTRACT_DEPLOYMENTS_ROOT)"),
        )
        .arg(
            Arg::new("timeout-secs")
                .long("timeout-secs")
                .global(true)
                .value_parser(value_parser!(u64).range(1..))
                .help("Simulation timeout in seconds"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(
            target_args(Command::new("validate").about("Run the full validation pipeline")).arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Print the outcome as JSON"),
            ),
        )
        .subcommand(target_args(
            Command::new("check-config").about("Load and print a task config without simulating"),
        ))
}

fn init_tracing(json: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn load_settings(args: &ArgMatches) -> anyhow::Result<ValidatorSettings> {
    let mut settings = match args.get_one::<PathBuf>("settings") {
        Some(path) => ValidatorSettings::from_file(path)?,
        None => ValidatorSettings::new(),
    }
    .apply_env()?;

    if let Some(root) = args.get_one::<PathBuf>("deployments-root") {
        settings = settings.with_deployments_root(root.clone());
    }
    if let Some(secs) = args.get_one::<u64>("timeout-secs") {
        settings = settings.with_timeout(Duration::from_secs(*secs));
    }
    Ok(settings)
}

fn request_from(args: &ArgMatches) -> anyhow::Result<ValidationRequest> {
    let get = |name: &str| {
        args.get_one::<String>(name)
            .cloned()
            .with_context(|| format!("missing --{name}"))
    };
    Ok(ValidationRequest::new(
        get("network")?,
        get("upgrade")?,
        get("config")?,
    ))
}

async fn run(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    let Some((name, args)) = matches.subcommand() else {
        anyhow::bail!("no subcommand given");
    };

    let settings = load_settings(args)?;
    let validator =
        Validator::from_settings(&settings).context("failed to initialize validator")?;
    let request = request_from(args)?;

    match name {
        "validate" => match validator.validate_upgrade(request).await {
            Ok(outcome) => {
                if args.get_flag("json") {
                    println!("{}", render_json(&outcome)?);
                } else {
                    print!("{}", render_text(&outcome));
                }
                Ok(if outcome.passed() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(EXIT_FAIL)
                })
            }
            Err(e) => {
                eprintln!("{}", render_error(&e));
                Ok(ExitCode::from(EXIT_ERROR))
            }
        },
        "check-config" => match validator.check_config(&request).await {
            Ok(loaded) => {
                let report = serde_json::json!({
                    "source": loaded.source,
                    "config": loaded.config,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{}", render_error(&e));
                Ok(ExitCode::from(EXIT_ERROR))
            }
        },
        other => anyhow::bail!("unknown subcommand '{other}'"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match run(&matches).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
