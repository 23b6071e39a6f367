//! Rewards CLI — entry point for checking and claiming round rewards.

use anyhow::Context;
use clap::Parser;
use rewards_service::{ClaimRequest, RawClaimRequest, RewardsService, ServiceConfig, ServiceError};
use rewards_types::UserId;
use rewards_utils::LogFormat;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "rewards", about = "Round reward eligibility and claims")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "REWARDS_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for claim storage.
    #[arg(long, env = "REWARDS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Round to check and claim against.
    #[arg(long, env = "REWARDS_ROUND")]
    round: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "REWARDS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "REWARDS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct RequestArgs {
    /// Leaderboard participant the reward is for.
    #[arg(long)]
    participant: Option<String>,

    /// Claiming user. Defaults to `user-<participant>`.
    #[arg(long)]
    user: Option<String>,

    /// Participant score, e.g. "500" or "12.75".
    #[arg(long)]
    score: Option<String>,

    /// Leaderboard rank, 1 is best.
    #[arg(long)]
    rank: Option<String>,
}

impl From<RequestArgs> for RawClaimRequest {
    fn from(args: RequestArgs) -> Self {
        RawClaimRequest {
            user_id: args.user,
            participant_id: args.participant,
            score: args.score,
            rank: args.rank,
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Report whether a claim is possible and for how much.
    Check(RequestArgs),
    /// Claim the current round's reward.
    Claim(RequestArgs),
    /// Print a user's claims (newest first) and totals.
    History {
        #[arg(long)]
        user: String,
    },
    /// Print a user's claim totals.
    Totals {
        #[arg(long)]
        user: String,
    },
    /// Print the effective configuration as TOML.
    Config,
}

/// File config as the base, flags and env vars on top.
fn effective_config(cli: &Cli) -> Result<ServiceConfig, ServiceError> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_toml_file(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(round) = &cli.round {
        config.round_id = round.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{out}");
    Ok(())
}

fn user_id(raw: String) -> Result<UserId, ServiceError> {
    Ok(UserId::new(raw)?)
}

fn request(args: RequestArgs) -> Result<ClaimRequest, ServiceError> {
    Ok(ClaimRequest::try_from(RawClaimRequest::from(args))?)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = effective_config(&cli)?;
    rewards_utils::init_logging(config.log_format, &config.log_level)?;
    tracing::debug!(round = %config.round_id, data_dir = %config.data_dir.display(), "configuration loaded");

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let service = RewardsService::open(&config)?;
    match cli.command {
        Command::Check(args) => print_json(&service.check(&request(args)?).await?),
        Command::Claim(args) => print_json(&service.claim(&request(args)?).await?),
        Command::History { user } => print_json(&service.summary(&user_id(user)?).await?),
        Command::Totals { user } => print_json(&service.totals(&user_id(user)?).await?),
        Command::Config => Ok(()),
    }
}

/// 2 when the caller is at fault, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ServiceError>() {
        Some(e) if e.is_client_error() => 2,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewards_service::ClaimSummary;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rewards").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_file_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rewards.toml");
        std::fs::write(&path, "round_id = \"round-3\"\nlog_level = \"warn\"\nmap_size_mb = 16\n").unwrap();

        let cli = parse(&[
            "--config",
            path.to_str().unwrap(),
            "--round",
            "round-4",
            "--log-format",
            "json",
            "config",
        ]);
        let config = effective_config(&cli).unwrap();
        assert_eq!(config.round_id, "round-4");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.map_size_mb, 16);
    }

    #[test]
    fn missing_request_fields_are_client_errors() {
        let cli = parse(&["check", "--participant", "talent-1", "--score", "10"]);
        let Command::Check(args) = cli.command else {
            panic!("expected check");
        };
        let err = request(args).unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(exit_code(&anyhow::Error::from(err)), 2);
    }

    #[test]
    fn operator_config_mistakes_are_server_errors() {
        let cli = parse(&["--round", " ", "config"]);
        let err = effective_config(&cli).unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
        assert_eq!(exit_code(&anyhow::Error::from(err)), 1);

        let missing = parse(&["--config", "/nonexistent/rewards.toml", "config"]);
        let err = anyhow::Error::from(effective_config(&missing).unwrap_err());
        assert_eq!(exit_code(&err), 1);
    }

    #[tokio::test]
    async fn claim_then_history_via_service() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap();
        let cli = parse(&["--data-dir", data_dir, "claim", "--participant", "talent-9", "--score", "500", "--rank", "5"]);
        let config = effective_config(&cli).unwrap();
        let service = RewardsService::open(&config).unwrap();
        let Command::Claim(args) = cli.command else {
            panic!("expected claim");
        };
        let claim = service.claim(&request(args).unwrap()).await.unwrap();
        assert_eq!(claim.user_id.as_str(), "user-talent-9");

        let summary: ClaimSummary = service.summary(&claim.user_id).await.unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["totals"]["total_usd"], "150");
        assert_eq!(json["totals"]["claim_count"], 1);
    }
}
