use std::fs;
use std::sync::Arc;

use axum::{Router, routing};
use clap::{CommandFactory, Parser};
use tracing::info;

use hookd::error::{HookError, Result};
use hookd::rules::RuleTable;
use hookd::{AppState, handlers, logging};

const DEFAULT_INTERFACE: &str = "0.0.0.0";
const DEFAULT_PORT: &str = "8000";

const ENV_HELP: &str = "\
The command environment contains:

  $REPO - repository name in \"owner/name\" format
  $REPO_URL - full repository url
  $PRIVATE - strings \"true\" or \"false\" if repository is private or not
  $BRANCH - branch name
  $COMMIT - last commit hash id
  $COMMIT_MESSAGE - last commit message
  $COMMIT_TIME - last commit timestamp
  $COMMIT_AUTHOR - username of author of last commit
  $COMMIT_URL - full url to commit";

/// Runs shell commands on incoming source-control push webhooks.
#[derive(Debug, Parser)]
#[command(version, about, after_help = ENV_HELP)]
struct Opts {
    /// IP to listen on
    #[arg(short, long, default_value = DEFAULT_INTERFACE)]
    interface: String,

    /// Port to listen on
    #[arg(short, long, default_value = DEFAULT_PORT)]
    port: String,

    /// Path to file for logging (stdout when omitted or '-')
    #[arg(short, long)]
    log: Option<String>,

    /// Read rules from this file, one PATTERN=COMMAND per line
    #[arg(short, long)]
    config: Option<String>,

    /// Dump parsed rules to the console and exit
    #[arg(short, long)]
    dump: bool,

    /// Rules as PATTERN=COMMAND, matched against "owner/repo:branch"
    rules: Vec<String>,
}

impl Opts {
    /// The rules file: the flag wins, HOOKD_CONFIG is the fallback.
    fn config_path(&self) -> Option<String> {
        self.config
            .clone()
            .or_else(|| std::env::var("HOOKD_CONFIG").ok())
    }
}

/// Collect rule lines: command-line rules first, then the rules file.
fn load_rule_lines(opts: &Opts) -> Result<Vec<String>> {
    let mut lines = opts.rules.clone();

    if let Some(path) = opts.config_path() {
        let data = fs::read_to_string(&path).map_err(|e| {
            HookError::Config(format!("failed to read rules file '{}': {}", path, e))
        })?;
        lines.extend(data.trim().lines().map(str::to_string));
    }

    Ok(lines)
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let opts = Opts::parse();

    if opts.rules.is_empty() && opts.config_path().is_none() {
        Opts::command().print_help().ok();
        return;
    }

    let _log_guard = match logging::init(opts.log.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let table = match load_rule_lines(&opts).and_then(RuleTable::parse) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if opts.dump {
        for rule in table.rules() {
            println!("{}", rule);
        }
        return;
    }

    let state = Arc::new(AppState { rules: table });

    // A single POST endpoint on any path.
    let app = Router::new()
        .fallback_service(routing::post(handlers::handle_webhook).with_state(state));

    let bind_address = format!("{}:{}", opts.interface, opts.port);
    info!("Listening on {}", bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
