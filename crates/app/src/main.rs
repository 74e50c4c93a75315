mod screens;

use std::fmt;
use std::fs;
use std::path::PathBuf;

use services::question_source::DEFAULT_ENDPOINT;
use services::{AppServices, QuestionKind, QuestionSourceConfig, QuizConfig};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidKind { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => {
                write!(f, "invalid {flag} value: {raw} (expected a positive integer)")
            }
            ArgsError::InvalidKind { raw } => {
                write!(f, "invalid --type value: {raw} (expected multiple or boolean)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_positive(flag: &'static str, raw: String) -> Result<u32, ArgsError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ArgsError::InvalidNumber { flag, raw }),
    }
}

fn parse_kind(raw: String) -> Result<QuestionKind, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidKind { raw })
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[derive(Debug)]
struct Args {
    db: Database,
    api_url: String,
    quiz: QuizConfig,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play  [--db <sqlite_url>] [--api-url <url>] [--amount <n>]");
    eprintln!("                            [--type <multiple|boolean>] [--time-limit <secs>]");
    eprintln!("  cargo run -p app -- reset [--db <sqlite_url>]  # discard the saved quiz");
    eprintln!();
    eprintln!("Defaults for play:");
    eprintln!("  --db {DEFAULT_DB_FILE} (relative to the working directory)");
    eprintln!("  --api-url {DEFAULT_ENDPOINT}");
    eprintln!("  --amount 10 --type multiple --time-limit 300");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_API_URL, QUIZ_AMOUNT, QUIZ_TYPE, QUIZ_TIME_LIMIT, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

impl Args {
    /// Start from the environment; flags parsed afterwards override it.
    fn from_env() -> Result<Self, ArgsError> {
        let mut quiz = QuizConfig::default();
        if let Some(raw) = env_value("QUIZ_AMOUNT") {
            quiz.amount = parse_positive("QUIZ_AMOUNT", raw)?;
        }
        if let Some(raw) = env_value("QUIZ_TYPE") {
            quiz.kind = parse_kind(raw)?;
        }
        if let Some(raw) = env_value("QUIZ_TIME_LIMIT") {
            quiz.time_limit_secs = parse_positive("QUIZ_TIME_LIMIT", raw)?;
        }

        Ok(Self {
            db: Database::resolve(
                env_value("QUIZ_DB_URL")
                    .as_deref()
                    .unwrap_or(DEFAULT_DB_FILE),
            )?,
            api_url: env_value("QUIZ_API_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.into()),
            quiz,
        })
    }

    fn parse(
        cmd: Command,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env()?;

        while let Some(arg) = args.next() {
            match (cmd, arg.as_str()) {
                (_, "--db") => {
                    parsed.db = Database::resolve(&require_value(args, "--db")?)?;
                }
                (Command::Play, "--api-url") => {
                    parsed.api_url = require_value(args, "--api-url")?;
                }
                (Command::Play, "--amount") => {
                    let value = require_value(args, "--amount")?;
                    parsed.quiz.amount = parse_positive("--amount", value)?;
                }
                (Command::Play, "--type") => {
                    parsed.quiz.kind = parse_kind(require_value(args, "--type")?)?;
                }
                (Command::Play, "--time-limit") => {
                    let value = require_value(args, "--time-limit")?;
                    parsed.quiz.time_limit_secs = parse_positive("--time-limit", value)?;
                }
                (_, "--help" | "-h") => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

const DEFAULT_DB_FILE: &str = "quiz.sqlite3";
const MEMORY_DB_URL: &str = "sqlite::memory:";

/// Where the quiz database lives, resolved once from the default, the
/// environment or `--db`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Database {
    Memory,
    File { path: PathBuf, query: Option<String> },
}

impl Database {
    /// Accepts `sqlite::memory:`, `sqlite://<path>`, `sqlite:<path>` or a bare
    /// path. Relative paths are anchored at the working directory.
    fn resolve(raw: &str) -> Result<Self, ArgsError> {
        let trimmed = raw.trim();
        if trimmed == MEMORY_DB_URL {
            return Ok(Self::Memory);
        }

        let location = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        let (path, query) = match location.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (location, None),
        };
        if path.is_empty() {
            return Err(ArgsError::InvalidDbUrl { raw: raw.to_owned() });
        }

        let path = std::path::absolute(path)
            .map_err(|_| ArgsError::InvalidDbUrl { raw: raw.to_owned() })?;
        Ok(Self::File { path, query })
    }

    fn url(&self) -> String {
        match self {
            Self::Memory => MEMORY_DB_URL.to_owned(),
            Self::File { path, query: None } => format!("sqlite://{}", path.display()),
            Self::File {
                path,
                query: Some(query),
            } => format!("sqlite://{}?{query}", path.display()),
        }
    }

    /// Create the database file and its directory if they are missing.
    fn ensure_exists(&self) -> std::io::Result<()> {
        let Self::File { path, .. } = self else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(())
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means play.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    parsed.db.ensure_exists()?;
    let db_url = parsed.db.url();
    let source_config = QuestionSourceConfig::new(&parsed.api_url)?;
    let services = AppServices::new_sqlite(&db_url, source_config, parsed.quiz).await?;
    log::info!("using database {db_url}");

    match cmd {
        Command::Play => screens::run(&services).await,
        Command::Reset => {
            services.sessions().clear().await?;
            println!("Saved quiz discarded.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
