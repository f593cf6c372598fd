use std::fmt;
use std::path::PathBuf;

use services::api::UnknownNlpAction;
use services::{ApiConfig, AppServices, Clock, Language, NlpAction};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt as log_fmt;
use vocab_core::model::{Difficulty, UnknownDifficulty};

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { command: &'static str, flag: &'static str },
    MissingWord,
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidDifficulty(UnknownDifficulty),
    InvalidAction(UnknownNlpAction),
    InvalidLanguage(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => write!(f, "{command} requires {flag}"),
            ArgsError::MissingWord => write!(f, "pronounce requires a word"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDifficulty(err) => write!(f, "invalid --difficulty value: {err}"),
            ArgsError::InvalidAction(err) => write!(f, "invalid --action value: {err}"),
            ArgsError::InvalidLanguage(err) => write!(f, "invalid --language value: {err}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [dashboard]                                    # tracked words and recent quizzes");
    eprintln!("  app practice                                       # quiz on your tracked words");
    eprintln!("  app daily                                          # today's challenge");
    eprintln!("  app play --csv <file> [--difficulty easy|medium|hard]");
    eprintln!("  app nlp --csv <file> --action <name>");
    eprintln!("  app chat [--language en|hi]");
    eprintln!("  app pronounce <word> [--out <file>]");
    eprintln!("  app clear                                          # forget all progress");
    eprintln!();
    eprintln!("Common flags:");
    eprintln!("  --db <sqlite_url>   default sqlite://vocab.sqlite3");
    eprintln!("  --api-url <url>     analysis backend");
    eprintln!();
    eprintln!("Analyses: {}", NlpAction::ALL.map(NlpAction::name).join(", "));
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  VOCAB_DB_URL, VOCAB_API_URL, VOCAB_LOG (tracing filter, default warn)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Dashboard,
    Practice,
    Daily,
    Play,
    Nlp,
    Chat,
    Pronounce,
    Clear,
}

impl CommandKind {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "dashboard" => Some(Self::Dashboard),
            "practice" => Some(Self::Practice),
            "daily" => Some(Self::Daily),
            "play" => Some(Self::Play),
            "nlp" => Some(Self::Nlp),
            "chat" => Some(Self::Chat),
            "pronounce" => Some(Self::Pronounce),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Dashboard,
    Practice,
    Daily,
    Play {
        csv: PathBuf,
        difficulty: Option<Difficulty>,
    },
    Nlp {
        csv: PathBuf,
        action: NlpAction,
    },
    Chat {
        language: Language,
    },
    Pronounce {
        word: String,
        out: Option<PathBuf>,
    },
    Clear,
}

#[derive(Debug)]
struct Args {
    db_url: String,
    api_url: Option<String>,
    command: Command,
}

impl Args {
    /// Parse `argv` (without the program name). `Ok(None)` means help was requested.
    fn parse(argv: Vec<String>) -> Result<Option<Self>, ArgsError> {
        let mut db_url = std::env::var("VOCAB_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| "sqlite://vocab.sqlite3".into(), normalize_sqlite_url);
        let mut api_url = None;
        let mut csv: Option<PathBuf> = None;
        let mut difficulty: Option<Difficulty> = None;
        let mut action: Option<NlpAction> = None;
        let mut language = Language::default();
        let mut out: Option<PathBuf> = None;
        let mut kind: Option<CommandKind> = None;
        let mut positional: Vec<String> = Vec::new();

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--api-url" => api_url = Some(require_value(&mut args, "--api-url")?),
                "--csv" => csv = Some(PathBuf::from(require_value(&mut args, "--csv")?)),
                "--difficulty" => {
                    let value = require_value(&mut args, "--difficulty")?;
                    difficulty = Some(value.parse::<Difficulty>().map_err(ArgsError::InvalidDifficulty)?);
                }
                "--action" => {
                    let value = require_value(&mut args, "--action")?;
                    action = Some(value.parse::<NlpAction>().map_err(ArgsError::InvalidAction)?);
                }
                "--language" => {
                    let value = require_value(&mut args, "--language")?;
                    language = value.parse::<Language>().map_err(ArgsError::InvalidLanguage)?;
                }
                "--out" => out = Some(PathBuf::from(require_value(&mut args, "--out")?)),
                "--help" | "-h" => return Ok(None),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if kind.is_none() => {
                    kind = Some(CommandKind::from_arg(&arg).ok_or(ArgsError::UnknownArg(arg))?);
                }
                _ => positional.push(arg),
            }
        }

        let kind = kind.unwrap_or(CommandKind::Dashboard);
        if kind != CommandKind::Pronounce {
            if let Some(extra) = positional.first() {
                return Err(ArgsError::UnknownArg(extra.clone()));
            }
        }

        let command = match kind {
            CommandKind::Dashboard => Command::Dashboard,
            CommandKind::Practice => Command::Practice,
            CommandKind::Daily => Command::Daily,
            CommandKind::Clear => Command::Clear,
            CommandKind::Chat => Command::Chat { language },
            CommandKind::Play => Command::Play {
                csv: csv.ok_or(ArgsError::MissingFlag {
                    command: "play",
                    flag: "--csv",
                })?,
                difficulty,
            },
            CommandKind::Nlp => Command::Nlp {
                csv: csv.ok_or(ArgsError::MissingFlag {
                    command: "nlp",
                    flag: "--csv",
                })?,
                action: action.ok_or(ArgsError::MissingFlag {
                    command: "nlp",
                    flag: "--action",
                })?,
            },
            CommandKind::Pronounce => {
                let word = positional.join(" ");
                if word.trim().is_empty() {
                    return Err(ArgsError::MissingWord);
                }
                Command::Pronounce { word, out }
            }
        };

        Ok(Some(Self {
            db_url,
            api_url,
            command,
        }))
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Logs go to stderr so they never interleave with prompts on stdout.
fn init_tracing() {
    let level = std::env::var("VOCAB_LOG").unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"));
    log_fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let Some(parsed) = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    let api = parsed
        .api_url
        .clone()
        .map_or_else(ApiConfig::from_env, |url| ApiConfig::new(url));

    // Open + migrate SQLite at startup.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, Clock::default_clock(), api).await?;
    tracing::debug!(db_url = %parsed.db_url, command = ?parsed.command, "starting");

    let mut term = terminal::Terminal::new();
    match parsed.command {
        Command::Dashboard => terminal::show_dashboard(&mut term, &app).await,
        Command::Practice => terminal::practice(&mut term, &app).await,
        Command::Daily => terminal::daily(&mut term, &app).await,
        Command::Play { csv, difficulty } => terminal::play(&mut term, &app, &csv, difficulty).await,
        Command::Nlp { csv, action } => terminal::analyze(&mut term, &app, &csv, action).await,
        Command::Chat { language } => terminal::chat(&mut term, &app, language).await,
        Command::Pronounce { word, out } => {
            terminal::pronounce(&mut term, &app, &word, out).await
        }
        Command::Clear => terminal::clear(&mut term, &app).await,
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>, ArgsError> {
        Args::parse(args.iter().map(|a| (*a).to_owned()).collect())
    }

    #[test]
    fn no_arguments_opens_dashboard() {
        let args = parse(&[]).unwrap().unwrap();
        assert_eq!(args.command, Command::Dashboard);
    }

    #[test]
    fn play_needs_csv_and_parses_difficulty() {
        assert!(matches!(
            parse(&["play"]),
            Err(ArgsError::MissingFlag { command: "play", .. })
        ));
        let args = parse(&["play", "--csv", "words.csv", "--difficulty", "Hard"])
            .unwrap()
            .unwrap();
        assert_eq!(
            args.command,
            Command::Play {
                csv: PathBuf::from("words.csv"),
                difficulty: Some(Difficulty::Hard),
            }
        );
    }

    #[test]
    fn nlp_parses_action_names() {
        let args = parse(&["nlp", "--csv", "t.csv", "--action", "stopword-removal"])
            .unwrap()
            .unwrap();
        assert_eq!(
            args.command,
            Command::Nlp {
                csv: PathBuf::from("t.csv"),
                action: NlpAction::StopwordRemoval,
            }
        );
        assert!(matches!(
            parse(&["nlp", "--csv", "t.csv", "--action", "parse"]),
            Err(ArgsError::InvalidAction(_))
        ));
    }

    #[test]
    fn pronounce_takes_the_rest_as_word() {
        let args = parse(&["pronounce", "ice", "cream", "--out", "a.wav"]).unwrap().unwrap();
        assert_eq!(
            args.command,
            Command::Pronounce {
                word: "ice cream".into(),
                out: Some(PathBuf::from("a.wav")),
            }
        );
        assert!(matches!(parse(&["pronounce"]), Err(ArgsError::MissingWord)));
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(matches!(parse(&["fly"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(parse(&["daily", "--fast"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(parse(&["daily", "extra"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(parse(&["--db"]), Err(ArgsError::MissingValue { .. })));
        assert!(parse(&["--help"]).unwrap().is_none());
    }

    #[test]
    fn chat_language_flag() {
        let args = parse(&["chat", "--language", "hi"]).unwrap().unwrap();
        assert_eq!(args.command, Command::Chat { language: Language::Hi });
    }
}
