//! Interactive shell for the Voxmate assistant.
//!
//! # Responsibility
//! - Resolve config, verify mandatory directories and start logging.
//! - Read utterances from stdin and print replies until an exit command.
//!
//! # Invariants
//! - Exit code is non-zero only for launch failures.
//! - A failing command never ends the session.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use voxmate_core::handlers::entertainment::audio_output_available;
use voxmate_core::logging::LoggingError;
use voxmate_core::platform::SystemCommandRunner;
use voxmate_core::{
    init_logging, Assistant, AssistantConfig, Capability, CapabilitySet, ConfigError,
    Conversation,
};

#[derive(Debug, Parser)]
#[command(name = "voxmate", version, about = "Text-driven personal assistant")]
struct Cli {
    /// Directory for todo.json, notes.json and reminders.json.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the interactive session (default).
    Run,
    /// Print the dependency report and exit.
    Check,
    /// Handle a single utterance and exit.
    Say {
        #[arg(required = true, trailing_var_arg = true)]
        utterance: Vec<String>,
    },
}

/// Reads follow-up answers from the same stdin as the main loop.
struct StdinConversation<'a> {
    input: &'a mut dyn BufRead,
}

impl Conversation for StdinConversation<'_> {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        println!("{prompt}");
        print!("> ");
        let _ = io::stdout().flush();
        read_line(self.input)
    }
}

fn read_line(input: &mut dyn BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

/// Reasons the launcher aborts before the session starts.
#[derive(Debug)]
enum LaunchError {
    Config(ConfigError),
    Logging(LoggingError),
    WorkingDir(io::Error),
}

impl Display for LaunchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Logging(err) => write!(f, "logging error: {err}"),
            Self::WorkingDir(err) => write!(f, "failed to read working directory: {err}"),
        }
    }
}

impl Error for LaunchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::WorkingDir(err) => Some(err),
        }
    }
}

impl From<ConfigError> for LaunchError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for LaunchError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

fn main() -> ExitCode {
    match launch(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("voxmate: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn launch(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(cli.data_dir, cli.log_dir, cli.log_level)
        .context("failed to resolve configuration")?;

    if let Some(Command::Check) = cli.command {
        return Ok(run_check(&config));
    }

    prepare(&config).context("startup aborted")?;
    let mut assistant = Assistant::from_system(config);
    match cli.command.unwrap_or(Command::Run) {
        Command::Run | Command::Check => run_session(&mut assistant),
        Command::Say { utterance } => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut conversation = StdinConversation { input: &mut input };
            let outcome = assistant.handle(&utterance.join(" "), &mut conversation);
            println!("{}", outcome.reply);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn resolve_config(
    data_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
) -> Result<AssistantConfig, LaunchError> {
    let mut config = AssistantConfig::from_env()?;
    if let Some(dir) = data_dir {
        config.data_dir = absolute(dir)?;
    }
    if let Some(dir) = log_dir {
        config.log_dir = absolute(dir)?;
    }
    if let Some(level) = log_level {
        config.log_level = level;
    }
    Ok(config)
}

/// Verifies the mandatory directories and starts logging.
fn prepare(config: &AssistantConfig) -> Result<(), LaunchError> {
    config.ensure_dirs()?;
    init_logging(&config.log_level, &config.log_dir, true)?;
    Ok(())
}

fn absolute(path: PathBuf) -> Result<PathBuf, LaunchError> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(LaunchError::WorkingDir)?;
    Ok(cwd.join(path))
}

fn run_session(assistant: &mut Assistant) {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!("{}", assistant.greet_now());
    loop {
        if let Some(announcement) = assistant.announce_due_reminders() {
            println!("{announcement}");
        }

        print!("> ");
        let _ = io::stdout().flush();
        let Some(line) = read_line(&mut input) else {
            info!("event=session_end module=cli status=eof");
            break;
        };
        if line.is_empty() {
            continue;
        }

        if voxmate_core::match_command(&line).is_some() {
            println!("{}", assistant.acknowledgement());
        }
        let mut conversation = StdinConversation { input: &mut input };
        let outcome = assistant.handle(&line, &mut conversation);
        println!("{}", outcome.reply);
        if outcome.exit {
            info!("event=session_end module=cli status=exit");
            break;
        }
    }
}

/// Prints the dependency report. Only the mandatory directories decide the
/// exit code; optional capabilities are informational.
fn run_check(config: &AssistantConfig) -> ExitCode {
    let mandatory = prepare(config);
    match &mandatory {
        Ok(()) => println!("{:<15} {:<4} {}", "storage", "yes", config.data_dir.display()),
        Err(err) => println!("{:<15} {:<4} {err}", "storage", "no"),
    }

    let mut capabilities = CapabilitySet::probe(config, &SystemCommandRunner::new());
    if capabilities.contains(Capability::Audio) && !audio_output_available() {
        capabilities.remove(Capability::Audio);
    }
    for capability in Capability::all() {
        println!(
            "{:<15} {:<4} {}",
            capability.as_str(),
            if capabilities.contains(*capability) { "yes" } else { "no" },
            capability.description()
        );
    }

    if mandatory.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::{absolute, read_line, Cli, Command, StdinConversation};
    use clap::Parser;
    use std::io::Cursor;
    use std::path::PathBuf;
    use voxmate_core::Conversation;

    #[test]
    fn no_subcommand_defaults_to_run() {
        let cli = Cli::try_parse_from(["voxmate"]).expect("bare invocation should parse");
        assert!(cli.command.is_none());
        assert!(cli.data_dir.is_none());
    }

    #[test]
    fn say_collects_trailing_words_and_global_flags() {
        let cli = Cli::try_parse_from([
            "voxmate",
            "say",
            "--data-dir",
            "/tmp/vox",
            "add",
            "task",
            "buy milk",
        ])
        .expect("say should parse");
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/vox")));
        match cli.command {
            Some(Command::Say { utterance }) => assert_eq!(utterance.join(" "), "add task buy milk"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn say_requires_an_utterance() {
        assert!(Cli::try_parse_from(["voxmate", "say"]).is_err());
    }

    #[test]
    fn read_line_trims_and_stops_at_eof() {
        let mut input = Cursor::new("  hello  \n");
        assert_eq!(read_line(&mut input).as_deref(), Some("hello"));
        assert_eq!(read_line(&mut input), None);
    }

    #[test]
    fn stdin_conversation_answers_from_input() {
        let mut input = Cursor::new("groceries\n");
        let mut conversation = StdinConversation { input: &mut input };
        assert_eq!(conversation.ask("What task?").as_deref(), Some("groceries"));
        assert_eq!(conversation.ask("Anything else?"), None);
    }

    #[test]
    fn relative_paths_resolve_against_working_dir() {
        let resolved = absolute(PathBuf::from("data")).expect("cwd should be readable");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("data"));
        assert_eq!(
            absolute(PathBuf::from("/srv/data")).expect("absolute path"),
            PathBuf::from("/srv/data")
        );
    }
}
