use std::{
    borrow::Cow,
    io::{self, BufRead, Stdout},
    path::PathBuf,
    sync::Arc,
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::{ValidationContext, ValidationResult, Validator},
    Context as ReadlineContext, Editor, Helper,
};
use shell_words::split;
use strsim::levenshtein;
use tracing::info;

use crate::assistant::{Assistant, Command, Event, Sender, SvgBarChart};
use crate::config::ConfigManager;
use crate::core::{utils::PathResolver, LedgerService, SystemClock};
use crate::errors::CliError;
use crate::ledger::MonthSegmenter;
use crate::session::SessionKey;
use crate::storage::CsvLedgerStore;
use crate::utils::build_info;

use super::console::ConsoleSink;
use super::output::{self, OutputPreferences};

pub const SCRIPT_ENV: &str = "CASHFLOW_CLI_SCRIPT";
const DEFAULT_SESSION: SessionKey = 1;

/// Shell commands, typed with a leading `/`.
pub const COMMANDS: [&str; 9] = [
    "start", "add", "stats", "logs", "press", "as", "session", "help", "exit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Command-line flags of the console binary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub home: Option<PathBuf>,
    pub ledger: Option<PathBuf>,
    pub user: Option<String>,
    pub session: Option<SessionKey>,
}

impl CliOptions {
    pub const USAGE: &'static str =
        "usage: cashflow_cli [--home DIR] [--ledger FILE] [--user NAME] [--session ID]";

    /// Parses flags, program name excluded.
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| CliError::Input(format!("`{flag}` needs a value\n{}", Self::USAGE)))
            };
            match flag.as_str() {
                "--home" => options.home = Some(PathBuf::from(value()?)),
                "--ledger" => options.ledger = Some(PathBuf::from(value()?)),
                "--user" => options.user = Some(value()?),
                "--session" => {
                    let raw = value()?;
                    let id = raw
                        .parse()
                        .map_err(|_| CliError::Input(format!("invalid session id `{raw}`")))?;
                    options.session = Some(id);
                }
                other => {
                    return Err(CliError::Input(format!(
                        "unknown flag `{other}`\n{}",
                        Self::USAGE
                    )))
                }
            }
        }
        Ok(options)
    }
}

pub fn run_cli(options: CliOptions) -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode, options)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

pub struct ShellContext {
    assistant: Assistant,
    sink: ConsoleSink<Stdout>,
    sender: Sender,
    prefs: OutputPreferences,
    running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode, options: CliOptions) -> Result<Self, CliError> {
        let base = PathResolver::resolve_base(options.home);
        let manager = ConfigManager::with_base_dir(base.clone())?;
        let config = manager.load()?;

        let ledger_path = options
            .ledger
            .unwrap_or_else(|| config.ledger_path(manager.base_dir()));
        let mut store = CsvLedgerStore::new(ledger_path, config.locale);
        if config.backup_retention > 0 {
            store = store.with_backups(PathResolver::backup_dir_in(&base), config.backup_retention);
        }
        info!(
            ledger = %store.path().display(),
            locale = %config.locale,
            "console session starting"
        );

        let segmenter = MonthSegmenter::new(config.locale, Arc::new(SystemClock));
        let service = LedgerService::new(Arc::new(store), segmenter, config.lock_retry)
            .with_default_source(config.default_source.clone());
        let assistant = Assistant::new(Arc::new(service), Box::new(SvgBarChart::default()))
            .with_empty_note(config.empty_note.clone());

        let prefs = OutputPreferences {
            plain: mode == CliMode::Script,
        };
        let sink = ConsoleSink::new(
            io::stdout(),
            prefs,
            PathResolver::chart_dir_in(&base),
            assistant.chart_extension(),
        );
        let name = options.user.unwrap_or_else(default_user);
        let session = options.session.unwrap_or(DEFAULT_SESSION);

        Ok(Self {
            assistant,
            sink,
            sender: Sender::new(session, name),
            prefs,
            running: true,
        })
    }

    fn prompt(&self) -> String {
        format!("{}@{}> ", self.sender.name, self.sender.session)
    }

    fn send(&mut self, event: Event) -> Result<(), CliError> {
        self.assistant.handle_into(event, &mut self.sink)?;
        Ok(())
    }

    fn press(&mut self, tag: String) -> Result<(), CliError> {
        let event = Event::button(self.sender.clone(), tag);
        self.send(event)
    }

    fn dispatch(&mut self, command: &str, args: &[String]) -> Result<LoopControl, CliError> {
        if let Some(chat_command) = Command::parse(command) {
            let event = Event::command(self.sender.clone(), chat_command);
            self.send(event)?;
            return Ok(LoopControl::Continue);
        }
        match command {
            "press" => {
                if args.is_empty() {
                    return Err(CliError::Input("usage: /press <tag>".into()));
                }
                self.press(args.join(" "))?;
            }
            "as" => {
                if args.is_empty() {
                    return Err(CliError::Input("usage: /as <name>".into()));
                }
                self.sender.name = args.join(" ");
                output::info(format!("Now writing as {}.", self.sender.name), self.prefs);
            }
            "session" => {
                let raw = args
                    .first()
                    .ok_or_else(|| CliError::Input("usage: /session <id>".into()))?;
                self.sender.session = raw
                    .parse()
                    .map_err(|_| CliError::Input(format!("invalid session id `{raw}`")))?;
                output::info(format!("Switched to session {}.", self.sender.session), self.prefs);
            }
            "help" => self.print_help(),
            "exit" | "quit" => return Ok(LoopControl::Exit),
            other => self.suggest_command(other),
        }
        Ok(LoopControl::Continue)
    }

    fn print_help(&self) {
        let lines = [
            "/start            greeting and main menu",
            "/add              record an income or expense",
            "/stats            totals for the current month",
            "/logs             entries of the current month",
            "/press <tag>      press a button by its tag",
            "#<n>              press button number n of the last menu",
            "/as <name>        change who is typing",
            "/session <id>     switch conversation",
            "/exit             leave",
            "Anything else is sent as a chat message.",
        ];
        for line in lines {
            output::info(line, self.prefs);
        }
    }

    fn suggest_command(&self, input: &str) {
        output::warning(format!("Unknown command `/{input}`."), self.prefs);

        let mut suggestions: Vec<_> = COMMANDS
            .iter()
            .map(|name| (levenshtein(name, input), *name))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::info(format!("Suggestion: `/{}`?", best), self.prefs);
            }
        }
    }

    fn report_error(&self, err: CliError) -> Result<(), CliError> {
        match err {
            CliError::Input(message) => {
                output::warning(message, self.prefs);
                Ok(())
            }
            CliError::Command(message) => {
                output::error(message, self.prefs);
                Ok(())
            }
            fatal => Err(fatal),
        }
    }
}

fn default_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "me".to_string())
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(CommandHelper::new(&COMMANDS)));

    output::info(
        format!("Cashflow {}", build_info::current().summary()),
        context.prefs,
    );
    output::info("Type /help for commands.", context.prefs);
    context.send(Event::command(context.sender.clone(), Command::Start))?;

    while context.running {
        let prompt = context.prompt();
        match editor.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(line.trim()).ok();
                }
                match handle_line(context, &line) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => context.report_error(err)?,
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                output::info("Bye.", context.prefs);
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if !context.running {
            break;
        }
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err)?,
        }
    }
    Ok(())
}

/// `/cmd args` runs a shell command, `#n` presses a numbered button, anything else
/// (blank lines included) is chat text.
fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    let trimmed = line.trim();

    if let Some(number) = trimmed.strip_prefix('#') {
        let tag = number
            .parse::<usize>()
            .ok()
            .and_then(|n| context.sink.action_at(n))
            .map(|action| action.tag())
            .ok_or_else(|| CliError::Input(format!("no button `{trimmed}` on screen")))?;
        context.press(tag)?;
        return Ok(LoopControl::Continue);
    }

    let Some(command_line) = trimmed.strip_prefix('/') else {
        context.send(Event::text(context.sender.clone(), line))?;
        return Ok(LoopControl::Continue);
    };

    let tokens = split(command_line).map_err(|err| CliError::Input(err.to_string()))?;
    let Some((command, args)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };

    let control = context.dispatch(&command.to_lowercase(), args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

struct CommandHelper {
    commands: Vec<String>,
}

impl CommandHelper {
    fn new(names: &[&str]) -> Self {
        let mut commands: Vec<String> = names.iter().map(|name| format!("/{name}")).collect();
        commands.sort();
        Self { commands }
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        if !prefix.starts_with('/') || prefix.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        let needle = prefix.to_lowercase();
        let candidates = self
            .commands
            .iter()
            .filter(|name| name.starts_with(&needle))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn options_parse_every_flag() {
        let options = CliOptions::parse(args(&[
            "--home", "/tmp/h", "--ledger", "/tmp/l.csv", "--user", "Bob", "--session", "-42",
        ]))
        .unwrap();
        assert_eq!(options.home, Some(PathBuf::from("/tmp/h")));
        assert_eq!(options.ledger, Some(PathBuf::from("/tmp/l.csv")));
        assert_eq!(options.user.as_deref(), Some("Bob"));
        assert_eq!(options.session, Some(-42));
    }

    #[test]
    fn options_reject_unknown_and_incomplete_flags() {
        assert!(matches!(
            CliOptions::parse(args(&["--verbose"])),
            Err(CliError::Input(_))
        ));
        assert!(matches!(
            CliOptions::parse(args(&["--user"])),
            Err(CliError::Input(_))
        ));
    }

    #[test]
    fn helper_lists_slash_commands() {
        let helper = CommandHelper::new(&COMMANDS);
        assert!(helper.commands.contains(&"/press".to_string()));
    }
}
