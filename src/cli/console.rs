//! Text rendering of assistant replies for a terminal.

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::assistant::{Action, Content, Outbound, PresentationSink, ReportKind};
use crate::core::utils::ensure_dir;
use crate::ledger::row::format_stored_amount;
use crate::ledger::{EntryKind, MonthListing};

use super::output::{style, MessageKind, OutputPreferences};

pub struct ConsoleSink<W: Write> {
    out: W,
    prefs: OutputPreferences,
    chart_dir: PathBuf,
    chart_extension: &'static str,
    last_actions: Vec<Action>,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, prefs: OutputPreferences, chart_dir: PathBuf, chart_extension: &'static str) -> Self {
        Self {
            out,
            prefs,
            chart_dir,
            chart_extension,
            last_actions: Vec::new(),
        }
    }

    /// Actions of the most recent message that offered any, numbered from 1 on screen.
    pub fn last_actions(&self) -> &[Action] {
        &self.last_actions
    }

    pub fn action_at(&self, number: usize) -> Option<&Action> {
        number
            .checked_sub(1)
            .and_then(|index| self.last_actions.get(index))
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, kind: MessageKind, text: impl std::fmt::Display) -> io::Result<()> {
        let formatted = style(kind, text, self.prefs);
        if kind == MessageKind::Section {
            writeln!(self.out)?;
        }
        writeln!(self.out, "{formatted}")
    }

    fn render(&mut self, message: &Outbound) -> io::Result<()> {
        match &message.content {
            Content::Greeting => self.line(
                MessageKind::Info,
                "Hi! I keep the shared ledger. Pick an action below.",
            ),
            Content::MainMenu => self.line(MessageKind::Section, "Main menu"),
            Content::ChooseKind => self.line(MessageKind::Prompt, "Income or expense?"),
            Content::KindChosen(kind) => self.line(
                MessageKind::Prompt,
                format!("Selected {}. Enter the amount:", kind_caption(*kind)),
            ),
            Content::InvalidAmount { message } => self.line(MessageKind::Warning, message),
            Content::AskNote => self.line(
                MessageKind::Prompt,
                "Add a note (an empty line skips it):",
            ),
            Content::EntrySaved { kind, amount, note } => self.line(
                MessageKind::Success,
                format!("Saved: {}", confirmation(*kind, *amount, note)),
            ),
            Content::EntryRemoved { kind, amount, note } => self.line(
                MessageKind::Success,
                format!("Removed: {}", confirmation(*kind, *amount, note)),
            ),
            Content::NothingToUndo => self.line(MessageKind::Warning, "Nothing to undo."),
            Content::StaleReference => {
                self.line(MessageKind::Warning, "That entry no longer exists.")
            }
            Content::NotOwner => self.line(
                MessageKind::Warning,
                "Only the person who added that entry can undo it.",
            ),
            Content::ResourceLocked => self.line(
                MessageKind::Error,
                "The ledger file is open in another program. Close it and try again.",
            ),
            Content::Stats { month, totals } => {
                self.line(MessageKind::Section, month)?;
                self.line(
                    MessageKind::Info,
                    format!("Income:   {}", format_stored_amount(totals.income)),
                )?;
                self.line(
                    MessageKind::Info,
                    format!("Expenses: {}", format_stored_amount(totals.expense)),
                )?;
                self.line(
                    MessageKind::Info,
                    format!("Balance:  {}", format_signed(totals.balance())),
                )
            }
            Content::Logs { month, listing } => {
                self.line(MessageKind::Section, month)?;
                match listing {
                    MonthListing::NoEntries {
                        segment_present: false,
                    } => self.line(MessageKind::Info, format!("No records for {month}.")),
                    MonthListing::NoEntries {
                        segment_present: true,
                    } => self.line(MessageKind::Info, format!("No entries yet for {month}.")),
                    MonthListing::Lines(lines) => {
                        for line in lines {
                            self.line(MessageKind::Info, line)?;
                        }
                        Ok(())
                    }
                }
            }
            Content::MonthPicker { months, .. } if months.is_empty() => {
                self.line(MessageKind::Info, "No months recorded yet.")
            }
            Content::MonthPicker { .. } => self.line(MessageKind::Prompt, "Pick a month:"),
            Content::Failure { cause } => {
                self.line(MessageKind::Error, format!("Something went wrong: {cause}"))
            }
        }
    }

    fn render_image(&mut self, message: &Outbound) -> io::Result<()> {
        let Some(image) = &message.image else {
            return Ok(());
        };
        let stem = match &message.content {
            Content::Stats { month, .. } => month.as_str(),
            _ => "chart",
        };
        ensure_dir(&self.chart_dir)?;
        let path = self.chart_dir.join(format!(
            "{}_{}.{}",
            message.target,
            file_stem(stem),
            self.chart_extension
        ));
        std::fs::write(&path, image)?;
        debug!(path = %path.display(), "chart written");
        self.line(MessageKind::Info, format!("Chart saved to {}", path.display()))
    }

    fn render_actions(&mut self, actions: &[Action]) -> io::Result<()> {
        for (index, action) in actions.iter().enumerate() {
            let text = format!("  [{}] {} ({})", index + 1, action_caption(action), action.tag());
            self.line(MessageKind::Info, text)?;
        }
        Ok(())
    }
}

impl<W: Write> PresentationSink for ConsoleSink<W> {
    fn deliver(&mut self, message: Outbound) -> io::Result<()> {
        self.render(&message)?;
        self.render_image(&message)?;
        if !message.actions.is_empty() {
            self.render_actions(&message.actions)?;
            self.last_actions = message.actions;
        }
        self.out.flush()
    }
}

/// `+5000 — salary` style confirmation line.
pub fn confirmation(kind: EntryKind, amount: f64, note: &str) -> String {
    format!("{}{} — {}", kind.sign(), format_stored_amount(amount), note)
}

pub fn action_caption(action: &Action) -> String {
    match action {
        Action::Add => "Add".into(),
        Action::UndoLast => "Undo last".into(),
        Action::Stats => "Month stats".into(),
        Action::ChooseKind(kind) => kind_caption(*kind).into(),
        Action::PickMonth(ReportKind::Stats) => "Stats for another month".into(),
        Action::PickMonth(ReportKind::Logs) => "Logs for another month".into(),
        Action::ShowMonth(_, label) => label.clone(),
    }
}

fn kind_caption(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Income => "Income",
        EntryKind::Expense => "Expense",
    }
}

fn format_signed(value: f64) -> String {
    if value < 0.0 {
        format!("-{}", format_stored_amount(-value))
    } else {
        format_stored_amount(value)
    }
}

fn file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
