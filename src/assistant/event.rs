//! Inbound events, transport-agnostic.

use crate::ledger::EntryKind;
use crate::session::SessionKey;

/// Who sent an event: the conversation it belongs to and the person's display name.
/// The name is what gets written into the author column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub session: SessionKey,
    pub name: String,
}

impl Sender {
    pub fn new(session: SessionKey, name: impl Into<String>) -> Self {
        Self {
            session,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    BeginEntry,
    ShowStats,
    ShowLogs,
}

impl Command {
    /// Accepts both the chat command names and the long forms.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().trim_start_matches('/').to_lowercase().as_str() {
            "start" => Some(Command::Start),
            "add" | "begin-entry" => Some(Command::BeginEntry),
            "stats" | "show-stats" => Some(Command::ShowStats),
            "logs" | "show-logs" => Some(Command::ShowLogs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Command(Command),
    Text(String),
    /// Button press carrying an opaque tag.
    Button(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub sender: Sender,
    pub kind: EventKind,
}

impl Event {
    pub fn command(sender: Sender, command: Command) -> Self {
        Self {
            sender,
            kind: EventKind::Command(command),
        }
    }

    pub fn text(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            kind: EventKind::Text(text.into()),
        }
    }

    pub fn button(sender: Sender, tag: impl Into<String>) -> Self {
        Self {
            sender,
            kind: EventKind::Button(tag.into()),
        }
    }
}

/// Which month report a picker or month button leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Stats,
    Logs,
}

/// Selectable action attached to an outbound message. Round-trips through its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add,
    UndoLast,
    Stats,
    ChooseKind(EntryKind),
    PickMonth(ReportKind),
    ShowMonth(ReportKind, String),
}

impl Action {
    pub fn tag(&self) -> String {
        match self {
            Action::Add => "main_add".into(),
            Action::UndoLast => "main_cancel".into(),
            Action::Stats => "main_stats".into(),
            Action::ChooseKind(EntryKind::Income) => "inc".into(),
            Action::ChooseKind(EntryKind::Expense) => "exp".into(),
            Action::PickMonth(ReportKind::Stats) => "choose_stats".into(),
            Action::PickMonth(ReportKind::Logs) => "choose_logs".into(),
            Action::ShowMonth(ReportKind::Stats, label) => format!("s_{label}"),
            Action::ShowMonth(ReportKind::Logs, label) => format!("l_{label}"),
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        let action = match tag {
            "main_add" => Action::Add,
            "main_cancel" => Action::UndoLast,
            "main_stats" => Action::Stats,
            "inc" => Action::ChooseKind(EntryKind::Income),
            "exp" => Action::ChooseKind(EntryKind::Expense),
            "choose_stats" => Action::PickMonth(ReportKind::Stats),
            "choose_logs" => Action::PickMonth(ReportKind::Logs),
            other => {
                if let Some(label) = other.strip_prefix("s_").filter(|l| !l.is_empty()) {
                    Action::ShowMonth(ReportKind::Stats, label.to_string())
                } else if let Some(label) = other.strip_prefix("l_").filter(|l| !l.is_empty()) {
                    Action::ShowMonth(ReportKind::Logs, label.to_string())
                } else {
                    return None;
                }
            }
        };
        Some(action)
    }

    /// The three entries of the main menu.
    pub fn main_menu() -> Vec<Action> {
        vec![Action::Add, Action::UndoLast, Action::Stats]
    }
}
