//! Routes inbound events to the session state machine and the ledger service.

use std::io;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::core::LedgerService;
use crate::errors::{LedgerError, Result};
use crate::ledger::EntryKind;
use crate::session::{
    ConversationState, Draft, Input, SessionKey, SessionManager, Step, DEFAULT_EMPTY_NOTE,
};

use super::chart::{month_bars, ChartRenderer};
use super::event::{Action, Command, Event, EventKind, ReportKind, Sender};
use super::outbound::{Content, Outbound, PresentationSink};

pub struct Assistant {
    ledger: Arc<LedgerService>,
    sessions: SessionManager,
    chart: Box<dyn ChartRenderer>,
    empty_note: String,
}

impl Assistant {
    pub fn new(ledger: Arc<LedgerService>, chart: Box<dyn ChartRenderer>) -> Self {
        Self {
            ledger,
            sessions: SessionManager::new(),
            chart,
            empty_note: DEFAULT_EMPTY_NOTE.to_string(),
        }
    }

    pub fn with_empty_note(mut self, note: impl Into<String>) -> Self {
        self.empty_note = note.into();
        self
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn ledger(&self) -> &LedgerService {
        &self.ledger
    }

    pub fn chart_extension(&self) -> &'static str {
        self.chart.extension()
    }

    /// Handles one event and returns the replies in delivery order.
    ///
    /// Errors never escape: the session is reset and the user gets the cause plus the menu.
    pub fn handle(&mut self, event: Event) -> Vec<Outbound> {
        let target = event.sender.session;
        match self.dispatch(&event) {
            Ok(replies) => replies,
            Err(err) => {
                error!(session = target, sender = %event.sender.name, %err, "event failed");
                self.sessions.reset(target);
                vec![
                    Outbound::new(
                        target,
                        Content::Failure {
                            cause: err.to_string(),
                        },
                    ),
                    Outbound::main_menu(target),
                ]
            }
        }
    }

    /// Handles `event` and pushes every reply into `sink`.
    pub fn handle_into(&mut self, event: Event, sink: &mut dyn PresentationSink) -> io::Result<()> {
        for reply in self.handle(event) {
            sink.deliver(reply)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: &Event) -> Result<Vec<Outbound>> {
        let sender = &event.sender;
        match &event.kind {
            EventKind::Command(command) => self.command(sender, *command),
            EventKind::Text(text) => self.text(sender, text),
            EventKind::Button(tag) => match Action::parse(tag) {
                Some(action) => self.action(sender, action),
                None => {
                    debug!(session = sender.session, tag = %tag, "unknown button ignored");
                    Ok(Vec::new())
                }
            },
        }
    }

    fn command(&mut self, sender: &Sender, command: Command) -> Result<Vec<Outbound>> {
        let target = sender.session;
        match command {
            Command::Start => Ok(vec![
                Outbound::new(target, Content::Greeting),
                Outbound::main_menu(target),
            ]),
            Command::BeginEntry => Ok(self.begin_entry(target)),
            Command::ShowStats => {
                let label = self.ledger.current_label();
                self.stats(target, label)
            }
            Command::ShowLogs => {
                let label = self.ledger.current_label();
                self.logs(target, label)
            }
        }
    }

    fn action(&mut self, sender: &Sender, action: Action) -> Result<Vec<Outbound>> {
        let target = sender.session;
        match action {
            Action::Add => Ok(self.begin_entry(target)),
            Action::UndoLast => self.undo_last(sender),
            Action::Stats => {
                let label = self.ledger.current_label();
                self.stats(target, label)
            }
            Action::ChooseKind(kind) => Ok(self.choose_kind(target, kind)),
            Action::PickMonth(report) => self.month_picker(target, report),
            Action::ShowMonth(ReportKind::Stats, label) => self.stats(target, label),
            Action::ShowMonth(ReportKind::Logs, label) => self.logs(target, label),
        }
    }

    fn begin_entry(&mut self, target: SessionKey) -> Vec<Outbound> {
        self.sessions.start_add(target);
        vec![Outbound::new(target, Content::ChooseKind).with_actions(vec![
            Action::ChooseKind(EntryKind::Income),
            Action::ChooseKind(EntryKind::Expense),
        ])]
    }

    fn choose_kind(&mut self, target: SessionKey, kind: EntryKind) -> Vec<Outbound> {
        match self
            .sessions
            .advance(target, Input::ChooseKind(kind), &self.empty_note)
        {
            Ok(_) => vec![Outbound::new(target, Content::KindChosen(kind))],
            Err(err) => {
                debug!(session = target, %err, "kind choice ignored");
                Vec::new()
            }
        }
    }

    fn text(&mut self, sender: &Sender, text: &str) -> Result<Vec<Outbound>> {
        let target = sender.session;
        let step = match self
            .sessions
            .advance(target, Input::Text(text), &self.empty_note)
        {
            Ok(step) => step,
            Err(err) => {
                debug!(session = target, %err, "text ignored");
                return Ok(Vec::new());
            }
        };
        match step {
            Step::Next(ConversationState::AwaitingNote { .. }) => {
                Ok(vec![Outbound::new(target, Content::AskNote)])
            }
            Step::Next(_) => Ok(Vec::new()),
            Step::Retry { error, .. } => Ok(vec![Outbound::new(
                target,
                Content::InvalidAmount {
                    message: error.message,
                },
            )]),
            Step::Complete(draft) => self.save_draft(sender, draft),
        }
    }

    fn save_draft(&mut self, sender: &Sender, draft: Draft) -> Result<Vec<Outbound>> {
        let target = sender.session;
        match self.ledger.record(&sender.name, &draft) {
            Ok(saved) => {
                self.sessions.record_added(target, saved.index);
                info!(session = target, index = saved.index, "entry saved");
                Ok(vec![
                    Outbound::new(
                        target,
                        Content::EntrySaved {
                            kind: draft.kind,
                            amount: draft.amount,
                            note: draft.note,
                        },
                    ),
                    Outbound::main_menu(target),
                ])
            }
            Err(LedgerError::ResourceLocked(what)) => {
                warn!(session = target, %what, "ledger locked, entry dropped");
                Ok(self.with_menu(target, Content::ResourceLocked))
            }
            Err(err) => Err(err),
        }
    }

    fn undo_last(&mut self, sender: &Sender) -> Result<Vec<Outbound>> {
        let target = sender.session;
        let reference = self.sessions.last_added(target);
        match self.ledger.undo(reference, &sender.name) {
            Ok(removed) => {
                self.sessions.forget_added(target);
                Ok(self.with_menu(
                    target,
                    Content::EntryRemoved {
                        kind: removed.kind,
                        amount: removed.amount,
                        note: removed.note,
                    },
                ))
            }
            Err(LedgerError::NothingToUndo) => Ok(self.with_menu(target, Content::NothingToUndo)),
            Err(LedgerError::StaleReference(_)) => {
                self.sessions.forget_added(target);
                Ok(self.with_menu(target, Content::StaleReference))
            }
            Err(LedgerError::NotOwner { .. }) => Ok(self.with_menu(target, Content::NotOwner)),
            Err(LedgerError::ResourceLocked(_)) => {
                Ok(self.with_menu(target, Content::ResourceLocked))
            }
            Err(err) => Err(err),
        }
    }

    fn stats(&self, target: SessionKey, month: String) -> Result<Vec<Outbound>> {
        let totals = self.ledger.totals(&month)?;
        let bars = month_bars(&totals, self.ledger.segmenter().locale());
        let image = self.chart.render(&month, &bars);
        Ok(vec![Outbound::new(target, Content::Stats { month, totals })
            .with_actions(vec![Action::PickMonth(ReportKind::Stats)])
            .with_image(image)])
    }

    fn logs(&self, target: SessionKey, month: String) -> Result<Vec<Outbound>> {
        let listing = self.ledger.listing(&month)?;
        Ok(vec![Outbound::new(target, Content::Logs { month, listing })
            .with_actions(vec![Action::PickMonth(ReportKind::Logs)])])
    }

    fn month_picker(&self, target: SessionKey, report: ReportKind) -> Result<Vec<Outbound>> {
        let months = self.ledger.month_labels()?;
        let actions = months
            .iter()
            .map(|label| Action::ShowMonth(report, label.clone()))
            .collect();
        Ok(vec![
            Outbound::new(target, Content::MonthPicker { report, months }).with_actions(actions)
        ])
    }

    fn with_menu(&self, target: SessionKey, content: Content) -> Vec<Outbound> {
        vec![Outbound::new(target, content), Outbound::main_menu(target)]
    }
}
