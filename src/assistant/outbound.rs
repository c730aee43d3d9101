//! Structured replies. Sinks decide how they look.

use std::io;

use crate::ledger::{EntryKind, MonthListing, MonthTotals};
use crate::session::SessionKey;

use super::event::{Action, ReportKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Greeting,
    MainMenu,
    ChooseKind,
    KindChosen(EntryKind),
    InvalidAmount { message: String },
    AskNote,
    EntrySaved { kind: EntryKind, amount: f64, note: String },
    EntryRemoved { kind: EntryKind, amount: f64, note: String },
    NothingToUndo,
    StaleReference,
    NotOwner,
    /// The ledger file is held by another program; the user has to close it.
    ResourceLocked,
    Stats { month: String, totals: MonthTotals },
    Logs { month: String, listing: MonthListing },
    MonthPicker { report: ReportKind, months: Vec<String> },
    Failure { cause: String },
}

/// One message for the presentation sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub target: SessionKey,
    pub content: Content,
    pub actions: Vec<Action>,
    pub image: Option<Vec<u8>>,
}

impl Outbound {
    pub fn new(target: SessionKey, content: Content) -> Self {
        Self {
            target,
            content,
            actions: Vec::new(),
            image: None,
        }
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        if !image.is_empty() {
            self.image = Some(image);
        }
        self
    }

    pub fn main_menu(target: SessionKey) -> Self {
        Self::new(target, Content::MainMenu).with_actions(Action::main_menu())
    }
}

/// Delivers replies to people.
pub trait PresentationSink {
    fn deliver(&mut self, message: Outbound) -> io::Result<()>;
}

/// Keeps every delivered message in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub delivered: Vec<Outbound>,
}

impl PresentationSink for RecordingSink {
    fn deliver(&mut self, message: Outbound) -> io::Result<()> {
        self.delivered.push(message);
        Ok(())
    }
}
