//! Conversation front end: turns inbound events into ledger operations and structured replies.

pub mod chart;
pub mod dispatch;
pub mod event;
pub mod outbound;

pub use chart::{month_bars, Bar, ChartRenderer, NoChart, SvgBarChart};
pub use dispatch::Assistant;
pub use event::{Action, Command, Event, EventKind, ReportKind, Sender};
pub use outbound::{Content, Outbound, PresentationSink, RecordingSink};
