//! Concrete tools for the aide assistant suite, and the external service
//! contracts they consume.
//!
//! Every external system (calendar, mail, documents, spreadsheets, web
//! search) sits behind a small trait; tools hold `Arc<dyn Service>` handles
//! and render every outcome, including failures, into tool-result text the
//! model can read. In-memory implementations of each service back the test
//! suite and the demo wiring.
//!
//! The calendar module carries the scheduling engine: validated event
//! creation with business-hours enforcement, half-open conflict detection,
//! and alternative-slot search.

pub mod calendar;
pub mod docs;
pub mod mail;
pub mod search;
pub mod sheets;

pub use calendar::scheduling::{
    parse_instant, schedule, schedule_at, BusinessHours, ScheduleOutcome, ScheduleRequest, Slot,
};
pub use calendar::tools::calendar_toolset;
pub use calendar::{CalendarError, CalendarService, Event, EventDraft, InMemoryCalendar};
pub use docs::{doc_toolset, DocSink, Document, DocumentError, DocumentStore, InMemoryDocs};
pub use mail::{mail_toolset, EmailMessage, InMemoryMailbox, MailError, MailService};
pub use search::{SearchError, SearchHit, SearchProvider, StaticSearchIndex, WebSearchTool};
pub use sheets::{sheet_toolset, InMemorySheets, SheetError, SheetStore};
