//! Calendar service contract and event model.
//!
//! Events are owned by the calendar service: the scheduling engine reads
//! and creates them but never caches them beyond a single conflict check.

pub mod scheduling;
pub mod tools;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Errors from a calendar backend.
#[derive(Error, Debug)]
pub enum CalendarError {
    /// No event with the given id.
    #[error("event not found: {0}")]
    NotFound(String),

    /// The backend failed.
    #[error("calendar service error: {0}")]
    Service(String),
}

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Backend-assigned identifier.
    pub id: String,

    /// Event title.
    pub summary: String,

    /// Start instant (UTC).
    pub start: DateTime<Utc>,

    /// End instant (UTC); always after `start`.
    pub end: DateTime<Utc>,

    /// Optional long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Attendee email addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
}

impl Event {
    /// Check whether this event overlaps the half-open interval
    /// `[start, end)`. Back-to-back events never overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}

/// A new event to insert; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Event title.
    pub summary: String,

    /// Start instant (UTC).
    pub start: DateTime<Utc>,

    /// End instant (UTC).
    pub end: DateTime<Utc>,

    /// Optional long description.
    pub description: Option<String>,

    /// Attendee email addresses.
    pub attendees: Vec<String>,
}

impl EventDraft {
    /// Create a bare draft.
    pub fn new(summary: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            summary: summary.into(),
            start,
            end,
            description: None,
            attendees: Vec::new(),
        }
    }
}

/// External calendar backend contract.
///
/// Time bounds are UTC instants; `list_events` uses half-open overlap
/// semantics against `[time_min, time_max)`.
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Events overlapping `[time_min, time_max)`, ordered by start.
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<Event>, CalendarError>;

    /// Events overlapping the window whose summary or description contains
    /// the query (case-insensitive), ordered by start.
    async fn search_events(
        &self,
        query: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<Event>, CalendarError>;

    /// Fetch one event by id.
    async fn get_event(&self, event_id: &str) -> Result<Event, CalendarError>;

    /// Insert a new event and return it with its assigned id.
    async fn insert_event(&self, draft: EventDraft) -> Result<Event, CalendarError>;

    /// Replace an existing event (matched by id).
    async fn update_event(&self, event: Event) -> Result<Event, CalendarError>;

    /// Delete an event, returning what was removed.
    async fn delete_event(&self, event_id: &str) -> Result<Event, CalendarError>;
}

/// In-memory calendar used by tests and the demo wiring.
#[derive(Default)]
pub struct InMemoryCalendar {
    events: RwLock<Vec<Event>>,
}

impl InMemoryCalendar {
    /// Create an empty calendar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event directly, bypassing scheduling validation.
    pub async fn seed(&self, draft: EventDraft) -> Event {
        let event = Event {
            id: Self::mint_id(),
            summary: draft.summary,
            start: draft.start,
            end: draft.end,
            description: draft.description,
            attendees: draft.attendees,
        };
        self.events.write().await.push(event.clone());
        event
    }

    fn mint_id() -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("evt_{}", &suffix[..12])
    }
}

#[async_trait]
impl CalendarService for InMemoryCalendar {
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<Event>, CalendarError> {
        let events = self.events.read().await;
        let mut hits: Vec<Event> = events
            .iter()
            .filter(|e| e.overlaps(time_min, time_max))
            .cloned()
            .collect();
        hits.sort_by_key(|e| e.start);
        Ok(hits)
    }

    async fn search_events(
        &self,
        query: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<Event>, CalendarError> {
        let needle = query.to_lowercase();
        let mut hits: Vec<Event> = self
            .list_events(time_min, time_max)
            .await?
            .into_iter()
            .filter(|e| {
                e.summary.to_lowercase().contains(&needle)
                    || e.description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect();
        hits.sort_by_key(|e| e.start);
        Ok(hits)
    }

    async fn get_event(&self, event_id: &str) -> Result<Event, CalendarError> {
        self.events
            .read()
            .await
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or_else(|| CalendarError::NotFound(event_id.to_string()))
    }

    async fn insert_event(&self, draft: EventDraft) -> Result<Event, CalendarError> {
        Ok(self.seed(draft).await)
    }

    async fn update_event(&self, event: Event) -> Result<Event, CalendarError> {
        let mut events = self.events.write().await;
        let slot = events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| CalendarError::NotFound(event.id.clone()))?;
        *slot = event.clone();
        Ok(event)
    }

    async fn delete_event(&self, event_id: &str) -> Result<Event, CalendarError> {
        let mut events = self.events.write().await;
        let index = events
            .iter()
            .position(|e| e.id == event_id)
            .ok_or_else(|| CalendarError::NotFound(event_id.to_string()))?;
        Ok(events.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_stable_ids() {
        let cal = InMemoryCalendar::new();
        let a = cal
            .insert_event(EventDraft::new(
                "Standup",
                utc(2025, 12, 29, 14, 0),
                utc(2025, 12, 29, 15, 0),
            ))
            .await
            .unwrap();

        assert!(a.id.starts_with("evt_"));
        assert_eq!(cal.get_event(&a.id).await.unwrap(), a);
    }

    #[tokio::test]
    async fn test_list_uses_half_open_overlap() {
        let cal = InMemoryCalendar::new();
        cal.seed(EventDraft::new(
            "Standup",
            utc(2025, 12, 29, 14, 0),
            utc(2025, 12, 29, 15, 0),
        ))
        .await;

        // Back-to-back window does not overlap.
        let after = cal
            .list_events(utc(2025, 12, 29, 15, 0), utc(2025, 12, 29, 16, 0))
            .await
            .unwrap();
        assert!(after.is_empty());

        let before = cal
            .list_events(utc(2025, 12, 29, 13, 0), utc(2025, 12, 29, 14, 0))
            .await
            .unwrap();
        assert!(before.is_empty());

        // Any true intersection is reported.
        let overlapping = cal
            .list_events(utc(2025, 12, 29, 14, 30), utc(2025, 12, 29, 14, 45))
            .await
            .unwrap();
        assert_eq!(overlapping.len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_start() {
        let cal = InMemoryCalendar::new();
        cal.seed(EventDraft::new(
            "Later",
            utc(2025, 12, 29, 16, 0),
            utc(2025, 12, 29, 17, 0),
        ))
        .await;
        cal.seed(EventDraft::new(
            "Earlier",
            utc(2025, 12, 29, 14, 0),
            utc(2025, 12, 29, 15, 0),
        ))
        .await;

        let events = cal
            .list_events(utc(2025, 12, 29, 0, 0), utc(2025, 12, 30, 0, 0))
            .await
            .unwrap();
        assert_eq!(events[0].summary, "Earlier");
        assert_eq!(events[1].summary, "Later");
    }

    #[tokio::test]
    async fn test_search_matches_summary_and_description() {
        let cal = InMemoryCalendar::new();
        let mut draft = EventDraft::new(
            "Board sync",
            utc(2025, 12, 29, 14, 0),
            utc(2025, 12, 29, 15, 0),
        );
        draft.description = Some("Quarterly roadmap review".into());
        cal.seed(draft).await;

        let window = (utc(2025, 12, 1, 0, 0), utc(2026, 1, 1, 0, 0));
        assert_eq!(
            cal.search_events("board", window.0, window.1).await.unwrap().len(),
            1
        );
        assert_eq!(
            cal.search_events("ROADMAP", window.0, window.1).await.unwrap().len(),
            1
        );
        assert!(cal
            .search_events("picnic", window.0, window.1)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let cal = InMemoryCalendar::new();
        let mut event = cal
            .seed(EventDraft::new(
                "Standup",
                utc(2025, 12, 29, 14, 0),
                utc(2025, 12, 29, 15, 0),
            ))
            .await;

        event.summary = "Daily standup".into();
        cal.update_event(event.clone()).await.unwrap();
        assert_eq!(cal.get_event(&event.id).await.unwrap().summary, "Daily standup");

        let removed = cal.delete_event(&event.id).await.unwrap();
        assert_eq!(removed.summary, "Daily standup");
        assert!(matches!(
            cal.get_event(&event.id).await,
            Err(CalendarError::NotFound(_))
        ));
    }
}
