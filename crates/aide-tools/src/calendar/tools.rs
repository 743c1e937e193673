//! Calendar tools: listing, searching, creating, editing, and deleting
//! events, plus the current-time anchor the model uses to resolve relative
//! dates.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use aide_agent::error::Result;
use aide_agent::tool::{optional_bool, optional_str, optional_u64, require_str, Tool, ToolDefinition};

use super::scheduling::{parse_instant, schedule, BusinessHours, ScheduleRequest};
use super::{CalendarError, CalendarService};

/// All calendar tools over one backend, ready for registration.
pub fn calendar_toolset(
    calendar: Arc<dyn CalendarService>,
    hours: BusinessHours,
) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CurrentTimeTool),
        Arc::new(ListEventsTool::new(calendar.clone())),
        Arc::new(SearchEventsTool::new(calendar.clone())),
        Arc::new(CreateEventTool::new(calendar.clone(), hours.clone())),
        Arc::new(EditEventTool::new(calendar.clone(), hours)),
        Arc::new(DeleteEventTool::new(calendar)),
    ]
}

fn fmt(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn parse_window_bound(
    args: &Value,
    key: &str,
    default: DateTime<Utc>,
) -> std::result::Result<DateTime<Utc>, String> {
    match optional_str(args, key) {
        Some(raw) => parse_instant(raw),
        None => Ok(default),
    }
}

fn parse_attendees(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Current date and time in UTC. The model calls this before resolving
/// relative dates like "today" or "tomorrow".
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::no_params(
            "calendar_get_current_time",
            "Get the current date and time in UTC. Use this before interpreting \
             relative dates like 'today', 'tomorrow', or 'next week'.",
        )
    }

    async fn invoke(&self, _args: &Value) -> Result<String> {
        let now = Utc::now();
        let tomorrow = now + Duration::days(1);
        Ok(format!(
            "Current date and time:\n\
             - UTC: {}\n\
             - ISO 8601: {}\n\
             - Today's date: {}\n\
             - Tomorrow's date: {}\n",
            now.format("%Y-%m-%d %H:%M:%S UTC"),
            fmt(now),
            now.format("%Y-%m-%d"),
            tomorrow.format("%Y-%m-%d"),
        ))
    }
}

/// List upcoming events in a window (default: the next seven days).
pub struct ListEventsTool {
    calendar: Arc<dyn CalendarService>,
}

impl ListEventsTool {
    /// Create the tool over a calendar backend.
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for ListEventsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "calendar_list",
            "List upcoming calendar events. Optionally specify a time range \
             (ISO 8601) and max results.",
            json!({
                "type": "object",
                "properties": {
                    "time_min": {"type": "string", "description": "Window start (default: now)"},
                    "time_max": {"type": "string", "description": "Window end (default: 7 days from now)"},
                    "max_results": {"type": "integer", "description": "Maximum events to return (default: 10)"}
                }
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let now = Utc::now();
        let time_min = match parse_window_bound(args, "time_min", now) {
            Ok(t) => t,
            Err(e) => return Ok(format!("Error parsing dates: {e}")),
        };
        let time_max = match parse_window_bound(args, "time_max", now + Duration::days(7)) {
            Ok(t) => t,
            Err(e) => return Ok(format!("Error parsing dates: {e}")),
        };
        let max_results = optional_u64(args, "max_results").unwrap_or(10) as usize;

        let events = match self.calendar.list_events(time_min, time_max).await {
            Ok(events) => events,
            Err(e) => return Ok(format!("Error listing calendar events: {e}")),
        };

        if events.is_empty() {
            return Ok(format!(
                "No events found between {} and {}",
                fmt(time_min),
                fmt(time_max)
            ));
        }

        let lines: Vec<String> = events
            .iter()
            .take(max_results)
            .map(|e| format!("- {} (ID: {}, Start: {})", e.summary, e.id, fmt(e.start)))
            .collect();
        Ok(format!("Found {} events:\n{}", lines.len(), lines.join("\n")))
    }
}

/// Search events by substring query.
pub struct SearchEventsTool {
    calendar: Arc<dyn CalendarService>,
}

impl SearchEventsTool {
    /// Create the tool over a calendar backend.
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for SearchEventsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "calendar_search",
            "Search calendar events by query string (matches title and description).",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query"},
                    "time_min": {"type": "string", "description": "Window start (default: now)"},
                    "time_max": {"type": "string", "description": "Window end (default: 30 days from now)"}
                },
                "required": ["query"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let query = require_str(args, "query").map_err(invalid_args("calendar_search"))?;
        let now = Utc::now();
        let time_min = match parse_window_bound(args, "time_min", now) {
            Ok(t) => t,
            Err(e) => return Ok(format!("Error parsing dates: {e}")),
        };
        let time_max = match parse_window_bound(args, "time_max", now + Duration::days(30)) {
            Ok(t) => t,
            Err(e) => return Ok(format!("Error parsing dates: {e}")),
        };

        let events = match self.calendar.search_events(query, time_min, time_max).await {
            Ok(events) => events,
            Err(e) => return Ok(format!("Error searching calendar: {e}")),
        };

        if events.is_empty() {
            return Ok(format!("No events found matching query: {query}"));
        }

        let lines: Vec<String> = events
            .iter()
            .map(|e| format!("- {} (ID: {}, Start: {})", e.summary, e.id, fmt(e.start)))
            .collect();
        Ok(format!(
            "Found {} events matching '{query}':\n{}",
            lines.len(),
            lines.join("\n")
        ))
    }
}

/// Create a calendar event through the scheduling engine.
pub struct CreateEventTool {
    calendar: Arc<dyn CalendarService>,
    hours: BusinessHours,
}

impl CreateEventTool {
    /// Create the tool over a calendar backend and business window.
    pub fn new(calendar: Arc<dyn CalendarService>, hours: BusinessHours) -> Self {
        Self { calendar, hours }
    }
}

#[async_trait]
impl Tool for CreateEventTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "calendar_create_event",
            "Create a new calendar event. REQUIRES summary, start_time, and \
             end_time (ISO 8601, e.g. '2025-01-15T10:00:00Z'). The start must be \
             in the future and inside business hours unless \
             force_outside_hours=true. Conflicting requests are refused with a \
             suggested alternative time; set force_conflict=true only when the \
             user explicitly asks to override the conflict.",
            json!({
                "type": "object",
                "properties": {
                    "summary": {"type": "string", "description": "Event title"},
                    "start_time": {"type": "string", "description": "Start time, ISO 8601"},
                    "end_time": {"type": "string", "description": "End time, ISO 8601"},
                    "description": {"type": "string", "description": "Event description"},
                    "attendees": {"type": "string", "description": "Comma-separated attendee emails"},
                    "force_outside_hours": {"type": "boolean", "description": "Allow starts outside business hours"},
                    "force_conflict": {"type": "boolean", "description": "Create even over existing conflicts"}
                },
                "required": ["summary", "start_time", "end_time"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let summary = require_str(args, "summary").map_err(invalid_args("calendar_create_event"))?;
        let start_raw =
            require_str(args, "start_time").map_err(invalid_args("calendar_create_event"))?;
        let end_raw =
            require_str(args, "end_time").map_err(invalid_args("calendar_create_event"))?;

        let (start, end) = match (parse_instant(start_raw), parse_instant(end_raw)) {
            (Ok(s), Ok(e)) => (s, e),
            (Err(e), _) | (_, Err(e)) => {
                return Ok(format!(
                    "Error parsing dates: {e}. Please use ISO 8601 format \
                     (e.g. '2025-01-15T10:00:00Z' or '2025-01-15T10:00:00')."
                ));
            }
        };

        let request = ScheduleRequest {
            summary: summary.to_string(),
            start,
            end,
            description: optional_str(args, "description").map(str::to_string),
            attendees: parse_attendees(optional_str(args, "attendees")),
            force_outside_hours: optional_bool(args, "force_outside_hours"),
            force_conflict: optional_bool(args, "force_conflict"),
        };

        let outcome = schedule(self.calendar.as_ref(), &self.hours, &request).await;
        Ok(outcome.render(&self.hours))
    }
}

/// Edit an existing calendar event.
pub struct EditEventTool {
    calendar: Arc<dyn CalendarService>,
    hours: BusinessHours,
}

impl EditEventTool {
    /// Create the tool over a calendar backend and business window.
    pub fn new(calendar: Arc<dyn CalendarService>, hours: BusinessHours) -> Self {
        Self { calendar, hours }
    }
}

#[async_trait]
impl Tool for EditEventTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "calendar_edit_event",
            "Edit an existing calendar event by event_id. Optional updates: \
             summary, start_time, end_time, description, attendees. Supplying \
             only start_time shifts the event, preserving its duration. \
             Business-hours validation applies to updated times unless \
             force_outside_hours=true. Find event ids with calendar_list or \
             calendar_search first.",
            json!({
                "type": "object",
                "properties": {
                    "event_id": {"type": "string", "description": "Id of the event to edit"},
                    "summary": {"type": "string", "description": "New title"},
                    "start_time": {"type": "string", "description": "New start time, ISO 8601"},
                    "end_time": {"type": "string", "description": "New end time, ISO 8601"},
                    "description": {"type": "string", "description": "New description"},
                    "attendees": {"type": "string", "description": "Comma-separated attendee emails"},
                    "force_outside_hours": {"type": "boolean", "description": "Allow starts outside business hours"}
                },
                "required": ["event_id"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let event_id = require_str(args, "event_id").map_err(invalid_args("calendar_edit_event"))?;

        let mut event = match self.calendar.get_event(event_id).await {
            Ok(event) => event,
            Err(CalendarError::NotFound(_)) => {
                return Ok(format!("Error: Could not find event with ID {event_id}."));
            }
            Err(e) => return Ok(format!("Error updating calendar event: {e}")),
        };

        if let Some(summary) = optional_str(args, "summary") {
            event.summary = summary.to_string();
        }
        if let Some(description) = optional_str(args, "description") {
            event.description = Some(description.to_string());
        }
        if let Some(attendees) = optional_str(args, "attendees") {
            event.attendees = parse_attendees(Some(attendees));
        }

        let start_raw = optional_str(args, "start_time");
        let end_raw = optional_str(args, "end_time");
        if start_raw.is_some() || end_raw.is_some() {
            let duration = event.end - event.start;

            if let Some(raw) = start_raw {
                match parse_instant(raw) {
                    Ok(start) => {
                        event.start = start;
                        if end_raw.is_none() {
                            // Only the start moved: keep the duration.
                            event.end = start + duration;
                        }
                    }
                    Err(e) => return Ok(format!("Error parsing dates: {e}")),
                }
            }
            if let Some(raw) = end_raw {
                match parse_instant(raw) {
                    Ok(end) => event.end = end,
                    Err(e) => return Ok(format!("Error parsing dates: {e}")),
                }
            }

            if event.end <= event.start {
                return Ok(format!(
                    "Error: End time must be after start time. End time {} is not after \
                     start time {}.",
                    fmt(event.end),
                    fmt(event.start)
                ));
            }

            if !optional_bool(args, "force_outside_hours") && !self.hours.start_in_window(event.start)
            {
                return Ok(format!(
                    "Error: Updated start time is outside business hours ({}). \
                     It would be {}:00 local.",
                    self.hours.label(),
                    self.hours.local(event.start).format("%H")
                ));
            }
        }

        match self.calendar.update_event(event).await {
            Ok(updated) => Ok(format!(
                "✓ Event '{}' updated successfully!\n- Event ID: {}\n- Start: {}",
                updated.summary,
                updated.id,
                fmt(updated.start)
            )),
            Err(e) => Ok(format!("Error updating calendar event: {e}")),
        }
    }
}

/// Permanently delete a calendar event.
pub struct DeleteEventTool {
    calendar: Arc<dyn CalendarService>,
}

impl DeleteEventTool {
    /// Create the tool over a calendar backend.
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for DeleteEventTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "calendar_delete_event",
            "Delete a calendar event by event_id. This cannot be undone. Find \
             event ids with calendar_list or calendar_search first.",
            json!({
                "type": "object",
                "properties": {
                    "event_id": {"type": "string", "description": "Id of the event to delete"}
                },
                "required": ["event_id"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let event_id =
            require_str(args, "event_id").map_err(invalid_args("calendar_delete_event"))?;

        match self.calendar.delete_event(event_id).await {
            Ok(removed) => Ok(format!(
                "✓ Event '{}' (ID: {event_id}) deleted successfully.",
                removed.summary
            )),
            Err(CalendarError::NotFound(_)) => {
                Ok(format!("Error: Could not find event with ID {event_id}."))
            }
            Err(e) => Ok(format!("Error deleting calendar event: {e}")),
        }
    }
}

fn invalid_args(tool_name: &str) -> impl Fn(String) -> aide_agent::AgentError {
    let tool_name = tool_name.to_string();
    move |message| aide_agent::AgentError::InvalidArguments {
        tool_name: tool_name.clone(),
        message,
    }
}
