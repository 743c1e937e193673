//! Scheduling engine: validated event creation with conflict detection and
//! alternative-slot search.
//!
//! All interval comparisons are half-open (`[start, end)`) so back-to-back
//! events never falsely conflict. The business window is a single
//! timezone-aware parameter; every local-time decision goes through it.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use super::{CalendarService, Event, EventDraft};

/// The local time-of-day window within which events may be created without
/// an explicit override.
#[derive(Debug, Clone)]
pub struct BusinessHours {
    /// Business timezone.
    pub timezone: Tz,

    /// First local hour of the window (inclusive).
    pub open_hour: u32,

    /// Last local hour of the window (exclusive).
    pub close_hour: u32,

    /// Local hour used when suggesting a replacement start.
    pub default_hour: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::New_York,
            open_hour: 7,
            close_hour: 18,
            default_hour: 9,
        }
    }
}

impl BusinessHours {
    /// Convert an instant to the business timezone.
    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.timezone)
    }

    /// Whether an instant's local hour lies inside `[open, close)`.
    pub fn start_in_window(&self, instant: DateTime<Utc>) -> bool {
        let hour = self.local(instant).hour();
        hour >= self.open_hour && hour < self.close_hour
    }

    /// The instant of `hour:00` local time on the given local calendar day.
    /// `None` only when that wall-clock time does not exist (DST gap).
    pub fn at_hour(&self, day: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
        self.timezone
            .with_ymd_and_hms(day.year(), day.month(), day.day(), hour, 0, 0)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Closing instant of the window on the given local calendar day.
    pub fn close_of(&self, day: NaiveDate) -> Option<DateTime<Utc>> {
        self.at_hour(day, self.close_hour)
    }

    /// Human-readable window label, e.g. `7:00-18:00 America/New_York`.
    pub fn label(&self) -> String {
        format!(
            "{}:00-{}:00 {}",
            self.open_hour,
            self.close_hour,
            self.timezone.name()
        )
    }
}

/// A proposed replacement interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Suggested start (UTC).
    pub start: DateTime<Utc>,

    /// Suggested end (UTC), same duration as the original request.
    pub end: DateTime<Utc>,
}

/// A validated creation request.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    /// Event title.
    pub summary: String,

    /// Requested start (UTC).
    pub start: DateTime<Utc>,

    /// Requested end (UTC).
    pub end: DateTime<Utc>,

    /// Optional description.
    pub description: Option<String>,

    /// Attendee email addresses.
    pub attendees: Vec<String>,

    /// Allow starts outside the business window.
    pub force_outside_hours: bool,

    /// Create the event even over existing conflicts.
    pub force_conflict: bool,
}

impl ScheduleRequest {
    /// A plain request with no overrides.
    pub fn new(summary: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            summary: summary.into(),
            start,
            end,
            description: None,
            attendees: Vec::new(),
            force_outside_hours: false,
            force_conflict: false,
        }
    }
}

/// Outcome of one creation attempt.
#[derive(Debug, Clone)]
pub enum ScheduleOutcome {
    /// The event was created.
    Scheduled {
        /// The created event, with its backend-assigned id.
        event: Event,
        /// Titles of conflicts that were overridden with `force_conflict`.
        overridden: Vec<String>,
    },

    /// Logically impossible input (past start, inverted interval).
    Invalid {
        /// Human-readable reason.
        reason: String,
    },

    /// Start outside the business window without override.
    OutsideHours {
        /// The rejected start.
        start: DateTime<Utc>,
        /// Its local hour in the business timezone.
        local_hour: u32,
        /// Same-duration suggestion at the default hour, when computable.
        suggestion: Option<Slot>,
    },

    /// Overlapping events exist and no override was given.
    Conflicted {
        /// Titles of the conflicting events (at most three).
        conflicts: Vec<String>,
        /// First free same-duration in-window slot later that day, if any.
        suggestion: Option<Slot>,
        /// The local calendar day that was searched.
        day: NaiveDate,
    },

    /// The calendar backend failed during insertion.
    Failed {
        /// Backend error text.
        reason: String,
    },
}

impl ScheduleOutcome {
    /// Render the outcome as tool-result text.
    pub fn render(&self, hours: &BusinessHours) -> String {
        match self {
            Self::Scheduled { event, overridden } => {
                let mut msg = format!(
                    "✓ Event '{}' created successfully!\n- Start: {}\n- Event ID: {}\n",
                    event.summary,
                    fmt(event.start),
                    event.id
                );
                if !overridden.is_empty() {
                    msg.push_str(&format!(
                        "\nNote: Event created despite conflicts with: {}",
                        overridden.join(", ")
                    ));
                }
                msg
            }
            Self::Invalid { reason } => format!("Error: {reason}"),
            Self::OutsideHours {
                start,
                local_hour,
                suggestion,
            } => match suggestion {
                Some(slot) => format!(
                    "Error: Event time {} ({local_hour}:00 local) is outside business hours ({}). \
                     Suggested time: {} to {}.",
                    fmt(*start),
                    hours.label(),
                    fmt(slot.start),
                    fmt(slot.end)
                ),
                None => format!(
                    "Error: Event time {} is outside business hours ({}). \
                     Please choose a time inside the window.",
                    fmt(*start),
                    hours.label()
                ),
            },
            Self::Conflicted {
                conflicts,
                suggestion,
                day,
            } => {
                let mut msg = format!(
                    "Error: Requested time conflicts with existing event(s): {}",
                    conflicts.join(", ")
                );
                match suggestion {
                    Some(slot) => msg.push_str(&format!(
                        ". Suggested available time: {} to {}. Use these exact times to retry.",
                        fmt(slot.start),
                        fmt(slot.end)
                    )),
                    None => msg.push_str(&format!(
                        ". No available slots found on {day} within business hours. \
                         Please try a different date."
                    )),
                }
                msg
            }
            Self::Failed { reason } => format!("Error creating calendar event: {reason}"),
        }
    }
}

fn fmt(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parse a timestamp as RFC3339, naive `YYYY-MM-DDTHH:MM:SS` (assumed UTC),
/// or a bare `YYYY-MM-DD` date (midnight UTC). Surrounding whitespace and
/// quotes are tolerated.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    let cleaned = raw.trim().trim_matches(|c| c == '\'' || c == '"').trim();
    if cleaned.is_empty() {
        return Err("empty timestamp".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(cleaned, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(cleaned, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    Err(format!(
        "could not parse '{cleaned}' as a timestamp; use ISO 8601 \
         (e.g. '2025-01-15T10:00:00Z' or '2025-01-15T10:00:00')"
    ))
}

/// Attempt to create an event, evaluating validity, the business window,
/// and conflicts against the current wall clock.
pub async fn schedule(
    calendar: &dyn CalendarService,
    hours: &BusinessHours,
    request: &ScheduleRequest,
) -> ScheduleOutcome {
    schedule_at(calendar, hours, request, Utc::now()).await
}

/// [`schedule`] against an explicit `now`, for deterministic evaluation.
pub async fn schedule_at(
    calendar: &dyn CalendarService,
    hours: &BusinessHours,
    request: &ScheduleRequest,
    now: DateTime<Utc>,
) -> ScheduleOutcome {
    // Validation happens before any calendar access.
    if request.start <= now {
        return ScheduleOutcome::Invalid {
            reason: format!(
                "Cannot schedule events in the past. Start time {} is not after the \
                 current time. Please use a future date/time.",
                fmt(request.start)
            ),
        };
    }
    if request.end <= request.start {
        return ScheduleOutcome::Invalid {
            reason: format!(
                "End time must be after start time. End time {} is not after start time {}.",
                fmt(request.end),
                fmt(request.start)
            ),
        };
    }

    let duration = request.end - request.start;

    if !request.force_outside_hours && !hours.start_in_window(request.start) {
        let local_hour = hours.local(request.start).hour();
        let suggestion = suggest_default_slot(hours, request.start, duration);
        debug!(
            summary = %request.summary,
            local_hour, "rejected start outside the business window"
        );
        return ScheduleOutcome::OutsideHours {
            start: request.start,
            local_hour,
            suggestion,
        };
    }

    let conflicts = match calendar.list_events(request.start, request.end).await {
        Ok(events) => events,
        Err(e) => {
            // The availability check failing is not fatal to creation.
            warn!("conflict check failed, proceeding: {e}");
            Vec::new()
        }
    };

    if !conflicts.is_empty() && !request.force_conflict {
        let day = hours.local(request.start).date_naive();
        let suggestion = find_free_slot(calendar, hours, day, duration).await;
        let titles = conflict_titles(&conflicts);
        debug!(
            summary = %request.summary,
            conflicts = titles.len(),
            found_alternative = suggestion.is_some(),
            "rejected conflicting request"
        );
        return ScheduleOutcome::Conflicted {
            conflicts: titles,
            suggestion,
            day,
        };
    }

    let draft = EventDraft {
        summary: request.summary.clone(),
        start: request.start,
        end: request.end,
        description: request.description.clone(),
        attendees: request.attendees.clone(),
    };
    match calendar.insert_event(draft).await {
        Ok(event) => ScheduleOutcome::Scheduled {
            event,
            overridden: if request.force_conflict {
                conflict_titles(&conflicts)
            } else {
                Vec::new()
            },
        },
        Err(e) => ScheduleOutcome::Failed {
            reason: e.to_string(),
        },
    }
}

/// Suggested slot at the default local hour on the start's UTC calendar
/// day, preserving the original duration.
fn suggest_default_slot(
    hours: &BusinessHours,
    start: DateTime<Utc>,
    duration: Duration,
) -> Option<Slot> {
    let day = start.date_naive();
    (hours.default_hour..hours.close_hour)
        .find_map(|hour| hours.at_hour(day, hour))
        .map(|slot_start| Slot {
            start: slot_start,
            end: slot_start + duration,
        })
}

/// Scan candidate local start hours from the default hour up to (but not
/// including) close on the given day; the first candidate with an empty
/// conflict set whose end stays within the window wins.
async fn find_free_slot(
    calendar: &dyn CalendarService,
    hours: &BusinessHours,
    day: NaiveDate,
    duration: Duration,
) -> Option<Slot> {
    let close = hours.close_of(day)?;

    for hour in hours.default_hour..hours.close_hour {
        let Some(start) = hours.at_hour(day, hour) else {
            continue;
        };
        let end = start + duration;
        if end > close {
            continue;
        }

        match calendar.list_events(start, end).await {
            Ok(existing) if existing.is_empty() => return Some(Slot { start, end }),
            Ok(_) => continue,
            Err(e) => {
                warn!("availability query failed during slot search: {e}");
                return None;
            }
        }
    }
    None
}

fn conflict_titles(conflicts: &[Event]) -> Vec<String> {
    conflicts
        .iter()
        .take(3)
        .map(|e| e.summary.clone())
        .collect()
}
