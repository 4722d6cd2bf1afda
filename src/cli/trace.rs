//! Session trace formatting for `play --trace`.

use serde::{Deserialize, Serialize};

use crate::core::{SessionLog, TraceEvent};
use crate::util::truncate;

/// Longest details shown in human-readable traces.
const MAX_DETAILS_LEN: usize = 60;

/// Options for trace output.
#[derive(Debug, Clone, Default)]
pub struct TraceOptions {
    /// Output as JSON.
    pub json: bool,
    /// Maximum number of events to show.
    pub limit: Option<usize>,
    /// Filter by event type.
    pub event_type: Option<String>,
}

/// Trace of one game visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceOutput {
    /// Game the trace belongs to.
    pub game: String,
    /// Number of events shown.
    pub count: usize,
    /// Total events (before filtering/limiting).
    pub total: usize,
    /// Trace events.
    pub events: Vec<TraceEventInfo>,
}

/// Simplified trace event info for output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEventInfo {
    /// Event timestamp.
    pub timestamp: String,
    /// Event type.
    pub event_type: String,
    /// Event details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&TraceEvent> for TraceEventInfo {
    fn from(event: &TraceEvent) -> Self {
        Self {
            timestamp: event.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            event_type: format!("{:?}", event.event_type),
            details: event.details.clone(),
        }
    }
}

impl TraceOutput {
    /// Build the trace for a game visit, applying the filter and limit.
    pub fn from_log(game: impl Into<String>, log: &SessionLog, options: &TraceOptions) -> Self {
        let total = log.len();
        let mut events: Vec<TraceEventInfo> = log.events.iter().map(TraceEventInfo::from).collect();

        if let Some(filter_type) = &options.event_type {
            let filter_type = filter_type.to_lowercase();
            events.retain(|e| e.event_type.to_lowercase().contains(&filter_type));
        }

        if let Some(limit) = options.limit {
            events.truncate(limit);
        }

        Self {
            game: game.into(),
            count: events.len(),
            total,
            events,
        }
    }
}

/// Format the traces of a whole play session.
pub fn format_traces(traces: &[TraceOutput], options: &TraceOptions) -> String {
    if options.json {
        return serde_json::to_string_pretty(traces).unwrap_or_else(|_| "[]".to_string());
    }

    let mut lines = Vec::new();
    for trace in traces {
        if trace.events.is_empty() {
            lines.push(format!("No trace events for {}", trace.game));
            continue;
        }
        lines.push(format!(
            "Trace for {} ({}/{})",
            trace.game, trace.count, trace.total
        ));
        for event in &trace.events {
            let details = event
                .details
                .as_ref()
                .map(|d| format!(" - {}", truncate(d, MAX_DETAILS_LEN)))
                .unwrap_or_default();
            lines.push(format!("[{}] {}{}", event.timestamp, event.event_type, details));
        }
    }
    lines.join("\n") + "\n"
}
