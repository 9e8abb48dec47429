use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// The lifecycle timestamps of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTimestamps {
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TimelineStep {
    pub label: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub completed: bool,
}

impl TimelineStep {
    fn new(label: &str, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            label: label.to_string(),
            timestamp,
            completed: timestamp.is_some(),
        }
    }
}

/// Tracking steps in display order. Missing timestamps show as incomplete.
pub fn status_timeline(stamps: &OrderTimestamps) -> Vec<TimelineStep> {
    vec![
        TimelineStep::new("Order Placed", Some(stamps.created_at)),
        TimelineStep::new("Order Confirmed", stamps.confirmed_at),
        TimelineStep::new("Preparing", stamps.preparing_at),
        TimelineStep::new("Ready for Pickup", stamps.ready_at),
        TimelineStep::new("Completed", stamps.completed_at),
    ]
}
