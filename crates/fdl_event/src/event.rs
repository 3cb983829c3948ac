//! Layout events and their envelope

use fdl_collision::{ClearanceViolation, CollisionPair, DataQualityWarning};
use fdl_core::{EventId, SiteId};
use fdl_layout::ScalingViolation;
use serde::{Deserialize, Serialize};

/// Envelope schema version
pub const EVENT_VERSION: &str = "1.0.0";

/// Event priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Something the engine found while processing a layout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "payload")]
pub enum LayoutEvent {
    CollisionDetected(CollisionPair),
    ClearanceViolated(ClearanceViolation),
    ScalingViolated(ScalingViolation),
    InstanceExcluded(DataQualityWarning),
    BatchExpanded { layouts: usize, instances: usize },
    SceneComposed { site: SiteId, nodes: usize },
}

impl LayoutEvent {
    /// Event type name as published
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CollisionDetected(_) => "CollisionDetected",
            Self::ClearanceViolated(_) => "ClearanceViolated",
            Self::ScalingViolated(_) => "ScalingViolated",
            Self::InstanceExcluded(_) => "InstanceExcluded",
            Self::BatchExpanded { .. } => "BatchExpanded",
            Self::SceneComposed { .. } => "SceneComposed",
        }
    }

    /// Default delivery priority of the event
    pub fn priority(&self) -> Priority {
        match self {
            Self::CollisionDetected(_) => Priority::High,
            Self::ClearanceViolated(_) | Self::ScalingViolated(_) => Priority::Normal,
            Self::InstanceExcluded(_) | Self::BatchExpanded { .. } | Self::SceneComposed { .. } => Priority::Low,
        }
    }
}

/// Event envelope containing metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    /// Milliseconds since the Unix epoch, taken from the id
    pub timestamp_ms: u64,
    /// Producer, e.g. the site or pipeline name
    pub source: String,
    pub version: String,
    pub priority: Priority,
    #[serde(flatten)]
    pub event: LayoutEvent,
}

impl EventEnvelope {
    /// Wrap an event with its default priority
    pub fn new(source: impl Into<String>, event: LayoutEvent) -> Self {
        let id = EventId::new();
        Self {
            id,
            timestamp_ms: id.timestamp_ms(),
            source: source.into(),
            version: EVENT_VERSION.to_string(),
            priority: event.priority(),
            event,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[inline]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_json_shape() {
        let pair = CollisionPair::new("Tank_B".into(), "Tank_A".into());
        let envelope = EventEnvelope::new("plant_01", LayoutEvent::CollisionDetected(pair));
        assert_eq!(envelope.priority, Priority::High);
        assert!(envelope.id.is_time_ordered());

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["event_type"], "CollisionDetected");
        assert_eq!(json["payload"]["a"], "Tank_A");
        assert_eq!(json["source"], "plant_01");
        assert_eq!(json["version"], EVENT_VERSION);

        let back: EventEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_priority_order() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::Low < Priority::Normal);
        assert_eq!(Priority::default(), Priority::Normal);
        let summary = LayoutEvent::BatchExpanded { layouts: 1, instances: 12 };
        assert_eq!(summary.priority(), Priority::Low);
        assert_eq!(summary.event_type(), "BatchExpanded");
    }
}
