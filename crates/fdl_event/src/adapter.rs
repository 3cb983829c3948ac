//! Conversion of result values into events

use fdl_collision::DetectionReport;
use fdl_layout::ScalingViolation;

use crate::error::Result;
use crate::event::{EventEnvelope, LayoutEvent};
use crate::sink::EventSink;

/// One event per collision, clearance violation and excluded instance
pub fn detection_events(report: &DetectionReport) -> Vec<LayoutEvent> {
    report
        .collisions
        .iter()
        .cloned()
        .map(LayoutEvent::CollisionDetected)
        .chain(report.clearance_violations.iter().cloned().map(LayoutEvent::ClearanceViolated))
        .chain(report.warnings.iter().cloned().map(LayoutEvent::InstanceExcluded))
        .collect()
}

/// One event per scaling violation
pub fn scaling_events(violations: &[ScalingViolation]) -> Vec<LayoutEvent> {
    violations.iter().cloned().map(LayoutEvent::ScalingViolated).collect()
}

/// Publishes events under one source name
pub struct EventPublisher<'a> {
    sink: &'a dyn EventSink,
    source: String,
}

impl<'a> EventPublisher<'a> {
    pub fn new(sink: &'a dyn EventSink, source: impl Into<String>) -> Self {
        Self {
            sink,
            source: source.into(),
        }
    }

    pub fn publish(&self, event: LayoutEvent) -> Result<()> {
        self.sink.publish(EventEnvelope::new(self.source.clone(), event))
    }

    /// Publish a batch, higher priority first and otherwise in the given
    /// order; stops at the first delivery failure
    pub fn publish_all(&self, events: Vec<LayoutEvent>) -> Result<usize> {
        let mut events = events;
        events.sort_by(|a, b| b.priority().cmp(&a.priority()));
        let count = events.len();
        for event in events {
            self.publish(event)?;
        }
        log::debug!("published {count} event(s) from {}", self.source);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Priority;
    use crate::sink::EventCollector;
    use fdl_collision::{ClearanceViolation, CollisionPair, DataQualityWarning, WarningReason};

    fn report() -> DetectionReport {
        DetectionReport {
            collisions: vec![CollisionPair::new("A".into(), "B".into())],
            clearance_violations: vec![ClearanceViolation {
                pair: CollisionPair::new("A".into(), "C".into()),
                actual: 0.1,
                required: 0.3,
            }],
            warnings: vec![DataQualityWarning::new("X".into(), WarningReason::MissingVolume)],
            candidates: 1,
            bodies: 3,
        }
    }

    #[test]
    fn test_detection_events() {
        let events = detection_events(&report());
        let types: Vec<&str> = events.iter().map(LayoutEvent::event_type).collect();
        assert_eq!(types, vec!["CollisionDetected", "ClearanceViolated", "InstanceExcluded"]);
    }

    #[test]
    fn test_publish_in_priority_order() {
        let collector = EventCollector::new();
        let publisher = EventPublisher::new(&collector, "plant_01");
        let mut events = vec![LayoutEvent::BatchExpanded { layouts: 1, instances: 12 }];
        events.extend(detection_events(&report()));

        assert_eq!(publisher.publish_all(events).unwrap(), 4);
        let published = collector.events();
        assert_eq!(published[0].priority, Priority::High);
        assert_eq!(published[1].event_type(), "ClearanceViolated");
        // equal priorities keep their order
        assert_eq!(published[2].event_type(), "BatchExpanded");
        assert_eq!(published[3].event_type(), "InstanceExcluded");
        assert!(published.iter().all(|e| e.source == "plant_01"));
    }
}
