//! Alert policy
//!
//! Downstream alerting (push messages, sirens) is outside this crate; these
//! helpers only decide *whether* an event warrants a notification and how
//! severe it is.

use std::fmt;

use serde::{Deserialize, Serialize};

use quakesense_core::events::RawSeismicEvent;

use crate::classifier::{ClassificationResult, Label};
use crate::{MLError, MLResult};

/// Severity bands on horizontal acceleration (m/s²)
const MEDIUM_FROM: f32 = 2.0;
const HIGH_FROM: f32 = 4.0;
const CRITICAL_FROM: f32 = 7.0;

/// Severity of a shaking event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Below 2.0 m/s²
    Low,
    /// 2.0 to 4.0 m/s²
    Medium,
    /// 4.0 to 7.0 m/s²
    High,
    /// 7.0 m/s² and above
    Critical,
}

impl Severity {
    /// Band for a horizontal acceleration
    pub fn from_horizontal_accel(accel: f32) -> Self {
        if accel < MEDIUM_FROM {
            Severity::Low
        } else if accel < HIGH_FROM {
            Severity::Medium
        } else if accel < CRITICAL_FROM {
            Severity::High
        } else {
            Severity::Critical
        }
    }

    /// Band for an event
    pub fn of(event: &RawSeismicEvent) -> Self {
        Self::from_horizontal_accel(event.horizontal_accel)
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When to notify
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    /// Genuine earthquakes notify above this confidence
    pub confidence_threshold: f32,
    /// Uncertain events notify above this horizontal acceleration (m/s²)
    pub uncertain_min_horizontal_accel: f32,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            uncertain_min_horizontal_accel: 3.0,
        }
    }
}

impl AlertPolicy {
    /// Set the confidence threshold
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the uncertain-event acceleration floor
    pub fn with_uncertain_min_horizontal_accel(mut self, accel: f32) -> Self {
        self.uncertain_min_horizontal_accel = accel;
        self
    }

    /// Check ranges
    pub fn validate(&self) -> MLResult<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(MLError::InvalidConfig("confidence_threshold must be within [0, 1]".into()));
        }
        if !(self.uncertain_min_horizontal_accel >= 0.0) {
            return Err(MLError::InvalidConfig(
                "uncertain_min_horizontal_accel must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Whether this result should reach people
    pub fn should_notify(&self, event: &RawSeismicEvent, result: &ClassificationResult) -> bool {
        match result.label {
            Label::GenuineEarthquake => result.confidence > self.confidence_threshold,
            Label::Uncertain => event.horizontal_accel > self.uncertain_min_horizontal_accel,
            Label::FalseAlarm => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quakesense_core::events::{DeviceId, RawSeismicEventBuilder};

    fn event(h: f32) -> RawSeismicEvent {
        RawSeismicEventBuilder::new(DeviceId::new("d").unwrap(), 0)
            .axes(h, 0.0, 0.0)
            .build()
    }

    fn result(label: Label, confidence: f32) -> ClassificationResult {
        ClassificationResult {
            label,
            confidence,
            reasoning: String::new(),
            model_version: "t".into(),
        }
    }

    #[test]
    fn severity_bands() {
        assert_eq!(Severity::from_horizontal_accel(0.0), Severity::Low);
        assert_eq!(Severity::from_horizontal_accel(1.99), Severity::Low);
        assert_eq!(Severity::from_horizontal_accel(2.0), Severity::Medium);
        assert_eq!(Severity::from_horizontal_accel(4.0), Severity::High);
        assert_eq!(Severity::from_horizontal_accel(6.99), Severity::High);
        assert_eq!(Severity::from_horizontal_accel(7.0), Severity::Critical);
        assert!(Severity::Critical > Severity::Low);
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
    }

    #[test]
    fn genuine_needs_confidence_above_threshold() {
        let policy = AlertPolicy::default();
        assert!(policy.should_notify(&event(1.0), &result(Label::GenuineEarthquake, 0.71)));
        assert!(!policy.should_notify(&event(9.0), &result(Label::GenuineEarthquake, 0.7)));
    }

    #[test]
    fn uncertain_needs_strong_motion() {
        let policy = AlertPolicy::default();
        assert!(policy.should_notify(&event(3.5), &result(Label::Uncertain, 0.5)));
        assert!(!policy.should_notify(&event(3.0), &result(Label::Uncertain, 0.5)));
    }

    #[test]
    fn false_alarms_never_notify() {
        let policy = AlertPolicy::default();
        assert!(!policy.should_notify(&event(9.0), &result(Label::FalseAlarm, 0.99)));
    }

    #[test]
    fn validation() {
        assert!(AlertPolicy::default().validate().is_ok());
        assert!(AlertPolicy::default().with_confidence_threshold(1.2).validate().is_err());
        assert!(AlertPolicy::default()
            .with_uncertain_min_horizontal_accel(f32::NAN)
            .validate()
            .is_err());
    }
}
