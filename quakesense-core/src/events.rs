//! The raw seismic event emitted by the edge
//!
//! ## Overview
//!
//! A `RawSeismicEvent` is the only thing the edge tells the rest of the
//! system. It is produced exactly once per resolved shake session and is
//! immutable afterwards. Its twelve fields are exactly what the server-side
//! feature extractor consumes; nothing derived on the server is computed here.
//!
//! ## Wire Names
//!
//! With the `serde` feature the struct serializes with these field names:
//!
//! ```text
//! horizontal_accel  total_accel  vertical_accel
//! x_accel  y_accel  z_accel  peak_ground_acceleration
//! sound_level  sound_correlated  duration_ms  timestamp  device_id
//! ```
//!
//! ## Memory Model
//!
//! Events are `Copy` and allocation-free so they can sit on the stack of a
//! microcontroller. The device id is stored inline:
//!
//! ```text
//! RawSeismicEvent ≈ 7 × f32 + u16 + bool + u32 + u64 + DeviceId(33 B)
//!                 ≈ 80 bytes
//! ```
//!
//! ## Priority
//!
//! Confirmed events are high priority. Sound-correlated events are still
//! emitted (the server keeps them for analysis) but at low priority and
//! without arming the alarm. The mapping lives on
//! `detector::Resolution::priority`.

use core::fmt;

use crate::constants::{detection::PGA_HORIZONTAL_FACTOR, sensors::MAX_DEVICE_ID_LEN};
use crate::time::Timestamp;

/// Device identifier stored inline (at most `MAX_DEVICE_ID_LEN` bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    len: u8,
    data: [u8; MAX_DEVICE_ID_LEN],
}

impl DeviceId {
    /// Create from a string slice, `None` if it is too long
    pub fn new(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_DEVICE_ID_LEN {
            return None;
        }

        let mut data = [0u8; MAX_DEVICE_ID_LEN];
        data[..bytes.len()].copy_from_slice(bytes);

        Some(Self {
            len: bytes.len() as u8,
            data,
        })
    }

    /// Get as string slice
    pub fn as_str(&self) -> &str {
        // Only valid UTF-8 enters through new()
        core::str::from_utf8(&self.data[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DeviceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DeviceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DeviceIdVisitor;

        impl<'de> serde::de::Visitor<'de> for DeviceIdVisitor {
            type Value = DeviceId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a device id of at most {} bytes", MAX_DEVICE_ID_LEN)
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<DeviceId, E> {
                DeviceId::new(v).ok_or_else(|| E::invalid_length(v.len(), &self))
            }
        }

        deserializer.deserialize_str(DeviceIdVisitor)
    }
}

/// Delivery priority of an emitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventPriority {
    /// Confirmed shake, alarm armed
    High = 0,
    /// Sound-correlated shake, kept for analysis only
    Low = 1,
}

/// One resolved shake session as seen by the edge
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSeismicEvent {
    /// `sqrt(dx² + dy²)` at the confirming tick (m/s²)
    pub horizontal_accel: f32,
    /// `sqrt(dx² + dy² + dz²)` at the confirming tick (m/s²)
    pub total_accel: f32,
    /// Dynamic z at the confirming tick (m/s²)
    pub vertical_accel: f32,
    /// Dynamic x (m/s²)
    pub x_accel: f32,
    /// Dynamic y (m/s²)
    pub y_accel: f32,
    /// Dynamic z (m/s²)
    pub z_accel: f32,
    /// `max(total, horizontal × 1.2)` (m/s²)
    pub peak_ground_acceleration: f32,
    /// Smoothed sound level (ADC counts)
    pub sound_level: u16,
    /// A sound spike fell inside the correlation window
    pub sound_correlated: bool,
    /// Session length at resolution (ms)
    pub duration_ms: u32,
    /// Resolution time (ms)
    pub timestamp: Timestamp,
    /// Emitting device
    pub device_id: DeviceId,
}

impl RawSeismicEvent {
    /// Start of the session this event resolved
    pub fn session_start(&self) -> Timestamp {
        self.timestamp.saturating_sub(self.duration_ms as u64)
    }
}

/// Builds events from dynamic axes, deriving the magnitudes the same way the
/// detector does
///
/// ```rust
/// use quakesense_core::events::{DeviceId, RawSeismicEventBuilder};
///
/// let id = DeviceId::new("SYNTHETIC_GEN").unwrap();
/// let event = RawSeismicEventBuilder::new(id, 12_000)
///     .axes(3.0, 4.0, 1.0)
///     .sound(210, false)
///     .duration_ms(400)
///     .build();
///
/// assert!((event.horizontal_accel - 5.0).abs() < 1e-5);
/// assert!((event.peak_ground_acceleration - 6.0).abs() < 1e-5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RawSeismicEventBuilder {
    device_id: DeviceId,
    timestamp: Timestamp,
    axes: (f32, f32, f32),
    sound_level: u16,
    sound_correlated: bool,
    duration_ms: u32,
    pga_factor: f32,
}

impl RawSeismicEventBuilder {
    /// Start an event for `device_id` resolved at `timestamp`
    pub fn new(device_id: DeviceId, timestamp: Timestamp) -> Self {
        Self {
            device_id,
            timestamp,
            axes: (0.0, 0.0, 0.0),
            sound_level: 0,
            sound_correlated: false,
            duration_ms: 0,
            pga_factor: PGA_HORIZONTAL_FACTOR,
        }
    }

    /// Dynamic (baseline-relative) axis magnitudes
    pub fn axes(mut self, x: f32, y: f32, z: f32) -> Self {
        self.axes = (libm::fabsf(x), libm::fabsf(y), libm::fabsf(z));
        self
    }

    /// Sound level and veto flag
    pub fn sound(mut self, level: u16, correlated: bool) -> Self {
        self.sound_level = level;
        self.sound_correlated = correlated;
        self
    }

    /// Session duration
    pub fn duration_ms(mut self, ms: u32) -> Self {
        self.duration_ms = ms;
        self
    }

    /// Horizontal factor used for the PGA estimate
    pub fn pga_factor(mut self, factor: f32) -> Self {
        self.pga_factor = factor;
        self
    }

    /// Finish the event
    pub fn build(self) -> RawSeismicEvent {
        let (x, y, z) = self.axes;
        let horizontal = libm::sqrtf(x * x + y * y);
        let total = libm::sqrtf(x * x + y * y + z * z);

        RawSeismicEvent {
            horizontal_accel: horizontal,
            total_accel: total,
            vertical_accel: z,
            x_accel: x,
            y_accel: y,
            z_accel: z,
            peak_ground_acceleration: peak_ground_acceleration(total, horizontal, self.pga_factor),
            sound_level: self.sound_level,
            sound_correlated: self.sound_correlated,
            duration_ms: self.duration_ms,
            timestamp: self.timestamp,
            device_id: self.device_id,
        }
    }
}

/// `max(total, horizontal × factor)`
pub fn peak_ground_acceleration(total: f32, horizontal: f32, factor: f32) -> f32 {
    total.max(horizontal * factor)
}
