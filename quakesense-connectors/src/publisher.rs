//! Event publishing with a bounded delivery policy
//!
//! The publisher sits between the edge loop and a [`Connector`]. Encoding
//! failures are returned to the caller, since they mean a bug or a bad
//! event. Transport failures are absorbed according to the
//! [`DeliveryPolicy`]; the edge loop never blocks on them and never sees
//! them as errors.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use quakesense_core::events::RawSeismicEvent;
use quakesense_core::window::WindowSample;
use quakesense_core::Emission;
use quakesense_schemas::{EventCodec, EventEnvelope};

use crate::{Connector, ConnectorError, SEISMIC_EVENT_PATH};

/// What to do when a send fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Log and forget the event
    #[default]
    DropOnFailure,
    /// Keep up to `capacity` failed events, oldest dropped first, and retry
    /// them on [`EventPublisher::flush`]
    BoundedRetry {
        /// Queue length
        capacity: usize,
    },
}

/// What happened to one published event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the transport
    Sent,
    /// Send failed and the event is queued for retry
    Queued,
    /// Send failed and the event is gone
    Dropped,
}

/// Publisher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherStats {
    /// Events delivered, first try or from the queue
    pub delivered: u64,
    /// Events lost to failures or queue overflow
    pub dropped: u64,
    /// Delivered from the retry queue
    pub retried: u64,
}

struct Pending {
    device_id: String,
    timestamp: u64,
    bytes: Vec<u8>,
}

/// Encodes events and delivers them through a connector
pub struct EventPublisher<C: Connector> {
    connector: C,
    codec: EventCodec,
    topic: String,
    policy: DeliveryPolicy,
    attach_window: bool,
    pending: VecDeque<Pending>,
    stats: PublisherStats,
}

impl<C: Connector> EventPublisher<C> {
    /// Publisher posting to [`SEISMIC_EVENT_PATH`]
    pub fn new(connector: C, codec: EventCodec, policy: DeliveryPolicy) -> Result<Self, ConnectorError> {
        if let DeliveryPolicy::BoundedRetry { capacity: 0 } = policy {
            return Err(ConnectorError::ConfigError("retry capacity must be positive".into()));
        }
        Ok(Self {
            connector,
            codec,
            topic: SEISMIC_EVENT_PATH.to_string(),
            policy,
            attach_window: true,
            pending: VecDeque::new(),
            stats: PublisherStats::default(),
        })
    }

    /// Publish under a different topic or path
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Whether to send the raw window with each event (JSON only)
    pub fn with_window(mut self, attach: bool) -> Self {
        self.attach_window = attach;
        self
    }

    /// Publish what the edge loop emitted
    pub fn publish(&mut self, emission: &Emission) -> Result<Delivery, ConnectorError> {
        self.publish_event(&emission.event, Some(&emission.window[..]))
    }

    /// Publish one event with an optional window
    pub fn publish_event(
        &mut self,
        event: &RawSeismicEvent,
        window: Option<&[WindowSample]>,
    ) -> Result<Delivery, ConnectorError> {
        let envelope = match window {
            Some(w) if self.attach_window => EventEnvelope::with_window(*event, w),
            _ => EventEnvelope::bare(*event),
        };
        let bytes = self.codec.encode_envelope(&envelope)?;
        let item = Pending {
            device_id: event.device_id.to_string(),
            timestamp: event.timestamp,
            bytes,
        };

        // Queued events go first to keep arrival order
        if !self.pending.is_empty() {
            self.flush();
        }
        if !self.pending.is_empty() {
            return Ok(self.enqueue(item));
        }

        match self.send(&item) {
            Ok(()) => {
                self.stats.delivered += 1;
                Ok(Delivery::Sent)
            }
            Err(e) => {
                log::warn!("send of {}@{} failed: {}", item.device_id, item.timestamp, e);
                Ok(self.absorb(item))
            }
        }
    }

    /// Retry queued events once each, in order; returns how many went out
    ///
    /// Stops at the first failure so the rest stay queued in order.
    pub fn flush(&mut self) -> usize {
        let mut sent = 0;
        while let Some(item) = self.pending.pop_front() {
            match self.send(&item) {
                Ok(()) => {
                    self.stats.delivered += 1;
                    self.stats.retried += 1;
                    sent += 1;
                }
                Err(e) => {
                    log::debug!("retry of {}@{} failed: {}", item.device_id, item.timestamp, e);
                    self.pending.push_front(item);
                    break;
                }
            }
        }
        if sent > 0 {
            log::info!("flushed {} queued events, {} still pending", sent, self.pending.len());
        }
        sent
    }

    fn send(&mut self, item: &Pending) -> Result<(), C::Error> {
        let content_type = self.codec.format().content_type();
        self.connector.send_typed(&self.topic, &item.bytes, content_type)
    }

    fn absorb(&mut self, item: Pending) -> Delivery {
        match self.policy {
            DeliveryPolicy::DropOnFailure => {
                log::warn!("dropping event {}@{}", item.device_id, item.timestamp);
                self.stats.dropped += 1;
                Delivery::Dropped
            }
            DeliveryPolicy::BoundedRetry { .. } => self.enqueue(item),
        }
    }

    fn enqueue(&mut self, item: Pending) -> Delivery {
        let capacity = match self.policy {
            DeliveryPolicy::BoundedRetry { capacity } => capacity,
            DeliveryPolicy::DropOnFailure => 0,
        };
        self.pending.push_back(item);
        while self.pending.len() > capacity {
            if let Some(old) = self.pending.pop_front() {
                log::warn!("retry queue full, dropping event {}@{}", old.device_id, old.timestamp);
                self.stats.dropped += 1;
            }
        }
        if self.pending.is_empty() {
            Delivery::Dropped
        } else {
            Delivery::Queued
        }
    }

    /// Events waiting for retry
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Counters
    pub fn stats(&self) -> PublisherStats {
        self.stats
    }

    /// Policy in force
    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Underlying connector
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Underlying connector, mutably
    pub fn connector_mut(&mut self) -> &mut C {
        &mut self.connector
    }
}
