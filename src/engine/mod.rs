mod availability;
mod conflict;
mod error;
mod mutations;
mod queries;

pub use availability::{availability, AvailabilityReport};
pub use error::EngineError;
pub use mutations::{NewReservation, ReservationPatch};

pub(crate) use conflict::now_ms;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::model::Event;
use crate::notify::EventSink;
use crate::store::{ReservationRepository, ResourceRepository};

/// The booking engine. Repositories and the event sink are injected;
/// the engine owns no storage of its own.
pub struct Engine {
    pub(crate) resources: Arc<dyn ResourceRepository>,
    pub(crate) reservations: Arc<dyn ReservationRepository>,
    events: Arc<dyn EventSink>,
    /// Per-resource mutexes serializing booking decisions. Holding the lock
    /// across the availability read and the write closes the
    /// check-then-write race for a single process.
    booking_locks: DashMap<Ulid, Arc<Mutex<()>>>,
}

impl Engine {
    pub fn new(
        resources: Arc<dyn ResourceRepository>,
        reservations: Arc<dyn ReservationRepository>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            resources,
            reservations,
            events,
            booking_locks: DashMap::new(),
        }
    }

    pub(crate) fn booking_lock(&self, resource_id: Ulid) -> Arc<Mutex<()>> {
        self.booking_locks.entry(resource_id).or_default().clone()
    }

    pub(crate) fn publish(&self, event: Event) {
        self.events.publish(event);
    }
}
