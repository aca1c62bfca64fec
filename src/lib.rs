//! Booking/availability engine for finite-quantity equipment.
//!
//! The engine computes remaining capacity of a resource over a time window,
//! accepts or rejects reservations against that capacity, enforces the
//! reservation status state machine, and auto-completes expired confirmed
//! reservations. Persistence and event delivery are external collaborators
//! reached through the traits in [`store`] and [`notify`].

pub mod auth;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod store;
pub mod sweeper;

pub use auth::{Caller, Role};
pub use engine::{availability, AvailabilityReport, Engine, EngineError};
pub use model::{
    Event, FieldPatch, Ms, Reservation, ReservationStatus, Resource, ResourceStatus, Span,
    SweepReport,
};
pub use notify::{EventSink, NotifyHub};
