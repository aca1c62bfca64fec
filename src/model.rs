use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::EngineError;
use crate::limits::*;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// Informational resource condition. Never consulted by the conflict
/// resolver — capacity math is the sole booking gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceStatus {
    Available,
    InUse,
    Maintenance,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Available => write!(f, "available"),
            ResourceStatus::InUse => write!(f, "in_use"),
            ResourceStatus::Maintenance => write!(f, "maintenance"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    /// Active reservations count against capacity.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Scheduled | ReservationStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Completed | ReservationStatus::Cancelled)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Scheduled => write!(f, "scheduled"),
            ReservationStatus::Confirmed => write!(f, "confirmed"),
            ReservationStatus::Completed => write!(f, "completed"),
            ReservationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Three-way delta for optional fields: `Keep` leaves the value, `Clear`
/// unsets it, `Set` replaces it. Removes the omit-vs-null ambiguity of
/// patch inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldPatch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> FieldPatch<T> {
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            FieldPatch::Keep => current,
            FieldPatch::Clear => None,
            FieldPatch::Set(v) => Some(v),
        }
    }
}

fn validate_len(value: &str, max: usize, msg: &'static str) -> Result<(), EngineError> {
    if value.chars().count() > max {
        return Err(EngineError::Validation(msg));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<String, EngineError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len < MIN_NAME_LEN || len > MAX_NAME_LEN {
        return Err(EngineError::Validation("resource name must be 2-100 characters"));
    }
    Ok(trimmed.to_string())
}

fn validate_kind(kind: &str) -> Result<String, EngineError> {
    let trimmed = kind.trim();
    if trimmed.chars().count() < MIN_KIND_LEN {
        return Err(EngineError::Validation("resource type must be at least 2 characters"));
    }
    Ok(trimmed.to_string())
}

/// A finite-quantity piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Ulid,
    pub name: String,
    pub kind: String,
    pub quantity: u32,
    pub status: ResourceStatus,
    pub location: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Ms,
    pub updated_at: Ms,
}

/// Partial edit for a resource. `None` keeps the current value; optional
/// fields carry an explicit [`FieldPatch`].
#[derive(Debug, Clone, Default)]
pub struct ResourceEdit {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub quantity: Option<u32>,
    pub location: FieldPatch<String>,
    pub description: FieldPatch<String>,
}

impl Resource {
    pub fn new(
        name: &str,
        kind: &str,
        quantity: u32,
        location: Option<String>,
        description: Option<String>,
        now: Ms,
    ) -> Result<Self, EngineError> {
        let name = validate_name(name)?;
        let kind = validate_kind(kind)?;
        if let Some(ref v) = location {
            validate_len(v, MAX_LOCATION_LEN, "location too long")?;
        }
        if let Some(ref v) = description {
            validate_len(v, MAX_DESCRIPTION_LEN, "description too long")?;
        }
        Ok(Self {
            id: Ulid::new(),
            name,
            kind,
            quantity,
            status: ResourceStatus::Available,
            location,
            description,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn mark_available(&mut self, now: Ms) {
        self.status = ResourceStatus::Available;
        self.updated_at = now;
    }

    pub fn mark_in_use(&mut self, now: Ms) {
        self.status = ResourceStatus::InUse;
        self.updated_at = now;
    }

    pub fn mark_maintenance(&mut self, now: Ms) {
        self.status = ResourceStatus::Maintenance;
        self.updated_at = now;
    }

    pub fn activate(&mut self, now: Ms) {
        self.is_active = true;
        self.updated_at = now;
    }

    pub fn inactivate(&mut self, now: Ms) {
        self.is_active = false;
        self.updated_at = now;
    }

    /// Apply a partial edit. Validates everything before mutating anything,
    /// so a rejected edit leaves the resource untouched.
    pub fn edit(&mut self, edit: ResourceEdit, now: Ms) -> Result<(), EngineError> {
        let name = match edit.name {
            Some(ref n) => Some(validate_name(n)?),
            None => None,
        };
        let kind = match edit.kind {
            Some(ref k) => Some(validate_kind(k)?),
            None => None,
        };
        if let FieldPatch::Set(ref v) = edit.location {
            validate_len(v, MAX_LOCATION_LEN, "location too long")?;
        }
        if let FieldPatch::Set(ref v) = edit.description {
            validate_len(v, MAX_DESCRIPTION_LEN, "description too long")?;
        }

        if let Some(n) = name {
            self.name = n;
        }
        if let Some(k) = kind {
            self.kind = k;
        }
        if let Some(q) = edit.quantity {
            self.quantity = q;
        }
        self.location = edit.location.apply(self.location.take());
        self.description = edit.description.apply(self.description.take());
        self.updated_at = now;
        Ok(())
    }
}

/// A time-bounded claim on a quantity of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub resource_id: Ulid,
    pub requester_id: Ulid,
    pub span: Span,
    pub quantity: u32,
    pub notes: Option<String>,
    pub status: ReservationStatus,
    pub created_at: Ms,
    pub updated_at: Ms,
}

impl Reservation {
    /// Smart constructor for fresh reservations. The past-start check applies
    /// here only — reservations reloaded from storage never pass through it.
    pub fn new(
        resource_id: Ulid,
        requester_id: Ulid,
        span: Span,
        quantity: u32,
        notes: Option<String>,
        now: Ms,
    ) -> Result<Self, EngineError> {
        if quantity == 0 {
            return Err(EngineError::InvalidQuantity(0));
        }
        if span.start >= span.end {
            return Err(EngineError::InvalidInterval { start: span.start, end: span.end });
        }
        if span.start < now {
            return Err(EngineError::Validation("reservation cannot start in the past"));
        }
        if let Some(ref n) = notes {
            validate_len(n, MAX_NOTES_LEN, "notes too long")?;
        }
        Ok(Self {
            id: Ulid::new(),
            resource_id,
            requester_id,
            span,
            quantity,
            notes,
            status: ReservationStatus::Scheduled,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn confirm(&mut self, now: Ms) -> Result<(), EngineError> {
        match self.status {
            ReservationStatus::Scheduled => {
                self.status = ReservationStatus::Confirmed;
                self.updated_at = now;
                Ok(())
            }
            from => Err(EngineError::InvalidTransition {
                from,
                reason: "only scheduled reservations can be confirmed",
            }),
        }
    }

    pub fn cancel(&mut self, now: Ms) -> Result<(), EngineError> {
        match self.status {
            ReservationStatus::Scheduled | ReservationStatus::Confirmed => {
                self.status = ReservationStatus::Cancelled;
                self.updated_at = now;
                Ok(())
            }
            from => Err(EngineError::InvalidTransition {
                from,
                reason: "cannot cancel a completed or already cancelled reservation",
            }),
        }
    }

    pub fn complete(&mut self, now: Ms) -> Result<(), EngineError> {
        match self.status {
            ReservationStatus::Confirmed => {
                self.status = ReservationStatus::Completed;
                self.updated_at = now;
                Ok(())
            }
            from => Err(EngineError::InvalidTransition {
                from,
                reason: "only confirmed reservations can be completed",
            }),
        }
    }
}

/// Lifecycle notifications handed to the injected event sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ReservationCreated { reservation: Reservation, occurred_at: Ms },
    ReservationConfirmed { reservation: Reservation, occurred_at: Ms },
    ReservationCancelled { reservation: Reservation, occurred_at: Ms },
    ReservationCompleted { reservation: Reservation, occurred_at: Ms },
}

impl Event {
    pub fn reservation(&self) -> &Reservation {
        match self {
            Event::ReservationCreated { reservation, .. }
            | Event::ReservationConfirmed { reservation, .. }
            | Event::ReservationCancelled { reservation, .. }
            | Event::ReservationCompleted { reservation, .. } => reservation,
        }
    }

    pub fn occurred_at(&self) -> Ms {
        match self {
            Event::ReservationCreated { occurred_at, .. }
            | Event::ReservationConfirmed { occurred_at, .. }
            | Event::ReservationCancelled { occurred_at, .. }
            | Event::ReservationCompleted { occurred_at, .. } => *occurred_at,
        }
    }

    pub fn resource_id(&self) -> Ulid {
        self.reservation().resource_id
    }
}

/// Outcome of one sweep run.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Reservations transitioned to Completed and persisted.
    pub completed: Vec<Ulid>,
    /// Per-item failures; the failing reservations stay Confirmed and are
    /// reconsidered on the next run.
    pub errors: Vec<(Ulid, EngineError)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: Ms = 3_600_000;

    fn fresh(span: Span, quantity: u32, now: Ms) -> Reservation {
        Reservation::new(Ulid::new(), Ulid::new(), span, quantity, None, now).unwrap()
    }

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(s.contains_instant(199));
        assert!(!s.contains_instant(200)); // half-open
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
    }

    #[test]
    fn resource_name_validated_and_trimmed() {
        let r = Resource::new("  Scope A  ", "oscilloscope", 3, None, None, 0).unwrap();
        assert_eq!(r.name, "Scope A");
        assert!(r.is_active);
        assert_eq!(r.status, ResourceStatus::Available);

        let too_short = Resource::new("x", "oscilloscope", 3, None, None, 0);
        assert!(matches!(too_short, Err(EngineError::Validation(_))));

        let too_long = Resource::new(&"x".repeat(101), "oscilloscope", 3, None, None, 0);
        assert!(matches!(too_long, Err(EngineError::Validation(_))));
    }

    #[test]
    fn resource_kind_validated() {
        let r = Resource::new("Scope", "x", 1, None, None, 0);
        assert!(matches!(r, Err(EngineError::Validation(_))));
    }

    #[test]
    fn resource_edit_field_patch_semantics() {
        let mut r =
            Resource::new("Scope", "oscilloscope", 3, Some("lab 2".into()), None, 0).unwrap();

        r.edit(ResourceEdit { quantity: Some(5), ..Default::default() }, 10).unwrap();
        assert_eq!(r.quantity, 5);
        assert_eq!(r.location.as_deref(), Some("lab 2")); // Keep
        assert_eq!(r.updated_at, 10);

        r.edit(ResourceEdit { location: FieldPatch::Clear, ..Default::default() }, 20).unwrap();
        assert_eq!(r.location, None);

        r.edit(
            ResourceEdit {
                description: FieldPatch::Set("4-channel".into()),
                ..Default::default()
            },
            30,
        )
        .unwrap();
        assert_eq!(r.description.as_deref(), Some("4-channel"));
    }

    #[test]
    fn resource_edit_rejected_leaves_state_untouched() {
        let mut r = Resource::new("Scope", "oscilloscope", 3, None, None, 0).unwrap();
        let before = r.clone();
        let bad = ResourceEdit { name: Some("x".into()), quantity: Some(9), ..Default::default() };
        assert!(r.edit(bad, 10).is_err());
        assert_eq!(r, before);
    }

    #[test]
    fn resource_status_marks() {
        let mut r = Resource::new("Scope", "oscilloscope", 3, None, None, 0).unwrap();
        r.mark_in_use(5);
        assert_eq!(r.status, ResourceStatus::InUse);
        r.mark_maintenance(6);
        assert_eq!(r.status, ResourceStatus::Maintenance);
        r.mark_available(7);
        assert_eq!(r.status, ResourceStatus::Available);
        r.inactivate(8);
        assert!(!r.is_active);
        r.activate(9);
        assert!(r.is_active);
        assert_eq!(r.updated_at, 9);
    }

    #[test]
    fn reservation_new_validation() {
        let rid = Ulid::new();
        let uid = Ulid::new();

        let zero = Reservation::new(rid, uid, Span::new(100, 200), 0, None, 0);
        assert!(matches!(zero, Err(EngineError::InvalidQuantity(0))));

        let backwards = Reservation::new(rid, uid, Span { start: 200, end: 100 }, 1, None, 0);
        assert!(matches!(backwards, Err(EngineError::InvalidInterval { .. })));

        let past = Reservation::new(rid, uid, Span::new(100, 200), 1, None, 500);
        assert!(matches!(past, Err(EngineError::Validation(_))));

        let ok = Reservation::new(rid, uid, Span::new(100, 200), 1, None, 100).unwrap();
        assert_eq!(ok.status, ReservationStatus::Scheduled);
    }

    #[test]
    fn transition_matrix() {
        let now = 0;
        let span = Span::new(H, 2 * H);

        // Scheduled → Confirmed → Completed
        let mut r = fresh(span, 1, now);
        r.confirm(10).unwrap();
        assert_eq!(r.status, ReservationStatus::Confirmed);
        assert_eq!(r.updated_at, 10);
        r.complete(20).unwrap();
        assert_eq!(r.status, ReservationStatus::Completed);

        // Completed is terminal
        assert!(r.confirm(30).is_err());
        assert!(r.cancel(30).is_err());
        assert!(r.complete(30).is_err());

        // Scheduled → Cancelled
        let mut r = fresh(span, 1, now);
        r.cancel(10).unwrap();
        assert_eq!(r.status, ReservationStatus::Cancelled);
        assert!(matches!(
            r.confirm(20),
            Err(EngineError::InvalidTransition { from: ReservationStatus::Cancelled, .. })
        ));

        // Confirmed → Cancelled is legal
        let mut r = fresh(span, 1, now);
        r.confirm(10).unwrap();
        r.cancel(20).unwrap();
        assert_eq!(r.status, ReservationStatus::Cancelled);

        // Scheduled cannot complete directly
        let mut r = fresh(span, 1, now);
        assert!(r.complete(10).is_err());
    }

    #[test]
    fn status_activity() {
        assert!(ReservationStatus::Scheduled.is_active());
        assert!(ReservationStatus::Confirmed.is_active());
        assert!(!ReservationStatus::Completed.is_active());
        assert!(!ReservationStatus::Cancelled.is_active());
        assert!(ReservationStatus::Completed.is_terminal());
        assert!(ReservationStatus::Cancelled.is_terminal());
    }

    #[test]
    fn event_accessors_and_json() {
        let r = fresh(Span::new(H, 2 * H), 2, 0);
        let event = Event::ReservationCreated { reservation: r.clone(), occurred_at: 42 };
        assert_eq!(event.resource_id(), r.resource_id);
        assert_eq!(event.occurred_at(), 42);
        assert_eq!(event.reservation().id, r.id);

        let json = serde_json::to_string(&event).unwrap();
        let decoded: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, event);
    }
}
