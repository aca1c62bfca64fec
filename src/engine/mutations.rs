use tracing::{debug, info};
use ulid::Ulid;

use crate::auth::Caller;
use crate::limits::MAX_NOTES_LEN;
use crate::model::{
    Event, FieldPatch, Ms, Reservation, Resource, ResourceEdit, ResourceStatus, Span, SweepReport,
};
use crate::observability;

use super::conflict::{check_capacity, now_ms, validate_span};
use super::{Engine, EngineError};

/// Inputs for a new booking. The requester is the authenticated caller.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub resource_id: Ulid,
    pub span: Span,
    pub quantity: u32,
    pub notes: Option<String>,
}

/// Partial update for a reservation. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ReservationPatch {
    pub resource_id: Option<Ulid>,
    pub start: Option<Ms>,
    pub end: Option<Ms>,
    pub quantity: Option<u32>,
    pub notes: FieldPatch<String>,
}

impl Engine {
    // ── Reservations ─────────────────────────────────────────

    /// Book a quantity of a resource for a window. The availability check
    /// and the write run under the resource's booking mutex.
    pub async fn create_reservation(
        &self,
        caller: &Caller,
        req: NewReservation,
    ) -> Result<Reservation, EngineError> {
        let now = now_ms();
        validate_span(&req.span)?;
        if req.quantity == 0 {
            return Err(EngineError::InvalidQuantity(0));
        }

        let lock = self.booking_lock(req.resource_id);
        let _guard = lock.lock().await;

        let resource = self
            .resources
            .find_by_id(req.resource_id)
            .await?
            .filter(|r| r.is_active)
            .ok_or(EngineError::NotFound(req.resource_id))?;

        let overlapping = self
            .reservations
            .find_active_by_resource_and_range(req.resource_id, req.span)
            .await?;
        if let Err(e) = check_capacity(resource.quantity, &overlapping, &req.span, None, req.quantity)
        {
            metrics::counter!(observability::RESERVATIONS_REJECTED_TOTAL).increment(1);
            return Err(e);
        }

        let reservation = Reservation::new(
            req.resource_id,
            caller.user_id,
            req.span,
            req.quantity,
            req.notes,
            now,
        )?;
        self.reservations.create(reservation.clone()).await?;
        metrics::counter!(observability::RESERVATIONS_CREATED_TOTAL).increment(1);
        info!(
            "reservation {} created on resource {} (qty {})",
            reservation.id, reservation.resource_id, reservation.quantity
        );
        self.publish(Event::ReservationCreated {
            reservation: reservation.clone(),
            occurred_at: now,
        });
        Ok(reservation)
    }

    /// Edit a non-terminal reservation. Owner or elevated role only. When
    /// the candidate resource, window, or quantity differ from the current
    /// values, availability is re-checked with the reservation's own id
    /// excluded from the reserved sum.
    pub async fn update_reservation(
        &self,
        caller: &Caller,
        id: Ulid,
        patch: ReservationPatch,
    ) -> Result<Reservation, EngineError> {
        let now = now_ms();
        let mut reservation = self
            .reservations
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;

        if !caller.owns(&reservation) && !caller.role.is_elevated() {
            return Err(EngineError::Unauthorized(
                "only the requester or an elevated role may edit a reservation",
            ));
        }
        if reservation.status.is_terminal() {
            return Err(EngineError::Unauthorized(
                "completed or cancelled reservations cannot be edited",
            ));
        }

        let candidate_resource = patch.resource_id.unwrap_or(reservation.resource_id);
        let start = patch.start.unwrap_or(reservation.span.start);
        let end = patch.end.unwrap_or(reservation.span.end);
        if start >= end {
            return Err(EngineError::InvalidInterval { start, end });
        }
        let candidate_span = Span::new(start, end);
        validate_span(&candidate_span)?;
        let candidate_quantity = patch.quantity.unwrap_or(reservation.quantity);
        if candidate_quantity == 0 {
            return Err(EngineError::InvalidQuantity(0));
        }
        if let FieldPatch::Set(ref n) = patch.notes
            && n.chars().count() > MAX_NOTES_LEN
        {
            return Err(EngineError::Validation("notes too long"));
        }

        let capacity_relevant = candidate_resource != reservation.resource_id
            || candidate_span != reservation.span
            || candidate_quantity != reservation.quantity;

        // Lock only when the edit can change capacity usage.
        let lock = capacity_relevant.then(|| self.booking_lock(candidate_resource));
        let _guard = match &lock {
            Some(l) => Some(l.lock().await),
            None => None,
        };

        if capacity_relevant {
            let resource = self
                .resources
                .find_by_id(candidate_resource)
                .await?
                .ok_or(EngineError::NotFound(candidate_resource))?;
            let overlapping = self
                .reservations
                .find_active_by_resource_and_range(candidate_resource, candidate_span)
                .await?;
            if let Err(e) = check_capacity(
                resource.quantity,
                &overlapping,
                &candidate_span,
                Some(reservation.id),
                candidate_quantity,
            ) {
                metrics::counter!(observability::RESERVATIONS_REJECTED_TOTAL).increment(1);
                return Err(e);
            }
        }

        reservation.resource_id = candidate_resource;
        reservation.span = candidate_span;
        reservation.quantity = candidate_quantity;
        reservation.notes = patch.notes.apply(reservation.notes.take());
        reservation.updated_at = now;
        self.reservations.save(reservation.clone()).await?;
        debug!("reservation {} updated", reservation.id);
        Ok(reservation)
    }

    pub async fn confirm_reservation(
        &self,
        caller: &Caller,
        id: Ulid,
    ) -> Result<Reservation, EngineError> {
        if !caller.role.can_confirm() {
            return Err(EngineError::Unauthorized(
                "confirming reservations requires an elevated role",
            ));
        }
        let now = now_ms();
        let mut reservation = self
            .reservations
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        reservation.confirm(now)?;
        self.reservations.save(reservation.clone()).await?;
        metrics::counter!(observability::RESERVATIONS_CONFIRMED_TOTAL).increment(1);
        info!("reservation {id} confirmed");
        self.publish(Event::ReservationConfirmed {
            reservation: reservation.clone(),
            occurred_at: now,
        });
        Ok(reservation)
    }

    pub async fn cancel_reservation(
        &self,
        caller: &Caller,
        id: Ulid,
    ) -> Result<Reservation, EngineError> {
        if !caller.role.can_confirm() {
            return Err(EngineError::Unauthorized(
                "cancelling reservations requires an elevated role",
            ));
        }
        let now = now_ms();
        let mut reservation = self
            .reservations
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        reservation.cancel(now)?;
        self.reservations.save(reservation.clone()).await?;
        metrics::counter!(observability::RESERVATIONS_CANCELLED_TOTAL).increment(1);
        info!("reservation {id} cancelled");
        self.publish(Event::ReservationCancelled {
            reservation: reservation.clone(),
            occurred_at: now,
        });
        Ok(reservation)
    }

    // ── Resources ────────────────────────────────────────────

    pub async fn create_resource(
        &self,
        caller: &Caller,
        name: &str,
        kind: &str,
        quantity: u32,
        location: Option<String>,
        description: Option<String>,
    ) -> Result<Resource, EngineError> {
        if !caller.role.can_manage_resources() {
            return Err(EngineError::Unauthorized(
                "resource management requires an elevated role",
            ));
        }
        let resource = Resource::new(name, kind, quantity, location, description, now_ms())?;
        self.resources.create(resource.clone()).await?;
        info!("resource {} ({}) created, qty {}", resource.id, resource.name, resource.quantity);
        Ok(resource)
    }

    pub async fn edit_resource(
        &self,
        caller: &Caller,
        id: Ulid,
        edit: ResourceEdit,
    ) -> Result<Resource, EngineError> {
        if !caller.role.can_manage_resources() {
            return Err(EngineError::Unauthorized(
                "resource management requires an elevated role",
            ));
        }
        let mut resource = self
            .resources
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        resource.edit(edit, now_ms())?;
        self.resources.save(resource.clone()).await?;
        debug!("resource {id} edited");
        Ok(resource)
    }

    pub async fn set_resource_status(
        &self,
        caller: &Caller,
        id: Ulid,
        status: ResourceStatus,
    ) -> Result<Resource, EngineError> {
        if !caller.role.can_manage_resources() {
            return Err(EngineError::Unauthorized(
                "resource management requires an elevated role",
            ));
        }
        let now = now_ms();
        let mut resource = self
            .resources
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        match status {
            ResourceStatus::Available => resource.mark_available(now),
            ResourceStatus::InUse => resource.mark_in_use(now),
            ResourceStatus::Maintenance => resource.mark_maintenance(now),
        }
        self.resources.save(resource.clone()).await?;
        Ok(resource)
    }

    pub async fn set_resource_active(
        &self,
        caller: &Caller,
        id: Ulid,
        active: bool,
    ) -> Result<Resource, EngineError> {
        if !caller.role.can_manage_resources() {
            return Err(EngineError::Unauthorized(
                "resource management requires an elevated role",
            ));
        }
        let now = now_ms();
        let mut resource = self
            .resources
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        if active {
            resource.activate(now);
        } else {
            resource.inactivate(now);
        }
        self.resources.save(resource.clone()).await?;
        Ok(resource)
    }

    // ── Sweep ────────────────────────────────────────────────

    /// Auto-complete confirmed reservations whose end has passed. Per-item
    /// failures are recorded and skipped; the item still matches the
    /// selection predicate and is retried on the next invocation. Running
    /// twice on the same data is a no-op the second time.
    pub async fn sweep(&self, now: Ms) -> Result<SweepReport, EngineError> {
        let sweep_start = std::time::Instant::now();
        let all = self.reservations.find_all().await?;

        let mut report = SweepReport::default();
        let mut transitioned: Vec<Reservation> = Vec::new();

        for mut r in all {
            if r.status != crate::model::ReservationStatus::Confirmed || r.span.end > now {
                continue;
            }
            if let Err(e) = r.complete(now) {
                tracing::warn!("sweep: skipping {}: {e}", r.id);
                report.errors.push((r.id, e));
                continue;
            }
            match self.reservations.save(r.clone()).await {
                Ok(()) => {
                    info!("sweep: reservation {} completed", r.id);
                    report.completed.push(r.id);
                    transitioned.push(r);
                }
                Err(e) => {
                    tracing::warn!("sweep: failed to persist {}: {e}", r.id);
                    report.errors.push((r.id, e.into()));
                }
            }
        }

        for reservation in transitioned {
            self.publish(Event::ReservationCompleted { reservation, occurred_at: now });
        }

        metrics::counter!(observability::SWEEP_COMPLETED_TOTAL)
            .increment(report.completed.len() as u64);
        metrics::counter!(observability::SWEEP_ERRORS_TOTAL)
            .increment(report.errors.len() as u64);
        metrics::histogram!(observability::SWEEP_DURATION_SECONDS)
            .record(sweep_start.elapsed().as_secs_f64());

        Ok(report)
    }
}
