use ulid::Ulid;

use crate::limits::MAX_QUERY_WINDOW_MS;
use crate::model::{Ms, Reservation, Resource, Span};

use super::availability::{availability, AvailabilityReport};
use super::{Engine, EngineError};

impl Engine {
    /// Remaining capacity of a resource over a window. `exclude` drops one
    /// reservation from the reserved sum (used when re-checking an edit
    /// against itself). Read-only.
    pub async fn compute_availability(
        &self,
        resource_id: Ulid,
        window: Span,
        exclude: Option<Ulid>,
    ) -> Result<AvailabilityReport, EngineError> {
        if window.start >= window.end {
            return Err(EngineError::InvalidInterval { start: window.start, end: window.end });
        }
        if window.duration_ms() > MAX_QUERY_WINDOW_MS {
            return Err(EngineError::LimitExceeded("query window too wide"));
        }
        let resource = self
            .resources
            .find_by_id(resource_id)
            .await?
            .ok_or(EngineError::NotFound(resource_id))?;
        let overlapping = self
            .reservations
            .find_active_by_resource_and_range(resource_id, window)
            .await?;
        Ok(availability(resource.quantity, &overlapping, &window, exclude))
    }

    pub async fn get_resource(&self, id: Ulid) -> Result<Resource, EngineError> {
        self.resources
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))
    }

    pub async fn list_resources(&self) -> Result<Vec<Resource>, EngineError> {
        Ok(self.resources.find_all().await?)
    }

    pub async fn list_active_resources(&self) -> Result<Vec<Resource>, EngineError> {
        Ok(self.resources.find_all_active().await?)
    }

    pub async fn get_reservation(&self, id: Ulid) -> Result<Reservation, EngineError> {
        self.reservations
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))
    }

    pub async fn list_reservations(&self) -> Result<Vec<Reservation>, EngineError> {
        Ok(self.reservations.find_all().await?)
    }

    pub async fn list_reservations_by_requester(
        &self,
        requester_id: Ulid,
    ) -> Result<Vec<Reservation>, EngineError> {
        Ok(self.reservations.find_by_requester_id(requester_id).await?)
    }

    pub async fn list_reservations_by_resource(
        &self,
        resource_id: Ulid,
    ) -> Result<Vec<Reservation>, EngineError> {
        Ok(self.reservations.find_by_resource_id(resource_id).await?)
    }

    /// Reservations overlapping the UTC day containing `date`.
    pub async fn list_reservations_on_date(
        &self,
        date: Ms,
    ) -> Result<Vec<Reservation>, EngineError> {
        Ok(self.reservations.find_by_date(date).await?)
    }
}
