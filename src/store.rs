//! Repository contracts and the DashMap-backed in-memory implementation.
//!
//! Persistence is an external collaborator; the engine only sees these
//! traits. `InMemoryStore` backs tests and single-process deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use ulid::Ulid;

use crate::limits::DAY_MS;
use crate::model::{Ms, Reservation, Resource, Span};

#[derive(Debug, Clone)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn create(&self, resource: Resource) -> StoreResult<()>;
    async fn find_by_id(&self, id: Ulid) -> StoreResult<Option<Resource>>;
    async fn find_all(&self) -> StoreResult<Vec<Resource>>;
    async fn find_all_active(&self) -> StoreResult<Vec<Resource>>;
    async fn save(&self, resource: Resource) -> StoreResult<()>;
    async fn delete(&self, id: Ulid) -> StoreResult<()>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn create(&self, reservation: Reservation) -> StoreResult<()>;
    async fn find_by_id(&self, id: Ulid) -> StoreResult<Option<Reservation>>;
    async fn find_all(&self) -> StoreResult<Vec<Reservation>>;
    /// Reservations overlapping the UTC day containing `date`.
    async fn find_by_date(&self, date: Ms) -> StoreResult<Vec<Reservation>>;
    async fn find_by_requester_id(&self, requester_id: Ulid) -> StoreResult<Vec<Reservation>>;
    async fn find_by_resource_id(&self, resource_id: Ulid) -> StoreResult<Vec<Reservation>>;
    /// Scheduled/Confirmed reservations on `resource_id` overlapping `range`.
    async fn find_active_by_resource_and_range(
        &self,
        resource_id: Ulid,
        range: Span,
    ) -> StoreResult<Vec<Reservation>>;
    async fn save(&self, reservation: Reservation) -> StoreResult<()>;
    async fn delete(&self, id: Ulid) -> StoreResult<()>;
}

#[derive(Default)]
pub struct InMemoryStore {
    resources: DashMap<Ulid, Resource>,
    reservations: DashMap<Ulid, Reservation>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn reservations_where<F>(&self, pred: F) -> Vec<Reservation>
    where
        F: Fn(&Reservation) -> bool,
    {
        let mut out: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|e| pred(e.value()))
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(|r| r.id);
        out
    }
}

#[async_trait]
impl ResourceRepository for InMemoryStore {
    async fn create(&self, resource: Resource) -> StoreResult<()> {
        self.resources.insert(resource.id, resource);
        Ok(())
    }

    async fn find_by_id(&self, id: Ulid) -> StoreResult<Option<Resource>> {
        Ok(self.resources.get(&id).map(|e| e.value().clone()))
    }

    async fn find_all(&self) -> StoreResult<Vec<Resource>> {
        let mut out: Vec<Resource> = self.resources.iter().map(|e| e.value().clone()).collect();
        out.sort_by_key(|r| r.id);
        Ok(out)
    }

    async fn find_all_active(&self) -> StoreResult<Vec<Resource>> {
        let mut out: Vec<Resource> = self
            .resources
            .iter()
            .filter(|e| e.value().is_active)
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(|r| r.id);
        Ok(out)
    }

    async fn save(&self, resource: Resource) -> StoreResult<()> {
        self.resources.insert(resource.id, resource);
        Ok(())
    }

    async fn delete(&self, id: Ulid) -> StoreResult<()> {
        self.resources.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn create(&self, reservation: Reservation) -> StoreResult<()> {
        self.reservations.insert(reservation.id, reservation);
        Ok(())
    }

    async fn find_by_id(&self, id: Ulid) -> StoreResult<Option<Reservation>> {
        Ok(self.reservations.get(&id).map(|e| e.value().clone()))
    }

    async fn find_all(&self) -> StoreResult<Vec<Reservation>> {
        Ok(self.reservations_where(|_| true))
    }

    async fn find_by_date(&self, date: Ms) -> StoreResult<Vec<Reservation>> {
        let day_start = date.div_euclid(DAY_MS) * DAY_MS;
        let day = Span::new(day_start, day_start + DAY_MS);
        Ok(self.reservations_where(|r| r.span.overlaps(&day)))
    }

    async fn find_by_requester_id(&self, requester_id: Ulid) -> StoreResult<Vec<Reservation>> {
        Ok(self.reservations_where(|r| r.requester_id == requester_id))
    }

    async fn find_by_resource_id(&self, resource_id: Ulid) -> StoreResult<Vec<Reservation>> {
        Ok(self.reservations_where(|r| r.resource_id == resource_id))
    }

    async fn find_active_by_resource_and_range(
        &self,
        resource_id: Ulid,
        range: Span,
    ) -> StoreResult<Vec<Reservation>> {
        Ok(self.reservations_where(|r| {
            r.resource_id == resource_id && r.status.is_active() && r.span.overlaps(&range)
        }))
    }

    async fn save(&self, reservation: Reservation) -> StoreResult<()> {
        self.reservations.insert(reservation.id, reservation);
        Ok(())
    }

    async fn delete(&self, id: Ulid) -> StoreResult<()> {
        self.reservations.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReservationStatus;

    const H: Ms = 3_600_000;

    fn reservation(resource_id: Ulid, span: Span, status: ReservationStatus) -> Reservation {
        let mut r = Reservation::new(resource_id, Ulid::new(), span, 1, None, 0).unwrap();
        r.status = status;
        r
    }

    #[tokio::test]
    async fn resource_roundtrip_and_active_filter() {
        let store = InMemoryStore::new();
        let mut a = Resource::new("Scope A", "oscilloscope", 2, None, None, 0).unwrap();
        let b = Resource::new("Scope B", "oscilloscope", 1, None, None, 0).unwrap();
        a.inactivate(1);
        ResourceRepository::create(&store, a.clone()).await.unwrap();
        ResourceRepository::create(&store, b.clone()).await.unwrap();

        assert_eq!(ResourceRepository::find_all(&store).await.unwrap().len(), 2);
        let active = store.find_all_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);

        ResourceRepository::delete(&store, b.id).await.unwrap();
        assert!(ResourceRepository::find_by_id(&store, b.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn active_range_finder_filters_status_and_overlap() {
        let store = InMemoryStore::new();
        let rid = Ulid::new();

        let hit = reservation(rid, Span::new(2 * H, 4 * H), ReservationStatus::Confirmed);
        let cancelled = reservation(rid, Span::new(2 * H, 4 * H), ReservationStatus::Cancelled);
        let adjacent = reservation(rid, Span::new(4 * H, 6 * H), ReservationStatus::Scheduled);
        let other_resource =
            reservation(Ulid::new(), Span::new(2 * H, 4 * H), ReservationStatus::Scheduled);
        for r in [&hit, &cancelled, &adjacent, &other_resource] {
            ReservationRepository::create(&store, r.clone()).await.unwrap();
        }

        let found = store
            .find_active_by_resource_and_range(rid, Span::new(3 * H, 4 * H))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, hit.id);
    }

    #[tokio::test]
    async fn find_by_date_uses_day_bounds() {
        let store = InMemoryStore::new();
        let rid = Ulid::new();
        let day2 = 2 * DAY_MS;

        let inside = reservation(rid, Span::new(day2 + H, day2 + 2 * H), ReservationStatus::Scheduled);
        let crossing =
            reservation(rid, Span::new(day2 - H, day2 + H), ReservationStatus::Scheduled);
        let day_before =
            reservation(rid, Span::new(day2 - 3 * H, day2 - 2 * H), ReservationStatus::Scheduled);
        for r in [&inside, &crossing, &day_before] {
            ReservationRepository::create(&store, r.clone()).await.unwrap();
        }

        let found = store.find_by_date(day2 + 5 * H).await.unwrap();
        let ids: Vec<Ulid> = found.iter().map(|r| r.id).collect();
        assert!(ids.contains(&inside.id));
        assert!(ids.contains(&crossing.id));
        assert!(!ids.contains(&day_before.id));
    }

    #[tokio::test]
    async fn finders_by_requester_and_resource() {
        let store = InMemoryStore::new();
        let rid = Ulid::new();
        let uid = Ulid::new();

        let mut mine = Reservation::new(rid, uid, Span::new(H, 2 * H), 1, None, 0).unwrap();
        mine.status = ReservationStatus::Scheduled;
        let other = reservation(rid, Span::new(2 * H, 3 * H), ReservationStatus::Scheduled);
        ReservationRepository::create(&store, mine.clone()).await.unwrap();
        ReservationRepository::create(&store, other.clone()).await.unwrap();

        let by_requester = store.find_by_requester_id(uid).await.unwrap();
        assert_eq!(by_requester.len(), 1);
        assert_eq!(by_requester[0].id, mine.id);

        let by_resource = store.find_by_resource_id(rid).await.unwrap();
        assert_eq!(by_resource.len(), 2);
    }
}
