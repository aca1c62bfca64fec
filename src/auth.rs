use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::model::Reservation;

/// Caller role as a closed enum. Capability checks go through the
/// predicates below, never through string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Requester,
    Staff,
    Admin,
}

impl Role {
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }

    /// Confirming and cancelling reservations is restricted to staff/admin.
    pub fn can_confirm(&self) -> bool {
        self.is_elevated()
    }

    pub fn can_manage_resources(&self) -> bool {
        self.is_elevated()
    }
}

/// Authenticated identity passed into every authorizing operation.
/// Token verification happens upstream; the engine only sees the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Ulid,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: Ulid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn owns(&self, reservation: &Reservation) -> bool {
        self.user_id == reservation.requester_id
    }
}
