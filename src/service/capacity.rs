use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{CapacityGuard, EventRepository},
    errors::AppError,
    state::AppState,
};

/// Seat usage of one event.
///
/// `accepted_invitations` is informational: an accepted invitation is always
/// paired with the guest registration created in the same write, so the seat
/// is already part of `registrations`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Occupancy {
    pub registrations: u64,
    pub pending_invitations: u64,
    pub accepted_invitations: u64,
}

impl Occupancy {
    pub fn occupied(&self) -> u64 {
        self.registrations + self.pending_invitations
    }

    /// Occupied spots while one of the pending invitations is being answered.
    pub fn occupied_without_one_pending(&self) -> u64 {
        self.registrations + self.pending_invitations.saturating_sub(1)
    }
}

/// Capacity 0 (or a corrupt negative value) disables enforcement.
pub fn has_room(capacity: i32, occupied: u64) -> bool {
    capacity <= 0 || occupied < capacity as u64
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyView {
    pub capacity: i32,
    pub occupied: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<u64>,
}

impl OccupancyView {
    pub fn new(capacity: i32, occupied: u64) -> Self {
        let available = if capacity > 0 {
            Some((capacity as u64).saturating_sub(occupied))
        } else {
            None
        };
        Self { capacity, occupied, available }
    }
}

pub async fn occupied_spots(state: &AppState, event_id: Uuid) -> Result<u64, AppError> {
    if state.store.find_event(event_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let occupancy = state.store.occupancy(event_id).await?;
    Ok(occupancy.occupied())
}

pub async fn get_occupancy(state: &AppState, event_id: Uuid) -> Result<OccupancyView, AppError> {
    let event = state.store.find_event(event_id).await?.ok_or(AppError::NotFound)?;
    let occupancy = state.store.occupancy(event_id).await?;
    Ok(OccupancyView::new(event.capacity, occupancy.occupied()))
}
