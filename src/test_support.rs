use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    config::{Settings, StoreBackend},
    db::{memory::MemoryStore, RegistrationRepository},
    models::{Attendee, Event, Invitation, InvitationStatus, Registration, User},
    service::crypto::generate_invitation_token,
    state::{AppState, Clock},
};

pub const BASE_URL: &str = "https://events.example.org";

pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub organizer: User,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(Settings {
            public_base_url: Some(BASE_URL.to_string()),
            store_backend: StoreBackend::Memory,
            ..Settings::default()
        })
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
        let state = AppState::new(store.clone(), settings).with_clock(clock.clone());
        let organizer = User {
            id: Uuid::new_v4(),
            name: "Olivia Organizer".to_string(),
            email: Some("olivia@example.org".to_string()),
        };
        Self { state, store, clock, organizer }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn user(&self, name: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: None,
        };
        self.store.insert_user(user.clone()).await;
        user
    }

    pub async fn register_guest(&self, event_id: Uuid, name: &str) -> Registration {
        let registration = Registration::new(event_id, &Attendee::Guest(name.to_string()), self.now());
        self.store.insert_registration(&registration).await.unwrap();
        registration
    }

    /// Stores a pending invitation that expires in an hour.
    pub async fn pending_invitation(&self, event_id: Uuid, guest: &str) -> Invitation {
        let now = self.now();
        let invitation = Invitation {
            id: Uuid::new_v4(),
            event_id,
            organizer_id: self.organizer.id,
            guest_identifier: guest.to_string(),
            status: InvitationStatus::Pending,
            token: generate_invitation_token(),
            expires_at: now + Duration::hours(1),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_invitation_unchecked(invitation.clone()).await;
        invitation
    }
}

/// Event owned by the context's organizer, starting `starts_in` from the clock's now.
pub async fn seed_event(ctx: &TestContext, capacity: i32, starts_in: Duration) -> Event {
    ctx.store.insert_user(ctx.organizer.clone()).await;
    let event = Event {
        id: Uuid::new_v4(),
        title: "Community meetup".to_string(),
        capacity,
        start_date_time: ctx.now() + starts_in,
        organizer_id: ctx.organizer.id,
        category_id: None,
    };
    ctx.store.insert_event(event.clone()).await;
    event
}
