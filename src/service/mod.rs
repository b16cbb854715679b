pub mod capacity;
pub mod crypto;
pub mod event;
pub mod invitation;
pub mod log;
pub mod registration;
