//! Background [`Task`]s definitions.

mod background;
pub mod release_expired_reservations;

pub use common::Handler as Task;

pub use self::{
    background::{Background, BoxedError},
    release_expired_reservations::ReleaseExpiredReservations,
};
