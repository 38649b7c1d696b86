//! Marker types distinguishing [`DateTimeOf`] kinds.
//!
//! [`DateTimeOf`]: crate::DateTimeOf

/// Entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Entity modification.
#[derive(Clone, Copy, Debug)]
pub struct Modification;

/// Entity deletion.
#[derive(Clone, Copy, Debug)]
pub struct Deletion;

/// Start of a reservation window.
#[derive(Clone, Copy, Debug)]
pub struct ReservationStart;

/// End of a reservation window.
#[derive(Clone, Copy, Debug)]
pub struct ReservationEnd;

/// Completed sale.
#[derive(Clone, Copy, Debug)]
pub struct Sale;

/// Finished upload.
#[derive(Clone, Copy, Debug)]
pub struct Upload;
