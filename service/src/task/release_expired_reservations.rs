//! [`ReleaseExpiredReservations`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Select, Start};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::listing::Status;
use crate::{
    command::{
        self,
        release_listing_reservation::{self, Reason},
        Categorized as _, Category, ReleaseListingReservation,
    },
    domain::{listing, Listing},
    infra::{database, Database},
    Service,
};

use super::Task;

/// Configuration for [`ReleaseExpiredReservations`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between sweeps over [`Status::Reserved`] [`Listing`]s.
    pub interval: time::Duration,
}

/// [`Task`] for returning [`Status::Reserved`] [`Listing`]s, whose
/// reservation deadline has passed, back to [`Status::Published`].
///
/// Several sweeps may run at once (even in different processes): each
/// [`Listing`] is released by a version-checked write, so only one of them
/// wins, while the others skip it.
#[derive(Clone, Copy, Debug)]
pub struct ReleaseExpiredReservations<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ReleaseExpiredReservations<Self>, Config>>>
    for Service<Db>
where
    ReleaseExpiredReservations<Service<Db>>:
        Task<Perform<()>, Ok = usize, Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ReleaseExpiredReservations<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ReleaseExpiredReservations {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::ReleaseExpiredReservations` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for ReleaseExpiredReservations<Service<Db>>
where
    Db: Database<
        Select<By<Vec<listing::Id>, listing::ReservationDeadline>>,
        Ok = Vec<listing::Id>,
        Err = Traced<database::Error>,
    >,
    Service<Db>: command::Command<
        ReleaseListingReservation,
        Ok = Listing,
        Err = Traced<release_listing_reservation::ExecutionError>,
    >,
{
    /// Number of released [`Listing`]s.
    type Ok = usize;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let expired = self
            .service
            .database()
            .execute(Select(By::new(listing::ReservationDeadline::now())))
            .await
            .map_err(tracerr::wrap!())?;

        let mut released = 0;
        for listing_id in expired {
            let res = self
                .service
                .execute(ReleaseListingReservation {
                    listing_id,
                    reason: Reason::Expired,
                })
                .await;
            match res {
                Ok(_) => released += 1,
                Err(e) => match e.as_ref().category() {
                    // Sold, released or re-reserved in the meantime.
                    Category::Conflict
                    | Category::InvalidTransition
                    | Category::NotFound => {
                        log::debug!(
                            "skipped `Listing(id: {listing_id})` \
                             reservation release: {e}",
                        );
                    }
                    Category::Validation | Category::Internal => {
                        log::error!(
                            "failed to release `Listing(id: {listing_id})` \
                             reservation: {e}",
                        );
                    }
                },
            }
        }

        if released > 0 {
            log::info!("released {released} expired `Listing` reservations");
        }
        Ok(released)
    }
}

/// Error of [`ReleaseExpiredReservations`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::Perform;

    use crate::{
        domain::{
            listing::{Availability, Status},
            user,
        },
        for_tests::in_days,
        infra::Memory,
        Service,
    };

    use super::{Config, ReleaseExpiredReservations, Task as _};

    fn sweep(
        svc: &Service<Memory>,
    ) -> ReleaseExpiredReservations<Service<Memory>> {
        ReleaseExpiredReservations {
            config: Config {
                interval: Duration::from_secs(60),
            },
            service: svc.clone(),
        }
    }

    #[tokio::test]
    async fn releases_only_expired() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let expired = svc.seed_reserved_listing(in_days(-1)).await;
        let active = svc.seed_reserved_listing(in_days(1)).await;

        let released = sweep(&svc).execute(Perform(())).await.unwrap();

        assert_eq!(released, 1);
        let expired = svc.stored_listing(expired.id).await.unwrap();
        assert_eq!(expired.status(), Status::Published);
        assert_eq!(expired.availability(), Availability::Available);
        assert!(expired.reservation().is_none());
        let active = svc.stored_listing(active.id).await.unwrap();
        assert_eq!(active.status(), Status::Reserved);
    }

    #[tokio::test]
    async fn is_idempotent() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_reserved_listing(in_days(-1)).await;
        let task = sweep(&svc);

        assert_eq!(task.execute(Perform(())).await.unwrap(), 1);
        assert_eq!(task.execute(Perform(())).await.unwrap(), 0);

        let stored = svc.stored_listing(listing.id).await.unwrap();
        assert_eq!(stored.status(), Status::Published);
    }

    #[tokio::test]
    async fn concurrent_sweeps_release_once() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_reserved_listing(in_days(-1)).await;
        let (a, b) = (sweep(&svc), sweep(&svc));

        let (x, y) =
            tokio::join!(a.execute(Perform(())), b.execute(Perform(())));

        assert_eq!(x.unwrap() + y.unwrap(), 1);
        let stored = svc.stored_listing(listing.id).await.unwrap();
        assert_eq!(stored.status(), Status::Published);
        assert_eq!(stored.version, listing.version.next());
    }
}
