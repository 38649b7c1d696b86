//! [`Handler`] abstraction.
//!
//! Commands, queries, tasks and database operations are all expressed as a
//! [`Handler`] of some argument type, so a single implementor (like a service
//! or a database client) may handle many distinct operations.

use std::future::Future;

/// Something able to execute `Args` asynchronously.
pub trait Handler<Args = ()> {
    /// Result of a successful execution.
    type Ok;

    /// Error of a failed execution.
    type Err;

    /// Executes the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
