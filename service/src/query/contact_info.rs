//! [`Query`] collection related to a single [`ContactInfo`].

use common::operations::By;

use crate::domain::{contact_info, ContactInfo};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`ContactInfo`] by its [`contact_info::Id`].
pub type ById = DatabaseQuery<By<Option<ContactInfo>, contact_info::Id>>;
