//! [`Command`] for creating a new [`ContactInfo`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::contact_info::{Company, Name, Phone, Website};
use crate::{
    domain::{address::Address, contact_info, user, ContactInfo},
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for creating a new [`ContactInfo`].
#[derive(Clone, Debug)]
pub struct CreateContactInfo {
    /// [`Name`] of the contact person.
    pub name: contact_info::Name,

    /// [`Company`] of the contact person.
    pub company: Option<contact_info::Company>,

    /// Postal [`Address`] of the contact person.
    pub address: Address,

    /// [`Phone`] of the contact person.
    pub phone: Option<contact_info::Phone>,

    /// [`user::Email`] of the contact person.
    pub email: Option<user::Email>,

    /// [`Website`] of the contact person.
    pub website: Option<contact_info::Website>,

    /// Answers to "how did you hear about us".
    pub referral_sources: Vec<contact_info::ReferralSource>,

    /// Indicator whether the seller accepted the marketplace terms.
    pub terms_accepted: bool,
}

impl<Db> Command<CreateContactInfo> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<ContactInfo>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ContactInfo;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateContactInfo,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateContactInfo {
            name,
            company,
            address,
            phone,
            email,
            website,
            mut referral_sources,
            terms_accepted,
        } = cmd;

        if !terms_accepted {
            return Err(tracerr::new!(E::TermsNotAccepted));
        }

        referral_sources.dedup();

        let now = DateTime::now();
        let info = ContactInfo {
            id: contact_info::Id::new(),
            name,
            company,
            address,
            phone,
            email,
            website,
            referral_sources,
            terms_accepted,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(info.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(info)
    }
}

/// Error of [`CreateContactInfo`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Seller didn't accept the marketplace terms.
    #[display("Marketplace terms are not accepted")]
    TermsNotAccepted,
}

impl Categorized for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Db(e) => e.category(),
            Self::TermsNotAccepted => Category::Validation,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{Categorized as _, Category},
        domain::{address::Address, contact_info, user},
        query, Query as _, Service,
    };

    use super::{Command as _, CreateContactInfo};

    fn cmd(terms_accepted: bool) -> CreateContactInfo {
        CreateContactInfo {
            name: contact_info::Name::new("Jane Seller").unwrap(),
            company: contact_info::Company::new("Acme Co"),
            address: Address::default(),
            phone: contact_info::Phone::new("+1 713 555 0100"),
            email: user::Email::new("jane@acme.example"),
            website: None,
            referral_sources: vec![
                contact_info::ReferralSource::new("Trade show").unwrap(),
            ],
            terms_accepted,
        }
    }

    #[tokio::test]
    async fn stores_contact_info() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);

        let info = svc.execute(cmd(true)).await.unwrap();

        let stored = svc
            .execute(query::contact_info::ById::by(info.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.referral_sources.len(), 1);
        assert_eq!(stored.company, info.company);
    }

    #[tokio::test]
    async fn requires_accepted_terms() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);

        let err = svc.execute(cmd(false)).await.unwrap_err();

        assert_eq!(err.category(), Category::Validation);
    }
}
