//! Postal address parts shared by [`ContactInfo`] and [`Listing`] locations.
//!
//! [`ContactInfo`]: super::ContactInfo
//! [`Listing`]: super::Listing

use super::define_text;

define_text! {
    #[doc = "Street address line."]
    Street(512);

    #[doc = "City name."]
    City(256);

    #[doc = "State or province name."]
    State(256);

    #[doc = "Postal or zip code."]
    ZipCode(32);

    #[doc = "Country name."]
    Country(256);
}

/// Postal address with every part being optional.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Address {
    /// [`Street`] line of this [`Address`].
    pub street: Option<Street>,

    /// [`City`] of this [`Address`].
    pub city: Option<City>,

    /// [`State`] of this [`Address`].
    pub state: Option<State>,

    /// [`ZipCode`] of this [`Address`].
    pub zip_code: Option<ZipCode>,

    /// [`Country`] of this [`Address`].
    pub country: Option<Country>,
}
