//! Domain definitions.

pub mod address;
pub mod contact_info;
pub mod listing;
pub mod user;

pub use self::{
    contact_info::ContactInfo,
    listing::{details::ListingDetails, media::MediaAttachment, Listing},
    user::User,
};

/// Defines a validated free-text newtype.
///
/// A valid value has no leading or trailing whitespace, isn't empty and is at
/// most `$max` bytes long.
macro_rules! define_text {
    (
        $(
            #[doc = $doc:literal]
            $name:ident($max:literal);
        )+
    ) => {
        $(
            #[doc = $doc]
            #[derive(
                ::derive_more::AsRef,
                Clone,
                Debug,
                ::derive_more::Display,
                Eq,
                Hash,
                PartialEq,
            )]
            #[as_ref(str, String)]
            #[cfg_attr(
                feature = "postgres",
                derive(::postgres_types::FromSql, ::postgres_types::ToSql),
                postgres(transparent),
            )]
            pub struct $name(String);

            impl $name {
                #[doc = concat!(
                    "Creates a new [`", stringify!($name), "`] if the given ",
                    "`value` is valid.",
                )]
                #[must_use]
                pub fn new(value: impl Into<String>) -> Option<Self> {
                    let value = value.into();
                    Self::check(&value).then_some(Self(value))
                }

                #[doc = concat!(
                    "Checks whether the given `value` is a valid [`",
                    stringify!($name),
                    "`].",
                )]
                fn check(value: &str) -> bool {
                    value.trim() == value
                        && !value.is_empty()
                        && value.len() <= $max
                }
            }

            impl ::std::str::FromStr for $name {
                type Err = &'static str;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::new(s).ok_or(concat!(
                        "invalid `", stringify!($name), "`",
                    ))
                }
            }
        )+
    };
}

pub(crate) use define_text;
