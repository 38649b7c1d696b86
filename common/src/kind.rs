//! Macro for defining kind enums.

/// Defines a fieldless enum persisted and serialized as a fixed set of
/// `SCREAMING_SNAKE_CASE` strings.
///
/// # Example
///
/// ```rust
/// # use common::define_kind;
/// define_kind! {
///     #[doc = "Shape kind."]
///     enum Shape {
///         #[doc = "A cube."]
///         Cube,
///
///         #[doc = "A sphere."]
///         Sphere,
///     }
/// }
///
/// assert_eq!(Shape::Cube.as_str(), "CUBE");
/// assert_eq!("SPHERE".parse::<Shape>(), Ok(Shape::Sphere));
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $crate::__kind_serde! {
            #[derive(
                Clone,
                Copy,
                Debug,
                $crate::private::strum::Display,
                $crate::private::strum::EnumIter,
                $crate::private::strum::EnumString,
                $crate::private::strum::IntoStaticStr,
                Eq,
                Hash,
                PartialEq,
            )]
            #[doc = $doc]
            #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
            pub enum $name {
                $(
                     #[doc = $variant_doc]
                     $variant,
                )*
            }
        }

        impl $name {
            /// Returns the persisted string representation of this value.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                self.into()
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &'a [u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                let s = <&str as $crate::private::postgres_types::FromSql>
                    ::from_sql(ty, raw)?;
                s.parse().map_err(|_| {
                    ::std::format!(
                        "invalid `{}` value: {s}",
                        ::core::stringify!($name),
                    )
                    .into()
                })
            }

            fn accepts(ty: &$crate::private::postgres_types::Type) -> bool {
                <&str as $crate::private::postgres_types::FromSql>::accepts(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                <&str as $crate::private::postgres_types::ToSql>::to_sql(
                    &self.as_str(),
                    ty,
                    w,
                )
            }

            fn accepts(ty: &$crate::private::postgres_types::Type) -> bool {
                <&str as $crate::private::postgres_types::ToSql>::accepts(ty)
            }
        }
    };
}

/// Adds `serde` derives to the provided kind enum.
#[cfg(feature = "serde")]
#[doc(hidden)]
#[macro_export]
macro_rules! __kind_serde {
    ($item:item) => {
        #[derive(
            $crate::private::serde::Deserialize,
            $crate::private::serde::Serialize,
        )]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        $item
    };
}

/// Leaves the provided kind enum as is.
#[cfg(not(feature = "serde"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __kind_serde {
    ($item:item) => {
        $item
    };
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use strum::IntoEnumIterator as _;

    define_kind! {
        #[doc = "Kind used in tests."]
        enum Sample {
            #[doc = "First."]
            PendingReview,

            #[doc = "Second."]
            Sold,
        }
    }

    #[test]
    fn uses_screaming_snake_case() {
        assert_eq!(Sample::PendingReview.as_str(), "PENDING_REVIEW");
        assert_eq!(Sample::Sold.to_string(), "SOLD");
    }

    #[test]
    fn parses_back_every_variant() {
        for v in Sample::iter() {
            assert_eq!(Sample::from_str(v.as_str()), Ok(v));
        }
        assert!(Sample::from_str("pending_review").is_err());
        assert!(Sample::from_str("").is_err());
    }
}
