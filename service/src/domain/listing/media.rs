//! [`MediaAttachment`] definitions.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Id as ListingId;
use crate::domain::define_text;
#[cfg(doc)]
use crate::domain::Listing;

/// File stored by an external [`StorageProvider`] and shown in the gallery
/// of a [`Listing`].
#[derive(Clone, Debug)]
pub struct MediaAttachment {
    /// ID of this [`MediaAttachment`].
    pub id: Id,

    /// ID of the [`Listing`] this [`MediaAttachment`] belongs to.
    pub listing_id: ListingId,

    /// Stored [`File`].
    pub file: File,

    /// [`DisplayOrder`] of this [`MediaAttachment`] in the gallery.
    pub display_order: DisplayOrder,

    /// [`DateTime`] when this [`MediaAttachment`] was uploaded.
    pub uploaded_at: UploadDateTime,
}

/// Metadata of a file already stored by a [`StorageProvider`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct File {
    /// Original [`FileName`].
    pub name: FileName,

    /// [`FileType`] of this [`File`].
    pub kind: FileType,

    /// [`MimeType`] of this [`File`].
    pub mime_type: MimeType,

    /// [`FileSize`] of this [`File`].
    pub size: FileSize,

    /// [`StorageProvider`] holding this [`File`].
    pub provider: StorageProvider,

    /// [`StoragePath`] of this [`File`] within its [`StorageProvider`].
    pub path: StoragePath,

    /// [`ThumbnailUrl`] of this [`File`], if any.
    pub thumbnail_url: Option<ThumbnailUrl>,
}

impl File {
    /// Indicates whether the [`MimeType`] of this [`File`] agrees with its
    /// [`FileType`].
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.kind.accepts(&self.mime_type)
    }
}

/// ID of a [`MediaAttachment`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Kind of a stored [`File`]."]
    enum FileType {
        #[doc = "Picture."]
        Image,

        #[doc = "Video clip."]
        Video,

        #[doc = "Document, like a brochure or an inspection report."]
        Document,
    }
}

impl FileType {
    /// Indicates whether a [`File`] of this [`FileType`] may have the
    /// provided [`MimeType`].
    #[must_use]
    pub fn accepts(self, mime: &MimeType) -> bool {
        match self {
            Self::Image => mime.top_level() == "image",
            Self::Video => mime.top_level() == "video",
            Self::Document => {
                matches!(mime.top_level(), "application" | "text")
            }
        }
    }
}

define_kind! {
    #[doc = "External storage holding a [`File`]."]
    enum StorageProvider {
        #[doc = "Firebase Storage."]
        Firebase,

        #[doc = "Amazon S3."]
        Aws,
    }
}

/// `type/subtype` media type of a [`File`], stored lowercased.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct MimeType(String);

impl MimeType {
    /// Creates a new [`MimeType`] if the given `value` is valid.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into().to_lowercase();
        Self::check(&value).then_some(Self(value))
    }

    /// Returns the top-level type (the part before `/`) of this
    /// [`MimeType`].
    #[must_use]
    pub fn top_level(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(t, _)| t)
    }

    /// Checks whether the given `value` is a valid [`MimeType`].
    fn check(value: &str) -> bool {
        /// RFC 6838 restricted names, parameters are not allowed.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                r"^[a-z0-9][a-z0-9!#$&^_.+-]{0,126}/[a-z0-9][a-z0-9!#$&^_.+-]{0,126}$",
            )
            .expect("valid regex")
        });

        REGEX.is_match(value)
    }
}

impl FromStr for MimeType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `MimeType`")
    }
}

/// Size of a [`File`] in bytes, always positive.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FileSize(u64);

impl FileSize {
    /// Creates a new [`FileSize`] if the given number of `bytes` is positive.
    #[must_use]
    pub fn new(bytes: u64) -> Option<Self> {
        (bytes > 0).then_some(Self(bytes))
    }

    /// Returns the number of bytes.
    #[must_use]
    pub fn bytes(self) -> u64 {
        self.0
    }
}

#[cfg(feature = "postgres")]
impl FromSql<'_> for FileSize {
    accepts!(INT8);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let bytes = i64::from_sql(ty, raw)?;
        u64::try_from(bytes)
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| format!("invalid `FileSize`: {bytes}").into())
    }
}

#[cfg(feature = "postgres")]
impl ToSql for FileSize {
    accepts!(INT8);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        i64::try_from(self.0)?.to_sql(ty, w)
    }
}

/// Zero-based position of a [`MediaAttachment`] in its gallery.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
pub struct DisplayOrder(u32);

impl DisplayOrder {
    /// [`DisplayOrder`] of the first [`MediaAttachment`] in a gallery.
    pub const FIRST: Self = Self(0);

    /// Returns the [`DisplayOrder`] following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the [`DisplayOrder`] of the provided gallery position.
    #[must_use]
    pub fn at(position: usize) -> Self {
        Self(u32::try_from(position).unwrap_or(u32::MAX))
    }
}

#[cfg(feature = "postgres")]
impl FromSql<'_> for DisplayOrder {
    accepts!(INT4);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Ok(Self(u32::try_from(i32::from_sql(ty, raw)?)?))
    }
}

#[cfg(feature = "postgres")]
impl ToSql for DisplayOrder {
    accepts!(INT4);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        i32::try_from(self.0)?.to_sql(ty, w)
    }
}

define_text! {
    #[doc = "Original name of a [`File`]."]
    FileName(512);

    #[doc = "Path of a [`File`] within its [`StorageProvider`]."]
    StoragePath(2048);

    #[doc = "URL of a [`File`] thumbnail."]
    ThumbnailUrl(2048);
}

/// [`DateTime`] when a [`MediaAttachment`] was uploaded.
pub type UploadDateTime = DateTimeOf<(MediaAttachment, unit::Upload)>;
