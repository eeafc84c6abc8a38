//! Foundation types for imgstore.
//!
//! Every other imgstore crate depends on `imgstore-types`.
//!
//! # Key Types
//!
//! - [`ImageId`] — content-addressed identifier (hex SHA-256 of the blob bytes)
//! - [`Count`] — two-tier reference count (confirmed, unconfirmed)
//! - [`ImageInfo`] — metadata declared by the caller when storing a blob
//! - [`mimetype_to_extension`] — static MIME type to file extension table

pub mod count;
pub mod error;
pub mod id;
pub mod info;

pub use count::Count;
pub use error::TypeError;
pub use id::ImageId;
pub use info::{extension_to_mimetype, mimetype_to_extension, ImageInfo};
