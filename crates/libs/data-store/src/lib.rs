//! Capabilities shared by every store backend.
//!
//! A backend implements [`DataStore`] for the records it persists and
//! [`MetadataAnalyzer`] to expose the schema it actually holds. Which
//! implementation is used is decided by configuration, not by the caller's
//! types.

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod metadata;
pub mod query;
pub mod store;

pub use metadata::{CollectionMetadata, MetadataAnalyzer};
pub use query::Query;
pub use store::DataStore;

/// A record type that can be written to and read from a store.
///
/// `class_name` is the name under which the record type is declared in the
/// mapping file.
pub trait Persistent: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn class_name() -> &'static str;
}
