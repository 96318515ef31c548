//! Declarative field mappings for the Elasticsearch store.
//!
//! A mapping file binds persistent classes to Elasticsearch indices and types
//! each of their fields:
//!
//! ```xml
//! <gora-otd>
//!   <class name="Employee" keyClass="String" index="frontier">
//!     <field name="name" docfield="name" type="text"/>
//!     <field name="salary" docfield="salary" type="integer"/>
//!   </class>
//! </gora-otd>
//! ```
//!
//! Files are read by [`MappingBuilder`], either strictly (see [`schema`]) or
//! leniently, in which case whatever cannot be interpreted is skipped.

pub mod builder;
pub mod errors;
pub mod field;
pub mod mapping;
pub mod schema;

pub use builder::{load, load_class, MappingBuilder, Validation};
pub use errors::MappingError;
pub use field::{DataType, Field, FieldType};
pub use mapping::{ElasticsearchMapping, MappingFile};

/// Reserved document field holding the record key.
pub const GORA_ID_FIELD: &str = "gora_id";
