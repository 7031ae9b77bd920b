//! Fluent query builder for remote tables.
//!
//! Queries are assembled as `table → where → select`, rendered to query text
//! only when needed, and executed lazily: the fetch happens on the first pull
//! of the result iterator.
//!
//! ```
//! use std::sync::Arc;
//!
//! use querywire::query::{field, RecordShape};
//! use querywire::transport::StaticTransport;
//! use querywire::Source;
//! use serde::Deserialize;
//!
//! struct OreOre;
//!
//! impl RecordShape for OreOre {
//!     const NAME: &'static str = "OreOre";
//!     const FIELDS: &'static [&'static str] = &["ID", "Name"];
//! }
//!
//! #[derive(Deserialize)]
//! struct IdName {
//!     #[serde(rename = "ID")]
//!     id: i64,
//!     #[serde(rename = "Name")]
//!     name: String,
//! }
//!
//! let transport = Arc::new(StaticTransport::ok(r#"[{"ID":123,"Name":"abc"}]"#));
//! let source = Source::new("http://api.example.com/v1".parse().unwrap(), transport.clone());
//! let query = source
//!     .table::<OreOre>("OreOre")
//!     .unwrap()
//!     .r#where(field("ID").eq(123))
//!     .select::<IdName, _, _>(["ID", "Name"]);
//!
//! assert_eq!(
//!     query.render().unwrap(),
//!     "SELECT ID,Name FROM [OreOre] WHERE (ID == 123)"
//! );
//! assert_eq!(transport.calls(), 0);
//!
//! for row in &query {
//!     let row = row.unwrap();
//!     assert_eq!((row.id, row.name.as_str()), (123, "abc"));
//! }
//! assert_eq!(transport.calls(), 1);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod decode;
pub mod error;
pub mod query;
pub mod source;
pub mod transport;

pub use config::{PayloadFormat, SourceConfig};
pub use error::{ErrorKind, QueryError, Result};
pub use source::Source;
