//! Resource query translation engine
//!
//! Turns the query string of a collection listing request into a query plan
//! that a document store can execute safely:
//! - Whitelisted comparison operators (`field[gt]=10`, `field[in]=a,b`)
//! - Field selection (`select=name,description`)
//! - Sorting (`sort=-averageCost,name`)
//! - Offset pagination (`page=2&limit=10`)
//! - Geospatial radius search around a geocoded postal code
//!
//! # Example
//!
//! ```rust
//! use devcamper_query::{paginate, CompilerConfig, QueryCompiler, RawQuery};
//!
//! let items = vec![
//!     ("averageCost[lte]".to_string(), "10000".to_string()),
//!     ("select".to_string(), "name,averageCost".to_string()),
//!     ("page".to_string(), "2".to_string()),
//!     ("limit".to_string(), "5".to_string()),
//! ];
//! let raw = RawQuery::from_items(&items);
//! let plan = QueryCompiler::new(CompilerConfig::default()).build_plan(&raw);
//! assert_eq!(plan.skip, 5);
//!
//! let page = paginate(&plan, Vec::<serde_json::Value>::new(), 12);
//! assert_eq!(page.pagination.prev.map(|p| p.page), Some(1));
//! assert_eq!(page.pagination.next.map(|p| p.page), Some(3));
//! ```

pub mod error;
pub mod filter;
pub mod geo;
pub mod operator;
pub mod paginate;
pub mod plan;
pub mod raw;
pub mod store;

pub use error::{GeocodingFailure, QueryError, Result};
pub use filter::{
    field_value, is_valid_field_path, translate, translate_with_diagnostics, FilterExpression,
    FilterLeaf, FilterValue, LeafValue,
};
pub use geo::{DistanceUnit, EarthRadius, GeoPoint, GeoRadiusResolver, Geocoder, RadiusFilter};
pub use operator::Operator;
pub use paginate::{paginate, PageLink, PageResult, Pagination};
pub use plan::{CompilerConfig, Projection, QueryCompiler, QueryPlan, SortDirection, SortKey};
pub use raw::{RawQuery, RawValue, RESERVED_PARAMS};
pub use store::{DocumentStore, FindOptions, Selector, CREATED_AT_FIELD, ID_FIELD};
