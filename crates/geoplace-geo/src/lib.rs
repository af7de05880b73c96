//! geoplace-geo: geography reference data for placement decisions.
//!
//! The scheduler never interprets free-text location names itself. Every
//! city, country or continent identifier found in node or workload labels is
//! resolved through a [`GeoReference`] into canonical codes:
//!
//! - subdivision (city) → `country-region` code such as `PT-03`
//! - country → ISO 3166-1 alpha-2 code such as `PT`
//! - continent → two-letter continent code such as `EU`
//!
//! # Components
//!
//! - **`reference`**: The `GeoReference` port and the resolved value types
//! - **`gazetteer`**: In-memory, case-insensitive implementation backed by a table
//! - **`builtin`**: The reference table shipped with the crate

pub mod builtin;
pub mod error;
pub mod gazetteer;
pub mod reference;

pub use error::{GeoError, GeoResult};
pub use gazetteer::{ContinentRecord, CountryRecord, Gazetteer, GazetteerData, SubdivisionRecord};
pub use reference::{Continent, Country, GeoReference, Subdivision};
