//! Filter-and-paginate query engine over the [`Catalog`](crate::catalog::Catalog).

mod filter;
mod params;

pub use filter::{FilterSpec, GenreMatch, SetFilter, ValidationError, ValueFilter, Window};
pub use params::QueryParams;
