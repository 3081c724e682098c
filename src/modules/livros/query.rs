//! Filter construction for the three read access patterns.

use bson::oid::ObjectId;
use bson::Bson;

use livraria_http::error::ApiError;
use livraria_kernel::settings::ReportSettings;
use livraria_store::{Expr, Filter, Query, SortDirection};

/// Exact-match filter on the store identifier.
///
/// Fails when the path parameter cannot be decoded into an ObjectId; the
/// caller answers HTTP 400.
pub fn by_id(raw: &str) -> Result<Expr, ApiError> {
    let oid = ObjectId::parse_str(raw).map_err(|_| ApiError::malformed_id(raw))?;
    Ok(Filter::eq("_id", Bson::ObjectId(oid)))
}

/// Every record, sorted ascending by title.
pub fn all() -> Query {
    Query::new().sorted("title", SortDirection::Asc)
}

/// The fixed report: page count inside the configured window AND
/// publication date ending with the configured year (case-insensitive).
pub fn report(settings: &ReportSettings) -> Query {
    Query::filtered(Filter::and([
        Filter::gte("pageCount", settings.min_pages),
        Filter::lte("pageCount", settings.max_pages),
        Filter::ends_with("publicationDate", settings.publication_year.as_str()),
    ]))
}
