//! Query-string helpers.

use url::form_urlencoded;

use crate::routing::route::Params;

/// Decode a query string into a parameter bag.
///
/// Decoding is permissive: malformed escapes are kept literally, pairs with
/// an empty name are dropped, and for a repeated name the first value is
/// kept. Never fails.
pub fn parse_query(query: &str) -> Params {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params = Params::new();
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        if name.is_empty() {
            continue;
        }
        params
            .entry(name.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

/// Fill `into` with entries of `from` whose keys it does not have yet.
pub fn merge_missing(mut into: Params, from: Params) -> Params {
    for (name, value) in from {
        into.entry(name).or_insert(value);
    }
    into
}
