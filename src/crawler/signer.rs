//! Request integrity signature
//!
//! While the upstream still issued a `rhx_gis` seed on the profile page, every
//! pagination request had to carry `X-Instagram-GIS: md5("<seed>:<variables>")`.
//! The mechanism was retired upstream; without a seed no header is sent and
//! that is never an error.

use crate::crawler::fetcher::FetchRequest;

/// Header carrying the signature
pub const SIGNATURE_HEADER: &str = "X-Instagram-GIS";

/// Computes the hex-encoded MD5 of `seed:variables`
///
/// # Examples
///
/// ```
/// use ig_harvest::crawler::sign;
///
/// let a = sign("seed", r#"{"id":"1"}"#);
/// assert_eq!(a, sign("seed", r#"{"id":"1"}"#));
/// assert_eq!(a.len(), 32);
/// ```
pub fn sign(seed: &str, variables: &str) -> String {
    format!("{:x}", md5::compute(format!("{}:{}", seed, variables)))
}

/// Adds the signature header when the request context carries a seed
///
/// Returns true if a header was attached.
pub fn apply_signature(request: &mut FetchRequest) -> bool {
    let seed = match request.context.signature_seed.as_deref() {
        Some(seed) if !seed.is_empty() => seed,
        _ => return false,
    };
    let variables = request.context.variables.as_deref().unwrap_or_default();
    let signature = sign(seed, variables);
    request.set_header(SIGNATURE_HEADER, signature);
    true
}
