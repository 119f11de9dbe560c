use sha2::{Digest, Sha256};
use url::Url;

/// Computes the identity hash of a normalized URL
///
/// The hash is the lowercase hex SHA-256 digest of the URL's string form and
/// is the primary key of the URL store.
pub fn url_hash(url: &Url) -> String {
    hex::encode(Sha256::digest(url.as_str().as_bytes()))
}
