use chrono::{DateTime, Months, Utc};
use data_encoding::HEXLOWER;
use ring::digest::{Context, SHA256};

/// Width of a rendered digest: 32 bytes, two lowercase hex characters each.
pub const DIGEST_HEX_LEN: usize = 64;

pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// The instant `months` calendar months before `now`. Saturates at the
/// earliest representable time instead of failing.
pub fn months_before(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// SHA-256 applied twice, rendered as 64 lowercase hex characters.
///
/// Every byte is zero-padded to two characters so that two digests can be
/// concatenated without ambiguity.
pub fn hash(data: &[u8]) -> String {
    let first = sha256_digest(data);
    HEXLOWER.encode(&sha256_digest(&first))
}

/// `hash(left ++ right)` over the rendered hex strings.
pub fn hash_pair(left: &str, right: &str) -> String {
    let mut combined = Vec::with_capacity(left.len() + right.len());
    combined.extend_from_slice(left.as_bytes());
    combined.extend_from_slice(right.as_bytes());
    hash(&combined)
}
