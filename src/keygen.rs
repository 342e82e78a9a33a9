//! License key string generation.
//!
//! Format: `{PREFIX}-{amount}{unit initial}-{6 uppercase hex chars}`,
//! e.g. `VURE-30D-A1B2C3`. The suffix comes from OS entropy; uniqueness is
//! enforced by the registry's primary key, with the insert retried on the
//! (negligible-probability) collision.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::duration::DurationSpec;

const SUFFIX_BYTES: usize = 3;

pub fn generate_key(prefix: &str, spec: &DurationSpec) -> String {
    let mut bytes = [0u8; SUFFIX_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let suffix: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
    format!("{}-{}{}-{}", prefix, spec.amount, spec.unit.initial(), suffix)
}
