// crates/consul-acceptance-providers/src/names.rs
// ============================================================================
// Module: Random Names
// Description: Random release names and KV keys.
// Purpose: Keep concurrent and repeated runs from colliding on shared clusters.
// Dependencies: consul-acceptance-core, rand
// ============================================================================

//! ## Overview
//! Names are `test-` followed by ten characters from `[a-z0-9]`, which is a
//! valid Helm release name and Kubernetes label value.

use consul_acceptance_core::NameGenerator;
use rand::Rng;

/// Prefix of every generated name.
pub const NAME_PREFIX: &str = "test-";

/// Random characters after the prefix.
pub const NAME_SUFFIX_LEN: usize = 10;

/// Alphabet of the random suffix.
const NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Draws a name from `rng`.
#[must_use]
pub fn random_name_from<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut name = String::with_capacity(NAME_PREFIX.len() + NAME_SUFFIX_LEN);
    name.push_str(NAME_PREFIX);
    for _ in 0 .. NAME_SUFFIX_LEN {
        let index = rng.gen_range(0 .. NAME_ALPHABET.len());
        name.push(char::from(NAME_ALPHABET[index]));
    }
    name
}

/// Name generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNames;

impl NameGenerator for RandomNames {
    fn random_name(&self) -> String {
        random_name_from(&mut rand::thread_rng())
    }
}
