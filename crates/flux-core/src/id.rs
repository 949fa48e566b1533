//! Opaque short identifiers.
//!
//! Every entity gets a `"<prefix>-<8 base36 chars>"` id at creation time.
//! Ids are random, never reused, and carry no ordering information; sort
//! by `created_at` instead.

use rand::Rng;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 8;

/// Entity prefixes, one per collection.
pub mod prefix {
    pub const PROJECT: &str = "pr";
    pub const EPIC: &str = "ep";
    pub const TASK: &str = "tk";
    pub const PRODUCT: &str = "pd";
    pub const CUSTOMER: &str = "cu";
    pub const QUOTE: &str = "qt";
    pub const WEBHOOK: &str = "wh";
    pub const DELIVERY: &str = "dl";
    pub const LINE_ITEM: &str = "li";
}

/// Generate a fresh id with the given entity prefix.
#[must_use]
pub fn new_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let mut id = String::with_capacity(prefix.len() + 1 + ID_LEN);
    id.push_str(prefix);
    id.push('-');
    for _ in 0..ID_LEN {
        let idx = rng.gen_range(0..ALPHABET.len());
        id.push(ALPHABET[idx] as char);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::{ID_LEN, new_id, prefix};
    use std::collections::HashSet;

    #[test]
    fn id_has_prefix_and_fixed_length() {
        let id = new_id(prefix::TASK);
        assert!(id.starts_with("tk-"));
        assert_eq!(id.len(), "tk-".len() + ID_LEN);
        assert!(
            id["tk-".len()..]
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn ids_do_not_collide_in_practice() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(new_id(prefix::DELIVERY)));
        }
    }
}
