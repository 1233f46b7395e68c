//! Project-specific utilities live here.

use rand::Rng;

/// URL-safe symbols used for generated identifiers.
const ID_ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Length of generated book identifiers.
pub const ID_LENGTH: usize = 16;

/// Generate a random URL-safe token of `len` characters.
///
/// Uniqueness is probabilistic only: 16 symbols give 96 bits of entropy.
pub fn random_id(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_id_has_requested_length_and_alphabet() {
        let id = random_id(ID_LENGTH);
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn random_ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| random_id(ID_LENGTH)).collect();
        assert_eq!(ids.len(), 1000);
    }
}
