//! Public slug generation.

use rand::Rng;

const SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random alphanumeric slug of length `n`.
///
/// Slugs are public identifiers and filesystem path segments, so the alphabet
/// is restricted to characters safe in both roles.
pub fn random_slug(n: usize) -> String {
    let mut rng = rand::rng();
    (0..n)
        .map(|_| SLUG_ALPHABET[rng.random_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_has_requested_length_and_alphabet() {
        let slug = random_slug(12);
        assert_eq!(slug.len(), 12);
        assert!(slug.bytes().all(|b| SLUG_ALPHABET.contains(&b)));
    }

    #[test]
    fn slugs_are_random() {
        assert_ne!(random_slug(12), random_slug(12));
    }
}
