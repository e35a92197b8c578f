//! Room-code alphabet, normalization and generation.
//!
//! Codes are four characters over `A-Z` and `1-9`. The glyph `0` is excluded
//! so a typed code can never be ambiguous with `O`; normalization rewrites it.

use rand::Rng;

/// Permitted code glyphs. `0` is deliberately absent.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ123456789";

/// Length of every room code.
pub const CODE_LEN: usize = 4;

/// Canonical form of a user-supplied room code: uppercased, `0` folded to `O`.
/// Idempotent.
pub fn normalize(raw: &str) -> String {
    raw.to_ascii_uppercase().replace('0', "O")
}

/// Sample a code uniformly from the alphabet.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_stay_inside_the_alphabet() {
        for _ in 0..1000 {
            let code = generate();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)), "{code}");
        }
    }

    #[test]
    fn normalize_uppercases_and_folds_zero() {
        assert_eq!(normalize("ab0d"), "ABOD");
        assert_eq!(normalize("0"), "O");
        assert_eq!(normalize("wxyz"), "WXYZ");
        assert_eq!(normalize("A1B2"), "A1B2");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["abcd", "0O0O", "A0b9", "zz00", "1234"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }
}
