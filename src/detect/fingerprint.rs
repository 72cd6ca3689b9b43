// src/detect/fingerprint.rs
// =============================================================================
// Content fingerprints.
//
// A fingerprint is only ever compared for equality: "same fingerprint" means
// "nothing changed". MD5 is plenty for that and keeps the hashes short
// enough to show in an alert. It is NOT used for anything security related.
// =============================================================================

use std::fmt;

/// 128-bit digest of a target's decoded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Fingerprints decoded text. Pure and deterministic.
    pub fn of(content: &str) -> Self {
        Self(md5::compute(content.as_bytes()).0)
    }

    /// Lowercase hex, 32 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_same_content_same_fingerprint() {
        let content = "const a='/api/v1/users'";
        assert_eq!(Fingerprint::of(content), Fingerprint::of(content));
    }

    #[test]
    fn test_known_md5_value() {
        assert_eq!(Fingerprint::of("").to_hex(), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(Fingerprint::of("abc").to_string(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_small_edits_change_fingerprint() {
        let base = "const a='/api/v1/users'";
        let variants = [
            "const a='/api/v1/users';",
            "const a='/api/v1/user'",
            "const a=\"/api/v1/users\"",
            " const a='/api/v1/users'",
            "const a='/api/v1/users'\n",
        ];
        for variant in variants {
            assert_ne!(Fingerprint::of(base), Fingerprint::of(variant), "{variant:?}");
        }
    }

    proptest! {
        #[test]
        fn fingerprint_is_stable_for_identical_content(content in ".{0,256}") {
            let copy = content.clone();
            prop_assert_eq!(Fingerprint::of(&content), Fingerprint::of(&copy));
        }

        #[test]
        fn fingerprint_changes_when_content_changes(
            content in ".{0,256}",
            insert_at in any::<prop::sample::Index>(),
            extra in ".{1,8}",
        ) {
            // Insert a non-empty run somewhere in the content
            let boundaries: Vec<usize> = content
                .char_indices()
                .map(|(idx, _)| idx)
                .chain(std::iter::once(content.len()))
                .collect();
            let at = boundaries[insert_at.index(boundaries.len())];
            let mut edited = content.clone();
            edited.insert_str(at, &extra);
            prop_assert_ne!(Fingerprint::of(&content), Fingerprint::of(&edited));
        }

        #[test]
        fn fingerprint_changes_when_a_character_is_replaced(
            content in ".{1,256}",
            pick in any::<prop::sample::Index>(),
            replacement in any::<char>(),
        ) {
            let chars: Vec<char> = content.chars().collect();
            let at = pick.index(chars.len());
            prop_assume!(chars[at] != replacement);
            let mut edited = chars.clone();
            edited[at] = replacement;
            let edited: String = edited.into_iter().collect();
            prop_assert_ne!(Fingerprint::of(&content), Fingerprint::of(&edited));
        }
    }
}
