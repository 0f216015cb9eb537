//! Context fingerprints: 32-bit FNV-1a over small linguistic feature values.
//!
//! Collisions are expected; the cache stores the full fingerprint and the tree
//! id alongside each result and compares both on lookup.

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// FNV-1a over an arbitrary feature vector.
pub fn extended_fingerprint(features: &[u8]) -> u32 {
    features.iter().fold(FNV_OFFSET_BASIS, |h, &f| {
        (h ^ f as u32).wrapping_mul(FNV_PRIME)
    })
}

/// FNV-1a over the five standard triphone-plus-prosody features, in order.
pub fn context_fingerprint(
    phoneme: u8,
    prev_phoneme: u8,
    next_phoneme: u8,
    stress: u8,
    position: u8,
) -> u32 {
    extended_fingerprint(&[phoneme, prev_phoneme, next_phoneme, stress, position])
}

/// The five features the decision-tree walker keys most lookups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PhonemeContext {
    pub phoneme: u8,
    pub prev_phoneme: u8,
    pub next_phoneme: u8,
    pub stress: u8,
    /// Position of the phoneme within its word.
    pub position: u8,
}

impl PhonemeContext {
    pub fn fingerprint(&self) -> u32 {
        context_fingerprint(
            self.phoneme,
            self.prev_phoneme,
            self.next_phoneme,
            self.stress,
            self.position,
        )
    }
}
