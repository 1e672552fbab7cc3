use std::fmt;

/// Lower-case hex encoding of a BLAKE3 digest, used for AI cache keys and
/// overlay source fingerprints.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Blake3Hex(String);

impl Blake3Hex {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Blake3Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Blake3Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blake3Hex({})", self.0)
    }
}

pub fn hash_bytes(data: &[u8]) -> Blake3Hex {
    let digest = blake3::hash(data);
    Blake3Hex(hex::encode(digest.as_bytes()))
}
