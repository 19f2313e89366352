use sha2::Digest;

use crate::storage::checksum::Checksum;

pub struct ChecksumSha256 {
    hasher: sha2::Sha256,
}

impl Default for ChecksumSha256 {
    fn default() -> Self {
        ChecksumSha256 {
            hasher: sha2::Sha256::new(),
        }
    }
}

impl Checksum for ChecksumSha256 {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(&mut self) -> String {
        hex::encode(self.hasher.finalize_reset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA256_EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const SHA256_HELLO_WORLD: &str =
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn checksum_sha256_test() {
        let mut checksum = ChecksumSha256::default();
        assert_eq!(checksum.finalize(), SHA256_EMPTY);

        checksum.update(b"hello ");
        checksum.update(b"world");
        assert_eq!(checksum.finalize(), SHA256_HELLO_WORLD);

        // finalize resets the hasher
        assert_eq!(checksum.finalize(), SHA256_EMPTY);
    }
}
