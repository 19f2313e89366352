pub mod md5;
pub mod sha256;

/// A streaming digest. `finalize` returns the lower-case hex digest of all
/// data passed to `update` since the previous `finalize`.
pub trait Checksum {
    fn update(&mut self, data: &[u8]);
    fn finalize(&mut self) -> String;
}
