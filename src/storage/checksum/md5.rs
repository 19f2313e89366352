use crate::storage::checksum::Checksum;

pub struct ChecksumMd5 {
    context: md5::Context,
}

impl Default for ChecksumMd5 {
    fn default() -> Self {
        ChecksumMd5 {
            context: md5::Context::new(),
        }
    }
}

impl Checksum for ChecksumMd5 {
    fn update(&mut self, data: &[u8]) {
        self.context.consume(data);
    }

    fn finalize(&mut self) -> String {
        let context = std::mem::replace(&mut self.context, md5::Context::new());
        format!("{:x}", context.compute())
    }
}

/// Composite MD5 as advertised for segmented (multipart) objects:
/// `md5(md5(segment_1) || .. || md5(segment_n))-n`.
pub struct ChecksumSegmentedMd5 {
    segment_size: u64,
    current_segment: md5::Context,
    current_segment_len: u64,
    concatenated_digests: Vec<u8>,
    segment_count: u64,
}

impl ChecksumSegmentedMd5 {
    pub fn new(segment_size: u64) -> Self {
        assert!(segment_size > 0);

        ChecksumSegmentedMd5 {
            segment_size,
            current_segment: md5::Context::new(),
            current_segment_len: 0,
            concatenated_digests: Vec::new(),
            segment_count: 0,
        }
    }

    fn close_segment(&mut self) {
        let context = std::mem::replace(&mut self.current_segment, md5::Context::new());
        self.concatenated_digests
            .extend_from_slice(&context.compute().0);
        self.current_segment_len = 0;
        self.segment_count += 1;
    }
}

impl Checksum for ChecksumSegmentedMd5 {
    fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let remaining = (self.segment_size - self.current_segment_len) as usize;
            let take = remaining.min(data.len());

            self.current_segment.consume(&data[..take]);
            self.current_segment_len += take as u64;
            data = &data[take..];

            if self.current_segment_len == self.segment_size {
                self.close_segment();
            }
        }
    }

    fn finalize(&mut self) -> String {
        if self.current_segment_len > 0 || self.segment_count == 0 {
            self.close_segment();
        }

        let composite = md5::compute(&self.concatenated_digests);
        let e_tag = format!("{:x}-{}", composite, self.segment_count);

        self.concatenated_digests.clear();
        self.segment_count = 0;

        e_tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MD5_EMPTY: &str = "d41d8cd98f00b204e9800998ecf8427e";
    const MD5_HELLO_WORLD: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";

    #[test]
    fn checksum_md5_test() {
        let mut checksum = ChecksumMd5::default();
        assert_eq!(checksum.finalize(), MD5_EMPTY);

        checksum.update(b"hello");
        checksum.update(b" world");
        assert_eq!(checksum.finalize(), MD5_HELLO_WORLD);

        assert_eq!(checksum.finalize(), MD5_EMPTY);
    }

    #[test]
    fn segmented_md5_matches_manual_composite() {
        let data = b"0123456789abcdefghij";

        let mut expected_digests = Vec::new();
        for segment in data.chunks(8) {
            expected_digests.extend_from_slice(&md5::compute(segment).0);
        }
        let expected = format!("{:x}-3", md5::compute(&expected_digests));

        // feed in pieces that straddle segment boundaries
        let mut checksum = ChecksumSegmentedMd5::new(8);
        checksum.update(&data[..5]);
        checksum.update(&data[5..13]);
        checksum.update(&data[13..]);

        assert_eq!(checksum.finalize(), expected);
    }

    #[test]
    fn segmented_md5_exact_multiple_of_segment_size() {
        let data = [7u8; 16];

        let mut expected_digests = Vec::new();
        expected_digests.extend_from_slice(&md5::compute(&data[..8]).0);
        expected_digests.extend_from_slice(&md5::compute(&data[8..]).0);
        let expected = format!("{:x}-2", md5::compute(&expected_digests));

        let mut checksum = ChecksumSegmentedMd5::new(8);
        checksum.update(&data);

        assert_eq!(checksum.finalize(), expected);
    }
}
