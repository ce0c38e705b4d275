use std::sync::OnceLock;

const SCRATCH_LEN: usize = 1024 * 1024;

fn scratch() -> &'static [u8] {
    static SCRATCH: OnceLock<Vec<u8>> = OnceLock::new();
    SCRATCH.get_or_init(|| vec![0u8; SCRATCH_LEN])
}

/// A finite, non-restartable producer of `size` zero bytes, backed by a
/// single shared 1 MiB scratch buffer rather than allocating the whole
/// payload up front.
#[derive(Debug)]
pub struct ZeroSource {
    remaining: u64,
    written: u64,
}

impl ZeroSource {
    pub fn new(size: u64) -> Self {
        Self {
            remaining: size,
            written: 0,
        }
    }

    pub fn written_bytes(&self) -> u64 {
        self.written
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.remaining
    }

    /// Fills as much of `buf` as the remaining byte count and buffer size
    /// allow. Returns `0` once the source is exhausted.
    pub fn fill(&mut self, buf: &mut [u8]) -> usize {
        if self.remaining == 0 || buf.is_empty() {
            return 0;
        }

        let to_write = (buf.len() as u64).min(self.remaining) as usize;
        let mut written = 0;
        let scratch = scratch();
        while written < to_write {
            let chunk = (to_write - written).min(scratch.len());
            buf[written..written + chunk].copy_from_slice(&scratch[..chunk]);
            written += chunk;
        }

        self.remaining -= written as u64;
        self.written += written as u64;
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_exactly_the_requested_size() {
        let mut source = ZeroSource::new(10);
        let mut buf = [0xffu8; 4];

        assert_eq!(source.fill(&mut buf), 4);
        assert_eq!(buf, [0u8; 4]);
        assert_eq!(source.fill(&mut buf), 4);
        assert_eq!(source.fill(&mut buf), 2);
        assert_eq!(source.fill(&mut buf), 0);

        assert_eq!(source.written_bytes(), 10);
        assert_eq!(source.remaining_bytes(), 0);
    }

    #[test]
    fn larger_than_scratch_buffer_still_works() {
        let mut source = ZeroSource::new((SCRATCH_LEN as u64) + 5);
        let mut buf = vec![0xffu8; SCRATCH_LEN + 16];
        let n = source.fill(&mut buf);
        assert_eq!(n, SCRATCH_LEN + 5);
        assert!(buf[..n].iter().all(|&b| b == 0));
        assert_eq!(source.fill(&mut buf), 0);
    }
}
