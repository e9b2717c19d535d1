#[macro_use]
extern crate afl;
extern crate ed2k_stream;

use ed2k_stream::digest::Digest;
use ed2k_stream::Ed2k;

fn main() {
    fuzz!(|data: &[u8]| {
        let expected = Ed2k::digest(data);

        // the first four bytes pick a split point anywhere in the input
        let seed = match data {
            [a, b, c, d, ..] => u32::from_le_bytes([*a, *b, *c, *d]) as usize,
            _ => 0,
        };
        let split = seed % (data.len() + 1);
        let mut hasher = Ed2k::new();
        hasher.write(&data[..split]);
        let partial = hasher.sum();
        assert_eq!(partial, hasher.sum());
        hasher.write(&data[split..]);

        assert_eq!(hasher.sum(), expected);
        assert_eq!(hasher.len(), data.len() as u64);
        assert_eq!(
            hasher.block_hashes().len(),
            data.len() / ed2k_stream::BLOCK_SIZE
        );
    });
}
