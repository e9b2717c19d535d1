//! Implementation details

use std::io;

use digest::{
    generic_array::GenericArray, typenum::U16, FixedOutput, FixedOutputReset, HashMarker,
    OutputSizeUser, Reset, Update,
};
use md4::Md4;

/// Size of a single ED2K block in bytes (9500 KiB).
pub const BLOCK_SIZE: usize = 9728000;

/// MD4 digest of one complete block.
pub type BlockHash = [u8; 16];

type Array = GenericArray<u8, U16>;

/// Ordered list of completed block hashes
#[derive(Default, Debug, Clone)]
struct BlockList {
    hashes: Vec<BlockHash>,
}
impl BlockList {
    fn push(&mut self, hash: &Array) {
        let mut block = BlockHash::default();
        block.copy_from_slice(hash);
        self.hashes.push(block);
    }
    fn clear(&mut self) {
        self.hashes.clear();
    }
    fn len(&self) -> usize {
        self.hashes.len()
    }
    fn as_slice(&self) -> &[BlockHash] {
        &self.hashes
    }
    /// Hashes the concatenated block hashes, followed by `tail` if given.
    fn list_hash(&self, tail: Option<&Array>, out: &mut Array) {
        let mut hasher = Md4::default();
        for hash in &self.hashes {
            hasher.update(hash);
        }
        if let Some(tail) = tail {
            hasher.update(tail);
        }
        hasher.finalize_into(out);
    }
}

/// Streaming ED2K hasher.
///
/// Input can be fed in writes of any size; the digest can be queried with
/// [`Ed2k::sum`] at any point without disturbing further writes. The hasher
/// also implements the relevant traits from the `digest` crate and
/// [`std::io::Write`].
#[derive(Default, Debug, Clone)]
pub struct Ed2k {
    /// Hasher for the current block
    block_hasher: Md4,
    /// Number of bytes fed to `block_hasher` since the last block boundary
    block_len: usize,
    /// Hashes of all completed blocks
    block_list: BlockList,
}

impl Ed2k {
    /// Creates a hasher that has not seen any input yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds `data` into the hasher and returns the number of bytes consumed,
    /// which is always `data.len()`.
    pub fn write(&mut self, mut data: &[u8]) -> usize {
        let written = data.len();
        while !data.is_empty() {
            let free = BLOCK_SIZE - self.block_len;
            let data_write_len = data.len().min(free);
            let data_write;
            (data_write, data) = data.split_at(data_write_len);
            self.block_hasher.update(data_write);
            self.block_len += data_write.len();
            if self.block_len == BLOCK_SIZE {
                self.hash_block();
            }
        }
        written
    }

    /// Returns the ED2K digest of everything written so far.
    ///
    /// This does not modify the hasher: it can be called repeatedly and
    /// further writes continue the same stream.
    pub fn sum(&self) -> digest::Output<Self> {
        let mut out = Array::default();
        self.sum_into(&mut out);
        out
    }

    /// Hashes of the completed blocks, in stream order.
    ///
    /// A trailing partial block is not included.
    pub fn block_hashes(&self) -> &[BlockHash] {
        self.block_list.as_slice()
    }

    /// Total number of bytes written so far.
    pub fn len(&self) -> u64 {
        self.block_list.len() as u64 * BLOCK_SIZE as u64 + self.block_len as u64
    }

    /// Returns `true` if no bytes have been written yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn hash_block(&mut self) {
        let hash = self.block_hasher.finalize_fixed_reset();
        self.block_len = 0;
        self.block_list.push(&hash);
    }

    /// Digest of the pending partial block, leaving the block hasher untouched.
    fn pending_hash(&self) -> Array {
        self.block_hasher.clone().finalize_fixed()
    }

    fn sum_into(&self, out: &mut Array) {
        match (self.block_list.len(), self.block_len) {
            // nothing written yet: the hash of the empty input.
            // state: |>   |
            (0, 0) => out.copy_from_slice(&self.pending_hash()),

            // input data is exactly one block. The block hash is used as is,
            // without hashing the list.
            // state: |####|>   |
            (1, 0) => out.copy_from_slice(&self.block_list.as_slice()[0]),

            // input data is a multiple of the block size.
            // state: |####|..|>   |
            (_, 0) => self.block_list.list_hash(None, out),

            // input data ends inside a block. The pending block is hashed on
            // a copy and appended to the list, even when it is the only one.
            // state: |####|..|##> |  or  |##> |
            (_, _) => self.block_list.list_hash(Some(&self.pending_hash()), out),
        }
    }
}

impl Update for Ed2k {
    fn update(&mut self, data: &[u8]) {
        self.write(data);
    }
}

impl OutputSizeUser for Ed2k {
    type OutputSize = U16;
}

impl FixedOutput for Ed2k {
    fn finalize_into(self, out: &mut Array) {
        self.sum_into(out)
    }
}

impl HashMarker for Ed2k {}

impl Reset for Ed2k {
    fn reset(&mut self) {
        self.block_hasher.reset();
        self.block_len = 0;
        self.block_list.clear();
    }
}

impl FixedOutputReset for Ed2k {
    fn finalize_into_reset(&mut self, out: &mut Array) {
        self.sum_into(out);
        Reset::reset(self);
    }
}

impl io::Write for Ed2k {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Ed2k::write(self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
