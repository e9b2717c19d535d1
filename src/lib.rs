#![doc = include_str!("../README.md")]

pub use crate::implementation::{BlockHash, Ed2k, BLOCK_SIZE};

pub use digest;

pub mod implementation;
