//! Hash context capability and algorithm registry
//!
//! The hashing engine is polymorphic over the digest algorithm: anything that
//! can expose its digest size, accept incremental updates, produce a digest
//! without being consumed, and clone itself can drive the [`Hasher`]. Two
//! implementations live here:
//!
//! - [`DigestContext`], a generic adapter over any RustCrypto [`Digest`]
//!   implementation (SHA-2, SHA-3, SHA-1, MD5, BLAKE2)
//! - [`Crc32`], a hand-rolled CRC-32 accumulator showing that the capability
//!   is not tied to the `Digest` trait at all
//!
//! Algorithm names are resolved through a registration table built statically
//! at compile time; see [`create_context`] and [`ALGORITHM_NAMES`]. The
//! registered names also define the sidecar suffix set (`.sha256`,
//! `.sha3_256`, ...) used when discovering data files.
//!
//! [`Hasher`]: crate::hasher::Hasher

use crate::error::{Result, XsumError};
use sha2::Digest;

/// Capability interface required from a hash algorithm
///
/// Mirrors the incremental-hashing shape of common digest APIs. The one
/// member without an obvious analogue is [`copy`](HashContext::copy): the
/// [`Hasher`](crate::hasher::Hasher) holds a context *prototype* and clones
/// it for every computation, so implementations must support cheap cloning.
///
/// [`digest`](HashContext::digest) must not consume or reset the context;
/// calling `update` afterwards continues the same computation.
pub trait HashContext {
    /// Size of the produced digest in bytes
    fn digest_size(&self) -> usize;

    /// Feed data into the context
    fn update(&mut self, data: &[u8]);

    /// Produce the digest of everything fed so far
    fn digest(&self) -> Vec<u8>;

    /// Clone this context into an independent one
    fn copy(&self) -> Box<dyn HashContext>;
}

/// Adapter exposing any clonable RustCrypto digest as a [`HashContext`]
#[derive(Debug, Clone)]
pub struct DigestContext<D> {
    inner: D,
}

impl<D: Digest + Clone + 'static> DigestContext<D> {
    /// Create a fresh context for the algorithm `D`
    pub fn new() -> Self {
        Self { inner: D::new() }
    }
}

impl<D: Digest + Clone + 'static> Default for DigestContext<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Digest + Clone + 'static> HashContext for DigestContext<D> {
    fn digest_size(&self) -> usize {
        <D as Digest>::output_size()
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn digest(&self) -> Vec<u8> {
        // finalize() consumes, so run it on a clone.
        self.inner.clone().finalize().to_vec()
    }

    fn copy(&self) -> Box<dyn HashContext> {
        Box::new(self.clone())
    }
}

/// CRC-32 (IEEE 802.3) accumulator with a 4-byte big-endian digest
///
/// Matches the checksum produced by zlib's `crc32()` with an initial value
/// of zero. Not cryptographic; registered for compatibility with existing
/// `.crc32` checksum files.
#[derive(Debug, Clone, Default)]
pub struct Crc32 {
    value: u32,
}

impl Crc32 {
    /// Create a fresh CRC-32 context
    pub fn new() -> Self {
        Self { value: 0 }
    }
}

impl HashContext for Crc32 {
    fn digest_size(&self) -> usize {
        4
    }

    fn update(&mut self, data: &[u8]) {
        let mut crc = !self.value;
        for &byte in data {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ 0xEDB8_8320
                } else {
                    crc >> 1
                };
            }
        }
        self.value = !crc;
    }

    fn digest(&self) -> Vec<u8> {
        self.value.to_be_bytes().to_vec()
    }

    fn copy(&self) -> Box<dyn HashContext> {
        Box::new(self.clone())
    }
}

/// Names accepted by [`create_context`], sorted
pub const ALGORITHM_NAMES: &[&str] = &[
    "blake2b",
    "blake2s",
    "crc32",
    "md5",
    "sha1",
    "sha256",
    "sha3-256",
    "sha3-512",
    "sha512",
];

/// Instantiate a hash context by registered algorithm name
///
/// # Errors
///
/// Returns [`XsumError::UnknownAlgorithm`] for names not present in
/// [`ALGORITHM_NAMES`].
pub fn create_context(name: &str) -> Result<Box<dyn HashContext>> {
    match name {
        "blake2b" => Ok(Box::new(DigestContext::<blake2::Blake2b512>::new())),
        "blake2s" => Ok(Box::new(DigestContext::<blake2::Blake2s256>::new())),
        "crc32" => Ok(Box::new(Crc32::new())),
        "md5" => Ok(Box::new(DigestContext::<md5::Md5>::new())),
        "sha1" => Ok(Box::new(DigestContext::<sha1::Sha1>::new())),
        "sha256" => Ok(Box::new(DigestContext::<sha2::Sha256>::new())),
        "sha3-256" => Ok(Box::new(DigestContext::<sha3::Sha3_256>::new())),
        "sha3-512" => Ok(Box::new(DigestContext::<sha3::Sha3_512>::new())),
        "sha512" => Ok(Box::new(DigestContext::<sha2::Sha512>::new())),
        _ => Err(XsumError::UnknownAlgorithm(name.to_string())),
    }
}

/// Sidecar file suffix for an algorithm name, e.g. `sha3-256` -> `.sha3_256`
pub fn hash_suffix(name: &str) -> String {
    format!(".{}", name.replace('-', "_"))
}

/// Sidecar suffixes for every registered algorithm
pub fn hash_suffixes() -> Vec<String> {
    ALGORITHM_NAMES.iter().map(|name| hash_suffix(name)).collect()
}
