use digest::Digest;
use stowage_uri::Algorithm;

use crate::{Error, Result};

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;

    /// Lower-case hex of the final digest, the form hashes take in URIs.
    fn finalize_hex(self) -> String
    where
        Self: Sized,
    {
        hex::encode(self.finalize())
    }

    /// Finish and compare against `expected` hex, ignoring case.
    fn verify(self, expected: &str) -> Result<()>
    where
        Self: Sized,
    {
        let actual = self.finalize_hex();
        if actual.eq_ignore_ascii_case(expected) {
            Ok(())
        } else {
            Err(Error::Mismatch {
                expected: expected.to_string(),
                actual,
            })
        }
    }
}

/// Adapter for any RustCrypto [`Digest`].
pub struct DigestHasher<D: Digest + Send>(D);

impl<D: Digest + Send> DigestHasher<D> {
    pub fn new() -> Self { Self(D::new()) }
}

impl<D: Digest + Send> Default for DigestHasher<D> {
    fn default() -> Self { Self::new() }
}

impl<D: Digest + Send> Hasher for DigestHasher<D> {
    fn update(&mut self, data: &[u8]) { Digest::update(&mut self.0, data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

pub type Sha1Hasher = DigestHasher<sha1::Sha1>;

#[cfg(feature = "md5")]
pub type Md5Hasher = DigestHasher<md5::Md5>;

/// Hasher chosen at runtime from an [`Algorithm`].
pub enum AnyHasher {
    Sha1(Sha1Hasher),
    #[cfg(feature = "md5")]
    Md5(Md5Hasher),
}

impl AnyHasher {
    pub fn for_algorithm(algorithm: Algorithm) -> Result<Self> {
        match algorithm {
            Algorithm::Sha1 => Ok(Self::Sha1(Sha1Hasher::new())),
            #[cfg(feature = "md5")]
            Algorithm::Md5 => Ok(Self::Md5(Md5Hasher::new())),
            #[allow(unreachable_patterns)]
            other => Err(Error::UnsupportedAlgorithm(other)),
        }
    }
}

impl Hasher for AnyHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(data),
            #[cfg(feature = "md5")]
            Self::Md5(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Sha1(h) => h.finalize(),
            #[cfg(feature = "md5")]
            Self::Md5(h) => h.finalize(),
        }
    }
}
