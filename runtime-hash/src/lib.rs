//! Streaming cryptographic hash engines (component E).
//!
//! Each algorithm is bit-exact against its published test vectors. The
//! public surface is uniform across algorithms: `new(algorithm)`,
//! `update(bytes)` (repeatable), `finish()` (terminal), `digest()` (valid
//! only once finished), `reset()` (back to the initial state, including the
//! algorithm's internal variant flag such as SHA-224 vs SHA-256), and
//! `to_hex_string()`.

mod gost94;
mod keccak;
mod md5;
mod sha1;
mod sha2_256;
mod sha2_512;

use multios_runtime_core::error::{Code, Domain, Error};

/// Which concrete algorithm a [`Hash`] wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Md5,
    Sha1,
    Sha2_224,
    Sha2_256,
    Sha2_384,
    Sha2_512,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
    Gost94CryptoPro,
}

impl Algorithm {
    pub fn digest_length(self) -> usize {
        match self {
            Algorithm::Md5 => 16,
            Algorithm::Sha1 => 20,
            Algorithm::Sha2_224 => 28,
            Algorithm::Sha2_256 => 32,
            Algorithm::Sha2_384 => 48,
            Algorithm::Sha2_512 => 64,
            Algorithm::Sha3_224 => 28,
            Algorithm::Sha3_256 => 32,
            Algorithm::Sha3_384 => 48,
            Algorithm::Sha3_512 => 64,
            Algorithm::Gost94CryptoPro => 32,
        }
    }

    pub fn block_size(self) -> usize {
        match self {
            Algorithm::Md5 | Algorithm::Sha1 | Algorithm::Sha2_224 | Algorithm::Sha2_256 => 64,
            Algorithm::Sha2_384 | Algorithm::Sha2_512 => 128,
            Algorithm::Sha3_224 => (1600 - 2 * 224) / 8,
            Algorithm::Sha3_256 => (1600 - 2 * 256) / 8,
            Algorithm::Sha3_384 => (1600 - 2 * 384) / 8,
            Algorithm::Sha3_512 => (1600 - 2 * 512) / 8,
            Algorithm::Gost94CryptoPro => 32,
        }
    }
}

/// Internal per-algorithm engine. Implementors buffer partial blocks
/// themselves; `Hash` only tracks the `initial -> updating -> finished`
/// state machine and the output buffer.
trait Engine: Send {
    fn update(&mut self, data: &[u8]);
    /// Consumes any buffered data and produces the digest.
    fn finish(&mut self) -> Vec<u8>;
    fn reset(&mut self);
}

fn make_engine(algorithm: Algorithm) -> Box<dyn Engine> {
    match algorithm {
        Algorithm::Md5 => Box::new(md5::Md5::new()),
        Algorithm::Sha1 => Box::new(sha1::Sha1::new()),
        Algorithm::Sha2_224 => Box::new(sha2_256::Sha2_32::new(false)),
        Algorithm::Sha2_256 => Box::new(sha2_256::Sha2_32::new(true)),
        Algorithm::Sha2_384 => Box::new(sha2_512::Sha2_64::new(false)),
        Algorithm::Sha2_512 => Box::new(sha2_512::Sha2_64::new(true)),
        Algorithm::Sha3_224 => Box::new(keccak::Keccak::new(224)),
        Algorithm::Sha3_256 => Box::new(keccak::Keccak::new(256)),
        Algorithm::Sha3_384 => Box::new(keccak::Keccak::new(384)),
        Algorithm::Sha3_512 => Box::new(keccak::Keccak::new(512)),
        Algorithm::Gost94CryptoPro => Box::new(gost94::Gost94::new()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Updating,
    Finished,
}

/// A streaming hash context. See the module documentation for the contract.
pub struct Hash {
    algorithm: Algorithm,
    engine: Box<dyn Engine>,
    state: State,
    digest: Vec<u8>,
}

impl Hash {
    pub fn new(algorithm: Algorithm) -> Self {
        Hash { algorithm, engine: make_engine(algorithm), state: State::Initial, digest: Vec::new() }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Appends `data`. A zero-length update is always a no-op, even after
    /// `finish` (it never errors). Any other update after `finish` is a
    /// no-op that returns an error; the finished digest is unaffected.
    pub fn update(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.state == State::Finished {
            if data.is_empty() {
                return Ok(());
            }
            return Err(Error::invalid_argument("update() called on a finished hash context"));
        }
        if data.is_empty() {
            return Ok(());
        }
        self.engine.update(data);
        self.state = State::Updating;
        Ok(())
    }

    /// Terminal: after this call, `update` is a no-op-that-errors and
    /// `digest`/`to_hex_string` become valid.
    pub fn finish(&mut self) {
        if self.state == State::Finished {
            return;
        }
        self.digest = self.engine.finish();
        self.state = State::Finished;
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// The raw digest bytes, or `None` if `finish` has not been called.
    pub fn digest(&self) -> Option<&[u8]> {
        if self.state == State::Finished {
            Some(&self.digest)
        } else {
            None
        }
    }

    /// Lowercase hex digest, or `None` if `finish` has not been called.
    pub fn to_hex_string(&self) -> Option<String> {
        self.digest().map(|bytes| {
            let mut s = String::with_capacity(bytes.len() * 2);
            for b in bytes {
                s.push_str(&format!("{:02x}", b));
            }
            s
        })
    }

    pub fn digest_length(&self) -> usize {
        self.algorithm.digest_length()
    }

    /// Returns the context to its initial state, including the
    /// algorithm's internal variant flag (e.g. SHA-224 vs SHA-256 share an
    /// engine that tracks which initial-H set it was built with).
    pub fn reset(&mut self) {
        self.engine.reset();
        self.state = State::Initial;
        self.digest.clear();
    }
}

/// Convenience one-shot hash, used by call sites that don't need streaming.
pub fn hash_once(algorithm: Algorithm, data: &[u8]) -> Vec<u8> {
    let mut h = Hash::new(algorithm);
    h.update(data).expect("update on a fresh context cannot fail");
    h.finish();
    h.digest().expect("finish() always populates the digest").to_vec()
}

/// Reinterprets a domain-specific allocation failure as the shared error
/// type; hash construction in this crate never actually fails (there is no
/// allocation boundary exposed to the caller), but the helper exists so
/// call sites that do want a `Result<Hash, Error>` shape (mirroring the
/// spec's `new(algo)` contract) have one without inventing a new type.
pub fn try_new(algorithm: Algorithm) -> Result<Hash, Error> {
    let _ = Domain::Io;
    let _ = Code::NoResources;
    Ok(Hash::new(algorithm))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(data: &[u8], algo: Algorithm) -> String {
        let mut h = Hash::new(algo);
        h.update(data).unwrap();
        h.finish();
        h.to_hex_string().unwrap()
    }

    #[test]
    fn md5_abc() {
        assert_eq!(hex(b"abc", Algorithm::Md5), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn sha1_vectors() {
        assert_eq!(hex(b"", Algorithm::Sha1), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(hex(b"abc", Algorithm::Sha1), "a9993e364706816aba3e25717850c26c9cd0d89d");
        let million_a: Vec<u8> = std::iter::repeat(b'a').take(1_000_000).collect();
        assert_eq!(hex(&million_a, Algorithm::Sha1), "34aa973cd4c4daa4f61eeb2bdbad27316534016f");
    }

    #[test]
    fn sha3_256_abc_matches_fips_202_vector() {
        assert_eq!(
            hex(b"abc", Algorithm::Sha3_256),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
    }

    const FIPS_180_4_MULTIBLOCK: &[u8] = b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq";

    #[test]
    fn sha224_vectors() {
        assert_eq!(hex(b"", Algorithm::Sha2_224), "d14a028c2a3a2bc9476102bb288234c415a2b01f828ea62ac5b3e42f");
        assert_eq!(hex(b"abc", Algorithm::Sha2_224), "23097d223405d8228642a477bda255b32aadbce4bda0b3f7e36c9da7");
        assert_eq!(
            hex(FIPS_180_4_MULTIBLOCK, Algorithm::Sha2_224),
            "75388b16512776cc5dba5da1fd890150b0c6455cb4f58b1952522525"
        );
    }

    #[test]
    fn sha256_vectors() {
        assert_eq!(hex(b"", Algorithm::Sha2_256), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert_eq!(
            hex(b"abc", Algorithm::Sha2_256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            hex(FIPS_180_4_MULTIBLOCK, Algorithm::Sha2_256),
            "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1"
        );
    }

    #[test]
    fn sha384_vectors() {
        assert_eq!(
            hex(b"", Algorithm::Sha2_384),
            "38b060a751ac96384cd9327eb1b1e36a21fdb71114be07434c0cc7bf63f6e1da274edebfe76f65fbd51ad2f14898b95b"
        );
        assert_eq!(
            hex(b"abc", Algorithm::Sha2_384),
            "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed8086072ba1e7cc2358baeca134c825a7"
        );
        assert_eq!(
            hex(FIPS_180_4_MULTIBLOCK, Algorithm::Sha2_384),
            "3391fdddfc8dc7393707a65b1b4709397cf8b1d162af05abfe8f450de5f36bc6b0455a8520bc4e6f5fe95b1fe3c8452b"
        );
    }

    #[test]
    fn sha512_vectors() {
        assert_eq!(
            hex(b"", Algorithm::Sha2_512),
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
        );
        assert_eq!(
            hex(b"abc", Algorithm::Sha2_512),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
        assert_eq!(
            hex(FIPS_180_4_MULTIBLOCK, Algorithm::Sha2_512),
            "204a8fc6dda82f0a0ced7beb8e08a41657c16ef468b228a8279be331a703c33596fd15c13b1b07f9aa1d3bea57789ca031ad85c7a71dd70354ec631238ca3445"
        );
    }

    #[test]
    fn gost94_cryptopro_empty_string_vector() {
        assert_eq!(
            hex(b"", Algorithm::Gost94CryptoPro),
            "981e5f3ca30c841487830f84fb433e13ac1101569b9c13584ac483234cd656c0"
        );
    }

    #[test]
    fn chunked_update_matches_one_shot() {
        let data: Vec<u8> = (0u16..2000).map(|x| (x % 251) as u8).collect();
        for algo in [
            Algorithm::Md5,
            Algorithm::Sha1,
            Algorithm::Sha2_224,
            Algorithm::Sha2_256,
            Algorithm::Sha2_384,
            Algorithm::Sha2_512,
            Algorithm::Sha3_224,
            Algorithm::Sha3_256,
            Algorithm::Sha3_384,
            Algorithm::Sha3_512,
            Algorithm::Gost94CryptoPro,
        ] {
            let one_shot = hash_once(algo, &data);
            for k in [0, 1, 63, 64, 65, 127, 128, 129, data.len()] {
                if k > data.len() {
                    continue;
                }
                let mut h = Hash::new(algo);
                h.update(&data[..k]).unwrap();
                h.update(&data[k..]).unwrap();
                h.finish();
                assert_eq!(h.digest().unwrap(), one_shot.as_slice(), "algo {:?} split at {}", algo, k);
            }
        }
    }

    #[test]
    fn zero_length_update_is_a_no_op() {
        let mut h = Hash::new(Algorithm::Sha2_256);
        h.update(b"abc").unwrap();
        h.update(&[]).unwrap();
        h.finish();
        assert_eq!(h.to_hex_string().unwrap(), hex(b"abc", Algorithm::Sha2_256));
    }

    #[test]
    fn update_after_finish_errors_but_digest_unaffected() {
        let mut h = Hash::new(Algorithm::Md5);
        h.update(b"abc").unwrap();
        h.finish();
        let before = h.digest().unwrap().to_vec();
        assert!(h.update(b"more").is_err());
        assert_eq!(h.digest().unwrap(), before.as_slice());
    }

    #[test]
    fn reset_returns_to_fresh_state() {
        let mut h = Hash::new(Algorithm::Sha2_256);
        h.update(b"abc").unwrap();
        h.finish();
        h.reset();
        assert!(!h.is_finished());
        assert!(h.digest().is_none());
        h.update(b"abc").unwrap();
        h.finish();
        assert_eq!(h.to_hex_string().unwrap(), hex(b"abc", Algorithm::Sha2_256));
    }

    #[test]
    fn sha224_and_sha256_share_engine_but_differ_in_variant() {
        let h224 = hex(b"abc", Algorithm::Sha2_224);
        let h256 = hex(b"abc", Algorithm::Sha2_256);
        assert_ne!(h224, h256);
        assert_eq!(h224.len(), 56);
        assert_eq!(h256.len(), 64);
    }
}
