//! Streaming file digests.
//!
//! Files are read through a fixed-size buffer so peak memory stays bounded
//! no matter how large the monitored file is.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::algorithm::Algorithm;
use crate::error::{Result, TriplineError};
use crate::report::{Notice, Reporter};

/// Default buffer size for streaming reads (64KB)
const BUFFER_SIZE: usize = 64 * 1024;

/// Lowercase hex digest of a file's full contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest(String);

impl Digest {
    /// Accepts `hex` only if it is lowercase hex of the length `algorithm`
    /// produces.
    pub fn parse(algorithm: Algorithm, hex: &str) -> Option<Self> {
        let well_formed = hex.len() == algorithm.hex_len()
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| Self(hex.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes digests for one algorithm. The algorithm is fixed at
/// construction, so an unsupported name never reaches the first read.
#[derive(Debug, Clone)]
pub struct DigestEngine {
    algorithm: Algorithm,
    buffer_size: usize,
}

impl DigestEngine {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            buffer_size: BUFFER_SIZE,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Hash the full contents of `path`.
    pub fn compute(&self, path: &Path) -> Result<Digest> {
        let mut file = File::open(path).map_err(|e| classify(path, e))?;
        self.compute_reader(&mut file)
            .map_err(|source| TriplineError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Hash everything `reader` yields.
    pub fn compute_reader<R: Read>(&self, reader: &mut R) -> io::Result<Digest> {
        let mut buffer = vec![0u8; self.buffer_size];
        let hex = match self.algorithm {
            Algorithm::Md5 => stream::<md5::Md5, _>(reader, &mut buffer)?,
            Algorithm::Sha1 => stream::<sha1::Sha1, _>(reader, &mut buffer)?,
            Algorithm::Sha224 => stream::<sha2::Sha224, _>(reader, &mut buffer)?,
            Algorithm::Sha256 => stream::<sha2::Sha256, _>(reader, &mut buffer)?,
            Algorithm::Sha384 => stream::<sha2::Sha384, _>(reader, &mut buffer)?,
            Algorithm::Sha512 => stream::<sha2::Sha512, _>(reader, &mut buffer)?,
            Algorithm::Sha3_224 => stream::<sha3::Sha3_224, _>(reader, &mut buffer)?,
            Algorithm::Sha3_256 => stream::<sha3::Sha3_256, _>(reader, &mut buffer)?,
            Algorithm::Sha3_384 => stream::<sha3::Sha3_384, _>(reader, &mut buffer)?,
            Algorithm::Sha3_512 => stream::<sha3::Sha3_512, _>(reader, &mut buffer)?,
            Algorithm::Blake3 => stream_blake3(reader, &mut buffer)?,
        };
        Ok(Digest(hex))
    }

    /// Hash every path, reporting and skipping the ones that fail. Keys are
    /// the paths exactly as supplied; a path with no exact string form is
    /// skipped.
    pub fn compute_all(&self, paths: &[PathBuf], reporter: &dyn Reporter) -> HashedFiles {
        let mut hashed = HashedFiles::default();
        for path in paths {
            let Some(key) = path.to_str() else {
                let error = TriplineError::NonUtf8Path { path: path.clone() };
                reporter.notify(Notice::Skipped { error: &error });
                hashed.failures.push(error);
                continue;
            };
            match self.compute(path) {
                Ok(digest) => {
                    hashed.digests.insert(key.to_string(), digest);
                }
                Err(error) => {
                    reporter.notify(Notice::HashFailed { error: &error });
                    hashed.failures.push(error);
                }
            }
        }
        hashed
    }
}

/// Output of hashing a batch of files.
#[derive(Debug, Default)]
pub struct HashedFiles {
    pub digests: BTreeMap<String, Digest>,
    pub failures: Vec<TriplineError>,
}

fn classify(path: &Path, error: io::Error) -> TriplineError {
    if error.kind() == io::ErrorKind::NotFound {
        TriplineError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        TriplineError::Read {
            path: path.to_path_buf(),
            source: error,
        }
    }
}

fn stream<D: sha2::Digest, R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<String> {
    let mut hasher = D::new();
    loop {
        match reader.read(buffer)? {
            0 => break,
            n => hasher.update(&buffer[..n]),
        }
    }
    Ok(hex::encode(hasher.finalize()))
}

fn stream_blake3<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    loop {
        match reader.read(buffer)? {
            0 => break,
            n => {
                hasher.update(&buffer[..n]);
            }
        }
    }
    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullReporter;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn known_digests() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello").unwrap();

        let md5 = DigestEngine::new(Algorithm::Md5).compute(&path).unwrap();
        assert_eq!(md5.as_str(), "5d41402abc4b2a76b9719d911017c592");

        let sha1 = DigestEngine::new(Algorithm::Sha1).compute(&path).unwrap();
        assert_eq!(sha1.as_str(), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");

        let sha256 = DigestEngine::new(Algorithm::Sha256).compute(&path).unwrap();
        assert_eq!(
            sha256.as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn digest_length_matches_algorithm() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"test content").unwrap();

        for alg in Algorithm::ALL {
            let digest = DigestEngine::new(alg).compute(&path).unwrap();
            assert_eq!(digest.as_str().len(), alg.hex_len(), "{alg}");
            assert!(Digest::parse(alg, digest.as_str()).is_some());
        }
    }

    #[test]
    fn small_buffer_gives_same_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &content).unwrap();

        let default = DigestEngine::new(Algorithm::Sha512).compute(&path).unwrap();
        let tiny = DigestEngine::new(Algorithm::Sha512)
            .with_buffer_size(7)
            .compute(&path)
            .unwrap();
        assert_eq!(default, tiny);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = DigestEngine::new(Algorithm::Sha256)
            .compute(&dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, TriplineError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_a_read_error() {
        let dir = tempdir().unwrap();
        let err = DigestEngine::new(Algorithm::Sha256)
            .compute(dir.path())
            .unwrap_err();
        assert!(matches!(err, TriplineError::Read { .. }));
    }

    #[test]
    fn compute_all_skips_failures() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present.txt");
        fs::write(&present, b"x").unwrap();
        let absent = dir.path().join("absent.txt");

        let hashed = DigestEngine::new(Algorithm::Md5)
            .compute_all(&[present.clone(), absent], &NullReporter);
        assert_eq!(hashed.digests.len(), 1);
        assert!(hashed
            .digests
            .contains_key(present.to_string_lossy().as_ref()));
        assert_eq!(hashed.failures.len(), 1);
    }

    #[test]
    fn parse_rejects_malformed_hex() {
        assert!(Digest::parse(Algorithm::Md5, "5d41402abc4b2a76b9719d911017c592").is_some());
        assert!(Digest::parse(Algorithm::Md5, "5D41402ABC4B2A76B9719D911017C592").is_none());
        assert!(Digest::parse(Algorithm::Md5, "abc").is_none());
        assert!(Digest::parse(Algorithm::Md5, "zz41402abc4b2a76b9719d911017c592").is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_path_is_skipped_not_recorded() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let good = dir.path().join("good.txt");
        fs::write(&good, b"x").unwrap();
        let bad = dir.path().join(OsStr::from_bytes(b"bad\xff.txt"));
        fs::write(&bad, b"y").unwrap();

        let hashed =
            DigestEngine::new(Algorithm::Sha256).compute_all(&[good.clone(), bad], &NullReporter);
        assert_eq!(hashed.digests.len(), 1);
        assert!(hashed.digests.contains_key(good.to_str().unwrap()));
        assert_eq!(hashed.failures.len(), 1);
        assert!(matches!(hashed.failures[0], TriplineError::NonUtf8Path { .. }));
        assert!(!hashed.failures[0].is_fatal());
    }
}
