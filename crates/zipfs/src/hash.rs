use std::fmt;
use std::io::{self, Read};

const BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithm used for content hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Blake3,
}

impl HashAlgorithm {
    /// Lowercase algorithm name, as used in the `Display` form of [`FileHash`].
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Blake3 => "blake3",
        }
    }
}

/// Content hash of one entry: the algorithm and the lowercase hex digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHash {
    algorithm: HashAlgorithm,
    value: String,
}

impl FileHash {
    pub fn new(algorithm: HashAlgorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            value: value.into(),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Lowercase hex digest.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.name(), self.value)
    }
}

/// Hash everything `reader` yields.
pub fn hash_reader<R: Read + ?Sized>(
    algorithm: HashAlgorithm,
    reader: &mut R,
) -> io::Result<FileHash> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let value = match algorithm {
        HashAlgorithm::Md5 => {
            let mut context = md5::Context::new();
            loop {
                let n = read_chunk(reader, &mut buffer)?;
                if n == 0 {
                    break;
                }
                context.consume(&buffer[..n]);
            }
            hex::encode(context.compute().0)
        }
        HashAlgorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            loop {
                let n = read_chunk(reader, &mut buffer)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buffer[..n]);
            }
            hex::encode(hasher.finalize().as_bytes())
        }
    };
    Ok(FileHash::new(algorithm, value))
}

fn read_chunk<R: Read + ?Sized>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buffer) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}
