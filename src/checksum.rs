use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::rest_types::{Checksum, HashFunc};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Incremental digest for one of the supported [`HashFunc`]s.
pub enum ContentHasher {
    Sha256(Sha256),
}

impl ContentHasher {
    pub fn new(hash_func: HashFunc) -> Self {
        match hash_func {
            HashFunc::Sha256 => ContentHasher::Sha256(Sha256::new()),
        }
    }

    pub fn hash_func(&self) -> HashFunc {
        match self {
            ContentHasher::Sha256(_) => HashFunc::Sha256,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            ContentHasher::Sha256(hasher) => hasher.update(data),
        }
    }

    pub fn finalize(self) -> Checksum {
        let hash_func = self.hash_func();
        let hash = match self {
            ContentHasher::Sha256(hasher) => hasher.finalize().to_vec(),
        };
        Checksum::new(hash_func, hash)
    }
}

/// Reads `reader` to the end, returning its checksum and the number of bytes
/// hashed.
pub async fn digest_reader<R>(hash_func: HashFunc, reader: &mut R) -> std::io::Result<(Checksum, u64)>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut hasher = ContentHasher::new(hash_func);
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        total += n as u64;
    }

    Ok((hasher.finalize(), total))
}
