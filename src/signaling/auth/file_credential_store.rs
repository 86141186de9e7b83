use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::signaling::auth::{AuthError, IdentityVerifier};
use crate::signaling::protocol::ParticipantId;

#[derive(Debug, Clone)]
struct CredentialEntry {
    salt: [u8; 16],
    hash: [u8; 32],
}

/// Credential file written by the identity service and read by the signaling
/// server.
///
/// One line per identity: `identity:salt_hex:sha256(salt || secret)_hex`.
/// Blank lines and `#` comments are ignored; malformed lines are skipped.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    entries: HashMap<ParticipantId, CredentialEntry>,
}

impl FileCredentialStore {
    /// Opens `path`; a missing file yields an empty store.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut entries = HashMap::new();

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((identity, entry)) = parse_line(line) {
                    entries.insert(identity, entry);
                }
            }
        }

        Ok(Self { path, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds or replaces the credential for `identity` and rewrites the file.
    ///
    /// On a persistence failure the in-memory table is left unchanged.
    pub fn insert(&mut self, identity: &str, secret: &str) -> io::Result<()> {
        if identity.is_empty() || identity.contains(':') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "identity must be non-empty and must not contain ':'",
            ));
        }

        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let entry = CredentialEntry {
            salt,
            hash: hash_secret(secret, &salt),
        };

        let previous = self.entries.insert(identity.to_owned(), entry);
        if let Err(e) = self.persist() {
            match previous {
                Some(old) => self.entries.insert(identity.to_owned(), old),
                None => self.entries.remove(identity),
            };
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self) -> io::Result<()> {
        let mut buf = String::new();
        for (identity, entry) in &self.entries {
            buf.push_str(&format!(
                "{identity}:{}:{}\n",
                to_hex(&entry.salt),
                to_hex(&entry.hash)
            ));
        }

        // Write to temp file then atomically rename.
        let tmp = self.path.with_extension("tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(buf.as_bytes())?;
            f.flush()?;
        }
        fs::rename(tmp, &self.path)
    }
}

impl IdentityVerifier for FileCredentialStore {
    fn verify(&self, identity: &str, secret: &str) -> Result<(), AuthError> {
        match self.entries.get(identity) {
            Some(entry) if hash_secret(secret, &entry.salt) == entry.hash => Ok(()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

fn parse_line(line: &str) -> Option<(ParticipantId, CredentialEntry)> {
    let mut parts = line.split(':');
    let identity = parts.next()?;
    let salt = from_hex::<16>(parts.next()?)?;
    let hash = from_hex::<32>(parts.next()?)?;
    if identity.is_empty() || parts.next().is_some() {
        return None;
    }
    Some((identity.to_owned(), CredentialEntry { salt, hash }))
}

fn hash_secret(secret: &str, salt: &[u8; 16]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex<const N: usize>(input: &str) -> Option<[u8; N]> {
    if input.len() != N * 2 || !input.is_ascii() {
        return None;
    }
    let mut out = [0u8; N];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&input[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn unique_temp_path() -> PathBuf {
        let suffix = rand::thread_rng().next_u64();
        std::env::temp_dir().join(format!("rustycall_credentials_{suffix}.db"))
    }

    #[test]
    fn insert_then_verify_survives_reopen() {
        let path = unique_temp_path();
        {
            let mut store = FileCredentialStore::open(&path).expect("open store");
            assert!(store.is_empty());
            store.insert("alice", "correct horse").unwrap();
            assert_eq!(store.verify("alice", "correct horse"), Ok(()));
            assert_eq!(
                store.verify("alice", "battery staple"),
                Err(AuthError::InvalidCredentials)
            );
        }

        let store = FileCredentialStore::open(&path).expect("reopen store");
        assert_eq!(store.len(), 1);
        assert_eq!(store.verify("alice", "correct horse"), Ok(()));
        assert_eq!(store.verify("bob", "correct horse"), Err(AuthError::InvalidCredentials));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let path = unique_temp_path();
        let good_salt = to_hex(&[1u8; 16]);
        let good_hash = to_hex(&hash_secret("pw", &[1u8; 16]));
        fs::write(
            &path,
            format!(
                "# issued by the identity service\n\
                 carol:{good_salt}:{good_hash}\n\
                 dave:zz:{good_hash}\n\
                 erin:{good_salt}\n"
            ),
        )
        .unwrap();

        let store = FileCredentialStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.verify("carol", "pw"), Ok(()));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn identities_with_separator_are_refused() {
        let path = unique_temp_path();
        let mut store = FileCredentialStore::open(&path).unwrap();
        assert!(store.insert("bad:name", "pw").is_err());
        assert!(store.insert("", "pw").is_err());
        assert!(store.is_empty());
    }
}
