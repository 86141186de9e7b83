use rustls::{
    RootCertStore,
    pki_types::{CertificateDer, PrivateKeyDer},
};
use rustls_pemfile::{Item, certs, read_one};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

/// Server name presented by the signaling server certificate unless
/// `[Signaling] tls_server_name` says otherwise.
pub const SIGNALING_DOMAIN: &str = "signal.internal";

fn open_pem(path: &Path, what: &str) -> io::Result<BufReader<File>> {
    let file = File::open(path)
        .map_err(|e| io::Error::new(e.kind(), format!("opening {what} {}: {e}", path.display())))?;
    Ok(BufReader::new(file))
}

fn read_certs(reader: &mut dyn BufRead) -> io::Result<Vec<CertificateDer<'static>>> {
    let certs: Vec<CertificateDer<'static>> = certs(reader)
        .collect::<Result<_, _>>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("invalid certs: {e}")))?;

    if certs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "PEM input did not contain any certificates",
        ));
    }
    Ok(certs)
}

/// Loads a certificate chain from a PEM file.
///
/// # Errors
///
/// Returns an `io::Error` if the file cannot be opened or if the PEM content is invalid.
pub fn load_certs(path: impl AsRef<Path>) -> io::Result<Vec<CertificateDer<'static>>> {
    let mut reader = open_pem(path.as_ref(), "cert")?;
    read_certs(&mut reader)
}

/// Loads a private key from a PEM file.
/// Supports PKCS1, PKCS8, and Sec1 (EC) formats.
///
/// # Errors
///
/// Returns an `io::Error` if the file cannot be opened, is malformed,
/// or does not contain a valid private key.
pub fn load_private_key(path: impl AsRef<Path>) -> io::Result<PrivateKeyDer<'static>> {
    let path = path.as_ref();
    let mut reader = open_pem(path, "key")?;

    // Iterate through PEM items until a valid key is found.
    loop {
        match read_one(&mut reader) {
            Ok(Some(Item::Pkcs1Key(key))) => return Ok(key.into()),
            Ok(Some(Item::Pkcs8Key(key))) => return Ok(key.into()),
            Ok(Some(Item::Sec1Key(key))) => return Ok(key.into()),
            Ok(None) => break, // End of file
            Ok(Some(_)) => {}  // It's a certificate or other item, ignore
            Err(e) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("key parse error: {e}"),
                ));
            }
        }
    }

    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("no private key found in {}", path.display()),
    ))
}

/// Builds a `RootCertStore` that trusts ONLY the CA certificates in `path`.
///
/// # Errors
///
/// Returns an `io::Error` if the PEM file is unreadable, invalid, or empty.
pub fn load_pinned_root_store(path: impl AsRef<Path>) -> io::Result<RootCertStore> {
    let mut reader = open_pem(path.as_ref(), "CA")?;
    let mut root_store = RootCertStore::empty();

    for cert in read_certs(&mut reader)? {
        root_store
            .add(cert)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("bad CA cert: {e}")))?;
    }

    Ok(root_store)
}
