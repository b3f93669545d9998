//! Passphrase encryption of backup archives.
//!
//! Layout of an encrypted file:
//!
//! ```text
//! magic (8) | salt (16) | stream nonce (7) | chunk* | last chunk
//! ```
//!
//! The payload is split into 64 KiB chunks sealed with the ChaCha20-Poly1305
//! STREAM construction (big-endian 32-bit counter), so truncation and chunk
//! reordering are detected. The key is derived from the passphrase and the
//! random salt with BLAKE3 in key derivation mode.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use chacha20poly1305::{
    ChaCha20Poly1305, Key,
    aead::{
        generic_array::GenericArray,
        stream::{DecryptorBE32, EncryptorBE32},
    },
};

const MAGIC: &[u8; 8] = b"APKVLT01";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 7;
const TAG_LEN: usize = 16;
const CHUNK_LEN: usize = 64 * 1024;
const KEY_CONTEXT: &str = "apkvault 2026-10-16 backup archive passphrase key";

/// Encrypts `source` into `dest` with a key derived from `passphrase`.
pub async fn encrypt(passphrase: &str, source: &Path, dest: &Path) -> io::Result<()> {
    let passphrase = passphrase.to_owned();
    let (source, dest) = (source.to_path_buf(), dest.to_path_buf());
    crate::blocking(move || {
        let result = encrypt_blocking(&passphrase, &source, &dest);
        discard_on_error(result, &dest)
    })
    .await
}

/// Decrypts `source` (written by [`encrypt`]) into `dest`.
///
/// A wrong passphrase or a damaged file fails with `InvalidData` and leaves no
/// partial output behind.
pub async fn decrypt(passphrase: &str, source: &Path, dest: &Path) -> io::Result<()> {
    let passphrase = passphrase.to_owned();
    let (source, dest) = (source.to_path_buf(), dest.to_path_buf());
    crate::blocking(move || {
        let result = decrypt_blocking(&passphrase, &source, &dest);
        discard_on_error(result, &dest)
    })
    .await
}

fn encrypt_blocking(passphrase: &str, source: &Path, dest: &Path) -> io::Result<()> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    getrandom::fill(&mut salt).map_err(io::Error::other)?;
    getrandom::fill(&mut nonce).map_err(io::Error::other)?;

    let key = derive_key(passphrase, &salt);
    let mut encryptor =
        EncryptorBE32::<ChaCha20Poly1305>::new(&key, GenericArray::from_slice(&nonce));

    let mut reader = BufReader::new(File::open(source)?);
    let mut writer = BufWriter::new(File::create(dest)?);
    writer.write_all(MAGIC)?;
    writer.write_all(&salt)?;
    writer.write_all(&nonce)?;

    let mut current = vec![0u8; CHUNK_LEN];
    let mut next = vec![0u8; CHUNK_LEN];
    let mut len = read_full(&mut reader, &mut current)?;
    while len == CHUNK_LEN {
        let next_len = read_full(&mut reader, &mut next)?;
        if next_len == 0 {
            break;
        }
        let sealed = encryptor.encrypt_next(&current[..len]).map_err(|_| sealing_failed())?;
        writer.write_all(&sealed)?;
        std::mem::swap(&mut current, &mut next);
        len = next_len;
    }
    let sealed = encryptor.encrypt_last(&current[..len]).map_err(|_| sealing_failed())?;
    writer.write_all(&sealed)?;
    writer.flush()
}

fn decrypt_blocking(passphrase: &str, source: &Path, dest: &Path) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(source)?);

    let mut magic = [0u8; MAGIC.len()];
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    reader.read_exact(&mut magic).map_err(|_| not_a_vault(source))?;
    if &magic != MAGIC {
        return Err(not_a_vault(source));
    }
    reader.read_exact(&mut salt)?;
    reader.read_exact(&mut nonce)?;

    let key = derive_key(passphrase, &salt);
    let mut decryptor =
        DecryptorBE32::<ChaCha20Poly1305>::new(&key, GenericArray::from_slice(&nonce));

    let mut writer = BufWriter::new(File::create(dest)?);
    let sealed_len = CHUNK_LEN + TAG_LEN;
    let mut current = vec![0u8; sealed_len];
    let mut next = vec![0u8; sealed_len];
    let mut len = read_full(&mut reader, &mut current)?;
    while len == sealed_len {
        let next_len = read_full(&mut reader, &mut next)?;
        if next_len == 0 {
            break;
        }
        let plain = decryptor.decrypt_next(&current[..len]).map_err(|_| authentication_failed())?;
        writer.write_all(&plain)?;
        std::mem::swap(&mut current, &mut next);
        len = next_len;
    }
    let plain = decryptor.decrypt_last(&current[..len]).map_err(|_| authentication_failed())?;
    writer.write_all(&plain)?;
    writer.flush()
}

fn derive_key(passphrase: &str, salt: &[u8; SALT_LEN]) -> Key {
    let mut hasher = blake3::Hasher::new_derive_key(KEY_CONTEXT);
    hasher.update(salt);
    hasher.update(passphrase.as_bytes());
    Key::clone_from_slice(hasher.finalize().as_bytes())
}

/// Fills `buf` as far as the reader allows. Returns fewer bytes only at EOF.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn discard_on_error(result: io::Result<()>, dest: &Path) -> io::Result<()> {
    if result.is_err() {
        let _ = fs::remove_file(dest);
    }
    result
}

fn sealing_failed() -> io::Error {
    io::Error::other("failed to seal archive chunk")
}

fn authentication_failed() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        "authentication failed: wrong passphrase or damaged archive",
    )
}

fn not_a_vault(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{} is not an encrypted apkmass archive", path.display()),
    )
}
