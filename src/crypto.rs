//! AES-256-GCM encryption for persisted configuration
//!
//! Encrypted files use a small self-describing binary envelope:
//!
//! ```text
//! offset 0   magic   b"DYNCFG"  (6 bytes)
//! offset 6   version 0x01       (1 byte)
//! offset 7   format  tag        (1 byte, 1 = JSON, 2 = TOML)
//! offset 8   nonce              (12 bytes)
//! offset 20  ciphertext || tag  (>= 16 bytes)
//! ```
//!
//! The 8-byte header is authenticated as associated data, so any change to
//! it, to the nonce or to the ciphertext fails decryption.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Key, Nonce,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ConfigError, ConfigResult};
use crate::format::Format;

/// Size of AES-256 encryption key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

const ENVELOPE_MAGIC: &[u8; 6] = b"DYNCFG";
const ENVELOPE_VERSION: u8 = 1;
const HEADER_SIZE: usize = 6 + 1 + 1;
const MIN_ENVELOPE_SIZE: usize = HEADER_SIZE + NONCE_SIZE + TAG_SIZE;

/// Secret key for configuration encryption, zeroized on drop
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecretKey {
    key: [u8; KEY_SIZE],
}

impl SecretKey {
    pub fn new(key_bytes: [u8; KEY_SIZE]) -> Self {
        Self { key: key_bytes }
    }

    /// Create a key from a slice, which must be exactly 32 bytes
    pub fn from_slice(slice: &[u8]) -> ConfigResult<Self> {
        if slice.len() != KEY_SIZE {
            return Err(ConfigError::encryption(format!(
                "Invalid key size: expected {} bytes, got {}",
                KEY_SIZE,
                slice.len()
            )));
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(slice);
        Ok(Self::new(key))
    }

    /// Generate a random key
    pub fn generate() -> Self {
        let mut key_bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut key_bytes);
        let key = Self::new(key_bytes);
        key_bytes.zeroize();
        key
    }

    /// Parse a hex-encoded key
    pub fn from_hex(hex_key: &str) -> ConfigResult<Self> {
        let mut bytes = hex::decode(hex_key.trim())
            .map_err(|e| ConfigError::encryption(format!("Key is not valid hex: {}", e)))?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.key)
    }

    /// Read a hex key file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let key = Self::from_hex(&content);
        content.zeroize();
        key
    }

    /// Write the key as hex, creating parent directories.
    ///
    /// On unix the file is restricted to the owner.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // created owner-only
            options.mode(0o600);
        }

        let mut encoded = self.to_hex();
        let written = options
            .open(path)
            .and_then(|mut file| file.write_all(encoded.as_bytes()))
            .map_err(|e| ConfigError::io(path, e));
        encoded.zeroize();
        written?;

        // an existing file keeps its old mode on open
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .map_err(|e| ConfigError::io(path, e))?;
        }

        Ok(())
    }

    /// Short SHA-256 fingerprint, safe to log
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.key);
        hex::encode(&digest[..8])
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey({})", self.fingerprint())
    }
}

/// Encrypted configuration payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    format: Format,
    nonce: [u8; NONCE_SIZE],
    /// Ciphertext with the authentication tag appended
    ciphertext: Vec<u8>,
}

impl Envelope {
    /// Encrypt serialized configuration text
    pub fn seal(key: &SecretKey, format: Format, plaintext: &[u8]) -> ConfigResult<Self> {
        let nonce_array = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&nonce_array);

        let header = header(format);
        let ciphertext = key
            .cipher()
            .encrypt(
                &nonce_array,
                Payload {
                    msg: plaintext,
                    aad: &header,
                },
            )
            .map_err(|e| ConfigError::encryption(format!("AES-GCM encryption failed: {}", e)))?;

        log::debug!(
            "Sealed {} bytes of {} with key {}",
            plaintext.len(),
            format,
            key.fingerprint()
        );

        Ok(Self {
            format,
            nonce,
            ciphertext,
        })
    }

    /// Decrypt and authenticate.
    ///
    /// A wrong key and tampered data are both reported as
    /// [`ConfigError::Decryption`].
    pub fn open(&self, key: &SecretKey) -> ConfigResult<Vec<u8>> {
        let header = header(self.format);
        key.cipher()
            .decrypt(
                Nonce::from_slice(&self.nonce),
                Payload {
                    msg: &self.ciphertext,
                    aad: &header,
                },
            )
            .map_err(|_| {
                ConfigError::decryption(format!(
                    "authentication failed with key {}",
                    key.fingerprint()
                ))
            })
    }

    /// Format of the plaintext
    pub fn format(&self) -> Format {
        self.format
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(HEADER_SIZE + NONCE_SIZE + self.ciphertext.len());
        result.extend_from_slice(&header(self.format));
        result.extend_from_slice(&self.nonce);
        result.extend_from_slice(&self.ciphertext);
        result
    }

    /// Parse the binary layout. Malformed input is a decryption error.
    pub fn from_bytes(data: &[u8]) -> ConfigResult<Self> {
        if !is_envelope(data) {
            return Err(ConfigError::decryption(
                "Data is not an encrypted configuration envelope",
            ));
        }

        if data.len() < MIN_ENVELOPE_SIZE {
            return Err(ConfigError::decryption(format!(
                "Envelope too small: {} bytes, minimum is {}",
                data.len(),
                MIN_ENVELOPE_SIZE
            )));
        }

        let version = data[6];
        if version != ENVELOPE_VERSION {
            return Err(ConfigError::decryption(format!(
                "Unsupported envelope version: {}",
                version
            )));
        }

        let format = Format::from_tag(data[7]).ok_or_else(|| {
            ConfigError::decryption(format!("Unknown format tag in envelope: {}", data[7]))
        })?;

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&data[HEADER_SIZE..HEADER_SIZE + NONCE_SIZE]);

        Ok(Self {
            format,
            nonce,
            ciphertext: data[HEADER_SIZE + NONCE_SIZE..].to_vec(),
        })
    }
}

/// True if `data` starts with the envelope magic
pub fn is_envelope(data: &[u8]) -> bool {
    data.starts_with(ENVELOPE_MAGIC)
}

fn header(format: Format) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[..6].copy_from_slice(ENVELOPE_MAGIC);
    header[6] = ENVELOPE_VERSION;
    header[7] = format.tag();
    header
}
