use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Ciphertext authentication failed: tampered data, wrong or rotated key")]
    AuthenticationFailed,

    #[error("Invalid key length")]
    InvalidKeyLength,

    #[error("Key file error: {0}")]
    KeyFile(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token")]
    Malformed,
}
