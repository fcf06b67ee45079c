/// Application name
pub const APP_NAME: &str = "Wayfarer";

/// XChaCha20-Poly1305 nonce size in bytes
pub const NONCE_SIZE: usize = 24;

/// Symmetric key size in bytes (for XChaCha20-Poly1305)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Password salt size in bytes
pub const SALT_SIZE: usize = 16;

/// Session token validity window in seconds (24 hours)
pub const TOKEN_TTL_SECS: i64 = 86_400;

/// Window after sending during which a message may still be recalled
pub const RECALL_WINDOW_SECS: i64 = 120;

/// Default interval between scheduled cloud sync runs (15 minutes)
pub const SYNC_INTERVAL_SECS: u64 = 900;

/// Upper bound on a single remote delivery attempt
pub const DELIVERY_TIMEOUT_SECS: u64 = 10;

/// Reserved traveler id of the built-in AI assistant
pub const AI_ASSISTANT_ID: &str = "ai_assistant";

/// Key derivation contexts (BLAKE3)
pub const KDF_CONTEXT_VAULT_KEY: &str = "wayfarer-vault-key-v1";
pub const KDF_CONTEXT_TOKEN_KEY: &str = "wayfarer-token-key-v1";
