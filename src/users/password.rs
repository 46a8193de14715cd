use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use clap::ValueEnum;
use rand::rngs::OsRng;
use tracing::error;

/// bcrypt cost used by the platform's account backend.
pub const BCRYPT_COST: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum HashScheme {
    /// Readable by the platform backend.
    #[default]
    Bcrypt,
    Argon2,
}

impl HashScheme {
    /// Scheme of an encoded hash, judged by its prefix.
    pub fn detect(hash: &str) -> Option<Self> {
        if hash.starts_with("$argon2") {
            Some(Self::Argon2)
        } else if hash.starts_with("$2a$") || hash.starts_with("$2b$") || hash.starts_with("$2y$") {
            Some(Self::Bcrypt)
        } else {
            None
        }
    }
}

pub fn hash_password(plain: &str, scheme: HashScheme) -> anyhow::Result<String> {
    match scheme {
        HashScheme::Bcrypt => bcrypt::hash(plain, BCRYPT_COST).map_err(|e| {
            error!(error = %e, "bcrypt hash error");
            anyhow::anyhow!(e.to_string())
        }),
        HashScheme::Argon2 => {
            let salt = SaltString::generate(&mut OsRng);
            let hash = Argon2::default()
                .hash_password(plain.as_bytes(), &salt)
                .map_err(|e| {
                    error!(error = %e, "argon2 hash_password error");
                    anyhow::anyhow!(e.to_string())
                })?
                .to_string();
            Ok(hash)
        }
    }
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    match HashScheme::detect(hash) {
        Some(HashScheme::Bcrypt) => bcrypt::verify(plain, hash).map_err(|e| {
            error!(error = %e, "bcrypt verify error");
            anyhow::anyhow!(e.to_string())
        }),
        Some(HashScheme::Argon2) => {
            let parsed = PasswordHash::new(hash).map_err(|e| {
                error!(error = %e, "argon2 parse hash error");
                anyhow::anyhow!(e.to_string())
            })?;
            Ok(Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok())
        }
        None => anyhow::bail!("unrecognized password hash format"),
    }
}
