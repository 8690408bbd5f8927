//! Argon2id によるパスワードハッシュ
//!
//! 保存形式は PHC 文字列（`$argon2id$v=19$m=...,t=...,p=...$salt$hash`）です。
//! 照合時のパラメータは保存値から読むため、コストを変えても既存のルームに影響しません。

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};

use crate::domain::{PasswordHashError, PasswordHasher};

/// Argon2id パスワードハッシャー
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    /// 既定のコスト（OWASP 推奨値）で作成
    pub fn new() -> Self {
        Self::default()
    }

    /// コストを指定して作成
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordHashError::Hash(e.to_string()))
    }

    fn verify(&self, plain: &str, hashed: &str) -> Result<bool, PasswordHashError> {
        let parsed = PasswordHash::new(hashed)
            .map_err(|e| PasswordHashError::MalformedHash(e.to_string()))?;

        match self.argon2().verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordHashError::MalformedHash(e.to_string())),
        }
    }
}
