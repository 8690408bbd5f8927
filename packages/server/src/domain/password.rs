//! パスワードハッシュの抽象化
//!
//! ハッシュ方式は外部の関心事。ドメイン層は照合結果だけを必要とします。

use super::PasswordHashError;

pub trait PasswordHasher: Send + Sync {
    /// 平文からストアに保存する文字列を作る
    fn hash(&self, plain: &str) -> Result<String, PasswordHashError>;

    /// 平文が保存済みハッシュと一致するか
    ///
    /// 不一致は `Ok(false)`。保存値が読めない場合はエラーを返します。
    fn verify(&self, plain: &str, hashed: &str) -> Result<bool, PasswordHashError>;
}
