//! SHA1PRNG 密钥派生模块
//!
//! 复刻 Sun JCE 中 "SHA1PRNG" 以种子初始化后生成 AES-128 密钥的行为:
//! 对种子做两次 SHA-1 迭代,截取摘要前 16 字节。
//!
//! 注意: 这不是完整的 SHA1PRNG 实现,只覆盖悦刻云实际使用的
//! AES-128 场景。

use sha1::{Digest, Sha1};

/// 以 `secret` 为种子派生 16 字节 AES-128 密钥
///
/// 纯函数,同一种子永远得到同一密钥,调用方可以按种子缓存结果。
pub fn derive_key_bytes(secret: &str) -> [u8; 16] {
    let digest = Sha1::digest(secret.as_bytes());
    let digest = Sha1::digest(digest);

    let mut key = [0u8; 16];
    key.copy_from_slice(&digest[..16]);
    key
}

/// 与 [`derive_key_bytes`] 相同,返回 32 个大写十六进制字符
pub fn derive_key(secret: &str) -> String {
    hex::encode_upper(derive_key_bytes(secret))
}
