//! 悦刻云密文解密模块
//!
//! "dme.lark.data.finance.getFinancialData" 返回的下载链接以
//! SHA1PRNG(种子为租约编码)派生的 AES-128 密钥加密,该模块负责
//! 把密文还原为明文 URL。

pub mod aes;
pub mod error;
pub mod sha1prng;

// 重新导出公共类型
pub use error::DecryptError;

use base64::Engine;

/// 下载链接解密器
///
/// 构造时以租约编码派生密钥并缓存,之后可重复解密任意条密文。
pub struct PayloadDecrypter {
    key: [u8; 16],
}

impl PayloadDecrypter {
    /// 以共享密钥(租约编码)为种子创建解密器
    pub fn new(secret: &str) -> Self {
        Self {
            key: sha1prng::derive_key_bytes(secret),
        }
    }

    /// AES/ECB/NoPadding 解密一条 base64 编码的密文
    ///
    /// 悦刻云用控制字符而不是标准填充方案补齐末块,因此解密后去掉
    /// 末尾连续的 0x00..=0x1F 字节,剩余部分必须是 ASCII 文本。
    pub fn decrypt(&self, ciphertext_b64: &str) -> Result<String, DecryptError> {
        let ciphertext = base64::engine::general_purpose::STANDARD.decode(ciphertext_b64)?;
        let plaintext = aes::AesHandler::decrypt_ecb_nopad(&ciphertext, &self.key)?;

        // 末尾的控制字符是变长填充,全部剥掉
        let end = plaintext
            .iter()
            .rposition(|&b| b >= 0x20)
            .map_or(0, |i| i + 1);
        let stripped = &plaintext[..end];

        if !stripped.is_ascii() {
            return Err(DecryptError::NotAscii);
        }

        Ok(String::from_utf8_lossy(stripped).into_owned())
    }
}
