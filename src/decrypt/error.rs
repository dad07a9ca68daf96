//! 下载链接解密错误类型

use thiserror::Error;

/// 下载链接解密错误类型
#[derive(Error, Debug)]
pub enum DecryptError {
    #[error("Base64 解码失败: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("密文长度无效: {0} 字节不是 16 的倍数")]
    BlockAlignError(usize),

    #[error("AES 密钥必须为 16 字节")]
    InvalidKeyLength,

    #[error("明文不是 ASCII 文本")]
    NotAscii,
}
