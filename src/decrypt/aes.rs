//! AES 解密模块

use super::error::DecryptError;

#[allow(deprecated)]
use aes::cipher::{generic_array::GenericArray, BlockDecrypt, KeyInit};
use aes::Aes128;

/// AES 解密处理器
pub struct AesHandler;

impl AesHandler {
    pub const BLOCK_SIZE: usize = 16;

    /// AES-128-ECB 无填充解密
    ///
    /// 悦刻云不使用 PKCS#7,密文必须恰好是整块的,解密结果按原样返回,
    /// 末尾的填充字节由调用方处理。
    #[allow(deprecated)]
    pub fn decrypt_ecb_nopad(data: &[u8], key: &[u8]) -> Result<Vec<u8>, DecryptError> {
        if key.len() != 16 {
            return Err(DecryptError::InvalidKeyLength);
        }

        if data.len() % Self::BLOCK_SIZE != 0 {
            return Err(DecryptError::BlockAlignError(data.len()));
        }

        // 使用 new_from_slice 避免直接构造 GenericArray 以提升兼容性
        let cipher = Aes128::new_from_slice(key).map_err(|_| DecryptError::InvalidKeyLength)?;

        let mut result = data.to_vec();

        // 按块解密
        for chunk in result.chunks_exact_mut(Self::BLOCK_SIZE) {
            let block = GenericArray::from_mut_slice(chunk);
            cipher.decrypt_block(block);
        }

        Ok(result)
    }
}
