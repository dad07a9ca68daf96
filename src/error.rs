//! 统一的拉取流程错误处理模块
//!
//! 该模块定义了拉取流程中所有可能的错误类型,为整个流程提供一致
//! 的错误处理机制。

use thiserror::Error;

use crate::decrypt::DecryptError;

/// 错误大类
///
/// 调用方按大类决定处理策略:输入错误修正后再试,网络错误可以原样
/// 重试整个查询,鉴权与数据错误需要排查请求构造或数据质量。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 输入或配置错误,原样重试必然再次失败
    InvalidInput,
    /// 签名被网关拒绝,需检查规范字符串构造
    AuthOrSignature,
    /// 传输、超时或非 2xx 状态,可整查询重试
    Network,
    /// 响应结构、密文或分片内容不符合预期
    MalformedResponse,
    /// 文件写入或删除失败
    FileSystem,
}

/// 拉取流程错误类型
///
/// 统一管理来自所有子模块的错误,包括:
/// - 输入校验错误
/// - 网关请求与鉴权错误
/// - 响应数据与解密错误
/// - 文件系统操作错误
#[derive(Error, Debug)]
pub enum FetchError {
    // ===== 输入校验错误 =====
    #[error("财务类别编码无效: {0}")]
    InvalidCategory(String),

    #[error("时间跨度无效,只能为 'month' 或 'day': {0}")]
    InvalidTimespan(String),

    #[error("日期格式无效: {0}")]
    InvalidDate(String),

    #[error("配置错误: {0}")]
    Config(String),

    // ===== 网关错误 =====
    #[error("签名被网关拒绝: {0}")]
    AuthRejected(String),

    #[error("网络请求失败: {0}")]
    Network(String),

    // ===== 响应数据错误 =====
    #[error("响应数据格式错误: {0}")]
    MalformedResponse(String),

    #[error("下载链接解密失败: {0}")]
    Decrypt(#[from] DecryptError),

    // ===== 文件系统错误 =====
    #[error("文件操作失败: {0}")]
    FileSystem(String),
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::FileSystem(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // 网关对签名错误只返回 401/403,不给出具体原因
        match err.status() {
            Some(status) if status == reqwest::StatusCode::UNAUTHORIZED => {
                FetchError::AuthRejected(err.to_string())
            }
            Some(status) if status == reqwest::StatusCode::FORBIDDEN => {
                FetchError::AuthRejected(err.to_string())
            }
            _ => FetchError::Network(err.to_string()),
        }
    }
}

impl FetchError {
    /// 错误所属大类
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidCategory(_)
            | FetchError::InvalidTimespan(_)
            | FetchError::InvalidDate(_)
            | FetchError::Config(_) => ErrorKind::InvalidInput,
            FetchError::AuthRejected(_) => ErrorKind::AuthOrSignature,
            FetchError::Network(_) => ErrorKind::Network,
            FetchError::MalformedResponse(_) | FetchError::Decrypt(_) => {
                ErrorKind::MalformedResponse
            }
            FetchError::FileSystem(_) => ErrorKind::FileSystem,
        }
    }

    /// 原样重试是否有意义
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network)
    }

    /// 将错误转换为错误代码和消息
    pub fn to_code_and_message(&self) -> (String, String) {
        match self {
            FetchError::InvalidCategory(code) => (
                "INVALID_CATEGORY".to_string(),
                format!("财务类别编码无效: {}", code),
            ),
            FetchError::InvalidTimespan(span) => (
                "INVALID_TIMESPAN".to_string(),
                format!("时间跨度无效: {}", span),
            ),
            FetchError::InvalidDate(date) => (
                "INVALID_DATE".to_string(),
                format!("日期格式无效: {}", date),
            ),
            FetchError::Config(msg) => ("CONFIG_ERROR".to_string(), format!("配置错误: {}", msg)),
            FetchError::AuthRejected(msg) => (
                "AUTH_REJECTED".to_string(),
                format!("签名被网关拒绝: {}", msg),
            ),
            FetchError::Network(msg) => (
                "NETWORK_ERROR".to_string(),
                format!("网络请求失败: {}", msg),
            ),
            FetchError::MalformedResponse(msg) => (
                "MALFORMED_RESPONSE".to_string(),
                format!("响应数据格式错误: {}", msg),
            ),
            FetchError::Decrypt(err) => (
                "DECRYPT_ERROR".to_string(),
                format!("下载链接解密失败: {}", err),
            ),
            FetchError::FileSystem(msg) => (
                "FILE_SYSTEM_ERROR".to_string(),
                format!("文件操作失败: {}", msg),
            ),
        }
    }

    /// 记录错误到日志
    pub fn log(&self) {
        let (code, message) = self.to_code_and_message();
        log::error!("[{}] {}", code, message);
    }
}
