//! 配置加载模块
//!
//! 所有密钥和运行参数集中在一个 JSON 配置文件里,启动时一次性加载
//! 为不可变对象传入拉取器,核心流程不读取任何进程级环境状态。

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::FetchError;

/// 默认的开放平台网关地址
pub const DEFAULT_BASE_URL: &str =
    "https://gw.open.yuekeyun.com/openapi/param2/1/alibaba.dme.lark";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_remove_shards() -> bool {
    true
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 开放平台应用 key
    pub app_key: String,
    /// 签名密钥
    pub secret_key: String,
    /// 租约编码,同时作为下载链接解密密钥的种子
    pub lease_code: String,
    /// 影院链路 id
    pub cinema_link_id: String,
    /// 渠道编码
    pub channel_code: String,
    /// 网关地址,缺省为生产环境
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 分片与合并结果的落盘目录
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// 单次 HTTP 请求的超时秒数
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 合并完成后是否删除分片文件
    #[serde(default = "default_remove_shards")]
    pub remove_shards: bool,
}

impl AppConfig {
    /// 从 JSON 配置文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FetchError> {
        let content = fs::read_to_string(&path).map_err(|e| {
            FetchError::Config(format!(
                "无法读取配置文件 {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| FetchError::Config(format!("配置文件格式错误: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"app_key": "12345678", "secret_key": "s", "lease_code": "democs",
                "cinema_link_id": "100", "channel_code": "2001"}}"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.app_key, "12345678");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.work_dir, PathBuf::from("data"));
        assert_eq!(config.timeout_secs, 30);
        assert!(config.remove_shards);
    }

    #[test]
    fn test_missing_required_key_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"app_key": "12345678"}}"#).unwrap();

        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
        let (code, message) = err.to_code_and_message();
        assert_eq!(code, "CONFIG_ERROR");
        assert!(message.contains("secret_key"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AppConfig::load("/no/such/config.json").unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }
}
