//! 悦刻云(Yuekeyun)影院财务报表拉取库
//!
//! 对接开放平台 "alibaba.dme.lark" 网关:以 HMAC-SHA1 签名请求财务
//! 数据接口,解密响应中的下载链接(SHA1PRNG 派生的 AES-128 密钥,
//! ECB 无填充),下载 GBK 编码的报表分片并合并为按时间排序的 UTF-8
//! CSV 文件。

pub mod catalog;
pub mod config;
pub mod decrypt;
pub mod error;
pub mod fetcher;
pub mod merge;
pub mod query;
pub mod sign;

// 重新导出公共类型
pub use catalog::ReportCatalog;
pub use config::AppConfig;
pub use decrypt::{DecryptError, PayloadDecrypter};
pub use error::{ErrorKind, FetchError};
pub use fetcher::Fetcher;
pub use query::{Granularity, QueryBatch, ReportQuery};
