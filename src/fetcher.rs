//! 财务报表拉取流程
//!
//! 封装对 "dme.lark.data.finance.getFinancialData" 的完整调用:
//! 签名请求、提取加密下载链接、逐条解密下载、GBK 转码、分片合并
//! 与按时间排序。任何一步失败都会清理本次查询已落盘的分片,不留
//! 部分成功的结果。
//!
//! 整个流程是单线程阻塞式的:一个查询处理完才开始下一个,分片也
//! 按网关返回的顺序逐条下载。超时只约束单次 HTTP 请求,失败的查
//! 询由调用方整体重试。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::catalog::ReportCatalog;
use crate::config::AppConfig;
use crate::decrypt::PayloadDecrypter;
use crate::error::FetchError;
use crate::merge;
use crate::query::{QueryBatch, ReportQuery};
use crate::sign;

/// 财务数据接口名
pub const API_NAME: &str = "dme.lark.data.finance.getFinancialData";

/// 接口响应外层信封,只关心下载链接列表
#[derive(Deserialize)]
struct Envelope {
    data: Option<EnvelopeData>,
}

#[derive(Deserialize)]
struct EnvelopeData {
    #[serde(rename = "bizData")]
    biz_data: Option<BizData>,
}

#[derive(Deserialize)]
struct BizData {
    #[serde(rename = "downloadUrlList")]
    download_url_list: Option<Vec<String>>,
}

/// 把悦刻云返回的 GBK 字节转成 UTF-8 文本
///
/// 转码必须在任何文本处理之前完成,错误的转码会悄悄破坏非 ASCII
/// 字段,所以无法完整解码时直接视为数据质量错误。
fn transcode_gbk(raw: &[u8]) -> Result<String, FetchError> {
    let (text, _, had_errors) = encoding_rs::GBK.decode(raw);
    if had_errors {
        return Err(FetchError::MalformedResponse(
            "分片内容不是合法的 GBK 文本".to_string(),
        ));
    }
    Ok(text.into_owned())
}

/// 按逆序删除本次查询已写入的分片文件
fn clear_files(files: &mut Vec<PathBuf>) {
    while let Some(path) = files.pop() {
        if let Err(err) = fs::remove_file(&path) {
            log::warn!("清理分片失败 {}: {}", path.display(), err);
        }
    }
}

/// 财务报表拉取器
///
/// 持有不可变配置、报表目录和一个带超时的阻塞 HTTP 客户端。
pub struct Fetcher {
    config: AppConfig,
    catalog: ReportCatalog,
    client: Client,
}

impl Fetcher {
    /// 以不可变配置与报表目录创建拉取器
    pub fn new(config: AppConfig, catalog: ReportCatalog) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            config,
            catalog,
            client,
        })
    }

    /// 当前毫秒级 Unix 时间戳
    fn timestamp_ms() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis())
    }

    /// 构建本次请求的查询参数(含新鲜时间戳,不含签名)
    fn build_query_parameters(&self, query: &ReportQuery) -> HashMap<String, String> {
        HashMap::from([
            ("leaseCode".to_string(), self.config.lease_code.clone()),
            (
                "cinemaLinkId".to_string(),
                self.config.cinema_link_id.clone(),
            ),
            (
                "_aop_timestamp".to_string(),
                Self::timestamp_ms().to_string(),
            ),
            ("channelCode".to_string(), self.config.channel_code.clone()),
            ("dataType".to_string(), query.category().to_string()),
            (
                "searchDateType".to_string(),
                query.granularity().as_str().to_string(),
            ),
            ("searchDate".to_string(), query.date().to_string()),
        ])
    }

    /// 发起签名请求并取回加密的下载链接列表
    ///
    /// 列表为空或字段缺失都是合法的空结果,返回空列表而不是错误。
    fn request_download_urls(&self, query: &ReportQuery) -> Result<Vec<String>, FetchError> {
        let mut params = self.build_query_parameters(query);
        let signature = sign::sign(
            API_NAME,
            &params,
            &self.config.app_key,
            &self.config.secret_key,
        );
        params.insert("_aop_signature".to_string(), signature);

        let url = format!("{}/{}/{}", self.config.base_url, API_NAME, self.config.app_key);
        log::debug!("请求 {}", url);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()?
            .error_for_status()?;
        let body = response.text()?;

        let envelope: Envelope = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedResponse(format!("响应不是合法 JSON: {}", e)))?;

        let urls = envelope
            .data
            .and_then(|data| data.biz_data)
            .and_then(|biz| biz.download_url_list)
            .unwrap_or_default();

        log::info!("取得 {} 条下载链接", urls.len());
        Ok(urls)
    }

    /// 解密并下载一条链接,转码后写入分片文件,返回文件路径
    fn download_one(
        &self,
        secret_url: &str,
        decrypter: &PayloadDecrypter,
        shard_dir: &Path,
        report_name: &str,
        search_date: &str,
        shard_id: usize,
    ) -> Result<PathBuf, FetchError> {
        let url = decrypter.decrypt(secret_url)?;

        let response = self.client.get(&url).send()?.error_for_status()?;
        let raw = response.bytes()?;

        let text = transcode_gbk(&raw)?;

        let path = shard_dir.join(format!("{}_({})_part{}.csv", report_name, search_date, shard_id));
        if let Err(err) = fs::write(&path, text.as_bytes()) {
            // 半写的文件也不能留下
            let _ = fs::remove_file(&path);
            return Err(err.into());
        }

        log::debug!("分片已写入 {}", path.display());
        Ok(path)
    }

    /// 逐条解密下载链接并落盘
    ///
    /// 任何一条失败都会把本次已写入的分片全部删除后再抛错。
    fn download_shards(
        &self,
        encrypted_urls: &[String],
        decrypter: &PayloadDecrypter,
        shard_dir: &Path,
        report_name: &str,
        search_date: &str,
    ) -> Result<Vec<PathBuf>, FetchError> {
        let mut shard_paths: Vec<PathBuf> = Vec::new();

        for (shard_id, secret_url) in encrypted_urls.iter().enumerate() {
            match self.download_one(
                secret_url,
                decrypter,
                shard_dir,
                report_name,
                search_date,
                shard_id,
            ) {
                Ok(path) => shard_paths.push(path),
                Err(err) => {
                    clear_files(&mut shard_paths);
                    return Err(err);
                }
            }
        }

        Ok(shard_paths)
    }

    /// 合并所有分片并按时间戳列排序
    fn merge_and_order(
        &self,
        shard_paths: &[PathBuf],
        output_path: &Path,
        category: &str,
    ) -> Result<(), FetchError> {
        merge::combine_shards(shard_paths, output_path)?;
        merge::order_by_time(output_path, self.catalog.timestamp_column(category))
    }

    /// 拉取一个查询的财务数据,返回合并排序后的 CSV 路径
    ///
    /// 下载链接列表为空是合法的空结果,返回 `Ok(None)`。失败时已
    /// 落盘的分片(以及可能生成了一半的合并文件)都会被删除。
    pub fn fetch(&self, query: &ReportQuery) -> Result<Option<PathBuf>, FetchError> {
        let report_name = self
            .catalog
            .name_of(query.category())
            .unwrap_or(query.category())
            .to_string();

        log::info!(
            "开始拉取 {} ({} {})",
            report_name,
            query.granularity().as_str(),
            query.date()
        );

        let encrypted_urls = self.request_download_urls(query)?;
        if encrypted_urls.is_empty() {
            log::warn!("{} 没有可下载的数据", report_name);
            return Ok(None);
        }

        let shard_dir = self.config.work_dir.join(&report_name);
        fs::create_dir_all(&shard_dir)?;

        let decrypter = PayloadDecrypter::new(&self.config.lease_code);
        let mut shard_paths = self.download_shards(
            &encrypted_urls,
            &decrypter,
            &shard_dir,
            &report_name,
            query.date(),
        )?;

        let output_path = shard_dir.join(format!("{}_({}).csv", report_name, query.date()));
        if let Err(err) = self.merge_and_order(&shard_paths, &output_path, query.category()) {
            let _ = fs::remove_file(&output_path);
            clear_files(&mut shard_paths);
            return Err(err);
        }

        if self.config.remove_shards {
            clear_files(&mut shard_paths);
        }

        log::info!("拉取完成: {}", output_path.display());
        Ok(Some(output_path))
    }

    /// 依次处理一批查询
    ///
    /// 单个查询失败只记录日志并继续下一个,结果按查询顺序返回。
    pub fn fetch_batch(&self, batch: &QueryBatch) -> Vec<Result<Option<PathBuf>, FetchError>> {
        batch
            .iter()
            .map(|query| {
                let result = self.fetch(query);
                if let Err(err) = &result {
                    err.log();
                }
                result
            })
            .collect()
    }
}
