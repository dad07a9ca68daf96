//! 报表类别目录与字段结构
//!
//! 悦刻云的财务数据接口以固定的类别编码(C01..C23)区分报表种类。
//! 编码目录内置在代码里;每个类别的列定义和排序用的时间戳列下标
//! 则从 schemas.json 读取,未配置的类别退回内置名称和第 0 列。

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::FetchError;

/// 固定的财务报表类别目录
pub const FINANCIAL_CATEGORIES: [(&str, &str); 23] = [
    ("C01", "影票销售明细"),
    ("C02", "商品订单数据"),
    ("C03", "影票退票明细"),
    ("C04", "商品退货明细"),
    ("C05", "会员卡充值明细"),
    ("C06", "会员卡消费明细"),
    ("C07", "卖品销售汇总"),
    ("C08", "票房收入汇总"),
    ("C09", "场次排映计划"),
    ("C10", "影厅上座统计"),
    ("C11", "优惠券核销明细"),
    ("C12", "储值卡发卡明细"),
    ("C13", "会员卡激活数据"),
    ("C14", "会员积分变动明细"),
    ("C15", "网售出票明细"),
    ("C16", "现金收银对账"),
    ("C17", "支付渠道对账"),
    ("C18", "影片分账结算"),
    ("C19", "广告卖品结算"),
    ("C20", "团体票销售明细"),
    ("C21", "套餐销售明细"),
    ("C22", "会员卡退卡明细"),
    ("C23", "日营业汇总"),
];

/// 单个报表类别的字段结构
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSchema {
    /// 类别名称,用于目录与文件命名
    pub name: String,
    /// 列名列表
    #[serde(default)]
    pub columns: Vec<String>,
    /// 排序所用时间戳列的下标
    #[serde(default)]
    pub timestamp_column: usize,
}

/// 报表类别目录
#[derive(Debug)]
pub struct ReportCatalog {
    schemas: HashMap<String, ReportSchema>,
}

impl ReportCatalog {
    /// 仅使用内置目录创建,所有类别按第 0 列排序
    pub fn builtin() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// 从 schemas.json 加载字段结构
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FetchError> {
        let content = fs::read_to_string(&path).map_err(|e| {
            FetchError::Config(format!("无法读取 {}: {}", path.as_ref().display(), e))
        })?;
        let schemas = serde_json::from_str(&content)
            .map_err(|e| FetchError::Config(format!("schemas 文件格式错误: {}", e)))?;

        Ok(Self { schemas })
    }

    /// 类别编码是否在固定目录内
    pub fn contains(&self, category: &str) -> bool {
        FINANCIAL_CATEGORIES
            .iter()
            .any(|(code, _)| *code == category)
    }

    /// 类别名称,schemas 配置优先于内置目录
    pub fn name_of(&self, category: &str) -> Option<&str> {
        if let Some(schema) = self.schemas.get(category) {
            return Some(&schema.name);
        }
        FINANCIAL_CATEGORIES
            .iter()
            .find(|(code, _)| *code == category)
            .map(|(_, name)| *name)
    }

    /// 类别的列定义,未配置时为空
    pub fn columns_of(&self, category: &str) -> &[String] {
        self.schemas
            .get(category)
            .map_or(&[], |schema| schema.columns.as_slice())
    }

    /// 排序所用时间戳列下标,未配置时默认第 0 列
    pub fn timestamp_column(&self, category: &str) -> usize {
        self.schemas
            .get(category)
            .map_or(0, |schema| schema.timestamp_column)
    }
}
