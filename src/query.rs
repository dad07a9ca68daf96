//! 报表查询定义与输入校验

use chrono::NaiveDate;

use crate::catalog::ReportCatalog;
use crate::error::FetchError;

/// 查询的时间粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// 单日数据,日期格式 YYYY-MM-DD
    Day,
    /// 整月数据,日期格式 YYYY-MM
    Month,
}

impl Granularity {
    /// searchDateType 参数值
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Month => "month",
        }
    }

    /// 从参数字符串解析,非法值返回输入错误
    pub fn parse(value: &str) -> Result<Self, FetchError> {
        match value {
            "day" => Ok(Granularity::Day),
            "month" => Ok(Granularity::Month),
            other => Err(FetchError::InvalidTimespan(other.to_string())),
        }
    }
}

/// 一次报表查询
///
/// 构造即校验:类别必须在目录内,日期必须精确匹配粒度的格式。
/// 校验失败时不会发起任何网络请求。构造成功后不可变。
#[derive(Debug, Clone)]
pub struct ReportQuery {
    category: String,
    granularity: Granularity,
    date: String,
}

impl ReportQuery {
    pub fn new(
        category: &str,
        granularity: Granularity,
        date: &str,
        catalog: &ReportCatalog,
    ) -> Result<Self, FetchError> {
        if !catalog.contains(category) {
            return Err(FetchError::InvalidCategory(category.to_string()));
        }
        validate_date(granularity, date)?;

        Ok(Self {
            category: category.to_string(),
            granularity,
            date: date.to_string(),
        })
    }

    /// 类别编码,例如 "C13"
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// searchDate 参数值
    pub fn date(&self) -> &str {
        &self.date
    }
}

/// 日期必须能按粒度的格式解析,且序列化回来与输入逐字符一致
/// (拒绝 "2025-7-1" 这类未补零的写法)
fn validate_date(granularity: Granularity, date: &str) -> Result<(), FetchError> {
    let candidate = match granularity {
        Granularity::Day => date.to_string(),
        // NaiveDate 需要完整日期,月份粒度补上 1 号再解析
        Granularity::Month => format!("{}-01", date),
    };

    let parsed = NaiveDate::parse_from_str(&candidate, "%Y-%m-%d")
        .map_err(|_| FetchError::InvalidDate(date.to_string()))?;

    if parsed.format("%Y-%m-%d").to_string() != candidate {
        return Err(FetchError::InvalidDate(date.to_string()));
    }

    Ok(())
}

/// 一批有序的报表查询,构造保证非空
#[derive(Debug, Clone)]
pub struct QueryBatch {
    queries: Vec<ReportQuery>,
}

impl QueryBatch {
    pub fn new(first: ReportQuery) -> Self {
        Self {
            queries: vec![first],
        }
    }

    pub fn push(&mut self, query: ReportQuery) {
        self.queries.push(query);
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportQuery> {
        self.queries.iter()
    }
}
