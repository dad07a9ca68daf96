//! 报表分片合并与排序模块
//!
//! 一次查询可能返回多个下载链接,每个链接对应一个分片文件。该模块
//! 把所有分片合并为一个 CSV,再按配置的时间戳列升序重写。

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};

use crate::error::FetchError;

/// 排序所用时间戳的格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 读取分片并去掉注释行(以 # 开头)
fn read_filtered_lines(path: &Path) -> Result<Vec<String>, FetchError> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// 把一个查询的所有分片合并为一个 CSV
///
/// 每个分片去掉注释行后,前两行是标记行和表头;表头只保留第一个
/// 分片的,数据行(第三行起)按分片顺序全部追加,包括第一个分片。
/// 任何分片不足两行都视为整批数据的格式错误。
pub fn combine_shards(shard_paths: &[PathBuf], output_path: &Path) -> Result<(), FetchError> {
    if shard_paths.is_empty() {
        return Err(FetchError::MalformedResponse(
            "没有可合并的分片".to_string(),
        ));
    }

    let mut output = String::new();

    for (index, path) in shard_paths.iter().enumerate() {
        let lines = read_filtered_lines(path)?;
        if lines.len() < 2 {
            return Err(FetchError::MalformedResponse(format!(
                "分片 {} 行数不足,无法提取表头",
                path.display()
            )));
        }

        if index == 0 {
            output.push_str(&lines[1]);
            output.push('\n');
        }

        for line in &lines[2..] {
            output.push_str(line);
            output.push('\n');
        }
    }

    fs::write(output_path, output.as_bytes())?;
    Ok(())
}

/// 按配置的时间戳列把合并结果升序排序后原地重写
///
/// 时间戳解析失败的行按空值排在所有有效行之前,不会中断流程。
/// 重写时所有字段都加引号;能解析的时间戳按标准格式重新序列化,
/// 解析失败的值写为空字符串。
pub fn order_by_time(path: &Path, timestamp_column: usize) -> Result<(), FetchError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    let header = reader
        .headers()
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))?
        .clone();

    let mut rows: Vec<(Option<NaiveDateTime>, csv::StringRecord)> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
        let parsed = record
            .get(timestamp_column)
            .and_then(|value| NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok());
        rows.push((parsed, record));
    }
    drop(reader);

    // Option 的排序让 None(解析失败)排在所有 Some 之前
    rows.sort_by_key(|(timestamp, _)| *timestamp);

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_path(path)
        .map_err(|e| FetchError::FileSystem(e.to_string()))?;

    writer
        .write_record(&header)
        .map_err(|e| FetchError::FileSystem(e.to_string()))?;

    for (timestamp, record) in rows {
        let fields: Vec<String> = record
            .iter()
            .enumerate()
            .map(|(index, value)| {
                if index == timestamp_column {
                    timestamp
                        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                        .unwrap_or_default()
                } else {
                    value.to_string()
                }
            })
            .collect();
        writer
            .write_record(&fields)
            .map_err(|e| FetchError::FileSystem(e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| FetchError::FileSystem(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_shard(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_combine_single_shard() {
        let dir = TempDir::new().unwrap();
        let shard = write_shard(
            &dir,
            "part0.csv",
            "#说明\n影票销售明细\n售票时间,金额\n2025-07-01 10:00:00,30\n",
        );
        let output = dir.path().join("out.csv");

        combine_shards(&[shard], &output).unwrap();

        // 表头取自第一个分片,数据行只出现一次
        let merged = fs::read_to_string(&output).unwrap();
        assert_eq!(merged, "售票时间,金额\n2025-07-01 10:00:00,30\n");
    }

    #[test]
    fn test_combine_multiple_shards_keeps_header_once() {
        let dir = TempDir::new().unwrap();
        let shard0 = write_shard(&dir, "part0.csv", "标记\n售票时间,金额\na,1\nb,2\n");
        let shard1 = write_shard(&dir, "part1.csv", "标记\n售票时间,金额\nc,3\n");
        let output = dir.path().join("out.csv");

        combine_shards(&[shard0, shard1], &output).unwrap();

        let merged = fs::read_to_string(&output).unwrap();
        assert_eq!(merged, "售票时间,金额\na,1\nb,2\nc,3\n");
    }

    #[test]
    fn test_combine_drops_comment_lines_everywhere() {
        let dir = TempDir::new().unwrap();
        let shard = write_shard(
            &dir,
            "part0.csv",
            "#注释一\n标记\n#注释二\n售票时间,金额\na,1\n#尾部注释\n",
        );
        let output = dir.path().join("out.csv");

        combine_shards(&[shard], &output).unwrap();

        let merged = fs::read_to_string(&output).unwrap();
        assert_eq!(merged, "售票时间,金额\na,1\n");
    }

    #[test]
    fn test_short_shard_is_fatal() {
        let dir = TempDir::new().unwrap();
        let shard0 = write_shard(&dir, "part0.csv", "标记\n售票时间,金额\na,1\n");
        let shard1 = write_shard(&dir, "part1.csv", "#只有注释\n一行\n");
        let output = dir.path().join("out.csv");

        let err = combine_shards(&[shard0, shard1], &output).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn test_empty_shard_list_is_error() {
        let dir = TempDir::new().unwrap();
        let err = combine_shards(&[], &dir.path().join("out.csv")).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn test_order_by_time_sorts_ascending() {
        let dir = TempDir::new().unwrap();
        let path = write_shard(
            &dir,
            "merged.csv",
            "售票时间,金额\n2025-07-02 09:30:00,20\n2025-07-01 10:00:00,30\n2025-07-01 23:59:59,10\n",
        );

        order_by_time(&path, 0).unwrap();

        let sorted = fs::read_to_string(&path).unwrap();
        assert_eq!(
            sorted,
            "\"售票时间\",\"金额\"\n\
             \"2025-07-01 10:00:00\",\"30\"\n\
             \"2025-07-01 23:59:59\",\"10\"\n\
             \"2025-07-02 09:30:00\",\"20\"\n"
        );
    }

    #[test]
    fn test_order_by_time_malformed_timestamps_sort_first() {
        let dir = TempDir::new().unwrap();
        let path = write_shard(
            &dir,
            "merged.csv",
            "售票时间,金额\n2025-07-01 10:00:00,30\n不是时间,99\n",
        );

        order_by_time(&path, 0).unwrap();

        let sorted = fs::read_to_string(&path).unwrap();
        // 解析失败的行排在最前,时间戳列写为空字符串
        assert_eq!(
            sorted,
            "\"售票时间\",\"金额\"\n\
             \"\",\"99\"\n\
             \"2025-07-01 10:00:00\",\"30\"\n"
        );
    }

    #[test]
    fn test_order_by_time_respects_configured_column() {
        let dir = TempDir::new().unwrap();
        let path = write_shard(
            &dir,
            "merged.csv",
            "卡号,激活时间\nB,2025-07-02 00:00:00\nA,2025-07-01 00:00:00\n",
        );

        order_by_time(&path, 1).unwrap();

        let sorted = fs::read_to_string(&path).unwrap();
        assert_eq!(
            sorted,
            "\"卡号\",\"激活时间\"\n\
             \"A\",\"2025-07-01 00:00:00\"\n\
             \"B\",\"2025-07-02 00:00:00\"\n"
        );
    }
}
