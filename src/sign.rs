//! 开放平台请求签名模块
//!
//! 按悦刻云开放平台的约定构造规范字符串并计算 HMAC-SHA1 签名。
//! 规范字符串逐字节参与网关校验,任何顺序、空格或大小写偏差都会
//! 被网关以不透明的鉴权失败拒绝。

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// 构造签名用的规范字符串
///
/// 前缀固定为 `param2/1/alibaba.dme.lark/{api_name}/{app_key}`,之后
/// 把所有参数按键名升序(区分大小写)以 `键值` 直接拼接,不加任何
/// 分隔符。`_aop_signature` 本身不参与拼接,由调用方在签名完成后
/// 再写入参数表;毫秒时间戳和其余参数全部参与。
fn canonical_string(api_name: &str, params: &HashMap<String, String>, app_key: &str) -> String {
    let mut canonical = format!("param2/1/alibaba.dme.lark/{}/{}", api_name, app_key);

    let mut pairs: Vec<_> = params.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    for (key, value) in pairs {
        canonical.push_str(key);
        canonical.push_str(value);
    }

    canonical
}

/// 计算请求签名,返回大写十六进制的 HMAC-SHA1 值
pub fn sign(
    api_name: &str,
    params: &HashMap<String, String>,
    app_key: &str,
    secret_key: &str,
) -> String {
    let canonical = canonical_string(api_name, params, app_key);

    // HMAC 接受任意长度的密钥,new_from_slice 不会失败
    let mut mac =
        HmacSha1::new_from_slice(secret_key.as_bytes()).expect("HMAC 接受任意长度密钥");
    mac.update(canonical.as_bytes());

    hex::encode_upper(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_NAME: &str = "dme.lark.data.finance.getFinancialData";
    const APP_KEY: &str = "12345678";
    const SECRET_KEY: &str = "abcdef0123456789";

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_canonical_string_sorts_keys() {
        // 插入顺序是 b 在前,规范字符串必须按键名升序输出 a1b2
        let canonical = canonical_string(API_NAME, &params(&[("b", "2"), ("a", "1")]), APP_KEY);
        assert_eq!(
            canonical,
            "param2/1/alibaba.dme.lark/dme.lark.data.finance.getFinancialData/12345678a1b2"
        );
    }

    #[test]
    fn test_sign_known_vector() {
        let signature = sign(
            API_NAME,
            &params(&[("b", "2"), ("a", "1")]),
            APP_KEY,
            SECRET_KEY,
        );
        assert_eq!(signature, "E3E89C79A189624BA815BD72A384EA2997BFB43B");
    }

    #[test]
    fn test_sign_full_parameter_set() {
        let query = params(&[
            ("leaseCode", "democs"),
            ("cinemaLinkId", "100"),
            ("_aop_timestamp", "1700000000000"),
            ("channelCode", "2001"),
            ("dataType", "C01"),
            ("searchDateType", "day"),
            ("searchDate", "2023-01-01"),
        ]);
        let signature = sign(API_NAME, &query, APP_KEY, SECRET_KEY);
        assert_eq!(signature, "AB43075950982DDFAA6EA045869BF86D0126C3EA");
    }

    #[test]
    fn test_sign_deterministic_with_fixed_timestamp() {
        let query = params(&[("_aop_timestamp", "1700000000000"), ("dataType", "C01")]);
        assert_eq!(
            sign(API_NAME, &query, APP_KEY, SECRET_KEY),
            sign(API_NAME, &query, APP_KEY, SECRET_KEY)
        );
    }

    #[test]
    fn test_signature_parameter_changes_canonical_string() {
        // 签名参数写回后不能参与二次签名
        let without = params(&[("a", "1")]);
        let mut with = without.clone();
        with.insert("_aop_signature".to_string(), "FFFF".to_string());
        assert_ne!(
            canonical_string(API_NAME, &without, APP_KEY),
            canonical_string(API_NAME, &with, APP_KEY)
        );
    }
}
