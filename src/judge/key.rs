//! 评测结果缓存键
//!
//! 提交内容序列化为 JSON 后经 DEFLATE 压缩，再做无填充的 base64url 编码。
//! 相同提交得到相同的键。键可以还原出源码和隐藏用例，不能离开服务端；
//! 响应头、报告和结果查询接口使用键的 SHA-256 句柄。

use std::io::Write;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use flate2::{Compression, write::DeflateEncoder};
use sha2::{Digest, Sha256};

use crate::errors::Result;
use crate::models::judge::entities::JudgeSubmission;

pub fn submission_key(submission: &JudgeSubmission) -> Result<String> {
    let json = serde_json::to_vec(submission)?;

    let mut encoder = DeflateEncoder::new(Vec::with_capacity(json.len() / 2), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// 键对应的对外句柄，64 位小写十六进制
pub fn result_handle(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

pub fn is_result_handle(raw: &str) -> bool {
    raw.len() == 64 && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::questions::entities::TestCase;

    fn submission(source: &str) -> JudgeSubmission {
        JudgeSubmission {
            language: "python".to_string(),
            source_code: source.to_string(),
            test_cases: vec![
                TestCase {
                    input: "1 2\n".to_string(),
                    expected_output: "3\n".to_string(),
                    hidden: false,
                },
                TestCase {
                    input: "5 5\n".to_string(),
                    expected_output: "10\n".to_string(),
                    hidden: true,
                },
            ],
            time_limit_ms: Some(2000),
            memory_limit_kb: None,
        }
    }

    #[test]
    fn test_same_submission_same_key() {
        let a = submission_key(&submission("print(sum(map(int, input().split())))")).unwrap();
        let b = submission_key(&submission("print(sum(map(int, input().split())))")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_source_different_key() {
        let a = submission_key(&submission("print(1)")).unwrap();
        let b = submission_key(&submission("print(2)")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_limits_affect_key() {
        let mut other = submission("print(1)");
        other.time_limit_ms = Some(1000);
        let a = submission_key(&submission("print(1)")).unwrap();
        let b = submission_key(&other).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_handle_is_stable_digest() {
        let key = submission_key(&submission("print(1)")).unwrap();
        let handle = result_handle(&key);
        assert_eq!(handle, result_handle(&key));
        assert!(is_result_handle(&handle));
        assert!(!is_result_handle(&key));
        assert!(!is_result_handle(&handle.to_uppercase()));
    }

    #[test]
    fn test_key_is_url_safe() {
        let key = submission_key(&submission("a = '???>>>'\nprint(a)")).unwrap();
        assert!(!key.is_empty());
        assert!(
            key.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
