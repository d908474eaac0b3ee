use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const MAX_TEST_CASES: usize = 50;
pub const MAX_POINTS: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question.ts")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    /// 隐藏用例不向学生展示输入输出
    #[serde(default)]
    pub hidden: bool,
}

/// 题型相关字段，以 `type` 字段区分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/question.ts")]
pub enum QuestionDetails {
    MultipleChoice {
        options: Vec<String>,
        /// 正确选项下标，学生视图中为空
        #[serde(default)]
        answers: Vec<usize>,
        #[serde(default)]
        allow_multiple: bool,
    },
    ShortAnswer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference_answer: Option<String>,
    },
    Coding {
        language: String,
        #[serde(default)]
        starter_code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_limit_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        memory_limit_kb: Option<u64>,
        test_cases: Vec<TestCase>,
    },
}

impl QuestionDetails {
    pub const MULTIPLE_CHOICE: &'static str = "multiple_choice";
    pub const SHORT_ANSWER: &'static str = "short_answer";
    pub const CODING: &'static str = "coding";

    pub fn kind(&self) -> &'static str {
        match self {
            QuestionDetails::MultipleChoice { .. } => Self::MULTIPLE_CHOICE,
            QuestionDetails::ShortAnswer { .. } => Self::SHORT_ANSWER,
            QuestionDetails::Coding { .. } => Self::CODING,
        }
    }

    /// 校验题型字段，`language_supported` 判断编程题语言是否已在评测机配置中
    pub fn validate(&self, language_supported: impl Fn(&str) -> bool) -> Result<(), String> {
        match self {
            QuestionDetails::MultipleChoice {
                options,
                answers,
                allow_multiple,
            } => {
                if options.len() < 2 {
                    return Err("Multiple choice question needs at least 2 options".to_string());
                }
                if options.iter().any(|o| o.trim().is_empty()) {
                    return Err("Options must not be empty".to_string());
                }
                if answers.is_empty() {
                    return Err("At least one answer is required".to_string());
                }
                if let Some(out_of_range) = answers.iter().find(|&&a| a >= options.len()) {
                    return Err(format!("Answer index {out_of_range} is out of range"));
                }
                let mut unique = answers.clone();
                unique.sort_unstable();
                unique.dedup();
                if unique.len() != answers.len() {
                    return Err("Answers must be unique".to_string());
                }
                if !allow_multiple && answers.len() > 1 {
                    return Err(
                        "Only one answer is allowed unless allow_multiple is set".to_string(),
                    );
                }
                Ok(())
            }
            QuestionDetails::ShortAnswer { .. } => Ok(()),
            QuestionDetails::Coding {
                language,
                time_limit_ms,
                memory_limit_kb,
                test_cases,
                ..
            } => {
                if !language_supported(language) {
                    return Err(format!("Language '{language}' is not supported by the judge"));
                }
                if test_cases.is_empty() {
                    return Err("Coding question needs at least one test case".to_string());
                }
                if test_cases.len() > MAX_TEST_CASES {
                    return Err(format!(
                        "Coding question supports at most {MAX_TEST_CASES} test cases"
                    ));
                }
                if *time_limit_ms == Some(0) || *memory_limit_kb == Some(0) {
                    return Err("Resource limits must be positive".to_string());
                }
                Ok(())
            }
        }
    }

    /// 去掉答案相关字段的学生视图
    pub fn redacted(&self) -> QuestionDetails {
        match self {
            QuestionDetails::MultipleChoice {
                options,
                allow_multiple,
                ..
            } => QuestionDetails::MultipleChoice {
                options: options.clone(),
                answers: Vec::new(),
                allow_multiple: *allow_multiple,
            },
            QuestionDetails::ShortAnswer { .. } => QuestionDetails::ShortAnswer {
                reference_answer: None,
            },
            QuestionDetails::Coding {
                language,
                starter_code,
                time_limit_ms,
                memory_limit_kb,
                test_cases,
            } => QuestionDetails::Coding {
                language: language.clone(),
                starter_code: starter_code.clone(),
                time_limit_ms: *time_limit_ms,
                memory_limit_kb: *memory_limit_kb,
                test_cases: test_cases.iter().filter(|c| !c.hidden).cloned().collect(),
            },
        }
    }

    /// 选择题判分：所选集合与答案集合完全一致才算正确。非选择题返回 None
    pub fn check_choice(&self, selected: &[usize]) -> Option<bool> {
        match self {
            QuestionDetails::MultipleChoice { answers, .. } => {
                let mut selected = selected.to_vec();
                selected.sort_unstable();
                selected.dedup();
                let mut expected = answers.clone();
                expected.sort_unstable();
                Some(selected == expected)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question.ts")]
pub struct Question {
    pub id: i64,
    pub material_id: i64,
    pub prompt: String,
    pub position: i32,
    pub points: f64,
    pub details: QuestionDetails,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Question {
    pub fn redacted(mut self) -> Self {
        self.details = self.details.redacted();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(options: &[&str], answers: &[usize], allow_multiple: bool) -> QuestionDetails {
        QuestionDetails::MultipleChoice {
            options: options.iter().map(|s| s.to_string()).collect(),
            answers: answers.to_vec(),
            allow_multiple,
        }
    }

    fn coding(cases: usize) -> QuestionDetails {
        QuestionDetails::Coding {
            language: "python".to_string(),
            starter_code: String::new(),
            time_limit_ms: None,
            memory_limit_kb: None,
            test_cases: (0..cases)
                .map(|i| TestCase {
                    input: format!("{i}"),
                    expected_output: format!("{i}"),
                    hidden: i % 2 == 1,
                })
                .collect(),
        }
    }

    fn any_language(_: &str) -> bool {
        true
    }

    #[test]
    fn test_multiple_choice_validation() {
        assert!(choice(&["a", "b"], &[0], false).validate(any_language).is_ok());
        assert!(choice(&["a", "b", "c"], &[0, 2], true).validate(any_language).is_ok());
        assert!(choice(&["a"], &[0], false).validate(any_language).is_err());
        assert!(choice(&["a", " "], &[0], false).validate(any_language).is_err());
        assert!(choice(&["a", "b"], &[], false).validate(any_language).is_err());
        assert!(choice(&["a", "b"], &[2], false).validate(any_language).is_err());
        assert!(choice(&["a", "b"], &[1, 1], true).validate(any_language).is_err());
        assert!(choice(&["a", "b"], &[0, 1], false).validate(any_language).is_err());
    }

    #[test]
    fn test_coding_validation() {
        assert!(coding(1).validate(any_language).is_ok());
        assert!(coding(0).validate(any_language).is_err());
        assert!(coding(MAX_TEST_CASES + 1).validate(any_language).is_err());
        assert!(coding(1).validate(|lang| lang == "rust").is_err());
    }

    #[test]
    fn test_details_tagged_json() {
        let details: QuestionDetails = serde_json::from_str(
            r#"{"type":"multiple_choice","options":["x","y"],"answers":[1]}"#,
        )
        .unwrap();
        assert_eq!(details, choice(&["x", "y"], &[1], false));
        assert_eq!(details.kind(), QuestionDetails::MULTIPLE_CHOICE);

        let json = serde_json::to_value(coding(1)).unwrap();
        assert_eq!(json["type"], "coding");
    }

    #[test]
    fn test_redaction_removes_answer_keys() {
        match choice(&["a", "b"], &[1], false).redacted() {
            QuestionDetails::MultipleChoice { answers, options, .. } => {
                assert!(answers.is_empty());
                assert_eq!(options.len(), 2);
            }
            _ => panic!("kind changed"),
        }

        let short = QuestionDetails::ShortAnswer {
            reference_answer: Some("42".to_string()),
        };
        assert_eq!(
            short.redacted(),
            QuestionDetails::ShortAnswer {
                reference_answer: None
            }
        );

        match coding(4).redacted() {
            QuestionDetails::Coding { test_cases, .. } => {
                assert_eq!(test_cases.len(), 2);
                assert!(test_cases.iter().all(|c| !c.hidden));
            }
            _ => panic!("kind changed"),
        }
    }

    #[test]
    fn test_check_choice_all_or_nothing() {
        let details = choice(&["a", "b", "c"], &[0, 2], true);
        assert_eq!(details.check_choice(&[2, 0]), Some(true));
        assert_eq!(details.check_choice(&[0]), Some(false));
        assert_eq!(details.check_choice(&[0, 1, 2]), Some(false));
        assert_eq!(coding(1).check_choice(&[0]), None);
    }
}
