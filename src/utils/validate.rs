//! 请求字段校验，失败时返回可直接放进响应的英文消息

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::questions::entities::MAX_POINTS;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{5,16}$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("Invalid email regex")
});

const COMMON_PASSWORDS: &[&str] = &[
    "password1",
    "qwerty123",
    "admin1234",
    "abcd1234",
    "welcome1",
    "passw0rd",
    "iloveyou1",
];

// (检查, 不满足时的提示)
type PasswordRule = (fn(&str) -> bool, &'static str);

const PASSWORD_RULES: &[PasswordRule] = &[
    (
        |p: &str| p.chars().count() >= 8,
        "Password must be at least 8 characters long",
    ),
    (
        |p: &str| p.chars().any(|c| c.is_ascii_uppercase()),
        "Password must contain at least one uppercase letter",
    ),
    (
        |p: &str| p.chars().any(|c| c.is_ascii_lowercase()),
        "Password must contain at least one lowercase letter",
    ),
    (
        |p: &str| p.chars().any(|c| c.is_ascii_digit()),
        "Password must contain at least one digit",
    ),
    (
        |p: &str| !COMMON_PASSWORDS.iter().any(|w| p.eq_ignore_ascii_case(w)),
        "Password is too common, please choose a stronger password",
    ),
];

// 去掉首尾空白后按字符计数
fn trimmed_len_within(value: &str, max: usize) -> bool {
    (1..=max).contains(&value.trim().chars().count())
}

/// 5..=16 个字母、数字、下划线或连字符
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err("Username must be 5-16 letters, digits, underscores or hyphens")
    }
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err("Email format is invalid")
    }
}

/// 列出全部不满足的规则，用 "; " 连接
pub fn validate_password(password: &str) -> Result<(), String> {
    let problems: Vec<&str> = PASSWORD_RULES
        .iter()
        .filter(|(check, _)| !check(password))
        .map(|(_, message)| *message)
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("; "))
    }
}

pub fn validate_course_name(name: &str) -> Result<(), &'static str> {
    if trimmed_len_within(name, 100) {
        Ok(())
    } else {
        Err("Course name must be between 1 and 100 characters")
    }
}

pub fn validate_material_title(title: &str) -> Result<(), &'static str> {
    if trimmed_len_within(title, 200) {
        Ok(())
    } else {
        Err("Material title must be between 1 and 200 characters")
    }
}

pub fn validate_question_prompt(prompt: &str) -> Result<(), &'static str> {
    if prompt.trim().is_empty() {
        return Err("Question prompt must not be empty");
    }
    Ok(())
}

pub fn validate_points(points: f64) -> Result<(), &'static str> {
    if points.is_finite() && (0.0..=MAX_POINTS).contains(&points) {
        Ok(())
    } else {
        Err("Points must be between 0 and 1000")
    }
}

pub fn validate_position(position: i32) -> Result<(), &'static str> {
    if position < 0 {
        return Err("Position must not be negative");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_accepts_strong() {
        for ok in ["SecureP@ss1", "MyP@ssw0rd", "SecurePass123"] {
            assert!(validate_password(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_password_reports_every_problem() {
        let err = validate_password("abc").unwrap_err();
        assert!(err.contains("at least 8 characters"));
        assert!(err.contains("uppercase"));
        assert!(err.contains("digit"));
        assert!(!err.contains("lowercase"));
    }

    #[test]
    fn test_password_rejects_common() {
        let err = validate_password("Password1").unwrap_err();
        assert_eq!(
            err,
            "Password is too common, please choose a stronger password"
        );
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice_01").is_ok());
        assert!(validate_username("abc").is_err());
        assert!(validate_username("a-very-long-username").is_err());
        assert!(validate_username("bad name").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("student@example.edu").is_ok());
        assert!(validate_email("t.a@cs.uni.example.org").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_course_name_length() {
        assert!(validate_course_name("Algorithms").is_ok());
        assert!(validate_course_name("   ").is_err());
        assert!(validate_course_name(&"x".repeat(100)).is_ok());
        assert!(validate_course_name(&"x".repeat(101)).is_err());
        // 按字符计数而非字节
        assert!(validate_course_name(&"课".repeat(100)).is_ok());
    }

    #[test]
    fn test_material_title_length() {
        assert!(validate_material_title("Week 1").is_ok());
        assert!(validate_material_title("").is_err());
        assert!(validate_material_title(&"t".repeat(201)).is_err());
    }

    #[test]
    fn test_points_range() {
        assert!(validate_points(0.0).is_ok());
        assert!(validate_points(1000.0).is_ok());
        assert!(validate_points(-1.0).is_err());
        assert!(validate_points(1000.5).is_err());
        assert!(validate_points(f64::NAN).is_err());
    }

    #[test]
    fn test_prompt_and_position() {
        assert!(validate_question_prompt("What is 2+2?").is_ok());
        assert!(validate_question_prompt(" \n").is_err());
        assert!(validate_position(0).is_ok());
        assert!(validate_position(-1).is_err());
    }
}
