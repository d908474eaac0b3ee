use std::collections::HashSet;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::EnrollmentService;
use crate::models::{
    ApiResponse, ErrorCode,
    enrollments::{requests::EnrollStudentsRequest, responses::EnrollStudentsResponse},
    users::entities::{User, UserRole},
};
use crate::services::courses::current_course;

/// 单次最多处理的用户数
const MAX_BATCH: usize = 500;

pub async fn enroll_students(
    service: &EnrollmentService,
    request: &HttpRequest,
    body: EnrollStudentsRequest,
) -> ActixResult<HttpResponse> {
    let (course, _) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };

    let requested = dedup_ids(&body.user_ids);
    if requested.is_empty() || requested.len() > MAX_BATCH {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            format!("user_ids must contain 1..={MAX_BATCH} ids"),
        )));
    }

    let storage = service.get_storage(request)?;

    let found = match storage.get_users_by_ids(&requested).await {
        Ok(users) => users,
        Err(e) => return Ok(enroll_failed(course.id, e)),
    };
    let (candidates, invalid) = split_students(&requested, &found);

    let skipped = match storage.filter_enrolled_user_ids(course.id, &candidates).await {
        Ok(ids) => ids,
        Err(e) => return Ok(enroll_failed(course.id, e)),
    };
    let skipped_set: HashSet<i64> = skipped.iter().copied().collect();
    let to_enroll: Vec<i64> = candidates
        .into_iter()
        .filter(|id| !skipped_set.contains(id))
        .collect();

    let enrolled = if to_enroll.is_empty() {
        Vec::new()
    } else {
        match storage.create_enrollments(course.id, &to_enroll).await {
            Ok(rows) => rows.into_iter().map(|e| e.user_id).collect(),
            Err(e) => return Ok(enroll_failed(course.id, e)),
        }
    };

    info!(
        "Course {}: enrolled {}, skipped {}, invalid {}",
        course.id,
        enrolled.len(),
        skipped.len(),
        invalid.len()
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        EnrollStudentsResponse {
            enrolled,
            skipped,
            invalid,
        },
        "Students enrolled",
    )))
}

fn enroll_failed(course_id: i64, e: crate::errors::ClassworkError) -> HttpResponse {
    error!("Enrollment into course {} failed: {}", course_id, e);
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::EnrollmentFailed,
        "Enrollment failed",
    ))
}

fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// 按请求顺序拆分为（学生账号, 无效 ID）
fn split_students(requested: &[i64], found: &[User]) -> (Vec<i64>, Vec<i64>) {
    let students: HashSet<i64> = found
        .iter()
        .filter(|u| u.role == UserRole::Student)
        .map(|u| u.id)
        .collect();
    requested.iter().copied().partition(|id| students.contains(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserStatus;

    fn user(id: i64, role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            display_name: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_dedup_keeps_order() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn test_split_students() {
        let found = vec![user(1, UserRole::Student), user(2, UserRole::Teacher)];
        let (students, invalid) = split_students(&[1, 2, 3], &found);
        assert_eq!(students, vec![1]);
        assert_eq!(invalid, vec![2, 3]);
    }
}
