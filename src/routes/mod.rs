pub mod auth;

pub mod users;

pub mod courses;

pub mod enrollments;

pub mod materials;

pub mod judge;

pub mod frontend;

pub use auth::configure_auth_routes;
pub use courses::configure_courses_routes;
pub use enrollments::configure_enrollments_routes;
pub use frontend::configure_frontend_routes;
pub use judge::configure_judge_routes;
pub use materials::configure_materials_routes;
pub use users::configure_user_routes;
