pub mod admin_auth;
pub mod analytics;
pub mod answers;
pub mod questions;
pub mod quizzes;
pub mod results;
pub mod sessions;
pub mod settings;
pub mod users;
pub mod weights;
