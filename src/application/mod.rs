pub mod app_error;
pub mod identity;
pub mod use_cases;
