pub mod auth_test;
pub mod authority_test;
