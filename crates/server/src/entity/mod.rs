pub mod note;
pub mod user_account;
