pub mod user;
pub mod vm;
