pub mod init;
pub mod message;
