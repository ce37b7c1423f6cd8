//! # Relayエンドポイント

pub mod files;
pub mod health;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use files::handle_list_files;
pub use health::handle_health;
pub use upload::handle_upload;
