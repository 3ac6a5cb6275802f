//! One module per subcommand.

pub mod add_binary;
pub mod add_card;
pub mod add_credentials;
pub mod add_text;
pub mod auth;
pub mod completions;
pub mod delete;
pub mod get;
pub mod keygen;
pub mod list;
pub mod pull;
pub mod sync;
