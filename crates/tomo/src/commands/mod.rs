//! Command handlers for the tomo CLI.

pub mod call;
pub mod login;
pub mod ping;

pub use call::*;
pub use login::*;
pub use ping::*;

use clap::Args;

/// Admin credentials.
#[derive(Args)]
pub struct Credentials {
    /// Admin username
    #[arg(long, short = 'u', env = "TOMO_USERNAME")]
    pub username: String,

    /// Admin password
    #[arg(long, short = 'p', env = "TOMO_PASSWORD", hide_env_values = true)]
    pub password: String,
}
