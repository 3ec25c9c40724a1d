//! Typed operations grouped by resource family.
//!
//! Each family is a small handle borrowing the [`Client`]:
//!
//! ```no_run
//! # fn demo() -> controller_sdk::Result<()> {
//! let client = controller_sdk::Client::new(true, "deis.example.com", "token")?;
//! let (apps, total) = client.apps().list(100)?;
//! # let _ = (apps, total);
//! # Ok(())
//! # }
//! ```
//!
//! Every operation follows the same shape: build a [`RequestSpec`](crate::RequestSpec), send it,
//! apply the operation's [`MismatchPolicy`](crate::MismatchPolicy), decode.

mod apps;
mod appsettings;
mod auth;
mod builds;
mod certs;
mod config;
mod domains;
mod hooks;
mod keys;
mod perms;
mod ps;
mod releases;
mod tls;
mod users;
mod whitelist;

pub use apps::Apps;
pub use appsettings::AppSettingsApi;
pub use auth::Auth;
pub use builds::Builds;
pub use certs::Certs;
pub use config::ConfigApi;
pub use domains::Domains;
pub use hooks::Hooks;
pub use keys::Keys;
pub use perms::Perms;
pub use ps::{by_type, Ps};
pub use releases::Releases;
pub use tls::TlsApi;
pub use users::Users;
pub use whitelist::WhitelistApi;

use crate::client::Client;

impl Client {
    pub fn apps(&self) -> Apps<'_> {
        Apps { client: self }
    }

    pub fn app_settings(&self) -> AppSettingsApi<'_> {
        AppSettingsApi { client: self }
    }

    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    pub fn builds(&self) -> Builds<'_> {
        Builds { client: self }
    }

    pub fn certs(&self) -> Certs<'_> {
        Certs { client: self }
    }

    pub fn config(&self) -> ConfigApi<'_> {
        ConfigApi { client: self }
    }

    pub fn domains(&self) -> Domains<'_> {
        Domains { client: self }
    }

    /// Build agent endpoints. These authenticate with the hooks token.
    pub fn hooks(&self) -> Hooks<'_> {
        Hooks { client: self }
    }

    pub fn keys(&self) -> Keys<'_> {
        Keys { client: self }
    }

    pub fn perms(&self) -> Perms<'_> {
        Perms { client: self }
    }

    pub fn ps(&self) -> Ps<'_> {
        Ps { client: self }
    }

    pub fn releases(&self) -> Releases<'_> {
        Releases { client: self }
    }

    pub fn tls(&self) -> TlsApi<'_> {
        TlsApi { client: self }
    }

    pub fn users(&self) -> Users<'_> {
        Users { client: self }
    }

    pub fn whitelist(&self) -> WhitelistApi<'_> {
        WhitelistApi { client: self }
    }
}
