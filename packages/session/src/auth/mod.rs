//! Authentication: provider boundary, allow-list, linked handles and the
//! [`SessionManager`] that ties them together.

mod allow_list;
mod config;
mod handle;
mod manager;
mod provider;
mod subscription;
#[cfg(test)]
pub(crate) mod testing;

pub use allow_list::AllowList;
pub use config::{AuthorizationRequest, ProviderConfig, ProviderConfigError, ProviderKind};
pub use handle::{validate_handle, MAX_HANDLE_LEN};
pub use manager::SessionManager;
pub use provider::{IdentityProvider, ProviderError, ProviderListener, ProviderSubscription};
pub use subscription::SessionSubscription;
