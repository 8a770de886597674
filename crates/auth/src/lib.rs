//! Session handling for the minireq client.
//!
//! The [`SessionManager`] owns the stored credential and the single-flight
//! refresh that replaces it when the backend reports an expired session.

pub mod gate;
pub mod login;
pub mod refresh;
pub mod session;

pub use gate::RefreshGate;
pub use login::{NoLoginProvider, StaticLoginProvider};
pub use refresh::{LOGIN_EXPIRED_MESSAGE, RefreshFlow};
pub use session::SessionManager;
