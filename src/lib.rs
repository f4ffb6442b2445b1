pub mod api;
pub mod app;
pub mod config;
pub mod errors;
pub mod session;

pub use api::ApiClient;
pub use app::App;
pub use errors::{SmartPlateError, SmartPlateResult};
pub use session::{Session, SessionStore};
