pub mod auth;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;
pub mod versions;

pub use auth::CurrentUser;
pub use responses::{ApiMessage, json_error};
pub use state::AppState;
