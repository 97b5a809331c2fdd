pub mod api;
pub mod config;
pub mod errors;
pub mod guard;
pub mod identity;
pub mod models;
pub mod state;
pub mod sync;
pub mod views;

pub use errors::{ClientError, ClientResult};
pub use state::AppContext;
