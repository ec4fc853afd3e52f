pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod types;

pub use routes::create_router;
pub use server::{build_app, start_server};
