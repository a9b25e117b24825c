pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use rest::{
    analyze_handler, dashboard_handler, generate_handler, get_post_handler, list_posts_handler,
    upload_samples_handler,
};
