pub mod config;
pub mod window;

pub use config::AppConfig;
pub use window::QueryWindow;
