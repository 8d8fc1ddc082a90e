//! tiffpress web - browser and HTTP front end for the converter
//!
//! Serves an upload form, runs each submitted batch through
//! `tiffpress_core::convert_batch` on the blocking pool, and hands back the
//! resulting `converted_images.zip`. Nothing is kept between requests.

pub mod config;
pub mod error;
pub mod handlers;
pub mod html;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;
pub mod upload;

pub use config::Config;
pub use error::{AppError, ErrorResponse, FileFailure};
pub use routes::build_router;
pub use state::AppState;
