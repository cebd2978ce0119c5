//! CollegeBasketballData API access
//!
//! - `http`: the typed client
//! - `types`: response shapes

pub mod http;
pub mod types;

pub use http::CbbdClient;
