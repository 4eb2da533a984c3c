//! Control-plane transport and wire types.

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use client::ApiConfig;
pub use types::ApiRequest;
pub use types::ApiResponseBody;
