//! Authentication module
//!
//! The provider authenticates every request with a pair of custom headers
//! (key id and secret key). `Credentials` holds that pair and knows how to
//! resolve it from the environment, including a `.env` file.

mod credentials;

pub use credentials::{
    Credentials, API_KEY_ID_HEADER, API_KEY_ID_VAR, API_SECRET_KEY_HEADER, API_SECRET_KEY_VAR,
};
