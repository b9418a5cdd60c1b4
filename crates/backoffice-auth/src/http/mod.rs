//! Axum HTTP handlers for the session endpoints.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/auth/sign-in` | [`sign_in_handler`] |
//! | POST | `/auth/sign-out` | [`sign_out_handler`] |
//! | GET | `/auth/session` | [`session_handler`] |
//! | POST | `/auth/refresh` | [`refresh_handler`] |

pub mod session;

pub use session::{
    SessionResponse, SignInRequest, SignOutResponse, refresh_handler, session_handler,
    sign_in_handler, sign_out_handler,
};
