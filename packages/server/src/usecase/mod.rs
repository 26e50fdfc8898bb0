//! UseCase layer
//!
//! Called from the HTTP handlers; operates on the domain layer through the
//! `SessionStore` abstraction.

pub mod create_session;
pub mod error;
pub mod get_session;
pub mod submit_location;

pub use create_session::CreateSessionUseCase;
pub use error::{CreateSessionError, GetSessionError, SubmitLocationError};
pub use get_session::GetSessionUseCase;
pub use submit_location::SubmitLocationUseCase;
