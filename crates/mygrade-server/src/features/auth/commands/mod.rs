pub mod sign_in;
pub mod sign_out;

pub use sign_in::{SignInCommand, SignInError, INVALID_CREDENTIALS};
pub use sign_out::{SignOutCommand, SignOutError};
