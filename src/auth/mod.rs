mod session;
mod token;

pub use session::{Session, SessionHandle};
pub use token::{bearer_token, user_id_for_email, IdentityProvider};
