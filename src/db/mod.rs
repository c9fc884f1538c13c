pub mod session;

pub use session::{keys, SessionStore};
