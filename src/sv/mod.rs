pub mod access;
pub mod key;
pub mod user;

pub use access::Access;
pub use key::Key;
pub use user::User;
