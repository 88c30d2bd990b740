pub mod health;
pub use self::health::health;

pub mod navigation;
pub use self::navigation::navigation;

pub mod session;
pub use self::session::{callback, config, session, signout};
