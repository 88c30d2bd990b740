use crate::auth::AuthConfig;

pub mod server;

#[derive(Debug)]
pub enum Action {
    Server { port: u16, config: AuthConfig },
}
