use crate::{
    auth::{types::SignInRequest, Session, SessionError, User},
    gate::handlers::{health, navigation, session},
    nav::{NavItem, Role},
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        session::callback,
        session::session,
        session::signout,
        session::config,
        navigation::navigation,
    ),
    components(schemas(
        health::Health,
        session::AuthSettings,
        Session,
        SessionError,
        SignInRequest,
        User,
        NavItem,
        Role,
    )),
    tags(
        (name = "auth", description = "Session lifecycle for the frontend"),
        (name = "navigation", description = "Sidebar configuration"),
        (name = "health", description = "Service status"),
    )
)]
struct ApiDoc;

/// `OpenAPI` document for every routed endpoint.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
