use crate::{
    auth::{cookie::extract_session_id, SessionStore},
    nav::{self, NavItem, Role},
};
use axum::{extract::Extension, http::HeaderMap, response::Json};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/navigation",
    responses(
        (status = 200, description = "Sidebar entries visible to the caller", body = [NavItem])
    ),
    tag = "navigation"
)]
pub async fn navigation(
    headers: HeaderMap,
    store: Extension<Arc<SessionStore>>,
) -> Json<Vec<NavItem>> {
    let session = match extract_session_id(&headers) {
        Some(session_id) => store.read(&session_id).await,
        None => None,
    };

    // Sessions tagged with a refresh error are as good as signed out.
    let user = session
        .as_ref()
        .filter(|session| session.error.is_none())
        .map(|session| &session.user);

    Json(nav::navigation(
        Role::for_user(user),
        store.config().quick_start(),
    ))
}
