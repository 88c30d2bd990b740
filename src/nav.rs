//! Sidebar navigation tree.
//!
//! The tree is static; the only runtime inputs are the caller's role and the
//! Quick Start flag, which hides every entry that depends on a real identity.

use crate::auth::User;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Anonymous,
    User,
    Organization,
}

impl Role {
    /// Role granted by a session: organization members see the full tree.
    #[must_use]
    pub fn for_user(user: Option<&User>) -> Self {
        match user {
            None => Role::Anonymous,
            Some(user) if user.organization_id.is_some() => Role::Organization,
            Some(_) => Role::User,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavItem {
    pub label: &'static str,
    pub icon: &'static str,
    /// Route segment, `None` for pure group headers.
    pub segment: Option<&'static str>,
    pub role: Role,
    #[serde(skip)]
    pub auth_only: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[schema(no_recursion)]
    pub children: Vec<NavItem>,
}

impl NavItem {
    fn page(label: &'static str, icon: &'static str, segment: &'static str, role: Role) -> Self {
        Self {
            label,
            icon,
            segment: Some(segment),
            role,
            auth_only: false,
            children: Vec::new(),
        }
    }

    fn group(label: &'static str, icon: &'static str, role: Role, children: Vec<NavItem>) -> Self {
        Self {
            label,
            icon,
            segment: None,
            role,
            auth_only: false,
            children,
        }
    }

    fn auth_only(mut self) -> Self {
        self.auth_only = true;
        self
    }
}

fn tree() -> Vec<NavItem> {
    vec![
        NavItem::page("Dashboard", "dashboard", "dashboard", Role::User),
        NavItem::page("Projects", "folder", "projects", Role::Organization),
        NavItem::page("Endpoints", "api", "endpoints", Role::Organization),
        NavItem::group(
            "Testing",
            "science",
            Role::Organization,
            vec![
                NavItem::page("Tests", "checklist", "tests", Role::Organization),
                NavItem::page("Test Sets", "library_books", "test-sets", Role::Organization),
                NavItem::page("Test Runs", "play_circle", "test-runs", Role::Organization),
            ],
        ),
        NavItem::page("Knowledge", "menu_book", "knowledge", Role::Organization),
        NavItem::page("Tasks", "task_alt", "tasks", Role::Organization),
        NavItem::group(
            "Organization",
            "business",
            Role::User,
            vec![
                NavItem::page("Team", "group", "organizations/team", Role::Organization),
                NavItem::page("Settings", "settings", "organizations/settings", Role::User),
                NavItem::page("API Tokens", "vpn_key", "tokens", Role::User).auth_only(),
            ],
        )
        .auth_only(),
    ]
}

/// Navigation entries visible to `role`.
#[must_use]
pub fn navigation(role: Role, quick_start: bool) -> Vec<NavItem> {
    filter(tree(), role, quick_start)
}

fn filter(items: Vec<NavItem>, role: Role, quick_start: bool) -> Vec<NavItem> {
    items
        .into_iter()
        .filter(|item| item.role <= role && !(quick_start && item.auth_only))
        .filter_map(|mut item| {
            let had_children = !item.children.is_empty();
            item.children = filter(std::mem::take(&mut item.children), role, quick_start);
            // A group with nothing left to show and nowhere to go is dropped.
            (!had_children || !item.children.is_empty() || item.segment.is_some()).then_some(item)
        })
        .collect()
}
