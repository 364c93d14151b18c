//! Navigation shell state.
//!
//! The shell decides what a client should render: the login form, or one of
//! the management pages. Transitions are pure; every action yields a new
//! state.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Management pages reachable from the navigation bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Borrow,
    Students,
    Books,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Borrow, Page::Students, Page::Books];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Borrow => "Borrow Management",
            Page::Students => "Students",
            Page::Books => "Books",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum ShellState {
    #[default]
    Login,
    Management { page: Page },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    /// Session lookup finished; `is_admin` is false when there is no session
    SessionResolved { is_admin: bool },
    Navigate(Page),
    SignOut,
}

impl ShellState {
    pub fn apply(self, action: ShellAction) -> ShellState {
        match (self, action) {
            (ShellState::Management { page }, ShellAction::SessionResolved { is_admin: true }) => {
                ShellState::Management { page }
            }
            (_, ShellAction::SessionResolved { is_admin: true }) => ShellState::Management {
                page: Page::default(),
            },
            (_, ShellAction::SessionResolved { is_admin: false }) => ShellState::Login,
            (ShellState::Management { .. }, ShellAction::Navigate(page)) => {
                ShellState::Management { page }
            }
            (ShellState::Login, ShellAction::Navigate(_)) => ShellState::Login,
            (_, ShellAction::SignOut) => ShellState::Login,
        }
    }
}

/// Navigation entry rendered by clients
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NavEntry {
    pub page: Page,
    pub title: String,
    pub active: bool,
}

/// Shell view returned by `GET /shell`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShellView {
    pub state: ShellState,
    /// Empty on the login view
    pub navigation: Vec<NavEntry>,
    pub email: Option<String>,
}

impl ShellView {
    pub fn new(state: ShellState, email: Option<String>) -> Self {
        let navigation = match state {
            ShellState::Login => Vec::new(),
            ShellState::Management { page: current } => Page::ALL
                .iter()
                .map(|page| NavEntry {
                    page: *page,
                    title: page.title().to_string(),
                    active: *page == current,
                })
                .collect(),
        };
        Self {
            state,
            navigation,
            email,
        }
    }
}
