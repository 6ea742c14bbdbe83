//! Page templates. Files live under `templates/`.

use crate::api::BootstrapStatus;
use askama::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
    pub title: &'a str,
}

#[derive(Template)]
#[template(path = "admin/index.html")]
pub struct AdminPage<'a> {
    pub title: &'a str,
    pub server: &'a str,
    pub auth: bool,
    pub session: &'a str,
}

#[derive(Template)]
#[template(path = "admin/ceremony.html")]
pub struct CeremonyPage<'a> {
    pub title: &'a str,
    pub server: &'a str,
    pub ceremony: &'a BootstrapStatus,
}

#[derive(Template)]
#[template(path = "admin/token.html")]
pub struct TokenPage<'a> {
    pub title: &'a str,
    pub server: &'a str,
    pub valid: bool,
    pub details: String,
}

#[derive(Template)]
#[template(path = "admin/task.html")]
pub struct TaskPage<'a> {
    pub title: &'a str,
    pub action: &'a str,
    pub task_id: &'a str,
    pub states: &'a [String],
    pub payload: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage<'a> {
    pub title: &'a str,
    pub code: u16,
    pub message: String,
}
