use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Shared by ticket creation and ticket edit; edit ignores `deadline`.
#[derive(Debug, Deserialize)]
pub struct TicketForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub deadline: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminTicketForm {
    pub status: Option<String>,
    #[serde(default)]
    pub admin_response: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub deadline: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusForm {
    #[serde(default)]
    pub done: String,
}

impl TaskStatusForm {
    pub fn is_done(&self) -> bool {
        matches!(self.done.as_str(), "1" | "true" | "on")
    }
}

/// Query string of the ticket listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub status: Option<String>,
    pub sort: Option<String>,
    pub q: Option<String>,
    pub author: Option<String>,
    pub overdue: Option<String>,
}
