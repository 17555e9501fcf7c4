//! User-facing notices carried across redirects.
//!
//! Every mutating handler ends in an [`Outcome`]: a redirect whose location
//! carries the notice as `notice=<message>&level=<level>`. The page served at
//! that location reads it back through [`NoticeParams`].

use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Danger,
    Warning,
    Info,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Danger => "danger",
            Level::Warning => "warning",
            Level::Info => "info",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(Level::Success),
            "danger" => Some(Level::Danger),
            "warning" => Some(Level::Warning),
            "info" => Some(Level::Info),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(Level::Danger, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn redirect(self, location: impl Into<String>) -> Outcome {
        Outcome {
            location: location.into(),
            notice: Some(self),
        }
    }
}

/// Result of a handler that answers with a redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub location: String,
    pub notice: Option<Notice>,
}

impl Outcome {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            notice: None,
        }
    }

    pub fn target(&self) -> String {
        match &self.notice {
            None => self.location.clone(),
            Some(notice) => {
                let separator = if self.location.contains('?') { '&' } else { '?' };
                format!(
                    "{}{}notice={}&level={}",
                    self.location,
                    separator,
                    urlencoding::encode(&notice.message),
                    notice.level.as_str()
                )
            }
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        Redirect::to(&self.target()).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NoticeParams {
    pub notice: Option<String>,
    pub level: Option<String>,
}

impl NoticeParams {
    pub fn into_notice(self) -> Option<Notice> {
        let message = self.notice.filter(|m| !m.trim().is_empty())?;
        let level = self
            .level
            .as_deref()
            .and_then(Level::parse)
            .unwrap_or(Level::Info);
        Some(Notice::new(level, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};

    #[test]
    fn encodes_notice_into_location() {
        let outcome = Notice::success("Ticket créé avec succès.").redirect("/");
        assert_eq!(
            outcome.target(),
            "/?notice=Ticket%20cr%C3%A9%C3%A9%20avec%20succ%C3%A8s.&level=success"
        );
    }

    #[test]
    fn appends_to_existing_query() {
        let outcome = Notice::danger("x").redirect("/?status=resolu");
        assert_eq!(outcome.target(), "/?status=resolu&notice=x&level=danger");
    }

    #[test]
    fn redirects_with_see_other() {
        let response = Outcome::to("/tasks/").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/tasks/");
    }

    #[test]
    fn reads_notice_back_from_params() {
        let params = NoticeParams {
            notice: Some("Bonjour".into()),
            level: Some("bogus".into()),
        };
        assert_eq!(params.into_notice(), Some(Notice::info("Bonjour")));
        assert_eq!(NoticeParams::default().into_notice(), None);
    }
}
