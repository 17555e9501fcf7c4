use axum::response::Html;
use chrono::{DateTime, Utc};

use super::{escape, PageContext, Views};
use crate::deadline::{countdown, is_late};
use crate::errors::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{PlannedTask, Status, Task, Ticket, User};
use crate::notice::Notice;
use crate::query::{ListedTicket, SortOrder, StatusFilter, TicketQuery};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub(super) fn nav(current: &CurrentUser) -> String {
    match current.user() {
        Some(user) => {
            let admin = if user.is_admin() {
                r#" <span class="badge">admin</span>"#
            } else {
                ""
            };
            format!(
                r#"<a href="/">Tickets</a>
                <a href="/tickets/new">Nouveau ticket</a>
                <a href="/tasks/">Planning</a>
                <a href="/profile">{}{}</a>
                <a href="/logout">Déconnexion</a>"#,
                escape(&user.username),
                admin
            )
        }
        None => r#"<a href="/">Tickets</a>
                <a href="/login">Connexion</a>
                <a href="/register">Inscription</a>"#
            .to_string(),
    }
}

pub(super) fn notice(notice: &Notice) -> String {
    format!(
        r#"<div class="notice notice-{}" role="alert">{}</div>"#,
        notice.level.as_str(),
        escape(&notice.message)
    )
}

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        r#"<option value="{}"{}>{}</option>"#,
        escape(value),
        if selected { " selected" } else { "" },
        escape(label)
    )
}

fn deadline_line(ticket: &Ticket, now: DateTime<Utc>) -> String {
    match ticket.deadline {
        Some(deadline) => {
            // Resolved tickets are never shown as late.
            let late = ticket.status != Status::Resolved && is_late(deadline, now);
            format!(
                r#"<p class="deadline{}">Échéance : {} ({})</p>"#,
                if late { " late" } else { "" },
                deadline.format(DATE_FORMAT),
                countdown(deadline, now)
            )
        }
        None => String::new(),
    }
}

fn admin_form(ticket: &Ticket) -> String {
    let options: String = Status::ALL
        .iter()
        .map(|status| option(status.code(), status.label(), *status == ticket.status))
        .collect();
    format!(
        r#"<form method="post" action="/tickets/{}/admin" class="admin-form">
            <select name="status">{}</select>
            <textarea name="admin_response" rows="2" placeholder="Réponse de l'administrateur">{}</textarea>
            <button type="submit">Mettre à jour</button>
        </form>"#,
        ticket.id,
        options,
        escape(ticket.admin_response.as_deref().unwrap_or_default())
    )
}

fn ticket_card(row: &ListedTicket, viewer: Option<&User>, now: DateTime<Utc>) -> String {
    let ticket = &row.ticket;

    let response = match &ticket.admin_response {
        Some(text) => format!(r#"<blockquote class="admin-response">{}</blockquote>"#, escape(text)),
        None => String::new(),
    };

    let mut actions = String::new();
    if let Some(viewer) = viewer {
        if viewer.id == ticket.author {
            actions.push_str(&format!(r#"<a class="edit" href="/tickets/{}/edit">Modifier</a>"#, ticket.id));
        }
        if viewer.is_admin() {
            actions.push_str(&admin_form(ticket));
        }
    }

    format!(
        r#"<article class="ticket" data-id="{id}" data-status="{code}">
            <header>
                <h2>{title}</h2>
                <span class="status status-{code}">{label}</span>
            </header>
            <p class="content">{content}</p>
            <p class="meta">Par <a href="/users/{author_id}">{author}</a> · créé le {created}</p>
            {deadline}
            {response}
            {actions}
        </article>"#,
        id = ticket.id,
        code = ticket.status.code(),
        label = ticket.status.label(),
        title = escape(&ticket.title),
        content = escape(&ticket.content),
        author_id = row.author.id,
        author = escape(&row.author.username),
        created = ticket.created_at.format(DATE_FORMAT),
        deadline = deadline_line(ticket, now),
        response = response,
        actions = actions,
    )
}

fn ticket_cards(rows: &[ListedTicket], viewer: Option<&User>, now: DateTime<Utc>) -> String {
    if rows.is_empty() {
        return r#"<p class="empty">Aucun ticket.</p>"#.to_string();
    }
    rows.iter()
        .map(|row| ticket_card(row, viewer, now))
        .collect::<Vec<_>>()
        .join("\n")
}

fn task_item(task: &Task) -> String {
    let deadline = task
        .deadline
        .map(|d| format!(r#" <span class="deadline">{}</span>"#, d.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!(
        r#"<li class="task{done}" data-id="{id}">
                    <span class="task-title">{title}</span>{deadline}
                    <p>{content}</p>
                    <form method="post" action="/tasks/{id}/status">
                        <input type="hidden" name="done" value="{toggle}">
                        <button type="submit">{toggle_label}</button>
                    </form>
                    <form method="post" action="/tasks/{id}/addTask" class="subtask-form">
                        <input type="text" name="title" placeholder="Sous-tâche" required>
                        <input type="text" name="content" placeholder="Description" required>
                        <input type="date" name="deadline">
                        <button type="submit">+</button>
                    </form>"#,
        done = if task.done { " done" } else { "" },
        id = task.id,
        title = escape(&task.title),
        deadline = deadline,
        content = escape(&task.content),
        toggle = if task.done { "0" } else { "1" },
        toggle_label = if task.done { "Rouvrir" } else { "Terminer" },
    )
}

/// Nested lists from an outline. A task's `<li>` stays open while its
/// descendants follow, so depth only ever grows one level at a time.
fn task_tree(outline: &[PlannedTask]) -> String {
    let mut html = String::new();
    let mut open_lists = 0;

    for planned in outline {
        let level = planned.depth + 1;
        while open_lists > level {
            html.push_str("</li></ul>");
            open_lists -= 1;
        }
        if open_lists == level {
            html.push_str("</li>");
        }
        while open_lists < level {
            html.push_str("<ul>");
            open_lists += 1;
        }
        html.push_str(&task_item(&planned.task));
    }

    for _ in 0..open_lists {
        html.push_str("</li></ul>");
    }
    html
}

impl Views {
    pub async fn index(
        &self,
        ctx: &PageContext<'_>,
        action: &str,
        query: &TicketQuery,
        rows: &[ListedTicket],
        now: DateTime<Utc>,
    ) -> AppResult<Html<String>> {
        let status_options: String = std::iter::once(option("all", "Tous", query.status == StatusFilter::All))
            .chain(Status::ALL.iter().map(|status| {
                option(status.code(), status.label(), query.status == StatusFilter::Only(*status))
            }))
            .collect();
        let sort_options = [
            option("recent", "Plus récents", query.sort == SortOrder::Recent),
            option("oldest", "Plus anciens", query.sort == SortOrder::Oldest),
        ]
        .concat();

        self.page(
            "Tickets",
            ctx,
            "index.html",
            &[
                ("action", escape(action)),
                ("status_options", status_options),
                ("sort_options", sort_options),
                ("q", escape(&query.text)),
                ("author", escape(&query.author)),
                ("overdue_checked", if query.overdue_only { "checked" } else { "" }.to_string()),
                ("count", rows.len().to_string()),
                ("tickets", ticket_cards(rows, ctx.current.user(), now)),
            ],
        )
        .await
    }

    pub async fn login(&self, ctx: &PageContext<'_>) -> AppResult<Html<String>> {
        self.page("Connexion", ctx, "login.html", &[]).await
    }

    pub async fn register(&self, ctx: &PageContext<'_>) -> AppResult<Html<String>> {
        self.page("Inscription", ctx, "register.html", &[]).await
    }

    pub async fn new_ticket(&self, ctx: &PageContext<'_>) -> AppResult<Html<String>> {
        let deadline_field = r#"<label for="deadline">Date limite (optionnelle)</label>
    <input type="date" id="deadline" name="deadline">"#;

        self.page(
            "Nouveau ticket",
            ctx,
            "ticket_form.html",
            &[
                ("action", "/tickets/new".to_string()),
                ("title_value", String::new()),
                ("content_value", String::new()),
                ("deadline_field", deadline_field.to_string()),
                ("submit", "Créer".to_string()),
            ],
        )
        .await
    }

    pub async fn edit_ticket(&self, ctx: &PageContext<'_>, ticket: &Ticket) -> AppResult<Html<String>> {
        self.page(
            "Modifier le ticket",
            ctx,
            "ticket_form.html",
            &[
                ("action", format!("/tickets/{}/edit", ticket.id)),
                ("title_value", escape(&ticket.title)),
                ("content_value", escape(&ticket.content)),
                ("deadline_field", String::new()),
                ("submit", "Enregistrer".to_string()),
            ],
        )
        .await
    }

    pub async fn profile(
        &self,
        ctx: &PageContext<'_>,
        profile_user: &User,
        tickets: &[ListedTicket],
        is_own_profile: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Html<String>> {
        let password_form = if is_own_profile {
            format!(
                r#"<form method="post" action="/users/{}" class="card">
    <h2>Changer de mot de passe</h2>
    <label for="current_password">Mot de passe actuel</label>
    <input type="password" id="current_password" name="current_password" required>
    <label for="new_password">Nouveau mot de passe</label>
    <input type="password" id="new_password" name="new_password" required>
    <button type="submit">Mettre à jour</button>
</form>"#,
                profile_user.id
            )
        } else {
            String::new()
        };

        let title = if is_own_profile {
            "Mon profil".to_string()
        } else {
            format!("Profil de {}", profile_user.username)
        };

        self.page(
            &title,
            ctx,
            "profile.html",
            &[
                ("username", escape(&profile_user.username)),
                ("email", escape(&profile_user.email)),
                ("role", profile_user.role.as_str().to_string()),
                ("created_at", profile_user.created_at.format(DATE_FORMAT).to_string()),
                ("ticket_count", tickets.len().to_string()),
                ("password_form", password_form),
                ("tickets", ticket_cards(tickets, ctx.current.user(), now)),
            ],
        )
        .await
    }

    pub async fn planning(&self, ctx: &PageContext<'_>, forest: &[PlannedTask]) -> AppResult<Html<String>> {
        let tasks = if forest.is_empty() {
            r#"<p class="empty">Aucune tâche.</p>"#.to_string()
        } else {
            task_tree(forest)
        };
        self.page("Planning", ctx, "planning.html", &[("tasks", tasks)]).await
    }
}
