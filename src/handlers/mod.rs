mod api;
mod auth;
mod profile;
mod tasks;
mod tickets;

pub use api::list_tickets;
pub use auth::{handle_login, handle_logout, handle_register, serve_login_page, serve_register_page};
pub use profile::{redirect_to_own_profile, serve_profile, update_password};
pub use tasks::{create_root_task, create_sub_task, serve_planning, update_task_status, TaskError};
pub use tickets::{
    admin_update_ticket, create_ticket, serve_edit_ticket, serve_index, serve_new_ticket,
    update_ticket,
};
