pub mod forms;
pub mod task;
pub mod ticket;
pub mod user;

pub use forms::{
    AdminTicketForm, ListingParams, LoginForm, PasswordForm, RegisterForm, TaskForm,
    TaskStatusForm, TicketForm,
};
pub use task::{NewTask, PlannedTask, Task};
pub use ticket::{NewTicket, Status, Ticket};
pub use user::{NewUser, Role, User};
