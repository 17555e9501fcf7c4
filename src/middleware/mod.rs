mod auth;

pub use auth::{
    end_session, load_current_user, require_admin, require_login, start_session, CurrentUser,
    RequireAdmin, RequireLogin, ROLE_KEY, USERNAME_KEY, USER_ID_KEY,
};
