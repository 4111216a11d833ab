pub mod auth_handler;

pub use auth_handler::{
    __path_delete_user, __path_get_profile, __path_get_user, __path_list_users, __path_login,
    __path_register, __path_update_profile, __path_update_user, delete_user, get_profile,
    get_user, list_users, login, register, update_profile, update_user,
};
