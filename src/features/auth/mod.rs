//! Authentication and user management.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/auth/login` | No | Exchange login/password for an access token |
//! | POST | `/auth/register` | Yes | Create an Admin account |
//! | GET/PATCH | `/auth/profile` | Yes | Read or update the caller's profile |
//! | GET | `/auth/users` | Yes | List users |
//! | GET/PATCH/DELETE | `/auth/users/{id}` | Yes | Manage a single user |

pub mod dtos;
pub mod guards;
pub mod handlers;
pub mod jwt;
pub mod model;
pub mod models;
pub mod password;
pub mod policy;
pub mod routes;
pub mod services;

pub use jwt::JwtService;
pub use services::AuthService;
