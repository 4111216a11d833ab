//! Top level of the catalog hierarchy.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/categories` | No | List categories with their brands |
//! | GET | `/categories/{id}` | No | Get one category with its brands |
//! | POST | `/categories` | Yes | Create (multipart, `images` files) |
//! | PATCH | `/categories/{id}` | Yes | Partial update, new images replace old |
//! | DELETE | `/categories/{id}` | Yes | Delete; refuses while brands remain unless `?cascade=true` |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::CategoryService;
