//! Middle level of the catalog hierarchy; every brand belongs to one category.
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/brands?categoryId=` | No | List brands with category and products |
//! | GET | `/brands/{id}` | No | Get one brand |
//! | POST | `/brands` | Yes | Create (multipart) |
//! | PATCH | `/brands/{id}` | Yes | Partial update, may move to another category |
//! | DELETE | `/brands/{id}` | Yes | Delete with all products |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::BrandService;
