//! Leaf level of the catalog hierarchy.
//!
//! Product names are unique per brand, so the same `nameRu` may appear under
//! different brands.
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/products?brandId=&categoryId=` | No | List products, newest first |
//! | GET | `/products/{id}` | No | Get one product with brand and category |
//! | POST | `/products` | Yes | Create (multipart) |
//! | PATCH | `/products/{id}` | Yes | Partial update |
//! | DELETE | `/products/{id}` | Yes | Delete with images |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::ProductService;
