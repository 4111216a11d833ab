pub mod brand_handler;

pub use brand_handler::{
    __path_create_brand, __path_delete_brand, __path_get_brand, __path_list_brands,
    __path_update_brand, create_brand, delete_brand, get_brand, list_brands, update_brand,
};
