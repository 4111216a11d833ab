/// Multipart field carrying uploaded images on create/update requests
pub const IMAGES_FIELD: &str = "images";

/// Maximum number of images accepted in a single request
pub const MAX_IMAGES_PER_REQUEST: usize = 20;

/// Maximum size of a single uploaded image in bytes (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Allowed MIME types for image uploads
pub const ALLOWED_IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
