use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating user login names
    /// Must start with a letter and contain only alphanumerics, underscores, dots or hyphens
    /// - Valid: "superadmin", "john.doe", "manager_2", "shop-admin"
    /// - Invalid: "2admin", "_admin", "john doe", "admin!", ""
    pub static ref LOGIN_REGEX: Regex = Regex::new(r"^[a-zA-Z][a-zA-Z0-9_.-]*$").unwrap();
}
