//! Location string normalization.
//!
//! The list shows `"City (CC)"` while the weather endpoints expect
//! `q=City,CC`.

/// Strip parentheses and turn spaces into commas.
///
/// `"New York (US)"` becomes `"New,York,US"`.
pub fn normalize_location(location: &str) -> String {
    let stripped: String = location.chars().filter(|c| *c != '(' && *c != ')').collect();
    stripped.split(' ').collect::<Vec<_>>().join(",")
}
