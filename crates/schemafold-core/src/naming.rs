//! Physical table naming
//!
//! The request adapter resolves model names to tables with the same rule, so
//! DDL generated here only matches the queried tables if both sides call this.

/// Physical table name for a logical model: suffixed with `s` when pluralizing
pub fn physical_table_name(model: &str, use_plural: bool) -> String {
    if use_plural {
        format!("{}s", model)
    } else {
        model.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_suffix() {
        assert_eq!(physical_table_name("user", true), "users");
        assert_eq!(physical_table_name("user", false), "user");
        assert_eq!(physical_table_name("verification", true), "verifications");
    }
}
