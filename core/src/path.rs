//! Path template resolution.

use tracing::debug;

/// Ordered `(name, value)` pairs substituted into a path template.
pub type PathParams = Vec<(String, String)>;

/// Normalize `path` and substitute `{name}` placeholders from `params`.
///
/// An empty path becomes `/`, and a missing leading `/` is added. Each pair
/// replaces the first occurrence of its placeholder, in order. Values are not
/// escaped, so a value that itself contains `{other}` can be substituted by a
/// later pair. Placeholders without a matching pair are left in place.
pub fn format_path(path: &str, params: &[(String, String)]) -> String {
    let mut path = if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    if params.is_empty() {
        return path;
    }

    for (name, value) in params {
        path = path.replacen(&format!("{{{name}}}"), value, 1);
    }

    debug!(mailchimp_path = %path, "formatted path");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> PathParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_path_defaults_to_root() {
        assert_eq!(format_path("", &[]), "/");
    }

    #[test]
    fn leading_slash_is_added() {
        assert_eq!(format_path("users", &[]), "/users");
        assert_eq!(format_path("/users", &[]), "/users");
    }

    #[test]
    fn placeholders_are_substituted() {
        assert_eq!(
            format_path("/lists/{id}/members", &params(&[("id", "abc")])),
            "/lists/abc/members"
        );
        assert_eq!(
            format_path(
                "lists/{list_id}/members/{member_id}",
                &params(&[("list_id", "l1"), ("member_id", "m2")])
            ),
            "/lists/l1/members/m2"
        );
    }

    #[test]
    fn only_first_occurrence_is_replaced() {
        assert_eq!(
            format_path("/{id}/{id}", &params(&[("id", "x")])),
            "/x/{id}"
        );
    }

    #[test]
    fn unresolved_placeholders_pass_through() {
        assert_eq!(
            format_path("/lists/{list_id}", &params(&[("other", "x")])),
            "/lists/{list_id}"
        );
    }

    #[test]
    fn values_are_not_escaped() {
        // The first value injects a placeholder that the second pair resolves.
        assert_eq!(
            format_path("/a/{first}", &params(&[("first", "{second}"), ("second", "b")])),
            "/a/b"
        );
    }
}
