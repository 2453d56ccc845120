use std::fmt::Display;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

// Characters left as-is by JavaScript's `encodeURIComponent`.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Substitutes `{name}` placeholders in an `OpenAPI` path template.
///
/// Parameters are applied in order. Only the first occurrence of each
/// placeholder is replaced, so a template repeating `{id}` keeps the later
/// copies. Parameters without a placeholder and placeholders without a
/// parameter are ignored.
///
/// Values are percent-encoded as a single path component.
pub fn resolve_path<K, V>(template: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: Display,
{
    let mut resolved = template.to_owned();

    for (name, value) in params {
        let placeholder = format!("{{{}}}", name.as_ref());
        resolved = resolved.replacen(&placeholder, &encode_path_segment(value), 1);
    }

    resolved
}

fn encode_path_segment(value: impl Display) -> String {
    utf8_percent_encode(&value.to_string(), COMPONENT_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::resolve_path;

    #[test]
    fn replaces_placeholder_with_value() {
        assert_eq!(resolve_path("/pets/{id}", &[("id", 42)]), "/pets/42");
    }

    #[test]
    fn leaves_unmatched_placeholder() {
        let params: [(&str, &str); 0] = [];
        assert_eq!(resolve_path("/pets/{id}", &params), "/pets/{id}");
    }

    #[test]
    fn ignores_unknown_parameter() {
        assert_eq!(resolve_path("/pets", &[("id", "1")]), "/pets");
    }

    #[test]
    fn replaces_only_first_duplicate_placeholder() {
        assert_eq!(resolve_path("/a/{x}/{x}", &[("x", "v")]), "/a/v/{x}");
    }

    #[test]
    fn applies_parameters_in_order() {
        let path = resolve_path(
            "/repos/{owner}/{repo}/issues/{number}",
            &[("owner", "rust-lang"), ("repo", "rust"), ("number", "1")],
        );
        assert_eq!(path, "/repos/rust-lang/rust/issues/1");
    }

    #[test]
    fn encodes_like_uri_components() {
        let path = resolve_path("/files/{name}", &[("name", "a b/c?d=(e)!")]);
        assert_eq!(path, "/files/a%20b%2Fc%3Fd%3D(e)!");
    }
}
