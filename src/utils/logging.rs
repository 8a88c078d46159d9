use serde::Serialize;

/// Serializes `value` as indented JSON, or a placeholder naming the serializer error.
pub(crate) fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"))
}

/// Runs `log_action` with the pretty JSON form of `value`, only when DEBUG is enabled,
/// so reconciliation plans are not serialized on every request.
pub(crate) fn with_pretty_json_debug<T, F>(value: &T, log_action: F)
where
    T: Serialize,
    F: FnOnce(&str),
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    log_action(pretty_json(value).as_str());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgwarden_acl_core::{GrantMatrix, Identifier, Privilege, PrivilegeSet, diff};

    #[test]
    fn plans_render_as_camel_case_json() {
        let desired: GrantMatrix = [(
            Identifier::parse("movies").unwrap(),
            PrivilegeSet::from([Privilege::Select]),
        )]
        .into_iter()
        .collect();
        let rendered = pretty_json(&diff(&GrantMatrix::new(), &desired));
        assert!(rendered.contains("\"tablesToGrantDefault\""));
        assert!(rendered.contains("\"SELECT\""));
    }
}
