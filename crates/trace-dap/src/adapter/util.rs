//! Small adapter utilities.
//! - normalize_path: case-folded lexical path key
//! - source_name: basename for DAP `Source.name`

/// Canonical key for a source path. Separators are unified, `.`/`..` are
/// resolved lexically and the result is lower-cased, so the client and the
/// runtime agree on one spelling of each file.
pub(crate) fn normalize_path(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let mut normalized = String::with_capacity(unified.len());
    if absolute {
        normalized.push('/');
    }
    normalized.push_str(&parts.join("/"));
    normalized.to_lowercase()
}

pub(crate) fn source_name(path: &str) -> String {
    path.rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or(path)
        .to_string()
}
