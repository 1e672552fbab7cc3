use crate::error::VfsError;

/// Splits an absolute path into its non-empty components. `.` and `..` are
/// expected to already be resolved by the caller against the working
/// directory (§4.1) — this only validates and tokenizes.
pub fn split_absolute(path: &str) -> Result<Vec<&str>, VfsError> {
    if !path.starts_with('/') {
        return Err(VfsError::InvalidPath(path.to_owned()));
    }
    Ok(path.split('/').filter(|c| !c.is_empty()).collect())
}

/// Resolves `.`/`..` segments in `path` against `cwd`, producing a clean
/// absolute path. Relative paths are joined onto `cwd` first.
pub fn normalize(path: &str, cwd: &str) -> String {
    let joined = if path.starts_with('/') { path.to_owned() } else { format!("{}/{}", cwd.trim_end_matches('/'), path) };
    let mut stack: Vec<&str> = Vec::new();
    for comp in joined.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    format!("/{}", stack.join("/"))
}

pub fn parent_and_name(path: &str) -> Result<(String, &str), VfsError> {
    let comps = split_absolute(path)?;
    if comps.is_empty() {
        return Err(VfsError::InvalidPath(path.to_owned()));
    }
    let name = comps[comps.len() - 1];
    let parent = format!("/{}", comps[..comps.len() - 1].join("/"));
    Ok((parent, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dotdot() {
        assert_eq!(normalize("../b", "/a/x"), "/a/b");
        assert_eq!(normalize("/a/./b/../c", "/"), "/a/c");
    }

    #[test]
    fn split_rejects_relative() {
        assert!(split_absolute("a/b").is_err());
        assert_eq!(split_absolute("/a/b").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn parent_and_name_splits_last_component() {
        let (parent, name) = parent_and_name("/a/b/c").unwrap();
        assert_eq!(parent, "/a/b");
        assert_eq!(name, "c");
    }
}
