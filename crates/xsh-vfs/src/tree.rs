use crate::error::VfsResult;
use crate::vfs::Vfs;

/// Toggles for the formatted tree printer (§4.1) — purely a presentation
/// layer over `listDir`/`resolveMulti`, no effect on the store itself.
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub box_chars: bool,
    pub show_sizes: bool,
    pub show_tags: bool,
    pub colors: bool,
    pub kind_glyph: bool,
    pub sort: bool,
    pub max_depth: Option<usize>,
    pub filter_substring: Option<String>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        TreeOptions {
            box_chars: true,
            show_sizes: false,
            show_tags: false,
            colors: false,
            kind_glyph: false,
            sort: true,
            max_depth: None,
            filter_substring: None,
        }
    }
}

fn glyph(kind: &'static str) -> char {
    match kind {
        "dir" | "mount" | "library" | "remote" | "plan" => 'd',
        "file" => 'f',
        "librarysymbol" => 's',
        "sast" => 'x',
        "cppast" => 'c',
        _ => '?',
    }
}

/// Renders `path` as a tree, descending through `scope` overlays and
/// merging entries exactly as `listDir` would at every level.
pub fn render_tree(vfs: &Vfs, path: &str, scope: &[u32], opts: &TreeOptions) -> VfsResult<String> {
    let mut out = String::new();
    render_level(vfs, path, scope, opts, 0, "", &mut out)?;
    Ok(out)
}

fn render_level(
    vfs: &Vfs,
    path: &str,
    scope: &[u32],
    opts: &TreeOptions,
    depth: usize,
    prefix: &str,
    out: &mut String,
) -> VfsResult<()> {
    if let Some(max) = opts.max_depth {
        if depth > max {
            return Ok(());
        }
    }
    let mut entries = vfs.list_dir(path, scope)?;
    if let Some(filter) = &opts.filter_substring {
        entries.retain(|e| e.name.contains(filter.as_str()));
    }
    if opts.sort {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
    }
    let count = entries.len();
    for (i, entry) in entries.iter().enumerate() {
        let last = i + 1 == count;
        let branch = if opts.box_chars {
            if last { "\u{2514}\u{2500}\u{2500} " } else { "\u{251c}\u{2500}\u{2500} " }
        } else if last {
            "`-- "
        } else {
            "|-- "
        };
        out.push_str(prefix);
        out.push_str(branch);
        if opts.kind_glyph {
            let kind = entry.kinds.first().copied().unwrap_or("?");
            out.push(glyph(kind));
            out.push(' ');
        }
        out.push_str(&entry.name);
        if entry.is_conflicting() {
            out.push('!');
        }
        out.push('\n');

        let child_path = format!("{}/{}", path.trim_end_matches('/'), entry.name);
        let child_scope: Vec<u32> = entry.overlays.clone();
        let next_prefix = format!("{prefix}{}", if opts.box_chars { if last { "    " } else { "\u{2502}   " } } else if last { "    " } else { "|   " });
        if vfs.list_dir(&child_path, &child_scope).is_ok() {
            render_level(vfs, &child_path, &child_scope, opts, depth + 1, &next_prefix, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_lists_nested_entries_sorted() {
        let mut vfs = Vfs::new();
        vfs.mkdir("/a/b", 0).unwrap();
        vfs.touch("/a/z", 0).unwrap();
        vfs.touch("/a/y", 0).unwrap();
        let rendered = render_tree(&vfs, "/a", &[0], &TreeOptions::default()).unwrap();
        let y_pos = rendered.find('y').unwrap();
        let z_pos = rendered.find('z').unwrap();
        assert!(y_pos < z_pos);
    }
}
