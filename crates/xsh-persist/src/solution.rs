use std::path::{Path, PathBuf};

use xsh_vfs::Vfs;

use crate::decode::decode_overlay;
use crate::encode::encode_overlay;
use crate::error::PersistResult;

/// Writes overlay `ovl`'s subtree to `path` (`.cxpkg`/`.cxasm`), resets its
/// dirty flag, and records `path` as its source (§3.6).
pub fn save_overlay(vfs: &mut Vfs, ovl: u32, path: impl AsRef<Path>) -> PersistResult<()> {
    let path = path.as_ref();
    let bytes = encode_overlay(vfs, ovl)?;
    std::fs::write(path, bytes)?;

    let overlay = vfs.overlay_mut(ovl)?;
    overlay.dirty = false;
    overlay.source_path = Some(path.to_owned());
    Ok(())
}

/// Loads an overlay file into overlay `ovl`, replacing its subtree, and
/// marks it as the active solution for that overlay (source path set,
/// dirty cleared).
pub fn load_overlay(vfs: &mut Vfs, ovl: u32, path: impl AsRef<Path>) -> PersistResult<()> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    decode_overlay(vfs, ovl, &bytes)?;

    let overlay = vfs.overlay_mut(ovl)?;
    overlay.dirty = false;
    overlay.source_path = Some(path.to_owned());
    Ok(())
}

/// Whether `path` looks like a solution file by extension (`.cxpkg`/`.cxasm`).
pub fn is_solution_path(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("cxpkg") | Some("cxasm"))
}

/// `solution.save` without an explicit path: reuses the overlay's last
/// source path.
pub fn save_solution(vfs: &mut Vfs, ovl: u32) -> PersistResult<PathBuf> {
    let source = vfs.overlay(ovl)?.source_path.clone().ok_or(crate::error::PersistError::NoSolutionPath(ovl))?;
    save_overlay(vfs, ovl, &source)?;
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_file() {
        let mut vfs = Vfs::new();
        let ovl = vfs.add_overlay("scratch");
        vfs.mkdir("/notes", ovl).unwrap();
        vfs.write("/notes/a.txt", b"hello".to_vec(), ovl).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.cxasm");
        save_overlay(&mut vfs, ovl, &path).unwrap();
        assert!(!vfs.overlay(ovl).unwrap().dirty);

        let mut reloaded = Vfs::new();
        let reloaded_ovl = reloaded.add_overlay("scratch");
        load_overlay(&mut reloaded, reloaded_ovl, &path).unwrap();
        assert_eq!(reloaded.read("/notes/a.txt", Some(reloaded_ovl)).unwrap(), b"hello");
    }

    #[test]
    fn recognizes_solution_extensions() {
        assert!(is_solution_path(Path::new("foo.cxpkg")));
        assert!(is_solution_path(Path::new("foo.cxasm")));
        assert!(!is_solution_path(Path::new("foo.txt")));
    }
}
