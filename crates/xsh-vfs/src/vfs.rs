use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;
use xsh_tags::{TagRegistry, TagStorage};

use crate::error::{VfsError, VfsResult};
use crate::node::{Node, NodeId, NodeKind};
use crate::overlay::{Overlay, Policy};
use crate::path::{normalize, parent_and_name, split_absolute};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    Host,
    Library,
    Remote,
}

#[derive(Debug, Clone)]
pub struct MountRecord {
    pub vfs_path: String,
    pub origin: String,
    pub kind: MountKind,
}

#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub overlays: Vec<u32>,
    pub kinds: Vec<&'static str>,
}

impl DirEntry {
    /// Entries observed with more than one node kind are rendered with `!`
    /// in tree/listing output (§3.2).
    pub fn is_conflicting(&self) -> bool {
        let mut unique = self.kinds.clone();
        unique.sort_unstable();
        unique.dedup();
        unique.len() > 1
    }
}

/// The layered store: an ordered sequence of overlays plus the tag registry
/// and storage that index nodes across all of them (§3, §4.1).
pub struct Vfs {
    overlays: Vec<Overlay>,
    next_node_id: NodeId,
    pub tag_registry: TagRegistry,
    pub tag_storage: TagStorage,
    pub mounts: Vec<MountRecord>,
    pub mount_allowed: bool,
    pub cwd: String,
    pub policy: Policy,
}

fn resolve_in_overlay(overlay: &Overlay, path: &str) -> VfsResult<Option<NodeId>> {
    let comps = split_absolute(path)?;
    let mut current = overlay.root;
    for comp in comps {
        let Some(node) = overlay.get(current) else { return Ok(None) };
        let Some(&next) = node.children.get(comp) else { return Ok(None) };
        current = next;
    }
    Ok(Some(current))
}

/// Walks every parent edge from `start` towards the overlay root(s),
/// returning whether `candidate` is `start` itself or one of its ancestors
/// (§5: `link` must not let a node become its own ancestor).
fn is_self_or_ancestor(overlay: &Overlay, candidate: NodeId, start: NodeId) -> bool {
    let mut stack = vec![start];
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == candidate {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        if let Some(node) = overlay.get(current) {
            stack.extend(node.parents.iter().copied());
        }
    }
    false
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs {
    pub fn new() -> Self {
        let mut vfs = Vfs {
            overlays: Vec::new(),
            next_node_id: 1,
            tag_registry: TagRegistry::new(),
            tag_storage: TagStorage::new(),
            mounts: Vec::new(),
            mount_allowed: true,
            cwd: "/".to_owned(),
            policy: Policy::Manual,
        };
        let root_id = vfs.alloc_id();
        vfs.overlays.push(Overlay::new(0, "base", root_id));
        vfs
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    /// Adds a new, empty, non-base overlay and returns its id (§3.2).
    pub fn add_overlay(&mut self, name: impl Into<String>) -> u32 {
        let id = self.overlays.len() as u32;
        let root_id = self.alloc_id();
        self.overlays.push(Overlay::new(id, name, root_id));
        id
    }

    pub fn overlay(&self, id: u32) -> VfsResult<&Overlay> {
        self.overlays.get(id as usize).ok_or(VfsError::OverlayNotFound(id))
    }

    pub fn overlay_mut(&mut self, id: u32) -> VfsResult<&mut Overlay> {
        self.overlays.get_mut(id as usize).ok_or(VfsError::OverlayNotFound(id))
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn normalize(&self, path: &str) -> String {
        normalize(path, &self.cwd)
    }

    /// `resolveMulti` (§4.1): every overlay whose root chain contains `p`.
    pub fn resolve_multi(&self, path: &str) -> VfsResult<Vec<(u32, NodeId)>> {
        let mut hits = Vec::new();
        for overlay in &self.overlays {
            if let Some(id) = resolve_in_overlay(overlay, path)? {
                hits.push((overlay.id, id));
            }
        }
        Ok(hits)
    }

    /// `resolveForOverlay` (§4.1): single node or a hard error.
    pub fn resolve_for_overlay(&self, path: &str, ovl: u32) -> VfsResult<NodeId> {
        self.try_resolve_for_overlay(path, ovl)?.ok_or_else(|| VfsError::NotFound(path.to_owned()))
    }

    /// `tryResolveForOverlay` (§4.1): total variant.
    pub fn try_resolve_for_overlay(&self, path: &str, ovl: u32) -> VfsResult<Option<NodeId>> {
        let overlay = self.overlay(ovl)?;
        resolve_in_overlay(overlay, path)
    }

    /// Overlays that currently contain `self.cwd` as a directory (§3.2).
    pub fn scope(&self) -> Vec<u32> {
        self.overlays
            .iter()
            .filter_map(|ovl| match resolve_in_overlay(ovl, &self.cwd) {
                Ok(Some(id)) => ovl.get(id).filter(|n| n.is_directory()).map(|_| ovl.id),
                _ => None,
            })
            .collect()
    }

    /// Picks an overlay for an op when the caller didn't pin one, per the
    /// working directory's scope and the active policy (§3.2, §4.1).
    pub fn pick_overlay(&self, path: &str) -> VfsResult<u32> {
        let hits = self.resolve_multi(path)?;
        let scope = self.scope();
        let candidates: Vec<u32> = hits.iter().map(|(o, _)| *o).filter(|o| scope.contains(o)).collect();
        let candidates = if candidates.is_empty() { hits.iter().map(|(o, _)| *o).collect() } else { candidates };
        match self.policy {
            Policy::Oldest => candidates.into_iter().min().ok_or_else(|| VfsError::NotFound(path.to_owned())),
            Policy::Newest => candidates.into_iter().max().ok_or_else(|| VfsError::NotFound(path.to_owned())),
            Policy::Manual => match candidates.len() {
                0 => Err(VfsError::NotFound(path.to_owned())),
                1 => Ok(candidates[0]),
                _ => Err(VfsError::AmbiguousOverlay(path.to_owned())),
            },
        }
    }

    fn ensure_dir_path(&mut self, ovl: u32, path: &str) -> VfsResult<NodeId> {
        let comps = split_absolute(path)?;
        if ovl as usize >= self.overlays.len() {
            return Err(VfsError::OverlayNotFound(ovl));
        }
        let ovl_idx = ovl as usize;
        let mut current = self.overlays[ovl_idx].root;
        for comp in comps {
            let existing = self.overlays[ovl_idx].get(current).and_then(|n| n.children.get(comp).copied());
            current = match existing {
                Some(id) => {
                    let node = self.overlays[ovl_idx].get(id).expect("child present in arena");
                    if !node.is_directory() {
                        return Err(VfsError::NotADirectory(path.to_owned()));
                    }
                    id
                }
                None => {
                    let new_id = self.alloc_id();
                    let mut node = Node::new(new_id, comp, NodeKind::Dir);
                    node.parents.push(current);
                    let overlay = &mut self.overlays[ovl_idx];
                    overlay.arena.insert(new_id, node);
                    overlay.get_mut(current).unwrap().children.insert(comp.to_owned(), new_id);
                    new_id
                }
            };
        }
        self.overlays[ovl_idx].mark_dirty();
        Ok(current)
    }

    /// `mkdir(p, ovl)` (§4.1): idempotent; creates every missing ancestor.
    pub fn mkdir(&mut self, path: &str, ovl: u32) -> VfsResult<NodeId> {
        self.ensure_dir_path(ovl, path)
    }

    fn attach_child(&mut self, ovl: u32, parent_path: &str, name: &str, kind: NodeKind) -> VfsResult<NodeId> {
        let parent_id = self.ensure_dir_path(ovl, parent_path)?;
        {
            let overlay = self.overlay(ovl)?;
            if let Some(&existing) = overlay.get(parent_id).unwrap().children.get(name) {
                return Ok(existing);
            }
        }
        let new_id = self.alloc_id();
        let overlay = self.overlay_mut(ovl)?;
        let mut node = Node::new(new_id, name, kind);
        node.parents.push(parent_id);
        overlay.arena.insert(new_id, node);
        overlay.get_mut(parent_id).unwrap().children.insert(name.to_owned(), new_id);
        overlay.mark_dirty();
        Ok(new_id)
    }

    /// `touch(p, ovl)` (§4.1): create an empty `File` if absent.
    pub fn touch(&mut self, path: &str, ovl: u32) -> VfsResult<NodeId> {
        let (parent, name) = parent_and_name(path)?;
        if let Some(id) = self.try_resolve_for_overlay(path, ovl)? {
            let overlay = self.overlay(ovl)?;
            let node = overlay.get(id).unwrap();
            if !matches!(node.kind, NodeKind::File(_)) {
                return Err(VfsError::NotAFile(path.to_owned()));
            }
            return Ok(id);
        }
        self.attach_child(ovl, &parent, name, NodeKind::File(Vec::new()))
    }

    /// `write(p, data, ovl)` (§4.1): sets content, creating the path if
    /// absent; fails on non-`File` kinds.
    pub fn write(&mut self, path: &str, data: Vec<u8>, ovl: u32) -> VfsResult<()> {
        let id = match self.try_resolve_for_overlay(path, ovl)? {
            Some(id) => id,
            None => {
                let (parent, name) = parent_and_name(path)?;
                self.attach_child(ovl, &parent, name, NodeKind::File(Vec::new()))?
            }
        };
        let overlay = self.overlay_mut(ovl)?;
        let node = overlay.get_mut(id).unwrap();
        if !node.kind.is_writable_leaf() {
            return Err(VfsError::NotWritable(path.to_owned()));
        }
        node.kind = NodeKind::File(data);
        overlay.mark_dirty();
        Ok(())
    }

    /// `read(p, opt ovl)` (§4.1). Without a pinned overlay there must be
    /// exactly one readable hit.
    pub fn read(&self, path: &str, ovl: Option<u32>) -> VfsResult<Vec<u8>> {
        let id = match ovl {
            Some(ovl) => self.resolve_for_overlay(path, ovl)?,
            None => {
                let hits = self.resolve_multi(path)?;
                match hits.len() {
                    0 => return Err(VfsError::NotFound(path.to_owned())),
                    1 => hits[0].1,
                    _ => return Err(VfsError::Ambiguous(path.to_owned())),
                }
            }
        };
        let ovl_id = ovl.unwrap_or_else(|| self.resolve_multi(path).unwrap()[0].0);
        let overlay = self.overlay(ovl_id)?;
        let node = overlay.get(id).ok_or_else(|| VfsError::NotFound(path.to_owned()))?;
        if node.is_directory() {
            return Err(VfsError::IsDirectory(path.to_owned()));
        }
        Ok(node.read_bytes())
    }

    /// `rm(p, ovl)` (§4.1): detaches from parent; destroys the node once no
    /// parent lists it. Clears tag storage on destruction (§4.3).
    pub fn rm(&mut self, path: &str, ovl: u32) -> VfsResult<()> {
        if path == "/" {
            return Err(VfsError::CannotRemoveRoot);
        }
        let (parent_path, name) = parent_and_name(path)?;
        if ovl as usize >= self.overlays.len() {
            return Err(VfsError::OverlayNotFound(ovl));
        }
        let ovl_idx = ovl as usize;
        let overlay = &mut self.overlays[ovl_idx];
        let parent_id = resolve_in_overlay(overlay, &parent_path)?.ok_or_else(|| VfsError::NotFound(path.to_owned()))?;
        let Some(child_id) = overlay.get(parent_id).unwrap().children.get(name).copied() else {
            return Err(VfsError::NotFound(path.to_owned()));
        };
        overlay.get_mut(parent_id).unwrap().children.shift_remove(name);
        let destroyed = {
            let node = overlay.get_mut(child_id).unwrap();
            node.parents.retain(|&p| p != parent_id);
            node.parents.is_empty()
        };
        if destroyed {
            overlay.arena.remove(&child_id);
        }
        overlay.mark_dirty();
        if destroyed {
            self.tag_storage.clear(child_id);
        }
        Ok(())
    }

    /// `mv(src, dst, ovl)` (§4.1): atomic detach + re-attach, renaming if
    /// basenames differ.
    pub fn mv(&mut self, src: &str, dst: &str, ovl: u32) -> VfsResult<()> {
        let (src_parent_path, src_name) = parent_and_name(src)?;
        let (dst_parent_path, dst_name) = parent_and_name(dst)?;
        let overlay = self.overlay_mut(ovl)?;
        let src_parent = resolve_in_overlay(overlay, &src_parent_path)?.ok_or_else(|| VfsError::NotFound(src.to_owned()))?;
        let Some(node_id) = overlay.get(src_parent).unwrap().children.get(src_name).copied() else {
            return Err(VfsError::NotFound(src.to_owned()));
        };
        let dst_parent = resolve_in_overlay(overlay, &dst_parent_path)?.ok_or_else(|| VfsError::NotFound(dst.to_owned()))?;
        if !overlay.get(dst_parent).unwrap().is_directory() {
            return Err(VfsError::NotADirectory(dst.to_owned()));
        }
        overlay.get_mut(src_parent).unwrap().children.shift_remove(src_name);
        {
            let node = overlay.get_mut(node_id).unwrap();
            node.parents.retain(|&p| p != src_parent);
            node.parents.push(dst_parent);
            node.name = dst_name.to_owned();
        }
        overlay.get_mut(dst_parent).unwrap().children.insert(dst_name.to_owned(), node_id);
        overlay.mark_dirty();
        Ok(())
    }

    /// `link(src, dst, ovl)` (§4.1): adds a second parent edge to the same
    /// node at `dst`; the node becomes shared.
    pub fn link(&mut self, src: &str, dst: &str, ovl: u32) -> VfsResult<()> {
        let node_id = self.resolve_for_overlay(src, ovl)?;
        let (dst_parent_path, dst_name) = parent_and_name(dst)?;
        let overlay = self.overlay_mut(ovl)?;
        let dst_parent = resolve_in_overlay(overlay, &dst_parent_path)?.ok_or_else(|| VfsError::NotFound(dst.to_owned()))?;
        if !overlay.get(dst_parent).unwrap().is_directory() {
            return Err(VfsError::NotADirectory(dst.to_owned()));
        }
        if is_self_or_ancestor(overlay, node_id, dst_parent) {
            return Err(VfsError::WouldCreateCycle(dst.to_owned()));
        }
        overlay.get_mut(dst_parent).unwrap().children.insert(dst_name.to_owned(), node_id);
        overlay.get_mut(node_id).unwrap().parents.push(dst_parent);
        overlay.mark_dirty();
        Ok(())
    }

    /// `addNode(dir, node, ovl)` (§4.1): attaches a pre-built node under
    /// `dir`, used by AST/plan constructors.
    pub fn add_node(&mut self, dir: &str, name: &str, kind: NodeKind, ovl: u32) -> VfsResult<NodeId> {
        self.attach_child(ovl, dir, name, kind)
    }

    pub fn node(&self, ovl: u32, id: NodeId) -> VfsResult<&Node> {
        self.overlay(ovl)?.get(id).ok_or(VfsError::OverlayNotFound(ovl))
    }

    pub fn node_mut(&mut self, ovl: u32, id: NodeId) -> VfsResult<&mut Node> {
        self.overlay_mut(ovl)?.get_mut(id).ok_or(VfsError::OverlayNotFound(ovl))
    }

    /// `listDir(p, scope)` (§4.1): union listing across the given overlays,
    /// each entry annotated with which overlays contribute it and which
    /// kinds were seen.
    pub fn list_dir(&self, path: &str, scope: &[u32]) -> VfsResult<Vec<DirEntry>> {
        let mut merged: indexmap::IndexMap<String, DirEntry> = indexmap::IndexMap::new();
        let mut any_hit = false;
        for &ovl_id in scope {
            let Ok(overlay) = self.overlay(ovl_id) else { continue };
            let Some(dir_id) = resolve_in_overlay(overlay, path)? else { continue };
            let Some(dir_node) = overlay.get(dir_id) else { continue };
            any_hit = true;
            for (name, &child_id) in &dir_node.children {
                let child = overlay.get(child_id).unwrap();
                let entry = merged.entry(name.clone()).or_insert_with(|| DirEntry { name: name.clone(), overlays: Vec::new(), kinds: Vec::new() });
                entry.overlays.push(ovl_id);
                entry.kinds.push(child.kind.type_tag());
            }
        }
        if !any_hit {
            return Err(VfsError::NotFound(path.to_owned()));
        }
        Ok(merged.into_values().collect())
    }

    pub fn mount_list(&self) -> &[MountRecord] {
        &self.mounts
    }

    pub fn unmount(&mut self, vfs_path: &str) {
        self.mounts.retain(|m| m.vfs_path != vfs_path);
    }

    pub fn set_mount_allowed(&mut self, allowed: bool) {
        self.mount_allowed = allowed;
    }

    pub fn map_to_host_path(&self, vfs_path: &str) -> Option<PathBuf> {
        self.mounts
            .iter()
            .filter(|m| vfs_path.starts_with(&m.vfs_path))
            .max_by_key(|m| m.vfs_path.len())
            .map(|m| {
                let rest = vfs_path.strip_prefix(&m.vfs_path).unwrap_or("").trim_start_matches('/');
                PathBuf::from(&m.origin).join(rest)
            })
    }

    pub fn map_from_host_path(&self, host_path: &std::path::Path) -> Option<String> {
        for m in &self.mounts {
            if m.kind != MountKind::Host {
                continue;
            }
            if let Ok(rest) = host_path.strip_prefix(&m.origin) {
                let mut out = m.vfs_path.clone();
                for comp in rest.components() {
                    out.push('/');
                    out.push_str(&comp.as_os_str().to_string_lossy());
                }
                return Some(out);
            }
        }
        None
    }

    pub fn register_mount(&mut self, vfs_path: impl Into<String>, origin: impl Into<String>, kind: MountKind) {
        debug!(vfs_path = %self.cwd, "registering mount");
        self.mounts.push(MountRecord { vfs_path: vfs_path.into(), origin: origin.into(), kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mkdir_touch_write_read_roundtrip() {
        let mut vfs = Vfs::new();
        vfs.mkdir("/a/b", 0).unwrap();
        vfs.write("/a/b/f", b"hello".to_vec(), 0).unwrap();
        assert_eq!(vfs.read("/a/b/f", Some(0)).unwrap(), b"hello");
    }

    #[test]
    fn write_on_directory_fails() {
        let mut vfs = Vfs::new();
        vfs.mkdir("/a", 0).unwrap();
        let err = vfs.write("/a", b"x".to_vec(), 0).unwrap_err();
        assert!(matches!(err, VfsError::NotWritable(_)));
    }

    #[test]
    fn overlay_union_listing_and_conflict() {
        let mut vfs = Vfs::new();
        vfs.mkdir("/x", 0).unwrap();
        let ovl1 = vfs.add_overlay("top");
        vfs.mkdir("/x", ovl1).unwrap();
        vfs.touch("/x/same", 0).unwrap();
        vfs.mkdir("/x/same", ovl1).unwrap();
        let entries = vfs.list_dir("/x", &[0, ovl1]).unwrap();
        let same = entries.iter().find(|e| e.name == "same").unwrap();
        assert_eq!(same.overlays.len(), 2);
        assert!(same.is_conflicting());
    }

    #[test]
    fn rm_detaches_and_destroys_when_unshared() {
        let mut vfs = Vfs::new();
        vfs.touch("/f", 0).unwrap();
        vfs.rm("/f", 0).unwrap();
        assert!(vfs.try_resolve_for_overlay("/f", 0).unwrap().is_none());
    }

    #[test]
    fn link_keeps_node_alive_while_one_parent_remains() {
        let mut vfs = Vfs::new();
        vfs.mkdir("/a", 0).unwrap();
        vfs.mkdir("/b", 0).unwrap();
        vfs.touch("/a/f", 0).unwrap();
        vfs.link("/a/f", "/b/f", 0).unwrap();
        vfs.rm("/a/f", 0).unwrap();
        assert!(vfs.try_resolve_for_overlay("/b/f", 0).unwrap().is_some());
    }

    #[test]
    fn link_into_own_subtree_is_rejected() {
        let mut vfs = Vfs::new();
        vfs.mkdir("/a/b/c", 0).unwrap();
        let err = vfs.link("/a", "/a/b/c/loop", 0).unwrap_err();
        assert!(matches!(err, VfsError::WouldCreateCycle(_)));
    }

    #[test]
    fn link_onto_self_is_rejected() {
        let mut vfs = Vfs::new();
        vfs.mkdir("/a", 0).unwrap();
        let err = vfs.link("/a", "/a/self", 0).unwrap_err();
        assert!(matches!(err, VfsError::WouldCreateCycle(_)));
    }

    #[test]
    fn manual_policy_is_ambiguous_with_two_hits() {
        let mut vfs = Vfs::new();
        vfs.policy = Policy::Manual;
        vfs.touch("/f", 0).unwrap();
        let ovl1 = vfs.add_overlay("top");
        vfs.touch("/f", ovl1).unwrap();
        let err = vfs.pick_overlay("/f").unwrap_err();
        assert!(matches!(err, VfsError::AmbiguousOverlay(_)));
    }
}
