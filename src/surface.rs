//! Rendering-surface boundary.
//!
//! The engine never touches concrete visible nodes. It drives an abstract
//! [`Surface`] through opaque [`NodeHandle`]s and leaves node lifecycle,
//! styling, and attachment details to the host. [`MemorySurface`] is a full
//! in-memory implementation used by the tests and the demo; hosts targeting a
//! real render tree implement the trait themselves.

use std::fmt;

use crate::error::SurfaceError;

/// Opaque reference to a node owned by a [`Surface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub u64);

/// Root handles handed to `call_function` callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elements {
    /// Host-provided container the engine was constructed with.
    pub container: NodeHandle,
    /// Wrapper the engine created inside the container.
    pub wrapper: NodeHandle,
    /// The cursor node.
    pub cursor: NodeHandle,
}

/// Operations the engine needs from a rendering surface.
///
/// Structural operations return `Err` instead of panicking when a handle is
/// stale; the engine recovers locally (logs and skips the step).
pub trait Surface {
    fn create_text_node(&mut self, value: &str) -> NodeHandle;

    fn create_container(&mut self, class_hint: &str) -> NodeHandle;

    fn insert_before(
        &mut self,
        parent: NodeHandle,
        node: NodeHandle,
        reference: NodeHandle,
    ) -> Result<(), SurfaceError>;

    fn append_child(&mut self, parent: NodeHandle, node: NodeHandle) -> Result<(), SurfaceError>;

    fn remove_child(&mut self, parent: NodeHandle, node: NodeHandle) -> Result<(), SurfaceError>;

    /// Replace a node's inner content. Used for cursor glyph updates.
    fn set_inner_content(&mut self, node: NodeHandle, value: &str) -> Result<(), SurfaceError>;

    /// Detach `node` from its current parent and re-insert it immediately
    /// before `reference`.
    fn move_before(&mut self, reference: NodeHandle, node: NodeHandle)
        -> Result<(), SurfaceError>;

    /// Detach `node` from its current parent and re-insert it immediately
    /// after `reference`.
    fn move_after(&mut self, reference: NodeHandle, node: NodeHandle) -> Result<(), SurfaceError>;
}

#[derive(Debug, Clone)]
struct MemNode {
    value: Option<String>,
    class_hint: Option<String>,
    inner: String,
    children: Vec<NodeHandle>,
    parent: Option<NodeHandle>,
}

/// Arena-backed surface: every node lives in an indexed slot and handles are
/// slot ids. Removal detaches a subtree but keeps slots allocated, so stale
/// handles stay distinguishable from out-of-range ones.
#[derive(Debug, Default)]
pub struct MemorySurface {
    nodes: Vec<MemNode>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, node: MemNode) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len() as u64);
        self.nodes.push(node);
        handle
    }

    fn node(&self, handle: NodeHandle) -> Result<&MemNode, SurfaceError> {
        self.nodes
            .get(handle.0 as usize)
            .ok_or(SurfaceError::UnknownHandle { handle })
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut MemNode, SurfaceError> {
        self.nodes
            .get_mut(handle.0 as usize)
            .ok_or(SurfaceError::UnknownHandle { handle })
    }

    fn detach(&mut self, node: NodeHandle) -> Result<(), SurfaceError> {
        let parent = self.node(node)?.parent;
        if let Some(parent) = parent {
            let siblings = &mut self.node_mut(parent)?.children;
            siblings.retain(|child| *child != node);
        }
        self.node_mut(node)?.parent = None;
        Ok(())
    }

    /// Index of `node` within its parent's child list.
    fn position_in_parent(&self, node: NodeHandle) -> Result<(NodeHandle, usize), SurfaceError> {
        let parent = self
            .node(node)?
            .parent
            .ok_or(SurfaceError::DetachedReference { reference: node })?;
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|child| *child == node)
            .ok_or(SurfaceError::NotAChild { parent, node })?;
        Ok((parent, index))
    }

    /// Concatenated text-node values of a subtree. Container inner content
    /// (e.g. the cursor glyph) is deliberately excluded.
    pub fn text_content(&self, handle: NodeHandle) -> String {
        let Ok(node) = self.node(handle) else {
            return String::new();
        };
        if let Some(value) = &node.value {
            return value.clone();
        }
        node.children
            .iter()
            .map(|child| self.text_content(*child))
            .collect()
    }

    /// Markup-ish dump of a subtree for structural assertions.
    pub fn render(&self, handle: NodeHandle) -> String {
        let Ok(node) = self.node(handle) else {
            return String::new();
        };
        if let Some(value) = &node.value {
            return value.clone();
        }
        let tag = node.class_hint.as_deref().unwrap_or("span");
        let children: String = node.children.iter().map(|child| self.render(*child)).collect();
        format!("<{tag}>{children}{}</{tag}>", node.inner)
    }

    pub fn child_count(&self, handle: NodeHandle) -> usize {
        self.node(handle).map(|node| node.children.len()).unwrap_or(0)
    }

    pub fn parent_of(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.node(handle).ok().and_then(|node| node.parent)
    }

    pub fn class_of(&self, handle: NodeHandle) -> Option<&str> {
        self.node(handle).ok().and_then(|node| node.class_hint.as_deref())
    }

    pub fn inner_content(&self, handle: NodeHandle) -> Option<&str> {
        self.node(handle).ok().map(|node| node.inner.as_str())
    }
}

impl Surface for MemorySurface {
    fn create_text_node(&mut self, value: &str) -> NodeHandle {
        self.alloc(MemNode {
            value: Some(value.to_string()),
            class_hint: None,
            inner: String::new(),
            children: Vec::new(),
            parent: None,
        })
    }

    fn create_container(&mut self, class_hint: &str) -> NodeHandle {
        self.alloc(MemNode {
            value: None,
            class_hint: Some(class_hint.to_string()),
            inner: String::new(),
            children: Vec::new(),
            parent: None,
        })
    }

    fn insert_before(
        &mut self,
        parent: NodeHandle,
        node: NodeHandle,
        reference: NodeHandle,
    ) -> Result<(), SurfaceError> {
        self.node(node)?;
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|child| *child == reference)
            .ok_or(SurfaceError::NotAChild {
                parent,
                node: reference,
            })?;
        self.detach(node)?;
        self.node_mut(parent)?.children.insert(index, node);
        self.node_mut(node)?.parent = Some(parent);
        Ok(())
    }

    fn append_child(&mut self, parent: NodeHandle, node: NodeHandle) -> Result<(), SurfaceError> {
        self.node(parent)?;
        self.detach(node)?;
        self.node_mut(parent)?.children.push(node);
        self.node_mut(node)?.parent = Some(parent);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeHandle, node: NodeHandle) -> Result<(), SurfaceError> {
        let found = self.node(parent)?.children.contains(&node);
        if !found {
            return Err(SurfaceError::NotAChild { parent, node });
        }
        self.node_mut(parent)?.children.retain(|child| *child != node);
        self.node_mut(node)?.parent = None;
        Ok(())
    }

    fn set_inner_content(&mut self, node: NodeHandle, value: &str) -> Result<(), SurfaceError> {
        self.node_mut(node)?.inner = value.to_string();
        Ok(())
    }

    fn move_before(
        &mut self,
        reference: NodeHandle,
        node: NodeHandle,
    ) -> Result<(), SurfaceError> {
        let (parent, _) = self.position_in_parent(reference)?;
        self.detach(node)?;
        // Recompute: detaching may have shifted the reference index.
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|child| *child == reference)
            .ok_or(SurfaceError::NotAChild {
                parent,
                node: reference,
            })?;
        self.node_mut(parent)?.children.insert(index, node);
        self.node_mut(node)?.parent = Some(parent);
        Ok(())
    }

    fn move_after(&mut self, reference: NodeHandle, node: NodeHandle) -> Result<(), SurfaceError> {
        let (parent, _) = self.position_in_parent(reference)?;
        self.detach(node)?;
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|child| *child == reference)
            .ok_or(SurfaceError::NotAChild {
                parent,
                node: reference,
            })?;
        self.node_mut(parent)?.children.insert(index + 1, node);
        self.node_mut(node)?.parent = Some(parent);
        Ok(())
    }
}

impl fmt::Display for MemorySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemorySurface({} nodes)", self.nodes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySurface, Surface};
    use crate::error::SurfaceError;

    #[test]
    fn append_and_text_content() {
        let mut surface = MemorySurface::new();
        let root = surface.create_container("root");
        let a = surface.create_text_node("a");
        let b = surface.create_text_node("b");
        surface.append_child(root, a).unwrap();
        surface.append_child(root, b).unwrap();
        assert_eq!(surface.text_content(root), "ab");
    }

    #[test]
    fn insert_before_orders_children() {
        let mut surface = MemorySurface::new();
        let root = surface.create_container("root");
        let cursor = surface.create_container("cursor");
        surface.append_child(root, cursor).unwrap();
        let a = surface.create_text_node("a");
        surface.insert_before(root, a, cursor).unwrap();
        let b = surface.create_text_node("b");
        surface.insert_before(root, b, cursor).unwrap();
        assert_eq!(surface.text_content(root), "ab");
        assert_eq!(surface.child_count(root), 3);
    }

    #[test]
    fn remove_child_rejects_non_children() {
        let mut surface = MemorySurface::new();
        let root = surface.create_container("root");
        let stray = surface.create_text_node("x");
        assert_eq!(
            surface.remove_child(root, stray),
            Err(SurfaceError::NotAChild {
                parent: root,
                node: stray
            })
        );
    }

    #[test]
    fn move_before_relocates_across_parents() {
        let mut surface = MemorySurface::new();
        let root = surface.create_container("root");
        let tag = surface.create_container("b");
        surface.append_child(root, tag).unwrap();
        let inner = surface.create_text_node("i");
        surface.append_child(tag, inner).unwrap();
        let cursor = surface.create_container("cursor");
        surface.append_child(root, cursor).unwrap();

        surface.move_before(inner, cursor).unwrap();
        assert_eq!(surface.parent_of(cursor), Some(tag));
        assert_eq!(surface.child_count(tag), 2);
    }

    #[test]
    fn move_after_detached_reference_fails() {
        let mut surface = MemorySurface::new();
        let loose = surface.create_text_node("x");
        let node = surface.create_container("c");
        assert_eq!(
            surface.move_after(loose, node),
            Err(SurfaceError::DetachedReference { reference: loose })
        );
    }

    #[test]
    fn inner_content_excluded_from_text() {
        let mut surface = MemorySurface::new();
        let root = surface.create_container("root");
        let cursor = surface.create_container("cursor");
        surface.append_child(root, cursor).unwrap();
        surface.set_inner_content(cursor, "|").unwrap();
        let a = surface.create_text_node("a");
        surface.insert_before(root, a, cursor).unwrap();
        assert_eq!(surface.text_content(root), "a");
        assert_eq!(surface.render(root), "<root>a<cursor>|</cursor></root>");
    }
}
