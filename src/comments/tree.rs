//! Arena-backed comment/reply tree
//!
//! Nodes live in a `Vec` and refer to each other by index, so arbitrarily deep
//! reply chains need no reference counting and the whole tree serializes as a
//! flat list. Removed nodes leave a tombstone slot; indices are never reused.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Anything that can sit in a reply tree
pub trait ThreadItem {
    fn id(&self) -> &str;
    fn parent_id(&self) -> Option<&str>;
    fn created_at(&self) -> DateTime<Utc>;
}

/// Position of a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct Node<T> {
    pub item: T,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct CommentTree<T> {
    nodes: Vec<Option<Node<T>>>,
    index: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
}

/// One row of a depth-first rendering
#[derive(Debug, Clone, Copy)]
pub struct FlatEntry<'a, T> {
    pub depth: usize,
    pub item: &'a T,
}

impl<T> Default for CommentTree<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            roots: Vec::new(),
        }
    }
}

impl<T: ThreadItem> CommentTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a flat list in any order. Items whose parent is not
    /// in the list become roots; duplicate ids keep the first occurrence.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut tree = Self::new();

        let mut parents = Vec::new();
        for item in items {
            if tree.index.contains_key(item.id()) {
                continue;
            }
            let id = NodeId(tree.nodes.len());
            parents.push(item.parent_id().map(str::to_string));
            tree.index.insert(item.id().to_string(), id);
            tree.nodes.push(Some(Node {
                item,
                parent: None,
                children: Vec::new(),
            }));
        }

        for (slot, parent) in parents.into_iter().enumerate() {
            let id = NodeId(slot);
            let parent = parent
                .and_then(|p| tree.index.get(&p).copied())
                .filter(|p| *p != id);
            match parent {
                Some(p) if !tree.is_ancestor(id, p) => {
                    tree.link(id, p);
                }
                _ => tree.roots.push(id),
            }
        }

        tree.sort_all();
        tree
    }

    fn link(&mut self, child: NodeId, parent: NodeId) {
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    /// Whether `ancestor` appears on the parent chain above `node`
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn sort_all(&mut self) {
        let mut roots = std::mem::take(&mut self.roots);
        self.sort_ids(&mut roots);
        self.roots = roots;

        for slot in 0..self.nodes.len() {
            let mut children = match self.nodes[slot].as_mut() {
                Some(node) => std::mem::take(&mut node.children),
                None => continue,
            };
            self.sort_ids(&mut children);
            if let Some(node) = self.nodes[slot].as_mut() {
                node.children = children;
            }
        }
    }

    fn sort_ids(&self, ids: &mut [NodeId]) {
        ids.sort_by_key(|id| {
            (
                self.node(*id).map(|n| n.item.created_at()),
                *id,
            )
        });
    }

    fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.lookup(id).map(|n| &n.item)
    }

    fn lookup(&self, id: &str) -> Option<&Node<T>> {
        self.index.get(id).and_then(|nid| self.node(*nid))
    }

    pub fn roots(&self) -> impl Iterator<Item = &T> + '_ {
        self.roots.iter().filter_map(|id| self.node(*id)).map(|n| &n.item)
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Direct replies to `id`, oldest first
    pub fn replies(&self, id: &str) -> Vec<&T> {
        self.lookup(id)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|c| self.node(*c))
                    .map(|n| &n.item)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parent(&self, id: &str) -> Option<&T> {
        self.lookup(id)
            .and_then(|n| n.parent)
            .and_then(|p| self.node(p))
            .map(|n| &n.item)
    }

    /// Zero for roots
    pub fn depth(&self, id: &str) -> Option<usize> {
        let mut node = self.lookup(id)?;
        let mut depth = 0;
        while let Some(parent) = node.parent.and_then(|p| self.node(p)) {
            depth += 1;
            node = parent;
        }
        Some(depth)
    }

    /// Number of replies below `id` at any depth
    pub fn descendant_count(&self, id: &str) -> usize {
        let Some(&start) = self.index.get(id) else {
            return 0;
        };
        self.subtree(start).len() - 1
    }

    /// `start` followed by everything beneath it, depth first
    fn subtree(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Add a comment. Replies to an unknown parent become roots. Returns false
    /// if the id is already present.
    pub fn insert(&mut self, item: T) -> bool {
        if self.index.contains_key(item.id()) {
            return false;
        }

        let parent = item.parent_id().and_then(|p| self.index.get(p).copied());
        let id = NodeId(self.nodes.len());
        self.index.insert(item.id().to_string(), id);
        self.nodes.push(Some(Node {
            item,
            parent: None,
            children: Vec::new(),
        }));

        match parent {
            Some(p) => {
                self.link(id, p);
                let mut children = self.node(p).map(|n| n.children.clone()).unwrap_or_default();
                self.sort_ids(&mut children);
                if let Some(node) = self.node_mut(p) {
                    node.children = children;
                }
            }
            None => {
                self.roots.push(id);
                let mut roots = std::mem::take(&mut self.roots);
                self.sort_ids(&mut roots);
                self.roots = roots;
            }
        }
        true
    }

    /// Remove a comment and all of its replies, returning the removed items
    /// root first.
    pub fn remove(&mut self, id: &str) -> Vec<T> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };

        let parent = self.node(start).and_then(|n| n.parent);
        match parent {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.children.retain(|c| *c != start);
                }
            }
            None => self.roots.retain(|r| *r != start),
        }

        let mut removed = Vec::new();
        for nid in self.subtree(start) {
            if let Some(node) = self.nodes[nid.0].take() {
                self.index.remove(node.item.id());
                removed.push(node.item);
            }
        }
        removed
    }

    /// Depth-first rendering order with indentation depth
    pub fn flatten(&self) -> Vec<FlatEntry<'_, T>> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(NodeId, usize)> = self.roots.iter().rev().map(|r| (*r, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            if let Some(node) = self.node(id) {
                out.push(FlatEntry {
                    depth,
                    item: &node.item,
                });
                stack.extend(node.children.iter().rev().map(|c| (*c, depth + 1)));
            }
        }
        out
    }

    /// A page of top-level comments (1-based `page`), oldest first
    pub fn page_of_roots(&self, page: u32, limit: u32) -> Vec<&T> {
        let limit = limit.max(1) as usize;
        let skip = (page.max(1) as usize - 1) * limit;
        self.roots().skip(skip).take(limit).collect()
    }

    pub fn root_pages(&self, limit: u32) -> u32 {
        let limit = limit.max(1) as usize;
        self.roots.len().div_ceil(limit) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq)]
    struct C {
        id: &'static str,
        parent: Option<&'static str>,
        at: i64,
    }

    impl ThreadItem for C {
        fn id(&self) -> &str {
            self.id
        }
        fn parent_id(&self) -> Option<&str> {
            self.parent
        }
        fn created_at(&self) -> DateTime<Utc> {
            Utc.timestamp_opt(self.at, 0).unwrap()
        }
    }

    fn c(id: &'static str, parent: Option<&'static str>, at: i64) -> C {
        C { id, parent, at }
    }

    fn sample() -> CommentTree<C> {
        // Deliberately out of order
        CommentTree::from_items(vec![
            c("r1a", Some("r1"), 5),
            c("r2", None, 2),
            c("r1", None, 1),
            c("r1b", Some("r1"), 4),
            c("r1a1", Some("r1a"), 6),
        ])
    }

    #[test]
    fn test_builds_roots_and_replies_in_time_order() {
        let tree = sample();
        let roots: Vec<_> = tree.roots().map(|c| c.id).collect();
        assert_eq!(roots, vec!["r1", "r2"]);
        let replies: Vec<_> = tree.replies("r1").iter().map(|c| c.id).collect();
        assert_eq!(replies, vec!["r1b", "r1a"]);
    }

    #[test]
    fn test_depth_and_parent() {
        let tree = sample();
        assert_eq!(tree.depth("r1"), Some(0));
        assert_eq!(tree.depth("r1a1"), Some(2));
        assert_eq!(tree.depth("missing"), None);
        assert_eq!(tree.parent("r1a1").map(|c| c.id), Some("r1a"));
    }

    #[test]
    fn test_flatten_is_depth_first() {
        let tree = sample();
        let rows: Vec<_> = tree.flatten().iter().map(|e| (e.item.id, e.depth)).collect();
        assert_eq!(
            rows,
            vec![("r1", 0), ("r1b", 1), ("r1a", 1), ("r1a1", 2), ("r2", 0)]
        );
    }

    #[test]
    fn test_orphans_become_roots() {
        let tree = CommentTree::from_items(vec![c("x", Some("gone"), 1), c("y", None, 2)]);
        assert_eq!(tree.root_count(), 2);
        assert_eq!(tree.depth("x"), Some(0));
    }

    #[test]
    fn test_cycle_is_broken() {
        let tree = CommentTree::from_items(vec![c("a", Some("b"), 1), c("b", Some("a"), 2)]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.flatten().len(), 2);
        assert!(tree.root_count() >= 1);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let tree = CommentTree::from_items(vec![c("a", None, 1), c("a", None, 9)]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("a").map(|c| c.at), Some(1));
    }

    #[test]
    fn test_insert_reply_and_counts() {
        let mut tree = sample();
        assert!(tree.insert(c("r2a", Some("r2"), 10)));
        assert!(!tree.insert(c("r2a", Some("r2"), 11)));
        assert_eq!(tree.replies("r2").len(), 1);
        assert_eq!(tree.descendant_count("r1"), 3);
        assert_eq!(tree.descendant_count("r2"), 1);
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = sample();
        let removed: Vec<_> = tree.remove("r1a").into_iter().map(|c| c.id).collect();
        assert_eq!(removed, vec!["r1a", "r1a1"]);
        assert!(!tree.contains("r1a1"));
        assert_eq!(tree.replies("r1").len(), 1);
        assert_eq!(tree.len(), 3);
        assert!(tree.remove("r1a").is_empty());
    }

    #[test]
    fn test_remove_root() {
        let mut tree = sample();
        tree.remove("r1");
        let roots: Vec<_> = tree.roots().map(|c| c.id).collect();
        assert_eq!(roots, vec!["r2"]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_page_of_roots() {
        let tree = CommentTree::from_items((0..7).map(|i| C {
            id: Box::leak(format!("c{}", i).into_boxed_str()),
            parent: None,
            at: i,
        }));
        assert_eq!(tree.root_pages(3), 3);
        let ids: Vec<_> = tree.page_of_roots(3, 3).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c6"]);
        assert!(tree.page_of_roots(4, 3).is_empty());
    }
}
