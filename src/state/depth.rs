//! Discovery tree used for depth limiting
//!
//! The tree is rooted at the seed URL. Every edge records that a URL was first
//! discovered on its parent page, so a node's depth is the number of link hops
//! from the seed along the first path that reached it.
//!
//! Nodes live in an arena and are indexed by URL string, which makes both the
//! parent lookup and the "already in the tree" check constant time.

use std::collections::HashMap;

/// Handle of a node in the depth tree arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct TreeNode {
    value: String,
    children: Vec<NodeId>,
    depth: u32,
}

/// A node returned by [`DepthTracker::insert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthNode {
    /// Arena handle, `None` for a detached node
    pub id: Option<NodeId>,
    pub value: String,
    pub depth: u32,
}

impl DepthNode {
    /// A node outside the tree, returned while depth limiting is disabled
    fn detached(value: &str) -> Self {
        Self {
            id: None,
            value: value.to_string(),
            depth: 0,
        }
    }

    pub fn is_detached(&self) -> bool {
        self.id.is_none()
    }
}

/// Rooted discovery tree keyed by URL string
#[derive(Debug)]
pub struct DepthTracker {
    nodes: Vec<TreeNode>,
    index: HashMap<String, NodeId>,
    enabled: bool,
}

impl DepthTracker {
    /// Creates a tracker rooted at the seed URL (depth 0)
    pub fn new(root: &str) -> Self {
        let mut tracker = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            enabled: true,
        };
        tracker.push_node(root, 0);
        tracker
    }

    /// Creates a tracker that records nothing
    ///
    /// Every insertion yields a detached node, so a URL is never rejected for
    /// lack of a known parent.
    pub fn disabled() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records that `url` was discovered on `parent`
    ///
    /// Returns the node for `url`, or `None` if `parent` is not in the tree.
    /// When `url` is already in the tree its existing node is returned, so the
    /// depth is always that of the first path that reached it.
    pub fn insert(&mut self, url: &str, parent: &str) -> Option<DepthNode> {
        if !self.enabled {
            return Some(DepthNode::detached(url));
        }

        let parent_id = *self.index.get(parent)?;

        if let Some(&existing) = self.index.get(url) {
            return Some(self.node(existing));
        }

        let depth = self.nodes[parent_id.0].depth + 1;
        let id = self.push_node(url, depth);
        self.nodes[parent_id.0].children.push(id);

        Some(self.node(id))
    }

    /// Depth of a URL already in the tree
    pub fn depth_of(&self, url: &str) -> Option<u32> {
        self.index.get(url).map(|id| self.nodes[id.0].depth)
    }

    /// URLs first discovered on `url`, in discovery order
    pub fn children_of(&self, url: &str) -> Vec<&str> {
        self.index
            .get(url)
            .map(|id| {
                self.nodes[id.0]
                    .children
                    .iter()
                    .map(|child| self.nodes[child.0].value.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    /// Number of nodes, including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push_node(&mut self, value: &str, depth: u32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            value: value.to_string(),
            children: Vec::new(),
            depth,
        });
        self.index.insert(value.to_string(), id);
        id
    }

    fn node(&self, id: NodeId) -> DepthNode {
        let node = &self.nodes[id.0];
        DepthNode {
            id: Some(id),
            value: node.value.clone(),
            depth: node.depth,
        }
    }
}
