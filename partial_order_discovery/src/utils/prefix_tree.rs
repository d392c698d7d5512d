use std::collections::HashMap;

/// Index of a node inside a [`PrefixTree`]
pub type PrefixTreeNodeIndex = usize;

/// Errors raised while walking a [`PrefixTree`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefixTreeError {
    /// A node that has to carry content does not.
    ///
    /// This can only happen if the tree itself is corrupted.
    #[error("prefix tree node {0} has no content")]
    MissingContent(PrefixTreeNodeIndex),
}

#[derive(Debug, Clone)]
/// Node of a [`PrefixTree`]
pub struct PrefixTreeNode<T> {
    label: Option<String>,
    content: Option<T>,
    children: HashMap<String, PrefixTreeNodeIndex>,
}

impl<T> PrefixTreeNode<T> {
    /// Label of the edge leading to this node (`None` for the root)
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
    /// Payload of the node
    pub fn content(&self) -> Option<&T> {
        self.content.as_ref()
    }
    /// Mutable payload of the node
    pub fn content_mut(&mut self) -> Option<&mut T> {
        self.content.as_mut()
    }
    /// Move the payload out of the node
    pub fn take_content(&mut self) -> Option<T> {
        self.content.take()
    }
    /// `true` if at least one path continues after this node
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
    /// Child reached via `label`
    pub fn child(&self, label: &str) -> Option<PrefixTreeNodeIndex> {
        self.children.get(label).copied()
    }
}

#[derive(Debug, Clone)]
///
/// Trie over label sequences
///
/// Sequences sharing a prefix share the nodes of that prefix.
/// Every node carries a payload of type `T`; new payloads are derived from the payload
/// of the parent node when a sequence leaves the existing tree.
///
/// Nodes are stored in an arena and addressed by [`PrefixTreeNodeIndex`].
pub struct PrefixTree<T> {
    nodes: Vec<PrefixTreeNode<T>>,
}

impl<T> PrefixTree<T> {
    /// Index of the root node
    pub const ROOT: PrefixTreeNodeIndex = 0;

    /// Create a tree consisting of a root node with the given payload
    pub fn new(root_content: T) -> Self {
        Self {
            nodes: vec![PrefixTreeNode {
                label: None,
                content: Some(root_content),
                children: HashMap::new(),
            }],
        }
    }

    /// Number of nodes (including the root)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Access a node
    pub fn node(&self, index: PrefixTreeNodeIndex) -> Option<&PrefixTreeNode<T>> {
        self.nodes.get(index)
    }

    /// Mutable access to a node
    pub fn node_mut(&mut self, index: PrefixTreeNodeIndex) -> Option<&mut PrefixTreeNode<T>> {
        self.nodes.get_mut(index)
    }

    ///
    /// Insert a path into the tree and return the index of the node it ends in
    ///
    /// Whenever the path leaves the existing tree, `new_step` is called with the step label
    /// and the parent's payload to create the payload of the new child. Right before the
    /// child is attached, `on_child_added` is called with the parent's index and payload.
    /// Errors of `new_step` abort the insertion.
    ///
    pub fn insert<S, E, F, C>(
        &mut self,
        path: &[S],
        mut new_step: F,
        mut on_child_added: C,
    ) -> Result<PrefixTreeNodeIndex, E>
    where
        S: AsRef<str>,
        E: From<PrefixTreeError>,
        F: FnMut(&str, &T) -> Result<T, E>,
        C: FnMut(PrefixTreeNodeIndex, &mut T),
    {
        let mut current = Self::ROOT;
        for step in path {
            let step = step.as_ref();
            if let Some(child) = self.nodes[current].child(step) {
                current = child;
                continue;
            }
            let parent = &mut self.nodes[current];
            let parent_content = parent
                .content
                .as_mut()
                .ok_or(PrefixTreeError::MissingContent(current))?;
            let content = new_step(step, &*parent_content)?;
            on_child_added(current, parent_content);

            let child = self.nodes.len();
            self.nodes[current].children.insert(step.to_string(), child);
            self.nodes.push(PrefixTreeNode {
                label: Some(step.to_string()),
                content: Some(content),
                children: HashMap::new(),
            });
            current = child;
        }
        if self.nodes[current].content.is_none() {
            return Err(PrefixTreeError::MissingContent(current).into());
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_counting(tree: &mut PrefixTree<Vec<String>>, path: &[&str]) -> PrefixTreeNodeIndex {
        tree.insert(
            path,
            |step, parent| {
                let mut next = parent.clone();
                next.push(step.to_string());
                Ok::<_, PrefixTreeError>(next)
            },
            |_, _| {},
        ).unwrap()
    }

    #[test]
    fn shared_prefixes_share_nodes() {
        let mut tree = PrefixTree::new(Vec::new());
        let abc = insert_counting(&mut tree, &["a", "b", "c"]);
        let abd = insert_counting(&mut tree, &["a", "b", "d"]);
        assert_ne!(abc, abd);
        // root + a + b + c + d
        assert_eq!(tree.len(), 5);
        assert_eq!(insert_counting(&mut tree, &["a", "b", "c"]), abc);
        assert_eq!(
            tree.node(abd).unwrap().content().unwrap(),
            &vec!["a".to_string(), "b".to_string(), "d".to_string()]
        );
        assert_eq!(tree.node(abd).unwrap().label(), Some("d"));
    }

    #[test]
    fn empty_path_ends_in_root() {
        let mut tree = PrefixTree::new(Vec::new());
        assert_eq!(insert_counting(&mut tree, &[]), PrefixTree::<Vec<String>>::ROOT);
    }

    #[test]
    fn child_callback_sees_parent() {
        let mut tree = PrefixTree::new(0_u32);
        let mut parents = Vec::new();
        tree.insert(&["a"], |_, p| Ok::<_, PrefixTreeError>(p + 1), |_, _| {}).unwrap();
        tree.insert(
            &["a", "b"],
            |_, p| Ok::<_, PrefixTreeError>(p + 1),
            |idx, content| parents.push((idx, *content)),
        ).unwrap();
        assert_eq!(parents, vec![(1, 1)]);
        assert!(tree.node(1).unwrap().has_children());
    }

    #[test]
    fn missing_content_is_reported() {
        let mut tree = PrefixTree::new(0_u32);
        tree.insert(&["a"], |_, p| Ok::<_, PrefixTreeError>(p + 1), |_, _| {}).unwrap();
        tree.node_mut(1).unwrap().content = None;
        assert_eq!(
            tree.insert(&["a", "b"], |_, p| Ok::<_, PrefixTreeError>(p + 1), |_, _| {}),
            Err(PrefixTreeError::MissingContent(1))
        );
        assert_eq!(
            tree.insert(&["a"], |_, p| Ok::<_, PrefixTreeError>(p + 1), |_, _| {}),
            Err(PrefixTreeError::MissingContent(1))
        );
    }
}
