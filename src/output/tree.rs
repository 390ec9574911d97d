//! Sitemap tree assembly and rendering
//!
//! The tree is built once, after the crawl, from the frozen sitemap. Every
//! URL is placed exactly once; a URL that would need a second parent means
//! the dedup registry failed, and the build stops with an error.
//!
//! Nodes live in one flat vector and refer to each other by index, so
//! building, walking, rendering and dropping never recurse, however deep the
//! site goes.

use crate::crawler::Sitemap;
use crate::CrawlyError;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::{self, Write};

const ROOT: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    url: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Rooted tree of the crawled site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapTree {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

/// A URL in the tree and the pages first discovered on it
#[derive(Clone, Copy)]
pub struct TreeNode<'a> {
    tree: &'a SitemapTree,
    id: usize,
}

impl fmt::Debug for TreeNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("url", &self.url())
            .field("children", &self.child_count())
            .finish()
    }
}

impl<'a> TreeNode<'a> {
    fn node(&self) -> &'a Node {
        &self.tree.nodes[self.id]
    }

    /// The URL of this node
    pub fn url(&self) -> &'a str {
        &self.node().url
    }

    /// The node this one hangs under; `None` for the root
    pub fn parent(&self) -> Option<TreeNode<'a>> {
        self.node().parent.map(|id| self.tree.at(id))
    }

    /// Direct children, in the order they were recorded
    pub fn children(&self) -> impl Iterator<Item = TreeNode<'a>> + 'a {
        let tree = self.tree;
        self.node().children.iter().map(move |&id| tree.at(id))
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    /// Number of nodes in this subtree, including this one
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            count += 1;
            stack.extend(&self.tree.nodes[id].children);
        }
        count
    }

    /// Always false: a node counts itself
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Depth of this subtree; a lone node has depth 1
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.id, 1)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(self.tree.nodes[id].children.iter().map(|&c| (c, depth + 1)));
        }
        deepest
    }

    /// Finds the node for `url` in this subtree
    pub fn find(&self, url: &str) -> Option<TreeNode<'a>> {
        let found = *self.tree.index.get(url)?;

        // Walk up from the match until we reach this node or run out of parents
        let mut cursor = Some(found);
        while let Some(id) = cursor {
            if id == self.id {
                return Some(self.tree.at(found));
            }
            cursor = self.tree.nodes[id].parent;
        }
        None
    }
}

impl SitemapTree {
    fn with_root(url: &str) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        tree.push(url, None);
        tree
    }

    fn push(&mut self, url: &str, parent: Option<usize>) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            url: url.to_string(),
            parent,
            children: Vec::new(),
        });
        self.index.insert(url.to_string(), id);
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    fn at(&self, id: usize) -> TreeNode<'_> {
        TreeNode { tree: self, id }
    }

    /// The seed node
    pub fn root(&self) -> TreeNode<'_> {
        self.at(ROOT)
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the tree has at least its root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns whether `url` is placed anywhere in the tree
    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    /// Finds the node for `url` anywhere in the tree
    pub fn get(&self, url: &str) -> Option<TreeNode<'_>> {
        self.index.get(url).map(|&id| self.at(id))
    }

    /// Writes the tree with box-drawing connectors, depth first
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self)
    }
}

impl fmt::Display for SitemapTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.nodes[ROOT].url)?;

        // (node, byte length of the prefix it is drawn after, last among siblings)
        let mut prefix = String::new();
        let mut stack: Vec<(usize, usize, bool)> = Vec::new();
        push_children(&mut stack, &self.nodes[ROOT].children, 0);

        while let Some((id, prefix_len, last)) = stack.pop() {
            prefix.truncate(prefix_len);
            let connector = if last { "└── " } else { "├── " };
            writeln!(f, "{}{}{}", prefix, connector, self.nodes[id].url)?;

            prefix.push_str(if last { "    " } else { "│   " });
            push_children(&mut stack, &self.nodes[id].children, prefix.len());
        }
        Ok(())
    }
}

/// Pushes children in reverse so the first one is drawn first
fn push_children(stack: &mut Vec<(usize, usize, bool)>, children: &[usize], prefix_len: usize) {
    let count = children.len();
    for (index, &child) in children.iter().enumerate().rev() {
        stack.push((child, prefix_len, index + 1 == count));
    }
}

/// Builds the tree rooted at `root` from a finished sitemap
///
/// Each child is placed under the parent it was recorded with. Parents that
/// were never recorded as anyone's child (the seed's redirect target, for
/// example) hang directly under the root. Children keep the order they were
/// recorded in; repeated entries under the same parent are placed once.
///
/// # Errors
///
/// [`CrawlyError::InvariantViolation`] if a URL is recorded under two
/// different parents, or if part of the sitemap cannot be reached from the
/// root because it loops back on itself.
pub fn build_tree(root: &str, sitemap: &Sitemap) -> Result<SitemapTree, CrawlyError> {
    let mut parent_of: HashMap<&str, &str> = HashMap::new();
    let mut children_of: HashMap<&str, Vec<&str>> = HashMap::new();

    for (parent, children) in sitemap.iter() {
        for child in children {
            let child = child.as_str();

            if child == root {
                return Err(violation(child, root, parent));
            }

            match parent_of.get(child) {
                Some(&existing) if existing == parent => continue,
                Some(&existing) => return Err(violation(child, existing, parent)),
                None => {
                    parent_of.insert(child, parent);
                    children_of.entry(parent).or_default().push(child);
                }
            }
        }
    }

    // Parents nobody links to attach to the root, after its own children
    let mut top_level: Vec<&str> = children_of.remove(root).unwrap_or_default();
    top_level.extend(
        sitemap
            .parents()
            .filter(|parent| *parent != root && !parent_of.contains_key(parent)),
    );
    children_of.insert(root, top_level);

    let mut tree = SitemapTree::with_root(root);
    let mut placed: HashSet<&str> = HashSet::new();
    placed.insert(root);

    let mut pending = vec![(root, ROOT)];
    while let Some((url, id)) = pending.pop() {
        let Some(children) = children_of.get(url) else {
            continue;
        };
        for &child in children {
            if placed.insert(child) {
                let child_id = tree.push(child, Some(id));
                pending.push((child, child_id));
            }
        }
    }

    // Anything recorded but not placed sits on a cycle detached from the root
    if let Some((&url, &parent)) = parent_of.iter().find(|(url, _)| !placed.contains(*url)) {
        tracing::error!("Sitemap invariant failure: {} is unreachable from {}", url, root);
        return Err(CrawlyError::InvariantViolation {
            url: url.to_string(),
            first_parent: parent.to_string(),
            second_parent: root.to_string(),
        });
    }

    Ok(tree)
}

fn violation(url: &str, first_parent: &str, second_parent: &str) -> CrawlyError {
    tracing::error!(
        "Sitemap invariant failure: {} placed under {} and {}",
        url,
        first_parent,
        second_parent
    );
    CrawlyError::InvariantViolation {
        url: url.to_string(),
        first_parent: first_parent.to_string(),
        second_parent: second_parent.to_string(),
    }
}
