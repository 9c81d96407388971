//! # Suite Ancestry
//!
//! Test suites form a tree, and the remote side recreates a suite at the same
//! relative location it had locally. That location is the chain of parent suite
//! names, root first.
//!
//! Parents are non-owning back-links, so the tree is an arena: nodes live in a
//! `Vec` and refer to their parent by index. Walking up is a plain loop.

use crate::error::{Result, ShuttleError};

/// Index of a suite inside a [`SuiteTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuiteId(usize);

impl SuiteId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct SuiteNode {
    name: String,
    parent: Option<SuiteId>,
}

/// Arena of suites linked to their parents.
#[derive(Debug, Default, Clone)]
pub struct SuiteTree {
    nodes: Vec<SuiteNode>,
}

impl SuiteTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a suite with no parent.
    pub fn add_root(&mut self, name: impl Into<String>) -> SuiteId {
        self.push(name.into(), None)
    }

    /// Adds a suite under `parent`.
    pub fn add_child(&mut self, parent: SuiteId, name: impl Into<String>) -> Result<SuiteId> {
        self.check(parent)?;
        Ok(self.push(name.into(), Some(parent)))
    }

    pub fn name(&self, id: SuiteId) -> Option<&str> {
        self.nodes.get(id.0).map(|n| n.name.as_str())
    }

    pub fn parent(&self, id: SuiteId) -> Option<SuiteId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn node(&self, id: SuiteId) -> Option<SuiteRef<'_>> {
        self.nodes.get(id.0).map(|_| SuiteRef { tree: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Path of `id`'s ancestors, see [`build_ancestor_path`].
    pub fn ancestor_path(&self, id: SuiteId) -> Result<String> {
        let node = self.node(id).ok_or(ShuttleError::UnknownSuite(id.0))?;
        Ok(build_ancestor_path(&node))
    }

    /// Builds a straight chain `names[0] -> names[1] -> ...` and returns the id
    /// of the last suite, or `None` for an empty slice.
    pub fn chain<S: AsRef<str>>(&mut self, names: &[S]) -> Option<SuiteId> {
        let mut last: Option<SuiteId> = None;
        for name in names {
            let name = name.as_ref().to_string();
            last = Some(self.push(name, last));
        }
        last
    }

    fn push(&mut self, name: String, parent: Option<SuiteId>) -> SuiteId {
        let id = SuiteId(self.nodes.len());
        self.nodes.push(SuiteNode { name, parent });
        id
    }

    fn check(&self, id: SuiteId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(ShuttleError::UnknownSuite(id.0))
        }
    }
}

/// Anything that can name itself and step to its parent.
pub trait Ancestry: Sized {
    fn suite_name(&self) -> &str;
    fn parent(&self) -> Option<Self>;
}

/// Borrowed handle to one suite in a [`SuiteTree`].
#[derive(Debug, Clone, Copy)]
pub struct SuiteRef<'a> {
    tree: &'a SuiteTree,
    id: SuiteId,
}

impl<'a> SuiteRef<'a> {
    pub fn id(&self) -> SuiteId {
        self.id
    }
}

impl<'a> Ancestry for SuiteRef<'a> {
    fn suite_name(&self) -> &str {
        &self.tree.nodes[self.id.0].name
    }

    fn parent(&self) -> Option<Self> {
        self.tree.parent(self.id).map(|id| SuiteRef { tree: self.tree, id })
    }
}

/// Joins the names of `node`'s ancestors, root first, with `/`.
///
/// `node`'s own name is not part of the result, and a root yields `""`.
/// Backslashes inside names become `/` so the path reads the same on every host.
pub fn build_ancestor_path<N: Ancestry>(node: &N) -> String {
    let mut names: Vec<String> = Vec::new();
    let mut current = node.parent();
    while let Some(suite) = current {
        names.push(suite.suite_name().replace('\\', "/"));
        current = suite.parent();
    }
    names.reverse();
    names.join("/")
}
