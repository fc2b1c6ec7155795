//! Cycle-gated directed link set between file paths.
//!
//! [`LinkRegistry`] is the authoritative record of which file depends on
//! which. It keeps forward and reverse adjacency for lookups in both
//! directions, and an ordered log of every accepted [`LinkRegistry::add_link`]
//! call. Recording the same link twice keeps one adjacency entry but two log
//! events; the graph builder uses the event count as edge weight.
//!
//! A link is refused when the target can already reach the source, so the
//! registry is acyclic at all times.
//!
//! # Examples
//!
//! ```
//! use bd_core::LinkRegistry;
//! use camino::Utf8Path;
//!
//! let scene = Utf8Path::new("/p/scene.blend");
//! let prop = Utf8Path::new("/p/prop.blend");
//!
//! let mut links = LinkRegistry::new();
//! assert!(links.add_link(scene, prop));
//! assert!(!links.add_link(prop, scene)); // would close a cycle
//! assert!(links.get_links(prop).is_empty());
//! assert!(links.get_reverse_links(prop).contains(scene));
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::{FxHashMap, FxHashSet};

/// Directed link set with cycle rejection and an event log.
#[derive(Debug, Clone, Default)]
pub struct LinkRegistry {
    forward: FxHashMap<Utf8PathBuf, FxHashSet<Utf8PathBuf>>,
    reverse: FxHashMap<Utf8PathBuf, FxHashSet<Utf8PathBuf>>,
    events: Vec<(Utf8PathBuf, Utf8PathBuf)>,
}

impl LinkRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `source` depends on `target`.
    ///
    /// Returns `false` without changing anything if `target` can already
    /// reach `source`, which includes `source == target`.
    pub fn add_link(&mut self, source: &Utf8Path, target: &Utf8Path) -> bool {
        if self.reaches(target, source) {
            debug!(%source, %target, "Rejected link that would form a cycle");
            return false;
        }

        self.forward
            .entry(source.to_owned())
            .or_default()
            .insert(target.to_owned());
        self.reverse
            .entry(target.to_owned())
            .or_default()
            .insert(source.to_owned());
        self.events.push((source.to_owned(), target.to_owned()));
        true
    }

    /// Returns the direct dependencies of `source`.
    #[must_use]
    pub fn get_links(&self, source: &Utf8Path) -> FxHashSet<&Utf8Path> {
        Self::neighbours(&self.forward, source)
    }

    /// Returns the files that directly depend on `target`.
    #[must_use]
    pub fn get_reverse_links(&self, target: &Utf8Path) -> FxHashSet<&Utf8Path> {
        Self::neighbours(&self.reverse, target)
    }

    /// Returns `true` if the link `source -> target` has been accepted.
    #[must_use]
    pub fn contains(&self, source: &Utf8Path, target: &Utf8Path) -> bool {
        self.forward
            .get(source)
            .is_some_and(|targets| targets.contains(target))
    }

    /// Number of times the link `source -> target` was accepted.
    #[must_use]
    pub fn multiplicity(&self, source: &Utf8Path, target: &Utf8Path) -> usize {
        self.events
            .iter()
            .filter(|(s, t)| s == source && t == target)
            .count()
    }

    /// Every accepted `add_link` call, in order, repeats included.
    pub fn link_events(&self) -> impl Iterator<Item = (&Utf8Path, &Utf8Path)> {
        self.events
            .iter()
            .map(|(source, target)| (source.as_path(), target.as_path()))
    }

    /// Distinct links, in the order they were first accepted.
    #[must_use]
    pub fn all_links(&self) -> Vec<(&Utf8Path, &Utf8Path)> {
        let mut seen = FxHashSet::default();
        self.link_events()
            .filter(|&pair| seen.insert(pair))
            .collect()
    }

    /// Number of distinct links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.forward.values().map(FxHashSet::len).sum()
    }

    /// Returns `true` if no link has been accepted.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Depth-first search over forward links from `from` looking for `to`.
    fn reaches(&self, from: &Utf8Path, to: &Utf8Path) -> bool {
        let mut visited: FxHashSet<&Utf8Path> = FxHashSet::default();
        let mut stack = vec![from];

        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            if let Some(targets) = self.forward.get(node) {
                stack.extend(
                    targets
                        .iter()
                        .map(Utf8PathBuf::as_path)
                        .filter(|t| !visited.contains(t)),
                );
            }
        }
        false
    }

    fn neighbours<'a>(
        map: &'a FxHashMap<Utf8PathBuf, FxHashSet<Utf8PathBuf>>,
        key: &Utf8Path,
    ) -> FxHashSet<&'a Utf8Path> {
        map.get(key)
            .map(|set| set.iter().map(Utf8PathBuf::as_path).collect())
            .unwrap_or_default()
    }
}
