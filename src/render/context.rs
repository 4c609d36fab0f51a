//! Ordered, named elements of one graphic

use std::collections::HashMap;

use super::types::Element;
use crate::types::Bounds;

/// Elements in insertion order with lookup by name.
///
/// Re-inserting an existing name replaces the element in place, so the
/// drawing order of a graphic is stable across regenerations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementMap {
    entries: Vec<(String, Element)>,
    index: HashMap<String, usize>,
}

impl ElementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace; returns the element previously under `name`
    pub fn insert(&mut self, name: impl Into<String>, element: impl Into<Element>) -> Option<Element> {
        let name = name.into();
        let element = element.into();
        match self.index.get(&name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, element)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, element));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Element> {
        let i = self.index.remove(name)?;
        let (_, element) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(element)
    }

    pub fn get(&self, name: &str) -> Option<&Element> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Union of every element's bounds
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::new();
        for (_, element) in &self.entries {
            bounds.union(&element.bounds());
        }
        bounds
    }

    /// Take a fresh regeneration: surviving names keep their slot, new names
    /// append, names that were not regenerated are dropped.
    pub fn apply(&mut self, fresh: Vec<(String, Element)>) {
        let keep: std::collections::HashSet<&str> = fresh.iter().map(|(n, _)| n.as_str()).collect();
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|(n, _)| !keep.contains(n.as_str()))
            .map(|(n, _)| n.clone())
            .collect();
        for name in stale {
            self.remove(&name);
        }
        for (name, element) in fresh {
            self.insert(name, element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::types::{PathData, PathElement};

    fn path(x: f64) -> PathElement {
        PathElement::outline(PathData::new().m(0.0, 0.0).l(x, x))
    }

    #[test]
    fn replaces_in_place_and_appends_new_names() {
        let mut map = ElementMap::new();
        assert!(map.insert("Boundary", path(1.0)).is_none());
        map.insert("Label0", path(2.0));
        let old = map.insert("Boundary", path(3.0));
        assert_eq!(old, Some(Element::Path(path(1.0))));
        assert_eq!(map.names(), ["Boundary", "Label0"]);
        assert_eq!(map.get("Boundary"), Some(&Element::Path(path(3.0))));
    }

    #[test]
    fn remove_keeps_lookup_consistent() {
        let mut map = ElementMap::new();
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            map.insert(*name, path(i as f64));
        }
        assert!(map.remove("A").is_some());
        assert!(map.remove("A").is_none());
        assert_eq!(map.get("C"), Some(&Element::Path(path(2.0))));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn apply_drops_stale_names() {
        let mut map = ElementMap::new();
        map.insert("Boundary", path(1.0));
        map.insert("Rotor", path(1.0));
        map.insert("Label0", path(1.0));
        map.apply(vec![
            ("Label0".to_string(), path(5.0).into()),
            ("Boundary".to_string(), path(4.0).into()),
            ("Neck".to_string(), path(6.0).into()),
        ]);
        assert_eq!(map.names(), ["Boundary", "Label0", "Neck"]);
        assert_eq!(map.bounds().max, glam::dvec2(6.0, 6.0));
    }
}
