use crate::types::Element;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

pub type ElementPredicate = Arc<dyn Fn(&Element) -> bool + Send + Sync>;

/// Conjunction of optional predicates. An empty selector matches everything.
#[derive(Clone, Default)]
pub struct Selector {
    pub tag: Option<String>,
    pub tags: Vec<String>,
    pub required_props: Vec<String>,
    pub any_props: Vec<String>,
    pub custom: Option<ElementPredicate>,
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("tag", &self.tag)
            .field("tags", &self.tags)
            .field("required_props", &self.required_props)
            .field("any_props", &self.any_props)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl Selector {
    /// Matches every element
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_lowercase()),
            ..Self::default()
        }
    }

    pub fn tags(tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_lowercase()).collect(),
            ..Self::default()
        }
    }

    pub fn requires(mut self, props: &[&str]) -> Self {
        self.required_props.extend(props.iter().map(|p| p.to_string()));
        self
    }

    pub fn any_of(mut self, props: &[&str]) -> Self {
        self.any_props.extend(props.iter().map(|p| p.to_string()));
        self
    }

    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Element) -> bool + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(predicate));
        self
    }

    /// Tags this selector is keyed on, if any
    pub fn tag_keys(&self) -> Option<Vec<&str>> {
        match (&self.tag, self.tags.is_empty()) {
            (Some(tag), true) => Some(vec![tag.as_str()]),
            (Some(tag), false) => self
                .tags
                .contains(tag)
                .then(|| vec![tag.as_str()])
                .or(Some(Vec::new())),
            (None, false) => Some(self.tags.iter().map(String::as_str).collect()),
            (None, true) => None,
        }
    }

    /// Evaluated in order, short-circuiting: tag, tag set, required
    /// props, alternative props, custom predicate.
    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag != *tag {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| *t == element.tag) {
            return false;
        }
        if !self.required_props.iter().all(|p| element.has_property(p)) {
            return false;
        }
        if !self.any_props.is_empty() && !self.any_props.iter().any(|p| element.has_property(p)) {
            return false;
        }
        match &self.custom {
            Some(predicate) => predicate(element),
            None => true,
        }
    }

    /// Pair-wise `matches` over every element, as a baseline for `match_all`.
    pub fn match_naive(selectors: &[&Selector], elements: &[&Element]) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for (element_index, element) in elements.iter().enumerate() {
            for (selector_index, selector) in selectors.iter().enumerate() {
                if selector.matches(element) {
                    out.push((selector_index, element_index));
                }
            }
        }
        out
    }
}

/// Bulk matching. Tag-keyed selectors are resolved per tag group, the rest per
/// element; pairs are deduplicated across the two passes. Output is
/// `(selector index, element index)`, ordered by element then selector.
pub fn match_all(selectors: &[&Selector], elements: &[&Element]) -> Vec<(usize, usize)> {
    let mut by_tag: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, element) in elements.iter().enumerate() {
        by_tag.entry(element.tag.as_str()).or_default().push(index);
    }

    let mut matched: BTreeSet<(usize, usize)> = BTreeSet::new();

    for (selector_index, selector) in selectors.iter().enumerate() {
        match selector.tag_keys() {
            Some(tags) => {
                for tag in tags {
                    let Some(group) = by_tag.get(tag) else {
                        continue;
                    };
                    for &element_index in group {
                        if selector.matches(elements[element_index]) {
                            matched.insert((element_index, selector_index));
                        }
                    }
                }
            }
            None => {
                for (element_index, element) in elements.iter().enumerate() {
                    if selector.matches(element) {
                        matched.insert((element_index, selector_index));
                    }
                }
            }
        }
    }

    matched
        .into_iter()
        .map(|(element_index, selector_index)| (selector_index, element_index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::flatten_elements;

    fn tree() -> Vec<Element> {
        vec![Element::new("div")
            .with_child(Element::new("img").with_attr("src", "a.png"))
            .with_child(Element::new("img").with_attr("alt", "b"))
            .with_child(Element::new("a").with_attr("href", "/"))
            .with_child(Element::new("span").with_attr("role", "button"))]
    }

    #[test]
    fn conjunction_of_predicates() {
        let img_with_src = Selector::tag("IMG").requires(&["src"]);
        let img = Element::new("img").with_attr("src", "x");
        assert!(img_with_src.matches(&img));
        assert!(!img_with_src.matches(&Element::new("img")));
        assert!(!img_with_src.matches(&Element::new("div").with_attr("src", "x")));

        let either = Selector::any().any_of(&["href", "to"]);
        assert!(either.matches(&Element::new("a").with_attr("to", "/")));
        assert!(!either.matches(&Element::new("a")));

        let custom = Selector::tags(&["a", "button"]).when(|e| e.has_property("disabled"));
        assert!(custom.matches(&Element::new("button").with_attr("disabled", "")));
        assert!(!custom.matches(&Element::new("button")));
        assert!(!custom.matches(&Element::new("input").with_attr("disabled", "")));
    }

    #[test]
    fn empty_selector_matches_everything() {
        let tree = tree();
        let elements = flatten_elements(&tree);
        assert!(elements.iter().all(|e| Selector::any().matches(e)));
    }

    #[test]
    fn conflicting_tag_and_tag_set_match_nothing() {
        let selector = Selector {
            tag: Some("img".to_string()),
            tags: vec!["a".to_string()],
            ..Selector::default()
        };
        assert_eq!(selector.tag_keys(), Some(Vec::new()));
        assert!(!selector.matches(&Element::new("img")));
    }

    #[test]
    fn bulk_matching_agrees_with_naive() {
        let tree = tree();
        let elements = flatten_elements(&tree);
        let selectors = [
            Selector::tag("img"),
            Selector::tag("img").requires(&["alt"]),
            Selector::any().requires(&["role"]),
            Selector::tags(&["a", "span"]),
            Selector::any(),
        ];
        let refs: Vec<&Selector> = selectors.iter().collect();

        let mut naive = Selector::match_naive(&refs, &elements);
        naive.sort_by_key(|&(selector, element)| (element, selector));
        assert_eq!(match_all(&refs, &elements), naive);
    }
}
