//! Pinned model tree.
//!
//! The sidebar's pinned section is an ordered forest of model ids and named
//! categories. Every function here borrows the input tree and builds a new
//! one; nothing is mutated in place and nothing can fail.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One entry of the pinned tree.
///
/// On the wire a leaf is a bare JSON string and a category is
/// `{"name": ..., "children": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PinnedItem {
    /// A model id, resolved against the model registry at render time.
    Leaf(String),
    /// A named group. Names are labels only and may repeat.
    Category {
        name: String,
        children: Vec<PinnedItem>,
    },
}

/// The top-level forest.
pub type PinnedTree = Vec<PinnedItem>;

impl PinnedItem {
    pub fn leaf(id: impl Into<String>) -> Self {
        Self::Leaf(id.into())
    }

    pub fn category(name: impl Into<String>, children: Vec<PinnedItem>) -> Self {
        Self::Category {
            name: name.into(),
            children,
        }
    }

    /// Decode one entry from loosely-typed settings JSON.
    ///
    /// Returns `None` for anything that is neither a string nor an object
    /// with a string `name`. A category without `children` is empty.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(id) => Some(Self::Leaf(id.clone())),
            Value::Object(map) => {
                let name = map.get("name")?.as_str()?.to_string();
                let children = map.get("children").map(tree_from_value).unwrap_or_default();
                Some(Self::Category { name, children })
            }
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for PinnedItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        PinnedItem::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a model id or a category object"))
    }
}

/// Decode a whole tree, skipping malformed entries instead of failing.
pub fn tree_from_value(value: &Value) -> PinnedTree {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let parsed = PinnedItem::from_value(item);
                if parsed.is_none() {
                    tracing::warn!(entry = %item, "skipping malformed pinned entry");
                }
                parsed
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(value = %other, "pinned tree is not a list, treating as empty");
            Vec::new()
        }
    }
}

/// `deserialize_with` adapter: absent, `null` or malformed input never errors.
pub fn deserialize_tree<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PinnedTree, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(tree_from_value).unwrap_or_default())
}

/// Every leaf id in depth-first pre-order.
pub fn get_pinned_model_ids(items: &[PinnedItem]) -> Vec<String> {
    fn collect(items: &[PinnedItem], ids: &mut Vec<String>) {
        for item in items {
            match item {
                PinnedItem::Leaf(id) => ids.push(id.clone()),
                PinnedItem::Category { children, .. } => collect(children, ids),
            }
        }
    }

    let mut ids = Vec::new();
    collect(items, &mut ids);
    ids
}

/// Whether `model_id` is pinned anywhere in the tree.
pub fn is_pinned(items: &[PinnedItem], model_id: &str) -> bool {
    items.iter().any(|item| match item {
        PinnedItem::Leaf(id) => id == model_id,
        PinnedItem::Category { children, .. } => is_pinned(children, model_id),
    })
}

/// Remove every occurrence of `model_id`, dropping categories left empty.
pub fn remove_model_from_tree(items: &[PinnedItem], model_id: &str) -> PinnedTree {
    retain_leaves(items, &|id: &str| id != model_id)
}

/// Append `model_id` to the end of the top level.
///
/// Ids already present are appended again; callers that want a toggle use
/// [`toggle_pin`].
pub fn add_model_to_tree(items: &[PinnedItem], model_id: &str) -> PinnedTree {
    let mut tree = items.to_vec();
    tree.push(PinnedItem::leaf(model_id));
    tree
}

/// Sidebar pin button: unpin if pinned anywhere, otherwise pin at the top level.
pub fn toggle_pin(items: &[PinnedItem], model_id: &str) -> PinnedTree {
    if is_pinned(items, model_id) {
        remove_model_from_tree(items, model_id)
    } else {
        add_model_to_tree(items, model_id)
    }
}

/// Drop leaves the registry doesn't know about, pruning emptied categories.
pub fn retain_known(items: &[PinnedItem], is_known: impl Fn(&str) -> bool) -> PinnedTree {
    retain_leaves(items, &is_known)
}

fn retain_leaves(items: &[PinnedItem], keep: &dyn Fn(&str) -> bool) -> PinnedTree {
    items
        .iter()
        .filter_map(|item| match item {
            PinnedItem::Leaf(id) => keep(id.as_str()).then(|| item.clone()),
            PinnedItem::Category { name, children } => {
                let children = retain_leaves(children, keep);
                (!children.is_empty()).then(|| PinnedItem::Category {
                    name: name.clone(),
                    children,
                })
            }
        })
        .collect()
}

/// Move the top-level entry at `from` so it ends up at index `to`.
///
/// An out-of-range `from` leaves the tree unchanged; `to` is clamped.
pub fn move_top_level(items: &[PinnedItem], from: usize, to: usize) -> PinnedTree {
    let mut tree = items.to_vec();
    if from >= tree.len() {
        return tree;
    }
    let item = tree.remove(from);
    let to = to.min(tree.len());
    tree.insert(to, item);
    tree
}

/// Append an empty category to the top level.
pub fn add_category(items: &[PinnedItem], name: &str) -> PinnedTree {
    let mut tree = items.to_vec();
    tree.push(PinnedItem::category(name, Vec::new()));
    tree
}

/// Rename every category called `old`, at any depth.
pub fn rename_category(items: &[PinnedItem], old: &str, new: &str) -> PinnedTree {
    items
        .iter()
        .map(|item| match item {
            PinnedItem::Leaf(_) => item.clone(),
            PinnedItem::Category { name, children } => PinnedItem::Category {
                name: if name == old { new.to_string() } else { name.clone() },
                children: rename_category(children, old, new),
            },
        })
        .collect()
}

/// File `model_id` under the first top-level category named `category`.
///
/// Existing occurrences are removed first (with the usual pruning), so a
/// category that only held this id is recreated at the end of the top level.
pub fn move_model_to_category(items: &[PinnedItem], model_id: &str, category: &str) -> PinnedTree {
    let mut tree = remove_model_from_tree(items, model_id);
    let target = tree.iter_mut().find_map(|item| match item {
        PinnedItem::Category { name, children } if name.as_str() == category => Some(children),
        _ => None,
    });
    match target {
        Some(children) => children.push(PinnedItem::leaf(model_id)),
        None => tree.push(PinnedItem::category(category, vec![PinnedItem::leaf(model_id)])),
    }
    tree
}

/// What a sidebar row shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineEntry {
    Model(String),
    Category(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub depth: usize,
    pub entry: OutlineEntry,
}

/// Flatten the tree into display rows, pre-order, with nesting depth.
pub fn outline(items: &[PinnedItem]) -> Vec<OutlineRow> {
    fn walk(items: &[PinnedItem], depth: usize, rows: &mut Vec<OutlineRow>) {
        for item in items {
            match item {
                PinnedItem::Leaf(id) => rows.push(OutlineRow {
                    depth,
                    entry: OutlineEntry::Model(id.clone()),
                }),
                PinnedItem::Category { name, children } => {
                    rows.push(OutlineRow {
                        depth,
                        entry: OutlineEntry::Category(name.clone()),
                    });
                    walk(children, depth + 1, rows);
                }
            }
        }
    }

    let mut rows = Vec::new();
    walk(items, 0, &mut rows);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(id: &str) -> PinnedItem {
        PinnedItem::leaf(id)
    }

    /// `["a", {name: "G", children: ["b", "c"]}]`
    fn sample() -> PinnedTree {
        vec![leaf("a"), PinnedItem::category("G", vec![leaf("b"), leaf("c")])]
    }

    fn nested() -> PinnedTree {
        vec![
            leaf("x"),
            PinnedItem::category(
                "Outer",
                vec![
                    leaf("y"),
                    PinnedItem::category("Inner", vec![leaf("x")]),
                    leaf("z"),
                ],
            ),
            PinnedItem::category("Solo", vec![leaf("x")]),
            leaf("w"),
        ]
    }

    #[test]
    fn ids_are_preorder() {
        assert_eq!(get_pinned_model_ids(&sample()), vec!["a", "b", "c"]);
        assert_eq!(get_pinned_model_ids(&nested()), vec!["x", "y", "x", "z", "x", "w"]);
    }

    #[test]
    fn ids_of_empty_tree_and_empty_category() {
        assert!(get_pinned_model_ids(&[]).is_empty());
        let tree = vec![PinnedItem::category("Empty", vec![]), leaf("a")];
        assert_eq!(get_pinned_model_ids(&tree), vec!["a"]);
    }

    #[test]
    fn remove_keeps_sibling_order() {
        let removed = remove_model_from_tree(&sample(), "b");
        assert_eq!(
            removed,
            vec![leaf("a"), PinnedItem::category("G", vec![leaf("c")])]
        );
    }

    #[test]
    fn remove_prunes_emptied_category() {
        let once = remove_model_from_tree(&sample(), "c");
        let twice = remove_model_from_tree(&once, "b");
        assert_eq!(twice, vec![leaf("a")]);
    }

    #[test]
    fn remove_is_total_across_depths() {
        let tree = nested();
        let removed = remove_model_from_tree(&tree, "x");
        assert!(!get_pinned_model_ids(&removed).contains(&"x".to_string()));
        // Inner and Solo only held "x"
        assert_eq!(
            removed,
            vec![
                PinnedItem::category("Outer", vec![leaf("y"), leaf("z")]),
                leaf("w"),
            ]
        );
        // input untouched
        assert_eq!(tree, nested());
    }

    #[test]
    fn remove_prunes_transitively() {
        let tree = vec![PinnedItem::category(
            "A",
            vec![PinnedItem::category("B", vec![PinnedItem::category("C", vec![leaf("only")])])],
        )];
        assert!(remove_model_from_tree(&tree, "only").is_empty());
    }

    #[test]
    fn remove_absent_id_keeps_ids() {
        let tree = nested();
        let removed = remove_model_from_tree(&tree, "missing");
        assert_eq!(get_pinned_model_ids(&removed), get_pinned_model_ids(&tree));
        assert_eq!(removed, tree);
    }

    #[test]
    fn remove_is_idempotent() {
        for id in ["x", "y", "w", "missing"] {
            let once = remove_model_from_tree(&nested(), id);
            let twice = remove_model_from_tree(&once, id);
            assert_eq!(once, twice, "removing {id} twice");
        }
    }

    #[test]
    fn add_appends_at_top_level() {
        let added = add_model_to_tree(&sample(), "d");
        assert_eq!(
            added,
            vec![
                leaf("a"),
                PinnedItem::category("G", vec![leaf("b"), leaf("c")]),
                leaf("d"),
            ]
        );
        assert_eq!(get_pinned_model_ids(&added), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn add_does_not_deduplicate() {
        let added = add_model_to_tree(&sample(), "b");
        assert_eq!(get_pinned_model_ids(&added), vec!["a", "b", "c", "b"]);
    }

    #[test]
    fn toggle_pins_then_unpins() {
        let pinned = toggle_pin(&sample(), "d");
        assert!(is_pinned(&pinned, "d"));
        let unpinned = toggle_pin(&pinned, "d");
        assert_eq!(unpinned, sample());

        let nested_unpinned = toggle_pin(&sample(), "c");
        assert!(!is_pinned(&nested_unpinned, "c"));
    }

    #[test]
    fn retain_known_filters_and_prunes() {
        let known = ["y", "w"];
        let kept = retain_known(&nested(), |id| known.contains(&id));
        assert_eq!(
            kept,
            vec![PinnedItem::category("Outer", vec![leaf("y")]), leaf("w")]
        );
    }

    #[test]
    fn move_top_level_reorders() {
        let tree = vec![leaf("a"), leaf("b"), leaf("c")];
        assert_eq!(move_top_level(&tree, 0, 2), vec![leaf("b"), leaf("c"), leaf("a")]);
        assert_eq!(move_top_level(&tree, 2, 0), vec![leaf("c"), leaf("a"), leaf("b")]);
        assert_eq!(move_top_level(&tree, 1, 99), vec![leaf("a"), leaf("c"), leaf("b")]);
        assert_eq!(move_top_level(&tree, 5, 0), tree);
    }

    #[test]
    fn rename_reaches_nested_categories() {
        let tree = vec![PinnedItem::category(
            "G",
            vec![PinnedItem::category("G", vec![leaf("a")])],
        )];
        let renamed = rename_category(&tree, "G", "H");
        assert_eq!(
            renamed,
            vec![PinnedItem::category(
                "H",
                vec![PinnedItem::category("H", vec![leaf("a")])],
            )]
        );
    }

    #[test]
    fn move_to_existing_category() {
        let moved = move_model_to_category(&sample(), "a", "G");
        assert_eq!(
            moved,
            vec![PinnedItem::category("G", vec![leaf("b"), leaf("c"), leaf("a")])]
        );
    }

    #[test]
    fn move_to_new_category() {
        let moved = move_model_to_category(&sample(), "b", "New");
        assert_eq!(
            moved,
            vec![
                leaf("a"),
                PinnedItem::category("G", vec![leaf("c")]),
                PinnedItem::category("New", vec![leaf("b")]),
            ]
        );
    }

    #[test]
    fn empty_category_survives_until_pruned() {
        let tree = add_category(&sample(), "Later");
        assert_eq!(tree.len(), 3);
        let after_remove = remove_model_from_tree(&tree, "a");
        assert_eq!(after_remove, vec![PinnedItem::category("G", vec![leaf("b"), leaf("c")])]);
    }

    #[test]
    fn outline_tracks_depth() {
        let rows = outline(&sample());
        assert_eq!(
            rows,
            vec![
                OutlineRow { depth: 0, entry: OutlineEntry::Model("a".into()) },
                OutlineRow { depth: 0, entry: OutlineEntry::Category("G".into()) },
                OutlineRow { depth: 1, entry: OutlineEntry::Model("b".into()) },
                OutlineRow { depth: 1, entry: OutlineEntry::Model("c".into()) },
            ]
        );
    }

    #[test]
    fn serializes_to_settings_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value, json!(["a", {"name": "G", "children": ["b", "c"]}]));
    }

    #[test]
    fn decodes_leniently() {
        let value = json!([
            "a",
            {"name": "NoChildren"},
            42,
            {"children": ["orphan"]},
            {"name": "G", "children": ["b", null, {"name": "Deep", "children": "oops"}]},
        ]);
        let tree = tree_from_value(&value);
        assert_eq!(
            tree,
            vec![
                leaf("a"),
                PinnedItem::category("NoChildren", vec![]),
                PinnedItem::category(
                    "G",
                    vec![leaf("b"), PinnedItem::category("Deep", vec![])],
                ),
            ]
        );
        assert_eq!(get_pinned_model_ids(&tree), vec!["a", "b"]);
    }

    #[test]
    fn strict_item_decode_rejects_numbers() {
        assert!(serde_json::from_value::<PinnedItem>(json!(7)).is_err());
        let item: PinnedItem = serde_json::from_value(json!({"name": "G"})).unwrap();
        assert_eq!(item, PinnedItem::category("G", vec![]));
    }
}
