/// Segment-addressed access into a JSON value tree.
///
/// Shared by the `Store`, which owns the document tree, and by the merge
/// step of the transaction manager, which patches record values in place.

use serde_json::{Map, Value};

/// A write tried to descend through a value that is not an object.
///
/// `depth` is the number of segments leading to the offending value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NotAnObject {
    pub depth: usize,
}

pub(crate) fn lookup<'a>(root: &'a Value, segs: &[String]) -> Option<&'a Value> {
    segs.iter().try_fold(root, |node, seg| node.as_object()?.get(seg))
}

/// Depth (segment count) of the shallowest prefix of `segs` that is absent
/// from `root`, or `None` if the full path exists.
pub(crate) fn missing_depth(root: &Value, segs: &[String]) -> Option<usize> {
    let mut node = root;
    for (i, seg) in segs.iter().enumerate() {
        match node.as_object().and_then(|map| map.get(seg)) {
            Some(child) => node = child,
            None => return Some(i + 1),
        }
    }
    None
}

/// Writes `value` at `segs`, creating missing intermediate objects.
///
/// Returns the value previously stored there. An empty `segs` replaces the
/// whole tree.
pub(crate) fn write(root: &mut Value, segs: &[String], value: Value) -> Result<Option<Value>, NotAnObject> {
    let Some((last, parents)) = segs.split_last() else {
        return Ok(Some(std::mem::replace(root, value)));
    };

    let mut node = root;
    for (depth, seg) in parents.iter().enumerate() {
        let current = node;
        node = match current {
            Value::Object(map) => map
                .entry(seg.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return Err(NotAnObject { depth }),
        };
    }

    match node {
        Value::Object(map) => Ok(map.insert(last.clone(), value)),
        _ => Err(NotAnObject {
            depth: parents.len(),
        }),
    }
}

/// Deletes the value at `segs`, returning it. Empty `segs` never matches.
pub(crate) fn delete(root: &mut Value, segs: &[String]) -> Option<Value> {
    let (last, parents) = segs.split_last()?;
    let mut node = root;
    for seg in parents {
        node = node.as_object_mut()?.get_mut(seg)?;
    }
    node.as_object_mut()?.remove(last)
}

/// Sets (`Some`) or deletes (`None`) the value at `segs`.
pub(crate) fn put(root: &mut Value, segs: &[String], value: Option<Value>) -> Result<(), NotAnObject> {
    match value {
        Some(value) => write(root, segs, value).map(|_| ()),
        None => {
            delete(root, segs);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segs(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup() {
        let tree = json!({"camera": {"zoom": 2}, "selection": {"ids": []}});
        assert_eq!(lookup(&tree, &segs(&["camera", "zoom"])), Some(&json!(2)));
        assert_eq!(lookup(&tree, &[]), Some(&tree));
        assert_eq!(lookup(&tree, &segs(&["camera", "x"])), None);
        assert_eq!(lookup(&tree, &segs(&["camera", "zoom", "deeper"])), None);
    }

    #[test]
    fn test_null_is_present() {
        let tree = json!({"style": {"fillColor": null}});
        assert_eq!(lookup(&tree, &segs(&["style", "fillColor"])), Some(&Value::Null));
        assert_eq!(missing_depth(&tree, &segs(&["style", "fillColor"])), None);
    }

    #[test]
    fn test_missing_depth() {
        let tree = json!({"shapes": {}});
        assert_eq!(missing_depth(&tree, &segs(&["shapes"])), None);
        assert_eq!(missing_depth(&tree, &segs(&["shapes", "a", "x"])), Some(2));
        assert_eq!(missing_depth(&tree, &segs(&["camera"])), Some(1));
    }

    #[test]
    fn test_write_creates_intermediates() {
        let mut tree = json!({"shapes": {}});
        let old = write(&mut tree, &segs(&["shapes", "a", "x"]), json!(5)).unwrap();
        assert_eq!(old, None);
        assert_eq!(tree, json!({"shapes": {"a": {"x": 5}}}));
    }

    #[test]
    fn test_write_returns_previous_value() {
        let mut tree = json!({"camera": {"zoom": 1}});
        let old = write(&mut tree, &segs(&["camera", "zoom"]), json!(3)).unwrap();
        assert_eq!(old, Some(json!(1)));
        assert_eq!(tree["camera"]["zoom"], 3);
    }

    #[test]
    fn test_write_through_scalar_fails() {
        let mut tree = json!({"camera": {"zoom": 1}});
        let err = write(&mut tree, &segs(&["camera", "zoom", "x"]), json!(3)).unwrap_err();
        assert_eq!(err, NotAnObject { depth: 2 });
        assert_eq!(tree, json!({"camera": {"zoom": 1}}));
    }

    #[test]
    fn test_write_root_replaces_tree() {
        let mut tree = json!({"a": 1});
        let old = write(&mut tree, &[], json!({"b": 2})).unwrap();
        assert_eq!(old, Some(json!({"a": 1})));
        assert_eq!(tree, json!({"b": 2}));
    }

    #[test]
    fn test_delete() {
        let mut tree = json!({"shapes": {"a": {"x": 1}, "b": {"x": 2}}});
        assert_eq!(delete(&mut tree, &segs(&["shapes", "a"])), Some(json!({"x": 1})));
        assert_eq!(delete(&mut tree, &segs(&["shapes", "a"])), None);
        assert_eq!(delete(&mut tree, &[]), None);
        assert_eq!(tree, json!({"shapes": {"b": {"x": 2}}}));
    }

    #[test]
    fn test_put() {
        let mut value = json!({"x": 1});
        put(&mut value, &segs(&["y"]), Some(json!(2))).unwrap();
        put(&mut value, &segs(&["x"]), None).unwrap();
        assert_eq!(value, json!({"y": 2}));
    }
}
