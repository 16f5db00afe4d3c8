use serde_json::Value;

/// Walks a dotted path ("meta.checksums.sha256") through nested objects.
/// Numeric segments index into arrays. Any missing segment yields None.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Present and carrying something: not null, not an empty string
pub fn is_present(root: &Value, path: &str) -> bool {
    match resolve(root, path) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
