//! The path-resolver boundary: writing already-evaluated expression values into a resource
//! body by field path. A default, `serde_json::Value`-backed implementation is provided so
//! the crate is runnable standalone; an embedding operator may substitute its own resolver
//! (e.g. one backed by a typed CRD schema) behind the same trait.
//!
//! The strict write path (`set_at_path`, used by [`PathResolver::resolve`]) applies the
//! actual leaf write as an RFC 6902 `"add"` operation through the `json-patch` crate, the
//! same crate the teacher builds `AddOperation`/`ReplaceOperation`/`RemoveOperation` values
//! with elsewhere (`command.rs`, `finalizer.rs`, `command_controller.rs`) to mutate a
//! resource at a JSON-pointer path rather than hand-rolling the write. `"add"` only requires
//! the *immediate* parent of the target to already exist, so missing intermediate objects
//! are still walked and created locally first — `json-patch` itself has no "create every
//! missing ancestor" mode, which is why the instance-status writer's always-succeeds
//! [`blind_set`] stays hand-rolled instead of also going through the crate.

use std::fmt;

/// One variable's resolved value(s), ready to be written into a resource body.
///
/// `expressions` holds one resolved [`serde_json::Value`] per expression string declared on
/// the originating variable, in the same order. A singleton list is the common case; more
/// than one means the path is an interpolated string built from multiple expression
/// segments (§3, §9).
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub path: String,
    pub expressions: Vec<serde_json::Value>,
}

/// Outcome of a [`PathResolver::resolve`] call. Per-field failures are collected rather than
/// aborting the whole pass, mirroring how `Synchronize`'s own propagation step treats a
/// resolver error as fatal for *that* resource but not for resources resolved in the same
/// pass before it (§4.4) — the resolver itself stays fine-grained so a caller could, if it
/// wanted to, recover partially within one resource too.
#[derive(Debug, Default)]
pub struct ResolveSummary {
    pub errors: Vec<ResolverError>,
}

impl ResolveSummary {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug)]
pub struct ResolverError {
    message: String,
}

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ResolverError {}

/// Writes resolved expression values into a resource body by field path.
pub trait PathResolver {
    /// Writes each field's resolved value(s) into `root` at its path. Multiple expression
    /// values for one path are joined by string concatenation (the documented interpolation
    /// behavior). Returns a summary rather than a `Result` so one bad field path doesn't
    /// discard progress already made on the others in the same call.
    fn resolve(&self, root: &mut serde_json::Value, fields: &[FieldDescriptor]) -> ResolveSummary;

    /// Writes a single value at `path`, creating intermediate JSON objects for path segments
    /// that don't exist yet. Used exclusively by the instance-status writer (§4.5).
    fn blind_set_value_at_path(&self, root: &mut serde_json::Value, path: &str, value: serde_json::Value);
}

/// Splits a dotted field path into its segments. Paths are plain dotted identifiers —
/// bracketed array indexing is out of scope for this spec's resource templates.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|segment| !segment.is_empty())
}

/// The default [`PathResolver`], operating directly on `serde_json::Value` trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPathResolver;

impl PathResolver for JsonPathResolver {
    fn resolve(&self, root: &mut serde_json::Value, fields: &[FieldDescriptor]) -> ResolveSummary {
        let mut summary = ResolveSummary::default();

        for field in fields {
            let value = match field.expressions.as_slice() {
                [] => continue,
                [single] => single.clone(),
                many => serde_json::Value::String(
                    many.iter().map(value_to_interpolated_string).collect::<Vec<_>>().join(""),
                ),
            };

            if let Err(err) = set_at_path(root, &field.path, value) {
                summary.errors.push(err);
            }
        }

        summary
    }

    fn blind_set_value_at_path(&self, root: &mut serde_json::Value, path: &str, value: serde_json::Value) {
        blind_set(root, path, value);
    }
}

/// Renders one interpolation segment for concatenation into a path's final string value.
fn value_to_interpolated_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Writes `value` at `path`, failing if an intermediate segment exists but isn't an object.
/// The graph builder is expected to have produced a template whose structure already
/// contains most of a variable's parent objects, but not necessarily all of them (a field
/// path two levels below an otherwise-empty object, say), so missing intermediates are
/// created here rather than assumed; an *existing* intermediate that collides with a scalar
/// the template itself set is still a hard error. Once every intermediate is confirmed (or
/// created as) an object, the actual leaf write is delegated to `json-patch`'s `"add"`
/// operation, which both inserts a new object member and overwrites an existing one — the
/// write semantics this resolver needs.
fn set_at_path(root: &mut serde_json::Value, path: &str, value: serde_json::Value) -> Result<(), ResolverError> {
    let segment_list: Vec<&str> = segments(path).collect();
    let Some((_, parents)) = segment_list.split_last() else {
        return Err(ResolverError::new("empty field path"));
    };

    let mut current = &mut *root;
    for segment in parents {
        current = match current {
            serde_json::Value::Object(map) => map
                .entry((*segment).to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new())),
            _ => {
                return Err(ResolverError::new(format!(
                    "cannot descend into non-object at segment \"{segment}\" while writing \"{path}\""
                )));
            }
        };
    }

    if !current.is_object() {
        return Err(ResolverError::new(format!(
            "cannot write \"{path}\": parent is not an object"
        )));
    }

    let pointer = format!("/{}", segment_list.join("/"));
    let patch_document = serde_json::json!([{ "op": "add", "path": pointer, "value": value }]);
    let patch: json_patch::Patch = serde_json::from_value(patch_document)
        .expect("a literal single-operation RFC 6902 document is always well-formed");

    json_patch::patch(root, &patch)
        .map_err(|err| ResolverError::new(format!("failed to write \"{path}\": {err}")))
}

/// Same intermediate-object creation as [`set_at_path`], but never fails: a scalar collision
/// along the way is overwritten with an empty object rather than erroring. Used only for
/// best-effort instance-status writes (§4.5), which have no `json-patch`-backed leaf write —
/// there is nothing to delegate to, since there's no failure path left to report through.
fn blind_set(root: &mut serde_json::Value, path: &str, value: serde_json::Value) {
    let segments: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = serde_json::Value::Object(serde_json::Map::new());
        }
        current = current
            .as_object_mut()
            .expect("just ensured current is an object")
            .entry(segment.to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    }

    if !current.is_object() {
        *current = serde_json::Value::Object(serde_json::Map::new());
    }
    current
        .as_object_mut()
        .expect("just ensured current is an object")
        .insert((*last).to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_single_expression_field() {
        let resolver = JsonPathResolver;
        let mut root = serde_json::json!({ "spec": {} });
        let summary = resolver.resolve(
            &mut root,
            &[FieldDescriptor {
                path: "spec.replicas".to_string(),
                expressions: vec![serde_json::json!(3)],
            }],
        );

        assert!(summary.is_ok());
        assert_eq!(root, serde_json::json!({ "spec": { "replicas": 3 } }));
    }

    #[test]
    fn resolve_creates_missing_two_level_intermediate_objects() {
        let resolver = JsonPathResolver;
        let mut root = serde_json::json!({});
        let summary = resolver.resolve(
            &mut root,
            &[FieldDescriptor {
                path: "metadata.labels.tier".to_string(),
                expressions: vec![serde_json::json!(5)],
            }],
        );

        assert!(summary.is_ok());
        assert_eq!(
            root,
            serde_json::json!({ "metadata": { "labels": { "tier": 5 } } })
        );
    }

    #[test]
    fn reports_error_when_parent_is_scalar() {
        let resolver = JsonPathResolver;
        let mut root = serde_json::json!({ "spec": 3 });
        let summary = resolver.resolve(
            &mut root,
            &[FieldDescriptor {
                path: "spec.replicas".to_string(),
                expressions: vec![serde_json::json!(3)],
            }],
        );

        assert!(!summary.is_ok());
    }

    #[test]
    fn blind_set_creates_missing_intermediate_objects() {
        let resolver = JsonPathResolver;
        let mut root = serde_json::json!({});
        resolver.blind_set_value_at_path(&mut root, "status.phase", serde_json::json!("Ready"));

        assert_eq!(root, serde_json::json!({ "status": { "phase": "Ready" } }));
    }
}
