//! OpenAPI v3 loading and semantic validation.
//!
//! Documents are accepted as JSON or YAML. Structural validity is checked by
//! deserializing into [`openapiv3::OpenAPI`]; the semantic rules below are
//! then applied to the generic value, which is what templates receive.

use std::collections::HashSet;

use serde_json::Value;

const METHODS: [&str; 8] = [
	"get", "put", "post", "delete", "options", "head", "patch", "trace",
];

pub(crate) fn load_document(bytes: &[u8]) -> Result<Value, String> {
	let document: Value = match serde_json::from_slice(bytes) {
		Ok(value) => value,
		Err(_) => serde_yaml_ng::from_slice(bytes).map_err(|e| e.to_string())?,
	};

	serde_json::from_value::<openapiv3::OpenAPI>(document.clone())
		.map_err(|e| format!("invalid openapi v3 document: {e}"))?;

	let problems = validate(&document);
	if !problems.is_empty() {
		return Err(format!(
			"failed to validate openapi v3 document: {}",
			problems.join("; ")
		));
	}

	Ok(document)
}

/// Collect every semantic problem in `document`. An empty result means the
/// document is valid.
pub(crate) fn validate(document: &Value) -> Vec<String> {
	let mut problems = Vec::new();

	match document.get("openapi").and_then(Value::as_str) {
		Some(version) if version.starts_with("3.") => {}
		Some(version) => problems.push(format!("unsupported openapi version `{version}`")),
		None => problems.push("missing `openapi` version field".to_string()),
	}

	for field in ["title", "version"] {
		let present = document
			.pointer(&format!("/info/{field}"))
			.and_then(Value::as_str)
			.is_some_and(|value| !value.trim().is_empty());
		if !present {
			problems.push(format!("`info.{field}` must be a non-empty string"));
		}
	}

	collect_reference_problems(document, document, &mut problems);

	let Some(paths) = document.get("paths").and_then(Value::as_object) else {
		return problems;
	};

	let mut operation_ids = HashSet::new();
	for (path, item) in paths {
		if !path.starts_with('/') {
			problems.push(format!("path `{path}` must begin with `/`"));
		}

		let path_level = parameters_of(document, item);
		for method in METHODS {
			let Some(operation) = item.get(method) else {
				continue;
			};

			if let Some(id) = operation.get("operationId").and_then(Value::as_str) {
				if !operation_ids.insert(id.to_string()) {
					problems.push(format!("duplicate operationId `{id}`"));
				}
			}

			let mut declared = path_level.clone();
			declared.extend(parameters_of(document, operation));
			for name in template_parameters(path) {
				if !declared.contains(name) {
					problems.push(format!(
						"path parameter `{name}` of `{method} {path}` is not declared"
					));
				}
			}
		}
	}

	problems
}

/// Walk `value` and record every `$ref` that cannot be resolved inside
/// `document`. References outside the document are rejected; no remote
/// lookup is ever performed.
fn collect_reference_problems(document: &Value, value: &Value, problems: &mut Vec<String>) {
	match value {
		Value::Object(map) => {
			if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
				if resolve_reference(document, reference).is_none() {
					if reference.starts_with('#') {
						problems.push(format!("unresolved reference `{reference}`"));
					} else {
						problems.push(format!("external reference `{reference}` is not allowed"));
					}
				}
			}
			for child in map.values() {
				collect_reference_problems(document, child, problems);
			}
		}
		Value::Array(items) => {
			for child in items {
				collect_reference_problems(document, child, problems);
			}
		}
		_ => {}
	}
}

fn resolve_reference<'a>(document: &'a Value, reference: &str) -> Option<&'a Value> {
	let pointer = reference.strip_prefix('#')?;
	document.pointer(pointer)
}

/// Names of the `in: path` parameters declared on a path item or operation.
fn parameters_of<'a>(document: &'a Value, owner: &'a Value) -> HashSet<&'a str> {
	let Some(parameters) = owner.get("parameters").and_then(Value::as_array) else {
		return HashSet::new();
	};

	parameters
		.iter()
		.filter_map(|parameter| {
			match parameter.get("$ref").and_then(Value::as_str) {
				Some(reference) => resolve_reference(document, reference),
				None => Some(parameter),
			}
		})
		.filter(|parameter| parameter.get("in").and_then(Value::as_str) == Some("path"))
		.filter_map(|parameter| parameter.get("name").and_then(Value::as_str))
		.collect()
}

/// Extract the `{name}` segments of a path template.
fn template_parameters(path: &str) -> Vec<&str> {
	let mut names = Vec::new();
	let mut rest = path;

	while let Some(open) = rest.find('{') {
		let after = &rest[open + 1..];
		let Some(close) = after.find('}') else {
			break;
		};
		names.push(&after[..close]);
		rest = &after[close + 1..];
	}

	names
}
