//! Projection of a GraphQL schema definition document into a generic value.
//!
//! The shape handed to templates is:
//!
//! ```text
//! {
//!   schema: { query, mutation, subscription } | null,
//!   types: [ { kind, name, description, fields, values, interfaces, members } ],
//!   type_map: { <name>: <type> },
//!   directives: [ { name, description, arguments, locations, repeatable } ],
//! }
//! ```
//!
//! Type references are rendered in SDL notation (`[String!]!`).

use graphql_parser::parse_schema;
use graphql_parser::schema::Definition;
use graphql_parser::schema::DirectiveDefinition;
use graphql_parser::schema::DirectiveLocation;
use graphql_parser::schema::Document;
use graphql_parser::schema::Field;
use graphql_parser::schema::InputValue;
use graphql_parser::schema::TypeDefinition;
use graphql_parser::schema::TypeExtension;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

pub(crate) fn load_schema(source: &str) -> Result<Value, String> {
	let document = parse_schema::<String>(source).map_err(|e| e.to_string())?;
	Ok(document_to_value(&document))
}

fn document_to_value(document: &Document<'_, String>) -> Value {
	let mut schema = Value::Null;
	let mut types = Vec::new();
	let mut type_map = Map::new();
	let mut directives = Vec::new();

	for definition in &document.definitions {
		match definition {
			Definition::SchemaDefinition(definition) => {
				schema = json!({
					"query": definition.query,
					"mutation": definition.mutation,
					"subscription": definition.subscription,
				});
			}
			Definition::TypeDefinition(definition) => {
				let value = type_to_value(definition);
				if let Some(name) = value.get("name").and_then(Value::as_str) {
					type_map.insert(name.to_string(), value.clone());
				}
				types.push(value);
			}
			Definition::TypeExtension(extension) => {
				types.push(extension_to_value(extension));
			}
			Definition::DirectiveDefinition(definition) => {
				directives.push(directive_to_value(definition));
			}
		}
	}

	json!({
		"schema": schema,
		"types": types,
		"type_map": type_map,
		"directives": directives,
	})
}

fn type_to_value(definition: &TypeDefinition<'_, String>) -> Value {
	match definition {
		TypeDefinition::Scalar(scalar) => {
			json!({
				"kind": "scalar",
				"name": scalar.name,
				"description": scalar.description,
			})
		}
		TypeDefinition::Object(object) => {
			json!({
				"kind": "object",
				"name": object.name,
				"description": object.description,
				"interfaces": object.implements_interfaces,
				"fields": fields_to_value(&object.fields),
			})
		}
		TypeDefinition::Interface(interface) => {
			json!({
				"kind": "interface",
				"name": interface.name,
				"description": interface.description,
				"fields": fields_to_value(&interface.fields),
			})
		}
		TypeDefinition::Union(union_type) => {
			json!({
				"kind": "union",
				"name": union_type.name,
				"description": union_type.description,
				"members": union_type.types,
			})
		}
		TypeDefinition::Enum(enumeration) => {
			let values: Vec<Value> = enumeration
				.values
				.iter()
				.map(|value| {
					json!({
						"name": value.name,
						"description": value.description,
					})
				})
				.collect();
			json!({
				"kind": "enum",
				"name": enumeration.name,
				"description": enumeration.description,
				"values": values,
			})
		}
		TypeDefinition::InputObject(input) => {
			json!({
				"kind": "input",
				"name": input.name,
				"description": input.description,
				"fields": input_values_to_value(&input.fields),
			})
		}
	}
}

fn extension_to_value(extension: &TypeExtension<'_, String>) -> Value {
	let (kind, name) = match extension {
		TypeExtension::Scalar(ext) => ("scalar", &ext.name),
		TypeExtension::Object(ext) => ("object", &ext.name),
		TypeExtension::Interface(ext) => ("interface", &ext.name),
		TypeExtension::Union(ext) => ("union", &ext.name),
		TypeExtension::Enum(ext) => ("enum", &ext.name),
		TypeExtension::InputObject(ext) => ("input", &ext.name),
	};

	json!({
		"kind": kind,
		"name": name,
		"extension": true,
	})
}

fn fields_to_value(fields: &[Field<'_, String>]) -> Vec<Value> {
	fields
		.iter()
		.map(|field| {
			json!({
				"name": field.name,
				"description": field.description,
				"type": field.field_type.to_string(),
				"arguments": input_values_to_value(&field.arguments),
			})
		})
		.collect()
}

fn input_values_to_value(values: &[InputValue<'_, String>]) -> Vec<Value> {
	values
		.iter()
		.map(|value| {
			json!({
				"name": value.name,
				"description": value.description,
				"type": value.value_type.to_string(),
				"default": value.default_value.as_ref().map(ToString::to_string),
			})
		})
		.collect()
}

fn directive_to_value(definition: &DirectiveDefinition<'_, String>) -> Value {
	let locations: Vec<&str> = definition
		.locations
		.iter()
		.map(DirectiveLocation::as_str)
		.collect();

	json!({
		"name": definition.name,
		"description": definition.description,
		"arguments": input_values_to_value(&definition.arguments),
		"locations": locations,
		"repeatable": definition.repeatable,
	})
}
