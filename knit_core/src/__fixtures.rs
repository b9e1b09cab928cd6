use std::path::Path;
use std::path::PathBuf;

use crate::EnvPolicy;
use crate::Formatters;
use crate::Knit;
use crate::KnitOptions;

pub(crate) const PETSTORE: &str = r"openapi: 3.0.3
info:
  title: Pets
  version: '1.0.0'
paths:
  /pets/{petId}:
    parameters:
      - $ref: '#/components/parameters/PetId'
    get:
      operationId: getPet
      responses:
        '200':
          description: A pet
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Pet'
components:
  parameters:
    PetId:
      name: petId
      in: path
      required: true
      schema:
        type: string
  schemas:
    Pet:
      type: object
      properties:
        name:
          type: string
";

pub(crate) const SCHEMA_SDL: &str = r#"schema {
  query: Query
}

"A registered user"
type User implements Node {
  id: ID!
  name(format: String = "short"): String
  tags: [String!]!
}

interface Node {
  id: ID!
}

enum Role {
  ADMIN
  USER
}

union SearchResult = User

input UserFilter {
  role: Role = USER
}

scalar DateTime

type Query {
  user(id: ID!): User
}

directive @auth(requires: Role) on FIELD_DEFINITION | OBJECT
"#;

/// A Go file with one block that renders a struct from an inline JSON map.
pub(crate) const JSON_STRUCT_FILE: &str = r#"package models

/*
@knit loader json
@knit input `{"test":{"A":"b"}}`
@knit template `type Generated struct {
{%- for key, value in test|items %}
    {{ key }} string // {{ value }}
{%- endfor %}
}`
*/
// @+knit
// @!knit
"#;

pub(crate) const JSON_STRUCT_EXPECTED: &str = r#"package models

/*
@knit loader json
@knit input `{"test":{"A":"b"}}`
@knit template `type Generated struct {
{%- for key, value in test|items %}
    {{ key }} string // {{ value }}
{%- endfor %}
}`
*/
// @+knit
type Generated struct {
    A string // b
}
// @!knit
"#;

/// A block with an inline input and template that renders `name`.
pub(crate) fn name_block(name: &str) -> String {
	format!(
		"// @knit input json`{{\"name\":\"{name}\"}}`\n// @knit template `{{{{ name }}}}`\n// \
		 @+knit\n// @!knit\n"
	)
}

pub(crate) fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
	let path = dir.join(name);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
	path
}

pub(crate) fn read_file(path: &Path) -> String {
	std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// A driver that never shells out to a formatter.
pub(crate) fn knit(parallel: bool) -> Knit {
	Knit::new(KnitOptions {
		format: false,
		parallel,
		check: false,
		env_policy: EnvPolicy::Empty,
		formatters: Formatters::empty(),
	})
}
