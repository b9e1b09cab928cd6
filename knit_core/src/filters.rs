use heck::ToKebabCase;
use heck::ToLowerCamelCase;
use heck::ToPascalCase;
use heck::ToShoutySnakeCase;
use heck::ToSnakeCase;
use minijinja::Environment;

/// Add the case and quoting filters to `env`, next to the minijinja builtins.
pub(crate) fn register(env: &mut Environment<'_>) {
	env.add_filter("snakecase", snakecase);
	env.add_filter("camelcase", camelcase);
	env.add_filter("pascalcase", pascalcase);
	env.add_filter("kebabcase", kebabcase);
	env.add_filter("screamingcase", screamingcase);
	env.add_filter("quote", quote);
}

fn snakecase(value: &str) -> String {
	value.to_snake_case()
}

fn camelcase(value: &str) -> String {
	value.to_lower_camel_case()
}

fn pascalcase(value: &str) -> String {
	value.to_pascal_case()
}

fn kebabcase(value: &str) -> String {
	value.to_kebab_case()
}

fn screamingcase(value: &str) -> String {
	value.to_shouty_snake_case()
}

/// Wrap a value in double quotes, escaping backslashes and quotes.
fn quote(value: &str) -> String {
	format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
