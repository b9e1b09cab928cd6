use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use knit_cli::Commands;
use knit_cli::KnitCli;
use knit_cli::expand_patterns;
use knit_cli::parse_var;
use knit_core::EnvPolicy;
use knit_core::GenerationContext;
use knit_core::Knit;
use knit_core::KnitConfig;
use knit_core::KnitError;
use knit_core::KnitOptions;
use knit_core::Loader;
use knit_core::ProcessResult;
use knit_core::Source;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,dimmed) => {
		if color_enabled() {
			format!("{}", $text.dimmed())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = KnitCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Generate {
			loader,
			input,
			template,
			vars,
		}) => run_generate(loader.as_deref(), input, template, vars),
		None => run_process(&args),
	};

	match result {
		Ok(true) => {}
		Ok(false) => process::exit(1),
		Err(e) => {
			report_error(e);
			process::exit(2);
		}
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.init();
}

fn report_error(error: Box<dyn std::error::Error>) {
	// Try to render through miette for rich diagnostics with help text
	// and error codes.
	match error.downcast::<KnitError>() {
		Ok(knit_err) => {
			let report: miette::Report = (*knit_err).into();
			eprintln!("{report:?}");
		}
		Err(e) => {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn resolve_root() -> PathBuf {
	std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn build_options(args: &KnitCli, root: &Path) -> Result<KnitOptions, Box<dyn std::error::Error>> {
	let mut options = KnitConfig::load(root)?
		.map(|config| config.options())
		.unwrap_or_default();

	if args.no_format {
		options.format = false;
	}
	if args.sequential {
		options.parallel = false;
	}
	if args.strict_env {
		options.env_policy = EnvPolicy::Strict;
	}
	options.check = args.check;

	Ok(options)
}

/// Regenerate every file matched by the patterns. Returns `false` when a file
/// failed, or in check mode when a file is out of date.
fn run_process(args: &KnitCli) -> Result<bool, Box<dyn std::error::Error>> {
	if args.patterns.is_empty() {
		return Err("no files or patterns given. Run `knit --help` for usage.".into());
	}

	let root = resolve_root();
	let options = build_options(args, &root)?;
	let files = expand_patterns(&root, &args.patterns)?;
	if files.is_empty() {
		println!("No files matched.");
		return Ok(true);
	}

	let check = options.check;
	let knit = Knit::new(options).with_root(root.clone());
	let results = knit.collect(&files);

	let mut summary = Summary::default();
	for result in &results {
		summary.record(result);
		print_result(result, &root, args, check);
	}

	println!();
	println!("{}", summary.line(check));

	Ok(summary.failed == 0 && !(check && summary.modified > 0))
}

#[derive(Debug, Default)]
struct Summary {
	modified: usize,
	unchanged: usize,
	failed: usize,
}

impl Summary {
	fn record(&mut self, result: &ProcessResult) {
		if result.error.is_some() {
			self.failed += 1;
		} else if result.modified {
			self.modified += 1;
		} else {
			self.unchanged += 1;
		}
	}

	fn line(&self, check: bool) -> String {
		let modified = if check {
			format!("{} out of date", self.modified)
		} else {
			format!("{} updated", self.modified)
		};
		let failed = format!("{} failed", self.failed);
		let failed = if self.failed > 0 {
			colored!(failed, red)
		} else {
			failed
		};

		format!("{modified}, {} unchanged, {failed}", self.unchanged)
	}
}

fn print_result(result: &ProcessResult, root: &Path, args: &KnitCli, check: bool) {
	let display = make_relative(&result.path, root);

	if let Some(error) = &result.error {
		eprintln!("{} {display}: {error}", colored!("Failed", red));
		return;
	}

	if !result.modified {
		if args.verbose {
			println!(
				"{} {display} {}",
				colored!("Unchanged", dimmed),
				colored!(format!("({:.2?})", result.elapsed), dimmed)
			);
		}
		return;
	}

	if check {
		println!("{} {display}", colored!("Out of date", yellow));
		if args.diff {
			if let Some(expected) = &result.output {
				let current = std::fs::read_to_string(&result.path).unwrap_or_default();
				print_diff(&current, expected);
			}
		}
	} else {
		println!("{} {display}", colored!("Updated", green));
	}
}

fn run_generate(
	loader: Option<&str>,
	input: &Path,
	template: &Path,
	vars: &[String],
) -> Result<bool, Box<dyn std::error::Error>> {
	let loader = match loader {
		Some(name) => Loader::resolve(name)?,
		None => Loader::from_extension(input).ok_or(KnitError::MissingLoader)?,
	};

	let mut context = GenerationContext::new(
		loader,
		Source::Path(input.to_path_buf()),
		Source::Path(template.to_path_buf()),
	);
	for raw in vars {
		let (name, value) = parse_var(raw).ok_or_else(|| format!("invalid --var `{raw}`, expected NAME=VALUE"))?;
		context = context.with_variable(name, value);
	}

	match context.generate() {
		Ok(output) => {
			print!("{output}");
			Ok(true)
		}
		Err(error) => {
			report_error(Box::new(error));
			Ok(false)
		}
	}
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				print!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				print!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				print!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
