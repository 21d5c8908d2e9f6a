use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use forge_cli::Commands;
use forge_cli::ForgeCli;
use forge_core::AnyError;
use forge_core::AnyResult;
use forge_core::BuildOptions;
use forge_core::Bundle;
use forge_core::ForgeConfig;
use forge_core::ForgeError;
use forge_core::TemplateLoader;
use forge_core::TemplateSet;
use forge_core::TemplatesConfig;
use forge_core::load_data_file;
use notify::Watcher;
use owo_colors::OwoColorize;
use tracing::debug;
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
	($text:expr,dimmed) => {
		if color_enabled() {
			format!("{}", $text.dimmed())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = ForgeCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Build {
			folder,
			output,
			minify_html,
			watch,
		}) => run_build(&args, folder, output, *minify_html, *watch),
		Some(Commands::Render {
			name,
			templates,
			bundle,
			data,
			minify_html,
		}) => {
			run_render(
				&args,
				name,
				templates.as_deref(),
				bundle.as_deref(),
				data.as_deref(),
				*minify_html,
			)
		}
		Some(Commands::List { templates }) => run_list(&args, templates.as_deref()),
		None => {
			eprintln!("No subcommand specified. Run `forge-templates --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		print_error(e);
		process::exit(2);
	}
}

/// `RUST_LOG` wins, otherwise `--verbose` selects debug output. Logs go to
/// stderr so rendered output on stdout stays clean.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.try_init()
		.ok();
}

fn print_error(error: AnyError) {
	// Render through miette for rich diagnostics with help text and error
	// codes.
	match error.downcast::<ForgeError>() {
		Ok(forge_err) => {
			let report: miette::Report = (*forge_err).into();
			eprintln!("{report:?}");
		}
		Err(e) => {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn resolve_root(args: &ForgeCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// The explicit folder, else `templates.root` from the config, resolved
/// against the project root.
fn template_folder(root: &Path, config: Option<&ForgeConfig>, explicit: Option<&Path>) -> PathBuf {
	match (explicit, config) {
		(Some(folder), _) => root.join(folder),
		(None, Some(config)) => config.template_root(root),
		(None, None) => root.join(TemplatesConfig::default().root),
	}
}

fn build_options(config: Option<&ForgeConfig>, minify_html: bool) -> BuildOptions {
	let options = BuildOptions::from_config(config);
	if minify_html {
		options.with_minify_html(true)
	} else {
		options
	}
}

fn run_build(
	args: &ForgeCli,
	folder: &Path,
	output: &Path,
	minify_html: bool,
	watch: bool,
) -> AnyResult<()> {
	let root = resolve_root(args);
	let config = ForgeConfig::load(&root)?;
	let loader = TemplateLoader::new(build_options(config.as_ref(), minify_html));
	let folder_path = root.join(folder);
	let output_path = root.join(output);

	let count = build_once(&loader, &folder_path, &output_path).inspect_err(|_| {
		eprintln!("{}", colored!("Build not successful!", red));
	})?;
	print_build_success(count, output);

	if !watch {
		return Ok(());
	}

	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let (tx, rx) = mpsc::channel();
	let ignored = output_path.clone();
	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				// The bundle itself may live inside the watched folder.
				if matches!(
					event.kind,
					notify::EventKind::Modify(_)
						| notify::EventKind::Create(_)
						| notify::EventKind::Remove(_)
				) && event.paths.iter().any(|path| *path != ignored)
				{
					let _ = tx.send(());
				}
			}
		})?;
	watcher.watch(&folder_path, notify::RecursiveMode::Recursive)?;

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, rebuilding...");
		match build_once(&loader, &folder_path, &output_path) {
			Ok(count) => println!("{} {count} template(s)", colored!("Rebuilt", green)),
			Err(e) => {
				eprintln!("{}", colored!("Build not successful!", red));
				print_error(e);
			}
		}
	}
}

fn build_once(loader: &TemplateLoader, folder: &Path, output: &Path) -> AnyResult<usize> {
	let bundle = loader.compile_folder(folder)?;
	bundle.write(output)?;
	debug!(output = %output.display(), "bundle written");
	Ok(bundle.len())
}

fn print_build_success(count: usize, output: &Path) {
	println!(
		"{} {count} template(s) written to {}",
		colored!("Build successful!", green),
		output.display()
	);
	println!();
	println!("Example usage:");
	println!(
		"  {} forge-templates render <name> --bundle {} --data data.json",
		colored!("$", dimmed),
		output.display()
	);
}

fn run_render(
	args: &ForgeCli,
	name: &str,
	templates: Option<&Path>,
	bundle: Option<&Path>,
	data: Option<&Path>,
	minify_html: bool,
) -> AnyResult<()> {
	let root = resolve_root(args);
	let config = ForgeConfig::load(&root)?;

	let set = match bundle {
		Some(bundle) => TemplateLoader::default().load_bundle(Bundle::read(&root.join(bundle))?)?,
		None => {
			let folder = template_folder(&root, config.as_ref(), templates);
			TemplateLoader::new(build_options(config.as_ref(), minify_html)).load_folder(&folder)?
		}
	};

	let mut context = match &config {
		Some(config) => config.load_data(&root)?,
		None => serde_json::Map::new(),
	};

	if let Some(data) = data {
		match load_data_file(&root.join(data))? {
			serde_json::Value::Object(values) => context.extend(values),
			_ => {
				return Err(ForgeError::DataFile {
					path: data.display().to_string(),
					reason: "render data must be a table of named values".to_string(),
				}
				.into());
			}
		}
	}

	let output = set.render(name, &context)?;
	let mut stdout = std::io::stdout().lock();
	stdout.write_all(output.as_bytes())?;
	stdout.flush()?;

	Ok(())
}

fn run_list(args: &ForgeCli, templates: Option<&Path>) -> AnyResult<()> {
	let root = resolve_root(args);
	let config = ForgeConfig::load(&root)?;
	let folder = template_folder(&root, config.as_ref(), templates);
	let set: TemplateSet =
		TemplateLoader::new(BuildOptions::from_config(config.as_ref())).load_folder(&folder)?;

	if set.is_empty() {
		println!("No templates found.");
		return Ok(());
	}

	println!("{}", colored!("Templates:", bold));
	for name in set.names() {
		match set.declared_base(name) {
			Some(base) => println!("  {name} {} {base}", colored!("extends", dimmed)),
			None => println!("  {name}"),
		}
	}

	println!("\n{} template(s)", set.len());

	Ok(())
}
