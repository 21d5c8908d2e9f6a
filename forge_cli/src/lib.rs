use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Compile folders of HTML templates with block inheritance into a renderable bundle.",
	long_about = "forge-templates compiles a folder of `*.tmpl.html` files into a single bundle \
	              that renders any template by name.\n\nTemplates embed `${ expression }` holes. \
	              A template that evaluates `{{ extend base }}` contributes only its `{{ name }}` \
	              ... `{{ end }}` blocks to `base`.\n\nQuick start:\n  forge-templates build \
	              templates dist/templates.json\n  forge-templates render pages/home --bundle \
	              dist/templates.json --data data.json\n  forge-templates list"
)]
pub struct ForgeCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Compile a template folder into a bundle file.
	///
	/// Every `*.tmpl.html` file below `folder` is lexed, its expressions are
	/// validated, and the result is written to `output` as JSON. Template
	/// names are paths relative to `folder` without the suffix.
	Build {
		/// The folder with your template files.
		folder: PathBuf,

		/// Where to write the bundle.
		output: PathBuf,

		/// Collapse whitespace between tags and trim each template to make
		/// the bundle smaller.
		#[arg(long, default_value_t = false)]
		minify_html: bool,

		/// Rebuild whenever a file in the template folder changes.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Render one template to stdout.
	///
	/// Templates come from a bundle or are compiled from a folder on the
	/// fly. Data namespaces from `forge.toml` are loaded first and a `--data`
	/// file is merged over them.
	Render {
		/// Template name, e.g. `pages/home`.
		name: String,

		/// Template folder to compile. Defaults to `templates.root` from
		/// `forge.toml`.
		#[arg(long, conflicts_with = "bundle")]
		templates: Option<PathBuf>,

		/// A bundle written by `build`.
		#[arg(long)]
		bundle: Option<PathBuf>,

		/// JSON, TOML or YAML file with the render data.
		#[arg(long)]
		data: Option<PathBuf>,

		/// Minify templates compiled from a folder.
		#[arg(long, default_value_t = false)]
		minify_html: bool,
	},
	/// List every template and the base it extends.
	///
	/// The base is found by scanning for `{{ extend base }}` written as a
	/// string literal. Directives computed from data only show up when
	/// rendering.
	List {
		/// Template folder to scan. Defaults to `templates.root` from
		/// `forge.toml`.
		#[arg(long)]
		templates: Option<PathBuf>,
	},
}
