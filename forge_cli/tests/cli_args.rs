use std::path::Path;

use clap::Parser;
use forge_cli::Commands;
use forge_cli::ForgeCli;
use rstest::rstest;

#[test]
fn parses_build_arguments() {
	let cli = ForgeCli::try_parse_from([
		"forge-templates",
		"build",
		"templates",
		"dist/out.json",
		"--minify-html",
		"--verbose",
	])
	.unwrap_or_else(|e| panic!("parse: {e}"));

	assert!(cli.verbose);
	assert!(!cli.no_color);
	let Some(Commands::Build {
		folder,
		output,
		minify_html,
		watch,
	}) = cli.command
	else {
		panic!("expected the build command");
	};
	assert_eq!(folder, Path::new("templates"));
	assert_eq!(output, Path::new("dist/out.json"));
	assert!(minify_html);
	assert!(!watch);
}

#[test]
fn parses_render_arguments() {
	let cli = ForgeCli::try_parse_from([
		"forge-templates",
		"--path",
		"site",
		"render",
		"pages/home",
		"--bundle",
		"out.json",
		"--data",
		"data.toml",
	])
	.unwrap_or_else(|e| panic!("parse: {e}"));

	assert_eq!(cli.path.as_deref(), Some(Path::new("site")));
	let Some(Commands::Render {
		name,
		templates,
		bundle,
		data,
		minify_html,
	}) = cli.command
	else {
		panic!("expected the render command");
	};
	assert_eq!(name, "pages/home");
	assert_eq!(templates, None);
	assert_eq!(bundle.as_deref(), Some(Path::new("out.json")));
	assert_eq!(data.as_deref(), Some(Path::new("data.toml")));
	assert!(!minify_html);
}

#[rstest]
#[case::build_without_output(&["forge-templates", "build", "templates"])]
#[case::render_without_name(&["forge-templates", "render"])]
#[case::render_with_both_sources(&["forge-templates", "render", "x", "--templates", "t", "--bundle", "b"])]
#[case::unknown_command(&["forge-templates", "serve"])]
fn rejects_invalid_arguments(#[case] args: &[&str]) {
	assert!(ForgeCli::try_parse_from(args).is_err());
}
