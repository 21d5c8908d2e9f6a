#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn forge_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("forge-templates"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

pub const LAYOUT: &str = r#"<html>
  <head>${ "{{ head }}" }<title>${ site }</title>${ "{{ end }}" }</head>
  <body>${ "{{ body }}" }<p>empty</p>${ "{{ end }}" }</body>
</html>
"#;

pub const HOME: &str = r#"${ "{{ extend layout }}" }
${ "{{ body }}" }<h1>${ title }</h1>${ "{{ end }}" }
"#;

pub fn write_file(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

/// A project with `templates/layout.tmpl.html` and
/// `templates/pages/home.tmpl.html`.
pub fn site_project(root: &Path) {
	write_file(root, "templates/layout.tmpl.html", LAYOUT);
	write_file(root, "templates/pages/home.tmpl.html", HOME);
}
