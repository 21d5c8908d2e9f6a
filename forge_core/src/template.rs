use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use minijinja::Environment;
use minijinja::State;
use minijinja::UndefinedBehavior;
use minijinja::Value;
use minijinja::value::ValueKind;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::instrument;

use crate::ForgeError;
use crate::ForgeResult;
use crate::bundle::Bundle;
use crate::directive::Directive;
use crate::discover::BuildOptions;
use crate::discover::discover_templates;
use crate::helpers;
use crate::lexer::lex_template;
use crate::lexer::string_literal;
use crate::render::SegmentProducer;
use crate::render::TemplateRegistry;
use crate::render::render_template;
use crate::segment::SegmentSequence;

/// A template body split into literal chunks and expression sources, ready
/// to be evaluated against render data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledTemplate {
	/// Literal text chunks. Always one more than `expressions`.
	pub literals: Vec<String>,
	/// Expression sources evaluated between the literal chunks.
	pub expressions: Vec<String>,
}

impl CompiledTemplate {
	/// Lex a template body, optionally minifying its literal chunks.
	pub fn compile(name: &str, source: &str, minify_html: bool) -> ForgeResult<Self> {
		let lexed = lex_template(name, source)?;
		let mut literals = lexed.literals;
		if minify_html {
			minify_literals(&mut literals);
		}

		Ok(Self {
			literals,
			expressions: lexed
				.expressions
				.into_iter()
				.map(|expression| expression.source)
				.collect(),
		})
	}

	/// The base template named by the first expression that is a string
	/// literal spelling an extend directive.
	///
	/// This is a static scan. Directives produced by computed expressions are
	/// only discovered at render time.
	pub fn declared_base(&self) -> Option<String> {
		self.expressions.iter().find_map(|source| {
			let text = string_literal(source)?;
			Directive::recognize(&text)
				.and_then(|directive| directive.extend_target())
				.map(str::to_string)
		})
	}

	/// Check that every expression compiles in `env`.
	fn validate(&self, name: &str, env: &Environment<'_>) -> ForgeResult<()> {
		if self.literals.len() != self.expressions.len() + 1 {
			return Err(ForgeError::Bundle(format!(
				"template `{name}` has {} literal chunk(s) for {} expression(s)",
				self.literals.len(),
				self.expressions.len()
			)));
		}

		for source in &self.expressions {
			env.compile_expression(source)
				.map_err(|e| expression_error(name, &e))?;
		}

		Ok(())
	}
}

/// Collapse whitespace between tags and trim the template's outer
/// whitespace. Only literal chunks are touched, never expression sources.
pub fn minify_literals(literals: &mut [String]) {
	for literal in literals.iter_mut() {
		*literal = collapse_tag_whitespace(literal);
	}

	if let Some(first) = literals.first_mut() {
		*first = first.trim_start().to_string();
	}

	if let Some(last) = literals.last_mut() {
		*last = last.trim_end().to_string();
	}
}

/// Replace every `>` whitespace `<` run with `><`.
fn collapse_tag_whitespace(text: &str) -> String {
	let mut output = String::with_capacity(text.len());
	let mut rest = text;

	while let Some(index) = rest.find('>') {
		output.push_str(&rest[..=index]);
		rest = &rest[index + 1..];
		let trimmed = rest.trim_start();
		if trimmed.len() != rest.len() && trimmed.starts_with('<') {
			rest = trimmed;
		}
	}

	output.push_str(rest);
	output
}

fn expression_error(template: &str, error: &minijinja::Error) -> ForgeError {
	ForgeError::Expression {
		template: template.to_string(),
		message: error.to_string(),
	}
}

/// The text an evaluated value contributes to the output. Undefined and
/// none are absent, whole floats print without a fraction (`1.0` as `1`).
fn evaluated_text(value: &Value) -> Option<String> {
	if value.is_undefined() || value.is_none() {
		return None;
	}

	let text = value.to_string();
	if value.kind() == ValueKind::Number {
		if let Some(whole) = text.strip_suffix(".0") {
			return Some(whole.to_string());
		}
	}

	Some(text)
}

/// `forEach(items, callback)` inside expressions.
fn for_each_function(
	state: &State,
	items: Value,
	callback: Value,
) -> Result<String, minijinja::Error> {
	let results = items
		.try_iter()?
		.map(|item| callback.call(state, &[item]))
		.collect::<Result<Vec<_>, _>>()?;

	Ok(helpers::for_each(results, |value| {
		evaluated_text(&value).unwrap_or_default()
	}))
}

/// `execute(callback)` inside expressions. The callback receives an `emit`
/// callable.
fn execute_function(state: &State, callback: Value) -> Result<String, minijinja::Error> {
	let mut failure = None;
	let output = helpers::execute(|sink| {
		let sink = sink.clone();
		let emit = Value::from_function(move |text: Value| {
			if let Some(text) = evaluated_text(&text) {
				sink.emit(text);
			}
			Value::UNDEFINED
		});

		match callback.call(state, &[emit]) {
			Ok(value) => Some(value),
			Err(error) => {
				failure = Some(error);
				None
			}
		}
	});

	match failure {
		Some(error) => Err(error),
		None => Ok(output),
	}
}

/// `renderIf(cond, a, b = "")` inside expressions.
fn render_if_function(cond: Value, a: Value, b: Option<Value>) -> Value {
	helpers::render_if(cond, a, b.unwrap_or_else(|| Value::from("")))
}

/// The expression environment every template is evaluated in.
pub fn default_environment() -> Environment<'static> {
	let mut env = Environment::new();
	env.set_undefined_behavior(UndefinedBehavior::Chainable);
	env.add_function("forEach", for_each_function);
	env.add_function("execute", execute_function);
	env.add_function("renderIf", render_if_function);
	env
}

/// A compiled template bound to the environment it is evaluated in.
#[derive(Debug)]
struct BoundTemplate {
	name: String,
	compiled: CompiledTemplate,
	env: Arc<Environment<'static>>,
}

impl SegmentProducer<Value> for BoundTemplate {
	fn produce(&self, data: &Value) -> ForgeResult<SegmentSequence> {
		let mut builder = SegmentSequence::builder();
		let mut expressions = self.compiled.expressions.iter();

		for literal in &self.compiled.literals {
			builder = builder.literal(literal.as_str());
			let Some(source) = expressions.next() else {
				continue;
			};

			let expression = self
				.env
				.compile_expression(source)
				.map_err(|e| expression_error(&self.name, &e))?;
			let value = expression
				.eval(data)
				.map_err(|e| expression_error(&self.name, &e))?;
			builder = builder.value(evaluated_text(&value));
		}

		Ok(builder.build())
	}
}

/// Compiles template folders and bundles into a [`TemplateSet`].
///
/// Functions and globals added to [`TemplateLoader::environment_mut`] are
/// callable from every template expression, next to the built-in
/// `forEach`, `execute` and `renderIf`.
#[derive(Debug)]
pub struct TemplateLoader {
	env: Environment<'static>,
	options: BuildOptions,
}

impl Default for TemplateLoader {
	fn default() -> Self {
		Self::new(BuildOptions::default())
	}
}

impl TemplateLoader {
	pub fn new(options: BuildOptions) -> Self {
		Self {
			env: default_environment(),
			options,
		}
	}

	pub fn options(&self) -> &BuildOptions {
		&self.options
	}

	pub fn environment_mut(&mut self) -> &mut Environment<'static> {
		&mut self.env
	}

	/// Discover, lex and validate every template under `root` into a bundle.
	#[instrument(level = "debug", skip(self), fields(root = %root.display()))]
	pub fn compile_folder(&self, root: &Path) -> ForgeResult<Bundle> {
		let files = discover_templates(root, &self.options)?;
		let mut bundle = Bundle::new(self.options.minify_html);

		for file in files {
			let source = std::fs::read_to_string(&file.path)?;
			let compiled =
				CompiledTemplate::compile(&file.name, &source, self.options.minify_html)?;
			compiled.validate(&file.name, &self.env)?;
			debug!(
				template = %file.name,
				expressions = compiled.expressions.len(),
				"compiled template"
			);
			bundle.templates.insert(file.name, compiled);
		}

		Ok(bundle)
	}

	/// Compile every template under `root` and load the result.
	pub fn load_folder(self, root: &Path) -> ForgeResult<TemplateSet> {
		let bundle = self.compile_folder(root)?;
		self.load_bundle(bundle)
	}

	/// Compile in-memory template sources keyed by template name.
	pub fn load_sources<I, N, S>(self, sources: I) -> ForgeResult<TemplateSet>
	where
		I: IntoIterator<Item = (N, S)>,
		N: Into<String>,
		S: AsRef<str>,
	{
		let mut bundle = Bundle::new(self.options.minify_html);
		for (name, source) in sources {
			let name = name.into();
			let compiled =
				CompiledTemplate::compile(&name, source.as_ref(), self.options.minify_html)?;
			bundle.templates.insert(name, compiled);
		}

		self.load_bundle(bundle)
	}

	/// Bind every template of `bundle` to this loader's environment.
	pub fn load_bundle(self, bundle: Bundle) -> ForgeResult<TemplateSet> {
		for (name, compiled) in &bundle.templates {
			compiled.validate(name, &self.env)?;
		}

		let env = Arc::new(self.env);
		let templates = bundle
			.templates
			.into_iter()
			.map(|(name, compiled)| {
				let template = BoundTemplate {
					name: name.clone(),
					compiled,
					env: Arc::clone(&env),
				};
				(name, template)
			})
			.collect();

		Ok(TemplateSet {
			templates,
			minified: bundle.minified,
		})
	}
}

/// A loaded, read-only set of templates that can be rendered by name.
#[derive(Debug)]
pub struct TemplateSet {
	templates: BTreeMap<String, BoundTemplate>,
	minified: bool,
}

impl TemplateSet {
	/// Load every template under `root` with default options.
	pub fn from_folder(root: &Path) -> ForgeResult<Self> {
		TemplateLoader::default().load_folder(root)
	}

	/// Render `name` with any serializable data.
	pub fn render<S: Serialize + ?Sized>(&self, name: &str, data: &S) -> ForgeResult<String> {
		self.render_value(name, &Value::from_serialize(data))
	}

	/// Render `name` with a prepared expression context, which may contain
	/// callables created with [`Value::from_function`].
	pub fn render_value(&self, name: &str, data: &Value) -> ForgeResult<String> {
		render_template(self, name, data)
	}

	/// Template names in sorted order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.templates.keys().map(String::as_str)
	}

	pub fn get(&self, name: &str) -> Option<&CompiledTemplate> {
		self.templates.get(name).map(|template| &template.compiled)
	}

	/// The base template `name` statically declares it extends.
	pub fn declared_base(&self, name: &str) -> Option<String> {
		self.get(name).and_then(CompiledTemplate::declared_base)
	}

	pub fn len(&self) -> usize {
		self.templates.len()
	}

	pub fn is_empty(&self) -> bool {
		self.templates.is_empty()
	}

	/// The bundle this set can be reloaded from.
	pub fn to_bundle(&self) -> Bundle {
		let mut bundle = Bundle::new(self.minified);
		for (name, template) in &self.templates {
			bundle
				.templates
				.insert(name.clone(), template.compiled.clone());
		}
		bundle
	}
}

impl TemplateRegistry<Value> for TemplateSet {
	fn resolve(&self, name: &str) -> Option<&dyn SegmentProducer<Value>> {
		self.templates
			.get(name)
			.map(|template| template as &dyn SegmentProducer<Value>)
	}
}
