//! The named filters a converter installs into its template engine.
use std::{
  borrow::Cow,
  collections::{BTreeMap, HashMap},
  sync::Arc,
};

use nbconv_filters::{
  Highlighter,
  ansi_to_html,
  escape_tex,
  indent,
  markdown_to_html,
  markdown_to_latex,
  python_comment,
  rm_fake,
  strip_ansi,
};
use nbconv_pipeline::DisplayPriority;
use tera::{Tera, Value};

use crate::environment::TemplateEnvironment;

/// A template filter: the piped value plus named arguments.
pub type Filter = Arc<
  dyn Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync,
>;

const DEFAULT_INDENT: usize = 4;
const DEFAULT_HIGHLIGHT_LANGUAGE: &str = "python";

fn text<'a>(filter: &str, value: &'a Value) -> tera::Result<Cow<'a, str>> {
  match value {
    Value::String(s) => Ok(Cow::Borrowed(s)),
    Value::Null => Ok(Cow::Borrowed("")),
    Value::Number(_) | Value::Bool(_) => Ok(Cow::Owned(value.to_string())),
    other => {
      Err(tera::Error::msg(format!(
        "Filter `{filter}` expects text, got {other}"
      )))
    },
  }
}

fn make_filter<F>(func: F) -> Filter
where
  F: Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>
    + Send
    + Sync
    + 'static,
{
  Arc::new(func)
}

fn text_filter(name: &'static str, func: fn(&str) -> String) -> Filter {
  make_filter(move |value, _args| Ok(Value::String(func(&text(name, value)?))))
}

/// Name to filter mapping, built once per converter.
#[derive(Clone)]
pub struct FilterSet {
  filters: BTreeMap<String, Filter>,
}

impl FilterSet {
  /// Filters shared by every environment, plus `escape_tex` for tex.
  #[must_use]
  pub fn new(
    environment: TemplateEnvironment,
    priority: DisplayPriority,
    highlighter: Highlighter,
  ) -> Self {
    let mut set = Self {
      filters: BTreeMap::new(),
    };

    set.insert(
      "filter_data_type",
      make_filter(move |value, _args| {
        let Value::Object(output) = value else {
          return Err(tera::Error::msg(format!(
            "Filter `filter_data_type` expects an output, got {value}"
          )));
        };
        let kinds = priority
          .select_in(output)
          .map(|kind| Value::String(kind.to_string()))
          .into_iter()
          .collect();
        Ok(Value::Array(kinds))
      }),
    );
    set.insert("pycomment", text_filter("pycomment", python_comment));
    set.insert("rm_fake", text_filter("rm_fake", rm_fake));
    set.insert("rm_ansi", text_filter("rm_ansi", strip_ansi));
    set.insert("ansi2html", text_filter("ansi2html", ansi_to_html));
    set.insert("markdown", text_filter("markdown", markdown_to_html));
    set.insert(
      "markdown2latex",
      text_filter("markdown2latex", markdown_to_latex),
    );
    set.insert(
      "indent",
      make_filter(|value, args| {
        let spaces = match args.get("spaces") {
          None => DEFAULT_INDENT,
          Some(spaces) => {
            spaces
              .as_u64()
              .and_then(|n| usize::try_from(n).ok())
              .ok_or_else(|| {
                tera::Error::msg(format!(
                  "Filter `indent`: `spaces` must be a non-negative integer, \
                   got {spaces}"
                ))
              })?
          },
        };
        Ok(Value::String(indent(&text("indent", value)?, spaces)))
      }),
    );
    set.insert(
      "highlight",
      make_filter(move |value, args| {
        let language = args
          .get("lang")
          .and_then(Value::as_str)
          .filter(|lang| !lang.is_empty())
          .unwrap_or(DEFAULT_HIGHLIGHT_LANGUAGE);
        highlighter
          .highlight(&text("highlight", value)?, language)
          .map(Value::String)
          .map_err(|e| tera::Error::chain("Filter `highlight` failed", e))
      }),
    );

    if environment == TemplateEnvironment::Tex {
      set.insert("escape_tex", text_filter("escape_tex", escape_tex));
    }
    set
  }

  /// Add or replace a filter.
  pub fn insert(&mut self, name: impl Into<String>, filter: Filter) {
    self.filters.insert(name.into(), filter);
  }

  #[must_use]
  pub fn get(&self, name: &str) -> Option<&Filter> {
    self.filters.get(name)
  }

  #[must_use]
  pub fn contains(&self, name: &str) -> bool {
    self.filters.contains_key(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.filters.keys().map(String::as_str)
  }

  /// Register every filter with `tera`.
  pub fn install(&self, tera: &mut Tera) {
    for (name, filter) in &self.filters {
      let filter = Arc::clone(filter);
      tera.register_filter(
        name,
        move |value: &Value, args: &HashMap<String, Value>| filter(value, args),
      );
    }
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use serde_json::json;

  use super::*;

  fn apply(set: &FilterSet, name: &str, value: Value) -> Value {
    set.get(name).expect("filter")(&value, &HashMap::new()).expect("apply")
  }

  fn standard() -> FilterSet {
    FilterSet::new(
      TemplateEnvironment::Standard,
      DisplayPriority::default(),
      Highlighter::default(),
    )
  }

  #[test]
  fn test_escape_tex_only_in_tex_environment() {
    assert!(!standard().contains("escape_tex"));
    let tex = FilterSet::new(
      TemplateEnvironment::Tex,
      DisplayPriority::default(),
      Highlighter::default(),
    );
    assert!(tex.contains("escape_tex"));
    assert_eq!(apply(&tex, "escape_tex", json!("a & b")), json!(r"a \& b"));
  }

  #[test]
  fn test_filter_data_type_yields_zero_or_one_kind() {
    let set = standard();
    assert_eq!(
      apply(&set, "filter_data_type", json!({"text": "x", "png": "y"})),
      json!(["png"])
    );
    assert_eq!(
      apply(&set, "filter_data_type", json!({"output_type": "stream"})),
      json!([])
    );
  }

  #[test]
  fn test_indent_arguments() {
    let set = standard();
    let filter = set.get("indent").expect("indent");
    assert_eq!(
      filter(&json!("a\nb"), &HashMap::new()).expect("indent"),
      json!("    a\n    b")
    );

    let mut args = HashMap::new();
    args.insert("spaces".to_string(), json!(2));
    assert_eq!(filter(&json!("a"), &args).expect("indent"), json!("  a"));

    args.insert("spaces".to_string(), json!("two"));
    assert!(filter(&json!("a"), &args).is_err());
  }

  #[test]
  fn test_text_filters_reject_structured_values() {
    let set = standard();
    let filter = set.get("pycomment").expect("pycomment");
    assert!(filter(&json!(["a"]), &HashMap::new()).is_err());
    assert_eq!(apply(&set, "pycomment", json!(null)), json!("# "));
  }

  #[test]
  fn test_installed_filters_render() {
    let mut tera = Tera::default();
    tera
      .add_raw_template("t", "{{ x | pycomment }}|{{ x | indent(spaces=1) }}")
      .expect("template");
    standard().install(&mut tera);

    let mut context = tera::Context::new();
    context.insert("x", "a");
    assert_eq!(tera.render("t", &context).expect("render"), "# a| a");
  }
}
