//! Template renderer: turns a text template plus collected data into the
//! final context document. Wraps [`minijinja`] and adds a compatibility
//! layer translating the user-facing `{UPPER}` placeholder syntax into
//! native `{{ lower }}` expressions before parsing.

use std::collections::HashMap;

use minijinja::value::Value;
use minijinja::Environment;
use regex::Regex;

use crate::collector::CollectedFile;
use crate::error::{Result, ShotgunError};

/// The default Markdown context-document template, per the external
/// interface contract: a header, the file-structure block (ASCII tree plus
/// `<file>` blocks, precomputed into `file_structure`), a fenced-code
/// "File Contents" section iterating `files`, and a size-limit footer.
pub const DEFAULT_TEMPLATE: &str = r#"# Project Context

**Generated:** {{ current_date }}
{% if task %}**Task:** {{ task }}
{% endif -%}
{% if rules %}**Rules:** {{ rules }}
{% endif %}
## File Structure

{{ file_structure }}
{% if files %}
## File Contents
{% for f in files %}### {{ f.path }} ({{ f.language }})
```{{ f.language }}
{{ f.content }}
```
{% endfor -%}
{% endif -%}
---
*Context generated with {{ config.max_total_size_mb }} MB size limit*
"#;

/// Variables the renderer places in the template namespace regardless of
/// `template_vars`; `template_vars` entries are merged in alongside these
/// under their lowercased key.
pub struct TemplateContext<'a> {
    pub file_structure: String,
    pub files: &'a [CollectedFile],
    pub current_date: String,
    pub max_total_size_bytes: u64,
    pub template_vars: &'a HashMap<String, String>,
}

pub struct TemplateRenderer;

impl TemplateRenderer {
    /// Render `template_text` (or [`DEFAULT_TEMPLATE`] if `None`) against
    /// `ctx`. The default template requires a `TASK` entry in
    /// `ctx.template_vars`; its absence is a variable-missing error.
    pub fn render(template_text: Option<&str>, ctx: &TemplateContext) -> Result<String> {
        let using_default = template_text.is_none();
        if using_default && !ctx.template_vars.contains_key("TASK") {
            return Err(ShotgunError::TemplateError(
                "template variable TASK is required but was not provided".to_string(),
            ));
        }

        let raw = template_text.unwrap_or(DEFAULT_TEMPLATE);
        let known_keys: Vec<String> = ctx
            .template_vars
            .keys()
            .cloned()
            .chain(["TASK".into(), "RULES".into(), "FILE_STRUCTURE".into(), "CURRENT_DATE".into()])
            .collect();
        let native = translate_placeholders(raw, &known_keys);

        let mut env = Environment::new();
        env.add_filter("truncate", truncate_filter);
        env.add_filter("formatSize", format_size_filter);
        env.add_function("now", now_fn);
        env.add_filter("detectLang", detect_lang_filter);
        env.add_template("context", &native)
            .map_err(|e| ShotgunError::TemplateError(format!("parse error: {e}")))?;
        let template = env
            .get_template("context")
            .map_err(|e| ShotgunError::TemplateError(e.to_string()))?;

        let files: Vec<Value> = ctx
            .files
            .iter()
            .map(|f| {
                Value::from_serialize(&serde_json::json!({
                    "path": f.rel_path,
                    "language": f.language,
                    "content": f.content,
                    "size": f.size,
                }))
            })
            .collect();

        let max_mb = ctx.max_total_size_bytes as f64 / (1024.0 * 1024.0);

        let mut vars: HashMap<String, Value> = HashMap::new();
        for (key, value) in ctx.template_vars {
            vars.insert(key.to_lowercase(), Value::from(value.as_str()));
        }
        vars.insert("task".into(), Value::from(ctx.template_vars.get("TASK").cloned().unwrap_or_default()));
        vars.insert("rules".into(), Value::from(ctx.template_vars.get("RULES").cloned().unwrap_or_default()));
        vars.insert("file_structure".into(), Value::from(ctx.file_structure.as_str()));
        vars.insert("files".into(), Value::from(files));
        vars.insert("current_date".into(), Value::from(ctx.current_date.as_str()));
        vars.insert(
            "config".into(),
            Value::from_serialize(&serde_json::json!({ "max_total_size_mb": format!("{max_mb:.1}") })),
        );

        template
            .render(vars)
            .map_err(|e| ShotgunError::TemplateError(format!("render error: {e}")))
    }
}

/// Convert `{UPPER_NAME}` placeholders whose name is in `known_keys` into
/// `{{ lower_name }}` native expressions. Anything not in `known_keys` is
/// left untouched (it may be literal braces, or native `{{ }}` / `{% %}`
/// syntax already).
fn translate_placeholders(text: &str, known_keys: &[String]) -> String {
    let re = Regex::new(r"\{([A-Z][A-Z0-9_]*)\}").unwrap();
    re.replace_all(text, |caps: &regex::Captures| {
        let name = &caps[1];
        if known_keys.iter().any(|k| k == name) {
            format!("{{{{ {} }}}}", name.to_lowercase())
        } else {
            caps[0].to_string()
        }
    })
    .into_owned()
}

fn truncate_filter(value: String, n: usize) -> String {
    if value.chars().count() <= n {
        value
    } else {
        value.chars().take(n).collect::<String>() + "…"
    }
}

fn format_size_filter(bytes: u64) -> String {
    crate::util::human_readable_size(bytes)
}

fn detect_lang_filter(filename: String) -> String {
    crate::constants::detect_language(&filename).to_string()
}

fn now_fn() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
