//! Template rendering utilities using Tera
//!
//! Analyst-facing reports and playbooks accept small inline templates so
//! operators can customize the rendered output without recompiling.

use serde_json::Value;
use tera::{Context, Tera};

use crate::{Error, Result};

/// Render a template string with the given JSON context.
///
/// Object fields become top-level template variables; any other JSON value
/// is exposed as `data`.
pub fn render_template(template: &str, context: &Value) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template("template", template)
        .map_err(|e| Error::Template(format!("Failed to parse template: {}", e)))?;

    let mut tera_context = Context::new();
    match context {
        Value::Object(map) => {
            for (key, value) in map {
                tera_context.insert(key, &value);
            }
        }
        _ => {
            tera_context.insert("data", &context);
        }
    }

    tera.render("template", &tera_context)
        .map_err(|e| Error::Template(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_simple_template() {
        let context = json!({
            "alert": "Suspicious login",
            "severity": "high",
        });
        let result = render_template("Alert: {{ alert }} ({{ severity }})", &context).unwrap();
        assert_eq!(result, "Alert: Suspicious login (high)");
    }

    #[test]
    fn test_render_with_loop() {
        let context = json!({
            "iocs": ["1.2.3.4", "evil.example"],
        });
        let result =
            render_template("{% for i in iocs %}- {{ i }}\n{% endfor %}", &context).unwrap();
        assert_eq!(result, "- 1.2.3.4\n- evil.example\n");
    }

    #[test]
    fn test_render_non_object_context() {
        let result = render_template("value is {{ data }}", &json!(42)).unwrap();
        assert_eq!(result, "value is 42");
    }

    #[test]
    fn test_invalid_template_is_an_error() {
        let err = render_template("{{ unclosed", &json!({})).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }
}
