//! Global stylesheet derived from theme tokens.
//!
//! Every leaf of the theme becomes a CSS custom property on `:root`, named
//! after its path: `colors.primary` → `--colors-primary`,
//! `fonts.heading.family` → `--fonts-heading-family`. Arrays are joined
//! with `, ` (font stacks), quoting entries that contain whitespace.

use forja_core::AssembledTheme;
use serde_json::Value;

use crate::CodegenError;

/// Generate src/app/globals.css content.
pub fn globals_css(theme: &AssembledTheme) -> Result<String, CodegenError> {
    let mut props = Vec::new();
    flatten("", theme.as_value(), &mut props)?;

    let mut css = String::from("/* Generated by forja from the campaign theme. */\n:root {\n");
    for (name, value) in &props {
        css.push_str(&format!("  --{}: {};\n", name, value));
    }
    css.push_str("}\n");
    css.push_str(BASE_RULES);
    Ok(css)
}

const BASE_RULES: &str = r#"
*, *::before, *::after {
  box-sizing: border-box;
}

html {
  -webkit-font-smoothing: antialiased;
}

body {
  margin: 0;
  background-color: var(--colors-background);
  color: var(--colors-foreground);
  font-family: var(--fonts-body-family);
  line-height: 1.6;
}

h1, h2, h3, h4, h5, h6 {
  font-family: var(--fonts-heading-family);
  line-height: 1.2;
}

a {
  color: var(--colors-primary);
}

button {
  border-radius: var(--radii-md);
}

main > section {
  padding-block: var(--spacing-section, 4rem);
}
"#;

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) -> Result<(), CodegenError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let name = if prefix.is_empty() {
                    css_ident(key)?
                } else {
                    format!("{}-{}", prefix, css_ident(key)?)
                };
                flatten(&name, child, out)?;
            }
        }
        Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| scalar(prefix, item, true))
                .collect::<Result<Vec<_>, _>>()?;
            out.push((prefix.to_string(), parts.join(", ")));
        }
        other => out.push((prefix.to_string(), scalar(prefix, other, false)?)),
    }
    Ok(())
}

fn scalar(name: &str, value: &Value, in_list: bool) -> Result<String, CodegenError> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => {
            return Err(CodegenError::InvalidInput(format!(
                "theme token '{}' nests a collection inside a list",
                name
            )));
        }
    };
    if text.contains([';', '{', '}', '<', '>']) {
        return Err(CodegenError::InvalidInput(format!(
            "theme token '{}' contains characters not allowed in CSS values",
            name
        )));
    }
    if in_list && text.contains(char::is_whitespace) && !text.starts_with(['"', '\'']) {
        Ok(format!("\"{}\"", text.replace('"', "\\\"")))
    } else {
        Ok(text)
    }
}

fn css_ident(key: &str) -> Result<String, CodegenError> {
    if !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(key.to_string())
    } else {
        Err(CodegenError::InvalidInput(format!(
            "theme key '{}' is not a valid CSS identifier",
            key
        )))
    }
}
