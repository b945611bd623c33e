//! Section renderer synthesis.
//!
//! The renderer module imports each section type in use exactly once,
//! maps type names to {component, content key}, and walks the original
//! layout list (duplicates included) at render time. Layout entries whose
//! type has no config are skipped, so a draft that references a section
//! this build does not know still renders everything else.

use std::collections::BTreeSet;

use forja_core::content_key;

/// Directory, under the alias, that holds section components.
pub const SECTIONS_DIR: &str = "@/components/sections";

/// Prefix of every component binding. Section names are PascalCase, so
/// prefixed bindings never collide with the module's own identifiers or with
/// global type names like `Record`.
const BINDING_PREFIX: &str = "Section_";

/// Import specifier of a section type's component.
pub fn section_specifier(name: &str) -> String {
    format!("{}/{}", SECTIONS_DIR, name)
}

/// One default import of a section component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionImport {
    /// Local binding in the generated module.
    pub binding: String,
    pub specifier: String,
}

/// One row of the type → component lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionConfig {
    pub name: String,
    pub binding: String,
    pub content_key: String,
}

/// One layout entry as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEntry {
    pub name: String,
    /// Component binding, or `None` when the entry will be skipped.
    pub binding: Option<String>,
}

/// The structure of a renderer module, before emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPlan {
    imports: Vec<SectionImport>,
    configs: Vec<SectionConfig>,
    render_list: Vec<RenderEntry>,
}

impl SectionPlan {
    /// Plan a renderer for `layout`, where `known` lists the section types
    /// available to this build.
    pub fn new(layout: &[&str], known: &[String]) -> Self {
        let known: BTreeSet<&str> = known.iter().map(String::as_str).collect();

        let mut seen = BTreeSet::new();
        let mut imports = Vec::new();
        let mut configs = Vec::new();
        for &name in layout {
            if !known.contains(name) || !seen.insert(name) {
                continue;
            }
            let binding = binding_for(name);
            imports.push(SectionImport {
                binding: binding.clone(),
                specifier: section_specifier(name),
            });
            configs.push(SectionConfig {
                name: name.to_string(),
                binding,
                content_key: content_key(name),
            });
        }

        let render_list = layout
            .iter()
            .map(|&name| RenderEntry {
                name: name.to_string(),
                binding: configs
                    .iter()
                    .find(|c| c.name == name)
                    .map(|c| c.binding.clone()),
            })
            .collect();

        SectionPlan {
            imports,
            configs,
            render_list,
        }
    }

    pub fn imports(&self) -> &[SectionImport] {
        &self.imports
    }

    pub fn configs(&self) -> &[SectionConfig] {
        &self.configs
    }

    pub fn render_list(&self) -> &[RenderEntry] {
        &self.render_list
    }

    /// Emit src/components/forja/SectionRenderer.tsx.
    pub fn emit(&self) -> String {
        let mut out = String::from(
            "// Generated by forja. Do not edit.\n\
             import * as React from \"react\";\n\
             import content from \"@/data/content.json\";\n",
        );
        for import in &self.imports {
            out.push_str(&format!(
                "import {} from {};\n",
                import.binding,
                js_string(&import.specifier)
            ));
        }

        out.push_str(
            "\ntype SectionConfig = {\n\
             \x20 // eslint-disable-next-line @typescript-eslint/no-explicit-any\n\
             \x20 component: React.ComponentType<any>;\n\
             \x20 contentKey: string;\n\
             };\n\n",
        );

        if self.configs.is_empty() {
            out.push_str("const sectionsConfig: Record<string, SectionConfig> = {};\n\n");
        } else {
            out.push_str("const sectionsConfig: Record<string, SectionConfig> = {\n");
            for config in &self.configs {
                out.push_str(&format!(
                    "  {}: {{ component: {}, contentKey: {} }},\n",
                    js_string(&config.name),
                    config.binding,
                    js_string(&config.content_key)
                ));
            }
            out.push_str("};\n\n");
        }

        let layout: Vec<String> = self.render_list.iter().map(|e| js_string(&e.name)).collect();
        out.push_str(&format!(
            "export const layout: readonly string[] = [{}];\n\n",
            layout.join(", ")
        ));

        out.push_str(RENDER_FUNCTIONS);
        out
    }
}

const RENDER_FUNCTIONS: &str = r#"const dictionary = content as unknown as Record<
  string,
  Record<string, unknown> | undefined
>;

export function renderSections(locale: string): React.ReactNode[] {
  const rendered: React.ReactNode[] = [];
  layout.forEach((name, index) => {
    const config = sectionsConfig[name];
    if (!config) {
      return;
    }
    const Component = config.component;
    const slice = dictionary[config.contentKey]?.[locale] ?? {};
    rendered.push(
      <Component key={`${name}-${index}`} content={slice} locale={locale} />,
    );
  });
  return rendered;
}

export function SectionRenderer({ locale }: { locale: string }) {
  return <>{renderSections(locale)}</>;
}
"#;

fn binding_for(name: &str) -> String {
    format!("{}{}", BINDING_PREFIX, name)
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
