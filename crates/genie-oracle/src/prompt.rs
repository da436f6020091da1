//! Prompt template loading and rendering via `minijinja`.
//!
//! Four templates make up the oracle's prompts: `system.j2` shared by every
//! request, and one user template per request kind (`classify.j2`,
//! `fuse.j2`, `materialize.j2`). Built-in copies are compiled into the
//! binary; a templates directory can override them so operators can tune
//! the oracle's voice without recompiling.

use genie_types::OracleRequest;
use minijinja::Environment;

use crate::error::OracleError;

/// Template names, in load order.
const TEMPLATE_NAMES: [&str; 4] = ["system", "classify", "fuse", "materialize"];

/// Built-in template sources keyed by name.
const BUILTIN_TEMPLATES: [(&str, &str); 4] = [
    ("system", include_str!("../templates/system.j2")),
    ("classify", include_str!("../templates/classify.j2")),
    ("fuse", include_str!("../templates/fuse.j2")),
    ("materialize", include_str!("../templates/materialize.j2")),
];

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the oracle's role.
    pub system: String,
    /// User message carrying the request.
    pub user: String,
}

impl PromptEngine {
    /// Create a prompt engine from the built-in templates.
    pub fn builtin() -> Result<Self, OracleError> {
        let mut env = Environment::new();
        for (name, source) in BUILTIN_TEMPLATES {
            env.add_template(name, source).map_err(|e| {
                OracleError::Template(format!("failed to add {name} template: {e}"))
            })?;
        }
        Ok(Self { env })
    }

    /// Create a prompt engine, overriding built-ins with any `<name>.j2`
    /// found in `templates_dir`.
    ///
    /// Missing files fall back to the built-in version; unreadable files
    /// and template syntax errors are reported.
    pub fn with_overrides(templates_dir: &str) -> Result<Self, OracleError> {
        let mut engine = Self::builtin()?;
        for name in TEMPLATE_NAMES {
            let path = std::path::Path::new(templates_dir).join(format!("{name}.j2"));
            if !path.exists() {
                continue;
            }
            let source = std::fs::read_to_string(&path).map_err(|e| {
                OracleError::Template(format!("failed to read {}: {e}", path.display()))
            })?;
            engine.env.add_template_owned(name, source).map_err(|e| {
                OracleError::Template(format!("failed to add {name} template: {e}"))
            })?;
        }
        Ok(engine)
    }

    /// Build the engine described by an optional override directory.
    pub fn new(templates_dir: Option<&str>) -> Result<Self, OracleError> {
        templates_dir.map_or_else(Self::builtin, Self::with_overrides)
    }

    /// Render the system and user prompt for one oracle request.
    pub fn render(
        &self,
        request: &OracleRequest,
        locale: &str,
    ) -> Result<RenderedPrompt, OracleError> {
        let mut context = serde_json::to_value(request)
            .map_err(|e| OracleError::Template(format!("request serialization failed: {e}")))?;
        if let Some(fields) = context.as_object_mut() {
            fields.insert("locale".to_owned(), serde_json::Value::from(locale));
        }

        let system = self.render_one("system", &context)?;
        let user = self.render_one(request.kind(), &context)?;

        Ok(RenderedPrompt { system, user })
    }

    fn render_one(&self, name: &str, context: &serde_json::Value) -> Result<String, OracleError> {
        self.env
            .get_template(name)
            .map_err(|e| OracleError::Template(format!("missing {name} template: {e}")))?
            .render(context)
            .map_err(|e| OracleError::Template(format!("{name} render failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let unique = format!(
            "genie_test_templates_{tag}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        dir
    }

    #[test]
    fn builtin_classify_prompt_quotes_the_word() {
        let engine = PromptEngine::builtin();
        assert!(engine.is_ok(), "built-in templates must compile");
        let Ok(engine) = engine else {
            return;
        };
        let request = OracleRequest::Classify {
            word: "alegria".to_owned(),
        };
        let prompt = engine.render(&request, "Brazilian Portuguese");
        assert!(prompt.is_ok(), "classify prompt must render");
        let Ok(prompt) = prompt else {
            return;
        };
        assert!(prompt.system.contains("Brazilian Portuguese"));
        assert!(prompt.user.contains("\"alegria\""));
        assert!(prompt.user.contains("colorHex"));
    }

    #[test]
    fn builtin_fuse_and_materialize_prompts_render() {
        let Ok(engine) = PromptEngine::builtin() else {
            return;
        };
        let fuse = engine.render(
            &OracleRequest::Fuse {
                label_a: "Raiva".to_owned(),
                label_b: "Medo".to_owned(),
            },
            "English",
        );
        assert!(fuse.is_ok_and(|p| p.user.contains("\"Raiva\"") && p.user.contains("\"Medo\"")));

        let aura = engine.render(
            &OracleRequest::Materialize {
                label: "Saudade".to_owned(),
            },
            "English",
        );
        assert!(aura.is_ok_and(|p| p.user.contains("\"Saudade\"") && p.user.contains("tagline")));
    }

    #[test]
    fn directory_overrides_replace_only_present_templates() {
        let dir = scratch_dir("override");
        std::fs::write(dir.join("classify.j2"), "CUSTOM {{ word }}").ok();

        let engine = PromptEngine::with_overrides(dir.to_str().unwrap_or(""));
        assert!(engine.is_ok(), "override directory should load");
        let Ok(engine) = engine else {
            return;
        };
        let prompt = engine.render(
            &OracleRequest::Classify {
                word: "medo".to_owned(),
            },
            "English",
        );
        assert!(prompt.is_ok_and(|p| p.user == "CUSTOM medo" && p.system.contains("Genie")));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn broken_override_is_reported() {
        let dir = scratch_dir("broken");
        std::fs::write(dir.join("fuse.j2"), "{% if %}").ok();

        let result = PromptEngine::with_overrides(dir.to_str().unwrap_or(""));
        assert!(matches!(result, Err(OracleError::Template(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
