//! Theme engine with Tera templates.
//!
//! Templates are compiled into the binary so the server has no runtime
//! dependency on the working directory.

use anyhow::{Context, Result};
use tera::Tera;
use tracing::debug;

use crate::form::CSRF_FIELD;

/// Built-in templates as (name, source) pairs. `layout.html` must come first.
const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../templates/layout.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("home.html", include_str!("../../templates/home.html")),
    ("access.html", include_str!("../../templates/access.html")),
];

/// Site name injected into every page.
const SITE_NAME: &str = "Gatehouse";

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    /// Tera template engine instance.
    tera: Tera,
}

impl ThemeEngine {
    /// Create a theme engine from the built-in templates.
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())
            .context("failed to initialize Tera templates")?;

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), "loaded templates");

        Ok(Self { tera })
    }

    /// Render a page template, adding the site-wide context.
    pub fn render(&self, template: &str, mut context: tera::Context) -> Result<String> {
        context.insert("site_name", SITE_NAME);
        context.insert("csrf_field", CSRF_FIELD);
        self.tera
            .render(template, &context)
            .with_context(|| format!("failed to render {template}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn login_page_has_title_and_csrf_field() {
        let theme = ThemeEngine::new().unwrap();
        let mut context = tera::Context::new();
        context.insert("csrf_token", "abc123");
        context.insert("error", &Option::<String>::None);
        context.insert("notice", &Option::<String>::None);

        let html = theme.render("login.html", context).unwrap();
        assert!(html.contains("<title>Login"));
        assert!(html.contains(r#"name="_csrf" value="abc123""#));
    }

    #[test]
    fn access_page_says_access_denied() {
        let theme = ThemeEngine::new().unwrap();
        let mut context = tera::Context::new();
        context.insert("message", "You are not allowed here.");

        let html = theme.render("access.html", context).unwrap();
        assert!(html.contains("Access denied"));
        assert!(html.contains("You are not allowed here."));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let theme = ThemeEngine::new().unwrap();
        assert!(theme.render("missing.html", tera::Context::new()).is_err());
    }
}
