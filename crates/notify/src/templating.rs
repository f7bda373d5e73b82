//! Minijinja template rendering for campaign subjects and bodies.
//!
//! Templates see the recipient as `user`: `{{ user.email }}`,
//! `{{ user.username }}`, `{{ user.profile[0].credits }}`.
//!
//! Templates are arbitrary strings (not pre-registered), so a fresh
//! [`minijinja::Environment`] is created per render call.

use drip_core::{Recipient, Record};
use minijinja::AutoEscape;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::traits::NotifyError;

/// Context data available to campaign templates.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    /// The recipient: `id`, `email`, every scalar field and every relation
    /// as a list of records.
    pub user: Value,
}

impl TemplateContext {
    pub fn for_recipient(recipient: &Recipient) -> Self {
        let mut user = Map::new();
        for (name, value) in &recipient.fields {
            user.insert(name.clone(), to_value(value));
        }
        for (name, records) in &recipient.relations {
            user.insert(name.clone(), Value::Array(records.iter().map(record_value).collect()));
        }
        user.insert("id".to_string(), Value::from(recipient.id));
        user.insert("email".to_string(), Value::from(recipient.email.clone()));
        Self {
            user: Value::Object(user),
        }
    }
}

fn record_value(record: &Record) -> Value {
    let mut map = Map::new();
    if let Some(id) = record.id {
        map.insert("id".to_string(), Value::from(id));
    }
    for (name, value) in &record.fields {
        map.insert(name.clone(), to_value(value));
    }
    for (name, records) in &record.relations {
        map.insert(name.clone(), Value::Array(records.iter().map(record_value).collect()));
    }
    Value::Object(map)
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Renders campaign templates using minijinja.
#[derive(Debug, Default)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn build_env(escape: AutoEscape) -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.set_auto_escape_callback(move |_| escape.clone());
        env.add_filter("round", round_filter);
        env.add_filter("lower", lower_filter);
        env.add_filter("upper", upper_filter);
        env
    }

    /// Render a template string with the given context, unescaped. Used for
    /// subjects and other header values.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(&self, template_str: &str, ctx: &TemplateContext) -> Result<String, NotifyError> {
        Self::build_env(AutoEscape::None)
            .render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Render a message body. Interpolated values are HTML-escaped; a
    /// template opts out per value with the `safe` filter.
    pub fn render_body(
        &self,
        template_str: &str,
        ctx: &TemplateContext,
    ) -> Result<String, NotifyError> {
        Self::build_env(AutoEscape::Html)
            .render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Check that a template string parses, without evaluating it.
    pub fn validate(&self, template_str: &str) -> Result<(), NotifyError> {
        let env = Self::build_env(AutoEscape::None);
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}

/// Round a float to N decimal places.
fn round_filter(value: f64, decimals: Option<u32>) -> String {
    let n = decimals.unwrap_or(0);
    format!("{:.prec$}", value, prec = n as usize)
}

fn lower_filter(value: String) -> String {
    value.to_lowercase()
}

fn upper_filter(value: String) -> String {
    value.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> TemplateContext {
        let recipient = Recipient::new(42, "kitty@example.com")
            .with_field("username", "kitty")
            .with_field("balance", 12.3456)
            .with_relation(
                "profile",
                vec![Record::new().with_id(7).with_field("credits", 3i64)],
            );
        TemplateContext::for_recipient(&recipient)
    }

    #[test]
    fn render_recipient_fields() {
        let renderer = TemplateRenderer::new();
        let ctx = sample_context();
        let result = renderer
            .render("HELLO {{ user.username }} <{{ user.email }}> #{{ user.id }}", &ctx)
            .unwrap();
        assert_eq!(result, "HELLO kitty <kitty@example.com> #42");
    }

    #[test]
    fn render_relation_access() {
        let renderer = TemplateRenderer::new();
        let ctx = sample_context();
        let result = renderer
            .render("{{ user.profile[0].credits }} credits", &ctx)
            .unwrap();
        assert_eq!(result, "3 credits");
    }

    #[test]
    fn render_filters() {
        let renderer = TemplateRenderer::new();
        let ctx = sample_context();
        assert_eq!(
            renderer.render("{{ user.balance | round(2) }}", &ctx).unwrap(),
            "12.35"
        );
        assert_eq!(
            renderer.render("{{ user.username | upper }}", &ctx).unwrap(),
            "KITTY"
        );
    }

    #[test]
    fn body_escapes_recipient_values() {
        let renderer = TemplateRenderer::new();
        let recipient = Recipient::new(5, "x@example.com").with_field("username", "<i>Tom & Jerry");
        let ctx = TemplateContext::for_recipient(&recipient);

        assert_eq!(
            renderer.render_body("<p>{{ user.username }}</p>", &ctx).unwrap(),
            "<p>&lt;i&gt;Tom &amp; Jerry</p>"
        );
        assert_eq!(
            renderer.render_body("{{ user.username | safe }}", &ctx).unwrap(),
            "<i>Tom & Jerry"
        );
        assert_eq!(
            renderer.render("{{ user.username }}", &ctx).unwrap(),
            "<i>Tom & Jerry"
        );
    }

    #[test]
    fn missing_field_renders_empty() {
        let renderer = TemplateRenderer::new();
        let ctx = sample_context();
        assert_eq!(
            renderer.render("[{{ user.nickname }}]", &ctx).unwrap(),
            "[]"
        );
    }

    #[test]
    fn invalid_template_produces_error() {
        let renderer = TemplateRenderer::new();
        let ctx = sample_context();

        match renderer.render("{{ unclosed", &ctx).unwrap_err() {
            NotifyError::Template(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected Template error, got: {:?}", other),
        }
    }

    #[test]
    fn validate_templates() {
        let renderer = TemplateRenderer::new();
        assert!(renderer.validate("Hello {{ user.username }}").is_ok());
        assert!(renderer.validate("{% if %}").is_err());
    }
}
