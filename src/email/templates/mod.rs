//! Plain-text email templates
//!
//! Variables are written as `{{variable_name}}`. Rendering is a single pass
//! over the template, so submitted values that happen to contain `{{...}}`
//! are copied through literally and never expanded.

use std::collections::HashMap;

/// Body used for contact-form submissions
pub const CONTACT_FORM_TEXT: &str = "New contact form submission

Name: {{name}}
Email: {{email}}
Subject: {{subject}}
Message:
{{message}}
";

/// Template rendering engine with variable substitution
#[derive(Debug, Default)]
pub struct TemplateEngine {
    variables: HashMap<String, String>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Render a template, replacing `{{variable}}` with its value.
    ///
    /// Unknown placeholders are left as written.
    pub fn render(&self, template: &str) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];

            match after_open.find("}}") {
                Some(end) => {
                    let key = &after_open[..end];
                    match self.variables.get(key) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after_open[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }
}

/// Render the contact-form body for a submission
pub fn contact_form_body(name: &str, email: &str, subject: &str, message: &str) -> String {
    let mut engine = TemplateEngine::new();
    engine
        .set("name", name)
        .set("email", email)
        .set("subject", subject)
        .set("message", message);
    engine.render(CONTACT_FORM_TEXT)
}
