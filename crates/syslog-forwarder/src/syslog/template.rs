// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Line templates with named placeholders.
//!
//! A template is plain text with `{{.Field}}` actions, for example:
//!
//! ```text
//! {{.Hostname}} {{.Syslogtag}}: [{{.Severity}}] {{.Message}}
//! ```
//!
//! Whitespace inside the braces is ignored (`{{ .Message }}`). Text outside
//! actions, including a lone `}}`, is copied verbatim.
//!
//! Parsing only checks syntax. Whether a field exists is decided when the
//! template is rendered against a [`TemplateFields`] source, so the same
//! template can be reused across sources exposing different fields.

use std::borrow::Cow;

use thiserror::Error;

const ACTION_OPEN: &str = "{{";
const ACTION_CLOSE: &str = "}}";

/// Malformed template text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template: unclosed action starting at byte {offset}")]
    UnclosedAction { offset: usize },

    #[error("template: empty action at byte {offset}")]
    EmptyAction { offset: usize },

    #[error("template: action {action:?} at byte {offset} must reference a field as .Name")]
    MissingFieldDot { offset: usize, action: String },

    #[error("template: invalid field name {name:?} at byte {offset}")]
    InvalidFieldName { offset: usize, name: String },
}

/// Failure while evaluating a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("template: can't evaluate field {name}")]
    UnknownField { name: String },
}

/// A value whose named fields can be substituted into a [`Template`].
pub trait TemplateFields {
    /// Returns the field's textual value, or `None` if no such field exists.
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed template, ready to be rendered any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find(ACTION_OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let action_offset = offset + start;
            let body = &rest[start + ACTION_OPEN.len()..];
            let end = body.find(ACTION_CLOSE).ok_or(TemplateError::UnclosedAction {
                offset: action_offset,
            })?;

            let field = parse_action(body[..end].trim(), action_offset)?;
            segments.push(Segment::Field(field));

            let consumed = start + ACTION_OPEN.len() + end + ACTION_CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Template {
            source: source.to_string(),
            segments,
        })
    }

    /// Substitutes every action with the matching field of `fields`.
    ///
    /// No partial output is produced: the first unknown field aborts the
    /// render.
    pub fn render<F>(&self, fields: &F) -> Result<String, RenderError>
    where
        F: TemplateFields + ?Sized,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    let value = fields.field(name).ok_or_else(|| RenderError::UnknownField {
                        name: name.clone(),
                    })?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Field names referenced by the template, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

fn parse_action(action: &str, offset: usize) -> Result<String, TemplateError> {
    if action.is_empty() {
        return Err(TemplateError::EmptyAction { offset });
    }
    let Some(name) = action.strip_prefix('.') else {
        return Err(TemplateError::MissingFieldDot {
            offset,
            action: action.to_string(),
        });
    };
    if !is_identifier(name) {
        return Err(TemplateError::InvalidFieldName {
            offset,
            name: name.to_string(),
        });
    }
    Ok(name.to_string())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
