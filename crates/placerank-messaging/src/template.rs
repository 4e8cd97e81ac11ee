//! Message templates with `#{placeholder}` substitution.

use serde::{Deserialize, Serialize};

use crate::plan::Contact;

/// A named template sent as one message per part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub name: String,
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Names longer than this many characters are cut. `0` disables truncation.
    pub name_max_chars: usize,
    /// Used for `#{name}` when the contact has no usable name.
    pub fallback_name: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            name_max_chars: 10,
            fallback_name: "고객".to_string(),
        }
    }
}

impl MessageTemplate {
    /// Render every part for `contact`.
    ///
    /// Known placeholders are `#{name}` and `#{phone}`; anything else is left
    /// verbatim so typos stay visible in the sent message preview. Parts that
    /// are blank after substitution are dropped.
    #[must_use]
    pub fn render(&self, contact: &Contact, options: &RenderOptions) -> Vec<String> {
        let name = match truncate_display_name(&contact.name, options.name_max_chars) {
            n if n.is_empty() => options.fallback_name.clone(),
            n => n,
        };
        let phone = contact.phone.as_deref().unwrap_or("");

        self.parts
            .iter()
            .map(|part| {
                substitute(part, |key| match key {
                    "name" => Some(name.as_str()),
                    "phone" => Some(phone),
                    _ => None,
                })
            })
            .filter(|rendered| !rendered.trim().is_empty())
            .collect()
    }
}

/// Trim `name` and cut it to at most `max_chars` characters.
///
/// Counts Unicode scalar values so Hangul names are never split mid-character.
#[must_use]
pub fn truncate_display_name(name: &str, max_chars: usize) -> String {
    let trimmed = name.trim();
    if max_chars == 0 {
        return trimmed.to_string();
    }
    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => trimmed[..cut].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

fn substitute<'a, F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("#{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after_open[..end];
        match lookup(key.trim()) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after_open[end + 1..];
    }
    out.push_str(rest);
    out
}
