//! Variadic-style helpers (component O). Rust has no varargs; the
//! idiomatic substitute for the original's format-then-va_list helpers
//! (e.g. `p_strdup_vprintf`) is a builder that accumulates typed
//! arguments and formats them positionally.

use std::fmt::Display;

/// Accumulates a heterogeneous argument list, then renders it against a
/// template with `{}` placeholders — the builder-pattern stand-in for C
/// varargs.
#[derive(Default)]
pub struct ArgList {
    rendered: Vec<String>,
}

impl ArgList {
    pub fn new() -> Self {
        ArgList::default()
    }

    pub fn push(mut self, value: impl Display) -> Self {
        self.rendered.push(value.to_string());
        self
    }

    /// Substitutes each `{}` in `template`, in order, with the pushed
    /// arguments. Extra `{}` placeholders beyond the argument count are
    /// left untouched; extra arguments beyond the placeholder count are
    /// ignored.
    pub fn format(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut args = self.rendered.iter();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '{' && chars.peek() == Some(&'}') {
                chars.next();
                match args.next() {
                    Some(arg) => out.push_str(arg),
                    None => out.push_str("{}"),
                }
            } else {
                out.push(c);
            }
        }

        out
    }

    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_placeholders_in_order() {
        let args = ArgList::new().push("multios").push(42).push(3.5);
        assert_eq!(args.format("name={} count={} ratio={}"), "name=multios count=42 ratio=3.5");
    }

    #[test]
    fn leftover_placeholder_is_left_as_is() {
        let args = ArgList::new().push(1);
        assert_eq!(args.format("{} {}"), "1 {}");
    }
}
