//! Path pattern compilation and matching.
//!
//! Templates contain literal text and placeholders:
//!
//! - `{name}` required, matches `[^/]+` unless constrained
//! - `{name?}` optional; every later placeholder must be optional too
//! - `{name:num}`, `{name:any}`, `{name:all}` built-in classes
//! - `{name:<regex>}` inline regex, e.g. `{lang:[a-z]{2}}`
//!
//! Each placeholder owns the `/` in front of it, so an optional placeholder
//! drops its slash when absent: `/pages/{slug?}` matches `/pages` as well as
//! `/pages/about`.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{Result, RouterError};
use crate::request::PathParams;

/// Placeholder constraints: parameter name to regex fragment.
pub type Constraints = HashMap<String, String>;

/// Default regex for a placeholder without constraint.
const DEFAULT_CLASS: &str = "[^/]+";

/// A piece of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Literal text, including slashes.
    Literal(String),
    /// A placeholder together with its leading slash.
    Param {
        name: String,
        modifier: Option<String>,
        optional: bool,
    },
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
    regex: Regex,
    variable_names: Vec<String>,
}

impl PathPattern {
    /// Compiles a template without constraints.
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_router::PathPattern;
    ///
    /// let pattern = PathPattern::new("/posts/{id:num}/{slug?}").unwrap();
    /// let params = pattern.match_path("/posts/42/hello-world").unwrap();
    /// assert_eq!(params.get("id"), Some("42"));
    /// assert_eq!(params.get("slug"), Some("hello-world"));
    ///
    /// assert!(pattern.match_path("/posts/42").is_some());
    /// assert!(pattern.match_path("/posts/abc").is_none());
    /// ```
    pub fn new(template: &str) -> Result<Self> {
        Self::compile(template, &Constraints::new(), &Constraints::new())
    }

    /// Compiles a template.
    ///
    /// The regex of a placeholder is, by precedence: its inline modifier,
    /// the route constraint, the global constraint, then `[^/]+`.
    pub fn compile(template: &str, route: &Constraints, global: &Constraints) -> Result<Self> {
        let template = Self::normalize(template);
        let segments = parse(&template)?;

        let mut regex = String::from("(?i)^");
        let mut variable_names: Vec<String> = Vec::new();
        let mut optionals = 0usize;

        for segment in &segments {
            match segment {
                Segment::Literal(text) => regex.push_str(&regex::escape(text)),
                Segment::Param {
                    name,
                    modifier,
                    optional,
                } => {
                    if variable_names.contains(name) {
                        return Err(RouterError::DuplicateParameter {
                            pattern: template,
                            name: name.clone(),
                        });
                    }
                    if !optional && optionals > 0 {
                        return Err(RouterError::RequiredAfterOptional {
                            pattern: template,
                            name: name.clone(),
                        });
                    }
                    variable_names.push(name.clone());

                    let class = modifier
                        .as_deref()
                        .map(builtin_class)
                        .or_else(|| route.get(name).map(String::as_str))
                        .or_else(|| global.get(name).map(String::as_str))
                        .unwrap_or(DEFAULT_CLASS);
                    let group = format!("/(?P<{name}>{class})");

                    if *optional {
                        regex.push_str("(?:");
                        optionals += 1;
                    }
                    regex.push_str(&group);
                }
            }
        }

        regex.push_str(&")?".repeat(optionals));
        regex.push('$');

        let regex = Regex::new(&regex).map_err(|e| RouterError::InvalidPattern {
            pattern: template.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            template,
            segments,
            regex,
            variable_names,
        })
    }

    /// Normalizes a template or path to a single leading slash and no
    /// trailing slash. The root path stays `/`.
    #[must_use]
    pub fn normalize(template: &str) -> String {
        format!("/{}", template.trim().trim_matches('/'))
    }

    /// Matches a path, returning the non-empty captured parameters in
    /// declaration order.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        // A template made only of optionals matches the root path.
        let caps = self
            .regex
            .captures(path)
            .or_else(|| (path == "/").then(|| self.regex.captures("")).flatten())?;

        let mut params = PathParams::new();
        for name in &self.variable_names {
            if let Some(value) = caps.name(name).filter(|m| !m.as_str().is_empty()) {
                params.insert(name.clone(), value.as_str());
            }
        }

        Some(params)
    }

    /// Returns the normalized template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the placeholder names in declaration order.
    #[must_use]
    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    /// Returns the compiled regex source.
    #[must_use]
    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Builds a path from parameters.
    ///
    /// Required placeholders must be present. Output stops at the first
    /// absent optional placeholder.
    ///
    /// ```
    /// use oxide_router::{PathParams, PathPattern};
    ///
    /// let pattern = PathPattern::new("/archive/{year}/{month?}").unwrap();
    /// let params: PathParams = [("year", "2024")].into_iter().collect();
    /// assert_eq!(pattern.reverse(&params).as_deref(), Some("/archive/2024"));
    /// ```
    #[must_use]
    pub fn reverse(&self, params: &PathParams) -> Option<String> {
        let mut path = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param { name, optional, .. } => {
                    match params.get(name).filter(|v| !v.is_empty()) {
                        Some(value) => {
                            path.push('/');
                            path.push_str(value);
                        }
                        None if *optional => break,
                        None => return None,
                    }
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }
        Some(path)
    }
}

/// Splits a normalized template into literals and placeholders.
///
/// Placeholders start at `/{` and end at the matching `}`, counting nested
/// braces so inline regexes may use repetition counts.
fn parse(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(start) = rest.find("/{") {
        literal.push_str(&rest[..start]);
        let body_start = start + 2;

        let end = closing_brace(&rest[body_start..])
            .ok_or_else(|| invalid(template, "unterminated placeholder"))?;
        let body = &rest[body_start..body_start + end];

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(placeholder(template, body)?);

        rest = &rest[body_start + end + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

/// Returns the byte offset of the brace closing an already opened one.
fn closing_brace(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses `name`, `name?`, `name:modifier` or `name:modifier?`.
fn placeholder(template: &str, body: &str) -> Result<Segment> {
    let (body, optional) = body
        .strip_suffix('?')
        .map_or((body, false), |b| (b, true));

    let (name, modifier) = match body.split_once(':') {
        Some((name, modifier)) => (name, Some(modifier)),
        None => (body, None),
    };

    if !is_valid_name(name) {
        return Err(invalid(template, &format!("bad placeholder name [{name}]")));
    }
    if modifier.is_some_and(str::is_empty) {
        return Err(invalid(template, &format!("empty modifier for [{name}]")));
    }

    Ok(Segment::Param {
        name: String::from(name),
        modifier: modifier.map(String::from),
        optional,
    })
}

/// Maps built-in class names to their regex. Anything else is a raw regex.
fn builtin_class(modifier: &str) -> &str {
    match modifier {
        "num" => "[0-9]+",
        "any" => DEFAULT_CLASS,
        "all" => ".*",
        other => other,
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn invalid(template: &str, reason: &str) -> RouterError {
    RouterError::InvalidPattern {
        pattern: String::from(template),
        reason: String::from(reason),
    }
}
