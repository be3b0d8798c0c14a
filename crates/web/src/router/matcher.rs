//! Route template compilation and matching.
//!
//! A template such as `/users/{id}/posts/{post}` is compiled into an anchored regex
//! `^/users/([A-Za-z0-9]+)/posts/([A-Za-z0-9]+)/?$`:
//!
//! - every `{name}` placeholder matches one alphanumeric path segment
//! - literal text is escaped, route authors cannot inject regex syntax
//! - one trailing slash is optional, nothing else may follow

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::handler::RequestHandler;
use crate::interceptor::Interceptor;
use crate::{PathParams, RouterError};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder regex is valid"));
static PLACEHOLDER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("placeholder name regex is valid"));

const SEGMENT_CAPTURE: &str = "([A-Za-z0-9]+)";

/// A compiled route template bound to its handler and route-level interceptors.
///
/// Matchers are created while routes are registered and are immutable once the
/// [`Router`](crate::Router) is built.
pub struct PathMatcher {
    template: String,
    regex: Regex,
    param_names: Vec<String>,
    handler: Arc<dyn RequestHandler>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl PathMatcher {
    /// Compiles `template` and binds it to `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidTemplate`] for malformed placeholders (bad or repeated
    /// names, unbalanced braces).
    pub fn new(template: impl Into<String>, handler: Arc<dyn RequestHandler>) -> Result<Self, RouterError> {
        let template = template.into();
        let (regex, param_names) = compile(&template)?;
        Ok(Self { template, regex, param_names, handler, interceptors: vec![] })
    }

    /// Whether `path` matches this template.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Extracts placeholder values, in template order.
    ///
    /// The caller is expected to have checked [`matches`](Self::matches); a path that does
    /// not match yields empty params.
    pub fn extract_parameters(&self, path: &str) -> PathParams {
        let mut params = PathParams::empty();
        let Some(captures) = self.regex.captures(path) else {
            return params;
        };

        for (name, value) in self.param_names.iter().zip(captures.iter().skip(1)) {
            if let Some(value) = value {
                params.push(name.clone(), value.as_str().to_string());
            }
        }
        params
    }

    /// Attaches a route-level interceptor, it runs after every interceptor attached before.
    pub fn intercept<I: Interceptor + 'static>(&mut self, interceptor: I) -> &mut Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub(crate) fn push_interceptors<T>(&mut self, interceptors: T)
    where
        T: IntoIterator<Item = Arc<dyn Interceptor>>,
    {
        self.interceptors.extend(interceptors);
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// The compiled pattern source.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn handler(&self) -> &Arc<dyn RequestHandler> {
        &self.handler
    }

    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathMatcher")
            .field("template", &self.template)
            .field("pattern", &self.regex.as_str())
            .field("param_names", &self.param_names)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

fn compile(template: &str) -> Result<(Regex, Vec<String>), RouterError> {
    let trimmed = template.strip_suffix('/').unwrap_or(template);

    let mut pattern = String::with_capacity(trimmed.len() + 16);
    let mut param_names: Vec<String> = Vec::new();
    let mut last = 0;

    pattern.push('^');
    for captures in PLACEHOLDER.captures_iter(trimmed) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let name = name.as_str();

        push_literal(&mut pattern, template, &trimmed[last..whole.start()])?;

        if !PLACEHOLDER_NAME.is_match(name) {
            return Err(RouterError::invalid_template(template, format!("invalid placeholder name '{name}'")));
        }
        if param_names.iter().any(|existing| existing == name) {
            return Err(RouterError::invalid_template(template, format!("duplicate placeholder '{name}'")));
        }

        pattern.push_str(SEGMENT_CAPTURE);
        param_names.push(name.to_string());
        last = whole.end();
    }
    push_literal(&mut pattern, template, &trimmed[last..])?;
    pattern.push_str("/?$");

    let regex = Regex::new(&pattern).map_err(|e| RouterError::invalid_template(template, e))?;
    Ok((regex, param_names))
}

fn push_literal(pattern: &mut String, template: &str, literal: &str) -> Result<(), RouterError> {
    if literal.contains(['{', '}']) {
        return Err(RouterError::invalid_template(template, "unbalanced braces"));
    }
    pattern.push_str(&regex::escape(literal));
    Ok(())
}
