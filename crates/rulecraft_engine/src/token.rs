//! Token replacement in text.
//!
//! A token is a data selector in square brackets: `Hello [node:uid:entity:name:value]!`.
//! The root of every token must name a bound variable. Tokens that cannot
//! be resolved are removed (or kept verbatim, see
//! [`EngineConfig::clear_unresolved_tokens`]) and reported as warnings.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use rulecraft_foundation::{Result, Value};
use rulecraft_storage::EntityLoader;
use tracing::warn;

use crate::config::EngineConfig;
use crate::context::ExecutionState;
use crate::plugin::{DataProcessor, ProcessEnv};
use crate::selector::DataSelector;

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\s\[\]:]+):([^\[\]]+)\]").expect("token regex is valid")
});

/// A token that could not be replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenWarning {
    /// The token as written, including brackets.
    pub token: String,
    /// Why it could not be resolved.
    pub reason: String,
}

impl fmt::Display for TokenWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unresolved token {}: {}", self.token, self.reason)
    }
}

/// The result of replacing tokens in a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    /// The text with tokens replaced.
    pub text: String,
    /// Tokens that could not be replaced.
    pub warnings: Vec<TokenWarning>,
}

/// Replaces tokens in text using the variables of an execution.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenProcessor;

impl TokenProcessor {
    /// Lists the selectors of all tokens in a template, in order.
    #[must_use]
    pub fn scan(template: &str) -> Vec<&str> {
        TOKEN_REGEX
            .find_iter(template)
            .map(|m| {
                let token = m.as_str();
                &token[1..token.len() - 1]
            })
            .collect()
    }

    /// Replaces every token in `template`.
    ///
    /// Replacement is a pure function of the template and the state: nothing
    /// is written, and text without tokens comes back unchanged.
    #[must_use]
    pub fn replace(
        template: &str,
        state: &ExecutionState,
        loader: &dyn EntityLoader,
        config: &EngineConfig,
    ) -> Substitution {
        let mut warnings = Vec::new();
        let text = TOKEN_REGEX.replace_all(template, |caps: &Captures<'_>| {
            let token = &caps[0];
            match resolve_token(&token[1..token.len() - 1], state, loader, config) {
                Ok(value) => render(&value),
                Err(err) => {
                    warn!(token, error = %err, "unresolved token");
                    warnings.push(TokenWarning {
                        token: token.to_string(),
                        reason: err.to_string(),
                    });
                    if config.clear_unresolved_tokens {
                        String::new()
                    } else {
                        token.to_string()
                    }
                }
            }
        });

        Substitution {
            text: text.into_owned(),
            warnings,
        }
    }
}

fn resolve_token(
    selector: &str,
    state: &ExecutionState,
    loader: &dyn EntityLoader,
    config: &EngineConfig,
) -> Result<Value> {
    let selector = DataSelector::parse(selector)?;
    state.resolve(&selector, loader, config)
}

/// Renders a resolved value as token text.
///
/// Lists render their first item, field items their main property, and
/// entities their `type:id` label.
#[must_use]
pub fn render(value: &Value) -> String {
    match value {
        Value::Nil => String::new(),
        Value::List(items) => items.first().map(render).unwrap_or_default(),
        Value::Map(_) => value.main_property().map(render).unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Data processor replacing tokens in string values (`rules_tokens`).
#[derive(Clone, Copy, Debug, Default)]
pub struct TokensProcessor;

impl TokensProcessor {
    /// Processor id.
    pub const ID: &'static str = "rules_tokens";
}

impl DataProcessor for TokensProcessor {
    fn id(&self) -> &str {
        Self::ID
    }

    fn process(
        &self,
        value: Value,
        _settings: &BTreeMap<String, Value>,
        env: &mut ProcessEnv<'_>,
    ) -> Result<Value> {
        let Some(template) = value.as_str() else {
            return Ok(value);
        };
        let substitution = TokenProcessor::replace(template, env.state, env.loader, env.config);
        env.warnings.extend(substitution.warnings);
        Ok(Value::from(substitution.text))
    }
}
