//! `{key}` substitution for display strings.
//!
//! Applied once, before the first frame. Unknown keys are left as-is so a typo shows up on
//! screen instead of silently disappearing.

use anyhow::Result;
use log::warn;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

use crate::models::config::InstallerConfig;

#[derive(Debug, Clone)]
pub struct Substitutions {
    values: BTreeMap<String, String>,
    pattern: Regex,
}

impl Substitutions {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| {
            anyhow::anyhow!("Internal error: failed to compile placeholder regex: {}", e)
        })?;
        Ok(Self {
            values: BTreeMap::new(),
            pattern,
        })
    }

    /// Table for the product described by `config`, shown to `user`.
    pub fn for_product(config: &InstallerConfig, user: &str) -> Result<Self> {
        let mut s = Self::new()?;
        s.insert("name", &config.program_name);
        s.insert("user", user);
        s.insert("version", &config.version);
        s.insert("developer", &config.developer);
        s.insert("maintainer", &config.maintainer);
        s.insert("email", &config.email);
        s.insert("description", &config.description);
        Ok(s)
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures<'_>| match self.values.get(&caps[1]) {
                Some(v) => v.clone(),
                None => {
                    warn!(
                        "[PHASE: initialization] [STEP: placeholders] unknown placeholder {{{}}}",
                        &caps[1]
                    );
                    caps[0].to_string()
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_known_keys() {
        let mut s = Substitutions::new().unwrap();
        s.insert("name", "IP-Geo");
        s.insert("version", "1.42");
        assert_eq!(
            s.apply("Welcome to {name} {version}!"),
            "Welcome to IP-Geo 1.42!"
        );
    }

    #[test]
    fn leaves_unknown_keys_and_plain_braces() {
        let mut s = Substitutions::new().unwrap();
        s.insert("name", "X");
        assert_eq!(s.apply("{name} {nope} {} {1x}"), "X {nope} {} {1x}");
    }

    #[test]
    fn values_are_not_rescanned() {
        let mut s = Substitutions::new().unwrap();
        s.insert("a", "{b}");
        s.insert("b", "wrong");
        assert_eq!(s.apply("{a}"), "{b}");
    }

    #[test]
    fn product_table_covers_all_keys() {
        let cfg = InstallerConfig::default();
        let s = Substitutions::for_product(&cfg, "Derek").unwrap();
        for key in ["name", "user", "version", "developer", "maintainer", "email"] {
            assert!(s.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(s.apply("Install for me only ({user})"), "Install for me only (Derek)");
    }
}
