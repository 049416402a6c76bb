//! Hand-maintained rewrite tables used by the Standardizer.
//!
//! Rules live in a small YAML document so they can be edited without
//! rebuilding. Any key left out of the file falls back to the built-in
//! table. Each table is an ordered list of `(predicate, replacement)` pairs;
//! the first matching rule wins and unmatched values are left untouched.
//!
//! ```yaml
//! null_tokens: ['NULL']
//! date_formats: ["%m/%d/%Y", "%Y-%m-%d"]
//! location:
//!   - kind: starts_with
//!     pattern: malm
//!     replacement: Malmo
//!     case_insensitive: true
//! ```

use std::{
    borrow::Cow,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    StartsWith,
    EndsWith,
    Contains,
    Equals,
    Regex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub kind: MatchKind,
    pub pattern: String,
    pub replacement: String,
    #[serde(default)]
    pub case_insensitive: bool,
}

impl PatternRule {
    fn new(kind: MatchKind, pattern: &str, replacement: &str, case_insensitive: bool) -> Self {
        Self {
            kind,
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            case_insensitive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningRules {
    pub null_tokens: Vec<String>,
    pub date_formats: Vec<String>,
    pub industry: Vec<PatternRule>,
    pub location: Vec<PatternRule>,
    pub country: Vec<PatternRule>,
}

impl Default for CleaningRules {
    fn default() -> Self {
        use MatchKind::*;
        Self {
            null_tokens: vec!["NULL".to_string()],
            date_formats: vec!["%m/%d/%Y".to_string(), "%Y-%m-%d".to_string()],
            industry: vec![PatternRule::new(StartsWith, "crypto", "Crypto", true)],
            location: vec![
                PatternRule::new(StartsWith, "Florian", "Florianopolis", true),
                PatternRule::new(EndsWith, "sseldorf", "Dusseldorf", true),
                PatternRule::new(StartsWith, "malm", "Malmo", true),
            ],
            country: vec![PatternRule::new(
                StartsWith,
                "United States",
                "United States",
                false,
            )],
        }
    }
}

impl CleaningRules {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening rules file {path:?}"))?;
        let rules: CleaningRules =
            serde_yaml::from_reader(BufReader::new(file)).context("Parsing rules YAML")?;
        rules.compile().with_context(|| format!("Validating rules in {path:?}"))?;
        Ok(rules)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing rules to YAML")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut file =
            File::create(path).with_context(|| format!("Creating rules file {path:?}"))?;
        file.write_all(self.to_yaml_string()?.as_bytes())
            .with_context(|| format!("Writing rules file {path:?}"))
    }

    pub fn compile(&self) -> Result<CompiledRules, PipelineError> {
        Ok(CompiledRules {
            industry: RuleTable::compile("industry", &self.industry)?,
            location: RuleTable::compile("location", &self.location)?,
            country: RuleTable::compile("country", &self.country)?,
        })
    }
}

#[derive(Debug)]
enum Matcher {
    Literal {
        kind: MatchKind,
        needle: String,
        case_insensitive: bool,
    },
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Pattern(regex) => regex.is_match(value),
            Matcher::Literal {
                kind,
                needle,
                case_insensitive,
            } => {
                let haystack = if *case_insensitive {
                    Cow::Owned(value.to_lowercase())
                } else {
                    Cow::Borrowed(value)
                };
                match kind {
                    MatchKind::StartsWith => haystack.starts_with(needle.as_str()),
                    MatchKind::EndsWith => haystack.ends_with(needle.as_str()),
                    MatchKind::Contains => haystack.contains(needle.as_str()),
                    MatchKind::Equals => haystack == needle.as_str(),
                    MatchKind::Regex => false,
                }
            }
        }
    }
}

#[derive(Debug)]
struct CompiledRule {
    matcher: Matcher,
    replacement: String,
}

/// An ordered rule list ready to apply; first match wins.
#[derive(Debug)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
}

impl RuleTable {
    pub fn compile(table: &'static str, rules: &[PatternRule]) -> Result<Self, PipelineError> {
        let rules = rules
            .iter()
            .map(|rule| {
                if rule.pattern.is_empty() {
                    return Err(PipelineError::InvalidRule {
                        table,
                        pattern: rule.pattern.clone(),
                        reason: "pattern cannot be empty".to_string(),
                    });
                }
                let matcher = match rule.kind {
                    MatchKind::Regex => Matcher::Pattern(
                        RegexBuilder::new(&rule.pattern)
                            .case_insensitive(rule.case_insensitive)
                            .build()
                            .map_err(|err| PipelineError::InvalidRule {
                                table,
                                pattern: rule.pattern.clone(),
                                reason: err.to_string(),
                            })?,
                    ),
                    kind => Matcher::Literal {
                        kind,
                        needle: if rule.case_insensitive {
                            rule.pattern.to_lowercase()
                        } else {
                            rule.pattern.clone()
                        },
                        case_insensitive: rule.case_insensitive,
                    },
                };
                Ok(CompiledRule {
                    matcher,
                    replacement: rule.replacement.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Returns the replacement for `value`, or `None` when no rule matches or
    /// the value already equals the replacement.
    pub fn rewrite(&self, value: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(value))
            .map(|rule| rule.replacement.as_str())
            .filter(|replacement| *replacement != value)
    }
}

#[derive(Debug)]
pub struct CompiledRules {
    pub industry: RuleTable,
    pub location: RuleTable,
    pub country: RuleTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> CompiledRules {
        CleaningRules::default().compile().expect("default rules compile")
    }

    #[test]
    fn default_location_rules_cover_known_spellings() {
        let rules = defaults();
        assert_eq!(rules.location.rewrite("FlorianÃ³polis"), Some("Florianopolis"));
        assert_eq!(rules.location.rewrite("DÃ¼sseldorf"), Some("Dusseldorf"));
        assert_eq!(rules.location.rewrite("Malmoe"), Some("Malmo"));
        assert_eq!(rules.location.rewrite("MALMÖ"), Some("Malmo"));
        assert_eq!(rules.location.rewrite("Malmo"), None);
        assert_eq!(rules.location.rewrite("São Paulo"), None);
    }

    #[test]
    fn industry_and_country_defaults() {
        let rules = defaults();
        assert_eq!(rules.industry.rewrite("cryptocurrency"), Some("Crypto"));
        assert_eq!(rules.industry.rewrite("Crypto Currency"), Some("Crypto"));
        assert_eq!(rules.industry.rewrite("Fintech"), None);
        assert_eq!(
            rules.country.rewrite("United States of America"),
            Some("United States")
        );
        assert_eq!(rules.country.rewrite("United States."), Some("United States"));
        assert_eq!(rules.country.rewrite("united states"), None);
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![
            PatternRule::new(MatchKind::Contains, "berg", "Heidelberg", false),
            PatternRule::new(MatchKind::EndsWith, "berg", "Nuremberg", false),
        ];
        let table = RuleTable::compile("location", &rules).unwrap();
        assert_eq!(table.rewrite("Nurnberg"), Some("Heidelberg"));
    }

    #[test]
    fn regex_rules_compile_and_reject_bad_patterns() {
        let good = vec![PatternRule::new(MatchKind::Regex, r"^new york", "New York City", true)];
        let table = RuleTable::compile("location", &good).unwrap();
        assert_eq!(table.rewrite("NEW YORK, NY"), Some("New York City"));

        let bad = vec![PatternRule::new(MatchKind::Regex, "(", "x", false)];
        let err = RuleTable::compile("location", &bad).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRule { table: "location", .. }));
    }

    #[test]
    fn yaml_round_trip_fills_missing_keys_with_defaults() {
        let yaml = "null_tokens: ['NULL', 'N/A']\n";
        let rules: CleaningRules = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules.null_tokens, vec!["NULL", "N/A"]);
        assert_eq!(rules.location, CleaningRules::default().location);

        let dumped = CleaningRules::default().to_yaml_string().unwrap();
        assert!(dumped.contains("starts_with"));
        let parsed: CleaningRules = serde_yaml::from_str(&dumped).unwrap();
        assert_eq!(parsed, CleaningRules::default());
    }
}
