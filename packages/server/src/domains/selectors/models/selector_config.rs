//! Selector sets used by the extraction engine.
//!
//! `SelectorConfig` is the complete, validated shape that is persisted and
//! evaluated. `PartialSelectors` is the shape of every override tier before
//! merging: all five fields optional.

use schemars::JsonSchema;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_JOB_CONTAINER: &str =
    ".job, .job-listing, .job-posting, .posting, .opening, [data-job-id], li.job";
pub const DEFAULT_TITLE: &str = "h2, h3, .job-title, .title, [data-job-title]";
pub const DEFAULT_LINK: &str = "a[href]";
pub const DEFAULT_LOCATION: &str = ".location, .job-location, [data-location]";
pub const DEFAULT_DESCRIPTION: &str = ".description, .summary, .job-description, p";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorField {
    JobContainer,
    Title,
    Link,
    Location,
    Description,
}

impl SelectorField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorField::JobContainer => "jobContainer",
            SelectorField::Title => "title",
            SelectorField::Link => "link",
            SelectorField::Location => "location",
            SelectorField::Description => "description",
        }
    }
}

impl fmt::Display for SelectorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorValidationError {
    #[error("{0} is required")]
    Missing(SelectorField),
    #[error("{field} is not a valid CSS selector: {reason}")]
    InvalidCss { field: SelectorField, reason: String },
    #[error("selector payload is malformed: {0}")]
    Malformed(String),
}

/// Complete selector set. `job_container`, `title` and `link` are always
/// non-blank; every present locator parses as CSS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectorConfig {
    /// Locator matching one element per job posting
    pub job_container: String,
    /// Locator for the title, evaluated inside each container
    pub title: String,
    /// Locator for the posting link, evaluated inside each container
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One override tier. Blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartialSelectors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Trimmed value, or None when blank.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_css(field: SelectorField, locator: &str) -> Result<(), SelectorValidationError> {
    Selector::parse(locator)
        .map(|_| ())
        .map_err(|e| SelectorValidationError::InvalidCss {
            field,
            reason: e.to_string(),
        })
}

impl SelectorConfig {
    /// Built-in selector set covering common careers-page markup.
    pub fn builtin_default() -> Self {
        Self {
            job_container: DEFAULT_JOB_CONTAINER.to_string(),
            title: DEFAULT_TITLE.to_string(),
            link: DEFAULT_LINK.to_string(),
            location: Some(DEFAULT_LOCATION.to_string()),
            description: Some(DEFAULT_DESCRIPTION.to_string()),
        }
    }

    /// Decode an untyped JSON payload (request body, model response, cached
    /// value) into a validated config.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SelectorValidationError> {
        Self::try_from(PartialSelectors::from_value(value)?)
    }

    /// Checks required fields and CSS syntax of every present locator.
    pub fn validate(&self) -> Result<(), SelectorValidationError> {
        for (field, value) in [
            (SelectorField::JobContainer, &self.job_container),
            (SelectorField::Title, &self.title),
            (SelectorField::Link, &self.link),
        ] {
            if value.trim().is_empty() {
                return Err(SelectorValidationError::Missing(field));
            }
        }
        for (field, locator) in self.locators() {
            check_css(field, locator)?;
        }
        Ok(())
    }

    /// Present locators in field order.
    pub fn locators(&self) -> Vec<(SelectorField, &str)> {
        let mut out = vec![
            (SelectorField::JobContainer, self.job_container.as_str()),
            (SelectorField::Title, self.title.as_str()),
            (SelectorField::Link, self.link.as_str()),
        ];
        if let Some(location) = present(self.location.as_deref()) {
            out.push((SelectorField::Location, location));
        }
        if let Some(description) = present(self.description.as_deref()) {
            out.push((SelectorField::Description, description));
        }
        out
    }

    /// JSON Schema handed to the inference collaborator.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(SelectorConfig);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }
}

impl TryFrom<PartialSelectors> for SelectorConfig {
    type Error = SelectorValidationError;

    fn try_from(partial: PartialSelectors) -> Result<Self, Self::Error> {
        let required = |field: SelectorField, value: Option<&str>| {
            present(value)
                .map(str::to_string)
                .ok_or(SelectorValidationError::Missing(field))
        };

        let config = Self {
            job_container: required(
                SelectorField::JobContainer,
                partial.job_container.as_deref(),
            )?,
            title: required(SelectorField::Title, partial.title.as_deref())?,
            link: required(SelectorField::Link, partial.link.as_deref())?,
            location: present(partial.location.as_deref()).map(str::to_string),
            description: present(partial.description.as_deref()).map(str::to_string),
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<SelectorConfig> for PartialSelectors {
    fn from(config: SelectorConfig) -> Self {
        Self {
            job_container: Some(config.job_container),
            title: Some(config.title),
            link: Some(config.link),
            location: config.location,
            description: config.description,
        }
    }
}

impl PartialSelectors {
    /// Decode one override tier. Only a JSON object is accepted; serde would
    /// otherwise read an array as positional fields.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SelectorValidationError> {
        if !value.is_object() {
            return Err(SelectorValidationError::Malformed(
                "expected a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| SelectorValidationError::Malformed(e.to_string()))
    }

    /// True when no field carries a non-blank value.
    pub fn is_empty(&self) -> bool {
        [
            &self.job_container,
            &self.title,
            &self.link,
            &self.location,
            &self.description,
        ]
        .iter()
        .all(|v| present(v.as_deref()).is_none())
    }

    /// Every present locator must parse as CSS. Missing fields are fine.
    pub fn validate(&self) -> Result<(), SelectorValidationError> {
        for (field, value) in [
            (SelectorField::JobContainer, &self.job_container),
            (SelectorField::Title, &self.title),
            (SelectorField::Link, &self.link),
            (SelectorField::Location, &self.location),
            (SelectorField::Description, &self.description),
        ] {
            if let Some(locator) = present(value.as_deref()) {
                check_css(field, locator)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_default_is_valid() {
        SelectorConfig::builtin_default().validate().unwrap();
    }

    #[test]
    fn decodes_camel_case_and_trims() {
        let config = SelectorConfig::from_value(json!({
            "jobContainer": " .role ",
            "title": "h4",
            "link": "a.apply",
            "location": "   "
        }))
        .unwrap();

        assert_eq!(config.job_container, ".role");
        assert_eq!(config.location, None);
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({"jobContainer": ".role", "title": "h4", "link": "a.apply"})
        );
    }

    #[test]
    fn rejects_missing_required_field() {
        let err = SelectorConfig::from_value(json!({"jobContainer": ".role", "title": "h4"}))
            .unwrap_err();
        assert_eq!(err, SelectorValidationError::Missing(SelectorField::Link));
    }

    #[test]
    fn rejects_unparseable_css() {
        let err = SelectorConfig::from_value(json!({
            "jobContainer": "div[[",
            "title": "h4",
            "link": "a"
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            SelectorValidationError::InvalidCss {
                field: SelectorField::JobContainer,
                ..
            }
        ));
    }

    #[test]
    fn rejects_non_object_payload() {
        let err = SelectorConfig::from_value(json!(["h2"])).unwrap_err();
        assert!(matches!(err, SelectorValidationError::Malformed(_)));

        // a complete positional array must not slip through either
        let err = SelectorConfig::from_value(json!(["li.job", "h3", "a"])).unwrap_err();
        assert!(matches!(err, SelectorValidationError::Malformed(_)));

        for value in [json!(["h3"]), json!("h3"), json!(null)] {
            assert!(matches!(
                PartialSelectors::from_value(value),
                Err(SelectorValidationError::Malformed(_))
            ));
        }
    }

    #[test]
    fn partial_blank_fields_are_empty() {
        let partial = PartialSelectors {
            title: Some("  ".into()),
            ..Default::default()
        };
        assert!(partial.is_empty());
        assert!(partial.validate().is_ok());
    }

    #[test]
    fn schema_names_required_fields() {
        let schema = SelectorConfig::json_schema();
        let required = schema["required"].as_array().unwrap();
        for field in ["jobContainer", "title", "link"] {
            assert!(required.contains(&json!(field)));
        }
    }
}
