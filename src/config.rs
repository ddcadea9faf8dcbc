//! Field configuration as packages declare it, and its normalization into what a session
//! needs. Deprecated spellings are migrated here, with a warning, so nothing past this
//! module ever sees them.

use crate::getter::{CustomGetter, DataGetter, DataMode};
use crate::AipError;
use anyhow::Context;
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::warn;

fn default_true() -> bool {
    true
}

/// One autocompletable field, as written in a package configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// Which inputs of the sheet this applies to.
    pub selector: String,
    #[serde(default = "default_true")]
    pub show_button: bool,
    #[serde(default = "default_true")]
    pub allow_hotkey: bool,
    pub data_mode: String,
    #[serde(default)]
    pub inline_prefix: Option<String>,
    /// Old name of `inline_prefix`.
    #[serde(default)]
    pub custom_inline_prefix: Option<String>,
    #[serde(default)]
    pub filtered_keys: Vec<String>,
    #[serde(default)]
    pub default_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetClassConfig {
    pub name: String,
    #[serde(default)]
    pub field_configs: Vec<FieldConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageConfig {
    pub package_name: String,
    #[serde(default)]
    pub sheet_classes: Vec<SheetClassConfig>,
}

/// The session-constant part of a popup's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub exclusion_filters: Vec<String>,
    pub key_prefix_override: Option<String>,
    pub data_mode: DataMode,
}

impl SessionConfig {
    pub fn key_prefix(&self) -> &str {
        self.key_prefix_override
            .as_deref()
            .unwrap_or_else(|| self.data_mode.default_key_prefix())
    }
}

/// A field configuration after validation and migration.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub selector: String,
    pub show_button: bool,
    pub allow_hotkey: bool,
    pub getter: DataGetter,
    pub default_path: String,
    pub session: SessionConfig,
}

impl ResolvedField {
    pub fn with_custom_getter(mut self, getter: CustomGetter) -> Self {
        self.getter = DataGetter::new(self.getter.mode(), Some(getter));
        self
    }
}

impl FieldConfig {
    /// Validates the data mode and folds deprecated fields into their replacements.
    pub fn normalize(&self) -> Result<ResolvedField, AipError> {
        if DataMode::is_deprecated_alias(&self.data_mode) {
            warn!(
                selector = %self.selector,
                "data mode \"{}\" is deprecated in favor of \"{}\"",
                self.data_mode,
                DataMode::Document
            );
        }
        let data_mode: DataMode = self.data_mode.parse()?;

        if self.custom_inline_prefix.is_some() {
            warn!(
                selector = %self.selector,
                "customInlinePrefix is deprecated in favor of inlinePrefix"
            );
        }
        let key_prefix_override = self
            .inline_prefix
            .clone()
            .or_else(|| self.custom_inline_prefix.clone());

        Ok(ResolvedField {
            selector: self.selector.clone(),
            show_button: self.show_button,
            allow_hotkey: self.allow_hotkey,
            getter: DataGetter::Mode(data_mode),
            default_path: self.default_path.clone().unwrap_or_default(),
            session: SessionConfig {
                exclusion_filters: self.filtered_keys.clone(),
                key_prefix_override,
                data_mode,
            },
        })
    }
}

pub fn parse_package_configs(text: &str) -> Result<Vec<PackageConfig>, AipError> {
    json5::from_str(text).map_err(|e| AipError::Parse(e.to_string()))
}

pub fn load_package_configs(path: &Path) -> anyhow::Result<Vec<PackageConfig>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
    Ok(parse_package_configs(&text).with_context(|| format!("parsing {path:?}"))?)
}

/// The two persisted toggles. Storage belongs to the host; this is only their shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub show_button: bool,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_button: true,
            debug: false,
        }
    }
}

impl Settings {
    pub fn parse_json5(text: &str) -> Result<Self, AipError> {
        json5::from_str(text).map_err(|e| AipError::Parse(e.to_string()))
    }

    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
        Ok(Self::parse_json5(&text).with_context(|| format!("parsing {path:?}"))?)
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldConfig, Settings, parse_package_configs};
    use crate::AipError;
    use crate::getter::DataMode;
    use pretty_assertions::assert_eq;

    fn field(json5: &str) -> FieldConfig {
        json5::from_str(json5).unwrap()
    }

    #[test]
    fn defaults_apply_to_missing_fields() {
        let f = field("{ selector: 'input.formula', dataMode: 'roll' }");
        assert!(f.show_button);
        assert!(f.allow_hotkey);
        assert!(f.filtered_keys.is_empty());

        let resolved = f.normalize().unwrap();
        assert_eq!(resolved.session.data_mode, DataMode::Roll);
        assert_eq!(resolved.session.key_prefix(), "@");
        assert_eq!(resolved.default_path, "");
    }

    #[test]
    fn inline_prefix_overrides_mode_default() {
        let f = field("{ selector: 's', dataMode: 'roll', inlinePrefix: '' }");
        assert_eq!(f.normalize().unwrap().session.key_prefix(), "");

        let f = field("{ selector: 's', dataMode: 'document', inlinePrefix: '$' }");
        assert_eq!(f.normalize().unwrap().session.key_prefix(), "$");
    }

    #[test]
    fn deprecated_names_are_migrated() {
        let f = field("{ selector: 's', dataMode: 'entity', customInlinePrefix: '#' }");
        let resolved = f.normalize().unwrap();
        assert_eq!(resolved.session.data_mode, DataMode::Document);
        assert_eq!(resolved.session.key_prefix_override.as_deref(), Some("#"));

        let f = field(
            "{ selector: 's', dataMode: 'document', customInlinePrefix: '#', inlinePrefix: '%' }",
        );
        assert_eq!(f.normalize().unwrap().session.key_prefix(), "%");
    }

    #[test]
    fn unknown_data_mode_is_rejected() {
        let f = field("{ selector: 's', dataMode: 'sheet' }");
        assert_eq!(
            f.normalize().unwrap_err(),
            AipError::InvalidDataMode("sheet".to_string())
        );
    }

    #[test]
    fn package_configs_parse_nested_fields() {
        let packages = parse_package_configs(
            "[{ packageName: 'demo', sheetClasses: [
                { name: 'ItemSheet', fieldConfigs: [
                    { selector: 'input[name=\"formula\"]', dataMode: 'owning-actor-roll',
                      filteredKeys: ['flags'], defaultPath: 'abilities' },
                ] },
            ] }]",
        )
        .unwrap();
        assert_eq!(packages.len(), 1);
        let sheet = &packages[0].sheet_classes[0];
        assert_eq!(sheet.name, "ItemSheet");
        let resolved = sheet.field_configs[0].normalize().unwrap();
        assert_eq!(resolved.session.exclusion_filters, vec!["flags".to_string()]);
        assert_eq!(resolved.default_path, "abilities");
    }

    #[test]
    fn malformed_package_config_is_a_parse_error() {
        assert!(matches!(
            parse_package_configs("[{ sheetClasses: [] }]"),
            Err(AipError::Parse(_))
        ));
    }

    #[test]
    fn settings_default_and_parse() {
        assert_eq!(
            Settings::default(),
            Settings {
                show_button: true,
                debug: false
            }
        );
        let s = Settings::parse_json5("{ debug: true }").unwrap();
        assert!(s.show_button);
        assert!(s.debug);
    }
}
