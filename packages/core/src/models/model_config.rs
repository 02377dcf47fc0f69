//! Model Configuration Types
//!
//! A `ModelConfiguration` names one fully-specified, loadable embedding model
//! variant: which preset, which weight format, and the embedding dimension the
//! dependent index must be built for.
//!
//! Preset metadata (dimension, language coverage) comes from a fixed registry
//! compiled into the binary. The compute context and the orchestrator both
//! read it, so the two sides always agree on what a preset id means.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Preset used when no preference has been stored yet
pub const DEFAULT_MODEL_PRESET: ModelPreset = ModelPreset::MultilingualE5Small;

/// Weight format used when no preference has been stored yet
pub const DEFAULT_MODEL_VERSION: ModelVersion = ModelVersion::Quantized;

/// Supported embedding model presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelPreset {
    #[serde(rename = "multilingual-e5-small")]
    MultilingualE5Small,
    #[serde(rename = "multilingual-e5-base")]
    MultilingualE5Base,
    #[serde(rename = "bge-small-en-v1.5")]
    BgeSmallEnV15,
    #[serde(rename = "all-minilm-l6-v2")]
    AllMiniLmL6V2,
    #[serde(rename = "e5-small-v2")]
    E5SmallV2,
}

/// Static metadata for a preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub preset: ModelPreset,
    pub dimension: u32,
    pub multilingual: bool,
}

const ALL_PRESETS: [ModelPreset; 5] = [
    ModelPreset::MultilingualE5Small,
    ModelPreset::MultilingualE5Base,
    ModelPreset::BgeSmallEnV15,
    ModelPreset::AllMiniLmL6V2,
    ModelPreset::E5SmallV2,
];

impl ModelPreset {
    /// Wire identifier, e.g. `"multilingual-e5-small"`
    pub const fn id(&self) -> &'static str {
        match self {
            Self::MultilingualE5Small => "multilingual-e5-small",
            Self::MultilingualE5Base => "multilingual-e5-base",
            Self::BgeSmallEnV15 => "bge-small-en-v1.5",
            Self::AllMiniLmL6V2 => "all-minilm-l6-v2",
            Self::E5SmallV2 => "e5-small-v2",
        }
    }

    /// Registry entry for this preset
    pub const fn info(&self) -> ModelInfo {
        let (dimension, multilingual) = match self {
            Self::MultilingualE5Small => (384, true),
            Self::MultilingualE5Base => (768, true),
            Self::BgeSmallEnV15 => (384, false),
            Self::AllMiniLmL6V2 => (384, false),
            Self::E5SmallV2 => (384, false),
        };
        ModelInfo {
            preset: *self,
            dimension,
            multilingual,
        }
    }

    /// Embedding dimension produced by this preset
    pub const fn dimension(&self) -> u32 {
        self.info().dimension
    }

    /// Look up a preset by its wire identifier (case-insensitive)
    pub fn from_id(id: &str) -> Option<Self> {
        ALL_PRESETS
            .into_iter()
            .find(|preset| preset.id().eq_ignore_ascii_case(id.trim()))
    }

    /// Every preset in the registry
    pub fn all() -> impl Iterator<Item = ModelPreset> {
        ALL_PRESETS.into_iter()
    }
}

impl fmt::Display for ModelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| format!("Unknown model preset: {}", s))
    }
}

/// Weight format of a preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVersion {
    Full,
    #[default]
    Quantized,
    Compressed,
}

impl ModelVersion {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Quantized => "quantized",
            Self::Compressed => "compressed",
        }
    }

    /// ONNX weight file holding this variant
    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::Full => "model.onnx",
            Self::Quantized => "model_quantized.onnx",
            Self::Compressed => "model_compressed.onnx",
        }
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "quantized" => Ok(Self::Quantized),
            "compressed" => Ok(Self::Compressed),
            other => Err(format!("Unknown model version: {}", other)),
        }
    }
}

/// One fully-specified, loadable model variant
///
/// Immutable value: switching models replaces the configuration, it never
/// mutates one in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfiguration {
    pub preset: ModelPreset,
    pub version: ModelVersion,
    pub dimension: u32,
}

impl ModelConfiguration {
    pub fn new(preset: ModelPreset, version: ModelVersion, dimension: u32) -> Self {
        Self {
            preset,
            version,
            dimension,
        }
    }

    /// Build a configuration whose dimension comes from the preset registry
    pub fn for_preset(preset: ModelPreset, version: ModelVersion) -> Self {
        Self::new(preset, version, preset.dimension())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.dimension == 0 {
            return Err("modelDimension must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for ModelConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}d)", self.preset, self.version, self.dimension)
    }
}

/// The user's chosen preset and version, read at startup to pick defaults
///
/// Dimension is deliberately absent: it is derived from the preset registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedModelPreference {
    pub preset: ModelPreset,
    pub version: ModelVersion,
}

impl Default for SelectedModelPreference {
    fn default() -> Self {
        Self {
            preset: DEFAULT_MODEL_PRESET,
            version: DEFAULT_MODEL_VERSION,
        }
    }
}

impl SelectedModelPreference {
    pub fn to_configuration(self) -> ModelConfiguration {
        ModelConfiguration::for_preset(self.preset, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_dimensions() {
        assert_eq!(ModelPreset::MultilingualE5Small.dimension(), 384);
        assert_eq!(ModelPreset::MultilingualE5Base.dimension(), 768);
        assert_eq!(ModelPreset::all().count(), 5);
    }

    #[test]
    fn test_preset_ids_match_serde_names() {
        for preset in ModelPreset::all() {
            let json = serde_json::to_value(preset).unwrap();
            assert_eq!(json, preset.id());
            assert_eq!(ModelPreset::from_id(preset.id()), Some(preset));
        }
    }

    #[test]
    fn test_preset_from_id_is_case_insensitive() {
        assert_eq!(
            ModelPreset::from_id("BGE-Small-EN-v1.5"),
            Some(ModelPreset::BgeSmallEnV15)
        );
        assert_eq!(ModelPreset::from_id("gpt-embed"), None);
        assert!("gpt-embed".parse::<ModelPreset>().is_err());
    }

    #[test]
    fn test_version_parsing_and_files() {
        assert_eq!("FULL".parse::<ModelVersion>(), Ok(ModelVersion::Full));
        assert!("int4".parse::<ModelVersion>().is_err());
        assert_eq!(ModelVersion::default(), ModelVersion::Quantized);
        assert_eq!(ModelVersion::Quantized.file_name(), "model_quantized.onnx");
    }

    #[test]
    fn test_default_preference_resolves_dimension() {
        let config = SelectedModelPreference::default().to_configuration();
        assert_eq!(config.preset, ModelPreset::MultilingualE5Small);
        assert_eq!(config.version, ModelVersion::Quantized);
        assert_eq!(config.dimension, 384);
    }

    #[test]
    fn test_configuration_validation() {
        let mut config = ModelConfiguration::for_preset(ModelPreset::E5SmallV2, ModelVersion::Full);
        assert!(config.validate().is_ok());

        config.dimension = 0;
        assert!(config.validate().is_err());
    }
}
