//! Sampling parameters sent with every upstream request.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Settings controlling generation on the upstream service.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct SamplingSettings {
    #[builder(default = 0.7)]
    pub temperature: f64,
    #[builder(default = 2048)]
    pub max_tokens: u32,
    #[builder(default)]
    pub tool_choice: ToolChoice,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// How the upstream service may select tools.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    None,
    Required,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_chat_service_profile() {
        let settings = SamplingSettings::default();
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.max_tokens, 2048);
        assert_eq!(settings.tool_choice, ToolChoice::Auto);
    }

    #[test]
    fn builder_overrides_single_fields() {
        let settings = SamplingSettings::builder().max_tokens(256).build();
        assert_eq!(settings.max_tokens, 256);
        assert_eq!(settings.temperature, 0.7);
    }
}
