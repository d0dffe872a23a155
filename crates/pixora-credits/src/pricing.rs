// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit prices for paid actions.

use pixora_config::model::CreditsConfig;

/// Price class of an image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Schnell,
    Dev,
    /// A user-trained LoRA model.
    Custom,
}

impl ModelTier {
    /// Classify a provider model reference such as `black-forest-labs/flux-schnell`.
    pub fn of(model: &str) -> Self {
        let name = model.rsplit('/').next().unwrap_or(model).to_ascii_lowercase();
        if name.starts_with("flux-schnell") {
            Self::Schnell
        } else if name.starts_with("flux-dev") {
            Self::Dev
        } else {
            Self::Custom
        }
    }
}

/// Credit prices, taken from `[credits]`.
#[derive(Debug, Clone)]
pub struct Pricing {
    training_cost: i64,
    schnell_per_image: i64,
    dev_per_image: i64,
    custom_per_image: i64,
}

impl Pricing {
    pub fn from_config(config: &CreditsConfig) -> Self {
        Self {
            training_cost: config.training_cost,
            schnell_per_image: config.schnell_per_image,
            dev_per_image: config.dev_per_image,
            custom_per_image: config.custom_per_image,
        }
    }

    pub fn training_cost(&self) -> i64 {
        self.training_cost
    }

    pub fn per_image(&self, model: &str) -> i64 {
        match ModelTier::of(model) {
            ModelTier::Schnell => self.schnell_per_image,
            ModelTier::Dev => self.dev_per_image,
            ModelTier::Custom => self.custom_per_image,
        }
    }

    /// Total charge for `num_outputs` images, saturating instead of overflowing.
    pub fn generation_cost(&self, model: &str, num_outputs: u32) -> i64 {
        self.per_image(model).saturating_mul(i64::from(num_outputs))
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self::from_config(&CreditsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_from_model_reference() {
        assert_eq!(ModelTier::of("black-forest-labs/flux-schnell"), ModelTier::Schnell);
        assert_eq!(ModelTier::of("black-forest-labs/flux-dev"), ModelTier::Dev);
        assert_eq!(
            ModelTier::of("pixora/u1_1700000000000_cats:abcd1234"),
            ModelTier::Custom
        );
    }

    #[test]
    fn default_prices() {
        let pricing = Pricing::default();
        assert_eq!(pricing.training_cost(), 640);
        assert_eq!(pricing.generation_cost("black-forest-labs/flux-schnell", 4), 8);
        assert_eq!(pricing.generation_cost("black-forest-labs/flux-dev", 2), 20);
        assert_eq!(pricing.generation_cost("pixora/custom:v1", 1), 10);
    }
}
