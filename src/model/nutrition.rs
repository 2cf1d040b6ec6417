//! Nutrition records
//!
//! The shape returned by the photo classifier and embedded in food events.
//! Field names follow the wire's camelCase. Every field is optional: the
//! classifier's core set is usually present, but manually logged food events
//! often carry only a subset.

use serde::{Deserialize, Serialize};

/// Nutrient breakdown for a food item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturated_fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trans_fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monounsaturated_fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyunsaturated_fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbohydrate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugars: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_sugars: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_fiber: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cholesterol: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potassium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calcium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iron: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_d: Option<f64>,
}

impl NutritionFacts {
    /// Total carbohydrate load, preferring the explicit field
    pub fn carbs(&self) -> Option<f64> {
        self.carbohydrate.or(self.sugars).or(self.sugar)
    }
}
