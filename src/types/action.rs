//! The closed set of actions the gateway performs on a client's behalf.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::GatewayError;

/// A request kind accepted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Chat,
    AnalyzeFood,
    CalculateNutrition,
    GenerateMealPlan,
    GenerateRecipes,
    GenerateShoppingList,
    GenerateClinicalSummary,
}

impl Action {
    /// Every supported action, in wire-name order of the public API docs.
    pub const ALL: [Action; 7] = [
        Action::Chat,
        Action::AnalyzeFood,
        Action::CalculateNutrition,
        Action::GenerateMealPlan,
        Action::GenerateRecipes,
        Action::GenerateShoppingList,
        Action::GenerateClinicalSummary,
    ];

    /// Wire name used in inbound requests and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Chat => "chat",
            Action::AnalyzeFood => "analyze-food",
            Action::CalculateNutrition => "calculate-nutrition",
            Action::GenerateMealPlan => "generate-meal-plan",
            Action::GenerateRecipes => "generate-recipes",
            Action::GenerateShoppingList => "generate-shopping-list",
            Action::GenerateClinicalSummary => "generate-clinical-summary",
        }
    }

    /// Whether the model is asked for structured JSON output.
    pub fn is_structured(&self) -> bool {
        !matches!(self, Action::Chat)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| GatewayError::Validation(format!("unknown action '{s}'")))
    }
}
