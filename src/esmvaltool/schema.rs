/*
Copyright 2021 Jakub Lewandowski

This file is part of eWaterCycle Core (EWC).

eWaterCycle Core (EWC) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

eWaterCycle Core (EWC) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with eWaterCycle Core (EWC). If not, see https://www.gnu.org/licenses/.
*/

//! Module with the sections of an ESMValTool recipe.
//!
//! The structures and their fields follow the
//! [ESMValCore recipe schema](https://github.com/ESMValGroup/ESMValCore/blob/main/esmvalcore/_recipe/recipe_schema.yml)
//! and are serialized in the order of declaration. Optional fields
//! which are not set are left out of the YAML document.
//!
//! ESMValTool runs preprocessor operations in the order they are written,
//! so all named sections are kept in insertion order.

use crate::errors::{RecipeError, ValidationError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{fs, path::Path};

/// Operations of one preprocessor step, keyed by operation name.
pub type PreprocessorStep = Mapping;

/// Named recipe sections, kept in insertion order.
///
/// Inserting an existing key replaces its value in place.
pub type OrderedMap<V> = IndexMap<String, V>;

/// Recipe fields which accept a single value or a list of values.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// ESMValTool dataset section.
///
/// Keys not known to this structure are passed through
/// to ESMValTool without validation.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub dataset: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensemble: Option<OneOrMany>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<OneOrMany>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,

    /// Data availability tier, must be `1`, `2` or `3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<u8>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub dataset_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<String>,

    #[serde(flatten)]
    pub extra: Mapping,
}

impl Dataset {
    pub fn new(dataset: impl Into<String>) -> Self {
        Dataset {
            dataset: dataset.into(),
            ..Dataset::default()
        }
    }

    /// Checks fields whose values are restricted by ESMValTool.
    pub fn check_bounds(&self) -> Result<(), ValidationError> {
        match self.tier {
            Some(tier) if !(1..=3).contains(&tier) => Err(ValidationError::InvalidTier {
                dataset: self.dataset.clone(),
                tier,
            }),
            _ => Ok(()),
        }
    }
}

/// ESMValTool variable section.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Variable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensemble: Option<OneOrMany>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timerange: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<OneOrMany>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_dataset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_dataset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx_files: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_datasets: Option<Vec<Dataset>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
}

/// ESMValTool script section, arguments besides
/// the script path are passed to the script as they are.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Script {
    pub script: String,

    #[serde(flatten)]
    pub args: Mapping,
}

impl Script {
    pub fn new(script: impl Into<String>) -> Self {
        Script {
            script: script.into(),
            args: Mapping::new(),
        }
    }
}

impl From<&str> for Script {
    fn from(script: &str) -> Self {
        Script::new(script)
    }
}

impl From<String> for Script {
    fn from(script: String) -> Self {
        Script::new(script)
    }
}

/// ESMValTool diagnostic section.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<OrderedMap<Script>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_datasets: Option<Vec<Dataset>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub themes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realms: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<OrderedMap<Variable>>,
}

/// ESMValTool documentation section.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Documentation {
    pub title: String,

    pub description: String,

    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
}

/// ESMValTool recipe.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Recipe {
    pub documentation: Documentation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasets: Option<Vec<Dataset>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessors: Option<OrderedMap<PreprocessorStep>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<OrderedMap<Diagnostic>>,
}

impl Recipe {
    /// Reads the recipe from YAML file.
    pub fn load(path: &Path) -> Result<Recipe, RecipeError> {
        let data = fs::read(path)?;
        let recipe = serde_yaml::from_slice(data.as_slice())?;

        Ok(recipe)
    }

    pub fn from_yaml(recipe: &str) -> Result<Recipe, RecipeError> {
        Ok(serde_yaml::from_str(recipe)?)
    }

    pub fn to_yaml(&self) -> Result<String, RecipeError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Writes the recipe to YAML file, replacing its content.
    pub fn save(&self, path: &Path) -> Result<(), RecipeError> {
        fs::write(path, self.to_yaml()?)?;

        Ok(())
    }
}

/// Statistical operators of ESMValTool preprocessors.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticOperator {
    Mean,
    Std,
    Min,
    Max,
    Median,
    Sum,
}

impl StatisticOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticOperator::Mean => "mean",
            StatisticOperator::Std => "std",
            StatisticOperator::Min => "min",
            StatisticOperator::Max => "max",
            StatisticOperator::Median => "median",
            StatisticOperator::Sum => "sum",
        }
    }
}

impl Default for StatisticOperator {
    fn default() -> Self {
        StatisticOperator::Mean
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticPeriod {
    Hour,
    Day,
    Month,
    Year,
}

impl StatisticPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticPeriod::Hour => "hour",
            StatisticPeriod::Day => "day",
            StatisticPeriod::Month => "month",
            StatisticPeriod::Year => "year",
        }
    }
}

impl Default for StatisticPeriod {
    fn default() -> Self {
        StatisticPeriod::Day
    }
}

/// Arguments of the `climate_statistics` preprocessor.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct ClimateStatistics {
    #[serde(default)]
    pub operator: StatisticOperator,

    #[serde(default)]
    pub period: StatisticPeriod,
}

impl ClimateStatistics {
    pub fn arguments(&self) -> Mapping {
        let mut arguments = Mapping::new();
        arguments.insert(Value::from("operator"), Value::from(self.operator.as_str()));
        arguments.insert(Value::from("period"), Value::from(self.period.as_str()));
        arguments
    }
}

#[cfg(test)]
mod tests {
    use super::{ClimateStatistics, Dataset, Documentation, OneOrMany, OrderedMap, Recipe};
    use crate::errors::ValidationError;
    use serde_yaml::Value;
    use std::fs;

    fn documented_recipe() -> Recipe {
        Recipe {
            documentation: Documentation {
                title: "Test recipe".to_string(),
                description: "Test recipe".to_string(),
                authors: vec!["Test author".to_string()],
                projects: Some(vec!["Test project".to_string()]),
                references: Some(vec!["Test reference".to_string()]),
            },
            datasets: None,
            preprocessors: None,
            diagnostics: None,
        }
    }

    #[test]
    fn recipe_load() {
        let dir = tempfile::tempdir().unwrap();
        let recipe_path = dir.path().join("recipe.yml");
        fs::write(
            &recipe_path,
            "\
documentation:
    title: Test recipe
    description: Test recipe
    authors:
        - Test author
    projects:
        - Test project
    references:
        - Test reference
",
        )
        .unwrap();

        let recipe = Recipe::load(&recipe_path).unwrap();

        assert_eq!(recipe, documented_recipe());
    }

    #[test]
    fn recipe_save_leaves_out_unset_sections() {
        let dir = tempfile::tempdir().unwrap();
        let recipe_path = dir.path().join("recipe.yml");

        documented_recipe().save(&recipe_path).unwrap();

        let content = fs::read_to_string(&recipe_path).unwrap();
        assert!(content.contains("title: Test recipe"));
        assert!(!content.contains("datasets"));
        assert!(!content.contains("preprocessors"));
        assert!(!content.contains("diagnostics"));

        assert_eq!(Recipe::load(&recipe_path).unwrap(), documented_recipe());
    }

    #[test]
    fn named_sections_keep_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("tasmax".to_string(), 1);
        map.insert("pr".to_string(), 2);
        map.insert("tas".to_string(), 3);
        assert_eq!(map.insert("pr".to_string(), 4), Some(2));

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["tasmax", "pr", "tas"]);
        assert_eq!(map.get("pr"), Some(&4));

        let yaml = serde_yaml::to_string(&map).unwrap();
        assert!(yaml.find("tasmax").unwrap() < yaml.find("pr").unwrap());

        let parsed: OrderedMap<i32> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            parsed.keys().collect::<Vec<_>>(),
            map.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn preprocessor_operations_keep_order() {
        let recipe = Recipe::from_yaml(
            "\
documentation:
  title: t
  description: d
  authors: [a]
preprocessors:
  tas:
    extract_region:
      start_longitude: 40
    convert_units:
      units: degC
    area_statistics:
      operator: mean
",
        )
        .unwrap();

        let step = recipe.preprocessors.unwrap();
        let operations: Vec<_> = step
            .get("tas")
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            operations,
            vec!["extract_region", "convert_units", "area_statistics"]
        );
    }

    #[test]
    fn dataset_passes_unknown_keys_through() {
        let dataset: Dataset = serde_yaml::from_str(
            "\
dataset: EC-Earth3
project: CMIP6
ensemble: r6i1p1f1
exp: [historical, ssp585]
grid: gr
version: 1
institute: EC-Earth-Consortium
",
        )
        .unwrap();

        assert_eq!(dataset.ensemble, Some(OneOrMany::One("r6i1p1f1".to_string())));
        assert_eq!(
            dataset.exp,
            Some(OneOrMany::Many(vec![
                "historical".to_string(),
                "ssp585".to_string()
            ]))
        );
        assert_eq!(dataset.extra.len(), 2);
        assert_eq!(
            dataset.extra.get(&Value::from("institute")),
            Some(&Value::from("EC-Earth-Consortium"))
        );

        let yaml = serde_yaml::to_string(&dataset).unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("institute: EC-Earth-Consortium"));
    }

    #[test]
    fn dataset_tier_is_checked() {
        let mut dataset = Dataset::new("ERA5");
        dataset.tier = Some(3);
        assert!(dataset.check_bounds().is_ok());

        dataset.tier = Some(4);
        assert_eq!(
            dataset.check_bounds(),
            Err(ValidationError::InvalidTier {
                dataset: "ERA5".to_string(),
                tier: 4
            })
        );
    }

    #[test]
    fn climate_statistics_defaults() {
        let stats: ClimateStatistics = serde_yaml::from_str("period: month").unwrap();
        let arguments = stats.arguments();

        assert_eq!(arguments.get(&Value::from("operator")), Some(&Value::from("mean")));
        assert_eq!(arguments.get(&Value::from("period")), Some(&Value::from("month")));
    }
}
