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

//! Module responsible for parsing and checking the configuration file.
//!
//! To provide meaningful error messages. The configuration file uses
//! [YAML](https://en.wikipedia.org/wiki/YAML) and `serde` to enforce
//! strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file.

use crate::{
    container::ContainerImage,
    errors::ConfigError,
    esmvaltool::{ClimateStatistics, DatasetChoice, RecipeBuilder, Region, VariableRequest},
    parameter_set::ParameterSet,
};
use chrono::{Datelike, NaiveDateTime};
use serde::Deserialize;
use serde_yaml::Mapping;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Dataset given either by name of a predefined
/// dataset or as a full dataset section.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(untagged)]
pub enum DatasetEntry {
    Name(String),
    Section(Mapping),
}

impl From<DatasetEntry> for DatasetChoice {
    fn from(entry: DatasetEntry) -> Self {
        match entry {
            DatasetEntry::Name(name) => DatasetChoice::Named(name),
            DatasetEntry::Section(section) => DatasetChoice::Mapping(section),
        }
    }
}

/// Shapefile used for the spatial selection.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Shape {
    pub path: PathBuf,

    /// _(Optional)_ Keep output of every shape in the file separate.
    ///
    /// Defaults to `false`.
    #[serde(default)]
    pub decomposed: bool,
}

/// Variable given either by its name only or with its options.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(untagged)]
pub enum VariableEntry {
    Name(String),
    Detailed {
        name: String,

        #[serde(default)]
        mip: Option<String>,

        #[serde(default)]
        units: Option<String>,

        #[serde(default)]
        stats: Option<ClimateStatistics>,
    },
}

impl From<&VariableEntry> for VariableRequest {
    fn from(entry: &VariableEntry) -> Self {
        match entry {
            VariableEntry::Name(name) => VariableRequest::new(name.as_str()),
            VariableEntry::Detailed {
                name,
                mip,
                units,
                stats,
            } => {
                let mut request = VariableRequest::new(name.as_str());
                if let Some(mip) = mip {
                    request = request.mip(mip.as_str());
                }
                if let Some(units) = units {
                    request = request.units(units.as_str());
                }
                if let Some(stats) = stats {
                    request = request.stats(*stats);
                }
                request
            }
        }
    }
}

/// Fields describing the forcing to generate.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Forcing {
    /// _(Optional)_ Title of the recipe.
    #[serde(default)]
    pub title: Option<String>,

    /// _(Optional)_ Description of the recipe, defaults to the title.
    #[serde(default)]
    pub description: Option<String>,

    /// _(Optional)_ Name of predefined dataset (`ERA5` or `ERA-Interim`)
    /// or a full ESMValTool dataset section.
    ///
    /// Defaults to `ERA5`.
    #[serde(default = "Forcing::default_dataset")]
    pub dataset: DatasetEntry,

    /// Start datetime of the forcing, e.g. `2000-01-01T00:00:00`.
    /// Only the year is used by the recipe.
    pub start_time: NaiveDateTime,

    /// End datetime of the forcing. Only the year is used by the recipe.
    pub end_time: NaiveDateTime,

    /// _(Optional)_ Bounding box of the forcing.
    /// Cannot be used together with `shape`.
    #[serde(default)]
    pub region: Option<Region>,

    /// _(Optional)_ Shapefile of the catchment.
    /// Cannot be used together with `region`.
    #[serde(default)]
    pub shape: Option<Shape>,

    /// _(Optional)_ Average the forcing over the selected area.
    ///
    /// Defaults to `false`.
    #[serde(default)]
    pub lumped: bool,

    /// List of variables to generate. Each entry is either a short name
    /// (e.g. `pr`) or a mapping with `name` and optional `mip`, `units`
    /// and `stats`.
    pub variables: Vec<VariableEntry>,

    /// _(Optional)_ Diagnostic script replacing the default copier.
    #[serde(default)]
    pub script: Option<String>,
}

impl Forcing {
    fn default_dataset() -> DatasetEntry {
        DatasetEntry::Name(crate::constants::DEFAULT_DATASET.to_string())
    }

    /// Checks if forcing settings follows conventions
    /// and limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.start_time > self.end_time {
            return Err(ConfigError::OutOfBounds(
                "Forcing start time is after end time",
            ));
        }

        if self.variables.is_empty() {
            return Err(ConfigError::OutOfBounds(
                "At least one forcing variable is required",
            ));
        }

        if let Some(region) = &self.region {
            region.check_bounds()?;
        }

        Ok(())
    }

    /// Recipe builder set up with this forcing settings.
    pub fn recipe_builder(&self) -> RecipeBuilder {
        let mut builder = RecipeBuilder::new()
            .dataset(self.dataset.clone())
            .start(self.start_time.year())
            .end(self.end_time.year())
            .add_variables(self.variables.iter());

        if let Some(title) = &self.title {
            builder = builder.title(title.as_str());
        }

        if let Some(description) = &self.description {
            builder = builder.description(description.as_str());
        }

        if let Some(region) = &self.region {
            builder = builder.region(
                region.start_longitude,
                region.end_longitude,
                region.start_latitude,
                region.end_latitude,
            );
        }

        if let Some(shape) = &self.shape {
            builder = builder.shape(&shape.path, shape.decomposed);
        }

        if self.lumped {
            builder = builder.lump();
        }

        if let Some(script) = &self.script {
            builder = builder.script(script.as_str());
        }

        builder
    }
}

/// _(Optional)_ Fields with information where
/// the recipe should be written.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Output {
    /// _(Optional)_ Directory of the recipe. Created when it does not exist.
    ///
    /// Defaults to `./output/`.
    #[serde(default = "Output::default_directory")]
    pub directory: PathBuf,

    /// _(Optional)_ File name of the recipe. Existing files
    /// are not overwritten.
    ///
    /// Defaults to `recipe_forcing.yml`.
    #[serde(default = "Output::default_recipe_file")]
    pub recipe_file: String,
}

impl Output {
    fn default_directory() -> PathBuf {
        PathBuf::from("./output/")
    }

    fn default_recipe_file() -> String {
        "recipe_forcing.yml".to_string()
    }

    pub fn recipe_path(&self) -> PathBuf {
        self.directory.join(&self.recipe_file)
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.recipe_file.is_empty() || self.recipe_file.contains('/') {
            return Err(ConfigError::OutOfBounds(
                "Recipe file must be a plain file name",
            ));
        }

        Ok(())
    }
}

impl Default for Output {
    fn default() -> Self {
        Output {
            directory: Output::default_directory(),
            recipe_file: Output::default_recipe_file(),
        }
    }
}

/// _(Optional)_ Fields with the model which will use the forcing.
/// Used to check if the model and its parameter set match.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Model {
    /// Name of the model, e.g. `wflow`.
    pub name: String,

    /// Docker reference or Apptainer file name of the
    /// image with the model, e.g. `ewatercycle/wflow-grpc4bmi:2020.1.1`.
    /// The image tag is the model version.
    pub bmi_image: ContainerImage,

    /// _(Optional)_ Parameter set used by the model.
    #[serde(default)]
    pub parameter_set: Option<ParameterSet>,
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Config {
    pub forcing: Forcing,

    #[serde(default)]
    pub output: Output,

    #[serde(default)]
    pub model: Option<Model>,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        let config: Config = serde_yaml::from_slice(data.as_slice())?;

        config.forcing.check_bounds()?;
        config.output.check_bounds()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, DatasetEntry, VariableEntry};
    use crate::errors::ConfigError;
    use std::{fs, path::PathBuf};

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    const FULL_CONFIG: &str = "\
forcing:
  title: Rhine lumped forcing
  start_time: 2000-01-01T00:00:00
  end_time: 2001-12-31T00:00:00
  shape:
    path: /data/Rhine/Rhine.shp
  lumped: true
  variables:
    - pr
    - name: tas
      units: degC
    - name: tasmax
      stats:
        operator: max
        period: month
output:
  directory: /data/forcing
model:
  name: wflow
  bmi_image: ewatercycle-wflow-grpc4bmi_2020.1.1.sif
  parameter_set:
    name: wflow_rhine_sbm_nc
    directory: /data/parameter-sets/wflow_rhine_sbm_nc
    config: wflow_sbm_NC.ini
    target_model: wflow
    supported_model_versions: [2020.1.1]
";

    #[test]
    fn reads_full_config() {
        let (_dir, path) = write_config(FULL_CONFIG);

        let config = Config::new_from_file(&path).unwrap();

        assert_eq!(config.forcing.dataset, DatasetEntry::Name("ERA5".to_string()));
        assert_eq!(config.forcing.variables.len(), 3);
        assert_eq!(
            config.forcing.variables[0],
            VariableEntry::Name("pr".to_string())
        );
        assert!(config.forcing.lumped);
        assert_eq!(config.output.directory, PathBuf::from("/data/forcing"));
        assert_eq!(config.output.recipe_file, "recipe_forcing.yml");

        let model = config.model.unwrap();
        assert_eq!(model.bmi_image.docker_url(), "ewatercycle/wflow-grpc4bmi:2020.1.1");
        assert!(model
            .parameter_set
            .unwrap()
            .supported_model_versions
            .contains("2020.1.1"));
    }

    #[test]
    fn builds_recipe_from_config() {
        let (_dir, path) = write_config(FULL_CONFIG);
        let config = Config::new_from_file(&path).unwrap();

        let recipe = config.forcing.recipe_builder().build().unwrap();

        assert_eq!(recipe.documentation.description, "Rhine lumped forcing");

        let preprocessors = recipe.preprocessors.unwrap();
        assert_eq!(
            preprocessors.keys().collect::<Vec<_>>(),
            vec!["spatial", "pr", "tas", "tasmax"]
        );
        assert_eq!(preprocessors.get("tasmax").unwrap().len(), 3);

        let diagnostics = recipe.diagnostics.unwrap();
        let variables = diagnostics
            .get("diagnostic")
            .unwrap()
            .variables
            .as_ref()
            .unwrap();
        assert_eq!(variables.get("pr").unwrap().start_year, Some(2000));
        assert_eq!(variables.get("pr").unwrap().end_year, Some(2001));
    }

    #[test]
    fn dataset_section_in_config() {
        let (_dir, path) = write_config(
            "\
forcing:
  dataset:
    dataset: EC-Earth3
    project: CMIP6
    exp: historical
  start_time: 2000-01-01T00:00:00
  end_time: 2001-01-01T00:00:00
  variables: [pr]
",
        );

        let config = Config::new_from_file(&path).unwrap();
        let recipe = config.forcing.recipe_builder().build().unwrap();

        assert_eq!(recipe.datasets.unwrap()[0].dataset, "EC-Earth3");
        assert!(config.model.is_none());
    }

    #[test]
    fn inverted_time_range() {
        let (_dir, path) = write_config(
            "\
forcing:
  start_time: 2002-01-01T00:00:00
  end_time: 2001-01-01T00:00:00
  variables: [pr]
",
        );

        assert!(matches!(
            Config::new_from_file(&path),
            Err(ConfigError::OutOfBounds(_))
        ));
    }

    #[test]
    fn invalid_image() {
        let (_dir, path) = write_config(
            "\
forcing:
  start_time: 2000-01-01T00:00:00
  end_time: 2001-01-01T00:00:00
  variables: [pr]
model:
  name: hype
  bmi_image: not:url///nor::sif
",
        );

        assert!(matches!(
            Config::new_from_file(&path),
            Err(ConfigError::CantDeserialize(_))
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Config::new_from_file(&PathBuf::from("/nonexistent/config.yaml")),
            Err(ConfigError::CantOpenFile(_))
        ));
    }
}
