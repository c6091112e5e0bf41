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

//! Module with the builder of ESMValTool recipes generating forcing data.
//!
//! The builder only stores what it is told. All checks are done
//! in [`RecipeBuilder::build()`], which stops at the first problem
//! in the following order: dataset, spatial selection, time range,
//! variables. A recipe is returned only when all of them are valid.
//!
//! Years set with `start`/`end` apply to variables added afterwards.
//! Variables added before that get years 0 to 10000.
//!
//! Every variable gets its own preprocessor step named after the variable.
//! The step starts with the operations of the spatial selection, followed by
//! unit conversion, climate statistics and any extra operations requested
//! for that variable.
//!
//! ```ignore
//! let recipe = RecipeBuilder::new()
//!     .title("Generic distributed forcing recipe")
//!     .dataset("ERA5")
//!     .start(2000)
//!     .end(2001)
//!     .shape("shapefile.shp", false)
//!     .add_variable("pr")
//!     .build()?;
//! ```

use super::{
    datasets::predefined_dataset,
    schema::{
        ClimateStatistics, Dataset, Diagnostic, Documentation, OrderedMap, PreprocessorStep,
        Recipe, Script, Variable,
    },
};
use crate::constants::{
    DEFAULT_DIAGNOSTIC_SCRIPT, DEFAULT_END_YEAR, DEFAULT_START_YEAR, DIAGNOSTIC_NAME,
    RECIPE_AUTHORS, RECIPE_PROJECTS, SCRIPT_NAME, SPATIAL_PREPROCESSOR_NAME,
};
use crate::errors::ValidationError;
use log::debug;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Dataset requested for the recipe, resolved when the recipe is built.
#[derive(Clone, PartialEq, Debug)]
pub enum DatasetChoice {
    Dataset(Dataset),

    /// Name of one of the predefined datasets.
    Named(String),

    /// Raw dataset section, coerced into a [`Dataset`].
    Mapping(Mapping),
}

impl DatasetChoice {
    fn resolve(self) -> Result<Dataset, ValidationError> {
        let dataset = match self {
            DatasetChoice::Dataset(dataset) => dataset,
            DatasetChoice::Named(name) => {
                predefined_dataset(&name).ok_or(ValidationError::UnknownDataset(name))?
            }
            DatasetChoice::Mapping(mapping) => serde_yaml::from_value(Value::Mapping(mapping))
                .map_err(|err| ValidationError::InvalidDataset(err.to_string()))?,
        };

        dataset.check_bounds()?;

        Ok(dataset)
    }
}

impl From<Dataset> for DatasetChoice {
    fn from(dataset: Dataset) -> Self {
        DatasetChoice::Dataset(dataset)
    }
}

impl From<&str> for DatasetChoice {
    fn from(name: &str) -> Self {
        DatasetChoice::Named(name.to_string())
    }
}

impl From<String> for DatasetChoice {
    fn from(name: String) -> Self {
        DatasetChoice::Named(name)
    }
}

impl From<Mapping> for DatasetChoice {
    fn from(mapping: Mapping) -> Self {
        DatasetChoice::Mapping(mapping)
    }
}

/// Bounding box (in degrees) selected with the `extract_region` preprocessor.
#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
pub struct Region {
    pub start_longitude: f64,
    pub end_longitude: f64,
    pub start_latitude: f64,
    pub end_latitude: f64,
}

impl Region {
    pub fn new(
        start_longitude: f64,
        end_longitude: f64,
        start_latitude: f64,
        end_latitude: f64,
    ) -> Self {
        Region {
            start_longitude,
            end_longitude,
            start_latitude,
            end_latitude,
        }
    }

    /// Checks if region follows conventions and limits.
    ///
    /// Start longitude may be larger than end longitude
    /// for regions crossing the antimeridian.
    pub fn check_bounds(&self) -> Result<(), ValidationError> {
        let all = [
            self.start_longitude,
            self.end_longitude,
            self.start_latitude,
            self.end_latitude,
        ];

        if !all.iter().all(|v| v.is_finite()) {
            return Err(ValidationError::InvalidRegion("one of extents is not finite"));
        }

        if !(-90.0..=90.0).contains(&self.start_latitude)
            || !(-90.0..=90.0).contains(&self.end_latitude)
        {
            return Err(ValidationError::InvalidRegion("latitude out of bounds"));
        }

        if !(-360.0..=360.0).contains(&self.start_longitude)
            || !(-360.0..=360.0).contains(&self.end_longitude)
        {
            return Err(ValidationError::InvalidRegion("longitude out of bounds"));
        }

        if self.start_latitude > self.end_latitude {
            return Err(ValidationError::InvalidRegion(
                "start latitude is north of end latitude",
            ));
        }

        Ok(())
    }

    /// Snaps the extents onto a grid with `step` spacing and pads
    /// them outwards by `offset`, rounded to `ndigits` decimals.
    /// Halves are rounded to even.
    ///
    /// Used to align a region with the cell edges of the dataset grid.
    pub fn fit_to_grid(&self, step: f64, offset: f64, ndigits: i32) -> Region {
        let precision = 10f64.powi(ndigits);
        let fit = |value: f64, offset: f64| {
            (((value / step).round_ties_even() * step + offset) * precision).round_ties_even()
                / precision
        };

        Region {
            start_longitude: fit(self.start_longitude, -offset),
            end_longitude: fit(self.end_longitude, offset),
            start_latitude: fit(self.start_latitude, -offset),
            end_latitude: fit(self.end_latitude, offset),
        }
    }

    fn arguments(&self) -> Mapping {
        let mut arguments = Mapping::new();
        arguments.insert(Value::from("start_longitude"), Value::from(self.start_longitude));
        arguments.insert(Value::from("end_longitude"), Value::from(self.end_longitude));
        arguments.insert(Value::from("start_latitude"), Value::from(self.start_latitude));
        arguments.insert(Value::from("end_latitude"), Value::from(self.end_latitude));
        arguments
    }
}

/// Shapefile selected with the `extract_shape` preprocessor.
#[derive(Clone, PartialEq, Debug)]
struct Shape {
    path: PathBuf,
    decomposed: bool,
}

impl Shape {
    fn arguments(&self) -> Mapping {
        let mut arguments = Mapping::new();
        arguments.insert(
            Value::from("shapefile"),
            Value::from(self.path.display().to_string()),
        );
        arguments.insert(Value::from("crop"), Value::from(true));
        arguments.insert(Value::from("decomposed"), Value::from(self.decomposed));
        arguments
    }
}

/// Output variable requested from the recipe, with
/// the operations of its own preprocessor step.
#[derive(Clone, PartialEq, Debug)]
pub struct VariableRequest {
    name: String,
    mip: Option<String>,
    units: Option<String>,
    stats: Option<ClimateStatistics>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    short_name: Option<String>,
    operations: Vec<(String, Value)>,
}

impl VariableRequest {
    pub fn new(name: impl Into<String>) -> Self {
        VariableRequest {
            name: name.into(),
            mip: None,
            units: None,
            stats: None,
            start_year: None,
            end_year: None,
            short_name: None,
            operations: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mip(mut self, mip: impl Into<String>) -> Self {
        self.mip = Some(mip.into());
        self
    }

    /// Converts the variable to `units` after the spatial selection.
    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn stats(mut self, stats: ClimateStatistics) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Overrides the years set on the builder for this variable only.
    pub fn years(mut self, start_year: i32, end_year: i32) -> Self {
        self.start_year = Some(start_year);
        self.end_year = Some(end_year);
        self
    }

    /// Name of the variable in the dataset, when it differs
    /// from the name used in the recipe.
    pub fn short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    /// Appends a preprocessor operation, run after all operations added before.
    ///
    /// Each operation can appear once in the step, so reusing the name of
    /// an operation already in the step (including `convert_units`,
    /// `climate_statistics` and those of the spatial selection) fails the build.
    pub fn operation(mut self, name: impl Into<String>, arguments: impl Into<Value>) -> Self {
        self.operations.push((name.into(), arguments.into()));
        self
    }
}

impl From<&str> for VariableRequest {
    fn from(name: &str) -> Self {
        VariableRequest::new(name)
    }
}

impl From<String> for VariableRequest {
    fn from(name: String) -> Self {
        VariableRequest::new(name)
    }
}

/// Builder of ESMValTool recipes tailored to generate forcings.
#[derive(Clone, PartialEq, Debug)]
pub struct RecipeBuilder {
    title: Option<String>,
    description: Option<String>,
    dataset: Option<DatasetChoice>,
    start_year: i32,
    end_year: i32,
    region: Option<Region>,
    shape: Option<Shape>,
    lumped: bool,
    variables: Vec<VariableRequest>,
    script: Option<Script>,
}

impl Default for RecipeBuilder {
    fn default() -> Self {
        RecipeBuilder {
            title: None,
            description: None,
            dataset: None,
            start_year: DEFAULT_START_YEAR,
            end_year: DEFAULT_END_YEAR,
            region: None,
            shape: None,
            lumped: false,
            variables: vec![],
            script: None,
        }
    }
}

impl RecipeBuilder {
    pub fn new() -> Self {
        RecipeBuilder::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Defaults to the title when not set.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the dataset of the recipe, replacing the previous one.
    pub fn dataset(mut self, dataset: impl Into<DatasetChoice>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Start year of variables added afterwards.
    pub fn start(mut self, year: i32) -> Self {
        self.start_year = year;
        self
    }

    /// End year of variables added afterwards.
    pub fn end(mut self, year: i32) -> Self {
        self.end_year = year;
        self
    }

    pub fn region(
        mut self,
        start_longitude: f64,
        end_longitude: f64,
        start_latitude: f64,
        end_latitude: f64,
    ) -> Self {
        self.region = Some(Region::new(
            start_longitude,
            end_longitude,
            start_latitude,
            end_latitude,
        ));
        self
    }

    /// Selects the area within a shapefile. With `decomposed` the output
    /// is kept separate for every shape (sub-basin) in the file.
    pub fn shape(mut self, path: impl AsRef<Path>, decomposed: bool) -> Self {
        self.shape = Some(Shape {
            path: path.as_ref().to_path_buf(),
            decomposed,
        });
        self
    }

    /// Averages the selected area into a single value per time step.
    pub fn lump(mut self) -> Self {
        self.lumped = true;
        self
    }

    /// Adds an output variable covering the years set so far, unless the
    /// variable has its own. Adding a variable with the same name again
    /// replaces it but keeps its position.
    pub fn add_variable(mut self, variable: impl Into<VariableRequest>) -> Self {
        let mut variable = variable.into();
        variable.start_year.get_or_insert(self.start_year);
        variable.end_year.get_or_insert(self.end_year);

        match self.variables.iter().position(|v| v.name == variable.name) {
            Some(index) => self.variables[index] = variable,
            None => self.variables.push(variable),
        }
        self
    }

    pub fn add_variables<I, V>(self, variables: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<VariableRequest>,
    {
        variables
            .into_iter()
            .fold(self, |builder, variable| builder.add_variable(variable))
    }

    /// Replaces the default diagnostic script, which copies
    /// the preprocessed files to the output directory.
    pub fn script(mut self, script: impl Into<Script>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Checks the collected settings and assembles the recipe.
    pub fn build(self) -> Result<Recipe, ValidationError> {
        let dataset = match self.dataset {
            Some(choice) => choice.resolve()?,
            None => return Err(ValidationError::MissingDataset),
        };

        let spatial = spatial_step(self.region.as_ref(), self.shape.as_ref(), self.lumped)?;

        let ranges = self
            .variables
            .iter()
            .map(|v| (v.start_year, v.end_year))
            .chain([(Some(self.start_year), Some(self.end_year))]);

        for range in ranges {
            if let (Some(start), Some(end)) = range {
                if start > end {
                    return Err(ValidationError::InvertedTimeRange { start, end });
                }
            }
        }

        if self.variables.is_empty() {
            return Err(ValidationError::NoVariables);
        }

        let mut preprocessors = OrderedMap::new();
        if !spatial.is_empty() {
            preprocessors.insert(SPATIAL_PREPROCESSOR_NAME.to_string(), spatial.clone());
        }

        let mut variables = OrderedMap::new();

        for request in self.variables {
            if request.name == SPATIAL_PREPROCESSOR_NAME {
                return Err(ValidationError::ReservedVariableName(request.name));
            }

            let start_year = request.start_year.unwrap_or(self.start_year);
            let end_year = request.end_year.unwrap_or(self.end_year);

            let mut step = spatial.clone();

            if let Some(units) = &request.units {
                let mut arguments = Mapping::new();
                arguments.insert(Value::from("units"), Value::from(units.as_str()));
                step.insert(Value::from("convert_units"), Value::Mapping(arguments));
            }

            if let Some(stats) = &request.stats {
                step.insert(
                    Value::from("climate_statistics"),
                    Value::Mapping(stats.arguments()),
                );
            }

            for (operation, arguments) in request.operations {
                let key = Value::from(operation.as_str());
                if step.contains_key(&key) {
                    return Err(ValidationError::DuplicateOperation {
                        variable: request.name,
                        operation,
                    });
                }
                step.insert(key, arguments);
            }

            debug!(
                "Preprocessor of {} has {} operations",
                request.name,
                step.len()
            );

            preprocessors.insert(request.name.clone(), step);
            variables.insert(
                request.name.clone(),
                Variable {
                    start_year: Some(start_year),
                    end_year: Some(end_year),
                    mip: request.mip,
                    preprocessor: Some(request.name),
                    short_name: request.short_name,
                    ..Variable::default()
                },
            );
        }

        let mut scripts = OrderedMap::new();
        scripts.insert(
            SCRIPT_NAME.to_string(),
            self.script
                .unwrap_or_else(|| Script::new(DEFAULT_DIAGNOSTIC_SCRIPT)),
        );

        let mut diagnostics = OrderedMap::new();
        diagnostics.insert(
            DIAGNOSTIC_NAME.to_string(),
            Diagnostic {
                scripts: Some(scripts),
                variables: Some(variables),
                ..Diagnostic::default()
            },
        );

        let title = self.title.unwrap_or_default();
        let description = self.description.unwrap_or_else(|| title.clone());

        debug!("Built recipe '{}' for dataset {}", title, dataset.dataset);

        Ok(Recipe {
            documentation: Documentation {
                title,
                description,
                authors: RECIPE_AUTHORS.iter().map(|a| a.to_string()).collect(),
                projects: Some(RECIPE_PROJECTS.iter().map(|p| p.to_string()).collect()),
                references: None,
            },
            datasets: Some(vec![dataset]),
            preprocessors: Some(preprocessors),
            diagnostics: Some(diagnostics),
        })
    }
}

/// Operations of the spatial selection, shared by all variables.
fn spatial_step(
    region: Option<&Region>,
    shape: Option<&Shape>,
    lumped: bool,
) -> Result<PreprocessorStep, ValidationError> {
    let mut step = Mapping::new();

    match (region, shape) {
        (Some(_), Some(_)) => return Err(ValidationError::ConflictingSpatialSelection),
        (Some(region), None) => {
            region.check_bounds()?;
            step.insert(
                Value::from("extract_region"),
                Value::Mapping(region.arguments()),
            );
        }
        (None, Some(shape)) => {
            if lumped && shape.decomposed {
                return Err(ValidationError::DecomposedLump);
            }
            step.insert(Value::from("extract_shape"), Value::Mapping(shape.arguments()));
        }
        (None, None) => {}
    }

    if lumped {
        let mut arguments = Mapping::new();
        arguments.insert(Value::from("operator"), Value::from("mean"));
        step.insert(Value::from("area_statistics"), Value::Mapping(arguments));
    }

    Ok(step)
}

/// Recipe generating gridded forcing within a shapefile.
pub fn build_generic_distributed_forcing_recipe(
    start_year: i32,
    end_year: i32,
    shape: &Path,
    dataset: impl Into<DatasetChoice>,
    variables: &[&str],
) -> Result<Recipe, ValidationError> {
    RecipeBuilder::new()
        .title("Generic distributed forcing recipe")
        .description("Generic distributed forcing recipe")
        .dataset(dataset)
        .start(start_year)
        .end(end_year)
        .shape(shape, false)
        .add_variables(variables.iter().copied())
        .build()
}

/// Recipe generating forcing averaged over a shapefile.
pub fn build_generic_lumped_forcing_recipe(
    start_year: i32,
    end_year: i32,
    shape: &Path,
    dataset: impl Into<DatasetChoice>,
    variables: &[&str],
) -> Result<Recipe, ValidationError> {
    RecipeBuilder::new()
        .title("Generic lumped forcing recipe")
        .description("Generic lumped forcing recipe")
        .dataset(dataset)
        .start(start_year)
        .end(end_year)
        .shape(shape, false)
        .lump()
        .add_variables(variables.iter().copied())
        .build()
}
