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

use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Error while reading config.yaml: {0}")]
    Config(#[from] ConfigError),

    #[error("Model and parameter set do not match: {0}")]
    Compatibility(#[from] CompatibilityError),

    #[error("Forcing recipe is invalid: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cannot write forcing recipe: {0}")]
    Recipe(#[from] RecipeError),

    #[error("Error while handling the output directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output directory is not usable: {0}")]
    FaultyOutput(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open config.yaml: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize config.yaml: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),

    #[error("Configuration component is invalid: {0}")]
    Invalid(#[from] ValidationError),
}

/// Errors of malformed user input, detected while parsing an image
/// reference or while building a forcing recipe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{0}' is neither a docker url nor an apptainer filename")]
    InvalidImage(String),

    #[error("Unknown dataset '{0}', choose one of the predefined datasets or pass a dataset mapping")]
    UnknownDataset(String),

    #[error("Dataset mapping cannot be used as a dataset: {0}")]
    InvalidDataset(String),

    #[error("Dataset '{dataset}' has tier {tier}, but tier must be 1, 2 or 3")]
    InvalidTier { dataset: String, tier: u8 },

    #[error("Recipe has no dataset")]
    MissingDataset,

    #[error("Recipe can select either a region or a shape, not both")]
    ConflictingSpatialSelection,

    #[error("Region is invalid: {0}")]
    InvalidRegion(&'static str),

    #[error("Lumped forcing cannot use a decomposed shape")]
    DecomposedLump,

    #[error("Start year {start} is after end year {end}")]
    InvertedTimeRange { start: i32, end: i32 },

    #[error("Recipe has no variables")]
    NoVariables,

    #[error("Variable cannot be named '{0}', the name is used by the spatial preprocessor")]
    ReservedVariableName(String),

    #[error("Preprocessor of '{variable}' already has operation '{operation}'")]
    DuplicateOperation { variable: String, operation: String },
}

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("Cannot access recipe file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot (de)serialize recipe: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Recipe output has no diagnostic tasks")]
    NoDiagnostics,

    #[error("No recipe output files found in task '{0}'")]
    NoOutputFiles(String),

    #[error("Recipe runner failed: {0}")]
    Runner(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompatibilityError {
    #[error("Parameter set has wrong target model, expected {expected} got {actual}")]
    WrongTargetModel { expected: String, actual: String },

    #[error("Parameter set '{parameter_set}' not compatible with model version {version}, compatible versions: {supported:?}")]
    UnsupportedVersion {
        parameter_set: String,
        version: String,
        supported: BTreeSet<String>,
    },
}
