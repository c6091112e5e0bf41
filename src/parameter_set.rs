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

//! Module with parameter sets: static configuration and input
//! files of a model, prepared for a specific basin or region.
//!
//! Downloading parameter sets is not handled here.

use crate::errors::CompatibilityError;
use log::info;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, path::PathBuf};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ParameterSet {
    #[serde(default)]
    pub name: String,

    /// Location on disk where files of parameter set are stored.
    pub directory: PathBuf,

    /// Model configuration file which uses files from
    /// [`ParameterSet::directory`]. If path is relative,
    /// then it is relative to that directory.
    pub config: PathBuf,

    /// _(Optional)_ Persistent identifier of parameter set,
    /// for example a DOI of Zenodo record.
    ///
    /// Defaults to `N/A`.
    #[serde(default = "ParameterSet::default_doi")]
    pub doi: String,

    /// _(Optional)_ Name of model that parameter set can work with.
    ///
    /// Defaults to `generic`.
    #[serde(default = "ParameterSet::default_target_model")]
    pub target_model: String,

    /// _(Optional)_ Model versions supported by this parameter set.
    /// When empty, the parameter set is assumed to work
    /// with all versions of the model.
    #[serde(default)]
    pub supported_model_versions: BTreeSet<String>,
}

impl ParameterSet {
    fn default_doi() -> String {
        "N/A".to_string()
    }

    fn default_target_model() -> String {
        "generic".to_string()
    }

    /// Path of model configuration file.
    pub fn config_path(&self) -> PathBuf {
        if self.config.is_absolute() {
            self.config.clone()
        } else {
            self.directory.join(&self.config)
        }
    }

    /// Checks if the parameter set can be used by
    /// given version of given model.
    ///
    /// Model names are compared case-insensitively. An empty version
    /// skips the version check.
    pub fn check_model_compatibility(
        &self,
        model_name: &str,
        version: &str,
    ) -> Result<(), CompatibilityError> {
        if !self.target_model.eq_ignore_ascii_case(model_name) {
            return Err(CompatibilityError::WrongTargetModel {
                expected: self.target_model.clone(),
                actual: model_name.to_string(),
            });
        }

        if version.is_empty() {
            return Ok(());
        }

        if self.supported_model_versions.is_empty() {
            info!(
                "Model version {} is not explicitly listed in the supported model versions \
                of parameter set '{}'. This can lead to compatibility issues.",
                version, self.name
            );
            return Ok(());
        }

        if !self.supported_model_versions.contains(version) {
            return Err(CompatibilityError::UnsupportedVersion {
                parameter_set: self.name.clone(),
                version: version.to_string(),
                supported: self.supported_model_versions.clone(),
            });
        }

        Ok(())
    }

    /// Checks if all files of the parameter set are present.
    pub fn is_available(&self) -> bool {
        self.directory.is_dir() && self.config_path().is_file()
    }
}
