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

//! Module running the whole forcing preparation: reading the
//! configuration, checking the model against its parameter set
//! and writing the forcing recipe into the output directory.

use crate::{
    configuration::{Config, Model},
    errors::AppError,
};
use log::{debug, info, warn};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Environment variable with the path of the configuration file.
pub const CONFIG_PATH_VAR: &str = "EWC_CONFIG";

/// Main program function, responsible for all preparation steps.
///
/// Reads the configuration from `config.yaml` or the file given in
/// `EWC_CONFIG` and returns the path of the written recipe.
pub fn main() -> Result<PathBuf, AppError> {
    let config_path =
        env::var_os(CONFIG_PATH_VAR).map_or_else(|| PathBuf::from("config.yaml"), PathBuf::from);

    debug!("Reading configuration from {}", config_path.display());
    let config = Config::new_from_file(&config_path)?;

    run(&config)
}

/// Checks the model, builds the forcing recipe and saves it.
pub fn run(config: &Config) -> Result<PathBuf, AppError> {
    if let Some(model) = &config.model {
        check_model(model)?;
    }

    info!("Building forcing recipe");
    let recipe = config.forcing.recipe_builder().build()?;

    prepare_output_dir(&config.output.directory)?;

    let recipe_path = config.output.recipe_path();

    if recipe_path.exists() {
        return Err(AppError::FaultyOutput(format!(
            "Recipe file {} already exists",
            recipe_path.display()
        )));
    }

    recipe.save(&recipe_path)?;
    info!("Forcing recipe written to {}", recipe_path.display());

    Ok(recipe_path)
}

/// Logs the images of the model and checks if
/// its parameter set supports the model version.
fn check_model(model: &Model) -> Result<(), AppError> {
    info!(
        "Model {} uses image {} (apptainer: {})",
        model.name,
        model.bmi_image.docker_url(),
        model.bmi_image.apptainer_filename()
    );

    let parameter_set = match &model.parameter_set {
        Some(parameter_set) => parameter_set,
        None => {
            debug!("No parameter set given so skipping compatibility check");
            return Ok(());
        }
    };

    if !parameter_set.is_available() {
        warn!(
            "Parameter set '{}' is not available at {}",
            parameter_set.name,
            parameter_set.directory.display()
        );
    }

    parameter_set
        .check_model_compatibility(&model.name, model.bmi_image.tag().unwrap_or(""))?;

    Ok(())
}

/// Creates the output directory when it does not exist.
fn prepare_output_dir(out_path: &Path) -> Result<(), AppError> {
    debug!("Checking and setting output directory");

    if out_path.is_dir() {
        debug!("Output directory exists so continuing");
    } else if out_path.exists() {
        return Err(AppError::FaultyOutput(format!(
            "{} exists and is not a directory",
            out_path.display()
        )));
    } else {
        debug!("Output directory does not exist so creating a new one");
        fs::create_dir_all(out_path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::{
        configuration::Config,
        errors::{AppError, CompatibilityError},
        esmvaltool::Recipe,
    };
    use std::fs;

    fn config_in(directory: &std::path::Path, model: &str) -> Config {
        let content = format!(
            "\
forcing:
  title: Generic forcing
  start_time: 1990-01-01T00:00:00
  end_time: 1991-12-31T00:00:00
  region:
    start_longitude: 4.15
    end_longitude: 11.95
    start_latitude: 46.35
    end_latitude: 52.05
  variables: [pr, tas]
output:
  directory: {}
{}",
            directory.join("forcing").display(),
            model
        );

        let path = directory.join("config.yaml");
        fs::write(&path, content).unwrap();
        Config::new_from_file(&path).unwrap()
    }

    #[test]
    fn writes_recipe() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "");

        let recipe_path = run(&config).unwrap();

        assert_eq!(
            recipe_path,
            dir.path().join("forcing").join("recipe_forcing.yml")
        );

        let recipe = Recipe::load(&recipe_path).unwrap();
        assert_eq!(recipe.documentation.title, "Generic forcing");
        assert_eq!(
            recipe.preprocessors.unwrap().keys().collect::<Vec<_>>(),
            vec!["spatial", "pr", "tas"]
        );
    }

    #[test]
    fn refuses_to_overwrite_recipe() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "");

        run(&config).unwrap();

        assert!(matches!(run(&config), Err(AppError::FaultyOutput(_))));
    }

    #[test]
    fn output_path_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "");
        fs::write(dir.path().join("forcing"), "").unwrap();

        assert!(matches!(run(&config), Err(AppError::FaultyOutput(_))));
    }

    #[test]
    fn unsupported_model_version() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(
            dir.path(),
            "\
model:
  name: wflow
  bmi_image: ewatercycle/wflow-grpc4bmi:2020.1.3
  parameter_set:
    name: wflow_rhine_sbm_nc
    directory: /data/parameter-sets/wflow_rhine_sbm_nc
    config: wflow_sbm_NC.ini
    target_model: wflow
    supported_model_versions: [2020.1.1]
",
        );

        assert!(matches!(
            run(&config),
            Err(AppError::Compatibility(CompatibilityError::UnsupportedVersion { .. }))
        ));
        assert!(!dir.path().join("forcing").exists());
    }

    #[test]
    fn untagged_image_skips_version_check() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(
            dir.path(),
            "\
model:
  name: wflow
  bmi_image: ewatercycle/wflow-grpc4bmi
  parameter_set:
    directory: /data/parameter-sets/wflow_rhine_sbm_nc
    config: wflow_sbm_NC.ini
    target_model: wflow
    supported_model_versions: [2020.1.1]
",
        );

        assert!(run(&config).is_ok());
    }
}
