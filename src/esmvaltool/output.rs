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

//! Module collecting the files produced by running a recipe.
//!
//! Running the recipe is left to a [`RecipeRunner`], this module
//! only turns its output into forcing file names. It assumes that:
//!
//! - the recipe had at least one diagnostic task,
//! - the first task produced at least one file,
//! - all files of the first task are in the same directory.

use super::schema::{OrderedMap, Recipe};
use crate::errors::OutputError;
use log::debug;
use std::path::{Path, PathBuf};

/// File written by a diagnostic task.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum OutputFile {
    /// NetCDF file, with the name of its first data variable when known.
    Data {
        path: PathBuf,
        variable: Option<String>,
    },

    Image(PathBuf),

    Other(PathBuf),
}

impl OutputFile {
    /// Classifies the file by its extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("nc") => OutputFile::Data {
                path,
                variable: None,
            },
            Some("png" | "jpg" | "jpeg" | "svg" | "pdf") => OutputFile::Image(path),
            _ => OutputFile::Other(path),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            OutputFile::Data { path, .. } => path,
            OutputFile::Image(path) | OutputFile::Other(path) => path,
        }
    }
}

/// Files of one diagnostic task, e.g. `diagnostic/script`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TaskOutput {
    pub name: String,
    pub files: Vec<OutputFile>,
}

/// Output of a recipe run, with tasks in the order they were run.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RecipeOutput {
    pub tasks: Vec<TaskOutput>,
}

/// Forcing files of a recipe run, keyed by variable name.
#[derive(Clone, PartialEq, Debug)]
pub struct ForcingFiles {
    /// Common parent directory of all files.
    pub directory: PathBuf,

    /// File names relative to [`ForcingFiles::directory`].
    pub files: OrderedMap<String>,
}

/// Executes recipes, e.g. with ESMValTool.
pub trait RecipeRunner {
    /// Runs the recipe and writes its output into `output_dir`,
    /// or into a directory of the runner's choice when not given.
    fn run(&self, recipe: &Recipe, output_dir: Option<&Path>) -> Result<RecipeOutput, OutputError>;
}

/// Runs the recipe and collects the forcing files it produced.
pub fn run_recipe<R: RecipeRunner + ?Sized>(
    runner: &R,
    recipe: &Recipe,
    output_dir: Option<&Path>,
) -> Result<ForcingFiles, OutputError> {
    debug!("Running recipe '{}'", recipe.documentation.title);

    let output = runner.run(recipe, output_dir)?;

    parse_recipe_output(&output)
}

/// Collects forcing files from the first task of the recipe output.
///
/// Images are skipped. Data files are keyed by their variable and
/// all other files by their name without extension.
pub fn parse_recipe_output(output: &RecipeOutput) -> Result<ForcingFiles, OutputError> {
    let task = output.tasks.first().ok_or(OutputError::NoDiagnostics)?;

    let mut files = OrderedMap::new();
    let mut directory = None;

    for file in &task.files {
        let key = match file {
            OutputFile::Data {
                variable: Some(variable),
                ..
            } => variable.clone(),
            OutputFile::Data { path, .. } | OutputFile::Other(path) => file_stem(path),
            OutputFile::Image(_) => continue,
        };

        let path = file.path();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        files.insert(key, file_name);
        directory = path.parent().map(Path::to_path_buf);
    }

    match directory {
        Some(directory) if !files.is_empty() => Ok(ForcingFiles { directory, files }),
        _ => Err(OutputError::NoOutputFiles(task.name.clone())),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{parse_recipe_output, run_recipe, OutputFile, RecipeOutput, RecipeRunner, TaskOutput};
    use crate::errors::OutputError;
    use crate::esmvaltool::{builder::RecipeBuilder, schema::Recipe};
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    fn output_with(files: Vec<OutputFile>) -> RecipeOutput {
        RecipeOutput {
            tasks: vec![TaskOutput {
                name: "diagnostic/script".to_string(),
                files,
            }],
        }
    }

    #[test]
    fn data_files_are_keyed_by_variable() {
        let output = output_with(vec![
            OutputFile::Data {
                path: PathBuf::from("/out/work/diagnostic/script/OBS6_ERA5_reanaly_1_day_pr_2000-2001.nc"),
                variable: Some("pr".to_string()),
            },
            OutputFile::from_path("/out/work/diagnostic/script/map.png"),
            OutputFile::from_path("/out/work/diagnostic/script/tas.txt"),
        ]);

        let forcing = parse_recipe_output(&output).unwrap();

        assert_eq!(forcing.directory, PathBuf::from("/out/work/diagnostic/script"));
        assert_eq!(forcing.files.keys().collect::<Vec<_>>(), vec!["pr", "tas"]);
        assert_eq!(
            forcing.files.get("pr").map(String::as_str),
            Some("OBS6_ERA5_reanaly_1_day_pr_2000-2001.nc")
        );
        assert_eq!(forcing.files.get("tas").map(String::as_str), Some("tas.txt"));
    }

    #[test]
    fn data_file_without_variable_uses_stem() {
        let output = output_with(vec![OutputFile::from_path("/out/evspsblpot.nc")]);

        let forcing = parse_recipe_output(&output).unwrap();

        assert_eq!(
            forcing.files.get("evspsblpot").map(String::as_str),
            Some("evspsblpot.nc")
        );
    }

    #[test]
    fn no_files() {
        let result = parse_recipe_output(&output_with(vec![]));
        assert!(matches!(result, Err(OutputError::NoOutputFiles(name)) if name == "diagnostic/script"));

        let result = parse_recipe_output(&output_with(vec![OutputFile::from_path("/out/map.png")]));
        assert!(matches!(result, Err(OutputError::NoOutputFiles(_))));
    }

    #[test]
    fn no_diagnostic() {
        let result = parse_recipe_output(&RecipeOutput::default());
        assert!(matches!(result, Err(OutputError::NoDiagnostics)));
    }

    struct FakeRunner {
        output_dirs: RefCell<Vec<Option<PathBuf>>>,
    }

    impl RecipeRunner for FakeRunner {
        fn run(
            &self,
            recipe: &Recipe,
            output_dir: Option<&Path>,
        ) -> Result<RecipeOutput, OutputError> {
            self.output_dirs
                .borrow_mut()
                .push(output_dir.map(Path::to_path_buf));

            let directory = output_dir.unwrap_or_else(|| Path::new("/tmp/generated"));
            let variables = recipe.diagnostics.as_ref().unwrap().get("diagnostic").unwrap().variables.as_ref().unwrap();
            let files = variables
                .keys()
                .map(|name| OutputFile::Data {
                    path: directory.join(format!("{}.nc", name)),
                    variable: Some(name.to_string()),
                })
                .collect();

            Ok(output_with(files))
        }
    }

    #[test]
    fn runner_output_is_parsed() {
        let recipe = RecipeBuilder::new()
            .dataset("ERA5")
            .start(2000)
            .end(2001)
            .add_variables(["pr", "tas"])
            .build()
            .unwrap();

        let runner = FakeRunner {
            output_dirs: RefCell::new(vec![]),
        };

        let forcing = run_recipe(&runner, &recipe, Some(Path::new("/data/forcing"))).unwrap();

        assert_eq!(forcing.directory, PathBuf::from("/data/forcing"));
        assert_eq!(forcing.files.keys().collect::<Vec<_>>(), vec!["pr", "tas"]);
        assert_eq!(
            runner.output_dirs.borrow().as_slice(),
            &[Some(PathBuf::from("/data/forcing"))]
        );
    }
}
