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

//! Module containing constants shared by the recipe builder
//! and the container image translator.

///Name of the single diagnostic of every forcing recipe
pub const DIAGNOSTIC_NAME: &str = "diagnostic";

///Name of the preprocessor step holding the spatial selection
pub const SPATIAL_PREPROCESSOR_NAME: &str = "spatial";

///Name of the script entry inside the diagnostic
pub const SCRIPT_NAME: &str = "script";

///Diagnostic script copying preprocessed files to the diagnostic output
pub const DEFAULT_DIAGNOSTIC_SCRIPT: &str = "ewatercycle/diagnostic/copier.py";

///Authors written to the documentation section of generated recipes
pub const RECIPE_AUTHORS: [&str; 1] = ["unmaintained"];

///Projects written to the documentation section of generated recipes
pub const RECIPE_PROJECTS: [&str; 1] = ["ewatercycle"];

///Extension of Apptainer image files
pub const SIF_EXTENSION: &str = ".sif";

///Version reported for images without a tag
pub const UNKNOWN_VERSION: &str = "unknown";

///Dataset used when no dataset is requested explicitly
pub const DEFAULT_DATASET: &str = "ERA5";

///Years used for variables added before `start`/`end` are set
pub const DEFAULT_START_YEAR: i32 = 0;
pub const DEFAULT_END_YEAR: i32 = 10000;

///Variables of the generic forcing recipes
pub const GENERIC_VARIABLES: [&str; 4] = ["pr", "tas", "tasmin", "tasmax"];
