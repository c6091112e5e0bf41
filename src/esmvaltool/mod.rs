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

//! Module responsible for ESMValTool recipes generating forcing data:
//! their schema, the predefined datasets, the recipe builder
//! and the parsing of recipe output.
//!
//! ESMValTool itself is not run here.

pub mod builder;
pub mod datasets;
pub mod output;
pub mod schema;

pub use builder::{
    build_generic_distributed_forcing_recipe, build_generic_lumped_forcing_recipe,
    DatasetChoice, RecipeBuilder, Region, VariableRequest,
};
pub use output::{parse_recipe_output, run_recipe, ForcingFiles, RecipeOutput, RecipeRunner};
pub use schema::{ClimateStatistics, Dataset, Recipe};
