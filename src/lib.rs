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

//! eWaterCycle Core (EWC) prepares the inputs of hydrological models
//! run in containers within the eWaterCycle platform.
//!
//! It translates model images between Docker references and Apptainer
//! file names, builds [ESMValTool](https://www.esmvaltool.org/) recipes
//! generating forcing data, collects the forcing files those recipes
//! produce and checks if a model version can use a parameter set.

pub mod app;
pub mod configuration;
pub mod constants;
pub mod container;
pub mod errors;
pub mod esmvaltool;
pub mod parameter_set;
