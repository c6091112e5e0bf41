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

//! Command-line entry of eWaterCycle Core (EWC).
//!
//! Reads `config.yaml` (or the file in `EWC_CONFIG`), checks the model
//! against its parameter set and writes the forcing recipe.

use env_logger::Env;
use log::{error, info};
use std::process;

/// The main program function.
/// Prepares the runtime environment and calls the [`ewatercycle::app::main`].
///
/// To provide meaningful and high-quality error messages the `env_logger`
/// needs to be initiated before any log messages are possible to occur.
fn main() {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("EWC_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("EWC_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    match ewatercycle::app::main() {
        Ok(recipe_path) => info!(
            "Forcing preparation finished. Run {} with ESMValTool to generate the forcing.",
            recipe_path.display()
        ),
        Err(err) => {
            error!("Forcing preparation failed with error: {}", err);
            process::exit(1);
        }
    }
}
