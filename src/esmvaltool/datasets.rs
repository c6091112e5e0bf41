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

//! Predefined forcing datasets which can be requested by name.

use super::schema::Dataset;
use serde_yaml::{Mapping, Value};

struct PredefinedDataset {
    name: &'static str,
    project: &'static str,
    tier: u8,
    dataset_type: &'static str,
    mip: &'static str,
    version: u64,
}

const PREDEFINED_DATASETS: [PredefinedDataset; 2] = [
    PredefinedDataset {
        name: "ERA5",
        project: "OBS6",
        tier: 3,
        dataset_type: "reanaly",
        mip: "day",
        version: 1,
    },
    PredefinedDataset {
        name: "ERA-Interim",
        project: "OBS6",
        tier: 3,
        dataset_type: "reanaly",
        mip: "day",
        version: 1,
    },
];

/// Names of all predefined datasets.
pub fn predefined_names() -> impl Iterator<Item = &'static str> {
    PREDEFINED_DATASETS.iter().map(|predefined| predefined.name)
}

/// Looks up a predefined dataset section by its name.
pub fn predefined_dataset(name: &str) -> Option<Dataset> {
    let predefined = PREDEFINED_DATASETS
        .iter()
        .find(|predefined| predefined.name == name)?;

    let mut extra = Mapping::new();
    extra.insert(Value::from("version"), Value::from(predefined.version));

    Some(Dataset {
        dataset: predefined.name.to_string(),
        project: Some(predefined.project.to_string()),
        mip: Some(predefined.mip.to_string()),
        tier: Some(predefined.tier),
        dataset_type: Some(predefined.dataset_type.to_string()),
        extra,
        ..Dataset::default()
    })
}

#[cfg(test)]
mod tests {
    use super::{predefined_dataset, predefined_names};

    #[test]
    fn era5_is_predefined() {
        let era5 = predefined_dataset("ERA5").unwrap();

        assert_eq!(era5.dataset, "ERA5");
        assert_eq!(era5.project.as_deref(), Some("OBS6"));
        assert_eq!(era5.tier, Some(3));
        assert_eq!(era5.dataset_type.as_deref(), Some("reanaly"));
        assert!(era5.check_bounds().is_ok());
    }

    #[test]
    fn names_are_listed() {
        assert_eq!(
            predefined_names().collect::<Vec<_>>(),
            vec!["ERA5", "ERA-Interim"]
        );
        assert!(predefined_dataset("ERA-Interim").is_some());
        assert!(predefined_dataset("era5").is_none());
    }
}
