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

//! Module translating container image names between the two
//! addressing schemes used to run models.
//!
//! Docker pulls images by reference (`registry/organisation/name:tag`),
//! while Apptainer looks for a single image file in a local directory
//! (`organisation-name_tag.sif`). A model only declares one of them, so
//! the other one has to be derived.
//!
//! The file name never carries a registry, so translating from Docker
//! to Apptainer and back drops it. The organisation is separated from
//! the name at the *first* `-` and the tag from the name at the *last* `_`
//! of a file name.

use crate::constants::{SIF_EXTENSION, UNKNOWN_VERSION};
use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Canonical form of a container image, parsed from either
/// a Docker reference or an Apptainer file name.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerImage {
    registry: Option<String>,
    organisation: Option<String>,
    name: String,
    tag: Option<String>,
}

impl ContainerImage {
    /// Parses an image from a Docker reference or from
    /// an Apptainer file name ending with `.sif`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();

        if input.ends_with(SIF_EXTENSION) {
            parse_apptainer_filename(input)
        } else {
            parse_docker_url(input)
        }
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn organisation(&self) -> Option<&str> {
        self.organisation.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Model version carried by the image, which is its tag.
    ///
    /// Images without a tag report `unknown`.
    pub fn version(&self) -> &str {
        self.tag.as_deref().unwrap_or(UNKNOWN_VERSION)
    }

    /// Renders the image as a Docker reference, e.g. `ewatercycle/wflow-grpc4bmi:2020.1.1`.
    pub fn docker_url(&self) -> String {
        let mut url = [
            self.registry.as_deref(),
            self.organisation.as_deref(),
            Some(self.name.as_str()),
        ]
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join("/");

        if let Some(tag) = &self.tag {
            url.push(':');
            url.push_str(tag);
        }

        url
    }

    /// Renders the image as an Apptainer file name, e.g. `ewatercycle-wflow-grpc4bmi_2020.1.1.sif`.
    ///
    /// The registry is not part of the file name.
    pub fn apptainer_filename(&self) -> String {
        let mut filename = match &self.organisation {
            Some(organisation) => format!("{}-{}", organisation, self.name),
            None => self.name.clone(),
        };

        if let Some(tag) = &self.tag {
            filename.push('_');
            filename.push_str(tag);
        }

        filename.push_str(SIF_EXTENSION);
        filename
    }
}

impl fmt::Display for ContainerImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.docker_url())
    }
}

impl FromStr for ContainerImage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContainerImage::parse(s)
    }
}

impl TryFrom<String> for ContainerImage {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ContainerImage::parse(&value)
    }
}

impl From<ContainerImage> for String {
    fn from(image: ContainerImage) -> Self {
        image.docker_url()
    }
}

/// Parses `[registry/][organisation/]name[:tag]`.
fn parse_docker_url(url: &str) -> Result<ContainerImage, ValidationError> {
    let invalid = || ValidationError::InvalidImage(url.to_string());

    let segments: Vec<&str> = url.split('/').collect();

    let (registry, organisation, name_tag) = match segments.as_slice() {
        [name_tag] => (None, None, *name_tag),
        [first, name_tag] if is_registry(first) => (Some(*first), None, *name_tag),
        [organisation, name_tag] => (None, Some(*organisation), *name_tag),
        [registry, organisation, name_tag] => (Some(*registry), Some(*organisation), *name_tag),
        _ => return Err(invalid()),
    };

    let (name, tag) = match name_tag.rsplit_once(':') {
        Some((name, tag)) => (name, Some(tag)),
        None => (name_tag, None),
    };

    if !registry.map_or(true, is_valid_registry)
        || !organisation.map_or(true, is_valid_component)
        || !is_valid_component(name)
        || !tag.map_or(true, is_valid_component)
    {
        return Err(invalid());
    }

    Ok(ContainerImage {
        registry: registry.map(str::to_string),
        organisation: organisation.map(str::to_string),
        name: name.to_string(),
        tag: tag.map(str::to_string),
    })
}

/// Parses `[organisation-]name[_tag].sif`.
fn parse_apptainer_filename(filename: &str) -> Result<ContainerImage, ValidationError> {
    let invalid = || ValidationError::InvalidImage(filename.to_string());

    let stem = filename.strip_suffix(SIF_EXTENSION).ok_or_else(invalid)?;

    let (organisation_name, tag) = match stem.rsplit_once('_') {
        Some((organisation_name, tag)) => (organisation_name, Some(tag)),
        None => (stem, None),
    };

    let (organisation, name) = match organisation_name.split_once('-') {
        Some((organisation, name)) => (Some(organisation), name),
        None => (None, organisation_name),
    };

    if !organisation.map_or(true, is_valid_component)
        || !is_valid_component(name)
        || !tag.map_or(true, is_valid_component)
    {
        return Err(invalid());
    }

    Ok(ContainerImage {
        registry: None,
        organisation: organisation.map(str::to_string),
        name: name.to_string(),
        tag: tag.map(str::to_string),
    })
}

/// Hostname heuristic for the first of two reference segments.
fn is_registry(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

fn is_valid_component(component: &str) -> bool {
    !component.is_empty()
        && component
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}

// registries may carry a port
fn is_valid_registry(registry: &str) -> bool {
    match registry.split_once(':') {
        Some((host, port)) => {
            is_valid_component(host) && !port.is_empty() && port.chars().all(|c| c.is_ascii_digit())
        }
        None => is_valid_component(registry),
    }
}
