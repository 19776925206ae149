//! delivery-types: domain model and repository ports shared by the workspace.

pub mod domain;
pub mod ports;
