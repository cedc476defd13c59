//! Run file validation logic.

use crate::schema::{ElementDef, RunDef, RunFile, ThermalDef};
use std::collections::HashSet;

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid cooling configuration: {reason}")]
    Cooling { reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_run_file(run: &RunFile) -> Result<(), ValidationError> {
    if run.version == 0 || run.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: run.version,
        });
    }

    run.cooling
        .validate()
        .map_err(|e| ValidationError::Cooling {
            reason: e.to_string(),
        })?;

    let mut ids = HashSet::new();
    for element in &run.elements {
        if !ids.insert(element.id) {
            return Err(ValidationError::DuplicateId {
                id: element.id.to_string(),
                context: "elements".to_string(),
            });
        }
        validate_element(element, run.cooling.photon_bands.len())?;
    }

    validate_run(&run.run)
}

fn validate_element(element: &ElementDef, n_bands: usize) -> Result<(), ValidationError> {
    let field = |name: &str| format!("elements[{}].{name}", element.id);

    if !(element.density_g_cm3 > 0.0) || !element.density_g_cm3.is_finite() {
        return Err(invalid(field("density_g_cm3"), element.density_g_cm3, "must be positive"));
    }
    match element.thermal {
        ThermalDef::Temperature { temperature_k } => {
            if !(temperature_k > 0.0) || !temperature_k.is_finite() {
                return Err(invalid(field("temperature_k"), temperature_k, "must be positive"));
            }
        }
        ThermalDef::SpecificEnergy { erg_per_g } => {
            if !(erg_per_g >= 0.0) || !erg_per_g.is_finite() {
                return Err(invalid(field("erg_per_g"), erg_per_g, "must be non-negative"));
            }
        }
    }
    if !(0.0..1.0).contains(&element.metallicity) {
        return Err(invalid(field("metallicity"), element.metallicity, "must be in [0, 1)"));
    }
    if element.species.iter().any(|z| !(*z >= 0.0)) {
        return Err(invalid(field("species"), format!("{:?}", element.species), "must be non-negative"));
    }
    if element.photon_energy_density.len() > n_bands {
        return Err(invalid(
            field("photon_energy_density"),
            element.photon_energy_density.len(),
            "more entries than photon bands",
        ));
    }
    if element.photon_energy_density.iter().any(|e| !(*e >= 0.0)) {
        return Err(invalid(
            field("photon_energy_density"),
            format!("{:?}", element.photon_energy_density),
            "must be non-negative",
        ));
    }
    for (name, value) in [
        ("column_density_g_cm2", element.column_density_g_cm2),
        ("cosmic_ray_ev_cm3", element.cosmic_ray_ev_cm3),
        ("hot_source_erg_cm3", element.hot_source_erg_cm3),
    ] {
        if let Some(v) = value {
            if !(v >= 0.0) || !v.is_finite() {
                return Err(invalid(field(name), v, "must be non-negative"));
            }
        }
    }
    if !element.hydro_du_dt.is_finite() {
        return Err(invalid(field("hydro_du_dt"), element.hydro_du_dt, "must be finite"));
    }
    Ok(())
}

fn validate_run(run: &RunDef) -> Result<(), ValidationError> {
    if !(run.dt_myr > 0.0) || !run.dt_myr.is_finite() {
        return Err(invalid("run.dt_myr", run.dt_myr, "must be positive"));
    }
    if !(run.t_end_myr >= 0.0) || !run.t_end_myr.is_finite() {
        return Err(invalid("run.t_end_myr", run.t_end_myr, "must be non-negative"));
    }
    if run.max_steps == 0 {
        return Err(invalid("run.max_steps", run.max_steps, "must be positive"));
    }
    if run.record_every == 0 {
        return Err(invalid("run.record_every", run.record_every, "must be positive"));
    }
    run.cosmology
        .validate()
        .map_err(|e| invalid("run.cosmology", format!("{:?}", run.cosmology), &e.to_string()))
}
