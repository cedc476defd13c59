//! Turning element definitions into solver inputs.

use crate::schema::{ElementDef, RunFile, ThermalDef};
use crate::ProjectResult;
use cf_core::ElementId;
use cf_solver::{net_rate_at_temperature, Context, GasElement, GasView, IonizationSeed, Metallicity};

fn gas_element(def: &ElementDef, specific_energy: f64, dt: f64) -> GasElement {
    GasElement {
        id: ElementId::new(def.id),
        density: def.density_g_cm3,
        specific_energy,
        dt,
        hydro_du_dt: def.hydro_du_dt,
        metallicity: Metallicity {
            total: def.metallicity,
            species: def.species.clone(),
        },
        photon_energy_density: def.photon_energy_density.clone(),
        column_density: def.column_density_g_cm2,
        cosmic_ray_energy_density: def.cosmic_ray_ev_cm3,
        hot_source_energy_density: def.hot_source_erg_cm3,
        ionized_region: def.ionized_region,
    }
}

/// Elements and warm-start seeds for a run file.
///
/// Elements given by temperature start at the ionization equilibrium of that
/// temperature, which also seeds their electron abundance.
pub fn build_elements(
    ctx: &Context,
    run: &RunFile,
) -> ProjectResult<(Vec<GasElement>, Vec<IonizationSeed>)> {
    let dt = run.run.sim_options().dt;
    let mut elements = Vec::with_capacity(run.elements.len());
    let mut seeds = Vec::with_capacity(run.elements.len());

    for def in &run.elements {
        match def.thermal {
            ThermalDef::SpecificEnergy { erg_per_g } => {
                elements.push(gas_element(def, erg_per_g, dt));
                seeds.push(IonizationSeed::default());
            }
            ThermalDef::Temperature { temperature_k } => {
                let mut element = gas_element(def, 0.0, dt);
                let view = GasView::new(ctx, &element, &IonizationSeed::default());
                let (sol, _) = net_rate_at_temperature(ctx, &view, temperature_k, 0.5)?;
                element.specific_energy = ctx.energy_from_temperature(temperature_k, sol.state.ne);
                elements.push(element);
                seeds.push(IonizationSeed::new(sol.state));
            }
        }
    }
    Ok((elements, seeds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RunDef;
    use cf_solver::CoolingConfig;

    #[test]
    fn temperature_elements_start_in_equilibrium() {
        let ctx = Context::build(CoolingConfig::primordial()).unwrap();
        let def = |id, thermal| ElementDef {
            id,
            density_g_cm3: 1.0e-24,
            thermal,
            metallicity: 0.0,
            species: vec![],
            hydro_du_dt: 0.0,
            photon_energy_density: vec![],
            column_density_g_cm2: None,
            cosmic_ray_ev_cm3: None,
            hot_source_erg_cm3: None,
            ionized_region: false,
        };
        let run = RunFile {
            version: 1,
            name: "build".to_string(),
            cooling: CoolingConfig::primordial(),
            elements: vec![
                def(1, ThermalDef::Temperature { temperature_k: 1.0e7 }),
                def(2, ThermalDef::SpecificEnergy { erg_per_g: 1.0e12 }),
            ],
            run: RunDef::default(),
        };

        let (elements, seeds) = build_elements(&ctx, &run).unwrap();
        let hot_u = ctx.energy_from_temperature(1.0e7, 1.0 + 2.0 * ctx.y_helium());
        assert!((elements[0].specific_energy - hot_u).abs() / hot_u < 1e-4);
        assert!(seeds[0].ne_guess().is_some());
        assert_eq!(elements[1].specific_energy, 1.0e12);
        assert!(seeds[1].state.is_none());
        assert!(elements.iter().all(|el| el.dt > 0.0));
    }
}
