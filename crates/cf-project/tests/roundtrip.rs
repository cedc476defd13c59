use cf_project::*;
use cf_solver::CoolingConfig;

fn sample_run() -> RunFile {
    let mut cooling = CoolingConfig::primordial();
    cooling.redshift = 2.0;
    cooling.comoving = true;
    RunFile {
        version: LATEST_VERSION,
        name: "Two phases".to_string(),
        cooling,
        elements: vec![
            ElementDef {
                id: 1,
                density_g_cm3: 2.2e-24,
                thermal: ThermalDef::Temperature { temperature_k: 1.0e4 },
                metallicity: 0.0,
                species: vec![],
                hydro_du_dt: 0.0,
                photon_energy_density: vec![],
                column_density_g_cm2: None,
                cosmic_ray_ev_cm3: None,
                hot_source_erg_cm3: None,
                ionized_region: false,
            },
            ElementDef {
                id: 2,
                density_g_cm3: 2.2e-27,
                thermal: ThermalDef::SpecificEnergy { erg_per_g: 2.0e15 },
                metallicity: 0.02,
                species: vec![],
                hydro_du_dt: -1.5e2,
                photon_energy_density: vec![1.0e-14, 0.0],
                column_density_g_cm2: Some(1.0e-3),
                cosmic_ray_ev_cm3: Some(1.0),
                hot_source_erg_cm3: None,
                ionized_region: true,
            },
        ],
        run: RunDef {
            dt_myr: 0.5,
            t_end_myr: 20.0,
            record_every: 5,
            ..RunDef::default()
        },
    }
}

#[test]
fn roundtrip_yaml() {
    let run = sample_run();
    let path = std::env::temp_dir().join("cf_project_roundtrip.yaml");
    save_yaml(&path, &run).unwrap();
    let loaded = load(&path).unwrap();
    assert_eq!(run, loaded);
}

#[test]
fn roundtrip_json() {
    let run = sample_run();
    let path = std::env::temp_dir().join("cf_project_roundtrip.json");
    save_json(&path, &run).unwrap();
    let loaded = load(&path).unwrap();
    assert_eq!(run, loaded);
}

#[test]
fn json_floats_reload_bit_exact() {
    let mut run = sample_run();
    run.elements[0].density_g_cm3 = 2.2e-24;
    run.elements[1].thermal = ThermalDef::SpecificEnergy {
        erg_per_g: 1.234_567_890_123_45e15,
    };
    let path = std::env::temp_dir().join("cf_project_float_bits.json");
    save_json(&path, &run).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(
        loaded.elements[0].density_g_cm3.to_bits(),
        2.2e-24_f64.to_bits()
    );
    assert_eq!(loaded.elements[1].thermal, run.elements[1].thermal);
}

#[test]
fn minimal_yaml_fills_defaults() {
    let text = "\
version: 1
name: minimal
elements:
  - id: 4
    density_g_cm3: 1.0e-24
    thermal:
      type: Temperature
      temperature_k: 30000.0
";
    let path = std::env::temp_dir().join("cf_project_minimal.yaml");
    std::fs::write(&path, text).unwrap();
    let run = load_yaml(&path).unwrap();

    assert_eq!(run.cooling, CoolingConfig::default());
    assert_eq!(run.run, RunDef::default());
    assert_eq!(run.elements.len(), 1);
    assert_eq!(run.elements[0].metallicity, 0.0);
}

#[test]
fn unknown_extension_rejected() {
    let path = std::env::temp_dir().join("cf_project_run.toml");
    assert!(matches!(load(&path), Err(ProjectError::UnknownFormat { .. })));
}

#[test]
fn invalid_file_is_not_saved() {
    let mut run = sample_run();
    run.elements[1].id = 1;
    let path = std::env::temp_dir().join("cf_project_invalid.yaml");
    assert!(matches!(
        save_yaml(&path, &run),
        Err(ProjectError::Validation(ValidationError::DuplicateId { .. }))
    ));
}
