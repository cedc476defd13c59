use cf_core::units::{myr, seconds};
use cf_core::ElementId;
use cf_sim::{cool_elements, run_box, SimOptions};
use cf_solver::{Context, CoolingConfig, GasElement, IonizationSeed};

fn box_of(ctx: &Context, n: usize) -> (Vec<GasElement>, Vec<IonizationSeed>) {
    let elements = (0..n)
        .map(|i| {
            let t = 10f64.powf(3.5 + 4.0 * i as f64 / n as f64);
            let rho = 10f64.powf(-26.0 + 3.0 * ((i * 7) % n) as f64 / n as f64);
            let u = ctx.energy_from_temperature(t, 0.6);
            GasElement::new(ElementId::from_index(i), rho, u, seconds(myr(5.0)))
        })
        .collect::<Vec<_>>();
    let seeds = vec![IonizationSeed::default(); n];
    (elements, seeds)
}

fn phase_on_threads(threads: usize) -> Vec<u64> {
    let ctx = Context::build(CoolingConfig::primordial()).unwrap();
    let (mut elements, mut seeds) = box_of(&ctx, 64);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .unwrap();
    pool.install(|| cool_elements(&ctx, &mut elements, &mut seeds)).unwrap();
    elements.iter().map(|el| el.specific_energy.to_bits()).collect()
}

#[test]
fn results_do_not_depend_on_thread_count() {
    let one = phase_on_threads(1);
    assert_eq!(one, phase_on_threads(4));
    assert_eq!(one, phase_on_threads(7));
}

#[test]
fn box_run_records_decimated_history() {
    let mut ctx = Context::build(CoolingConfig::primordial()).unwrap();
    let (mut elements, mut seeds) = box_of(&ctx, 8);
    let opts = SimOptions {
        dt: seconds(myr(1.0)),
        t_end: seconds(myr(25.0)),
        record_every: 10,
        ..SimOptions::default()
    };
    let record = run_box(&mut ctx, &mut elements, &mut seeds, &opts).unwrap();

    // t = 0, 10, 20 and the final step
    assert_eq!(record.t.len(), 4);
    assert_eq!(record.t[0], 0.0);
    assert!(record.t.windows(2).all(|w| w[1] > w[0]));
    assert!(record.samples.iter().all(|s| s.len() == 8));
    assert!(record.redshift.iter().all(|z| *z == 0.0));

    let hottest_start = record.samples[0][7].temperature;
    let hottest_end = record.samples[3][7].temperature;
    assert!(hottest_end < hottest_start);
}

#[test]
fn comoving_run_advances_redshift() {
    let mut config = CoolingConfig::primordial();
    config.comoving = true;
    config.redshift = 3.0;
    let mut ctx = Context::build(config).unwrap();
    let (mut elements, mut seeds) = box_of(&ctx, 4);
    let opts = SimOptions {
        dt: seconds(myr(50.0)),
        t_end: seconds(myr(200.0)),
        record_every: 1,
        ..SimOptions::default()
    };
    let record = run_box(&mut ctx, &mut elements, &mut seeds, &opts).unwrap();

    assert_eq!(record.redshift[0], 3.0);
    assert!(record.redshift.windows(2).all(|w| w[1] < w[0]));
    assert!(ctx.redshift() < 3.0);
    assert!((ctx.t_cmb() - 2.725 * (1.0 + ctx.redshift())).abs() < 1e-9);
}
