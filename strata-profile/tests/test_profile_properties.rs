use float_cmp::assert_approx_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;
use strata_data::{FakeDatasetConfig, GridDataset, SampleTable, SphereCenter};
use strata_profile::{
    create_profile, Accumulation, ProfileRequest, ProfileStatus, StrataProfileError,
};
use strata_units::UnitRegistry;

fn uniform_table(n: usize, seed: u64) -> SampleTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let x: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
    let y: Vec<f64> = (0..n).map(|_| rng.gen_range(0.1..10.0)).collect();
    let w: Vec<f64> = (0..n).map(|_| rng.gen_range(0.5..2.0)).collect();
    SampleTable::new("uniform")
        .with_field("x", "cm", x)
        .with_field("y", "K", y)
        .with_field("ones", "", vec![1.0; n])
        .with_field("w", "g", w)
}

#[test]
fn test_unweighted_sum_is_conserved() {
    let ds = GridDataset::fake_random(&FakeDatasetConfig::default());
    let ad = ds.all_data();
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["density"], ["cell_mass"])
        .unweighted()
        .with_n_bins(16);
    let profile = create_profile(&ad, &request, &registry).unwrap();

    let total: f64 = strata_data::FieldSource::values(&ad, "cell_mass")
        .unwrap()
        .values
        .iter()
        .sum();
    let binned: f64 = profile
        .values("cell_mass")
        .unwrap()
        .iter()
        .zip(profile.used())
        .filter(|(_, used)| **used)
        .map(|(v, _)| v)
        .sum();
    assert_eq!(profile.status(), ProfileStatus::Populated);
    assert_approx_eq!(f64, binned, total, epsilon = 1e-9);
    assert_eq!(profile.counts().iter().sum::<u64>() as usize, ds.n_cells());
}

#[test]
fn test_weighted_mean_is_scale_invariant() {
    let table = uniform_table(400, 7);
    let weights: Vec<f64> = strata_data::FieldSource::values(&table, "w")
        .unwrap()
        .values
        .iter()
        .map(|w| w * 3.75)
        .collect();
    let scaled = table.clone().with_field("w", "g", weights);
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["x"], ["y"])
        .with_weight_field("w")
        .with_n_bins(8);

    let a = create_profile(&table, &request, &registry).unwrap();
    let b = create_profile(&scaled, &request, &registry).unwrap();
    assert_eq!(a.used(), b.used());
    for (a, b) in a.values("y").unwrap().iter().zip(b.values("y").unwrap()) {
        assert_approx_eq!(f64, *a, *b, epsilon = 1e-9);
    }
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_fractional_totals_one(#[case] accumulate: bool) {
    let table = uniform_table(300, 11);
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["x"], ["y"])
        .unweighted()
        .with_n_bins(12)
        .with_accumulation(accumulate)
        .with_fractional(true);
    let profile = create_profile(&table, &request, &registry).unwrap();
    let values = profile.values("y").unwrap();
    if accumulate {
        assert_approx_eq!(f64, values[values.len() - 1], 1.0, epsilon = 1e-12);
    } else {
        assert_approx_eq!(f64, values.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }
}

#[rstest]
#[case(Accumulation::Ascending)]
#[case(Accumulation::Descending)]
fn test_accumulation_is_monotone(#[case] direction: Accumulation) {
    let table = uniform_table(300, 13);
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["x"], ["y"])
        .unweighted()
        .with_n_bins(20)
        .with_accumulation_per_axis(vec![direction]);
    let profile = create_profile(&table, &request, &registry).unwrap();
    let values = profile.values("y").unwrap();
    let monotone = match direction {
        Accumulation::Descending => values.windows(2).all(|w| w[0] >= w[1]),
        _ => values.windows(2).all(|w| w[0] <= w[1]),
    };
    assert!(monotone, "{values:?}");
}

#[test]
fn test_2d_accumulation_per_axis() {
    let table = uniform_table(500, 17);
    let registry = UnitRegistry::default();
    let base = ProfileRequest::new(["x", "y"], ["ones"])
        .unweighted()
        .with_n_bins((4, 5))
        .with_log("y", false);
    let plain = create_profile(&table, &base, &registry).unwrap();
    let along_y = create_profile(
        &table,
        &base
            .clone()
            .with_accumulation_per_axis(vec![Accumulation::None, Accumulation::Ascending]),
        &registry,
    )
    .unwrap();

    let raw = plain.values("ones").unwrap();
    let cumulative = along_y.values("ones").unwrap();
    for ix in 0..4 {
        let row_total: f64 = raw[ix * 5..(ix + 1) * 5].iter().sum();
        assert_approx_eq!(f64, cumulative[ix * 5 + 4], row_total);
    }
}

#[test]
fn test_uniform_samples_fill_bins_evenly() {
    let table = uniform_table(1000, 42);
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["x"], ["ones"])
        .unweighted()
        .with_n_bins(10)
        .with_extrema("x", (0.0, 1.0));
    let profile = create_profile(&table, &request, &registry).unwrap();

    let sigma = (1000.0f64 * 0.1 * 0.9).sqrt();
    assert!(profile.used().iter().all(|u| *u));
    for value in profile.values("ones").unwrap() {
        assert!((value - 100.0).abs() <= 3.0 * sigma, "bin holds {value}");
    }
    assert_eq!(profile.values("ones").unwrap().iter().sum::<f64>(), 1000.0);
}

#[test]
fn test_all_zero_on_log_axis() {
    let table = SampleTable::new("zeros")
        .with_field("x", "cm", vec![0.0; 50])
        .with_field("ones", "", vec![1.0; 50]);
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["x"], ["ones"])
        .unweighted()
        .with_n_bins(8)
        .with_extrema("x", (1e-3, 1.0))
        .with_log("x", true);
    let profile = create_profile(&table, &request, &registry).unwrap();
    assert_eq!(profile.status(), ProfileStatus::AllSamplesOutOfRange);
    assert!(profile.values("ones").unwrap().iter().all(|v| *v == 0.0));
    assert!(profile.used().iter().all(|u| !*u));
}

#[test]
fn test_zero_weights_leave_every_bin_unused() {
    let table = SampleTable::new("weightless")
        .with_field("x", "cm", vec![0.1, 0.5, 0.9])
        .with_field("ones", "", vec![1.0; 3])
        .with_field("w", "g", vec![0.0; 3]);
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["x"], ["ones"])
        .with_weight_field("w")
        .with_n_bins(4)
        .with_log("x", false);
    let profile = create_profile(&table, &request, &registry).unwrap();
    assert_eq!(profile.status(), ProfileStatus::ZeroWeight);
    assert_eq!(profile.counts().iter().sum::<u64>(), 3);
    assert!(profile.used().iter().all(|u| !*u));
    assert!(profile.values("ones").unwrap().iter().all(|v| *v == 0.0));
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_narrow_derived_range_is_widened(#[case] log: bool) {
    let one = 1.0f64;
    let values = vec![one, f64::from_bits(one.to_bits() + 1)];
    let table = SampleTable::new("narrow")
        .with_field("x", "cm", values)
        .with_field("ones", "", vec![1.0; 2]);
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["x"], ["ones"])
        .unweighted()
        .with_log("x", log);
    let profile = create_profile(&table, &request, &registry).unwrap();
    assert_eq!(profile.status(), ProfileStatus::Populated);
    let edges = &profile.x_axis().edges;
    assert_eq!(edges.len(), 65);
    assert!(edges.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(profile.counts().iter().sum::<u64>(), 2);
}

#[test]
fn test_empty_selection() {
    let ds = GridDataset::fake_random(&FakeDatasetConfig::default());
    let sp = ds
        .sphere(SphereCenter::Point([0.0, 0.0, 0.0]), 1e-6, "cm")
        .unwrap();
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["density"], ["temperature"]).with_n_bins(4);
    let profile = create_profile(&sp, &request, &registry).unwrap();
    assert_eq!(profile.status(), ProfileStatus::EmptySampleSet);
    assert!(profile.values("temperature").unwrap().iter().all(|v| *v == 0.0));
    assert_eq!(profile.x_axis().edges.len(), 5);
}

#[test]
fn test_region_profile_counts_region_cells() {
    let ds = GridDataset::fake_random(&FakeDatasetConfig::default());
    let region = ds.region([0.5; 3], [0.25; 3], [0.75; 3]);
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["density", "temperature"], ["velocity_x"]).with_n_bins(8);
    let profile = create_profile(&region, &request, &registry).unwrap();
    assert_eq!(profile.shape(), vec![8, 8]);
    assert_eq!(profile.counts().iter().sum::<u64>() as usize, region.len());
    assert_eq!(profile.source_name(), "FakeDataset");
}

#[test]
fn test_unit_overrides_convert_samples() {
    let table = uniform_table(200, 3);
    let registry = UnitRegistry::default();
    let request = ProfileRequest::new(["x"], ["w"])
        .unweighted()
        .with_n_bins(5)
        .with_log("x", false)
        .with_units("x", "m")
        .with_units("w", "kg");
    let profile = create_profile(&table, &request, &registry).unwrap();
    assert_eq!(profile.x_axis().units, "m");
    assert_eq!(profile.value_units("w").unwrap(), "kg");
    assert!(profile.x_axis().extent().1 <= 0.01);

    let total_g: f64 = strata_data::FieldSource::values(&table, "w")
        .unwrap()
        .values
        .iter()
        .sum();
    let total_kg: f64 = profile.values("w").unwrap().iter().sum();
    assert_approx_eq!(f64, total_kg, total_g / 1.0e3, epsilon = 1e-9);
}

#[test]
fn test_request_errors() {
    let table = uniform_table(10, 1);
    let registry = UnitRegistry::default();

    let request = ProfileRequest::new(["x", "y", "w"], ["ones"]);
    assert_eq!(
        create_profile(&table, &request, &registry).unwrap_err(),
        StrataProfileError::InvalidAxisCount(3)
    );

    let request = ProfileRequest::new(["x"], ["y"])
        .with_weight_field("w")
        .with_units("y", "g/cm**3");
    let err = create_profile(&table, &request, &registry).unwrap_err();
    match err {
        StrataProfileError::IncompatibleUnit { field, from, to, .. } => {
            assert_eq!(field, "y");
            assert_eq!(from, "K");
            assert_eq!(to, "g/cm**3");
        }
        other => panic!("unexpected error {other:?}"),
    }
}
