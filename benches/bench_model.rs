// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sky-model benchmarks

use criterion::*;
use simms::{
    add_model_visibilities, c64, fill_sky_model, model_visibilities,
    ndarray::{Array2, Array4},
    FillOptions, MemoryStore, PointSource, RADec, SkyModel,
};

fn get_sky_model(num_sources: usize) -> SkyModel {
    (0..num_sources)
        .map(|i| {
            let radec = RADec::from_degrees(i as f64 * 7.0 % 360.0, 60.0 + (i % 30) as f64);
            (format!("source_{i}"), PointSource::new(radec, 1.0 + i as f64))
        })
        .collect()
}

fn model(c: &mut Criterion) {
    let phase_centre = RADec::from_degrees(0.0, 90.0);

    // [timestep][channel][baseline][uvw]; the values are irrelevant.
    let baselines = Array4::from_shape_fn((10, 16, 1770, 3), |(t, c, b, i)| {
        (t + c + b * (i + 1)) as f64 * 0.01
    });
    let sky_model = get_sky_model(20);
    c.bench_function("model_visibilities 20 sources", |b| {
        b.iter(|| model_visibilities(&sky_model, baselines.view(), &phase_centre).unwrap())
    });

    c.bench_function("add_model_visibilities broadcast over 4 pols", |b| {
        let mut vis = Array4::<c64>::zeros((10, 16, 1770, 4));
        b.iter(|| {
            add_model_visibilities(vis.view_mut(), &sky_model, baselines.view(), &phase_centre)
                .unwrap()
        });
    });

    c.bench_function("fill_sky_model 17700 rows", |b| {
        let num_rows = 17700;
        let uvws = Array2::from_shape_fn((num_rows, 3), |(r, i)| ((r * (i + 1)) % 3000) as f64);
        let freqs = (0..16).map(|i| 50e6 + i as f64 * 195312.5).collect();
        let store =
            MemoryStore::new(uvws, vec![0; num_rows], vec![freqs], phase_centre, 4).unwrap();
        let options = FillOptions {
            overwrite: true,
            ..Default::default()
        };
        b.iter_batched(
            || store.clone(),
            |mut store| fill_sky_model(&mut store, &sky_model, &options).unwrap(),
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, model);
criterion_main!(benches);
