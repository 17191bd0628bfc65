// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Simulate radio-interferometric measurement sets: make empty ones with
//! `makems`, then fill them with point-source sky-model visibilities.

#[allow(non_camel_case_types)]
pub type c32 = num_complex::Complex<f32>;
#[allow(non_camel_case_types)]
pub type c64 = num_complex::Complex<f64>;

pub mod constants;
pub mod io;
pub mod makems;
pub mod measurement_set;
pub mod model;
pub mod parset;
pub mod pos;

/// Build-time information (package name, version, etc.).
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

use thiserror::Error;

// Re-exports.
pub use io::{fill_sky_model, FillOptions, MemoryStore, MsStore, ObservationInfo};
pub use measurement_set::MeasurementSet;
pub use model::{
    add_model_visibilities, add_point_source_visibility, model_visibilities,
    point_source_visibility, ModelError, PointSource, SkyModel,
};
pub use parset::{Parset, ParsetBuilder, ParsetConfig};
pub use pos::{
    lmn::{LmnRime, LMN},
    radec::{radec_to_lmn, radecs_to_lmns, AsRADec, RADec},
    uvw::UVW,
    CoordError,
};

pub use hifitime;
pub use ndarray;
pub use num_complex;
pub use num_complex::Complex;
pub use rayon;

// If "ms" is enabled, re-export rubbl_casatables here.
cfg_if::cfg_if! {
    if #[cfg(feature = "ms")] {
        pub use io::CasaMs;
        pub use rubbl_casatables;
    }
}

/// Any error this crate can produce.
#[derive(Error, Debug)]
pub enum SimmsError {
    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] io::StoreError),

    #[error(transparent)]
    Fill(#[from] io::FillError),

    #[error(transparent)]
    Parset(#[from] parset::ParsetErrors),

    #[error(transparent)]
    Makems(#[from] makems::MakemsError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[cfg(test)]
#[test]
fn hifitime_works_as_expected() {
    use hifitime::Epoch;

    // makems wants UTC, with millisecond precision.
    let epoch = Epoch::from_gregorian_utc(2020, 6, 1, 12, 30, 59, 999_000_000);
    assert_eq!(epoch.to_gregorian_utc(), (2020, 6, 1, 12, 30, 59, 999_000_000));

    let gps = 1065880128.0;
    let epoch = Epoch::from_gpst_seconds(gps);
    approx::assert_abs_diff_eq!(epoch.to_gpst_seconds(), gps);
}
