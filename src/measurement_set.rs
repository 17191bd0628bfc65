// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Create a simulated measurement set: an empty one from `makems`, then
//! description tables and sky-model visibilities.

use std::path::PathBuf;

use log::{info, warn};

use crate::{
    built_info::{PKG_NAME, PKG_VERSION},
    io::{fill_sky_model, FillError, FillOptions, MsStore, ObservationInfo, StoreError},
    makems::run_makems,
    model::SkyModel,
    parset::Parset,
    SimmsError,
};

/// The phase centre of a store may differ from the parset's by this much
/// \[radians\] before a warning is logged.
const PHASE_CENTRE_TOLERANCE: f64 = 1e-6;

/// A measurement set described by a [`Parset`].
#[derive(Clone, Debug)]
pub struct MeasurementSet {
    parset: Parset,
}

impl MeasurementSet {
    pub fn new(parset: Parset) -> Self {
        MeasurementSet { parset }
    }

    pub fn parset(&self) -> &Parset {
        &self.parset
    }

    /// Where the measurement set is (or will be).
    pub fn path(&self) -> PathBuf {
        self.parset.ms_path()
    }

    /// Write the parset, prepare the antenna table and run `program`
    /// (normally [`crate::constants::MAKEMS_PROGRAM`]) to create an empty
    /// measurement set. Returns the path to the new measurement set.
    pub fn init_empty(&self, program: &str) -> Result<PathBuf, SimmsError> {
        info!("{PKG_NAME} {PKG_VERSION}: creating {}", self.path().display());
        let parset_path = self.parset.write()?;
        self.parset.prepare_antenna_table()?;

        run_makems(program, &parset_path)?.into_result()?;

        info!("Empty MS {} created", self.path().display());
        Ok(self.path())
    }

    /// Open the measurement set made by [`MeasurementSet::init_empty`].
    #[cfg(feature = "ms")]
    pub fn open(&self) -> Result<crate::io::CasaMs, StoreError> {
        crate::io::CasaMs::open(self.path())
    }

    /// An empty measurement set lacks some of the OBSERVATION values that
    /// imagers want; fill them in.
    pub fn add_desc_tables<S: MsStore + ?Sized>(
        &self,
        store: &mut S,
        info: &ObservationInfo,
    ) -> Result<(), StoreError> {
        store.write_observation(info)?;
        store.flush()?;
        info!(
            "OBSERVATION table of {} updated for {} ({})",
            self.path().display(),
            info.telescope_name,
            info.project
        );
        Ok(())
    }

    /// Add the visibilities of a sky model to the store. See
    /// [`fill_sky_model`].
    pub fn add_point_sources<S: MsStore + ?Sized>(
        &self,
        store: &mut S,
        sky_model: &SkyModel,
        options: &FillOptions,
    ) -> Result<usize, FillError> {
        let store_phase_centre = store.read_phase_centre()?;
        if store_phase_centre.separation(self.parset.phase_centre) > PHASE_CENTRE_TOLERANCE {
            warn!(
                "The store is phased to {store_phase_centre}, not the parset's {}; modelling against the store's",
                self.parset.phase_centre
            );
        }
        fill_sky_model(store, sky_model, options)
    }
}
