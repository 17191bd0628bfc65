// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading from and writing to measurement set stores.

pub mod error;
pub mod fill;
pub mod store;

use std::ops::Range;

use ndarray::prelude::*;

use crate::{
    built_info::PKG_NAME,
    c32,
    constants::{DEFAULT_PROJECT, DEFAULT_TELESCOPE},
    RADec,
};
pub use error::{FillError, StoreError};
pub use fill::{fill_sky_model, FillOptions};
pub use store::MemoryStore;

cfg_if::cfg_if! {
    if #[cfg(feature = "ms")] {
        pub mod ms;

        pub use ms::CasaMs;
    }
}

/// Values written to the OBSERVATION table of a measurement set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservationInfo {
    pub observer: String,
    pub project: String,
    pub schedule_type: String,
    pub telescope_name: String,
}

impl Default for ObservationInfo {
    fn default() -> Self {
        ObservationInfo {
            observer: PKG_NAME.to_string(),
            project: DEFAULT_PROJECT.to_string(),
            schedule_type: DEFAULT_TELESCOPE.to_string(),
            telescope_name: DEFAULT_TELESCOPE.to_string(),
        }
    }
}

/// The parts of a measurement set needed to model visibilities into it.
///
/// Rows always refer to the main table. Opening a store is left to the
/// implementor's constructor.
pub trait MsStore {
    /// The number of rows in the main table.
    fn num_rows(&self) -> usize;

    /// Read the `UVW` column \[metres\] for `rows`. The returned array has
    /// the shape `[row][3]`.
    fn read_uvws(&mut self, rows: Range<usize>) -> Result<Array2<f64>, StoreError>;

    /// Read the `DATA_DESC_ID` column for `rows`.
    fn read_data_desc_ids(&mut self, rows: Range<usize>) -> Result<Vec<usize>, StoreError>;

    /// The channel frequencies \[Hz\] of every data description, indexed by
    /// data description ID.
    fn read_chan_freqs(&mut self) -> Result<Vec<Vec<f64>>, StoreError>;

    /// The phase centre of the first field.
    fn read_phase_centre(&mut self) -> Result<RADec, StoreError>;

    /// Read a visibility column for `rows`. All rows must have the same
    /// number of channels; the returned array is `[row][channel][pol]`.
    fn read_vis(&mut self, column: &str, rows: Range<usize>) -> Result<Array3<c32>, StoreError>;

    /// Write a `[row][channel][pol]` array of visibilities to a column,
    /// starting at `rows.start`.
    fn write_vis(
        &mut self,
        column: &str,
        rows: Range<usize>,
        vis: ArrayView3<c32>,
    ) -> Result<(), StoreError>;

    /// Write the first row of the OBSERVATION table.
    fn write_observation(&mut self, info: &ObservationInfo) -> Result<(), StoreError>;

    /// Make sure everything written so far has landed in the store.
    fn flush(&mut self) -> Result<(), StoreError>;
}

/// Check that `rows` fits in a main table with `num_rows` rows.
pub(crate) fn check_rows(rows: &Range<usize>, num_rows: usize) -> Result<(), StoreError> {
    if rows.start > rows.end || rows.end > num_rows {
        Err(StoreError::BadRows {
            start: rows.start,
            end: rows.end,
            num_rows,
        })
    } else {
        Ok(())
    }
}
