// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fill the visibilities of a measurement set with a sky model.

use std::ops::Range;

use itertools::Itertools;
use log::{debug, info};
use ndarray::prelude::*;

use super::{FillError, MsStore, StoreError};
use crate::{
    c32, c64,
    constants::{DEFAULT_CHUNK_ROWS, DEFAULT_VIS_COLUMN},
    model::{add_model_visibilities, ModelError, SkyModel},
    pos::radec::radec_to_lmn,
    RADec, UVW,
};

/// How a sky model is written into a store.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FillOptions {
    /// The visibility column to fill.
    pub column: String,

    /// The number of main-table rows held in memory at once.
    pub chunk_rows: usize,

    /// Replace what's in the column rather than adding to it.
    pub overwrite: bool,
}

impl Default for FillOptions {
    fn default() -> Self {
        FillOptions {
            column: DEFAULT_VIS_COLUMN.to_string(),
            chunk_rows: DEFAULT_CHUNK_ROWS,
            overwrite: false,
        }
    }
}

/// Add the visibilities of every source in `sky_model` to a column of
/// `store`, phased to the store's phase centre. Every polarisation of a
/// visibility gets the same (unpolarised) model.
///
/// Before anything is written, every source is checked against the phase
/// centre, every row's data description is checked against the spectral
/// windows, and the column's channel count is checked for the first row of
/// each data description. Returns the number of rows filled.
pub fn fill_sky_model<S: MsStore + ?Sized>(
    store: &mut S,
    sky_model: &SkyModel,
    options: &FillOptions,
) -> Result<usize, FillError> {
    if options.chunk_rows == 0 {
        return Err(FillError::ZeroChunkRows);
    }

    let phase_centre = store.read_phase_centre()?;
    let chan_freqs = store.read_chan_freqs()?;
    for (name, src) in sky_model.iter() {
        radec_to_lmn(&src.radec, &phase_centre).map_err(|err| ModelError::Source {
            name: name.clone(),
            err,
        })?;
        debug!(
            "{name}: {} Jy at {}, {:.3}° from the phase centre",
            src.flux,
            src.radec,
            src.radec.separation(phase_centre).to_degrees()
        );
    }

    let num_rows = store.num_rows();
    let all_ddids = store.read_data_desc_ids(0..num_rows)?;
    check_data_descs(store, &options.column, &all_ddids, &chan_freqs)?;

    for chunk_start in (0..num_rows).step_by(options.chunk_rows) {
        let chunk = chunk_start..(chunk_start + options.chunk_rows).min(num_rows);
        debug!("Modelling rows {}..{}", chunk.start, chunk.end);
        let uvws = store.read_uvws(chunk.clone())?;
        let ddids = &all_ddids[chunk.clone()];

        // Rows with different data descriptions may have different channels,
        // so model each contiguous run separately.
        let mut run_start = 0;
        for (ddid, run) in &ddids.iter().copied().group_by(|&ddid| ddid) {
            let run_len = run.count();
            let rows = chunk.start + run_start..chunk.start + run_start + run_len;
            let freqs = chan_freqs
                .get(ddid)
                .ok_or(StoreError::MissingDataDescription {
                    row: rows.start,
                    ddid,
                    num_ddids: chan_freqs.len(),
                })?;
            fill_rows(
                store,
                sky_model,
                phase_centre,
                options,
                rows,
                uvws.slice(s![run_start..run_start + run_len, ..]),
                freqs,
            )?;
            run_start += run_len;
        }
    }
    store.flush()?;

    info!(
        "Filled {num_rows} rows of {} with {} sources ({} Jy total)",
        options.column,
        sky_model.len(),
        sky_model.total_flux()
    );
    Ok(num_rows)
}

/// Every data description ID must have channel frequencies, and the first
/// row using it must have a cell with that many channels in `column`.
fn check_data_descs<S: MsStore + ?Sized>(
    store: &mut S,
    column: &str,
    ddids: &[usize],
    chan_freqs: &[Vec<f64>],
) -> Result<(), StoreError> {
    let mut checked = vec![false; chan_freqs.len()];
    for (row, &ddid) in ddids.iter().enumerate() {
        let freqs = chan_freqs
            .get(ddid)
            .ok_or(StoreError::MissingDataDescription {
                row,
                ddid,
                num_ddids: chan_freqs.len(),
            })?;
        if checked[ddid] {
            continue;
        }
        let num_chans = store.read_vis(column, row..row + 1)?.len_of(Axis(1));
        if num_chans != freqs.len() {
            return Err(StoreError::ChannelMismatch {
                column: column.to_string(),
                row,
                ddid,
                num_chans,
                num_freqs: freqs.len(),
            });
        }
        checked[ddid] = true;
    }
    Ok(())
}

/// Model a run of rows that share their channel frequencies.
fn fill_rows<S: MsStore + ?Sized>(
    store: &mut S,
    sky_model: &SkyModel,
    phase_centre: RADec,
    options: &FillOptions,
    rows: Range<usize>,
    uvws: ArrayView2<f64>,
    freqs: &[f64],
) -> Result<(), FillError> {
    let vis = store.read_vis(&options.column, rows.clone())?;

    // [row][chan][uvw], in wavelengths.
    let mut baselines = Array3::zeros((uvws.len_of(Axis(0)), freqs.len(), 3));
    for (mut row_baselines, uvw) in baselines.outer_iter_mut().zip(uvws.outer_iter()) {
        let uvw = UVW::from([uvw[0], uvw[1], uvw[2]]);
        for (mut baseline, &freq) in row_baselines.outer_iter_mut().zip(freqs) {
            baseline.assign(&aview1(&uvw.to_wavelengths(freq).to_array()));
        }
    }

    let mut model: Array3<c64> = if options.overwrite {
        Array3::zeros(vis.raw_dim())
    } else {
        vis.mapv(|v| c64::new(v.re.into(), v.im.into()))
    };
    add_model_visibilities(model.view_mut(), sky_model, baselines.view(), &phase_centre)?;

    let vis = model.mapv(|v| c32::new(v.re as f32, v.im as f32));
    store.write_vis(&options.column, rows, vis.view())?;
    Ok(())
}
