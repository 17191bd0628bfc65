// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading and writing measurement set stores.

use std::path::PathBuf;

use thiserror::Error;

use crate::{model::ModelError, pos::CoordError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Column {column} does not exist in table {table}")]
    MissingColumn { table: String, column: String },

    #[error("Tried to access rows {start}..{end}, but the main table only has {num_rows} rows")]
    BadRows {
        start: usize,
        end: usize,
        num_rows: usize,
    },

    #[error("bad array shape supplied to argument {argument} of function {function}. expected {expected}, received {received}")]
    BadArrayShape {
        argument: &'static str,
        function: &'static str,
        expected: String,
        received: String,
    },

    #[error("Supplied file path {0} does not exist or is not readable!")]
    BadFile(PathBuf),

    #[error("Data description {ddid} refers to spectral window {spw}, which doesn't exist")]
    MissingSpectralWindow { ddid: usize, spw: usize },

    #[error("Found a negative value ({value}) in column {column} at row {row}")]
    NegativeIndex {
        column: &'static str,
        row: usize,
        value: i32,
    },

    #[error("Main table row {row} refers to data description {ddid}, but there are only {num_ddids}")]
    MissingDataDescription {
        row: usize,
        ddid: usize,
        num_ddids: usize,
    },

    #[error("Column {column} has {num_chans} channels at row {row}, but data description {ddid} has {num_freqs} channel frequencies")]
    ChannelMismatch {
        column: String,
        row: usize,
        ddid: usize,
        num_chans: usize,
        num_freqs: usize,
    },

    #[error("The FIELD table doesn't contain a usable phase centre: {0}")]
    BadPhaseCentre(#[from] CoordError),

    #[cfg(feature = "ms")]
    #[error("Error when trying to interface with measurement set: {0}")]
    Table(#[from] rubbl_casatables::TableError),

    #[cfg(feature = "ms")]
    #[error("Error from casacore: {0}")]
    Casacore(#[from] rubbl_casatables::CasacoreError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// Errors that can occur while filling a visibility column with a sky model.
#[derive(Error, Debug)]
pub enum FillError {
    #[error("Chunks must contain at least one row")]
    ZeroChunkRows,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
