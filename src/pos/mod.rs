// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Super module for all positional code.

pub mod lmn;
pub mod radec;
pub mod uvw;

use thiserror::Error;

/// Errors from converting sky positions into interferometric coordinates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordError {
    /// The supplied value could not be read as a (RA, Dec) pair.
    #[error("Invalid sky coordinate: {reason}")]
    InvalidCoordinate { reason: String },

    /// The direction cosines don't describe a point in the visible hemisphere
    /// of the phase centre.
    #[error("Source is below the horizon of the phase centre (l = {l}, m = {m}, 1 - l^2 - m^2 = {radicand:e}, geometric n = {n_geometric:e})")]
    Domain {
        l: f64,
        m: f64,
        radicand: f64,
        n_geometric: f64,
    },
}
