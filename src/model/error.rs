// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all sky-model-related errors.

use thiserror::Error;

use crate::pos::CoordError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error("bad array shape supplied to argument {argument} of function {function}. expected {expected}, received {received}")]
    ShapeMismatch {
        argument: &'static str,
        function: &'static str,
        expected: String,
        received: String,
    },

    /// A single source of a sky model couldn't be modelled.
    #[error("Couldn't model source '{name}': {err}")]
    Source {
        name: String,
        #[source]
        err: CoordError,
    },
}
