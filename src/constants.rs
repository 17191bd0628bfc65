// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Useful constants.

/// Speed of light \[metres/second\]
pub const VEL_C: f64 = 299_792_458.0;

/// The name of the file that parsets are written to.
pub const PARSET_FILENAME: &str = "makems.cfg";

/// The program invoked to create empty measurement sets.
pub const MAKEMS_PROGRAM: &str = "makems";

/// The default measurement set name.
pub const DEFAULT_MS_NAME: &str = "noname.ms";

/// Default phase centre right ascension \[degrees\]
pub const DEFAULT_RA_DEG: f64 = 0.0;
/// Default phase centre declination \[degrees\]; the north celestial pole.
pub const DEFAULT_DEC_DEG: f64 = 90.0;

/// Default start frequency \[Hz\]
pub const DEFAULT_START_FREQ_HZ: f64 = 50e6;
/// Default channel width \[Hz\]
pub const DEFAULT_FREQ_STEP_HZ: f64 = 195312.5;
/// Default number of channels
pub const DEFAULT_NUM_FREQS: usize = 16;
/// Default number of spectral windows ("bands")
pub const DEFAULT_NUM_BANDS: usize = 16;
/// Default integration time \[seconds\]
pub const DEFAULT_TIME_STEP_S: f64 = 1.0;
/// Default number of timesteps
pub const DEFAULT_NUM_TIMES: usize = 10;

/// The visibility column filled with modelled visibilities by default.
pub const DEFAULT_VIS_COLUMN: &str = "DATA";
/// Number of main-table rows read, modelled and written at a time.
pub const DEFAULT_CHUNK_ROWS: usize = 10_000;

/// Default telescope name written to the OBSERVATION table.
pub const DEFAULT_TELESCOPE: &str = "NenuFAR";
/// Default project name written to the OBSERVATION table.
pub const DEFAULT_PROJECT: &str = "Fake Data";
