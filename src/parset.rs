// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parsets (key/value configuration files) for `makems`, the program that
//! creates empty measurement sets.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use hifitime::{Duration, Epoch, Unit};
use itertools::Itertools;
use log::{debug, info};
use tar::Archive;
use thiserror::Error;

use crate::{
    constants::*,
    pos::{radec::AsRADec, CoordError},
    RADec,
};

const ARCHIVE_EXTENSIONS: [&str; 2] = [".tar.gz", ".tgz"];

/// Something wrong with the parameters given to a [`ParsetBuilder`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsetProblem {
    #[error("Measurement set name '{name}' is not valid: {reason}")]
    BadMsName { name: String, reason: &'static str },

    #[error("Save path {0} is not an existing directory")]
    SavePathNotDir(PathBuf),

    #[error("No antenna table was given")]
    NoAntennaTable,

    #[error("Antenna table {0} does not exist")]
    AntennaTableNotFound(PathBuf),

    #[error("Antenna table {0} is neither a directory nor a .tar.gz/.tgz archive")]
    BadAntennaTable(PathBuf),

    #[error("The number of channels ({num_freqs}) is not divisible by the number of bands ({num_bands})")]
    FreqsNotDivisible { num_freqs: usize, num_bands: usize },

    #[error("{count} start frequencies were given; there must be 1 or one per band ({num_bands})")]
    BadStartFreqCount { count: usize, num_bands: usize },

    #[error("Phase centre is not valid: {0}")]
    InvalidPhaseCentre(CoordError),

    #[error("{0} must be greater than zero")]
    ZeroCount(&'static str),

    #[error("No start time was given")]
    NoStartTime,

    #[error("Couldn't parse start time '{0}'")]
    BadStartTime(String),
}

/// Every problem found when building a [`Parset`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Parameters are not valid for makems: {}", .0.iter().join("; "))]
pub struct ParsetErrors(pub Vec<ParsetProblem>);

/// Where `makems` gets its antenna table from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AntennaTable {
    /// An existing table.
    Dir(PathBuf),

    /// A gzipped tarball holding a single table directory with the same name
    /// as the archive (minus its extension).
    Archive(PathBuf),
}

/// Collects the parameters of a [`Parset`]. Only the start time and antenna
/// table have no defaults.
#[derive(Clone, Debug)]
pub struct ParsetBuilder {
    ms_name: String,
    save_path: PathBuf,
    antenna_table: Option<PathBuf>,
    ra_deg: f64,
    dec_deg: f64,
    start_freqs_hz: Vec<f64>,
    freq_step_hz: f64,
    num_freqs: usize,
    num_bands: usize,
    start_time: Option<Epoch>,
    time_step: Duration,
    num_times: usize,

    /// Problems found before [`ParsetBuilder::build`] was called.
    problems: Vec<ParsetProblem>,
}

impl Default for ParsetBuilder {
    fn default() -> Self {
        ParsetBuilder {
            ms_name: DEFAULT_MS_NAME.to_string(),
            save_path: PathBuf::from("."),
            antenna_table: None,
            ra_deg: DEFAULT_RA_DEG,
            dec_deg: DEFAULT_DEC_DEG,
            start_freqs_hz: vec![DEFAULT_START_FREQ_HZ],
            freq_step_hz: DEFAULT_FREQ_STEP_HZ,
            num_freqs: DEFAULT_NUM_FREQS,
            num_bands: DEFAULT_NUM_BANDS,
            start_time: None,
            time_step: Duration::from_f64(DEFAULT_TIME_STEP_S, Unit::Second),
            num_times: DEFAULT_NUM_TIMES,
            problems: vec![],
        }
    }
}

impl ParsetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The measurement set file name, e.g. "sim.ms". It is created inside
    /// the save path.
    pub fn ms_name(mut self, ms_name: &str) -> Self {
        self.ms_name = ms_name.to_string();
        self
    }

    /// The directory the parset and measurement set are written to.
    pub fn save_path<T: AsRef<Path>>(mut self, save_path: T) -> Self {
        self.save_path = save_path.as_ref().to_path_buf();
        self
    }

    /// A table directory, or a .tar.gz/.tgz archive of one that is unpacked
    /// into the save path.
    pub fn antenna_table<T: AsRef<Path>>(mut self, antenna_table: T) -> Self {
        self.antenna_table = Some(antenna_table.as_ref().to_path_buf());
        self
    }

    /// The phase centre \[degrees\].
    pub fn phase_centre(mut self, ra_deg: f64, dec_deg: f64) -> Self {
        self.ra_deg = ra_deg;
        self.dec_deg = dec_deg;
        self
    }

    /// The frequency of the first channel of each band \[Hz\]. A single
    /// frequency means the bands are contiguous.
    pub fn start_freqs_hz(mut self, start_freqs_hz: Vec<f64>) -> Self {
        self.start_freqs_hz = start_freqs_hz;
        self
    }

    /// The channel width \[Hz\]
    pub fn freq_step_hz(mut self, freq_step_hz: f64) -> Self {
        self.freq_step_hz = freq_step_hz;
        self
    }

    /// The total number of channels, across all bands.
    pub fn num_freqs(mut self, num_freqs: usize) -> Self {
        self.num_freqs = num_freqs;
        self
    }

    pub fn num_bands(mut self, num_bands: usize) -> Self {
        self.num_bands = num_bands;
        self
    }

    pub fn start_time(mut self, start_time: Epoch) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Set the start time from a string like "2021-03-04T05:06:07 UTC".
    pub fn start_time_str(mut self, start_time: &str) -> Self {
        match Epoch::from_gregorian_str(start_time) {
            Ok(epoch) => self.start_time = Some(epoch),
            Err(_) => self
                .problems
                .push(ParsetProblem::BadStartTime(start_time.to_string())),
        }
        self
    }

    pub fn time_step(mut self, time_step: Duration) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn num_times(mut self, num_times: usize) -> Self {
        self.num_times = num_times;
        self
    }

    /// Check everything and make a [`Parset`]. All problems are reported,
    /// not just the first.
    pub fn build(self) -> Result<Parset, ParsetErrors> {
        let mut problems = self.problems;

        if Path::new(&self.ms_name).file_name().and_then(|n| n.to_str())
            != Some(self.ms_name.as_str())
        {
            problems.push(ParsetProblem::BadMsName {
                name: self.ms_name.clone(),
                reason: "only provide the file name; the directory is the save path",
            });
        } else if !self.ms_name.ends_with(".ms") {
            problems.push(ParsetProblem::BadMsName {
                name: self.ms_name.clone(),
                reason: "the name must end with .ms",
            });
        }

        let save_path = match self.save_path.canonicalize() {
            Ok(p) if p.is_dir() => Some(p),
            _ => {
                problems.push(ParsetProblem::SavePathNotDir(self.save_path.clone()));
                None
            }
        };

        let antenna_table = match self.antenna_table {
            None => {
                problems.push(ParsetProblem::NoAntennaTable);
                None
            }
            Some(p) if !p.exists() => {
                problems.push(ParsetProblem::AntennaTableNotFound(p));
                None
            }
            Some(p) if p.is_dir() => Some(AntennaTable::Dir(p)),
            Some(p) if archive_stem(&p).is_some() => Some(AntennaTable::Archive(p)),
            Some(p) => {
                problems.push(ParsetProblem::BadAntennaTable(p));
                None
            }
        };

        let phase_centre = match (self.ra_deg, self.dec_deg).as_radec() {
            Ok(radec) => Some(radec),
            Err(e) => {
                problems.push(ParsetProblem::InvalidPhaseCentre(e));
                None
            }
        };

        for (name, count) in [
            ("NFrequencies", self.num_freqs),
            ("NBands", self.num_bands),
            ("NTimes", self.num_times),
        ] {
            if count == 0 {
                problems.push(ParsetProblem::ZeroCount(name));
            }
        }
        if self.num_bands != 0 && self.num_freqs % self.num_bands != 0 {
            problems.push(ParsetProblem::FreqsNotDivisible {
                num_freqs: self.num_freqs,
                num_bands: self.num_bands,
            });
        }
        if self.start_freqs_hz.len() != 1 && self.start_freqs_hz.len() != self.num_bands {
            problems.push(ParsetProblem::BadStartFreqCount {
                count: self.start_freqs_hz.len(),
                num_bands: self.num_bands,
            });
        }

        if self.start_time.is_none()
            && !problems
                .iter()
                .any(|p| matches!(p, ParsetProblem::BadStartTime(_)))
        {
            problems.push(ParsetProblem::NoStartTime);
        }

        match (save_path, antenna_table, phase_centre, self.start_time) {
            (Some(save_path), Some(antenna_table), Some(phase_centre), Some(start_time))
                if problems.is_empty() =>
            {
                Ok(Parset {
                    ms_name: self.ms_name,
                    save_path,
                    antenna_table,
                    phase_centre,
                    start_freqs_hz: self.start_freqs_hz,
                    freq_step_hz: self.freq_step_hz,
                    num_freqs: self.num_freqs,
                    num_bands: self.num_bands,
                    start_time,
                    time_step: self.time_step,
                    num_times: self.num_times,
                })
            }
            _ => Err(ParsetErrors(problems)),
        }
    }
}

/// Validated parameters for `makems`. Made with a [`ParsetBuilder`].
#[derive(Clone, Debug, PartialEq)]
pub struct Parset {
    pub ms_name: String,
    /// An absolute path.
    pub save_path: PathBuf,
    pub antenna_table: AntennaTable,
    pub phase_centre: RADec,
    pub start_freqs_hz: Vec<f64>,
    pub freq_step_hz: f64,
    pub num_freqs: usize,
    pub num_bands: usize,
    pub start_time: Epoch,
    pub time_step: Duration,
    pub num_times: usize,
}

impl Parset {
    /// Where the measurement set will be.
    pub fn ms_path(&self) -> PathBuf {
        self.save_path.join(&self.ms_name)
    }

    /// Where the parset is written.
    pub fn parset_path(&self) -> PathBuf {
        self.save_path.join(PARSET_FILENAME)
    }

    /// The antenna table `makems` reads. Archives are unpacked into the save
    /// path (see [`Parset::prepare_antenna_table`]).
    pub fn antenna_table_path(&self) -> PathBuf {
        match &self.antenna_table {
            AntennaTable::Dir(p) => p.clone(),
            AntennaTable::Archive(p) => match archive_stem(p) {
                Some(stem) => self.save_path.join(stem),
                None => p.clone(),
            },
        }
    }

    /// Render the parset in the `key = value` form that `makems` reads.
    pub fn to_config_string(&self) -> String {
        let (year, month, day, hour, minute, second, nanos) = self.start_time.to_gregorian_utc();
        let start_time = format!(
            "{year:04}-{month:02}-{day:02}/{hour:02}:{minute:02}:{second:02}.{:03}",
            nanos / 1_000_000
        );

        let entries = [
            ("MSName", self.ms_path().display().to_string()),
            ("VDSPath", self.save_path.display().to_string()),
            (
                "AntennaTableName",
                self.antenna_table_path().display().to_string(),
            ),
            ("WriteImagerColumns", "T".to_string()),
            ("WriteAutoCorr", "T".to_string()),
            ("Declination", format!("{:?}rad", self.phase_centre.dec)),
            ("RightAscension", format!("{:?}rad", self.phase_centre.ra)),
            ("StartFreq", format!("{:?}", self.start_freqs_hz)),
            ("StepFreq", format!("{:?}", self.freq_step_hz)),
            ("NFrequencies", self.num_freqs.to_string()),
            ("NBands", self.num_bands.to_string()),
            ("StartTime", start_time),
            ("StepTime", format!("{:?}", self.time_step.to_seconds())),
            ("NTimes", self.num_times.to_string()),
        ];
        entries
            .iter()
            .map(|(key, value)| format!("{key} = {value}\n"))
            .collect()
    }

    /// Write the parset into the save path. Returns the path written to.
    pub fn write(&self) -> Result<PathBuf, std::io::Error> {
        let path = self.parset_path();
        std::fs::write(&path, self.to_config_string())?;
        info!("Parset {} written", path.display());
        Ok(path)
    }

    /// Make sure the antenna table exists, unpacking it into the save path if
    /// it's an archive. Returns the path to the table.
    pub fn prepare_antenna_table(&self) -> Result<PathBuf, std::io::Error> {
        let table_path = self.antenna_table_path();
        if let AntennaTable::Archive(archive_path) = &self.antenna_table {
            debug!(
                "Unpacking {} into {}",
                archive_path.display(),
                self.save_path.display()
            );
            let tar = GzDecoder::new(File::open(archive_path)?);
            let mut archive = Archive::new(tar);
            archive.unpack(&self.save_path)?;
            if !table_path.is_dir() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!(
                        "{} did not contain {}",
                        archive_path.display(),
                        table_path.display()
                    ),
                ));
            }
            info!("Antenna table {} created", table_path.display());
        }
        Ok(table_path)
    }
}

/// The file name of an antenna table archive without its extension, if the
/// path is an archive.
fn archive_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    ARCHIVE_EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .filter(|stem| !stem.is_empty())
        .map(|stem| stem.to_string())
}

/// Parset parameters as they might appear in a config file. Anything missing
/// takes the [`ParsetBuilder`] default.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ParsetConfig {
    pub ms_name: Option<String>,
    pub save_path: Option<PathBuf>,
    pub antenna_table: Option<PathBuf>,
    pub ra_deg: Option<f64>,
    pub dec_deg: Option<f64>,
    pub start_freqs_hz: Option<Vec<f64>>,
    pub freq_step_hz: Option<f64>,
    pub num_freqs: Option<usize>,
    pub num_bands: Option<usize>,
    /// e.g. "2021-03-04T05:06:07 UTC"
    pub start_time: Option<String>,
    /// \[seconds\]
    pub time_step_s: Option<f64>,
    pub num_times: Option<usize>,
}

impl ParsetConfig {
    pub fn into_builder(self) -> ParsetBuilder {
        let mut builder = ParsetBuilder::new();
        if let Some(ms_name) = self.ms_name {
            builder = builder.ms_name(&ms_name);
        }
        if let Some(save_path) = self.save_path {
            builder = builder.save_path(save_path);
        }
        if let Some(antenna_table) = self.antenna_table {
            builder = builder.antenna_table(antenna_table);
        }
        builder = builder.phase_centre(
            self.ra_deg.unwrap_or(DEFAULT_RA_DEG),
            self.dec_deg.unwrap_or(DEFAULT_DEC_DEG),
        );
        if let Some(start_freqs_hz) = self.start_freqs_hz {
            builder = builder.start_freqs_hz(start_freqs_hz);
        }
        if let Some(freq_step_hz) = self.freq_step_hz {
            builder = builder.freq_step_hz(freq_step_hz);
        }
        if let Some(num_freqs) = self.num_freqs {
            builder = builder.num_freqs(num_freqs);
        }
        if let Some(num_bands) = self.num_bands {
            builder = builder.num_bands(num_bands);
        }
        if let Some(start_time) = self.start_time {
            builder = builder.start_time_str(&start_time);
        }
        if let Some(time_step_s) = self.time_step_s {
            builder = builder.time_step(Duration::from_f64(time_step_s, Unit::Second));
        }
        if let Some(num_times) = self.num_times {
            builder = builder.num_times(num_times);
        }
        builder
    }
}
