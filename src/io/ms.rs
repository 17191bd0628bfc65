// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Read and write CASA measurement sets with casacore.

use std::{
    ops::Range,
    path::{Path, PathBuf},
};

use ndarray::prelude::*;
use rubbl_casatables::{Table, TableOpenMode};

use super::{check_rows, MsStore, ObservationInfo, StoreError};
use crate::{c32, RADec};

/// A measurement set on disk, e.g. one made by `makems`.
///
/// The main table stays open for the life of this struct; subtables are
/// opened when they are needed.
pub struct CasaMs {
    /// The path to the root of the measurement set (typically ends in .ms)
    path: PathBuf,

    main_table: Table,
}

impl CasaMs {
    /// Open an existing measurement set for reading and writing.
    pub fn open<T: AsRef<Path>>(path: T) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(StoreError::BadFile(path));
        }
        let main_table = Table::open(&path, TableOpenMode::ReadWrite)?;
        Ok(CasaMs { path, main_table })
    }

    /// The path to the root of the measurement set.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the measurement set. casacore writes anything outstanding when
    /// its tables are closed.
    pub fn finalise(self) -> Result<(), StoreError> {
        drop(self.main_table);
        Ok(())
    }

    fn open_subtable(&self, name: &str, mode: TableOpenMode) -> Result<Table, StoreError> {
        Ok(Table::open(self.path.join(name), mode)?)
    }

    fn check_column(&mut self, column: &str) -> Result<(), StoreError> {
        if self
            .main_table
            .column_names()?
            .iter()
            .any(|name| name == column)
        {
            Ok(())
        } else {
            Err(StoreError::MissingColumn {
                table: self.path.display().to_string(),
                column: column.to_string(),
            })
        }
    }
}

impl MsStore for CasaMs {
    fn num_rows(&self) -> usize {
        self.main_table.n_rows() as usize
    }

    fn read_uvws(&mut self, rows: Range<usize>) -> Result<Array2<f64>, StoreError> {
        check_rows(&rows, self.num_rows())?;
        let mut uvws = Array2::zeros((rows.len(), 3));
        for (mut uvw, row) in uvws.outer_iter_mut().zip(rows) {
            let cell: Vec<f64> = self.main_table.get_cell_as_vec("UVW", row as u64)?;
            if cell.len() != 3 {
                return Err(StoreError::BadArrayShape {
                    argument: "UVW",
                    function: "CasaMs::read_uvws",
                    expected: "[3]".to_string(),
                    received: format!("[{}]", cell.len()),
                });
            }
            uvw.assign(&aview1(&cell));
        }
        Ok(uvws)
    }

    fn read_data_desc_ids(&mut self, rows: Range<usize>) -> Result<Vec<usize>, StoreError> {
        check_rows(&rows, self.num_rows())?;
        rows.map(|row| {
            let value: i32 = self.main_table.get_cell("DATA_DESC_ID", row as u64)?;
            usize::try_from(value).map_err(|_| StoreError::NegativeIndex {
                column: "DATA_DESC_ID",
                row,
                value,
            })
        })
        .collect()
    }

    fn read_chan_freqs(&mut self) -> Result<Vec<Vec<f64>>, StoreError> {
        let mut spw_table = self.open_subtable("SPECTRAL_WINDOW", TableOpenMode::Read)?;
        let spw_freqs = (0..spw_table.n_rows())
            .map(|row| spw_table.get_cell_as_vec::<f64>("CHAN_FREQ", row))
            .collect::<Result<Vec<_>, _>>()?;

        let mut dd_table = self.open_subtable("DATA_DESCRIPTION", TableOpenMode::Read)?;
        let spw_ids: Vec<i32> = dd_table.get_col_as_vec("SPECTRAL_WINDOW_ID")?;
        spw_ids
            .into_iter()
            .enumerate()
            .map(|(ddid, value)| {
                let spw = usize::try_from(value).map_err(|_| StoreError::NegativeIndex {
                    column: "SPECTRAL_WINDOW_ID",
                    row: ddid,
                    value,
                })?;
                spw_freqs
                    .get(spw)
                    .cloned()
                    .ok_or(StoreError::MissingSpectralWindow { ddid, spw })
            })
            .collect()
    }

    fn read_phase_centre(&mut self) -> Result<RADec, StoreError> {
        let mut field_table = self.open_subtable("FIELD", TableOpenMode::Read)?;
        let phase_vec: Vec<f64> = field_table.get_cell_as_vec("PHASE_DIR", 0)?;
        match phase_vec.as_slice() {
            [ra, dec, ..] => Ok(RADec::from_radians(*ra, *dec).validated()?),
            _ => Err(StoreError::BadArrayShape {
                argument: "PHASE_DIR",
                function: "CasaMs::read_phase_centre",
                expected: "[1, 2]".to_string(),
                received: format!("[{}]", phase_vec.len()),
            }),
        }
    }

    fn read_vis(&mut self, column: &str, rows: Range<usize>) -> Result<Array3<c32>, StoreError> {
        check_rows(&rows, self.num_rows())?;
        self.check_column(column)?;

        let mut vis: Option<Array3<c32>> = None;
        for (i_row, row) in rows.clone().enumerate() {
            // The data array is arranged [frequency][instrumental_pol].
            let cell: Array2<c32> = self.main_table.get_cell(column, row as u64)?;
            let vis = vis.get_or_insert_with(|| {
                let (num_chans, num_pols) = cell.dim();
                Array3::zeros((rows.len(), num_chans, num_pols))
            });
            let mut vis_row = vis.index_axis_mut(Axis(0), i_row);
            if vis_row.dim() != cell.dim() {
                return Err(StoreError::BadArrayShape {
                    argument: "rows",
                    function: "CasaMs::read_vis",
                    expected: format!("rows with {:?} cells", vis_row.dim()),
                    received: format!("row {row} with a {:?} cell", cell.dim()),
                });
            }
            vis_row.assign(&cell);
        }
        Ok(vis.unwrap_or_else(|| Array3::zeros((0, 0, 0))))
    }

    fn write_vis(
        &mut self,
        column: &str,
        rows: Range<usize>,
        vis: ArrayView3<c32>,
    ) -> Result<(), StoreError> {
        check_rows(&rows, self.num_rows())?;
        if vis.len_of(Axis(0)) != rows.len() {
            return Err(StoreError::BadArrayShape {
                argument: "vis",
                function: "CasaMs::write_vis",
                expected: format!("[{}, _, _]", rows.len()),
                received: format!("{:?}", vis.shape()),
            });
        }
        self.check_column(column)?;

        for (vis_row, row) in vis.outer_iter().zip(rows) {
            self.main_table
                .put_cell(column, row as u64, &vis_row.to_owned())?;
        }
        Ok(())
    }

    fn write_observation(&mut self, info: &ObservationInfo) -> Result<(), StoreError> {
        let mut obs_table = self.open_subtable("OBSERVATION", TableOpenMode::ReadWrite)?;
        if obs_table.n_rows() == 0 {
            obs_table.add_rows(1)?;
        }
        obs_table.put_cell("OBSERVER", 0, &info.observer)?;
        obs_table.put_cell("PROJECT", 0, &info.project)?;
        obs_table.put_cell("SCHEDULE_TYPE", 0, &info.schedule_type)?;
        obs_table.put_cell("TELESCOPE_NAME", 0, &info.telescope_name)?;
        Ok(())
    }

    /// Subtables are closed as soon as they've been written to, and the main
    /// table is written when it is closed, so there is nothing to do here.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rubbl_casatables::{GlueDataType, TableCreateMode, TableDesc, TableDescCreateMode};
    use tempfile::tempdir;

    fn new_table(path: &Path, name: &str, columns: &[(&str, GlueDataType, bool)], n_rows: usize) {
        let mut desc = TableDesc::new(name, TableDescCreateMode::TDM_SCRATCH).unwrap();
        for &(col_name, data_type, is_array) in columns {
            if is_array {
                desc.add_array_column(data_type, col_name, None, None, false, false)
                    .unwrap();
            } else {
                desc.add_scalar_column(data_type, col_name, None, false, false)
                    .unwrap();
            }
        }
        let mut table = Table::new(path, desc, 0, TableCreateMode::New).unwrap();
        table.add_rows(n_rows).unwrap();
    }

    /// A minimal measurement set: two rows of 3 channels and 2 polarisations
    /// in one spectral window, phased to the north celestial pole.
    fn make_ms(path: &Path) {
        new_table(
            path,
            "",
            &[
                ("UVW", GlueDataType::TpDouble, true),
                ("DATA_DESC_ID", GlueDataType::TpInt, false),
                ("DATA", GlueDataType::TpComplex, true),
            ],
            2,
        );
        new_table(
            &path.join("SPECTRAL_WINDOW"),
            "SPECTRAL_WINDOW",
            &[("CHAN_FREQ", GlueDataType::TpDouble, true)],
            1,
        );
        new_table(
            &path.join("DATA_DESCRIPTION"),
            "DATA_DESCRIPTION",
            &[("SPECTRAL_WINDOW_ID", GlueDataType::TpInt, false)],
            1,
        );
        new_table(
            &path.join("FIELD"),
            "FIELD",
            &[("PHASE_DIR", GlueDataType::TpDouble, true)],
            1,
        );
        new_table(
            &path.join("OBSERVATION"),
            "OBSERVATION",
            &[
                ("OBSERVER", GlueDataType::TpString, false),
                ("PROJECT", GlueDataType::TpString, false),
                ("SCHEDULE_TYPE", GlueDataType::TpString, false),
                ("TELESCOPE_NAME", GlueDataType::TpString, false),
            ],
            0,
        );

        let mut main_table = Table::open(path, TableOpenMode::ReadWrite).unwrap();
        main_table.put_cell("UVW", 0, &vec![10.0, 0.0, 0.0]).unwrap();
        main_table.put_cell("UVW", 1, &vec![0.0, 20.0, 1.0]).unwrap();
        for row in 0..2 {
            main_table.put_cell("DATA_DESC_ID", row, &0_i32).unwrap();
            main_table
                .put_cell("DATA", row, &Array2::<c32>::zeros((3, 2)))
                .unwrap();
        }

        let mut spw_table =
            Table::open(path.join("SPECTRAL_WINDOW"), TableOpenMode::ReadWrite).unwrap();
        spw_table
            .put_cell("CHAN_FREQ", 0, &vec![50e6, 51e6, 52e6])
            .unwrap();
        let mut dd_table =
            Table::open(path.join("DATA_DESCRIPTION"), TableOpenMode::ReadWrite).unwrap();
        dd_table.put_cell("SPECTRAL_WINDOW_ID", 0, &0_i32).unwrap();
        let mut field_table =
            Table::open(path.join("FIELD"), TableOpenMode::ReadWrite).unwrap();
        field_table
            .put_cell("PHASE_DIR", 0, &array![[0.0, std::f64::consts::FRAC_PI_2]])
            .unwrap();
    }

    #[test]
    fn test_open_missing_ms() {
        let dir = tempdir().unwrap();
        let result = CasaMs::open(dir.path().join("nothing.ms"));
        assert!(matches!(result, Err(StoreError::BadFile(_))));
    }

    #[test]
    fn test_open_dir_that_isnt_a_table() {
        let dir = tempdir().unwrap();
        assert!(CasaMs::open(dir.path()).is_err());
    }

    #[test]
    fn test_read_ms() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.ms");
        make_ms(&path);

        let mut ms = CasaMs::open(&path).unwrap();
        assert_eq!(ms.num_rows(), 2);
        assert_eq!(ms.path(), path.as_path());
        assert_eq!(
            ms.read_uvws(0..2).unwrap(),
            array![[10.0, 0.0, 0.0], [0.0, 20.0, 1.0]]
        );
        assert_eq!(ms.read_data_desc_ids(0..2).unwrap(), vec![0, 0]);
        assert_eq!(ms.read_chan_freqs().unwrap(), vec![vec![50e6, 51e6, 52e6]]);
        let phase_centre = ms.read_phase_centre().unwrap();
        assert!((phase_centre.dec - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(ms.read_vis("DATA", 0..2).unwrap().dim(), (2, 3, 2));
        assert!(matches!(
            ms.read_vis("MODEL_DATA", 0..2),
            Err(StoreError::MissingColumn { .. })
        ));
        assert!(matches!(ms.read_uvws(1..3), Err(StoreError::BadRows { .. })));
    }

    #[test]
    fn test_write_ms() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.ms");
        make_ms(&path);

        let vis = Array3::from_shape_fn((1, 3, 2), |(_, c, p)| c32::new(c as f32, p as f32));
        let info = ObservationInfo::default();
        {
            let mut ms = CasaMs::open(&path).unwrap();
            ms.write_vis("DATA", 1..2, vis.view()).unwrap();
            ms.write_observation(&info).unwrap();
            ms.flush().unwrap();
            ms.finalise().unwrap();
        }

        let mut ms = CasaMs::open(&path).unwrap();
        assert_eq!(ms.read_vis("DATA", 1..2).unwrap(), vis);
        assert!(ms
            .read_vis("DATA", 0..1)
            .unwrap()
            .iter()
            .all(|v| *v == c32::default()));

        let mut obs_table = Table::open(path.join("OBSERVATION"), TableOpenMode::Read).unwrap();
        assert_eq!(obs_table.n_rows(), 1);
        let telescope: String = obs_table.get_cell("TELESCOPE_NAME", 0).unwrap();
        assert_eq!(telescope, "NenuFAR");
        let project: String = obs_table.get_cell("PROJECT", 0).unwrap();
        assert_eq!(project, "Fake Data");
    }
}
