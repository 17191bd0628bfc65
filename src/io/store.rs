// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An in-memory measurement set.

use std::ops::Range;

use indexmap::IndexMap;
use ndarray::prelude::*;

use super::{check_rows, MsStore, ObservationInfo, StoreError};
use crate::{c32, RADec};

/// The visibility columns `makems` writes when asked for imager columns.
const DEFAULT_COLUMNS: [&str; 3] = ["DATA", "MODEL_DATA", "CORRECTED_DATA"];

/// A measurement set held entirely in memory. Visibility cells are stored per
/// row, as casacore does, so rows in different spectral windows may have
/// different numbers of channels.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// `[row][3]` \[metres\]
    uvws: Array2<f64>,
    data_desc_ids: Vec<usize>,
    /// Indexed by data description ID.
    chan_freqs: Vec<Vec<f64>>,
    phase_centre: RADec,
    num_pols: usize,
    columns: IndexMap<String, Vec<Array2<c32>>>,
    observation: Option<ObservationInfo>,
}

impl MemoryStore {
    /// Create a new store with zeroed `DATA`, `MODEL_DATA` and
    /// `CORRECTED_DATA` columns.
    ///
    /// - `uvws` - `[row][3]` baselines \[metres\]
    /// - `data_desc_ids` - the data description of every row
    /// - `chan_freqs` - the channel frequencies \[Hz\] of every data
    ///   description
    /// - `phase_centre` - the phase centre of the only field
    /// - `num_pols` - the number of polarisations of every visibility
    pub fn new(
        uvws: Array2<f64>,
        data_desc_ids: Vec<usize>,
        chan_freqs: Vec<Vec<f64>>,
        phase_centre: RADec,
        num_pols: usize,
    ) -> Result<Self, StoreError> {
        if uvws.len_of(Axis(1)) != 3 || uvws.len_of(Axis(0)) != data_desc_ids.len() {
            return Err(StoreError::BadArrayShape {
                argument: "uvws",
                function: "MemoryStore::new",
                expected: format!("[{}, 3]", data_desc_ids.len()),
                received: format!("{:?}", uvws.shape()),
            });
        }
        if let Some((row, &ddid)) = data_desc_ids
            .iter()
            .enumerate()
            .find(|&(_, &ddid)| ddid >= chan_freqs.len())
        {
            return Err(StoreError::MissingDataDescription {
                row,
                ddid,
                num_ddids: chan_freqs.len(),
            });
        }

        let mut store = MemoryStore {
            uvws,
            data_desc_ids,
            chan_freqs,
            phase_centre,
            num_pols,
            columns: IndexMap::new(),
            observation: None,
        };
        for column in DEFAULT_COLUMNS {
            store.add_column(column);
        }
        Ok(store)
    }

    /// Add a zeroed visibility column, replacing any existing column with the
    /// same name.
    pub fn add_column(&mut self, name: &str) {
        let cells = self
            .data_desc_ids
            .iter()
            .map(|&ddid| Array2::zeros((self.chan_freqs[ddid].len(), self.num_pols)))
            .collect();
        self.columns.insert(name.to_string(), cells);
    }

    /// The cells of a visibility column, one `[channel][pol]` array per row.
    pub fn column(&self, name: &str) -> Option<&[Array2<c32>]> {
        self.columns.get(name).map(|cells| cells.as_slice())
    }

    /// What was last written to the OBSERVATION table, if anything.
    pub fn observation(&self) -> Option<&ObservationInfo> {
        self.observation.as_ref()
    }

    /// Done with the store. Nothing needs to be written anywhere.
    pub fn finalise(self) -> Result<(), StoreError> {
        Ok(())
    }

    fn cells_mut(&mut self, column: &str) -> Result<&mut [Array2<c32>], StoreError> {
        self.columns
            .get_mut(column)
            .map(|cells| cells.as_mut_slice())
            .ok_or_else(|| missing_column(column))
    }
}

fn missing_column(column: &str) -> StoreError {
    StoreError::MissingColumn {
        table: "main".to_string(),
        column: column.to_string(),
    }
}

impl MsStore for MemoryStore {
    fn num_rows(&self) -> usize {
        self.data_desc_ids.len()
    }

    fn read_uvws(&mut self, rows: Range<usize>) -> Result<Array2<f64>, StoreError> {
        check_rows(&rows, self.num_rows())?;
        Ok(self.uvws.slice(s![rows, ..]).to_owned())
    }

    fn read_data_desc_ids(&mut self, rows: Range<usize>) -> Result<Vec<usize>, StoreError> {
        check_rows(&rows, self.num_rows())?;
        Ok(self.data_desc_ids[rows].to_vec())
    }

    fn read_chan_freqs(&mut self) -> Result<Vec<Vec<f64>>, StoreError> {
        Ok(self.chan_freqs.clone())
    }

    fn read_phase_centre(&mut self) -> Result<RADec, StoreError> {
        Ok(self.phase_centre)
    }

    fn read_vis(&mut self, column: &str, rows: Range<usize>) -> Result<Array3<c32>, StoreError> {
        check_rows(&rows, self.num_rows())?;
        let cells = &self
            .column(column)
            .ok_or_else(|| missing_column(column))?[rows];
        let cell_shape = cells.first().map_or((0, self.num_pols), |cell| cell.dim());

        let mut vis = Array3::zeros((cells.len(), cell_shape.0, cell_shape.1));
        for (mut vis_row, cell) in vis.outer_iter_mut().zip(cells) {
            if cell.dim() != cell_shape {
                return Err(StoreError::BadArrayShape {
                    argument: "rows",
                    function: "MemoryStore::read_vis",
                    expected: format!("rows with {cell_shape:?} cells"),
                    received: format!("a row with a {:?} cell", cell.dim()),
                });
            }
            vis_row.assign(cell);
        }
        Ok(vis)
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
                function: "MemoryStore::write_vis",
                expected: format!("[{}, _, _]", rows.len()),
                received: format!("{:?}", vis.shape()),
            });
        }

        let cells = &mut self.cells_mut(column)?[rows];
        // Nothing is written unless every row fits.
        if let Some(cell) = cells
            .iter()
            .zip(vis.outer_iter())
            .find_map(|(cell, vis_row)| (cell.dim() != vis_row.dim()).then_some(cell))
        {
            return Err(StoreError::BadArrayShape {
                argument: "vis",
                function: "MemoryStore::write_vis",
                expected: format!("[_, {}, {}]", cell.nrows(), cell.ncols()),
                received: format!("{:?}", vis.shape()),
            });
        }
        for (cell, vis_row) in cells.iter_mut().zip(vis.outer_iter()) {
            cell.assign(&vis_row);
        }
        Ok(())
    }

    fn write_observation(&mut self, info: &ObservationInfo) -> Result<(), StoreError> {
        self.observation = Some(info.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_store() -> MemoryStore {
        // Two rows in a 3-channel window, one row in a 2-channel window.
        MemoryStore::new(
            array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]],
            vec![0, 0, 1],
            vec![vec![50e6, 51e6, 52e6], vec![60e6, 61e6]],
            RADec::from_degrees(0.0, 90.0),
            4,
        )
        .unwrap()
    }

    #[test]
    fn test_new_makes_imager_columns() {
        let store = get_store();
        assert_eq!(store.num_rows(), 3);
        for name in DEFAULT_COLUMNS {
            let column = store.column(name).unwrap();
            assert_eq!(column.len(), 3);
            assert_eq!(column[0].dim(), (3, 4));
            assert_eq!(column[2].dim(), (2, 4));
        }
        assert!(store.column("WEIGHT_SPECTRUM").is_none());
        assert!(store.observation().is_none());
    }

    #[test]
    fn test_new_bad_uvws() {
        let result = MemoryStore::new(
            Array2::zeros((2, 2)),
            vec![0, 0],
            vec![vec![50e6]],
            RADec::default(),
            1,
        );
        assert!(matches!(
            result,
            Err(StoreError::BadArrayShape {
                argument: "uvws",
                ..
            })
        ));

        let result = MemoryStore::new(
            Array2::zeros((3, 3)),
            vec![0, 0],
            vec![vec![50e6]],
            RADec::default(),
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_new_missing_data_description() {
        let result = MemoryStore::new(
            Array2::zeros((2, 3)),
            vec![0, 2],
            vec![vec![50e6], vec![60e6]],
            RADec::default(),
            1,
        );
        assert!(matches!(
            result,
            Err(StoreError::MissingDataDescription {
                row: 1,
                ddid: 2,
                num_ddids: 2
            })
        ));
    }

    #[test]
    fn test_read_rows() {
        let mut store = get_store();
        let uvws = store.read_uvws(1..3).unwrap();
        assert_eq!(uvws, array![[4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert_eq!(store.read_data_desc_ids(0..3).unwrap(), vec![0, 0, 1]);
        assert_eq!(store.read_uvws(3..3).unwrap().dim(), (0, 3));
        assert_eq!(store.read_chan_freqs().unwrap()[1], vec![60e6, 61e6]);
    }

    #[test]
    fn test_bad_rows() {
        let mut store = get_store();
        assert!(matches!(
            store.read_uvws(2..4),
            Err(StoreError::BadRows {
                start: 2,
                end: 4,
                num_rows: 3
            })
        ));
        assert!(store.read_data_desc_ids(5..6).is_err());
        assert!(store.read_vis("DATA", 0..10).is_err());
    }

    #[test]
    fn test_write_then_read_vis() {
        let mut store = get_store();
        let vis = Array3::from_shape_fn((2, 3, 4), |(r, c, p)| {
            c32::new(r as f32, (10 * c + p) as f32)
        });
        store.write_vis("MODEL_DATA", 0..2, vis.view()).unwrap();

        assert_eq!(store.read_vis("MODEL_DATA", 0..2).unwrap(), vis);
        // Other columns are untouched.
        assert!(store
            .read_vis("DATA", 0..2)
            .unwrap()
            .iter()
            .all(|v| *v == c32::default()));
        assert_eq!(store.column("MODEL_DATA").unwrap()[1][(2, 3)], c32::new(1.0, 23.0));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let mut store = get_store();
        assert!(matches!(
            store.read_vis("DATA", 1..3),
            Err(StoreError::BadArrayShape { .. })
        ));
        assert!(matches!(
            store.write_vis("DATA", 2..3, Array3::zeros((1, 3, 4)).view()),
            Err(StoreError::BadArrayShape { .. })
        ));
        assert!(matches!(
            store.write_vis("DATA", 0..2, Array3::zeros((1, 3, 4)).view()),
            Err(StoreError::BadArrayShape { .. })
        ));
    }

    #[test]
    fn test_bad_write_leaves_rows_untouched() {
        let mut store = get_store();
        // Row 1 has 3 channels and row 2 has 2; write 3 channels to both.
        let vis = Array3::from_elem((2, 3, 4), c32::new(1.0, -1.0));
        assert!(matches!(
            store.write_vis("DATA", 1..3, vis.view()),
            Err(StoreError::BadArrayShape { .. })
        ));
        assert!(store
            .column("DATA")
            .unwrap()
            .iter()
            .all(|cell| cell.iter().all(|v| *v == c32::default())));
    }

    #[test]
    fn test_missing_column() {
        let mut store = get_store();
        match store.read_vis("FOO", 0..1) {
            Err(StoreError::MissingColumn { column, .. }) => assert_eq!(column, "FOO"),
            other => panic!("unexpected result {other:?}"),
        }
        store.add_column("FOO");
        assert_eq!(store.read_vis("FOO", 0..1).unwrap().dim(), (1, 3, 4));
    }

    #[test]
    fn test_write_observation() {
        let mut store = get_store();
        let info = ObservationInfo {
            observer: "me".to_string(),
            ..Default::default()
        };
        store.write_observation(&info).unwrap();
        store.flush().unwrap();
        assert_eq!(store.observation(), Some(&info));
        assert_eq!(store.observation().unwrap().telescope_name, "NenuFAR");
        store.finalise().unwrap();
    }
}
