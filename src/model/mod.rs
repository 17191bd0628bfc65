// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to generate point-source sky-model visibilities.
//!
//! Baselines are given as arrays with an innermost axis of length 3 holding
//! (u,v,w) in units of wavelength; the shape of the other axes (commonly
//! `[row][channel]` or `[timestep][channel][baseline]`) is not interpreted.
//! Visibilities have the shape of the baselines with the (u,v,w) axis removed,
//! optionally with one more trailing axis (e.g. polarisations), over which the
//! model is broadcast.

mod error;

pub use error::ModelError;

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use ndarray::{prelude::*, RemoveAxis, Zip};

use crate::{
    c64,
    pos::radec::{radec_to_lmn, AsRADec},
    LmnRime, RADec, UVW,
};

/// A sky-model component without any angular extent.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointSource {
    /// The position of the source.
    pub radec: RADec,

    /// The flux density of the source \[Jy\]
    pub flux: f64,
}

impl PointSource {
    pub fn new(radec: RADec, flux: f64) -> PointSource {
        PointSource { radec, flux }
    }
}

/// A [`IndexMap`] of source names for keys and [`PointSource`] structs for
/// values. Sources are kept (and modelled) in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SkyModel(IndexMap<String, PointSource>);

impl SkyModel {
    /// Create an empty [`SkyModel`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a new [`SkyModel`] with only the sources that can be modelled
    /// against the given phase centre, i.e. the sources for which
    /// [`radec_to_lmn`] succeeds.
    pub fn above_horizon(&self, phase_centre: RADec) -> SkyModel {
        self.iter()
            .filter(|(_, src)| radec_to_lmn(&src.radec, &phase_centre).is_ok())
            .map(|(name, src)| (name.clone(), *src))
            .collect()
    }

    /// The sum of all source flux densities \[Jy\]
    pub fn total_flux(&self) -> f64 {
        self.values().map(|src| src.flux).sum()
    }
}

impl From<IndexMap<String, PointSource>> for SkyModel {
    fn from(sources: IndexMap<String, PointSource>) -> Self {
        Self(sources)
    }
}

impl FromIterator<(String, PointSource)> for SkyModel {
    fn from_iter<I: IntoIterator<Item = (String, PointSource)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Deref for SkyModel {
    type Target = IndexMap<String, PointSource>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SkyModel {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Generate the visibilities of a single point source.
///
/// `baselines`: (u,v,w) coordinates \[wavelengths\] of every sample. The
/// innermost axis must have a length of 3.
///
/// `source`: the position of the source.
///
/// `flux`: the flux density of the source \[Jy\].
///
/// `phase_centre`: the phase centre of the observation.
///
/// Each visibility is `flux * exp(-2 pi i (u l + v m + w (n - 1)))`. The
/// returned array has the shape of `baselines` without its innermost axis.
pub fn point_source_visibility<D, S, P>(
    baselines: ArrayView<f64, D>,
    source: &S,
    flux: f64,
    phase_centre: &P,
) -> Result<Array<c64, D::Smaller>, ModelError>
where
    D: RemoveAxis,
    S: AsRADec + ?Sized,
    P: AsRADec + ?Sized,
{
    check_baselines(baselines.shape(), "point_source_visibility")?;
    let lmn = radec_to_lmn(source, phase_centre)?.prepare_for_rime();

    let mut vis = Array::zeros(
        baselines
            .index_axis(Axis(baselines.ndim() - 1), 0)
            .raw_dim(),
    );
    add_lmn(vis.view_mut().into_dyn(), baselines.into_dyn(), lmn, flux, false);
    Ok(vis)
}

/// Like [`point_source_visibility`], but add the visibilities to `vis`, which
/// must have the shape of `baselines` without its innermost axis, optionally
/// with one more trailing axis that the visibilities are broadcast over.
///
/// Nothing is added if an error is returned.
pub fn add_point_source_visibility<D, E, S, P>(
    vis: ArrayViewMut<c64, E>,
    baselines: ArrayView<f64, D>,
    source: &S,
    flux: f64,
    phase_centre: &P,
) -> Result<(), ModelError>
where
    D: Dimension,
    E: Dimension,
    S: AsRADec + ?Sized,
    P: AsRADec + ?Sized,
{
    check_baselines(baselines.shape(), "add_point_source_visibility")?;
    let broadcast = check_vis(vis.shape(), baselines.shape(), "add_point_source_visibility")?;
    let lmn = radec_to_lmn(source, phase_centre)?.prepare_for_rime();
    add_lmn(vis.into_dyn(), baselines.into_dyn(), lmn, flux, broadcast);
    Ok(())
}

/// Generate the visibilities of all sources in a sky model and sum them. An
/// empty sky model gives all zeros.
///
/// If any source can't be modelled (e.g. it is below the horizon of the phase
/// centre), a [`ModelError::Source`] naming it is returned. Use
/// [`SkyModel::above_horizon`] beforehand to drop such sources instead.
pub fn model_visibilities<D, P>(
    sky_model: &SkyModel,
    baselines: ArrayView<f64, D>,
    phase_centre: &P,
) -> Result<Array<c64, D::Smaller>, ModelError>
where
    D: RemoveAxis,
    P: AsRADec + ?Sized,
{
    check_baselines(baselines.shape(), "model_visibilities")?;
    let mut vis = Array::zeros(
        baselines
            .index_axis(Axis(baselines.ndim() - 1), 0)
            .raw_dim(),
    );
    add_model_visibilities(vis.view_mut(), sky_model, baselines, phase_centre)?;
    Ok(vis)
}

/// Add the visibilities of all sources in a sky model to `vis`. See
/// [`add_point_source_visibility`] for the allowed shapes of `vis`.
///
/// All source positions are checked before `vis` is touched, so on error
/// `vis` is unchanged.
pub fn add_model_visibilities<D, E, P>(
    vis: ArrayViewMut<c64, E>,
    sky_model: &SkyModel,
    baselines: ArrayView<f64, D>,
    phase_centre: &P,
) -> Result<(), ModelError>
where
    D: Dimension,
    E: Dimension,
    P: AsRADec + ?Sized,
{
    check_baselines(baselines.shape(), "add_model_visibilities")?;
    let broadcast = check_vis(vis.shape(), baselines.shape(), "add_model_visibilities")?;
    let phase_centre = phase_centre.as_radec()?;

    let lmns = sky_model
        .iter()
        .map(|(name, src)| {
            radec_to_lmn(&src.radec, &phase_centre)
                .map(|lmn| (lmn.prepare_for_rime(), src.flux))
                .map_err(|err| ModelError::Source {
                    name: name.clone(),
                    err,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut vis = vis.into_dyn();
    let baselines = baselines.into_dyn();
    for (lmn, flux) in lmns {
        add_lmn(vis.view_mut(), baselines.view(), lmn, flux, broadcast);
    }
    Ok(())
}

fn check_baselines(shape: &[usize], function: &'static str) -> Result<(), ModelError> {
    match shape.last() {
        Some(3) => Ok(()),
        _ => Err(ModelError::ShapeMismatch {
            argument: "baselines",
            function,
            expected: "[..., 3]".to_string(),
            received: format!("{shape:?}"),
        }),
    }
}

/// Check the shape of a visibility buffer against its baselines. Returns
/// whether the buffer has an extra trailing axis to broadcast over.
fn check_vis(
    vis_shape: &[usize],
    baselines_shape: &[usize],
    function: &'static str,
) -> Result<bool, ModelError> {
    let sample_shape = &baselines_shape[..baselines_shape.len() - 1];
    if vis_shape == sample_shape {
        Ok(false)
    } else if vis_shape.len() == sample_shape.len() + 1
        && &vis_shape[..sample_shape.len()] == sample_shape
    {
        Ok(true)
    } else {
        Err(ModelError::ShapeMismatch {
            argument: "vis",
            function,
            expected: format!("{sample_shape:?} or {sample_shape:?} + [n]"),
            received: format!("{vis_shape:?}"),
        })
    }
}

/// The hot loop. Shapes must already be checked.
fn add_lmn(
    mut vis: ArrayViewMutD<c64>,
    baselines: ArrayViewD<f64>,
    lmn: LmnRime,
    flux: f64,
    broadcast: bool,
) {
    let uvw_axis = Axis(baselines.ndim() - 1);
    if broadcast {
        let pol_axis = Axis(vis.ndim() - 1);
        Zip::from(vis.lanes_mut(pol_axis))
            .and(baselines.lanes(uvw_axis))
            .par_for_each(|mut vis_pols, uvw| {
                let v = phase(lmn, uvw) * flux;
                vis_pols.iter_mut().for_each(|vis| *vis += v);
            });
    } else {
        Zip::from(vis)
            .and(baselines.lanes(uvw_axis))
            .par_for_each(|vis, uvw| {
                *vis += phase(lmn, uvw) * flux;
            });
    }
}

#[inline(always)]
fn phase(lmn: LmnRime, uvw: ArrayView1<f64>) -> c64 {
    let uvw = UVW {
        u: uvw[0],
        v: uvw[1],
        w: uvw[2],
    };
    c64::cis(-lmn.dot(uvw))
}
