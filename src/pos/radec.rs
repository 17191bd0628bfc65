// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Handle (right ascension, declination) coordinates.

use std::f64::consts::FRAC_PI_2;

use erfa::aliases::eraSeps;

use super::lmn::LMN;
use super::CoordError;

/// Slack allowed on |Dec| <= 90 degrees, so that values converted from degrees
/// don't fail on the last bit.
const DEC_LIMIT_SLACK: f64 = 1e-12;

/// A struct containing a Right Ascension and Declination. All units are in
/// radians.
///
/// Note that the serialised units are degrees and are automatically converted
/// when serialising/deserialising.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(clippy::upper_case_acronyms)]
pub struct RADec {
    /// Right ascension \[radians\]
    #[cfg_attr(feature = "serde", serde(serialize_with = "radians_to_degrees"))]
    #[cfg_attr(feature = "serde", serde(deserialize_with = "degrees_to_radians"))]
    pub ra: f64,

    /// Declination \[radians\]
    #[cfg_attr(feature = "serde", serde(serialize_with = "radians_to_degrees"))]
    #[cfg_attr(feature = "serde", serde(deserialize_with = "degrees_to_radians"))]
    pub dec: f64,
}

#[cfg(feature = "serde")]
fn radians_to_degrees<S: serde::Serializer>(num: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(num.to_degrees())
}

#[cfg(feature = "serde")]
fn degrees_to_radians<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let num: f64 = serde::Deserialize::deserialize(d)?;
    Ok(num.to_radians())
}

impl RADec {
    /// Make a new [`RADec`] struct from values in radians.
    pub fn from_radians(ra: f64, dec: f64) -> RADec {
        Self { ra, dec }
    }

    /// Make a new [`RADec`] struct from values in degrees.
    pub fn from_degrees(ra: f64, dec: f64) -> RADec {
        Self {
            ra: ra.to_radians(),
            dec: dec.to_radians(),
        }
    }

    /// Make a new [`RADec`] struct from values in degrees, failing if the
    /// values aren't finite or the declination is outside of \[-90, 90\]
    /// degrees.
    pub fn try_from_degrees(ra: f64, dec: f64) -> Result<RADec, CoordError> {
        Self::from_degrees(ra, dec).validated()
    }

    /// Check that this coordinate describes a real position on the sky.
    pub fn validated(self) -> Result<RADec, CoordError> {
        if !self.ra.is_finite() || !self.dec.is_finite() {
            return Err(CoordError::InvalidCoordinate {
                reason: format!(
                    "non-finite angle (ra = {} rad, dec = {} rad)",
                    self.ra, self.dec
                ),
            });
        }
        if self.dec.abs() > FRAC_PI_2 + DEC_LIMIT_SLACK {
            return Err(CoordError::InvalidCoordinate {
                reason: format!(
                    "declination {}° is outside of [-90°, 90°]",
                    self.dec.to_degrees()
                ),
            });
        }
        Ok(self)
    }

    /// Get the [`LMN`] direction cosines from an [`RADec`] and a phase centre.
    /// `n` is the geometric projection onto the phase centre, so no checks are
    /// done on whether the source is visible. See [`radec_to_lmn`] for the
    /// checked version.
    ///
    /// Derived using "Coordinate transformations" on page 388 of Synthesis
    /// Imaging in Radio Astronomy II.
    pub fn to_lmn(&self, phase_centre: RADec) -> LMN {
        let d_ra = self.ra - phase_centre.ra;
        let (s_d_ra, c_d_ra) = d_ra.sin_cos();
        let (s_dec, c_dec) = self.dec.sin_cos();
        let (pc_s_dec, pc_c_dec) = phase_centre.dec.sin_cos();
        LMN {
            l: c_dec * s_d_ra,
            m: s_dec * pc_c_dec - c_dec * pc_s_dec * c_d_ra,
            n: s_dec * pc_s_dec + c_dec * pc_c_dec * c_d_ra,
        }
    }

    /// Calculate the distance between two sets of coordinates \[radians\].
    pub fn separation(&self, b: Self) -> f64 {
        eraSeps(self.ra, self.dec, b.ra, b.dec)
    }
}

impl std::fmt::Display for RADec {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "({:.4}°, {:.4}°)",
            self.ra.to_degrees(),
            self.dec.to_degrees()
        )
    }
}

/// Anything that can be read as a (RA, Dec) pair. Raw numbers are interpreted
/// as degrees; a [`RADec`] is already in radians.
pub trait AsRADec {
    fn as_radec(&self) -> Result<RADec, CoordError>;
}

impl AsRADec for RADec {
    fn as_radec(&self) -> Result<RADec, CoordError> {
        self.validated()
    }
}

impl AsRADec for (f64, f64) {
    fn as_radec(&self) -> Result<RADec, CoordError> {
        RADec::try_from_degrees(self.0, self.1)
    }
}

impl AsRADec for [f64; 2] {
    fn as_radec(&self) -> Result<RADec, CoordError> {
        RADec::try_from_degrees(self[0], self[1])
    }
}

impl AsRADec for [f64] {
    fn as_radec(&self) -> Result<RADec, CoordError> {
        match self {
            [ra, dec] => RADec::try_from_degrees(*ra, *dec),
            _ => Err(CoordError::InvalidCoordinate {
                reason: format!("expected 2 angles (ra, dec), got {}", self.len()),
            }),
        }
    }
}

impl AsRADec for Vec<f64> {
    fn as_radec(&self) -> Result<RADec, CoordError> {
        self.as_slice().as_radec()
    }
}

/// Convert a source position into (l,m,n) direction cosines relative to a
/// phase centre.
///
/// `n` is taken as `sqrt(1 - l^2 - m^2)`, i.e. the source is assumed to be in
/// the hemisphere around the phase centre. A [`CoordError::Domain`] is
/// returned when `1 - l^2 - m^2 < 0`, or when the source is behind that
/// hemisphere (its projection onto the phase centre is negative), rather than
/// a NaN or a mirrored position. This differs on purpose from evaluating the
/// plain `sqrt` formula, which silently mirrors such a source in front of the
/// phase centre.
pub fn radec_to_lmn<S, P>(source: &S, phase_centre: &P) -> Result<LMN, CoordError>
where
    S: AsRADec + ?Sized,
    P: AsRADec + ?Sized,
{
    let source = source.as_radec()?;
    let phase_centre = phase_centre.as_radec()?;

    let LMN {
        l,
        m,
        n: n_geometric,
    } = source.to_lmn(phase_centre);
    let radicand = 1.0 - l * l - m * m;
    if radicand < 0.0 || n_geometric < 0.0 {
        return Err(CoordError::Domain {
            l,
            m,
            radicand,
            n_geometric,
        });
    }

    Ok(LMN {
        l,
        m,
        n: radicand.sqrt(),
    })
}

/// Convert many source positions into direction cosines with
/// [`radec_to_lmn`], failing on the first bad position.
pub fn radecs_to_lmns(radecs: &[RADec], phase_centre: RADec) -> Result<Vec<LMN>, CoordError> {
    radecs
        .iter()
        .map(|radec| radec_to_lmn(radec, &phase_centre))
        .collect()
}

#[cfg(any(test, feature = "approx"))]
impl approx::AbsDiffEq for RADec {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        f64::abs_diff_eq(&self.ra, &other.ra, epsilon)
            && f64::abs_diff_eq(&self.dec, &other.dec, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl approx::RelativeEq for RADec {
    #[inline]
    fn default_max_relative() -> f64 {
        f64::EPSILON
    }

    #[inline]
    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        f64::relative_eq(&self.ra, &other.ra, epsilon, max_relative)
            && f64::relative_eq(&self.dec, &other.dec, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_to_lmn() {
        let radec = RADec::from_degrees(62.0, -27.5);
        let phase_centre = RADec::from_degrees(60.0, -27.0);
        let lmn = radec.to_lmn(phase_centre);
        let expected = LMN {
            l: 0.03095623164758603,
            m: -0.008971846102111436,
            n: 0.9994804738961642,
        };
        assert_abs_diff_eq!(lmn, expected, epsilon = 1e-10);
    }

    #[test]
    fn test_radec_to_lmn_matches_geometric_n() {
        let radec = RADec::from_degrees(62.0, -27.5);
        let phase_centre = RADec::from_degrees(60.0, -27.0);
        let lmn = radec_to_lmn(&radec, &phase_centre).unwrap();
        assert_abs_diff_eq!(lmn, radec.to_lmn(phase_centre), epsilon = 1e-10);
    }

    #[test]
    fn test_radec_to_lmn_at_phase_centre() {
        for (ra, dec) in [(0.0, 90.0), (60.0, -27.0), (299.8681, 40.7339), (359.0, 0.0)] {
            let lmn = radec_to_lmn(&(ra, dec), &(ra, dec)).unwrap();
            assert_abs_diff_eq!(lmn.l, 0.0, epsilon = 1e-15);
            assert_abs_diff_eq!(lmn.m, 0.0, epsilon = 1e-15);
            assert_abs_diff_eq!(lmn.n, 1.0, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_radec_to_lmn_unit_norm() {
        let phase_centre = RADec::from_degrees(0.0, 90.0);
        for (ra, dec) in [
            (299.8681, 40.7339),
            (350.85, 58.815),
            (83.633, 22.0145),
            (187.7059, 12.3911),
            (10.0, 1.0),
        ] {
            let lmn = radec_to_lmn(&(ra, dec), &phase_centre).unwrap();
            assert!(lmn.n >= 0.0);
            assert_abs_diff_eq!(
                lmn.l * lmn.l + lmn.m * lmn.m + lmn.n * lmn.n,
                1.0,
                epsilon = 1e-12
            );
        }

        let phase_centre = RADec::from_degrees(60.0, -27.0);
        let lmn = radec_to_lmn(&RADec::from_degrees(45.0, -40.0), &phase_centre).unwrap();
        assert_abs_diff_eq!(
            lmn.l * lmn.l + lmn.m * lmn.m + lmn.n * lmn.n,
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_radec_to_lmn_structured_and_raw_agree() {
        let structured = radec_to_lmn(
            &RADec::from_degrees(299.8681, 40.7339),
            &RADec::from_degrees(0.0, 90.0),
        )
        .unwrap();
        let tuple = radec_to_lmn(&(299.8681, 40.7339), &(0.0, 90.0)).unwrap();
        let array = radec_to_lmn(&[299.8681, 40.7339], &[0.0, 90.0]).unwrap();
        let slice = radec_to_lmn(&[299.8681, 40.7339][..], &vec![0.0, 90.0]).unwrap();
        assert_eq!(structured, tuple);
        assert_eq!(structured, array);
        assert_eq!(structured, slice);
    }

    #[test]
    fn test_radec_to_lmn_on_horizon_is_domain_error() {
        // 90 degrees from a phase centre at the pole; rounding pushes
        // 1 - l^2 - m^2 just below zero.
        let result = radec_to_lmn(&(90.0, 0.0), &(0.0, 90.0));
        assert!(
            matches!(result, Err(CoordError::Domain { radicand, .. }) if radicand < 0.0),
            "{result:?}"
        );
    }

    #[test]
    fn test_radec_to_lmn_below_horizon_is_domain_error() {
        let result = radec_to_lmn(&(0.0, -45.0), &(0.0, 90.0));
        assert!(
            matches!(result, Err(CoordError::Domain { n_geometric, .. }) if n_geometric < 0.0),
            "{result:?}"
        );

        // Opposite side of the sky.
        let result = radec_to_lmn(&(180.0, 27.0), &(0.0, -27.0));
        assert!(matches!(result, Err(CoordError::Domain { .. })));
    }

    #[test]
    fn test_radec_to_lmn_invalid_coordinates() {
        let pc = (0.0, 90.0);
        assert!(matches!(
            radec_to_lmn(&[1.0, 2.0, 3.0][..], &pc),
            Err(CoordError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            radec_to_lmn(&Vec::<f64>::new(), &pc),
            Err(CoordError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            radec_to_lmn(&(f64::NAN, 10.0), &pc),
            Err(CoordError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            radec_to_lmn(&(10.0, 91.0), &pc),
            Err(CoordError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            radec_to_lmn(&(10.0, 10.0), &RADec::from_radians(0.0, f64::INFINITY)),
            Err(CoordError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_try_from_degrees_accepts_poles() {
        assert!(RADec::try_from_degrees(0.0, 90.0).is_ok());
        assert!(RADec::try_from_degrees(123.0, -90.0).is_ok());
        assert!(RADec::try_from_degrees(0.0, -90.5).is_err());
    }

    #[test]
    fn test_radecs_to_lmns() {
        let phase_centre = RADec::from_degrees(0.0, 90.0);
        let radecs = [
            RADec::from_degrees(0.0, 90.0),
            RADec::from_degrees(299.8681, 40.7339),
        ];
        let lmns = radecs_to_lmns(&radecs, phase_centre).unwrap();
        assert_eq!(lmns.len(), 2);
        assert_abs_diff_eq!(lmns[0].n, 1.0, epsilon = 1e-15);

        let radecs = [
            RADec::from_degrees(0.0, 90.0),
            RADec::from_degrees(0.0, -10.0),
        ];
        assert!(radecs_to_lmns(&radecs, phase_centre).is_err());
    }

    #[test]
    fn test_separation() {
        let a = RADec::from_degrees(0.0, 90.0);
        let b = RADec::from_degrees(45.0, 0.0);
        assert_abs_diff_eq!(b.separation(a), FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(a.separation(a), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_display_radec() {
        let radec = RADec::from_degrees(299.8681, 40.7339);
        let result = format!("{}", radec);
        assert_eq!(result, "(299.8681°, 40.7339°)");
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_serde() {
        let radec = RADec::from_degrees(60.0, -30.0);
        let result = serde_json::to_string(&radec);
        assert!(result.is_ok(), "{:?}", result.err());
        let json = result.unwrap();

        let result = serde_json::from_str(&json);
        assert!(result.is_ok(), "{:?}", result.err());
        let radec2 = result.unwrap();

        assert_abs_diff_eq!(radec, radec2, epsilon = 1e-15);
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_deserialise_json() {
        let json = "{\"ra\": 1.23, \"dec\": -0.57}";

        let result = serde_json::from_str(json);
        assert!(result.is_ok(), "{:?}", result.err());
        let radec: RADec = result.unwrap();

        assert_abs_diff_eq!(
            radec,
            RADec {
                ra: 0.021467549799530253,
                dec: -0.009948376736367677
            }
        );
    }
}
