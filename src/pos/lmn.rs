// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Direction cosines of a source relative to a phase centre.
//!
//! See Interferometry and Synthesis in Radio Astronomy, Third Edition,
//! Section 3: Analysis of the Interferometer Response.

use std::f64::consts::TAU;

use super::uvw::UVW;

/// (l,m,n) direction cosines \[dimensionless\]. `l` increases towards east,
/// `m` towards north and `n` towards the phase centre, which is (0, 0, 1).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub struct LMN {
    pub l: f64,
    pub m: f64,
    pub n: f64,
}

impl LMN {
    /// The direction of the phase centre itself.
    pub const PHASE_CENTRE: LMN = LMN {
        l: 0.0,
        m: 0.0,
        n: 1.0,
    };

    /// The phase of a unit source at this position on a baseline \[radians\],
    /// i.e. `2 pi (u l + v m + w (n - 1))`. `uvw` must be in wavelengths.
    pub fn dot(self, uvw: UVW) -> f64 {
        self.prepare_for_rime().dot(uvw)
    }

    /// `l^2 + m^2 + n^2`; 1 for any direction on the unit sphere.
    pub fn norm_sqr(self) -> f64 {
        self.l * self.l + self.m * self.m + self.n * self.n
    }

    /// Scale by 2 pi and subtract 1 from `n` once, rather than for every
    /// baseline a source is modelled on.
    pub fn prepare_for_rime(self) -> LmnRime {
        LmnRime {
            l: TAU * self.l,
            m: TAU * self.m,
            n: TAU * (self.n - 1.0),
        }
    }
}

/// An [`LMN`] ready for the measurement equation:
/// `(2 pi l, 2 pi m, 2 pi (n - 1))`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LmnRime {
    pub l: f64,
    pub m: f64,
    pub n: f64,
}

impl LmnRime {
    /// The phase on a baseline (in wavelengths) \[radians\]; see [`LMN::dot`].
    #[inline(always)]
    pub fn dot(self, uvw: UVW) -> f64 {
        uvw.u * self.l + uvw.v * self.m + uvw.w * self.n
    }
}

#[cfg(any(test, feature = "approx"))]
impl approx::AbsDiffEq for LMN {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        f64::abs_diff_eq(&self.l, &other.l, epsilon)
            && f64::abs_diff_eq(&self.m, &other.m, epsilon)
            && f64::abs_diff_eq(&self.n, &other.n, epsilon)
    }
}
