// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Handle UVW coordinates.

use crate::constants::VEL_C;

/// The (u,v,w) coordinates of a baseline. Measurement sets store these in
/// metres; the visibility modelling wants them in wavelengths (see
/// [`UVW::to_wavelengths`]).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub struct UVW {
    /// u coordinate \[metres or wavelengths\]
    pub u: f64,
    /// v coordinate \[metres or wavelengths\]
    pub v: f64,
    /// w coordinate \[metres or wavelengths\]
    pub w: f64,
}

impl UVW {
    /// Convert a [`UVW`] in metres into wavelengths at the given frequency.
    #[inline]
    pub fn to_wavelengths(self, freq_hz: f64) -> Self {
        self * (freq_hz / VEL_C)
    }

    /// The baseline as an array, in (u, v, w) order.
    #[inline]
    pub fn to_array(self) -> [f64; 3] {
        [self.u, self.v, self.w]
    }
}

impl From<[f64; 3]> for UVW {
    fn from([u, v, w]: [f64; 3]) -> Self {
        UVW { u, v, w }
    }
}

impl std::ops::Mul<f64> for UVW {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        UVW {
            u: self.u * rhs,
            v: self.v * rhs,
            w: self.w * rhs,
        }
    }
}

#[cfg(any(test, feature = "approx"))]
impl approx::AbsDiffEq for UVW {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        f64::abs_diff_eq(&self.u, &other.u, epsilon)
            && f64::abs_diff_eq(&self.v, &other.v, epsilon)
            && f64::abs_diff_eq(&self.w, &other.w, epsilon)
    }
}
