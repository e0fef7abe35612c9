//! Score → status classification.
//!
//! A [`Thresholds`] value is a descending list of bands. The first band
//! whose minimum the score reaches wins; anything below every band is
//! extinct.

use crate::constants::{city_thresholds, environment_thresholds, SCORE_TOLERANCE};
use crate::organism::OrganismStatus;

/// One classification band: scores `>= min` earn `status`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub min: f64,
    pub status: OrganismStatus,
}

/// Ordered bands, highest minimum first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub bands: &'static [Band],
}

pub const ENVIRONMENT_THRESHOLDS: Thresholds = Thresholds {
    bands: &[
        Band {
            min: environment_thresholds::THRIVING,
            status: OrganismStatus::Thriving,
        },
        Band {
            min: environment_thresholds::SURVIVING,
            status: OrganismStatus::Surviving,
        },
        Band {
            min: environment_thresholds::STRUGGLING,
            status: OrganismStatus::Struggling,
        },
    ],
};

pub const CITY_THRESHOLDS: Thresholds = Thresholds {
    bands: &[
        Band {
            min: city_thresholds::SURVIVOR,
            status: OrganismStatus::CitySurvivor,
        },
        Band {
            min: city_thresholds::ADAPTER,
            status: OrganismStatus::CityAdapter,
        },
    ],
};

/// Map a score to a status. NaN never reaches a band and lands on extinct.
pub fn classify(score: f64, thresholds: &Thresholds) -> OrganismStatus {
    thresholds
        .bands
        .iter()
        .find(|b| score + SCORE_TOLERANCE >= b.min)
        .map(|b| b.status)
        .unwrap_or(OrganismStatus::Extinct)
}

/// Classify unless the organism is already extinct, which is absorbing.
pub fn reclassify(current: OrganismStatus, score: f64, thresholds: &Thresholds) -> OrganismStatus {
    if current.is_extinct() {
        return current;
    }
    classify(score, thresholds)
}
