use super::ConfigError;
use crate::classify::ClassifyParams;
use crate::departure::DepartureParams;
use crate::fit::ExtrapolationParams;
use crate::hough::HoughParams;
use crate::preprocess::PreprocessParams;
use crate::roi::RoiParams;
use crate::smoother::SmoothingParams;
use serde::{Deserialize, Serialize};

/// Parameters for the whole pipeline, one section per stage.
///
/// Every section defaults independently, so a config file only needs the
/// fields it changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneDetectorParams {
    pub preprocess: PreprocessParams,
    pub roi: RoiParams,
    pub hough: HoughParams,
    pub classify: ClassifyParams,
    pub extrapolation: ExtrapolationParams,
    pub smoothing: SmoothingParams,
    pub departure: DepartureParams,
}

impl LaneDetectorParams {
    /// Check every section; the first violation is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.preprocess.validate()?;
        self.roi.validate()?;
        self.hough.validate()?;
        self.classify.validate()?;
        self.extrapolation.validate()?;
        self.smoothing.validate()?;
        self.departure.validate()?;
        Ok(())
    }
}
