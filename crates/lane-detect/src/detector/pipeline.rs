use super::{ConfigError, FrameDiagnostics, LaneDetectError, LaneDetectorParams, LaneResult};
use crate::classify::LaneClassifier;
use crate::departure::DepartureDetector;
use crate::fit::LaneFitter;
use crate::hough::LineExtractor;
use crate::preprocess::FramePreprocessor;
use crate::roi::RegionMasker;
use crate::smoother::TemporalSmoother;
use lane_detect_core::{EdgeMap, FrameError, FrameView, LaneSide};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Stateful lane detector for a single video stream.
///
/// Stages other than the smoother are stateless between frames. Use one
/// detector per stream; frames of a stream must keep the size of the first
/// frame.
#[derive(Debug)]
pub struct LaneDetector {
    params: LaneDetectorParams,
    preprocessor: FramePreprocessor,
    masker: RegionMasker,
    extractor: LineExtractor,
    classifier: LaneClassifier,
    smoother: TemporalSmoother,
    departure: Option<DepartureDetector>,
    frame_size: Option<(usize, usize)>,
    frames_processed: u64,
}

impl LaneDetector {
    /// Validate the parameters and build every stage.
    pub fn new(params: LaneDetectorParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let departure = if params.departure.enabled {
            Some(DepartureDetector::new(params.departure.clone())?)
        } else {
            None
        };
        Ok(Self {
            preprocessor: FramePreprocessor::new(params.preprocess.clone())?,
            masker: RegionMasker::new(params.roi.clone())?,
            extractor: LineExtractor::new(params.hough.clone())?,
            classifier: LaneClassifier::new(params.classify.clone())?,
            smoother: TemporalSmoother::new(params.smoothing.clone())?,
            departure,
            frame_size: None,
            frames_processed: 0,
            params,
        })
    }

    #[inline]
    pub fn params(&self) -> &LaneDetectorParams {
        &self.params
    }

    /// Per-side temporal state.
    #[inline]
    pub fn smoother(&self) -> &TemporalSmoother {
        &self.smoother
    }

    /// Frames accepted since construction or the last [`reset`](Self::reset).
    #[inline]
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Forget the stream: clears history and the locked frame size.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.frame_size = None;
        self.frames_processed = 0;
    }

    /// Run every stage on one frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn process(&mut self, frame: &FrameView<'_>) -> Result<LaneResult, LaneDetectError> {
        frame.validate()?;
        self.check_size(frame.dimensions())?;
        let edges = self.preprocessor.process(frame)?;
        self.process_edges(edges)
    }

    /// Run the pipeline from an already computed edge map.
    pub fn process_edges(&mut self, edges: EdgeMap) -> Result<LaneResult, LaneDetectError> {
        edges.validate()?;
        let (width, height) = edges.dimensions();
        self.check_size((width, height))?;
        self.frame_size = Some((width, height));

        let masked = self.masker.apply(edges);
        let edge_pixels = masked.count_edges();
        let segments = self.extractor.extract(&masked);
        let candidates = self.classifier.partition(&segments, width);

        let window = self.params.extrapolation.window(width, height);
        let fitter = LaneFitter::new(window);
        let left_fit = fitter.fit(&candidates.left);
        let right_fit = fitter.fit(&candidates.right);

        let left = self
            .smoother
            .update(LaneSide::Left, left_fit.clone(), &window);
        let right = self
            .smoother
            .update(LaneSide::Right, right_fit.clone(), &window);

        let departure = self
            .departure
            .as_ref()
            .map(|d| d.evaluate(left.as_ref(), right.as_ref(), width));

        debug!(
            "frame {}: {} edge px, {} segments ({} left, {} right, {} rejected), left={} right={}",
            self.frames_processed,
            edge_pixels,
            segments.len(),
            candidates.left.len(),
            candidates.right.len(),
            candidates.rejected.total(),
            left.is_some(),
            right.is_some()
        );

        let diagnostics = FrameDiagnostics {
            edge_pixels,
            segments: segments.len(),
            left_candidates: candidates.left.len(),
            right_candidates: candidates.right.len(),
            rejected: candidates.rejected,
            left_fit,
            right_fit,
            left_state: self.smoother.state(LaneSide::Left).track_state(),
            right_state: self.smoother.state(LaneSide::Right).track_state(),
        };
        let result = LaneResult {
            frame_index: self.frames_processed,
            frame_width: width,
            frame_height: height,
            window,
            left,
            right,
            departure,
            diagnostics,
        };
        self.frames_processed += 1;
        Ok(result)
    }

    fn check_size(&self, got: (usize, usize)) -> Result<(), FrameError> {
        match self.frame_size {
            Some(expected) if expected != got => {
                Err(FrameError::DimensionMismatch { expected, got })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_detect_core::PixelLayout;

    #[test]
    fn invalid_config_fails_at_construction() {
        let mut params = LaneDetectorParams::default();
        params.preprocess.blur_kernel_size = 2;
        assert!(matches!(
            LaneDetector::new(params),
            Err(ConfigError::InvalidKernelSize { size: 2 })
        ));
    }

    #[test]
    fn frame_size_is_locked_to_first_frame() {
        let mut detector = LaneDetector::new(LaneDetectorParams::default()).unwrap();
        let a = vec![0u8; 32 * 24 * 3];
        let b = vec![0u8; 16 * 24 * 3];
        let first = FrameView::new(32, 24, PixelLayout::Bgr, &a).unwrap();
        let second = FrameView::new(16, 24, PixelLayout::Bgr, &b).unwrap();
        detector.process(&first).unwrap();
        let err = detector.process(&second).unwrap_err();
        assert!(matches!(
            err,
            LaneDetectError::Frame(FrameError::DimensionMismatch {
                expected: (32, 24),
                got: (16, 24)
            })
        ));
        detector.reset();
        assert!(detector.process(&second).is_ok());
    }

    #[test]
    fn disabled_departure_yields_none() {
        let mut params = LaneDetectorParams::default();
        params.departure.enabled = false;
        let mut detector = LaneDetector::new(params).unwrap();
        let result = detector.process_edges(EdgeMap::new(64, 48)).unwrap();
        assert!(result.departure.is_none());
        assert_eq!(result.frame_index, 0);
        assert_eq!(detector.frames_processed(), 1);
    }
}
