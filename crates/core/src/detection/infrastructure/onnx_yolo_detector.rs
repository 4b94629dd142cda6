/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Turns the frame upright, crops the region of interest, letterboxes the
/// crop, runs inference, then filters with NMS and maps boxes back to
/// normalized full-frame coordinates.
use std::path::Path;

use image::{imageops, RgbImage};

use crate::detection::domain::face_detector::{DetectionError, DetectionRequest, FaceDetector};
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::detection::domain::face_observation::FaceObservation;
use crate::shared::region::NormalizedRegion;

use super::execution_provider::preferred_execution_providers;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Number of keypoints per detection (5 landmarks × 3 values each: x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// YOLO face detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, DetectionError> {
        let session = ort::session::Session::builder()
            .map_err(|e| load_error(model_path, e))?
            .with_execution_providers(preferred_execution_providers())
            .map_err(|e| load_error(model_path, e))?
            .commit_from_file(model_path)
            .map_err(|e| load_error(model_path, e))?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::debug!(
            "loaded YOLO model {} (input {input_size}x{input_size})",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(
        &mut self,
        request: &DetectionRequest<'_>,
    ) -> Result<Vec<FaceObservation>, DetectionError> {
        let (crop, crop_area) = prepare_roi(request)?;
        let (input_tensor, lb) = letterbox(&crop, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor).map_err(inference)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(inference)?;
        if outputs.len() == 0 {
            return Err(DetectionError::UnexpectedOutput(
                "model produced no outputs".into(),
            ));
        }
        let tensor = outputs[0].try_extract_array::<f32>().map_err(inference)?;
        let data = tensor.as_slice().ok_or_else(|| {
            DetectionError::UnexpectedOutput("output tensor is not contiguous".into())
        })?;

        let mut raw = decode_predictions(data, tensor.shape(), self.confidence, &lb)?;
        let kept = nms(&mut raw, NMS_IOU_THRESH);

        Ok(kept
            .iter()
            .filter_map(|d| to_observation(d, crop.width(), crop.height(), &crop_area))
            .collect())
    }
}

fn inference(e: impl std::fmt::Display) -> DetectionError {
    DetectionError::Inference(e.to_string())
}

fn load_error(model_path: &Path, e: impl std::fmt::Display) -> DetectionError {
    DetectionError::Inference(format!("loading {}: {e}", model_path.display()))
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Orients the frame and cuts out the region of interest.
///
/// Returns the crop plus the normalized area it actually covers after
/// snapping to whole pixels.
fn prepare_roi(
    request: &DetectionRequest<'_>,
) -> Result<(RgbImage, NormalizedRegion), DetectionError> {
    let rgb = request.frame.to_rgb_image().ok_or_else(|| {
        DetectionError::InvalidRequest(format!(
            "frame {} buffer does not match {}x{}",
            request.frame.index(),
            request.frame.width(),
            request.frame.height()
        ))
    })?;
    let upright = request.orientation.apply(&rgb);
    let (w, h) = upright.dimensions();

    let px = request.region_of_interest.to_pixels(w, h);
    if px.is_empty() {
        return Err(DetectionError::InvalidRequest(format!(
            "region of interest is empty on a {w}x{h} frame"
        )));
    }

    let crop = imageops::crop_imm(&upright, px.x, px.y, px.width, px.height).to_image();
    let area = NormalizedRegion::new(
        px.x as f64 / w as f64,
        px.y as f64 / h as f64,
        px.width as f64 / w as f64,
        px.height as f64 / h as f64,
    );
    Ok((crop, area))
}

/// Geometry of a letterbox transform.
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    /// Letterbox pixel coordinates back to source image pixels.
    fn unmap(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize an image to `target_size` × `target_size`.
///
/// Returns the NCHW float32 tensor and the transform that produced it.
fn letterbox(image: &RgbImage, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let (iw, ih) = image.dimensions();
    let target = target_size as f64;

    let scale = (target / iw as f64).min(target / ih as f64);
    let new_w = ((iw as f64 * scale).round() as u32).clamp(1, target_size);
    let new_h = ((ih as f64 * scale).round() as u32).clamp(1, target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    // Nearest-neighbor resize + copy into padded region
    for y in 0..new_h {
        let src_y = ((y as f64 / scale) as u32).min(ih - 1);
        for x in 0..new_w {
            let src_x = ((x as f64 / scale) as u32).min(iw - 1);
            let px = image.get_pixel(src_x, src_y);
            let ty = (pad_y + y) as usize;
            let tx = (pad_x + x) as usize;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = px[c] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
    keypoints: Option<[Option<(f64, f64)>; 5]>,
}

/// Parses YOLO output rows `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`
/// into boxes in source image pixels.
///
/// Accepts both `[1, features, detections]` and `[1, detections, features]`.
fn decode_predictions(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    lb: &Letterbox,
) -> Result<Vec<RawDetection>, DetectionError> {
    if shape.len() != 3 {
        return Err(DetectionError::UnexpectedOutput(format!(
            "output shape {shape:?}"
        )));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if data.len() < num_dets * num_feats {
        return Err(DetectionError::UnexpectedOutput(format!(
            "{} values for shape {shape:?}",
            data.len()
        )));
    }
    if num_feats < 5 {
        return Ok(Vec::new());
    }

    let value = |det: usize, feat: usize| -> f64 {
        let idx = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data[idx] as f64
    };

    let mut dets = Vec::new();
    for i in 0..num_dets {
        let conf = value(i, 4);
        if conf < confidence {
            continue;
        }

        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        let (x1, y1) = lb.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = lb.unmap(cx + w / 2.0, cy + h / 2.0);

        let keypoints = (num_feats >= 5 + NUM_KEYPOINT_VALUES).then(|| {
            let mut pts = [None; 5];
            for (k, pt) in pts.iter_mut().enumerate() {
                let base = 5 + k * 3;
                if value(i, base + 2) >= KEYPOINT_CONF_THRESH {
                    *pt = Some(lb.unmap(value(i, base), value(i, base + 1)));
                }
            }
            pts
        });

        dets.push(RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence: conf,
            keypoints,
        });
    }
    Ok(dets)
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets.iter() {
        let overlaps = keep.iter().any(|k| {
            bbox_iou(&[k.x1, k.y1, k.x2, k.y2], &[det.x1, det.y1, det.x2, det.y2]) > iou_thresh
        });
        if !overlaps {
            keep.push(det.clone());
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Clamps a crop-pixel detection to the crop and expresses it in
/// normalized full-frame coordinates. Boxes entirely outside the crop
/// yield `None`.
fn to_observation(
    det: &RawDetection,
    crop_w: u32,
    crop_h: u32,
    crop_area: &NormalizedRegion,
) -> Option<FaceObservation> {
    let (w, h) = (crop_w as f64, crop_h as f64);
    let x1 = det.x1.clamp(0.0, w);
    let y1 = det.y1.clamp(0.0, h);
    let x2 = det.x2.clamp(0.0, w);
    let y2 = det.y2.clamp(0.0, h);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    let local = NormalizedRegion::new(x1 / w, y1 / h, (x2 - x1) / w, (y2 - y1) / h);
    let mut observation = FaceObservation::new(crop_area.map_from_local(&local), det.confidence);

    if let Some(pts) = det.keypoints {
        let local_pts = pts.map(|p| {
            p.map(|(x, y)| ((x / w).clamp(0.0, 1.0), (y / h).clamp(0.0, 1.0)))
        });
        observation =
            observation.with_landmarks(FaceLandmarks::new(local_pts).map_from_local(crop_area));
    }
    Some(observation)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
