//! Shared detection types and post-processing used by every smarteye front-end.

pub mod bbox;
pub mod coco_classes;
pub mod detection;
pub mod detector;
pub mod frame_meta;
pub mod frame_times;
pub mod img_dimensions;
pub mod nms;
pub mod overlay;
pub mod palette;
pub mod postprocess;
pub mod sampler;
pub mod video_meta;
