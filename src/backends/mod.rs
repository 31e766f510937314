// SPDX-License-Identifier: GPL-3.0-only

//! Frame sources: V4L2 cameras and static image files

pub mod camera;
pub mod file_source;

pub use camera::{Frame, FrameSource, V4l2Camera, capture_frame};
pub use file_source::ImageFileSource;
