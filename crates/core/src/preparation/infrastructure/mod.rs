pub mod jpeg_frame_preparer;
