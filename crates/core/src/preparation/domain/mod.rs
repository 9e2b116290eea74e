pub mod frame_preparer;
