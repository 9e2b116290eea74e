pub mod threaded_capture_controller;
