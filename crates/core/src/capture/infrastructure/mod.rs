pub mod image_file_camera;
