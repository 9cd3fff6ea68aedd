pub mod learning_path_response;
pub mod learning_paths_route;
