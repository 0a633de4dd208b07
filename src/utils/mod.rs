pub mod environment;
pub mod paths;
pub mod timestamps;

pub use environment::{DATA_DIR_ENV, get_data_dir};
pub use paths::{
    decode_thread_file_name, encode_thread_id, format_path_with_tilde, message_log_path,
    safe_open_file, validate_file_size,
};
pub use timestamps::{format_activity, format_timestamp};
