// Grid data exchange

pub mod mapper;
pub mod runs;

pub use mapper::{
    apply_required_validation, build_save_payload, descriptors_from_field, load_grid, save,
    save_grid, SaveError, SavePayload, SaveSummary,
};
pub use runs::{import_run_file, parse_data_text_to_run_rows, RunRow};
