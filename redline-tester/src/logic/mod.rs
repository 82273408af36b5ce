pub mod career;
pub mod clock;
pub mod opponents;
pub mod policy;
pub mod reports;
pub mod storage;

pub use career::{CareerPlan, CareerSummary, run_career};
pub use policy::DriverStrategy;
pub use reports::{write_console_report, write_json_report, write_markdown_report};
pub use storage::SaveTarget;
