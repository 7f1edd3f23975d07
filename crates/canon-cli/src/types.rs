use std::path::PathBuf;

use canon_cli::batch::TypeSummary;
use canon_map::IssueReport;

#[derive(Debug)]
pub struct TransformResult {
    pub tenant: String,
    pub input: PathBuf,
    /// `None` on a dry run.
    pub output: Option<PathBuf>,
    pub types: Vec<TypeSummary>,
    pub reports: Vec<IssueReport>,
    pub has_errors: bool,
}
