/// Extract a short type name from the full module path.
///
/// Given `"sentinel_pipeline::components::SeverityFloorFilter"`, returns
/// `"SeverityFloorFilter"`.
pub fn short_type_name(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}
