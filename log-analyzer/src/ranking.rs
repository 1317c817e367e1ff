use crate::models::ReportRow;

/// Orders rows by `time_sum` descending and keeps the first `limit`.
///
/// The sort is stable, so rows with equal `time_sum` keep their input order,
/// which is the order endpoints were first seen in the log.
pub fn top_by_time_sum(mut rows: Vec<ReportRow>, limit: usize) -> Vec<ReportRow> {
    rows.sort_by(|a, b| b.time_sum.total_cmp(&a.time_sum));
    rows.truncate(limit);
    rows
}

/// Serializes rows as a JSON array of records, ready to embed in an HTML
/// `<script>` block.
pub fn to_table_json(rows: &[ReportRow]) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(rows)?;
    // `<\/` is the same JSON string as `</` but cannot close the script element
    Ok(json.replace("</", "<\\/"))
}
