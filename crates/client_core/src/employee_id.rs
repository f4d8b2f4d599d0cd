use chrono::Utc;
use tracing::error;

use crate::services::BasicInfoApi;

/// First three characters of the department, upper-cased.
pub fn department_prefix(department: &str) -> String {
    department.chars().take(3).collect::<String>().to_uppercase()
}

/// Next sequential id for `department`, e.g. `ENG-003` when two `ENG` ids
/// exist. Falls back to a time-derived suffix when the listing fails.
///
/// Uniqueness is not guaranteed: two concurrent callers can observe the same
/// count.
pub async fn generate_employee_id(api: &dyn BasicInfoApi, department: &str) -> String {
    let prefix = department_prefix(department);
    match api.get_all().await {
        Ok(records) => {
            let count = records
                .iter()
                .filter(|record| record.employee_id.starts_with(&prefix))
                .count();
            format_employee_id(&prefix, count + 1)
        }
        Err(err) => {
            error!(department, error = %err, "error generating employee id");
            fallback_employee_id(&prefix, Utc::now().timestamp_millis())
        }
    }
}

fn format_employee_id(prefix: &str, sequence: usize) -> String {
    format!("{prefix}-{sequence:03}")
}

fn fallback_employee_id(prefix: &str, unix_millis: i64) -> String {
    format!("{prefix}-{:03}", unix_millis.rem_euclid(1000))
}
