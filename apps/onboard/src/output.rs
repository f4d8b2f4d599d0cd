use client_core::SubmissionOutcome;
use forms::{FormField, FormModel, FormState};
use shared::domain::{Employee, EmployeePage};

const PHOTO_PREVIEW_CHARS: usize = 48;

pub fn print_form_errors<M: FormModel>(form: &FormState<M>) {
    for (field, message) in form.errors() {
        eprintln!("  {}: {message}", field.name());
    }
}

pub fn print_page(page: &EmployeePage) {
    if page.employees.is_empty() {
        println!("No employees found.");
        return;
    }
    println!(
        "{:<10} {:<24} {:<14} {:<9} {:<10} {:<14}",
        "ID", "NAME", "DEPARTMENT", "ROLE", "TYPE", "LOCATION"
    );
    for employee in &page.employees {
        println!("{}", employee_row(employee));
    }
    println!("Page {} of {}", page.page, page.total_pages);
}

fn employee_row(employee: &Employee) -> String {
    let basic = &employee.basic;
    let employment_type = employee
        .employment_type()
        .map(|t| t.as_str())
        .unwrap_or("-");
    let mut row = format!(
        "{:<10} {:<24} {:<14} {:<9} {:<10} {:<14}",
        basic.employee_id,
        basic.full_name,
        basic.department,
        basic.role.as_str(),
        employment_type,
        employee.office_location().unwrap_or("-"),
    );
    if employee.is_incomplete() {
        row.push_str(&format!(
            "  needs details: onboard fill-details --employee-id {}",
            basic.employee_id
        ));
    }
    row.trim_end().to_string()
}

pub fn print_outcome(outcome: &SubmissionOutcome) {
    if let Some(basic) = &outcome.basic_info {
        println!("Created {} ({})", basic.full_name, basic.employee_id);
    }
    println!(
        "Saved details for {}: {} at {}",
        outcome.details.employee_id,
        outcome.details.employment_type,
        outcome.details.office_location
    );
}

/// Replaces a long photo data URL with its length.
pub fn redact_photo(mut draft: serde_json::Value) -> serde_json::Value {
    if let Some(photo) = draft.get_mut("photo") {
        let len = photo.as_str().map(str::len).unwrap_or_default();
        if len > PHOTO_PREVIEW_CHARS {
            *photo = serde_json::Value::String(format!("<{len} chars>"));
        }
    }
    draft
}
