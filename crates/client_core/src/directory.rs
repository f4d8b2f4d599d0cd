use std::sync::Arc;

use shared::domain::{BasicInfo, Details, Employee, EmployeePage};
use tracing::{debug, error};

use crate::{
    error::ClientError,
    services::{BasicInfoApi, DetailsApi},
};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Left join of `basics` with `details` on `employee_id`. Every basic-info
/// record yields exactly one employee, in input order; when several details
/// share an employee id the first one wins. Details without a matching
/// basic-info record are dropped.
pub fn merge_employees(basics: Vec<BasicInfo>, details: &[Details]) -> Vec<Employee> {
    basics
        .into_iter()
        .map(|basic| {
            let details = details
                .iter()
                .find(|d| d.employee_id == basic.employee_id)
                .cloned();
            Employee { basic, details }
        })
        .collect()
}

/// Number of pages needed for `total` records, never less than one.
pub fn page_count(total: usize, page_size: u32) -> u32 {
    let page_size = page_size.max(1) as usize;
    total.div_ceil(page_size).max(1) as u32
}

/// The paginated employee listing.
#[derive(Clone)]
pub struct EmployeeDirectory {
    basic_info: Arc<dyn BasicInfoApi>,
    details: Arc<dyn DetailsApi>,
    page_size: u32,
}

impl EmployeeDirectory {
    pub fn new(
        basic_info: Arc<dyn BasicInfoApi>,
        details: Arc<dyn DetailsApi>,
        page_size: u32,
    ) -> Self {
        Self {
            basic_info,
            details,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetches one page of basic info together with every details record and
    /// merges them. `page` is 1-based.
    pub async fn list_page(&self, page: u32) -> Result<EmployeePage, ClientError> {
        let page = page.max(1);
        let (records, total_pages) = tokio::join!(
            async {
                futures::try_join!(
                    self.basic_info.get_paginated(page, self.page_size),
                    self.details.get_all(),
                )
            },
            self.total_pages(),
        );
        let (basics, details) = records?;
        debug!(page, basics = basics.len(), details = details.len(), "listing page fetched");

        Ok(EmployeePage {
            employees: merge_employees(basics, &details),
            page,
            total_pages,
        })
    }

    /// Failures are logged and reported as a single page.
    pub async fn total_pages(&self) -> u32 {
        match self.basic_info.get_all().await {
            Ok(all) => page_count(all.len(), self.page_size),
            Err(err) => {
                error!(error = %err, "error fetching total employee count");
                1
            }
        }
    }
}
