//! In-process fakes of the two backends.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use shared::{
    domain::{
        BasicInfo, Details, DetailsPatch, EmploymentType, JobRole, LookupId, LookupItem, RecordId,
    },
    error::ApiError,
};

use crate::{
    error::ClientError,
    services::{BasicInfoApi, DetailsApi},
};

fn unavailable() -> ClientError {
    ApiError::new(503, "Service Unavailable", "backend down").into()
}

fn page<T: Clone>(records: &[T], page: u32, limit: u32) -> Vec<T> {
    let start = (page.saturating_sub(1) * limit) as usize;
    records
        .iter()
        .skip(start)
        .take(limit as usize)
        .cloned()
        .collect()
}

fn matching(names: &[&str], search: Option<&str>) -> Vec<LookupItem> {
    let needle = search.unwrap_or_default().to_lowercase();
    names
        .iter()
        .enumerate()
        .filter(|(_, name)| name.to_lowercase().contains(&needle))
        .map(|(index, name)| LookupItem {
            id: LookupId(index as i64 + 1),
            name: name.to_string(),
        })
        .collect()
}

pub fn basic_info(full_name: &str, department: &str, employee_id: &str) -> BasicInfo {
    BasicInfo {
        id: None,
        full_name: full_name.into(),
        email: format!("{}@example.com", full_name.to_lowercase().replace(' ', ".")),
        department: department.into(),
        role: JobRole::Engineer,
        employee_id: employee_id.into(),
    }
}

pub fn details(employee_id: &str, office_location: &str) -> Details {
    Details {
        id: None,
        employee_id: employee_id.into(),
        photo: None,
        employment_type: EmploymentType::FullTime,
        office_location: office_location.into(),
        notes: None,
    }
}

#[derive(Default)]
pub struct FakeBasicInfo {
    records: Mutex<Vec<BasicInfo>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    creates: AtomicUsize,
}

impl FakeBasicInfo {
    pub fn with_records(records: Vec<BasicInfo>) -> Self {
        let fake = Self::default();
        for record in records {
            fake.insert(record);
        }
        fake
    }

    pub fn fail_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn records(&self) -> Vec<BasicInfo> {
        self.records.lock().expect("records").clone()
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn insert(&self, mut record: BasicInfo) -> BasicInfo {
        let mut records = self.records.lock().expect("records");
        record.id = Some(RecordId(records.len() as i64 + 1));
        records.push(record.clone());
        record
    }
}

#[async_trait]
impl BasicInfoApi for FakeBasicInfo {
    async fn get_all(&self) -> Result<Vec<BasicInfo>, ClientError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.records())
    }

    async fn get_paginated(&self, p: u32, limit: u32) -> Result<Vec<BasicInfo>, ClientError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(page(&self.records(), p, limit))
    }

    async fn create(&self, data: &BasicInfo) -> Result<BasicInfo, ClientError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(self.insert(data.clone()))
    }

    async fn get_departments(&self, search: Option<&str>) -> Result<Vec<LookupItem>, ClientError> {
        Ok(matching(
            &["Engineering", "Finance", "Operations", "Lending"],
            search,
        ))
    }
}

#[derive(Default)]
pub struct FakeDetails {
    records: Mutex<Vec<Details>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl FakeDetails {
    pub fn with_records(records: Vec<Details>) -> Self {
        let fake = Self::default();
        for record in records {
            fake.insert(record);
        }
        fake
    }

    pub fn fail_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn records(&self) -> Vec<Details> {
        self.records.lock().expect("records").clone()
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn insert(&self, mut record: Details) -> Details {
        let mut records = self.records.lock().expect("records");
        record.id = Some(RecordId(records.len() as i64 + 1));
        records.push(record.clone());
        record
    }

    fn check_reads(&self) -> Result<(), ClientError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl DetailsApi for FakeDetails {
    async fn get_all(&self) -> Result<Vec<Details>, ClientError> {
        self.check_reads()?;
        Ok(self.records())
    }

    async fn get_paginated(&self, p: u32, limit: u32) -> Result<Vec<Details>, ClientError> {
        self.check_reads()?;
        Ok(page(&self.records(), p, limit))
    }

    async fn create(&self, data: &Details) -> Result<Details, ClientError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(self.insert(data.clone()))
    }

    async fn get_by_employee_id(&self, employee_id: &str) -> Result<Vec<Details>, ClientError> {
        self.check_reads()?;
        Ok(self
            .records()
            .into_iter()
            .filter(|record| record.employee_id == employee_id)
            .collect())
    }

    async fn update(&self, id: RecordId, patch: &DetailsPatch) -> Result<Details, ClientError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().expect("records");
        let Some(record) = records.iter_mut().find(|record| record.id == Some(id)) else {
            return Err(ApiError::new(404, "Not Found", "{}").into());
        };
        if let Some(v) = &patch.employee_id {
            record.employee_id = v.clone();
        }
        if patch.photo.is_some() {
            record.photo = patch.photo.clone();
        }
        if let Some(v) = patch.employment_type {
            record.employment_type = v;
        }
        if let Some(v) = &patch.office_location {
            record.office_location = v.clone();
        }
        if patch.notes.is_some() {
            record.notes = patch.notes.clone();
        }
        Ok(record.clone())
    }

    async fn get_locations(&self, search: Option<&str>) -> Result<Vec<LookupItem>, ClientError> {
        Ok(matching(&["Berlin", "New York", "Lagos"], search))
    }
}
