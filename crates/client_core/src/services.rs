use async_trait::async_trait;
use shared::{
    domain::{BasicInfo, Details, DetailsPatch, LookupItem, RecordId},
    protocol::PageQuery,
};

use crate::{error::ClientError, http::JsonClient};

/// Query parameter the lookup endpoints filter on.
pub const NAME_LIKE_PARAM: &str = "name_like";

/// Step 1 backend: basic-info records and the department lookup.
#[async_trait]
pub trait BasicInfoApi: Send + Sync {
    async fn get_all(&self) -> Result<Vec<BasicInfo>, ClientError>;
    async fn get_paginated(&self, page: u32, limit: u32) -> Result<Vec<BasicInfo>, ClientError>;
    async fn create(&self, data: &BasicInfo) -> Result<BasicInfo, ClientError>;
    async fn get_departments(&self, search: Option<&str>) -> Result<Vec<LookupItem>, ClientError>;
}

/// Step 2 backend: details records and the location lookup.
#[async_trait]
pub trait DetailsApi: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Details>, ClientError>;
    async fn get_paginated(&self, page: u32, limit: u32) -> Result<Vec<Details>, ClientError>;
    async fn create(&self, data: &Details) -> Result<Details, ClientError>;
    async fn get_by_employee_id(&self, employee_id: &str) -> Result<Vec<Details>, ClientError>;
    async fn update(&self, id: RecordId, patch: &DetailsPatch) -> Result<Details, ClientError>;
    async fn get_locations(&self, search: Option<&str>) -> Result<Vec<LookupItem>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct BasicInfoService {
    client: JsonClient,
}

impl BasicInfoService {
    pub fn new(client: JsonClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BasicInfoApi for BasicInfoService {
    async fn get_all(&self) -> Result<Vec<BasicInfo>, ClientError> {
        self.client.get("basicInfo").await
    }

    async fn get_paginated(&self, page: u32, limit: u32) -> Result<Vec<BasicInfo>, ClientError> {
        self.client
            .get_with_query("basicInfo", &PageQuery { page, limit })
            .await
    }

    /// The backend assigns the id; any id already on `data` is not sent.
    async fn create(&self, data: &BasicInfo) -> Result<BasicInfo, ClientError> {
        let body = BasicInfo {
            id: None,
            ..data.clone()
        };
        self.client.post("basicInfo", &body).await
    }

    async fn get_departments(&self, search: Option<&str>) -> Result<Vec<LookupItem>, ClientError> {
        lookup(&self.client, "departments", search).await
    }
}

#[derive(Debug, Clone)]
pub struct DetailsService {
    client: JsonClient,
}

impl DetailsService {
    pub fn new(client: JsonClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DetailsApi for DetailsService {
    async fn get_all(&self) -> Result<Vec<Details>, ClientError> {
        self.client.get("details").await
    }

    async fn get_paginated(&self, page: u32, limit: u32) -> Result<Vec<Details>, ClientError> {
        self.client
            .get_with_query("details", &PageQuery { page, limit })
            .await
    }

    async fn create(&self, data: &Details) -> Result<Details, ClientError> {
        let body = Details {
            id: None,
            ..data.clone()
        };
        self.client.post("details", &body).await
    }

    async fn get_by_employee_id(&self, employee_id: &str) -> Result<Vec<Details>, ClientError> {
        self.client
            .get_with_query("details", &[("employeeId", employee_id)])
            .await
    }

    async fn update(&self, id: RecordId, patch: &DetailsPatch) -> Result<Details, ClientError> {
        self.client.patch(&format!("details/{id}"), patch).await
    }

    async fn get_locations(&self, search: Option<&str>) -> Result<Vec<LookupItem>, ClientError> {
        lookup(&self.client, "locations", search).await
    }
}

async fn lookup(
    client: &JsonClient,
    path: &str,
    search: Option<&str>,
) -> Result<Vec<LookupItem>, ClientError> {
    match search {
        Some(query) => {
            client
                .get_with_query(path, &[(NAME_LIKE_PARAM, query)])
                .await
        }
        None => client.get(path).await,
    }
}
