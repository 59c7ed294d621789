//! HTTP client for the todo manager REST API
//!
//! Every request returns an [`ApiResponse`] rather than failing on non-2xx
//! statuses, so tests can assert on error responses. The [`Todos`] and
//! [`Projects`] adapters expose the collections to reconciliation and treat
//! non-2xx statuses as errors.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::collection::RemoteCollection;
use crate::endpoint::ServerEndpoint;
use crate::error::{HarnessError, HarnessResult};
use crate::model::{ProjectFields, ProjectList, ProjectRecord, TodoFields, TodoList, TodoRecord};
use crate::xml;

const JSON: &str = "application/json";
const XML: &str = "application/xml";

/// Captured response from the service
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type.as_deref().is_some_and(|c| c.contains(JSON))
    }

    pub fn is_xml(&self) -> bool {
        self.content_type.as_deref().is_some_and(|c| c.contains(XML))
    }

    pub fn json<T: DeserializeOwned>(&self) -> HarnessResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Text of the first `<element>` in an XML body
    pub fn xml_text(&self, element: &str) -> Option<String> {
        xml::first_text(&self.body, element)
    }
}

/// Client bound to one server endpoint. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TodoClient {
    http: reqwest::Client,
    endpoint: ServerEndpoint,
}

impl TodoClient {
    pub fn new(endpoint: ServerEndpoint) -> HarnessResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    pub fn todos(&self) -> Todos {
        Todos {
            client: self.clone(),
        }
    }

    pub fn projects(&self) -> Projects {
        Projects {
            client: self.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.endpoint.url(path))
    }

    fn json_body<T: Serialize>(&self, method: Method, path: &str, body: &T) -> RequestBuilder {
        self.request(method, path)
            .header(ACCEPT, JSON)
            .json(body)
    }

    fn xml_body(&self, method: Method, path: &str, body: &str) -> RequestBuilder {
        self.request(method, path)
            .header(CONTENT_TYPE, XML)
            .header(ACCEPT, XML)
            .body(body.to_string())
    }

    async fn send(&self, builder: RequestBuilder) -> HarnessResult<ApiResponse> {
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let url = response.url().to_string();
        let body = response.text().await?;
        debug!("{} <- {} ({} bytes)", status, url, body.len());
        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }

    // JSON todos

    pub async fn list_todos(&self) -> HarnessResult<ApiResponse> {
        self.send(self.request(Method::GET, "/todos").header(ACCEPT, JSON))
            .await
    }

    pub async fn head_todos(&self) -> HarnessResult<ApiResponse> {
        self.send(self.request(Method::HEAD, "/todos")).await
    }

    pub async fn get_todo(&self, id: &str) -> HarnessResult<ApiResponse> {
        self.send(self.request(Method::GET, &format!("/todos/{}", id)).header(ACCEPT, JSON))
            .await
    }

    pub async fn todos_by_title(&self, title: &str) -> HarnessResult<ApiResponse> {
        self.send(
            self.request(Method::GET, "/todos")
                .query(&[("title", title)])
                .header(ACCEPT, JSON),
        )
        .await
    }

    pub async fn create_todo(&self, fields: &TodoFields) -> HarnessResult<ApiResponse> {
        self.send(self.json_body(Method::POST, "/todos", fields)).await
    }

    /// POST an arbitrary (possibly malformed) JSON body
    pub async fn create_todo_raw(&self, raw_json: &str) -> HarnessResult<ApiResponse> {
        self.send(
            self.request(Method::POST, "/todos")
                .header(CONTENT_TYPE, JSON)
                .header(ACCEPT, JSON)
                .body(raw_json.to_string()),
        )
        .await
    }

    /// Partial update: POST /todos/:id
    pub async fn amend_todo(&self, id: &str, fields: &TodoFields) -> HarnessResult<ApiResponse> {
        self.send(self.json_body(Method::POST, &format!("/todos/{}", id), fields))
            .await
    }

    /// Full replacement: PUT /todos/:id
    pub async fn replace_todo(&self, id: &str, fields: &TodoFields) -> HarnessResult<ApiResponse> {
        self.send(self.json_body(Method::PUT, &format!("/todos/{}", id), fields))
            .await
    }

    pub async fn delete_todo(&self, id: &str) -> HarnessResult<ApiResponse> {
        self.send(self.request(Method::DELETE, &format!("/todos/{}", id)))
            .await
    }

    pub async fn tasks_of(&self, todo_id: &str) -> HarnessResult<ApiResponse> {
        self.send(
            self.request(Method::GET, &format!("/todos/{}/tasksof", todo_id))
                .header(ACCEPT, JSON),
        )
        .await
    }

    // XML todos

    pub async fn list_todos_xml(&self) -> HarnessResult<ApiResponse> {
        self.send(self.request(Method::GET, "/todos").header(ACCEPT, XML))
            .await
    }

    pub async fn get_todo_xml(&self, id: &str) -> HarnessResult<ApiResponse> {
        self.send(self.request(Method::GET, &format!("/todos/{}", id)).header(ACCEPT, XML))
            .await
    }

    pub async fn todos_by_title_xml(&self, title: &str) -> HarnessResult<ApiResponse> {
        self.send(
            self.request(Method::GET, "/todos")
                .query(&[("title", title)])
                .header(ACCEPT, XML),
        )
        .await
    }

    pub async fn create_todo_xml(&self, body: &str) -> HarnessResult<ApiResponse> {
        self.send(self.xml_body(Method::POST, "/todos", body)).await
    }

    pub async fn amend_todo_xml(&self, id: &str, body: &str) -> HarnessResult<ApiResponse> {
        self.send(self.xml_body(Method::POST, &format!("/todos/{}", id), body))
            .await
    }

    pub async fn replace_todo_xml(&self, id: &str, body: &str) -> HarnessResult<ApiResponse> {
        self.send(self.xml_body(Method::PUT, &format!("/todos/{}", id), body))
            .await
    }

    pub async fn tasks_of_xml(&self, todo_id: &str) -> HarnessResult<ApiResponse> {
        self.send(
            self.request(Method::GET, &format!("/todos/{}/tasksof", todo_id))
                .header(ACCEPT, XML),
        )
        .await
    }

    // Projects

    pub async fn list_projects(&self) -> HarnessResult<ApiResponse> {
        self.send(self.request(Method::GET, "/projects").header(ACCEPT, JSON))
            .await
    }

    pub async fn create_project(&self, fields: &ProjectFields) -> HarnessResult<ApiResponse> {
        self.send(self.json_body(Method::POST, "/projects", fields))
            .await
    }

    pub async fn amend_project(
        &self,
        id: &str,
        fields: &ProjectFields,
    ) -> HarnessResult<ApiResponse> {
        self.send(self.json_body(Method::POST, &format!("/projects/{}", id), fields))
            .await
    }

    pub async fn delete_project(&self, id: &str) -> HarnessResult<ApiResponse> {
        self.send(self.request(Method::DELETE, &format!("/projects/{}", id)))
            .await
    }

    pub async fn link_todo_to_project(
        &self,
        project_id: &str,
        todo_id: &str,
    ) -> HarnessResult<ApiResponse> {
        self.send(self.json_body(
            Method::POST,
            &format!("/projects/{}/tasks", project_id),
            &serde_json::json!({ "id": todo_id }),
        ))
        .await
    }
}

fn expect_success(
    method: &'static str,
    path: String,
    response: ApiResponse,
) -> HarnessResult<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(HarnessError::UnexpectedStatus {
            method,
            url: path,
            status: response.status,
            body: response.body,
        })
    }
}

/// The `/todos` collection
#[derive(Debug, Clone)]
pub struct Todos {
    client: TodoClient,
}

#[async_trait]
impl RemoteCollection for Todos {
    type Record = TodoRecord;
    type Fields = TodoFields;

    fn name(&self) -> &'static str {
        "todos"
    }

    async fn list_all(&self) -> HarnessResult<Vec<TodoRecord>> {
        let response = expect_success("GET", "/todos".into(), self.client.list_todos().await?)?;
        if response.body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(response.json::<TodoList>()?.into_records())
    }

    async fn create(&self, fields: &TodoFields) -> HarnessResult<TodoRecord> {
        let response = expect_success(
            "POST",
            "/todos".into(),
            self.client.create_todo(fields).await?,
        )?;
        response.json()
    }

    async fn update(&self, id: &str, fields: &TodoFields) -> HarnessResult<()> {
        let response = self.client.amend_todo(id, fields).await?;
        expect_success("POST", format!("/todos/{}", id), response)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> HarnessResult<()> {
        let response = self.client.delete_todo(id).await?;
        expect_success("DELETE", format!("/todos/{}", id), response)?;
        Ok(())
    }
}

/// The `/projects` collection
#[derive(Debug, Clone)]
pub struct Projects {
    client: TodoClient,
}

#[async_trait]
impl RemoteCollection for Projects {
    type Record = ProjectRecord;
    type Fields = ProjectFields;

    fn name(&self) -> &'static str {
        "projects"
    }

    async fn list_all(&self) -> HarnessResult<Vec<ProjectRecord>> {
        let response = expect_success(
            "GET",
            "/projects".into(),
            self.client.list_projects().await?,
        )?;
        if response.body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(response.json::<ProjectList>()?.into_records())
    }

    async fn create(&self, fields: &ProjectFields) -> HarnessResult<ProjectRecord> {
        let response = expect_success(
            "POST",
            "/projects".into(),
            self.client.create_project(fields).await?,
        )?;
        response.json()
    }

    async fn update(&self, id: &str, fields: &ProjectFields) -> HarnessResult<()> {
        let response = self.client.amend_project(id, fields).await?;
        expect_success("POST", format!("/projects/{}", id), response)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> HarnessResult<()> {
        let response = self.client.delete_project(id).await?;
        expect_success("DELETE", format!("/projects/{}", id), response)?;
        Ok(())
    }
}
