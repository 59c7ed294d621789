//! /todos: GET, HEAD, POST and title filtering

use anyhow::ensure;
use futures::FutureExt;
use todo_harness::model::{ErrorMessages, TodoFields, TodoList};
use todo_harness::runner::CaseFuture;
use todo_harness::{xml, TestCase, TodoClient};

use super::{create, expect_status};

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "list_todos_returns_defaults",
            tags: &["json", "todos"],
            body: list_todos_returns_defaults,
        },
        TestCase {
            name: "list_todos_is_read_only",
            tags: &["json", "todos"],
            body: list_todos_is_read_only,
        },
        TestCase {
            name: "head_todos_has_no_body",
            tags: &["json", "todos"],
            body: head_todos_has_no_body,
        },
        TestCase {
            name: "create_todo_with_all_fields",
            tags: &["json", "todos"],
            body: create_todo_with_all_fields,
        },
        TestCase {
            name: "create_todo_title_only_applies_defaults",
            tags: &["json", "todos"],
            body: create_todo_title_only_applies_defaults,
        },
        TestCase {
            name: "create_todo_without_title_is_rejected",
            tags: &["json", "todos"],
            body: create_todo_without_title_is_rejected,
        },
        TestCase {
            name: "create_todo_with_empty_title_is_rejected",
            tags: &["json", "todos"],
            body: create_todo_with_empty_title_is_rejected,
        },
        TestCase {
            name: "create_todo_with_invalid_done_status_is_rejected",
            tags: &["json", "todos"],
            body: create_todo_with_invalid_done_status_is_rejected,
        },
        TestCase {
            name: "create_todo_with_malformed_json_is_rejected",
            tags: &["json", "todos"],
            body: create_todo_with_malformed_json_is_rejected,
        },
        TestCase {
            name: "filter_todos_by_exact_title",
            tags: &["json", "todos"],
            body: filter_todos_by_exact_title,
        },
        TestCase {
            name: "list_todos_xml_content_type",
            tags: &["xml", "todos"],
            body: list_todos_xml_content_type,
        },
        TestCase {
            name: "list_todos_xml_contains_defaults",
            tags: &["xml", "todos"],
            body: list_todos_xml_contains_defaults,
        },
        TestCase {
            name: "create_todo_xml",
            tags: &["xml", "todos"],
            body: create_todo_xml,
        },
        TestCase {
            name: "create_todo_xml_title_only_applies_defaults",
            tags: &["xml", "todos"],
            body: create_todo_xml_title_only_applies_defaults,
        },
        TestCase {
            name: "create_todo_xml_without_title_is_rejected",
            tags: &["xml", "todos"],
            body: create_todo_xml_without_title_is_rejected,
        },
        TestCase {
            name: "create_todo_with_malformed_xml_is_rejected",
            tags: &["xml", "todos"],
            body: create_todo_with_malformed_xml_is_rejected,
        },
        TestCase {
            name: "filter_todos_by_title_xml",
            tags: &["xml", "todos"],
            body: filter_todos_by_title_xml,
        },
    ]
}

fn list_todos_returns_defaults(client: TodoClient) -> CaseFuture {
    async move {
        let response = client.list_todos().await?;
        expect_status(&response, 200)?;
        ensure!(response.is_json(), "content type was {:?}", response.content_type);

        let todos = response.json::<TodoList>()?.into_records();
        ensure!(todos.len() >= 2, "expected the two default todos, got {}", todos.len());
        Ok(())
    }
    .boxed()
}

fn list_todos_is_read_only(client: TodoClient) -> CaseFuture {
    async move {
        let before = client.list_todos().await?.json::<TodoList>()?.into_records().len();
        client.list_todos().await?;
        let after = client.list_todos().await?.json::<TodoList>()?.into_records().len();
        ensure!(before == after, "listing changed the count: {} -> {}", before, after);
        Ok(())
    }
    .boxed()
}

fn head_todos_has_no_body(client: TodoClient) -> CaseFuture {
    async move {
        let response = client.head_todos().await?;
        expect_status(&response, 200)?;
        ensure!(response.content_type.is_some(), "HEAD response has no Content-Type");
        ensure!(response.body.is_empty(), "HEAD response body should be empty");
        Ok(())
    }
    .boxed()
}

fn create_todo_with_all_fields(client: TodoClient) -> CaseFuture {
    async move {
        let created = create(
            &client,
            TodoFields::new("full todo", "full description", true),
        )
        .await?;
        ensure!(!created.id.is_empty(), "no id assigned");
        ensure!(created.title == "full todo");
        ensure!(created.description == "full description");
        ensure!(created.done_status);
        Ok(())
    }
    .boxed()
}

fn create_todo_title_only_applies_defaults(client: TodoClient) -> CaseFuture {
    async move {
        let created = create(&client, TodoFields::title_only("title only todo")).await?;
        ensure!(created.title == "title only todo");
        ensure!(!created.done_status, "doneStatus should default to false");
        ensure!(created.description.is_empty(), "description should default to empty");
        Ok(())
    }
    .boxed()
}

fn create_todo_without_title_is_rejected(client: TodoClient) -> CaseFuture {
    async move {
        let fields = TodoFields {
            description: Some("no title".to_string()),
            done_status: Some(false),
            ..Default::default()
        };
        let response = client.create_todo(&fields).await?;
        expect_status(&response, 400)?;

        let errors: ErrorMessages = response.json()?;
        ensure!(
            errors.error_messages.first().map(String::as_str) == Some("title : field is mandatory"),
            "unexpected error messages: {:?}",
            errors.error_messages
        );
        Ok(())
    }
    .boxed()
}

fn create_todo_with_empty_title_is_rejected(client: TodoClient) -> CaseFuture {
    async move {
        let response = client.create_todo(&TodoFields::title_only("")).await?;
        expect_status(&response, 400)
    }
    .boxed()
}

fn create_todo_with_invalid_done_status_is_rejected(client: TodoClient) -> CaseFuture {
    async move {
        let response = client
            .create_todo_raw(r#"{"title":"bad status","doneStatus":"notABoolean"}"#)
            .await?;
        expect_status(&response, 400)
    }
    .boxed()
}

fn create_todo_with_malformed_json_is_rejected(client: TodoClient) -> CaseFuture {
    async move {
        let response = client.create_todo_raw("{title: broken json, missing quotes").await?;
        expect_status(&response, 400)
    }
    .boxed()
}

fn filter_todos_by_exact_title(client: TodoClient) -> CaseFuture {
    async move {
        create(&client, TodoFields::new("unique filter title", "for filtering", false)).await?;

        let response = client.todos_by_title("unique filter title").await?;
        expect_status(&response, 200)?;

        let filtered = response.json::<TodoList>()?.into_records();
        ensure!(filtered.len() == 1, "expected one match, got {}", filtered.len());
        ensure!(filtered[0].title == "unique filter title");
        Ok(())
    }
    .boxed()
}

fn list_todos_xml_content_type(client: TodoClient) -> CaseFuture {
    async move {
        let response = client.list_todos_xml().await?;
        expect_status(&response, 200)?;
        ensure!(response.is_xml(), "content type was {:?}", response.content_type);
        Ok(())
    }
    .boxed()
}

fn list_todos_xml_contains_defaults(client: TodoClient) -> CaseFuture {
    async move {
        let response = client.list_todos_xml().await?;
        expect_status(&response, 200)?;
        ensure!(
            response.xml_text("title").is_some(),
            "listing has no todo title: {}",
            response.body
        );
        Ok(())
    }
    .boxed()
}

fn create_todo_xml(client: TodoClient) -> CaseFuture {
    async move {
        let body = xml::element(
            "todo",
            &[
                ("title", "XML Created Todo"),
                ("doneStatus", "false"),
                ("description", "Created via XML"),
            ],
        );
        let response = client.create_todo_xml(&body).await?;
        expect_status(&response, 201)?;
        ensure!(response.xml_text("title").as_deref() == Some("XML Created Todo"));
        ensure!(response.xml_text("description").as_deref() == Some("Created via XML"));
        Ok(())
    }
    .boxed()
}

fn create_todo_xml_title_only_applies_defaults(client: TodoClient) -> CaseFuture {
    async move {
        let body = xml::element("todo", &[("title", "XML Title Only")]);
        let response = client.create_todo_xml(&body).await?;
        expect_status(&response, 201)?;
        ensure!(response.xml_text("title").as_deref() == Some("XML Title Only"));
        ensure!(response.xml_text("doneStatus").as_deref() == Some("false"));
        Ok(())
    }
    .boxed()
}

fn create_todo_xml_without_title_is_rejected(client: TodoClient) -> CaseFuture {
    async move {
        let body = xml::element("todo", &[("description", "no title")]);
        let response = client.create_todo_xml(&body).await?;
        expect_status(&response, 400)
    }
    .boxed()
}

fn create_todo_with_malformed_xml_is_rejected(client: TodoClient) -> CaseFuture {
    async move {
        let response = client.create_todo_xml("<todo><title>broken xml").await?;
        expect_status(&response, 400)
    }
    .boxed()
}

fn filter_todos_by_title_xml(client: TodoClient) -> CaseFuture {
    async move {
        let body = xml::element(
            "todo",
            &[
                ("title", "xml filter target"),
                ("doneStatus", "false"),
                ("description", "for xml filtering"),
            ],
        );
        expect_status(&client.create_todo_xml(&body).await?, 201)?;

        let response = client.todos_by_title_xml("xml filter target").await?;
        expect_status(&response, 200)?;
        ensure!(response.xml_text("title").as_deref() == Some("xml filter target"));
        Ok(())
    }
    .boxed()
}
