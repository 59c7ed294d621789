//! /todos/:id: GET, POST (amend), PUT (replace) and DELETE

use anyhow::ensure;
use futures::FutureExt;
use todo_harness::model::{ErrorMessages, TodoFields, TodoRecord};
use todo_harness::runner::CaseFuture;
use todo_harness::{xml, TestCase, TodoClient};

use super::{create, expect_status, fetch, UNKNOWN_ID};

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "get_todo_by_id",
            tags: &["json", "todo"],
            body: get_todo_by_id,
        },
        TestCase {
            name: "get_unknown_todo_is_not_found",
            tags: &["json", "todo"],
            body: get_unknown_todo_is_not_found,
        },
        TestCase {
            name: "amend_todo_with_all_fields",
            tags: &["json", "todo"],
            body: amend_todo_with_all_fields,
        },
        TestCase {
            name: "amend_unknown_todo_is_not_found",
            tags: &["json", "todo"],
            body: amend_unknown_todo_is_not_found,
        },
        TestCase {
            name: "replace_todo_with_all_fields",
            tags: &["json", "todo"],
            body: replace_todo_with_all_fields,
        },
        TestCase {
            name: "replace_unknown_todo_is_not_found",
            tags: &["json", "todo"],
            body: replace_unknown_todo_is_not_found,
        },
        TestCase {
            name: "delete_todo",
            tags: &["json", "todo"],
            body: delete_todo,
        },
        TestCase {
            name: "delete_unknown_todo_is_not_found",
            tags: &["json", "todo"],
            body: delete_unknown_todo_is_not_found,
        },
        TestCase {
            name: "get_todo_by_id_xml",
            tags: &["xml", "todo"],
            body: get_todo_by_id_xml,
        },
        TestCase {
            name: "get_unknown_todo_xml_is_not_found",
            tags: &["xml", "todo"],
            body: get_unknown_todo_xml_is_not_found,
        },
        TestCase {
            name: "amend_todo_xml",
            tags: &["xml", "todo"],
            body: amend_todo_xml,
        },
        TestCase {
            name: "amend_unknown_todo_xml_is_not_found",
            tags: &["xml", "todo"],
            body: amend_unknown_todo_xml_is_not_found,
        },
        TestCase {
            name: "replace_todo_xml",
            tags: &["xml", "todo"],
            body: replace_todo_xml,
        },
        TestCase {
            name: "replace_unknown_todo_xml_is_not_found",
            tags: &["xml", "todo"],
            body: replace_unknown_todo_xml_is_not_found,
        },
        TestCase {
            name: "deleted_todo_is_gone_in_xml",
            tags: &["xml", "todo"],
            body: deleted_todo_is_gone_in_xml,
        },
    ]
}

fn get_todo_by_id(client: TodoClient) -> CaseFuture {
    async move {
        let created = create(
            &client,
            TodoFields::new("get by id test", "test description", true),
        )
        .await?;

        let retrieved = fetch(&client, &created.id).await?;
        ensure!(retrieved.id == created.id);
        ensure!(retrieved.title == "get by id test");
        ensure!(retrieved.description == "test description");
        ensure!(retrieved.done_status);
        Ok(())
    }
    .boxed()
}

fn get_unknown_todo_is_not_found(client: TodoClient) -> CaseFuture {
    async move {
        let response = client.get_todo(UNKNOWN_ID).await?;
        expect_status(&response, 404)?;

        let errors: ErrorMessages = response.json()?;
        ensure!(!errors.error_messages.is_empty(), "404 carried no error messages");
        Ok(())
    }
    .boxed()
}

fn amend_todo_with_all_fields(client: TodoClient) -> CaseFuture {
    async move {
        let created = create(&client, TodoFields::new("before amend", "before desc", false)).await?;

        let response = client
            .amend_todo(&created.id, &TodoFields::new("after amend", "after desc", true))
            .await?;
        expect_status(&response, 200)?;

        let amended: TodoRecord = response.json()?;
        ensure!(amended.title == "after amend");
        ensure!(amended.description == "after desc");
        ensure!(amended.done_status);
        Ok(())
    }
    .boxed()
}

fn amend_unknown_todo_is_not_found(client: TodoClient) -> CaseFuture {
    async move {
        let response = client
            .amend_todo(UNKNOWN_ID, &TodoFields::new("nonexistent", "", false))
            .await?;
        expect_status(&response, 404)
    }
    .boxed()
}

fn replace_todo_with_all_fields(client: TodoClient) -> CaseFuture {
    async move {
        let created = create(
            &client,
            TodoFields::new("before update", "before desc", false),
        )
        .await?;

        let response = client
            .replace_todo(&created.id, &TodoFields::new("after update", "after desc", true))
            .await?;
        expect_status(&response, 200)?;

        let updated: TodoRecord = response.json()?;
        ensure!(updated.title == "after update");
        ensure!(updated.description == "after desc");
        ensure!(updated.done_status);
        Ok(())
    }
    .boxed()
}

fn replace_unknown_todo_is_not_found(client: TodoClient) -> CaseFuture {
    async move {
        let response = client
            .replace_todo(UNKNOWN_ID, &TodoFields::new("nonexistent", "", false))
            .await?;
        expect_status(&response, 404)
    }
    .boxed()
}

fn delete_todo(client: TodoClient) -> CaseFuture {
    async move {
        let created = create(&client, TodoFields::new("delete me", "to be deleted", false)).await?;

        expect_status(&client.delete_todo(&created.id).await?, 200)?;
        expect_status(&client.get_todo(&created.id).await?, 404)
    }
    .boxed()
}

fn delete_unknown_todo_is_not_found(client: TodoClient) -> CaseFuture {
    async move { expect_status(&client.delete_todo(UNKNOWN_ID).await?, 404) }.boxed()
}

fn get_todo_by_id_xml(client: TodoClient) -> CaseFuture {
    async move {
        let created = create(
            &client,
            TodoFields::new("xml get test", "xml description", true),
        )
        .await?;

        let response = client.get_todo_xml(&created.id).await?;
        expect_status(&response, 200)?;
        ensure!(response.is_xml(), "content type was {:?}", response.content_type);
        ensure!(response.xml_text("title").as_deref() == Some("xml get test"));
        ensure!(response.xml_text("description").as_deref() == Some("xml description"));
        ensure!(response.xml_text("doneStatus").as_deref() == Some("true"));
        Ok(())
    }
    .boxed()
}

fn get_unknown_todo_xml_is_not_found(client: TodoClient) -> CaseFuture {
    async move { expect_status(&client.get_todo_xml(UNKNOWN_ID).await?, 404) }.boxed()
}

fn amend_todo_xml(client: TodoClient) -> CaseFuture {
    async move {
        let created = create(
            &client,
            TodoFields::new("xml amend before", "before desc", false),
        )
        .await?;

        let body = xml::element(
            "todo",
            &[
                ("title", "xml amend after"),
                ("description", "after desc"),
                ("doneStatus", "true"),
            ],
        );
        let response = client.amend_todo_xml(&created.id, &body).await?;
        expect_status(&response, 200)?;
        ensure!(response.xml_text("title").as_deref() == Some("xml amend after"));
        ensure!(response.xml_text("description").as_deref() == Some("after desc"));
        Ok(())
    }
    .boxed()
}

fn amend_unknown_todo_xml_is_not_found(client: TodoClient) -> CaseFuture {
    async move {
        let body = xml::element("todo", &[("title", "nonexistent")]);
        expect_status(&client.amend_todo_xml(UNKNOWN_ID, &body).await?, 404)
    }
    .boxed()
}

fn replace_todo_xml(client: TodoClient) -> CaseFuture {
    async move {
        let created = create(
            &client,
            TodoFields::new("xml update before", "before desc", false),
        )
        .await?;

        let body = xml::element(
            "todo",
            &[
                ("title", "xml update after"),
                ("description", "after desc"),
                ("doneStatus", "true"),
            ],
        );
        let response = client.replace_todo_xml(&created.id, &body).await?;
        expect_status(&response, 200)?;
        ensure!(response.xml_text("title").as_deref() == Some("xml update after"));
        Ok(())
    }
    .boxed()
}

fn replace_unknown_todo_xml_is_not_found(client: TodoClient) -> CaseFuture {
    async move {
        let body = xml::element("todo", &[("title", "nonexistent")]);
        expect_status(&client.replace_todo_xml(UNKNOWN_ID, &body).await?, 404)
    }
    .boxed()
}

fn deleted_todo_is_gone_in_xml(client: TodoClient) -> CaseFuture {
    async move {
        let created = create(
            &client,
            TodoFields::new("xml delete test", "to be deleted", false),
        )
        .await?;

        expect_status(&client.delete_todo(&created.id).await?, 200)?;
        expect_status(&client.get_todo_xml(&created.id).await?, 404)
    }
    .boxed()
}
