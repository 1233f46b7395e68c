//! HTTP handlers for the Books module.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::{ApiResponse, AppError};
use serde::Serialize;

use super::models::{Book, BookFilter, BookId, BookInput, BookSummary};
use super::store::{BookStore, StoreError, ValidationError};

/// Store shared by every handler; the mutex is the only synchronisation point.
pub type SharedStore = Arc<Mutex<BookStore>>;

/// Routes mounted under `/api/books`.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(add_book))
        .route("/{id}", get(get_book).put(edit_book).delete(delete_book))
        .with_state(store)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedBook {
    book_id: BookId,
}

#[derive(Debug, Serialize)]
struct BookList {
    books: Vec<BookSummary>,
}

#[derive(Debug, Serialize)]
struct BookDetail {
    book: Book,
}

/// Operation a store failure is reported against.
#[derive(Debug, Clone, Copy)]
enum Action {
    Add,
    Show,
    Update,
    Delete,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Show => "show",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    fn reject(self, err: StoreError) -> AppError {
        match err {
            StoreError::Validation(ValidationError::MissingName) => AppError::validation(format!(
                "Failed to {} book. Please provide the book name",
                self.verb()
            )),
            StoreError::Validation(ValidationError::ReadPageExceedsPageCount) => {
                AppError::validation(format!(
                    "Failed to {} book. readPage must not be greater than pageCount",
                    self.verb()
                ))
            }
            StoreError::NotFound(_) => match self {
                Action::Show => AppError::not_found("Book not found"),
                _ => AppError::not_found(format!(
                    "Failed to {} book. Id not found",
                    self.verb()
                )),
            },
            internal @ StoreError::Internal(_) => AppError::Internal(
                anyhow::Error::new(internal).context(format!("Failed to {} book", self.verb())),
            ),
        }
    }
}

fn lock(store: &SharedStore) -> Result<MutexGuard<'_, BookStore>, AppError> {
    store
        .lock()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("book store lock poisoned")))
}

fn payload(body: Result<Json<BookInput>, JsonRejection>) -> Result<BookInput, AppError> {
    body.map(|Json(input)| input)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

fn book_id(path: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

/// Raw query pairs never fail to decode, so listing itself cannot be rejected.
fn list_filter(
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<BookFilter, AppError> {
    query
        .map(|Query(pairs)| BookFilter::from_pairs(pairs))
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

async fn add_book(
    State(store): State<SharedStore>,
    body: Result<Json<BookInput>, JsonRejection>,
) -> Result<(StatusCode, ApiResponse<CreatedBook>), AppError> {
    let input = payload(body)?;
    let book_id = lock(&store)?
        .create(input)
        .map_err(|err| Action::Add.reject(err))?;

    tracing::info!(book_id = %book_id, "book added");
    Ok((
        StatusCode::CREATED,
        ApiResponse::data(CreatedBook { book_id }).with_message("Book added successfully"),
    ))
}

async fn list_books(
    State(store): State<SharedStore>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<ApiResponse<BookList>, AppError> {
    let filter = list_filter(query)?;
    let books = lock(&store)?.list(&filter);

    tracing::debug!(count = books.len(), ?filter, "books listed");
    Ok(ApiResponse::data(BookList { books }))
}

async fn get_book(
    State(store): State<SharedStore>,
    path: Result<Path<String>, PathRejection>,
) -> Result<ApiResponse<BookDetail>, AppError> {
    let id = book_id(path)?;
    let book = lock(&store)?
        .get_by_id(&id)
        .map_err(|err| Action::Show.reject(err))?;

    Ok(ApiResponse::data(BookDetail { book }))
}

async fn edit_book(
    State(store): State<SharedStore>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<BookInput>, JsonRejection>,
) -> Result<ApiResponse, AppError> {
    let id = book_id(path)?;
    let input = payload(body)?;
    lock(&store)?
        .update_by_id(&id, input)
        .map_err(|err| Action::Update.reject(err))?;

    tracing::info!(book_id = %id, "book updated");
    Ok(ApiResponse::message("Book updated successfully"))
}

async fn delete_book(
    State(store): State<SharedStore>,
    path: Result<Path<String>, PathRejection>,
) -> Result<ApiResponse, AppError> {
    let id = book_id(path)?;
    lock(&store)?
        .delete_by_id(&id)
        .map_err(|err| Action::Delete.reject(err))?;

    tracing::info!(book_id = %id, "book deleted");
    Ok(ApiResponse::message("Book deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(SharedStore::default())
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn book(name: &str, page_count: u32, read_page: u32) -> Value {
        json!({
            "name": name,
            "year": 2010,
            "author": "John Doe",
            "summary": "Lorem ipsum dolor sit amet",
            "publisher": "Dicoding Indonesia",
            "pageCount": page_count,
            "readPage": read_page,
            "reading": false
        })
    }

    async fn add(app: &Router, payload: Value) -> String {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["data"]["bookId"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn add_book_returns_created_id() {
        let app = app();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/", book("Buku A", 100, 25)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Book added successfully");
        assert_eq!(body["data"]["bookId"].as_str().unwrap().len(), 16);
    }

    #[tokio::test]
    async fn add_book_without_name_fails() {
        let mut payload = book("ignored", 100, 25);
        payload.as_object_mut().unwrap().remove("name");

        let response = app()
            .oneshot(json_request("POST", "/", payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(
            body["message"],
            "Failed to add book. Please provide the book name"
        );
    }

    #[tokio::test]
    async fn add_book_with_read_page_over_page_count_fails() {
        let response = app()
            .oneshot(json_request("POST", "/", book("Buku A", 80, 90)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["message"],
            "Failed to add book. readPage must not be greater than pageCount"
        );
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["status"], "fail");
    }

    #[tokio::test]
    async fn get_book_returns_full_record() {
        let app = app();
        let id = add(&app, book("Buku A", 100, 100)).await;

        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/{id}")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let record = &body["data"]["book"];
        assert_eq!(record["id"], id.as_str());
        assert_eq!(record["name"], "Buku A");
        assert_eq!(record["finished"], true);
        assert_eq!(record["insertedAt"], record["updatedAt"]);
    }

    #[tokio::test]
    async fn get_unknown_book_is_not_found() {
        let response = app()
            .oneshot(empty_request("GET", "/xxxxxxxxxxxxxxxx"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "Book not found");
    }

    #[tokio::test]
    async fn list_books_returns_summaries() {
        let app = app();
        let done = add(&app, book("Done", 10, 10)).await;
        add(&app, book("Pending", 10, 3)).await;

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/?finished=1&name=pending"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["data"]["books"],
            json!([{"id": done, "name": "Done", "publisher": "Dicoding Indonesia"}])
        );

        let response = app
            .oneshot(empty_request("GET", "/"))
            .await
            .unwrap();
        let books = body_json(response).await["data"]["books"].clone();
        assert_eq!(books.as_array().unwrap().len(), 2);
        assert!(books[0].get("pageCount").is_none());
    }

    #[tokio::test]
    async fn list_with_repeated_query_keys_uses_first_value() {
        let app = app();
        add(&app, book("Atomic Habits", 10, 10)).await;
        add(&app, book("Deep Work", 10, 2)).await;

        let response = app
            .oneshot(empty_request("GET", "/?name=atomic&name=deep&finished=x&finished=0"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["books"][0]["name"], "Atomic Habits");
        assert_eq!(body["data"]["books"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn undecodable_path_id_is_enveloped_bad_request() {
        let response = app()
            .oneshot(empty_request("GET", "/%FF%FE"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["status"], "fail");
    }

    #[tokio::test]
    async fn edit_book_updates_record() {
        let app = app();
        let id = add(&app, book("Draft", 100, 10)).await;

        let response = app
            .clone()
            .oneshot(json_request("PUT", &format!("/{id}"), book("Final", 100, 100)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Book updated successfully");

        let response = app
            .oneshot(empty_request("GET", &format!("/{id}")))
            .await
            .unwrap();
        let record = body_json(response).await["data"]["book"].clone();
        assert_eq!(record["name"], "Final");
        assert_eq!(record["finished"], true);
        assert_ne!(record["insertedAt"], record["updatedAt"]);
    }

    #[tokio::test]
    async fn edit_validates_before_checking_id() {
        let app = app();

        let mut nameless = book("x", 10, 1);
        nameless.as_object_mut().unwrap().remove("name");
        let response = app
            .clone()
            .oneshot(json_request("PUT", "/unknown", nameless))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["message"],
            "Failed to update book. Please provide the book name"
        );

        let response = app
            .oneshot(json_request("PUT", "/unknown", book("Valid", 10, 1)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["message"],
            "Failed to update book. Id not found"
        );
    }

    #[tokio::test]
    async fn delete_book_then_lookup_fails() {
        let app = app();
        let id = add(&app, book("Temp", 10, 0)).await;

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", &format!("/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "Book deleted successfully"
        );

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", &format!("/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["message"],
            "Failed to delete book. Id not found"
        );

        let response = app
            .oneshot(empty_request("GET", &format!("/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_store_error_maps_to_server_error() {
        let err = Action::Add.reject(StoreError::Internal("lost record".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(format!("{err:#}").contains("Failed to add book: internal store error"));
    }
}
