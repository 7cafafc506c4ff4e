use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use tracing::instrument;
use validator::Validate;

use crate::{
    core::{
        jwt_auth::{AdminUser, AuthenticatedUser},
        AppError, AppSuccessResponse, StorageClient,
    },
    db::{Library, Record},
    models::{
        books::{Book, BookDraft, BookListQuery, BookUpdate},
        listing,
    },
    routes::{
        catalog::{find_or_404, list_or_refresh, serve_download},
        uploads::{read_upload_form, resolve_download_url, store_file},
    },
};

#[instrument(name = "List Books", skip(library))]
#[get("")]
pub async fn list_books(
    library: web::Data<Library>,
    query: web::Query<BookListQuery>,
) -> Result<impl Responder, AppError> {
    let query = query.into_inner();
    let books = list_or_refresh(&library.books, query.refresh).await?;

    let page = listing::apply(&books, &query.to_list_query());
    let message = if page.meta.total_items == 0 {
        "No books match the current filters"
    } else {
        "Books retrieved successfully"
    };

    Ok(HttpResponse::Ok().json(AppSuccessResponse::paginated(message, page.items, page.meta)))
}

#[instrument(name = "Get Book", skip(library))]
#[get("/{book_id}")]
pub async fn get_book(
    library: web::Data<Library>,
    book_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let book = find_or_404(&library.books, book_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new("Book retrieved successfully", book)))
}

#[instrument(name = "Download Book", skip(library, user))]
#[get("/{book_id}/download")]
pub async fn download_book(
    library: web::Data<Library>,
    book_id: web::Path<i64>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    serve_download(&library.books, library.usage.as_ref(), book_id.into_inner(), user).await
}

#[instrument(name = "Upload Book", skip(library, storage, payload))]
#[post("")]
pub async fn upload_book(
    library: web::Data<Library>,
    storage: web::Data<StorageClient>,
    admin: AdminUser,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let mut form = read_upload_form(payload).await?;

    let mut draft = BookDraft::from_form(&form.fields).map_err(AppError::validation)?;
    draft.validate()?;

    let cover = form.take_file("cover");
    if cover.as_ref().is_some_and(|c| c.bytes.is_empty()) {
        return Err(AppError::validation("Cover image is empty"));
    }

    let (download_url, format) =
        resolve_download_url(&mut form, &storage, Book::KIND, "books").await?;
    draft.download_url = download_url;
    if draft.format.is_none() {
        draft.format = format;
    }

    draft.cover_image = match cover {
        Some(cover) => {
            let stored = store_file(&storage, Book::KIND, "covers", cover)
                .await
                .map_err(|e| {
                    tracing::warn!(
                        orphaned = %draft.download_url,
                        "cover upload failed after the book file was stored"
                    );
                    e
                })?;
            Some(stored.public_url)
        }
        None => form.field("coverImage").map(str::to_string),
    };

    let book = library.books.create(&draft).await?;

    tracing::info!(book_id = book.id, admin = %admin.0.email, "book uploaded");

    Ok(HttpResponse::Created().json(AppSuccessResponse::new("Book uploaded successfully", book)))
}

#[instrument(name = "Update Book", skip(library))]
#[put("/{book_id}")]
pub async fn update_book(
    library: web::Data<Library>,
    admin: AdminUser,
    book_id: web::Path<i64>,
    body: web::Json<BookUpdate>,
) -> Result<impl Responder, AppError> {
    let book_id = book_id.into_inner();
    let current = find_or_404(&library.books, book_id).await?;

    let draft = body.into_inner().apply(&current);
    draft.validate()?;

    let book = library
        .books
        .update(book_id, &draft)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No book with id {}", book_id)))?;

    tracing::info!(book_id, admin = %admin.0.email, "book updated");

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new("Book updated successfully", book)))
}

#[instrument(name = "Delete Book", skip(library))]
#[delete("/{book_id}")]
pub async fn delete_book(
    library: web::Data<Library>,
    admin: AdminUser,
    book_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let book_id = book_id.into_inner();

    if !library.books.delete(book_id).await? {
        return Err(AppError::not_found(format!("No book with id {}", book_id)));
    }

    tracing::info!(book_id, admin = %admin.0.email, "book deleted");

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new("Book deleted successfully", book_id)))
}
