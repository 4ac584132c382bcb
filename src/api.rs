// 🌐 REST API with Axum
//
// Thin layer over the core: handlers parse requests, take the store lock
// once, call a single core operation and render the result. The one
// `Mutex` around the store is what makes borrow/return/reserve atomic.

use crate::borrowing;
use crate::catalog::{self, SearchQuery};
use crate::entities::{Book, Member, MemberPatch, MembershipTier, NewBook, NewMember, Reservation};
use crate::error::{EntityKind, LibraryError};
use crate::reports;
use crate::reservations::{self, ReservationRequest};
use crate::store::LibraryStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<LibraryStore>>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: LibraryStore) -> Self {
        AppState {
            store: Arc::new(Mutex::new(store)),
            started_at: Instant::now(),
        }
    }

    /// Core operations never panic half-way, so a poisoned lock still
    /// guards a consistent store.
    fn store(&self) -> MutexGuard<'_, LibraryStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// `LibraryError` rendered as `{error, message, details?}`
#[derive(Debug)]
pub struct ApiError(pub LibraryError);

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            LibraryError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match &self.0 {
            LibraryError::ReservationLimitExceeded { current, limit } => Some(json!({
                "current_reservations": current,
                "limit": limit,
            })),
            LibraryError::BookAvailable { .. } => Some(json!({
                "suggestion": "Use the borrow endpoint instead of reservation",
            })),
            LibraryError::LibraryClosed { suggested_dates } => Some(json!({
                "suggested_dates": suggested_dates,
            })),
            LibraryError::ValidationError { field, reason } => Some(json!({
                "field": field,
                "reason": reason,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = %status, code = self.0.code(), error = %self.0, "request rejected");

        let mut body = json!({
            "error": self.0.code(),
            "message": self.0.to_string(),
        });
        if let Some(details) = self.details() {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub member_id: Option<u64>,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub membership_tier: MembershipTier,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub name: Option<String>,
    pub age: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberResponse {
    pub member_id: u64,
    pub name: String,
    pub age: u32,
    pub has_borrowed: bool,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            member_id: member.id,
            name: member.name,
            age: member.age,
            has_borrowed: member.has_borrowed,
        }
    }
}

#[derive(Debug, Serialize)]
struct MemberSummary {
    member_id: u64,
    name: String,
    age: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub book_id: Option<u64>,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub rating: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub book_id: u64,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub is_available: bool,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            book_id: book.id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            is_available: book.is_available,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoanRequest {
    pub member_id: u64,
    pub book_id: u64,
}

#[derive(Debug, Serialize)]
struct BorrowResponse {
    transaction_id: u64,
    member_id: u64,
    book_id: u64,
    borrowed_at: DateTime<Utc>,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ReturnResponse {
    transaction_id: u64,
    member_id: u64,
    book_id: u64,
    returned_at: Option<DateTime<Utc>>,
    status: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
    }))
}

/// POST /api/members
async fn create_member(
    State(state): State<AppState>,
    Json(req): Json<CreateMemberRequest>,
) -> ApiResult<MemberResponse> {
    let data = NewMember {
        id: req.member_id,
        name: req.name,
        age: req.age,
        membership_tier: req.membership_tier,
    };
    let member = state.store().create_member(data)?;
    Ok(Json(member.into()))
}

/// GET /api/members
async fn list_members(State(state): State<AppState>) -> impl IntoResponse {
    let members: Vec<MemberSummary> = state
        .store()
        .all_members()
        .iter()
        .map(|m| MemberSummary {
            member_id: m.id,
            name: m.name.clone(),
            age: m.age,
        })
        .collect();

    Json(json!({ "members": members }))
}

/// GET /api/members/:id
async fn get_member(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<MemberResponse> {
    let member = state
        .store()
        .get_member(id)
        .cloned()
        .ok_or_else(|| LibraryError::not_found(EntityKind::Member, id))?;
    Ok(Json(member.into()))
}

/// PUT /api/members/:id
async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateMemberRequest>,
) -> ApiResult<MemberResponse> {
    let patch = MemberPatch {
        name: req.name,
        age: req.age,
        ..Default::default()
    };
    let member = state.store().update_member_profile(id, patch)?;
    Ok(Json(member.into()))
}

/// DELETE /api/members/:id
async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<serde_json::Value> {
    borrowing::delete_member(&mut state.store(), id)?;
    Ok(Json(json!({
        "message": format!("member with id: {} has been deleted successfully", id),
    })))
}

/// GET /api/members/:id/history
async fn member_history(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<reports::BorrowingHistory> {
    Ok(Json(reports::borrowing_history(&state.store(), id)?))
}

/// POST /api/books
async fn create_book(
    State(state): State<AppState>,
    Json(req): Json<CreateBookRequest>,
) -> ApiResult<BookResponse> {
    let data = NewBook {
        id: req.book_id,
        title: req.title,
        author: req.author,
        isbn: req.isbn,
        category: req.category,
        published_date: req.published_date,
        rating: req.rating,
    };
    let book = state.store().create_book(data)?;
    Ok(Json(book.into()))
}

/// GET /api/books/:id
async fn get_book(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<BookResponse> {
    let book = state
        .store()
        .get_book(id)
        .cloned()
        .ok_or_else(|| LibraryError::not_found(EntityKind::Book, id))?;
    Ok(Json(book.into()))
}

/// DELETE /api/books/:id
async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<serde_json::Value> {
    borrowing::delete_book(&mut state.store(), id)?;
    Ok(Json(json!({
        "message": format!("book with id: {} has been deleted successfully", id),
    })))
}

/// GET /api/books/search
async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<catalog::SearchPage> {
    Ok(Json(catalog::search_books(&state.store(), &query)?))
}

/// POST /api/borrow
async fn borrow(State(state): State<AppState>, Json(req): Json<LoanRequest>) -> impl IntoResponse {
    let result = borrowing::borrow_book(&mut state.store(), req.member_id, req.book_id);

    match result {
        Ok(tx) => Json(BorrowResponse {
            transaction_id: tx.id,
            member_id: tx.member_id,
            book_id: tx.book_id,
            borrowed_at: tx.borrowed_at,
            status: tx.status.as_str(),
        })
        .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// POST /api/return
async fn return_book(
    State(state): State<AppState>,
    Json(req): Json<LoanRequest>,
) -> impl IntoResponse {
    let result = borrowing::return_book(&mut state.store(), req.member_id, req.book_id);

    match result {
        Ok(tx) => Json(ReturnResponse {
            transaction_id: tx.id,
            member_id: tx.member_id,
            book_id: tx.book_id,
            returned_at: tx.returned_at,
            status: tx.status.as_str(),
        })
        .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /api/borrowed
async fn list_borrowed(State(state): State<AppState>) -> impl IntoResponse {
    let borrowed_books = reports::borrowed_books(&state.store());
    Json(json!({ "borrowed_books": borrowed_books }))
}

/// GET /api/overdue
async fn list_overdue(State(state): State<AppState>) -> impl IntoResponse {
    let overdue_books = reports::overdue_books(&state.store(), Utc::now());
    Json(json!({ "overdue_books": overdue_books }))
}

/// POST /api/reservations
async fn create_reservation(
    State(state): State<AppState>,
    Json(req): Json<ReservationRequest>,
) -> ApiResult<serde_json::Value> {
    let receipt = reservations::create_reservation(&mut state.store(), req)?;
    let reservation = &receipt.reservation;

    Ok(Json(json!({
        "reservation_id": reservation.id,
        "member_id": reservation.member_id,
        "book_id": reservation.book_id,
        "book_title": receipt.book_title,
        "reservation_status": reservation.status,
        "queue_position": reservation.queue_position,
        "estimated_availability_date": receipt.estimated_availability_date,
        "priority_score": reservation.priority_score,
        "reservation_details": receipt.reservation_details,
        "queue_analytics": receipt.queue_analytics,
        "member_priority_factors": receipt.member_priority_factors,
        "notifications_scheduled": receipt.notifications_scheduled,
        "conflict_resolution": receipt.conflict_resolution,
    })))
}

/// GET /api/reservations/:id
async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Reservation> {
    Ok(Json(reservations::get_reservation(&state.store(), &id)?))
}

/// DELETE /api/reservations/:id
async fn cancel_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let cancelled = reservations::cancel_reservation(&mut state.store(), &id)?;
    Ok(Json(json!({
        "message": format!("Reservation {} has been cancelled successfully", cancelled.id),
        "reservation_id": cancelled.id,
        "status": cancelled.status,
    })))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/members", post(create_member).get(list_members))
        .route(
            "/members/:id",
            get(get_member).put(update_member).delete(delete_member),
        )
        .route("/members/:id/history", get(member_history))
        .route("/books", post(create_book))
        .route("/books/search", get(search_books))
        .route("/books/:id", get(get_book).delete(delete_book))
        .route("/borrow", post(borrow))
        .route("/return", post(return_book))
        .route("/borrowed", get(list_borrowed))
        .route("/overdue", get(list_overdue))
        .route("/reservations", post(create_reservation))
        .route(
            "/reservations/:id",
            get(get_reservation).delete(cancel_reservation),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Tests
// ============================================================================
