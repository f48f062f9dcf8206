//! Server-rendered admin console under `/admin/`
//!
//! ```text
//! /admin/                              dashboard (staff)
//! /admin/login/  /admin/logout/
//! /admin/app/report/                   report (staff)
//! /admin/app/:model/                   changelist (superuser)
//! /admin/app/:model/add/
//! /admin/app/:model/:id/change/
//! /admin/app/:model/:id/delete/
//! ```
//!
//! Pages are rendered with handlebars using the resolved theme.

pub mod forms;
pub mod registry;
pub mod session;
pub mod templates;
pub mod views;

use axum::{
    response::Redirect,
    routing::{get, post},
    Router,
};

use crate::app::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(views::index))
        .route("/admin/login/", get(views::login_page).post(views::login))
        .route("/admin/logout/", post(views::logout))
        .route("/admin/app/", get(|| async { Redirect::permanent("/admin/") }))
        .route("/admin/app/report/", get(views::report))
        .route("/admin/app/:model/", get(views::changelist))
        .route("/admin/app/:model/add/", get(views::add_page).post(views::add))
        .route(
            "/admin/app/:model/:id/change/",
            get(views::change_page).post(views::change),
        )
        .route(
            "/admin/app/:model/:id/delete/",
            get(views::delete_page).post(views::delete),
        )
}
