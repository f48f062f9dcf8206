/// Admin page handlers

use std::collections::HashMap;

use axum::{
    extract::{Form, Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use fueldesk_shared::auth::{authorization, jwt};
use fueldesk_shared::models::{
    creditor::{Creditor, CreditorFilter},
    fuel::{Fuel, FuelFilter},
    machine::{Machine, MachineFilter},
    payment::{Payment, PaymentFilter},
    user::{User, UserFilter},
};
use fueldesk_shared::theme::themes::static_url;
use percent_encoding::utf8_percent_encode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;

use super::forms::{self, FormErrors, FormField};
use super::registry::{resolve_link, side_menu, AdminModel};
use super::session::{self, Access};
use super::templates;
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::services::users;

/// Rows per changelist page
pub const LIST_PER_PAGE: i64 = 10;

/// Highest `?p=` honoured; larger values are clamped
const MAX_PAGE: i64 = i64::MAX / LIST_PER_PAGE;

const LOGIN_ERROR: &str =
    "Please enter the correct mobile no. and password for a staff account. Note that both fields may be case-sensitive.";

/// Shared page context: theme, menus, static assets and the signed-in user
fn page_context(state: &AppState, user: Option<&User>, uri: &Uri, title: &str) -> Value {
    let theme = &state.theme;
    let settings = &theme.settings;
    let base = state.config.static_files.url.as_str();
    let current = uri.path();

    let asset = |path: &str| static_url(base, path);
    let optional = |path: &Option<String>| path.as_deref().map(|p| static_url(base, p));
    let site_icon = if settings.site_icon.is_empty() {
        &settings.site_logo
    } else {
        &settings.site_icon
    };

    let topmenu: Vec<_> = settings
        .topmenu_links
        .iter()
        .map(|l| resolve_link(l, settings, current))
        .collect();
    let usermenu: Vec<_> = settings
        .usermenu_links
        .iter()
        .map(|l| resolve_link(l, settings, current))
        .collect();

    json!({
        "title": title,
        "site": settings,
        "tweaks": theme.tweaks,
        "menu": side_menu(settings, current),
        "topmenu": topmenu,
        "usermenu": usermenu,
        "user": user.map(|u| json!({"name": u.name, "username": u.username})),
        "assets": {
            "site_logo": asset(&settings.site_logo),
            "site_icon": asset(site_icon),
            "fontawesome": asset("vendor/fontawesome-free/css/all.min.css"),
            "adminlte": asset("vendor/adminlte/css/adminlte.min.css"),
            "jquery": asset("vendor/jquery/jquery.min.js"),
            "bootstrap": asset("vendor/bootstrap/js/bootstrap.min.js"),
            "adminlte_js": asset("vendor/adminlte/js/adminlte.min.js"),
            "custom_css": optional(&settings.custom_css),
            "custom_js": optional(&settings.custom_js),
        },
    })
}

/// Adds page-specific keys to a context
fn with(mut ctx: Value, extra: Value) -> Value {
    if let (Some(base), Value::Object(extra)) = (ctx.as_object_mut(), extra) {
        base.extend(extra);
    }
    ctx
}

fn render(state: &AppState, template: &str, ctx: &Value) -> Response {
    match state.templates.render(template, ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            ApiError::InternalError(format!("Rendering {} failed: {}", template, e)).into_response()
        }
    }
}

fn model_or_404(name: &str) -> Result<AdminModel, Response> {
    AdminModel::from_name(name).ok_or_else(|| StatusCode::NOT_FOUND.into_response())
}

// Login

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
    next: Option<String>,
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
    uri: Uri,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = session::safe_next(query.next.as_deref()).to_string();

    if let Ok(ctx) = session::current_context(&state, &jar).await {
        if authorization::require_staff(&ctx).is_ok() {
            return Redirect::to(&next).into_response();
        }
    }

    let ctx = with(
        page_context(&state, None, &uri, "Log in"),
        json!({"next": next}),
    );
    render(&state, templates::LOGIN, &ctx)
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    uri: Uri,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = session::safe_next(form.next.as_deref()).to_string();

    let user = match users::authenticate(&state.db, form.username.trim(), &form.password).await {
        Ok(user) if authorization::can_access_admin(&user) => user,
        Ok(_) | Err(ApiError::Unauthorized(_)) => {
            let ctx = with(
                page_context(&state, None, &uri, "Log in"),
                json!({"next": next, "username": form.username, "error": LOGIN_ERROR}),
            );
            return render(&state, templates::LOGIN, &ctx);
        }
        Err(e) => return e.into_response(),
    };

    let claims = jwt::Claims::new(user.id, user.username.clone(), state.config.jwt_expiration());
    let token = match jwt::create_token(&claims, &state.config.jwt.secret) {
        Ok(token) => token,
        Err(e) => return ApiError::from(e).into_response(),
    };

    tracing::info!(user_id = user.id, "Admin login");

    let jar = jar.add(session::session_cookie(token, state.config.api.production));
    (jar, Redirect::to(&next)).into_response()
}

pub async fn logout(jar: CookieJar) -> Response {
    (session::clear_session(jar), Redirect::to(session::LOGIN_URL)).into_response()
}

// Dashboard

pub async fn index(State(state): State<AppState>, jar: CookieJar, uri: Uri) -> Response {
    let user = match session::require(&state, &jar, &uri, Access::Staff).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let ctx = page_context(&state, Some(&user), &uri, "Dashboard");
    render(&state, templates::INDEX, &ctx)
}

#[derive(Debug, Serialize)]
struct Stat {
    name: &'static str,
    count: i64,
    url: String,
}

async fn record_counts(pool: &PgPool) -> ApiResult<Vec<Stat>> {
    let mut stats = Vec::with_capacity(AdminModel::ALL.len());
    for model in AdminModel::ALL {
        let count = match model {
            AdminModel::User => {
                let filter = UserFilter {
                    exclude_superusers: true,
                    ..Default::default()
                };
                User::count(pool, &filter).await?
            }
            AdminModel::Fuel => Fuel::count(pool, &FuelFilter::default()).await?,
            AdminModel::Payment => Payment::count(pool, &PaymentFilter::default()).await?,
            AdminModel::Machine => Machine::count(pool, &MachineFilter::default()).await?,
            AdminModel::Creditor => Creditor::count(pool, &CreditorFilter::default()).await?,
        };
        stats.push(Stat {
            name: model.verbose_name_plural(),
            count,
            url: model.changelist_url(),
        });
    }
    Ok(stats)
}

pub async fn report(State(state): State<AppState>, jar: CookieJar, uri: Uri) -> Response {
    let user = match session::require(&state, &jar, &uri, Access::Staff).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let stats = match record_counts(&state.db).await {
        Ok(stats) => stats,
        Err(e) => return e.into_response(),
    };

    let ctx = with(
        page_context(&state, Some(&user), &uri, "Report"),
        json!({"stats": stats}),
    );
    render(&state, templates::REPORT, &ctx)
}

// Changelist

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    q: Option<String>,
    p: Option<i64>,
}

#[derive(Debug, Serialize)]
struct Row {
    url: String,
    cells: Vec<String>,
}

/// Fetches one page of rows and the total matching `search`
async fn list_rows(
    pool: &PgPool,
    model: AdminModel,
    search: Option<String>,
    offset: i64,
) -> ApiResult<(i64, Vec<Row>)> {
    let row = |id: i64, cells: Vec<String>| Row {
        url: model.change_url(id),
        cells,
    };

    let result = match model {
        AdminModel::User => {
            let filter = UserFilter {
                exclude_superusers: true,
                search,
                ..Default::default()
            };
            let total = User::count(pool, &filter).await?;
            let rows = User::list(pool, &filter, LIST_PER_PAGE, offset)
                .await?
                .into_iter()
                .map(|u| row(u.id, vec![u.name, u.username, u.authorisation]))
                .collect();
            (total, rows)
        }
        AdminModel::Fuel => {
            let filter = FuelFilter {
                search,
                ..Default::default()
            };
            let total = Fuel::count(pool, &filter).await?;
            let rows = Fuel::list(pool, &filter, LIST_PER_PAGE, offset)
                .await?
                .into_iter()
                .map(|f| row(f.id, vec![f.fuel_type, f.price.to_string()]))
                .collect();
            (total, rows)
        }
        AdminModel::Payment => {
            let filter = PaymentFilter {
                search,
                ..Default::default()
            };
            let total = Payment::count(pool, &filter).await?;
            let rows = Payment::list(pool, &filter, LIST_PER_PAGE, offset)
                .await?
                .into_iter()
                .map(|p| {
                    let allowed = if p.allowed_subcategory { "Yes" } else { "No" };
                    row(p.id, vec![p.mode, allowed.to_string()])
                })
                .collect();
            (total, rows)
        }
        AdminModel::Machine => {
            let filter = MachineFilter {
                search,
                ..Default::default()
            };
            let total = Machine::count(pool, &filter).await?;
            let machines = Machine::list(pool, &filter, LIST_PER_PAGE, offset).await?;

            let fuel_ids: Vec<i64> = machines.iter().map(|m| m.fuel_id).collect();
            let fuels: HashMap<i64, String> = Fuel::find_by_ids(pool, &fuel_ids)
                .await?
                .into_iter()
                .map(|f| (f.id, f.fuel_type))
                .collect();

            let rows = machines
                .into_iter()
                .map(|m| {
                    let fuel = fuels.get(&m.fuel_id).cloned().unwrap_or_default();
                    row(m.id, vec![m.name, fuel, m.reading.to_string()])
                })
                .collect();
            (total, rows)
        }
        AdminModel::Creditor => {
            let filter = CreditorFilter {
                search,
                ..Default::default()
            };
            let total = Creditor::count(pool, &filter).await?;
            let creditors = Creditor::list(pool, &filter, LIST_PER_PAGE, offset).await?;

            let modes: HashMap<i64, String> = Payment::all(pool)
                .await?
                .into_iter()
                .map(|p| (p.id, p.mode))
                .collect();

            let rows = creditors
                .into_iter()
                .map(|c| {
                    let mode = modes.get(&c.payment_id).cloned().unwrap_or_default();
                    row(c.id, vec![mode, c.name, c.limit_warning, c.limit_stop_credit])
                })
                .collect();
            (total, rows)
        }
    };

    Ok(result)
}

fn page_url(base: &str, query: Option<&str>, page: i64) -> String {
    match query {
        Some(q) => format!(
            "{}?q={}&p={}",
            base,
            utf8_percent_encode(q, session::QUERY_VALUE),
            page
        ),
        None => format!("{}?p={}", base, page),
    }
}

/// `?p=` as a 1-based page whose offset fits in an `i64`
fn requested_page(p: Option<i64>) -> i64 {
    p.unwrap_or(1).clamp(1, MAX_PAGE)
}

/// Number of pages for `total` rows, never less than one
pub fn page_count(total: i64) -> i64 {
    ((total + LIST_PER_PAGE - 1) / LIST_PER_PAGE).max(1)
}

pub async fn changelist(
    State(state): State<AppState>,
    jar: CookieJar,
    uri: Uri,
    Path(model): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    let user = match session::require(&state, &jar, &uri, Access::Superuser).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let model = match model_or_404(&model) {
        Ok(model) => model,
        Err(response) => return response,
    };

    let search = query.q.filter(|q| !q.trim().is_empty());
    let page = requested_page(query.p);
    let offset = (page - 1) * LIST_PER_PAGE;

    let (total, rows) = match list_rows(&state.db, model, search.clone(), offset).await {
        Ok(result) => result,
        Err(e) => return e.into_response(),
    };
    let pages = page_count(total);
    let page = page.min(pages);

    let base = model.changelist_url();
    let title = format!("Select {} to change", model.verbose_name());
    let total_label = if total == 1 {
        model.verbose_name()
    } else {
        model.verbose_name_plural()
    };

    let ctx = with(
        page_context(&state, Some(&user), &uri, &title),
        json!({
            "columns": model.list_display(),
            "rows": rows,
            "query": search.clone().unwrap_or_default(),
            "total": total,
            "total_label": total_label,
            "page": page,
            "pages": pages,
            "previous_url": (page > 1).then(|| page_url(&base, search.as_deref(), page - 1)),
            "next_url": (page < pages).then(|| page_url(&base, search.as_deref(), page + 1)),
            "add_url": model.add_url(),
            "verbose_name": model.verbose_name(),
            "verbose_name_plural": model.verbose_name_plural(),
        }),
    );
    render(&state, templates::CHANGE_LIST, &ctx)
}

// Add / change

fn form_page(
    state: &AppState,
    user: &User,
    uri: &Uri,
    model: AdminModel,
    id: Option<i64>,
    fields: Vec<FormField>,
    non_field_errors: Vec<String>,
) -> Response {
    let title = match id {
        Some(_) => format!("Change {}", model.verbose_name()),
        None => format!("Add {}", model.verbose_name()),
    };
    let form_format = state.theme.settings.changeform_format_for(&model.key());

    let ctx = with(
        page_context(state, Some(user), uri, &title),
        json!({
            "action": uri.path(),
            "fields": fields,
            "non_field_errors": non_field_errors,
            "form_format": form_format,
            "delete_url": id.map(|id| model.delete_url(id)),
        }),
    );
    render(state, templates::CHANGE_FORM, &ctx)
}

/// Where to go after a successful save, honouring the submit button used
fn after_save(model: AdminModel, id: i64, data: &HashMap<String, String>) -> Redirect {
    if data.contains_key("_continue") {
        Redirect::to(&model.change_url(id))
    } else if data.contains_key("_addanother") {
        Redirect::to(&model.add_url())
    } else {
        Redirect::to(&model.changelist_url())
    }
}

pub async fn add_page(
    State(state): State<AppState>,
    jar: CookieJar,
    uri: Uri,
    Path(model): Path<String>,
) -> Response {
    let user = match session::require(&state, &jar, &uri, Access::Superuser).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let model = match model_or_404(&model) {
        Ok(model) => model,
        Err(response) => return response,
    };

    match forms::blank_fields(&state.db, model).await {
        Ok(fields) => form_page(&state, &user, &uri, model, None, fields, Vec::new()),
        Err(e) => e.into_response(),
    }
}

pub async fn change_page(
    State(state): State<AppState>,
    jar: CookieJar,
    uri: Uri,
    Path((model, id)): Path<(String, i64)>,
) -> Response {
    let user = match session::require(&state, &jar, &uri, Access::Superuser).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let model = match model_or_404(&model) {
        Ok(model) => model,
        Err(response) => return response,
    };

    match forms::instance_fields(&state.db, model, id).await {
        Ok(Some(fields)) => form_page(&state, &user, &uri, model, Some(id), fields, Vec::new()),
        Ok(None) => Redirect::to(&model.changelist_url()).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn submit(
    state: &AppState,
    user: &User,
    uri: &Uri,
    model: AdminModel,
    id: Option<i64>,
    data: HashMap<String, String>,
) -> Response {
    let errors = match forms::save(&state.db, model, id, &data).await {
        Ok(saved) => {
            tracing::info!(admin_id = user.id, model = model.model_name(), id = saved, "Saved via admin");
            return after_save(model, saved, &data).into_response();
        }
        Err(errors) => errors,
    };

    redisplay(state, user, uri, model, id, &data, errors).await
}

async fn redisplay(
    state: &AppState,
    user: &User,
    uri: &Uri,
    model: AdminModel,
    id: Option<i64>,
    data: &HashMap<String, String>,
    errors: FormErrors,
) -> Response {
    match forms::submitted_fields(&state.db, model, id, data, &errors).await {
        Ok(fields) => form_page(state, user, uri, model, id, fields, errors.non_field),
        Err(e) => e.into_response(),
    }
}

pub async fn add(
    State(state): State<AppState>,
    jar: CookieJar,
    uri: Uri,
    Path(model): Path<String>,
    Form(data): Form<HashMap<String, String>>,
) -> Response {
    let user = match session::require(&state, &jar, &uri, Access::Superuser).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let model = match model_or_404(&model) {
        Ok(model) => model,
        Err(response) => return response,
    };

    submit(&state, &user, &uri, model, None, data).await
}

pub async fn change(
    State(state): State<AppState>,
    jar: CookieJar,
    uri: Uri,
    Path((model, id)): Path<(String, i64)>,
    Form(data): Form<HashMap<String, String>>,
) -> Response {
    let user = match session::require(&state, &jar, &uri, Access::Superuser).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let model = match model_or_404(&model) {
        Ok(model) => model,
        Err(response) => return response,
    };

    submit(&state, &user, &uri, model, Some(id), data).await
}

// Delete

/// Display name of a record, `None` if it does not exist
async fn object_label(pool: &PgPool, model: AdminModel, id: i64) -> ApiResult<Option<String>> {
    let label = match model {
        AdminModel::User => User::find_by_id(pool, id).await?.map(|u| u.name),
        AdminModel::Fuel => Fuel::find_by_id(pool, id).await?.map(|f| f.fuel_type),
        AdminModel::Payment => Payment::find_by_id(pool, id).await?.map(|p| p.mode),
        AdminModel::Machine => Machine::find_by_id(pool, id).await?.map(|m| m.name),
        AdminModel::Creditor => Creditor::find_by_id(pool, id).await?.map(|c| c.name),
    };
    Ok(label)
}

/// Describes the dependent records a delete will also remove
async fn cascade_note(pool: &PgPool, model: AdminModel, id: i64) -> ApiResult<Option<String>> {
    let note = match model {
        AdminModel::Fuel => {
            let machines = Machine::list_by_fuel(pool, id).await?;
            (!machines.is_empty()).then(|| {
                let names: Vec<&str> = machines.iter().map(|m| m.name.as_str()).collect();
                format!("These machines will be deleted as well: {}", names.join(", "))
            })
        }
        AdminModel::Payment => {
            let creditors = Creditor::list_by_payment(pool, id).await?;
            (!creditors.is_empty()).then(|| {
                let names: Vec<&str> = creditors.iter().map(|c| c.name.as_str()).collect();
                format!("These creditors will be deleted as well: {}", names.join(", "))
            })
        }
        _ => None,
    };
    Ok(note)
}

pub async fn delete_page(
    State(state): State<AppState>,
    jar: CookieJar,
    uri: Uri,
    Path((model, id)): Path<(String, i64)>,
) -> Response {
    let user = match session::require(&state, &jar, &uri, Access::Superuser).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let model = match model_or_404(&model) {
        Ok(model) => model,
        Err(response) => return response,
    };

    let label = match object_label(&state.db, model, id).await {
        Ok(Some(label)) => label,
        Ok(None) => return Redirect::to(&model.changelist_url()).into_response(),
        Err(e) => return e.into_response(),
    };
    let cascade = match cascade_note(&state.db, model, id).await {
        Ok(note) => note,
        Err(e) => return e.into_response(),
    };

    let ctx = with(
        page_context(&state, Some(&user), &uri, "Are you sure?"),
        json!({
            "verbose_name": model.verbose_name(),
            "object": label,
            "cascade": cascade,
            "action": uri.path(),
            "cancel_url": model.change_url(id),
        }),
    );
    render(&state, templates::DELETE_CONFIRMATION, &ctx)
}

pub async fn delete(
    State(state): State<AppState>,
    jar: CookieJar,
    uri: Uri,
    Path((model, id)): Path<(String, i64)>,
) -> Response {
    let user = match session::require(&state, &jar, &uri, Access::Superuser).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let model = match model_or_404(&model) {
        Ok(model) => model,
        Err(response) => return response,
    };

    match forms::delete(&state.db, model, id).await {
        Ok(()) | Err(ApiError::NotFound(_)) => {
            tracing::info!(admin_id = user.id, model = model.model_name(), id, "Deleted via admin");
            Redirect::to(&model.changelist_url()).into_response()
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(11), 2);
        assert_eq!(page_count(95), 10);
    }

    #[test]
    fn test_requested_page_bounds() {
        assert_eq!(requested_page(None), 1);
        assert_eq!(requested_page(Some(-4)), 1);
        assert_eq!(requested_page(Some(3)), 3);

        let page = requested_page(Some(i64::MAX));
        assert_eq!(page, MAX_PAGE);
        assert!((page - 1).checked_mul(LIST_PER_PAGE).is_some());
    }

    #[test]
    fn test_page_url_keeps_search() {
        assert_eq!(
            page_url("/admin/app/fuel/", Some("high speed"), 2),
            "/admin/app/fuel/?q=high%20speed&p=2"
        );
        assert_eq!(page_url("/admin/app/fuel/", None, 3), "/admin/app/fuel/?p=3");
    }

    #[test]
    fn test_after_save_follows_button() {
        let mut data = HashMap::new();
        data.insert("_continue".to_string(), String::new());
        let response = after_save(AdminModel::Fuel, 3, &data).into_response();
        assert_eq!(response.headers()["location"], "/admin/app/fuel/3/change/");

        let data = HashMap::from([("_addanother".to_string(), String::new())]);
        let response = after_save(AdminModel::Fuel, 3, &data).into_response();
        assert_eq!(response.headers()["location"], "/admin/app/fuel/add/");

        let response = after_save(AdminModel::Fuel, 3, &HashMap::new()).into_response();
        assert_eq!(response.headers()["location"], "/admin/app/fuel/");
    }

    #[test]
    fn test_with_merges_keys() {
        let ctx = with(json!({"title": "x", "a": 1}), json!({"a": 2, "b": 3}));
        assert_eq!(ctx, json!({"title": "x", "a": 2, "b": 3}));
    }
}
