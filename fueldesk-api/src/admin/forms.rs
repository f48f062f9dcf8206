/// Add/change forms for the admin console
///
/// Forms are plain field lists rendered by the `change_form` template.
/// Saving goes through the same services as the GraphQL mutations, so
/// validation and duplicate handling are identical on both surfaces.

use std::collections::{BTreeMap, HashMap};

use fueldesk_shared::models::{
    creditor::Creditor, fuel::Fuel, machine::Machine, payment::Payment, user::User,
};
use serde::Serialize;
use sqlx::PgPool;

use super::registry::AdminModel;
use crate::error::{ApiError, ApiResult};
use crate::services::{
    creditors::{self, CreditorInput},
    fuels::{self, FuelInput},
    machines::{self, MachineInput},
    payments::{self, PaymentInput},
    users::{self, UserInput},
};

const REQUIRED: &str = "This field is required.";
const NOT_A_NUMBER: &str = "Enter a number.";
const INVALID_CHOICE: &str = "Select a valid choice.";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub value: String,
    pub checked: bool,
    pub required: bool,
    pub options: Vec<SelectOption>,
    pub errors: Vec<String>,
    pub help: Option<&'static str>,
}

impl FormField {
    fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            input_type: "text",
            required: true,
            ..Default::default()
        }
    }

    fn number(name: &'static str, label: &'static str) -> Self {
        Self {
            input_type: "number",
            ..Self::text(name, label)
        }
    }

    fn checkbox(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            input_type: "checkbox",
            ..Default::default()
        }
    }

    fn select(name: &'static str, label: &'static str, options: Vec<SelectOption>) -> Self {
        Self {
            input_type: "select",
            options,
            ..Self::text(name, label)
        }
    }

    fn with_value(mut self, value: impl ToString) -> Self {
        let value = value.to_string();
        for option in &mut self.options {
            option.selected = option.value == value;
        }
        self.value = value;
        self
    }
}

/// Errors collected while saving a form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    pub non_field: Vec<String>,
}

impl FormErrors {
    fn add(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }
}

/// Input field carrying a service-level field name
fn form_field_name(service_field: &str) -> &str {
    match service_field {
        "mobile" => "username",
        "fuel_type" => "type",
        "fuel_id" => "fuel",
        "payment_id" => "payment",
        other => other,
    }
}

impl From<ApiError> for FormErrors {
    fn from(err: ApiError) -> Self {
        let mut errors = FormErrors::default();
        match err {
            ApiError::ValidationError(details) => {
                for d in details {
                    errors.add(form_field_name(&d.field), &d.message);
                }
            }
            other => errors.non_field.push(other.client_message()),
        }
        errors
    }
}

async fn fuel_options(pool: &PgPool) -> ApiResult<Vec<SelectOption>> {
    Ok(Fuel::all(pool)
        .await?
        .into_iter()
        .map(|f| SelectOption {
            value: f.id.to_string(),
            label: f.fuel_type,
            selected: false,
        })
        .collect())
}

async fn payment_options(pool: &PgPool) -> ApiResult<Vec<SelectOption>> {
    Ok(Payment::all(pool)
        .await?
        .into_iter()
        .map(|p| SelectOption {
            value: p.id.to_string(),
            label: p.mode,
            selected: false,
        })
        .collect())
}

/// Empty fields for the add form
pub async fn blank_fields(pool: &PgPool, model: AdminModel) -> ApiResult<Vec<FormField>> {
    let fields = match model {
        AdminModel::User => vec![
            FormField::text("name", "Name"),
            FormField::text("username", "Mobile no."),
            FormField {
                input_type: "password",
                ..FormField::text("password", "Password")
            },
            FormField {
                required: false,
                ..FormField::text("authorisation", "Authorisation")
            },
        ],
        AdminModel::Fuel => vec![
            FormField::text("type", "Type"),
            FormField::number("price", "Price"),
        ],
        AdminModel::Payment => vec![
            FormField::text("mode", "Mode"),
            FormField::checkbox("allowed_subcategory", "Allowed subcategory"),
        ],
        AdminModel::Machine => vec![
            FormField::select("fuel", "Fuel", fuel_options(pool).await?),
            FormField::text("name", "Name"),
            FormField::number("reading", "Reading"),
        ],
        AdminModel::Creditor => vec![
            FormField::select("payment", "Payment", payment_options(pool).await?),
            FormField::text("name", "Name"),
            FormField::text("limit_warning", "Limit warning"),
            FormField::text("limit_stop_credit", "Limit stop credit"),
        ],
    };

    Ok(fields)
}

fn set_value(fields: &mut [FormField], name: &str, value: impl ToString) {
    if let Some(field) = fields.iter_mut().find(|f| f.name == name) {
        *field = std::mem::take(field).with_value(value);
    }
}

fn set_checked(fields: &mut [FormField], name: &str, checked: bool) {
    if let Some(field) = fields.iter_mut().find(|f| f.name == name) {
        field.checked = checked;
    }
}

/// Fields filled from a stored record, `None` if it does not exist
pub async fn instance_fields(
    pool: &PgPool,
    model: AdminModel,
    id: i64,
) -> ApiResult<Option<Vec<FormField>>> {
    let mut fields = blank_fields(pool, model).await?;

    match model {
        AdminModel::User => {
            let Some(user) = User::find_by_id(pool, id).await? else {
                return Ok(None);
            };
            set_value(&mut fields, "name", &user.name);
            set_value(&mut fields, "username", &user.username);
            set_value(&mut fields, "authorisation", &user.authorisation);
            if let Some(password) = fields.iter_mut().find(|f| f.name == "password") {
                password.required = false;
                password.help = Some("Leave blank to keep the current password.");
            }
        }
        AdminModel::Fuel => {
            let Some(fuel) = Fuel::find_by_id(pool, id).await? else {
                return Ok(None);
            };
            set_value(&mut fields, "type", &fuel.fuel_type);
            set_value(&mut fields, "price", fuel.price);
        }
        AdminModel::Payment => {
            let Some(payment) = Payment::find_by_id(pool, id).await? else {
                return Ok(None);
            };
            set_value(&mut fields, "mode", &payment.mode);
            set_checked(&mut fields, "allowed_subcategory", payment.allowed_subcategory);
        }
        AdminModel::Machine => {
            let Some(machine) = Machine::find_by_id(pool, id).await? else {
                return Ok(None);
            };
            set_value(&mut fields, "fuel", machine.fuel_id);
            set_value(&mut fields, "name", &machine.name);
            set_value(&mut fields, "reading", machine.reading);
        }
        AdminModel::Creditor => {
            let Some(creditor) = Creditor::find_by_id(pool, id).await? else {
                return Ok(None);
            };
            set_value(&mut fields, "payment", creditor.payment_id);
            set_value(&mut fields, "name", &creditor.name);
            set_value(&mut fields, "limit_warning", &creditor.limit_warning);
            set_value(&mut fields, "limit_stop_credit", &creditor.limit_stop_credit);
        }
    }

    Ok(Some(fields))
}

/// Fields showing what was submitted, with errors attached
///
/// Passwords are never echoed back.
pub async fn submitted_fields(
    pool: &PgPool,
    model: AdminModel,
    id: Option<i64>,
    data: &HashMap<String, String>,
    errors: &FormErrors,
) -> ApiResult<Vec<FormField>> {
    let mut fields = blank_fields(pool, model).await?;

    for field in &mut fields {
        match field.input_type {
            "checkbox" => field.checked = data.contains_key(field.name),
            "password" => {
                if id.is_some() {
                    field.required = false;
                    field.help = Some("Leave blank to keep the current password.");
                }
            }
            _ => {
                let value = data.get(field.name).cloned().unwrap_or_default();
                *field = std::mem::take(field).with_value(value);
            }
        }
        if let Some(messages) = errors.fields.get(field.name) {
            field.errors = messages.clone();
        }
    }

    Ok(fields)
}

struct Submission<'a> {
    data: &'a HashMap<String, String>,
    errors: FormErrors,
}

impl<'a> Submission<'a> {
    fn new(data: &'a HashMap<String, String>) -> Self {
        Self {
            data,
            errors: FormErrors::default(),
        }
    }

    fn text(&self, name: &str) -> String {
        self.data
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    fn flag(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    fn number(&mut self, name: &str) -> f64 {
        let raw = self.text(name);
        if raw.is_empty() {
            self.errors.add(name, REQUIRED);
            return 0.0;
        }
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => n,
            _ => {
                self.errors.add(name, NOT_A_NUMBER);
                0.0
            }
        }
    }

    fn choice(&mut self, name: &str) -> i64 {
        let raw = self.text(name);
        if raw.is_empty() {
            self.errors.add(name, REQUIRED);
            return 0;
        }
        raw.parse::<i64>().unwrap_or_else(|_| {
            self.errors.add(name, INVALID_CHOICE);
            0
        })
    }

    /// Parse errors found so far, if any
    fn finish(self) -> Result<(), FormErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Validates and stores a submitted form, returning the record id
///
/// `id` selects between create and update.
pub async fn save(
    pool: &PgPool,
    model: AdminModel,
    id: Option<i64>,
    data: &HashMap<String, String>,
) -> Result<i64, FormErrors> {
    let mut form = Submission::new(data);

    let saved = match model {
        AdminModel::User => {
            let input = UserInput {
                name: form.text("name"),
                mobile: form.text("username"),
                password: data.get("password").cloned().unwrap_or_default(),
                authorisation: form.text("authorisation"),
            };
            form.finish()?;
            match id {
                Some(id) => users::update_user(pool, id, input).await,
                None => users::create_user(pool, input).await,
            }
            .map(|u| u.id)
        }
        AdminModel::Fuel => {
            let input = FuelInput {
                fuel_type: form.text("type"),
                price: form.number("price"),
            };
            form.finish()?;
            match id {
                Some(id) => fuels::update_fuel(pool, id, input).await,
                None => fuels::create_fuel(pool, input).await,
            }
            .map(|f| f.id)
        }
        AdminModel::Payment => {
            let input = PaymentInput {
                mode: form.text("mode"),
                allowed_subcategory: form.flag("allowed_subcategory"),
            };
            form.finish()?;
            match id {
                Some(id) => payments::update_payment(pool, id, input).await,
                None => payments::create_payment(pool, input).await,
            }
            .map(|p| p.id)
        }
        AdminModel::Machine => {
            let input = MachineInput {
                fuel_id: form.choice("fuel"),
                name: form.text("name"),
                reading: form.number("reading"),
            };
            form.finish()?;
            match id {
                Some(id) => machines::update_machine(pool, id, input).await,
                None => machines::create_machine(pool, input).await,
            }
            .map(|m| m.id)
        }
        AdminModel::Creditor => {
            let input = CreditorInput {
                payment_id: form.choice("payment"),
                name: form.text("name"),
                limit_warning: form.text("limit_warning"),
                limit_stop_credit: form.text("limit_stop_credit"),
            };
            form.finish()?;
            match id {
                Some(id) => creditors::update_creditor(pool, id, input).await,
                None => creditors::create_creditor(pool, input).await,
            }
            .map(|c| c.id)
        }
    };

    saved.map_err(FormErrors::from)
}

/// Deletes a record through its service
pub async fn delete(pool: &PgPool, model: AdminModel, id: i64) -> ApiResult<()> {
    match model {
        AdminModel::User => users::delete_user(pool, id).await,
        AdminModel::Fuel => fuels::delete_fuel(pool, id).await,
        AdminModel::Payment => payments::delete_payment(pool, id).await,
        AdminModel::Machine => machines::delete_machine(pool, id).await,
        AdminModel::Creditor => creditors::delete_creditor(pool, id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorDetail;

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    fn data(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_validation_errors_land_on_form_fields() {
        let err = ApiError::ValidationError(vec![
            ValidationErrorDetail::new("mobile", "Mobile number must contain only digits"),
            ValidationErrorDetail::new("fuel_type", "Type must be 1 to 100 characters"),
        ]);
        let errors = FormErrors::from(err);

        assert_eq!(
            errors.fields["username"],
            vec!["Mobile number must contain only digits"]
        );
        assert!(errors.fields.contains_key("type"));
        assert!(errors.non_field.is_empty());
    }

    #[test]
    fn test_conflict_is_a_non_field_error() {
        let errors = FormErrors::from(ApiError::Conflict("fuel already exist".to_string()));

        assert!(errors.fields.is_empty());
        assert_eq!(errors.non_field, vec!["fuel already exist"]);
    }

    #[tokio::test]
    async fn test_price_must_be_a_number() {
        let errors = save(
            &lazy_pool(),
            AdminModel::Fuel,
            None,
            &data(&[("type", "Diesel"), ("price", "cheap")]),
        )
        .await
        .unwrap_err();

        assert_eq!(errors.fields["price"], vec![NOT_A_NUMBER]);
    }

    #[tokio::test]
    async fn test_machine_requires_fuel_choice() {
        let errors = save(
            &lazy_pool(),
            AdminModel::Machine,
            None,
            &data(&[("name", "Pump 1"), ("reading", "12.5")]),
        )
        .await
        .unwrap_err();

        assert_eq!(errors.fields["fuel"], vec![REQUIRED]);
        assert!(!errors.fields.contains_key("reading"));
    }

    #[tokio::test]
    async fn test_service_validation_runs_before_database() {
        let errors = save(
            &lazy_pool(),
            AdminModel::Payment,
            None,
            &data(&[("mode", "")]),
        )
        .await
        .unwrap_err();

        assert!(errors.fields.contains_key("mode"));
    }

    #[test]
    fn test_select_marks_current_value() {
        let field = FormField::select(
            "fuel",
            "Fuel",
            vec![
                SelectOption {
                    value: "1".to_string(),
                    label: "Petrol".to_string(),
                    selected: false,
                },
                SelectOption {
                    value: "2".to_string(),
                    label: "Diesel".to_string(),
                    selected: false,
                },
            ],
        )
        .with_value(2);

        assert!(!field.options[0].selected);
        assert!(field.options[1].selected);
    }
}
