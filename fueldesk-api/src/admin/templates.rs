use anyhow::Context;
use handlebars::Handlebars;

pub const LOGIN: &str = "login";
pub const INDEX: &str = "index";
pub const CHANGE_LIST: &str = "change_list";
pub const CHANGE_FORM: &str = "change_form";
pub const DELETE_CONFIRMATION: &str = "delete_confirmation";
pub const REPORT: &str = "report";

/// Builds the registry with every admin page
pub fn build_registry() -> anyhow::Result<Handlebars<'static>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(false);
    register_templates(&mut registry)?;
    Ok(registry)
}

pub fn register_templates<'a>(registry: &mut Handlebars<'a>) -> anyhow::Result<()> {
    registry
        .register_template_string(
            "head",
            r#"<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{title}}{{#if site.site_title}} | {{site.site_title}}{{/if}}</title>
<link rel="icon" href="{{assets.site_icon}}">
<link rel="stylesheet" href="{{assets.fontawesome}}">
<link rel="stylesheet" href="{{assets.adminlte}}">
<link rel="stylesheet" href="{{tweaks.theme.src}}" id="jazzy-theme">
{{#if tweaks.dark_mode_theme}}<link rel="stylesheet" href="{{tweaks.dark_mode_theme.src}}" media="(prefers-color-scheme: dark)" id="jazzy-dark-theme">{{/if}}
{{#if site.use_google_fonts_cdn}}<link rel="stylesheet" href="https://fonts.googleapis.com/css?family=Source+Sans+Pro:300,400,400i,700">{{/if}}
{{#if assets.custom_css}}<link rel="stylesheet" href="{{assets.custom_css}}">{{/if}}"#,
        )
        .context("registering head partial")?;

    registry
        .register_template_string(
            "header",
            r##"<!DOCTYPE html>
<html lang="en">
<head>
{{> head}}
</head>
<body class="hold-transition {{tweaks.body_classes}}">
<div class="wrapper">
    <nav class="main-header navbar navbar-expand {{tweaks.navbar_classes}}">
        <ul class="navbar-nav">
            {{#if site.show_sidebar}}<li class="nav-item"><a class="nav-link" data-widget="pushmenu" href="#" role="button"><i class="fas fa-bars"></i></a></li>{{/if}}
            {{#each topmenu}}
            <li class="nav-item d-none d-sm-inline-block"><a href="{{url}}" class="nav-link"{{#if new_window}} target="_blank"{{/if}}>{{name}}</a></li>
            {{/each}}
        </ul>
        {{#if site.search_model}}
        <form action="{{site.search_url}}" method="GET" class="form-inline ml-3">
            <input class="form-control form-control-navbar" name="q" type="search" placeholder="Search {{site.search_name}}...">
        </form>
        {{/if}}
        <ul class="navbar-nav ml-auto">
            <li class="nav-item dropdown">
                <a class="nav-link" data-toggle="dropdown" href="#"><i class="far fa-user"></i> {{user.name}}</a>
                <div class="dropdown-menu dropdown-menu-lg dropdown-menu-right">
                    {{#each usermenu}}
                    <a href="{{url}}" class="dropdown-item"{{#if new_window}} target="_blank"{{/if}}>{{name}}</a>
                    {{/each}}
                    <form action="/admin/logout/" method="POST">
                        <button type="submit" class="dropdown-item dropdown-footer">{{#if site.site_header}}{{site.site_header}}{{else}}Log out{{/if}}</button>
                    </form>
                </div>
            </li>
        </ul>
    </nav>
    {{#if site.show_sidebar}}
    <aside class="main-sidebar elevation-4 {{tweaks.sidebar_classes}}">
        <a href="/admin/" class="brand-link {{tweaks.brand_classes}}">
            <img src="{{assets.site_logo}}" alt="{{site.site_header}} Logo" class="{{site.site_logo_classes}} brand-image elevation-3">
            <span class="brand-text font-weight-light">{{site.site_brand}}</span>
        </a>
        <div class="sidebar">
            <nav class="mt-2">
                <ul class="nav nav-pills nav-sidebar flex-column {{tweaks.sidebar_list_classes}}" data-widget="treeview" role="menu">
                    <li class="nav-item"><a href="/admin/" class="nav-link"><i class="nav-icon fas fa-tachometer-alt"></i><p>Dashboard</p></a></li>
                    {{#each menu}}
                    <li class="nav-header">{{name}}</li>
                    {{#each models}}
                    <li class="nav-item">
                        <a href="{{url}}" class="nav-link{{#if active}} active{{/if}}"{{#if new_window}} target="_blank"{{/if}}>
                            <i class="nav-icon {{icon}}"></i><p>{{name}}</p>
                        </a>
                    </li>
                    {{/each}}
                    {{/each}}
                </ul>
            </nav>
        </div>
    </aside>
    {{/if}}
    <div class="content-wrapper">
        <div class="content-header">
            <div class="container-fluid"><h1 class="m-0">{{title}}</h1></div>
        </div>
        <div class="content">
            <div class="container-fluid">"##,
        )
        .context("registering header partial")?;

    registry
        .register_template_string(
            "footer",
            r#"            </div>
        </div>
    </div>
    <footer class="main-footer {{tweaks.footer_classes}}">
        <strong>Copyright &copy; {{site.copyright}}</strong>
    </footer>
</div>
<script src="{{assets.jquery}}"></script>
<script src="{{assets.bootstrap}}"></script>
<script src="{{assets.adminlte_js}}"></script>
{{#if assets.custom_js}}<script src="{{assets.custom_js}}"></script>{{/if}}
</body>
</html>"#,
        )
        .context("registering footer partial")?;

    registry
        .register_template_string(
            LOGIN,
            r#"<!DOCTYPE html>
<html lang="en">
<head>
{{> head}}
</head>
<body class="hold-transition login-page">
<div class="login-box">
    <div class="login-logo">
        <img src="{{assets.site_logo}}" alt="{{site.site_header}}" class="{{site.site_logo_classes}}" style="max-height: 60px">
        <h1 class="h4">{{site.site_header}}</h1>
    </div>
    <div class="card">
        <div class="card-body login-card-body">
            <p class="login-box-msg">{{site.welcome_sign}}</p>
            {{#if error}}<div class="callout callout-danger"><p>{{error}}</p></div>{{/if}}
            <form action="/admin/login/" method="POST">
                <input type="hidden" name="next" value="{{next}}">
                <div class="input-group mb-3">
                    <input type="text" name="username" class="form-control" placeholder="Mobile no." value="{{username}}" required autofocus>
                </div>
                <div class="input-group mb-3">
                    <input type="password" name="password" class="form-control" placeholder="Password" required>
                </div>
                <button type="submit" class="btn {{tweaks.button_classes.primary}} btn-block">Log in</button>
            </form>
        </div>
    </div>
</div>
</body>
</html>"#,
        )
        .context("registering login template")?;

    registry
        .register_template_string(
            INDEX,
            r#"{{> header}}
<div class="row">
    {{#each menu}}
    <div class="col-md-6">
        <div class="card">
            <div class="card-header"><h5 class="m-0"><i class="{{icon}}"></i> {{name}}</h5></div>
            <div class="card-body p-0">
                <table class="table table-sm table-striped">
                    <tbody>
                    {{#each models}}
                    <tr>
                        <td><i class="{{icon}}"></i> <a href="{{url}}">{{name}}</a></td>
                        <td class="text-right"><a href="{{url}}" class="btn btn-xs {{../../tweaks.button_classes.info}}">View</a></td>
                    </tr>
                    {{/each}}
                    </tbody>
                </table>
            </div>
        </div>
    </div>
    {{/each}}
</div>
{{> footer}}"#,
        )
        .context("registering index template")?;

    registry
        .register_template_string(
            CHANGE_LIST,
            r#"{{> header}}
<div class="card">
    <div class="card-header">
        <form method="GET" class="form-inline float-left">
            <input type="search" name="q" class="form-control form-control-sm" value="{{query}}" placeholder="Search">
            <button type="submit" class="btn btn-sm {{tweaks.button_classes.secondary}} ml-2">Search</button>
        </form>
        <div class="float-right {{tweaks.actions_classes}}">
            <a href="{{add_url}}" class="btn btn-sm {{tweaks.button_classes.success}}"><i class="fas fa-plus"></i> Add {{verbose_name}}</a>
        </div>
    </div>
    <div class="card-body p-0">
        <table class="table table-striped" id="result_list">
            <thead>
            <tr>{{#each columns}}<th>{{this}}</th>{{/each}}</tr>
            </thead>
            <tbody>
            {{#each rows}}
            <tr>
                {{#each cells}}<td>{{#if @first}}<a href="{{../url}}">{{this}}</a>{{else}}{{this}}{{/if}}</td>{{/each}}
            </tr>
            {{else}}
            <tr><td colspan="{{columns.length}}">0 {{verbose_name_plural}}</td></tr>
            {{/each}}
            </tbody>
        </table>
    </div>
    <div class="card-footer">
        <span>{{total}} {{total_label}}</span>
        <ul class="pagination pagination-sm float-right m-0">
            {{#if previous_url}}<li class="page-item"><a class="page-link" href="{{previous_url}}">&laquo;</a></li>{{/if}}
            <li class="page-item active"><span class="page-link">{{page}} / {{pages}}</span></li>
            {{#if next_url}}<li class="page-item"><a class="page-link" href="{{next_url}}">&raquo;</a></li>{{/if}}
        </ul>
    </div>
</div>
{{> footer}}"#,
        )
        .context("registering change_list template")?;

    registry
        .register_template_string(
            CHANGE_FORM,
            r#"{{> header}}
<form method="POST" action="{{action}}" class="{{form_format}}">
    <div class="card">
        <div class="card-body">
            {{#each non_field_errors}}<div class="alert alert-danger">{{this}}</div>{{/each}}
            {{#each fields}}
            <div class="form-group">
                {{#if (eq input_type "checkbox")}}
                <div class="form-check">
                    <input type="checkbox" class="form-check-input" id="id_{{name}}" name="{{name}}"{{#if checked}} checked{{/if}}>
                    <label class="form-check-label" for="id_{{name}}">{{label}}</label>
                </div>
                {{else}}
                <label for="id_{{name}}"{{#if required}} class="required"{{/if}}>{{label}}</label>
                {{#if (eq input_type "select")}}
                <select class="form-control" id="id_{{name}}" name="{{name}}"{{#if required}} required{{/if}}>
                    <option value="">---------</option>
                    {{#each options}}<option value="{{value}}"{{#if selected}} selected{{/if}}>{{label}}</option>{{/each}}
                </select>
                {{else}}
                <input type="{{input_type}}" class="form-control{{#if errors}} is-invalid{{/if}}" id="id_{{name}}" name="{{name}}" value="{{value}}"{{#if (eq input_type "number")}} step="any"{{/if}}{{#if required}} required{{/if}}>
                {{/if}}
                {{/if}}
                {{#each errors}}<div class="invalid-feedback d-block">{{this}}</div>{{/each}}
                {{#if help}}<small class="form-text text-muted">{{help}}</small>{{/if}}
            </div>
            {{/each}}
        </div>
        <div class="card-footer {{tweaks.actions_classes}}">
            <button type="submit" name="_save" class="btn {{tweaks.button_classes.primary}}">Save</button>
            <button type="submit" name="_continue" class="btn {{tweaks.button_classes.info}}">Save and continue editing</button>
            <button type="submit" name="_addanother" class="btn {{tweaks.button_classes.secondary}}">Save and add another</button>
            {{#if delete_url}}<a href="{{delete_url}}" class="btn {{tweaks.button_classes.danger}} float-right">Delete</a>{{/if}}
        </div>
    </div>
</form>
{{> footer}}"#,
        )
        .context("registering change_form template")?;

    registry
        .register_template_string(
            DELETE_CONFIRMATION,
            r#"{{> header}}
<div class="card">
    <div class="card-body">
        <p>Are you sure you want to delete the {{verbose_name}} "{{object}}"?</p>
        {{#if cascade}}<p>{{cascade}}</p>{{/if}}
        <form method="POST" action="{{action}}">
            <button type="submit" class="btn {{tweaks.button_classes.danger}}">Yes, I'm sure</button>
            <a href="{{cancel_url}}" class="btn {{tweaks.button_classes.secondary}}">No, take me back</a>
        </form>
    </div>
</div>
{{> footer}}"#,
        )
        .context("registering delete_confirmation template")?;

    registry
        .register_template_string(
            REPORT,
            r#"{{> header}}
<div class="row">
    {{#each stats}}
    <div class="col-lg-3 col-6">
        <div class="small-box bg-info">
            <div class="inner"><h3>{{count}}</h3><p>{{name}}</p></div>
            <a href="{{url}}" class="small-box-footer">More info <i class="fas fa-arrow-circle-right"></i></a>
        </div>
    </div>
    {{/each}}
</div>
{{> footer}}"#,
        )
        .context("registering report template")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> serde_json::Value {
        json!({
            "title": "Log in",
            "site": {"site_title": "Dashboard", "site_header": "Logout", "welcome_sign": "Login Here", "copyright": "Acme"},
            "tweaks": {"theme": {"src": "/static/vendor/bootswatch/default/bootstrap.min.css"}, "button_classes": {"primary": "btn-primary"}},
            "assets": {},
        })
    }

    #[test]
    fn test_all_templates_register() {
        let registry = build_registry().unwrap();

        for name in [LOGIN, INDEX, CHANGE_LIST, CHANGE_FORM, DELETE_CONFIRMATION, REPORT] {
            assert!(registry.has_template(name), "{} missing", name);
        }
    }

    #[test]
    fn test_index_renders_header_navigation() {
        let registry = build_registry().unwrap();
        let mut data = base();
        data["title"] = json!("Dashboard");
        data["site"]["show_sidebar"] = json!(true);
        data["user"] = json!({"name": "Owner"});
        data["menu"] = json!([]);

        let html = registry.render(INDEX, &data).unwrap();

        assert!(html.contains(r##"data-widget="pushmenu" href="#""##));
        assert!(html.contains("Owner"));
        assert!(html.contains("Copyright &copy; Acme"));
    }

    #[test]
    fn test_login_renders_welcome_sign_and_escapes_input() {
        let registry = build_registry().unwrap();
        let mut data = base();
        data["error"] = json!("Please enter valid credentials");
        data["username"] = json!("<script>");

        let html = registry.render(LOGIN, &data).unwrap();

        assert!(html.contains("Login Here"));
        assert!(html.contains("<title>Log in | Dashboard</title>"));
        assert!(html.contains("Please enter valid credentials"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("bootswatch/default"));
    }

    #[test]
    fn test_change_form_renders_field_kinds() {
        let registry = build_registry().unwrap();
        let mut data = base();
        data["fields"] = json!([
            {"name": "mode", "label": "Mode", "input_type": "text", "value": "Cash", "required": true, "errors": []},
            {"name": "allowed_subcategory", "label": "Allowed subcategory", "input_type": "checkbox", "checked": true, "errors": []},
            {"name": "fuel", "label": "Fuel", "input_type": "select", "required": true, "errors": ["Select a valid choice."],
             "options": [{"value": "3", "label": "Diesel", "selected": true}]},
        ]);

        let html = registry.render(CHANGE_FORM, &data).unwrap();

        assert!(html.contains(r#"value="Cash""#));
        assert!(html.contains(r#"name="allowed_subcategory" checked"#));
        assert!(html.contains(r#"<option value="3" selected>Diesel</option>"#));
        assert!(html.contains("Select a valid choice."));
        assert!(html.contains("Copyright &copy; Acme"));
    }
}
