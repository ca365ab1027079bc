//! Package page handler.
//!
//! Every configured package gets one GET route serving an HTML page whose
//! `go-import` / `go-source` meta tags let `go get` discover the backing
//! repository. A `?go-get=1` query marks the request as a tooling fetch;
//! anything else counts as a human page view.

use std::sync::Arc;

use axum::response::Html;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::config::PackageConfig;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(rename = "go-get", default)]
    pub go_get: Option<String>,
}

pub async fn serve_package(
    app: AppState,
    pkg: Arc<PackageConfig>,
    query: PageQuery,
) -> Html<String> {
    let body = render_page(&pkg);
    tracing::trace!(subpath = %pkg.subpath, "page served");

    if query.go_get.as_deref() == Some("1") {
        app.stats().incr_get(&pkg.import_path, 1);
    } else {
        app.stats().incr_view(&pkg.import_path, 1);
    }

    Html(body)
}

/// Render the vanity page. The `{/dir}`/`{file}`/`{line}` placeholders in the
/// go-source tag are part of the meta-tag syntax and emitted literally.
pub fn render_page(pkg: &PackageConfig) -> String {
    format!(
        r##"<!DOCTYPE html>
<html>
<head>
	<meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>
	<meta name="go-import" content="{import_path} git {repo}">
	<meta name="go-source" content="{import_path} _ {repo}/tree/{branch}{{/dir}} {repo}/blob/{branch}{{/dir}}/{{file}}#L{{line}}">
	<style>
		pre {{
			tab-size: 4;
		}}
	</style>
</head>
<body>
	<p>Install command:</p>
	<pre>
	<code>go get {import_path}</code></pre>

	<p>Import in source code:</p>
	<pre>
	<code>import "{import_path}"</code></pre>

	<p>Repository: <a href="{repo}">{repo}</a></p>
	<p>GoDoc: <a href="https://pkg.go.dev/{import_path}">https://pkg.go.dev/{import_path}</a></p>
</body>
</html>
"##,
        import_path = pkg.import_path,
        repo = pkg.repo,
        branch = pkg.branch,
    )
}
