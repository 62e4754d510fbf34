use askama::Template;

#[derive(Template)]
#[template(path = "fragments/landing.html")]
pub struct LandingBody<'a> {
    pub login_path: &'a str,
}

/// Heading, message, and optional escaped detail block
#[derive(Template)]
#[template(path = "fragments/message.html")]
pub struct MessageBody<'a> {
    pub heading: &'a str,
    pub message: &'a str,
    pub detail: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "fragments/denied.html")]
pub struct DeniedBody<'a> {
    pub message: &'a str,
    pub ids: &'a [String],
}

/// Command output inside a `<pre>` block, inserted without HTML escaping
#[derive(Template)]
#[template(path = "fragments/output.html")]
pub struct OutputBody<'a> {
    pub heading: &'a str,
    pub output: &'a str,
}

/// Render a body fragment, logging and degrading to an empty body on failure
pub fn render_body<T: Template>(body: &T) -> String {
    match body.render() {
        Ok(html) => html,
        Err(e) => {
            tracing::error!(error = %e, "Body template render failed");
            String::new()
        }
    }
}
