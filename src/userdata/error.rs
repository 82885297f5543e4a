/// User-data rendering errors
use thiserror::Error;

/// Errors returned while building a bootstrap script
#[derive(Error, Debug)]
pub enum UserdataError {
    /// Template substitution failed, e.g. a referenced field does not resolve
    #[error("failed to execute user-data template: {0}")]
    Render(#[from] handlebars::RenderError),

    /// A caller-provided template could not be parsed
    #[error("failed to parse user-data template: {0}")]
    Template(#[from] handlebars::TemplateError),

    /// Worker script requested before the control plane registered an endpoint
    #[error("cluster '{cluster}' has no API endpoint; the control plane must be provisioned before workers")]
    NoApiEndpoint { cluster: String },
}
