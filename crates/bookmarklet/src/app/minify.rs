//! Comment and whitespace stripping for script source.

use crate::domain::errors::MinifyError;

/// Anything able to turn a script fragment into compact code.
pub trait Minifier {
    fn minify(&self, code: &str) -> Result<String, MinifyError>;
}

/// Minifier backed by the `minifier` crate's JavaScript pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsMin;

impl Minifier for JsMin {
    fn minify(&self, code: &str) -> Result<String, MinifyError> {
        Ok(minifier::js::minify(code).to_string().trim().to_owned())
    }
}
