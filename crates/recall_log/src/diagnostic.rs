//! Reported diagnostic values.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

/// A value reported during an execution.
///
/// Any `'static` value can be reported. Values reported as errors also
/// expose a `dyn Error` view, which is what [`Log::errors`](crate::Log::errors)
/// yields.
#[derive(Clone)]
pub struct Diagnostic {
    value: Rc<dyn Any>,
    error: Option<Rc<dyn Error>>,
    rendered: Rc<str>,
}

impl Diagnostic {
    /// Wrap an arbitrary value; rendered with its `Debug` form
    #[must_use]
    pub fn value<T: Any + fmt::Debug>(value: T) -> Self {
        let rendered = format!("{:?}", value).into();
        Self {
            value: Rc::new(value),
            error: None,
            rendered,
        }
    }

    /// Wrap an error; rendered with its `Display` form
    #[must_use]
    pub fn error<E: Error + 'static>(error: E) -> Self {
        let rendered = error.to_string().into();
        let shared = Rc::new(error);
        Self {
            value: Rc::clone(&shared) as Rc<dyn Any>,
            error: Some(shared),
            rendered,
        }
    }

    /// Plain text message
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self {
            rendered: text.as_str().into(),
            value: Rc::new(text),
            error: None,
        }
    }

    /// Whether this was reported as an error
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Error view, for values reported as errors
    #[must_use]
    pub fn as_error(&self) -> Option<&(dyn Error + 'static)> {
        self.error.as_deref()
    }

    /// Reported value, if it has type `T`
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Text captured when the value was reported
    #[must_use]
    pub fn text(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostic")
            .field("text", &self.rendered)
            .field("error", &self.is_error())
            .finish()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}
