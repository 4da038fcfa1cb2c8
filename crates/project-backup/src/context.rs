use core::fmt::Display;

/// Holds the context for the current run. Used for prefixing logs.
#[derive(Default, Debug)]
pub struct Context {
    /// The backup for this run.
    pub backup: Option<String>,
    /// The current context
    pub current_context: &'static str,
}

impl Display for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(backup) = &self.backup {
            write!(f, "[{backup}] ")?;
        }

        write!(f, "[{}] ", self.current_context)?;

        Ok(())
    }
}
