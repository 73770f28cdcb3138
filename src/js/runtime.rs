use anyhow::{anyhow, Context as AnyhowContext, Result};
use rquickjs::{Context, Ctx, Error as JsError, Runtime, Value};

use crate::config::ShimConfig;

/// JavaScript runtime backed by QuickJS.
///
/// Owns the QuickJS runtime and context. Script exceptions come back as
/// `anyhow` errors carrying the thrown message and stack.
pub struct QuickJsEngine {
    runtime: Runtime,
    context: Context,
}

impl QuickJsEngine {
    pub fn new() -> Result<Self> {
        Self::with_config(&ShimConfig::default())
    }

    /// Create an engine honouring the configured memory and stack limits.
    pub fn with_config(config: &ShimConfig) -> Result<Self> {
        let runtime = Runtime::new().context("failed to create QuickJS runtime")?;
        if let Some(limit) = config.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(size) = config.max_stack_size {
            runtime.set_max_stack_size(size);
        }
        let context = Context::full(&runtime).context("failed to create QuickJS context")?;
        Ok(Self { runtime, context })
    }

    /// Evaluate a script and discard the result.
    pub fn eval(&self, source: &str, filename: &str) -> Result<()> {
        self.eval_with::<()>(source, filename)
    }

    /// Evaluate a script and convert the completion value into `V`.
    pub fn eval_with<V>(&self, source: &str, filename: &str) -> Result<V>
    where
        V: for<'js> rquickjs::FromJs<'js>,
    {
        let script = Self::with_source_url(source, filename);
        let value = self.with_context(|ctx| ctx.eval::<V, _>(script))?;
        self.drain_jobs()?;
        Ok(value)
    }

    /// Run `f` inside the context. A thrown exception is turned into an error
    /// carrying its message.
    pub fn with_context<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'js> FnOnce(Ctx<'js>) -> rquickjs::Result<T>,
    {
        self.context.with(|ctx| match f(ctx.clone()) {
            Ok(value) => Ok(value),
            Err(JsError::Exception) => Err(anyhow!(capture_exception_message(&ctx))),
            Err(err) => Err(anyhow::Error::from(err)),
        })
    }

    /// Execute pending promise jobs. Returns whether any ran; a job that
    /// throws fails the drain.
    pub fn drain_jobs(&self) -> Result<bool> {
        let mut job_count = 0;
        const MAX_JOBS: usize = 1000;

        while self.runtime.is_job_pending() {
            match self.runtime.execute_pending_job() {
                Ok(true) => {
                    job_count += 1;
                    if job_count >= MAX_JOBS {
                        tracing::warn!(
                            target: "quickjs",
                            "Stopped processing jobs after {} iterations (possible infinite loop)",
                            MAX_JOBS
                        );
                        break;
                    }
                }
                Ok(false) => break,
                Err(job_exception) => {
                    tracing::error!(
                        target: "quickjs",
                        "Job execution error: {:?}",
                        job_exception
                    );
                    return Err(anyhow!("pending job failed: {:?}", job_exception));
                }
            }
        }

        if job_count > 0 {
            tracing::debug!(target: "quickjs", "Executed {} pending jobs", job_count);
        }

        Ok(job_count > 0)
    }

    fn with_source_url(source: &str, filename: &str) -> Vec<u8> {
        let mut script = String::with_capacity(source.len() + filename.len() + 32);
        script.push_str(source);
        if !source.ends_with('\n') {
            script.push('\n');
        }
        script.push_str("//# sourceURL=");
        script.push_str(filename);
        script.push('\n');
        script.into_bytes()
    }
}

fn capture_exception_message(ctx: &Ctx<'_>) -> String {
    let exception: Value = ctx.catch();

    if let Some(obj) = exception.as_object() {
        if let Ok(message) = obj.get::<_, String>("message") {
            if let Ok(stack) = obj.get::<_, String>("stack") {
                return format!("Error: {}\nStack: {}", message, stack);
            }
            return format!("Error: {}", message);
        }
    }

    if let Some(text) = exception.as_string().and_then(|text| text.to_string().ok()) {
        return text;
    }

    format!("{:?}", exception)
}
