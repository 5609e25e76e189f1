use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cronsync::exec::{CommandResult, CommandRunner, CommandStatus, OutputChunk};

/// What the fake should answer for one invocation.
#[derive(Debug, Clone)]
pub struct ScriptedResult {
    pub status: CommandStatus,
    pub output: Vec<OutputChunk>,
}

impl ScriptedResult {
    pub fn success() -> Self {
        Self {
            status: CommandStatus::Exited(0),
            output: Vec::new(),
        }
    }

    pub fn exit(code: i32) -> Self {
        Self {
            status: CommandStatus::Exited(code),
            output: Vec::new(),
        }
    }

    pub fn with_stderr(mut self, text: &str) -> Self {
        self.output.push(OutputChunk::stderr(text));
        self
    }

    pub fn with_stdout(mut self, text: &str) -> Self {
        self.output.push(OutputChunk::stdout(text));
        self
    }
}

/// A fake runner that:
/// - records the argv of every invocation, in order
/// - answers from a script, falling back to success when the script is empty
/// - optionally takes some time per invocation
#[derive(Clone, Default)]
pub struct FakeCommandRunner {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    script: Arc<Mutex<VecDeque<ScriptedResult>>>,
    delay: Option<Duration>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue the result of the next unanswered invocation.
    pub fn push_result(&self, result: ScriptedResult) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl CommandRunner for FakeCommandRunner {
    fn run<'a>(
        &'a self,
        args: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(args.clone());
            let scripted = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(ScriptedResult::success);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            CommandResult {
                args,
                output: scripted.output,
                omitted: 0,
                status: scripted.status,
            }
        })
    }
}
