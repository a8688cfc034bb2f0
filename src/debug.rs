//! Debug sink: the build log and the dependency graph, plus the options
//! that decide where they go.
//!
//! Everything the container does while building is written to a log buffer
//! with indentation that follows the resolution depth. Loggers subscribed at
//! any point receive the whole buffer first, so options applied after a
//! failure (see [`on_error`]) still see the full history. Each line is also
//! emitted as a `tracing` event at `TRACE` level under the
//! `ferrous_inject` target.
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use ferrous_inject::{build_debug, debug_options, logger, provide, visualizer};
//!
//! let lines = Rc::new(RefCell::new(Vec::new()));
//! let dot = Rc::new(RefCell::new(String::new()));
//! let (l, d) = (lines.clone(), dot.clone());
//!
//! build_debug(
//!     debug_options([
//!         logger(move |line| l.borrow_mut().push(line.to_string())),
//!         visualizer(move |graph| *d.borrow_mut() = graph.to_string()),
//!     ]),
//!     |n: u8| assert_eq!(n, 1),
//!     provide(|| 1u8),
//! ).unwrap();
//!
//! assert!(lines.borrow().iter().any(|l| l.contains("Providing u8")));
//! assert!(dot.borrow().starts_with("digraph"));
//! ```

use std::cell::{RefCell, RefMut};
use std::mem;
use std::path::PathBuf;
use std::rc::Rc;

use crate::graph_export::{DependencyGraph, ExportFormat};

/// Name of the file written by [`file_dump_visualizer`].
pub const DEBUG_GRAPH_FILE: &str = "debug_container.dot";

type LogFn = Rc<dyn Fn(&str)>;

#[derive(Clone)]
enum Visualizer {
    Callback(ExportFormat, LogFn),
    Log,
    File(PathBuf),
}

#[derive(Default)]
struct SinkState {
    buffer: Vec<String>,
    indent: usize,
    loggers: Vec<LogFn>,
    visualizers: Vec<Visualizer>,
    on_error: Vec<DebugOption>,
    on_success: Vec<DebugOption>,
    cleanups: Vec<Box<dyn FnOnce()>>,
    graph: DependencyGraph,
}

/// Collects the log and the graph of one build.
#[derive(Default)]
pub(crate) struct DebugSink {
    state: RefCell<SinkState>,
}

impl DebugSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn log(&self, msg: impl AsRef<str>) {
        let (line, loggers) = {
            let mut state = self.state.borrow_mut();
            let line = format!("{}{}", "  ".repeat(state.indent), msg.as_ref());
            state.buffer.push(line.clone());
            (line, state.loggers.clone())
        };
        tracing::trace!(target: "ferrous_inject", "{}", line);
        for logger in loggers {
            logger(&line);
        }
    }

    pub(crate) fn indent(&self) {
        self.state.borrow_mut().indent += 1;
    }

    pub(crate) fn dedent(&self) {
        let mut state = self.state.borrow_mut();
        state.indent = state.indent.saturating_sub(1);
    }

    /// Indents until the returned guard drops.
    pub(crate) fn indented(&self) -> IndentGuard<'_> {
        self.indent();
        IndentGuard { sink: self }
    }

    pub(crate) fn graph(&self) -> RefMut<'_, DependencyGraph> {
        RefMut::map(self.state.borrow_mut(), |state| &mut state.graph)
    }

    fn add_logger(&self, logger: LogFn) {
        let buffered = self.state.borrow().buffer.clone();
        for line in &buffered {
            logger(line);
        }
        self.state.borrow_mut().loggers.push(logger);
    }

    fn add_visualizer(&self, visualizer: Visualizer) {
        self.state.borrow_mut().visualizers.push(visualizer);
    }

    /// Applies the conditional options, renders the graph and runs cleanups.
    pub(crate) fn finish<T>(&self, result: &crate::InjectResult<T>) {
        let conditional = {
            let mut state = self.state.borrow_mut();
            let on_error = mem::take(&mut state.on_error);
            let on_success = mem::take(&mut state.on_success);
            if result.is_err() { on_error } else { on_success }
        };
        if let Err(err) = result {
            self.log(format!("Error: {}", err));
        }
        for option in conditional {
            option.apply(self);
        }

        self.render();

        let cleanups = mem::take(&mut self.state.borrow_mut().cleanups);
        for cleanup in cleanups {
            cleanup();
        }
    }

    fn render(&self) {
        let visualizers = self.state.borrow().visualizers.clone();
        if visualizers.is_empty() {
            return;
        }
        let dot = self.state.borrow().graph.to_dot();

        for visualizer in visualizers {
            match visualizer {
                Visualizer::Callback(ExportFormat::Dot, f) => f(&dot),
                Visualizer::Callback(format, f) => {
                    let rendered = self.state.borrow().graph.export(format);
                    match rendered {
                        Ok(text) => f(&text),
                        Err(err) => self.render_failed(&format!("{:?} graph", format), &err),
                    }
                }
                Visualizer::Log => self.log(format!("DOT graph: {}", dot)),
                Visualizer::File(path) => {
                    if let Err(err) = std::fs::write(&path, &dot) {
                        self.render_failed(&path.display().to_string(), &err);
                    } else {
                        self.log(format!("Saved graph of container to {}", path.display()));
                    }
                }
            }
        }
    }

    fn render_failed(&self, target: &str, err: &dyn std::error::Error) {
        self.log(format!("Error rendering {}: {}", target, err));
        tracing::warn!(target: "ferrous_inject", %err, "failed to render {}", target);
    }
}

pub(crate) struct IndentGuard<'a> {
    sink: &'a DebugSink,
}

impl Drop for IndentGuard<'_> {
    fn drop(&mut self) {
        self.sink.dedent();
    }
}

/// Configures the debug sink of a build.
///
/// Debug options are passed to [`build_debug`](crate::build_debug) and
/// [`inject_debug`](crate::inject_debug), or wrapped in a container
/// option with [`debug_config`](crate::debug_config).
pub struct DebugOption {
    apply: Box<dyn FnOnce(&DebugSink)>,
}

impl DebugOption {
    fn new(apply: impl FnOnce(&DebugSink) + 'static) -> Self {
        DebugOption { apply: Box::new(apply) }
    }

    /// An option that does nothing.
    pub fn none() -> Self {
        DebugOption::new(|_| {})
    }

    pub(crate) fn apply(self, sink: &DebugSink) {
        (self.apply)(sink)
    }
}

impl std::fmt::Debug for DebugOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DebugOption")
    }
}

/// Subscribes `f` to the build log. It first receives every line logged so far.
pub fn logger(f: impl Fn(&str) + 'static) -> DebugOption {
    DebugOption::new(move |sink| sink.add_logger(Rc::new(f)))
}

/// Prints the build log to stdout.
pub fn stdout_logger() -> DebugOption {
    logger(|line| println!("{}", line))
}

/// Emits the build log as `tracing` events at `DEBUG` level.
pub fn tracing_logger() -> DebugOption {
    logger(|line| tracing::debug!(target: "ferrous_inject", "{}", line))
}

/// Hands the rendered DOT graph to `f` when the build finishes.
pub fn visualizer(f: impl Fn(&str) + 'static) -> DebugOption {
    export_visualizer(ExportFormat::Dot, f)
}

/// Hands the graph rendered in `format` to `f` when the build finishes.
pub fn export_visualizer(format: ExportFormat, f: impl Fn(&str) + 'static) -> DebugOption {
    DebugOption::new(move |sink| sink.add_visualizer(Visualizer::Callback(format, Rc::new(f))))
}

/// Writes the DOT graph into the build log.
pub fn log_visualizer() -> DebugOption {
    DebugOption::new(|sink| sink.add_visualizer(Visualizer::Log))
}

/// Writes the DOT graph to `path`. Write errors are logged, not returned.
pub fn file_visualizer(path: impl Into<PathBuf>) -> DebugOption {
    let path = path.into();
    DebugOption::new(move |sink| sink.add_visualizer(Visualizer::File(path)))
}

/// Writes the DOT graph to [`DEBUG_GRAPH_FILE`] in the working directory.
pub fn file_dump_visualizer() -> DebugOption {
    file_visualizer(DEBUG_GRAPH_FILE)
}

/// Runs `f` after the graph has been rendered.
pub fn debug_cleanup(f: impl FnOnce() + 'static) -> DebugOption {
    DebugOption::new(move |sink| sink.state.borrow_mut().cleanups.push(Box::new(f)))
}

/// Applies `option` only if the build fails.
pub fn on_error(option: DebugOption) -> DebugOption {
    DebugOption::new(move |sink| sink.state.borrow_mut().on_error.push(option))
}

/// Applies `option` only if the build succeeds.
pub fn on_success(option: DebugOption) -> DebugOption {
    DebugOption::new(move |sink| sink.state.borrow_mut().on_success.push(option))
}

/// Combines several options, applied in order.
pub fn debug_options(options: impl IntoIterator<Item = DebugOption>) -> DebugOption {
    let options: Vec<DebugOption> = options.into_iter().collect();
    DebugOption::new(move |sink| {
        for option in options {
            option.apply(sink);
        }
    })
}

/// On failure, print the log to stdout and dump the graph to [`DEBUG_GRAPH_FILE`].
pub fn auto_debug() -> DebugOption {
    on_error(debug_options([stdout_logger(), file_dump_visualizer()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn collect(sink: &DebugSink) -> Rc<RefCell<Vec<String>>> {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let l = lines.clone();
        logger(move |line| l.borrow_mut().push(line.to_string())).apply(sink);
        lines
    }

    #[test]
    fn late_logger_gets_replay() {
        let sink = DebugSink::new();
        sink.log("first");
        sink.indent();
        sink.log("nested");
        sink.dedent();
        let lines = collect(&sink);
        sink.log("after");
        assert_eq!(*lines.borrow(), vec!["first", "  nested", "after"]);
    }

    #[test]
    fn conditional_options_follow_result() {
        let sink = DebugSink::new();
        let hit = Rc::new(Cell::new(0));
        let (e, s) = (hit.clone(), hit.clone());
        on_error(debug_cleanup(move || e.set(e.get() + 1))).apply(&sink);
        on_success(debug_cleanup(move || s.set(s.get() + 10))).apply(&sink);

        let lines = collect(&sink);
        sink.finish::<()>(&Err(crate::InjectError::Config("bad".into())));
        assert_eq!(hit.get(), 1);
        assert!(lines.borrow().iter().any(|l| l == "Error: configuration error: bad"));
    }

    #[test]
    fn dedent_saturates() {
        let sink = DebugSink::new();
        sink.dedent();
        let lines = collect(&sink);
        sink.log("x");
        assert_eq!(*lines.borrow(), vec!["x"]);
    }
}
